//! Module for parsing and representing split-delivery routing instances.
//!
//! An instance file has three regions: declarations (vehicles `k`, customers
//! `c`, stations `s`, the `MaxTimeLag` bound and optional counts), a
//! `Locations` section with `id x y` coordinate lines, and a trailing block of
//! generation parameters introduced by a dashed line, which is ignored.
//!
//! Travel between two non-station points is forced through the best relay
//! station, except when heading to the end depot. All travel times are
//! rounded up to whole time units and precomputed once at load time.

use crate::error::{CdpError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Identifier of the start depot in instance files.
pub const START_DEPOT_ID: &str = "v0";
/// Identifier of the end depot in instance files.
pub const END_DEPOT_ID: &str = "v1";

/// Role of a location in the network
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LocationKind {
    StartDepot,
    EndDepot,
    Customer,
    Station,
}

/// A point of the network with its coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub kind: LocationKind,
    pub x: f64,
    pub y: f64,
}

/// A vehicle of the fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    /// Quantity delivered per stop
    pub capacity: i32,
    /// Time spent at each stop
    pub service_length: i32,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, capacity: i32, service_length: i32) -> Self {
        Vehicle { id: id.into(), capacity, service_length }
    }
}

/// A customer with its demand and delivery window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub demand: i32,
    /// Delivery window opens
    pub earliest: i32,
    /// Delivery window closes
    pub latest: i32,
    /// Index into the instance location table
    pub location: usize,
}

/// Orders identifiers by alphabetic prefix, then by numeric suffix, so that
/// `c2` sorts before `c10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, Option<u64>) {
        let pos = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (prefix, digits) = s.split_at(pos);
        (prefix, digits.parse().ok())
    }
    split(a).cmp(&split(b)).then_with(|| a.cmp(b))
}

/// Collects declarations and coordinates, then validates them into an [`Instance`].
///
/// Used by the file parser and directly by callers building instances in code.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    name: String,
    vehicles: Vec<Vehicle>,
    customers: Vec<(String, i32, i32, i32)>,
    stations: Vec<String>,
    coordinates: HashMap<String, (f64, f64)>,
    max_lag: Option<i32>,
}

impl InstanceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        InstanceBuilder { name: name.into(), ..Default::default() }
    }

    pub fn vehicle(mut self, id: impl Into<String>, capacity: i32, service_length: i32) -> Self {
        self.vehicles.push(Vehicle::new(id, capacity, service_length));
        self
    }

    pub fn customer(mut self, id: impl Into<String>, demand: i32, earliest: i32, latest: i32) -> Self {
        self.customers.push((id.into(), demand, earliest, latest));
        self
    }

    pub fn station(mut self, id: impl Into<String>) -> Self {
        self.stations.push(id.into());
        self
    }

    pub fn location(mut self, id: impl Into<String>, x: f64, y: f64) -> Self {
        self.coordinates.insert(id.into(), (x, y));
        self
    }

    pub fn max_lag(mut self, max_lag: i32) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    /// Validate the collected data and build the instance.
    ///
    /// Malformed data yields [`CdpError::Parse`]; data that cannot be routed
    /// (no vehicle, zero capacity, no station) yields
    /// [`CdpError::InfeasibleInstance`]. Distances are only computed once both
    /// checks pass.
    pub fn build(self) -> Result<Instance> {
        let InstanceBuilder { name, mut vehicles, mut customers, mut stations, coordinates, max_lag } = self;

        let mut seen = HashSet::new();
        let declared = vehicles.iter().map(|v| &v.id)
            .chain(customers.iter().map(|c| &c.0))
            .chain(stations.iter());
        for id in declared {
            if id == START_DEPOT_ID || id == END_DEPOT_ID || !seen.insert(id.as_str()) {
                return Err(CdpError::parse_global(format!("duplicate identifier '{}'", id)));
            }
        }

        for (id, _, earliest, latest) in &customers {
            if earliest > latest {
                return Err(CdpError::parse_global(format!(
                    "customer {}: time window start {} exceeds end {}",
                    id, earliest, latest
                )));
            }
        }

        let max_lag = max_lag.ok_or_else(|| CdpError::parse_global("missing MaxTimeLag"))?;

        if vehicles.is_empty() {
            return Err(CdpError::InfeasibleInstance("the fleet has no vehicle".to_string()));
        }
        if let Some(v) = vehicles.iter().find(|v| v.capacity <= 0) {
            return Err(CdpError::InfeasibleInstance(format!(
                "vehicle {} has non-positive capacity {}",
                v.id, v.capacity
            )));
        }
        if let Some(v) = vehicles.iter().find(|v| v.service_length < 0) {
            return Err(CdpError::InfeasibleInstance(format!(
                "vehicle {} has negative service length {}",
                v.id, v.service_length
            )));
        }
        if let Some((id, demand, _, _)) = customers.iter().find(|c| c.1 < 0) {
            return Err(CdpError::InfeasibleInstance(format!(
                "customer {} has negative demand {}",
                id, demand
            )));
        }
        if stations.is_empty() {
            return Err(CdpError::InfeasibleInstance(
                "no relay station: travel between customers cannot be routed".to_string(),
            ));
        }
        if max_lag < 0 {
            return Err(CdpError::InfeasibleInstance(format!("negative MaxTimeLag {}", max_lag)));
        }

        vehicles.sort_by(|a, b| natural_cmp(&a.id, &b.id));
        customers.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        stations.sort_by(|a, b| natural_cmp(a, b));

        let coord = |id: &str| -> Result<(f64, f64)> {
            coordinates.get(id).copied().ok_or_else(|| {
                CdpError::parse_global(format!("missing coordinates for '{}'", id))
            })
        };

        let mut locations = Vec::with_capacity(2 + customers.len() + stations.len());
        let (x, y) = coord(START_DEPOT_ID)?;
        locations.push(Location { id: START_DEPOT_ID.to_string(), kind: LocationKind::StartDepot, x, y });
        let (x, y) = coord(END_DEPOT_ID)?;
        locations.push(Location { id: END_DEPOT_ID.to_string(), kind: LocationKind::EndDepot, x, y });

        let mut parsed_customers = Vec::with_capacity(customers.len());
        for (id, demand, earliest, latest) in customers {
            let (x, y) = coord(&id)?;
            parsed_customers.push(Customer { id: id.clone(), demand, earliest, latest, location: locations.len() });
            locations.push(Location { id, kind: LocationKind::Customer, x, y });
        }

        let mut station_locations = Vec::with_capacity(stations.len());
        for id in stations {
            let (x, y) = coord(&id)?;
            station_locations.push(locations.len());
            locations.push(Location { id, kind: LocationKind::Station, x, y });
        }

        // Non-empty fleet checked above
        let min_capacity = vehicles.iter().map(|v| v.capacity).min().unwrap_or(1);

        let distance_matrix = Instance::compute_distance_matrix(&locations, &station_locations);

        Ok(Instance {
            name,
            vehicles,
            customers: parsed_customers,
            stations: station_locations,
            locations,
            max_lag,
            min_capacity,
            distance_matrix,
        })
    }
}

/// Represents a complete routing instance. Read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    name: String,
    vehicles: Vec<Vehicle>,
    customers: Vec<Customer>,
    /// Location indices of the relay stations
    stations: Vec<usize>,
    /// Start depot, end depot, customers, then stations
    locations: Vec<Location>,
    max_lag: i32,
    min_capacity: i32,
    #[serde(skip)]
    distance_matrix: Vec<Vec<i32>>,
}

impl Instance {
    /// Parse an instance from a file; the instance is named after the file stem
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Parsing instance from {}", path.display());
        Self::from_reader(BufReader::new(file), name)
    }

    /// Parse an instance held in memory
    pub fn parse_str(text: &str, name: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes(), name)
    }

    /// Parse an instance from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, name: impl Into<String>) -> Result<Self> {
        let mut builder = InstanceBuilder::new(name);
        let mut counts: [(&str, Option<usize>); 3] = [("Vehicles", None), ("Customers", None), ("Stations", None)];
        let mut located = HashSet::new();
        let mut reading_locations = false;

        for (index, line) in reader.lines().enumerate() {
            let lineno = index + 1;
            let line = line?;
            if line.contains("-----") {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.contains("Locations") {
                reading_locations = true;
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();

            if reading_locations {
                if fields.len() < 3 {
                    return Err(CdpError::parse(lineno, "coordinate line needs 'id x y'"));
                }
                let x = parse_field::<f64>(fields[1], lineno, "x coordinate")?;
                let y = parse_field::<f64>(fields[2], lineno, "y coordinate")?;
                if !located.insert(fields[0].to_string()) {
                    return Err(CdpError::parse(lineno, format!("duplicate coordinates for '{}'", fields[0])));
                }
                builder = builder.location(fields[0], x, y);
                continue;
            }

            if trimmed.contains("MaxTimeLag") {
                let last = fields.last().copied().unwrap_or_default();
                builder = builder.max_lag(parse_field(last, lineno, "MaxTimeLag")?);
                continue;
            }
            if let Some(slot) = counts.iter_mut().find(|(label, _)| trimmed.contains(*label)) {
                let last = fields.last().copied().unwrap_or_default();
                slot.1 = Some(parse_field(last, lineno, slot.0)?);
                continue;
            }

            match trimmed.chars().next() {
                Some('k') => {
                    if fields.len() < 3 {
                        return Err(CdpError::parse(lineno, "vehicle line needs 'id capacity service'"));
                    }
                    let capacity = parse_field(fields[1], lineno, "capacity")?;
                    let service = parse_field(fields[2], lineno, "service length")?;
                    builder = builder.vehicle(fields[0], capacity, service);
                }
                Some('c') => {
                    if fields.len() < 4 {
                        return Err(CdpError::parse(lineno, "customer line needs 'id demand start end'"));
                    }
                    let demand = parse_field(fields[1], lineno, "demand")?;
                    let earliest: i32 = parse_field(fields[2], lineno, "window start")?;
                    let latest: i32 = parse_field(fields[3], lineno, "window end")?;
                    if earliest > latest {
                        return Err(CdpError::parse(
                            lineno,
                            format!("customer {}: time window start {} exceeds end {}", fields[0], earliest, latest),
                        ));
                    }
                    builder = builder.customer(fields[0], demand, earliest, latest);
                }
                Some('s') => {
                    builder = builder.station(fields[0]);
                }
                _ => log::debug!("line {}: ignoring '{}'", lineno, trimmed),
            }
        }

        if !reading_locations {
            return Err(CdpError::parse_global("missing 'Locations' section"));
        }

        let parsed = [builder.vehicles.len(), builder.customers.len(), builder.stations.len()];
        for ((label, declared), actual) in counts.iter().zip(parsed) {
            if let Some(declared) = declared {
                if *declared != actual {
                    return Err(CdpError::parse_global(format!(
                        "{} count declared as {} but {} were listed",
                        label, declared, actual
                    )));
                }
            }
        }

        builder.build()
    }

    /// Compute the relay-aware travel time matrix
    fn compute_distance_matrix(locations: &[Location], stations: &[usize]) -> Vec<Vec<i32>> {
        let n = locations.len();
        let euclid = |a: usize, b: usize| {
            let dx = locations[a].x - locations[b].x;
            let dy = locations[a].y - locations[b].y;
            (dx * dx + dy * dy).sqrt()
        };

        let mut matrix = vec![vec![0; n]; n];
        for i in 0..n {
            for j in 0..n {
                let direct = locations[i].kind == LocationKind::Station
                    || locations[j].kind == LocationKind::Station
                    || locations[j].kind == LocationKind::EndDepot;
                let d = if direct {
                    euclid(i, j)
                } else {
                    stations
                        .iter()
                        .map(|&s| euclid(i, s) + euclid(s, j))
                        .fold(f64::INFINITY, f64::min)
                };
                matrix[i][j] = d.ceil() as i32;
            }
        }
        matrix
    }

    /// Travel time between two locations (indices into [`Instance::locations`])
    #[inline]
    pub fn distance(&self, origin: usize, destination: usize) -> i32 {
        self.distance_matrix[origin][destination]
    }

    /// Straight-line distance between two locations, without relay or rounding
    pub fn euclidean(&self, a: usize, b: usize) -> f64 {
        let dx = self.locations[a].x - self.locations[b].x;
        let dy = self.locations[a].y - self.locations[b].y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Station through which travel from `origin` to `destination` is routed,
    /// or `None` when the leg is direct.
    pub fn relay_station(&self, origin: usize, destination: usize) -> Option<usize> {
        let direct = self.locations[origin].kind == LocationKind::Station
            || self.locations[destination].kind == LocationKind::Station
            || self.locations[destination].kind == LocationKind::EndDepot;
        if direct {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for &s in &self.stations {
            let d = self.euclidean(origin, s) + self.euclidean(s, destination);
            if best.map_or(true, |(_, b)| d < b) {
                best = Some((s, d));
            }
        }
        best.map(|(s, _)| s)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Location indices of the relay stations
    pub fn stations(&self) -> &[usize] {
        &self.stations
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, index: usize) -> &Location {
        &self.locations[index]
    }

    /// Location index of the start depot
    #[inline]
    pub fn start_depot(&self) -> usize {
        0
    }

    /// Location index of the end depot
    #[inline]
    pub fn end_depot(&self) -> usize {
        1
    }

    /// Maximum permitted gap between two consecutive deliveries to a customer
    pub fn max_lag(&self) -> i32 {
        self.max_lag
    }

    /// Smallest vehicle capacity, always positive
    pub fn min_capacity(&self) -> i32 {
        self.min_capacity
    }

    pub fn customer_index(&self, id: &str) -> Option<usize> {
        self.customers.iter().position(|c| c.id == id)
    }

    pub fn vehicle_index(&self, id: &str) -> Option<usize> {
        self.vehicles.iter().position(|v| v.id == id)
    }

    /// Number of split-delivery slots needed for a customer
    pub fn slot_count(&self, customer: usize) -> usize {
        let demand = i64::from(self.customers[customer].demand.max(0));
        let capacity = i64::from(self.min_capacity);
        ((demand + capacity - 1) / capacity) as usize
    }

    pub fn total_demand(&self) -> i32 {
        self.customers.iter().map(|c| c.demand).sum()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let total_slots = (0..self.customers.len()).map(|c| self.slot_count(c)).sum();

        let mut distances: Vec<f64> = Vec::new();
        for c in &self.customers {
            for d in &self.customers {
                if c.location != d.location {
                    distances.push(self.distance(c.location, d.location) as f64);
                }
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            num_vehicles: self.vehicles.len(),
            num_customers: self.customers.len(),
            num_stations: self.stations.len(),
            total_demand: self.total_demand(),
            total_capacity: self.vehicles.iter().map(|v| v.capacity).sum(),
            min_capacity: self.min_capacity,
            total_slots,
            max_lag: self.max_lag,
            avg_distance,
            max_distance,
        }
    }
}

fn parse_field<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| CdpError::parse(line, format!("invalid {} '{}'", what, token)))
}

/// Statistics about an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_vehicles: usize,
    pub num_customers: usize,
    pub num_stations: usize,
    pub total_demand: i32,
    pub total_capacity: i32,
    pub min_capacity: i32,
    pub total_slots: usize,
    pub max_lag: i32,
    /// Average relay-routed travel time between two customers
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Vehicles: {} (total capacity {}, min capacity {})",
            self.num_vehicles, self.total_capacity, self.min_capacity)?;
        writeln!(f, "  Customers: {} (total demand {})", self.num_customers, self.total_demand)?;
        writeln!(f, "  Stations: {}", self.num_stations)?;
        writeln!(f, "  Visit slots: {}", self.total_slots)?;
        writeln!(f, "  Max time lag: {}", self.max_lag)?;
        writeln!(f, "  Avg customer distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max customer distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_parse_sample() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();

        assert_eq!(instance.name(), "sample");
        assert_eq!(instance.vehicles().len(), 2);
        assert_eq!(instance.customers().len(), 3);
        assert_eq!(instance.stations().len(), 2);
        assert_eq!(instance.max_lag(), 40);
        assert_eq!(instance.min_capacity(), 10);

        // natural order: c2 before c10
        let ids: Vec<&str> = instance.customers().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c2", "c10"]);

        for c in instance.customers() {
            assert!(c.earliest <= c.latest);
        }
    }

    #[test]
    fn test_slot_count_of_huge_demand() {
        let text = fixtures::SPLIT.replace("c0 20 0 100", "c0 2147483647 0 100");
        let instance = Instance::parse_str(&text, "huge").unwrap();
        assert_eq!(instance.slot_count(0), 143_165_577);
    }

    #[test]
    fn test_window_violation_is_parse_error() {
        let text = fixtures::SAMPLE.replace("c2 15 50 90", "c2 15 95 90");
        match Instance::parse_str(&text, "bad") {
            Err(CdpError::Parse { line: Some(_), message }) => assert!(message.contains("c2")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_locations_marker() {
        let text = "MaxTimeLag 10\nk0 10 1\ns0\n";
        assert!(matches!(Instance::parse_str(text, "x"), Err(CdpError::Parse { .. })));
    }

    #[test]
    fn test_missing_coordinate() {
        let text = fixtures::SAMPLE.replace("c10 60 40\n", "");
        match Instance::parse_str(&text, "x") {
            Err(CdpError::Parse { message, .. }) => assert!(message.contains("c10")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_count_mismatch() {
        let text = fixtures::SAMPLE.replace("Customers 3", "Customers 4");
        assert!(matches!(Instance::parse_str(&text, "x"), Err(CdpError::Parse { .. })));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let text = fixtures::SAMPLE.replace("k1 10 5", "k1 0 5");
        assert!(matches!(Instance::parse_str(&text, "x"), Err(CdpError::InfeasibleInstance(_))));
    }

    #[test]
    fn test_no_station_rejected() {
        let result = InstanceBuilder::new("x")
            .vehicle("k0", 10, 1)
            .customer("c0", 5, 0, 10)
            .location("v0", 0.0, 0.0)
            .location("v1", 0.0, 0.0)
            .location("c0", 1.0, 1.0)
            .max_lag(5)
            .build();
        assert!(matches!(result, Err(CdpError::InfeasibleInstance(_))));
    }

    #[test]
    fn test_no_vehicle_rejected() {
        let result = InstanceBuilder::new("x")
            .station("s0")
            .location("v0", 0.0, 0.0)
            .location("v1", 0.0, 0.0)
            .location("s0", 1.0, 1.0)
            .max_lag(5)
            .build();
        assert!(matches!(result, Err(CdpError::InfeasibleInstance(_))));
    }

    #[test]
    fn test_relay_distance_ceiling_applied_once() {
        // o=(0,0), s=(1,1), d=(2,0): each leg is sqrt(2), the sum 2.83
        let instance = InstanceBuilder::new("relay")
            .vehicle("k0", 10, 0)
            .customer("c0", 5, 0, 100)
            .customer("c1", 5, 0, 100)
            .station("s0")
            .location("v0", 0.0, 0.0)
            .location("v1", 2.0, 0.0)
            .location("c0", 0.0, 0.0)
            .location("c1", 2.0, 0.0)
            .location("s0", 1.0, 1.0)
            .max_lag(10)
            .build()
            .unwrap();
        let c0 = instance.customers()[0].location;
        let c1 = instance.customers()[1].location;

        assert_eq!(instance.distance(c0, c1), 3);
        assert_eq!(instance.relay_station(c0, c1), Some(instance.stations()[0]));
        // direct toward the end depot, even though it sits on c1
        assert_eq!(instance.distance(c0, instance.end_depot()), 2);
        assert_eq!(instance.relay_station(c0, instance.end_depot()), None);
    }

    #[test]
    fn test_relay_picks_best_station() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let n = instance.locations().len();
        for o in 0..n {
            for d in 0..n {
                let dist = instance.distance(o, d);
                assert!(dist >= 0);
                let kinds = (instance.location(o).kind, instance.location(d).kind);
                let direct = kinds.0 == LocationKind::Station
                    || kinds.1 == LocationKind::Station
                    || kinds.1 == LocationKind::EndDepot;
                let expected = if direct {
                    instance.euclidean(o, d)
                } else {
                    instance.stations().iter()
                        .map(|&s| instance.euclidean(o, s) + instance.euclidean(s, d))
                        .fold(f64::INFINITY, f64::min)
                };
                assert_eq!(dist, expected.ceil() as i32);
            }
        }
    }

    #[test]
    fn test_slot_count() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let slots: Vec<usize> = (0..3).map(|c| instance.slot_count(c)).collect();
        // demands 20, 15, 8 with min capacity 10
        assert_eq!(slots, vec![2, 2, 1]);
        assert_eq!(instance.statistics().total_slots, 5);
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("c2", "c10"), Ordering::Less);
        assert_eq!(natural_cmp("k1", "k1"), Ordering::Equal);
        assert_eq!(natural_cmp("s", "s0"), Ordering::Less);
    }
}
