//! Immutable solution state for the constructive engine.
//!
//! A [`Snapshot`] records where each vehicle is and when it becomes free, how
//! much demand each customer still waits for, and the actions committed so
//! far. Committing an action never touches the current snapshot: it returns a
//! new one that shares every unchanged part with its parent, so callers can
//! keep old snapshots around to backtrack or to explore alternatives, possibly
//! on other threads.

use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Position and availability of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Location index
    pub position: usize,
    /// Time at which the vehicle leaves its position
    pub time: i32,
}

/// Delivery progress of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerState {
    /// Demand still to deliver; zero or negative once served
    pub pending: i32,
    /// Earliest time the next delivery may start
    pub ready: i32,
    /// Deliveries made so far
    pub deliveries: u32,
}

/// A committed delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub customer: usize,
    pub vehicle: usize,
    /// Service start
    pub start: i32,
    /// Service end, when the vehicle leaves
    pub departure: i32,
    /// Quantity actually unloaded
    pub delivered: i32,
}

/// Persistent action log: each entry points at the log of its parent snapshot
#[derive(Debug)]
struct LogEntry {
    action: Action,
    previous: Option<Arc<LogEntry>>,
}

/// Solution state of the constructive engine
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    instance: &'a Instance,
    vehicles: Arc<Vec<VehicleState>>,
    customers: Arc<Vec<CustomerState>>,
    log: Option<Arc<LogEntry>>,
    num_actions: usize,
    fitness: i32,
    closed: bool,
}

impl<'a> Snapshot<'a> {
    /// Vehicles at the start depot at time zero, every demand pending
    pub fn new(instance: &'a Instance) -> Self {
        let vehicles = vec![VehicleState { position: instance.start_depot(), time: 0 }; instance.vehicles().len()];
        let customers = instance
            .customers()
            .iter()
            .map(|c| CustomerState { pending: c.demand, ready: c.earliest, deliveries: 0 })
            .collect();

        Snapshot {
            instance,
            vehicles: Arc::new(vehicles),
            customers: Arc::new(customers),
            log: None,
            num_actions: 0,
            fitness: 0,
            closed: false,
        }
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn vehicle(&self, vehicle: usize) -> VehicleState {
        self.vehicles[vehicle]
    }

    pub fn vehicles(&self) -> &[VehicleState] {
        &self.vehicles
    }

    pub fn customer(&self, customer: usize) -> CustomerState {
        self.customers[customer]
    }

    pub fn customers(&self) -> &[CustomerState] {
        &self.customers
    }

    /// Cumulative demand of fully served customers
    pub fn fitness(&self) -> i32 {
        self.fitness
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Whether the vehicles were sent back to the end depot
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Committed actions, oldest first
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.num_actions);
        let mut cursor = self.log.as_deref();
        while let Some(entry) = cursor {
            actions.push(entry.action);
            cursor = entry.previous.as_deref();
        }
        actions.reverse();
        actions
    }

    pub fn last_action(&self) -> Option<Action> {
        self.log.as_ref().map(|entry| entry.action)
    }

    /// Every customer received its full demand
    pub fn is_complete(&self) -> bool {
        self.customers.iter().all(|c| c.pending <= 0)
    }

    /// Sum of vehicle clocks, used to break fitness ties
    pub fn total_time(&self) -> i64 {
        self.vehicles.iter().map(|v| v.time as i64).sum()
    }

    /// Time at which `vehicle` could reach `customer` if it left now
    pub fn arrival(&self, vehicle: usize, customer: usize) -> i32 {
        let state = self.vehicles[vehicle];
        state.time.saturating_add(self.instance.distance(state.position, self.instance.customers()[customer].location))
    }

    fn lag_exceeded(&self, customer: usize, time: i32) -> bool {
        let state = self.customers[customer];
        state.deliveries > 0 && time > state.ready.saturating_add(self.instance.max_lag())
    }

    /// Whether delivering to `customer` starting at `time` is currently ruled out
    pub fn masked(&self, customer: usize, time: i32) -> bool {
        let c = &self.instance.customers()[customer];
        let state = self.customers[customer];
        if self.closed || state.pending <= 0 {
            return true;
        }
        if time < state.ready {
            return true;
        }
        if self.lag_exceeded(customer, time) {
            return true;
        }
        if time > c.latest {
            return true;
        }

        for (k, vehicle) in self.instance.vehicles().iter().enumerate() {
            let arrival = self.arrival(k, customer);
            if time >= arrival.saturating_add(vehicle.service_length) || arrival.max(time) <= c.latest {
                return false;
            }
        }
        true
    }

    /// Commit a delivery to `customer` starting at `time`.
    ///
    /// The first vehicle, in fleet order, that can be there by `time` and
    /// finish before the window closes is used; waiting is allowed. Returns
    /// `None` when no vehicle qualifies.
    pub fn extend(&self, customer: usize, time: i32) -> Option<Snapshot<'a>> {
        let c = &self.instance.customers()[customer];
        let state = self.customers[customer];
        if self.closed
            || state.pending <= 0
            || time < state.ready
            || time > c.latest
            || self.lag_exceeded(customer, time)
        {
            log::debug!("{} at {}: action not available", c.id, time);
            return None;
        }

        let chosen = self.instance.vehicles().iter().enumerate().find(|(k, vehicle)| {
            time >= self.arrival(*k, customer) && time.saturating_add(vehicle.service_length) <= c.latest
        });

        let (k, vehicle) = match chosen {
            Some(found) => found,
            None => {
                log::debug!("{} at {}: no suitable vehicle", c.id, time);
                return None;
            }
        };

        let departure = time.saturating_add(vehicle.service_length);
        log::debug!("vehicle {} visits {} at time {} and leaves at time {}", vehicle.id, c.id, time, departure);

        Some(self.with_action(Action {
            customer,
            vehicle: k,
            start: time,
            departure,
            delivered: vehicle.capacity.min(state.pending),
        }))
    }

    /// Derive the snapshot that follows `action`, sharing untouched state
    fn with_action(&self, action: Action) -> Snapshot<'a> {
        let c = &self.instance.customers()[action.customer];
        let capacity = self.instance.vehicles()[action.vehicle].capacity;

        let mut next = self.clone();
        Arc::make_mut(&mut next.vehicles)[action.vehicle] = VehicleState { position: c.location, time: action.departure };

        let customers = Arc::make_mut(&mut next.customers);
        let before = customers[action.customer].pending;
        let after = before - capacity;
        customers[action.customer] = CustomerState {
            pending: after,
            ready: action.departure,
            deliveries: customers[action.customer].deliveries + 1,
        };
        if before > 0 && after <= 0 {
            next.fitness += c.demand;
        }

        next.log = Some(Arc::new(LogEntry { action, previous: self.log.clone() }));
        next.num_actions += 1;
        next
    }

    /// Send every vehicle to the end depot. Returns are not subject to the
    /// lag bound nor to any window.
    pub fn close(&self) -> Snapshot<'a> {
        let mut next = self.clone();
        let end = self.instance.end_depot();
        let vehicles = Arc::make_mut(&mut next.vehicles);
        for v in vehicles.iter_mut() {
            if v.position != end {
                v.time = v.time.saturating_add(self.instance.distance(v.position, end));
                v.position = end;
            }
        }
        next.closed = true;
        next
    }

    /// Earliest start time at which `extend` succeeds for `customer`
    pub fn earliest_action(&self, customer: usize) -> Option<i32> {
        let c = &self.instance.customers()[customer];
        let state = self.customers[customer];
        if self.closed || state.pending <= 0 {
            return None;
        }

        self.instance
            .vehicles()
            .iter()
            .enumerate()
            .filter_map(|(k, vehicle)| {
                let time = self.arrival(k, customer).max(state.ready);
                let fits = time.saturating_add(vehicle.service_length) <= c.latest && !self.lag_exceeded(customer, time);
                fits.then_some(time)
            })
            .min()
    }

    /// Unmasked `(customer, time)` actions at their earliest start
    pub fn candidates(&self) -> Vec<(usize, i32)> {
        (0..self.customers.len())
            .filter_map(|c| self.earliest_action(c).map(|t| (c, t)))
            .filter(|&(c, t)| !self.masked(c, t))
            .collect()
    }

    /// No further action can be committed
    pub fn is_terminal(&self) -> bool {
        self.closed || self.is_complete() || self.candidates().is_empty()
    }
}
