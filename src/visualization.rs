//! Visualization utilities for route plans.
//!
//! Draws the instance map with every leg routed through its relay station,
//! and a per-vehicle timeline of deliveries against customer windows.

use crate::instance::{Instance, LocationKind};
use crate::solution::RoutePlan;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
#[cfg(not(feature = "resvg"))]
use std::process::Command;
#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "resvg")]
use resvg::usvg::{self, TreeParsing};

const PALETTE: [&str; 8] = ["#2980b9", "#c0392b", "#27ae60", "#8e44ad", "#d35400", "#16a085", "#2c3e50", "#f39c12"];

/// SVG visualization generator
pub struct Visualizer {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 7.0,
        }
    }
}

fn header(svg: &mut String, width: f64, height: f64) {
    let _ = write!(
        svg,
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
    .depot {{ fill: #e74c3c; stroke: #922b21; stroke-width: 2; }}
    .station {{ fill: #f1c40f; stroke: #7d6608; stroke-width: 2; }}
    .served {{ fill: #2ecc71; stroke: #1e8449; stroke-width: 2; }}
    .unserved {{ fill: #bdc3c7; stroke: #7f8c8d; stroke-width: 2; }}
    .window {{ fill: #d6eaf8; stroke: #85c1e9; stroke-width: 1; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
        w = width,
        h = height
    );
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bounds(instance: &Instance) -> (f64, f64, f64, f64) {
        instance.locations().iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_x, max_x, min_y, max_y), l| (min_x.min(l.x), max_x.max(l.x), min_y.min(l.y), max_y.max(l.y)),
        )
    }

    /// Map of locations and vehicle routes
    pub fn generate_svg(&self, instance: &Instance, plan: &RoutePlan) -> String {
        let mut svg = String::new();
        header(&mut svg, self.width, self.height);

        let (min_x, max_x, min_y, max_y) = Self::bounds(instance);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);
        let project = |location: usize| {
            let l = instance.location(location);
            (
                self.margin + (l.x - min_x) * scale,
                self.height - self.margin - (l.y - min_y) * scale,
            )
        };

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="25" class="title">Instance: {} | Served demand: {} / {}</text>"#,
            self.margin,
            instance.name(),
            plan.total_served,
            instance.total_demand()
        );

        for route in &plan.routes {
            let color = PALETTE[route.vehicle % PALETTE.len()];
            let mut points: Vec<(f64, f64)> = Vec::new();
            for pair in route.nodes.windows(2) {
                let from = plan.completion_times.get(pair[0]).map(|t| t.location);
                let to = plan.completion_times.get(pair[1]).map(|t| t.location);
                let (Some(from), Some(to)) = (from, to) else { continue };
                if points.is_empty() {
                    points.push(project(from));
                }
                if let Some(relay) = instance.relay_station(from, to) {
                    points.push(project(relay));
                }
                points.push(project(to));
            }
            if points.len() < 2 {
                continue;
            }
            let path: Vec<String> = points.iter().map(|(x, y)| format!("{:.2},{:.2}", x, y)).collect();
            let _ = writeln!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-opacity="0.8"/>"#,
                path.join(" "),
                color
            );
        }

        for (index, location) in instance.locations().iter().enumerate() {
            let (x, y) = project(index);
            let r = self.node_radius;
            match location.kind {
                LocationKind::StartDepot | LocationKind::EndDepot => {
                    let _ = writeln!(svg, r#"<rect x="{:.2}" y="{:.2}" width="{}" height="{}" class="depot"/>"#, x - r, y - r, 2.0 * r, 2.0 * r);
                }
                LocationKind::Station => {
                    let _ = writeln!(
                        svg,
                        r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" class="station"/>"#,
                        x, y - r, x - r, y + r, x + r, y + r
                    );
                }
                LocationKind::Customer => {
                    let class = if plan.is_served(&location.id) { "served" } else { "unserved" };
                    let _ = writeln!(svg, r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>"#, x, y, r, class);
                }
            }
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>"#,
                x,
                y - r - 3.0,
                location.id
            );
        }

        let legend_y = self.height - 30.0;
        for (i, (class, text)) in [("depot", "Depot"), ("station", "Station"), ("served", "Served"), ("unserved", "Unserved")].iter().enumerate() {
            let x = self.margin + i as f64 * 90.0;
            let _ = writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="15" height="15" class="{}"/><text x="{}" y="{}" class="label">{}</text>"#,
                x,
                legend_y,
                class,
                x + 20.0,
                legend_y + 12.0,
                text
            );
        }

        svg.push_str("</svg>");
        svg
    }

    /// One row per vehicle: delivery intervals over the customers' windows
    pub fn generate_timeline_svg(&self, instance: &Instance, plan: &RoutePlan) -> String {
        let row = 40.0;
        let height = 2.0 * self.margin + row * plan.routes.len().max(1) as f64;
        let mut svg = String::new();
        header(&mut svg, self.width, height);

        let _ = writeln!(svg, r#"<text x="{}" y="25" class="title">Delivery timeline: {}</text>"#, self.margin, instance.name());

        let horizon = plan
            .completion_times
            .iter()
            .filter_map(|t| t.completion)
            .chain(instance.customers().iter().map(|c| c.latest))
            .max()
            .unwrap_or(1)
            .max(1) as f64;
        let label_width = 60.0;
        let plot_width = self.width - 2.0 * self.margin - label_width;
        let x_of = |t: f64| self.margin + label_width + t / horizon * plot_width;

        let axis_y = height - self.margin;
        let _ = writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="axis"/><text x="{:.2}" y="{:.2}" class="label">{}</text>"#,
            x_of(0.0),
            axis_y,
            x_of(horizon),
            axis_y,
            x_of(horizon) - 10.0,
            axis_y + 14.0,
            horizon
        );

        for (r, route) in plan.routes.iter().enumerate() {
            let y = self.margin + r as f64 * row;
            let service = instance.vehicles()[route.vehicle].service_length;
            let color = PALETTE[route.vehicle % PALETTE.len()];
            let _ = writeln!(svg, r#"<text x="{}" y="{:.2}" class="label">{}</text>"#, self.margin, y + row / 2.0, route.vehicle_id);

            for &node in &route.nodes {
                let Some(time) = plan.completion_times.get(node) else { continue };
                let (Some(completion), Some(customer)) = (time.completion, time.customer) else { continue };
                let label = &time.label;
                let c = &instance.customers()[customer];
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="window"/>"#,
                    x_of(c.earliest as f64),
                    y + 4.0,
                    x_of(c.latest as f64) - x_of(c.earliest as f64),
                    row - 8.0
                );
                let begin = x_of((completion - service) as f64);
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/><text x="{:.2}" y="{:.2}" class="label">{}</text>"#,
                    begin,
                    y + 10.0,
                    (x_of(completion as f64) - begin).max(1.0),
                    row - 20.0,
                    color,
                    begin,
                    y + 8.0,
                    label
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        fs::write(path, svg)
    }

    /// Save SVG as PNG, with resvg when enabled and `rsvg-convert` otherwise
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        svg_to_png_file(svg, path.as_ref())
    }
}

#[cfg_attr(not(feature = "resvg"), allow(dead_code))]
fn svg_size(svg: &str, attr: &str, fallback: u32) -> u32 {
    svg.split_once(&format!("{}=\"", attr))
        .and_then(|(_, rest)| rest.split_once('"'))
        .and_then(|(value, _)| value.parse::<f64>().ok())
        .map_or(fallback, |v| v as u32)
}

fn other(msg: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, msg)
}

/// Render an SVG string to a PNG file
#[cfg(feature = "resvg")]
pub fn svg_to_png_file(svg: &str, out: &Path) -> std::io::Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| other(format!("usvg parse error: {}", e)))?;
    let width = svg_size(svg, "width", 800);
    let height = svg_size(svg, "height", 800);
    let mut pixmap = Pixmap::new(width.max(1), height.max(1)).ok_or_else(|| other("Failed to create pixmap".to_string()))?;
    resvg::Tree::from_usvg(&tree).render(Transform::default(), &mut pixmap.as_mut());
    pixmap.save_png(out).map_err(|e| other(format!("save_png failed: {}", e)))
}

/// Render an SVG string to a PNG file through `rsvg-convert`
#[cfg(not(feature = "resvg"))]
pub fn svg_to_png_file(svg: &str, out: &Path) -> std::io::Result<()> {
    let tmp = out.with_extension("svg.tmp");
    fs::write(&tmp, svg)?;
    let status = Command::new("rsvg-convert")
        .args(["-o", out.to_string_lossy().as_ref(), tmp.to_string_lossy().as_ref()])
        .status();
    let _ = fs::remove_file(&tmp);
    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => Err(other(format!("rsvg-convert exited with {}", s))),
        Err(e) => Err(other(format!("No SVG->PNG converter available: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::heuristics::construction::{ConstructionHeuristic, GreedyConstruction};

    #[test]
    fn test_map_draws_every_location() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let plan = GreedyConstruction::new().construct(&instance);
        let svg = Visualizer::new().generate_svg(&instance, &plan);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Instance: sample"));
        for location in instance.locations() {
            assert!(svg.contains(&format!(">{}</text>", location.id)));
        }
        // two stations and the legend entry
        assert_eq!(svg.matches("class=\"station\"").count(), 3);
    }

    #[test]
    fn test_route_passes_through_relay() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let plan = GreedyConstruction::new().construct(&instance);
        let svg = Visualizer::new().generate_svg(&instance, &plan);
        // v0 -> s0 -> c0 -> s0 -> c0 -> v1
        let polyline = svg.lines().find(|l| l.starts_with("<polyline")).unwrap();
        let points = polyline.split('"').nth(1).unwrap();
        assert_eq!(points.split(' ').count(), 6);
    }

    #[test]
    fn test_timeline_lists_deliveries() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let plan = GreedyConstruction::new().construct(&instance);
        let svg = Visualizer::new().generate_timeline_svg(&instance, &plan);
        assert!(svg.contains(">c0#0</text>"));
        assert!(svg.contains(">c0#1</text>"));
        assert!(svg.contains(">k0</text>"));
    }

    #[test]
    fn test_rendering_does_not_read_labels() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let mut plan = GreedyConstruction::new().construct(&instance);
        for time in &mut plan.completion_times {
            time.label = format!("node {}", time.node);
        }
        let viz = Visualizer::new();

        let svg = viz.generate_svg(&instance, &plan);
        let polyline = svg.lines().find(|l| l.starts_with("<polyline")).unwrap();
        assert_eq!(polyline.split('"').nth(1).unwrap().split(' ').count(), 6);

        let timeline = viz.generate_timeline_svg(&instance, &plan);
        assert!(timeline.contains(">node 1</text>"));
        assert!(timeline.contains(">node 2</text>"));
        assert!(!timeline.contains(">node 4</text>"));
    }

    #[test]
    fn test_svg_size() {
        assert_eq!(svg_size(r#"<svg width="640" height="480">"#, "height", 1), 480);
        assert_eq!(svg_size("<svg>", "width", 800), 800);
    }
}
