use cdp_solver::visualization::svg_to_png_file;
use std::fs;
use std::path::PathBuf;

/// Converts every SVG of a directory (default `results`) to PNG
fn main() {
    let dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("results"));
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Cannot read {:?}: {}", dir, e);
            std::process::exit(1);
        }
    };

    let mut failures = 0;
    for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        if path.extension().map_or(true, |ext| ext != "svg") {
            continue;
        }
        let svg = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read {:?}: {}", path, e);
                failures += 1;
                continue;
            }
        };
        let out = path.with_extension("png");
        match svg_to_png_file(&svg, &out) {
            Ok(()) => println!("Converted {:?} -> {:?}", path, out),
            Err(e) => {
                eprintln!("Failed to convert {:?}: {}", path, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}
