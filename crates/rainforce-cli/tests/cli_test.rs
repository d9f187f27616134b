//! Integration tests for the rainforce binary
//!
//! These run the built binary against a local statistics table and check the
//! JSON envelope and the artifacts it writes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn rainforce(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rainforce"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command")
}

fn parse_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

/// Four sites around the origin with depth tables for the default scenario
fn write_fixtures(dir: &Path) {
    let sites = [("ne", 1.0, 1.0, 1.0), ("nw", -1.0, 1.0, 2.0), ("sw", -1.0, -1.0, 1.0), ("se", 1.0, -1.0, 1.0)];

    let mut statistics = Vec::new();
    for (id, _, _, scale) in sites {
        for (duration, depth) in [(10, 5.0), (20, 8.5), (30, 12.0), (60, 18.0)] {
            statistics.push(serde_json::json!({
                "site_id": id,
                "scenario": { "return_period": 100.0, "rcp": "2.6", "time_period": "2031-2050" },
                "kind": "depth",
                "duration_mins": duration,
                "value": depth * scale,
                "unit": "mm",
            }));
        }
    }
    let table = serde_json::json!({
        "sites": sites
            .iter()
            .map(|(id, x, y, _)| serde_json::json!({ "id": id, "location": [x, y] }))
            .collect::<Vec<_>>(),
        "statistics": statistics,
    });

    fs::write(dir.join("table.json"), table.to_string()).unwrap();
    fs::write(dir.join("catchment.wkt"), "POLYGON((-0.5 0.2, 0.5 0.2, 0.5 0.6, -0.5 0.6, -0.5 0.2))")
        .unwrap();
    fs::write(
        dir.join("region.geojson"),
        r#"{"type":"Polygon","coordinates":[[[-2,-2],[2,-2],[2,2],[-2,2],[-2,-2]]]}"#,
    )
    .unwrap();
}

fn path_arg(dir: &Path, name: &str) -> String {
    dir.join(name).display().to_string()
}

const STORM: [&str; 6] = ["--storm-length", "60", "--time-to-peak", "30", "--increment", "10"];

#[test]
fn test_config_json_output_is_valid() {
    let output = rainforce(&["config", "--json", "--crs", "2193"]);
    assert!(output.status.success());

    let parsed = parse_stdout(&output);
    assert_eq!(parsed["status"], "success");
    let rows = parsed["data"].as_array().unwrap();
    let crs = rows.iter().find(|r| r["key"] == "crs").unwrap();
    assert_eq!(crs["value"], "EPSG:2193");
    assert_eq!(crs["source"], "cli");
}

#[test]
fn test_run_writes_uniform_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let out_dir = path_arg(dir.path(), "out");
    let catchment = path_arg(dir.path(), "catchment.wkt");
    let region = path_arg(dir.path(), "region.geojson");
    let table = path_arg(dir.path(), "table.json");

    let mut args = vec!["run", "--json", &catchment, "--region", &region, "--source-file", &table, "-o", &out_dir];
    args.extend(STORM);
    let output = rainforce(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = parse_stdout(&output);
    let report = &parsed["data"];
    assert_eq!(report["input_type"], "uniform");
    assert_eq!(report["time_steps"], 7);
    assert_eq!(report["sites"].as_array().unwrap().len(), 2);

    let text = fs::read_to_string(dir.path().join("out").join("rain_forcing.txt")).unwrap();
    assert_eq!(text.lines().count(), 7);
}

#[test]
fn test_run_varying_replaces_uniform_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("rain_forcing.txt"), "stale").unwrap();

    let out_dir = out.display().to_string();
    let catchment = path_arg(dir.path(), "catchment.wkt");
    let region = path_arg(dir.path(), "region.geojson");
    let table = path_arg(dir.path(), "table.json");

    let mut args = vec![
        "run", "--json", &catchment, "--region", &region, "--source-file", &table, "-o", &out_dir,
        "--input-type", "varying", "--cell-size", "0.1",
    ];
    args.extend(STORM);
    let output = rainforce(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(!out.join("rain_forcing.txt").exists());
    assert!(out.join("rain_forcing.json").exists());
    let parsed = parse_stdout(&output);
    assert_eq!(parsed["data"]["removed_artifacts"].as_array().unwrap().len(), 1);
}

#[test]
fn test_hyetograph_of_one_site() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let table = path_arg(dir.path(), "table.json");

    let mut args = vec!["hyetograph", "nw", "--json", "--source-file", &table];
    args.extend(STORM);
    let output = rainforce(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let data = &parse_stdout(&output)["data"];
    assert_eq!(data["site_id"], "nw");
    assert_eq!(data["points"].as_array().unwrap().len(), 7);
    assert_eq!(data["peak_mins"], 30.0);
    assert!((data["total_depth_mm"].as_f64().unwrap() - 36.0).abs() < 1e-9);
}

#[test]
fn test_partition_exports_geojson() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let catchment = path_arg(dir.path(), "catchment.wkt");
    let region = path_arg(dir.path(), "region.geojson");
    let table = path_arg(dir.path(), "table.json");
    let export = path_arg(dir.path(), "coverage.geojson");

    let output = rainforce(&[
        "partition", "--json", &catchment, "--region", &region, "--source-file", &table, "--export", &export,
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let data = &parse_stdout(&output)["data"];
    assert_eq!(data["influence_areas"], 4);
    assert_eq!(data["coverage"].as_array().unwrap().len(), 2);

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("coverage.geojson")).unwrap()).unwrap();
    assert_eq!(exported["features"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_statistics_fail_with_status() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let catchment = path_arg(dir.path(), "catchment.wkt");
    let table = path_arg(dir.path(), "table.json");
    let out_dir = path_arg(dir.path(), "out");

    // The table stops at 60 minutes, so a two-hour storm cannot be synthesized
    let output = rainforce(&[
        "run", "--json", &catchment, "--source-file", &table, "-o", &out_dir,
        "--storm-length", "120", "--time-to-peak", "60", "--increment", "10",
    ]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out").join("rain_forcing.txt").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"status\": \"error\""));
}
