//! Forcing artifacts in the solver's output directory.
//!
//! Uniform forcing is written as `rain_forcing.txt`, one
//! `seconds intensity_mmhr` pair per line. Gridded forcing is written as
//! `rain_forcing.json` with explicit axes and a `[time][y][x]` data array.

use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{Crs, ForcingCube, ForcingField, SiteId, UniformForcing};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Stem shared by every forcing artifact
pub const ARTIFACT_STEM: &str = "rain_forcing";

/// Result of writing one artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    /// Stale artifacts deleted before writing
    pub removed: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CubeDocument<'a> {
    crs: &'a Crs,
    units: &'static str,
    time_units: &'static str,
    x: &'a [f64],
    y: &'a [f64],
    time: &'a [f64],
    sites: &'a [SiteId],
    data: Vec<Vec<&'a [f64]>>,
}

pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Delete artifacts of a previous run from the output directory
    pub fn remove_stale(&self) -> Result<Vec<PathBuf>> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.output_dir).map_err(|e| self.write_error(&self.output_dir, e))?;
        let prefix = format!("{}.", ARTIFACT_STEM);

        let mut removed = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| self.write_error(&self.output_dir, e))?.path();
            let is_artifact = path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix));
            if !is_artifact {
                continue;
            }

            fs::remove_file(&path).map_err(|e| self.write_error(&path, e))?;
            tracing::info!(path = %path.display(), "Removed stale forcing artifact");
            removed.push(path);
        }

        removed.sort();
        Ok(removed)
    }

    /// Replace any previous artifact with the given forcing
    pub fn write(&self, field: &ForcingField) -> Result<WrittenArtifact> {
        fs::create_dir_all(&self.output_dir).map_err(|e| self.write_error(&self.output_dir, e))?;
        let removed = self.remove_stale()?;

        let (path, contents) = match field {
            ForcingField::Uniform(series) => (self.path_for("txt"), render_uniform(series)),
            ForcingField::Varying(cube) => (self.path_for("json"), render_cube(cube)?),
        };

        fs::write(&path, contents).map_err(|e| self.write_error(&path, e))?;
        tracing::info!(
            path = %path.display(),
            input_type = %field.input_type(),
            steps = field.time_steps(),
            "Wrote forcing artifact"
        );

        Ok(WrittenArtifact { path, removed })
    }

    fn path_for(&self, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", ARTIFACT_STEM, extension))
    }

    fn write_error(&self, path: &Path, e: std::io::Error) -> RainforceError {
        RainforceError::ArtifactWrite { path: path.to_path_buf(), reason: e.to_string() }
    }
}

fn render_uniform(series: &UniformForcing) -> String {
    let mut out = String::with_capacity(series.len() * 24);
    for (seconds, intensity) in series.seconds.iter().zip(&series.intensity_mmhr) {
        let _ = writeln!(out, "{} {}", seconds, intensity);
    }
    out
}

fn render_cube(cube: &ForcingCube) -> Result<String> {
    let data: Vec<Vec<&[f64]>> = (0..cube.nt())
        .map(|t| cube.slice(t).chunks(cube.nx().max(1)).collect())
        .collect();

    let document = CubeDocument {
        crs: &cube.crs,
        units: "mm/hr",
        time_units: "seconds",
        x: &cube.x,
        y: &cube.y,
        time: &cube.seconds,
        sites: &cube.sites,
        data,
    };
    Ok(serde_json::to_string(&document)?)
}
