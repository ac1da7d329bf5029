use crate::prelude::{CnetError, CnetResult};
use crate::telemetry::LogManager;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

const LONGITUDE_COLUMN: &str = "PositiveEast360Longitude";
const LATITUDE_COLUMN: &str = "PlanetocentricLatitude";

/// Converts image pixel coordinates to ground longitude/latitude.
pub trait CoordinateConverter {
    /// Returns one (longitude, latitude) per (sample, line), in order.
    fn convert(&self, image: &Path, pixels: &[(f64, f64)]) -> CnetResult<Vec<(f64, f64)>>;
}

/// Runs ISIS `campt` over a coordinate list for one cube.
#[derive(Debug, Clone)]
pub struct CamptConverter {
    command: PathBuf,
    work_root: Option<PathBuf>,
    logger: LogManager,
}

impl CamptConverter {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            work_root: None,
            logger: LogManager::new("campt"),
        }
    }

    /// Scratch directories go under `root` instead of the system temp dir.
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }
}

impl Default for CamptConverter {
    fn default() -> Self {
        Self::new("campt")
    }
}

impl CoordinateConverter for CamptConverter {
    fn convert(&self, image: &Path, pixels: &[(f64, f64)]) -> CnetResult<Vec<(f64, f64)>> {
        if pixels.is_empty() {
            return Ok(Vec::new());
        }

        // Removed when dropped, including on every early return below.
        let mut builder = tempfile::Builder::new();
        builder.prefix("campt");
        let workdir = match &self.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let coordlist = workdir.path().join("coords.lis");
        let output = workdir.path().join("campt.csv");

        let listing: String = pixels
            .iter()
            .map(|(sample, line)| format!("{}, {}\n", sample, line))
            .collect();
        fs::write(&coordlist, listing)?;

        self.logger.detail(&format!(
            "converting {} pixels on {}",
            pixels.len(),
            image.display()
        ));
        let result = Command::new(&self.command)
            .arg(format!("from={}", image.display()))
            .arg("usecoordlist=yes")
            .arg(format!("coordlist={}", coordlist.display()))
            .arg("coordtype=image")
            .arg(format!("to={}", output.display()))
            .arg("format=flat")
            .arg("append=false")
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    CnetError::Tool(format!("{} not found on PATH", self.command.display()))
                }
                _ => CnetError::Io(err),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CnetError::Tool(format!(
                "{} failed on {} ({}): {}",
                self.command.display(),
                image.display(),
                result.status,
                stderr.trim()
            )));
        }

        let flat = fs::read_to_string(&output)?;
        parse_flat_output(&flat)
    }
}

/// Longitude/latitude rows from campt's flat (CSV) output, in file order.
pub fn parse_flat_output(text: &str) -> CnetResult<Vec<(f64, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| CnetError::Tool(format!("campt output has no {} column", name)))
    };
    let lon_index = column(LONGITUDE_COLUMN)?;
    let lat_index = column(LATITUDE_COLUMN)?;

    let mut coordinates = Vec::new();
    for record in reader.records() {
        let record = record?;
        let value = |index: usize| -> CnetResult<f64> {
            let cell = record.get(index).unwrap_or_default();
            cell.parse()
                .map_err(|_| CnetError::Tool(format!("unparseable campt value '{}'", cell)))
        };
        coordinates.push((value(lon_index)?, value(lat_index)?));
    }
    Ok(coordinates)
}
