use std::{error::Error, io::Read, path::Path};

use chrono::{DateTime, Utc};
use model::GeoPoint;
use serde::Deserialize;
use tracker::position::Fix;

/// One row of a recorded track: `latitude,longitude,timestamp[,accuracy]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub accuracy: Option<f64>,
}

impl FixRecord {
    /// Rows without an accuracy are taken as exact.
    pub fn to_fix(&self) -> Fix {
        Fix::new(
            GeoPoint::new(self.latitude, self.longitude),
            self.timestamp,
            self.accuracy.unwrap_or(0.0),
        )
    }
}

pub fn read_fixes<P: AsRef<Path>>(path: P) -> Result<Vec<FixRecord>, Box<dyn Error>> {
    let reader = csv::Reader::from_path(path)?;
    collect(reader)
}

pub fn read_fixes_from<R: Read>(input: R) -> Result<Vec<FixRecord>, Box<dyn Error>> {
    collect(csv::Reader::from_reader(input))
}

fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<FixRecord>, Box<dyn Error>> {
    let mut fixes = Vec::new();
    for row in reader.deserialize() {
        let fix: FixRecord = row?;
        fixes.push(fix);
    }
    Ok(fixes)
}
