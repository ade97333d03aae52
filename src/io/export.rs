//! CSV export for per-agent samples and the fleet load profile.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::load::{EnergyBucket, LoadPoint};
use crate::sim::types::Sample;

/// Timestamp layout used in every exported file.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column header for SOC and power sample files.
const SAMPLE_HEADER: [&str; 3] = ["agent", "timestamp", "value"];

/// Column header for the fleet load file.
const LOAD_HEADER: [&str; 3] = ["timestamp", "load_kw", "charging_agents"];

const ENERGY_HEADER: [&str; 2] = ["bucket_start", "energy_kwh"];

/// Exports `(agent, timestamp, value)` samples to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_samples_csv(samples: &[Sample], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_samples_csv(samples, io::BufWriter::new(file))
}

/// Writes samples as CSV to any writer.
///
/// Rows keep the order of `samples`; output is deterministic for identical
/// inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_samples_csv(samples: &[Sample], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SAMPLE_HEADER)?;

    for s in samples {
        wtr.write_record(&[
            s.agent.clone(),
            s.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", s.value),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the fleet load profile to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_load_csv(points: &[LoadPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_load_csv(points, io::BufWriter::new(file))
}

/// Writes load points as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_load_csv(points: &[LoadPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(LOAD_HEADER)?;

    for p in points {
        wtr.write_record(&[
            p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", p.load_kw),
            p.charging_agents.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports bucketed fleet energy to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_energy_csv(buckets: &[EnergyBucket], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_energy_csv(buckets, io::BufWriter::new(file))
}

/// Writes bucketed fleet energy as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_energy_csv(buckets: &[EnergyBucket], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(ENERGY_HEADER)?;

    for b in buckets {
        wtr.write_record(&[
            b.start.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", b.energy_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
