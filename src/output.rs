// src/output.rs
use crate::smile::SmileReport;
use std::fs::File;
use std::io::{self, BufWriter, Write};

pub fn write_smile_to_csv(filename: &str, report: &SmileReport) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    writeln!(file, "dim,expiry_index,strike,expected_vol,simulated_vol,passed")?;
    for p in &report.points {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            p.dim, p.expiry_index, p.strike, p.expected, p.simulated, p.passed
        )?;
    }
    file.flush()
}

pub fn write_summary_to_csv(filename: &str, summary_data: &[(&str, String)]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    for (key, value) in summary_data {
        writeln!(file, "{},{}", key, value)?;
    }
    file.flush()
}
