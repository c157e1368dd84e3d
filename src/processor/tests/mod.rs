//! Integration tests for the processor module
//!
//! Runs the station processor against synthetic station sheets written
//! to temporary directories.

pub mod basic_processing;
pub mod error_handling;

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const RAW_HEADER: &str = "Unnamed: 0,DIA,TMED (oC),TMAX (oC),TMIN (oC),UR MED (%),\
                              Vento (m/s),Rad. Global (MJ/ma^2),Chuva (mm),Camargo";

/// Write a raw sheet with `days` day-of-year rows and mild day-to-day variation.
/// Every seventh temperature is blank to exercise the imputer.
pub fn write_raw_sheet(dir: &Path, station: &str, days: usize) {
    let mut csv = String::from(RAW_HEADER);
    csv.push('\n');
    for day in 1..=days {
        let wobble = (day % 5) as f64 * 0.3;
        let tmed = if day % 7 == 0 {
            String::new()
        } else {
            format!("{:.1}", 26.5 + wobble)
        };
        writeln!(
            csv,
            "{},{},{},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.2}",
            day - 1,
            day,
            tmed,
            31.5 + wobble,
            22.0 + wobble / 2.0,
            74.0 + wobble * 3.0,
            1.4 + wobble / 3.0,
            16.0 + wobble * 4.0,
            if day % 4 == 0 { 6.5 } else { 0.0 },
            3.8 + wobble / 2.0,
        )
        .unwrap();
    }
    fs::write(dir.join(format!("{}.csv", station)), csv).unwrap();
}
