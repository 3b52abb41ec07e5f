//! CSV export of set-up simulation units
//!
//! One record per unit per timestamp. Magnetic columns for both models are
//! always present; the model a unit did not use is left blank.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{GridError, GridResult};
use crate::grid::SimulationUnit;
use crate::model::background::{ACTIVITY_KEYS, IONOSPHERE_KEYS, NEUTRAL_KEYS};
use crate::model::magnet::{DIPOLE_KEYS, IGRF_KEYS};
use crate::model::solar::SOLAR_KEYS;
use crate::model::MagneticField;

const POINT_KEYS: [&str; 5] = ["latitude", "longitude", "height", "offset_s", "timestamp"];

pub struct CsvGridWriter {
    pub file_path: PathBuf,
    header_written: bool,
}

impl CsvGridWriter {
    /// The file is truncated on the first write.
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        CsvGridWriter {
            file_path: file_path.as_ref().to_path_buf(),
            header_written: false,
        }
    }

    pub fn header() -> String {
        POINT_KEYS
            .iter()
            .chain(SOLAR_KEYS.iter())
            .chain(IGRF_KEYS.iter())
            .chain(DIPOLE_KEYS.iter())
            .chain(ACTIVITY_KEYS.iter())
            .chain(NEUTRAL_KEYS.iter())
            .chain(IONOSPHERE_KEYS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(",")
    }

    fn write_header(&mut self) -> GridResult<()> {
        if self.header_written {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", Self::header())?;

        self.header_written = true;
        Ok(())
    }

    /// Appends every record of `units`. Either all units are ready and all
    /// rows are written, or nothing is. Returns the number of rows.
    pub fn write_units(&mut self, units: &[SimulationUnit]) -> GridResult<usize> {
        let mut rows = Vec::new();
        for unit in units {
            rows.extend(unit_rows(unit)?);
        }

        self.write_header()?;
        let mut file = OpenOptions::new().append(true).open(&self.file_path)?;
        for row in &rows {
            writeln!(file, "{}", row)?;
        }
        Ok(rows.len())
    }
}

fn unit_rows(unit: &SimulationUnit) -> GridResult<Vec<String>> {
    let (Some(magnetic), Some(background)) = (unit.magnetic_field(), unit.background()) else {
        return Err(GridError::InvalidState {
            operation: "export",
            state: unit.state(),
        });
    };

    // everything after the solar block is fixed for the unit
    let mut tail: Vec<String> = Vec::new();
    let blanks = |n: usize| std::iter::repeat_n(String::new(), n);
    match magnetic {
        MagneticField::Igrf(_) => {
            tail.extend(magnetic.entries().iter().map(|(_, v)| v.to_string()));
            tail.extend(blanks(DIPOLE_KEYS.len()));
        }
        MagneticField::Dipole(_) => {
            tail.extend(blanks(IGRF_KEYS.len()));
            tail.extend(magnetic.entries().iter().map(|(_, v)| v.to_string()));
        }
    }
    tail.extend(background.indices.entries().iter().map(|(_, v)| v.to_string()));
    tail.extend(background.msise.entries().iter().map(|(_, v)| v.to_string()));
    tail.extend(background.iri.entries().iter().map(|(_, v)| v.to_string()));
    let tail = tail.join(",");

    let point = unit.point();
    let rows = unit
        .offsets()
        .iter()
        .zip(unit.timestamps())
        .zip(unit.solar_positions())
        .map(|((offset, when), solar)| {
            let solar = solar
                .entries()
                .iter()
                .map(|(_, v)| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{},{},{},{},{},{},{}",
                point.latitude(),
                point.longitude(),
                point.height(),
                offset,
                when.to_rfc3339(),
                solar,
                tail
            )
        })
        .collect();
    Ok(rows)
}
