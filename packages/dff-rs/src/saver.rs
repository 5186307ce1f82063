//! Output-table writing.
//!
//! CSV with a channel-name header row. Missing samples are written as empty
//! cells, which the loader reads back as NaN.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::TraceTable;

/// Writes one table to disk, creating parent directories as needed.
#[derive(Debug, Clone)]
pub struct SignalSaver {
    output_path: PathBuf,
}

impl SignalSaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    pub fn save_csv(&self, table: &TraceTable) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(&self.output_path).map_err(io::Error::from)?;
        writer.write_record(table.names()).map_err(io::Error::from)?;
        for row in table.rows() {
            let cells: Vec<String> = row.iter().map(|&v| format_cell(v)).collect();
            writer.write_record(&cells).map_err(io::Error::from)?;
        }
        writer.flush()?;

        log::info!(
            "Saved {} frames x {} channels to {}",
            table.n_frames(),
            table.n_channels(),
            self.output_path.display()
        );
        Ok(())
    }
}

fn format_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}
