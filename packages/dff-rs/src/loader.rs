//! Input-table loading.
//!
//! Tables are delimiter-separated numeric text (CSV, or tab-separated for
//! `.tsv`/`.txt`/`.dat`), memory-mapped and parsed without a header
//! convention: every cell is coerced to `f64`, cells that do not parse become
//! NaN, and rows that are entirely NaN are dropped. That absorbs header rows
//! and blank lines the way the acquisition software emits them. Channels are
//! named `ROI_1..ROI_k` by position.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{DffError, Result};
use crate::table::TraceTable;

/// Supported input formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(TableFormat::Csv),
            "tsv" | "txt" | "dat" => Some(TableFormat::Tsv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv => b'\t',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
        }
    }
}

/// Reads one recording into a [`TraceTable`].
#[derive(Debug, Clone)]
pub struct SignalLoader {
    path: PathBuf,
    drop_first: usize,
}

impl SignalLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            drop_first: 0,
        }
    }

    /// Discard this many leading frames after parsing. Dropping every frame
    /// (or more) is an error.
    pub fn with_drop_first(mut self, drop_first: usize) -> Self {
        self.drop_first = drop_first;
        self
    }

    pub fn load(&self) -> Result<TraceTable> {
        if !self.path.exists() {
            return Err(DffError::FileNotFound(self.path.display().to_string()));
        }
        let format = TableFormat::from_path(&self.path)
            .ok_or_else(|| DffError::UnsupportedFileType(self.path.display().to_string()))?;

        let mmap = mmap_file(&self.path)?;
        let table = parse_table_bytes(&mmap, format)?;
        let table = trim_leading(table, self.drop_first)?;

        log::info!(
            "Loaded {} frames x {} channels from {}",
            table.n_frames(),
            table.n_channels(),
            self.path.display()
        );
        Ok(table)
    }
}

fn mmap_file(path: &Path) -> std::io::Result<Mmap> {
    let file = File::open(path)?;
    unsafe { Mmap::map(&file) }
}

/// Parse delimiter-separated bytes into a table. Ragged rows pad to the
/// widest row with NaN.
pub fn parse_table_bytes(bytes: &[u8], format: TableFormat) -> Result<TraceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter())
        .from_reader(bytes);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width = 0usize;
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| DffError::ParseError(e.to_string()))?;
        let row: Vec<f64> = record.iter().map(parse_cell).collect();
        if row.iter().all(|v| v.is_nan()) {
            skipped += 1;
            continue;
        }
        width = width.max(row.len());
        rows.push(row);
    }
    if skipped > 0 {
        log::debug!("Skipped {} rows with no numeric cells", skipped);
    }
    for row in &mut rows {
        row.resize(width, f64::NAN);
    }
    let names = (1..=width).map(|i| format!("ROI_{}", i)).collect();
    TraceTable::from_rows(names, &rows)
}

fn parse_cell(cell: &str) -> f64 {
    cell.trim()
        .trim_start_matches('\u{feff}')
        .parse()
        .unwrap_or(f64::NAN)
}

fn trim_leading(table: TraceTable, drop_first: usize) -> Result<TraceTable> {
    if drop_first == 0 {
        return Ok(table);
    }
    let n = table.n_frames();
    if drop_first >= n {
        return Err(DffError::Validation {
            param: "drop_first",
            reason: format!(
                "requested to drop {} frames but only {} are available",
                drop_first, n
            ),
        });
    }
    Ok(table.map_columns(|_, col| col[drop_first..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "1,2\n3,4\n5,6\n");
        let table = SignalLoader::new(&path).load().unwrap();
        assert_eq!(table.names(), &["ROI_1".to_string(), "ROI_2".to_string()]);
        assert_eq!(table.column(0), &[1.0, 3.0, 5.0]);
        assert_eq!(table.column(1), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_header_and_blank_rows_are_absorbed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "cell_a,cell_b\n1,2\n,\n3,4\n");
        let table = SignalLoader::new(&path).load().unwrap();
        assert_eq!(table.n_frames(), 2);
        assert_eq!(table.column(0), &[1.0, 3.0]);
    }

    #[test]
    fn test_unparsable_cell_becomes_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "1,x\n2,3\n");
        let table = SignalLoader::new(&path).load().unwrap();
        assert_eq!(table.n_frames(), 2);
        assert!(table.column(1)[0].is_nan());
        assert_eq!(table.column(1)[1], 3.0);
    }

    #[test]
    fn test_ragged_rows_pad_with_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "1\n2,3\n");
        let table = SignalLoader::new(&path).load().unwrap();
        assert_eq!(table.n_channels(), 2);
        assert!(table.column(1)[0].is_nan());
        assert_eq!(table.column(1)[1], 3.0);
    }

    #[test]
    fn test_tab_separated_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["traces.tsv", "traces.txt", "traces.dat"] {
            let path = write_fixture(&dir, name, "1\t2\n3\t4\n");
            let table = SignalLoader::new(&path).load().unwrap();
            assert_eq!(table.n_channels(), 2);
            assert_eq!(table.column(1), &[2.0, 4.0]);
        }
    }

    #[test]
    fn test_scientific_notation_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "\u{feff}1.5e2,-0.5\n1,2\n");
        let table = SignalLoader::new(&path).load().unwrap();
        assert_eq!(table.column(0)[0], 150.0);
        assert_eq!(table.column(1)[0], -0.5);
    }

    #[test]
    fn test_missing_file() {
        let err = SignalLoader::new("/no/such/file.csv").load().unwrap_err();
        assert!(matches!(err, DffError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.xlsx", "1,2\n");
        let err = SignalLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, DffError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_drop_first_trims_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "1\n2\n3\n4\n5\n");
        let table = SignalLoader::new(&path).with_drop_first(2).load().unwrap();
        assert_eq!(table.column(0), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_drop_first_overrun_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "traces.csv", "1\n2\n3\n");
        for drop in [3, 4] {
            let err = SignalLoader::new(&path)
                .with_drop_first(drop)
                .load()
                .unwrap_err();
            assert!(matches!(
                err,
                DffError::Validation {
                    param: "drop_first",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_extension("CSV"), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_extension("dat"), Some(TableFormat::Tsv));
        assert_eq!(TableFormat::from_extension("xlsx"), None);
        assert_eq!(
            TableFormat::from_path(Path::new("/data/run7.txt")),
            Some(TableFormat::Tsv)
        );
    }
}
