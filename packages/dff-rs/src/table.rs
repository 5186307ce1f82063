use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{DffError, Result};

/// Column-oriented fluorescence trace table.
///
/// One f64 series per channel in [channels × frames] layout, with `f64::NAN`
/// marking missing samples. Tables are never mutated in place; every pipeline
/// stage produces a fresh one.
#[derive(Debug, Clone)]
pub struct TraceTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl TraceTable {
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(DffError::Validation {
                param: "columns",
                reason: format!(
                    "{} channel names for {} columns",
                    names.len(),
                    columns.len()
                ),
            });
        }
        if let Some(first) = columns.first() {
            let n = first.len();
            for (idx, col) in columns.iter().enumerate() {
                if col.len() != n {
                    return Err(DffError::Validation {
                        param: "columns",
                        reason: format!(
                            "column '{}' has {} frames, expected {}",
                            names[idx],
                            col.len(),
                            n
                        ),
                    });
                }
            }
        }
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(DffError::Validation {
                    param: "columns",
                    reason: format!("duplicate channel name '{}'", name),
                });
            }
        }
        Ok(Self { names, columns })
    }

    /// Build from row-major data; every row must match the channel count.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let width = names.len();
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DffError::Validation {
                    param: "rows",
                    reason: format!("row {} has {} cells, expected {}", r, row.len(), width),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                columns[c].push(value);
            }
        }
        Self::new(names, columns)
    }

    /// Tile one value per channel over `n_frames` rows.
    pub fn from_channel_constants(values: &ChannelVector, n_frames: usize) -> Self {
        let columns = values
            .values()
            .iter()
            .map(|&v| vec![v; n_frames])
            .collect();
        Self {
            names: values.names().to_vec(),
            columns,
        }
    }

    pub fn empty() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn n_channels(&self) -> usize {
        self.columns.len()
    }

    pub fn n_frames(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.n_channels() == 0 || self.n_frames() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Channel series by position. Panics if `idx` is out of range.
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Apply `f` to every channel, keeping the labels. `f` must preserve the
    /// frame count.
    pub fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&str, &[f64]) -> Vec<f64>,
    {
        let columns = self
            .iter_columns()
            .map(|(name, col)| f(name, col))
            .collect();
        Self {
            names: self.names.clone(),
            columns,
        }
    }

    /// Parallel variant of [`map_columns`](Self::map_columns) for the heavier
    /// per-channel transforms.
    pub fn par_map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&str, &[f64]) -> Vec<f64> + Sync,
    {
        let columns = self
            .names
            .par_iter()
            .zip(self.columns.par_iter())
            .map(|(name, col)| f(name, col))
            .collect();
        Self {
            names: self.names.clone(),
            columns,
        }
    }

    /// Row-major view for serial writers.
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.n_frames()).map(move |r| self.columns.iter().map(|col| col[r]).collect())
    }
}

impl Serialize for TraceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, col) in self.names.iter().zip(&self.columns) {
            map.serialize_entry(name, col)?;
        }
        map.end()
    }
}

/// One named scalar per channel, e.g. the representative F0 values.
#[derive(Debug, Clone)]
pub struct ChannelVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ChannelVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(DffError::Validation {
                param: "channels",
                reason: format!("{} channel names for {} values", names.len(), values.len()),
            });
        }
        Ok(Self { names, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl Serialize for ChannelVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.names.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TraceTable {
        TraceTable::new(
            vec!["ROI_1".to_string(), "ROI_2".to_string()],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let t = table();
        assert_eq!(t.n_channels(), 2);
        assert_eq!(t.n_frames(), 3);
        assert!(!t.is_empty());
        assert!(TraceTable::empty().is_empty());
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = TraceTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 2.0], vec![3.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = TraceTable::new(
            vec!["a".to_string(), "a".to_string()],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_name_count_mismatch_rejected() {
        let result = TraceTable::new(vec!["a".to_string()], vec![vec![1.0], vec![2.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_column_by_name() {
        let t = table();
        assert_eq!(t.column_by_name("ROI_2"), Some(&[4.0, 5.0, 6.0][..]));
        assert!(t.column_by_name("ROI_9").is_none());
    }

    #[test]
    fn test_from_rows_transposes() {
        let t = TraceTable::from_rows(
            vec!["a".to_string(), "b".to_string()],
            &[vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]],
        )
        .unwrap();
        assert_eq!(t.column(0), &[1.0, 2.0, 3.0]);
        assert_eq!(t.column(1), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_map_columns_keeps_labels_and_order() {
        let t = table();
        let doubled = t.map_columns(|_, col| col.iter().map(|v| v * 2.0).collect());
        assert_eq!(doubled.names(), t.names());
        assert_eq!(doubled.column(0), &[2.0, 4.0, 6.0]);
        assert_eq!(doubled.column(1), &[8.0, 10.0, 12.0]);
    }

    #[test]
    fn test_par_map_columns_matches_serial() {
        let t = table();
        let serial = t.map_columns(|_, col| col.iter().map(|v| v + 1.0).collect());
        let parallel = t.par_map_columns(|_, col| col.iter().map(|v| v + 1.0).collect());
        assert_eq!(serial.columns(), parallel.columns());
    }

    #[test]
    fn test_from_channel_constants_tiles() {
        let vec = ChannelVector::new(vec!["a".to_string(), "b".to_string()], vec![7.0, 9.0]).unwrap();
        let t = TraceTable::from_channel_constants(&vec, 4);
        assert_eq!(t.n_frames(), 4);
        assert_eq!(t.column(0), &[7.0, 7.0, 7.0, 7.0]);
        assert_eq!(t.column(1), &[9.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_rows_round_trip() {
        let t = table();
        let rows: Vec<Vec<f64>> = t.rows().collect();
        assert_eq!(rows, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn test_serialize_as_map_with_null_for_nan() {
        let t = TraceTable::new(vec!["a".to_string()], vec![vec![1.0, f64::NAN]]).unwrap();
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["a"][0], 1.0);
        assert!(value["a"][1].is_null());
    }

    #[test]
    fn test_channel_vector_get() {
        let vec = ChannelVector::new(vec!["x".to_string()], vec![0.5]).unwrap();
        assert_eq!(vec.get("x"), Some(0.5));
        assert_eq!(vec.get("y"), None);
    }
}
