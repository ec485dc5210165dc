//! In-memory labeled table built from query results

use serde::{Deserialize, Serialize};

use crate::types::FieldValue;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Rows of values under named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
}

#[derive(Deserialize)]
struct RawFrame {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
}

impl TryFrom<RawFrame> for Frame {
    type Error = FrameError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        Frame::new(raw.columns, raw.rows)
    }
}

impl Frame {
    /// Build a frame, checking every row against the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Result<Self, FrameError> {
        let expected = columns.len();
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(FrameError::RaggedRow {
                row,
                expected,
                found,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<FieldValue>> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// All cells of the named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&FieldValue>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(
            vec!["id".into(), "tmp".into()],
            vec![
                vec!["72502,2020-01-01".into(), "+0011,1".into()],
                vec!["72503,2020-01-02".into(), FieldValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_frame_shape() {
        let frame = sample();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.width(), 2);
        assert!(!frame.is_empty());
        assert_eq!(frame.columns(), ["id", "tmp"]);
    }

    #[test]
    fn test_column_lookup() {
        let frame = sample();
        let tmp = frame.column("tmp").unwrap();
        assert_eq!(tmp, vec![&FieldValue::from("+0011,1"), &FieldValue::Null]);
        assert!(frame.column("wnd").is_none());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = Frame::new(vec!["a".into()], vec![vec![], vec![FieldValue::Null]]).unwrap_err();
        assert_eq!(
            err,
            FrameError::RaggedRow {
                row: 0,
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_frame_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"columns":["id","tmp"],"rows":[["72502,2020-01-01","+0011,1"],["72503,2020-01-02",null]]}"#
        );
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_ragged_json_rejected() {
        let err = serde_json::from_str::<Frame>(r#"{"columns":["a","b"],"rows":[[1]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 values, expected 2"));
    }
}
