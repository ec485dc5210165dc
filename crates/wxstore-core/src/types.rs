//! Core data types for stored weather observations

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value as stored in, or read back from, the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Convert a raw cell from a delimited file.
    ///
    /// Empty cells become `Null`, whole numbers `Integer`, finite decimals
    /// `Real`; anything else is kept verbatim as `Text`.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(v) = raw.parse::<i64>() {
            return FieldValue::Integer(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => FieldValue::Real(v),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Real(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Real(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Blob(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02x}")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Errors converting a raw row into a [`WeatherRecord`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("weather record needs {expected} fields, got {found}")]
    Width { expected: usize, found: usize },

    #[error("record id must be text, got {0:?}")]
    InvalidId(FieldValue),
}

/// One station observation as stored in the weather table.
///
/// Field order is the column order of [`crate::TableSchema::weather`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherRecord {
    /// Station code and observation date joined by `,`
    pub id: String,
    pub name: FieldValue,
    pub latitude: FieldValue,
    pub longitude: FieldValue,
    /// Dew point, encoded as in the source file
    pub dew: FieldValue,
    /// Sea-level pressure
    pub slp: FieldValue,
    /// Air temperature
    pub tmp: FieldValue,
    /// Visibility
    pub vis: FieldValue,
    /// Wind observation
    pub wnd: FieldValue,
}

impl WeatherRecord {
    pub const FIELD_NAMES: [&'static str; 9] = [
        "id",
        "name",
        "latitude",
        "longitude",
        "dew",
        "slp",
        "tmp",
        "vis",
        "wnd",
    ];

    /// Build the composite identifier from a station code and date
    pub fn make_id(station: &str, date: &str) -> String {
        format!("{station},{date}")
    }

    /// Values in column order
    pub fn into_row(self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.id),
            self.name,
            self.latitude,
            self.longitude,
            self.dew,
            self.slp,
            self.tmp,
            self.vis,
            self.wnd,
        ]
    }
}

impl TryFrom<Vec<FieldValue>> for WeatherRecord {
    type Error = RecordError;

    fn try_from(row: Vec<FieldValue>) -> Result<Self, Self::Error> {
        let found = row.len();
        let [id, name, latitude, longitude, dew, slp, tmp, vis, wnd]: [FieldValue; 9] = row
            .try_into()
            .map_err(|_| RecordError::Width {
                expected: Self::FIELD_NAMES.len(),
                found,
            })?;
        let id = match id {
            FieldValue::Text(s) => s,
            other => return Err(RecordError::InvalidId(other)),
        };
        Ok(Self {
            id,
            name,
            latitude,
            longitude,
            dew,
            slp,
            tmp,
            vis,
            wnd,
        })
    }
}
