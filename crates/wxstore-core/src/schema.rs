//! Table shape shared by table creation, inserts and bulk import
//!
//! The weather table is described once here. The DDL, the insert
//! statement and the mapping from source-file headers to columns are all
//! derived from the same column list.

use crate::types::FieldValue;

/// Default table name
pub mod tables {
    pub const DATASOURCE: &str = "datasource";
}

/// Headers every weather import file must carry
pub mod headers {
    pub const STATION: &str = "STATION";
    pub const DATE: &str = "DATE";
    pub const NAME: &str = "NAME";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const DEW: &str = "DEW";
    pub const SLP: &str = "SLP";
    pub const TMP: &str = "TMP";
    pub const VIS: &str = "VIS";
    pub const WND: &str = "WND";
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("source file is missing required column '{0}'")]
    MissingColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

/// Where an imported column takes its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A single source header; the cell goes through [`FieldValue::infer`]
    Header(&'static str),
    /// Raw cells of several headers joined into one text value
    Joined {
        headers: &'static [&'static str],
        separator: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub source: ColumnSource,
}

impl ColumnDef {
    fn sql(&self) -> String {
        let mut def = format!("{} {}", self.name, self.column_type.sql());
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        def
    }
}

/// A table name plus its ordered columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// The 9-column weather observation table
    pub fn weather(table: impl Into<String>) -> Self {
        use headers::*;

        let col = |name, column_type, header| ColumnDef {
            name,
            column_type,
            not_null: false,
            source: ColumnSource::Header(header),
        };

        Self {
            name: table.into(),
            columns: vec![
                ColumnDef {
                    name: "id",
                    column_type: ColumnType::Text,
                    not_null: true,
                    source: ColumnSource::Joined {
                        headers: &[STATION, DATE],
                        separator: ",",
                    },
                },
                col("name", ColumnType::Text, NAME),
                col("latitude", ColumnType::Real, LATITUDE),
                col("longitude", ColumnType::Real, LONGITUDE),
                col("dew", ColumnType::Text, DEW),
                col("slp", ColumnType::Text, SLP),
                col("tmp", ColumnType::Text, TMP),
                col("vis", ColumnType::Text, VIS),
                col("wnd", ColumnType::Text, WND),
            ],
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Table name as a quoted SQL identifier
    pub fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }

    pub fn create_statement(&self) -> String {
        let defs: Vec<String> = self.columns.iter().map(ColumnDef::sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quoted_name(),
            defs.join(", ")
        )
    }

    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quoted_name())
    }

    /// Positional insert binding one value per column
    pub fn insert_statement(&self) -> String {
        let slots: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        format!("INSERT INTO {} VALUES ({})", self.quoted_name(), slots.join(", "))
    }

    pub fn select_all_statement(&self) -> String {
        format!("SELECT * FROM {}", self.quoted_name())
    }

    pub fn count_statement(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quoted_name())
    }

    /// Every source header the import reads, in first-use order
    pub fn source_headers(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for column in &self.columns {
            let used: &[&'static str] = match &column.source {
                ColumnSource::Header(h) => std::slice::from_ref(h),
                ColumnSource::Joined { headers, .. } => *headers,
            };
            for &h in used {
                if !out.contains(&h) {
                    out.push(h);
                }
            }
        }
        out
    }

    /// Resolve source headers to field positions in a file's header row.
    ///
    /// Extra headers are ignored. Fails on the first required header that
    /// is absent.
    pub fn bind_headers<S: AsRef<str>>(
        &self,
        file_headers: &[S],
    ) -> Result<HeaderBinding, SchemaError> {
        let position = |wanted: &str| {
            file_headers
                .iter()
                .position(|h| h.as_ref() == wanted)
                .ok_or_else(|| SchemaError::MissingColumn(wanted.to_string()))
        };

        let mut slots = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let slot = match &column.source {
                ColumnSource::Header(h) => Slot::Single(position(*h)?),
                ColumnSource::Joined { headers, separator } => Slot::Joined {
                    positions: headers
                        .iter()
                        .map(|h| position(*h))
                        .collect::<Result<_, _>>()?,
                    separator: *separator,
                },
            };
            slots.push(slot);
        }
        Ok(HeaderBinding { slots })
    }
}

/// Double-quote `name`, doubling any embedded quote
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Debug, Clone)]
enum Slot {
    Single(usize),
    Joined {
        positions: Vec<usize>,
        separator: &'static str,
    },
}

/// Column positions resolved against one source file
#[derive(Debug, Clone)]
pub struct HeaderBinding {
    slots: Vec<Slot>,
}

impl HeaderBinding {
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Project one source record into a row in column order.
    ///
    /// Positions past the end of `record` read as empty cells.
    pub fn project<S: AsRef<str>>(&self, record: &[S]) -> Vec<FieldValue> {
        let cell = |i: usize| record.get(i).map_or("", |s| s.as_ref());
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Single(i) => FieldValue::infer(cell(*i)),
                Slot::Joined {
                    positions,
                    separator,
                } => {
                    let parts: Vec<&str> = positions.iter().map(|i| cell(*i)).collect();
                    FieldValue::Text(parts.join(*separator))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeatherRecord;

    #[test]
    fn test_weather_statements() {
        let schema = TableSchema::weather(tables::DATASOURCE);
        insta::assert_snapshot!(
            schema.create_statement(),
            @"CREATE TABLE IF NOT EXISTS \"datasource\" (id TEXT NOT NULL, name TEXT, latitude REAL, longitude REAL, dew TEXT, slp TEXT, tmp TEXT, vis TEXT, wnd TEXT)"
        );
        insta::assert_snapshot!(
            schema.insert_statement(),
            @"INSERT INTO \"datasource\" VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        );
        assert_eq!(schema.drop_statement(), r#"DROP TABLE IF EXISTS "datasource""#);
        assert_eq!(schema.select_all_statement(), r#"SELECT * FROM "datasource""#);
    }

    #[test]
    fn test_table_names_are_quoted() {
        assert_eq!(quote_identifier("order"), r#""order""#);
        assert_eq!(quote_identifier("my-obs"), r#""my-obs""#);
        assert_eq!(quote_identifier(r#"a"b"#), r#""a""b""#);
        assert_eq!(
            TableSchema::weather("my-obs").count_statement(),
            r#"SELECT COUNT(*) FROM "my-obs""#
        );
    }

    #[test]
    fn test_schema_matches_record_layout() {
        let schema = TableSchema::weather("obs");
        assert_eq!(schema.column_names(), WeatherRecord::FIELD_NAMES.to_vec());
    }

    #[test]
    fn test_source_headers() {
        let schema = TableSchema::weather("obs");
        assert_eq!(
            schema.source_headers(),
            vec!["STATION", "DATE", "NAME", "LATITUDE", "LONGITUDE", "DEW", "SLP", "TMP", "VIS", "WND"]
        );
    }

    #[test]
    fn test_projection_by_header_name() {
        let schema = TableSchema::weather("obs");
        // Reordered headers plus an extra column
        let file_headers = [
            "NAME", "DATE", "REPORT_TYPE", "STATION", "LATITUDE", "LONGITUDE", "WND", "VIS",
            "TMP", "SLP", "DEW",
        ];
        let binding = schema.bind_headers(&file_headers).unwrap();
        assert_eq!(binding.width(), 9);

        let record = [
            "NEWARK", "2020-01-01T00:51:00", "FM-15", "72502", "40.6825", "-74.1694",
            "320,1,N,0057,1", "016000,1,9,9", "+0011,1", "10234,1", "-0056,1",
        ];
        let row = binding.project(&record);
        assert_eq!(row[0], FieldValue::Text("72502,2020-01-01T00:51:00".into()));
        assert_eq!(row[1], FieldValue::Text("NEWARK".into()));
        assert_eq!(row[2], FieldValue::Real(40.6825));
        assert_eq!(row[3], FieldValue::Real(-74.1694));
        assert_eq!(row[4], FieldValue::Text("-0056,1".into()));
        assert_eq!(row[8], FieldValue::Text("320,1,N,0057,1".into()));
    }

    #[test]
    fn test_missing_header() {
        let schema = TableSchema::weather("obs");
        let err = schema.bind_headers(&["STATION", "DATE", "NAME"]).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("LATITUDE".to_string()));
    }
}
