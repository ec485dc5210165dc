//! Weather-table operations built on the generic statement API

use tracing::{info, instrument};
use wxstore_core::{Frame, TableSchema, WeatherRecord};

use crate::{DataStore, DbError, DbResult, StatementKind};

impl DataStore {
    /// Create the table described by `schema` if it does not exist
    pub fn create_weather_table(&self, schema: &TableSchema) -> DbResult<()> {
        self.create_table(&schema.create_statement())
    }

    pub fn drop_weather_table(&self, schema: &TableSchema) -> DbResult<()> {
        self.drop_table(&schema.drop_statement())
    }

    /// Insert a single weather record
    pub fn insert_record(&mut self, schema: &TableSchema, record: &WeatherRecord) -> DbResult<()> {
        self.execute_one(
            StatementKind::Insert,
            &schema.insert_statement(),
            &record.clone().into_row(),
        )?;
        Ok(())
    }

    /// Insert many weather records in one transaction
    pub fn insert_records(
        &mut self,
        schema: &TableSchema,
        records: &[WeatherRecord],
    ) -> DbResult<usize> {
        let rows: Vec<_> = records.iter().cloned().map(WeatherRecord::into_row).collect();
        self.execute_many(StatementKind::Insert, &schema.insert_statement(), &rows)
    }

    /// Number of rows in the weather table
    pub fn count_rows(&self, schema: &TableSchema) -> DbResult<i64> {
        let row = self.query_one(&schema.count_statement(), &[])?;
        row.and_then(|r| r.first().and_then(|v| v.as_i64()))
            .ok_or_else(|| DbError::Validation("COUNT(*) returned no value".to_string()))
    }

    /// Every stored record, in table order
    pub fn records(&self, schema: &TableSchema) -> DbResult<Vec<WeatherRecord>> {
        self.query_many(&schema.select_all_statement(), &[])?
            .into_iter()
            .map(|row| WeatherRecord::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Materialize the whole weather table.
    ///
    /// Column names come from the result metadata of `SELECT *`.
    #[instrument(skip(self, schema), fields(table = %schema.name))]
    pub fn load_frame(&self, schema: &TableSchema) -> DbResult<Frame> {
        let frame = self.query_frame(&schema.select_all_statement(), &[])?;
        info!(rows = frame.len(), columns = frame.width(), "loaded table");
        Ok(frame)
    }
}
