//! Accumulates normalized records into a [`SchemaModel`].

use super::{Column, SchemaModel};
use crate::error::{Error, Result};
use crate::record::SchemaRecord;

/// Counters describing what the builder did with its input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub records: usize,
    pub tables_created: usize,
    pub columns_added: usize,
    /// Records whose `(table, column)` already existed and were merged
    pub merged_columns: usize,
}

/// Builder for a schema model. Records are applied in arrival order; the
/// resulting table and column order is the first-seen order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    model: SchemaModel,
    stats: BuildStats,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record: create or reuse the table, then append or merge
    /// the column.
    pub fn add_record(&mut self, record: &SchemaRecord) {
        self.stats.records += 1;

        let (table, created) = self.model.table_entry(&record.table);
        if created {
            self.stats.tables_created += 1;
            tracing::debug!("new table {}", record.table);
        }
        if table.description.is_none() {
            table.description = record.table_description.clone();
        }

        match table.column_position(&record.column) {
            Some(pos) => {
                let column = &mut table.columns[pos];
                merge_column(column, record);
                self.stats.merged_columns += 1;
            }
            None => {
                table.columns.push(Column {
                    name: record.column.clone(),
                    data_type: record.data_type.clone(),
                    mode: record.mode,
                    description: record.description.clone(),
                });
                self.stats.columns_added += 1;
            }
        }
    }

    pub fn add_records<'a>(&mut self, records: impl IntoIterator<Item = &'a SchemaRecord>) {
        for record in records {
            self.add_record(record);
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Finish building. Fails only when no table was accumulated.
    pub fn build(self) -> Result<SchemaModel> {
        if self.model.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(self.model)
    }
}

/// Backfill an existing column from a later duplicate record.
///
/// The description is last-non-empty-wins. The mode only moves away from
/// `NULLABLE`; a later default record never downgrades `REQUIRED` or
/// `REPEATED`. The type is kept from the first record.
fn merge_column(column: &mut Column, record: &SchemaRecord) {
    if let Some(desc) = &record.description {
        column.description = Some(desc.clone());
    }
    if !record.mode.is_default() {
        column.mode = record.mode;
    }
}

/// Build a model from records in one call
pub fn build_model<'a>(records: impl IntoIterator<Item = &'a SchemaRecord>) -> Result<SchemaModel> {
    let mut builder = SchemaBuilder::new();
    builder.add_records(records);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordOrigin;
    use crate::schema::ColumnMode;

    fn record(table: &str, column: &str, mode: ColumnMode, desc: Option<&str>) -> SchemaRecord {
        SchemaRecord {
            origin: RecordOrigin::CsvRow { line: 1 },
            source: "test.csv".to_string(),
            table: table.to_string(),
            table_description: None,
            column: column.to_string(),
            data_type: "STRING".to_string(),
            mode,
            description: desc.map(str::to_string),
        }
    }

    #[test]
    fn test_insertion_order() {
        let records = vec![
            record("orders", "order_id", ColumnMode::Required, None),
            record("customers", "id", ColumnMode::Required, None),
            record("orders", "customer_id", ColumnMode::Nullable, None),
        ];
        let model = build_model(&records).unwrap();

        let tables: Vec<_> = model.tables().iter().map(|t| t.qualified_name.as_str()).collect();
        assert_eq!(tables, vec!["orders", "customers"]);
        let orders = model.table("orders").unwrap();
        let cols: Vec<_> = orders.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cols, vec!["order_id", "customer_id"]);
    }

    #[test]
    fn test_description_backfill() {
        let records = vec![
            record("t", "a", ColumnMode::Nullable, None),
            record("t", "b", ColumnMode::Nullable, None),
            record("t", "a", ColumnMode::Nullable, Some("filled later")),
        ];
        let model = build_model(&records).unwrap();
        let table = model.table("t").unwrap();

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].name, "a");
        assert_eq!(table.columns[0].description.as_deref(), Some("filled later"));
    }

    #[test]
    fn test_mode_never_downgraded() {
        let records = vec![
            record("t", "a", ColumnMode::Required, None),
            record("t", "a", ColumnMode::Nullable, None),
            record("t", "b", ColumnMode::Nullable, None),
            record("t", "b", ColumnMode::Repeated, None),
        ];
        let model = build_model(&records).unwrap();
        let table = model.table("t").unwrap();

        assert_eq!(table.columns[0].mode, ColumnMode::Required);
        assert_eq!(table.columns[1].mode, ColumnMode::Repeated);
    }

    #[test]
    fn test_table_description_backfill() {
        let mut first = record("t", "a", ColumnMode::Nullable, None);
        first.table_description = None;
        let mut second = record("t", "b", ColumnMode::Nullable, None);
        second.table_description = Some("Described".to_string());
        let mut third = record("t", "c", ColumnMode::Nullable, None);
        third.table_description = Some("Ignored".to_string());

        let model = build_model([&first, &second, &third]).unwrap();
        assert_eq!(model.table("t").unwrap().description.as_deref(), Some("Described"));
    }

    #[test]
    fn test_idempotent_on_repeated_input() {
        let records = vec![
            record("orders", "id", ColumnMode::Required, Some("pk")),
            record("orders", "customer_id", ColumnMode::Nullable, None),
            record("customers", "id", ColumnMode::Required, None),
        ];
        let once = build_model(&records).unwrap();
        let twice = build_model(records.iter().chain(records.iter())).unwrap();

        assert_eq!(once.tables(), twice.tables());
    }

    #[test]
    fn test_stats() {
        let records = vec![
            record("t", "a", ColumnMode::Nullable, None),
            record("t", "a", ColumnMode::Nullable, None),
            record("u", "a", ColumnMode::Nullable, None),
        ];
        let mut builder = SchemaBuilder::new();
        builder.add_records(&records);

        assert_eq!(
            builder.stats(),
            BuildStats {
                records: 3,
                tables_created: 2,
                columns_added: 2,
                merged_columns: 1,
            }
        );
    }

    #[test]
    fn test_empty_schema() {
        let records: Vec<SchemaRecord> = Vec::new();
        assert!(matches!(build_model(&records), Err(Error::EmptySchema)));
    }
}
