use super::ColumnMetadata;

use indexmap::IndexMap;

/// Column metadata of existing tables, keyed by table name then column name.
///
/// Filled by [`Introspector`](crate::schema::Introspector) and consulted by the
/// mapping builder when a configuration names columns that already exist.
#[derive(Debug, Default, Clone)]
pub struct PhysicalSchema {
    tables: IndexMap<String, IndexMap<String, ColumnMetadata>>,
}

impl PhysicalSchema {
    pub fn table(&self, table: &str) -> Option<&IndexMap<String, ColumnMetadata>> {
        self.tables.get(&table.to_ascii_lowercase())
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnMetadata> {
        self.table(table)?.get(&column.to_ascii_lowercase())
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.table(table).is_some()
    }

    pub fn insert_table(&mut self, table: &str, columns: IndexMap<String, ColumnMetadata>) {
        let columns = columns
            .into_iter()
            .map(|(name, column)| (name.to_ascii_lowercase(), column))
            .collect();
        self.tables.insert(table.to_ascii_lowercase(), columns);
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
