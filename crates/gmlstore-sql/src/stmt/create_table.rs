use super::{ColumnDef, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Name of the table
    pub name: String,

    /// Column definitions
    pub columns: Vec<ColumnDef>,

    /// Session-local table, dropped at the end of the session at the latest.
    pub temporary: bool,
}

impl Statement {
    pub fn create_table(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        CreateTable {
            name: name.into(),
            columns,
            temporary: false,
        }
        .into()
    }

    pub fn create_temporary_table(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        CreateTable {
            name: name.into(),
            columns,
            temporary: true,
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
