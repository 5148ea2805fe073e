use super::Statement;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    /// Name of the index
    pub name: String,

    /// Which table to index
    pub on: String,

    pub columns: Vec<String>,

    pub method: IndexMethod,

    /// When true, the index is unique
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexMethod {
    #[default]
    BTree,

    /// Spatial index over geometry columns
    Gist,
}

impl Statement {
    /// A GiST index on one geometry column, named `<table>_<column>_sidx`.
    pub fn create_spatial_index(table: &str, column: &str) -> Self {
        CreateIndex {
            name: format!("{table}_{column}_sidx"),
            on: table.to_string(),
            columns: vec![column.to_string()],
            method: IndexMethod::Gist,
            unique: false,
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
