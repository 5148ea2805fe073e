use super::{Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub into: String,
    pub columns: Vec<String>,

    /// One record per row; each has one expression per column.
    pub rows: Vec<Vec<Expr>>,

    /// Columns read back from the inserted row.
    pub returning: Vec<String>,
}

impl Statement {
    pub fn insert(into: impl Into<String>, columns: Vec<String>, row: Vec<Expr>) -> Self {
        Insert {
            into: into.into(),
            columns,
            rows: vec![row],
            returning: vec![],
        }
        .into()
    }
}

impl Insert {
    pub fn returning(mut self, column: impl Into<String>) -> Insert {
        self.returning.push(column.into());
        self
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
