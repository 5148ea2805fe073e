use super::{Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

impl Statement {
    pub fn update(table: impl Into<String>, assignments: Vec<(String, Expr)>, filter: Expr) -> Self {
        Update {
            table: table.into(),
            assignments,
            filter: Some(filter),
        }
        .into()
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Self::Update(value)
    }
}
