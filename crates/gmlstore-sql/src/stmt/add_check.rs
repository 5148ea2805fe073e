use super::{Expr, Statement};

/// `ALTER TABLE .. ADD CONSTRAINT .. CHECK (..)`
#[derive(Debug, Clone, PartialEq)]
pub struct AddCheck {
    pub table: String,
    pub name: String,
    pub check: Expr,
}

impl Statement {
    pub fn add_check(table: impl Into<String>, name: impl Into<String>, check: Expr) -> Self {
        AddCheck {
            table: table.into(),
            name: name.into(),
            check,
        }
        .into()
    }
}

impl From<AddCheck> for Statement {
    fn from(value: AddCheck) -> Self {
        Self::AddCheck(value)
    }
}
