use super::{Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub from: String,
    pub filter: Option<Expr>,
}

impl Statement {
    pub fn delete(from: impl Into<String>, filter: Expr) -> Self {
        Delete {
            from: from.into(),
            filter: Some(filter),
        }
        .into()
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}
