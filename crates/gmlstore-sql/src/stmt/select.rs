use super::{Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: Vec<SelectItem>,

    /// Absent for selects of pure expressions, e.g. `SELECT nextval(..)`.
    pub from: Option<TableRef>,

    pub joins: Vec<Join>,

    pub filter: Option<Expr>,

    pub order_by: Vec<OrderBy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

/// `LEFT OUTER JOIN <table> ON <on>`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub descending: bool,
}

impl Select {
    pub fn new(from: Option<TableRef>) -> Select {
        Select {
            columns: vec![],
            from,
            joins: vec![],
            filter: None,
            order_by: vec![],
        }
    }

    pub fn from_table(name: impl Into<String>, alias: impl Into<String>) -> Select {
        Select::new(Some(TableRef::aliased(name, alias)))
    }

    /// Appends an output column, returning its position in the row.
    pub fn push(&mut self, expr: Expr) -> usize {
        self.columns.push(SelectItem { expr, alias: None });
        self.columns.len() - 1
    }

    pub fn left_join(&mut self, table: TableRef, on: Expr) {
        self.joins.push(Join { table, on });
    }

    /// Adds a conjunct to the `WHERE` clause.
    pub fn and_where(&mut self, expr: Expr) {
        self.filter = Some(match self.filter.take() {
            Some(filter) => Expr::and([filter, expr]),
            None => expr,
        });
    }

    pub fn order_by(&mut self, expr: Expr, descending: bool) {
        self.order_by.push(OrderBy { expr, descending });
    }
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> TableRef {
        TableRef {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> TableRef {
        TableRef {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}
