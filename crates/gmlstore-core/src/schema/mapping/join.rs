use std::fmt;

/// A column of a named table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbField {
    pub table: String,
    pub column: String,
}

/// One foreign key hop: rows of `to.table` whose `to.column` equals
/// `from.column` of the current row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub from: DbField,
    pub to: DbField,
}

/// Foreign key path from the row owning a mapping to the table that holds
/// the mapped value.
///
/// A chain always has at least one step, so its field list has at least two
/// entries: the first on the origin table, the last on the terminal table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinChain {
    steps: Vec<JoinStep>,

    /// Column of the terminal table recording the position of each value,
    /// if the values are ordered.
    pub order_column: Option<String>,
}

impl DbField {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> DbField {
        DbField {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl JoinChain {
    pub fn new(from: DbField, to: DbField) -> JoinChain {
        JoinChain {
            steps: vec![JoinStep { from, to }],
            order_column: None,
        }
    }

    /// Builds a chain from explicit steps. Returns `None` if `steps` is empty.
    pub fn from_steps(steps: Vec<JoinStep>) -> Option<JoinChain> {
        if steps.is_empty() {
            return None;
        }
        Some(JoinChain {
            steps,
            order_column: None,
        })
    }

    pub fn with_order_column(mut self, column: impl Into<String>) -> JoinChain {
        self.order_column = Some(column.into());
        self
    }

    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    pub fn fields(&self) -> impl Iterator<Item = &DbField> {
        self.steps.iter().flat_map(|step| [&step.from, &step.to])
    }

    pub fn origin(&self) -> &DbField {
        &self.steps[0].from
    }

    /// The field on the table actually holding the value.
    pub fn terminal(&self) -> &DbField {
        &self.steps[self.steps.len() - 1].to
    }

    /// Name of the table holding the value.
    pub fn target_table(&self) -> &str {
        &self.terminal().table
    }
}

impl fmt::Display for JoinChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(
                f,
                "{}={}.{}",
                step.from.column, step.to.table, step.to.column
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_list_has_origin_and_terminal() {
        let chain = JoinChain::new(
            DbField::new("building", "id"),
            DbField::new("building_name", "parentfk"),
        );
        let fields: Vec<_> = chain.fields().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(chain.origin().table, "building");
        assert_eq!(chain.target_table(), "building_name");
        assert_eq!(chain.to_string(), "id=building_name.parentfk");
        assert!(JoinChain::from_steps(vec![]).is_none());
    }
}
