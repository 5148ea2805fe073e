use std::collections::HashMap;

use tokio_postgres::{Client, Error, Statement};

/// Prepared statements of one connection, keyed by SQL text.
#[derive(Debug, Clone, Default)]
pub struct StatementCache {
    map: HashMap<String, Statement>,
}

impl StatementCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, query: &str) -> Option<Statement> {
        self.map.get(query).map(ToOwned::to_owned)
    }

    pub fn insert(&mut self, query: &str, statement: Statement) {
        self.map.insert(query.to_string(), statement);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Prepares `query`, letting the server infer parameter types, unless it
    /// was prepared before.
    pub async fn prepare(&mut self, client: &Client, query: &str) -> Result<Statement, Error> {
        if let Some(statement) = self.get(query) {
            Ok(statement)
        } else {
            let stmt = client.prepare(query).await?;
            self.insert(query, stmt.clone());
            Ok(stmt)
        }
    }
}
