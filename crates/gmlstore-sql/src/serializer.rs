#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod flavor;
use flavor::Flavor;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod column_def;
mod expr;
mod statement;
mod ty;
mod value;

use crate::stmt::Statement;

/// Serialize a statement to a SQL string
#[derive(Debug, Clone)]
pub struct Serializer {
    /// Selects the PostGIS function spellings
    flavor: Flavor,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// Serializes a statement that carries no parameters, such as DDL.
    pub fn serialize_literal(&self, stmt: &Statement) -> String {
        let mut params = vec![];
        let sql = self.serialize(stmt, &mut params);
        debug_assert!(params.is_empty(), "statement bound parameters: {sql}");
        sql
    }
}
