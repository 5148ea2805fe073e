use super::{Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.name);
        let ty = &self.ty;

        fmt!(f, name " " ty);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        } else if self.not_null {
            fmt!(f, " NOT NULL");
        }

        if self.unique {
            fmt!(f, " UNIQUE");
        }

        if let Some(fk) = &self.references {
            fmt!(f, " REFERENCES " Ident(&fk.table) " (" Ident(&fk.column) ") ON DELETE CASCADE");
        }
    }
}
