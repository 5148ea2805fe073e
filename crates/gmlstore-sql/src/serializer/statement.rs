use super::{Comma, Ident, Params, ToSql};

use crate::stmt::{self, Expr};

/// One `(..)` record of a `VALUES` list.
struct Record<'a>(&'a [Expr]);

impl ToSql for &stmt::Statement {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Statement::*;

        match self {
            AddCheck(stmt) => stmt.to_sql(f),
            AddGeometryColumn(stmt) => stmt.to_sql(f),
            CreateIndex(stmt) => stmt.to_sql(f),
            CreateSequence(stmt) => stmt.to_sql(f),
            CreateTable(stmt) => stmt.to_sql(f),
            Delete(stmt) => stmt.to_sql(f),
            DropTable(stmt) => stmt.to_sql(f),
            Insert(stmt) => stmt.to_sql(f),
            Select(stmt) => stmt.to_sql(f),
            Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::AddCheck {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let check = &self.check;

        fmt!(
            f, "ALTER TABLE " Ident(&self.table) " ADD CONSTRAINT " Ident(&self.name) " CHECK (" check ")"
        );
    }
}

impl ToSql for &stmt::AddGeometryColumn {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let args = [
            Expr::string(&self.table),
            Expr::string(&self.column),
            Expr::integer(i64::from(self.srid)),
            Expr::string(self.ty.postgis_name()),
            Expr::integer(i64::from(self.dim.count())),
        ];

        fmt!(f, "SELECT AddGeometryColumn(" Comma(&args) ")");
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let unique = if self.unique { "UNIQUE " } else { "" };
        let using = match self.method {
            stmt::IndexMethod::BTree => "",
            stmt::IndexMethod::Gist => " USING GIST",
        };
        let columns = Comma(self.columns.iter().map(Ident));

        fmt!(
            f, "CREATE " unique "INDEX " Ident(&self.name) " ON " Ident(&self.on) using " (" columns ")"
        );
    }
}

impl ToSql for &stmt::CreateSequence {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "CREATE SEQUENCE " Ident(&self.name));
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let temporary = if self.temporary { "TEMPORARY " } else { "" };

        fmt!(
            f, "CREATE " temporary "TABLE " Ident(&self.name) " (" Comma(&self.columns) ")"
        );
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "DELETE FROM " Ident(&self.from));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }
    }
}

impl ToSql for &stmt::DropTable {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let if_exists = if self.if_exists { "IF EXISTS " } else { "" };

        fmt!(f, "DROP TABLE " if_exists Ident(&self.name));
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "INSERT INTO " Ident(&self.into));

        if self.columns.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            let columns = Comma(self.columns.iter().map(Ident));
            let rows = Comma(self.rows.iter().map(|row| Record(row)));
            fmt!(f, " (" columns ") VALUES " rows);
        }

        if !self.returning.is_empty() {
            fmt!(f, " RETURNING " Comma(self.returning.iter().map(Ident)));
        }
    }
}

impl ToSql for Record<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0) ")");
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "SELECT " Comma(&self.columns));

        if let Some(from) = &self.from {
            fmt!(f, " FROM " from);
        }

        for join in &self.joins {
            let (table, on) = (&join.table, &join.on);
            fmt!(f, " LEFT OUTER JOIN " table " ON " on);
        }

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }
    }
}

impl ToSql for &stmt::SelectItem {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, &self.expr);

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));

        if let Some(alias) = &self.alias {
            fmt!(f, " " Ident(alias));
        }
    }
}

impl ToSql for &stmt::OrderBy {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let direction = if self.descending { " DESC" } else { "" };
        fmt!(f, &self.expr direction);
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let assignments = Comma(self.assignments.iter().map(|(column, value)| Assignment(column, value)));

        fmt!(f, "UPDATE " Ident(&self.table) " SET " assignments);

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }
    }
}

struct Assignment<'a>(&'a str, &'a Expr);

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1);
    }
}
