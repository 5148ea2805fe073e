use super::{Comma, Delimited, Flavor, Ident, Params, ToSql};

use crate::stmt::{self, Expr};

/// Wraps nested boolean connectives in parentheses.
struct Operand<'a>(&'a Expr);

impl ToSql for &stmt::Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Expr::Column { table, name } => {
                if let Some(table) = table {
                    fmt!(f, Ident(table) ".");
                }
                fmt!(f, Ident(name));
            }
            Expr::Value(value) => fmt!(f, value),
            Expr::Literal(literal) => fmt!(f, literal),
            Expr::Func { func, args } => {
                let name = func.name(f.serializer.flavor);
                fmt!(f, name "(" Comma(args) ")");
            }
            Expr::BinaryOp { lhs, op, rhs } => {
                let op = *op;
                fmt!(f, Operand(lhs) " " op " " Operand(rhs));
            }
            Expr::And(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " AND "));
            }
            Expr::Or(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " OR "));
            }
            Expr::Not(expr) => {
                let expr: &Expr = expr;
                fmt!(f, "NOT (" expr ")");
            }
            Expr::IsNull { expr, negate } => {
                let op = if *negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, Operand(expr) op);
            }
            Expr::InList { list, .. } if list.is_empty() => fmt!(f, "FALSE"),
            Expr::InList { expr, list } => {
                fmt!(f, Operand(expr) " IN (" Comma(list) ")");
            }
            Expr::InSubquery { expr, query } => {
                let query: &stmt::Select = query;
                fmt!(f, Operand(expr) " IN (" query ")");
            }
            Expr::Exists(query) => {
                let query: &stmt::Select = query;
                fmt!(f, "EXISTS (" query ")");
            }
            Expr::Subquery(query) => {
                let query: &stmt::Select = query;
                fmt!(f, "(" query ")");
            }
            Expr::Like { expr, pattern } => {
                fmt!(f, Operand(expr) " LIKE " Operand(pattern));
            }
            Expr::Case(case) => {
                fmt!(f, "CASE");
                if let Some(operand) = &case.operand {
                    let operand: &Expr = operand;
                    fmt!(f, " " operand);
                }
                for (when, then) in &case.whens {
                    fmt!(f, " WHEN " when " THEN " then);
                }
                if let Some(otherwise) = &case.otherwise {
                    let otherwise: &Expr = otherwise;
                    fmt!(f, " ELSE " otherwise);
                }
                fmt!(f, " END");
            }
            Expr::Cast { expr, ty } => {
                fmt!(f, Operand(expr) "::" ty);
            }
        }
    }
}

impl ToSql for Operand<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self.0 {
            Expr::And(_) | Expr::Or(_) | Expr::BinaryOp { .. } | Expr::Like { .. } => {
                fmt!(f, "(" self.0 ")")
            }
            expr => fmt!(f, expr),
        }
    }
}

impl ToSql for stmt::BinaryOp {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::BinaryOp::*;

        fmt!(
            f,
            match self {
                Eq => "=",
                Ne => "<>",
                Lt => "<",
                Le => "<=",
                Gt => ">",
                Ge => ">=",
                Overlaps => "&&",
            }
        )
    }
}

impl stmt::Function {
    fn name(self, flavor: Flavor) -> &'static str {
        use stmt::Function::*;

        let legacy = flavor == Flavor::PostgisLegacy;
        match self {
            AsBinary if legacy => "AsBinary",
            AsBinary => "ST_AsBinary",
            GeomFromWkb if legacy => "GeomFromWKB",
            GeomFromWkb => "ST_GeomFromWKB",
            Extent if legacy => "extent",
            Extent => "ST_Extent",
            IsValid if legacy => "isvalid",
            IsValid => "ST_IsValid",
            Nextval => "nextval",
            SerialSequence => "pg_get_serial_sequence",
        }
    }
}
