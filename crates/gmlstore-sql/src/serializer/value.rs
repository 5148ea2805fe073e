use super::{Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::Literal {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Literal::*;

        match self {
            Null => fmt!(f, "NULL"),
            Bool(true) => fmt!(f, "TRUE"),
            Bool(false) => fmt!(f, "FALSE"),
            Integer(value) => fmt!(f, *value),
            String(value) => {
                f.dst.push('\'');
                f.dst.push_str(&value.replace('\'', "''"));
                f.dst.push('\'');
            }
        }
    }
}

impl ToSql for &stmt::Value {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let placeholder = f.params.push(self);
        fmt!(f, placeholder)
    }
}
