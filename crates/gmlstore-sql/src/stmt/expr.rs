use super::{Select, Value};

use gmlstore_core::schema::db;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column, optionally qualified by a table name or alias.
    Column {
        table: Option<String>,
        name: String,
    },

    /// A value bound as a statement parameter.
    Value(Value),

    /// A constant written into the SQL text. DDL statements take no
    /// parameters, so everything they carry is a literal.
    Literal(Literal),

    Func {
        func: Function,
        args: Vec<Expr>,
    },

    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    And(Vec<Expr>),

    Or(Vec<Expr>),

    Not(Box<Expr>),

    IsNull {
        expr: Box<Expr>,
        negate: bool,
    },

    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },

    InSubquery {
        expr: Box<Expr>,
        query: Box<Select>,
    },

    Exists(Box<Select>),

    /// A select yielding a single value.
    Subquery(Box<Select>),

    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
    },

    Case(ExprCase),

    Cast {
        expr: Box<Expr>,
        ty: db::Type,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
}

/// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
#[derive(Debug, Clone, PartialEq)]
pub struct ExprCase {
    pub operand: Option<Box<Expr>>,
    pub whens: Vec<(Expr, Expr)>,
    pub otherwise: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    /// Bounding box overlap, `&&`
    Overlaps,
}

/// Database functions the store relies on. The PostGIS ones are spelled
/// differently on legacy releases; the serializer picks the spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    AsBinary,
    GeomFromWkb,
    Extent,
    IsValid,
    Nextval,
    SerialSequence,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn integer(value: i64) -> Expr {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal(Literal::Bool(value))
    }

    pub fn func(func: Function, args: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Func {
            func,
            args: args.into_iter().collect(),
        }
    }

    /// `GeomFromWKB($n, srid)` for a well-known binary value.
    pub fn geometry(wkb: Vec<u8>, srid: i32) -> Expr {
        Expr::func(
            Function::GeomFromWkb,
            [Expr::value(wkb), Expr::integer(i64::from(srid))],
        )
    }

    pub fn binary_op(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    /// Conjunction of `operands`, flattening nested conjunctions. An empty
    /// conjunction is `TRUE`.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(nested) => flat.extend(nested),
                operand => flat.push(operand),
            }
        }

        match flat.len() {
            0 => Expr::bool(true),
            1 => flat.remove(0),
            _ => Expr::And(flat),
        }
    }

    /// Disjunction of `operands`. An empty disjunction is `FALSE`.
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut operands: Vec<_> = operands.into_iter().collect();
        match operands.len() {
            0 => Expr::bool(false),
            1 => operands.remove(0),
            _ => Expr::Or(operands),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Expr {
        Expr::Not(Box::new(expr))
    }

    pub fn is_null(expr: Expr) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr),
            negate: false,
        }
    }

    pub fn is_not_null(expr: Expr) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr),
            negate: true,
        }
    }

    pub fn in_list(expr: Expr, list: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(expr),
            list: list.into_iter().collect(),
        }
    }

    pub fn in_subquery(expr: Expr, query: Select) -> Expr {
        Expr::InSubquery {
            expr: Box::new(expr),
            query: Box::new(query),
        }
    }

    pub fn exists(query: Select) -> Expr {
        Expr::Exists(Box::new(query))
    }

    pub fn subquery(query: Select) -> Expr {
        Expr::Subquery(Box::new(query))
    }

    pub fn like(expr: Expr, pattern: Expr) -> Expr {
        Expr::Like {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
        }
    }

    pub fn cast(expr: Expr, ty: db::Type) -> Expr {
        Expr::Cast {
            expr: Box::new(expr),
            ty,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Bool(true)))
    }
}

impl From<ExprCase> for Expr {
    fn from(value: ExprCase) -> Self {
        Expr::Case(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens() {
        let a = Expr::column("a");
        let b = Expr::column("b");
        let c = Expr::column("c");

        assert_eq!(Expr::and(Vec::new()), Expr::bool(true));
        assert_eq!(Expr::and([a.clone()]), a);
        assert_eq!(
            Expr::and([Expr::and([a.clone(), b.clone()]), c.clone()]),
            Expr::And(vec![a, b, c])
        );
        assert_eq!(Expr::or(Vec::new()), Expr::bool(false));
    }
}
