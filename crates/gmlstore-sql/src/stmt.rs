mod add_check;
pub use add_check::AddCheck;

mod add_geometry_column;
pub use add_geometry_column::AddGeometryColumn;

mod column_def;
pub use column_def::{ColumnDef, ForeignKey};

mod create_index;
pub use create_index::{CreateIndex, IndexMethod};

mod create_sequence;
pub use create_sequence::CreateSequence;

mod create_table;
pub use create_table::CreateTable;

mod delete;
pub use delete::Delete;

mod drop_table;
pub use drop_table::DropTable;

mod expr;
pub use expr::{BinaryOp, Expr, ExprCase, Function, Literal};

mod insert;
pub use insert::Insert;

mod select;
pub use select::{Join, OrderBy, Select, SelectItem, TableRef};

mod update;
pub use update::Update;

pub use gmlstore_core::stmt::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    AddCheck(AddCheck),
    AddGeometryColumn(AddGeometryColumn),
    CreateIndex(CreateIndex),
    CreateSequence(CreateSequence),
    CreateTable(CreateTable),
    Delete(Delete),
    DropTable(DropTable),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::AddCheck(_)
                | Statement::AddGeometryColumn(_)
                | Statement::CreateIndex(_)
                | Statement::CreateSequence(_)
                | Statement::CreateTable(_)
                | Statement::DropTable(_)
        )
    }

    /// True if executing the statement yields rows.
    pub fn returns_rows(&self) -> bool {
        match self {
            Statement::Select(_) | Statement::AddGeometryColumn(_) => true,
            Statement::Insert(insert) => !insert.returning.is_empty(),
            _ => false,
        }
    }
}
