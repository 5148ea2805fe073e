use gmlstore_core::schema::db;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: db::Type,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

/// `REFERENCES <table> (<column>)`, always with `ON DELETE CASCADE` so that
/// removing a parent row removes everything hanging off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: db::Type) -> ColumnDef {
        ColumnDef {
            name: name.into(),
            ty,
            not_null: false,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> ColumnDef {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> ColumnDef {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> ColumnDef {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> ColumnDef {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}
