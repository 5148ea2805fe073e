use crate::schema::db;

/// How feature ids of one feature type are stored and generated.
#[derive(Debug, Clone, PartialEq)]
pub struct FidMapping {
    /// Primary key column of the feature type's table.
    pub column: String,

    /// Storage type of the key column.
    pub ty: db::Type,

    pub generator: IdGenerator,

    /// Prepended to the generated kernel to form the external feature id.
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdGenerator {
    /// The database assigns the key; it is read back after the insert.
    AutoIncrement,

    /// The key is drawn from the named sequence before the insert.
    Sequence { name: String },

    /// A random UUID is generated client-side.
    Uuid,
}

impl FidMapping {
    pub fn auto_increment(column: impl Into<String>, prefix: impl Into<String>) -> FidMapping {
        FidMapping {
            column: column.into(),
            ty: db::Type::Serial,
            generator: IdGenerator::AutoIncrement,
            prefix: prefix.into(),
        }
    }

    /// The external id for a kernel value.
    pub fn external_id(&self, kernel: impl std::fmt::Display) -> String {
        format!("{}{kernel}", self.prefix)
    }
}
