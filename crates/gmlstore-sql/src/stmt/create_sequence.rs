use super::Statement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSequence {
    pub name: String,
}

impl Statement {
    pub fn create_sequence(name: impl Into<String>) -> Self {
        CreateSequence { name: name.into() }.into()
    }
}

impl From<CreateSequence> for Statement {
    fn from(value: CreateSequence) -> Self {
        Self::CreateSequence(value)
    }
}
