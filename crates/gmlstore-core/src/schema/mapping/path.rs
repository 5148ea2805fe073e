use crate::schema::QName;

use std::fmt;

/// Locates a value relative to the element that owns a mapping: a child
/// element, an attribute, or the element's own text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
    pub steps: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Element(QName),
    Attribute(QName),
    Text,
}

impl ValuePath {
    pub fn element(name: QName) -> ValuePath {
        ValuePath {
            steps: vec![PathStep::Element(name)],
        }
    }

    pub fn attribute(name: QName) -> ValuePath {
        ValuePath {
            steps: vec![PathStep::Attribute(name)],
        }
    }

    pub fn text() -> ValuePath {
        ValuePath {
            steps: vec![PathStep::Text],
        }
    }

    /// The first step of the path.
    pub fn head(&self) -> Option<&PathStep> {
        self.steps.first()
    }

    /// The element name the path selects, if it is a single element step.
    pub fn element_name(&self) -> Option<&QName> {
        match self.steps.as_slice() {
            [PathStep::Element(name)] => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match step {
                PathStep::Element(name) => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, "@{name}")?,
                PathStep::Text => f.write_str("text()")?,
            }
        }
        Ok(())
    }
}
