use super::{FidMapping, Mapping};
use crate::schema::QName;

use indexmap::IndexMap;

/// Storage layout of one feature type.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTypeMapping {
    pub name: QName,

    /// Table holding one row per feature.
    pub table: String,

    pub fid: FidMapping,

    /// Property mappings in declaration order. A `None` entry marks a
    /// property that is declared but could not be mapped; properties with no
    /// entry at all were left out of the mapping.
    pub properties: IndexMap<QName, Option<Mapping>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyLookup<'a> {
    Mapped(&'a Mapping),

    /// Known to the mapping, but intentionally skipped.
    Unmapped,

    /// Not part of the mapping.
    Undeclared,
}

impl FeatureTypeMapping {
    pub fn property(&self, name: &QName) -> PropertyLookup<'_> {
        match self.properties.get(name) {
            Some(Some(mapping)) => PropertyLookup::Mapped(mapping),
            Some(None) => PropertyLookup::Unmapped,
            None => PropertyLookup::Undeclared,
        }
    }

    /// Mapped properties, in declaration order.
    pub fn mapped(&self) -> impl Iterator<Item = (&QName, &Mapping)> {
        self.properties
            .iter()
            .filter_map(|(name, mapping)| mapping.as_ref().map(|m| (name, m)))
    }
}
