use super::{ComplexType, ElementDecl, FeatureType};
use crate::schema::QName;
use crate::Result;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A parsed GML application schema.
///
/// Declarations are kept in document order; every lookup and every derived
/// list preserves it so that mappings built from the schema are
/// deterministic.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "SchemaRepr", into = "SchemaRepr")]
pub struct Schema {
    /// Namespace prefix bindings, used for display and for resolving
    /// prefixed names in mapping configurations.
    pub namespaces: IndexMap<String, String>,

    pub feature_types: IndexMap<QName, FeatureType>,

    pub elements: IndexMap<QName, ElementDecl>,

    pub complex_types: IndexMap<QName, ComplexType>,
}

#[derive(Serialize, Deserialize)]
struct SchemaRepr {
    #[serde(default)]
    namespaces: IndexMap<String, String>,

    #[serde(default)]
    feature_types: Vec<FeatureType>,

    #[serde(default)]
    elements: Vec<ElementDecl>,

    #[serde(default)]
    complex_types: Vec<ComplexType>,
}

impl Schema {
    pub fn from_json(src: &str) -> Result<Schema> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn feature_type(&self, name: &QName) -> Option<&FeatureType> {
        self.feature_types.get(name)
    }

    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub fn complex_type(&self, name: &QName) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    /// Concrete feature types, in declaration order.
    pub fn concrete_feature_types(&self) -> impl Iterator<Item = &FeatureType> {
        self.feature_types.values().filter(|ft| !ft.is_abstract)
    }

    /// All concrete elements that may appear in place of `head`: the head
    /// itself unless it is abstract, followed by every direct or transitive
    /// member of its substitution group in declaration order.
    pub fn substitutions(&self, head: &QName) -> Vec<&ElementDecl> {
        let mut group = IndexSet::new();
        group.insert(head.clone());

        // Transitive closure; bounded by the number of declarations.
        loop {
            let before = group.len();
            for decl in self.elements.values() {
                if let Some(sg) = &decl.substitution_group {
                    if group.contains(sg) {
                        group.insert(decl.name.clone());
                    }
                }
            }
            if group.len() == before {
                break;
            }
        }

        let mut ret = vec![];
        if let Some(decl) = self.element(head) {
            if !decl.is_abstract {
                ret.push(decl);
            }
        }
        for decl in self.elements.values() {
            if decl.name != *head && !decl.is_abstract && group.contains(&decl.name) {
                ret.push(decl);
            }
        }
        ret
    }

    /// Resolves a namespace prefix declared by the schema.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<String> {
        self.namespaces.get(prefix).cloned()
    }

    /// Parses a `prefix:local` or Clark-notation name against the schema's
    /// namespace bindings.
    pub fn qname(&self, src: &str) -> Result<QName> {
        QName::parse(src, |p| self.resolve_prefix(p)).map_err(crate::Error::invalid_schema)
    }

    pub fn add_feature_type(&mut self, ft: FeatureType) {
        self.feature_types.insert(ft.name.clone(), ft);
    }

    pub fn add_element(&mut self, decl: ElementDecl) {
        self.elements.insert(decl.name.clone(), decl);
    }

    pub fn add_complex_type(&mut self, ty: ComplexType) {
        self.complex_types.insert(ty.name.clone(), ty);
    }
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Schema {
        let mut schema = Schema {
            namespaces: repr.namespaces,
            ..Schema::default()
        };

        // Attach display prefixes from the namespace bindings so that
        // diagnostics print `app:Building` rather than Clark notation.
        let prefix_of = |name: &mut QName| {
            if name.prefix.is_none() {
                if let Some(ns) = &name.namespace {
                    name.prefix = schema
                        .namespaces
                        .iter()
                        .find(|(_, uri)| *uri == ns)
                        .map(|(p, _)| p.clone());
                }
            }
        };

        let mut feature_types = repr.feature_types;
        for ft in &mut feature_types {
            prefix_of(&mut ft.name);
            for property in &mut ft.properties {
                prefix_of(&mut property.name);
            }
        }
        let mut elements = repr.elements;
        for decl in &mut elements {
            prefix_of(&mut decl.name);
        }

        for ft in feature_types {
            schema.add_feature_type(ft);
        }
        for decl in elements {
            schema.add_element(decl);
        }
        for ty in repr.complex_types {
            schema.add_complex_type(ty);
        }
        schema
    }
}

impl From<Schema> for SchemaRepr {
    fn from(schema: Schema) -> SchemaRepr {
        SchemaRepr {
            namespaces: schema.namespaces,
            feature_types: schema.feature_types.into_values().collect(),
            elements: schema.elements.into_values().collect(),
            complex_types: schema.complex_types.into_values().collect(),
        }
    }
}
