use super::{JoinChain, ValuePath};
use crate::schema::app::{CoordinateDimension, Crs, GeometryType, PrimitiveType};
use crate::schema::QName;

/// How one property, or one particle of a compound property, is stored.
///
/// When `join` is set, every column referenced by `kind` lives in the
/// chain's terminal table, never in the table of the owning row.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Where the value sits relative to the owning element.
    pub path: ValuePath,

    /// Set for values stored in a related table, one row per occurrence.
    pub join: Option<JoinChain>,

    pub kind: MappingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappingKind {
    Primitive(PrimitiveMapping),
    Geometry(GeometryMapping),
    FeatureReference(FeatureReferenceMapping),
    Code(CodeMapping),
    Compound(CompoundMapping),
}

/// A column reference. Columns are resolved against the table of the
/// enclosing context, or the terminal table of the mapping's join chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveMapping {
    pub column: ColumnRef,
    pub ty: PrimitiveType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryMapping {
    pub column: ColumnRef,
    pub ty: GeometryType,
    pub dim: CoordinateDimension,
    pub crs: Crs,
    pub srid: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureReferenceMapping {
    /// Column holding the reference's href, stored as given.
    pub column: ColumnRef,
    pub target: Option<QName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeMapping {
    pub value: ColumnRef,
    pub code_space: ColumnRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundMapping {
    /// Child mappings in schema order.
    pub particles: Vec<Mapping>,
}

impl Mapping {
    pub fn new(path: ValuePath, kind: impl Into<MappingKind>) -> Mapping {
        Mapping {
            path,
            join: None,
            kind: kind.into(),
        }
    }

    pub fn with_join(mut self, join: JoinChain) -> Mapping {
        self.join = Some(join);
        self
    }

    pub fn is_joined(&self) -> bool {
        self.join.is_some()
    }

    /// Columns this mapping stores into its own table (the owning table, or
    /// the join target when joined), not descending into joined particles.
    pub fn local_columns(&self) -> Vec<&ColumnRef> {
        let mut out = vec![];
        self.kind.collect_local_columns(&mut out);
        out
    }

    /// Visits every mapping of the tree, depth-first, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Mapping)) {
        f(self);
        if let MappingKind::Compound(compound) = &self.kind {
            for particle in &compound.particles {
                particle.walk(f);
            }
        }
    }
}

impl MappingKind {
    fn collect_local_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            MappingKind::Primitive(m) => out.push(&m.column),
            MappingKind::Geometry(m) => out.push(&m.column),
            MappingKind::FeatureReference(m) => out.push(&m.column),
            MappingKind::Code(m) => {
                out.push(&m.value);
                out.push(&m.code_space);
            }
            MappingKind::Compound(m) => {
                for particle in m.particles.iter().filter(|p| p.join.is_none()) {
                    particle.kind.collect_local_columns(out);
                }
            }
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryMapping> {
        match self {
            MappingKind::Geometry(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundMapping> {
        match self {
            MappingKind::Compound(m) => Some(m),
            _ => None,
        }
    }
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> ColumnRef {
        ColumnRef { name: name.into() }
    }
}

impl From<PrimitiveMapping> for MappingKind {
    fn from(value: PrimitiveMapping) -> Self {
        MappingKind::Primitive(value)
    }
}

impl From<GeometryMapping> for MappingKind {
    fn from(value: GeometryMapping) -> Self {
        MappingKind::Geometry(value)
    }
}

impl From<FeatureReferenceMapping> for MappingKind {
    fn from(value: FeatureReferenceMapping) -> Self {
        MappingKind::FeatureReference(value)
    }
}

impl From<CodeMapping> for MappingKind {
    fn from(value: CodeMapping) -> Self {
        MappingKind::Code(value)
    }
}

impl From<CompoundMapping> for MappingKind {
    fn from(value: CompoundMapping) -> Self {
        MappingKind::Compound(value)
    }
}
