//! Feature filters and their translation into `WHERE` clause expressions.

use crate::query::Aliases;
use crate::stmt::{BinaryOp, ColumnDef, Expr, Select, Statement, TableRef, Value};
use crate::value;

use gmlstore_core::{
    feature::{Envelope, PrimitiveValue},
    schema::{
        db,
        mapping::{FeatureTypeMapping, JoinChain, Mapping, MappingKind, PropertyLookup},
        IdKernel, MappedSchema, QName,
    },
    Error, Result,
};

/// Column of the temporary tables used by [`Filter::IdTable`].
pub const ID_TABLE_COLUMN: &str = "fid";

/// `CREATE TEMPORARY TABLE <name> (fid <ty>)`, to be filled with
/// [`insert_id`] and queried through [`Filter::IdTable`].
pub fn create_id_table(name: &str, ty: db::Type) -> Statement {
    let ty = match ty {
        db::Type::Serial => db::Type::Integer(4),
        ty => ty,
    };
    Statement::create_temporary_table(name, vec![ColumnDef::new(ID_TABLE_COLUMN, ty)])
}

/// Inserts one id into an id table.
pub fn insert_id(name: &str, id: Value) -> Statement {
    Statement::insert(name, vec![ID_TABLE_COLUMN.to_string()], vec![Expr::Value(id)])
}

/// A predicate over the features of one feature type.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Features with one of the given external ids.
    Ids(Vec<String>),

    /// Features whose id is listed in the [`ID_TABLE_COLUMN`] column of the
    /// named table. Holds external ids in BLOB and hybrid storage, key column
    /// values in relational storage.
    IdTable(String),

    Compare {
        property: PropertyPath,
        op: CompareOp,
        value: PrimitiveValue,
    },

    Like {
        property: PropertyPath,
        pattern: String,
    },

    IsNull(PropertyPath),

    /// Bounding box overlap. Without a property the feature's envelope is
    /// tested.
    BBox {
        property: Option<PropertyPath>,
        envelope: Envelope,
    },

    And(Vec<Filter>),

    Or(Vec<Filter>),

    Not(Box<Filter>),
}

/// A property, optionally followed by particles of its compound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath(pub Vec<QName>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub property: PropertyPath,
    pub descending: bool,
}

impl Filter {
    pub fn ids<I, S>(ids: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Ids(ids.into_iter().map(Into::into).collect())
    }

    pub fn compare(property: PropertyPath, op: CompareOp, value: impl Into<PrimitiveValue>) -> Filter {
        Filter::Compare {
            property,
            op,
            value: value.into(),
        }
    }

    pub fn eq(property: PropertyPath, value: impl Into<PrimitiveValue>) -> Filter {
        Filter::compare(property, CompareOp::Eq, value)
    }

    pub fn bbox(envelope: Envelope) -> Filter {
        Filter::BBox {
            property: None,
            envelope,
        }
    }
}

impl PropertyPath {
    pub fn new(property: QName) -> PropertyPath {
        PropertyPath(vec![property])
    }

    pub fn child(mut self, particle: QName) -> PropertyPath {
        self.0.push(particle);
        self
    }
}

impl From<QName> for PropertyPath {
    fn from(value: QName) -> Self {
        PropertyPath::new(value)
    }
}

impl SortBy {
    pub fn asc(property: impl Into<PropertyPath>) -> SortBy {
        SortBy {
            property: property.into(),
            descending: false,
        }
    }

    pub fn desc(property: impl Into<PropertyPath>) -> SortBy {
        SortBy {
            property: property.into(),
            descending: true,
        }
    }
}

impl From<CompareOp> for BinaryOp {
    fn from(value: CompareOp) -> Self {
        match value {
            CompareOp::Eq => BinaryOp::Eq,
            CompareOp::Ne => BinaryOp::Ne,
            CompareOp::Lt => BinaryOp::Lt,
            CompareOp::Le => BinaryOp::Le,
            CompareOp::Gt => BinaryOp::Gt,
            CompareOp::Ge => BinaryOp::Ge,
        }
    }
}

/// Translates filters for a query whose relational table is aliased
/// `table` and whose objects table, if joined, is aliased `objects`.
pub(crate) struct Translator<'a, 'b> {
    pub(crate) schema: &'a MappedSchema,
    pub(crate) mapping: &'a FeatureTypeMapping,
    pub(crate) table: Option<&'b str>,
    pub(crate) objects: Option<&'b str>,
    pub(crate) aliases: &'b mut Aliases,
}

impl<'a> Translator<'a, '_> {
    pub(crate) fn translate(&mut self, filter: &Filter) -> Result<Expr> {
        match filter {
            Filter::Ids(ids) => self.ids(ids),
            Filter::IdTable(table) => {
                let mut ids = Select::new(Some(TableRef::new(table)));
                ids.push(Expr::column(ID_TABLE_COLUMN));
                Ok(Expr::in_subquery(self.id_column()?, ids))
            }
            Filter::Compare {
                property,
                op,
                value,
            } => self.predicate(property, |column, mapping| {
                let value = comparable(mapping, value)?;
                Ok(Expr::binary_op(column, (*op).into(), Expr::Value(value)))
            }),
            Filter::Like { property, pattern } => self.predicate(property, |column, _| {
                Ok(Expr::like(column, Expr::value(pattern.as_str())))
            }),
            Filter::IsNull(property) => {
                self.predicate(property, |column, _| Ok(Expr::is_null(column)))
            }
            Filter::BBox {
                property: Some(property),
                envelope,
            } => self.predicate(property, |column, mapping| match mapping {
                MappingKind::Geometry(m) => Ok(overlaps(column, envelope, m.srid)),
                _ => Err(Error::unsupported_feature(
                    "bounding box filter on a non-geometry property",
                )),
            }),
            Filter::BBox {
                property: None,
                envelope,
            } => self.envelope_filter(envelope),
            Filter::And(operands) => Ok(Expr::and(
                operands
                    .iter()
                    .map(|operand| self.translate(operand))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Filter::Or(operands) => Ok(Expr::or(
                operands
                    .iter()
                    .map(|operand| self.translate(operand))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Filter::Not(operand) => Ok(Expr::not(self.translate(operand)?)),
        }
    }

    /// Overlap of the feature envelope, or of the first directly stored
    /// geometry in relational storage, with `envelope`.
    pub(crate) fn envelope_filter(&mut self, envelope: &Envelope) -> Result<Expr> {
        if let Some(objects) = self.objects {
            let column = Expr::qualified(objects, &self.schema.blob.bbox_column);
            return Ok(overlaps(column, envelope, self.schema.storage_srid));
        }

        let (table, geometry) = self
            .table
            .zip(first_geometry(self.mapping))
            .ok_or_else(|| {
                Error::unsupported_feature(format!(
                    "feature type {} has no directly stored geometry to filter by",
                    self.mapping.name
                ))
            })?;

        let column = Expr::qualified(table, &geometry.0);
        Ok(overlaps(column, envelope, geometry.1))
    }

    pub(crate) fn sort_key(&self, path: &PropertyPath) -> Result<Expr> {
        let (chains, mapping) = self.resolve(path)?;
        if !chains.is_empty() {
            return Err(Error::unsupported_feature(format!(
                "sorting by the multi-valued property {}",
                display(path)
            )));
        }

        let table = self.relational_table()?;
        Ok(Expr::qualified(table, value_column(&mapping.kind, path)?))
    }

    fn ids(&mut self, ids: &[String]) -> Result<Expr> {
        if let Some(objects) = self.objects {
            let column = Expr::qualified(objects, &self.schema.blob.gml_id_column);
            return Ok(Expr::in_list(column, ids.iter().map(|id| Expr::value(id.as_str()))));
        }

        let mut kernels = vec![];
        for id in ids {
            let analysis = self.schema.analyze_id(id)?;
            if analysis.mapping.name != self.mapping.name {
                continue;
            }
            kernels.push(Expr::Value(match analysis.kernel {
                IdKernel::Integer(v) => Value::I64(v),
                IdKernel::Uuid(v) => Value::String(v.to_string()),
            }));
        }

        Ok(Expr::in_list(self.id_column()?, kernels))
    }

    fn id_column(&self) -> Result<Expr> {
        match (self.objects, self.table) {
            (Some(objects), _) => Ok(Expr::qualified(
                objects,
                &self.schema.blob.gml_id_column,
            )),
            (None, Some(table)) => Ok(Expr::qualified(table, &self.mapping.fid.column)),
            (None, None) => Err(Error::unsupported_feature("id filter without a key column")),
        }
    }

    fn relational_table(&self) -> Result<&str> {
        self.table.ok_or_else(|| {
            Error::unsupported_feature("property filters need relational storage")
        })
    }

    /// A predicate on the column of `path`. For values behind join chains the
    /// predicate becomes an `EXISTS` subquery over the joined tables.
    fn predicate(
        &mut self,
        path: &PropertyPath,
        build: impl FnOnce(Expr, &MappingKind) -> Result<Expr>,
    ) -> Result<Expr> {
        let (chains, mapping) = self.resolve(path)?;
        let column = value_column(&mapping.kind, path)?;
        let table = self.relational_table()?.to_string();

        if chains.is_empty() {
            return build(Expr::qualified(table, column), &mapping.kind);
        }

        let mut current = table;
        let mut subquery: Option<Select> = None;
        let mut correlation = None;

        for step in chains.iter().flat_map(|chain| chain.steps()) {
            let alias = self.aliases.next();
            let on = Expr::eq(
                Expr::qualified(&alias, &step.to.column),
                Expr::qualified(&current, &step.from.column),
            );

            if let Some(select) = subquery.as_mut() {
                select.left_join(TableRef::aliased(&step.to.table, &alias), on);
            } else {
                subquery = Some(Select::from_table(&step.to.table, &alias));
                correlation = Some(on);
            }
            current = alias;
        }

        let (Some(mut select), Some(correlation)) = (subquery, correlation) else {
            return Err(Error::invalid_mapping_config("empty join chain"));
        };

        let predicate = build(Expr::qualified(&current, column), &mapping.kind)?;
        select.push(Expr::integer(1));
        select.and_where(correlation);
        select.and_where(predicate);
        Ok(Expr::exists(select))
    }

    /// The mapping `path` selects, with the join chains crossed to reach it.
    fn resolve(&self, path: &PropertyPath) -> Result<(Vec<&'a JoinChain>, &'a Mapping)> {
        let mut names = path.0.iter();
        let property = names
            .next()
            .ok_or_else(|| Error::unsupported_feature("empty property path"))?;

        let mut mapping = match self.mapping.property(property) {
            PropertyLookup::Mapped(mapping) => mapping,
            PropertyLookup::Unmapped => {
                return Err(Error::unsupported_feature(format!(
                    "property {property} is not mapped"
                )))
            }
            PropertyLookup::Undeclared => {
                return Err(Error::unsupported_feature(format!(
                    "feature type {} has no property {property}",
                    self.mapping.name
                )))
            }
        };

        let mut chains: Vec<&JoinChain> = mapping.join.iter().collect();

        for name in names {
            let compound = mapping.kind.as_compound().ok_or_else(|| {
                Error::unsupported_feature(format!("{} has no particles", display(path)))
            })?;
            mapping = compound
                .particles
                .iter()
                .find(|particle| particle.path.element_name() == Some(name))
                .ok_or_else(|| {
                    Error::unsupported_feature(format!(
                        "{name} is not a mapped particle of {}",
                        display(path)
                    ))
                })?;
            chains.extend(mapping.join.iter());
        }

        Ok((chains, mapping))
    }
}

/// The column compared by predicates on a mapping.
fn value_column<'m>(kind: &'m MappingKind, path: &PropertyPath) -> Result<&'m str> {
    match kind {
        MappingKind::Primitive(m) => Ok(&m.column.name),
        MappingKind::Geometry(m) => Ok(&m.column.name),
        MappingKind::FeatureReference(m) => Ok(&m.column.name),
        MappingKind::Code(m) => Ok(&m.value.name),
        MappingKind::Compound(_) => Err(Error::unsupported_feature(format!(
            "{} has a compound value",
            display(path)
        ))),
    }
}

fn comparable(kind: &MappingKind, value: &PrimitiveValue) -> Result<Value> {
    match kind {
        MappingKind::Primitive(m) => value::to_column(value.clone(), m.ty),
        MappingKind::FeatureReference(_) | MappingKind::Code(_) => {
            Ok(Value::String(value::lexical(value)))
        }
        _ => Err(Error::unsupported_feature(
            "comparison on a geometry or compound value",
        )),
    }
}

fn overlaps(column: Expr, envelope: &Envelope, srid: i32) -> Expr {
    Expr::binary_op(
        column,
        BinaryOp::Overlaps,
        Expr::geometry(envelope.to_wkb(), srid),
    )
}

/// Column and SRID of the first geometry stored in the feature type's own
/// table.
fn first_geometry(mapping: &FeatureTypeMapping) -> Option<(String, i32)> {
    mapping.mapped().find_map(|(_, mapping)| match &mapping.kind {
        MappingKind::Geometry(m) if mapping.join.is_none() => Some((m.column.name.clone(), m.srid)),
        _ => None,
    })
}

fn display(path: &PropertyPath) -> String {
    path.0
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
