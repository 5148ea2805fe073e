//! Statements changing stored features: property replacement, payload
//! re-encoding, deletes and extent maintenance.

use crate::insert::{InsertRow, InsertTreeBuilder};
use crate::stmt::{Expr, Function, Select, Statement, TableRef, Value};

use gmlstore_core::{
    feature::{CoordinateTransform, Envelope, Property},
    schema::{
        db,
        mapping::{FeatureTypeMapping, JoinChain, Mapping, MappingKind, PropertyLookup},
        MappedSchema, QName,
    },
    Error, Result,
};
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

/// Replaces the values of some properties of one stored feature.
///
/// Run `statements` in order, then insert each tree of `inserts`. The
/// inserts are already linked to the feature's row.
#[derive(Debug)]
pub struct UpdatePlan {
    pub statements: Vec<Statement>,
    pub inserts: Vec<InsertRow>,
}

/// Builds [`UpdatePlan`]s for features of one feature type.
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    mapping: &'a FeatureTypeMapping,
    transform: &'a dyn CoordinateTransform,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(
        mapping: &'a FeatureTypeMapping,
        transform: &'a dyn CoordinateTransform,
    ) -> UpdateBuilder<'a> {
        UpdateBuilder { mapping, transform }
    }

    /// Replaces every value of the properties named in `properties` for the
    /// feature whose key column holds `key`. A property listed without a
    /// non-nil value is cleared.
    pub fn build(&self, key: Value, properties: &[Property]) -> Result<UpdatePlan> {
        let mapping = self.mapping;
        let names: IndexSet<&QName> = properties.iter().map(|property| &property.name).collect();

        let mut changed = vec![];
        for name in names {
            match mapping.property(name) {
                PropertyLookup::Mapped(m) => changed.push(m),
                PropertyLookup::Unmapped | PropertyLookup::Undeclared => warn!(
                    feature_type = %mapping.name,
                    property = %name,
                    "property is not mapped; value is not updated"
                ),
            }
        }

        let root = InsertTreeBuilder::new(mapping, self.transform).build(properties, None)?;
        let filter = Expr::eq(Expr::column(&mapping.fid.column), Expr::Value(key.clone()));

        let mut statements = vec![];

        let mut chains = vec![];
        for m in &changed {
            joined_chains(m, &mut chains);
        }
        for chain in chains {
            statements.push(delete_children(mapping, chain, &filter, &key));
        }

        let mut assignments: IndexMap<String, Expr> = IndexMap::new();
        for m in changed.iter().filter(|m| !m.is_joined()) {
            for column in m.local_columns() {
                assignments.insert(column.name.clone(), Expr::Value(Value::Null));
            }
        }
        for (column, value) in &root.columns {
            assignments.insert(column.clone(), value.clone());
        }
        if !assignments.is_empty() {
            statements.push(Statement::update(
                &mapping.table,
                assignments.into_iter().collect(),
                filter,
            ));
        }

        let mut keys = IndexMap::new();
        keys.insert(mapping.fid.column.clone(), key);
        for column in root.key_columns() {
            if let Some(value) = root.bound_value(column) {
                keys.insert(column.to_string(), value.clone());
            }
        }

        let mut inserts = root.children;
        for child in &mut inserts {
            child.bind_parent(&keys)?;
        }

        Ok(UpdatePlan {
            statements,
            inserts,
        })
    }
}

/// Chains leading out of the row owning `mapping`, stopping at the first
/// join on every branch. Deeper rows go with their parents.
fn joined_chains<'m>(mapping: &'m Mapping, out: &mut Vec<&'m JoinChain>) {
    if let Some(chain) = &mapping.join {
        out.push(chain);
        return;
    }
    if let MappingKind::Compound(compound) = &mapping.kind {
        for particle in &compound.particles {
            joined_chains(particle, out);
        }
    }
}

/// Deletes the first-hop child rows of `chain` for the feature row matched
/// by `filter`.
fn delete_children(
    mapping: &FeatureTypeMapping,
    chain: &JoinChain,
    filter: &Expr,
    key: &Value,
) -> Statement {
    let origin = chain.origin();
    let first = &chain.steps()[0].to;

    if origin.column == mapping.fid.column {
        return Statement::delete(
            &first.table,
            Expr::eq(Expr::column(&first.column), Expr::Value(key.clone())),
        );
    }

    let mut parents = Select::new(Some(TableRef::new(&mapping.table)));
    parents.push(Expr::column(&origin.column));
    parents.and_where(filter.clone());
    Statement::delete(
        &first.table,
        Expr::in_subquery(Expr::column(&first.column), parents),
    )
}

/// Rewrites the encoded payload and envelope of the objects row `id`.
pub fn objects_update(
    schema: &MappedSchema,
    id: Value,
    data: Vec<u8>,
    envelope: Option<Envelope>,
) -> Statement {
    let blob = &schema.blob;
    let bbox = match envelope {
        Some(envelope) => Expr::geometry(envelope.to_wkb(), schema.storage_srid),
        None => Expr::Value(Value::Null),
    };

    Statement::update(
        &blob.table,
        vec![
            (blob.data_column.clone(), Expr::value(data)),
            (blob.bbox_column.clone(), bbox),
        ],
        Expr::eq(Expr::column(&blob.id_column), Expr::Value(id)),
    )
}

/// Objects rows of features by external id: `SELECT id, gml_id ..`.
pub fn object_ids(schema: &MappedSchema, gml_ids: &[String]) -> Statement {
    let blob = &schema.blob;
    let mut select = Select::new(Some(TableRef::new(&blob.table)));
    select.push(Expr::column(&blob.id_column));
    select.push(Expr::column(&blob.gml_id_column));
    select.and_where(Expr::in_list(
        Expr::column(&blob.gml_id_column),
        gml_ids.iter().map(|id| Expr::value(id.as_str())),
    ));
    select.into()
}

/// The objects row id and stored payload of one feature:
/// `SELECT id, binary_object ..`.
pub fn object_payload(schema: &MappedSchema, gml_id: &str) -> Statement {
    let blob = &schema.blob;
    let mut select = Select::new(Some(TableRef::new(&blob.table)));
    select.push(Expr::column(&blob.id_column));
    select.push(Expr::column(&blob.data_column));
    select.and_where(Expr::eq(
        Expr::column(&blob.gml_id_column),
        Expr::value(gml_id),
    ));
    select.into()
}

/// Deletes the feature whose key is bound as the single parameter, for
/// batch execution.
pub fn delete_feature(schema: &MappedSchema, mapping: &FeatureTypeMapping, key: Value) -> Statement {
    let (table, column) = if schema.has_blob() {
        (&schema.blob.table, &schema.blob.id_column)
    } else {
        (&mapping.table, &mapping.fid.column)
    };

    Statement::delete(table, Expr::eq(Expr::column(column), Expr::Value(key)))
}

/// Recomputes the registry extent of a feature type from its stored
/// envelopes, or from its first directly stored geometry in relational
/// storage.
pub fn refresh_extent(schema: &MappedSchema, mapping: &FeatureTypeMapping) -> Result<Statement> {
    let registry = &schema.bbox;
    let type_id = schema.type_id(&mapping.name).ok_or_else(|| {
        Error::invalid_schema(format!("feature type {} has no type id", mapping.name))
    })?;

    let query = if schema.has_blob() {
        let blob = &schema.blob;
        let mut select = Select::new(Some(TableRef::new(&blob.table)));
        select.push(extent(Expr::column(&blob.bbox_column)));
        select.and_where(Expr::eq(
            Expr::column(&blob.type_column),
            Expr::value(type_id),
        ));
        select
    } else {
        let column = mapping
            .mapped()
            .find_map(|(_, m)| match &m.kind {
                MappingKind::Geometry(g) if !m.is_joined() => Some(&g.column.name),
                _ => None,
            })
            .ok_or_else(|| {
                Error::unsupported_feature(format!(
                    "feature type {} stores no geometry to compute an extent from",
                    mapping.name
                ))
            })?;

        let mut select = Select::new(Some(TableRef::new(&mapping.table)));
        select.push(extent(Expr::column(column)));
        select
    };

    Ok(Statement::update(
        &registry.table,
        vec![(registry.bbox_column.clone(), Expr::subquery(query))],
        Expr::eq(Expr::column(&registry.id_column), Expr::value(type_id)),
    ))
}

/// `ST_Extent(column)::geometry`, since the aggregate yields a box.
fn extent(column: Expr) -> Expr {
    Expr::cast(
        Expr::func(Function::Extent, [column]),
        db::Type::Custom("geometry".to_string()),
    )
}
