//! Select statements for the features of one feature type, and the
//! reconstruction of features from their result rows.

mod multi;
pub use multi::MultiTypeQuery;

mod plan;
use plan::{ReadKind, ReadNode, ReadPlan};

use crate::filter::{Filter, SortBy, Translator};
use crate::stmt::{Expr, Function, Select, Statement, TableRef};

use gmlstore_core::{
    feature::Envelope,
    schema::{
        mapping::{FeatureTypeMapping, Mapping, MappingKind, CHILD_KEY_COLUMN},
        MappedSchema, StorageMode,
    },
    Error, Result,
};
use tracing::debug;

/// Hands out table aliases `x1`, `x2`, .. for one statement.
#[derive(Debug, Default)]
pub(crate) struct Aliases {
    next: usize,
}

/// Assembles queries for one feature type.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    schema: &'a MappedSchema,
    mapping: &'a FeatureTypeMapping,
}

/// A select statement together with the layout of its result rows.
#[derive(Debug)]
pub struct FeatureQuery<'a> {
    pub statement: Statement,
    plan: ReadPlan<'a>,
}

impl Aliases {
    pub(crate) fn next(&mut self) -> String {
        self.next += 1;
        format!("x{}", self.next)
    }
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a MappedSchema, mapping: &'a FeatureTypeMapping) -> QueryBuilder<'a> {
        QueryBuilder { schema, mapping }
    }

    /// Builds the query. `bbox` is a loose pre-filter on the feature
    /// envelope; it is dropped if the storage has nothing to test it on.
    pub fn build(
        &self,
        filter: Option<&Filter>,
        sort: &[SortBy],
        bbox: Option<&Envelope>,
    ) -> Result<FeatureQuery<'a>> {
        let schema = self.schema;
        let blob = &schema.blob;
        let mut aliases = Aliases::default();

        let (mut select, objects, table) = match schema.mode {
            StorageMode::Blob => {
                let objects = aliases.next();
                let select = Select::from_table(&blob.table, &objects);
                (select, Some(objects), None)
            }
            StorageMode::Hybrid => {
                let objects = aliases.next();
                let table = aliases.next();
                let mut select = Select::from_table(&blob.table, &objects);
                select.left_join(
                    TableRef::aliased(&self.mapping.table, &table),
                    Expr::eq(
                        Expr::qualified(&objects, &blob.id_column),
                        Expr::qualified(&table, &self.mapping.fid.column),
                    ),
                );
                (select, Some(objects), Some(table))
            }
            StorageMode::Relational => {
                let table = aliases.next();
                let select = Select::from_table(&self.mapping.table, &table);
                (select, None, Some(table))
            }
        };

        let key_expr = match (&objects, &table) {
            (Some(objects), _) => Expr::qualified(objects, &blob.id_column),
            (None, Some(table)) => Expr::qualified(table, &self.mapping.fid.column),
            (None, None) => return Err(Error::invalid_schema("query without a table")),
        };

        let mut plan = ReadPlan {
            mapping: self.mapping,
            key: select.push(key_expr.clone()),
            gml_id: None,
            data: None,
            properties: vec![],
        };
        let mut order = vec![key_expr];

        if let Some(objects) = &objects {
            plan.gml_id = Some(select.push(Expr::qualified(objects, &blob.gml_id_column)));
            plan.data = Some(select.push(Expr::qualified(objects, &blob.data_column)));

            let type_id = schema.type_id(&self.mapping.name).ok_or_else(|| {
                Error::invalid_schema(format!(
                    "feature type {} has no type id",
                    self.mapping.name
                ))
            })?;
            select.and_where(Expr::eq(
                Expr::qualified(objects, &blob.type_column),
                Expr::value(type_id),
            ));
        }

        if let Some(table) = &table {
            for (name, mapping) in self.mapping.mapped() {
                let node = read_node(&mut select, &mut aliases, &mut order, table, mapping);
                plan.properties.push((name, node));
            }
        }

        let mut translator = Translator {
            schema,
            mapping: self.mapping,
            table: table.as_deref(),
            objects: objects.as_deref(),
            aliases: &mut aliases,
        };

        if let Some(filter) = filter {
            let filter = translator.translate(filter)?;
            select.and_where(filter);
        }

        if let Some(bbox) = bbox {
            match translator.envelope_filter(bbox) {
                Ok(filter) => select.and_where(filter),
                Err(err) if err.is_unsupported_feature() => {
                    debug!(feature_type = %self.mapping.name, "no envelope to pre-filter on");
                }
                Err(err) => return Err(err),
            }
        }

        for sort_by in sort {
            let key = translator.sort_key(&sort_by.property)?;
            select.order_by(key, sort_by.descending);
        }

        for expr in order {
            select.order_by(expr, false);
        }

        Ok(FeatureQuery {
            statement: select.into(),
            plan,
        })
    }
}

/// Adds the columns and joins reading `mapping`, owned by the row aliased
/// `owner`.
fn read_node<'a>(
    select: &mut Select,
    aliases: &mut Aliases,
    order: &mut Vec<Expr>,
    owner: &str,
    mapping: &'a Mapping,
) -> ReadNode<'a> {
    let mut alias = owner.to_string();

    let key = mapping.join.as_ref().map(|chain| {
        for step in chain.steps() {
            let next = aliases.next();
            select.left_join(
                TableRef::aliased(&step.to.table, &next),
                Expr::eq(
                    Expr::qualified(&next, &step.to.column),
                    Expr::qualified(&alias, &step.from.column),
                ),
            );
            alias = next;
        }

        if let Some(column) = &chain.order_column {
            order.push(Expr::qualified(&alias, column));
        }
        order.push(Expr::qualified(&alias, CHILD_KEY_COLUMN));
        select.push(Expr::qualified(&alias, CHILD_KEY_COLUMN))
    });

    let kind = match &mapping.kind {
        MappingKind::Primitive(m) => ReadKind::Primitive {
            column: select.push(Expr::qualified(&alias, &m.column.name)),
            ty: m.ty,
        },
        MappingKind::Geometry(m) => ReadKind::Geometry {
            column: select.push(Expr::func(
                Function::AsBinary,
                [Expr::qualified(&alias, &m.column.name)],
            )),
            crs: &m.crs,
        },
        MappingKind::FeatureReference(m) => ReadKind::Reference {
            column: select.push(Expr::qualified(&alias, &m.column.name)),
        },
        MappingKind::Code(m) => ReadKind::Code {
            value: select.push(Expr::qualified(&alias, &m.value.name)),
            code_space: select.push(Expr::qualified(&alias, &m.code_space.name)),
        },
        MappingKind::Compound(m) => ReadKind::Compound(
            m.particles
                .iter()
                .map(|particle| read_node(select, aliases, order, &alias, particle))
                .collect(),
        ),
    };

    ReadNode { mapping, key, kind }
}
