//! Turns a feature into a tree of rows to insert.
//!
//! The root row targets the feature type's table. Values of joined mappings
//! become child rows, one per occurrence, linked to the row they hang off.
//! Rows are executed parent first so that generated keys can be handed down.

use crate::stmt::{Expr, Function, Insert, Select, Statement, Value};
use crate::value;

use gmlstore_core::{
    err,
    feature::{
        ComplexValue, CoordinateTransform, Envelope, PrimitiveValue, Property,
        Value as FeatureValue,
    },
    schema::{
        mapping::{FeatureTypeMapping, Mapping, MappingKind, PathStep, ValuePath},
        MappedSchema, QName,
    },
    Result,
};
use indexmap::IndexMap;
use tracing::warn;

/// A row to insert, along with the rows referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRow {
    pub table: String,

    /// Bound column values, in insertion order.
    pub columns: IndexMap<String, Expr>,

    /// How this row references its parent. Unset for the root row.
    pub link: Option<Link>,

    pub children: Vec<InsertRow>,
}

/// `column` of the child row receives the value of `parent_column` of the
/// parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub parent_column: String,
    pub column: String,
}

/// Builds insert trees for features of one feature type.
#[derive(Debug)]
pub struct InsertTreeBuilder<'a> {
    mapping: &'a FeatureTypeMapping,
    transform: &'a dyn CoordinateTransform,
}

impl InsertRow {
    pub fn new(table: impl Into<String>) -> InsertRow {
        InsertRow {
            table: table.into(),
            columns: IndexMap::new(),
            link: None,
            children: vec![],
        }
    }

    fn child(table: &str, link: Link) -> InsertRow {
        InsertRow {
            link: Some(link),
            ..InsertRow::new(table)
        }
    }

    pub fn set(&mut self, column: impl Into<String>, value: Expr) {
        self.columns.insert(column.into(), value);
    }

    /// Columns of this row whose values the children need, in first use
    /// order.
    pub fn key_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![];
        for child in &self.children {
            if let Some(link) = &child.link {
                if !out.contains(&link.parent_column.as_str()) {
                    out.push(&link.parent_column);
                }
            }
        }
        out
    }

    /// The value bound to `column`, if it is known before the insert.
    pub fn bound_value(&self, column: &str) -> Option<&Value> {
        match self.columns.get(column) {
            Some(Expr::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Key columns that must be read back with `RETURNING`.
    pub fn returning(&self) -> Vec<String> {
        self.key_columns()
            .into_iter()
            .filter(|column| self.bound_value(column).is_none())
            .map(str::to_string)
            .collect()
    }

    /// The `INSERT` of this row alone, returning the key columns the
    /// children need but the row does not bind itself.
    pub fn to_statement(&self) -> Statement {
        let (columns, values) = self
            .columns
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .unzip();

        Insert {
            into: self.table.clone(),
            columns,
            rows: vec![values],
            returning: self.returning(),
        }
        .into()
    }

    /// Like [`InsertRow::to_statement`], additionally reading back `key`
    /// unless the row binds it.
    pub fn to_statement_with_key(&self, key: &str) -> Statement {
        let mut statement = self.to_statement();
        if let Statement::Insert(insert) = &mut statement {
            if self.bound_value(key).is_none() && !insert.returning.iter().any(|c| c == key) {
                insert.returning.push(key.to_string());
            }
        }
        statement
    }

    /// Binds the link column from the key values of the inserted parent.
    pub fn bind_parent(&mut self, keys: &IndexMap<String, Value>) -> Result<()> {
        let Some(link) = &self.link else {
            return Ok(());
        };

        let value = keys.get(&link.parent_column).ok_or_else(|| {
            err!(
                "parent key `{}` of a `{}` row is not available",
                link.parent_column,
                self.table
            )
        })?;

        let column = link.column.clone();
        self.set(column, Expr::Value(value.clone()));
        Ok(())
    }

    /// Number of rows in the tree.
    pub fn row_count(&self) -> usize {
        1 + self.children.iter().map(InsertRow::row_count).sum::<usize>()
    }
}

impl<'a> InsertTreeBuilder<'a> {
    pub fn new(
        mapping: &'a FeatureTypeMapping,
        transform: &'a dyn CoordinateTransform,
    ) -> InsertTreeBuilder<'a> {
        InsertTreeBuilder { mapping, transform }
    }

    /// The row tree storing `properties`. `fid`, when given, is bound to the
    /// key column; otherwise the database is expected to assign it.
    pub fn build(&self, properties: &[Property], fid: Option<Value>) -> Result<InsertRow> {
        let mut root = InsertRow::new(&self.mapping.table);

        if let Some(fid) = fid {
            root.set(&self.mapping.fid.column, Expr::Value(fid));
        }

        for property in properties {
            if !self.mapping.properties.contains_key(&property.name) {
                warn!(
                    feature_type = %self.mapping.name,
                    property = %property.name,
                    "property is not part of the mapping; value is not stored"
                );
            }
        }

        for (name, mapping) in &self.mapping.properties {
            let values = property_values(properties, name);

            match mapping {
                Some(mapping) => self.map_values(&mut root, mapping, values)?,
                None if !values.is_empty() => warn!(
                    feature_type = %self.mapping.name,
                    property = %name,
                    "property is unmapped; value is not stored"
                ),
                None => {}
            }
        }

        Ok(root)
    }

    /// Binds `values` of one mapping to `row`, or to new child rows if the
    /// mapping is joined.
    fn map_values(
        &self,
        row: &mut InsertRow,
        mapping: &Mapping,
        values: Vec<FeatureValue>,
    ) -> Result<()> {
        let Some(chain) = &mapping.join else {
            let mut values = values.into_iter();
            if let Some(value) = values.next() {
                self.bind(row, mapping, value)?;
            }
            if values.next().is_some() {
                warn!(
                    feature_type = %self.mapping.name,
                    path = %mapping.path,
                    "several values for a single valued mapping; storing the first"
                );
            }
            return Ok(());
        };

        for (index, value) in values.into_iter().enumerate() {
            let mut rows: Vec<_> = chain
                .steps()
                .iter()
                .map(|step| {
                    InsertRow::child(
                        &step.to.table,
                        Link {
                            parent_column: step.from.column.clone(),
                            column: step.to.column.clone(),
                        },
                    )
                })
                .collect();

            let Some(mut child) = rows.pop() else {
                continue;
            };

            if let Some(order) = &chain.order_column {
                let index = i32::try_from(index)
                    .map_err(|_| err!("too many values for `{}`", mapping.path))?;
                child.set(order, Expr::value(index));
            }
            self.bind(&mut child, mapping, value)?;

            while let Some(mut parent) = rows.pop() {
                parent.children.push(child);
                child = parent;
            }
            row.children.push(child);
        }

        Ok(())
    }

    fn bind(&self, row: &mut InsertRow, mapping: &Mapping, value: FeatureValue) -> Result<()> {
        match (&mapping.kind, value) {
            (_, FeatureValue::Null) => {}
            (MappingKind::Primitive(m), FeatureValue::Primitive(v)) => {
                row.set(&m.column.name, Expr::Value(value::to_column(v, m.ty)?));
            }
            (MappingKind::Primitive(m), FeatureValue::Code { value: code, .. }) => {
                let v = value::to_column(PrimitiveValue::String(code), m.ty)?;
                row.set(&m.column.name, Expr::Value(v));
            }
            (MappingKind::Primitive(m), FeatureValue::Complex(ComplexValue { text: Some(v), .. })) => {
                row.set(&m.column.name, Expr::Value(value::to_column(v, m.ty)?));
            }
            (MappingKind::Geometry(m), FeatureValue::Geometry(geometry)) => {
                let geometry = if geometry.crs.same_as(&m.crs) {
                    geometry
                } else {
                    self.transform.transform(&geometry, &m.crs)?
                };
                row.set(&m.column.name, Expr::geometry(geometry.wkb, m.srid));
            }
            (MappingKind::FeatureReference(m), FeatureValue::Reference { href }) => {
                row.set(&m.column.name, Expr::value(href));
            }
            (MappingKind::Code(m), FeatureValue::Code { value: code, code_space }) => {
                row.set(&m.value.name, Expr::value(code));
                row.set(&m.code_space.name, Expr::value(code_space));
            }
            (MappingKind::Code(m), FeatureValue::Primitive(v)) => {
                row.set(&m.value.name, Expr::value(value::lexical(&v)));
            }
            (MappingKind::Compound(m), FeatureValue::Complex(complex)) => {
                for particle in &m.particles {
                    let values = resolve(&particle.path, &complex);
                    self.map_values(row, particle, values)?;
                }
            }
            (_, other) => {
                return Err(err!(
                    "cannot store {} value at `{}`",
                    describe(&other),
                    mapping.path
                ));
            }
        }

        Ok(())
    }
}

/// The non-nil values of property `name`, in document order.
fn property_values(properties: &[Property], name: &QName) -> Vec<FeatureValue> {
    properties
        .iter()
        .filter(|property| property.name == *name && !property.value.is_null())
        .map(|property| property.value.clone())
        .collect()
}

/// Values `path` selects from a complex value.
fn resolve(path: &ValuePath, complex: &ComplexValue) -> Vec<FeatureValue> {
    fn walk(steps: &[PathStep], complex: &ComplexValue, out: &mut Vec<FeatureValue>) {
        match steps {
            [] => {}
            [PathStep::Text] => out.extend(complex.text.clone().map(FeatureValue::Primitive)),
            [PathStep::Attribute(name)] => out.extend(
                complex
                    .attribute(name)
                    .cloned()
                    .map(FeatureValue::Primitive),
            ),
            [PathStep::Element(name)] => out.extend(
                complex
                    .children(name)
                    .filter(|value| !value.is_null())
                    .cloned(),
            ),
            [PathStep::Element(name), rest @ ..] => {
                for child in complex.children(name) {
                    if let Some(child) = child.as_complex() {
                        walk(rest, child, out);
                    }
                }
            }
            [_, ..] => {}
        }
    }

    let mut out = vec![];
    walk(&path.steps, complex, &mut out);
    out
}

fn describe(value: &FeatureValue) -> &'static str {
    match value {
        FeatureValue::Null => "a nil",
        FeatureValue::Primitive(_) => "a primitive",
        FeatureValue::Geometry(_) => "a geometry",
        FeatureValue::Reference { .. } => "a feature reference",
        FeatureValue::Code { .. } => "a code",
        FeatureValue::Complex(_) => "a complex",
    }
}

/// The objects table row of a feature.
pub fn objects_row(
    schema: &MappedSchema,
    id: Value,
    gml_id: &str,
    type_id: i16,
    data: Vec<u8>,
    envelope: Option<Envelope>,
) -> InsertRow {
    let blob = &schema.blob;

    let mut row = InsertRow::new(&blob.table);
    row.set(&blob.id_column, Expr::Value(id));
    row.set(&blob.gml_id_column, Expr::value(gml_id));
    row.set(&blob.type_column, Expr::value(type_id));
    row.set(&blob.data_column, Expr::value(data));
    row.set(
        &blob.bbox_column,
        match envelope {
            Some(envelope) => Expr::geometry(envelope.to_wkb(), schema.storage_srid),
            None => Expr::Value(Value::Null),
        },
    );
    row
}

/// `SELECT nextval('<sequence>')`
pub fn next_value(sequence: &str) -> Statement {
    let mut select = Select::new(None);
    select.push(Expr::func(Function::Nextval, [Expr::string(sequence)]));
    select.into()
}

/// Draws the next id of the objects table from the sequence behind its
/// serial id column, so that relational rows can be keyed before the
/// objects row exists.
pub fn reserve_object_id(schema: &MappedSchema) -> Statement {
    let blob = &schema.blob;
    let mut select = Select::new(None);
    select.push(Expr::func(
        Function::Nextval,
        [Expr::func(
            Function::SerialSequence,
            [Expr::string(&blob.table), Expr::string(&blob.id_column)],
        )],
    ));
    select.into()
}
