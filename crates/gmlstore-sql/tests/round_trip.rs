//! Features written through the insert trees and read back through the
//! feature query come out as they went in. The query runs against an
//! in-memory copy of the inserted rows.

use gmlstore_core::feature::{
    wkb, Attribute, ComplexValue, Geometry, JsonCodec, NoTransform, PrimitiveValue, Property,
    Value as FeatureValue,
};
use gmlstore_core::schema::app::*;
use gmlstore_core::schema::mapping::{FeatureTypeMapping, CHILD_KEY_COLUMN};
use gmlstore_core::schema::{Builder, MappedSchema, QName, StorageMode};
use gmlstore_core::stmt::Row;
use gmlstore_core::Feature;
use gmlstore_sql::stmt::{BinaryOp, Expr, Function, Select, Statement, Value};
use gmlstore_sql::{InsertRow, InsertTreeBuilder, QueryBuilder};

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std_util::prelude::*;

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::new(NS, local)
}

fn app() -> Schema {
    let string = || TypeRef::primitive(PrimitiveType::String);

    let mut schema = Schema::default();
    schema.namespaces.insert("app".into(), NS.into());
    schema.add_element(ElementDecl::new(q("street"), string()));
    schema.add_element(ElementDecl::new(q("phone"), string()));
    schema.add_complex_type(ComplexType {
        name: q("AddressType"),
        attributes: vec![AttributeDecl {
            name: q("kind"),
            ty: PrimitiveType::String,
            required: false,
        }],
        text: None,
        particles: vec![
            Particle::element(q("street")),
            Particle::element(q("phone")).occurs(0, MaxOccurs::Unbounded),
        ],
    });
    schema.add_feature_type(
        FeatureType::new(q("Building"))
            .with_property(PropertyType::new(
                q("storeys"),
                TypeRef::primitive(PrimitiveType::Integer),
            ))
            .with_property(PropertyType::new(q("name"), string()).occurs(0, MaxOccurs::Unbounded))
            .with_property(PropertyType::new(
                q("footprint"),
                TypeRef::geometry(GeometryType::Polygon),
            ))
            .with_property(PropertyType::new(q("usage"), TypeRef::Code))
            .with_property(PropertyType::new(
                q("owner"),
                TypeRef::FeatureReference { target: None },
            ))
            .with_property(PropertyType::new(
                q("address"),
                TypeRef::complex(q("AddressType")),
            )),
    );
    schema
}

fn schema() -> MappedSchema {
    assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None))
}

fn building(schema: &MappedSchema) -> &FeatureTypeMapping {
    schema.feature_type(&q("Building")).unwrap()
}

/// Rows stored per table, with every column value the inserts bound.
#[derive(Default)]
struct Tables {
    rows: IndexMap<String, Vec<IndexMap<String, Value>>>,
    next_key: i64,
}

impl Tables {
    /// Stores an insert tree the way the engine does: parents first, each
    /// child bound to the keys of its parent.
    fn insert(&mut self, mut row: InsertRow) {
        let mut stored: IndexMap<String, Value> = row
            .columns
            .iter()
            .map(|(column, expr)| (column.clone(), bound(expr)))
            .collect();

        if !stored.contains_key(CHILD_KEY_COLUMN) {
            self.next_key += 1;
            stored.insert(CHILD_KEY_COLUMN.to_string(), Value::I64(100 + self.next_key));
        }

        let keys: IndexMap<String, Value> = row
            .key_columns()
            .into_iter()
            .map(|column| (column.to_string(), stored[column].clone()))
            .collect();

        self.rows.entry(row.table.clone()).or_default().push(stored);

        for mut child in row.children.drain(..) {
            assert_ok!(child.bind_parent(&keys));
            self.insert(child);
        }
    }

    /// Runs a feature select: left joins on column equality, then the
    /// projection. Unmatched joins leave their columns `NULL`.
    fn select(&self, select: &Select) -> Vec<Row> {
        assert!(select.filter.is_none());

        let from = select.from.as_ref().unwrap();
        let mut scopes: Vec<IndexMap<String, Option<&IndexMap<String, Value>>>> = self
            .table(&from.name)
            .iter()
            .map(|row| IndexMap::from([(alias_of(from), Some(row))]))
            .collect();

        for join in &select.joins {
            let Expr::BinaryOp {
                lhs,
                op: BinaryOp::Eq,
                rhs,
            } = &join.on
            else {
                panic!("unexpected join condition {:?}", join.on);
            };
            let (joined, joined_column) = column_of(lhs);
            assert_eq!(joined, alias_of(&join.table));

            let mut next = vec![];
            for scope in scopes {
                let outer = lookup(&scope, rhs);
                let matches: Vec<_> = self
                    .table(&join.table.name)
                    .iter()
                    .filter(|row| !outer.is_null() && row.get(&joined_column) == Some(&outer))
                    .collect();

                if matches.is_empty() {
                    let mut scope = scope.clone();
                    scope.insert(joined.clone(), None);
                    next.push(scope);
                }
                for row in matches {
                    let mut scope = scope.clone();
                    scope.insert(joined.clone(), Some(row));
                    next.push(scope);
                }
            }
            scopes = next;
        }

        scopes
            .iter()
            .map(|scope| {
                let values = select
                    .columns
                    .iter()
                    .map(|item| match &item.expr {
                        Expr::Func {
                            func: Function::AsBinary,
                            args,
                        } => lookup(scope, &args[0]),
                        expr => lookup(scope, expr),
                    })
                    .collect();
                Row::new(values)
            })
            .collect()
    }

    fn table(&self, name: &str) -> &[IndexMap<String, Value>] {
        self.rows.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// The value an insert binds for `expr`; geometries are stored as their
/// well-known binary.
fn bound(expr: &Expr) -> Value {
    match expr {
        Expr::Value(value) => value.clone(),
        Expr::Func {
            func: Function::GeomFromWkb,
            args,
        } => bound(&args[0]),
        _ => panic!("unexpected insert value {expr:?}"),
    }
}

fn alias_of(table: &gmlstore_sql::stmt::TableRef) -> String {
    table.alias.clone().unwrap_or_else(|| table.name.clone())
}

fn column_of(expr: &Expr) -> (String, String) {
    match expr {
        Expr::Column {
            table: Some(table),
            name,
        } => (table.clone(), name.clone()),
        _ => panic!("expected a qualified column, got {expr:?}"),
    }
}

fn lookup(scope: &IndexMap<String, Option<&IndexMap<String, Value>>>, expr: &Expr) -> Value {
    let (alias, column) = column_of(expr);
    scope[&alias]
        .and_then(|row| row.get(&column).cloned())
        .unwrap_or(Value::Null)
}

/// Inserts `features` with keys 1, 2, .. and reads every building back.
fn round_trip(features: &[Feature]) -> Vec<Feature> {
    let schema = schema();
    let ft = building(&schema);

    let mut tables = Tables::default();
    for (key, feature) in (1..).zip(features) {
        let tree = assert_ok!(InsertTreeBuilder::new(ft, &NoTransform)
            .build(&feature.properties, Some(Value::I64(key))));
        tables.insert(tree);
    }

    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(None, &[], None));
    let Statement::Select(select) = &query.statement else {
        panic!("expected a select, got {:?}", query.statement);
    };

    let rows = tables.select(select);
    assert_ok!(query.reconstruct(&rows, &JsonCodec))
}

fn storage_crs() -> Crs {
    let schema = schema();
    let footprint = building(&schema).properties[&q("footprint")].as_ref().unwrap();
    footprint.kind.as_geometry().unwrap().crs.clone()
}

fn feature(id: &str) -> Feature {
    Feature::new(q("Building")).with_id(id)
}

#[test]
fn primitive_values() {
    let stored = feature("BUILDING_1").with_property(q("storeys"), PrimitiveValue::Integer(4));

    assert_eq!(round_trip(&[stored.clone()]), [stored]);
}

#[test]
fn multi_valued_joined_values_keep_their_order() {
    let stored = feature("BUILDING_1")
        .with_property(q("name"), "Town hall")
        .with_property(q("name"), "Rathaus")
        .with_property(q("name"), "Hôtel de ville");

    assert_eq!(round_trip(&[stored.clone()]), [stored]);
}

#[test]
fn geometries() {
    let square = wkb::polygon(&[vec![
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (0.0, 0.0),
    ]]);
    let stored = feature("BUILDING_1")
        .with_property(q("footprint"), Geometry::new(storage_crs(), square));

    assert_eq!(round_trip(&[stored.clone()]), [stored]);
}

#[test]
fn references_keep_their_href() {
    let external = feature("BUILDING_1").with_property(
        q("owner"),
        FeatureValue::reference("http://example.org/owners.xml#O1"),
    );
    let local = feature("BUILDING_2").with_property(q("owner"), FeatureValue::reference("#PERSON_7"));

    assert_eq!(
        round_trip(&[external.clone(), local.clone()]),
        [external, local]
    );
}

#[test]
fn codes_with_and_without_code_space() {
    let with_space = feature("BUILDING_1").with_property(
        q("usage"),
        FeatureValue::code("residential", Some("urn:usage")),
    );
    let without_space =
        feature("BUILDING_2").with_property(q("usage"), FeatureValue::code("office", None));

    assert_eq!(
        round_trip(&[with_space.clone(), without_space.clone()]),
        [with_space, without_space]
    );
}

#[test]
fn compound_values_with_attributes_and_joined_children() {
    let address = ComplexValue {
        attributes: vec![Attribute {
            name: q("kind"),
            value: PrimitiveValue::String("postal".into()),
        }],
        text: None,
        children: vec![
            Property {
                name: q("street"),
                value: "Marktplatz 1".into(),
            },
            Property {
                name: q("phone"),
                value: "+49 30 1234".into(),
            },
            Property {
                name: q("phone"),
                value: "+49 30 5678".into(),
            },
        ],
    };
    let stored = feature("BUILDING_1").with_property(q("address"), address);

    assert_eq!(round_trip(&[stored.clone()]), [stored]);
}

#[test]
fn every_kind_together() {
    // Two joined properties multiply the rows; each value still comes back
    // once.
    let triangle = wkb::polygon(&[vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]]);
    let full = feature("BUILDING_1")
        .with_property(q("storeys"), PrimitiveValue::Integer(2))
        .with_property(q("name"), "Town hall")
        .with_property(q("name"), "Rathaus")
        .with_property(q("footprint"), Geometry::new(storage_crs(), triangle))
        .with_property(q("usage"), FeatureValue::code("civic", Some("urn:usage")))
        .with_property(
            q("owner"),
            FeatureValue::reference("http://example.org/owners.xml#O1"),
        )
        .with_property(
            q("address"),
            ComplexValue {
                attributes: vec![],
                text: None,
                children: vec![
                    Property {
                        name: q("phone"),
                        value: "110".into(),
                    },
                    Property {
                        name: q("phone"),
                        value: "112".into(),
                    },
                ],
            },
        );
    let sparse = feature("BUILDING_2").with_property(q("name"), "Shed");

    let read = round_trip(&[full.clone(), sparse.clone()]);
    assert_eq!(read, [full, sparse]);
}
