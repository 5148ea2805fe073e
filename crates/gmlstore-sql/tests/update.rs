use gmlstore_core::feature::{NoTransform, Property, Value as FeatureValue};
use gmlstore_core::schema::app::*;
use gmlstore_core::schema::{Builder, MappedSchema, QName, StorageMode};
use gmlstore_sql::stmt::Value;
use gmlstore_sql::update::{self, UpdateBuilder};
use gmlstore_sql::{Serializer, Statement};

use pretty_assertions::assert_eq;
use std_util::prelude::*;

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::new(NS, local)
}

fn build(mode: StorageMode) -> MappedSchema {
    let mut app = Schema::default();
    app.add_feature_type(
        FeatureType::new(q("Building"))
            .with_property(
                PropertyType::new(q("name"), TypeRef::primitive(PrimitiveType::String))
                    .occurs(0, MaxOccurs::Unbounded),
            )
            .with_property(PropertyType::new(
                q("footprint"),
                TypeRef::geometry(GeometryType::Polygon),
            )),
    );
    assert_ok!(Builder::new().mode(mode).build(&app, None, None))
}

fn sql(stmt: &Statement) -> (String, Vec<Value>) {
    let mut params = vec![];
    let sql = Serializer::postgis().serialize(stmt, &mut params);
    (sql, params)
}

#[test]
fn replacing_properties() {
    let schema = build(StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![
        Property {
            name: q("name"),
            value: "Neues Rathaus".into(),
        },
        Property {
            name: q("footprint"),
            value: FeatureValue::Null,
        },
    ];

    let plan = assert_ok!(UpdateBuilder::new(ft, &NoTransform).build(Value::I32(5), &properties));

    let statements: Vec<_> = plan.statements.iter().map(sql).collect();
    assert_eq!(
        statements,
        [
            (
                "DELETE FROM building_name WHERE parentfk = $1;".to_string(),
                vec![Value::I32(5)]
            ),
            (
                "UPDATE building SET footprint = $1 WHERE id = $2;".to_string(),
                vec![Value::Null, Value::I32(5)]
            ),
        ]
    );

    assert_eq!(plan.inserts.len(), 1);
    assert_eq!(
        sql(&plan.inserts[0].to_statement()),
        (
            "INSERT INTO building_name (value, parentfk) VALUES ($1, $2);".to_string(),
            vec![Value::String("Neues Rathaus".into()), Value::I32(5)]
        )
    );
}

#[test]
fn unmapped_properties_change_nothing() {
    let schema = build(StorageMode::Relational);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![Property {
        name: q("height"),
        value: 12i64.into(),
    }];

    let plan = assert_ok!(UpdateBuilder::new(ft, &NoTransform).build(Value::I32(1), &properties));
    assert!(plan.statements.is_empty());
    assert!(plan.inserts.is_empty());
}

#[test]
fn extents_come_from_stored_envelopes() {
    let schema = build(StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let (sql, params) = sql(&assert_ok!(update::refresh_extent(&schema, ft)));
    assert_eq!(
        sql,
        "UPDATE feature_types SET bbox = (SELECT ST_Extent(gml_bounded_by)::geometry FROM gml_objects WHERE ft_type = $1) WHERE id = $2;"
    );
    assert_eq!(params, [Value::I16(1), Value::I16(1)]);
}

#[test]
fn relational_extents_come_from_the_geometry_column() {
    let schema = build(StorageMode::Relational);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let (sql, _) = sql(&assert_ok!(update::refresh_extent(&schema, ft)));
    assert_eq!(
        sql,
        "UPDATE feature_types SET bbox = (SELECT ST_Extent(footprint)::geometry FROM building) WHERE id = $1;"
    );
}

#[test]
fn deletes_target_the_owning_table() {
    let hybrid = build(StorageMode::Hybrid);
    let ft = hybrid.feature_type(&q("Building")).unwrap();
    let (objects, params) = sql(&update::delete_feature(&hybrid, ft, Value::I64(1)));
    assert_eq!(objects, "DELETE FROM gml_objects WHERE id = $1;");
    assert_eq!(params, [Value::I64(1)]);

    let relational = build(StorageMode::Relational);
    let ft = relational.feature_type(&q("Building")).unwrap();
    let (table, _) = sql(&update::delete_feature(&relational, ft, Value::I64(1)));
    assert_eq!(table, "DELETE FROM building WHERE id = $1;");
}

#[test]
fn payload_rewrite() {
    let schema = build(StorageMode::Blob);

    let (sql, params) = sql(&update::objects_update(
        &schema,
        Value::I32(4),
        b"{}".to_vec(),
        None,
    ));
    assert_eq!(
        sql,
        "UPDATE gml_objects SET binary_object = $1, gml_bounded_by = $2 WHERE id = $3;"
    );
    assert_eq!(
        params,
        [Value::Bytes(b"{}".to_vec()), Value::Null, Value::I32(4)]
    );
}

#[test]
fn object_ids_by_external_id() {
    let schema = build(StorageMode::Hybrid);
    let (sql, params) = sql(&update::object_ids(
        &schema,
        &["BUILDING_1".to_string(), "BUILDING_2".to_string()],
    ));
    assert_eq!(
        sql,
        "SELECT id, gml_id FROM gml_objects WHERE gml_id IN ($1, $2);"
    );
    assert_eq!(params[1], Value::String("BUILDING_2".into()));
}

#[test]
fn payload_lookup() {
    let schema = build(StorageMode::Blob);
    let (sql, params) = sql(&update::object_payload(&schema, "BUILDING_3"));
    assert_eq!(
        sql,
        "SELECT id, binary_object FROM gml_objects WHERE gml_id = $1;"
    );
    assert_eq!(params, [Value::String("BUILDING_3".into())]);
}
