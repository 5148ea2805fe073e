use gmlstore_core::feature::{Geometry, NoTransform, Property, Value as FeatureValue};
use gmlstore_core::schema::app::*;
use gmlstore_core::schema::{Builder, MappedSchema, MappingConfig, QName, StorageMode};
use gmlstore_sql::stmt::{Expr, Value};
use gmlstore_sql::{insert, InsertTreeBuilder, Serializer};

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std_util::prelude::*;

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::new(NS, local)
}

fn app() -> Schema {
    let mut schema = Schema::default();
    schema.namespaces.insert("app".into(), NS.into());
    schema.add_feature_type(
        FeatureType::new(q("Building"))
            .with_property(
                PropertyType::new(q("name"), TypeRef::primitive(PrimitiveType::String))
                    .occurs(0, MaxOccurs::Unbounded),
            )
            .with_property(PropertyType::new(
                q("footprint"),
                TypeRef::geometry(GeometryType::Polygon),
            ))
            .with_property(PropertyType::new(q("usage"), TypeRef::Code))
            .with_property(PropertyType::new(
                q("owner"),
                TypeRef::FeatureReference { target: None },
            )),
    );
    schema
}

fn uuid_schema() -> MappedSchema {
    let config = assert_ok!(MappingConfig::from_toml(
        r#"
        mode = "relational"

        [[feature_type]]
        name = "app:Building"
        table = "building"
        fid = { column = "id", generator = "uuid", prefix = "BUILDING_" }

        [[feature_type.property]]
        path = "app:name"
        kind = "primitive"
        type = "string"
        mapping = "value"
        join = "id=building_name.parentfk"
        "#
    ));
    assert_ok!(Builder::new().build(&app(), Some(&config), None))
}

fn names(values: &[&str]) -> Vec<Property> {
    values
        .iter()
        .map(|value| Property {
            name: q("name"),
            value: (*value).into(),
        })
        .collect()
}

#[test]
fn every_name_gets_a_child_row_under_one_parent() {
    let schema = uuid_schema();
    let ft = schema.feature_type(&q("Building")).unwrap();
    let key = Value::String("0b4f3c1e-8a4e-4f5e-9a53-5b0e7c1d2f10".into());

    let mut tree = assert_ok!(InsertTreeBuilder::new(ft, &NoTransform)
        .build(&names(&["Town hall", "Rathaus"]), Some(key.clone())));

    assert_eq!(tree.table, "building");
    assert_eq!(tree.row_count(), 3);
    assert_eq!(tree.children.len(), 2);

    // The key is bound client-side, so nothing is read back.
    assert!(tree.returning().is_empty());

    let mut params = vec![];
    let sql = Serializer::postgis().serialize(&tree.to_statement(), &mut params);
    assert_eq!(sql, "INSERT INTO building (id) VALUES ($1);");
    assert_eq!(params, [key.clone()]);

    let mut keys = IndexMap::new();
    keys.insert("id".to_string(), key.clone());

    for (child, name) in tree.children.iter_mut().zip(["Town hall", "Rathaus"]) {
        assert_ok!(child.bind_parent(&keys));
        assert_eq!(child.table, "building_name");

        let mut params = vec![];
        let sql = Serializer::postgis().serialize(&child.to_statement(), &mut params);
        assert_eq!(sql, "INSERT INTO building_name (value, parentfk) VALUES ($1, $2);");
        assert_eq!(params, [Value::String(name.into()), key.clone()]);
    }
}

#[test]
fn generated_keys_are_read_back_for_children() {
    let schema = assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None));
    let ft = schema.feature_type(&q("Building")).unwrap();

    let mut properties = names(&["Town hall"]);
    properties.push(Property {
        name: q("footprint"),
        value: Geometry::point(Crs::epsg(4326), 7.0, 51.0).into(),
    });

    let tree = assert_ok!(InsertTreeBuilder::new(ft, &NoTransform).build(&properties, None));
    assert_eq!(tree.returning(), ["id"]);

    let mut params = vec![];
    let sql = Serializer::postgis().serialize(&tree.to_statement(), &mut params);
    assert_eq!(
        sql,
        "INSERT INTO building (footprint) VALUES (ST_GeomFromWKB($1, -1)) RETURNING id;"
    );
    assert!(matches!(&params[..], [Value::Bytes(_)]));

    // Without the parent key the child cannot be linked.
    let mut child = tree.children[0].clone();
    assert_err!(child.bind_parent(&IndexMap::new()));
}

#[test]
fn references_and_codes() {
    let schema = assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None));
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![
        Property {
            name: q("owner"),
            value: FeatureValue::reference("#PERSON_7"),
        },
        Property {
            name: q("usage"),
            value: FeatureValue::code("residential", Some("urn:usage")),
        },
        Property {
            name: q("height"),
            value: 12.5.into(),
        },
    ];

    let tree = assert_ok!(InsertTreeBuilder::new(ft, &NoTransform).build(&properties, None));
    assert!(tree.children.is_empty());
    assert_eq!(tree.columns.get("owner"), Some(&Expr::value("#PERSON_7")));
    assert_eq!(tree.columns.get("usage"), Some(&Expr::value("residential")));
    assert_eq!(
        tree.columns.get("usage_codespace"),
        Some(&Expr::value("urn:usage"))
    );
    assert_eq!(tree.columns.len(), 3);
}

#[test]
fn mismatched_values_are_rejected() {
    let schema = assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None));
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![Property {
        name: q("footprint"),
        value: "not a geometry".into(),
    }];

    assert_err!(InsertTreeBuilder::new(ft, &NoTransform).build(&properties, None));
}

#[test]
fn geometries_in_another_crs_need_a_transform() {
    let schema = assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None));
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![Property {
        name: q("footprint"),
        value: Geometry::point(Crs::epsg(25832), 400000.0, 5700000.0).into(),
    }];

    let err = assert_err!(InsertTreeBuilder::new(ft, &NoTransform).build(&properties, None));
    assert!(err.is_transform_failed());
}

#[test]
fn objects_row_carries_payload_and_envelope() {
    let schema = assert_ok!(Builder::new().build(&app(), None, None));

    let row = insert::objects_row(
        &schema,
        Value::I64(5),
        "BUILDING_5",
        1,
        b"{}".to_vec(),
        None,
    );

    let mut params = vec![];
    let sql = Serializer::postgis().serialize(&row.to_statement(), &mut params);
    assert_eq!(
        sql,
        "INSERT INTO gml_objects (id, gml_id, ft_type, binary_object, gml_bounded_by) VALUES ($1, $2, $3, $4, $5);"
    );
    assert_eq!(
        params,
        [
            Value::I64(5),
            Value::String("BUILDING_5".into()),
            Value::I16(1),
            Value::Bytes(b"{}".to_vec()),
            Value::Null,
        ]
    );
}

#[test]
fn keys_are_drawn_from_sequences() {
    let schema = assert_ok!(Builder::new().build(&app(), None, None));

    assert_eq!(
        Serializer::postgis().serialize_literal(&insert::reserve_object_id(&schema)),
        "SELECT nextval(pg_get_serial_sequence('gml_objects', 'id'));"
    );
    assert_eq!(
        Serializer::postgis().serialize_literal(&insert::next_value("building_seq")),
        "SELECT nextval('building_seq');"
    );
}

#[test]
fn root_rows_read_back_their_key() {
    let schema = assert_ok!(Builder::new()
        .mode(StorageMode::Relational)
        .build(&app(), None, None));
    let ft = schema.feature_type(&q("Building")).unwrap();

    let properties = vec![Property {
        name: q("usage"),
        value: FeatureValue::code("residential", None),
    }];
    let tree = assert_ok!(InsertTreeBuilder::new(ft, &NoTransform).build(&properties, None));
    assert!(tree.returning().is_empty());

    let mut params = vec![];
    let sql = Serializer::postgis().serialize(&tree.to_statement_with_key("id"), &mut params);
    assert_eq!(
        sql,
        "INSERT INTO building (usage, usage_codespace) VALUES ($1, $2) RETURNING id;"
    );

    // A bound key is not read back.
    let tree = assert_ok!(
        InsertTreeBuilder::new(ft, &NoTransform).build(&properties, Some(Value::I64(9)))
    );
    let sql = Serializer::postgis().serialize(&tree.to_statement_with_key("id"), &mut vec![]);
    assert_eq!(
        sql,
        "INSERT INTO building (id, usage, usage_codespace) VALUES ($1, $2, $3);"
    );
}
