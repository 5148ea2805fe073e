use gmlstore_core::feature::{Envelope, Feature, FeatureCodec, Geometry, JsonCodec};
use gmlstore_core::schema::app::*;
use gmlstore_core::schema::{Builder, MappedSchema, QName, StorageMode};
use gmlstore_core::stmt::Row;
use gmlstore_sql::filter::{PropertyPath, SortBy};
use gmlstore_sql::query::MultiTypeQuery;
use gmlstore_sql::stmt::Value;
use gmlstore_sql::{Filter, QueryBuilder, Serializer};

use pretty_assertions::assert_eq;
use std_util::prelude::*;

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::new(NS, local)
}

fn app(name_max: MaxOccurs) -> Schema {
    let mut schema = Schema::default();
    schema.add_feature_type(
        FeatureType::new(q("Building"))
            .with_property(
                PropertyType::new(q("name"), TypeRef::primitive(PrimitiveType::String))
                    .occurs(0, name_max),
            )
            .with_property(PropertyType::new(
                q("footprint"),
                TypeRef::geometry(GeometryType::Polygon),
            )),
    );
    schema.add_feature_type(FeatureType::new(q("Road")).with_property(PropertyType::new(
        q("axis"),
        TypeRef::geometry(GeometryType::LineString),
    )));
    schema
}

fn build(name_max: MaxOccurs, mode: StorageMode) -> MappedSchema {
    assert_ok!(Builder::new().mode(mode).build(&app(name_max), None, None))
}

fn sql(stmt: &gmlstore_sql::Statement) -> (String, Vec<Value>) {
    let mut params = vec![];
    let sql = Serializer::postgis().serialize(stmt, &mut params);
    (sql, params)
}

#[test]
fn hybrid_query_joins_feature_and_child_tables() {
    let schema = build(MaxOccurs::Unbounded, StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(None, &[], None));
    let (sql, params) = sql(&query.statement);

    assert_eq!(
        sql,
        "SELECT x1.id, x1.gml_id, x1.binary_object, x3.id, x3.value, ST_AsBinary(x2.footprint) \
         FROM gml_objects x1 \
         LEFT OUTER JOIN building x2 ON x1.id = x2.id \
         LEFT OUTER JOIN building_name x3 ON x3.parentfk = x2.id \
         WHERE x1.ft_type = $1 \
         ORDER BY x1.id, x3.id;"
    );
    assert_eq!(params, [Value::I16(1)]);
}

#[test]
fn filters_on_joined_properties_use_exists() {
    let schema = build(MaxOccurs::Unbounded, StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let filter = Filter::eq(PropertyPath::new(q("name")), "Rathaus");
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(Some(&filter), &[], None));
    let (sql, params) = sql(&query.statement);

    assert!(
        sql.contains(
            "WHERE (x1.ft_type = $1) AND EXISTS (SELECT 1 FROM building_name x4 \
             WHERE (x4.parentfk = x2.id) AND (x4.value = $2))"
        ),
        "{sql}"
    );
    assert_eq!(params, [Value::I16(1), Value::String("Rathaus".into())]);
}

#[test]
fn hybrid_id_filters_compare_external_ids() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let filter = Filter::ids(["BUILDING_1", "BUILDING_7"]);
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(Some(&filter), &[], None));
    let (sql, params) = sql(&query.statement);

    assert!(
        sql.contains("WHERE (x1.ft_type = $1) AND x1.gml_id IN ($2, $3)"),
        "{sql}"
    );
    assert_eq!(
        params,
        [
            Value::I16(1),
            Value::String("BUILDING_1".into()),
            Value::String("BUILDING_7".into()),
        ]
    );
}

#[test]
fn relational_query_sorts_and_prefilters() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Relational);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let bbox = Envelope::new(0.0, 0.0, 10.0, 10.0);
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(
        None,
        &[SortBy::desc(q("name"))],
        Some(&bbox)
    ));
    let (sql, params) = sql(&query.statement);

    assert_eq!(
        sql,
        "SELECT x1.id, x1.name, ST_AsBinary(x1.footprint) FROM building x1 \
         WHERE x1.footprint && ST_GeomFromWKB($1, -1) \
         ORDER BY x1.name DESC, x1.id;"
    );
    assert_eq!(params, [Value::Bytes(bbox.to_wkb())]);
}

#[test]
fn relational_id_filters_compare_kernels() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Relational);
    let ft = schema.feature_type(&q("Building")).unwrap();

    // Ids of other feature types match nothing here.
    let filter = Filter::ids(["BUILDING_3", "ROAD_4"]);
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(Some(&filter), &[], None));
    let (sql, params) = sql(&query.statement);

    assert!(sql.contains("WHERE x1.id IN ($1)"), "{sql}");
    assert_eq!(params, [Value::I64(3)]);
}

#[test]
fn unknown_properties_cannot_be_filtered() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Relational);
    let ft = schema.feature_type(&q("Building")).unwrap();

    let filter = Filter::eq(PropertyPath::new(q("height")), 3i64);
    let err = assert_err!(QueryBuilder::new(&schema, ft).build(Some(&filter), &[], None));
    assert!(err.is_unsupported_feature());
}

#[test]
fn rows_are_grouped_into_features() {
    let schema = build(MaxOccurs::Unbounded, StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(None, &[], None));

    let footprint = Geometry::point(Crs::epsg(4326), 7.0, 51.0);
    let wkb = Value::Bytes(footprint.wkb.clone());
    let rows = vec![
        Row::new(vec![
            Value::I32(1),
            Value::String("BUILDING_1".into()),
            Value::Null,
            Value::I32(10),
            Value::String("Town hall".into()),
            wkb.clone(),
        ]),
        Row::new(vec![
            Value::I32(1),
            Value::String("BUILDING_1".into()),
            Value::Null,
            Value::I32(11),
            Value::String("Rathaus".into()),
            wkb.clone(),
        ]),
        Row::new(vec![
            Value::I32(2),
            Value::String("BUILDING_2".into()),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ]),
    ];

    let features = assert_ok!(query.reconstruct(&rows, &JsonCodec));
    assert_eq!(
        features,
        [
            Feature::new(q("Building"))
                .with_id("BUILDING_1")
                .with_property(q("name"), "Town hall")
                .with_property(q("name"), "Rathaus")
                .with_property(q("footprint"), footprint),
            Feature::new(q("Building")).with_id("BUILDING_2"),
        ]
    );
}

#[test]
fn stored_payloads_take_precedence() {
    let schema = build(MaxOccurs::Unbounded, StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(None, &[], None));

    let stored = Feature::new(q("Building")).with_property(q("name"), "Stored");
    let data = assert_ok!(JsonCodec.encode(&stored));

    let rows = vec![Row::new(vec![
        Value::I32(3),
        Value::String("BUILDING_3".into()),
        Value::Bytes(data),
        Value::I32(30),
        Value::String("Columns".into()),
        Value::Null,
    ])];

    let features = assert_ok!(query.reconstruct(&rows, &JsonCodec));
    assert_eq!(features, [stored.with_id("BUILDING_3")]);
}

#[test]
fn multi_type_query_orders_by_requested_type() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Blob);
    let bbox = Envelope::new(0.0, 0.0, 10.0, 10.0);

    let query = assert_ok!(MultiTypeQuery::build(
        &schema,
        &[q("Road"), q("Building")],
        &bbox
    ));
    let (sql, params) = sql(&query.statement);

    assert_eq!(
        sql,
        "SELECT x1.id, x1.gml_id, x1.ft_type, x1.binary_object FROM gml_objects x1 \
         WHERE x1.ft_type IN (2, 1) AND (x1.gml_bounded_by && ST_GeomFromWKB($1, -1)) \
         ORDER BY CASE x1.ft_type WHEN 2 THEN 0 WHEN 1 THEN 1 END, x1.id;"
    );
    assert_eq!(params.len(), 1);

    let road = Feature::new(q("Road"));
    let rows = vec![Row::new(vec![
        Value::I32(9),
        Value::String("ROAD_9".into()),
        Value::I16(2),
        Value::Bytes(assert_ok!(JsonCodec.encode(&road))),
    ])];
    assert_eq!(
        assert_ok!(query.reconstruct(&rows, &JsonCodec)),
        [road.with_id("ROAD_9")]
    );
}

#[test]
fn multi_type_query_needs_blob_storage() {
    let schema = build(MaxOccurs::Bounded(1), StorageMode::Relational);
    let bbox = Envelope::new(0.0, 0.0, 1.0, 1.0);

    let err = assert_err!(MultiTypeQuery::build(&schema, &[q("Road")], &bbox));
    assert!(err.is_unsupported_feature());
}

#[test]
fn id_tables() {
    use gmlstore_core::schema::db;
    use gmlstore_sql::filter;

    assert_eq!(
        Serializer::postgis()
            .serialize_literal(&filter::create_id_table("ids_1", db::Type::Serial)),
        "CREATE TEMPORARY TABLE ids_1 (fid integer);"
    );

    let (insert, params) = sql(&filter::insert_id("ids_1", Value::from("BUILDING_1")));
    assert_eq!(insert, "INSERT INTO ids_1 (fid) VALUES ($1);");
    assert_eq!(params, [Value::String("BUILDING_1".into())]);

    let schema = build(MaxOccurs::Bounded(1), StorageMode::Hybrid);
    let ft = schema.feature_type(&q("Building")).unwrap();
    let filter = Filter::IdTable("ids_1".into());
    let query = assert_ok!(QueryBuilder::new(&schema, ft).build(Some(&filter), &[], None));
    let (select, _) = sql(&query.statement);
    assert!(
        select.contains("AND x1.gml_id IN (SELECT fid FROM ids_1)"),
        "{select}"
    );
}
