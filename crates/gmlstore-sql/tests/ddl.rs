use gmlstore_core::schema::app::*;
use gmlstore_core::schema::{Builder, MappedSchema, MappingConfig, QName, StorageMode};
use gmlstore_sql::{ddl, stmt::Statement, Serializer};

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std_util::prelude::*;

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::new(NS, local)
}

fn building(name_max: MaxOccurs) -> Schema {
    let mut schema = Schema::default();
    schema.namespaces.insert("app".into(), NS.into());
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
    schema
}

fn build(schema: &Schema, mode: StorageMode) -> MappedSchema {
    assert_ok!(Builder::new().mode(mode).build(schema, None, None))
}

const REGISTRY: &[&str] = &[
    "CREATE TABLE feature_types (id smallint PRIMARY KEY, qname text NOT NULL UNIQUE, bbox geometry);",
    "CREATE INDEX feature_types_bbox_sidx ON feature_types USING GIST (bbox);",
    "INSERT INTO feature_types (id, qname) VALUES (1, '{http://example.org/app}Building');",
];

const OBJECTS: &[&str] = &[
    "CREATE TABLE gml_objects (id serial PRIMARY KEY, gml_id text NOT NULL UNIQUE, ft_type smallint NOT NULL REFERENCES feature_types (id) ON DELETE CASCADE, binary_object bytea, gml_bounded_by geometry);",
    "ALTER TABLE gml_objects ADD CONSTRAINT gml_objects_gml_bounded_by_check CHECK (ST_IsValid(gml_bounded_by));",
    "CREATE INDEX gml_objects_gml_bounded_by_sidx ON gml_objects USING GIST (gml_bounded_by);",
];

#[test]
fn single_valued_properties_share_one_table() {
    let schema = build(&building(MaxOccurs::Bounded(1)), StorageMode::Hybrid);
    let sql = ddl::generate(&schema, &Serializer::postgis());

    let mut expected: Vec<&str> = vec![];
    expected.extend(REGISTRY);
    expected.extend(OBJECTS);
    expected.extend([
        "CREATE TABLE building (id integer PRIMARY KEY REFERENCES gml_objects (id) ON DELETE CASCADE, name text, footprint geometry);",
        "CREATE INDEX building_footprint_sidx ON building USING GIST (footprint);",
    ]);

    assert_eq!(sql, expected);
}

#[test]
fn multi_valued_property_gets_child_table() {
    let schema = build(&building(MaxOccurs::Unbounded), StorageMode::Hybrid);
    let sql = ddl::generate(&schema, &Serializer::postgis());

    let mut expected: Vec<&str> = vec![];
    expected.extend(REGISTRY);
    expected.extend(OBJECTS);
    expected.extend([
        "CREATE TABLE building (id integer PRIMARY KEY REFERENCES gml_objects (id) ON DELETE CASCADE, footprint geometry);",
        "CREATE INDEX building_footprint_sidx ON building USING GIST (footprint);",
        "CREATE TABLE building_name (id serial PRIMARY KEY, parentfk integer NOT NULL REFERENCES building (id) ON DELETE CASCADE, value text);",
    ]);

    assert_eq!(sql, expected);
}

#[test]
fn tables_are_created_before_they_are_referenced() {
    let mut app = building(MaxOccurs::Unbounded);
    app.add_element(ElementDecl::new(
        q("line"),
        TypeRef::primitive(PrimitiveType::String),
    ));
    app.add_complex_type(ComplexType {
        name: q("AddressType"),
        attributes: vec![],
        text: None,
        particles: vec![Particle::element(q("line")).occurs(1, MaxOccurs::Unbounded)],
    });
    app.add_feature_type(
        FeatureType::new(q("Parcel")).with_property(
            PropertyType::new(q("address"), TypeRef::complex(q("AddressType")))
                .occurs(0, MaxOccurs::Unbounded),
        ),
    );

    for mode in [StorageMode::Relational, StorageMode::Hybrid] {
        let schema = build(&app, mode);
        let mut created = HashSet::new();
        let mut references = 0;

        for stmt in ddl::statements(&schema, false) {
            let Statement::CreateTable(table) = stmt else {
                continue;
            };
            for column in &table.columns {
                if let Some(fk) = &column.references {
                    references += 1;
                    assert!(
                        created.contains(&fk.table),
                        "{} references {} before it exists",
                        table.name,
                        fk.table
                    );
                }
            }
            created.insert(table.name.clone());
        }

        // building_name and parcel_address at least.
        assert!(references >= 2, "{mode:?}: {references} foreign keys");
    }
}

#[test]
fn blob_mode_has_no_feature_tables() {
    let schema = build(&building(MaxOccurs::Unbounded), StorageMode::Blob);
    let sql = ddl::generate(&schema, &Serializer::postgis());

    let mut expected: Vec<&str> = vec![];
    expected.extend(REGISTRY);
    expected.extend(OBJECTS);
    assert_eq!(sql, expected);
}

#[test]
fn relational_mode_has_no_objects_table() {
    let schema = build(&building(MaxOccurs::Bounded(1)), StorageMode::Relational);
    let sql = ddl::generate(&schema, &Serializer::postgis());

    let mut expected: Vec<&str> = vec![];
    expected.extend(REGISTRY);
    expected.extend([
        "CREATE TABLE building (id serial PRIMARY KEY, name text, footprint geometry);",
        "CREATE INDEX building_footprint_sidx ON building USING GIST (footprint);",
    ]);
    assert_eq!(sql, expected);
}

#[test]
fn legacy_databases_register_geometry_columns() {
    let schema = build(&building(MaxOccurs::Bounded(1)), StorageMode::Hybrid);
    let serializer = Serializer::postgis_legacy();
    let sql = ddl::generate(&schema, &serializer);

    assert_eq!(
        &sql[..3],
        [
            "CREATE TABLE feature_types (id smallint PRIMARY KEY, qname text NOT NULL UNIQUE);",
            "SELECT AddGeometryColumn('feature_types', 'bbox', -1, 'POLYGON', 2);",
            "CREATE INDEX feature_types_bbox_sidx ON feature_types USING GIST (bbox);",
        ]
    );

    assert!(sql.contains(
        &"ALTER TABLE gml_objects ADD CONSTRAINT gml_objects_gml_bounded_by_check CHECK (isvalid(gml_bounded_by));"
            .to_string()
    ));

    let table = sql
        .iter()
        .position(|s| s.starts_with("CREATE TABLE building "))
        .unwrap();
    assert_eq!(
        sql[table],
        "CREATE TABLE building (id integer PRIMARY KEY REFERENCES gml_objects (id) ON DELETE CASCADE, name text);"
    );
    assert_eq!(
        sql[table + 1],
        "SELECT AddGeometryColumn('building', 'footprint', -1, 'POLYGON', 2);"
    );
}

#[test]
fn sequences_and_typed_geometries() {
    let mut app = Schema::default();
    app.namespaces.insert("app".into(), NS.into());
    app.add_feature_type(
        FeatureType::new(q("Road"))
            .with_property(PropertyType::new(
                q("name"),
                TypeRef::primitive(PrimitiveType::String),
            ))
            .with_property(
                PropertyType::new(q("lane"), TypeRef::primitive(PrimitiveType::Integer))
                    .occurs(0, MaxOccurs::Unbounded),
            )
            .with_property(PropertyType::new(
                q("axis"),
                TypeRef::geometry(GeometryType::LineString),
            )),
    );

    let config = assert_ok!(MappingConfig::from_toml(
        r#"
        mode = "relational"
        storage_crs = "EPSG:25832"

        [[feature_type]]
        name = "app:Road"
        table = "roads"
        fid = { column = "gid", generator = "sequence", sequence = "roads_seq", prefix = "R" }

        [[feature_type.property]]
        path = "app:name"
        kind = "primitive"
        mapping = "label"

        [[feature_type.property]]
        path = "app:lane"
        kind = "primitive"
        type = "integer"
        mapping = "width"
        join = "gid=road_lanes.road"
        index = "num"

        [[feature_type.property]]
        path = "app:axis"
        kind = "geometry"
        type = "line-string"
        mapping = "geom"
        "#
    ));
    let schema = assert_ok!(Builder::new().build(&app, Some(&config), None));
    let sql = ddl::generate(&schema, &Serializer::postgis());

    assert_eq!(
        &sql[3..],
        [
            "CREATE SEQUENCE roads_seq;",
            "CREATE TABLE roads (gid integer PRIMARY KEY, label text, geom geometry(LINESTRING,25832));",
            "CREATE INDEX roads_geom_sidx ON roads USING GIST (geom);",
            "CREATE TABLE road_lanes (id serial PRIMARY KEY, road integer NOT NULL REFERENCES roads (gid) ON DELETE CASCADE, num integer, width integer);",
        ]
    );
}
