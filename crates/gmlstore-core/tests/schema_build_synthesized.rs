use gmlstore_core::schema::app::*;
use gmlstore_core::schema::mapping::*;
use gmlstore_core::schema::{Builder, DiagnosticKind, MappedSchema, QName, StorageMode, GML32_NS};

const NS: &str = "http://example.org/app";

fn q(local: &str) -> QName {
    QName::prefixed(NS, "app", local)
}

fn string() -> TypeRef {
    TypeRef::primitive(PrimitiveType::String)
}

fn building(name_max: MaxOccurs) -> Schema {
    let mut schema = Schema::default();
    schema.add_feature_type(
        FeatureType::new(q("Building"))
            .with_property(PropertyType::new(q("name"), string()).occurs(0, name_max))
            .with_property(PropertyType::new(
                q("footprint"),
                TypeRef::geometry(GeometryType::Polygon),
            )),
    );
    schema
}

fn build(schema: &Schema) -> MappedSchema {
    Builder::new().build(schema, None, None).unwrap()
}

fn column_of(mapping: &Mapping) -> &str {
    match &mapping.kind {
        MappingKind::Primitive(m) => &m.column.name,
        MappingKind::Geometry(m) => &m.column.name,
        MappingKind::FeatureReference(m) => &m.column.name,
        MappingKind::Code(m) => &m.value.name,
        MappingKind::Compound(_) => panic!("compound mapping has no column"),
    }
}

fn mapped<'a>(ft: &'a FeatureTypeMapping, name: &QName) -> &'a Mapping {
    match ft.property(name) {
        PropertyLookup::Mapped(mapping) => mapping,
        other => panic!("{name} is not mapped: {other:?}"),
    }
}

#[test]
fn single_valued_properties_become_columns() {
    let schema = build(&building(MaxOccurs::Bounded(1)));
    assert_eq!(schema.mode, StorageMode::Hybrid);

    let ft = schema.feature_type(&q("Building")).unwrap();
    assert_eq!(ft.table, "building");
    assert_eq!(ft.fid.column, "id");
    assert_eq!(ft.fid.prefix, "BUILDING_");
    assert_eq!(ft.fid.generator, IdGenerator::AutoIncrement);

    let name = mapped(ft, &q("name"));
    assert!(name.join.is_none());
    assert_eq!(column_of(name), "name");

    let footprint = mapped(ft, &q("footprint"));
    assert!(footprint.join.is_none());
    let MappingKind::Geometry(geometry) = &footprint.kind else {
        panic!("expected geometry mapping");
    };
    assert_eq!(geometry.column.name, "footprint");
    assert_eq!(geometry.ty, GeometryType::Polygon);
    assert_eq!(geometry.dim, CoordinateDimension::Dim2);
    assert_eq!(geometry.crs, Crs::new("EPSG:4326"));
    assert_eq!(geometry.srid, -1);

    assert!(schema.diagnostics.is_empty());
}

#[test]
fn multi_valued_properties_join_child_tables() {
    for max in [MaxOccurs::Unbounded, MaxOccurs::Bounded(3)] {
        let schema = build(&building(max));
        let ft = schema.feature_type(&q("Building")).unwrap();

        let name = mapped(ft, &q("name"));
        let join = name.join.as_ref().unwrap();
        assert_eq!(join.origin(), &DbField::new("building", "id"));
        assert_eq!(join.terminal(), &DbField::new("building_name", "parentfk"));
        assert_ne!(join.target_table(), ft.table);
        assert_eq!(column_of(name), "value");
    }
}

#[test]
fn code_properties() {
    let mut schema = Schema::default();
    schema.add_feature_type(
        FeatureType::new(q("Parcel"))
            .with_property(PropertyType::new(q("usage"), TypeRef::Code))
            .with_property(
                PropertyType::new(q("class"), TypeRef::Code).occurs(0, MaxOccurs::Unbounded),
            ),
    );
    let schema = build(&schema);
    let ft = schema.feature_type(&q("Parcel")).unwrap();

    let MappingKind::Code(usage) = &mapped(ft, &q("usage")).kind else {
        panic!()
    };
    assert_eq!(usage.value.name, "usage");
    assert_eq!(usage.code_space.name, "usage_codespace");

    let class = mapped(ft, &q("class"));
    assert_eq!(class.join.as_ref().unwrap().target_table(), "parcel_class");
    let MappingKind::Code(class) = &class.kind else {
        panic!()
    };
    assert_eq!(class.value.name, "value");
    assert_eq!(class.code_space.name, "codespace");
}

#[test]
fn compound_properties_prefix_nested_columns() {
    let mut schema = Schema::default();
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
    schema.add_feature_type(FeatureType::new(q("Building")).with_property(PropertyType::new(
        q("address"),
        TypeRef::complex(q("AddressType")),
    )));

    let schema = build(&schema);
    let ft = schema.feature_type(&q("Building")).unwrap();
    let address = mapped(ft, &q("address"));
    assert!(address.join.is_none());

    let compound = address.kind.as_compound().unwrap();
    let particles = &compound.particles;
    assert_eq!(particles.len(), 3);

    assert_eq!(particles[0].path, ValuePath::attribute(q("kind")));
    assert_eq!(column_of(&particles[0]), "address_kind");

    assert_eq!(particles[1].path, ValuePath::element(q("street")));
    assert_eq!(column_of(&particles[1]), "address_street");

    let phone = &particles[2];
    assert_eq!(
        phone.join.as_ref().unwrap().target_table(),
        "building_address_phone"
    );
    assert_eq!(column_of(phone), "value");
}

#[test]
fn substitution_group_members_are_all_mapped() {
    let mut schema = Schema::default();
    schema.add_element(ElementDecl::new(q("AbstractName"), string()).abstract_());
    schema.add_element(ElementDecl::new(q("officialName"), string()).substitutes(q("AbstractName")));
    schema.add_element(ElementDecl::new(q("localName"), string()).substitutes(q("AbstractName")));
    schema.add_complex_type(ComplexType {
        name: q("NamingType"),
        attributes: vec![],
        text: None,
        particles: vec![Particle::element(q("AbstractName"))],
    });
    schema.add_feature_type(FeatureType::new(q("Place")).with_property(PropertyType::new(
        q("naming"),
        TypeRef::complex(q("NamingType")),
    )));

    let schema = build(&schema);
    let ft = schema.feature_type(&q("Place")).unwrap();
    let compound = mapped(ft, &q("naming")).kind.as_compound().unwrap();

    let paths: Vec<_> = compound.particles.iter().map(|p| p.path.to_string()).collect();
    assert_eq!(paths, ["app:officialName", "app:localName"]);
}

#[test]
fn recursive_types_terminate_and_drop_the_cycle() {
    let mut schema = Schema::default();
    schema.add_element(ElementDecl::new(q("label"), string()));
    schema.add_element(ElementDecl::new(q("part"), TypeRef::complex(q("PartType"))));
    schema.add_complex_type(ComplexType {
        name: q("PartType"),
        attributes: vec![],
        text: None,
        particles: vec![
            Particle::element(q("label")),
            Particle::element(q("part")).occurs(0, MaxOccurs::Unbounded),
        ],
    });
    schema.add_feature_type(FeatureType::new(q("Machine")).with_property(PropertyType::new(
        q("part"),
        TypeRef::complex(q("PartType")),
    )));

    let schema = build(&schema);
    let ft = schema.feature_type(&q("Machine")).unwrap();
    let compound = mapped(ft, &q("part")).kind.as_compound().unwrap();

    assert_eq!(compound.particles.len(), 1);
    assert_eq!(compound.particles[0].path, ValuePath::element(q("label")));

    let cycles: Vec<_> = schema
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Cycle)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].feature_type, q("Machine"));
    assert_eq!(cycles[0].path, "app:part/app:part");
}

#[test]
fn block_listed_wildcard_and_unknown_types_are_skipped() {
    let mut schema = Schema::default();
    schema.add_complex_type(ComplexType {
        name: q("ExtensionType"),
        attributes: vec![],
        text: None,
        particles: vec![Particle::wildcard()],
    });
    schema.add_feature_type(
        FeatureType::new(q("Survey"))
            .with_property(PropertyType::new(
                q("period"),
                TypeRef::complex(QName::new(GML32_NS, "TimePeriodType")),
            ))
            .with_property(PropertyType::new(q("extension"), TypeRef::complex(q("ExtensionType"))))
            .with_property(PropertyType::new(q("other"), TypeRef::complex(q("Missing"))))
            .with_property(PropertyType::new(q("title"), string())),
    );

    let schema = build(&schema);
    let ft = schema.feature_type(&q("Survey")).unwrap();

    assert_eq!(ft.property(&q("period")), PropertyLookup::Unmapped);
    assert_eq!(ft.property(&q("extension")), PropertyLookup::Unmapped);
    assert_eq!(ft.property(&q("other")), PropertyLookup::Unmapped);
    assert!(matches!(ft.property(&q("title")), PropertyLookup::Mapped(_)));
    assert_eq!(ft.property(&q("undeclared")), PropertyLookup::Undeclared);

    let kinds: Vec<_> = schema.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DiagnosticKind::BlockListed,
            DiagnosticKind::Wildcard,
            DiagnosticKind::Unmappable,
            DiagnosticKind::Unmappable,
        ]
    );
}

#[test]
fn building_twice_yields_identical_names() {
    let mut schema = building(MaxOccurs::Unbounded);
    schema.add_feature_type(
        FeatureType::new(q("building"))
            .with_property(PropertyType::new(q("Name"), string()))
            .with_property(PropertyType::new(q("name"), string())),
    );

    let a = build(&schema);
    let b = build(&schema);
    assert_eq!(a.feature_types, b.feature_types);

    let second = a.feature_type(&q("building")).unwrap();
    assert_eq!(second.table, "building_2");
    assert_eq!(column_of(mapped(second, &q("Name"))), "name");
    assert_eq!(column_of(mapped(second, &q("name"))), "name_2");
}

#[test]
fn abstract_feature_types_get_no_table() {
    let mut schema = building(MaxOccurs::Bounded(1));
    let mut base = FeatureType::new(q("AbstractConstruction"));
    base.is_abstract = true;
    schema.add_feature_type(base);

    let schema = build(&schema);
    assert_eq!(schema.feature_types.len(), 1);
    assert_eq!(schema.type_id(&q("Building")), Some(1));
    assert_eq!(schema.type_id(&q("AbstractConstruction")), None);
}

#[test]
fn relational_mode_uses_serial_keys() {
    let schema = Builder::new()
        .mode(StorageMode::Relational)
        .build(&building(MaxOccurs::Bounded(1)), None, None)
        .unwrap();
    let ft = schema.feature_type(&q("Building")).unwrap();
    assert_eq!(ft.fid.ty, gmlstore_core::schema::db::Type::Serial);
}
