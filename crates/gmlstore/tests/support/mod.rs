#![allow(dead_code)]

use gmlstore::{Feature, FeatureStore, MappedSchema, QName, StoreConfig};
use gmlstore_core::{
    async_trait,
    driver::{Capability, GeometryRegistryEntry},
    schema::{app::*, db::ColumnMetadata, Builder, MappingConfig, StorageMode},
    stmt::{Row, Value},
    Connection, Driver, Error, Result,
};
use std_util::prelude::*;

use std::sync::{Arc, Mutex};

pub const NS: &str = "http://example.org/app";

pub fn q(local: &str) -> QName {
    QName::new(NS, local)
}

pub fn app() -> Schema {
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
            )),
    );
    schema
}

pub fn schema(mode: StorageMode) -> MappedSchema {
    assert_ok!(Builder::new().mode(mode).build(&app(), None, None))
}

/// Building ids are UUIDs and names live in `building_name`.
pub fn uuid_schema() -> MappedSchema {
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

pub fn building(names: &[&str]) -> Feature {
    let mut feature = Feature::new(q("Building"));
    for name in names {
        feature.push(q("name"), *name);
    }
    feature
}

pub fn store(schema: MappedSchema, db: &Recorder) -> FeatureStore {
    store_with(schema, db, StoreConfig::default())
}

pub fn store_with(schema: MappedSchema, db: &Recorder, config: StoreConfig) -> FeatureStore {
    assert_ok!(FeatureStore::builder(schema)
        .config(config)
        .build(db.driver()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Records every statement sent to it. Sequences and `RETURNING` clauses
/// answer with increasing integers starting at 1; other queries return no
/// rows.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    log: Vec<Entry>,
    next_key: i64,
    fail_on: Vec<String>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    pub fn driver(&self) -> RecordingDriver {
        RecordingDriver {
            recorder: self.clone(),
            capability: Capability::POSTGIS,
        }
    }

    /// Fails every statement containing `pattern`. Patterns accumulate.
    pub fn fail_on(&self, pattern: &str) {
        self.state.lock().unwrap().fail_on.push(pattern.to_string());
    }

    pub fn log(&self) -> Vec<Entry> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.log().into_iter().map(|entry| entry.sql).collect()
    }

    /// Entries whose SQL starts with `prefix`.
    pub fn matching(&self, prefix: &str) -> Vec<Entry> {
        self.log()
            .into_iter()
            .filter(|entry| entry.sql.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().log.clear();
    }

    fn record(&self, sql: &str, params: &[Value]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Entry {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match state.fail_on.iter().find(|pattern| sql.contains(pattern.as_str())) {
            Some(pattern) => Err(Error::driver_operation_failed(std::io::Error::other(
                format!("statement rejected: {pattern}"),
            ))),
            None => Ok(()),
        }
    }

    fn next_key(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_key += 1;
        state.next_key
    }
}

#[derive(Debug)]
pub struct RecordingDriver {
    recorder: Recorder,
    capability: Capability,
}

#[async_trait]
impl Driver for RecordingDriver {
    fn capability(&self) -> &Capability {
        &self.capability
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(RecordingConnection {
            recorder: self.recorder.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct RecordingConnection {
    recorder: Recorder,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.recorder.record(sql, params)?;
        Ok(1)
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.recorder.record(sql, params)?;
        if sql.contains("nextval(") || sql.contains(" RETURNING ") {
            return Ok(vec![Row::new(vec![Value::I64(self.recorder.next_key())])]);
        }
        Ok(vec![])
    }

    async fn columns(&mut self, _table: &str) -> Result<Vec<ColumnMetadata>> {
        Ok(vec![])
    }

    async fn geometry_column(
        &mut self,
        _table: &str,
        _column: &str,
    ) -> Result<Option<GeometryRegistryEntry>> {
        Ok(None)
    }
}
