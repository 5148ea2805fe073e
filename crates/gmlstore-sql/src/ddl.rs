//! Creates the table layout of a mapped schema.
//!
//! Statements come out in dependency order: the feature type registry, the
//! objects table, then per feature type its sequence, its table and the
//! child tables of its join chains. No table references a table created
//! after it.

use crate::stmt::{ColumnDef, Expr, Function, Statement};
use crate::Serializer;

use gmlstore_core::schema::{
    app::{CoordinateDimension, GeometryType},
    db,
    mapping::{FeatureTypeMapping, IdGenerator, Mapping, MappingKind, CHILD_KEY_COLUMN},
    MappedSchema, StorageMode,
};
use indexmap::IndexMap;

/// The DDL of `schema`, serialized for `serializer`'s flavor.
pub fn generate(schema: &MappedSchema, serializer: &Serializer) -> Vec<String> {
    statements(schema, serializer.is_legacy())
        .iter()
        .map(|stmt| serializer.serialize_literal(stmt))
        .collect()
}

/// The DDL of `schema` as statements. With `legacy`, geometry columns are
/// registered with `AddGeometryColumn` instead of being declared inline.
pub fn statements(schema: &MappedSchema, legacy: bool) -> Vec<Statement> {
    let mut ddl = Ddl {
        schema,
        legacy,
        out: vec![],
    };

    ddl.registry();

    if schema.has_blob() {
        ddl.objects();
    }

    for ft in schema.feature_types.values() {
        ddl.feature_type(ft);
    }

    ddl.out
}

struct Ddl<'a> {
    schema: &'a MappedSchema,
    legacy: bool,
    out: Vec<Statement>,
}

/// A table being assembled. Columns are only added once by name.
#[derive(Debug, Default)]
struct TableDef {
    columns: Vec<ColumnDef>,
}

impl Ddl<'_> {
    fn registry(&mut self) {
        let schema = self.schema;
        let bbox = &schema.bbox;

        let mut table = TableDef::default();
        table.push(ColumnDef::new(&bbox.id_column, db::Type::Integer(2)).primary_key());
        table.push(
            ColumnDef::new(&bbox.qname_column, db::Type::Text)
                .not_null()
                .unique(),
        );
        table.push(ColumnDef::new(&bbox.bbox_column, self.envelope_type()));
        self.emit_table(&bbox.table, table);

        for (name, id) in &schema.type_ids {
            self.out.push(Statement::insert(
                &bbox.table,
                vec![bbox.id_column.clone(), bbox.qname_column.clone()],
                vec![Expr::integer(i64::from(*id)), Expr::string(name.clark())],
            ));
        }
    }

    fn objects(&mut self) {
        let schema = self.schema;
        let blob = &schema.blob;
        let bbox = &schema.bbox;

        let mut table = TableDef::default();
        table.push(ColumnDef::new(&blob.id_column, db::Type::Serial).primary_key());
        table.push(
            ColumnDef::new(&blob.gml_id_column, db::Type::Text)
                .not_null()
                .unique(),
        );
        table.push(
            ColumnDef::new(&blob.type_column, db::Type::Integer(2))
                .not_null()
                .references(&bbox.table, &bbox.id_column),
        );
        table.push(ColumnDef::new(&blob.data_column, db::Type::Bytea));
        table.push(ColumnDef::new(&blob.bbox_column, self.envelope_type()));

        // The check must follow the geometry column, which legacy databases
        // only get after the table exists.
        let check = Statement::add_check(
            &blob.table,
            format!("{}_{}_check", blob.table, blob.bbox_column),
            Expr::func(Function::IsValid, [Expr::column(&blob.bbox_column)]),
        );
        self.emit_table_with(&blob.table, table, Some(check));
    }

    fn feature_type(&mut self, ft: &FeatureTypeMapping) {
        if let IdGenerator::Sequence { name } = &ft.fid.generator {
            self.out.push(Statement::create_sequence(name));
        }

        if !self.schema.has_relational() {
            return;
        }

        let mut tables = IndexMap::new();

        let mut root = TableDef::default();
        root.push(match self.schema.mode {
            StorageMode::Hybrid => ColumnDef::new(&ft.fid.column, db::Type::Integer(4))
                .primary_key()
                .references(&self.schema.blob.table, &self.schema.blob.id_column),
            _ => ColumnDef::new(&ft.fid.column, ft.fid.ty.clone()).primary_key(),
        });
        tables.insert(ft.table.clone(), root);

        for (_, mapping) in ft.mapped() {
            columns(&mut tables, &ft.table, mapping);
        }

        for (name, table) in tables {
            self.emit_table(&name, table);
        }
    }

    fn emit_table(&mut self, name: &str, table: TableDef) {
        self.emit_table_with(name, table, None);
    }

    /// Emits `CREATE TABLE`, then legacy geometry columns, `after`, and the
    /// spatial indexes.
    fn emit_table_with(&mut self, name: &str, table: TableDef, after: Option<Statement>) {
        let (geometries, columns): (Vec<_>, Vec<_>) = if self.legacy {
            table
                .columns
                .into_iter()
                .partition(|column| column.ty.is_geometry())
        } else {
            let geometries = table
                .columns
                .iter()
                .filter(|column| column.ty.is_geometry())
                .cloned()
                .collect();
            (geometries, table.columns)
        };

        self.out.push(Statement::create_table(name, columns));

        if self.legacy {
            for column in &geometries {
                if let db::Type::Geometry { ty, dim, srid } = &column.ty {
                    self.out.push(Statement::add_geometry_column(
                        name,
                        &column.name,
                        *ty,
                        *dim,
                        *srid,
                    ));
                }
            }
        }

        self.out.extend(after);

        for column in &geometries {
            self.out
                .push(Statement::create_spatial_index(name, &column.name));
        }
    }

    fn envelope_type(&self) -> db::Type {
        db::Type::Geometry {
            ty: GeometryType::Polygon,
            dim: CoordinateDimension::Dim2,
            srid: self.schema.storage_srid,
        }
    }
}

/// Adds the columns of `mapping`, owned by a row of `table`, creating the
/// tables of its join chain on the way.
fn columns(tables: &mut IndexMap<String, TableDef>, table: &str, mapping: &Mapping) {
    let mut table = table.to_string();

    if let Some(chain) = &mapping.join {
        for step in chain.steps() {
            let key_ty = tables
                .get(&step.from.table)
                .and_then(|parent| parent.column(&step.from.column))
                .map(|column| match &column.ty {
                    db::Type::Serial => db::Type::Integer(4),
                    ty => ty.clone(),
                })
                .unwrap_or(db::Type::Integer(4));

            let child = tables.entry(step.to.table.clone()).or_insert_with(|| {
                let mut child = TableDef::default();
                child.push(ColumnDef::new(CHILD_KEY_COLUMN, db::Type::Serial).primary_key());
                child
            });
            child.push(
                ColumnDef::new(&step.to.column, key_ty)
                    .not_null()
                    .references(&step.from.table, &step.from.column),
            );
            table = step.to.table.clone();
        }

        if let Some(order) = &chain.order_column {
            if let Some(terminal) = tables.get_mut(&table) {
                terminal.push(ColumnDef::new(order, db::Type::Integer(4)));
            }
        }
    }

    let column = |tables: &mut IndexMap<String, TableDef>, name: &str, ty: db::Type| {
        if let Some(def) = tables.get_mut(&table) {
            def.push(ColumnDef::new(name, ty));
        }
    };

    match &mapping.kind {
        MappingKind::Primitive(m) => column(tables, &m.column.name, db::Type::from_primitive(m.ty)),
        MappingKind::Geometry(m) => column(
            tables,
            &m.column.name,
            db::Type::Geometry {
                ty: m.ty,
                dim: m.dim,
                srid: m.srid,
            },
        ),
        MappingKind::FeatureReference(m) => column(tables, &m.column.name, db::Type::Text),
        MappingKind::Code(m) => {
            column(tables, &m.value.name, db::Type::Text);
            column(tables, &m.code_space.name, db::Type::Text);
        }
        MappingKind::Compound(m) => {
            for particle in &m.particles {
                columns(tables, &table, particle);
            }
        }
    }
}

impl TableDef {
    fn push(&mut self, column: ColumnDef) {
        if self.column(&column.name).is_none() {
            self.columns.push(column);
        }
    }

    fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }
}
