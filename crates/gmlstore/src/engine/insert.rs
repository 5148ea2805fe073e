use super::Engine;

use gmlstore_core::{
    feature::Feature,
    schema::{
        mapping::{FeatureTypeMapping, IdGenerator},
        IdKernel,
    },
    stmt::Value,
    Connection, Error, Result,
};
use gmlstore_sql::{insert, InsertRow, InsertTreeBuilder, Statement};

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// How inserted features get their ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdGen {
    /// Generate a new id for every feature, ignoring ids already set.
    #[default]
    GenerateNew,

    /// Keep the ids features carry; generate one for features without.
    UseExisting,
}

/// Key values of one inserted row, by column.
type Keys = IndexMap<String, Value>;

impl Engine {
    /// Stores `features`, returning their external ids in input order.
    pub(crate) async fn insert(
        &self,
        conn: &mut dyn Connection,
        features: &[Feature],
        id_gen: IdGen,
    ) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(features.len());
        let mut types = IndexSet::new();

        for feature in features {
            let id = self.insert_feature(conn, feature, id_gen).await?;
            debug!(feature_type = %feature.ty, id, "stored feature");
            ids.push(id);
            types.insert(&feature.ty);
        }

        self.refresh_extents(conn, types).await?;
        Ok(ids)
    }

    async fn insert_feature(
        &self,
        conn: &mut dyn Connection,
        feature: &Feature,
        id_gen: IdGen,
    ) -> Result<String> {
        let schema = &self.schema;
        let mapping = schema.feature_type(&feature.ty).ok_or_else(|| {
            Error::invalid_schema(format!("feature type {} is not mapped", feature.ty))
        })?;

        let existing = match id_gen {
            IdGen::UseExisting => feature.id.as_deref(),
            IdGen::GenerateNew => None,
        };

        if !schema.has_blob() {
            return self.insert_relational(conn, mapping, feature, existing).await;
        }

        let type_id = schema.type_id(&mapping.name).ok_or_else(|| {
            Error::invalid_schema(format!("feature type {} has no type id", mapping.name))
        })?;

        if let Some(id) = existing {
            self.check_existing(mapping, id)?;
        }

        let object_id = self
            .next_value(conn, &insert::reserve_object_id(schema))
            .await?;

        let gml_id = match existing {
            Some(id) => id.to_string(),
            None => match &mapping.fid.generator {
                IdGenerator::AutoIncrement => format!("{}{object_id}", mapping.fid.prefix),
                IdGenerator::Sequence { name } => {
                    let kernel = self.next_value(conn, &insert::next_value(name)).await?;
                    format!("{}{kernel}", mapping.fid.prefix)
                }
                IdGenerator::Uuid => format!("{}{}", mapping.fid.prefix, uuid::Uuid::new_v4()),
            },
        };

        let mut stored = feature.clone();
        stored.id = Some(gml_id.clone());
        let data = self.codec.encode(&stored)?;
        let envelope = self.envelope(feature)?;

        let row = insert::objects_row(
            schema,
            Value::I64(object_id),
            &gml_id,
            type_id,
            data,
            envelope,
        );
        self.exec(conn, &row.to_statement()).await?;

        if schema.has_relational() {
            let tree = InsertTreeBuilder::new(mapping, self.transform.as_ref())
                .build(&feature.properties, Some(Value::I64(object_id)))?;
            self.insert_tree(conn, tree, None).await?;
        }

        Ok(gml_id)
    }

    async fn insert_relational(
        &self,
        conn: &mut dyn Connection,
        mapping: &FeatureTypeMapping,
        feature: &Feature,
        existing: Option<&str>,
    ) -> Result<String> {
        let fid = &mapping.fid;

        let key = match existing {
            Some(id) => Some(match self.check_existing(mapping, id)? {
                IdKernel::Integer(v) => Value::I64(v),
                IdKernel::Uuid(v) => Value::Uuid(v),
            }),
            None => match &fid.generator {
                IdGenerator::AutoIncrement => None,
                IdGenerator::Sequence { name } => {
                    Some(Value::I64(self.next_value(conn, &insert::next_value(name)).await?))
                }
                IdGenerator::Uuid => Some(Value::Uuid(uuid::Uuid::new_v4())),
            },
        };

        let tree = InsertTreeBuilder::new(mapping, self.transform.as_ref())
            .build(&feature.properties, key)?;
        let keys = self.insert_tree(conn, tree, Some(&fid.column)).await?;

        let kernel = keys.get(&fid.column).ok_or_else(|| {
            Error::invalid_result(format!("no key was read back for table {}", mapping.table))
        })?;
        Ok(fid.external_id(&kernel.to_key_string()?))
    }

    /// The kernel of a caller supplied id, which must parse as an id of
    /// `mapping`'s feature type.
    fn check_existing(&self, mapping: &FeatureTypeMapping, id: &str) -> Result<IdKernel> {
        let analysis = self.schema.analyze_id(id)?;
        if analysis.mapping.name != mapping.name {
            return Err(Error::invalid_feature_id(
                id,
                format!("id belongs to feature type {}", analysis.mapping.name),
            ));
        }
        Ok(analysis.kernel)
    }

    /// Inserts a row tree parent first, handing generated keys down to the
    /// children. Returns the keys of the root row; `key` names a root column
    /// to read back even if no child needs it.
    ///
    /// A root row with a link must already be bound to its parent.
    pub(super) async fn insert_tree(
        &self,
        conn: &mut dyn Connection,
        root: InsertRow,
        key: Option<&str>,
    ) -> Result<Keys> {
        let mut root_keys = None;
        let mut stack: Vec<(InsertRow, Option<Keys>)> = vec![(root, None)];

        while let Some((mut row, parent_keys)) = stack.pop() {
            let is_root = root_keys.is_none();
            if let Some(parent_keys) = &parent_keys {
                row.bind_parent(parent_keys)?;
            }

            let statement = match key {
                Some(key) if is_root => row.to_statement_with_key(key),
                _ => row.to_statement(),
            };

            let mut keys = Keys::new();
            let mut wanted = row.key_columns();
            if let Some(key) = key.filter(|_| is_root) {
                wanted.push(key);
            }
            for column in wanted {
                if let Some(value) = row.bound_value(column) {
                    keys.insert(column.to_string(), value.clone());
                }
            }

            match &statement {
                Statement::Insert(insert) if !insert.returning.is_empty() => {
                    let rows = self.query_rows(conn, &statement).await?;
                    let returned = rows.first().ok_or_else(|| {
                        Error::invalid_result(format!("insert into {} returned no row", row.table))
                    })?;
                    for (i, column) in insert.returning.iter().enumerate() {
                        keys.insert(column.clone(), returned.get(i)?.clone());
                    }
                }
                _ => {
                    self.exec(conn, &statement).await?;
                }
            }

            let children = std::mem::take(&mut row.children);
            for child in children.into_iter().rev() {
                stack.push((child, Some(keys.clone())));
            }

            if is_root {
                root_keys = Some(keys);
            }
        }

        Ok(root_keys.unwrap_or_default())
    }
}
