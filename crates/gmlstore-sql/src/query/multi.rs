use crate::stmt::{BinaryOp, Expr, ExprCase, Select, Statement};

use gmlstore_core::{
    feature::{Envelope, FeatureCodec},
    schema::{MappedSchema, QName},
    stmt::Row,
    Error, Feature, Result,
};

/// Features of several feature types overlapping one bounding box, read
/// from the objects table in a single statement, as map rendering of many
/// layers needs them.
///
/// Rows come back grouped by feature type, in the order the types were
/// requested.
#[derive(Debug)]
pub struct MultiTypeQuery {
    pub statement: Statement,
}

const GML_ID: usize = 1;
const DATA: usize = 3;

impl MultiTypeQuery {
    pub fn build(schema: &MappedSchema, types: &[QName], bbox: &Envelope) -> Result<MultiTypeQuery> {
        if !schema.has_blob() {
            return Err(Error::unsupported_feature(
                "multi feature type queries need BLOB storage",
            ));
        }

        let ids = types
            .iter()
            .map(|name| {
                schema.type_id(name).ok_or_else(|| {
                    Error::invalid_schema(format!("feature type {name} has no type id"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let blob = &schema.blob;
        let alias = "x1";
        let ty = Expr::qualified(alias, &blob.type_column);

        let mut select = Select::from_table(&blob.table, alias);
        select.push(Expr::qualified(alias, &blob.id_column));
        select.push(Expr::qualified(alias, &blob.gml_id_column));
        select.push(ty.clone());
        select.push(Expr::qualified(alias, &blob.data_column));

        select.and_where(Expr::in_list(
            ty.clone(),
            ids.iter().map(|id| Expr::integer(i64::from(*id))),
        ));
        select.and_where(Expr::binary_op(
            Expr::qualified(alias, &blob.bbox_column),
            BinaryOp::Overlaps,
            Expr::geometry(bbox.to_wkb(), schema.storage_srid),
        ));

        let rank = ExprCase {
            operand: Some(Box::new(ty)),
            whens: ids
                .iter()
                .enumerate()
                .map(|(rank, id)| (Expr::integer(i64::from(*id)), Expr::integer(rank as i64)))
                .collect(),
            otherwise: None,
        };
        select.order_by(rank.into(), false);
        select.order_by(Expr::qualified(alias, &blob.id_column), false);

        Ok(MultiTypeQuery {
            statement: select.into(),
        })
    }

    pub fn reconstruct(&self, rows: &[Row], codec: &dyn FeatureCodec) -> Result<Vec<Feature>> {
        rows.iter()
            .map(|row| {
                let data = row.get(DATA)?.as_bytes().ok_or_else(|| {
                    Error::invalid_result("objects row without an encoded feature")
                })?;
                let mut feature = codec.decode(data)?;
                if feature.id.is_none() {
                    feature.id = Some(row.get(GML_ID)?.to_key_string()?);
                }
                Ok(feature)
            })
            .collect()
    }
}
