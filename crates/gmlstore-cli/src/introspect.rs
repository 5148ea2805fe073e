use anyhow::Result;
use clap::Parser;
use gmlstore_core::schema::{
    mapping::{FeatureTypeMapping, Mapping, MappingKind},
    Introspector, QName,
};

#[derive(Parser, Debug)]
pub struct IntrospectCommand {
    /// Connection URL, e.g. postgresql://user@localhost/gis
    #[arg(long)]
    url: String,

    /// Tables to derive feature types from
    #[arg(required = true)]
    tables: Vec<String>,

    /// Namespace of the derived feature types and properties
    #[arg(long, default_value = "")]
    namespace: String,

    /// Id column; defaults to the first auto-increment column
    #[arg(long)]
    fid_column: Option<String>,
}

impl IntrospectCommand {
    pub async fn run(&self) -> Result<()> {
        let driver = gmlstore::driver_for(&self.url).await?;
        let mut connection = driver.connect().await?;
        let mut introspector = Introspector::new(&mut *connection);

        for table in &self.tables {
            let name = QName::new(&self.namespace, feature_type_name(table));
            let (_, mapping) = introspector
                .introspect(table, name, self.fid_column.as_deref())
                .await?;
            print_mapping(&mapping);
        }

        Ok(())
    }
}

/// `building_part` becomes `BuildingPart`.
fn feature_type_name(table: &str) -> String {
    table
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn print_mapping(mapping: &FeatureTypeMapping) {
    println!("{} -> {}", mapping.name.clark(), mapping.table);
    println!(
        "  fid: {} ({:?}, prefix {})",
        mapping.fid.column, mapping.fid.generator, mapping.fid.prefix
    );
    for (name, m) in mapping.mapped() {
        println!("  {}: {}", name.local, describe(m));
    }
}

fn describe(mapping: &Mapping) -> String {
    match &mapping.kind {
        MappingKind::Primitive(p) => format!("{} {:?}", p.column.name, p.ty),
        MappingKind::Geometry(g) => format!("{} {:?} srid={}", g.column.name, g.ty, g.srid),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_become_type_names() {
        assert_eq!(feature_type_name("building"), "Building");
        assert_eq!(feature_type_name("building_part"), "BuildingPart");
        assert_eq!(feature_type_name("_roads__2"), "Roads2");
    }
}
