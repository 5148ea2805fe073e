use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gmlstore_core::schema::{app, Builder, MappingConfig, StorageMode};
use gmlstore_sql::Serializer;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
pub struct DdlCommand {
    /// Application schema as JSON
    schema: PathBuf,

    /// Explicit mapping configuration (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Storage mode, unless the configuration sets one
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Emit the function names of PostGIS releases before 1.3
    #[arg(long)]
    legacy: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Relational,
    Blob,
    Hybrid,
}

impl From<Mode> for StorageMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Relational => StorageMode::Relational,
            Mode::Blob => StorageMode::Blob,
            Mode::Hybrid => StorageMode::Hybrid,
        }
    }
}

impl DdlCommand {
    pub fn run(&self) -> Result<()> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("reading {}", self.schema.display()))?;
        let app = app::Schema::from_json(&src)?;

        let config = match &self.config {
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Some(MappingConfig::from_toml(&src)?)
            }
            None => None,
        };

        let mut builder = Builder::new();
        if let Some(mode) = self.mode {
            builder.mode(mode.into());
        }
        let schema = builder.build(&app, config.as_ref(), None)?;

        for diagnostic in &schema.diagnostics {
            warn!("{diagnostic}");
        }

        let serializer = if self.legacy {
            Serializer::postgis_legacy()
        } else {
            Serializer::postgis()
        };

        for sql in gmlstore_sql::ddl::generate(&schema, &serializer) {
            println!("{sql}");
        }

        Ok(())
    }
}
