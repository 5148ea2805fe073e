mod ddl;
mod introspect;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gmlstore")]
#[command(about = "Maps GML application schemas onto PostGIS tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Print the DDL for an application schema
    Ddl(ddl::DdlCommand),

    /// Derive feature type mappings from existing tables
    Introspect(introspect::IntrospectCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ddl(cmd) => cmd.run(),
        Command::Introspect(cmd) => cmd.run().await,
    }
}
