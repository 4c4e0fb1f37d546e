//! Washi CLI
//!
//! Schema tooling for the laundry service: print the generated DDL, show how
//! declared names map to physical names, and create the schema in a database.

use std::fmt::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand};

use washi_repo::Dialect;
use washi_repo::sql;
use washi_types::Model;
use washi_types::schema::declared_laundry_model;

#[derive(Parser)]
#[command(name = "washi")]
#[command(author, version, about = "Laundry service schema tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the creation script (tables, indexes, seed rows)
    Schema {
        /// Target dialect (sqlite, postgres)
        #[arg(long, default_value = "sqlite")]
        dialect: Dialect,
    },
    /// Print declared names next to their physical snake_case names
    Names,
    /// Create missing tables and seed rows in a database
    Migrate {
        /// Database URL (sqlite://... or postgres://...)
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

fn dialect_of(database_url: &str) -> Result<Dialect> {
    if database_url.starts_with("sqlite:") {
        Ok(Dialect::Sqlite)
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
    {
        Ok(Dialect::Postgres)
    } else {
        anyhow::bail!("Unsupported database URL: {}", database_url)
    }
}

/// Renders `declared -> physical` for every identifier of the model.
fn render_names(declared: &Model, physical: &Model) -> Result<String> {
    let mut out = String::new();
    for (d, p) in declared.entity_types().iter().zip(physical.entity_types()) {
        writeln!(out, "{}", d.name)?;
        writeln!(out, "  table   {} -> {}", d.table, p.table)?;
        for (dp, pp) in d.properties().iter().zip(p.properties()) {
            writeln!(out, "  column  {} -> {}", dp.column, pp.column)?;
        }
        writeln!(
            out,
            "  key     {} -> {}",
            d.primary_key().name,
            p.primary_key().name
        )?;
        for (df, pf) in d.foreign_keys().iter().zip(p.foreign_keys()) {
            writeln!(
                out,
                "  fk      {} -> {}",
                df.constraint_name, pf.constraint_name
            )?;
        }
        for (di, pi) in d.indexes().iter().zip(p.indexes()) {
            writeln!(out, "  index   {} -> {}", di.name, pi.name)?;
        }
    }
    Ok(out)
}

async fn migrate(database_url: &str) -> Result<()> {
    let model = washi_types::laundry_model()?;
    match dialect_of(database_url)? {
        Dialect::Sqlite => {
            washi_repo::SqliteStore::new(database_url, model).await?;
        }
        Dialect::Postgres => {
            washi_repo::PostgresStore::new(database_url, model).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,washi_repo=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema { dialect } => {
            let model = washi_types::laundry_model()?;
            print!("{}", sql::schema_script(dialect, &model)?);
        }

        Commands::Names => {
            let declared = declared_laundry_model()?;
            let physical = washi_types::laundry_model()?;
            print!("{}", render_names(&declared, &physical)?);
        }

        Commands::Migrate { database_url } => {
            migrate(&database_url).await?;
            println!("✓ Schema is up to date");
        }
    }

    Ok(())
}
