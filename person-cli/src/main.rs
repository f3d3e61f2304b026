//! persons CLI - create and list people in a SQLite or MySQL database
//!
//! Every command runs inside `with_database`, so each invocation opens one
//! connection and closes it before exiting.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Text};
use person_store::{
    configure, create_tables_if_not_exist, with_database, BackendKind, DatabaseProxy, Options,
    Person,
};
use serde_json::json;
use tracing::debug;

mod render;
mod tracing_setup;

#[derive(Parser)]
#[command(
    name = "persons",
    author,
    version,
    about = "Manage a small registry of people",
    long_about = "Create and list people stored in an embedded SQLite file or on a MySQL server. \
                  Connection settings can come from flags, environment variables or a .env file."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Backend selection; unset options fall back to the library defaults
#[derive(Args)]
struct DatabaseArgs {
    /// Storage backend: embedded (SQLite) or networked (MySQL)
    #[arg(long, global = true, env = "PERSONS_BACKEND", default_value = "embedded")]
    backend: String,

    /// SQLite database file (embedded backend)
    #[arg(long, global = true, env = "PERSONS_DB_PATH", default_value = "persons.db")]
    path: String,

    /// Database name (networked backend)
    #[arg(long, global = true, env = "PERSONS_DB_NAME")]
    database: Option<String>,

    /// Database user (networked backend)
    #[arg(long, global = true, env = "PERSONS_DB_USER")]
    user: Option<String>,

    /// Database password (networked backend)
    #[arg(long, global = true, env = "PERSONS_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Server host (networked backend)
    #[arg(long, global = true, env = "PERSONS_DB_HOST")]
    host: Option<String>,

    /// Server port (networked backend)
    #[arg(long, global = true, env = "PERSONS_DB_PORT")]
    port: Option<u16>,
}

impl DatabaseArgs {
    /// Keyword options for the selected backend
    ///
    /// An unknown backend yields empty options; `configure` reports it.
    fn options(&self) -> Options {
        let mut options = Options::new();

        match self.backend.parse::<BackendKind>() {
            Ok(BackendKind::Embedded) => {
                options.insert("path".to_string(), json!(self.path));
            }
            Ok(BackendKind::Networked) => {
                let fields = [
                    ("database", &self.database),
                    ("user", &self.user),
                    ("password", &self.password),
                    ("host", &self.host),
                ];
                for (key, value) in fields {
                    if let Some(value) = value {
                        options.insert(key.to_string(), json!(value));
                    }
                }
                if let Some(port) = self.port {
                    options.insert("port".to_string(), json!(port));
                }
            }
            Err(_) => {}
        }

        options
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new person in the database
    Create(CreateArgs),
    /// List all persons in the database
    List,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Name of the person (prompted for when omitted)
    #[arg(long)]
    name: Option<String>,

    /// Age of the person (prompted for when omitted)
    #[arg(long)]
    age: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    tracing_setup::init(cli.debug)?;

    let proxy = DatabaseProxy::new();
    configure(&proxy, &cli.database.backend, cli.database.options())
        .context("Failed to configure database")?;

    create_tables_if_not_exist(&proxy)
        .await
        .context("Failed to create tables")?;

    match cli.command {
        Commands::Create(args) => create(&proxy, args).await,
        Commands::List => list(&proxy).await,
    }
}

async fn create(proxy: &DatabaseProxy, args: CreateArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => Text::new("Enter person's name").prompt()?,
    };

    let age = match args.age {
        Some(age) => age,
        None => CustomType::<i32>::new("Enter person's age")
            .with_error_message("Please enter a whole number")
            .prompt()?,
    };

    let person = with_database(proxy, || Person::create(proxy, &name, age))
        .await
        .context("Failed to create person")?;

    debug!(id = person.id, "created");
    println!("Created person: {}, age {}", person.name, person.age);
    Ok(())
}

async fn list(proxy: &DatabaseProxy) -> Result<()> {
    let people = with_database(proxy, || Person::list(proxy))
        .await
        .context("Failed to list persons")?;

    if people.is_empty() {
        println!("No persons found in the database.");
        return Ok(());
    }

    println!("{}", render::people_table("Persons", &people));
    Ok(())
}
