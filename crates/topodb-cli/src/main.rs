//! topodb admin tool.
//!
//! Manages object types and their unique constraints in a local topodb
//! database directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use topodb_core::catalog::{FieldDef, ObjectTypeDef};
use topodb_core::{CreateUniqueRequest, UpdateUniqueRequest};
use topodb_service::{AllowAllGateway, Database, UniqueService};

/// topodb administration tool.
#[derive(Parser, Debug)]
#[command(name = "topodb")]
#[command(version, about = "Manage object types and unique constraints")]
struct Args {
    /// Path to the database storage directory.
    #[arg(short, long, default_value = "./data")]
    data_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register an object type with its properties.
    DefineType {
        /// Object type id (e.g. "host").
        object_id: String,
        /// Human-readable name.
        #[arg(long)]
        name: Option<String>,
        /// Property ids, comma-separated (e.g. "ip,mac,cloud_id").
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },
    /// List registered object types.
    ShowTypes,
    /// Create a unique constraint on an object type.
    Create {
        /// Object type id.
        object_id: String,
        /// Property ids, comma-separated.
        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
        /// Record the constraint without strict instance-write enforcement.
        #[arg(long)]
        advisory: bool,
    },
    /// Replace the key set of an existing constraint.
    Update {
        /// Object type id.
        object_id: String,
        /// Constraint id.
        id: u64,
        /// Replacement property ids, comma-separated.
        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
        /// Record the constraint without strict instance-write enforcement.
        #[arg(long)]
        advisory: bool,
    },
    /// Delete a constraint.
    Delete {
        /// Object type id.
        object_id: String,
        /// Constraint id.
        id: u64,
    },
    /// List the constraints of an object type.
    Search {
        /// Object type id.
        object_id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topodb=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open(&args.data_path)?);
    let service = UniqueService::new(db.clone(), Arc::new(AllowAllGateway));
    tracing::debug!(data_path = %args.data_path.display(), "database opened");

    match args.command {
        Command::DefineType {
            object_id,
            name,
            fields,
        } => {
            let display_name = name.unwrap_or_else(|| object_id.clone());
            let def = ObjectTypeDef::new(&object_id, display_name).with_fields(
                fields.iter().map(|f| FieldDef::new(f, f)),
            );
            db.registry().register(&def)?;
            db.flush()?;
            println!("registered object type '{object_id}'");
        }
        Command::ShowTypes => {
            let types = db.registry().list()?;
            println!("{}", serde_json::to_string_pretty(&types)?);
        }
        Command::Create {
            object_id,
            keys,
            advisory,
        } => {
            let mut request = CreateUniqueRequest::new(keys);
            if advisory {
                request = request.advisory();
            }
            let id = service.create_unique(&object_id, &request)?;
            db.flush()?;
            println!("created unique constraint {id} on '{object_id}'");
        }
        Command::Update {
            object_id,
            id,
            keys,
            advisory,
        } => {
            let mut request = UpdateUniqueRequest::new(keys);
            request.must_check = !advisory;
            service.update_unique(&object_id, id, &request)?;
            db.flush()?;
            println!("updated unique constraint {id} on '{object_id}'");
        }
        Command::Delete { object_id, id } => {
            service.delete_unique(&object_id, id)?;
            db.flush()?;
            println!("deleted unique constraint {id} from '{object_id}'");
        }
        Command::Search { object_id } => {
            let constraints = service.search_uniques(&object_id)?;
            println!("{}", serde_json::to_string_pretty(&constraints)?);
        }
    }

    Ok(())
}
