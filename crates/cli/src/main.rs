//! Cafe Catalog CLI - drive the catalog API from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check whether the persisted session is still valid
//! cafe-cli status
//!
//! # Sign in / create an account
//! cafe-cli login -e test1@test.com -p 123456
//! cafe-cli register -n "Test 1" -e test1@test.com -p 123456
//!
//! # Manage products
//! cafe-cli products list --limit 20
//! cafe-cli products add -n "Cafe de Costa Rica" -c 60a7c0
//! cafe-cli products upload-image 60a7d1 ./latte.jpg
//!
//! # Forget the session
//! cafe-cli logout
//! ```
//!
//! # Environment Variables
//!
//! - `CAFE_API_BASE_URL` - Base URL of the catalog API (required)
//! - `CAFE_STORAGE_DIR` - Where the session token is kept (default: `.cafe`)
//! - `CAFE_LOG_JSON` - Emit JSON logs when set
//! - `RUST_LOG` - Log filter (default: `cafe_catalog_client=info,cafe_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cafe-cli")]
#[command(author, version, about = "Cafe catalog command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the persisted session and show who is signed in
    Status,
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CAFE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in with it
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CAFE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// List product categories
    Categories,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Maximum number of products to fetch (default: `CAFE_PRODUCT_LIMIT`)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show a single product
    Show {
        /// Product id
        id: String,
    },
    /// Create a product
    Add {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Category id (default: first listed category)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Rename or recategorize a product
    Update {
        /// Product id
        id: String,

        /// New product name
        #[arg(short, long)]
        name: String,

        /// New category id (default: keep the current category)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
    /// Upload an image for a product
    UploadImage {
        /// Product id
        id: String,

        /// Local image file
        path: std::path::PathBuf,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cafe_catalog_client=info,cafe_cli=info".into());

    let json = std::env::var("CAFE_LOG_JSON").is_ok();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let mut app = commands::App::connect()?;

    match cli.command {
        Commands::Status => commands::auth::status(&mut app).await,
        Commands::Login { email, password } => {
            commands::auth::login(&mut app, email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&mut app, name, email, password).await?,
        Commands::Logout => commands::auth::logout(&mut app).await?,
        Commands::Categories => commands::products::categories(&mut app).await?,
        Commands::Products { action } => match action {
            ProductAction::List { limit } => commands::products::list(&mut app, limit).await?,
            ProductAction::Show { id } => commands::products::show(&mut app, &id).await?,
            ProductAction::Add { name, category } => {
                commands::products::save(&mut app, None, name, category).await?;
            }
            ProductAction::Update { id, name, category } => {
                commands::products::save(&mut app, Some(id), name, category).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&mut app, &id).await?,
            ProductAction::UploadImage { id, path } => {
                commands::products::upload_image(&mut app, &id, path).await?;
            }
        },
    }
    Ok(())
}
