/// Cadence Server - music catalog, playlists and playback sessions over HTTP
use cadence_server::{
    api, config::ServerConfig, services::AccountService, state::AppState, LogMailer,
};
use cadence_storage::SqliteStore;
use clap::{Parser, Subcommand};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(about = "Cadence music server", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a new user
    AddUser {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Login email
        #[arg(short, long)]
        email: String,
        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,
        /// Grant admin privileges
        #[arg(long)]
        admin: bool,
    },
    /// List all users
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve => {
            serve(config_path).await?;
        }
        Commands::AddUser {
            name,
            email,
            password,
            admin,
        } => {
            add_user(config_path, &name, &email, &password, admin).await?;
        }
        Commands::ListUsers => {
            list_users(config_path).await?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<(ServerConfig, SqliteStore)> {
    let config = ServerConfig::load(path)?;
    config.validate()?;

    let pool = cadence_storage::create_pool(&config.storage.database_url).await?;
    cadence_storage::run_migrations(&pool).await?;
    Ok((config, SqliteStore::new(pool)))
}

fn account_service(config: &ServerConfig, store: SqliteStore) -> AccountService {
    AccountService::new(
        Arc::new(store),
        Arc::new(LogMailer),
        config.reset.code_ttl_minutes,
    )
}

async fn serve(config_path: Option<&Path>) -> anyhow::Result<()> {
    let (config, store) = load_config(config_path).await?;

    tracing::info!("Starting Cadence Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!("Uploads: {}", config.storage.upload_dir.display());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let app_state =
        AppState::build(config, store, Arc::new(LogMailer), bcrypt::DEFAULT_COST).await?;
    let app = api::create_router(app_state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(
    config_path: Option<&Path>,
    name: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    let (config, store) = load_config(config_path).await?;
    let accounts = account_service(&config, store);

    let user = accounts.create_user(name, email, password, admin).await?;
    println!(
        "Created {} {} <{}> ({})",
        if user.is_admin { "admin" } else { "user" },
        user.name,
        user.email,
        user.id
    );
    Ok(())
}

async fn list_users(config_path: Option<&Path>) -> anyhow::Result<()> {
    let (_config, store) = load_config(config_path).await?;
    let users = cadence_storage::users::get_all(store.pool()).await?;

    println!("Users:");
    for user in users {
        let role = if user.is_admin { " [admin]" } else { "" };
        println!("  {} - {} <{}>{}", user.id, user.name, user.email, role);
    }

    Ok(())
}
