use anyhow::Context;
use clap::{Parser, Subcommand};
use palaver_backend_runtime::{telemetry, BackendServices};
use palaver_config::load as load_config;
use palaver_gateway::{create_router, GatewayState};
use sqlx::Row;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "palaver-backend")]
#[command(about = "Palaver messaging backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve,
    /// Seed the database with demo accounts
    SeedData,
    /// Dump conversations and messages from the database
    DumpData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
        Commands::DumpData => dump_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Palaver backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.db_pool.clone(), services.authenticator.clone());
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(palaver_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    for (username, full_name) in [("alice", "Alice Demo"), ("bob", "Bob Demo")] {
        let account = palaver_auth::NewAccount {
            username: username.to_string(),
            email: format!("{username}@palaver.local"),
            password: "password123".to_string(),
            full_name: Some(full_name.to_string()),
            phone: None,
        };

        match services.authenticator.register_with_password(account).await {
            Ok(user) => info!(username, public_id = %user.public_id, "seeded demo account"),
            Err(palaver_auth::AuthError::UserExists) => {
                info!(username, "demo account already exists")
            }
            Err(error) => return Err(error).context("failed to seed demo account"),
        }
    }

    println!("Seeded demo accounts (password: password123)");
    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let sessions = sqlx::query(
        r#"
        SELECT id, pair_key, user_a, user_b, created_at
        FROM chat_sessions
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch chat sessions")?;

    println!("=== CHAT SESSIONS ===");
    if sessions.is_empty() {
        println!("No chat sessions found in database");
    } else {
        println!("Found {} sessions:", sessions.len());
        println!(
            "{:<5} {:<55} {:<25} {:<25} {:<25}",
            "ID", "Pair Key", "User A", "User B", "Created At"
        );
        println!("{}", "-".repeat(140));

        for session in sessions {
            let id: i64 = session.get("id");
            let pair_key: String = session.get("pair_key");
            let user_a: String = session.get("user_a");
            let user_b: String = session.get("user_b");
            let created_at: String = session.get("created_at");

            println!(
                "{:<5} {:<55} {:<25} {:<25} {:<25}",
                id, pair_key, user_a, user_b, created_at
            );
        }
    }

    let messages = sqlx::query(
        r#"
        SELECT id, public_id, session_id, sender_id, is_file, seen, created_at
        FROM messages
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch messages")?;

    println!("\n=== MESSAGES ===");
    if messages.is_empty() {
        println!("No messages found in database");
    } else {
        println!("Found {} messages:", messages.len());
        println!(
            "{:<5} {:<40} {:<10} {:<25} {:<8} {:<6} {:<25}",
            "ID", "Public ID", "Session", "Sender", "File", "Seen", "Created At"
        );
        println!("{}", "-".repeat(125));

        for message in messages {
            let id: i64 = message.get("id");
            let public_id: String = message.get("public_id");
            let session_id: i64 = message.get("session_id");
            let sender_id: String = message.get("sender_id");
            let is_file: bool = message.get("is_file");
            let seen: bool = message.get("seen");
            let created_at: String = message.get("created_at");

            println!(
                "{:<5} {:<40} {:<10} {:<25} {:<8} {:<6} {:<25}",
                id, public_id, session_id, sender_id, is_file, seen, created_at
            );
        }
    }

    Ok(())
}
