use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use yamdb::{
    AppState, auth::generate_confirmation_code, config::Config, db, import, mail::FileMailer,
    store::Store,
};

#[derive(Debug, Parser)]
#[command(name = "yamdb", about = "Reviews and ratings API for creative works")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API (default).
    Serve,
    /// Load CSV fixtures into the database.
    ImportCsv {
        #[arg(long, default_value = "static/data")]
        dir: PathBuf,
    },
    /// Create or promote an admin superuser and print a confirmation code for it.
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,yamdb=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);
    let conn = db::connect_and_migrate(&config.database_url).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, Store::new(conn)).await,
        Command::ImportCsv { dir } => {
            let report = import::import_dir(&conn, &dir)
                .await
                .with_context(|| format!("importing from {}", dir.display()))?;
            tracing::info!(?report, "import finished");
            Ok(())
        },
        Command::CreateSuperuser { username, email } => {
            let store = Store::new(conn);
            let user = store.upsert_superuser(&username, &email).await?;
            let code = generate_confirmation_code();
            let user = store.set_confirmation_code(user, &code).await?;
            tracing::info!(username = %user.username, "superuser ready");
            println!("confirmation_code: {code}");
            Ok(())
        },
    }
}

async fn serve(config: Arc<Config>, store: Store) -> anyhow::Result<()> {
    let mailer = Arc::new(FileMailer::new(&config.email_file_path));
    let state = Arc::new(AppState::new(config.clone(), store, mailer));
    let app = yamdb::app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
