use clap::Parser;
use engine::{DirectoryUploader, Engine, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[derive(Debug, Parser)]
#[command(version, about = "Expense tracker ledger server")]
struct Args {
    /// Settings file, without extension.
    #[arg(short, long, env = "EXPENSE_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let settings = settings::Settings::new(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expense_tracker={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let mut builder = Engine::builder()
        .store(SqliteStore::new(db))
        .max_conflict_retries(settings.ledger.max_conflict_retries);
    match settings.uploads.dir.as_deref() {
        Some(dir) => {
            tracing::info!("storing uploads in {dir}");
            builder = builder.uploader(DirectoryUploader::new(dir));
        }
        None => tracing::warn!("no upload directory configured, receipts will be refused"),
    }
    let engine = builder.build()?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
