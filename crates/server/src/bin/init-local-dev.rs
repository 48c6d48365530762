use clap::Parser;
use db::{
    DBService,
    models::user::{CreateUser, User},
};
use services::services::auth::hash_password;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Seeds a development account into the local database.
#[derive(Debug, Parser)]
#[command(name = "init-local-dev", version)]
struct Args {
    #[arg(long, default_value = "admin@oc.drf")]
    email: String,

    #[arg(long, default_value = "password-SD!")]
    password: String,

    #[arg(long, default_value = "Admin")]
    first_name: String,

    #[arg(long, default_value = "Softdesk")]
    last_name: String,

    /// Overrides the configured database.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,init_local_dev=info,db=info"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let args = Args::parse();
    let config = config::load_from_env()?;
    let database_url = args.database_url.unwrap_or(config.database_url);

    let db = DBService::new(&database_url).await?;

    if let Some(existing) = User::find_by_email(&db.pool, &args.email).await? {
        tracing::info!(user_id = existing.id, "User {} already exists, skipping", existing.email);
        return Ok(());
    }

    let password_hash = hash_password(&args.password)?;
    let user = User::create(
        &db.pool,
        &CreateUser {
            email: args.email,
            first_name: args.first_name,
            last_name: args.last_name,
            password: args.password,
        },
        &password_hash,
    )
    .await?;

    tracing::info!(user_id = user.id, "Created development user {}", user.email);
    Ok(())
}
