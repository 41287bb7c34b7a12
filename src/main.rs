use clap::Parser;
use migration::{Migrator, MigratorTrait};
use miette::{IntoDiagnostic, Result};
use rolegate::authz::{AuthzError, Authorizer, DbStore, NewRole};
use rolegate::settings::{SeedRole, Settings};
use rolegate::{jobs, storage, web};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "rolegate",
    version,
    about = "Role-based access control service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database)
    let db = storage::init(&settings.database).await?;
    Migrator::up(&db, None).await.into_diagnostic()?;

    let authz = Authorizer::with_store(DbStore::new(db.clone()));

    // ensure configured roles exist
    ensure_seed_roles(&authz, &settings.roles).await?;

    // background jobs; the scheduler must outlive the server
    let _scheduler = jobs::init_scheduler(db.clone()).await?;

    web::serve(settings, db, authz).await?;
    Ok(())
}

async fn ensure_seed_roles(authz: &Authorizer, roles: &[SeedRole]) -> Result<()> {
    for seed in roles {
        match authz
            .create_role(NewRole::new(seed.id.clone(), seed.permissions.clone()))
            .await
        {
            Ok(_) => {}
            // Existing (or retired) roles are left untouched
            Err(AuthzError::DuplicateRole(id)) => {
                tracing::debug!(role_id = %id, "Seed role already present");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
