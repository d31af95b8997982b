//! Migrate command - applies or reverts the embedded schema migrations

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{
    connect_pool, migrations::storage_migrations, run_storage_migrations, PostgresMigrator,
};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let pool = connect_pool(&config.database.to_postgres_config()).await?;

    if !args.revert {
        let applied = run_storage_migrations(&pool).await?;
        info!(applied, "Migrations applied");
        return Ok(());
    }

    let migrator = PostgresMigrator::new(pool);
    let Some(current) = migrator.current_version().await? else {
        info!("No migrations to revert");
        return Ok(());
    };

    if let Some(migration) = storage_migrations()
        .into_iter()
        .find(|m| m.version == current)
    {
        if migrator.revert_migration(&migration).await? {
            info!(version = current, "Migration reverted");
        }
    }

    Ok(())
}
