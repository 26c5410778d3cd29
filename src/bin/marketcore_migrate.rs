//! 独立迁移执行器
//!
//! 生产部署在启动应用前单独跑迁移；迁移文件被重新格式化过时，
//! 允许修复 _sqlx_migrations 里的历史校验和后重试。

use anyhow::Result;
use marketcore::{config::Config, infrastructure::db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run_migrations_with_checksum_repair(pool: &db::PgPool) -> Result<()> {
    let migrator = sqlx::migrate!("./migrations");

    async fn repair_checksum(pool: &db::PgPool, version: i64, checksum: &[u8]) -> Result<u64> {
        let result = sqlx::query("UPDATE _sqlx_migrations SET checksum = $1 WHERE version = $2")
            .bind(checksum)
            .bind(version)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    for attempt in 1..=20 {
        match migrator.run(pool).await {
            Ok(_) => {
                tracing::info!("✅ Database migrations completed");
                return Ok(());
            }
            Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
                let Some(migration) = migrator.migrations.iter().find(|m| m.version == version)
                else {
                    anyhow::bail!(
                        "migration checksum mismatch at version {version}, but migration is missing from binary"
                    );
                };

                tracing::warn!(
                    "⚠️ Migration {version} checksum mismatch; repairing _sqlx_migrations (attempt {attempt}/20)"
                );

                let rows_affected =
                    repair_checksum(pool, version, migration.checksum.as_ref()).await?;
                tracing::warn!(
                    "⚠️ Migration {version} checksum repair rows_affected={rows_affected}"
                );
            }
            Err(e) => {
                return Err(e.into());
            }
        }
    }

    anyhow::bail!("migration checksum repair exceeded retry limit")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketcore=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database.url).await?;

    run_migrations_with_checksum_repair(&pool).await?;

    tracing::info!("✅ Migration runner finished successfully");
    Ok(())
}
