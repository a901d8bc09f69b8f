use school_payments_api::{
    config::AppConfig,
    db::{create_orm_conn, is_in_memory, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    if is_in_memory(config.database_url()) {
        anyhow::bail!("DATABASE_URL is not set; nothing to migrate for an in-memory database");
    }
    let orm = create_orm_conn(config.database_url()).await?;
    run_migrations(&orm).await?;
    println!("Migrations applied");
    Ok(())
}
