use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use school_payments_api::{
    config::AppConfig,
    db::{create_orm_conn, is_in_memory, run_migrations},
    entity::users::{Column as UserCol, Entity as Users},
    middleware::auth::AuthUser,
    models::Role,
    services::{auth_service::create_user, order_service},
    state::AppState,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    if is_in_memory(config.database_url()) {
        anyhow::bail!("DATABASE_URL is not set; seeding an in-memory database has no effect");
    }

    let orm = create_orm_conn(config.database_url()).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", "Admin", Role::Admin).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", "Demo User", Role::User).await?;

    let state = AppState::new(orm, config)?;
    let admin = AuthUser {
        user_id: admin_id,
        email: "admin@example.com".into(),
        role: Role::Admin,
    };
    let created = order_service::create_dummy_data(&state, &admin).await?;
    let count = created.data.map(|d| d.created.len()).unwrap_or_default();
    println!("Seeded {count} sample transactions");

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let existing = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?;
    if let Some(user) = existing {
        println!("User {email} already exists");
        return Ok(user.id);
    }

    let user = create_user(orm, email, password, name, role).await?;
    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user.id)
}
