use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let user_id = ensure_user(&pool, "demo", "demo@example.com", "demo12345").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // The no-op update makes RETURNING yield the existing row too.
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // (name, category, price, discounted price); prices in minor units.
    let products: [(&str, &str, i64, Option<i64>); 8] = [
        ("Vanilla Bean Stick", "sticks", 250, None),
        ("Choco Crunch Stick", "sticks", 350, Some(300)),
        ("Mango Ice Stick", "sticks", 200, None),
        ("Strawberry Swirl Cone", "cones", 400, None),
        ("Butterscotch Cone", "cones", 450, Some(380)),
        ("Pistachio Tub", "tubs", 1200, None),
        ("Cookies & Cream Tub", "tubs", 1100, Some(950)),
        ("Belgian Chocolate Tub", "tubs", 2000, None),
    ];

    for (name, category, price, discounted_price) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, price, discounted_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(category)
        .bind(price)
        .bind(discounted_price)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
