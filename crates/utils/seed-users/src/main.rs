//! # Seed Users Utility
//!
//! Inserts a few demo users and prints a bearer token for each. Accounts and
//! tokens normally come from the account service; this stands in for it during
//! development.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package seed-users --bin seed_users
//! ```
//!
//! The program will:
//! 1. Connect to the database and apply migrations
//! 2. Create each demo user that does not exist yet (matched by email)
//! 3. Print `id`, name and a JWT signed with `JWT_SECRET`
//!
//! Running it twice is harmless.

use lib_auth::encode_jwt;
use lib_core::model::store::models::UserForCreate;
use lib_core::model::store::UserRepository;
use lib_core::{create_pool, run_migrations, Config};

const DEMO_USERS: &[(&str, &str, &str)] = &[
    ("Alice Martin", "alice@example.com", "https://i.pravatar.cc/150?u=alice"),
    ("Bruno Costa", "bruno@example.com", "https://i.pravatar.cc/150?u=bruno"),
    ("Chen Wei", "chen@example.com", "https://i.pravatar.cc/150?u=chen"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    println!("============================================");
    println!("  Seed Users Utility");
    println!("============================================");
    println!();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    if let Some(db_path) = config.sqlite_path() {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    println!("Connecting to {}...", config.database_url);
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    println!("Connected successfully.");
    println!();

    for (name, email, avatar) in DEMO_USERS {
        let user = match UserRepository::find_by_email(&pool, email).await? {
            Some(existing) => {
                println!("Exists:  {} <{}>", existing.full_name, existing.email);
                existing
            }
            None => {
                let created = UserRepository::create(&pool, UserForCreate::new(*name, *email).profile_pic(*avatar)).await?;
                println!("Created: {} <{}>", created.full_name, created.email);
                created
            }
        };

        let token = encode_jwt(user.id, user.full_name.clone(), &config.jwt_secret, config.jwt_expiration_hours)?;
        println!("  id={} token={}", user.id, token);
    }

    println!();
    println!("Use a token as `Authorization: Bearer <token>` or `?token=<token>` on /api/ws/live.");

    Ok(())
}
