//! # User Repository
//!
//! Read access to the users owned by the account service, plus a creation
//! path used by the seed utility and tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{UserRepository, create_pool};
//! # use lib_core::model::store::models::UserForCreate;
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite::memory:").await?;
//!
//! let user = UserRepository::create(&pool, UserForCreate::new("Ada", "ada@example.com")).await?;
//! assert!(UserRepository::exists(&pool, user.id).await?);
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForCreate};
use super::DbPool;
use lib_utils::now_utc;
use sqlx::query_as;

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::Database` if the email is already taken.
    pub async fn create(pool: &DbPool, user: UserForCreate) -> Result<User, sqlx::Error> {
        query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, profile_pic, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, full_name, email, profile_pic, created_at
            "#
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.profile_pic)
        .bind(now_utc())
        .fetch_one(pool)
        .await
    }

    /// Find a user by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that id
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT id, full_name, email, profile_pic, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT id, full_name, email, profile_pic, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Check whether a user id exists.
    pub async fn exists(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// All users except `user_id`, ordered by name.
    pub async fn list_except(pool: &DbPool, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
        query_as::<_, User>(
            r#"
            SELECT id, full_name, email, profile_pic, created_at
            FROM users
            WHERE id != ?
            ORDER BY full_name ASC, id ASC
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::memory_pool;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = memory_pool().await.unwrap();

        let user = UserRepository::create(
            &pool,
            UserForCreate::new("Ada Lovelace", "ada@example.com").profile_pic("https://img.example/ada.png"),
        )
        .await
        .unwrap();

        let found = UserRepository::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(found.full_name, "Ada Lovelace");
        assert_eq!(found.profile_pic.as_deref(), Some("https://img.example/ada.png"));

        let by_email = UserRepository::find_by_email(&pool, "ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(UserRepository::find_by_email(&pool, "nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let pool = memory_pool().await.unwrap();
        UserRepository::create(&pool, UserForCreate::new("A", "same@example.com")).await.unwrap();

        let result = UserRepository::create(&pool, UserForCreate::new("B", "same@example.com")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_exists() {
        let pool = memory_pool().await.unwrap();
        let user = UserRepository::create(&pool, UserForCreate::new("A", "a@example.com")).await.unwrap();

        assert!(UserRepository::exists(&pool, user.id).await.unwrap());
        assert!(!UserRepository::exists(&pool, user.id + 100).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_except_skips_caller() {
        let pool = memory_pool().await.unwrap();
        let me = UserRepository::create(&pool, UserForCreate::new("Me", "me@example.com")).await.unwrap();
        UserRepository::create(&pool, UserForCreate::new("Zed", "zed@example.com")).await.unwrap();
        UserRepository::create(&pool, UserForCreate::new("Bea", "bea@example.com")).await.unwrap();

        let others = UserRepository::list_except(&pool, me.id).await.unwrap();

        let names: Vec<_> = others.iter().map(|u| u.full_name.as_str()).collect();
        assert_eq!(names, vec!["Bea", "Zed"]);
    }
}
