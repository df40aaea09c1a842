//! # User Directory Handler
//!
//! - `GET /api/users` - Every other user, with the online flag taken from the
//!   connection registry at request time

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use lib_auth::Claims;
use lib_core::model::store::UserRepository;
use lib_core::{AppError, DbPool};
use shared::dto::UserListResponse;

use crate::live::ConnectionRegistry;
use crate::middleware::current_user_id;

pub async fn list_users(
    State(db): State<DbPool>,
    State(registry): State<Arc<ConnectionRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserListResponse>, AppError> {
    let user_id = current_user_id(&claims)?;

    let users = UserRepository::list_except(&db, user_id)
        .await?
        .into_iter()
        .map(|user| {
            let online = registry.is_online(user.id);
            user.into_profile(online)
        })
        .collect();

    Ok(Json(UserListResponse { users }))
}
