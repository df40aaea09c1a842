//! # User Directory Handler Tests

use super::*;
use crate::live::ConnectionHandle;
use shared::dto::UserListResponse;

#[tokio::test]
async fn test_list_users_excludes_caller_and_reports_online() {
    // Arrange: U2 is connected
    let ctx = setup().await;
    let (u2_conn, _u2_rx) = ConnectionHandle::new(ctx.u2.id);
    ctx.state.registry.register(u2_conn);

    // Act
    let (status, body) = call(&ctx.app, "GET", "/api/users", Some(&ctx.u1.token), None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let list: UserListResponse = serde_json::from_value(body).unwrap();
    let entries: Vec<_> = list.users.iter().map(|u| (u.id, u.online)).collect();
    assert_eq!(entries, vec![(ctx.u3.id, false), (ctx.u2.id, true)]);
}
