//! Health handler tests.

use axum::extract::State;
use vmp_api::handlers::basic::health_handler;

use crate::common::create_test_server_state;

#[tokio::test]
async fn test_health() {
    let state = create_test_server_state().await;
    let axum::Json(health) = health_handler(State(state)).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.in_flight, 0);
}
