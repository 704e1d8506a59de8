use storefront_api::routes::health::{health_check, readiness};

mod common;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn readiness_pings_the_database() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let response = readiness(axum::extract::State(state)).await?;
    assert_eq!(response.0.data.expect("readiness data").status, "ready");
    Ok(())
}
