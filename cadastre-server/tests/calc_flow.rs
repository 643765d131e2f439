use anyhow::Result;
use axum::http::StatusCode;
use cadastre_core::{
    HOST_UNRESOLVED_MESSAGE, api::routes, database::TerritoryRepository,
    scoring::ScoringOutcome,
};
use cadastre_model::{CadastralNumber, PENDING_MESSAGE, Parcel};
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;
use support::build_in_memory_app;

fn example_body() -> Value {
    json!({
        "cadastral_number": "66:66:666666:65",
        "latitude": -30.2155,
        "longitude": 70.1558
    })
}

#[tokio::test]
async fn create_returns_id_and_result_reports_the_score() -> Result<()> {
    let (app, _store) = build_in_memory_app(55.532757)?;
    let mut events = app.events();

    let created = app.server.post(routes::CALC).json(&example_body()).await;
    created.assert_status_ok();
    let id: i32 = created.json();
    assert_eq!(id, 1);

    let event = events.recv().await?;
    assert_eq!(event.outcome, ScoringOutcome::Completed(55.532757));

    let result = app.server.get(&routes::result_path(id)).await;
    result.assert_status_ok();
    let body: Value = result.json();
    assert_eq!(body, json!({ "score": 55.532757 }));

    // Reading again without an update returns the same value.
    let again: Value = app.server.get(&routes::result_path(id)).await.json();
    assert_eq!(again, body);

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn ids_increase_per_parcel() -> Result<()> {
    let (app, _store) = build_in_memory_app(1.0)?;

    let first: i32 = app.server.post(routes::CALC).json(&example_body()).await.json();
    let second: i32 = app
        .server
        .post(routes::CALC)
        .json(&json!({
            "cadastral_number": "77:01:000401:12",
            "latitude": 55.75,
            "longitude": 37.61
        }))
        .await
        .json();

    assert!(first > 0);
    assert!(second > first);
    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn legacy_longtitude_key_is_accepted() -> Result<()> {
    let (app, _store) = build_in_memory_app(2.5)?;

    let response = app
        .server
        .post(routes::CALC)
        .json(&json!({
            "cadastral_number": "66:66:666666:65",
            "latitude": -30.2155,
            "longtitude": 70.1558
        }))
        .await;

    response.assert_status_ok();
    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn pending_rows_report_the_pending_marker() -> Result<()> {
    let (app, store) = build_in_memory_app(1.0)?;
    // Written straight to storage so no job ever scores it.
    let id = store
        .create(&Parcel::new("12:34:567890:12", 10.0, 20.0)?)
        .await?;

    let response = app.server.get(&routes::result_path(id.get())).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "score": PENDING_MESSAGE }));

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unknown_result_is_not_found() -> Result<()> {
    let (app, _store) = build_in_memory_app(1.0)?;

    let response = app.server.get(&routes::result_path(42)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "code": 404, "type": "NOT_FOUND", "message": "Resource not found" })
    );

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn malformed_input_is_rejected_before_storage() -> Result<()> {
    let (app, store) = build_in_memory_app(1.0)?;

    let bad_requests = [
        json!({ "cadastral_number": "66-66-666666-65", "latitude": 0.0, "longitude": 0.0 }),
        json!({ "cadastral_number": "66:66:666666:65", "latitude": 90.5, "longitude": 0.0 }),
        json!({ "cadastral_number": "66:66:666666:65", "latitude": 0.0, "longitude": -181.0 }),
        json!({ "cadastral_number": "66:66:666666:65", "latitude": "north" }),
    ];

    for request in bad_requests {
        let response = app.server.post(routes::CALC).json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], 400);
        assert_eq!(body["type"], "ValidationError");
    }

    let number = CadastralNumber::parse("66:66:666666:65")?;
    assert!(store.get(&number).await?.is_none());

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn malformed_result_id_is_a_bad_request() -> Result<()> {
    let (app, _store) = build_in_memory_app(1.0)?;

    app.server
        .get("/result/?result_id=abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .get(routes::RESULT)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn duplicate_parcel_is_a_conflict() -> Result<()> {
    let (app, _store) = build_in_memory_app(1.0)?;

    app.server
        .post(routes::CALC)
        .json(&example_body())
        .await
        .assert_status_ok();

    let duplicate = app.server.post(routes::CALC).json(&example_body()).await;
    duplicate.assert_status(StatusCode::CONFLICT);
    let body: Value = duplicate.json();
    assert_eq!(body["type"], "Conflict");

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn storage_outage_is_service_unavailable() -> Result<()> {
    let (app, store) = build_in_memory_app(1.0)?;
    store.set_offline(true);

    let response = app.server.post(routes::CALC).json(&example_body()).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], 503);
    assert_eq!(body["type"], "ServiceUnavailable");
    assert_ne!(body["message"], HOST_UNRESOLVED_MESSAGE);

    app.server
        .get(&routes::result_path(1))
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    app.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn health_reflects_storage_state() -> Result<()> {
    let (app, store) = build_in_memory_app(1.0)?;

    let healthy = app.server.get(routes::HEALTH).await;
    healthy.assert_status_ok();
    assert_eq!(
        healthy.json::<Value>(),
        json!({ "status": "ok", "database": "ok" })
    );

    store.set_offline(true);
    let degraded = app.server.get(routes::HEALTH).await;
    degraded.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(degraded.json::<Value>()["database"], "unavailable");

    app.shutdown().await;
    Ok(())
}
