use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::accounts::Actor;
use crate::clock::ManualClock;
use crate::http::JsonBody;
use crate::store::RepositoryError;
use crate::workflows::jobs::{
    ApplicationStatus, JobApplicationService, JobLedgerRepository, JobTitle,
};

#[tokio::test]
async fn submit_returns_created_with_flash_message() {
    let portal = portal();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            "/api/v1/jobs/applications",
            Some(portal.citizen),
            json!({ "job_title": "Judge", "message": "I know the law." }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["message"],
        "Your application for Judge has been submitted to the President for review!"
    );
    assert_eq!(payload["application"]["job_title"], "Judge");
    assert_eq!(payload["application"]["status"], "pending");
}

#[tokio::test]
async fn submit_without_identity_is_unauthorized() {
    let portal = portal();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            "/api/v1/jobs/applications",
            None,
            json!({ "job_title": "Judge" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let portal = portal();
    portal
        .service
        .submit(portal.citizen, request("Coach"))
        .unwrap();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            "/api/v1/jobs/applications",
            Some(portal.citizen),
            json!({ "job_title": "Coach" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "you already have a pending application for Coach"
    );
}

#[tokio::test]
async fn unknown_job_title_is_unprocessable() {
    let portal = portal();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            "/api/v1/jobs/applications",
            Some(portal.citizen),
            json!({ "job_title": "Astronaut" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["fields"][0]["field"], "job_title");
}

#[tokio::test]
async fn approve_grants_job_and_reports_it() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Judge"))
        .unwrap();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/jobs/applications/{}/approve", application.id.0),
            Some(portal.president),
            json!({ "response": "Welcome" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["message"],
        "Application for Judge by ada has been approved!"
    );
    assert_eq!(payload["review"]["held_jobs"], json!(["Judge"]));
    assert_eq!(
        account(&portal.store, portal.citizen).held_jobs.to_vec(),
        vec![JobTitle::Judge]
    );
}

#[tokio::test]
async fn approve_without_body_uses_no_response() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Lawyer"))
        .unwrap();

    let response = router(&portal)
        .oneshot(bare_request(
            "POST",
            &format!("/api/v1/jobs/applications/{}/approve", application.id.0),
            portal.president,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn approve_with_mistyped_body_is_unprocessable_and_leaves_application_pending() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Judge"))
        .unwrap();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/jobs/applications/{}/approve", application.id.0),
            Some(portal.president),
            json!({ "response": 42 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["fields"][0]["field"], "body");

    let stored = portal
        .store
        .fetch_application(application.id)
        .unwrap()
        .expect("application stored");
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert!(account(&portal.store, portal.citizen).held_jobs.is_empty());
}

#[tokio::test]
async fn deny_with_broken_json_is_rejected_before_review() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Judge"))
        .unwrap();

    let response = router(&portal)
        .oneshot(raw_json_request(
            "POST",
            &format!("/api/v1/jobs/applications/{}/deny", application.id.0),
            portal.president,
            "{\"reason\": ",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let stored = portal
        .store
        .fetch_application(application.id)
        .unwrap()
        .expect("application stored");
    assert_eq!(stored.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn malformed_submission_is_answered_with_json_error() {
    let portal = portal();

    let response = router(&portal)
        .oneshot(raw_json_request(
            "POST",
            "/api/v1/jobs/applications",
            portal.citizen,
            "{\"job_title\": \"Judge\"",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some_and(|error| !error.is_empty()));
    assert!(portal
        .store
        .applications_for(portal.citizen, 10)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn citizens_cannot_approve() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Judge"))
        .unwrap();

    let response = router(&portal)
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/jobs/applications/{}/approve", application.id.0),
            Some(portal.citizen),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(account(&portal.store, portal.citizen).held_jobs.is_empty());
}

#[tokio::test]
async fn deny_without_reason_is_unprocessable_then_succeeds_with_one() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Soldier"))
        .unwrap();
    let uri = format!("/api/v1/jobs/applications/{}/deny", application.id.0);

    let refused = router(&portal)
        .oneshot(json_request("POST", &uri, Some(portal.president), json!({})))
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let denied = router(&portal)
        .oneshot(json_request(
            "POST",
            &uri,
            Some(portal.president),
            json!({ "response": "Ranks are full" }),
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::OK);
    let payload = read_json_body(denied).await;
    assert_eq!(
        payload["message"],
        "Application for Soldier by ada has been denied."
    );
    assert_eq!(payload["review"]["application"]["status"], "denied");
}

#[tokio::test]
async fn second_review_conflicts() {
    let portal = portal();
    let application = portal
        .service
        .submit(portal.citizen, request("Judge"))
        .unwrap();
    let uri = format!("/api/v1/jobs/applications/{}/approve", application.id.0);

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let response = router(&portal)
            .oneshot(json_request("POST", &uri, Some(portal.president), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let portal = portal();

    let response = router(&portal)
        .oneshot(get_request("/api/v1/jobs/applications/99", portal.president))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overview_and_review_board_render() {
    let portal = portal();
    portal
        .service
        .submit(portal.citizen, request("Journalist"))
        .unwrap();

    let overview = router(&portal)
        .oneshot(get_request("/api/v1/jobs", portal.citizen))
        .await
        .unwrap();
    assert_eq!(overview.status(), StatusCode::OK);
    let payload = read_json_body(overview).await;
    assert_eq!(payload["available_jobs"].as_array().unwrap().len(), 6);
    assert_eq!(payload["pending"][0]["job_title"], "Journalist");

    let board = router(&portal)
        .oneshot(get_request("/api/v1/jobs/applications", portal.president))
        .await
        .unwrap();
    assert_eq!(board.status(), StatusCode::OK);
    let payload = read_json_body(board).await;
    assert_eq!(payload["pending_count"], 1);
    assert_eq!(payload["pending"][0]["applicant_name"], "ada");

    let hidden = router(&portal)
        .oneshot(get_request("/api/v1/jobs/applications", portal.citizen))
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_store_duplicate() {
    let (ledger, citizen) = FailingLedger::new(RepositoryError::Conflict("pending_application"));
    let service = Arc::new(JobApplicationService::new(
        Arc::new(ledger),
        Arc::new(ManualClock::new(Utc::now())),
    ));

    let response = crate::workflows::jobs::router::submit_handler::<FailingLedger>(
        State(service),
        Actor(citizen),
        JsonBody(request("Judge")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let (ledger, citizen) =
        FailingLedger::new(RepositoryError::Unavailable("database offline".into()));
    let service = Arc::new(JobApplicationService::new(
        Arc::new(ledger),
        Arc::new(ManualClock::new(Utc::now())),
    ));

    let response = crate::workflows::jobs::router::submit_handler::<FailingLedger>(
        State(service),
        Actor(citizen),
        JsonBody(request("Judge")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "repository unavailable: database offline"
    );
}
