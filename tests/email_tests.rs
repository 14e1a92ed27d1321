//! # Email Tests
//!
//! Batch runs with email delivery against a mock webhook. Each test mounts its
//! own path on the shared mock server.

use mockito::{Matcher, mock};
use pretty_assertions::assert_eq;
use sello::batch::{self, EmailJob, RowStage};
use sello::data::Table;
use sello::email::{Dispatcher, EmailSettings, OutgoingEmail, WebhookDispatcher, send_test_email};
use sello::error::DispatchError;
use sello::model::{Anchor, FieldSet, FieldType, Rgb};
use sello::render::Template;
use serde_json::json;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn settings(path: &str) -> EmailSettings {
    EmailSettings {
        webhook_url: format!("{}{}", mockito::server_url(), path),
        email_column: "Email".into(),
        ..Default::default()
    }
}

fn fields() -> FieldSet {
    let mut fields = FieldSet::new();
    let name = fields.add(FieldType::Name);
    name.data_column = "Name".into();
    name.anchor = Some(Anchor::new(150, 50));
    name.font_size = 20;
    fields
}

fn template() -> Template {
    Template::blank(300, 100, Rgb::WHITE)
}

// ============================================================================
// BATCH DELIVERY
// ============================================================================

#[tokio::test]
async fn test_invalid_address_makes_no_request() {
    let hook = mock("POST", "/hook-invalid").with_status(200).expect(0).create();

    let dir = tempfile::tempdir().unwrap();
    let settings = settings("/hook-invalid");
    let dispatcher = WebhookDispatcher::new(settings.webhook_url.clone(), 30).unwrap();
    let data = Table::from_rows(
        &["Name", "Email"],
        &[&["Ada Lovelace", "not-an-email"], &["Alan Turing", ""]],
    );

    let result = batch::generate(
        &template(),
        &data,
        &fields(),
        None,
        dir.path(),
        Some(EmailJob {
            settings: &settings,
            dispatcher: &dispatcher,
        }),
    )
    .await
    .unwrap();

    hook.assert();
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.emails_sent, 0);
    assert_eq!(result.emails_failed, 2);
    assert!(matches!(
        result.email_failures[0].error,
        DispatchError::InvalidRecipient(_)
    ));
    assert_eq!(result.email_failures[0].label, "Ada Lovelace");
    assert_eq!(result.email_failures[1].label, "Alan Turing");
    assert_eq!(result.rows[0].last_stage(), RowStage::Done);
    assert!(result.rows[0].stages.contains(&RowStage::EmailFailed));
}

#[tokio::test]
async fn test_http_500_keeps_raw_body() {
    let _hook = mock("POST", "/hook-500")
        .with_status(500)
        .with_body("Internal boom")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let settings = settings("/hook-500");
    let dispatcher = WebhookDispatcher::new(settings.webhook_url.clone(), 30).unwrap();
    let data = Table::from_rows(&["Name", "Email"], &[&["Ada Lovelace", "a@b.com"]]);

    let result = batch::generate(
        &template(),
        &data,
        &fields(),
        None,
        dir.path(),
        Some(EmailJob {
            settings: &settings,
            dispatcher: &dispatcher,
        }),
    )
    .await
    .unwrap();

    // The certificate itself is still written
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.emails_failed, 1);
    let failure = &result.email_failures[0];
    assert_eq!(failure.recipient.as_deref(), Some("a@b.com"));
    match &failure.error {
        DispatchError::Http { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "Internal boom");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        failure.to_string(),
        "Ada Lovelace (a@b.com): HTTP Error 500: Internal boom"
    );
}

#[tokio::test]
async fn test_successful_delivery_payload() {
    let hook = mock("POST", "/hook-ok")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "to": "ada@example.com",
            "subject": "Your Certificate",
            "message": "Dear Ada Lovelace,\n\nPlease find your certificate attached.\n\nBest regards,\nCertificate Team",
            "attachmentName": "Ada_Lovelace_1.pdf",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "message": "Email sent successfully"}"#)
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let settings = settings("/hook-ok");
    let dispatcher = WebhookDispatcher::new(settings.webhook_url.clone(), 30).unwrap();
    let data = Table::from_rows(&["Name", "Email"], &[&["Ada Lovelace", " ada@example.com "]]);

    let result = batch::generate(
        &template(),
        &data,
        &fields(),
        None,
        dir.path(),
        Some(EmailJob {
            settings: &settings,
            dispatcher: &dispatcher,
        }),
    )
    .await
    .unwrap();

    hook.assert();
    assert_eq!(result.emails_sent, 1);
    assert_eq!(result.emails_failed, 0);
    let stages = &result.rows[0].stages;
    assert_eq!(
        stages[stages.len() - 2..].to_vec(),
        vec![RowStage::EmailSent, RowStage::Done]
    );
}

#[tokio::test]
async fn test_webhook_reported_error() {
    let _hook = mock("POST", "/hook-rejected")
        .with_status(200)
        .with_body(r#"{"success": false, "error": "Service invoked too many times"}"#)
        .create();

    let dispatcher =
        WebhookDispatcher::new(format!("{}/hook-rejected", mockito::server_url()), 30).unwrap();
    let email = OutgoingEmail {
        to: "a@b.com".into(),
        subject: "S".into(),
        message: "M".into(),
        attachment: b"%PDF-1.5".to_vec(),
        attachment_name: "a.pdf".into(),
    };
    match dispatcher.send(&email).await {
        Err(DispatchError::Rejected(reason)) => {
            assert_eq!(reason, "Service invoked too many times")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_email_column_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings("/hook-unused");
    let dispatcher = WebhookDispatcher::new(settings.webhook_url.clone(), 30).unwrap();
    let data = Table::from_rows(&["Name"], &[&["Ada"]]);

    let err = batch::generate(
        &template(),
        &data,
        &fields(),
        None,
        dir.path(),
        Some(EmailJob {
            settings: &settings,
            dispatcher: &dispatcher,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Missing data columns: Email");
}

#[tokio::test]
async fn test_unreachable_webhook_is_transport_error() {
    let dispatcher = WebhookDispatcher::new("http://127.0.0.1:9/unreachable", 5).unwrap();
    let email = OutgoingEmail {
        to: "a@b.com".into(),
        subject: "S".into(),
        message: "M".into(),
        attachment: Vec::new(),
        attachment_name: "a.pdf".into(),
    };
    let err = dispatcher.send(&email).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Transport(_) | DispatchError::Timeout(_)
    ));
}

// ============================================================================
// TEST SEND
// ============================================================================

#[tokio::test]
async fn test_send_test_email_through_webhook() {
    let hook = mock("POST", "/hook-test-send")
        .match_body(Matcher::PartialJson(json!({
            "to": "qa@example.com",
            "subject": "Test Certificate Email",
            "attachmentName": "test_certificate.pdf",
        })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create();

    let dispatcher =
        WebhookDispatcher::new(format!("{}/hook-test-send", mockito::server_url()), 30).unwrap();
    send_test_email(&dispatcher, "qa@example.com").await.unwrap();
    hook.assert();
}
