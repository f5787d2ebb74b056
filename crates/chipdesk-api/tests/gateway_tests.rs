// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use chipdesk_api::{
    CsrfToken, FailureKind, Gateway, HttpGateway, MALFORMED_RESPONSE_MESSAGE,
    NETWORK_ERROR_MESSAGE, RequestOutcome, TokenSource, endpoints,
};
use chipdesk_app::ChipPayload;
use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    token: Option<String>,
    content_type: Option<String>,
    body: String,
}

fn header(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

/// Serve `replies` in order, reporting each request on the returned channel.
fn serve(
    replies: Vec<(u16, &'static str, &'static str)>,
) -> Result<(String, mpsc::Receiver<Seen>, thread::JoinHandle<()>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for (status, content_type, body) in replies {
            let mut request = server.recv().expect("request expected");
            let mut received = String::new();
            request
                .as_reader()
                .read_to_string(&mut received)
                .expect("request body should be readable");
            let seen = Seen {
                method: request.method().to_string(),
                url: request.url().to_owned(),
                token: header(&request, "X-CSRFToken"),
                content_type: header(&request, "Content-Type"),
                body: received,
            };
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", content_type)
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
            tx.send(seen).expect("test thread should be listening");
        }
    });

    Ok((addr, rx, handle))
}

fn gateway(addr: &str) -> Result<HttpGateway> {
    HttpGateway::new(addr, Duration::from_secs(2))
}

#[test]
fn server_error_with_unparsable_body_names_status() -> Result<()> {
    let (addr, rx, handle) = serve(vec![(500, "text/html", "<h1>boom</h1>")])?;
    let gateway = gateway(&addr)?;

    let outcome = gateway.perform(&endpoints::list_cc_emails());
    let RequestOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(failure.message.contains("500"), "message: {}", failure.message);

    let seen = rx.recv()?;
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.url, "/admin/email/cc");
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn validation_error_body_keeps_details() -> Result<()> {
    let (addr, _rx, handle) = serve(vec![(
        400,
        "application/json",
        r#"{"error":"form validation failed","details":["stock: not a number"]}"#,
    )])?;
    let gateway = gateway(&addr)?;

    let payload = ChipPayload {
        model: "LM358".to_owned(),
        description: String::new(),
        stock: 1,
        price: 0.0,
    };
    let outcome = gateway.perform(&endpoints::add_chip(&payload));
    let RequestOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.kind, FailureKind::Application);
    assert_eq!(failure.prefixed("add failed"), "add failed: stock: not a number");
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn token_header_and_json_body_are_sent() -> Result<()> {
    let (addr, rx, handle) = serve(vec![(
        201,
        "application/json",
        r#"{"message":"chip added"}"#,
    )])?;
    let mut gateway = gateway(&addr)?;
    gateway.set_token(CsrfToken::new("t0k3n"));

    let payload = ChipPayload {
        model: "NE555".to_owned(),
        description: "timer".to_owned(),
        stock: 30,
        price: 0.25,
    };
    let outcome = gateway.perform(&endpoints::add_chip(&payload));
    assert!(outcome.is_success());

    let seen = rx.recv()?;
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/admin/chip/add");
    assert_eq!(seen.token.as_deref(), Some("t0k3n"));
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("application/json"))
    );
    let body: serde_json::Value = serde_json::from_str(&seen.body)?;
    assert_eq!(body["model"], "NE555");
    assert_eq!(body["stock"], 30);
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn search_is_sent_as_multipart() -> Result<()> {
    let (addr, rx, handle) = serve(vec![(
        200,
        "application/json",
        r#"{"model":"ABC123","stock":5,"price":0}"#,
    )])?;
    let gateway = gateway(&addr)?;

    let outcome = gateway.perform(&endpoints::search("ABC123"));
    assert!(outcome.is_success());

    let seen = rx.recv()?;
    assert_eq!(seen.url, "/search");
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("multipart/form-data"))
    );
    assert!(seen.body.contains("name=\"model\""));
    assert!(seen.body.contains("ABC123"));
    // No token configured: the header is still present, just empty.
    assert_eq!(seen.token.as_deref(), Some(""));
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn success_with_non_json_body_is_failure() -> Result<()> {
    let (addr, _rx, handle) = serve(vec![(200, "text/plain", "ok")])?;
    let gateway = gateway(&addr)?;

    let outcome = gateway.perform(&endpoints::list_chips());
    let RequestOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.message, MALFORMED_RESPONSE_MESSAGE);
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_server_is_generic_network_error() -> Result<()> {
    let gateway = HttpGateway::new("http://127.0.0.1:1", Duration::from_millis(200))?;
    let outcome = gateway.perform(&endpoints::list_chips());
    let RequestOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.message, NETWORK_ERROR_MESSAGE);
    Ok(())
}

#[test]
fn token_is_loaded_from_page_meta_tag() -> Result<()> {
    let (addr, rx, handle) = serve(vec![
        (
            200,
            "text/html",
            r#"<html><head><meta name="csrf-token" content="from-page"></head></html>"#,
        ),
        (200, "application/json", r#"{"cc_emails":[]}"#),
    ])?;
    let mut gateway = gateway(&addr)?;
    gateway.load_token(&TokenSource::Page("/admin".to_owned()))?;
    assert!(gateway.token().is_present());

    gateway.perform(&endpoints::list_cc_emails());
    let page = rx.recv()?;
    assert_eq!(page.url, "/admin");
    let call = rx.recv()?;
    assert_eq!(call.token.as_deref(), Some("from-page"));
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn page_without_meta_tag_leaves_token_missing() -> Result<()> {
    let (addr, _rx, handle) = serve(vec![(200, "text/html", "<html></html>")])?;
    let mut gateway = gateway(&addr)?;
    gateway.load_token(&TokenSource::Page("/admin".to_owned()))?;
    assert!(!gateway.token().is_present());
    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn health_reports_status() -> Result<()> {
    let (addr, _rx, handle) = serve(vec![(
        200,
        "application/json",
        r#"{"status":"healthy","message":"ok"}"#,
    )])?;
    let gateway = gateway(&addr)?;
    let health = gateway.health()?;
    assert_eq!(health.status, "healthy");
    handle.join().expect("server thread should join");
    Ok(())
}
