// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde_json::json;
use std::io::Read;
use std::thread;
use std::time::Duration;
use storefront_app::{EntityId, Method, RemoteCall, SyncController, Transport, product_schema};
use storefront_remote::{HAL_JSON, HttpTransport};
use storefront_testkit::{COLLECTION_PATH, product_json};
use tiny_http::{Header, Request, Response, Server};

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

fn respond_json(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", HAL_JSON).expect("valid content type header"),
        );
    request.respond(response).expect("response should succeed");
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

#[test]
fn get_requests_hal_json_and_bypasses_caches() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method().to_string(), "GET");
        assert_eq!(request.url(), "/store/products/");
        let accept = header_value(&request, "Accept").expect("accept header");
        assert!(accept.starts_with(HAL_JSON), "got {accept}");
        assert_eq!(
            header_value(&request, "Cache-Control").as_deref(),
            Some("no-cache")
        );
        respond_json(request, 200, "[]");
    });

    let mut transport = HttpTransport::new(&addr, Duration::from_secs(2))?;
    let reply = transport.send(&RemoteCall {
        method: Method::Get,
        path: COLLECTION_PATH.to_owned(),
        body: None,
    })?;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "[]");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn post_sends_json_body_with_hal_content_type() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method().to_string(), "POST");
        let content_type = header_value(&request, "Content-Type").expect("content type");
        assert_eq!(content_type, "application/hal+json; charset=utf-8");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(parsed["prices"]["USD"], json!("9.99"));
        respond_json(request, 201, &body);
    });

    let mut transport = HttpTransport::new(&addr, Duration::from_secs(2))?;
    let reply = transport.send(&RemoteCall {
        method: Method::Post,
        path: COLLECTION_PATH.to_owned(),
        body: Some(json!({"name": "Widget", "description": "", "prices": {"USD": "9.99", "GBP": "7.50"}})),
    })?;
    assert_eq!(reply.status, 201);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn error_statuses_come_back_as_replies() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method().to_string(), "PUT");
        assert_eq!(request.url(), "/store/products/7");
        respond_json(
            request,
            400,
            r#"{"fieldErrors":[{"field":"name","message":"may not be empty"}]}"#,
        );
    });

    let mut transport = HttpTransport::new(&addr, Duration::from_secs(2))?;
    let reply = transport.send(&RemoteCall {
        method: Method::Put,
        path: "/store/products/7".to_owned(),
        body: Some(json!({"name": ""})),
    })?;
    assert_eq!(reply.status, 400);
    assert!(!reply.is_success());
    assert!(reply.body.contains("fieldErrors"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_server_error_is_actionable() {
    let mut transport = HttpTransport::new("http://127.0.0.1:1", Duration::from_millis(200))
        .expect("transport should initialize");
    let error = transport
        .send(&RemoteCall {
            method: Method::Get,
            path: COLLECTION_PATH.to_owned(),
            body: None,
        })
        .expect_err("request should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(
        message.contains("cannot reach") || message.contains("did not answer"),
        "unexpected message: {message}"
    );
}

#[test]
fn sync_controller_refreshes_over_http_after_delete() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let both = json!([
            product_json("A", "Alpha", "first", "1.00", "0.80"),
            product_json("B", "Beta", "second", "2.00", "1.60"),
        ]);
        let only_b = json!([product_json("B", "Beta", "second", "2.00", "1.60")]);

        let first = server.recv().expect("initial list");
        assert_eq!(first.method().to_string(), "GET");
        respond_json(first, 200, &both.to_string());

        let delete = server.recv().expect("delete");
        assert_eq!(delete.method().to_string(), "DELETE");
        assert_eq!(delete.url(), "/store/products/A");
        respond_json(delete, 200, "{}");

        let refresh = server.recv().expect("refresh");
        assert_eq!(refresh.method().to_string(), "GET");
        respond_json(refresh, 200, &only_b.to_string());
    });

    let transport = HttpTransport::new(&addr, Duration::from_secs(2))?;
    let mut sync = SyncController::new(product_schema(), COLLECTION_PATH, transport);
    sync.list()?;
    assert_eq!(sync.collection().len(), 2);

    sync.delete(&EntityId::from("A"))?;
    let ids: Vec<&str> = sync
        .collection()
        .entities()
        .iter()
        .map(|entity| entity.id().as_str())
        .collect();
    assert_eq!(ids, vec!["B"]);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn base_url_path_prefix_reaches_the_server() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/shop/store/products/");
        respond_json(request, 200, "[]");
    });

    let mut transport = HttpTransport::new(&format!("{addr}/shop"), Duration::from_secs(2))?;
    let reply = transport.send(&RemoteCall {
        method: Method::Get,
        path: COLLECTION_PATH.to_owned(),
        body: None,
    })?;
    assert_eq!(reply.status, 200);

    handle.join().expect("server thread should join");
    Ok(())
}
