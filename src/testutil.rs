// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Shared test helpers: stub provisioner servers on ephemeral ports.

use std::time::Duration;

use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::net::TcpListener;

use crate::client::ProvisionerClient;
use crate::config::ClientConfig;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A client pointed at a stub server, with a short timeout so failure tests
/// stay fast.
pub fn stub_client(base_url: String) -> ProvisionerClient {
    ProvisionerClient::new(ClientConfig::new(base_url).with_timeout(Duration::from_secs(2)))
        .expect("stub client")
}

/// A client pointed at a port nothing is listening on.
pub async fn unreachable_client() -> ProvisionerClient {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    ProvisionerClient::new(
        ClientConfig::new(format!("http://{addr}")).with_timeout(Duration::from_secs(2)),
    )
    .expect("unreachable client")
}

/// Build an unsigned three-segment token whose payload is `payload` (JSON).
pub fn make_token(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
    format!("{header}.{body}.fake_signature")
}
