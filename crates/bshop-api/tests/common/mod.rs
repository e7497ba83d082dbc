//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bshop_api::state::AppState;
use bshop_api::vault::MemoryKeyVault;
use bshop_chain::StaticAccessOracle;
use bshop_core::{download_message, ContentId, EvmAddress};
use bshop_storage::{GatewayConfig, GatewayFetcher, MemoryObjectStore, ObjectFetcher};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::MockServer;

/// Well-known development account #0 (Hardhat/Anvil).
pub const BUYER_KEY: [u8; 32] = [
    0xac, 0x09, 0x74, 0xbe, 0xc3, 0x9a, 0x17, 0xe3, 0x6b, 0xa4, 0xa6, 0xb4, 0xd2, 0x38, 0xff, 0x94,
    0x4b, 0xac, 0xb4, 0x78, 0xcb, 0xed, 0x5e, 0xfc, 0xae, 0x78, 0x4d, 0x7b, 0xf4, 0xf2, 0xff, 0x80,
];
pub const BUYER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const BUYER_CHECKSUMMED: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// A second account with no purchases.
pub const STRANGER_KEY: [u8; 32] = [0x42; 32];

pub fn cid(s: &str) -> ContentId {
    ContentId::new(s).unwrap()
}

pub fn buyer() -> EvmAddress {
    EvmAddress::parse(BUYER).unwrap()
}

pub fn sign(key: &[u8; 32], message: &str) -> String {
    bshop_crypto::sign_message(key, message).unwrap()
}

pub fn sign_download(key: &[u8; 32], content_id: &str) -> String {
    sign(key, &download_message(&cid(content_id)))
}

pub fn stranger() -> EvmAddress {
    bshop_crypto::address_from_secret(&STRANGER_KEY).unwrap()
}

/// Collaborators a test can reach into after building state.
pub struct Harness {
    pub vault: Arc<MemoryKeyVault>,
    pub oracle: Arc<StaticAccessOracle>,
    pub state: AppState,
}

impl Harness {
    pub fn with_fetcher(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        let vault = Arc::new(MemoryKeyVault::new());
        let oracle = Arc::new(StaticAccessOracle::new());
        let state = AppState::new(vault.clone(), oracle.clone(), fetcher);
        Self {
            vault,
            oracle,
            state,
        }
    }

    pub fn with_gateway(server: &MockServer) -> Self {
        let fetcher = GatewayFetcher::new(GatewayConfig::new(server.uri()).with_timeout_secs(5))
            .expect("gateway fetcher");
        Self::with_fetcher(Arc::new(fetcher))
    }

    pub fn with_store(store: Arc<MemoryObjectStore>) -> Self {
        Self::with_fetcher(store)
    }

    pub fn grant(&self, content_id: &str) {
        self.oracle.grant(buyer(), cid(content_id));
    }

    pub fn app(&self) -> Router {
        bshop_api::app(self.state.clone())
    }
}

pub fn download_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn signed_download(content_id: &str, address: &str, signature: &str) -> Request<Body> {
    download_request(
        &format!("/download/{content_id}"),
        serde_json::json!({ "address": address, "signature": signature }),
    )
}

pub async fn send(app: Router, req: Request<Body>) -> Response {
    app.oneshot(req).await.unwrap()
}

pub async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_string(resp: Response) -> String {
    String::from_utf8(body_bytes(resp).await).unwrap()
}

pub async fn assert_plain(resp: Response, status: StatusCode, body: &str) {
    assert_eq!(resp.status(), status);
    assert_eq!(body_string(resp).await, body);
}

const BOUNDARY: &str = "bshop-test-boundary";

/// Multipart body with one part named `field`.
pub fn multipart_request(field: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
