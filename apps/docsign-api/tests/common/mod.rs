//! Shared helpers for the HTTP integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Duration;
use docsign_api::auth::issue_token;
use docsign_api::config::Config;
use docsign_api::state::AppState;
use docsign_api::app;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shared_types::UserDetails;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _exports: TempDir,
}

/// A signed-in caller
pub struct Caller {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Development app with adjusted configuration
pub async fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let exports = tempfile::tempdir().unwrap();
    let mut config = Config {
        exports_dir: exports.path().to_path_buf(),
        ..Config::default()
    };
    configure(&mut config);
    let state = Arc::new(AppState::new(config).await.unwrap());
    TestApp {
        router: app(state.clone()),
        state,
        _exports: exports,
    }
}

impl TestApp {
    pub fn caller(&self, id: &str, name: &str, email: &str) -> Caller {
        let user = UserDetails {
            object_id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            company: None,
        };
        let token = issue_token(&user, &self.state.config.jwt_secret, Duration::hours(1)).unwrap();
        Caller {
            id: id.into(),
            email: email.into(),
            token,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_with_headers(method, uri, caller, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(caller) = caller {
            builder = builder.header("authorization", format!("Bearer {}", caller.token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    pub async fn post(&self, uri: &str, caller: &Caller, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(caller), Some(body)).await
    }

    pub async fn put(&self, uri: &str, caller: &Caller, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(caller), Some(body)).await
    }

    pub async fn get(&self, uri: &str, caller: &Caller) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(caller), None).await
    }

    /// Raw response for a GET, used for binary downloads
    pub async fn get_raw(&self, uri: &str, caller: &Caller) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", caller.token))
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    /// Create a signer contact owned by `owner` and return its id
    pub async fn contact(&self, owner: &Caller, name: &str, email: &str) -> String {
        self.contact_as(owner, name, email, "signer").await
    }

    /// Create a contact with the given role and return its id
    pub async fn contact_as(&self, owner: &Caller, name: &str, email: &str, role: &str) -> String {
        let (status, body) = self
            .post(
                "/contacts",
                owner,
                json!({ "name": name, "email": email, "user_role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["contact"]["id"].as_str().unwrap().to_string()
    }

    /// Create a document with the given signers and return its id
    pub async fn document(&self, owner: &Caller, name: &str, signers: &[&str]) -> String {
        let (status, body) = self
            .post(
                "/documents/after-save",
                owner,
                json!({ "name": name, "url": "/uploads/original.pdf", "signers": signers }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["document"]["id"].as_str().unwrap().to_string()
    }

    pub async fn sign(&self, caller: &Caller, document_id: &str, user_id: &str) -> (StatusCode, Value) {
        self.post(
            "/documents/save-pdf",
            caller,
            json!({
                "documentId": document_id,
                "pdfFile": pdf_base64(),
                "userId": user_id,
                "signature": signature_data_url(),
            }),
        )
        .await
    }
}

pub fn pdf_base64() -> String {
    BASE64.encode(shared_pdf::testing::sample_pdf(1))
}

pub fn signature_data_url() -> String {
    format!(
        "data:image/png;base64,{}",
        BASE64.encode(shared_pdf::testing::sample_png())
    )
}

/// Path part of an exported artifact URL
pub fn export_path(url: &str) -> String {
    let start = url.find("/exports/").expect("export URL");
    url[start..].to_string()
}
