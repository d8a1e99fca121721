//! Shared setup for gem-market-service integration tests.
//!
//! Every test drives the full router with in-memory repositories, a recording
//! OTP notifier and a throwaway uploads directory.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use gem_market_service::{
    build_router,
    config::{
        AdminConfig, GemMarketConfig, MongoConfig, OtpConfig, RateLimitConfig, StorageConfig,
    },
    services::{LocalStorage, RecordingOtpNotifier, Repositories},
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const ADMIN_SECRET: &str = "test-admin-secret";
pub const BOUNDARY: &str = "gem-market-test-boundary";

pub fn test_config(storage_dir: &str) -> GemMarketConfig {
    GemMarketConfig {
        common: service_core::config::Config {
            port: 0,
            log_level: "error".to_string(),
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "gem_market_test".to_string(),
        },
        storage: StorageConfig {
            local_path: storage_dir.to_string(),
            max_upload_bytes: 64 * 1024,
        },
        admin: AdminConfig {
            secret: Secret::new(ADMIN_SECRET.to_string()),
            jwt_secret: Secret::new("test-jwt-secret".to_string()),
            session_ttl_seconds: 3600,
            allow_legacy_secret: true,
        },
        otp: OtpConfig {
            ttl_seconds: 300,
            max_attempts: 5,
            expose_in_response: false,
        },
        rate_limit: RateLimitConfig { per_minute: 1000 },
        cors_allowed_origin: None,
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub notifier: Arc<RecordingOtpNotifier>,
    pub storage_dir: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut GemMarketConfig)) -> Self {
        let storage_dir = std::env::temp_dir().join(format!("gem-market-test-{}", Uuid::new_v4()));
        let mut config = test_config(storage_dir.to_str().expect("temp dir is utf-8"));
        customize(&mut config);

        let storage = LocalStorage::new(&storage_dir)
            .await
            .expect("Failed to create test storage");
        let notifier = Arc::new(RecordingOtpNotifier::new());

        let state = AppState::new(
            config,
            Repositories::in_memory(),
            None,
            Arc::new(storage),
            notifier.clone(),
        );

        TestApp {
            router: build_router(state.clone()),
            state,
            notifier,
            storage_dir,
        }
    }

    /// Send a request and decode the body as JSON (`Null` when empty or not JSON).
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        self.call(build(Method::GET, uri, headers, None, Body::empty()))
            .await
    }

    pub async fn delete(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        self.call(build(Method::DELETE, uri, headers, None, Body::empty()))
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        self.call(build(
            method,
            uri,
            headers,
            Some("application/json"),
            Body::from(body.to_string()),
        ))
        .await
    }

    pub async fn send_multipart(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.call(build(
            Method::POST,
            uri,
            headers,
            Some(&content_type),
            Body::from(multipart_body(parts)),
        ))
        .await
    }

    /// Raw response for endpoints that do not return JSON.
    pub async fn get_raw(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(build(Method::GET, uri, &[], None, Body::empty()))
            .await
            .expect("router is infallible")
    }

    /// A bearer token obtained through the admin session endpoint.
    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .call(build(
                Method::POST,
                "/api/admin/session",
                &[("x-admin-secret", ADMIN_SECRET)],
                None,
                Body::empty(),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "admin session failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub fn admin() -> [(&'static str, &'static str); 1] {
    [("x-admin-secret", ADMIN_SECRET)]
}

fn build(
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    content_type: Option<&str>,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body).expect("valid request")
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
