#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use foodsaving::app::{app, AppState};
use foodsaving::auth::token_for_user;
use foodsaving::testing::TestContext;

/// Router over an in-memory datastore with a pinned clock
pub struct TestApp {
    pub ctx: TestContext,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let ctx = TestContext::new();
        let router = app(AppState::new(ctx.models.clone()));
        Self { ctx, router }
    }

    /// Send a request as `user` (anonymous when `None`) and decode the JSON body
    pub async fn request(&self, method: Method, uri: &str, user: Option<i64>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            let token = token_for_user(user).context("issuing token")?;
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response is not JSON")?
        };
        Ok((status, json))
    }

    pub async fn get(&self, uri: &str, user: i64) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: i64, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: i64, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: i64) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, Some(user), None).await
    }
}
