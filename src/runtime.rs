//! Runtime support for the GraphQL handler - axum integration.

use crate::config::HandlerConfig;
use crate::executor::{Context, Executor};
use crate::request::parse_request;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::any,
    Router,
};
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;
use url::form_urlencoded;

/// Content type of every executed response
pub const JSON_RESPONSE_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// GraphQLHandler - HTTP front of a GraphQL engine
///
/// Decodes the incoming request, runs it through the [`Executor`] and writes
/// the result back as JSON. It can be converted into an Axum router.
pub struct GraphQLHandler<E> {
    executor: Arc<E>,
    config: HandlerConfig,
}

impl<E: Executor> GraphQLHandler<E> {
    /// Create a new handler around an engine
    pub fn new(executor: E, config: HandlerConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            config,
        }
    }

    /// Access the engine
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Access the configuration
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle GraphQL HTTP request
    ///
    /// This method runs the request pipeline:
    /// 1. Serves the playground to browsers when enabled
    /// 2. Decodes the GraphQL request from the URL or body
    /// 3. Executes it with a context built from the request
    /// 4. Serializes the result
    pub async fn handle_http(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();

        if self.config.playground && wants_playground(&parts) {
            return graphql_playground(&self.config.path).into_response();
        }

        let ctx = Context::from_parts(&parts);
        let gql_request = parse_request(&parts, body, &self.config).await;
        let result = self.executor.execute(ctx, gql_request).await;

        json_response(&result)
    }

    /// Convert to Axum router
    pub fn into_router(self) -> Router {
        let path = self.config.path.clone();
        let state = Arc::new(self);

        Router::new()
            .route(&path, any(handle_graphql::<E>))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

impl<E> Clone for GraphQLHandler<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
        }
    }
}

/// Handler for every request to the GraphQL route
async fn handle_graphql<E: Executor>(
    State(handler): State<Arc<GraphQLHandler<E>>>,
    request: Request<Body>,
) -> Response {
    handler.handle_http(request).await
}

/// Browsers asking for HTML get the playground unless `?raw` is set.
fn wants_playground(parts: &Parts) -> bool {
    let raw = parts
        .uri
        .query()
        .is_some_and(|q| form_urlencoded::parse(q.as_bytes()).any(|(key, _)| key == "raw"));
    let accept = parts
        .headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    !raw && !accept.contains("application/json") && accept.contains("text/html")
}

/// Serve the GraphQL Playground UI for ad-hoc exploration.
fn graphql_playground(endpoint: &str) -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new(endpoint),
    ))
}

fn json_response<T: Serialize>(result: &T) -> Response {
    match serde_json::to_vec(result) {
        Ok(body) => ([(CONTENT_TYPE, JSON_RESPONSE_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to serialize GraphQL response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::tests::{multipart_body, multipart_content_type};
    use crate::schema::ping_schema;
    use crate::types::GraphQLRequest;
    use axum::{body::to_bytes, http::Method};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn build_router(playground: bool) -> Router {
        let schema = ping_schema().expect("schema builds");
        let config = HandlerConfig {
            playground,
            ..Default::default()
        };

        GraphQLHandler::new(schema, config).into_router()
    }

    async fn send(app: Router, request: Request) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app.oneshot(request).await.expect("receive response");
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().expect("ascii header").to_string());
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        (status, content_type, body.to_vec())
    }

    async fn execute(request: Request) -> Value {
        let (status, content_type, body) = send(build_router(false), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(JSON_RESPONSE_CONTENT_TYPE));
        serde_json::from_slice(&body).expect("json body")
    }

    fn post(content_type: Option<&str>, body: impl Into<Body>) -> Request {
        let mut builder = http::Request::builder().method(Method::POST).uri("/graphql");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(body.into()).expect("build request")
    }

    #[tokio::test]
    async fn every_encoding_executes_the_same_query() {
        let json_body = serde_json::to_string(&json!({
            "query": "query Test { ping }",
            "operationName": "Test",
            "variables": { "echo": "test" }
        }))
        .unwrap();
        let string_variables_body = serde_json::to_string(&json!({
            "query": "query Test { ping }",
            "operationName": "Test",
            "variables": "{ \"echo\": \"test\" }"
        }))
        .unwrap();

        let requests = vec![
            post(Some("application/graphql"), "query { ping }"),
            http::Request::builder()
                .uri(
                    "/graphql?query=query%20Test%20%7B%20ping%20%7D&operationName=Test\
                     &variables=%7B%22echo%22%3A%20%22test%22%7D",
                )
                .body(Body::empty())
                .unwrap(),
            post(Some("application/json"), json_body.clone()),
            post(None, json_body),
            post(None, string_variables_body),
        ];

        for request in requests {
            let body = execute(request).await;
            assert!(body.get("errors").is_none(), "unexpected errors: {body}");
            assert_eq!(body["data"], json!({ "ping": "pong" }));
        }
    }

    #[tokio::test]
    async fn variables_reach_the_engine() {
        let body = execute(post(
            Some("application/json"),
            r#"{"query":"query Echo($value: String!) { echo(value: $value) }","variables":{"value":"hi"}}"#,
        ))
        .await;

        assert_eq!(body["data"]["echo"], "hi");
    }

    #[tokio::test]
    async fn malformed_requests_are_graphql_errors() {
        let requests = vec![
            post(Some("application/json"), "{not json"),
            post(Some("application/x-www-form-urlencoded"), "operationName=Test"),
            http::Request::builder()
                .method(Method::DELETE)
                .uri("/graphql")
                .body(Body::empty())
                .unwrap(),
            post(
                Some(multipart_content_type().as_str()),
                multipart_body(&[
                    ("operations", None, r#"{"query":"{ ping }","variables":{}}"#),
                    ("map", None, r#"{"0":["variables.nope.file"]}"#),
                    ("0", Some("a.txt"), "content"),
                ]),
            ),
        ];

        for request in requests {
            let body = execute(request).await;
            assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()), "{body}");
        }
    }

    #[tokio::test]
    async fn multipart_upload_reaches_resolver() {
        let body = multipart_body(&[
            (
                "operations",
                None,
                r#"{"query":"mutation ($file: Upload!) { upload(file: $file) }","variables":{"file":null}}"#,
            ),
            ("map", None, r#"{"0":["variables.file"]}"#),
            ("0", Some("test.txt"), "file content"),
        ]);

        let body = execute(post(Some(multipart_content_type().as_str()), body)).await;

        assert!(body.get("errors").is_none(), "unexpected errors: {body}");
        assert_eq!(body["data"]["upload"], "test.txt:file content");
    }

    #[tokio::test]
    async fn playground_served_to_browsers() {
        let request = http::Request::builder()
            .uri("/graphql")
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .body(Body::empty())
            .expect("build request");
        let (status, _, body) = send(build_router(true), request).await;

        assert_eq!(status, StatusCode::OK);
        let body_str = String::from_utf8(body).expect("utf8 body");
        assert!(
            body_str.contains("GraphQL Playground"),
            "playground HTML should be returned"
        );
    }

    #[tokio::test]
    async fn playground_skipped_for_raw_or_json_or_when_disabled() {
        let raw = http::Request::builder()
            .uri("/graphql?raw&query=%7B%20ping%20%7D")
            .header(ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let json_too = http::Request::builder()
            .uri("/graphql?query=%7B%20ping%20%7D")
            .header(ACCEPT, "text/html, application/json")
            .body(Body::empty())
            .unwrap();

        for request in [raw, json_too] {
            let (status, content_type, _) = send(build_router(true), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some(JSON_RESPONSE_CONTENT_TYPE));
        }

        let disabled = http::Request::builder()
            .uri("/graphql?query=%7B%20ping%20%7D")
            .header(ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let (_, content_type, _) = send(build_router(false), disabled).await;
        assert_eq!(content_type.as_deref(), Some(JSON_RESPONSE_CONTENT_TYPE));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize"))
        }
    }

    struct BrokenEngine;

    #[async_trait::async_trait]
    impl Executor for BrokenEngine {
        type Response = Unserializable;

        async fn execute(&self, _ctx: Context, _request: GraphQLRequest) -> Self::Response {
            Unserializable
        }
    }

    #[tokio::test]
    async fn serialization_failure_is_500() {
        let app = GraphQLHandler::new(BrokenEngine, HandlerConfig::default()).into_router();
        let (status, _, body) = send(app, post(Some("application/graphql"), "{ ping }")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }
}
