//! Boundary between the HTTP handler and the GraphQL engine.

use crate::types::{GraphQLRequest, UploadedFile};
use async_graphql::{ObjectType, ServerError, SubscriptionType, UploadValue};
use axum::http::{request::Parts, Extensions, HeaderMap, Method, Uri};
use serde::Serialize;
use std::io::{Seek, SeekFrom, Write};
use tracing::warn;

/// Context passed to the engine
///
/// Carries everything from the original HTTP request except its body, which
/// has already been decoded into the [`GraphQLRequest`].
#[derive(Debug, Clone)]
pub struct Context {
    /// Request method
    pub method: Method,

    /// Request URI
    pub uri: Uri,

    /// Request headers
    pub headers: HeaderMap,

    /// Extensions added by earlier layers
    pub extensions: Extensions,
}

impl Context {
    /// Create a new context from request parts
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            extensions: parts.extensions.clone(),
        }
    }
}

/// A GraphQL engine the handler can drive
///
/// Whatever the engine returns is serialized as the JSON response body, so
/// errors for empty or invalid queries belong inside the response value.
///
/// # Example
///
/// ```rust
/// use graphql_http_handler::{Context, Executor, GraphQLRequest};
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Executor for Echo {
///     type Response = serde_json::Value;
///
///     async fn execute(&self, _ctx: Context, request: GraphQLRequest) -> Self::Response {
///         serde_json::json!({ "data": { "query": request.query } })
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Result of executing one request
    type Response: Serialize + Send;

    /// Execute the request
    async fn execute(&self, ctx: Context, request: GraphQLRequest) -> Self::Response;
}

#[async_trait::async_trait]
impl Executor for async_graphql::dynamic::Schema {
    type Response = async_graphql::Response;

    async fn execute(&self, ctx: Context, request: GraphQLRequest) -> Self::Response {
        match into_engine_request(request) {
            Ok(request) => async_graphql::dynamic::Schema::execute(self, request.data(ctx)).await,
            Err(err) => upload_failure(err),
        }
    }
}

#[async_trait::async_trait]
impl<Query, Mutation, Subscription> Executor for async_graphql::Schema<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    type Response = async_graphql::Response;

    async fn execute(&self, ctx: Context, request: GraphQLRequest) -> Self::Response {
        match into_engine_request(request) {
            Ok(request) => async_graphql::Schema::execute(self, request.data(ctx)).await,
            Err(err) => upload_failure(err),
        }
    }
}

/// Convert a decoded request into an async-graphql request.
///
/// Upload markers in the variables are left as they are; async-graphql
/// resolves them against `uploads`, which receives every file spooled to an
/// anonymous temporary file.
pub fn into_engine_request(request: GraphQLRequest) -> std::io::Result<async_graphql::Request> {
    let variables =
        async_graphql::Variables::from_json(serde_json::Value::Object(request.variables));
    let mut engine_request = async_graphql::Request::new(request.query).variables(variables);

    if let Some(operation_name) = request.operation_name {
        engine_request = engine_request.operation_name(operation_name);
    }

    engine_request.uploads = request
        .uploads
        .into_iter()
        .map(spool_upload)
        .collect::<std::io::Result<_>>()?;

    Ok(engine_request)
}

fn spool_upload(file: UploadedFile) -> std::io::Result<UploadValue> {
    let mut content = tempfile::tempfile()?;
    content.write_all(&file.content)?;
    content.seek(SeekFrom::Start(0))?;

    Ok(UploadValue {
        filename: file.filename.unwrap_or_default(),
        content_type: file.content_type,
        content,
    })
}

fn upload_failure(err: std::io::Error) -> async_graphql::Response {
    warn!(error = %err, "failed to buffer uploaded file");
    async_graphql::Response::from_errors(vec![ServerError::new(
        format!("failed to buffer uploaded file: {err}"),
        None,
    )])
}
