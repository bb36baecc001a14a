//! # graphql-http-handler
//!
//! An HTTP front for GraphQL engines built on Axum. Every common way of sending
//! a GraphQL request over HTTP is decoded into one [`GraphQLRequest`], executed
//! by an [`Executor`], and answered with the JSON-encoded result.
//!
//! ## Features
//!
//! - **URL query strings**: `?query=...&operationName=...&variables=...` on any method
//! - **Raw documents**: `application/graphql` bodies
//! - **Forms**: `application/x-www-form-urlencoded` bodies
//! - **File uploads**: `multipart/form-data` with `operations` and `map` fields
//! - **JSON**: `application/json` (and any other content type), including
//!   clients that send `variables` as a JSON-encoded string
//! - **Playground**: optional GraphQL Playground for browsers
//!
//! Malformed requests are never rejected at the HTTP level. They decode to an
//! empty request and the engine answers with a GraphQL error, so every executed
//! request gets a `200` with a JSON body.
//!
//! ## Main Components
//!
//! - [`GraphQLHandler`]: Axum handler and router.
//! - [`HandlerBuilder`]: Configuration builder for the handler.
//! - [`Executor`]: The engine seam, implemented for async-graphql schemas.
//! - [`parse_request`]: The request decoder on its own.
//! - [`inject_uploads`]: Splices multipart files into request variables.
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphql_http_handler::{schema::ping_schema, GraphQLHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     GraphQLHandler::builder()
//!         .executor(ping_schema()?)
//!         .enable_playground()
//!         .serve("0.0.0.0:8080")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
pub mod request;
pub mod runtime;
pub mod schema;
pub mod types;
pub mod upload;

pub use config::HandlerConfig;
pub use error::{Error, InjectError, Result};
pub use executor::{into_engine_request, Context, Executor};
pub use handler::HandlerBuilder;
pub use request::parse_request;
pub use runtime::GraphQLHandler;
pub use types::{GraphQLRequest, UploadedFile, Variables};
pub use upload::{inject_uploads, UploadMap};
