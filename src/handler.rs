//! Handler builder and server start-up

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::runtime::GraphQLHandler;

impl<E: Executor> GraphQLHandler<E> {
    /// Create a new handler builder
    pub fn builder() -> HandlerBuilder<E> {
        HandlerBuilder::new()
    }
}

/// Builder for creating a GraphQLHandler
pub struct HandlerBuilder<E> {
    executor: Option<E>,
    config: HandlerConfig,
}

impl<E: Executor> HandlerBuilder<E> {
    /// Create a new handler builder
    pub fn new() -> Self {
        Self {
            executor: None,
            config: HandlerConfig::default(),
        }
    }

    /// Set the engine requests are executed with
    pub fn executor(mut self, executor: E) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    /// Route the handler is mounted on
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Serve GraphQL Playground to browsers
    pub fn enable_playground(mut self) -> Self {
        self.config.playground = true;
        self
    }

    /// Limit for non-multipart bodies
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.config.max_body_size = bytes;
        self
    }

    /// Limit for multipart bodies
    pub fn max_multipart_size(mut self, bytes: usize) -> Self {
        self.config.max_multipart_size = bytes;
        self
    }

    /// Build the handler
    pub fn build(self) -> Result<GraphQLHandler<E>> {
        let executor = self
            .executor
            .ok_or_else(|| Error::Config("an executor is required".into()))?;

        if !self.config.path.starts_with('/') {
            return Err(Error::Config(format!(
                "path must start with `/`, got `{}`",
                self.config.path
            )));
        }

        Ok(GraphQLHandler::new(executor, self.config))
    }

    /// Build and start the handler server
    pub async fn serve(self, addr: impl Into<String>) -> Result<()> {
        let handler = self.build()?;
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(
            path = %handler.config().path,
            playground = handler.config().playground,
            "GraphQL handler listening on {}",
            addr
        );

        let app = handler.into_router();
        axum::serve(listener, app).await?;

        Ok(())
    }
}

impl<E: Executor> Default for HandlerBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
