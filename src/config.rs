//! Handler configuration.

use serde::{Deserialize, Serialize};

/// Multipart ceiling and default body limit: 16 MiB
pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;

/// Settings for the GraphQL HTTP handler.
///
/// Every field has a default, so partial configuration files deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Route the handler is mounted on
    pub path: String,

    /// Serve GraphQL Playground to browsers
    pub playground: bool,

    /// Largest accepted non-multipart body, in bytes
    pub max_body_size: usize,

    /// Largest accepted multipart body (all parts together), in bytes
    pub max_multipart_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            path: "/graphql".to_string(),
            playground: false,
            max_body_size: DEFAULT_MAX_SIZE,
            max_multipart_size: DEFAULT_MAX_SIZE,
        }
    }
}
