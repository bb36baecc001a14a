//! Type definitions for the GraphQL HTTP handler

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::{Cursor, Read};

/// Raw GraphQL document body
pub const CONTENT_TYPE_GRAPHQL: &str = "application/graphql";

/// JSON body, also the fallback for unknown or missing content types
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// URL-encoded form body
pub const CONTENT_TYPE_FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Multipart form body carrying `operations`, `map` and file parts
pub const CONTENT_TYPE_MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Prefix of the variable value that stands in for an uploaded file.
///
/// async-graphql's `Upload` scalar resolves `#__graphql_file__:<n>` to the
/// n-th entry of the request's upload list.
pub const UPLOAD_REF_PREFIX: &str = "#__graphql_file__:";

/// Variables of a GraphQL request
pub type Variables = serde_json::Map<String, Value>;

/// GraphQL request from client
///
/// Every transport encoding is normalized into this shape before it reaches
/// the engine. The default value (empty query) is what malformed requests
/// collapse into.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    /// GraphQL query string
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,

    /// Operation name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// Variables for the query
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Variables,

    /// Files referenced from `variables` by upload marker
    #[serde(skip)]
    pub uploads: Vec<UploadedFile>,
}

impl GraphQLRequest {
    /// Create a request for the given query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the operation name
    pub fn operation_name(self, operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: Some(operation_name.into()),
            ..self
        }
    }

    /// Replace the variables
    pub fn variables(self, variables: Variables) -> Self {
        Self { variables, ..self }
    }

    /// Whether this is the empty request malformed input collapses into
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
            && self.operation_name.is_none()
            && self.variables.is_empty()
            && self.uploads.is_empty()
    }

    /// Resolve a variable value to the upload it references, if any
    pub fn upload_for(&self, value: &Value) -> Option<&UploadedFile> {
        let index = value.as_str().and_then(parse_upload_marker)?;
        self.uploads.get(index)
    }
}

/// A file part received in a multipart request
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Multipart field the file arrived under
    pub field_name: String,

    /// Client-supplied file name
    pub filename: Option<String>,

    /// Declared content type of the part
    pub content_type: Option<String>,

    /// File content
    pub content: Bytes,
}

impl UploadedFile {
    /// Size of the content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Read the content
    pub fn reader(&self) -> impl Read + '_ {
        Cursor::new(self.content.as_ref())
    }
}

/// Variable value referencing the upload at `index`
pub fn upload_marker(index: usize) -> Value {
    Value::String(format!("{UPLOAD_REF_PREFIX}{index}"))
}

/// Upload index carried by a marker string
pub fn parse_upload_marker(marker: &str) -> Option<usize> {
    marker.strip_prefix(UPLOAD_REF_PREFIX)?.parse().ok()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
