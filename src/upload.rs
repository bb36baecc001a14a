//! Splicing multipart file parts into GraphQL variables.
//!
//! A multipart GraphQL request carries its JSON document in the `operations`
//! field with placeholder values where files belong, and a `map` field naming,
//! for each file part, the dot-separated paths the file must be placed at:
//!
//! ```text
//! operations: {"query": "...", "variables": {"files": [null, null]}}
//! map:        {"0": ["variables.files.0"], "1": ["variables.files.1"]}
//! ```
//!
//! Paths are resolved against the live shape of the document. A segment is an
//! object key or an array index depending on the node it is applied to, and no
//! intermediate node is ever created. Any path that fails to resolve fails the
//! whole injection.

use crate::error::InjectError;
use crate::types::{upload_marker, GraphQLRequest, UploadedFile, Variables};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Field name that selects the variables at the top of a path
const VARIABLES_FIELD: &str = "variables";

/// The decoded `map` field: file part name to the paths it fills
pub type UploadMap = BTreeMap<String, Vec<String>>;

/// Attach every file named in `map` at each of its paths.
///
/// Files are moved into `request.uploads` and the target leaves are replaced
/// with upload markers. `map` entries without a matching file are skipped and
/// files no entry names are dropped. The request is consumed so that a failing
/// path leaves nothing half-applied behind.
pub fn inject_uploads(
    mut request: GraphQLRequest,
    map: &UploadMap,
    mut files: HashMap<String, UploadedFile>,
) -> Result<GraphQLRequest, InjectError> {
    for (field_name, paths) in map {
        if paths.is_empty() {
            continue;
        }
        let Some(file) = files.remove(field_name) else {
            trace!(field = %field_name, "no file part for map entry");
            continue;
        };

        let index = request.uploads.len();
        request.uploads.push(file);

        for path in paths {
            set_path(&mut request.variables, path, upload_marker(index))?;
            trace!(field = %field_name, path = %path, index, "attached upload");
        }
    }

    Ok(request)
}

/// Store `value` at `path`, walking from the request root.
pub fn set_path(variables: &mut Variables, path: &str, value: Value) -> Result<(), InjectError> {
    if path.is_empty() {
        return Err(InjectError::EmptyPath);
    }

    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().ok_or(InjectError::EmptyPath)?;

    let mut node = Node::Root(variables);
    for segment in segments {
        node = node.child(segment)?;
    }
    node.assign(last, value)
}

/// Position reached while walking a path
enum Node<'a> {
    /// The request itself; only `variables` can be selected
    Root(&'a mut Variables),
    Object(&'a mut Map<String, Value>),
    Array(&'a mut Vec<Value>),
    /// Scalar or null
    Leaf,
    /// Key absent from its parent object
    Missing,
}

impl<'a> Node<'a> {
    fn from_value(value: Option<&'a mut Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Node::Object(map),
            Some(Value::Array(items)) => Node::Array(items),
            Some(_) => Node::Leaf,
            None => Node::Missing,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Leaf => "leaf",
            Node::Missing => "missing",
        }
    }

    fn child(self, segment: &str) -> Result<Node<'a>, InjectError> {
        match self {
            Node::Root(variables) if segment == VARIABLES_FIELD => Ok(Node::Object(variables)),
            Node::Root(_) => Err(InjectError::UnknownRootField(segment.to_string())),
            Node::Object(map) => Ok(Node::from_value(map.get_mut(segment))),
            Node::Array(items) => {
                let index = parse_index(segment)?;
                let len = items.len();
                items
                    .get_mut(index)
                    .map(|item| Node::from_value(Some(item)))
                    .ok_or(InjectError::IndexOutOfBounds { index, len })
            }
            node @ (Node::Leaf | Node::Missing) => Err(InjectError::NotTraversable {
                segment: segment.to_string(),
                kind: node.kind(),
            }),
        }
    }

    fn assign(self, segment: &str, value: Value) -> Result<(), InjectError> {
        match self {
            Node::Object(map) => {
                map.insert(segment.to_string(), value);
                Ok(())
            }
            Node::Array(items) => {
                let index = parse_index(segment)?;
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or(InjectError::IndexOutOfBounds { index, len })?;
                *slot = value;
                Ok(())
            }
            node => Err(InjectError::NotTraversable {
                segment: segment.to_string(),
                kind: node.kind(),
            }),
        }
    }
}

fn parse_index(segment: &str) -> Result<usize, InjectError> {
    segment
        .parse()
        .map_err(|_| InjectError::InvalidIndex(segment.to_string()))
}
