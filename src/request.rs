//! Decoding GraphQL requests from every supported HTTP encoding.
//!
//! The URL query string is consulted first for any method. Otherwise only
//! `POST` bodies are decoded, with the strategy chosen by `Content-Type`:
//!
//! | content type                        | body                                   |
//! |-------------------------------------|----------------------------------------|
//! | `application/graphql`               | the query document itself              |
//! | `application/x-www-form-urlencoded` | `query`, `operationName`, `variables`  |
//! | `multipart/form-data`               | `operations`, `map` and file parts     |
//! | `application/json` or anything else | request object                         |
//!
//! Decoding never fails outward. A request that cannot be decoded becomes
//! [`GraphQLRequest::default`], which the engine rejects with a regular
//! GraphQL error.

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::types::{
    GraphQLRequest, UploadedFile, Variables, CONTENT_TYPE_FORM_URL_ENCODED, CONTENT_TYPE_GRAPHQL,
    CONTENT_TYPE_JSON, CONTENT_TYPE_MULTIPART_FORM_DATA,
};
use crate::upload::{inject_uploads, UploadMap};
use axum::body::{Body, Bytes, HttpBody};
use axum::http::{request::Parts, HeaderMap, Method};
use http::header::CONTENT_TYPE;
use multer::{Constraints, Multipart, SizeLimit};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};
use url::form_urlencoded;

/// Decode the GraphQL request carried by an HTTP request.
///
/// Only the body is consumed; `parts` stays available to build the execution
/// context.
pub async fn parse_request(parts: &Parts, body: Body, config: &HandlerConfig) -> GraphQLRequest {
    match try_parse_request(parts, body, config).await {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, code = err.code(), "using empty GraphQL request");
            GraphQLRequest::default()
        }
    }
}

async fn try_parse_request(
    parts: &Parts,
    body: Body,
    config: &HandlerConfig,
) -> Result<GraphQLRequest> {
    if let Some(request) = parts.uri.query().and_then(|q| from_form(q.as_bytes())) {
        trace!("GraphQL request from URL query string");
        return Ok(request);
    }

    if parts.method != Method::POST {
        return Err(Error::InvalidRequest(format!(
            "{} request without a query parameter",
            parts.method
        )));
    }

    if body.is_end_stream() {
        return Err(Error::InvalidRequest("empty request body".into()));
    }

    let content_type = header_str(&parts.headers, CONTENT_TYPE.as_str());
    let mime = media_type(content_type);
    trace!(media_type = %mime, "decoding GraphQL request body");

    match mime.as_str() {
        CONTENT_TYPE_GRAPHQL => {
            let body = read_body(body, config.max_body_size).await?;
            let query = String::from_utf8(body.to_vec())
                .map_err(|err| Error::InvalidRequest(format!("GraphQL body is not UTF-8: {err}")))?;
            Ok(GraphQLRequest::new(query))
        }
        CONTENT_TYPE_FORM_URL_ENCODED => {
            let body = read_body(body, config.max_body_size).await?;
            from_form(&body).ok_or_else(|| Error::InvalidRequest("form has no query".into()))
        }
        CONTENT_TYPE_MULTIPART_FORM_DATA => {
            from_multipart(content_type, body, config.max_multipart_size).await
        }
        other => {
            if other != CONTENT_TYPE_JSON {
                trace!(media_type = %other, "decoding body as JSON");
            }
            let body = read_body(body, config.max_body_size).await?;
            from_json(&body)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Media type of a `Content-Type` value, without parameters
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    Ok(axum::body::to_bytes(body, limit).await?)
}

/// Build a request from `query`/`operationName`/`variables` form pairs.
///
/// Returns `None` unless `query` is present and non-empty. Undecodable
/// `variables` are ignored.
fn from_form(input: &[u8]) -> Option<GraphQLRequest> {
    let mut query = None;
    let mut operation_name = None;
    let mut variables = None;

    for (key, value) in form_urlencoded::parse(input) {
        let slot = match key.as_ref() {
            "query" => &mut query,
            "operationName" => &mut operation_name,
            "variables" => &mut variables,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let query = query.filter(|q| !q.is_empty())?;
    let variables = variables
        .map(|raw| decode_variables(&raw))
        .unwrap_or_default();

    Some(GraphQLRequest {
        query,
        operation_name: operation_name.filter(|name| !name.is_empty()),
        variables,
        uploads: Vec::new(),
    })
}

fn decode_variables(raw: &str) -> Variables {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        debug!(error = %err, "ignoring undecodable variables");
        Variables::new()
    })
}

/// Decode a JSON request body.
///
/// Some clients send `variables` as a JSON-encoded string. Whenever the
/// regular decode fails the body is read again field by field: each of
/// `query`, `operationName` and `variables` is kept only when it has a usable
/// type, and a string `variables` is decoded in turn. Only a body that is not
/// a JSON object is an error.
fn from_json(body: &[u8]) -> Result<GraphQLRequest> {
    let err = match serde_json::from_slice::<GraphQLRequest>(body) {
        Ok(request) => return Ok(request),
        Err(err) => err,
    };
    debug!(error = %err, "retrying JSON request field by field");

    let Value::Object(mut object) = serde_json::from_slice::<Value>(body)? else {
        return Err(Error::InvalidRequest("JSON body is not an object".into()));
    };

    let query = match object.remove("query") {
        Some(Value::String(query)) => query,
        _ => String::new(),
    };
    let operation_name = match object.remove("operationName") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };
    let variables = match object.remove("variables") {
        Some(Value::String(raw)) => decode_variables(&raw),
        Some(Value::Object(variables)) => variables,
        _ => Variables::new(),
    };

    Ok(GraphQLRequest {
        query,
        operation_name,
        variables,
        uploads: Vec::new(),
    })
}

/// Decode a multipart upload request and splice its files into the variables.
async fn from_multipart(content_type: &str, body: Body, limit: usize) -> Result<GraphQLRequest> {
    let boundary = multer::parse_boundary(content_type)?;
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit as u64));
    let mut multipart = Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut values: HashMap<String, String> = HashMap::new();
    let mut files: HashMap<String, UploadedFile> = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            Some(filename) => {
                let content_type = field.content_type().map(ToString::to_string);
                let content = field.bytes().await?;
                trace!(field = %name, size = content.len(), "received file part");
                files.entry(name.clone()).or_insert(UploadedFile {
                    field_name: name,
                    filename: Some(filename),
                    content_type,
                    content,
                });
            }
            None => {
                let text = field.text().await?;
                values.entry(name).or_insert(text);
            }
        }
    }

    let operations = values.get("operations").map(String::as_str).unwrap_or_default();
    let request: GraphQLRequest = serde_json::from_str(operations)?;

    let map: UploadMap = match values.get("map") {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
        _ => UploadMap::new(),
    };

    Ok(inject_uploads(request, &map, files)?)
}
