//! Ping/upload schema served by the `graphql-ping` binary.
//!
//! `Query.ping` always answers `"pong"`, `Query.echo(value)` returns its
//! argument, `Query.path` reports the request path from the handler
//! [`Context`], and `Mutation.upload(file)` returns `"<filename>:<content>"`
//! for an uploaded text file.

use crate::error::{Error, Result};
use crate::executor::Context;
use crate::types::parse_upload_marker;
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, Schema, TypeRef,
};
use async_graphql::{UploadValue, Value as GqlValue};
use std::io::Read;

/// Build the ping/upload schema
pub fn ping_schema() -> Result<Schema> {
    let query = Object::new("Query")
        .field(Field::new("ping", TypeRef::named_nn(TypeRef::STRING), |_| {
            FieldFuture::new(async { Ok(Some(FieldValue::value("pong"))) })
        }))
        .field(
            Field::new("echo", TypeRef::named_nn(TypeRef::STRING), |ctx| {
                FieldFuture::new(async move {
                    let value = ctx.args.try_get("value")?.string()?.to_string();
                    Ok(Some(FieldValue::value(value)))
                })
            })
            .argument(InputValue::new("value", TypeRef::named_nn(TypeRef::STRING))),
        )
        .field(Field::new("path", TypeRef::named_nn(TypeRef::STRING), |ctx| {
            FieldFuture::new(async move {
                let path = ctx.data::<Context>()?.uri.path().to_string();
                Ok(Some(FieldValue::value(path)))
            })
        }));

    let mutation = Object::new("Mutation").field(
        Field::new("upload", TypeRef::named_nn(TypeRef::STRING), |ctx| {
            FieldFuture::new(async move {
                let upload = resolve_upload(&ctx, "file")?;
                let mut content = String::new();
                upload.try_clone()?.into_read().read_to_string(&mut content)?;
                Ok(Some(FieldValue::value(format!("{}:{}", upload.filename, content))))
            })
        })
        .argument(InputValue::new("file", TypeRef::named_nn("Upload"))),
    );

    Schema::build("Query", Some("Mutation"), None)
        .register(query)
        .register(mutation)
        .enable_uploading()
        .finish()
        .map_err(|e| Error::Schema(e.to_string()))
}

fn resolve_upload<'a>(
    ctx: &'a ResolverContext<'_>,
    argument: &str,
) -> async_graphql::Result<&'a UploadValue> {
    let marker = match ctx.args.try_get(argument)?.as_value() {
        GqlValue::String(marker) => marker.clone(),
        _ => return Err("expected an upload".into()),
    };

    let index = parse_upload_marker(&marker)
        .ok_or_else(|| async_graphql::Error::new(format!("invalid upload reference {marker}")))?;

    ctx.query_env
        .uploads
        .get(index)
        .ok_or_else(|| async_graphql::Error::new(format!("upload index {index} not found")))
}
