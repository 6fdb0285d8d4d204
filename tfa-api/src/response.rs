use axum_core::body::Body;
use axum_core::response::Response;
use bytes::{BufMut, BytesMut};
use http::StatusCode;
use serde::Serialize;

fn json_response<B: Into<Body>>(status: StatusCode, len: usize, body: B) -> Response {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("content-length", len)
        .body(body.into())
        .unwrap()
}

pub fn serialize_json(
    status: StatusCode,
    data: &impl Serialize,
) -> Result<Response, serde_json::Error> {
    let mut writer = BytesMut::with_capacity(256).writer();

    serde_json::to_writer(&mut writer, data)?;

    let froze = writer.into_inner().freeze();
    let len = froze.len();

    Ok(json_response(status, len, froze))
}

/// canned body for when serializing the real response already failed
pub fn error_json() -> Response {
    let fallback = r#"{"kind":"InternalFailure"}"#;

    json_response(StatusCode::INTERNAL_SERVER_ERROR, fallback.len(), fallback)
}
