use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use crate::models::resume::ResumeResponse;

/// Served verbatim whenever `id` or `lang` is missing.
pub const LANDING_PAGE: &str = include_str!("../../static/landing.html");

pub fn landing_page() -> Response {
    (StatusCode::OK, Html(LANDING_PAGE)).into_response()
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn build_resume_response(message: String, visitor_count: i64, data: Value) -> ResumeResponse {
    ResumeResponse {
        message,
        timestamp: format_timestamp(Utc::now()),
        visitor_count,
        data,
    }
}

/// Serializes with a four-space indent.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

pub fn pretty_json_response<T: Serialize>(value: &T) -> Result<Response, serde_json::Error> {
    let body = to_pretty_json(value)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
