//! Conversion between axum requests and [`NormalizedRequest`].

use std::collections::BTreeMap;
use std::pin::Pin;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{CONTENT_TYPE, COOKIE},
        HeaderMap, Method, Request,
    },
};
use axum_extra::extract::cookie::Cookie;
use blitz_auth_core::auth::{NormalizationError, NormalizedRequest};
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// Largest request body the adapter reads. Callback bodies are a handful of
/// form fields.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// The shapes a request body can arrive in.
pub enum RequestBody {
    Empty,
    /// Fully buffered in memory.
    Buffer(Bytes),
    /// An axum/hyper body stream.
    Stream(Body),
    /// Any async byte reader.
    Reader(Pin<Box<dyn AsyncRead + Send>>),
}

impl From<Body> for RequestBody {
    fn from(body: Body) -> Self {
        Self::Stream(body)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

/// Normalize an inbound request.
///
/// The action is detected before the body is touched. Body read and parse
/// failures, including bodies over [`MAX_BODY_BYTES`], are logged and yield
/// `body: None`.
///
/// # Errors
///
/// Returns `NormalizationError` when the URL path names no supported action.
pub async fn to_internal_request(
    url: &Url,
    method: &Method,
    headers: &HeaderMap,
    body: RequestBody,
) -> Result<NormalizedRequest, NormalizationError> {
    let mut request =
        NormalizedRequest::new(url.as_str(), method.as_str(), header_map(headers), None)?;
    request.cookies = request_cookies(headers);

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    request.body = read_body(body, content_type).await;

    Ok(request)
}

/// Rebuild an `http::Request` from a normalized one.
///
/// Method, headers, and the query string are carried over; a parsed body is
/// re-encoded as JSON.
///
/// # Errors
///
/// Returns an error if a header name or value is not representable.
pub fn to_request(request: &NormalizedRequest) -> Result<Request<Body>, axum::http::Error> {
    let mut builder = Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());

    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let body = match &request.body {
        Some(body) => Body::from(Value::Object(body.clone()).to_string()),
        None => Body::empty(),
    };

    builder.body(body)
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let separator = if *name == axum::http::header::COOKIE {
            "; "
        } else {
            ", "
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(separator);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

/// Cookies sent with the request. Values are percent-decoded and
/// unquoted; when a name repeats, the first value wins.
fn request_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for header in headers.get_all(COOKIE).iter() {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse_encoded(header).filter_map(Result::ok) {
            cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value_trimmed().to_string());
        }
    }
    cookies
}

async fn read_body(body: RequestBody, content_type: Option<&str>) -> Option<Map<String, Value>> {
    let bytes = match collect(body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read auth request body");
            return None;
        }
    };
    if bytes.is_empty() {
        return None;
    }

    let is_form = content_type
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let map = url::form_urlencoded::parse(&bytes)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        return Some(map);
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            tracing::debug!(kind = ?other, "Ignoring non-object JSON body");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse auth request body");
            None
        }
    }
}

async fn collect(body: RequestBody) -> Result<Bytes, Box<dyn std::error::Error + Send + Sync>> {
    let bytes = match body {
        RequestBody::Empty => Bytes::new(),
        RequestBody::Buffer(bytes) => bytes,
        RequestBody::Stream(body) => axum::body::to_bytes(body, MAX_BODY_BYTES).await?,
        RequestBody::Reader(reader) => {
            let mut buf = Vec::new();
            reader
                .take(MAX_BODY_BYTES as u64 + 1)
                .read_to_end(&mut buf)
                .await?;
            Bytes::from(buf)
        }
    };
    if bytes.len() > MAX_BODY_BYTES {
        return Err(format!("request body exceeds {MAX_BODY_BYTES} bytes").into());
    }
    Ok(bytes)
}
