//! Axum glue: run the render pipeline for an HTTP request and turn the
//! outcome into a response.

use std::path::PathBuf;

use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};

use crate::application::platform::Platform;
use crate::application::render::{Engine, PlatformRenderOptions, ResponseHandle};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Render `path` and build the HTTP response.
///
/// A [`ResponseHandle`] is attached when `options` carries none, so the
/// platform can always set status and headers. Failures go through
/// [`crate::EngineError`]'s `IntoResponse`.
pub async fn render_response<P: Platform>(
    engine: &Engine<P>,
    path: impl Into<PathBuf>,
    mut options: PlatformRenderOptions<P>,
) -> Response {
    let handle = options
        .response
        .get_or_insert_with(ResponseHandle::new)
        .clone();

    match engine.render_to_string(path.into(), options).await {
        Ok(html) => html_response(html, &handle),
        Err(error) => error.into_response(),
    }
}

fn html_response(html: String, handle: &ResponseHandle) -> Response {
    let mut response = Html(html).into_response();
    *response.status_mut() = handle.status();

    let headers = response.headers_mut();
    for (name, value) in handle.headers().iter() {
        headers.insert(name.clone(), value.clone());
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(HTML_CONTENT_TYPE),
        );
    }
    response
}
