//! Response construction.
//!
//! # Responsibilities
//! - Mark command output as an unbuffered, cross-origin event stream
//! - Map start failures to 405 with the error text as body
//! - Redirect to the help menu with 303 See Other

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::process::StreamError;

/// Headers sent with streamed command output.
pub const EVENT_STREAM_HEADERS: [(header::HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::CACHE_CONTROL, "no-cache"),
    (header::CONNECTION, "keep-alive"),
    (header::CONTENT_TYPE, "text/event-stream"),
];

/// 200 with a live body and the event-stream headers.
pub fn event_stream(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    for (name, value) in EVENT_STREAM_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

/// 405 carrying the reason a command could not be started.
pub fn start_failed(err: &StreamError) -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, err.to_string()).into_response()
}

/// 303 to the help menu.
pub fn redirect_to_menu(menu_path: &str) -> Response {
    Redirect::to(menu_path).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_stream_headers() {
        let response = event_stream(Body::empty());
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
    }

    #[test]
    fn test_start_failed_is_405() {
        let response = start_failed(&StreamError::EmptyCommand);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_redirect_is_see_other() {
        let response = redirect_to_menu("/menu");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/menu");
    }
}
