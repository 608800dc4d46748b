//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;
use serde::Serialize;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    Conflict = 409,
    PayloadTooLarge = 413,
    InternalServerError = 500,
    ServiceUnavailable = 503,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::Conflict => "Conflict",
            Status::PayloadTooLarge => "Payload Too Large",
            Status::InternalServerError => "Internal Server Error",
            Status::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(Status::Ok),
            201 => Some(Status::Created),
            400 => Some(Status::BadRequest),
            404 => Some(Status::NotFound),
            405 => Some(Status::MethodNotAllowed),
            409 => Some(Status::Conflict),
            413 => Some(Status::PayloadTooLarge),
            500 => Some(Status::InternalServerError),
            503 => Some(Status::ServiceUnavailable),
            _ => None,
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// A response to send to client
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: Status,

    /// Extra headers (Content-Type/Content-Length/Connection are added by the
    /// codec)
    pub headers: Vec<(String, String)>,

    /// JSON payload
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with a JSON body
    pub fn json<T: Serialize>(status: Status, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => Self {
                status,
                headers: Vec::new(),
                body: Bytes::from(bytes),
            },
            Err(e) => {
                tracing::error!("Failed to encode response body: {}", e);
                Self {
                    status: Status::InternalServerError,
                    headers: Vec::new(),
                    body: Bytes::from_static(br#"{"error":"Failed to encode response"}"#),
                }
            }
        }
    }

    /// Create an error response: `{"error": message}`
    pub fn error(status: Status, message: &str) -> Self {
        Self::json(status, &ErrorBody { error: message })
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Parse the body as JSON
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}
