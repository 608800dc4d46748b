//! Protocol Module
//!
//! HTTP/1.1 messages exchanged between clients and the server.
//!
//! ## Routes
//! - `POST /<table>`          - Body: one JSON object, appended to the table
//! - `GET  /<table>`          - All records of the table
//! - `GET  /<table>?key=<k>`  - Records containing top-level field `k`
//!
//! ## Response Bodies
//! - `{"status": "ok"}`           - insert succeeded (201)
//! - `{"records": [ ... ]}`       - query succeeded (200)
//! - `{"error": "<message>"}`     - anything else (4xx/5xx)

mod request;
mod response;
mod codec;

pub use request::{HttpRequest, Method, Version};
pub use response::{HttpResponse, Status};
pub use codec::{
    encode_response, parse_target, percent_decode, read_request, read_response, write_request,
    write_response, MAX_BODY_SIZE, MAX_HEADERS, MAX_LINE_LENGTH,
};
