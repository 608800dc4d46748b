//! Protocol codec
//!
//! Reading and writing HTTP/1.1 messages on blocking streams.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! POST /users?key=age HTTP/1.1\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 24\r\n
//! \r\n
//! {"name":"Ivan","age":33}
//! ```
//!
//! ### Response
//! ```text
//! HTTP/1.1 201 Created\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 15\r\n
//! Connection: keep-alive\r\n
//! \r\n
//! {"status":"ok"}
//! ```
//!
//! Bodies are delimited by `Content-Length` only; chunked transfer encoding
//! is rejected.

use std::io::{self, BufRead, Read, Write};

use bytes::Bytes;

use crate::error::{DhubError, Result};
use super::{HttpRequest, HttpResponse, Method, Status, Version};

/// Maximum body size (16 MB)
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Maximum length of the request line or a single header line
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Maximum number of headers per message
pub const MAX_HEADERS: usize = 100;

// =============================================================================
// Request Reading/Writing
// =============================================================================

/// Read a complete request from a stream
///
/// Returns `Ok(None)` if the stream ends before any byte of a new request.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<HttpRequest>> {
    // Tolerate stray CRLFs between pipelined requests
    let request_line = loop {
        match read_line(reader)? {
            None => return Ok(None),
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };

    let mut parts = request_line.split(' ');
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version), None) if !method.is_empty() => {
            (method, target, version)
        }
        _ => {
            return Err(DhubError::Protocol(format!(
                "Malformed request line: {:?}",
                request_line
            )))
        }
    };

    let version = parse_version(version)?;
    let (path, query) = parse_target(target)?;
    let headers = read_headers(reader)?;

    if headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("transfer-encoding"))
    {
        return Err(DhubError::Protocol(
            "Transfer-Encoding is not supported, send Content-Length".to_string(),
        ));
    }

    let body = read_body(reader, &headers)?;

    Ok(Some(HttpRequest {
        method: Method::parse(method),
        path,
        query,
        version,
        headers,
        body,
    }))
}

/// Write a request to a stream
///
/// `target` is sent as-is and must already be percent-encoded.
pub fn write_request<W: Write>(
    writer: &mut W,
    method: &Method,
    target: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Result<()> {
    let mut message = format!("{} {} HTTP/1.1\r\n", method, target);
    for (name, value) in headers {
        message.push_str(&format!("{}: {}\r\n", name, value));
    }
    message.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    writer.write_all(message.as_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Response Reading/Writing
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &HttpResponse, keep_alive: bool) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status.code(),
        response.status.reason()
    );
    head.push_str("Content-Type: application/json\r\n");
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(if keep_alive {
        "Connection: keep-alive\r\n\r\n"
    } else {
        "Connection: close\r\n\r\n"
    });

    let mut message = Vec::with_capacity(head.len() + response.body.len());
    message.extend_from_slice(head.as_bytes());
    message.extend_from_slice(&response.body);
    message
}

/// Write a response to a stream
pub fn write_response<W: Write>(
    writer: &mut W,
    response: &HttpResponse,
    keep_alive: bool,
) -> Result<()> {
    let bytes = encode_response(response, keep_alive);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<HttpResponse> {
    let status_line = read_line(reader)?.ok_or_else(|| {
        DhubError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before response",
        ))
    })?;

    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(Status::from_code)
        .ok_or_else(|| {
            DhubError::Protocol(format!("Malformed status line: {:?}", status_line))
        })?;

    let headers = read_headers(reader)?;
    let body = read_body(reader, &headers)?;

    // Headers the codec writes itself are not kept
    let headers = headers
        .into_iter()
        .filter(|(name, _)| {
            !["content-type", "content-length", "connection"]
                .iter()
                .any(|known| name.eq_ignore_ascii_case(known))
        })
        .collect();

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Split a request target into a decoded path and decoded query pairs
///
/// "/users?key=first%20name" → ("/users", [("key", "first name")])
pub fn parse_target(target: &str) -> Result<(String, Vec<(String, String)>)> {
    if !target.starts_with('/') {
        return Err(DhubError::Protocol(format!(
            "Unsupported request target: {:?}",
            target
        )));
    }

    let (raw_path, raw_query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let path = percent_decode(raw_path, false)?;

    let mut query = Vec::new();
    if let Some(raw_query) = raw_query {
        for pair in raw_query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            query.push((percent_decode(name, true)?, percent_decode(value, true)?));
        }
    }

    Ok((path, query))
}

/// Decode `%XX` escapes (and `+` as space in query components)
pub fn percent_decode(input: &str, plus_as_space: bool) -> Result<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| {
                        DhubError::Protocol(format!("Invalid percent-encoding in {:?}", input))
                    })?;
                decoded.push(hex);
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            other => {
                decoded.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded)
        .map_err(|_| DhubError::Protocol(format!("Non UTF-8 text in {:?}", input)))
}

fn parse_version(token: &str) -> Result<Version> {
    match token {
        "HTTP/1.1" => Ok(Version::Http11),
        "HTTP/1.0" => Ok(Version::Http10),
        other => Err(DhubError::Protocol(format!(
            "Unsupported HTTP version: {:?}",
            other
        ))),
    }
}

/// Read header lines up to (and including) the blank line
fn read_headers<R: BufRead>(reader: &mut R) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::new();

    loop {
        let line = read_line(reader)?.ok_or_else(|| {
            DhubError::Protocol("Connection closed inside headers".to_string())
        })?;
        if line.is_empty() {
            return Ok(headers);
        }

        if headers.len() == MAX_HEADERS {
            return Err(DhubError::Protocol(format!(
                "Too many headers (max {})",
                MAX_HEADERS
            )));
        }

        let (name, value) = line.split_once(':').ok_or_else(|| {
            DhubError::Protocol(format!("Malformed header line: {:?}", line))
        })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
}

/// Read a `Content-Length` delimited body (empty when the header is absent)
fn read_body<R: BufRead>(reader: &mut R, headers: &[(String, String)]) -> Result<Bytes> {
    let content_length = match headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
    {
        Some((_, value)) => value.parse::<usize>().map_err(|_| {
            DhubError::Protocol(format!("Invalid Content-Length: {:?}", value))
        })?,
        None => 0,
    };

    if content_length > MAX_BODY_SIZE {
        return Err(DhubError::BodyTooLarge {
            size: content_length,
            limit: MAX_BODY_SIZE,
        });
    }

    // Grows with the bytes that actually arrive, not the declared length
    let mut body = Vec::new();
    reader
        .by_ref()
        .take(content_length as u64)
        .read_to_end(&mut body)?;

    if body.len() < content_length {
        return Err(DhubError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "Body ended after {} of {} bytes",
                body.len(),
                content_length
            ),
        )));
    }

    Ok(Bytes::from(body))
}

/// Read one CRLF (or LF) terminated line, without the terminator
///
/// `Ok(None)` on end of stream before any byte.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LENGTH as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }
    if !buf.ends_with(b"\n") {
        if buf.len() > MAX_LINE_LENGTH {
            return Err(DhubError::Protocol(format!(
                "Line too long (max {} bytes)",
                MAX_LINE_LENGTH
            )));
        }
        return Err(DhubError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-line",
        )));
    }

    buf.pop();
    if buf.ends_with(b"\r") {
        buf.pop();
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| DhubError::Protocol("Non UTF-8 header line".to_string()))
}
