//! Codec Tests
//!
//! Tests for HTTP request parsing and response encoding.

use std::io::{BufReader, Cursor};

use bytes::Bytes;
use dhub::protocol::{
    encode_response, parse_target, percent_decode, read_request, read_response, write_request,
    write_response, HttpResponse, Method, Status, Version, MAX_BODY_SIZE,
};
use dhub::DhubError;
use serde_json::json;

fn parse(raw: &str) -> dhub::Result<Option<dhub::protocol::HttpRequest>> {
    let mut reader = BufReader::new(Cursor::new(raw.as_bytes().to_vec()));
    read_request(&mut reader)
}

// =============================================================================
// Request Parsing Tests
// =============================================================================

#[test]
fn test_parse_post_with_body() {
    let raw = "POST /users HTTP/1.1\r\n\
               Host: localhost\r\n\
               Content-Type: application/json\r\n\
               Content-Length: 13\r\n\
               \r\n\
               {\"name\":\"Iv\"}";

    let request = parse(raw).unwrap().unwrap();

    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/users");
    assert!(request.query.is_empty());
    assert_eq!(request.version, Version::Http11);
    assert_eq!(request.header("host"), Some("localhost"));
    assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
    assert!(request.is_json());
    assert_eq!(request.body, Bytes::from_static(b"{\"name\":\"Iv\"}"));
}

#[test]
fn test_parse_get_with_query() {
    let request = parse("GET /users?key=first%20name&x=a+b HTTP/1.1\r\n\r\n")
        .unwrap()
        .unwrap();

    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "/users");
    assert_eq!(request.query_param("key"), Some("first name"));
    assert_eq!(request.query_param("x"), Some("a b"));
    assert_eq!(request.query_param("missing"), None);
    assert!(request.body.is_empty());
}

#[test]
fn test_parse_accepts_bare_lf() {
    let request = parse("GET /t HTTP/1.0\nConnection: keep-alive\n\n")
        .unwrap()
        .unwrap();

    assert_eq!(request.version, Version::Http10);
    assert!(request.keep_alive());
}

#[test]
fn test_empty_stream_is_none() {
    assert!(parse("").unwrap().is_none());
}

#[test]
fn test_pipelined_requests() {
    let raw = "POST /t HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}\
               GET /t HTTP/1.1\r\n\r\n";
    let mut reader = BufReader::new(Cursor::new(raw.as_bytes().to_vec()));

    let first = read_request(&mut reader).unwrap().unwrap();
    let second = read_request(&mut reader).unwrap().unwrap();

    assert_eq!(first.method, Method::Post);
    assert_eq!(first.body, Bytes::from_static(b"{}"));
    assert_eq!(second.method, Method::Get);
    assert!(read_request(&mut reader).unwrap().is_none());
}

#[test]
fn test_keep_alive_rules() {
    let http11 = parse("GET / HTTP/1.1\r\n\r\n").unwrap().unwrap();
    let http11_close = parse("GET / HTTP/1.1\r\nConnection: Close\r\n\r\n")
        .unwrap()
        .unwrap();
    let http10 = parse("GET / HTTP/1.0\r\n\r\n").unwrap().unwrap();

    assert!(http11.keep_alive());
    assert!(!http11_close.keep_alive());
    assert!(!http10.keep_alive());
}

#[test]
fn test_is_json_content_types() {
    let with_charset = parse(
        "POST /t HTTP/1.1\r\nContent-Type: application/json; charset=utf-8\r\n\r\n",
    )
    .unwrap()
    .unwrap();
    let text = parse("POST /t HTTP/1.1\r\nContent-Type: text/plain\r\n\r\n")
        .unwrap()
        .unwrap();
    let missing = parse("POST /t HTTP/1.1\r\n\r\n").unwrap().unwrap();

    assert!(with_charset.is_json());
    assert!(!text.is_json());
    assert!(!missing.is_json());
}

#[test]
fn test_other_methods_are_preserved() {
    let request = parse("PATCH /t HTTP/1.1\r\n\r\n").unwrap().unwrap();

    assert_eq!(request.method, Method::Other("PATCH".to_string()));
    assert_eq!(request.method.to_string(), "PATCH");
}

// =============================================================================
// Malformed Request Tests
// =============================================================================

#[test]
fn test_malformed_request_line() {
    assert!(matches!(parse("GARBAGE\r\n\r\n"), Err(DhubError::Protocol(_))));
    assert!(matches!(
        parse("GET /t HTTP/2.0\r\n\r\n"),
        Err(DhubError::Protocol(_))
    ));
    assert!(matches!(
        parse("GET http://host/t HTTP/1.1\r\n\r\n"),
        Err(DhubError::Protocol(_))
    ));
}

#[test]
fn test_malformed_header() {
    assert!(matches!(
        parse("GET /t HTTP/1.1\r\nno colon here\r\n\r\n"),
        Err(DhubError::Protocol(_))
    ));
}

#[test]
fn test_invalid_content_length() {
    assert!(matches!(
        parse("POST /t HTTP/1.1\r\nContent-Length: ten\r\n\r\n"),
        Err(DhubError::Protocol(_))
    ));
}

#[test]
fn test_body_too_large() {
    let raw = format!(
        "POST /t HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        MAX_BODY_SIZE + 1
    );

    assert!(matches!(
        parse(&raw),
        Err(DhubError::BodyTooLarge { size, limit }) if size == MAX_BODY_SIZE + 1 && limit == MAX_BODY_SIZE
    ));
}

#[test]
fn test_chunked_body_rejected() {
    assert!(matches!(
        parse("POST /t HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n"),
        Err(DhubError::Protocol(_))
    ));
}

#[test]
fn test_truncated_body_is_io_error() {
    assert!(matches!(
        parse("POST /t HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}"),
        Err(DhubError::Io(_))
    ));
}

#[test]
fn test_short_body_at_size_limit_is_eof() {
    let raw = format!(
        "POST /t HTTP/1.1\r\nContent-Length: {}\r\n\r\n{{}}",
        MAX_BODY_SIZE
    );

    match parse(&raw) {
        Err(DhubError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other.map(|r| r.is_some())),
    }
}

// =============================================================================
// Target Decoding Tests
// =============================================================================

#[test]
fn test_parse_target() {
    let (path, query) = parse_target("/my%2Dtable?key=a%3Db&flag&=x").unwrap();

    assert_eq!(path, "/my-table");
    assert_eq!(
        query,
        vec![
            ("key".to_string(), "a=b".to_string()),
            ("flag".to_string(), String::new()),
            (String::new(), "x".to_string()),
        ]
    );
}

#[test]
fn test_percent_decode() {
    assert_eq!(percent_decode("a%20b", false).unwrap(), "a b");
    assert_eq!(percent_decode("a+b", false).unwrap(), "a+b");
    assert_eq!(percent_decode("a+b", true).unwrap(), "a b");
    assert_eq!(percent_decode("%D0%98", false).unwrap(), "И");
    assert!(percent_decode("%zz", false).is_err());
    assert!(percent_decode("%4", false).is_err());
    assert!(percent_decode("%FF", false).is_err());
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_response_headers() {
    let response = HttpResponse::json(Status::Created, &json!({"status": "ok"}));

    let encoded = String::from_utf8(encode_response(&response, false)).unwrap();

    assert!(encoded.starts_with("HTTP/1.1 201 Created\r\n"));
    assert!(encoded.contains("Content-Type: application/json\r\n"));
    assert!(encoded.contains("Content-Length: 15\r\n"));
    assert!(encoded.contains("Connection: close\r\n"));
    assert!(encoded.ends_with("\r\n\r\n{\"status\":\"ok\"}"));
}

#[test]
fn test_error_response_body() {
    let response = HttpResponse::error(Status::BadRequest, "Request must be JSON");

    assert_eq!(response.status.code(), 400);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"error": "Request must be JSON"})
    );
}

#[test]
fn test_write_then_read_response() {
    let response = HttpResponse::error(Status::MethodNotAllowed, "Method not allowed")
        .with_header("Allow", "GET, POST");
    let mut wire = Vec::new();

    write_response(&mut wire, &response, true).unwrap();
    let decoded = read_response(&mut BufReader::new(Cursor::new(wire))).unwrap();

    assert_eq!(decoded.status, Status::MethodNotAllowed);
    assert_eq!(
        decoded.headers,
        vec![("Allow".to_string(), "GET, POST".to_string())]
    );
    assert_eq!(decoded.json_body().unwrap(), json!({"error": "Method not allowed"}));
}

#[test]
fn test_write_request_is_parseable() {
    let mut wire = Vec::new();

    write_request(
        &mut wire,
        &Method::Post,
        "/users",
        &[("Content-Type", "application/json")],
        b"{\"a\":1}",
    )
    .unwrap();
    let request = read_request(&mut BufReader::new(Cursor::new(wire)))
        .unwrap()
        .unwrap();

    assert_eq!(request.method, Method::Post);
    assert!(request.is_json());
    assert_eq!(request.body, Bytes::from_static(b"{\"a\":1}"));
}

#[test]
fn test_status_codes() {
    for status in [
        Status::Ok,
        Status::Created,
        Status::BadRequest,
        Status::NotFound,
        Status::MethodNotAllowed,
        Status::Conflict,
        Status::PayloadTooLarge,
        Status::InternalServerError,
        Status::ServiceUnavailable,
    ] {
        assert_eq!(Status::from_code(status.code()), Some(status));
        assert!(!status.reason().is_empty());
    }
    assert_eq!(Status::from_code(418), None);
}
