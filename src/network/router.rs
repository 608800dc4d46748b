//! Request Router
//!
//! Translates HTTP requests into table store calls and store results into
//! responses.

use serde::Serialize;
use serde_json::Value;

use crate::error::DhubError;
use crate::protocol::{HttpRequest, HttpResponse, Method, Status};
use crate::storage::{Record, TableStore};

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Serialize)]
struct RecordsBody {
    records: Vec<Record>,
}

/// Dispatch one request against the store
pub fn route(store: &TableStore, request: &HttpRequest) -> HttpResponse {
    let Some(table) = table_from_path(&request.path) else {
        return HttpResponse::error(Status::NotFound, "Not found");
    };

    match request.method {
        Method::Post => insert_record(store, table, request),
        Method::Get => get_records(store, table, request),
        _ => HttpResponse::error(Status::MethodNotAllowed, "Method not allowed")
            .with_header("Allow", "GET, POST"),
    }
}

/// Map a store error onto a response
pub fn error_response(error: &DhubError) -> HttpResponse {
    let status = match error {
        DhubError::NotFound(_) => Status::NotFound,
        DhubError::AlreadyExists(_) => Status::Conflict,
        DhubError::InvalidTableName(_) | DhubError::Protocol(_) => Status::BadRequest,
        DhubError::BodyTooLarge { .. } => Status::PayloadTooLarge,
        _ => Status::InternalServerError,
    };
    HttpResponse::error(status, &error.to_string())
}

/// `POST /<table>`
fn insert_record(store: &TableStore, table: &str, request: &HttpRequest) -> HttpResponse {
    if !request.is_json() {
        return HttpResponse::error(Status::BadRequest, "Request must be JSON");
    }

    let value: Value = match serde_json::from_slice(&request.body) {
        Ok(value) => value,
        Err(e) => {
            return HttpResponse::error(Status::BadRequest, &format!("Invalid JSON body: {}", e))
        }
    };

    let Value::Object(record) = value else {
        return HttpResponse::error(Status::BadRequest, "Record must be a JSON object");
    };

    match store.insert(table, &record) {
        Ok(()) => HttpResponse::json(Status::Created, &StatusBody { status: "ok" }),
        Err(e) => error_response(&e),
    }
}

/// `GET /<table>[?key=K]`
fn get_records(store: &TableStore, table: &str, request: &HttpRequest) -> HttpResponse {
    let result = match request.query_param("key").filter(|key| !key.is_empty()) {
        Some(key) => store.find_by_key(table, key),
        None => store.find_all(table),
    };

    match result {
        Ok(records) => HttpResponse::json(Status::Ok, &RecordsBody { records }),
        Err(e) => error_response(&e),
    }
}

/// "/users" → Some("users"); "/", "/a/b" → None
fn table_from_path(path: &str) -> Option<&str> {
    let name = path.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') {
        None
    } else {
        Some(name)
    }
}
