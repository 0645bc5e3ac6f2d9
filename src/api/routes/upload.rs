//! `POST /upload` — explain an uploaded source file.
//!
//! Expects a multipart body with a `file` field carrying UTF-8 source text.
//! Success returns the original content together with its generated
//! explanation; malformed uploads are rejected with 400 before the cache is
//! consulted, and any provider failure surfaces as a 500.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::api::server::AppState;

const ERR_NO_FILE_PART: &str = "No file part in the request";
const ERR_NO_FILE_SELECTED: &str = "No file selected";
const ERR_NOT_UTF8: &str = "File is not valid UTF-8";

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Handler for `POST /upload`.
pub async fn upload_and_explain(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A body that is not multipart at all carries no file part.
    let Ok(mut multipart) = multipart else {
        return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILE_PART);
    };

    let mut code: Option<String> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                // Browsers send an empty filename when no file was chosen.
                if field.file_name().unwrap_or("").is_empty() {
                    return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILE_SELECTED);
                }
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILE_PART);
                    }
                };
                match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        code = Some(text);
                        break;
                    }
                    Err(_) => {
                        return error_response(StatusCode::BAD_REQUEST, ERR_NOT_UTF8);
                    }
                }
            }
            Ok(None) => break,
            Err(_) => {
                return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILE_PART);
            }
        }
    }

    let Some(code) = code else {
        return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILE_PART);
    };

    match state.cache.lookup_or_compute(&code).await {
        Ok(explanation) => Json(json!({
            "original_code": code,
            "explanation": explanation,
        }))
        .into_response(),
        Err(e) => {
            warn!("explanation generation failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
