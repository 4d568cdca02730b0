//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortUrl, ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a URL, or returns the existing one.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a/b" }
/// ```
///
/// # Response
///
/// **201 Created** for a new link, **200 OK** if the URL was already shortened:
///
/// ```json
/// {
///   "url": {
///     "short_code": "A8SlAtQ",
///     "short_url": "https://clck.dev/A8SlAtQ",
///     "created": true
///   }
/// }
/// ```
///
/// # Errors
///
/// - 422 Unprocessable Entity for malformed bodies and rejected URLs
/// - 409 Conflict when the derived code belongs to another URL
/// - 429 Too Many Requests (from the rate-limit middleware)
/// - 503 Service Unavailable when the store cannot be reached
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(
            "Malformed request body",
            json!({ "body": rejection.body_text() }),
        )
    })?;

    payload.validate()?;

    let shortened = state.shortening_service.shorten(&payload.url).await?;

    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let short_url = state.short_url(&shortened.code);

    Ok((
        status,
        Json(ShortenResponse {
            url: ShortUrl {
                short_code: shortened.code,
                short_url,
                created: shortened.created,
            },
        }),
    ))
}
