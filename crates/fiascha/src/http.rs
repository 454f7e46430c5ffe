//! Response helpers shared by the workflow routers.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::validation::FieldErrors;

/// JSON error body in the shape every router returns: `{"error": "..."}`.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

/// Successful mutation: the affected record under `key` plus a flash-style status message.
pub fn flash<T: Serialize>(
    status: StatusCode,
    key: &'static str,
    value: &T,
    message: impl Into<String>,
) -> Response {
    match serde_json::to_value(value) {
        Ok(value) => {
            let mut payload = serde_json::Map::new();
            payload.insert(key.to_string(), value);
            payload.insert("message".to_string(), json!(message.into()));
            (status, Json(serde_json::Value::Object(payload))).into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Mutation without a record to echo back.
pub fn flash_only(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

/// 422 carrying both the joined message and the per-field breakdown.
pub fn validation_response(errors: &FieldErrors) -> Response {
    let payload = json!({
        "error": errors.to_string(),
        "fields": errors,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

/// `Json` whose rejections answer in the same `{"error": ...}` shape as every other failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
    }
}

/// A JSON body that may be left out entirely, in which case `T::default()` is used.
///
/// Only an empty body counts as absent. A body that is present must be declared as JSON
/// and must decode; otherwise the request is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let declares_json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))?;

        if bytes.is_empty() {
            return Ok(Self(T::default()));
        }
        if !declares_json {
            return Err(error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`",
            ));
        }
        Json::<T>::from_bytes(&bytes)
            .map(|Json(value)| Self(value))
            .map_err(|rejection| {
                validation_response(&FieldErrors::single("body", rejection.body_text()))
            })
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Note {
        #[serde(default)]
        text: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri("/notes");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn malformed_json_is_answered_with_an_error_body() {
        let rejection = JsonBody::<Note>::from_request(request(Some("application/json"), "{"), &())
            .await
            .unwrap_err();

        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        let payload = read_json(rejection).await;
        assert!(payload["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn absent_optional_body_falls_back_to_default() {
        let OptionalJsonBody(note) = OptionalJsonBody::<Note>::from_request(request(None, ""), &())
            .await
            .unwrap();
        assert_eq!(note, Note::default());

        let OptionalJsonBody(note) =
            OptionalJsonBody::<Note>::from_request(request(Some("application/json"), ""), &())
                .await
                .unwrap();
        assert_eq!(note, Note::default());
    }

    #[tokio::test]
    async fn present_optional_body_must_decode() {
        let OptionalJsonBody(note) = OptionalJsonBody::<Note>::from_request(
            request(Some("application/json; charset=utf-8"), r#"{"text":"hi"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(note.text.as_deref(), Some("hi"));

        let rejection = OptionalJsonBody::<Note>::from_request(
            request(Some("application/json"), r#"{"text": 42}"#),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json(rejection).await;
        assert_eq!(payload["fields"][0]["field"], "body");

        let rejection =
            OptionalJsonBody::<Note>::from_request(request(None, r#"{"text":"hi"}"#), &())
                .await
                .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
