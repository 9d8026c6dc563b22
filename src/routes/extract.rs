//! Extractors whose rejections use the shared `{ "error": ... }` body.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body; malformed or incomplete payloads are a 400.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::TooLarge;
    }
    tracing::debug!(error = %rejection.body_text(), "rejected JSON body");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::validation("Expected a JSON body with Content-Type: application/json")
        }
        other => AppError::Validation(other.body_text()),
    }
}

/// Typed path parameters; an id that does not parse is a 400.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(path_rejection)
    }
}

fn path_rejection(rejection: PathRejection) -> AppError {
    tracing::debug!(error = %rejection.body_text(), "rejected path parameters");
    AppError::Validation(rejection.body_text())
}

/// `multipart/form-data` body; a missing or wrong content type is a 400.
pub struct ValidMultipart(pub Multipart);

impl<S> FromRequest<S> for ValidMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(Self)
            .map_err(|rejection: MultipartRejection| AppError::Validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Named {
        name: String,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/named",
                post(|ValidJson(body): ValidJson<Named>| async move { body.name }),
            )
            .route(
                "/items/{id}",
                get(|ValidPath(id): ValidPath<i64>| async move { id.to_string() }),
            )
            .route(
                "/upload",
                post(|ValidMultipart(_form): ValidMultipart| async { "ok" }),
            )
    }

    async fn error_of(req: Request<Body>) -> (StatusCode, String) {
        let res = app().oneshot(req).await.unwrap();
        let status = res.status();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        (status, body.error)
    }

    fn json_post(body: &'static str) -> Request<Body> {
        Request::post("/named")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let (status, error) = error_of(json_post("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.contains("missing field `name`"), "{error}");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, _) = error_of(json_post("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let req = Request::post("/named")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let (status, error) = error_of(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.contains("application/json"));
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let res = app().oneshot(json_post(r#"{"name":"Ada"}"#)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let req = Request::get("/items/abc").body(Body::empty()).unwrap();
        let (status, error) = error_of(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.contains("abc"), "{error}");

        let res = app()
            .oneshot(Request::get("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let req = Request::post("/upload")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let (status, _) = error_of(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
