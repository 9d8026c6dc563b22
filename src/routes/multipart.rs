//! Buffered multipart form reading shared by the project and contact endpoints.

use std::collections::HashMap;

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;

use crate::db::models::Upload;
use crate::error::{AppError, Result};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Text fields and uploaded files of one multipart request
#[derive(Debug, Default)]
pub struct FormData {
    text: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

fn too_large(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

async fn read_file(field: Field<'_>) -> Result<Upload> {
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let bytes = field.bytes().await.map_err(|e| {
        if too_large(&e) {
            AppError::TooLarge
        } else {
            AppError::Attachment(e.body_text())
        }
    })?;

    Ok(Upload {
        bytes: bytes.to_vec(),
        content_type,
    })
}

impl FormData {
    /// Read every field. Names in `file_fields`, and any part carrying a
    /// filename, are buffered as files; the rest are text.
    pub async fn read(mut multipart: Multipart, file_fields: &[&str]) -> Result<Self> {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) if too_large(&e) => return Err(AppError::TooLarge),
                Err(e) => {
                    tracing::warn!(error = %e, "Multipart error");
                    return Err(AppError::validation("Invalid multipart data"));
                }
            };

            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) || field.file_name().is_some() {
                let upload = read_file(field).await?;
                if !upload.bytes.is_empty() {
                    form.files.insert(name, upload);
                }
            } else {
                let value = field.text().await.map_err(|e| {
                    if too_large(&e) {
                        AppError::TooLarge
                    } else {
                        AppError::validation(format!("Invalid value for field '{name}'"))
                    }
                })?;
                form.text.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Trimmed value of a field that must not be blank
    pub fn required(&self, name: &str, label: &str) -> Result<String> {
        match self.text(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(AppError::validation(format!("{label} is required"))),
        }
    }

    /// Trimmed value, empty when absent
    pub fn optional(&self, name: &str) -> String {
        self.text(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Uploaded file, `None` when absent or empty
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    /// Hand-built multipart/form-data body
    pub struct MultipartBody {
        boundary: &'static str,
        body: Vec<u8>,
    }

    impl MultipartBody {
        pub fn new() -> Self {
            Self {
                boundary: "X-TEST-BOUNDARY",
                body: Vec::new(),
            }
        }

        pub fn text(mut self, name: &str, value: &str) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                    self.boundary
                )
                .as_bytes(),
            );
            self
        }

        pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                    self.boundary
                )
                .as_bytes(),
            );
            self.body.extend_from_slice(bytes);
            self.body.extend_from_slice(b"\r\n");
            self
        }

        pub fn content_type(&self) -> String {
            format!("multipart/form-data; boundary={}", self.boundary)
        }

        pub fn finish(mut self) -> (String, Vec<u8>) {
            self.body
                .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
            (self.content_type(), self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MultipartBody;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn echo(multipart: Multipart) -> Result<Json<Value>> {
        let mut form = FormData::read(multipart, &["image"]).await?;
        let name = form.required("name", "Name")?;
        let image = form.take_file("image");
        Ok(Json(json!({
            "name": name,
            "note": form.optional("note"),
            "imageType": image.as_ref().map(|i| i.content_type.clone()),
            "imageLen": image.map(|i| i.bytes.len()),
        })))
    }

    async fn post_form(body: MultipartBody) -> (StatusCode, Value) {
        let (content_type, bytes) = body.finish();
        let app = Router::new().route("/echo", post(echo));
        let req = Request::post("/echo")
            .header("content-type", content_type)
            .body(Body::from(bytes))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_reads_text_and_file_fields() {
        let (status, body) = post_form(
            MultipartBody::new()
                .text("name", "  Ada ")
                .file("image", "a.png", "image/png", &[1, 2, 3]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["note"], "");
        assert_eq!(body["imageType"], "image/png");
        assert_eq!(body["imageLen"], 3);
    }

    #[tokio::test]
    async fn test_empty_file_counts_as_absent() {
        let (status, body) = post_form(
            MultipartBody::new()
                .text("name", "Ada")
                .file("image", "empty.png", "image/png", &[]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["imageType"].is_null());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_bad_request() {
        let (status, body) = post_form(MultipartBody::new().text("note", "hi")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name is required");
    }
}
