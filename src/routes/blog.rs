/**
 * Blog Routes
 * Public reads of published posts, admin-only writes
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::db::models::Blog;
use crate::error::{AppError, Result};
use crate::routes::auth::{is_admin, AdminPrincipal, MaybePrincipal};
use crate::routes::extract::{ValidJson, ValidPath};
use crate::services::blog::BlogDraft;
use crate::state::AppState;

fn validate_draft(draft: &BlogDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    Ok(())
}

/// GET /api/blogs
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Blog>>> {
    Ok(Json(state.blogs.list_published().await?))
}

/// GET /api/blogs/{slug}
///
/// Drafts are only visible to the administrator.
pub async fn get_post(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(slug): Path<String>,
) -> Result<Json<Blog>> {
    let admin = principal
        .as_ref()
        .is_some_and(|p| is_admin(p, &state.config.admin_email));

    Ok(Json(state.blogs.find_by_slug(&slug, !admin).await?))
}

/// GET /api/blogs/tag/{tag}
pub async fn posts_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Blog>>> {
    Ok(Json(state.blogs.list_by_tag(&tag).await?))
}

/// POST /api/blogs
pub async fn create_post(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidJson(draft): ValidJson<BlogDraft>,
) -> Result<(StatusCode, Json<Blog>)> {
    validate_draft(&draft)?;
    let created = state.blogs.create(draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/blogs/{id}
pub async fn update_post(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
    ValidJson(draft): ValidJson<BlogDraft>,
) -> Result<Json<Blog>> {
    validate_draft(&draft)?;
    Ok(Json(state.blogs.update(id, draft).await?))
}

/// DELETE /api/blogs/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode> {
    state.blogs.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::testing::{admin_bearer, user_bearer};
    use crate::state::testing::test_state;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn blog_router() -> Router {
        Router::new()
            .route("/api/blogs", get(list_posts).post(create_post))
            .route("/api/blogs/tag/{tag}", get(posts_by_tag))
            .route(
                "/api/blogs/{key}",
                get(get_post).put(update_post).delete(delete_post),
            )
            .with_state(test_state())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        bearer: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            req = req.header("authorization", bearer);
        }
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let app = blog_router();
        let body = json!({ "title": "Hello", "published": true });

        let (status, _) = send(&app, "POST", "/api/blogs", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/api/blogs", Some(user_bearer()), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_then_read_by_slug_and_tag() {
        let app = blog_router();
        let (status, created) = send(
            &app,
            "POST",
            "/api/blogs",
            Some(admin_bearer()),
            Some(json!({
                "title": "Hello, World! 2024",
                "content": "<h2>Hi</h2><p>there</p>",
                "tags": "Rust, Web",
                "published": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["slug"], "hello-world-2024");
        assert_eq!(created["summary"], "Hithere");
        assert!(created["publishedAt"].is_string());

        let (status, post) = send(&app, "GET", "/api/blogs/hello-world-2024", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["title"], "Hello, World! 2024");

        let (status, tagged) = send(&app, "GET", "/api/blogs/tag/rust", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tagged.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_public() {
        let app = blog_router();
        send(
            &app,
            "POST",
            "/api/blogs",
            Some(admin_bearer()),
            Some(json!({ "title": "Secret draft" })),
        )
        .await;

        let (status, list) = send(&app, "GET", "/api/blogs", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list.as_array().unwrap().is_empty());

        let (status, body) = send(&app, "GET", "/api/blogs/secret-draft", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Blog post not found");

        let (status, _) = send(
            &app,
            "GET",
            "/api/blogs/secret-draft",
            Some(admin_bearer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let app = blog_router();
        let (status, body) = send(
            &app,
            "POST",
            "/api/blogs",
            Some(admin_bearer()),
            Some(json!({ "title": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");
    }

    #[tokio::test]
    async fn test_missing_title_is_json_bad_request() {
        let app = blog_router();
        let (status, body) = send(&app, "POST", "/api/blogs", Some(admin_bearer()), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("missing field `title`"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let req = Request::post("/api/blogs")
            .header("authorization", admin_bearer())
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = blog_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()["content-type"], "application/json");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_bad_request() {
        let app = blog_router();
        let (status, body) = send(
            &app,
            "PUT",
            "/api/blogs/abc",
            Some(admin_bearer()),
            Some(json!({ "title": "Whatever" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("abc"));

        let (status, body) = send(&app, "DELETE", "/api/blogs/abc", Some(admin_bearer()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let app = blog_router();
        let post = json!({ "title": "Same title", "published": true });
        let (status, _) = send(&app, "POST", "/api/blogs", Some(admin_bearer()), Some(post.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, "POST", "/api/blogs", Some(admin_bearer()), Some(post)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let app = blog_router();
        let (_, created) = send(
            &app,
            "POST",
            "/api/blogs",
            Some(admin_bearer()),
            Some(json!({ "title": "Original", "published": true })),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/blogs/{id}"),
            Some(admin_bearer()),
            Some(json!({ "title": "Renamed", "slug": "renamed", "published": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["slug"], "renamed");

        let (status, _) = send(&app, "DELETE", &format!("/api/blogs/{id}"), Some(admin_bearer()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Deleting again is still a success
        let (status, _) = send(&app, "DELETE", &format!("/api/blogs/{id}"), Some(admin_bearer()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/blogs/{id}"),
            Some(admin_bearer()),
            Some(json!({ "title": "Gone" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("Blog not found with id: {id}"));
    }
}
