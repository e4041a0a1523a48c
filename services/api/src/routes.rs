//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderName, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AdminSession, require_session},
    models::{
        content::{RecordView, ResourceKind},
        lead::{ContactSubmission, SubscribeRequest},
    },
    state::AppState,
    upload::{MAX_REQUEST_BYTES, read_upload_form},
};

/// Create the router for the API service
///
/// Besides the API, files under the configured uploads directory are served
/// at `/uploads` so legacy image paths keep resolving.
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/projects", post(create_project))
        .route("/api/projects/:id", put(update_project).delete(delete_project))
        .route("/api/clients", post(create_client))
        .route("/api/clients/:id", put(update_client).delete(delete_client))
        .route("/api/contacts", get(list_contacts))
        .route("/api/subscribers", get(list_subscribers))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/:id/image", get(project_image))
        .route("/api/clients", get(list_clients))
        .route("/api/clients/:id/image", get(client_image))
        .route("/api/contact", post(submit_contact))
        .route("/api/subscribe", post(subscribe))
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

async fn list_records(state: &AppState, kind: ResourceKind) -> ApiResult<Json<Vec<RecordView>>> {
    Ok(Json(state.content.list(kind).await?))
}

async fn create_record(
    state: &AppState,
    kind: ResourceKind,
    admin: &AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RecordView>)> {
    let form = read_upload_form(multipart).await?;
    let view = state.content.create(kind, form.fields, form.image).await?;
    info!("{} created {} {}", admin.subject, kind.as_str(), view.id);

    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_record(
    state: &AppState,
    kind: ResourceKind,
    admin: &AdminSession,
    id: &str,
    multipart: Multipart,
) -> ApiResult<Json<RecordView>> {
    let id = parse_id(id, kind.label())?;
    let form = read_upload_form(multipart).await?;
    let view = state.content.update(kind, id, form.fields, form.image).await?;
    info!("{} updated {} {}", admin.subject, kind.as_str(), id);

    Ok(Json(view))
}

async fn delete_record(
    state: &AppState,
    kind: ResourceKind,
    admin: &AdminSession,
    id: &str,
) -> ApiResult<Json<Value>> {
    let id = parse_id(id, kind.label())?;
    state.content.remove(kind, id).await?;
    info!("{} deleted {} {}", admin.subject, kind.as_str(), id);

    Ok(Json(json!({
        "message": format!("{} deleted", kind.label())
    })))
}

async fn record_image(
    state: &AppState,
    kind: ResourceKind,
    id: &str,
) -> ApiResult<([(HeaderName, String); 1], Vec<u8>)> {
    let id = parse_id(id, "Image")?;
    let (bytes, content_type) = state.content.get_image(kind, id).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Unparsable ids cannot name a record, so they are reported as missing
fn parse_id(raw: &str, what: &'static str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(what))
}

/// List projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    list_records(&state, ResourceKind::Project).await
}

/// Create a project from a multipart form
pub async fn create_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    create_record(&state, ResourceKind::Project, &admin, multipart).await
}

/// Update a project from a multipart form
pub async fn update_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    update_record(&state, ResourceKind::Project, &admin, &id, multipart).await
}

/// Delete a project and its image
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    delete_record(&state, ResourceKind::Project, &admin, &id).await
}

/// Serve project image bytes
pub async fn project_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    record_image(&state, ResourceKind::Project, &id).await
}

/// List client testimonials
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    list_records(&state, ResourceKind::Client).await
}

/// Create a client testimonial from a multipart form
pub async fn create_client(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    create_record(&state, ResourceKind::Client, &admin, multipart).await
}

/// Update a client testimonial from a multipart form
pub async fn update_client(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    update_record(&state, ResourceKind::Client, &admin, &id, multipart).await
}

/// Delete a client testimonial and its image
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminSession>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    delete_record(&state, ResourceKind::Client, &admin, &id).await
}

/// Serve client image bytes
pub async fn client_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    record_image(&state, ResourceKind::Client, &id).await
}

/// Capture a contact form submission
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactSubmission>,
) -> ApiResult<impl IntoResponse> {
    let receipt = state.leads.submit_contact(payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Subscribe to the newsletter
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> ApiResult<impl IntoResponse> {
    let receipt = state.leads.subscribe(payload.email.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// List contact messages
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.leads.list_contacts().await?))
}

/// List newsletter subscribers
pub async fn list_subscribers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.leads.list_subscribers().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::content::{ContentRecord, ImageAsset},
        repositories::{ContentStore, MemoryContentStore, MemoryLeadStore},
    };
    use axum::{
        body::{Body, to_bytes},
        http::Request,
        response::Response,
    };
    use chrono::{Duration, Utc};
    use common::session::{SessionConfig, SessionService};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----showcase-test-boundary";

    fn test_state() -> AppState {
        AppState::new(
            SessionService::new(&SessionConfig::new("api-test-secret")),
            Arc::new(MemoryContentStore::new()),
            Arc::new(MemoryLeadStore::new()),
        )
    }

    fn session_cookie(state: &AppState) -> String {
        let token = state.sessions.issue("admin").unwrap();
        format!("token={}", token.value)
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&[u8], &str)>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((bytes, content_type)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"project.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn form_request(method: &str, uri: &str, cookie: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let state = test_state();
        let body = multipart_body(
            &[("name", "Harbour"), ("description", "Waterfront homes")],
            None,
        );

        let response = send(&state, form_request("POST", "/api/projects", None, body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let listed = json_body(send(&state, get_request("/api/projects", None)).await).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let state = test_state();
        let token = state
            .sessions
            .issue_at("admin", Utc::now() - Duration::hours(3))
            .unwrap();
        let cookie = format!("token={}", token.value);
        let body = multipart_body(
            &[("name", "Harbour"), ("description", "Waterfront homes")],
            None,
        );

        let response = send(
            &state,
            form_request("POST", "/api/projects", Some(&cookie), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Session expired");
    }

    #[tokio::test]
    async fn test_upload_round_trip() {
        let state = test_state();
        let cookie = session_cookie(&state);
        let image: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        let body = multipart_body(
            &[("name", "Harbour"), ("description", "Waterfront homes")],
            Some((&image, "image/jpeg")),
        );

        let response = send(
            &state,
            form_request("POST", "/api/projects", Some(&cookie), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["_id"].as_str().unwrap().to_string();
        let image_path = format!("/api/projects/{}/image", id);
        assert_eq!(created["image"], image_path);

        let response = send(&state, get_request(&image_path, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.to_vec(), image);

        let listed = json_body(send(&state, get_request("/api/projects", None)).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["image"], image_path);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let state = test_state();
        let cookie = session_cookie(&state);
        let image = vec![0u8; 6 * 1024 * 1024];
        let body = multipart_body(
            &[("name", "Harbour"), ("description", "Waterfront homes")],
            Some((&image, "image/jpeg")),
        );

        let response = send(
            &state,
            form_request("POST", "/api/projects", Some(&cookie), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "File too large. Max size is 5MB."
        );

        let listed = json_body(send(&state, get_request("/api/projects", None)).await).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let state = test_state();
        let cookie = session_cookie(&state);
        let body = multipart_body(
            &[("name", ""), ("description", "Long enough text"), ("designation", "CEO")],
            None,
        );

        let response = send(
            &state,
            form_request("POST", "/api/clients", Some(&cookie), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "name is required");
    }

    #[tokio::test]
    async fn test_update_and_delete_client() {
        let state = test_state();
        let cookie = session_cookie(&state);
        let body = multipart_body(
            &[
                ("name", "Ada"),
                ("description", "Delivered ahead of schedule"),
                ("designation", "CTO"),
            ],
            Some((b"png-bytes", "image/png")),
        );
        let created = json_body(
            send(
                &state,
                form_request("POST", "/api/clients", Some(&cookie), body),
            )
            .await,
        )
        .await;
        let id = created["_id"].as_str().unwrap().to_string();
        let uri = format!("/api/clients/{}", id);

        let body = multipart_body(&[("name", "Ada L.")], None);
        let response = send(&state, form_request("PUT", &uri, Some(&cookie), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["name"], "Ada L.");
        assert_eq!(updated["designation"], "CTO");
        assert_eq!(updated["image"], created["image"]);

        let delete = |cookie: &str| {
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header(header::COOKIE, cookie.to_string())
                .body(Body::empty())
                .unwrap()
        };
        let response = send(&state, delete(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Client deleted");

        let response = send(&state, delete(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, get_request(&format!("{}/image", uri), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let state = test_state();

        let response = send(&state, get_request("/api/projects/not-a-uuid/image", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_newsletter_duplicate() {
        let state = test_state();

        let response = send(&state, json_request("/api/subscribe", json!({"email": "a@x.com"}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, json_request("/api/subscribe", json!({"email": "a@x.com"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Email already subscribed");
    }

    #[tokio::test]
    async fn test_lead_listings_are_gated() {
        let state = test_state();
        let response = send(
            &state,
            json_request(
                "/api/contact",
                json!({"fullName": "Grace Hopper", "email": "grace@navy.mil", "city": "Arlington"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&state, get_request("/api/contacts", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = session_cookie(&state);
        let response = send(&state, get_request("/api/contacts", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let contacts = json_body(response).await;
        assert_eq!(contacts[0]["fullName"], "Grace Hopper");
        assert!(contacts[0]["date"].is_string());

        let response = send(&state, get_request("/api/subscribers", Some(&cookie))).await;
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_legacy_image_path_resolves() {
        let uploads = std::env::temp_dir().join(format!("showcase-uploads-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(uploads.join("harbour.jpg"), b"legacy-jpeg-bytes").unwrap();

        let store = Arc::new(MemoryContentStore::new());
        let now = Utc::now();
        store
            .insert(&ContentRecord {
                id: Uuid::new_v4(),
                kind: ResourceKind::Project,
                name: "Harbour".to_string(),
                description: "Waterfront homes".to_string(),
                designation: None,
                image: ImageAsset::LegacyPath {
                    path: "/uploads/harbour.jpg".to_string(),
                },
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let state = AppState::new(
            SessionService::new(&SessionConfig::new("api-test-secret")),
            store,
            Arc::new(MemoryLeadStore::new()),
        )
        .with_uploads_dir(&uploads);

        let listed = json_body(send(&state, get_request("/api/projects", None)).await).await;
        let path = listed[0]["image"].as_str().unwrap().to_string();
        assert_eq!(path, "/uploads/harbour.jpg");

        let response = send(&state, get_request(&path, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"legacy-jpeg-bytes");

        let response = send(&state, get_request("/uploads/missing.jpg", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(&uploads).unwrap();
    }

    #[tokio::test]
    async fn test_bearer_accepted_behind_stale_cookie() {
        let state = test_state();
        let stale = state
            .sessions
            .issue_at("admin", Utc::now() - Duration::hours(3))
            .unwrap();
        let fresh = state.sessions.issue("admin").unwrap();

        let request = Request::builder()
            .uri("/api/contacts")
            .header(header::COOKIE, format!("token={}", stale.value))
            .header(header::AUTHORIZATION, format!("Bearer {}", fresh.value))
            .body(Body::empty())
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/api/contacts")
            .header(header::COOKIE, format!("token={}", stale.value))
            .body(Body::empty())
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
