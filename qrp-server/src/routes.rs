use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::SinkExt;
use qrp_blob::{ByteStream, StoredObject, TAG_ROLE};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::state::{AppState, SharedState};

#[derive(Debug, Deserialize)]
struct RoleQuery {
    role: Option<String>,
}

/// Multipart field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/images/{question_id}",
            post(upload_image).get(list_images),
        )
        .route(
            "/images/file/{file_id}",
            get(download_image).delete(delete_image),
        )
        .route(
            "/projects",
            get(list_projects).post(create_project),
        )
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/roles", get(list_roles))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn listing_item(record: &StoredObject) -> Value {
    json!({
        "id": record.id,
        "filename": record.filename,
        "length": record.length,
        "uploadDate": record.upload_date,
        "contentType": record.content_type,
        "role": record.tag(TAG_ROLE),
    })
}

async fn upload_image(
    State(state): State<SharedState>,
    Path(question_id): Path<String>,
    Query(query): Query<RoleQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.images()?;

    // Each field borrows the multipart state, so the matched field must be
    // taken by breaking out of the loop rather than stashed across the next
    // `next_field` call.
    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid multipart request: {e}")))?
        {
            Some(candidate) if candidate.name() == Some(IMAGE_FIELD) => break candidate,
            Some(_) => continue,
            None => return Err(ApiError::validation("No image file provided")),
        }
    };

    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    // The field borrows the request body, so its chunks are forwarded
    // through a bounded channel into the service's payload stream. The
    // bound keeps chunk reads in step with chunk writes; a multipart read
    // failure is surfaced into the stream and aborts the put uncommitted.
    let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Bytes, std::io::Error>>(4);
    let payload: ByteStream = Box::pin(rx);

    let upload = service.upload_image(
        &question_id,
        payload,
        filename,
        content_type,
        query.role.as_deref(),
    );
    let feed = async {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(std::io::Error::other(e))).await;
                    break;
                }
            }
        }
        drop(tx);
    };

    let (record, ()) = tokio::join!(upload, feed);
    let record = record?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "fileId": record.id, "filename": record.filename })),
    ))
}

async fn list_images(
    State(state): State<SharedState>,
    Path(question_id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let service = state.images()?;
    let records = service
        .list_images(&question_id, query.role.as_deref())
        .await?;
    Ok(Json(records.iter().map(listing_item).collect()))
}

async fn download_image(
    State(state): State<SharedState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.images()?;
    let (content_type, payload) = service.download_image(&file_id).await?;
    Ok((
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(payload),
    ))
}

async fn delete_image(
    State(state): State<SharedState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = state.images()?;
    service.delete_image(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state
        .auth_token
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("No auth token configured"))?;
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
    if supplied == expected {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid token"))
    }
}

async fn list_projects(State(state): State<SharedState>) -> Json<Vec<Value>> {
    Json(state.projects.list().await)
}

async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.projects.get(&id).await?))
}

async fn create_project(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    let created = state.projects.create(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.projects.update(&id, data).await?))
}

async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.projects.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_roles(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.roles.list().await)
}
