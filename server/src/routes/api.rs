use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AdminSession, OptionalAdmin},
    errors::{ApiError, ServerResult, WithApiError as _},
    models::{self, capitalized, Resource},
    state::AppState,
};

/// Public, admin and mutating routes for one resource type
pub fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/api/{}", R::SEGMENT);
    let member = format!("/api/{}/:id", R::SEGMENT);
    let admin = format!("/api/admin/{}", R::SEGMENT);

    Router::new()
        .route(
            &collection,
            get(list_public::<R>)
                .post(create::<R>)
                .put(update_from_body::<R>)
                .delete(delete_from_request::<R>),
        )
        .route(
            &member,
            get(show::<R>)
                .put(update::<R>)
                .patch(update::<R>)
                .delete(delete::<R>),
        )
        .route(&admin, get(list_admin::<R>))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid ID"))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::bad_request(format!("Invalid request body: {err}")))
}

/// The `id` of a JSON body, as a string or not at all
fn body_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        _ => None,
    }
}

async fn list_public<R: Resource>(
    State(state): State<AppState>,
    OptionalAdmin(admin): OptionalAdmin,
    Query(query): Query<HashMap<String, String>>,
) -> ServerResult<Json<Value>, ApiError> {
    let listing = R::public_listing(&state, &query, admin.is_some()).await?;

    Ok(Json(listing))
}

async fn show<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<R>, ApiError> {
    let id = parse_id(&id)?;

    let record = models::find::<R>(&state.db, id)
        .await
        .with_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to fetch {}", R::NOUN),
        )?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", capitalized::<R>())))?;

    Ok(Json(record))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<R>), ApiError> {
    let input: R::Input = parse_body(&body)?;

    let missing = R::missing_fields(&input);
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ))
        .into());
    }

    let record = R::insert(&state.db, input).await.with_api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to create {}", R::NOUN),
    )?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn update<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    body: Bytes,
) -> ServerResult<Json<R>, ApiError> {
    let id = parse_id(&id)?;
    let input: R::Input = parse_body(&body)?;

    Ok(Json(apply_update::<R>(&state, id, input).await?))
}

/// `PUT /api/{r}` with the id inside the body
async fn update_from_body<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
    body: Bytes,
) -> ServerResult<Json<R>, ApiError> {
    let value: Value = parse_body(&body)?;
    let id = body_id(&value).ok_or_else(|| ApiError::bad_request("ID required"))?;
    let id = parse_id(&id)?;

    let input: R::Input = serde_json::from_value(value)
        .map_err(|err| ApiError::bad_request(format!("Invalid request body: {err}")))?;

    Ok(Json(apply_update::<R>(&state, id, input).await?))
}

/// Updates the row, then drops stored objects its asset fields no longer point at
pub(crate) async fn apply_update<R: Resource>(
    state: &AppState,
    id: Uuid,
    input: R::Input,
) -> ServerResult<R, ApiError> {
    let not_found = || ApiError::not_found(format!("{} not found", capitalized::<R>()));
    let failed = format!("Failed to update {}", R::NOUN);

    let previous = models::find::<R>(&state.db, id)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, failed.clone())?
        .ok_or_else(not_found)?;

    let updated = R::update(&state.db, id, input)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, failed)?
        .ok_or_else(not_found)?;

    models::replace_assets(&previous, &updated, &state.storage).await;
    info!(table = R::TABLE, %id, "Updated record");

    Ok(updated)
}

async fn delete<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>, ApiError> {
    let id = parse_id(&id)?;

    remove::<R>(&state, id).await?;

    Ok(Json(deleted_message::<R>()))
}

/// `DELETE /api/{r}` with the id in `?id=` or a JSON body
async fn delete_from_request<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ServerResult<Json<Value>, ApiError> {
    let from_query = query.get("id").filter(|id| !id.trim().is_empty()).cloned();
    let id = match from_query {
        Some(id) => Some(id),
        None if body.is_empty() => None,
        None => body_id(&parse_body::<Value>(&body)?),
    };

    let id = id.ok_or_else(|| ApiError::bad_request("ID required"))?;
    let id = parse_id(&id)?;

    remove::<R>(&state, id).await?;

    Ok(Json(deleted_message::<R>()))
}

/// Deletes the row and every stored object it owned
pub(crate) async fn remove<R: Resource>(state: &AppState, id: Uuid) -> ServerResult<R, ApiError> {
    let deleted = models::delete::<R>(&state.db, id)
        .await
        .with_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to delete {}", R::NOUN),
        )?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", capitalized::<R>())))?;

    models::delete_assets(&deleted, &state.storage).await;
    info!(table = R::TABLE, %id, "Deleted record");

    Ok(deleted)
}

fn deleted_message<R: Resource>() -> Value {
    json!({ "message": format!("{} deleted successfully", capitalized::<R>()) })
}

async fn list_admin<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> ServerResult<Json<Vec<Value>>, ApiError> {
    let failed = format!("Failed to fetch {}", R::NOUN_PLURAL);

    let rows = models::list_all::<R>(&state.db)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, failed.clone())?;

    let views = futures::future::join_all(
        rows.iter()
            .map(|row| models::admin_view(row, &state.storage)),
    )
    .await
    .into_iter()
    .collect::<color_eyre::Result<Vec<_>>>()
    .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, failed)?;

    Ok(Json(views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NavLink, Project};

    #[test]
    fn test_body_id() {
        assert_eq!(
            body_id(&json!({ "id": "4b4a8e4e-0f3c-4a53-9bdb-7d2a1d0f8c11" })).as_deref(),
            Some("4b4a8e4e-0f3c-4a53-9bdb-7d2a1d0f8c11")
        );
        assert_eq!(body_id(&json!({ "id": "  " })), None);
        assert_eq!(body_id(&json!({ "id": 42 })), None);
        assert_eq!(body_id(&json!({})), None);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid ID");
    }

    #[test]
    fn test_deleted_message() {
        assert_eq!(
            deleted_message::<Project>(),
            json!({ "message": "Project deleted successfully" })
        );
        assert_eq!(
            deleted_message::<NavLink>(),
            json!({ "message": "Nav link deleted successfully" })
        );
    }
}
