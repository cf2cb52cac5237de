use std::collections::HashMap;

use axum::http::StatusCode;
use color_eyre::eyre::WrapErr as _;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    storage::Storage,
};

pub mod diagram;
pub mod experience;
pub mod fields;
pub mod nav_link;
pub mod project;
pub mod resume;
pub mod service;
pub mod stat;
pub mod technology;
pub mod testimonial;
pub mod video;

pub use diagram::Diagram;
pub use experience::Experience;
pub use nav_link::NavLink;
pub use project::Project;
pub use resume::Resume;
pub use service::Service;
pub use stat::Stat;
pub use technology::Technology;
pub use testimonial::Testimonial;
pub use video::Video;

/// How a field is edited on the admin form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Checkbox,
    /// A stored file reference, with an upload input next to it
    Asset,
    /// Comma separated tags
    Tags,
    /// One entry per line
    Lines,
}

#[derive(Debug, Clone, Copy)]
pub struct FormField {
    /// JSON name of the field in the resource input
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }
}

pub const ORDER_FIELD: FormField = FormField::optional("order", "Order", FieldKind::Number);
pub const ACTIVE_FIELD: FormField = FormField::optional("isActive", "Active", FieldKind::Checkbox);

/// A field holding a stored file reference, and the key its display URL is exposed under
#[derive(Debug, Clone, Copy)]
pub struct AssetField {
    pub name: &'static str,
    pub display_key: &'static str,
}

/// A content type backed by one table, with public and admin REST routes
#[async_trait::async_trait]
pub trait Resource:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + Sized + 'static
{
    const TABLE: &'static str;
    /// Path segment under `/api` and `/admin`, also the upload folder
    const SEGMENT: &'static str;
    const NOUN: &'static str;
    const NOUN_PLURAL: &'static str;
    const ASSETS: &'static [AssetField];
    const FIELDS: &'static [FormField];

    type Input: DeserializeOwned + Send + 'static;
    type Public: Serialize + Send;

    fn id(&self) -> Uuid;

    fn is_active(&self) -> bool;

    /// Text identifying the row in admin tables
    fn title(&self) -> &str;

    /// The stored reference of an asset field, if set
    fn asset(&self, name: &str) -> Option<&str>;

    /// Required fields the input lacks, checked before an insert
    fn missing_fields(input: &Self::Input) -> Vec<&'static str>;

    async fn insert(db: &PgPool, input: Self::Input) -> color_eyre::Result<Self>;

    /// Partial update: absent fields keep their value
    async fn update(db: &PgPool, id: Uuid, input: Self::Input) -> color_eyre::Result<Option<Self>>;

    async fn to_public(self, storage: &Storage) -> Self::Public;

    /// Body of `GET /api/{segment}`
    async fn public_listing(
        state: &AppState,
        _query: &HashMap<String, String>,
        _is_admin: bool,
    ) -> ServerResult<Value, ApiError> {
        let rows = list_active::<Self>(&state.db)
            .await
            .with_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {}", Self::NOUN_PLURAL),
            )?;

        let public =
            futures::future::join_all(rows.into_iter().map(|row| row.to_public(&state.storage)))
                .await;

        serde_json::to_value(public)
            .wrap_err("Failed to serialize listing")
            .with_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {}", Self::NOUN_PLURAL),
            )
    }
}

/// `Project` from `project`, for messages like "Project not found"
pub fn capitalized<R: Resource>() -> String {
    let mut chars = R::NOUN.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn list_all<R: Resource>(db: &PgPool) -> color_eyre::Result<Vec<R>> {
    let sql = format!(
        "SELECT * FROM {} ORDER BY sort_order ASC, created_at ASC",
        R::TABLE
    );
    sqlx::query_as::<_, R>(&sql)
        .fetch_all(db)
        .await
        .wrap_err_with(|| format!("Failed to list {}", R::TABLE))
}

pub async fn list_active<R: Resource>(db: &PgPool) -> color_eyre::Result<Vec<R>> {
    let sql = format!(
        "SELECT * FROM {} WHERE is_active = TRUE ORDER BY sort_order ASC, created_at ASC",
        R::TABLE
    );
    sqlx::query_as::<_, R>(&sql)
        .fetch_all(db)
        .await
        .wrap_err_with(|| format!("Failed to list active {}", R::TABLE))
}

pub async fn find<R: Resource>(db: &PgPool, id: Uuid) -> color_eyre::Result<Option<R>> {
    let sql = format!("SELECT * FROM {} WHERE id = $1", R::TABLE);
    sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to load {} {id}", R::NOUN))
}

/// Returns the deleted row so its assets can be cleaned up
pub async fn delete<R: Resource>(db: &PgPool, id: Uuid) -> color_eyre::Result<Option<R>> {
    let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING *", R::TABLE);
    sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to delete {} {id}", R::NOUN))
}

pub async fn count<R: Resource>(db: &PgPool) -> color_eyre::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(db)
        .await
        .wrap_err_with(|| format!("Failed to count {}", R::TABLE))
}

/// The full record plus a display URL for each asset field
pub async fn admin_view<R: Resource>(record: &R, storage: &Storage) -> color_eyre::Result<Value> {
    let mut value = serde_json::to_value(record).wrap_err("Failed to serialize record")?;

    if let Value::Object(map) = &mut value {
        for asset in R::ASSETS {
            let display = storage.display_url_opt(record.asset(asset.name)).await;
            map.insert(
                asset.display_key.to_string(),
                display.map(Value::String).unwrap_or(Value::Null),
            );
        }
    }

    Ok(value)
}

/// Deletes every owned asset of a removed row
pub async fn delete_assets<R: Resource>(record: &R, storage: &Storage) {
    for asset in R::ASSETS {
        if let Some(stored) = record.asset(asset.name) {
            storage.delete(stored).await;
        }
    }
}

/// Deletes the previous objects of asset fields that changed in an update
pub async fn replace_assets<R: Resource>(previous: &R, current: &R, storage: &Storage) {
    for asset in R::ASSETS {
        storage
            .replace(previous.asset(asset.name), current.asset(asset.name))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized::<Project>(), "Project");
        assert_eq!(capitalized::<NavLink>(), "Nav link");
    }

    #[test]
    fn test_every_segment_is_unique() {
        let segments = [
            Project::SEGMENT,
            Experience::SEGMENT,
            Technology::SEGMENT,
            Testimonial::SEGMENT,
            Service::SEGMENT,
            Video::SEGMENT,
            Diagram::SEGMENT,
            Resume::SEGMENT,
            Stat::SEGMENT,
            NavLink::SEGMENT,
        ];
        let unique: std::collections::HashSet<_> = segments.iter().collect();

        assert_eq!(unique.len(), segments.len());
    }
}
