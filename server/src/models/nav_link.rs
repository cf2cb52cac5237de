use std::collections::HashMap;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{
    fields::missing, list_active, list_all, AssetField, FieldKind, FormField, Resource,
    ACTIVE_FIELD, ORDER_FIELD,
};
use crate::{
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    storage::Storage,
};

/// A navbar entry pointing at a section anchor
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    pub id: Uuid,
    /// Anchor id of the section, unique
    pub link_id: String,
    pub title: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLinkInput {
    #[serde(alias = "link_id")]
    pub link_id: Option<String>,
    pub title: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicNavLink {
    /// The anchor id, not the row id
    pub id: String,
    pub title: String,
}

#[async_trait::async_trait]
impl Resource for NavLink {
    const TABLE: &'static str = "nav_links";
    const SEGMENT: &'static str = "navlinks";
    const NOUN: &'static str = "nav link";
    const NOUN_PLURAL: &'static str = "nav links";
    const ASSETS: &'static [AssetField] = &[];
    const FIELDS: &'static [FormField] = &[
        FormField::required("linkId", "Section id", FieldKind::Text),
        FormField::required("title", "Title", FieldKind::Text),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = NavLinkInput;
    type Public = PublicNavLink;

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn asset(&self, _name: &str) -> Option<&str> {
        None
    }

    fn missing_fields(input: &NavLinkInput) -> Vec<&'static str> {
        missing(&[
            ("linkId", input.link_id.as_deref()),
            ("title", input.title.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: NavLinkInput) -> color_eyre::Result<Self> {
        let nav_link = sqlx::query_as::<_, NavLink>(
            "INSERT INTO nav_links (link_id, title, sort_order, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(input.link_id.unwrap_or_default())
        .bind(input.title.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert nav link")?;

        info!(nav_link_id = %nav_link.id, link_id = %nav_link.link_id, "Created nav link");
        Ok(nav_link)
    }

    async fn update(db: &PgPool, id: Uuid, input: NavLinkInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, NavLink>(
            "UPDATE nav_links SET
                link_id = COALESCE($2, link_id),
                title = COALESCE($3, title),
                sort_order = COALESCE($4, sort_order),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.link_id)
        .bind(input.title)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update nav link {id}"))
    }

    async fn to_public(self, _storage: &Storage) -> PublicNavLink {
        PublicNavLink {
            id: self.link_id,
            title: self.title,
        }
    }

    async fn public_listing(
        state: &AppState,
        query: &HashMap<String, String>,
        is_admin: bool,
    ) -> ServerResult<Value, ApiError> {
        if query.get("admin").map(String::as_str) == Some("true") {
            if !is_admin {
                return Err(ApiError::unauthorized().into());
            }

            let links = list_all::<NavLink>(&state.db)
                .await
                .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch nav links")?;

            return serde_json::to_value(links)
                .wrap_err("Failed to serialize nav links")
                .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch nav links");
        }

        let links = list_active::<NavLink>(&state.db)
            .await
            .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch nav links")?;

        let public: Vec<PublicNavLink> = links
            .into_iter()
            .map(|link| PublicNavLink {
                id: link.link_id,
                title: link.title,
            })
            .collect();

        serde_json::to_value(public)
            .wrap_err("Failed to serialize nav links")
            .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch nav links")
    }
}
