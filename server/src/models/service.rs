use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{fields::missing, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD};
use crate::storage::Storage;

/// A service card in the about section
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub icon: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicService {
    pub id: Uuid,
    pub title: String,
    pub icon: String,
}

#[async_trait::async_trait]
impl Resource for Service {
    const TABLE: &'static str = "services";
    const SEGMENT: &'static str = "services";
    const NOUN: &'static str = "service";
    const NOUN_PLURAL: &'static str = "services";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "icon",
        display_key: "iconUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("title", "Title", FieldKind::Text),
        FormField::required("icon", "Icon", FieldKind::Asset),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = ServiceInput;
    type Public = PublicService;

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn asset(&self, name: &str) -> Option<&str> {
        match name {
            "icon" => Some(&self.icon),
            _ => None,
        }
    }

    fn missing_fields(input: &ServiceInput) -> Vec<&'static str> {
        missing(&[
            ("title", input.title.as_deref()),
            ("icon", input.icon.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: ServiceInput) -> color_eyre::Result<Self> {
        let service = sqlx::query_as::<_, Service>(
            "INSERT INTO services (title, icon, sort_order, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(input.title.unwrap_or_default())
        .bind(input.icon.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert service")?;

        info!(service_id = %service.id, "Created service");
        Ok(service)
    }

    async fn update(db: &PgPool, id: Uuid, input: ServiceInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Service>(
            "UPDATE services SET
                title = COALESCE($2, title),
                icon = COALESCE($3, icon),
                sort_order = COALESCE($4, sort_order),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.title)
        .bind(input.icon)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update service {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicService {
        PublicService {
            icon: storage.display_url(&self.icon).await,
            id: self.id,
            title: self.title,
        }
    }
}
