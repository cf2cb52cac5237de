use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{fields::missing, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD};
use crate::storage::Storage;

/// A headline number, e.g. `5+ / Years of experience`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub id: Uuid,
    pub label: String,
    pub value: String,
    pub icon: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatInput {
    pub label: Option<String>,
    pub value: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[async_trait::async_trait]
impl Resource for Stat {
    const TABLE: &'static str = "stats";
    const SEGMENT: &'static str = "stats";
    const NOUN: &'static str = "stat";
    const NOUN_PLURAL: &'static str = "stats";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "icon",
        display_key: "iconUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("label", "Label", FieldKind::Text),
        FormField::required("value", "Value", FieldKind::Text),
        FormField::required("icon", "Icon", FieldKind::Asset),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = StatInput;
    /// Stats are public as full records, with the icon mapped
    type Public = Stat;

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn title(&self) -> &str {
        &self.label
    }

    fn asset(&self, name: &str) -> Option<&str> {
        match name {
            "icon" => Some(&self.icon),
            _ => None,
        }
    }

    fn missing_fields(input: &StatInput) -> Vec<&'static str> {
        missing(&[
            ("label", input.label.as_deref()),
            ("value", input.value.as_deref()),
            ("icon", input.icon.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: StatInput) -> color_eyre::Result<Self> {
        let stat = sqlx::query_as::<_, Stat>(
            "INSERT INTO stats (label, value, icon, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(input.label.unwrap_or_default())
        .bind(input.value.unwrap_or_default())
        .bind(input.icon.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert stat")?;

        info!(stat_id = %stat.id, "Created stat");
        Ok(stat)
    }

    async fn update(db: &PgPool, id: Uuid, input: StatInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Stat>(
            "UPDATE stats SET
                label = COALESCE($2, label),
                value = COALESCE($3, value),
                icon = COALESCE($4, icon),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.label)
        .bind(input.value)
        .bind(input.icon)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update stat {id}"))
    }

    async fn to_public(mut self, storage: &Storage) -> Stat {
        self.icon = storage.display_url(&self.icon).await;
        self
    }
}
