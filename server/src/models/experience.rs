use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{
    fields::{missing, LinesInput},
    AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD,
};
use crate::storage::Storage;

/// One entry of the work experience timeline
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company_name: String,
    pub icon: String,
    /// CSS colour behind the company icon
    pub icon_bg: String,
    /// Free text, e.g. `Jan 2022 - Present`
    pub date: String,
    pub points: Json<Vec<String>>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceInput {
    pub title: Option<String>,
    #[serde(alias = "company_name")]
    pub company_name: Option<String>,
    pub icon: Option<String>,
    #[serde(alias = "icon_bg")]
    pub icon_bg: Option<String>,
    pub date: Option<String>,
    pub points: Option<LinesInput>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicExperience {
    pub title: String,
    pub company_name: String,
    pub icon: String,
    #[serde(rename = "iconBg")]
    pub icon_bg: String,
    pub date: String,
    pub points: Vec<String>,
}

#[async_trait::async_trait]
impl Resource for Experience {
    const TABLE: &'static str = "experiences";
    const SEGMENT: &'static str = "experiences";
    const NOUN: &'static str = "experience";
    const NOUN_PLURAL: &'static str = "experiences";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "icon",
        display_key: "iconUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("title", "Title", FieldKind::Text),
        FormField::required("companyName", "Company", FieldKind::Text),
        FormField::required("icon", "Icon", FieldKind::Asset),
        FormField::required("iconBg", "Icon background", FieldKind::Text),
        FormField::required("date", "Date", FieldKind::Text),
        FormField::optional("points", "Points (one per line)", FieldKind::Lines),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = ExperienceInput;
    type Public = PublicExperience;

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

    fn missing_fields(input: &ExperienceInput) -> Vec<&'static str> {
        missing(&[
            ("title", input.title.as_deref()),
            ("companyName", input.company_name.as_deref()),
            ("icon", input.icon.as_deref()),
            ("iconBg", input.icon_bg.as_deref()),
            ("date", input.date.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: ExperienceInput) -> color_eyre::Result<Self> {
        let experience = sqlx::query_as::<_, Experience>(
            "INSERT INTO experiences (title, company_name, icon, icon_bg, date, points, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(input.title.unwrap_or_default())
        .bind(input.company_name.unwrap_or_default())
        .bind(input.icon.unwrap_or_default())
        .bind(input.icon_bg.unwrap_or_default())
        .bind(input.date.unwrap_or_default())
        .bind(Json(input.points.map(LinesInput::into_lines).unwrap_or_default()))
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert experience")?;

        info!(experience_id = %experience.id, "Created experience");
        Ok(experience)
    }

    async fn update(db: &PgPool, id: Uuid, input: ExperienceInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Experience>(
            "UPDATE experiences SET
                title = COALESCE($2, title),
                company_name = COALESCE($3, company_name),
                icon = COALESCE($4, icon),
                icon_bg = COALESCE($5, icon_bg),
                date = COALESCE($6, date),
                points = COALESCE($7, points),
                sort_order = COALESCE($8, sort_order),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.title)
        .bind(input.company_name)
        .bind(input.icon)
        .bind(input.icon_bg)
        .bind(input.date)
        .bind(input.points.map(|points| Json(points.into_lines())))
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update experience {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicExperience {
        PublicExperience {
            icon: storage.display_url(&self.icon).await,
            title: self.title,
            company_name: self.company_name,
            icon_bg: self.icon_bg,
            date: self.date,
            points: self.points.0,
        }
    }
}
