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
    fields::missing, list_all, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD,
    ORDER_FIELD,
};
use crate::{
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    storage::Storage,
};

/// A downloadable resume; several can exist per type (e.g. `professional`, `academic`)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resume_type: String,
    pub title: String,
    pub file_url: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInput {
    #[serde(rename = "type")]
    pub resume_type: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "file_url")]
    pub file_url: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicResume {
    pub url: String,
    #[serde(rename = "type")]
    pub resume_type: String,
}

impl Resume {
    /// The first active resume of a type, by order
    pub async fn find_active_by_type(db: &PgPool, resume_type: &str) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes
             WHERE resume_type = $1 AND is_active = TRUE
             ORDER BY sort_order ASC, created_at ASC
             LIMIT 1",
        )
        .bind(resume_type)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to load {resume_type} resume"))
    }
}

#[async_trait::async_trait]
impl Resource for Resume {
    const TABLE: &'static str = "resumes";
    const SEGMENT: &'static str = "resume";
    const NOUN: &'static str = "resume";
    const NOUN_PLURAL: &'static str = "resumes";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "fileUrl",
        display_key: "fileUrlSigned",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("type", "Type", FieldKind::Text),
        FormField::required("title", "Title", FieldKind::Text),
        FormField::required("fileUrl", "File", FieldKind::Asset),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = ResumeInput;
    type Public = PublicResume;

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
            "fileUrl" => Some(&self.file_url),
            _ => None,
        }
    }

    fn missing_fields(input: &ResumeInput) -> Vec<&'static str> {
        missing(&[
            ("type", input.resume_type.as_deref()),
            ("title", input.title.as_deref()),
            ("fileUrl", input.file_url.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: ResumeInput) -> color_eyre::Result<Self> {
        let resume = sqlx::query_as::<_, Resume>(
            "INSERT INTO resumes (resume_type, title, file_url, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(input.resume_type.unwrap_or_default())
        .bind(input.title.unwrap_or_default())
        .bind(input.file_url.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert resume")?;

        info!(resume_id = %resume.id, resume_type = %resume.resume_type, "Created resume");
        Ok(resume)
    }

    async fn update(db: &PgPool, id: Uuid, input: ResumeInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Resume>(
            "UPDATE resumes SET
                resume_type = COALESCE($2, resume_type),
                title = COALESCE($3, title),
                file_url = COALESCE($4, file_url),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.resume_type)
        .bind(input.title)
        .bind(input.file_url)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update resume {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicResume {
        PublicResume {
            url: storage.display_url(&self.file_url).await,
            resume_type: self.resume_type,
        }
    }

    async fn public_listing(
        state: &AppState,
        query: &HashMap<String, String>,
        _is_admin: bool,
    ) -> ServerResult<Value, ApiError> {
        let Some(resume_type) = query.get("type").filter(|t| !t.trim().is_empty()) else {
            let resumes = list_all::<Resume>(&state.db)
                .await
                .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch resumes")?;

            return serde_json::to_value(resumes)
                .wrap_err("Failed to serialize resumes")
                .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch resumes");
        };

        let resume = Resume::find_active_by_type(&state.db, resume_type)
            .await
            .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch resume")?
            .ok_or_else(|| ApiError::not_found("Resume not found"))?;

        serde_json::to_value(resume.to_public(&state.storage).await)
            .wrap_err("Failed to serialize resume")
            .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch resume")
    }
}
