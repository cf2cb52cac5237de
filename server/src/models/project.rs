use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{
    fields::{missing, Tag, TagsInput},
    AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD,
};
use crate::storage::Storage;

/// A project card in the work section
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub tags: Json<Vec<Tag>>,
    /// Screenshot, as stored by the upload (URL or key)
    pub image: String,
    pub source_code_link: Option<String>,
    pub deploy_link: String,
    /// e.g. `Web`, `Mobile`
    pub platform: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<TagsInput>,
    pub image: Option<String>,
    #[serde(alias = "source_code_link")]
    pub source_code_link: Option<String>,
    #[serde(alias = "deploy_link")]
    pub deploy_link: Option<String>,
    pub platform: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicProject {
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub image: String,
    pub source_code_link: Option<String>,
    pub deploy_link: String,
    pub platform: String,
}

#[async_trait::async_trait]
impl Resource for Project {
    const TABLE: &'static str = "projects";
    const SEGMENT: &'static str = "projects";
    const NOUN: &'static str = "project";
    const NOUN_PLURAL: &'static str = "projects";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "image",
        display_key: "imageUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("name", "Name", FieldKind::Text),
        FormField::required("description", "Description", FieldKind::TextArea),
        FormField::optional("tags", "Tags (comma separated, name:color)", FieldKind::Tags),
        FormField::required("image", "Image", FieldKind::Asset),
        FormField::optional("sourceCodeLink", "Source code link", FieldKind::Text),
        FormField::required("deployLink", "Deploy link", FieldKind::Text),
        FormField::optional("platform", "Platform", FieldKind::Text),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = ProjectInput;
    type Public = PublicProject;

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn asset(&self, name: &str) -> Option<&str> {
        match name {
            "image" => Some(&self.image),
            _ => None,
        }
    }

    fn missing_fields(input: &ProjectInput) -> Vec<&'static str> {
        missing(&[
            ("name", input.name.as_deref()),
            ("description", input.description.as_deref()),
            ("image", input.image.as_deref()),
            ("deployLink", input.deploy_link.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: ProjectInput) -> color_eyre::Result<Self> {
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, tags, image, source_code_link, deploy_link, platform, sort_order, is_active)
             VALUES ($1, $2, $3, $4, NULLIF($5, ''), $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(input.name.unwrap_or_default())
        .bind(input.description.unwrap_or_default())
        .bind(Json(input.tags.map(TagsInput::into_tags).unwrap_or_default()))
        .bind(input.image.unwrap_or_default())
        .bind(input.source_code_link)
        .bind(input.deploy_link.unwrap_or_default())
        .bind(
            input
                .platform
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "Web".to_string()),
        )
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert project")?;

        info!(project_id = %project.id, "Created project");
        Ok(project)
    }

    async fn update(db: &PgPool, id: Uuid, input: ProjectInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Project>(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                tags = COALESCE($4, tags),
                image = COALESCE($5, image),
                source_code_link = CASE WHEN $6::TEXT IS NULL THEN source_code_link ELSE NULLIF($6, '') END,
                deploy_link = COALESCE($7, deploy_link),
                platform = COALESCE(NULLIF($8, ''), platform),
                sort_order = COALESCE($9, sort_order),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.tags.map(|tags| Json(tags.into_tags())))
        .bind(input.image)
        .bind(input.source_code_link)
        .bind(input.deploy_link)
        .bind(input.platform)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update project {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicProject {
        PublicProject {
            image: storage.display_url(&self.image).await,
            name: self.name,
            description: self.description,
            tags: self.tags.0,
            source_code_link: self.source_code_link,
            deploy_link: self.deploy_link,
            platform: self.platform,
        }
    }
}
