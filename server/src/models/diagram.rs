use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{fields::missing, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD};
use crate::storage::Storage;

/// An architecture diagram
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicDiagram {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub order: i32,
}

#[async_trait::async_trait]
impl Resource for Diagram {
    const TABLE: &'static str = "diagrams";
    const SEGMENT: &'static str = "diagrams";
    const NOUN: &'static str = "diagram";
    const NOUN_PLURAL: &'static str = "diagrams";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "image",
        display_key: "imageUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("title", "Title", FieldKind::Text),
        FormField::required("description", "Description", FieldKind::TextArea),
        FormField::required("image", "Image", FieldKind::Asset),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = DiagramInput;
    type Public = PublicDiagram;

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
            "image" => Some(&self.image),
            _ => None,
        }
    }

    fn missing_fields(input: &DiagramInput) -> Vec<&'static str> {
        missing(&[
            ("title", input.title.as_deref()),
            ("description", input.description.as_deref()),
            ("image", input.image.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: DiagramInput) -> color_eyre::Result<Self> {
        let diagram = sqlx::query_as::<_, Diagram>(
            "INSERT INTO diagrams (title, description, image, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(input.title.unwrap_or_default())
        .bind(input.description.unwrap_or_default())
        .bind(input.image.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert diagram")?;

        info!(diagram_id = %diagram.id, "Created diagram");
        Ok(diagram)
    }

    async fn update(db: &PgPool, id: Uuid, input: DiagramInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Diagram>(
            "UPDATE diagrams SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image = COALESCE($4, image),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.image)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update diagram {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicDiagram {
        PublicDiagram {
            image: storage.display_url(&self.image).await,
            id: self.id,
            title: self.title,
            description: self.description,
            order: self.sort_order,
        }
    }
}
