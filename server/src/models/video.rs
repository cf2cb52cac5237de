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

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub tags: Json<Vec<Tag>>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "video_url")]
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Option<TagsInput>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub tags: Vec<Tag>,
    pub order: i32,
}

#[async_trait::async_trait]
impl Resource for Video {
    const TABLE: &'static str = "videos";
    const SEGMENT: &'static str = "videos";
    const NOUN: &'static str = "video";
    const NOUN_PLURAL: &'static str = "videos";
    const ASSETS: &'static [AssetField] = &[
        AssetField {
            name: "videoUrl",
            display_key: "videoUrlSigned",
        },
        AssetField {
            name: "thumbnail",
            display_key: "thumbnailSigned",
        },
    ];
    const FIELDS: &'static [FormField] = &[
        FormField::required("title", "Title", FieldKind::Text),
        FormField::required("description", "Description", FieldKind::TextArea),
        FormField::required("videoUrl", "Video", FieldKind::Asset),
        FormField::optional("thumbnail", "Thumbnail", FieldKind::Asset),
        FormField::optional("tags", "Tags (comma separated)", FieldKind::Tags),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = VideoInput;
    type Public = PublicVideo;

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
            "videoUrl" => Some(&self.video_url),
            "thumbnail" => self.thumbnail.as_deref(),
            _ => None,
        }
    }

    fn missing_fields(input: &VideoInput) -> Vec<&'static str> {
        missing(&[
            ("title", input.title.as_deref()),
            ("description", input.description.as_deref()),
            ("videoUrl", input.video_url.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: VideoInput) -> color_eyre::Result<Self> {
        let video = sqlx::query_as::<_, Video>(
            "INSERT INTO videos (title, description, video_url, thumbnail, tags, sort_order, is_active)
             VALUES ($1, $2, $3, NULLIF($4, ''), $5, $6, $7)
             RETURNING *",
        )
        .bind(input.title.unwrap_or_default())
        .bind(input.description.unwrap_or_default())
        .bind(input.video_url.unwrap_or_default())
        .bind(input.thumbnail)
        .bind(Json(input.tags.map(TagsInput::into_tags).unwrap_or_default()))
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert video")?;

        info!(video_id = %video.id, "Created video");
        Ok(video)
    }

    async fn update(db: &PgPool, id: Uuid, input: VideoInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Video>(
            "UPDATE videos SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                video_url = COALESCE($4, video_url),
                thumbnail = CASE WHEN $5::TEXT IS NULL THEN thumbnail ELSE NULLIF($5, '') END,
                tags = COALESCE($6, tags),
                sort_order = COALESCE($7, sort_order),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.video_url)
        .bind(input.thumbnail)
        .bind(input.tags.map(|tags| Json(tags.into_tags())))
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update video {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicVideo {
        PublicVideo {
            video_url: storage.display_url(&self.video_url).await,
            thumbnail: storage.display_url_opt(self.thumbnail.as_deref()).await,
            id: self.id,
            title: self.title,
            description: self.description,
            tags: self.tags.0,
            order: self.sort_order,
        }
    }
}
