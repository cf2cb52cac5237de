use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{fields::missing, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD, ORDER_FIELD};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    /// The quote itself
    pub testimonial: String,
    pub name: String,
    pub image: String,
    /// Profile link of the person quoted
    pub link: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    pub testimonial: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicTestimonial {
    pub id: Uuid,
    pub testimonial: String,
    pub name: String,
    pub image: String,
    pub link: String,
}

#[async_trait::async_trait]
impl Resource for Testimonial {
    const TABLE: &'static str = "testimonials";
    const SEGMENT: &'static str = "testimonials";
    const NOUN: &'static str = "testimonial";
    const NOUN_PLURAL: &'static str = "testimonials";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "image",
        display_key: "imageUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("testimonial", "Testimonial", FieldKind::TextArea),
        FormField::required("name", "Name", FieldKind::Text),
        FormField::required("image", "Photo", FieldKind::Asset),
        FormField::required("link", "Link", FieldKind::Text),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = TestimonialInput;
    type Public = PublicTestimonial;

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

    fn missing_fields(input: &TestimonialInput) -> Vec<&'static str> {
        missing(&[
            ("testimonial", input.testimonial.as_deref()),
            ("name", input.name.as_deref()),
            ("image", input.image.as_deref()),
            ("link", input.link.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: TestimonialInput) -> color_eyre::Result<Self> {
        let testimonial = sqlx::query_as::<_, Testimonial>(
            "INSERT INTO testimonials (testimonial, name, image, link, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(input.testimonial.unwrap_or_default())
        .bind(input.name.unwrap_or_default())
        .bind(input.image.unwrap_or_default())
        .bind(input.link.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert testimonial")?;

        info!(testimonial_id = %testimonial.id, "Created testimonial");
        Ok(testimonial)
    }

    async fn update(db: &PgPool, id: Uuid, input: TestimonialInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Testimonial>(
            "UPDATE testimonials SET
                testimonial = COALESCE($2, testimonial),
                name = COALESCE($3, name),
                image = COALESCE($4, image),
                link = COALESCE($5, link),
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.testimonial)
        .bind(input.name)
        .bind(input.image)
        .bind(input.link)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update testimonial {id}"))
    }

    async fn to_public(self, storage: &Storage) -> PublicTestimonial {
        PublicTestimonial {
            image: storage.display_url(&self.image).await,
            id: self.id,
            testimonial: self.testimonial,
            name: self.name,
            link: self.link,
        }
    }
}
