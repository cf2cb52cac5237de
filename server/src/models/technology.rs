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
    fields::missing, list_active, AssetField, FieldKind, FormField, Resource, ACTIVE_FIELD,
    ORDER_FIELD,
};
use crate::{
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    storage::Storage,
};

/// A skill icon, shown in its group on the technologies section
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    #[serde(rename = "category")]
    pub tech_group: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyInput {
    pub name: Option<String>,
    pub icon: Option<String>,
    #[serde(alias = "group")]
    pub category: Option<String>,
    pub order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
}

/// `?format=flat` shape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTechnology {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TechnologyItem {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TechnologyGroup {
    pub title: String,
    pub items: Vec<TechnologyItem>,
}

/// Groups technologies by category.
///
/// Categories listed in `preferred` come first in that order (matched ignoring case and
/// surrounding whitespace), the rest follow alphabetically. Items keep their input order.
pub fn group_technologies(technologies: Vec<FlatTechnology>, preferred: &[String]) -> Vec<TechnologyGroup> {
    let mut groups: Vec<TechnologyGroup> = Vec::new();

    for tech in technologies {
        let item = TechnologyItem {
            id: tech.id,
            name: tech.name,
            icon: tech.icon,
        };
        match groups.iter_mut().find(|g| g.title == tech.category) {
            Some(group) => group.items.push(item),
            None => groups.push(TechnologyGroup {
                title: tech.category,
                items: vec![item],
            }),
        }
    }

    let normalize = |s: &str| s.trim().to_lowercase();
    let rank = |title: &str| {
        preferred
            .iter()
            .position(|p| normalize(p) == normalize(title))
    };

    groups.sort_by(|a, b| match (rank(&a.title), rank(&b.title)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    });

    groups
}

#[async_trait::async_trait]
impl Resource for Technology {
    const TABLE: &'static str = "technologies";
    const SEGMENT: &'static str = "technologies";
    const NOUN: &'static str = "technology";
    const NOUN_PLURAL: &'static str = "technologies";
    const ASSETS: &'static [AssetField] = &[AssetField {
        name: "icon",
        display_key: "iconUrl",
    }];
    const FIELDS: &'static [FormField] = &[
        FormField::required("name", "Name", FieldKind::Text),
        FormField::required("icon", "Icon", FieldKind::Asset),
        FormField::required("category", "Category", FieldKind::Text),
        ORDER_FIELD,
        ACTIVE_FIELD,
    ];

    type Input = TechnologyInput;
    type Public = FlatTechnology;

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
            "icon" => Some(&self.icon),
            _ => None,
        }
    }

    fn missing_fields(input: &TechnologyInput) -> Vec<&'static str> {
        missing(&[
            ("name", input.name.as_deref()),
            ("icon", input.icon.as_deref()),
            ("category", input.category.as_deref()),
        ])
    }

    async fn insert(db: &PgPool, input: TechnologyInput) -> color_eyre::Result<Self> {
        let technology = sqlx::query_as::<_, Technology>(
            "INSERT INTO technologies (name, icon, tech_group, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(input.name.unwrap_or_default())
        .bind(input.icon.unwrap_or_default())
        .bind(input.category.unwrap_or_default())
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .wrap_err("Failed to insert technology")?;

        info!(technology_id = %technology.id, "Created technology");
        Ok(technology)
    }

    async fn update(db: &PgPool, id: Uuid, input: TechnologyInput) -> color_eyre::Result<Option<Self>> {
        sqlx::query_as::<_, Technology>(
            "UPDATE technologies SET
                name = COALESCE($2, name),
                icon = COALESCE($3, icon),
                tech_group = COALESCE($4, tech_group),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.name)
        .bind(input.icon)
        .bind(input.category)
        .bind(input.order)
        .bind(input.is_active)
        .fetch_optional(db)
        .await
        .wrap_err_with(|| format!("Failed to update technology {id}"))
    }

    async fn to_public(self, storage: &Storage) -> FlatTechnology {
        FlatTechnology {
            icon: storage.display_url(&self.icon).await,
            id: self.id,
            name: self.name,
            category: self.tech_group,
            order: self.sort_order,
            is_active: self.is_active,
        }
    }

    async fn public_listing(
        state: &AppState,
        query: &HashMap<String, String>,
        _is_admin: bool,
    ) -> ServerResult<Value, ApiError> {
        let rows = list_active::<Technology>(&state.db).await.with_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch technologies",
        )?;

        let flat =
            futures::future::join_all(rows.into_iter().map(|row| row.to_public(&state.storage)))
                .await;

        let value = if query.get("format").map(String::as_str) == Some("flat") {
            serde_json::to_value(flat)
        } else {
            serde_json::to_value(group_technologies(flat, &state.config.tech_group_order))
        };

        value
            .wrap_err("Failed to serialize technologies")
            .with_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch technologies",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_group_order, DEFAULT_TECH_GROUP_ORDER};

    fn tech(name: &str, category: &str) -> FlatTechnology {
        FlatTechnology {
            id: Uuid::new_v4(),
            name: name.to_string(),
            icon: format!("technologies/{name}.svg"),
            category: category.to_string(),
            order: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_groups_follow_preferred_order_then_alphabetical() {
        let preferred = parse_group_order(DEFAULT_TECH_GROUP_ORDER);
        let groups = group_technologies(
            vec![
                tech("Docker", "Tools & Platforms"),
                tech("Rust", "languages "),
                tech("Figma", "Design"),
                tech("React", "Frontend"),
                tech("Redis", "Databases & Cache"),
                tech("Go", "languages "),
                tech("Ansible", "Automation"),
            ],
            &preferred,
        );

        let titles: Vec<_> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Frontend",
                "languages ",
                "Databases & Cache",
                "Tools & Platforms",
                "Automation",
                "Design"
            ]
        );

        let languages: Vec<_> = groups[1].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(languages, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_group_alias_is_accepted() -> color_eyre::Result<()> {
        let input: TechnologyInput =
            serde_json::from_str(r#"{"name": "Rust", "icon": "r.svg", "group": "Languages"}"#)?;

        assert_eq!(input.category.as_deref(), Some("Languages"));
        assert!(Technology::missing_fields(&input).is_empty());
        Ok(())
    }
}
