use serde::{Deserialize, Serialize};

/// A label on a project or video card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Tailwind class used to colour the tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Tag {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }
}

/// Tags as clients send them: a JSON list or comma separated text.
///
/// In text form `name:color` keeps the colour, so admin forms can round-trip it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<TagItem>),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagItem {
    Tag(Tag),
    Name(String),
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<Tag> {
        match self {
            TagsInput::List(items) => items
                .into_iter()
                .map(|item| match item {
                    TagItem::Tag(tag) => Tag {
                        name: tag.name.trim().to_string(),
                        color: tag.color.filter(|c| !c.trim().is_empty()),
                    },
                    TagItem::Name(name) => Tag::named(name.trim()),
                })
                .filter(|tag| !tag.name.is_empty())
                .collect(),
            TagsInput::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| match part.split_once(':') {
                    Some((name, color)) if !color.trim().is_empty() => Tag {
                        name: name.trim().to_string(),
                        color: Some(color.trim().to_string()),
                    },
                    Some((name, _)) => Tag::named(name.trim()),
                    None => Tag::named(part),
                })
                .filter(|tag| !tag.name.is_empty())
                .collect(),
        }
    }
}

/// The inverse of the text form of [TagsInput]
pub fn tags_to_text(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| match &tag.color {
            Some(color) => format!("{}:{color}", tag.name),
            None => tag.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bullet points as a JSON list or newline separated text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinesInput {
    List(Vec<String>),
    Text(String),
}

impl LinesInput {
    pub fn into_lines(self) -> Vec<String> {
        let lines: Vec<String> = match self {
            LinesInput::List(lines) => lines,
            LinesInput::Text(text) => text.lines().map(str::to_string).collect(),
        };

        lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Names of the fields that are absent or blank
pub fn missing(fields: &[(&'static str, Option<&str>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_from_comma_text() -> color_eyre::Result<()> {
        let input: TagsInput = serde_json::from_str(r#""react, tailwind:pink-text-gradient, ,next""#)?;

        assert_eq!(
            input.into_tags(),
            vec![
                Tag::named("react"),
                Tag {
                    name: "tailwind".to_string(),
                    color: Some("pink-text-gradient".to_string())
                },
                Tag::named("next"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_tags_from_mixed_list() -> color_eyre::Result<()> {
        let input: TagsInput = serde_json::from_str(
            r#"[{"name": "rust", "color": "green-text-gradient"}, "axum", {"name": " "}]"#,
        )?;
        let tags = input.into_tags();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].color.as_deref(), Some("green-text-gradient"));
        assert_eq!(tags[1], Tag::named("axum"));
        assert_eq!(tags_to_text(&tags), "rust:green-text-gradient, axum");
        Ok(())
    }

    #[test]
    fn test_lines_from_text_and_list() -> color_eyre::Result<()> {
        let text: LinesInput = serde_json::from_str(r#""Built the API\r\n\n  Shipped the app  ""#)?;
        assert_eq!(text.into_lines(), vec!["Built the API", "Shipped the app"]);

        let list: LinesInput = serde_json::from_str(r#"["one", "", "two"]"#)?;
        assert_eq!(list.into_lines(), vec!["one", "two"]);
        Ok(())
    }

    #[test]
    fn test_missing_treats_blank_as_absent() {
        assert_eq!(
            missing(&[("name", Some("x")), ("icon", Some("  ")), ("title", None)]),
            vec!["icon", "title"]
        );
    }
}
