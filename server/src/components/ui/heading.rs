use maud::{html, Markup, Render};

pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
    pub color: Option<String>,
    pub classes: Option<String>,
    /// Element id, so nav links can jump to the section
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl Heading {
    pub fn new(text: &str, level: HeadingLevel) -> Self {
        Self {
            text: text.to_string(),
            level,
            color: None,
            classes: None,
            anchor: None,
        }
    }

    pub fn h1(text: &str) -> Self {
        Self::new(text, HeadingLevel::H1)
    }

    pub fn h2(text: &str) -> Self {
        Self::new(text, HeadingLevel::H2)
    }

    pub fn h3(text: &str) -> Self {
        Self::new(text, HeadingLevel::H3)
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_classes(mut self, classes: &str) -> Self {
        self.classes = Some(classes.to_string());
        self
    }

    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = Some(anchor.to_string());
        self
    }

    fn default_classes_for_level(&self) -> &'static str {
        match self.level {
            HeadingLevel::H1 => "text-3xl sm:text-4xl font-bold mb-3",
            HeadingLevel::H2 => "text-2xl sm:text-3xl font-bold mb-4",
            HeadingLevel::H3 => "text-lg font-semibold mb-2",
        }
    }
}

impl Render for Heading {
    fn render(&self) -> Markup {
        let default_classes = self.default_classes_for_level();
        let color_class = self.color.as_deref().unwrap_or("text-gray-800");
        let additional_classes = self.classes.as_deref().unwrap_or("");

        let classes = format!("{} {} {}", default_classes, color_class, additional_classes);
        let id = self.anchor.as_deref();

        match self.level {
            HeadingLevel::H1 => html! { h1 id=[id] class=(classes) { (self.text) } },
            HeadingLevel::H2 => html! { h2 id=[id] class=(classes) { (self.text) } },
            HeadingLevel::H3 => html! { h3 id=[id] class=(classes) { (self.text) } },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_becomes_id() {
        let html = Heading::h2("Projects").with_anchor("work").render().into_string();

        assert!(html.starts_with(r#"<h2 id="work""#));
    }

    #[test]
    fn test_no_anchor_no_id() {
        let html = Heading::h3("Skills").render().into_string();

        assert!(!html.contains("id="));
    }
}
