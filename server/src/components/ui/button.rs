use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonVariant {
    Primary,
    Secondary,
    Danger,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonSize {
    Small,
    Medium,
    Large,
}

/// A `<button>`, or an `<a>` styled as one when it has an `href`
pub struct Button {
    pub text: String,
    pub href: Option<String>,
    pub variant: ButtonVariant,
    pub size: ButtonSize,
    pub full_width: bool,
    /// Font Awesome classes, rendered before the text
    pub icon: Option<String>,
    pub submit: bool,
}

impl Button {
    fn with_variant(text: &str, variant: ButtonVariant) -> Self {
        Self {
            text: text.to_string(),
            href: None,
            variant,
            size: ButtonSize::Medium,
            full_width: false,
            icon: None,
            submit: false,
        }
    }

    pub fn primary(text: &str) -> Self {
        Self::with_variant(text, ButtonVariant::Primary)
    }

    pub fn secondary(text: &str) -> Self {
        Self::with_variant(text, ButtonVariant::Secondary)
    }

    pub fn danger(text: &str) -> Self {
        Self::with_variant(text, ButtonVariant::Danger)
    }

    pub fn link(text: &str) -> Self {
        Self::with_variant(text, ButtonVariant::Link)
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn full_width(mut self) -> Self {
        self.full_width = true;
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Submits the surrounding form
    pub fn submit(mut self) -> Self {
        self.submit = true;
        self
    }

    fn classes(&self) -> String {
        let variant = match self.variant {
            ButtonVariant::Primary => "bg-indigo-600 hover:bg-indigo-700 text-white shadow-sm",
            ButtonVariant::Secondary => {
                "bg-white hover:bg-gray-50 text-indigo-600 border border-indigo-300 shadow-sm"
            }
            ButtonVariant::Danger => "bg-red-600 hover:bg-red-700 text-white shadow-sm",
            ButtonVariant::Link => "bg-transparent text-gray-600 hover:text-indigo-700 hover:underline",
        };
        let size = match self.size {
            ButtonSize::Small => "py-1 px-2.5 text-xs",
            ButtonSize::Medium => "py-2 px-4 text-sm",
            ButtonSize::Large => "py-3 px-6 text-base",
        };
        let width = if self.full_width { "w-full" } else { "" };

        format!("{variant} {size} {width} inline-flex items-center justify-center gap-2 font-medium rounded-lg transition-colors cursor-pointer")
    }
}

impl Render for Button {
    fn render(&self) -> Markup {
        let classes = self.classes();
        let inner = html! {
            @if let Some(icon) = &self.icon {
                i class=(icon) {}
            }
            (self.text)
        };

        match &self.href {
            Some(href) => html! { a href=(href) class=(classes) { (inner) } },
            None => {
                let button_type = if self.submit { "submit" } else { "button" };
                html! { button type=(button_type) class=(classes) { (inner) } }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_button_renders_anchor() {
        let html = Button::secondary("Edit")
            .href("/admin/projects/1/edit")
            .render()
            .into_string();

        assert!(html.starts_with("<a href=\"/admin/projects/1/edit\""));
        assert!(html.contains("Edit"));
    }

    #[test]
    fn test_submit_button_with_icon() {
        let html = Button::danger("Delete")
            .submit()
            .size(ButtonSize::Small)
            .icon("fa-solid fa-trash")
            .render()
            .into_string();

        assert!(html.contains(r#"type="submit""#));
        assert!(html.contains("bg-red-600"));
        assert!(html.find("fa-trash") < html.find("Delete"));
    }

    #[test]
    fn test_plain_button_does_not_submit() {
        let html = Button::link("Cancel").render().into_string();
        assert!(html.contains(r#"type="button""#));
    }
}
