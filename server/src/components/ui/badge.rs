use maud::{html, Markup, Render};

#[derive(Debug, Clone, PartialEq)]
pub enum BadgeColor {
    Green,
    Gray,
    Indigo,
}

pub struct Badge {
    pub text: String,
    pub color: BadgeColor,
    pub rounded: bool,
}

impl Badge {
    pub fn new(text: &str, color: BadgeColor) -> Self {
        Self {
            text: text.to_string(),
            color,
            rounded: false,
        }
    }

    /// Row visibility in admin tables
    pub fn active(is_active: bool) -> Self {
        if is_active {
            Self::new("Active", BadgeColor::Green).rounded(true)
        } else {
            Self::new("Hidden", BadgeColor::Gray).rounded(true)
        }
    }

    pub fn rounded(mut self, rounded: bool) -> Self {
        self.rounded = rounded;
        self
    }

    fn get_color_classes(&self) -> &'static str {
        match self.color {
            BadgeColor::Green => "bg-green-100 text-green-800",
            BadgeColor::Gray => "bg-gray-100 text-gray-800",
            BadgeColor::Indigo => "bg-indigo-100 text-indigo-800",
        }
    }
}

impl Render for Badge {
    fn render(&self) -> Markup {
        let color_classes = self.get_color_classes();
        let rounded = if self.rounded {
            "rounded-full"
        } else {
            "rounded"
        };

        let classes = format!("{} text-xs font-medium px-2 py-1 {}", color_classes, rounded);

        html! {
            span class=(classes) { (self.text) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_badge() {
        assert!(Badge::active(true).render().into_string().contains("Active"));

        let hidden = Badge::active(false).render().into_string();
        assert!(hidden.contains("Hidden"));
        assert!(hidden.contains("bg-gray-100"));
    }
}
