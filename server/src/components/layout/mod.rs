use maud::{html, Markup, Render, DOCTYPE};

use crate::components::ui::heading::Heading;

pub struct Page {
    pub title: String,
    pub content: Box<dyn Render>,
    pub footer: Option<String>,
    pub scripts: Vec<String>,
}

impl Page {
    pub fn new(title: String, content: Box<dyn Render>) -> Self {
        Self {
            title,
            content,
            footer: None,
            scripts: Vec::new(),
        }
    }

    /// Footer credit line, e.g. the site owner
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_script(mut self, src: &str) -> Self {
        self.scripts.push(src.to_string());
        self
    }
}

impl Render for Page {
    fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src="https://unpkg.com/@tailwindcss/browser@4" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    link rel="icon" type="image/svg+xml" href=(crate::static_assets::asset_url("favicon.svg"));
                }

                body class="min-h-screen bg-slate-950 text-slate-100" {
                    (self.content.render())

                    @if let Some(footer) = &self.footer {
                        footer class="py-8 text-center text-sm text-slate-400" {
                            p { "© " (chrono::Utc::now().format("%Y")) " " (footer) }
                        }
                    }

                    @for script in &self.scripts {
                        script src=(script) defer {}
                    }
                }
            }
        }
    }
}

impl axum::response::IntoResponse for Page {
    fn into_response(self) -> axum::response::Response {
        self.render().into_response()
    }
}

pub struct Card {
    pub content: Box<dyn Render>,
    pub max_width: Option<String>,
}

impl Card {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, max_width: &str) -> Self {
        self.max_width = Some(max_width.to_string());
        self
    }
}

impl Render for Card {
    fn render(&self) -> Markup {
        let width_class = self.max_width.as_deref().unwrap_or("max-w-md");

        html! {
            div class={(width_class) " mx-auto bg-white text-gray-900 rounded-lg sm:rounded-xl border border-gray-100 shadow-md sm:shadow-lg overflow-hidden w-full"} {
                (self.content.render())
            }
        }
    }
}

pub struct ContentSection {
    pub padding: String,
    pub content: Box<dyn Render>,
}

impl ContentSection {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            padding: "px-8 py-6".to_string(),
            content: Box::new(content),
        }
    }

    pub fn with_padding(mut self, padding: &str) -> Self {
        self.padding = padding.to_string();
        self
    }
}

impl Render for ContentSection {
    fn render(&self) -> Markup {
        html! {
            div class=(self.padding) {
                (self.content.render())
            }
        }
    }
}

/// One entry of the admin sidebar
pub struct AdminNavItem {
    pub href: String,
    pub label: String,
}

/// Admin chrome: sidebar of resource pages, page heading and an optional flash message
pub struct AdminShell {
    pub heading: String,
    pub nav: Vec<AdminNavItem>,
    pub active: Option<String>,
    pub error: Option<String>,
    pub content: Box<dyn Render>,
}

impl AdminShell {
    pub fn new(heading: &str, nav: Vec<AdminNavItem>, content: impl Render + 'static) -> Self {
        Self {
            heading: heading.to_string(),
            nav,
            active: None,
            error: None,
            content: Box::new(content),
        }
    }

    pub fn active(mut self, href: &str) -> Self {
        self.active = Some(href.to_string());
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

impl Render for AdminShell {
    fn render(&self) -> Markup {
        html! {
            div class="min-h-screen flex bg-gray-50 text-gray-900" {
                aside class="w-56 shrink-0 bg-indigo-900 text-indigo-100 p-4 space-y-1" {
                    a href="/admin" class="block text-lg font-bold text-white mb-4" { "Portfolio admin" }
                    @for item in &self.nav {
                        @let is_active = self.active.as_deref() == Some(item.href.as_str());
                        a href=(item.href)
                          class={"block rounded px-3 py-2 text-sm " (if is_active { "bg-indigo-700 text-white" } else { "hover:bg-indigo-800" })} {
                            (item.label)
                        }
                    }
                    a href="/admin/logout" class="block rounded px-3 py-2 text-sm mt-6 hover:bg-indigo-800" { "Log out" }
                }

                main class="flex-1 p-6 md:p-10 space-y-6" {
                    (Heading::h1(&self.heading).render())

                    @if let Some(error) = &self.error {
                        div class="rounded-lg border border-red-200 bg-red-50 px-4 py-3 text-red-800" role="alert" {
                            (error)
                        }
                    }

                    (self.content.render())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_shell_marks_active_link_and_error() {
        let nav = vec![
            AdminNavItem {
                href: "/admin/projects".to_string(),
                label: "Projects".to_string(),
            },
            AdminNavItem {
                href: "/admin/stats".to_string(),
                label: "Stats".to_string(),
            },
        ];

        let html = AdminShell::new("Projects", nav, html! { p { "body" } })
            .active("/admin/projects")
            .error(Some("Missing required fields: name".to_string()))
            .render()
            .into_string();

        assert!(html.contains("bg-indigo-700 text-white\">Projects"));
        assert!(html.contains("Missing required fields: name"));
    }

    #[test]
    fn test_page_escapes_title() {
        let html = Page::new("<Admin>".to_string(), Box::new(html! {}))
            .with_footer("Ada")
            .render()
            .into_string();

        assert!(html.contains("&lt;Admin&gt;"));
        assert!(html.contains("Ada"));
    }
}
