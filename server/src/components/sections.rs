//! Sections of the public portfolio page. Each renders nothing when it has no rows.
use maud::{html, Markup, Render};

use crate::{
    components::ui::{
        button::{Button, ButtonSize},
        heading::Heading,
    },
    models::{
        diagram::PublicDiagram,
        experience::PublicExperience,
        fields::Tag,
        nav_link::PublicNavLink,
        project::PublicProject,
        service::PublicService,
        technology::TechnologyGroup,
        testimonial::PublicTestimonial,
        video::PublicVideo,
        Stat,
    },
};

const SECTION_CLASSES: &str = "max-w-6xl mx-auto px-6 py-16";

fn section_heading(eyebrow: &str, title: &str, anchor: &str) -> Markup {
    html! {
        p class="text-sm uppercase tracking-widest text-slate-400" { (eyebrow) }
        (Heading::h2(title).with_anchor(anchor).with_color("text-white").render())
    }
}

fn tag_list(tags: &[Tag]) -> Markup {
    html! {
        div class="flex flex-wrap gap-2 mt-3" {
            @for tag in tags {
                span class={"text-sm " (tag.color.as_deref().unwrap_or("text-sky-400"))} { "#" (tag.name) }
            }
        }
    }
}

pub struct Navbar {
    pub owner: String,
    pub links: Vec<PublicNavLink>,
}

impl Render for Navbar {
    fn render(&self) -> Markup {
        html! {
            nav class="sticky top-0 z-20 bg-slate-950/90 backdrop-blur border-b border-slate-800" {
                div class="max-w-6xl mx-auto px-6 py-4 flex items-center justify-between" {
                    a href="/" class="flex items-center gap-2 font-bold text-white" {
                        img src=(crate::static_assets::asset_url("favicon.svg")) alt="" class="w-8 h-8";
                        (self.owner)
                    }
                    ul class="hidden sm:flex gap-6 text-slate-300" {
                        @for link in &self.links {
                            li { a href={"#" (link.id)} class="hover:text-white" { (link.title) } }
                        }
                    }
                }
            }
        }
    }
}

pub struct Hero {
    pub owner: String,
    pub tagline: String,
    pub resume_href: Option<String>,
}

impl Render for Hero {
    fn render(&self) -> Markup {
        html! {
            header class={(SECTION_CLASSES) " pt-24"} {
                h1 class="text-4xl sm:text-6xl font-black text-white" {
                    "Hi, I'm " span class="text-violet-400" { (self.owner) }
                }
                p class="mt-4 text-lg sm:text-2xl text-slate-300 max-w-2xl" { (self.tagline) }

                @if let Some(href) = &self.resume_href {
                    div class="mt-8 w-fit" {
                        (Button::primary("Download resume")
                            .href(href)
                            .size(ButtonSize::Large)
                            .icon("fa-solid fa-file-arrow-down")
                            .render())
                    }
                }
            }
        }
    }
}

pub struct ServicesSection(pub Vec<PublicService>);

impl Render for ServicesSection {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("Introduction", "Overview.", "about"))
                div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-6 mt-8" {
                    @for service in &self.0 {
                        div class="rounded-2xl bg-slate-900 border border-slate-800 p-6 flex flex-col items-center gap-4" {
                            img src=(service.icon) alt=(service.title) class="w-16 h-16 object-contain";
                            h3 class="text-white font-bold text-center" { (service.title) }
                        }
                    }
                }
            }
        }
    }
}

pub struct ExperienceTimeline(pub Vec<PublicExperience>);

impl Render for ExperienceTimeline {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("What I have done so far", "Work Experience.", "experience"))
                ol class="mt-8 border-l border-slate-700 space-y-10" {
                    @for experience in &self.0 {
                        li class="ml-8 relative" {
                            span class="absolute -left-14 top-0 w-12 h-12 rounded-full flex items-center justify-center"
                                style={"background:" (experience.icon_bg)} {
                                img src=(experience.icon) alt=(experience.company_name) class="w-3/5 h-3/5 object-contain";
                            }
                            p class="text-sm text-slate-400" { (experience.date) }
                            h3 class="text-xl font-bold text-white" { (experience.title) }
                            p class="text-slate-300 font-semibold" { (experience.company_name) }
                            ul class="mt-3 list-disc ml-5 space-y-1 text-slate-300" {
                                @for point in &experience.points {
                                    li { (point) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub struct TechnologySection(pub Vec<TechnologyGroup>);

impl Render for TechnologySection {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("My toolbox", "Technologies.", "tech"))
                @for group in &self.0 {
                    div class="mt-8" {
                        (Heading::h3(&group.title).with_color("text-slate-200").render())
                        div class="flex flex-wrap gap-6" {
                            @for item in &group.items {
                                div class="flex flex-col items-center gap-2 w-20" title=(item.name) {
                                    img src=(item.icon) alt=(item.name) class="w-14 h-14 object-contain";
                                    span class="text-xs text-slate-400 text-center" { (item.name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub struct ProjectGrid(pub Vec<PublicProject>);

impl Render for ProjectGrid {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("My work", "Projects.", "work"))
                div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6 mt-8" {
                    @for project in &self.0 {
                        article class="rounded-2xl bg-slate-900 border border-slate-800 p-5" {
                            a href=(project.deploy_link) target="_blank" rel="noopener" {
                                img src=(project.image) alt=(project.name) class="w-full h-48 object-cover rounded-xl";
                            }
                            div class="flex items-center justify-between mt-4" {
                                h3 class="text-white text-xl font-bold" { (project.name) }
                                span class="text-xs text-slate-400" { (project.platform) }
                            }
                            p class="mt-2 text-slate-300 text-sm" { (project.description) }
                            (tag_list(&project.tags))
                            @if let Some(source) = &project.source_code_link {
                                a href=(source) target="_blank" rel="noopener" class="inline-block mt-3 text-sm text-violet-400 hover:underline" {
                                    i class="fa-brands fa-github mr-1" {}
                                    "Source"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub struct VideoGrid(pub Vec<PublicVideo>);

impl Render for VideoGrid {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("Walkthroughs", "Videos.", "videos"))
                div class="grid grid-cols-1 md:grid-cols-2 gap-6 mt-8" {
                    @for video in &self.0 {
                        article class="rounded-2xl bg-slate-900 border border-slate-800 p-5" {
                            video controls preload="metadata" poster=[video.thumbnail.as_deref()] class="w-full rounded-xl" {
                                source src=(video.video_url);
                            }
                            h3 class="mt-4 text-white text-lg font-bold" { (video.title) }
                            p class="mt-2 text-slate-300 text-sm" { (video.description) }
                            (tag_list(&video.tags))
                        }
                    }
                }
            }
        }
    }
}

pub struct StatsBar(pub Vec<Stat>);

impl Render for StatsBar {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                div id="stats" class="grid grid-cols-2 md:grid-cols-4 gap-6" {
                    @for stat in &self.0 {
                        div class="rounded-2xl bg-slate-900 border border-slate-800 p-6 text-center" {
                            img src=(stat.icon) alt="" class="w-10 h-10 mx-auto object-contain";
                            p class="mt-3 text-3xl font-black text-white" { (stat.value) }
                            p class="text-sm text-slate-400" { (stat.label) }
                        }
                    }
                }
            }
        }
    }
}

pub struct DiagramGrid(pub Vec<PublicDiagram>);

impl Render for DiagramGrid {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("How things fit together", "Architecture.", "diagrams"))
                div class="grid grid-cols-1 md:grid-cols-2 gap-6 mt-8" {
                    @for diagram in &self.0 {
                        figure class="rounded-2xl bg-slate-900 border border-slate-800 p-5" {
                            a href=(diagram.image) target="_blank" rel="noopener" {
                                img src=(diagram.image) alt=(diagram.title) class="w-full rounded-xl bg-white";
                            }
                            figcaption class="mt-4" {
                                h3 class="text-white font-bold" { (diagram.title) }
                                p class="text-slate-300 text-sm mt-1" { (diagram.description) }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub struct TestimonialList(pub Vec<PublicTestimonial>);

impl Render for TestimonialList {
    fn render(&self) -> Markup {
        if self.0.is_empty() {
            return html! {};
        }

        html! {
            section class=(SECTION_CLASSES) {
                (section_heading("What others say", "Testimonials.", "testimonials"))
                div class="grid grid-cols-1 md:grid-cols-3 gap-6 mt-8" {
                    @for testimonial in &self.0 {
                        blockquote class="rounded-2xl bg-slate-900 border border-slate-800 p-6" {
                            p class="text-slate-200" { "\u{201c}" (testimonial.testimonial) "\u{201d}" }
                            footer class="mt-5 flex items-center gap-3" {
                                img src=(testimonial.image) alt=(testimonial.name) class="w-10 h-10 rounded-full object-cover";
                                a href=(testimonial.link) target="_blank" rel="noopener" class="text-white font-semibold hover:underline" {
                                    (testimonial.name)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_empty_sections_render_nothing() {
        assert!(ProjectGrid(vec![]).render().into_string().is_empty());
        assert!(StatsBar(vec![]).render().into_string().is_empty());
        assert!(TestimonialList(vec![]).render().into_string().is_empty());
    }

    #[test]
    fn test_project_grid_shows_tags_and_source() {
        let html = ProjectGrid(vec![PublicProject {
            name: "Car rental".to_string(),
            description: "Book cars".to_string(),
            tags: vec![Tag {
                name: "react".to_string(),
                color: Some("text-blue-400".to_string()),
            }],
            image: "/uploads/projects/1_car.png".to_string(),
            source_code_link: Some("https://github.com/example/cars".to_string()),
            deploy_link: "https://cars.example.com".to_string(),
            platform: "Web".to_string(),
        }])
        .render()
        .into_string();

        assert!(html.contains("Car rental"));
        assert!(html.contains("#react"));
        assert!(html.contains("text-blue-400"));
        assert!(html.contains("https://github.com/example/cars"));
        assert!(html.contains(r#"id="work""#));
    }

    #[test]
    fn test_navbar_links_to_anchors() {
        let html = Navbar {
            owner: "Ada".to_string(),
            links: vec![PublicNavLink {
                id: "work".to_string(),
                title: "Work".to_string(),
            }],
        }
        .render()
        .into_string();

        assert!(html.contains(r##"href="#work""##));
    }

    #[test]
    fn test_testimonial_escapes_text() {
        let html = TestimonialList(vec![PublicTestimonial {
            id: Uuid::new_v4(),
            testimonial: "<b>great</b>".to_string(),
            name: "Grace".to_string(),
            image: "/uploads/testimonials/g.png".to_string(),
            link: "https://example.com".to_string(),
        }])
        .render()
        .into_string();

        assert!(html.contains("&lt;b&gt;great&lt;/b&gt;"));
    }
}
