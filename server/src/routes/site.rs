use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse as _, Response},
};
use color_eyre::eyre::{eyre, WrapErr as _};
use maud::html;
use tracing::error;

use crate::{
    components::{
        layout::Page,
        sections::{
            DiagramGrid, ExperienceTimeline, Hero, Navbar, ProjectGrid, ServicesSection, StatsBar,
            TechnologySection, TestimonialList, VideoGrid,
        },
    },
    errors::{ServerError, ServerResult, WithStatus as _},
    models::{
        self, technology::group_technologies, Diagram, Experience, NavLink, Project, Resource,
        Resume, Service, Stat, Technology, Testimonial, Video,
    },
    state::AppState,
};

/// The resume type the hero button links to
pub const HERO_RESUME_TYPE: &str = "professional";

/// Active rows in public shape. A failing query empties the section instead of the page.
async fn section<R: Resource>(state: &AppState) -> Vec<R::Public> {
    match models::list_active::<R>(&state.db).await {
        Ok(rows) => {
            futures::future::join_all(rows.into_iter().map(|row| row.to_public(&state.storage)))
                .await
        }
        Err(err) => {
            error!(error = ?err, table = R::TABLE, "Failed to load section");
            Vec::new()
        }
    }
}

/// `GET /`
pub async fn home(State(state): State<AppState>) -> Page {
    let (nav_links, services, experiences, technologies, projects, videos, stats, diagrams, testimonials) = tokio::join!(
        section::<NavLink>(&state),
        section::<Service>(&state),
        section::<Experience>(&state),
        section::<Technology>(&state),
        section::<Project>(&state),
        section::<Video>(&state),
        section::<Stat>(&state),
        section::<Diagram>(&state),
        section::<Testimonial>(&state),
    );

    let resume_href = match Resume::find_active_by_type(&state.db, HERO_RESUME_TYPE).await {
        Ok(Some(_)) => Some(format!("/resume/{HERO_RESUME_TYPE}")),
        Ok(None) => None,
        Err(err) => {
            error!(error = ?err, "Failed to look up the hero resume");
            None
        }
    };

    let owner = state.config.site_owner.clone();
    let content = html! {
        (Navbar { owner: owner.clone(), links: nav_links })
        (Hero {
            owner: owner.clone(),
            tagline: state.config.site_tagline.clone(),
            resume_href,
        })
        (ServicesSection(services))
        (ExperienceTimeline(experiences))
        (TechnologySection(group_technologies(technologies, &state.config.tech_group_order)))
        (ProjectGrid(projects))
        (VideoGrid(videos))
        (StatsBar(stats))
        (DiagramGrid(diagrams))
        (TestimonialList(testimonials))
    };

    let page = Page::new(format!("{owner} | Portfolio"), Box::new(content)).with_footer(owner);

    if state.chat.is_some() {
        page.with_script(&crate::static_assets::asset_url("chat.js"))
    } else {
        page
    }
}

/// `GET /resume/:type` redirects to a loadable URL of the first active resume of that type
pub async fn resume(
    State(state): State<AppState>,
    Path(resume_type): Path<String>,
) -> ServerResult<Response, StatusCode> {
    let resume = Resume::find_active_by_type(&state.db, &resume_type)
        .await
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(resume) = resume else {
        return Err(ServerError(
            eyre!("No active {resume_type} resume"),
            StatusCode::NOT_FOUND,
        ));
    };

    let url = state.storage.display_url(&resume.file_url).await;
    temporary_redirect(&url)
}

/// A 307 to `url`. Stored URLs are user input, so an invalid header value is an error, not a panic.
fn temporary_redirect(url: &str) -> ServerResult<Response, StatusCode> {
    let location = HeaderValue::try_from(url)
        .wrap_err_with(|| format!("Resume URL is not a valid Location header: {url:?}"))
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_redirect_sets_location() {
        let response = temporary_redirect("/uploads/resume/1_cv.pdf").unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/uploads/resume/1_cv.pdf"
        );
    }

    #[test]
    fn test_temporary_redirect_rejects_control_characters() {
        let err = temporary_redirect("/uploads/resume/cv\n.pdf").unwrap_err();

        assert_eq!(err.1, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
