use std::collections::HashMap;

use axum::{
    extract::{Form, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use color_eyre::eyre::{eyre, WrapErr as _};
use maud::{html, Markup, Render};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::{error, info};
use uuid::Uuid;

use super::{
    api,
    upload::{self, FilePart},
};
use crate::{
    auth::{self, AdminPage, OptionalAdmin},
    components::{
        form::{FileField, Form as HtmlForm, InputField, TextArea, ToggleSwitch},
        layout::{AdminNavItem, AdminShell, Card, ContentSection, Page},
        ui::{
            badge::{Badge, BadgeColor},
            button::{Button, ButtonSize},
            heading::Heading,
        },
    },
    cookies::CookieJar,
    errors::{ServerError, ServerResult, WithStatus as _},
    models::{
        self, capitalized,
        fields::{tags_to_text, Tag},
        Diagram, Experience, FieldKind, FormField, NavLink, Project, Resource, Resume, Service,
        Stat, Technology, Testimonial, Video,
    },
    state::AppState,
};

const ADMIN_SCRIPT: &str = "admin.js";

/// Dashboard, login and logout. Resource pages come from [resource_routes].
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/login", get(login_page).post(login_submit))
        .route("/admin/logout", get(logout))
}

/// List, create, edit and delete pages for one resource type
pub fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/admin/{}", R::SEGMENT);
    let member = format!("/admin/{}/:id", R::SEGMENT);
    let edit = format!("/admin/{}/:id/edit", R::SEGMENT);
    let delete = format!("/admin/{}/:id/delete", R::SEGMENT);

    Router::new()
        .route(&collection, get(resource_page::<R>).post(create_from_form::<R>))
        .route(&member, post(update_from_form::<R>))
        .route(&edit, get(edit_page::<R>))
        .route(&delete, post(delete_from_form::<R>))
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn collection_path<R: Resource>() -> String {
    format!("/admin/{}", R::SEGMENT)
}

fn nav_item<R: Resource>() -> AdminNavItem {
    AdminNavItem {
        href: collection_path::<R>(),
        label: title_case(R::NOUN_PLURAL),
    }
}

fn admin_nav() -> Vec<AdminNavItem> {
    vec![
        nav_item::<Project>(),
        nav_item::<Experience>(),
        nav_item::<Technology>(),
        nav_item::<Testimonial>(),
        nav_item::<Service>(),
        nav_item::<Video>(),
        nav_item::<Diagram>(),
        nav_item::<Resume>(),
        nav_item::<Stat>(),
        nav_item::<NavLink>(),
    ]
}

fn admin_page(title: &str, shell: AdminShell) -> Page {
    Page::new(format!("{title} | Admin"), Box::new(shell))
        .with_script(&crate::static_assets::asset_url(ADMIN_SCRIPT))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn login_markup(error: Option<&str>) -> Page {
    let login_form = html! {
        (Heading::h1("Admin login").with_classes("text-center").render())

        @if let Some(error) = error {
            div class="mb-4 rounded-lg border border-red-200 bg-red-50 px-4 py-3 text-red-800" role="alert" { (error) }
        }

        (HtmlForm::new("/admin/login", "post", html! {
            (InputField::new("email")
                .label("Email")
                .input_type("email")
                .placeholder("you@example.com")
                .required(true)
                .render())

            (InputField::new("password")
                .label("Password")
                .input_type("password")
                .required(true)
                .render())

            (Button::primary("Log in")
                .full_width()
                .size(ButtonSize::Large)
                .submit()
                .icon("fa-solid fa-right-to-bracket")
                .render())
        }).render())

        div class="mt-6 pt-4 border-t border-gray-200 text-center" {
            a href="/" class="text-indigo-600 hover:text-indigo-800" { "Back to the site" }
        }
    };

    let content = html! {
        div class="py-16 px-4" {
            (Card::new(ContentSection::new(login_form)).with_max_width("max-w-md").render())
        }
    };

    Page::new("Login | Admin".to_string(), Box::new(content))
}

/// `GET /admin/login`
async fn login_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/admin").into_response();
    }

    login_markup(None).into_response()
}

/// `POST /admin/login`
async fn login_submit(
    State(state): State<AppState>,
    cookies: CookieJar,
    Form(form): Form<LoginForm>,
) -> ServerResult<Response, StatusCode> {
    let session = auth::login_with_password(&state, &cookies, &form.email, &form.password)
        .await
        .wrap_err("Failed to log in")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?;

    match session {
        Some(_) => Ok(Redirect::to("/admin").into_response()),
        None => Ok((
            StatusCode::UNAUTHORIZED,
            login_markup(Some("Invalid email or password")),
        )
            .into_response()),
    }
}

/// `GET /admin/logout`
async fn logout(State(state): State<AppState>, cookies: CookieJar) -> ServerResult<Redirect, StatusCode> {
    auth::end_session(&state, &cookies)
        .await
        .wrap_err("Failed to end admin session")?;

    info!("Admin logged out");
    Ok(Redirect::to(auth::LOGIN_PATH))
}

async fn count_card<R: Resource>(state: &AppState) -> color_eyre::Result<Markup> {
    let count = models::count::<R>(&state.db).await?;

    Ok(html! {
        a href=(collection_path::<R>()) class="block rounded-xl bg-white border border-gray-200 p-5 shadow-sm hover:shadow" {
            p class="text-sm text-gray-500" { (title_case(R::NOUN_PLURAL)) }
            p class="mt-1 text-3xl font-bold text-indigo-700" { (count) }
        }
    })
}

/// `GET /admin`
async fn dashboard(
    State(state): State<AppState>,
    AdminPage(admin): AdminPage,
) -> ServerResult<Page, StatusCode> {
    let (projects, experiences, technologies, testimonials, services, videos, diagrams, resumes, stats, nav_links) =
        tokio::try_join!(
            count_card::<Project>(&state),
            count_card::<Experience>(&state),
            count_card::<Technology>(&state),
            count_card::<Testimonial>(&state),
            count_card::<Service>(&state),
            count_card::<Video>(&state),
            count_card::<Diagram>(&state),
            count_card::<Resume>(&state),
            count_card::<Stat>(&state),
            count_card::<NavLink>(&state),
        )
        .wrap_err("Failed to count content")?;
    let cards = [
        projects, experiences, technologies, testimonials, services, videos, diagrams, resumes,
        stats, nav_links,
    ];

    let content = html! {
        p class="text-gray-600" { "Signed in as " strong { (admin.admin.email) } }
        div class="grid grid-cols-2 md:grid-cols-3 xl:grid-cols-5 gap-4" {
            @for card in &cards {
                (card)
            }
        }
        p class="text-sm text-gray-500" {
            "Storage provider: " (Badge::new(state.storage.provider_name(), BadgeColor::Indigo).render())
        }
    };

    Ok(admin_page("Dashboard", AdminShell::new("Dashboard", admin_nav(), content)))
}

/// Text shown in a form control for a stored or submitted value
fn field_value(field: &FormField, values: &Map<String, Value>) -> String {
    let Some(value) = values.get(field.name) else {
        return String::new();
    };

    match (field.kind, value) {
        (_, Value::Null) => String::new(),
        (_, Value::String(text)) => text.clone(),
        (FieldKind::Tags, Value::Array(_)) => serde_json::from_value::<Vec<Tag>>(value.clone())
            .map(|tags| tags_to_text(&tags))
            .unwrap_or_default(),
        (FieldKind::Lines, Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        (_, other) => other.to_string(),
    }
}

fn field_checked(field: &FormField, values: &Map<String, Value>) -> bool {
    match values.get(field.name) {
        Some(Value::Bool(checked)) => *checked,
        Some(Value::String(_)) => true,
        _ => false,
    }
}

fn render_field<R: Resource>(field: &FormField, values: &Map<String, Value>) -> Markup {
    let value = field_value(field, values);

    match field.kind {
        FieldKind::Text | FieldKind::Tags => InputField::new(field.name)
            .label(field.label)
            .value(&value)
            .required(field.required)
            .render(),
        FieldKind::Number => InputField::new(field.name)
            .label(field.label)
            .input_type("number")
            .value(&value)
            .render(),
        FieldKind::TextArea | FieldKind::Lines => TextArea::new(field.name, field.label)
            .value(&value)
            .required(field.required)
            .render(),
        FieldKind::Checkbox => {
            ToggleSwitch::new(field.name, field.label, field_checked(field, values)).render()
        }
        FieldKind::Asset => {
            let preview = R::ASSETS
                .iter()
                .find(|asset| asset.name == field.name)
                .and_then(|asset| values.get(asset.display_key))
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(ToString::to_string);

            FileField::new(field.name, field.label)
                .value(&value)
                .preview(preview)
                .render()
        }
    }
}

fn resource_form<R: Resource>(action: &str, submit: &str, values: &Map<String, Value>) -> Markup {
    HtmlForm::new(
        action,
        "post",
        html! {
            @for field in R::FIELDS {
                (render_field::<R>(field, values))
            }
            div class="flex gap-3" {
                (Button::primary(submit).submit().render())
                (Button::link("Cancel")
                    .href(&collection_path::<R>())
                    .render())
            }
        },
    )
    .multipart()
    .render()
}

/// A new record is visible unless the admin unticks it
fn new_record_defaults() -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("isActive".to_string(), Value::Bool(true));
    values.insert("order".to_string(), Value::Number(0.into()));
    values
}

async fn resource_list_page<R: Resource>(
    state: &AppState,
    error: Option<String>,
    draft: Option<Map<String, Value>>,
) -> color_eyre::Result<Page> {
    let rows = models::list_all::<R>(&state.db).await?;
    let views = futures::future::try_join_all(
        rows.iter()
            .map(|row| models::admin_view(row, &state.storage)),
    )
    .await?;

    let plural = title_case(R::NOUN_PLURAL);
    let collection = collection_path::<R>();
    let draft = draft.unwrap_or_else(new_record_defaults);

    let table = html! {
        div class="overflow-x-auto rounded-xl border border-gray-200 bg-white" {
            table class="min-w-full text-sm" {
                thead class="bg-gray-50 text-left text-gray-600" {
                    tr {
                        th class="px-4 py-3" { "" }
                        th class="px-4 py-3" { "Title" }
                        th class="px-4 py-3" { "Order" }
                        th class="px-4 py-3" { "Status" }
                        th class="px-4 py-3" { "" }
                    }
                }
                tbody {
                    @for (row, view) in rows.iter().zip(&views) {
                        @let thumbnail = R::ASSETS.first().and_then(|asset| view.get(asset.display_key)).and_then(Value::as_str);
                        tr class="border-t border-gray-100" {
                            td class="px-4 py-3 w-16" {
                                @if let Some(src) = thumbnail {
                                    img src=(src) alt="" class="h-10 w-10 rounded object-cover bg-gray-100";
                                }
                            }
                            td class="px-4 py-3 font-medium" { (row.title()) }
                            td class="px-4 py-3" { (view.get("order").map(ToString::to_string).unwrap_or_default()) }
                            td class="px-4 py-3" { (Badge::active(row.is_active()).render()) }
                            td class="px-4 py-3" {
                                div class="flex justify-end gap-2" {
                                    (Button::secondary("Edit")
                                        .size(ButtonSize::Small)
                                        .href(&format!("{collection}/{}/edit", row.id()))
                                        .render())
                                    (HtmlForm::new(&format!("{collection}/{}/delete", row.id()), "post", Button::danger("Delete")
                                        .size(ButtonSize::Small)
                                        .submit())
                                        .confirm(&format!("Delete this {}?", R::NOUN))
                                        .extra_classes("inline")
                                        .render())
                                }
                            }
                        }
                    }
                    @if rows.is_empty() {
                        tr { td colspan="5" class="px-4 py-6 text-center text-gray-500" { "No " (R::NOUN_PLURAL) " yet." } }
                    }
                }
            }
        }

        section class="rounded-xl border border-gray-200 bg-white p-6" {
            (Heading::h2(&format!("New {}", R::NOUN)).render())
            (resource_form::<R>(&collection, "Create", &draft))
        }
    };

    Ok(admin_page(
        &plural,
        AdminShell::new(&plural, admin_nav(), table)
            .active(&collection)
            .error(error),
    ))
}

async fn resource_edit_page<R: Resource>(
    state: &AppState,
    id: Uuid,
    error: Option<String>,
) -> color_eyre::Result<Option<Page>> {
    let Some(record) = models::find::<R>(&state.db, id).await? else {
        return Ok(None);
    };

    let values = match models::admin_view(&record, &state.storage).await? {
        Value::Object(map) => map,
        _ => return Err(eyre!("{} did not serialize to an object", R::NOUN)),
    };

    let heading = format!("Edit {}", R::NOUN);
    let content = html! {
        section class="rounded-xl border border-gray-200 bg-white p-6" {
            p class="mb-4 text-gray-600" { (record.title()) }
            (resource_form::<R>(&format!("{}/{}", collection_path::<R>(), id), "Save", &values))
        }
    };

    Ok(Some(admin_page(
        &heading,
        AdminShell::new(&heading, admin_nav(), content)
            .active(&collection_path::<R>())
            .error(error),
    )))
}

/// `GET /admin/{r}`
async fn resource_page<R: Resource>(
    State(state): State<AppState>,
    AdminPage(_admin): AdminPage,
) -> ServerResult<Page, StatusCode> {
    Ok(resource_list_page::<R>(&state, None, None).await?)
}

fn parse_page_id(raw: &str) -> Result<Uuid, ServerError<StatusCode>> {
    raw.parse()
        .map_err(|_| ServerError(eyre!("Invalid id {raw}"), StatusCode::NOT_FOUND))
}

/// `GET /admin/{r}/:id/edit`
async fn edit_page<R: Resource>(
    State(state): State<AppState>,
    AdminPage(_admin): AdminPage,
    Path(id): Path<String>,
) -> ServerResult<Page, StatusCode> {
    let id = parse_page_id(&id)?;

    match resource_edit_page::<R>(&state, id, None).await? {
        Some(page) => Ok(page),
        None => Err(ServerError(
            eyre!("{} {id} not found", capitalized::<R>()),
            StatusCode::NOT_FOUND,
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Text values and chosen files of a multipart admin form
#[derive(Default)]
pub(crate) struct FormSubmission {
    pub values: HashMap<String, String>,
    pub files: HashMap<String, FilePart>,
}

impl FormSubmission {
    async fn read(mut multipart: Multipart) -> color_eyre::Result<Self> {
        let mut submission = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .wrap_err("Invalid multipart form")?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                if let Some(file) = FilePart::read(field).await? {
                    submission.files.insert(name, file);
                }
            } else {
                let text = field.text().await.wrap_err("Invalid multipart form")?;
                submission.values.insert(name, text);
            }
        }

        Ok(submission)
    }

    /// The raw text values, used to refill the form after a validation error
    fn draft(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

/// Turns submitted form values into the JSON a resource input deserializes from.
///
/// Blank values are left out on create so required-field checks catch them. On update a
/// blank optional field clears it and a blank required field keeps the stored value.
/// An unticked checkbox is `false`.
pub fn form_to_json(
    fields: &[FormField],
    values: &HashMap<String, String>,
    mode: FormMode,
) -> Result<Map<String, Value>, String> {
    let mut json = Map::new();

    for field in fields {
        let raw = values.get(field.name).map(|value| value.trim());

        match field.kind {
            FieldKind::Checkbox => {
                json.insert(field.name.to_string(), Value::Bool(raw.is_some()));
            }
            FieldKind::Number => {
                if let Some(raw) = raw.filter(|raw| !raw.is_empty()) {
                    let number: i32 = raw
                        .parse()
                        .map_err(|_| format!("{} must be a whole number", field.label))?;
                    json.insert(field.name.to_string(), Value::Number(Number::from(number)));
                }
            }
            FieldKind::Text
            | FieldKind::TextArea
            | FieldKind::Asset
            | FieldKind::Tags
            | FieldKind::Lines => match raw {
                Some(raw) if !raw.is_empty() => {
                    json.insert(field.name.to_string(), Value::String(raw.to_string()));
                }
                Some(_) if mode == FormMode::Update && !field.required => {
                    json.insert(field.name.to_string(), Value::String(String::new()));
                }
                _ => {}
            },
        }
    }

    Ok(json)
}

/// Form values into a resource input, with the required-field check on create
fn parse_input<R: Resource>(
    values: &HashMap<String, String>,
    mode: FormMode,
) -> Result<R::Input, String> {
    let json = form_to_json(R::FIELDS, values, mode)?;
    let input: R::Input = serde_json::from_value(Value::Object(json))
        .map_err(|err| format!("Invalid form values: {err}"))?;

    if mode == FormMode::Create {
        let missing = R::missing_fields(&input);
        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }
    }

    Ok(input)
}

/// An input ready to save plus the objects uploaded for it
struct PreparedInput<I> {
    input: I,
    uploaded: Vec<String>,
}

/// Validates the form, then uploads chosen files into the resource's folder.
///
/// Nothing is uploaded for a form that fails validation.
async fn build_input<R: Resource>(
    state: &AppState,
    mut submission: FormSubmission,
    mode: FormMode,
) -> Result<PreparedInput<R::Input>, String> {
    let asset_files: Vec<(&'static str, FilePart)> = R::FIELDS
        .iter()
        .filter(|field| field.kind == FieldKind::Asset)
        .filter_map(|field| {
            submission
                .files
                .remove(&FileField::file_input_name(field.name))
                .map(|file| (field.name, file))
        })
        .collect();

    // A chosen file satisfies its field, whatever URL it ends up at
    let mut with_files = submission.values.clone();
    for (name, file) in &asset_files {
        with_files.insert(name.to_string(), file.file_name.clone());
    }
    parse_input::<R>(&with_files, mode)?;

    let mut uploaded = Vec::new();
    for (name, file) in asset_files {
        match upload::store(state, R::SEGMENT, file).await {
            Ok(object) => {
                submission.values.insert(name.to_string(), object.url.clone());
                uploaded.push(object.url);
            }
            Err(err) => {
                error!(error = ?err, field = name, "Admin form upload failed");
                discard_uploads(state, &uploaded).await;
                return Err("Failed to upload file".to_string());
            }
        }
    }

    match parse_input::<R>(&submission.values, mode) {
        Ok(input) => Ok(PreparedInput { input, uploaded }),
        Err(message) => {
            discard_uploads(state, &uploaded).await;
            Err(message)
        }
    }
}

/// Removes objects uploaded for a save that did not happen
async fn discard_uploads(state: &AppState, uploaded: &[String]) {
    for url in uploaded {
        state.storage.delete(url).await;
    }
}

fn back_to_list<R: Resource>() -> Response {
    Redirect::to(&collection_path::<R>()).into_response()
}

/// `POST /admin/{r}`
async fn create_from_form<R: Resource>(
    State(state): State<AppState>,
    AdminPage(_admin): AdminPage,
    multipart: Multipart,
) -> ServerResult<Response, StatusCode> {
    let submission = FormSubmission::read(multipart)
        .await
        .with_status(StatusCode::BAD_REQUEST)?;
    let draft = submission.draft();

    let prepared = match build_input::<R>(&state, submission, FormMode::Create).await {
        Ok(prepared) => prepared,
        Err(message) => {
            let page = resource_list_page::<R>(&state, Some(message), Some(draft)).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    if let Err(err) = R::insert(&state.db, prepared.input).await {
        error!(error = ?err, table = R::TABLE, "Admin create failed");
        discard_uploads(&state, &prepared.uploaded).await;
        let message = format!("Failed to create {}", R::NOUN);
        let page = resource_list_page::<R>(&state, Some(message), Some(draft)).await?;
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response());
    }

    Ok(back_to_list::<R>())
}

/// `POST /admin/{r}/:id`
async fn update_from_form<R: Resource>(
    State(state): State<AppState>,
    AdminPage(_admin): AdminPage,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ServerResult<Response, StatusCode> {
    let id = parse_page_id(&id)?;
    let submission = FormSubmission::read(multipart)
        .await
        .with_status(StatusCode::BAD_REQUEST)?;

    let failure = match build_input::<R>(&state, submission, FormMode::Update).await {
        Ok(prepared) => match api::apply_update::<R>(&state, id, prepared.input).await {
            Ok(_) => return Ok(back_to_list::<R>()),
            Err(ServerError(report, api_error)) => {
                error!(error = ?report, table = R::TABLE, %id, "Admin update failed");
                discard_uploads(&state, &prepared.uploaded).await;
                (api_error.status, api_error.message)
            }
        },
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let (status, message) = failure;
    match resource_edit_page::<R>(&state, id, Some(message)).await? {
        Some(page) => Ok((status, page).into_response()),
        None => Ok(back_to_list::<R>()),
    }
}

/// `POST /admin/{r}/:id/delete`
async fn delete_from_form<R: Resource>(
    State(state): State<AppState>,
    AdminPage(_admin): AdminPage,
    Path(id): Path<String>,
) -> ServerResult<Response, StatusCode> {
    let id = parse_page_id(&id)?;

    if let Err(ServerError(report, api_error)) = api::remove::<R>(&state, id).await {
        error!(error = ?report, table = R::TABLE, %id, "Admin delete failed");
        let page = resource_list_page::<R>(&state, Some(api_error.message), None).await?;
        return Ok((api_error.status, page).into_response());
    }

    Ok(back_to_list::<R>())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::{config::AppConfig, cookies::CookieKey, models::Service, storage::StorageConfig};

    fn local_state(dir: &tempfile::TempDir) -> color_eyre::Result<AppState> {
        let mut config = AppConfig::new("postgres://localhost/portfolio_test");
        config.storage = StorageConfig::Local {
            path: dir.path().to_string_lossy().to_string(),
        };
        let db = PgPoolOptions::new().connect_lazy(&config.database_url)?;

        AppState::new(config, db, CookieKey::generate())
    }

    fn icon_submission(values: &[(&str, &str)]) -> FormSubmission {
        let mut submission = FormSubmission {
            values: self::values(values),
            ..Default::default()
        };
        submission.files.insert(
            "icon_file".to_string(),
            FilePart {
                file_name: "icon.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"png"),
            },
        );
        submission
    }

    #[tokio::test]
    async fn test_invalid_form_uploads_nothing() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let state = local_state(&dir)?;

        let missing_title = build_input::<Service>(&state, icon_submission(&[]), FormMode::Create)
            .await
            .err();
        assert_eq!(missing_title.as_deref(), Some("Missing required fields: title"));

        let bad_order = build_input::<Service>(
            &state,
            icon_submission(&[("title", "Backend"), ("order", "first")]),
            FormMode::Create,
        )
        .await
        .err();
        assert_eq!(bad_order.as_deref(), Some("Order must be a whole number"));

        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_valid_form_tracks_uploads_for_discard() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let state = local_state(&dir)?;

        let Ok(prepared) =
            build_input::<Service>(&state, icon_submission(&[("title", "Backend")]), FormMode::Create)
                .await
        else {
            panic!("form should be valid");
        };

        assert_eq!(prepared.uploaded.len(), 1);
        let url = &prepared.uploaded[0];
        assert!(url.starts_with("/uploads/services/"));
        assert_eq!(prepared.input.icon.as_deref(), Some(url.as_str()));

        let key = url.trim_start_matches("/uploads/");
        assert!(state.storage.get(key).await?.is_some());

        discard_uploads(&state, &prepared.uploaded).await;
        assert!(state.storage.get(key).await?.is_none());
        Ok(())
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_form_to_json_create_skips_blanks() -> color_eyre::Result<()> {
        let json = form_to_json(
            Project::FIELDS,
            &values(&[
                ("name", " Car rental "),
                ("description", ""),
                ("tags", "react, tailwind:pink"),
                ("order", "3"),
                ("isActive", "true"),
            ]),
            FormMode::Create,
        )
        .map_err(|e| eyre!(e))?;

        assert_eq!(json.get("name"), Some(&json!("Car rental")));
        assert_eq!(json.get("description"), None);
        assert_eq!(json.get("order"), Some(&json!(3)));
        assert_eq!(json.get("isActive"), Some(&json!(true)));

        let input: <Project as Resource>::Input = serde_json::from_value(Value::Object(json))?;
        assert_eq!(
            Project::missing_fields(&input),
            vec!["description", "image", "deployLink"]
        );
        Ok(())
    }

    #[test]
    fn test_form_to_json_update_clears_optional_and_unticks() -> color_eyre::Result<()> {
        let json = form_to_json(
            Project::FIELDS,
            &values(&[("name", ""), ("sourceCodeLink", "  "), ("order", "")]),
            FormMode::Update,
        )
        .map_err(|e| eyre!(e))?;

        assert_eq!(json.get("name"), None);
        assert_eq!(json.get("sourceCodeLink"), Some(&json!("")));
        assert_eq!(json.get("order"), None);
        assert_eq!(json.get("isActive"), Some(&json!(false)));
        Ok(())
    }

    #[test]
    fn test_form_to_json_rejects_bad_number() {
        let err = form_to_json(Stat::FIELDS, &values(&[("order", "first")]), FormMode::Create)
            .unwrap_err();

        assert_eq!(err, "Order must be a whole number");
    }

    #[test]
    fn test_field_value_formats_tags_and_lines() {
        let record = json!({
            "tags": [{ "name": "react", "color": "blue" }, { "name": "rust" }],
            "points": ["Built things", "Shipped things"],
            "order": 2,
        });
        let Value::Object(map) = record else {
            unreachable!("literal is an object")
        };

        let tags = FormField::optional("tags", "Tags", FieldKind::Tags);
        let points = FormField::optional("points", "Points", FieldKind::Lines);
        let order = FormField::optional("order", "Order", FieldKind::Number);
        let missing = FormField::optional("missing", "Missing", FieldKind::Text);

        assert_eq!(field_value(&tags, &map), "react:blue, rust");
        assert_eq!(field_value(&points, &map), "Built things\nShipped things");
        assert_eq!(field_value(&order, &map), "2");
        assert_eq!(field_value(&missing, &map), "");
    }

    #[test]
    fn test_admin_nav_covers_every_resource() {
        let nav = admin_nav();

        assert_eq!(nav.len(), 10);
        assert!(nav.iter().any(|item| item.href == "/admin/navlinks" && item.label == "Nav links"));
        assert!(nav.iter().any(|item| item.href == "/admin/resume" && item.label == "Resumes"));
    }
}
