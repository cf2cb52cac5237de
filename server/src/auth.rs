use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    cookies::{Cookie, CookieJar},
    errors::ApiError,
    state::AppState,
    user::{Admin, Session},
};

/// Cookie name for storing the session ID
pub const SESSION_COOKIE_NAME: &str = "portfolio_session";

pub const LOGIN_PATH: &str = "/admin/login";

/// A signed-in admin. Rejects API requests with `401 {"error":"Unauthorized"}`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: Admin,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match current_admin(parts, state).await? {
            Some(admin) => Ok(admin),
            None => Err(ApiError::unauthorized().into_response()),
        }
    }
}

/// A signed-in admin on an HTML page, redirecting to the login form otherwise
#[derive(Debug, Clone)]
pub struct AdminPage(pub AdminSession);

#[async_trait]
impl FromRequestParts<AppState> for AdminPage {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match current_admin(parts, state).await? {
            Some(admin) => Ok(AdminPage(admin)),
            None => {
                info!("No admin session, redirecting to login");
                Err(Redirect::to(LOGIN_PATH).into_response())
            }
        }
    }
}

/// The admin session if there is one
#[derive(Debug, Clone)]
pub struct OptionalAdmin(pub Option<AdminSession>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAdmin(current_admin(parts, state).await?))
    }
}

/// Resolves the session cookie. Requests without a cookie never touch the database.
async fn current_admin(parts: &mut Parts, state: &AppState) -> Result<Option<AdminSession>, Response> {
    let cookies = CookieJar::from_request_parts(parts, state).await?;

    let Some(session_id) = get_session_id_from_cookie(&cookies) else {
        return Ok(None);
    };

    let session = match validate_session(state, session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            info!("Session {} is invalid or expired", session_id);
            return Ok(None);
        }
        Err(err) => {
            error!("Error validating session {}: {:?}", session_id, err);
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    match Admin::get_by_id(&state.db, session.admin_id).await {
        Ok(Some(admin)) => Ok(Some(AdminSession { admin, session })),
        Ok(None) => {
            error!("No admin found for session {}", session_id);
            Ok(None)
        }
        Err(err) => {
            error!("Error getting admin for session {}: {:?}", session_id, err);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Get the session ID from the cookie
pub fn get_session_id_from_cookie(cookies: &CookieJar) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok())
}

/// Loads a session that is still active and unexpired
pub async fn validate_session(state: &AppState, session_id: Uuid) -> color_eyre::Result<Option<Session>> {
    let session = Session::get_by_id(&state.db, session_id).await?;

    Ok(session.filter(|session| session.is_valid_at(chrono::Utc::now())))
}

/// Creates a session cookie for the given session ID
fn create_session_cookie(state: &AppState, session_id: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.config.is_secure());
    cookie.set_max_age(Duration::days(state.config.session_duration_days));
    cookie
}

/// Checks the credentials and starts a session.
///
/// Returns `None` for an unknown email or a wrong password.
pub async fn login_with_password(
    state: &AppState,
    cookies: &CookieJar,
    email: &str,
    password: &str,
) -> color_eyre::Result<Option<Session>> {
    if email.trim().is_empty() || password.is_empty() {
        return Ok(None);
    }

    let Some(admin) = Admin::get_by_email(&state.db, email).await? else {
        info!("Login attempt for unknown admin");
        return Ok(None);
    };

    if !admin.verify_password(password).await? {
        info!("Wrong password for admin {}", admin.id);
        return Ok(None);
    }

    let session = Session::create(&state.db, admin.id, state.config.session_duration_days).await?;
    cookies.add(create_session_cookie(state, session.id));

    info!("Created new session {} for admin {}", session.id, admin.id);
    Ok(Some(session))
}

/// Clear the session cookie and invalidate the session in the database
pub async fn end_session(state: &AppState, cookies: &CookieJar) -> color_eyre::Result<()> {
    if let Some(session_id) = get_session_id_from_cookie(cookies) {
        if let Some(session) = Session::get_by_id(&state.db, session_id).await? {
            session.invalidate(&state.db).await?;
        }
    }

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_max_age(Duration::seconds(-1));
    cookie.set_http_only(true);
    cookie.set_secure(state.config.is_secure());

    cookies.remove(cookie);
    info!("Session cookie removed");

    Ok(())
}
