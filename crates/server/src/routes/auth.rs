//! Login and logout.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::User;
use crate::state::AppState;

use super::helpers::{SESSION_USER_ID, html_escape, render_page};

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/login", get(login_form).post(login_submit))
        .route("/user/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// Show the login form.
///
/// GET /user/login
async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    let mut content = String::new();

    if query.error.is_some() {
        content.push_str(
            "<p class=\"form-error\">Invalid username or password.</p>",
        );
    }

    content.push_str(
        r#"<form class="login-form" method="post" action="/user/login">
<label>Username <input type="text" name="username" required autofocus></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>"#,
    );

    render_page(&state, &session, "/user/login", "Log in", &content).await
}

/// Handle a login attempt.
///
/// POST /user/login
///
/// Failures are reported with one generic message; which part was wrong is
/// not disclosed.
async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();

    let user = match User::find_by_username(state.db(), username).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "login lookup failed");
            None
        }
    };

    let Some(user) = user else {
        return Redirect::to("/user/login?error=1").into_response();
    };

    if !user.verify_password(&form.password) {
        tracing::warn!(username = %html_escape(username), "failed login attempt");
        return Redirect::to("/user/login?error=1").into_response();
    }

    if let Err(e) = session.insert(SESSION_USER_ID, user.id).await {
        tracing::error!(error = %e, "failed to persist session");
        return Redirect::to("/user/login?error=1").into_response();
    }

    if user.is_admin() {
        Redirect::to("/admin").into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

/// Log out and clear the session.
///
/// POST /user/logout
async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "failed to clear session");
    }

    Redirect::to("/").into_response()
}
