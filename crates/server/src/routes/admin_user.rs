//! Admin user management.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CreateUser, Role, User};
use crate::state::AppState;

use super::helpers::{html_escape, render_page, require_admin};

/// Create the admin user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/add", post(add_submit))
        .route("/admin/users/{id}/role", post(change_role))
        .route("/admin/users/{id}/delete", post(delete_submit))
}

#[derive(Debug, Default, Deserialize)]
struct UserListQuery {
    saved: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserForm {
    username: String,
    password: String,
    email: String,
    full_name: String,
    phone: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleForm {
    role: String,
}

/// List users with role controls.
///
/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UserListQuery>,
) -> Response {
    let current = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let users = match User::list(state.db()).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(error = %e, "failed to list users");
            Vec::new()
        }
    };

    let mut content = String::new();

    if query.saved.is_some() {
        content.push_str("<p class=\"flash flash--ok\">User saved.</p>");
    }
    if let Some(error) = query.error.as_deref() {
        let message = match error {
            "self" => "You cannot delete your own account.",
            "invalid" => "The submitted user was invalid.",
            _ => "The last action failed. Check the logs.",
        };
        content.push_str(&format!("<p class=\"flash flash--error\">{message}</p>"));
    }

    content.push_str(
        r#"<h2>Add user</h2>
<form class="user-form" method="post" action="/admin/users/add">
<label>Username * <input type="text" name="username" required></label>
<label>Password * <input type="password" name="password" required minlength="8"></label>
<label>Email * <input type="email" name="email" required></label>
<label>Full name * <input type="text" name="full_name" required></label>
<label>Phone <input type="text" name="phone"></label>
<label>Role <select name="role"><option value="user">user</option><option value="admin">admin</option></select></label>
<button type="submit">Add user</button>
</form>"#,
    );

    content.push_str(
        "<table class=\"admin-table\"><tr><th>Username</th><th>Full name</th><th>Email</th><th>Phone</th><th>Role</th><th>Actions</th></tr>",
    );
    for user in &users {
        content.push_str("<tr>");
        content.push_str(&format!("<td>{}</td>", html_escape(&user.username)));
        content.push_str(&format!("<td>{}</td>", html_escape(&user.full_name)));
        content.push_str(&format!("<td>{}</td>", html_escape(&user.email)));
        content.push_str(&format!("<td>{}</td>", html_escape(&user.phone)));

        content.push_str(&format!(
            "<td><form class=\"inline\" method=\"post\" action=\"/admin/users/{}/role\"><select name=\"role\">",
            user.id
        ));
        for role in [Role::User, Role::Admin] {
            let selected = if role == user.role { " selected" } else { "" };
            content.push_str(&format!(
                "<option value=\"{0}\"{selected}>{0}</option>",
                role.as_str()
            ));
        }
        content.push_str("</select><button type=\"submit\">Set</button></form></td>");

        if user.id == current.id {
            content.push_str("<td>(you)</td>");
        } else {
            content.push_str(&format!(
                "<td><form class=\"inline\" method=\"post\" action=\"/admin/users/{}/delete\"><button type=\"submit\">Delete</button></form></td>",
                user.id
            ));
        }
        content.push_str("</tr>");
    }
    content.push_str("</table>");

    render_page(&state, &session, "/admin/users", "Users", &content).await
}

/// Create a user.
///
/// POST /admin/users/add
async fn add_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UserForm>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let role = form
        .role
        .as_deref()
        .and_then(Role::parse)
        .unwrap_or(Role::User);

    let input = CreateUser {
        username: form.username,
        password: form.password,
        email: form.email,
        full_name: form.full_name,
        phone: form.phone.unwrap_or_default(),
        role,
    };

    if !input.validate().is_empty() {
        return Redirect::to("/admin/users?error=invalid").into_response();
    }

    match User::create(state.db(), &input).await {
        Ok(_) => Redirect::to("/admin/users?saved=1").into_response(),
        Err(e) => {
            // Unique violations on username/email land here too.
            tracing::error!(error = %e, "failed to create user");
            Redirect::to("/admin/users?error=1").into_response()
        }
    }
}

/// Change a user's role. The value is validated against the role allow-list.
///
/// POST /admin/users/{id}/role
async fn change_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let Some(role) = Role::parse(&form.role) else {
        return AppError::Validation(vec!["Please choose a valid role".to_string()])
            .into_response();
    };

    match User::change_role(state.db(), id, role).await {
        Ok(_) => Redirect::to("/admin/users?saved=1").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to change user role");
            Redirect::to("/admin/users?error=1").into_response()
        }
    }
}

/// Delete a user. Self-deletion is refused.
///
/// POST /admin/users/{id}/delete
async fn delete_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let current = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if current.id == id {
        return Redirect::to("/admin/users?error=self").into_response();
    }

    match User::delete(state.db(), id).await {
        Ok(_) => Redirect::to("/admin/users?saved=1").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to delete user");
            Redirect::to("/admin/users?error=1").into_response()
        }
    }
}
