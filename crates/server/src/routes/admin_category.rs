//! Admin category management.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::state::AppState;

use super::helpers::{html_escape, render_page, require_admin};

/// Create the admin category router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/categories", get(list_categories))
        .route("/admin/categories/add", post(add_submit))
        .route("/admin/categories/{id}/edit", post(edit_submit))
        .route("/admin/categories/{id}/delete", post(delete_submit))
}

#[derive(Debug, Default, Deserialize)]
struct CategoryListQuery {
    saved: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryForm {
    name: String,
    icon: Option<String>,
    description: Option<String>,
}

/// List categories with property counts and inline edit forms.
///
/// GET /admin/categories
async fn list_categories(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CategoryListQuery>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let categories = match Category::list_with_counts(state.db()).await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!(error = %e, "failed to list categories");
            Vec::new()
        }
    };

    let mut content = String::new();

    if query.saved.is_some() {
        content.push_str("<p class=\"flash flash--ok\">Category saved.</p>");
    }
    if let Some(error) = query.error.as_deref() {
        let message = match error {
            "in_use" => "That category still has properties and cannot be deleted.",
            _ => "The last action failed. Check the logs.",
        };
        content.push_str(&format!("<p class=\"flash flash--error\">{message}</p>"));
    }

    content.push_str(
        r#"<h2>Add category</h2>
<form class="category-form" method="post" action="/admin/categories/add">
<label>Name * <input type="text" name="name" required></label>
<label>Icon <input type="text" name="icon"></label>
<label>Description <input type="text" name="description"></label>
<button type="submit">Add</button>
</form>"#,
    );

    if categories.is_empty() {
        content.push_str("<p>No categories yet.</p>");
    } else {
        content.push_str(
            "<table class=\"admin-table\"><tr><th>Name</th><th>Icon</th><th>Description</th><th>Properties</th><th>Actions</th></tr>",
        );
        for row in &categories {
            let c = &row.category;
            content.push_str("<tr>");
            content.push_str(&format!(
                r#"<td colspan="3"><form class="inline" method="post" action="/admin/categories/{}/edit">
<input type="text" name="name" value="{}" required>
<input type="text" name="icon" value="{}">
<input type="text" name="description" value="{}">
<button type="submit">Save</button>
</form></td>"#,
                c.id,
                html_escape(&c.name),
                html_escape(&c.icon),
                html_escape(&c.description)
            ));
            content.push_str(&format!(
                "<td><a href=\"/properties?category={}\">{}</a></td>",
                c.id, row.property_count
            ));
            content.push_str(&format!(
                "<td><form class=\"inline\" method=\"post\" action=\"/admin/categories/{}/delete\"><button type=\"submit\">Delete</button></form></td>",
                c.id
            ));
            content.push_str("</tr>");
        }
        content.push_str("</table>");
    }

    render_page(&state, &session, "/admin/categories", "Categories", &content).await
}

/// Create a category.
///
/// POST /admin/categories/add
async fn add_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let input = CreateCategory {
        name: form.name,
        icon: form.icon,
        description: form.description,
    };

    if !input.validate().is_empty() {
        return Redirect::to("/admin/categories?error=1").into_response();
    }

    match Category::create(state.db(), &input).await {
        Ok(_) => Redirect::to("/admin/categories?saved=1").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create category");
            Redirect::to("/admin/categories?error=1").into_response()
        }
    }
}

/// Update a category.
///
/// POST /admin/categories/{id}/edit
async fn edit_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CategoryForm>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    if form.name.trim().is_empty() {
        return Redirect::to("/admin/categories?error=1").into_response();
    }

    let input = UpdateCategory {
        name: Some(form.name),
        icon: form.icon,
        description: form.description,
    };

    match Category::update(state.db(), id, &input).await {
        Ok(Some(_)) => Redirect::to("/admin/categories?saved=1").into_response(),
        Ok(None) => Redirect::to("/admin/categories").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to update category");
            Redirect::to("/admin/categories?error=1").into_response()
        }
    }
}

/// Delete a category, refusing while properties still reference it.
///
/// POST /admin/categories/{id}/delete
async fn delete_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    match Category::property_count(state.db(), id).await {
        Ok(0) => {}
        Ok(_) => return Redirect::to("/admin/categories?error=in_use").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to check category usage");
            return Redirect::to("/admin/categories?error=1").into_response();
        }
    }

    match Category::delete(state.db(), id).await {
        Ok(_) => Redirect::to("/admin/categories?saved=1").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to delete category");
            Redirect::to("/admin/categories?error=1").into_response()
        }
    }
}
