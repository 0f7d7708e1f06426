//! Shared route helpers for authentication and page rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{PropertySummary, User};
use crate::state::AppState;
use crate::theme::format_money;

/// Session key for user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Require an authenticated user, or redirect to login.
pub async fn require_login(state: &AppState, session: &Session) -> Result<User, Response> {
    let user_id: Option<i64> = session.get(SESSION_USER_ID).await.ok().flatten();

    if let Some(id) = user_id {
        if let Ok(Some(user)) = User::find_by_id(state.db(), id).await {
            return Ok(user);
        }
    }

    Err(Redirect::to("/user/login").into_response())
}

/// Require an authenticated **admin** user, or redirect/reject.
///
/// Redirects to `/user/login` if the session has no valid user. Returns 403
/// if the user exists but is not an admin.
pub async fn require_admin(state: &AppState, session: &Session) -> Result<User, Response> {
    let user = require_login(state, session).await?;

    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::Forbidden.into_response())
    }
}

/// Render a full page through the theme engine.
pub async fn render_page(
    state: &AppState,
    session: &Session,
    path: &str,
    title: &str,
    content: &str,
) -> Response {
    let mut context = tera::Context::new();

    let user_id: Option<i64> = session.get(SESSION_USER_ID).await.ok().flatten();
    context.insert("user_authenticated", &user_id.is_some());
    context.insert("site_url", state.site_url());

    match state.theme().render_page(path, title, content, &mut context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %path, "failed to render page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Template Error</h1><pre>{}</pre></body></html>"#,
                    html_escape(&e.to_string())
                )),
            )
                .into_response()
        }
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Build a query string from key/value pairs, URL-encoding values.
///
/// Empty values are skipped so pagination links stay clean. Returns an empty
/// string when nothing remains.
pub fn build_query_string(pairs: &[(&str, String)]) -> String {
    let encoded: Vec<String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();

    if encoded.is_empty() {
        String::new()
    } else {
        encoded.join("&")
    }
}

/// Build an href for the given page, carrying the current filter state.
pub fn page_href(path: &str, pairs: &[(&str, String)], page: u32) -> String {
    let mut all: Vec<(&str, String)> = pairs.to_vec();
    all.push(("page", page.to_string()));
    format!("{path}?{}", build_query_string(&all))
}

/// Render prev / numbered / next pagination links.
pub fn render_pager(path: &str, pairs: &[(&str, String)], page: u32, total_pages: u32) -> String {
    if total_pages <= 1 {
        return String::new();
    }

    let mut html = String::from("<nav class=\"pager\">");

    if page > 1 {
        html.push_str(&format!(
            "<a href=\"{}\" rel=\"prev\">&laquo; Previous</a>",
            page_href(path, pairs, page - 1)
        ));
    }

    for i in 1..=total_pages {
        if i == page {
            html.push_str(&format!("<span class=\"pager__current\">{i}</span>"));
        } else {
            html.push_str(&format!(
                "<a href=\"{}\">{i}</a>",
                page_href(path, pairs, i)
            ));
        }
    }

    if page < total_pages {
        html.push_str(&format!(
            "<a href=\"{}\" rel=\"next\">Next &raquo;</a>",
            page_href(path, pairs, page + 1)
        ));
    }

    html.push_str("</nav>");
    html
}

/// Render one property card for listing grids.
pub fn render_property_card(property: &PropertySummary) -> String {
    let p = &property.property;
    let mut html = String::from("<div class=\"property-card\">");

    if let Some(ref image) = p.image {
        let path = image.strip_prefix("local://").unwrap_or(image);
        html.push_str(&format!(
            "<img src=\"/files/{}\" alt=\"{}\">",
            html_escape(path),
            html_escape(&p.title)
        ));
    }

    html.push_str(&format!(
        "<h3><a href=\"/property/{}\">{}</a></h3>",
        p.id,
        html_escape(&p.title)
    ));
    html.push_str(&format!(
        "<p class=\"property-card__price\">{}{}</p>",
        format_money(&p.price.to_string()),
        if p.property_type.as_str() == "rent" {
            " / month"
        } else {
            ""
        }
    ));
    html.push_str(&format!(
        "<p class=\"property-card__location\">{}</p>",
        html_escape(&p.location)
    ));
    html.push_str(&format!(
        "<p class=\"property-card__facts\">{} bed · {} bath · {} sqm</p>",
        p.bedrooms, p.bathrooms, p.area
    ));

    if let Some(ref name) = property.category_name {
        html.push_str(&format!(
            "<p class=\"property-card__category\">{}</p>",
            html_escape(name)
        ));
    }

    html.push_str("</div>");
    html
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape_special_chars() {
        assert_eq!(
            html_escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_html_escape_plain_text() {
        assert_eq!(html_escape("hello world"), "hello world");
    }

    #[test]
    fn query_string_skips_empty_values() {
        let pairs = [
            ("search", "sea view".to_string()),
            ("category", String::new()),
            ("type", "sale".to_string()),
        ];
        assert_eq!(build_query_string(&pairs), "search=sea%20view&type=sale");
    }

    #[test]
    fn page_href_carries_filter_state() {
        let pairs = [("search", "villa".to_string())];
        assert_eq!(
            page_href("/properties", &pairs, 3),
            "/properties?search=villa&page=3"
        );
    }

    #[test]
    fn pager_renders_nothing_for_single_page() {
        assert_eq!(render_pager("/properties", &[], 1, 1), "");
        assert_eq!(render_pager("/properties", &[], 1, 0), "");
    }

    #[test]
    fn pager_marks_current_page() {
        let html = render_pager("/properties", &[], 2, 3);
        assert!(html.contains("<span class=\"pager__current\">2</span>"));
        assert!(html.contains("page=1"));
        assert!(html.contains("page=3"));
        assert!(html.contains("Previous"));
        assert!(html.contains("Next"));
    }
}
