//! Admin dashboard.

use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use tower_sessions::Session;

use crate::listing::{self, ListingQuery, Pagination, PropertyFilters, StatusScope};
use crate::models::{Category, User};
use crate::state::AppState;
use crate::theme::format_money;

use super::helpers::{html_escape, render_page, require_admin};

/// Create the admin dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin", get(dashboard))
}

/// Admin dashboard: statistics cards plus the newest properties.
///
/// GET /admin
async fn dashboard(State(state): State<AppState>, session: Session) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let stats = match listing::statistics(state.db()).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(error = %e, "failed to load property statistics");
            return render_page(
                &state,
                &session,
                "/admin",
                "Dashboard",
                "<p>Statistics are unavailable right now.</p>",
            )
            .await;
        }
    };

    let user_count = User::count(state.db()).await.unwrap_or(0);
    let category_count = Category::count(state.db()).await.unwrap_or(0);

    let mut content = String::from("<div class=\"stat-cards\">");
    for (label, value) in [
        ("Total properties", stats.total.to_string()),
        ("Available", stats.available.to_string()),
        ("Sold", stats.sold.to_string()),
        ("Rented", stats.rented.to_string()),
        ("Featured", stats.featured.to_string()),
        ("Users", user_count.to_string()),
        ("Categories", category_count.to_string()),
    ] {
        content.push_str(&format!(
            "<div class=\"stat-card\"><span class=\"stat-card__value\">{value}</span><span class=\"stat-card__label\">{label}</span></div>"
        ));
    }
    content.push_str("</div>");

    content.push_str("<h2>Prices</h2><ul class=\"stat-list\">");
    for (label, value) in [
        ("Average", &stats.average_price),
        ("Lowest", &stats.min_price),
        ("Highest", &stats.max_price),
    ] {
        let rendered = value
            .as_ref()
            .map(|v| format_money(&v.to_string()))
            .unwrap_or_else(|| "—".to_string());
        content.push_str(&format!("<li>{label}: {rendered}</li>"));
    }
    content.push_str("</ul>");

    if !stats.by_type.is_empty() {
        content.push_str("<h2>By type</h2><ul class=\"stat-list\">");
        for row in &stats.by_type {
            content.push_str(&format!(
                "<li>{}: {}</li>",
                html_escape(&row.property_type),
                row.count
            ));
        }
        content.push_str("</ul>");
    }

    if !stats.by_category.is_empty() {
        content.push_str("<h2>By category</h2><ul class=\"stat-list\">");
        for row in &stats.by_category {
            let name = row.name.as_deref().unwrap_or("(uncategorized)");
            content.push_str(&format!("<li>{}: {}</li>", html_escape(name), row.count));
        }
        content.push_str("</ul>");
    }

    // Most recent properties, regardless of status.
    let recent = listing::fetch_page(
        state.db(),
        &ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll),
        Pagination::new(1, 5),
    )
    .await;

    if let Ok(page) = recent {
        if !page.items.is_empty() {
            content.push_str("<h2>Recent properties</h2><ul class=\"recent-list\">");
            for item in &page.items {
                let p = &item.property;
                content.push_str(&format!(
                    "<li><a href=\"/admin/properties/{}/edit\">{}</a> — {} ({})</li>",
                    p.id,
                    html_escape(&p.title),
                    format_money(&p.price.to_string()),
                    p.status.as_str()
                ));
            }
            content.push_str("</ul>");
        }
    }

    content.push_str(
        r#"<div class="quick-actions">
<a href="/admin/properties/add">Add property</a>
<a href="/admin/properties">Manage properties</a>
<a href="/admin/categories">Manage categories</a>
<a href="/admin/users">Manage users</a>
</div>"#,
    );

    render_page(&state, &session, "/admin", "Dashboard", &content).await
}
