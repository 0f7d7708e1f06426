//! Front page route handler.

use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use tower_sessions::Session;

use crate::listing;
use crate::state::AppState;

use super::helpers::{render_page, render_property_card};

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(front_page))
}

/// Front page: featured properties, then the latest arrivals.
async fn front_page(State(state): State<AppState>, session: Session) -> Response {
    let featured = listing::featured(state.db(), 6).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load featured properties");
        Vec::new()
    });

    let latest = listing::latest(state.db(), 6).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load latest properties");
        Vec::new()
    });

    let mut content = String::new();

    content.push_str(
        "<p class=\"front-intro\">Find your next home: browse our \
         <a href=\"/properties\">available properties</a>.</p>",
    );

    if !featured.is_empty() {
        content.push_str("<h2>Featured properties</h2><div class=\"property-grid\">");
        for item in &featured {
            content.push_str(&render_property_card(item));
        }
        content.push_str("</div>");
    }

    if !latest.is_empty() {
        content.push_str("<h2>Latest listings</h2><div class=\"property-grid\">");
        for item in &latest {
            content.push_str(&render_property_card(item));
        }
        content.push_str("</div>");
    }

    if featured.is_empty() && latest.is_empty() {
        content.push_str("<p>No properties are listed yet. Check back soon.</p>");
    }

    render_page(&state, &session, "/", "Welcome", &content).await
}
