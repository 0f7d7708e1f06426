//! Public property listing and detail pages.

use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::listing::{
    self, ListingPage, ListingQuery, Pagination, PropertyFilters, SortField, SortOrder,
    StatusScope,
};
use crate::models::{Category, Property, PropertyType};
use crate::state::AppState;
use crate::theme::format_money;

use super::helpers::{html_escape, render_page, render_pager, render_property_card};

/// Properties shown per public listing page.
const PER_PAGE: u32 = 9;

/// Create the public property router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties", get(listing_page))
        .route("/property/{id}", get(detail_page))
}

/// Raw query-string parameters for the public listing.
///
/// Everything arrives as text and is coerced here; unparseable values are
/// treated as absent rather than erroring the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub bedrooms: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<String>,
}

impl ListingParams {
    /// Convert the raw parameters into the typed filter set.
    pub fn filters(&self) -> PropertyFilters {
        PropertyFilters {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category_id: parse_i64(self.category.as_deref()),
            property_type: self.property_type.as_deref().and_then(PropertyType::parse),
            status: None,
            featured: None,
            price_min: parse_decimal(self.price_min.as_deref()),
            price_max: parse_decimal(self.price_max.as_deref()),
            bedrooms_min: parse_i32(self.bedrooms.as_deref()),
            bathrooms_min: None,
            area_min: None,
            area_max: None,
        }
    }

    pub fn sort(&self) -> SortField {
        SortField::parse(self.sort.as_deref().unwrap_or_default())
    }

    pub fn order(&self) -> SortOrder {
        SortOrder::parse(self.dir.as_deref().unwrap_or_default())
    }

    pub fn page(&self) -> u32 {
        parse_i64(self.page.as_deref())
            .and_then(|p| u32::try_from(p).ok())
            .max(Some(1))
            .unwrap_or(1)
    }

    /// Filter state carried forward by pagination and sort links.
    pub fn link_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search", self.search.clone().unwrap_or_default()),
            ("category", self.category.clone().unwrap_or_default()),
            ("type", self.property_type.clone().unwrap_or_default()),
            ("price_min", self.price_min.clone().unwrap_or_default()),
            ("price_max", self.price_max.clone().unwrap_or_default()),
            ("bedrooms", self.bedrooms.clone().unwrap_or_default()),
            ("sort", self.sort.clone().unwrap_or_default()),
            ("dir", self.dir.clone().unwrap_or_default()),
        ]
    }
}

pub(crate) fn parse_i64(input: Option<&str>) -> Option<i64> {
    input.and_then(|s| s.trim().parse().ok())
}

pub(crate) fn parse_i32(input: Option<&str>) -> Option<i32> {
    input.and_then(|s| s.trim().parse().ok())
}

pub(crate) fn parse_decimal(input: Option<&str>) -> Option<BigDecimal> {
    input.and_then(|s| BigDecimal::from_str(s.trim()).ok())
}

/// Public listing page.
///
/// GET /properties
async fn listing_page(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListingParams>,
) -> Response {
    let query = ListingQuery::new(params.filters(), StatusScope::AvailableOnly)
        .with_sort(params.sort(), params.order());
    let pagination = Pagination::new(params.page(), PER_PAGE);

    // A failed query degrades to an empty listing; the cause is logged.
    let page = match listing::fetch_page(state.db(), &query, pagination).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, "property listing query failed");
            ListingPage::new(Vec::new(), 0, pagination.page, pagination.per_page)
        }
    };

    let categories = Category::list(state.db()).await.unwrap_or_default();

    let mut content = render_filter_form(&params, &categories);

    content.push_str(&format!(
        "<p class=\"listing-summary\">Showing <strong>{}</strong> of <strong>{}</strong> properties</p>",
        page.items.len(),
        page.total
    ));

    if page.items.is_empty() {
        content.push_str("<p class=\"listing-empty\">No properties match your search.</p>");
    } else {
        content.push_str("<div class=\"property-grid\">");
        for item in &page.items {
            content.push_str(&render_property_card(item));
        }
        content.push_str("</div>");
    }

    content.push_str(&render_pager(
        "/properties",
        &params.link_pairs(),
        page.page,
        page.total_pages,
    ));

    render_page(&state, &session, "/properties", "Properties", &content).await
}

/// Property detail page.
///
/// GET /property/{id}
async fn detail_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let detail = match Property::find_by_id(state.db(), id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            return render_page(
                &state,
                &session,
                "/property",
                "Not found",
                "<p>This property does not exist or has been removed.</p>",
            )
            .await;
        }
        Err(e) => {
            tracing::error!(error = %e, id, "failed to load property");
            return AppError::Internal(e).into_response();
        }
    };

    let p = &detail.summary.property;
    let mut content = String::new();

    if let Some(ref image) = p.image {
        let path = image.strip_prefix("local://").unwrap_or(image);
        content.push_str(&format!(
            "<img class=\"property-photo\" src=\"/files/{}\" alt=\"{}\">",
            html_escape(path),
            html_escape(&p.title)
        ));
    }

    content.push_str(&format!(
        "<p class=\"property-price\">{}{}</p>",
        format_money(&p.price.to_string()),
        if p.property_type == PropertyType::Rent {
            " / month"
        } else {
            ""
        }
    ));
    content.push_str(&format!(
        "<p class=\"property-status\">{} — {}</p>",
        html_escape(p.status.as_str()),
        html_escape(p.property_type.as_str())
    ));
    content.push_str(&format!(
        "<p class=\"property-location\">{}</p>",
        html_escape(&p.location)
    ));
    if let Some(ref address) = p.address {
        if !address.is_empty() {
            content.push_str(&format!(
                "<p class=\"property-address\">{}</p>",
                html_escape(address)
            ));
        }
    }
    content.push_str(&format!(
        "<p class=\"property-facts\">{} bedrooms · {} bathrooms · {} sqm · {} per sqm</p>",
        p.bedrooms,
        p.bathrooms,
        p.area,
        format_money(&detail.price_per_sqm.to_string())
    ));
    if !p.description.is_empty() {
        content.push_str(&format!(
            "<div class=\"property-description\"><p>{}</p></div>",
            html_escape(&p.description)
        ));
    }

    if let Some(ref name) = detail.summary.agent_name {
        content.push_str("<div class=\"property-agent\"><h2>Listed by</h2>");
        content.push_str(&format!("<p>{}</p>", html_escape(name)));
        if let Some(ref phone) = detail.summary.agent_phone {
            content.push_str(&format!("<p>{}</p>", html_escape(phone)));
        }
        if let Some(ref email) = detail.summary.agent_email {
            content.push_str(&format!("<p>{}</p>", html_escape(email)));
        }
        content.push_str("</div>");
    }

    let similar = Property::similar(state.db(), id, 4)
        .await
        .unwrap_or_default();
    if !similar.is_empty() {
        content.push_str("<h2>Similar properties</h2><div class=\"property-grid\">");
        for item in &similar {
            content.push_str(&render_property_card(item));
        }
        content.push_str("</div>");
    }

    render_page(&state, &session, "/property", &p.title, &content).await
}

/// Render the listing filter form with current values selected.
fn render_filter_form(params: &ListingParams, categories: &[Category]) -> String {
    let search = html_escape(params.search.as_deref().unwrap_or_default());
    let current_category = parse_i64(params.category.as_deref());
    let current_type = params.property_type.as_deref().unwrap_or_default();
    let price_min = html_escape(params.price_min.as_deref().unwrap_or_default());
    let price_max = html_escape(params.price_max.as_deref().unwrap_or_default());
    let current_bedrooms = parse_i32(params.bedrooms.as_deref());

    let mut html = String::from("<form class=\"listing-filters\" method=\"get\" action=\"/properties\">");

    html.push_str(&format!(
        "<input type=\"text\" name=\"search\" placeholder=\"Search properties...\" value=\"{search}\">"
    ));

    html.push_str("<select name=\"category\"><option value=\"\">All categories</option>");
    for category in categories {
        let selected = if current_category == Some(category.id) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            category.id,
            html_escape(&category.name)
        ));
    }
    html.push_str("</select>");

    html.push_str("<select name=\"type\"><option value=\"\">Sale or rent</option>");
    for (value, label) in [("sale", "For Sale"), ("rent", "For Rent")] {
        let selected = if current_type == value { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{value}\"{selected}>{label}</option>"
        ));
    }
    html.push_str("</select>");

    html.push_str(&format!(
        "<input type=\"number\" name=\"price_min\" placeholder=\"Min price\" min=\"0\" value=\"{price_min}\">"
    ));
    html.push_str(&format!(
        "<input type=\"number\" name=\"price_max\" placeholder=\"Max price\" min=\"0\" value=\"{price_max}\">"
    ));

    html.push_str("<select name=\"bedrooms\"><option value=\"\">Any bedrooms</option>");
    for n in 1..=5 {
        let selected = if current_bedrooms == Some(n) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!("<option value=\"{n}\"{selected}>{n}+</option>"));
    }
    html.push_str("</select>");

    let current_sort = params.sort();
    html.push_str("<select name=\"sort\">");
    for (field, label) in [
        (SortField::CreatedAt, "Newest"),
        (SortField::Price, "Price"),
        (SortField::Title, "Title"),
        (SortField::Bedrooms, "Bedrooms"),
        (SortField::Bathrooms, "Bathrooms"),
        (SortField::Area, "Area"),
    ] {
        let selected = if current_sort == field { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{selected}>{label}</option>",
            field.as_str()
        ));
    }
    html.push_str("</select>");

    let current_order = params.order();
    html.push_str("<select name=\"dir\">");
    for (order, label) in [(SortOrder::Desc, "High to low"), (SortOrder::Asc, "Low to high")] {
        let selected = if current_order == order { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{selected}>{label}</option>",
            order.as_str()
        ));
    }
    html.push_str("</select>");

    html.push_str("<button type=\"submit\">Filter</button>");
    html.push_str("<a href=\"/properties\">Clear</a>");
    html.push_str("</form>");

    html
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn params_coerce_numeric_text() {
        let params = ListingParams {
            category: Some("4".to_string()),
            price_min: Some("100000".to_string()),
            bedrooms: Some("3".to_string()),
            ..Default::default()
        };
        let filters = params.filters();
        assert_eq!(filters.category_id, Some(4));
        assert_eq!(filters.bedrooms_min, Some(3));
        assert!(filters.price_min.is_some());
    }

    #[test]
    fn params_ignore_garbage_numbers() {
        let params = ListingParams {
            category: Some("abc".to_string()),
            price_min: Some("lots".to_string()),
            bedrooms: Some("".to_string()),
            page: Some("-3".to_string()),
            ..Default::default()
        };
        let filters = params.filters();
        assert_eq!(filters.category_id, None);
        assert_eq!(filters.price_min, None);
        assert_eq!(filters.bedrooms_min, None);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn blank_search_becomes_absent() {
        let params = ListingParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.filters().search, None);
    }

    #[test]
    fn sort_params_use_allow_list() {
        let params = ListingParams {
            sort: Some("price".to_string()),
            dir: Some("ASC".to_string()),
            ..Default::default()
        };
        assert_eq!(params.sort(), SortField::Price);
        assert_eq!(params.order(), SortOrder::Asc);

        let params = ListingParams {
            sort: Some("evil; --".to_string()),
            dir: Some("up".to_string()),
            ..Default::default()
        };
        assert_eq!(params.sort(), SortField::CreatedAt);
        assert_eq!(params.order(), SortOrder::Desc);
    }

    #[test]
    fn filter_form_preserves_selection() {
        let params = ListingParams {
            search: Some("villa".to_string()),
            property_type: Some("rent".to_string()),
            bedrooms: Some("3".to_string()),
            ..Default::default()
        };
        let categories = vec![Category {
            id: 2,
            name: "Houses".to_string(),
            icon: String::new(),
            description: String::new(),
        }];

        let html = render_filter_form(&params, &categories);
        assert!(html.contains("value=\"villa\""));
        assert!(html.contains("<option value=\"rent\" selected>"));
        assert!(html.contains("<option value=\"3\" selected>"));
        assert!(html.contains("Houses"));
    }
}
