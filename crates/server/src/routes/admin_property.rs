//! Admin property management: listing, add/edit with image upload, delete,
//! featured/status toggles, and bulk actions.

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::listing::{
    self, ListingPage, ListingQuery, Pagination, PropertyFilters, StatusScope,
};
use crate::models::{
    Category, CreateProperty, Property, PropertyStatus, PropertyType, UpdateProperty,
};
use crate::state::AppState;
use crate::theme::format_money;

use super::helpers::{html_escape, render_page, render_pager, require_admin};
use super::property::{parse_decimal, parse_i32, parse_i64};

/// Properties shown per admin listing page.
const PER_PAGE: u32 = 10;

/// Request body ceiling for property forms: a 5 MB image plus form fields,
/// with room for the multipart framing.
const FORM_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Create the admin property router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/properties", get(list_properties))
        .route(
            "/admin/properties/add",
            get(add_form).post(add_submit),
        )
        .route(
            "/admin/properties/{id}/edit",
            get(edit_form).post(edit_submit),
        )
        .route("/admin/properties/{id}/delete", post(delete_submit))
        .route("/admin/properties/{id}/featured", post(toggle_featured))
        .route("/admin/properties/{id}/status", post(change_status))
        .route("/admin/properties/bulk", post(bulk_submit))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

/// Raw query-string parameters for the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
struct AdminListingParams {
    search: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    property_type: Option<String>,
    status: Option<String>,
    page: Option<String>,
    // Flash outcome parameters from redirects.
    saved: Option<String>,
    deleted: Option<String>,
    done: Option<String>,
    skipped: Option<String>,
    error: Option<String>,
}

impl AdminListingParams {
    fn filters(&self) -> PropertyFilters {
        PropertyFilters {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category_id: parse_i64(self.category.as_deref()),
            property_type: self.property_type.as_deref().and_then(PropertyType::parse),
            status: self.status.as_deref().and_then(PropertyStatus::parse),
            ..Default::default()
        }
    }

    fn page(&self) -> u32 {
        parse_i64(self.page.as_deref())
            .and_then(|p| u32::try_from(p).ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1)
    }

    fn link_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search", self.search.clone().unwrap_or_default()),
            ("category", self.category.clone().unwrap_or_default()),
            ("type", self.property_type.clone().unwrap_or_default()),
            ("status", self.status.clone().unwrap_or_default()),
        ]
    }

    fn flash(&self) -> String {
        let mut html = String::new();
        if self.saved.is_some() {
            html.push_str("<p class=\"flash flash--ok\">Property saved.</p>");
        }
        if self.deleted.is_some() {
            html.push_str("<p class=\"flash flash--ok\">Property deleted.</p>");
        }
        if let Some(done) = self.done.as_deref() {
            let skipped = self.skipped.as_deref().unwrap_or("0");
            html.push_str(&format!(
                "<p class=\"flash flash--ok\">Bulk action finished: {} updated, {} skipped.</p>",
                html_escape(done),
                html_escape(skipped)
            ));
        }
        if self.error.is_some() {
            html.push_str("<p class=\"flash flash--error\">The last action failed. Check the logs.</p>");
        }
        html
    }
}

/// Admin property listing with filters and bulk actions.
///
/// GET /admin/properties
async fn list_properties(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<AdminListingParams>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    // Admin sees every status unless one is explicitly filtered.
    let query = ListingQuery::new(params.filters(), StatusScope::ShowAll);
    let pagination = Pagination::new(params.page(), PER_PAGE);

    let page = match listing::fetch_page(state.db(), &query, pagination).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, "admin property listing query failed");
            ListingPage::new(Vec::new(), 0, pagination.page, pagination.per_page)
        }
    };

    let categories = Category::list(state.db()).await.unwrap_or_default();

    let mut content = params.flash();

    if let Ok(stats) = listing::statistics(state.db()).await {
        content.push_str(&format!(
            "<p class=\"listing-summary\">{} total · {} available · {} sold · {} rented · {} featured</p>",
            stats.total, stats.available, stats.sold, stats.rented, stats.featured
        ));
    }

    content.push_str("<p><a class=\"button\" href=\"/admin/properties/add\">Add property</a></p>");

    content.push_str(&render_admin_filter_form(&params, &categories));

    content.push_str(
        r#"<form id="bulk-form" class="bulk-actions" method="post" action="/admin/properties/bulk">
<select name="bulk_action">
<option value="">Bulk action...</option>
<option value="delete">Delete</option>
<option value="mark_available">Mark available</option>
<option value="mark_sold">Mark sold</option>
<option value="mark_rented">Mark rented</option>
</select>
<button type="submit">Apply to selected</button>
</form>"#,
    );

    if page.items.is_empty() {
        content.push_str("<p>No properties found.</p>");
    } else {
        content.push_str(
            "<table class=\"admin-table\"><tr><th></th><th>Title</th><th>Price</th><th>Type</th><th>Status</th><th>Featured</th><th>Actions</th></tr>",
        );
        for item in &page.items {
            content.push_str(&render_property_row(item));
        }
        content.push_str("</table>");
    }

    content.push_str(&render_pager(
        "/admin/properties",
        &params.link_pairs(),
        page.page,
        page.total_pages,
    ));

    render_page(&state, &session, "/admin/properties", "Properties", &content).await
}

fn render_property_row(item: &crate::models::PropertySummary) -> String {
    let p = &item.property;
    let mut html = String::from("<tr>");

    html.push_str(&format!(
        "<td><input type=\"checkbox\" name=\"ids\" value=\"{}\" form=\"bulk-form\"></td>",
        p.id
    ));
    html.push_str(&format!(
        "<td><a href=\"/property/{}\">{}</a><br><small>{}</small></td>",
        p.id,
        html_escape(&p.title),
        html_escape(item.category_name.as_deref().unwrap_or("(uncategorized)"))
    ));
    html.push_str(&format!("<td>{}</td>", format_money(&p.price.to_string())));
    html.push_str(&format!("<td>{}</td>", p.property_type.as_str()));

    // Quick status change, one row per form.
    html.push_str(&format!(
        "<td><form method=\"post\" action=\"/admin/properties/{}/status\"><select name=\"status\">",
        p.id
    ));
    for status in PropertyStatus::ALL {
        let selected = if status == p.status { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{0}\"{selected}>{0}</option>",
            status.as_str()
        ));
    }
    html.push_str("</select><button type=\"submit\">Set</button></form></td>");

    html.push_str(&format!(
        "<td><form method=\"post\" action=\"/admin/properties/{}/featured\"><button type=\"submit\">{}</button></form></td>",
        p.id,
        if p.featured { "★" } else { "☆" }
    ));

    html.push_str(&format!(
        "<td><a href=\"/admin/properties/{0}/edit\">Edit</a> \
         <form class=\"inline\" method=\"post\" action=\"/admin/properties/{0}/delete\"><button type=\"submit\">Delete</button></form></td>",
        p.id
    ));

    html.push_str("</tr>");
    html
}

fn render_admin_filter_form(params: &AdminListingParams, categories: &[Category]) -> String {
    let search = html_escape(params.search.as_deref().unwrap_or_default());
    let current_category = parse_i64(params.category.as_deref());
    let current_type = params.property_type.as_deref().unwrap_or_default();
    let current_status = params.status.as_deref().unwrap_or_default();

    let mut html =
        String::from("<form class=\"listing-filters\" method=\"get\" action=\"/admin/properties\">");

    html.push_str(&format!(
        "<input type=\"text\" name=\"search\" placeholder=\"Search...\" value=\"{search}\">"
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
    for value in ["sale", "rent"] {
        let selected = if current_type == value { " selected" } else { "" };
        html.push_str(&format!("<option value=\"{value}\"{selected}>{value}</option>"));
    }
    html.push_str("</select>");

    html.push_str("<select name=\"status\"><option value=\"\">All statuses</option>");
    for status in PropertyStatus::ALL {
        let selected = if current_status == status.as_str() {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{0}\"{selected}>{0}</option>",
            status.as_str()
        ));
    }
    html.push_str("</select>");

    html.push_str("<button type=\"submit\">Filter</button>");
    html.push_str("<a href=\"/admin/properties\">Clear</a>");
    html.push_str("</form>");

    html
}

/// Show the add-property form.
///
/// GET /admin/properties/add
async fn add_form(State(state): State<AppState>, session: Session) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let categories = Category::list(state.db()).await.unwrap_or_default();
    let content = render_property_form(
        "/admin/properties/add",
        &HashMap::new(),
        None,
        &categories,
        &[],
    );

    render_page(
        &state,
        &session,
        "/admin/properties/add",
        "Add property",
        &content,
    )
    .await
}

/// Handle add-property submission.
///
/// POST /admin/properties/add (multipart)
async fn add_submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Response {
    let user = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let (fields, upload) = match read_property_form(multipart).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read property form");
            return Redirect::to("/admin/properties/add").into_response();
        }
    };

    let mut errors = Vec::new();
    let mut image_uri = None;

    if let Some((filename, data)) = upload {
        match state.images().store(&filename, &data).await {
            Ok(stored) => image_uri = Some(stored.uri),
            Err(e) => {
                tracing::warn!(error = %e, "property image rejected");
                errors.push(format!("Image rejected: {e}"));
            }
        }
    }

    let input = match parse_property_input(&fields, image_uri, Some(user.id)) {
        Ok(input) => Some(input),
        Err(mut parse_errors) => {
            errors.append(&mut parse_errors);
            None
        }
    };

    if errors.is_empty() {
        if let Some(input) = input {
            match Property::create(state.db(), &input).await {
                Ok(_) => return Redirect::to("/admin/properties?saved=1").into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to create property");
                    errors.push("Failed to add property. Please try again.".to_string());
                }
            }
        }
    }

    let categories = Category::list(state.db()).await.unwrap_or_default();
    let content = render_property_form(
        "/admin/properties/add",
        &fields,
        None,
        &categories,
        &errors,
    );

    render_page(
        &state,
        &session,
        "/admin/properties/add",
        "Add property",
        &content,
    )
    .await
}

/// Show the edit-property form.
///
/// GET /admin/properties/{id}/edit
async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let detail = match Property::find_by_id(state.db(), id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Redirect::to("/admin/properties").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to load property for edit");
            return Redirect::to("/admin/properties?error=1").into_response();
        }
    };

    let p = &detail.summary.property;
    let mut values = HashMap::new();
    values.insert("title".to_string(), p.title.clone());
    values.insert("description".to_string(), p.description.clone());
    values.insert("price".to_string(), p.price.to_string());
    values.insert("category_id".to_string(), p.category_id.to_string());
    values.insert(
        "property_type".to_string(),
        p.property_type.as_str().to_string(),
    );
    values.insert("bedrooms".to_string(), p.bedrooms.to_string());
    values.insert("bathrooms".to_string(), p.bathrooms.to_string());
    values.insert("area".to_string(), p.area.to_string());
    values.insert("location".to_string(), p.location.clone());
    values.insert(
        "address".to_string(),
        p.address.clone().unwrap_or_default(),
    );
    if p.featured {
        values.insert("featured".to_string(), "on".to_string());
    }
    values.insert("status".to_string(), p.status.as_str().to_string());

    let categories = Category::list(state.db()).await.unwrap_or_default();
    let content = render_property_form(
        &format!("/admin/properties/{id}/edit"),
        &values,
        p.image.as_deref(),
        &categories,
        &[],
    );

    render_page(
        &state,
        &session,
        "/admin/properties/edit",
        "Edit property",
        &content,
    )
    .await
}

/// Handle edit-property submission.
///
/// POST /admin/properties/{id}/edit (multipart)
async fn edit_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let previous = match Property::find_by_id(state.db(), id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Redirect::to("/admin/properties").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to load property for edit");
            return Redirect::to("/admin/properties?error=1").into_response();
        }
    };

    let (fields, upload) = match read_property_form(multipart).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read property form");
            return Redirect::to(&format!("/admin/properties/{id}/edit")).into_response();
        }
    };

    let mut errors = Vec::new();
    let mut new_image = None;

    if let Some((filename, data)) = upload {
        match state.images().store(&filename, &data).await {
            Ok(stored) => new_image = Some(stored.uri),
            Err(e) => {
                tracing::warn!(error = %e, "replacement image rejected");
                errors.push(format!("Image rejected: {e}"));
            }
        }
    }

    let input = match parse_property_input(&fields, new_image.clone(), None) {
        Ok(input) => Some(update_from_create(input)),
        Err(mut parse_errors) => {
            errors.append(&mut parse_errors);
            None
        }
    };

    if errors.is_empty() {
        if let Some(input) = input {
            match Property::update(state.db(), id, &input).await {
                Ok(true) => {
                    // The old image is only removed once the row points at the
                    // new one.
                    if new_image.is_some() {
                        if let Some(ref old) = previous.summary.property.image {
                            state.images().remove(old).await;
                        }
                    }
                    return Redirect::to("/admin/properties?saved=1").into_response();
                }
                Ok(false) => return Redirect::to("/admin/properties").into_response(),
                Err(e) => {
                    tracing::error!(error = %e, id, "failed to update property");
                    errors.push("Failed to update property. Please try again.".to_string());
                }
            }
        }
    }

    let categories = Category::list(state.db()).await.unwrap_or_default();
    let content = render_property_form(
        &format!("/admin/properties/{id}/edit"),
        &fields,
        previous.summary.property.image.as_deref(),
        &categories,
        &errors,
    );

    render_page(
        &state,
        &session,
        "/admin/properties/edit",
        "Edit property",
        &content,
    )
    .await
}

/// Delete a property and its stored image.
///
/// POST /admin/properties/{id}/delete
async fn delete_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    match Property::delete(state.db(), state.images(), id).await {
        Ok(true) => Redirect::to("/admin/properties?deleted=1").into_response(),
        Ok(false) => Redirect::to("/admin/properties").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id, "failed to delete property");
            Redirect::to("/admin/properties?error=1").into_response()
        }
    }
}

/// Toggle the featured flag.
///
/// POST /admin/properties/{id}/featured
async fn toggle_featured(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    if let Err(e) = Property::toggle_featured(state.db(), id).await {
        tracing::error!(error = %e, id, "failed to toggle featured");
        return Redirect::to("/admin/properties?error=1").into_response();
    }

    Redirect::to("/admin/properties").into_response()
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

/// Change a property's status. The value is validated against the status
/// allow-list before any write.
///
/// POST /admin/properties/{id}/status
async fn change_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let Some(status) = PropertyStatus::parse(&form.status) else {
        return AppError::Validation(vec!["Please choose a valid status".to_string()])
            .into_response();
    };

    if let Err(e) = Property::update_status(state.db(), id, status).await {
        tracing::error!(error = %e, id, "failed to update property status");
        return Redirect::to("/admin/properties?error=1").into_response();
    }

    Redirect::to("/admin/properties").into_response()
}

/// Apply a bulk action to the selected properties.
///
/// POST /admin/properties/bulk
///
/// The body arrives as repeated `ids` checkboxes plus a `bulk_action`; pairs
/// are read positionally so repeated keys survive.
async fn bulk_submit(
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(response) = require_admin(&state, &session).await {
        return response;
    }

    let mut action = None;
    let mut ids = Vec::new();
    for (key, value) in &pairs {
        match key.as_str() {
            "bulk_action" => action = Some(value.clone()),
            "ids" => {
                if let Ok(id) = value.trim().parse::<i64>() {
                    ids.push(id);
                }
            }
            _ => {}
        }
    }

    let outcome = match action.as_deref() {
        Some("delete") => Property::bulk_delete(state.db(), state.images(), &ids).await,
        Some("mark_available") => {
            Property::bulk_update_status(state.db(), &ids, PropertyStatus::Available).await
        }
        Some("mark_sold") => {
            Property::bulk_update_status(state.db(), &ids, PropertyStatus::Sold).await
        }
        Some("mark_rented") => {
            Property::bulk_update_status(state.db(), &ids, PropertyStatus::Rented).await
        }
        _ => return Redirect::to("/admin/properties").into_response(),
    };

    match outcome {
        Ok(outcome) => Redirect::to(&format!(
            "/admin/properties?done={}&skipped={}",
            outcome.succeeded.len(),
            outcome.skipped.len()
        ))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "bulk property action failed");
            Redirect::to("/admin/properties?error=1").into_response()
        }
    }
}

/// Read the multipart property form into text fields plus an optional image.
async fn read_property_form(
    mut multipart: Multipart,
) -> anyhow::Result<(HashMap<String, String>, Option<(String, Vec<u8>)>)> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_default();
            let data = field.bytes().await?.to_vec();
            if !filename.is_empty() && !data.is_empty() {
                image = Some((filename, data));
            }
        } else {
            let value = field.text().await?;
            fields.insert(name, value);
        }
    }

    Ok((fields, image))
}

/// Coerce submitted form fields into a validated [`CreateProperty`].
fn parse_property_input(
    fields: &HashMap<String, String>,
    image: Option<String>,
    created_by: Option<i64>,
) -> Result<CreateProperty, Vec<String>> {
    let mut errors = Vec::new();

    let price = parse_decimal(fields.get("price").map(String::as_str));
    let category_id = parse_i64(fields.get("category_id").map(String::as_str));
    let property_type = fields
        .get("property_type")
        .and_then(|s| PropertyType::parse(s));
    let status = fields.get("status").and_then(|s| PropertyStatus::parse(s));

    if price.is_none() {
        errors.push("Please enter a valid price".to_string());
    }
    if category_id.is_none() {
        errors.push("Please select a category".to_string());
    }
    if property_type.is_none() {
        errors.push("Please choose sale or rent".to_string());
    }
    if status.is_none() {
        errors.push("Please choose a valid status".to_string());
    }

    let input = CreateProperty {
        title: fields.get("title").cloned().unwrap_or_default(),
        description: fields.get("description").cloned().unwrap_or_default(),
        price: price.unwrap_or_else(|| BigDecimal::from(0)),
        category_id: category_id.unwrap_or(0),
        property_type: property_type.unwrap_or(PropertyType::Sale),
        bedrooms: parse_i32(fields.get("bedrooms").map(String::as_str)).unwrap_or(0),
        bathrooms: parse_i32(fields.get("bathrooms").map(String::as_str)).unwrap_or(0),
        area: parse_decimal(fields.get("area").map(String::as_str))
            .unwrap_or_else(|| BigDecimal::from(0)),
        location: fields.get("location").cloned().unwrap_or_default(),
        address: fields
            .get("address")
            .cloned()
            .filter(|s| !s.trim().is_empty()),
        image,
        featured: matches!(
            fields.get("featured").map(String::as_str),
            Some("on" | "1" | "true")
        ),
        status: status.unwrap_or(PropertyStatus::Available),
        created_by,
    };

    errors.extend(input.validate());

    if errors.is_empty() { Ok(input) } else { Err(errors) }
}

fn update_from_create(input: CreateProperty) -> UpdateProperty {
    UpdateProperty {
        title: input.title,
        description: input.description,
        price: input.price,
        category_id: input.category_id,
        property_type: input.property_type,
        bedrooms: input.bedrooms,
        bathrooms: input.bathrooms,
        area: input.area,
        location: input.location,
        address: input.address,
        image: input.image,
        featured: input.featured,
        status: input.status,
    }
}

/// Render the add/edit property form.
fn render_property_form(
    action: &str,
    values: &HashMap<String, String>,
    current_image: Option<&str>,
    categories: &[Category],
    errors: &[String],
) -> String {
    let get = |key: &str| html_escape(values.get(key).map(String::as_str).unwrap_or_default());

    let mut html = String::new();

    if !errors.is_empty() {
        html.push_str("<ul class=\"form-errors\">");
        for error in errors {
            html.push_str(&format!("<li>{}</li>", html_escape(error)));
        }
        html.push_str("</ul>");
    }

    html.push_str(&format!(
        "<form class=\"property-form\" method=\"post\" action=\"{action}\" enctype=\"multipart/form-data\">"
    ));

    html.push_str(&format!(
        "<label>Title * <input type=\"text\" name=\"title\" value=\"{}\" required></label>",
        get("title")
    ));
    html.push_str(&format!(
        "<label>Description <textarea name=\"description\" rows=\"5\">{}</textarea></label>",
        get("description")
    ));
    html.push_str(&format!(
        "<label>Price ($) * <input type=\"number\" name=\"price\" step=\"0.01\" min=\"0\" value=\"{}\" required></label>",
        get("price")
    ));

    let current_category = values.get("category_id").map(String::as_str).unwrap_or_default();
    html.push_str("<label>Category * <select name=\"category_id\" required><option value=\"\">Select...</option>");
    for category in categories {
        let selected = if current_category == category.id.to_string() {
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
    html.push_str("</select></label>");

    let current_type = values.get("property_type").map(String::as_str).unwrap_or_default();
    html.push_str("<label>Property type * <select name=\"property_type\" required>");
    for value in ["sale", "rent"] {
        let selected = if current_type == value { " selected" } else { "" };
        html.push_str(&format!("<option value=\"{value}\"{selected}>{value}</option>"));
    }
    html.push_str("</select></label>");

    let current_status = values.get("status").map(String::as_str).unwrap_or("available");
    html.push_str("<label>Status * <select name=\"status\" required>");
    for status in PropertyStatus::ALL {
        let selected = if current_status == status.as_str() {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{0}\"{selected}>{0}</option>",
            status.as_str()
        ));
    }
    html.push_str("</select></label>");

    html.push_str(&format!(
        "<label>Bedrooms <input type=\"number\" name=\"bedrooms\" min=\"0\" value=\"{}\"></label>",
        get("bedrooms")
    ));
    html.push_str(&format!(
        "<label>Bathrooms <input type=\"number\" name=\"bathrooms\" min=\"0\" value=\"{}\"></label>",
        get("bathrooms")
    ));
    html.push_str(&format!(
        "<label>Area (sqm) <input type=\"number\" name=\"area\" step=\"0.01\" min=\"0\" value=\"{}\"></label>",
        get("area")
    ));
    html.push_str(&format!(
        "<label>Location * <input type=\"text\" name=\"location\" value=\"{}\" required></label>",
        get("location")
    ));
    html.push_str(&format!(
        "<label>Address <input type=\"text\" name=\"address\" value=\"{}\"></label>",
        get("address")
    ));

    let featured_checked = if values.contains_key("featured") {
        " checked"
    } else {
        ""
    };
    html.push_str(&format!(
        "<label><input type=\"checkbox\" name=\"featured\"{featured_checked}> Featured</label>"
    ));

    if let Some(image) = current_image {
        let path = image.strip_prefix("local://").unwrap_or(image);
        html.push_str(&format!(
            "<p>Current image: <img src=\"/files/{}\" alt=\"current image\" width=\"120\"></p>",
            html_escape(path)
        ));
    }
    html.push_str(
        "<label>Image <input type=\"file\" name=\"image\" accept=\"image/jpeg,image/png,image/gif,image/webp\"></label>",
    );

    html.push_str("<button type=\"submit\">Save property</button>");
    html.push_str("</form>");

    html
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_fields() -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "City flat".to_string());
        fields.insert("description".to_string(), "Two rooms".to_string());
        fields.insert("price".to_string(), "185000".to_string());
        fields.insert("category_id".to_string(), "2".to_string());
        fields.insert("property_type".to_string(), "sale".to_string());
        fields.insert("bedrooms".to_string(), "2".to_string());
        fields.insert("bathrooms".to_string(), "1".to_string());
        fields.insert("area".to_string(), "64".to_string());
        fields.insert("location".to_string(), "Leeds".to_string());
        fields.insert("status".to_string(), "available".to_string());
        fields
    }

    #[test]
    fn parse_input_accepts_complete_form() {
        let input = parse_property_input(&base_fields(), None, Some(7)).unwrap();
        assert_eq!(input.title, "City flat");
        assert_eq!(input.category_id, 2);
        assert_eq!(input.bedrooms, 2);
        assert_eq!(input.created_by, Some(7));
        assert!(!input.featured);
    }

    #[test]
    fn parse_input_rejects_bad_enums_and_numbers() {
        let mut fields = base_fields();
        fields.insert("price".to_string(), "lots".to_string());
        fields.insert("property_type".to_string(), "lease".to_string());
        fields.insert("status".to_string(), "gone".to_string());

        let errors = parse_property_input(&fields, None, None).unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn parse_input_requires_title_and_location() {
        let mut fields = base_fields();
        fields.insert("title".to_string(), String::new());
        fields.remove("location");

        let errors = parse_property_input(&fields, None, None).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("title")));
        assert!(errors.iter().any(|e| e.contains("Location")));
    }

    #[test]
    fn parse_input_reads_featured_checkbox() {
        let mut fields = base_fields();
        fields.insert("featured".to_string(), "on".to_string());
        let input = parse_property_input(&fields, None, None).unwrap();
        assert!(input.featured);
    }

    #[test]
    fn form_renders_errors_and_values() {
        let fields = base_fields();
        let html = render_property_form(
            "/admin/properties/add",
            &fields,
            None,
            &[],
            &["Please select a category".to_string()],
        );
        assert!(html.contains("form-errors"));
        assert!(html.contains("value=\"City flat\""));
        assert!(html.contains("multipart/form-data"));
    }
}
