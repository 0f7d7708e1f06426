#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Listing query engine integration tests.
//!
//! These exercise the query builder through the public API: predicate
//! generation, the count/listing mirror, sort allow-listing, and paging
//! math. Nothing here needs a database; the builder's output is inspected
//! structurally.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use dimora_server::listing::{
    ListingPage, ListingQuery, Pagination, PropertyFilters, SortField, SortOrder, StatusScope,
};
use dimora_server::models::{PropertyStatus, PropertyType};

fn page1() -> Pagination {
    Pagination::new(1, 10)
}

/// The WHERE clause of a built query, stripped of ORDER/LIMIT tail.
fn where_clause(sql: &str) -> String {
    let Some(start) = sql.find("WHERE") else {
        return String::new();
    };
    let end = sql.find(" ORDER BY").unwrap_or(sql.len());
    sql[start..end].to_string()
}

fn full_filters() -> PropertyFilters {
    PropertyFilters {
        search: Some("garden view".to_string()),
        category_id: Some(3),
        property_type: Some(PropertyType::Sale),
        status: None,
        featured: Some(true),
        price_min: Some(BigDecimal::from_str("100000").unwrap()),
        price_max: Some(BigDecimal::from_str("200000").unwrap()),
        bedrooms_min: Some(3),
        bathrooms_min: Some(2),
        area_min: Some(BigDecimal::from_str("50").unwrap()),
        area_max: Some(BigDecimal::from_str("220").unwrap()),
    }
}

// -------------------------------------------------------------------------
// Count / listing agreement
// -------------------------------------------------------------------------

#[test]
fn count_and_listing_agree_for_filter_combinations() {
    let combos: Vec<(PropertyFilters, StatusScope)> = vec![
        (PropertyFilters::default(), StatusScope::ShowAll),
        (PropertyFilters::default(), StatusScope::AvailableOnly),
        (
            PropertyFilters {
                search: Some("sea".to_string()),
                ..Default::default()
            },
            StatusScope::AvailableOnly,
        ),
        (
            PropertyFilters {
                status: Some(PropertyStatus::Rented),
                featured: Some(false),
                ..Default::default()
            },
            StatusScope::ShowAll,
        ),
        (full_filters(), StatusScope::AvailableOnly),
    ];

    for (filters, scope) in combos {
        let query = ListingQuery::new(filters, scope);
        let (listing_sql, listing_values) = query.build(page1());
        let (count_sql, count_values) = query.build_count();

        assert_eq!(
            where_clause(&listing_sql),
            where_clause(&count_sql),
            "predicates must match:\n{listing_sql}\n{count_sql}"
        );
        // Listing binds the same filter values plus limit and offset.
        assert_eq!(listing_values.0.len(), count_values.0.len() + 2);
    }
}

#[test]
fn count_has_no_pagination_or_ordering() {
    let query = ListingQuery::new(full_filters(), StatusScope::ShowAll);
    let (sql, _) = query.build_count();

    assert!(sql.contains("COUNT(*)"));
    assert!(!sql.contains("LIMIT"));
    assert!(!sql.contains("OFFSET"));
    assert!(!sql.contains("ORDER BY"));
}

// -------------------------------------------------------------------------
// Status scope
// -------------------------------------------------------------------------

#[test]
fn public_scope_defaults_to_available() {
    let query = ListingQuery::new(PropertyFilters::default(), StatusScope::AvailableOnly);
    let (sql, values) = query.build_count();

    assert!(sql.contains("\"status\" = $1"), "{sql}");
    assert_eq!(values.0.len(), 1);
    assert!(format!("{:?}", values.0[0]).contains("available"));
}

#[test]
fn admin_scope_adds_no_status_predicate() {
    let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll);
    let (sql, values) = query.build_count();

    assert!(!sql.contains("status"), "{sql}");
    assert!(values.0.is_empty());
}

#[test]
fn explicit_status_beats_public_default() {
    let filters = PropertyFilters {
        status: Some(PropertyStatus::Sold),
        ..Default::default()
    };
    let query = ListingQuery::new(filters, StatusScope::AvailableOnly);
    let (sql, values) = query.build_count();

    assert_eq!(sql.matches("\"status\"").count(), 1, "{sql}");
    assert!(format!("{:?}", values.0[0]).contains("sold"));
}

// -------------------------------------------------------------------------
// Individual predicates
// -------------------------------------------------------------------------

#[test]
fn price_bounds_are_bound_parameters() {
    let filters = PropertyFilters {
        price_min: Some(BigDecimal::from_str("100000").unwrap()),
        price_max: Some(BigDecimal::from_str("200000").unwrap()),
        ..Default::default()
    };
    let query = ListingQuery::new(filters, StatusScope::ShowAll);
    let (sql, values) = query.build_count();

    assert!(sql.contains("\"price\" >= $1"), "{sql}");
    assert!(sql.contains("\"price\" <= $2"), "{sql}");
    assert!(!sql.contains("100000"));
    let rendered = format!("{:?}", values.0);
    assert!(rendered.contains("100000"));
    assert!(rendered.contains("200000"));
}

#[test]
fn bedrooms_minimum_is_a_gte_predicate() {
    let filters = PropertyFilters {
        bedrooms_min: Some(3),
        ..Default::default()
    };
    let query = ListingQuery::new(filters, StatusScope::ShowAll);
    let (sql, values) = query.build_count();

    assert!(sql.contains("\"bedrooms\" >= $1"), "{sql}");
    assert!(format!("{:?}", values.0[0]).contains('3'));
}

#[test]
fn search_binds_one_pattern_per_like_clause() {
    let filters = PropertyFilters {
        search: Some("Lake House".to_string()),
        ..Default::default()
    };
    let query = ListingQuery::new(filters, StatusScope::ShowAll);
    let (sql, values) = query.build_count();

    assert_eq!(sql.matches("LIKE").count(), 4, "{sql}");
    assert_eq!(values.0.len(), 4);
    for value in &values.0 {
        assert!(
            format!("{value:?}").contains("%lake house%"),
            "same lowered pattern everywhere: {value:?}"
        );
    }
}

// -------------------------------------------------------------------------
// Sorting
// -------------------------------------------------------------------------

#[test]
fn unknown_sort_field_falls_back_to_created_at() {
    let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll).with_sort(
        SortField::parse("owner_ssn"),
        SortOrder::parse("DESC"),
    );
    let (sql, _) = query.build(page1());

    assert!(
        sql.contains("ORDER BY \"properties\".\"created_at\" DESC"),
        "{sql}"
    );
}

#[test]
fn sort_direction_normalizes_case_insensitively() {
    for (input, expected) in [
        ("asc", "ASC"),
        ("ASC", "ASC"),
        ("Asc", "ASC"),
        ("desc", "DESC"),
        ("descending", "DESC"),
        ("", "DESC"),
    ] {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll)
            .with_sort(SortField::Price, SortOrder::parse(input));
        let (sql, _) = query.build(page1());
        assert!(
            sql.contains(&format!("ORDER BY \"properties\".\"price\" {expected}")),
            "input {input:?}: {sql}"
        );
    }
}

// -------------------------------------------------------------------------
// Pagination
// -------------------------------------------------------------------------

#[test]
fn pages_cover_the_total_exactly() {
    let total: u64 = 25;
    let per_page: u32 = 10;
    let page = ListingPage::<i64>::new(vec![], total, 1, per_page);

    let mut remaining = total;
    for _ in 1..=page.total_pages {
        remaining = remaining.saturating_sub(u64::from(per_page));
    }
    assert_eq!(remaining, 0, "pages must cover every row");
    assert_eq!(page.total_pages, 3);
}

#[test]
fn offsets_walk_the_pages() {
    assert_eq!(Pagination::new(1, 9).offset(), 0);
    assert_eq!(Pagination::new(2, 9).offset(), 9);
    assert_eq!(Pagination::new(5, 9).offset(), 36);
}

#[test]
fn listing_page_boundaries() {
    let first = ListingPage::<i64>::new(vec![], 30, 1, 10);
    assert!(first.has_next);
    assert!(!first.has_prev);

    let last = ListingPage::<i64>::new(vec![], 30, 3, 10);
    assert!(!last.has_next);
    assert!(last.has_prev);

    let empty = ListingPage::<i64>::new(vec![], 0, 1, 10);
    assert_eq!(empty.total_pages, 0);
    assert!(!empty.has_next);
}
