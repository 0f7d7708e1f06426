//! Listing query types: filter set, status scope, sorting, pagination.

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::models::{PropertyStatus, PropertyType};

/// Optional filters for the property listing.
///
/// Absent fields contribute nothing to the generated query; each present
/// field appends exactly one predicate.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilters {
    /// Free-text search over title, description, location, and address.
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
    pub price_min: Option<BigDecimal>,
    pub price_max: Option<BigDecimal>,
    pub bedrooms_min: Option<i32>,
    pub bathrooms_min: Option<i32>,
    pub area_min: Option<BigDecimal>,
    pub area_max: Option<BigDecimal>,
}

/// What to do when no explicit status filter is supplied.
///
/// The default is a caller decision, not a builder default: public pages
/// pass [`StatusScope::AvailableOnly`], the admin area passes
/// [`StatusScope::ShowAll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    /// No implicit status predicate.
    ShowAll,
    /// Restrict to `status = 'available'`.
    AvailableOnly,
}

/// Sort fields allowed in listing queries.
///
/// This is the whole allow-list; unrecognized input falls back to
/// [`SortField::CreatedAt`] and never reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Title,
    Bedrooms,
    Bathrooms,
    Area,
}

impl SortField {
    pub fn parse(input: &str) -> Self {
        match input {
            "created_at" => SortField::CreatedAt,
            "price" => SortField::Price,
            "title" => SortField::Title,
            "bedrooms" => SortField::Bedrooms,
            "bathrooms" => SortField::Bathrooms,
            "area" => SortField::Area,
            _ => SortField::CreatedAt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Title => "title",
            SortField::Bedrooms => "bedrooms",
            SortField::Bathrooms => "bathrooms",
            SortField::Area => "area",
        }
    }
}

/// Sort direction, defaulting to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Case-insensitive parse; anything other than "asc" is descending.
    pub fn parse(input: &str) -> Self {
        if input.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Pagination window. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Create a window, coercing degenerate input into the smallest valid one.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    /// Total matches across all pages.
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> ListingPage<T> {
    /// Create a new page with paging calculations.
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page > 0 {
            ((total as f64) / f64::from(per_page)).ceil() as u32
        } else {
            1
        };

        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_allow_list() {
        assert_eq!(SortField::parse("price"), SortField::Price);
        assert_eq!(SortField::parse("area"), SortField::Area);
        // Injection attempts and typos fall back to created_at.
        assert_eq!(
            SortField::parse("price; DROP TABLE properties"),
            SortField::CreatedAt
        );
        assert_eq!(SortField::parse("PRICE"), SortField::CreatedAt);
        assert_eq!(SortField::parse(""), SortField::CreatedAt);
    }

    #[test]
    fn sort_order_normalizes() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
        assert_eq!(SortOrder::parse(""), SortOrder::Desc);
    }

    #[test]
    fn pagination_offsets() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 10).offset(), 20);
        // Page zero coerces to page one.
        assert_eq!(Pagination::new(0, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 0).per_page, 1);
    }

    #[test]
    fn listing_page_math() {
        let page = ListingPage::new(vec![1, 2, 3], 25, 2, 10);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);

        let last = ListingPage::<i32>::new(vec![], 25, 3, 10);
        assert!(!last.has_next);
        assert!(last.has_prev);

        let single = ListingPage::<i32>::new(vec![], 5, 1, 10);
        assert_eq!(single.total_pages, 1);
        assert!(!single.has_next);
        assert!(!single.has_prev);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let page = ListingPage::<i32>::new(vec![], 0, 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
