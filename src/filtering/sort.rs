use sea_orm::sea_query::Order;

use crate::errors::ApiError;

const WRONG_SORTING_METHOD: &str = "Wrong sorting method";

/// Sortable columns of the composed catalog row. The only caller input ever
/// rendered as an identifier goes through [`SortField::parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Field,
    CreatedBy,
    Value,
    IsActive,
    IsApproved,
    IsArchived,
    CreatedAt,
    LastUpdated,
    AverageRating,
    MinPrice,
    ServiceType,
}

impl SortField {
    pub const ALL: [Self; 13] = [
        Self::Id,
        Self::Name,
        Self::Field,
        Self::CreatedBy,
        Self::Value,
        Self::IsActive,
        Self::IsApproved,
        Self::IsArchived,
        Self::CreatedAt,
        Self::LastUpdated,
        Self::AverageRating,
        Self::MinPrice,
        Self::ServiceType,
    ];

    /// Output column name in the composed row.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Field => "field",
            Self::CreatedBy => "created_by",
            Self::Value => "value",
            Self::IsActive => "is_active",
            Self::IsApproved => "is_approved",
            Self::IsArchived => "is_archived",
            Self::CreatedAt => "created_at",
            Self::LastUpdated => "last_updated",
            Self::AverageRating => "average_rating",
            Self::MinPrice => "min_price",
            Self::ServiceType => "service_type",
        }
    }

    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }
}

/// A validated `(field, direction)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct SafeSort {
    pub field: SortField,
    pub direction: Order,
}

impl Default for SafeSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: Order::Desc,
        }
    }
}

fn parse_direction(raw: &str) -> Option<Order> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("asc") {
        Some(Order::Asc)
    } else if raw.eq_ignore_ascii_case("desc") {
        Some(Order::Desc)
    } else {
        None
    }
}

/// Validate a sort request against the whitelist.
///
/// # Errors
///
/// `BadRequest("Wrong sorting method")` for an unknown field or a direction
/// other than `asc`/`desc`.
pub fn validate(field: &str, direction: &str) -> Result<SafeSort, ApiError> {
    let field = SortField::parse(field.trim()).ok_or_else(|| ApiError::bad_request(WRONG_SORTING_METHOD))?;
    let direction = parse_direction(direction).ok_or_else(|| ApiError::bad_request(WRONG_SORTING_METHOD))?;
    Ok(SafeSort { field, direction })
}

/// Resolve the optional `sort_by`/`sort_method` query pair.
///
/// Without `sort_by` the default order applies, but a present `sort_method`
/// is still validated. `sort_by` alone sorts ascending.
///
/// # Errors
///
/// Same as [`validate`].
pub fn parse_sorting(sort_by: Option<&str>, sort_method: Option<&str>) -> Result<SafeSort, ApiError> {
    let sort_by = sort_by.map(str::trim).filter(|s| !s.is_empty());
    let sort_method = sort_method.map(str::trim).filter(|s| !s.is_empty());

    match (sort_by, sort_method) {
        (Some(field), method) => validate(field, method.unwrap_or("asc")),
        (None, Some(method)) => parse_direction(method)
            .map(|_| SafeSort::default())
            .ok_or_else(|| ApiError::bad_request(WRONG_SORTING_METHOD)),
        (None, None) => Ok(SafeSort::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_whitelisted_pairs() {
        let sort = validate("name", "asc").unwrap();
        assert_eq!(sort.field, SortField::Name);
        assert_eq!(sort.direction, Order::Asc);

        let sort = validate("average_rating", "DESC").unwrap();
        assert_eq!(sort.field, SortField::AverageRating);
        assert_eq!(sort.direction, Order::Desc);
    }

    #[test]
    fn test_validate_rejects_unknown_direction() {
        let err = validate("name", "DROP").unwrap_err();
        assert_eq!(err.user_message(), "Wrong sorting method");
    }

    #[test]
    fn test_validate_rejects_injection_attempts() {
        assert!(validate("; DROP TABLE x", "asc").is_err());
        assert!(validate("name; --", "asc").is_err());
        assert!(validate("NAME", "asc").is_err());
    }

    #[test]
    fn test_every_field_round_trips() {
        for field in SortField::ALL {
            assert_eq!(SortField::parse(field.column()), Some(field));
        }
    }

    #[test]
    fn test_no_sort_defaults_to_newest_first() {
        assert_eq!(parse_sorting(None, None).unwrap(), SafeSort::default());
        assert_eq!(parse_sorting(Some(" "), None).unwrap(), SafeSort::default());
    }

    #[test]
    fn test_sort_by_without_method_is_ascending() {
        let sort = parse_sorting(Some("min_price"), None).unwrap();
        assert_eq!(sort.field, SortField::MinPrice);
        assert_eq!(sort.direction, Order::Asc);
    }

    #[test]
    fn test_method_is_validated_even_without_field() {
        assert!(parse_sorting(None, Some("sideways")).is_err());
        assert_eq!(parse_sorting(None, Some("asc")).unwrap(), SafeSort::default());
    }
}
