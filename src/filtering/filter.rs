//! Typed filter model: the fixed vocabulary of recognised filter keys and
//! the value each one carries once validated.

use uuid::Uuid;

use crate::errors::ApiError;
use crate::kind::ResourceKind;
use crate::models::CatalogParams;

// Basic safety limits
const MAX_FILTER_VALUE_LENGTH: usize = 1_000;
const MAX_LIST_VALUES: usize = 100;

/// Ceiling bound for `fees=paid`. Goes through the same aggregate
/// predicate as `free`, so it currently admits every row.
pub const PAID_PRICE_CEILING: i64 = 9_999_999_999_999;

/// Recognised filter keys, in predicate compilation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKey {
    Id,
    Name,
    Field,
    IsActive,
    IsApproved,
    IsArchived,
    CreatedBy,
    ServiceType,
    Fees,
}

impl FilterKey {
    pub const ALL: [Self; 9] = [
        Self::Id,
        Self::Name,
        Self::Field,
        Self::IsActive,
        Self::IsApproved,
        Self::IsArchived,
        Self::CreatedBy,
        Self::ServiceType,
        Self::Fees,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Field => "field",
            Self::IsActive => "is_active",
            Self::IsApproved => "is_approved",
            Self::IsArchived => "is_archived",
            Self::CreatedBy => "created_by",
            Self::ServiceType => "service_type",
            Self::Fees => "fees",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// Derived price tier, matched against the computed `min_price`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fees {
    Paid,
    Free,
}

impl Fees {
    /// `None` for anything other than `paid`/`free`; such values are ignored.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(Self::Paid),
            "free" => Some(Self::Free),
            _ => None,
        }
    }

    /// Inclusive ceiling on `min_price`.
    #[must_use]
    pub const fn price_ceiling(self) -> i64 {
        match self {
            Self::Free => 0,
            Self::Paid => PAID_PRICE_CEILING,
        }
    }
}

/// Validated filters for one catalog request. Absent or blank values are `None`/empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
    pub ids: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub fields: Vec<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub is_archived: Option<bool>,
    pub created_by: Option<String>,
    pub service_types: Option<Vec<ResourceKind>>,
    pub fees: Option<Fees>,
}

impl FilterSet {
    /// Validate query-string input. Either every present key validates or the
    /// whole request is rejected; unknown keys never reach this point.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for non-boolean flags, malformed ids or oversized values.
    pub fn from_params(params: &CatalogParams) -> Result<Self, ApiError> {
        let mut filters = Self {
            name: text_value(FilterKey::Name, params.name.as_deref())?,
            is_active: bool_value(FilterKey::IsActive, params.is_active.as_deref())?,
            is_approved: bool_value(FilterKey::IsApproved, params.is_approved.as_deref())?,
            is_archived: bool_value(FilterKey::IsArchived, params.is_archived.as_deref())?,
            created_by: text_value(FilterKey::CreatedBy, params.created_by.as_deref())?,
            fees: params.fees.as_deref().and_then(Fees::parse),
            ..Self::default()
        };

        if let Some(fields) = &params.field {
            filters.fields = list_values(FilterKey::Field, fields)?;
        }

        if let Some(ids) = &params.id {
            let ids = list_values(FilterKey::Id, ids)?
                .iter()
                .map(|raw| {
                    Uuid::parse_str(raw)
                        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", FilterKey::Id.as_str())))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if !ids.is_empty() {
                filters.ids = Some(ids);
            }
        }

        if let Some(service_types) = &params.service_type {
            let kinds: Vec<ResourceKind> = list_values(FilterKey::ServiceType, service_types)?
                .iter()
                .filter_map(|raw| ResourceKind::from_discriminator(raw))
                .collect();
            if !kinds.is_empty() {
                filters.service_types = Some(kinds);
            }
        }

        Ok(filters)
    }

    /// Filter matching exactly the given ids, used to materialise recommendations.
    #[must_use]
    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Keys carrying a value, in compilation order.
    #[must_use]
    pub fn active_keys(&self) -> Vec<FilterKey> {
        FilterKey::ALL
            .into_iter()
            .filter(|key| match key {
                FilterKey::Id => self.ids.is_some(),
                FilterKey::Name => self.name.is_some(),
                FilterKey::Field => !self.fields.is_empty(),
                FilterKey::IsActive => self.is_active.is_some(),
                FilterKey::IsApproved => self.is_approved.is_some(),
                FilterKey::IsArchived => self.is_archived.is_some(),
                FilterKey::CreatedBy => self.created_by.is_some(),
                FilterKey::ServiceType => self.service_types.is_some(),
                FilterKey::Fees => self.fees.is_some(),
            })
            .collect()
    }

    /// Whether rows of `kind` can pass the `service_type` filter.
    #[must_use]
    pub fn admits_kind(&self, kind: ResourceKind) -> bool {
        self.service_types
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&kind))
    }
}

fn text_value(key: FilterKey, raw: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.len() > MAX_FILTER_VALUE_LENGTH {
        return Err(ApiError::bad_request(format!("Value for {} is too long", key.as_str())));
    }
    Ok(Some(value.to_string()))
}

fn bool_value(key: FilterKey, raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(_) => Err(ApiError::bad_request(format!("Invalid value for {}", key.as_str()))),
    }
}

fn list_values(key: FilterKey, raw: &[String]) -> Result<Vec<String>, ApiError> {
    let values: Vec<String> = raw
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.len() > MAX_LIST_VALUES {
        return Err(ApiError::bad_request(format!("Too many values for {}", key.as_str())));
    }
    if values.iter().any(|v| v.len() > MAX_FILTER_VALUE_LENGTH) {
        return Err(ApiError::bad_request(format!("Value for {} is too long", key.as_str())));
    }
    Ok(values)
}
