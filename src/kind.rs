//! The three bookable service kinds and the per-kind schema facts the query
//! engine needs (table names, parent keys, discriminator literals).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Closed set of resource kinds served by the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    MediaPartner,
    Sponsorship,
    Rentals,
}

impl ResourceKind {
    /// Every kind, in the order union branches are emitted.
    pub const ALL: [Self; 3] = [Self::MediaPartner, Self::Sponsorship, Self::Rentals];

    /// Value of the `service_type` discriminator column.
    #[must_use]
    pub const fn discriminator(self) -> &'static str {
        match self {
            Self::MediaPartner => "media_partner",
            Self::Sponsorship => "sponsorship",
            Self::Rentals => "rentals",
        }
    }

    /// URL segment of the per-kind endpoints.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::MediaPartner => "media-partner",
            Self::Sponsorship => "sponsorship",
            Self::Rentals => "rentals",
        }
    }

    #[must_use]
    pub const fn base_table(self) -> &'static str {
        match self {
            Self::MediaPartner => "media_partner",
            Self::Sponsorship => "sponsorship",
            Self::Rentals => "rentals",
        }
    }

    #[must_use]
    pub const fn review_table(self) -> &'static str {
        match self {
            Self::MediaPartner => "media_partner_review",
            Self::Sponsorship => "sponsorship_review",
            Self::Rentals => "rentals_review",
        }
    }

    /// Sponsorships carry no priced packages.
    #[must_use]
    pub const fn package_table(self) -> Option<&'static str> {
        match self {
            Self::MediaPartner => Some("media_partner_package"),
            Self::Sponsorship => None,
            Self::Rentals => Some("rentals_package"),
        }
    }

    #[must_use]
    pub const fn social_media_table(self) -> &'static str {
        match self {
            Self::MediaPartner => "media_partner_social_media",
            Self::Sponsorship => "sponsorship_social_media",
            Self::Rentals => "rentals_social_media",
        }
    }

    /// Foreign-key column that child tables use to point at the base row.
    #[must_use]
    pub const fn parent_key(self) -> &'static str {
        match self {
            Self::MediaPartner => "mp_id",
            Self::Sponsorship => "sp_id",
            Self::Rentals => "rt_id",
        }
    }

    /// Human readable singular name used in error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MediaPartner => "Media partner",
            Self::Sponsorship => "Sponsorship",
            Self::Rentals => "Rental",
        }
    }

    /// Parse a `service_type` discriminator value.
    #[must_use]
    pub fn from_discriminator(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator().eq_ignore_ascii_case(value.trim()))
    }

    /// Parse a URL path segment such as `media-partner`.
    #[must_use]
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path_segment() == segment)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_discriminator(s)
            .or_else(|| Self::from_path_segment(s))
            .ok_or_else(|| format!("unknown service type '{s}'"))
    }
}
