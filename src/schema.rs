//! Identifiers for the catalog tables.
//!
//! The three base tables share one column layout, so a single [`Listing`]
//! identifier set is reused with a per-kind table alias. Table names come from
//! [`crate::kind::ResourceKind`].

use sea_orm::DeriveIden;

/// Columns shared by every base table (`media_partner`, `sponsorship`, `rentals`).
#[derive(DeriveIden, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listing {
    Id,
    Name,
    Field,
    CreatedBy,
    LogoUrl,
    Description,
    Value,
    Email,
    Line,
    Twitter,
    Whatsapp,
    Instagram,
    Website,
    IsActive,
    IsApproved,
    IsArchived,
    CreatedAt,
    LastUpdated,
}

impl Listing {
    /// Projection order of the base columns in every union branch. All
    /// branches must emit the same columns in the same order.
    pub const COLUMNS: [Self; 18] = [
        Self::Id,
        Self::Name,
        Self::Field,
        Self::CreatedBy,
        Self::LogoUrl,
        Self::Description,
        Self::Value,
        Self::Email,
        Self::Line,
        Self::Twitter,
        Self::Whatsapp,
        Self::Instagram,
        Self::Website,
        Self::IsActive,
        Self::IsApproved,
        Self::IsArchived,
        Self::CreatedAt,
        Self::LastUpdated,
    ];
}

#[derive(DeriveIden, Clone, Copy, Debug)]
pub enum Package {
    Id,
    Name,
    Price,
    Description,
    Availability,
}

#[derive(DeriveIden, Clone, Copy, Debug)]
pub enum Review {
    Id,
    UserId,
    UserName,
    UserEmail,
    Rating,
    Review,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy, Debug)]
pub enum SocialMedia {
    Id,
    Name,
    Links,
}
