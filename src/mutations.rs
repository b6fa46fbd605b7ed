//! Write path: creating, editing and deleting listings, their packages and
//! their reviews.
//!
//! Ownership is part of each statement's WHERE clause, so a write either hits
//! a row the caller may touch or touches nothing. A miss is then explained by
//! an existence check (404 vs 403). Child rows go away with their listing
//! through `ON DELETE CASCADE`.

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, TransactionTrait,
    sea_query::{Alias, Condition, DynIden, Expr, InsertStatement, IntoIden, Query, SimpleExpr},
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::catalog::{Catalog, editable_by, listing_miss, parent_is};
use crate::errors::ApiError;
use crate::kind::ResourceKind;
use crate::models::{
    Deleted, ListingChanges, NewListing, PackageChanges, PackageInput, ReviewChanges, ReviewInput,
    ServiceDetail, SocialMediaInput,
};
use crate::schema::{Listing, Package, Review, SocialMedia};

fn required(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn package_table(kind: ResourceKind) -> Result<&'static str, ApiError> {
    kind.package_table()
        .ok_or_else(|| ApiError::bad_request("Sponsorships have no packages"))
}

fn check_price(price: i64) -> Result<(), ApiError> {
    if price < 0 {
        return Err(ApiError::bad_request("Price must not be negative"));
    }
    Ok(())
}

fn check_availability(kind: ResourceKind, availability: Option<i32>) -> Result<(), ApiError> {
    match availability {
        Some(_) if kind != ResourceKind::Rentals => {
            Err(ApiError::bad_request("Only rentals track availability"))
        }
        Some(units) if units < 0 => Err(ApiError::bad_request("Availability must not be negative")),
        _ => Ok(()),
    }
}

fn check_rating(rating: i32) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }
    Ok(())
}

fn check_package(kind: ResourceKind, package: &PackageInput) -> Result<(), ApiError> {
    package_table(kind)?;
    required(&package.name, "Package name")?;
    check_price(package.price)?;
    check_availability(kind, package.availability)
}

fn package_insert(
    kind: ResourceKind,
    parent: Uuid,
    package: &PackageInput,
) -> Result<InsertStatement, ApiError> {
    let mut columns: Vec<DynIden> = vec![
        Package::Id.into_iden(),
        Alias::new(kind.parent_key()).into_iden(),
        Package::Name.into_iden(),
        Package::Price.into_iden(),
        Package::Description.into_iden(),
    ];
    let mut values: Vec<SimpleExpr> = vec![
        Uuid::new_v4().into(),
        parent.into(),
        package.name.trim().into(),
        package.price.into(),
        package.description.clone().into(),
    ];
    if kind == ResourceKind::Rentals {
        columns.push(Package::Availability.into_iden());
        values.push(package.availability.into());
    }

    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(package_table(kind)?))
        .columns(columns)
        .values(values)?;
    Ok(insert)
}

fn social_media_insert(
    kind: ResourceKind,
    parent: Uuid,
    link: &SocialMediaInput,
) -> Result<InsertStatement, ApiError> {
    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(kind.social_media_table()))
        .columns([
            SocialMedia::Id.into_iden(),
            Alias::new(kind.parent_key()).into_iden(),
            SocialMedia::Name.into_iden(),
            SocialMedia::Links.into_iden(),
        ])
        .values([
            Uuid::new_v4().into(),
            parent.into(),
            required(&link.name, "Social media name")?.into(),
            required(&link.links, "Social media link")?.into(),
        ])?;
    Ok(insert)
}

impl ListingChanges {
    fn assignments(self) -> Result<Vec<(Listing, SimpleExpr)>, ApiError> {
        let mut set = Vec::new();
        if let Some(name) = self.name {
            set.push((Listing::Name, required(&name, "Name")?.into()));
        }
        if let Some(field) = self.field {
            set.push((Listing::Field, required(&field, "Field")?.into()));
        }
        for (column, value) in [
            (Listing::LogoUrl, self.logo_url),
            (Listing::Description, self.description),
            (Listing::Value, self.value),
            (Listing::Email, self.email),
            (Listing::Line, self.line),
            (Listing::Twitter, self.twitter),
            (Listing::Whatsapp, self.whatsapp),
            (Listing::Instagram, self.instagram),
            (Listing::Website, self.website),
        ] {
            if let Some(value) = value {
                set.push((column, value.into()));
            }
        }
        Ok(set)
    }
}

impl PackageChanges {
    fn assignments(self, kind: ResourceKind) -> Result<Vec<(Package, SimpleExpr)>, ApiError> {
        check_availability(kind, self.availability)?;
        let mut set = Vec::new();
        if let Some(name) = self.name {
            set.push((Package::Name, required(&name, "Package name")?.into()));
        }
        if let Some(price) = self.price {
            check_price(price)?;
            set.push((Package::Price, price.into()));
        }
        if let Some(description) = self.description {
            set.push((Package::Description, description.into()));
        }
        if let Some(units) = self.availability {
            set.push((Package::Availability, units.into()));
        }
        Ok(set)
    }
}

impl ReviewChanges {
    fn assignments(self) -> Result<Vec<(Review, SimpleExpr)>, ApiError> {
        let mut set = Vec::new();
        if let Some(rating) = self.rating {
            check_rating(rating)?;
            set.push((Review::Rating, rating.into()));
        }
        if let Some(review) = self.review {
            set.push((Review::Review, review.into()));
        }
        Ok(set)
    }
}

fn nothing_to_update<T>(set: &[T]) -> Result<(), ApiError> {
    if set.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }
    Ok(())
}

async fn execute<C, S>(db: &C, statement: &S) -> Result<u64, ApiError>
where
    C: ConnectionTrait,
    S: sea_orm::StatementBuilder,
{
    let result = db.execute(db.get_database_backend().build(statement)).await?;
    Ok(result.rows_affected())
}

/// Bump `last_updated` on a listing the caller may edit. Child-row writes run
/// this first, inside the same transaction.
async fn touch_listing(
    txn: &DatabaseTransaction,
    kind: ResourceKind,
    id: Uuid,
    identity: &Identity,
) -> Result<(), ApiError> {
    let update = Query::update()
        .table(Alias::new(kind.base_table()))
        .value(Listing::LastUpdated, Utc::now())
        .cond_where(editable_by(id, identity))
        .to_owned();
    if execute(txn, &update).await? == 0 {
        return Err(listing_miss(txn, kind, id).await);
    }
    Ok(())
}

fn child_row(kind: ResourceKind, parent: Uuid, id: Uuid) -> Condition {
    Condition::all()
        .add(Expr::col(Alias::new("id")).eq(id))
        .add(parent_is(kind, parent))
}

impl Catalog {
    /// Insert a listing owned by the caller, with its packages and social
    /// links, in one transaction.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a blank name or field, a negative price, packages on a
    /// sponsorship or availability outside rentals.
    pub async fn create_listing(
        &self,
        kind: ResourceKind,
        listing: NewListing,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        let name = required(&listing.name, "Name")?;
        let field = required(&listing.field, "Field")?;
        for package in &listing.packages {
            check_package(kind, package)?;
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(kind.base_table()))
            .columns([
                Listing::Id,
                Listing::Name,
                Listing::Field,
                Listing::CreatedBy,
                Listing::LogoUrl,
                Listing::Description,
                Listing::Value,
                Listing::Email,
                Listing::Line,
                Listing::Twitter,
                Listing::Whatsapp,
                Listing::Instagram,
                Listing::Website,
                Listing::CreatedAt,
                Listing::LastUpdated,
            ])
            .values([
                id.into(),
                name.into(),
                field.into(),
                identity.uid.clone().into(),
                listing.logo_url.into(),
                listing.description.into(),
                listing.value.into(),
                listing.email.into(),
                listing.line.into(),
                listing.twitter.into(),
                listing.whatsapp.into(),
                listing.instagram.into(),
                listing.website.into(),
                now.into(),
                now.into(),
            ])?;

        let txn = self.db().begin().await?;
        execute(&txn, &insert).await?;
        for package in &listing.packages {
            execute(&txn, &package_insert(kind, id, package)?).await?;
        }
        for link in &listing.social_media {
            execute(&txn, &social_media_insert(kind, id, link)?).await?;
        }
        txn.commit().await?;

        tracing::info!(%kind, %id, uid = %identity.uid, "listing created");
        self.find_by_id(kind, id).await
    }

    /// Apply the given field changes and bump `last_updated`.
    ///
    /// # Errors
    ///
    /// `BadRequest` if nothing would change, `Forbidden`/`NotFound` as for
    /// status changes.
    pub async fn update_listing(
        &self,
        kind: ResourceKind,
        id: Uuid,
        changes: ListingChanges,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        let set = changes.assignments()?;
        nothing_to_update(&set)?;

        let update = Query::update()
            .table(Alias::new(kind.base_table()))
            .values(set)
            .value(Listing::LastUpdated, Utc::now())
            .cond_where(editable_by(id, identity))
            .to_owned();
        if execute(self.db(), &update).await? == 0 {
            return Err(listing_miss(self.db(), kind, id).await);
        }

        tracing::info!(%kind, %id, uid = %identity.uid, "listing updated");
        self.find_by_id(kind, id).await
    }

    /// # Errors
    ///
    /// `Forbidden` for someone else's listing, `NotFound` if it does not exist.
    pub async fn delete_listing(
        &self,
        kind: ResourceKind,
        id: Uuid,
        identity: &Identity,
    ) -> Result<Deleted, ApiError> {
        let delete = Query::delete()
            .from_table(Alias::new(kind.base_table()))
            .cond_where(editable_by(id, identity))
            .to_owned();
        if execute(self.db(), &delete).await? == 0 {
            return Err(listing_miss(self.db(), kind, id).await);
        }

        tracing::info!(%kind, %id, uid = %identity.uid, "listing deleted");
        Ok(Deleted { id })
    }

    /// Append packages to a listing the caller may edit.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an empty list or an invalid package, otherwise as for
    /// [`Catalog::update_listing`].
    pub async fn add_packages(
        &self,
        kind: ResourceKind,
        id: Uuid,
        packages: Vec<PackageInput>,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        package_table(kind)?;
        nothing_to_update(&packages)?;
        for package in &packages {
            check_package(kind, package)?;
        }

        let txn = self.db().begin().await?;
        touch_listing(&txn, kind, id, identity).await?;
        for package in &packages {
            execute(&txn, &package_insert(kind, id, package)?).await?;
        }
        txn.commit().await?;

        tracing::info!(%kind, %id, count = packages.len(), "packages added");
        self.find_by_id(kind, id).await
    }

    /// # Errors
    ///
    /// `NotFound` if the package does not belong to this listing.
    pub async fn update_package(
        &self,
        kind: ResourceKind,
        id: Uuid,
        package_id: Uuid,
        changes: PackageChanges,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        let table = package_table(kind)?;
        let set = changes.assignments(kind)?;
        nothing_to_update(&set)?;

        let update = Query::update()
            .table(Alias::new(table))
            .values(set)
            .cond_where(child_row(kind, id, package_id))
            .to_owned();

        let txn = self.db().begin().await?;
        touch_listing(&txn, kind, id, identity).await?;
        if execute(&txn, &update).await? == 0 {
            return Err(ApiError::not_found("Package", Some(package_id.to_string())));
        }
        txn.commit().await?;

        tracing::info!(%kind, %id, %package_id, "package updated");
        self.find_by_id(kind, id).await
    }

    /// # Errors
    ///
    /// `NotFound` if the package does not belong to this listing.
    pub async fn delete_package(
        &self,
        kind: ResourceKind,
        id: Uuid,
        package_id: Uuid,
        identity: &Identity,
    ) -> Result<Deleted, ApiError> {
        let delete = Query::delete()
            .from_table(Alias::new(package_table(kind)?))
            .cond_where(child_row(kind, id, package_id))
            .to_owned();

        let txn = self.db().begin().await?;
        touch_listing(&txn, kind, id, identity).await?;
        if execute(&txn, &delete).await? == 0 {
            return Err(ApiError::not_found("Package", Some(package_id.to_string())));
        }
        txn.commit().await?;

        tracing::info!(%kind, %id, %package_id, "package deleted");
        Ok(Deleted { id: package_id })
    }

    /// Review any existing listing. The caller's name and email are stored
    /// with the review.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a rating outside 1..=5, `NotFound` if the listing does
    /// not exist.
    pub async fn add_review(
        &self,
        kind: ResourceKind,
        id: Uuid,
        review: ReviewInput,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        check_rating(review.rating)?;

        // INSERT ... SELECT so a missing listing inserts nothing.
        let source = Query::select()
            .expr(Expr::val(Uuid::new_v4()))
            .column(Listing::Id)
            .expr(Expr::val(identity.uid.clone()))
            .expr(Expr::val(identity.name.clone()))
            .expr(Expr::val(identity.email.clone()))
            .expr(Expr::val(review.rating))
            .expr(Expr::val(review.review))
            .expr(Expr::val(Utc::now()))
            .from(Alias::new(kind.base_table()))
            .and_where(Expr::col(Listing::Id).eq(id))
            .to_owned();
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(kind.review_table()))
            .columns([
                Review::Id.into_iden(),
                Alias::new(kind.parent_key()).into_iden(),
                Review::UserId.into_iden(),
                Review::UserName.into_iden(),
                Review::UserEmail.into_iden(),
                Review::Rating.into_iden(),
                Review::Review.into_iden(),
                Review::CreatedAt.into_iden(),
            ])
            .select_from(source)?;

        if execute(self.db(), &insert).await? == 0 {
            return Err(ApiError::not_found(kind.display_name(), Some(id.to_string())));
        }

        tracing::info!(%kind, %id, uid = %identity.uid, "review added");
        self.find_by_id(kind, id).await
    }

    /// Only the author may edit a review.
    ///
    /// # Errors
    ///
    /// `Forbidden` for someone else's review, `NotFound` if the review is not
    /// on this listing.
    pub async fn update_review(
        &self,
        kind: ResourceKind,
        id: Uuid,
        review_id: Uuid,
        changes: ReviewChanges,
        identity: &Identity,
    ) -> Result<ServiceDetail, ApiError> {
        let set = changes.assignments()?;
        nothing_to_update(&set)?;

        let update = Query::update()
            .table(Alias::new(kind.review_table()))
            .values(set)
            .cond_where(
                child_row(kind, id, review_id)
                    .add(Expr::col(Review::UserId).eq(identity.uid.clone())),
            )
            .to_owned();
        if execute(self.db(), &update).await? == 0 {
            return Err(self.review_miss(kind, id, review_id).await);
        }

        tracing::info!(%kind, %id, %review_id, "review updated");
        self.find_by_id(kind, id).await
    }

    /// The author or an admin may delete a review.
    ///
    /// # Errors
    ///
    /// As for [`Catalog::update_review`].
    pub async fn delete_review(
        &self,
        kind: ResourceKind,
        id: Uuid,
        review_id: Uuid,
        identity: &Identity,
    ) -> Result<Deleted, ApiError> {
        let mut condition = child_row(kind, id, review_id);
        if !identity.is_admin() {
            condition = condition.add(Expr::col(Review::UserId).eq(identity.uid.clone()));
        }
        let delete = Query::delete()
            .from_table(Alias::new(kind.review_table()))
            .cond_where(condition)
            .to_owned();
        if execute(self.db(), &delete).await? == 0 {
            return Err(self.review_miss(kind, id, review_id).await);
        }

        tracing::info!(%kind, %id, %review_id, uid = %identity.uid, "review deleted");
        Ok(Deleted { id: review_id })
    }

    async fn review_miss(&self, kind: ResourceKind, id: Uuid, review_id: Uuid) -> ApiError {
        let exists = Query::select()
            .column(Review::Id)
            .from(Alias::new(kind.review_table()))
            .cond_where(child_row(kind, id, review_id))
            .to_owned();
        let backend = self.db().get_database_backend();
        match self.db().query_one(backend.build(&exists)).await {
            Ok(None) => ApiError::not_found("Review", Some(review_id.to_string())),
            Ok(Some(_)) => ApiError::forbidden("You did not write this review"),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{PostgresQueryBuilder, SqliteQueryBuilder};

    fn package(price: i64, availability: Option<i32>) -> PackageInput {
        PackageInput {
            name: "Basic".into(),
            price,
            description: None,
            availability,
        }
    }

    #[test]
    fn test_package_rules_per_kind() {
        assert!(check_package(ResourceKind::MediaPartner, &package(100, None)).is_ok());
        assert!(check_package(ResourceKind::Rentals, &package(0, Some(3))).is_ok());

        let err = check_package(ResourceKind::Sponsorship, &package(100, None)).unwrap_err();
        assert_eq!(err.user_message(), "Sponsorships have no packages");
        let err = check_package(ResourceKind::MediaPartner, &package(100, Some(1))).unwrap_err();
        assert_eq!(err.user_message(), "Only rentals track availability");
        let err = check_package(ResourceKind::Rentals, &package(-1, None)).unwrap_err();
        assert_eq!(err.user_message(), "Price must not be negative");
        let err = check_package(ResourceKind::Rentals, &package(1, Some(-2))).unwrap_err();
        assert_eq!(err.user_message(), "Availability must not be negative");
    }

    #[test]
    fn test_rating_bounds() {
        assert!(check_rating(1).is_ok());
        assert!(check_rating(5).is_ok());
        assert!(check_rating(0).is_err());
        assert!(check_rating(6).is_err());
    }

    #[test]
    fn test_only_rental_packages_insert_availability() {
        let parent = Uuid::nil();
        let sql = package_insert(ResourceKind::Rentals, parent, &package(10, Some(2)))
            .unwrap()
            .to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""rt_id", "name", "price", "description", "availability")"#), "{sql}");

        let sql = package_insert(ResourceKind::MediaPartner, parent, &package(10, None))
            .unwrap()
            .to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""mp_id", "name", "price", "description")"#), "{sql}");
        assert!(!sql.contains("availability"), "{sql}");
    }

    #[test]
    fn test_blank_changes_are_rejected() {
        assert!(ListingChanges::default().assignments().unwrap().is_empty());
        let changes = ListingChanges {
            name: Some("  ".into()),
            ..ListingChanges::default()
        };
        assert_eq!(changes.assignments().unwrap_err().user_message(), "Name is required");
        assert!(nothing_to_update::<()>(&[]).is_err());
    }

    #[test]
    fn test_child_rows_are_scoped_to_their_listing() {
        let sql = Query::delete()
            .from_table(Alias::new("rentals_package"))
            .cond_where(child_row(ResourceKind::Rentals, Uuid::nil(), Uuid::from_u128(u128::MAX)))
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""id" = 'ffffffff-ffff-ffff-ffff-ffffffffffff'"#), "{sql}");
        assert!(sql.contains(r#"AND "rt_id" = '00000000-0000-0000-0000-000000000000'"#), "{sql}");
    }
}
