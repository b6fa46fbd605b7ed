//! Schema migrations for the catalog tables.

use sea_orm_migration::prelude::*;

use crate::kind::ResourceKind;
use crate::schema::{Listing, Package, Review, SocialMedia};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateCatalogTables), Box::new(AddReviewerProfile)]
    }
}

pub struct CreateCatalogTables;

impl MigrationName for CreateCatalogTables {
    fn name(&self) -> &'static str {
        "m20240601_000001_create_catalog_tables"
    }
}

fn base_table(kind: ResourceKind) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(kind.base_table()))
        .if_not_exists()
        .col(ColumnDef::new(Listing::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Listing::Name).string().not_null())
        .col(ColumnDef::new(Listing::Field).string().not_null())
        .col(ColumnDef::new(Listing::CreatedBy).string().not_null())
        .col(ColumnDef::new(Listing::LogoUrl).string())
        .col(ColumnDef::new(Listing::Description).text())
        .col(ColumnDef::new(Listing::Value).text())
        .col(ColumnDef::new(Listing::Email).string())
        .col(ColumnDef::new(Listing::Line).string())
        .col(ColumnDef::new(Listing::Twitter).string())
        .col(ColumnDef::new(Listing::Whatsapp).string())
        .col(ColumnDef::new(Listing::Instagram).string())
        .col(ColumnDef::new(Listing::Website).string())
        .col(ColumnDef::new(Listing::IsActive).boolean().not_null().default(true))
        .col(ColumnDef::new(Listing::IsApproved).boolean().not_null().default(false))
        .col(ColumnDef::new(Listing::IsArchived).boolean().not_null().default(false))
        .col(ColumnDef::new(Listing::CreatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Listing::LastUpdated).timestamp_with_time_zone().not_null())
        .to_owned()
}

/// Child table skeleton: uuid key plus a cascading reference to the base row.
fn child_table(kind: ResourceKind, table: &'static str) -> TableCreateStatement {
    let parent_key = Alias::new(kind.parent_key());
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new("id")).uuid().not_null().primary_key())
        .col(ColumnDef::new(parent_key.clone()).uuid().not_null())
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{table}_{}", kind.parent_key()))
                .from(Alias::new(table), parent_key)
                .to(Alias::new(kind.base_table()), Listing::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn package_table(kind: ResourceKind, table: &'static str) -> TableCreateStatement {
    let mut statement = child_table(kind, table);
    statement
        .col(ColumnDef::new(Package::Name).string().not_null())
        .col(ColumnDef::new(Package::Price).big_integer().not_null())
        .col(ColumnDef::new(Package::Description).text());
    if kind == ResourceKind::Rentals {
        statement.col(ColumnDef::new(Package::Availability).integer());
    }
    statement
}

fn review_table(kind: ResourceKind) -> TableCreateStatement {
    let mut statement = child_table(kind, kind.review_table());
    statement
        .col(ColumnDef::new(Review::UserId).string().not_null())
        .col(ColumnDef::new(Review::Rating).integer().not_null())
        .col(ColumnDef::new(Review::Review).text())
        .col(ColumnDef::new(Review::CreatedAt).timestamp_with_time_zone().not_null());
    statement
}

fn social_media_table(kind: ResourceKind) -> TableCreateStatement {
    let mut statement = child_table(kind, kind.social_media_table());
    statement
        .col(ColumnDef::new(SocialMedia::Name).string().not_null())
        .col(ColumnDef::new(SocialMedia::Links).string().not_null());
    statement
}

fn child_index(kind: ResourceKind, table: &'static str) -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(format!("idx_{table}_{}", kind.parent_key()))
        .table(Alias::new(table))
        .col(Alias::new(kind.parent_key()))
        .to_owned()
}

fn child_tables(kind: ResourceKind) -> Vec<&'static str> {
    let mut tables = vec![kind.review_table(), kind.social_media_table()];
    tables.extend(kind.package_table());
    tables
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCatalogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for kind in ResourceKind::ALL {
            manager.create_table(base_table(kind)).await?;
            manager.create_table(review_table(kind)).await?;
            manager.create_table(social_media_table(kind)).await?;
            if let Some(table) = kind.package_table() {
                manager.create_table(package_table(kind, table)).await?;
            }
            for table in child_tables(kind) {
                manager.create_index(child_index(kind, table)).await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for kind in ResourceKind::ALL {
            for table in child_tables(kind) {
                manager
                    .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                    .await?;
            }
            manager
                .drop_table(
                    Table::drop()
                        .table(Alias::new(kind.base_table()))
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

/// Reviews keep the author's name and email as they were when the review was
/// written.
pub struct AddReviewerProfile;

impl MigrationName for AddReviewerProfile {
    fn name(&self) -> &'static str {
        "m20240615_000002_add_reviewer_profile"
    }
}

// SQLite accepts a single column per ALTER TABLE.
fn reviewer_columns(kind: ResourceKind) -> [TableAlterStatement; 2] {
    let table = Alias::new(kind.review_table());
    [
        Table::alter()
            .table(table.clone())
            .add_column(ColumnDef::new(Review::UserName).string())
            .to_owned(),
        Table::alter()
            .table(table)
            .add_column(ColumnDef::new(Review::UserEmail).string())
            .to_owned(),
    ]
}

#[async_trait::async_trait]
impl MigrationTrait for AddReviewerProfile {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for kind in ResourceKind::ALL {
            for statement in reviewer_columns(kind) {
                manager.alter_table(statement).await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for kind in ResourceKind::ALL {
            for column in [Review::UserName, Review::UserEmail] {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Alias::new(kind.review_table()))
                            .drop_column(column)
                            .to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_query::PostgresQueryBuilder;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations().iter().map(|m| m.name().to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_reviewer_columns_are_nullable() {
        let [name, email] = reviewer_columns(ResourceKind::Rentals);
        let name = name.to_string(PostgresQueryBuilder);
        assert!(name.starts_with(r#"ALTER TABLE "rentals_review" ADD COLUMN "user_name""#), "{name}");
        assert!(!name.contains("NOT NULL"), "{name}");
        let email = email.to_string(PostgresQueryBuilder);
        assert!(email.contains(r#"ADD COLUMN "user_email""#), "{email}");
    }
}
