use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(ColumnDef::new(Users::Email).string_len(60).not_null())
                    .col(ColumnDef::new(Users::FirstName).string_len(30).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(30).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(ColumnDef::new(Projects::Title).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Projects::Description)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Projects::Kind).string_len(128).not_null())
                    .col(fk_id_col(manager, Projects::AuthorUserId))
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_author_user_id")
                            .from(Projects::Table, Projects::AuthorUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_author_user_id")
                    .table(Projects::Table)
                    .col(Projects::AuthorUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Contributors::Table)
                    .col(pk_id_col(manager, Contributors::Id))
                    .col(fk_id_col(manager, Contributors::UserId))
                    .col(fk_id_col(manager, Contributors::ProjectId))
                    .col(
                        ColumnDef::new(Contributors::Permission)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("contributor")),
                    )
                    .col(ColumnDef::new(Contributors::Role).string_len(128).not_null())
                    .col(timestamp_col(Contributors::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contributors_user_id")
                            .from(Contributors::Table, Contributors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contributors_project_id")
                            .from(Contributors::Table, Contributors::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contributors_project_user_unique")
                    .table(Contributors::Table)
                    .col(Contributors::ProjectId)
                    .col(Contributors::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Issues::Table)
                    .col(pk_id_col(manager, Issues::Id))
                    .col(ColumnDef::new(Issues::Title).string_len(128).not_null())
                    .col(ColumnDef::new(Issues::Description).string_len(1000).not_null())
                    .col(ColumnDef::new(Issues::Tag).string_len(32).not_null())
                    .col(ColumnDef::new(Issues::Priority).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Issues::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("todo")),
                    )
                    .col(fk_id_col(manager, Issues::ProjectId))
                    .col(fk_id_col(manager, Issues::AuthorUserId))
                    .col(fk_id_col(manager, Issues::AssigneeUserId))
                    .col(timestamp_col(Issues::CreatedTime))
                    .col(timestamp_col(Issues::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issues_project_id")
                            .from(Issues::Table, Issues::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issues_author_user_id")
                            .from(Issues::Table, Issues::AuthorUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issues_assignee_user_id")
                            .from(Issues::Table, Issues::AssigneeUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_issues_project_id")
                    .table(Issues::Table)
                    .col(Issues::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Comments::Table)
                    .col(pk_id_col(manager, Comments::Id))
                    .col(
                        ColumnDef::new(Comments::Description)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(fk_id_col(manager, Comments::AuthorUserId))
                    .col(fk_id_col(manager, Comments::IssueId))
                    .col(timestamp_col(Comments::CreatedTime))
                    .col(timestamp_col(Comments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_author_user_id")
                            .from(Comments::Table, Comments::AuthorUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_issue_id")
                            .from(Comments::Table, Comments::IssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_issue_id")
                    .table(Comments::Table)
                    .col(Comments::IssueId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Issues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contributors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden + 'static>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden + 'static>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn timestamp_col<T: Iden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    PasswordHash,
    CreatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    #[iden = "type"]
    Kind,
    AuthorUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Contributors {
    Table,
    Id,
    UserId,
    ProjectId,
    Permission,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Issues {
    Table,
    Id,
    Title,
    Description,
    Tag,
    Priority,
    Status,
    ProjectId,
    AuthorUserId,
    AssigneeUserId,
    CreatedTime,
    UpdatedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    Description,
    AuthorUserId,
    IssueId,
    CreatedTime,
    UpdatedAt,
}
