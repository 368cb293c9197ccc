use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_auto(Category::Id))
                    .col(string_len(Category::Name, 256))
                    .col(string_len_uniq(Category::Slug, 50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::Id))
                    .col(string_len(Genre::Name, 256))
                    .col(string_len_uniq(Genre::Slug, 50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Title::Table)
                    .if_not_exists()
                    .col(pk_auto(Title::Id))
                    .col(string_len(Title::Name, 256))
                    .col(integer(Title::Year))
                    .col(text(Title::Description).default(""))
                    .col(integer_null(Title::CategoryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_category")
                            .from(Title::Table, Title::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_name")
                    .table(Title::Table)
                    .col(Title::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TitleGenre::Table)
                    .if_not_exists()
                    .col(pk_auto(TitleGenre::Id))
                    .col(integer(TitleGenre::TitleId))
                    .col(integer(TitleGenre::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genre_title")
                            .from(TitleGenre::Table, TitleGenre::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genre_genre")
                            .from(TitleGenre::Table, TitleGenre::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_genre_unique")
                    .table(TitleGenre::Table)
                    .col(TitleGenre::TitleId)
                    .col(TitleGenre::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TitleGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Title::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Category::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum Title {
    Table,
    Id,
    Name,
    Year,
    Description,
    CategoryId,
}

#[derive(DeriveIden)]
enum TitleGenre {
    Table,
    Id,
    TitleId,
    GenreId,
}
