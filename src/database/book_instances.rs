use super::books::{book_from_row, genres_by_book, genres_of};
use super::{BEGIN_WRITE, Sqlite, ensure_exists, ensure_reference, other};
use crate::models::{BookInstance, BookInstanceFields, CatalogError, Entity, LoanStatus, Text};
use crate::repositories::BookInstanceRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{FromRow, Row};

macro_rules! instance_select {
    () => {
        concat!(
            "SELECT i.id AS instance_id, i.imprint AS instance_imprint, \
             i.status AS instance_status, i.due_back AS instance_due_back, ",
            book_columns!(),
            " FROM book_instance i JOIN book b ON b.id = i.book_id ",
            book_joins!()
        )
    };
}

impl<'r> FromRow<'r, SqliteRow> for BookInstance {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("instance_id")?;
        let imprint: &str = row.try_get("instance_imprint")?;
        let status: &str = row.try_get("instance_status")?;
        let due_back = row.try_get("instance_due_back")?;
        let book = book_from_row(row)?;

        let status = status
            .parse::<LoanStatus>()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self::new(
            id,
            book,
            Text::new_unchecked(imprint),
            status,
            due_back,
        ))
    }
}

async fn load_instance(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<BookInstance>, sqlx::Error> {
    let instance: Option<BookInstance> =
        sqlx::query_as(concat!(instance_select!(), " WHERE i.id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    match instance {
        Some(mut instance) => {
            let genres = genres_of(conn, instance.book().id()).await?;
            instance.book_mut().set_genres(genres);
            Ok(Some(instance))
        }
        None => Ok(None),
    }
}

async fn load_written_instance(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<BookInstance, CatalogError> {
    load_instance(conn, id)
        .await
        .map_err(|err| other(err, format!(r#"Failed to reload book instance with id "{id}""#)))?
        .ok_or_else(|| {
            CatalogError::Other(anyhow!(
                r#"Book instance with id "{id}" vanished after write"#
            ))
        })
}

#[async_trait]
impl BookInstanceRepository for Sqlite {
    async fn create_book_instance(
        &self,
        fields: &BookInstanceFields,
    ) -> Result<BookInstance, CatalogError> {
        let context = || {
            format!(
                r#"Failed to create book instance of book "{}""#,
                fields.book_id()
            )
        };
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        ensure_reference(&mut *tx, "book_id", Entity::Book, fields.book_id()).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO book_instance (book_id, imprint, status, due_back) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(fields.book_id())
        .bind(fields.imprint().as_str())
        .bind(fields.status().as_str())
        .bind(fields.due_back())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| other(err, context()))?;

        let instance = load_written_instance(&mut *tx, id).await?;
        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, book_id = fields.book_id(), "created book instance");

        Ok(instance)
    }

    async fn find_book_instance(&self, id: i64) -> Result<BookInstance, CatalogError> {
        let context = || format!(r#"Failed to retrieve book instance with id "{id}""#);
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        let instance = load_instance(&mut *tx, id)
            .await
            .map_err(|err| other(err, context()))?
            .ok_or(CatalogError::not_found(Entity::BookInstance, id))?;

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(instance)
    }

    async fn find_all_book_instances(&self) -> Result<Vec<BookInstance>, CatalogError> {
        let context = || "Failed to retrieve all book instances".to_string();
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        let mut instances: Vec<BookInstance> =
            sqlx::query_as(concat!(instance_select!(), " ORDER BY i.id"))
                .fetch_all(&mut *tx)
                .await
                .map_err(|err| other(err, context()))?;
        let genres = genres_by_book(&mut *tx)
            .await
            .map_err(|err| other(err, context()))?;
        for instance in &mut instances {
            let book_genres = genres
                .get(&instance.book().id())
                .cloned()
                .unwrap_or_default();
            instance.book_mut().set_genres(book_genres);
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(instances)
    }

    async fn find_instances_of_book(
        &self,
        book_id: i64,
    ) -> Result<Vec<BookInstance>, CatalogError> {
        let context = || format!(r#"Failed to retrieve instances of book with id "{book_id}""#);
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        ensure_exists(&mut *tx, Entity::Book, book_id).await?;

        let mut instances: Vec<BookInstance> =
            sqlx::query_as(concat!(instance_select!(), " WHERE i.book_id = ? ORDER BY i.id"))
                .bind(book_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(|err| other(err, context()))?;
        let genres = genres_of(&mut *tx, book_id)
            .await
            .map_err(|err| other(err, context()))?;
        for instance in &mut instances {
            instance.book_mut().set_genres(genres.clone());
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(instances)
    }

    async fn update_book_instance(
        &self,
        id: i64,
        fields: &BookInstanceFields,
    ) -> Result<BookInstance, CatalogError> {
        let context = || format!(r#"Failed to update book instance with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        ensure_exists(&mut *tx, Entity::BookInstance, id).await?;
        ensure_reference(&mut *tx, "book_id", Entity::Book, fields.book_id()).await?;

        sqlx::query(
            "UPDATE book_instance SET book_id = ?, imprint = ?, status = ?, due_back = ? \
             WHERE id = ?",
        )
        .bind(fields.book_id())
        .bind(fields.imprint().as_str())
        .bind(fields.status().as_str())
        .bind(fields.due_back())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| other(err, context()))?;

        let instance = load_written_instance(&mut *tx, id).await?;
        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, status = %fields.status(), "updated book instance");

        Ok(instance)
    }

    async fn delete_book_instance(&self, id: i64) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM book_instance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                other(
                    err,
                    format!(r#"Failed to delete book instance with id "{id}""#),
                )
            })?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(Entity::BookInstance, id));
        }

        Ok(())
    }
}
