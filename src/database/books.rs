use super::{
    BEGIN_WRITE, Sqlite, author_from_row, count_referencing, ensure_exists, ensure_reference,
    is_foreign_key_violation, is_unique_violation, isbn_from_row, language_from_row, other,
};
use crate::models::{Book, BookFields, CatalogError, Entity, Genre, Text};
use crate::repositories::BookRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{FromRow, Row};
use std::collections::HashMap;

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        book_from_row(row)
    }
}

/// Reads a row shaped by `book_select!`. Genres are attached separately.
pub(super) fn book_from_row(row: &SqliteRow) -> Result<Book, sqlx::Error> {
    let id = row.try_get("id")?;
    let title: &str = row.try_get("title")?;
    let summary: &str = row.try_get("summary")?;
    let isbn = isbn_from_row(row, "isbn")?;
    let author = author_from_row(row, "author_")?;
    let language = language_from_row(row, "language_")?;

    Ok(Book::new(
        id,
        Text::new_unchecked(title),
        Text::new_unchecked(summary),
        isbn,
        author,
        language,
        Vec::new(),
    ))
}

pub(super) async fn genres_of(
    conn: &mut SqliteConnection,
    book_id: i64,
) -> Result<Vec<Genre>, sqlx::Error> {
    sqlx::query_as(
        "SELECT g.id, g.name FROM genre g \
         JOIN book_genre bg ON bg.genre_id = g.id \
         WHERE bg.book_id = ? ORDER BY g.id",
    )
    .bind(book_id)
    .fetch_all(conn)
    .await
}

/// Genres of every book, keyed by book id.
pub(super) async fn genres_by_book(
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<Genre>>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT bg.book_id, g.id, g.name FROM book_genre bg \
         JOIN genre g ON g.id = bg.genre_id ORDER BY g.id",
    )
    .fetch_all(conn)
    .await?;

    let mut genres: HashMap<i64, Vec<Genre>> = HashMap::new();
    for row in &rows {
        let book_id: i64 = row.try_get("book_id")?;
        genres.entry(book_id).or_default().push(Genre::from_row(row)?);
    }
    Ok(genres)
}

pub(super) async fn load_book(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Book>, sqlx::Error> {
    let book: Option<Book> = sqlx::query_as(concat!(book_select!(), " WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match book {
        Some(mut book) => {
            book.set_genres(genres_of(conn, id).await?);
            Ok(Some(book))
        }
        None => Ok(None),
    }
}

async fn validate_references(
    conn: &mut SqliteConnection,
    fields: &BookFields,
) -> Result<(), CatalogError> {
    ensure_reference(&mut *conn, "author_id", Entity::Author, fields.author_id()).await?;
    ensure_reference(&mut *conn, "language_id", Entity::Language, fields.language_id()).await?;
    for genre_id in fields.genre_ids() {
        ensure_reference(&mut *conn, "genre_ids", Entity::Genre, *genre_id).await?;
    }
    Ok(())
}

async fn replace_genre_links(
    conn: &mut SqliteConnection,
    book_id: i64,
    genre_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM book_genre WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO book_genre (book_id, genre_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn write_error(err: sqlx::Error, fields: &BookFields, context: String) -> CatalogError {
    if is_unique_violation(&err) {
        CatalogError::Duplicate {
            entity: Entity::Book,
            field: "isbn",
            value: fields.isbn().to_string(),
        }
    } else {
        other(err, context)
    }
}

async fn load_written_book(conn: &mut SqliteConnection, id: i64) -> Result<Book, CatalogError> {
    load_book(conn, id)
        .await
        .map_err(|err| other(err, format!(r#"Failed to reload book with id "{id}""#)))?
        .ok_or_else(|| CatalogError::Other(anyhow!(r#"Book with id "{id}" vanished after write"#)))
}

#[async_trait]
impl BookRepository for Sqlite {
    async fn create_book(&self, fields: &BookFields) -> Result<Book, CatalogError> {
        let context = || format!(r#"Failed to create book with title "{}""#, fields.title());
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        validate_references(&mut *tx, fields).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO book (title, summary, isbn, author_id, language_id) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(fields.title().as_str())
        .bind(fields.summary().as_str())
        .bind(fields.isbn().as_str())
        .bind(fields.author_id())
        .bind(fields.language_id())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| write_error(err, fields, context()))?;

        replace_genre_links(&mut *tx, id, fields.genre_ids())
            .await
            .map_err(|err| other(err, context()))?;

        let book = load_written_book(&mut *tx, id).await?;
        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, "created book");

        Ok(book)
    }

    async fn find_book(&self, id: i64) -> Result<Book, CatalogError> {
        let context = || format!(r#"Failed to retrieve book with id "{id}""#);
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        let book = load_book(&mut *tx, id)
            .await
            .map_err(|err| other(err, context()))?
            .ok_or(CatalogError::not_found(Entity::Book, id))?;

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(book)
    }

    async fn find_all_books(&self) -> Result<Vec<Book>, CatalogError> {
        let context = || "Failed to retrieve all books".to_string();
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        let mut books: Vec<Book> = sqlx::query_as(concat!(book_select!(), " ORDER BY b.id"))
            .fetch_all(&mut *tx)
            .await
            .map_err(|err| other(err, context()))?;
        let mut genres = genres_by_book(&mut *tx)
            .await
            .map_err(|err| other(err, context()))?;
        for book in &mut books {
            book.set_genres(genres.remove(&book.id()).unwrap_or_default());
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(books)
    }

    async fn find_books_by_author(&self, author_id: i64) -> Result<Vec<Book>, CatalogError> {
        let context = || format!(r#"Failed to retrieve books by author with id "{author_id}""#);
        let mut tx = self.pool.begin().await.map_err(|err| other(err, context()))?;

        ensure_exists(&mut *tx, Entity::Author, author_id).await?;

        let mut books: Vec<Book> =
            sqlx::query_as(concat!(book_select!(), " WHERE b.author_id = ? ORDER BY b.id"))
                .bind(author_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(|err| other(err, context()))?;
        for book in &mut books {
            let genres = genres_of(&mut *tx, book.id())
                .await
                .map_err(|err| other(err, context()))?;
            book.set_genres(genres);
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        Ok(books)
    }

    async fn update_book(&self, id: i64, fields: &BookFields) -> Result<Book, CatalogError> {
        let context = || format!(r#"Failed to update book with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        ensure_exists(&mut *tx, Entity::Book, id).await?;
        validate_references(&mut *tx, fields).await?;

        sqlx::query(
            "UPDATE book SET title = ?, summary = ?, isbn = ?, author_id = ?, language_id = ? \
             WHERE id = ?",
        )
        .bind(fields.title().as_str())
        .bind(fields.summary().as_str())
        .bind(fields.isbn().as_str())
        .bind(fields.author_id())
        .bind(fields.language_id())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| write_error(err, fields, context()))?;

        replace_genre_links(&mut *tx, id, fields.genre_ids())
            .await
            .map_err(|err| other(err, context()))?;

        let book = load_written_book(&mut *tx, id).await?;
        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, "updated book");

        Ok(book)
    }

    async fn delete_book(&self, id: i64) -> Result<(), CatalogError> {
        let context = || format!(r#"Failed to delete book with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        let copies = count_referencing(
            &mut *tx,
            "SELECT COUNT(*) FROM book_instance WHERE book_id = ?",
            id,
        )
        .await
        .map_err(|err| other(err, context()))?;
        if copies > 0 {
            return Err(CatalogError::InUse {
                entity: Entity::Book,
                id,
                dependents: format!("{copies} book instance(s)"),
            });
        }

        replace_genre_links(&mut *tx, id, &[])
            .await
            .map_err(|err| other(err, context()))?;

        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    CatalogError::InUse {
                        entity: Entity::Book,
                        id,
                        dependents: "book instances".to_string(),
                    }
                } else {
                    other(err, context())
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(Entity::Book, id));
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, "deleted book");

        Ok(())
    }
}
