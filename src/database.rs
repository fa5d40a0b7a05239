use crate::models::{
    Author, AuthorFields, CatalogError, Entity, Genre, GenreFields, Isbn, Language,
    LanguageFields, Text,
};
use crate::repositories::Catalog;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;

/// Columns of a book joined with its author and language. Author and language
/// columns carry an `author_` / `language_` prefix.
macro_rules! book_columns {
    () => {
        "b.id, b.title, b.summary, b.isbn, \
         a.id AS author_id, a.first_name AS author_first_name, \
         a.last_name AS author_last_name, a.date_of_birth AS author_date_of_birth, \
         a.date_of_death AS author_date_of_death, \
         l.id AS language_id, l.name AS language_name"
    };
}

macro_rules! book_joins {
    () => {
        "JOIN author a ON a.id = b.author_id JOIN language l ON l.id = b.language_id"
    };
}

macro_rules! book_select {
    () => {
        concat!("SELECT ", book_columns!(), " FROM book b ", book_joins!())
    };
}

mod authors;
mod book_instances;
mod books;
mod genres;
mod languages;

static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens write transactions holding the write lock, so a transaction that
/// reads before it writes never has to upgrade its lock.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(path)
            .with_context(|| format!("Invalid database path {path}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePool::connect_with(opts)
            .await
            .with_context(|| format!("Failed to open database at {path}"))?;

        Self::migrate(pool).await
    }

    /// A private database that lives as long as the returned handle.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .context("Failed to open in-memory database")?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> anyhow::Result<Self> {
        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::debug!("database migrations applied");

        Ok(Self { pool })
    }
}

#[async_trait]
impl Catalog for Sqlite {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to reach the database")?;
        Ok(())
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        author_from_row(row, "")
    }
}

impl<'r> FromRow<'r, SqliteRow> for Genre {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let name: &str = row.try_get("name")?;

        let fields = GenreFields::new_unchecked(Text::new_unchecked(name));
        Ok(Self::new(id, fields))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Language {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        language_from_row(row, "")
    }
}

fn author_from_row(row: &SqliteRow, prefix: &str) -> Result<Author, sqlx::Error> {
    let id = row.try_get(format!("{prefix}id").as_str())?;
    let first_name: &str = row.try_get(format!("{prefix}first_name").as_str())?;
    let last_name: &str = row.try_get(format!("{prefix}last_name").as_str())?;
    let date_of_birth = row.try_get(format!("{prefix}date_of_birth").as_str())?;
    let date_of_death = row.try_get(format!("{prefix}date_of_death").as_str())?;

    let fields = AuthorFields::new_unchecked(
        Text::new_unchecked(first_name),
        Text::new_unchecked(last_name),
        date_of_birth,
        date_of_death,
    );
    Ok(Author::new(id, fields))
}

fn language_from_row(row: &SqliteRow, prefix: &str) -> Result<Language, sqlx::Error> {
    let id = row.try_get(format!("{prefix}id").as_str())?;
    let name: &str = row.try_get(format!("{prefix}name").as_str())?;

    let fields = LanguageFields::new_unchecked(Text::new_unchecked(name));
    Ok(Language::new(id, fields))
}

fn isbn_from_row(row: &SqliteRow, column: &str) -> Result<Isbn, sqlx::Error> {
    let isbn: &str = row.try_get(column)?;
    Ok(Isbn::new_unchecked(isbn))
}

const fn table_name(entity: Entity) -> &'static str {
    match entity {
        Entity::Author => "author",
        Entity::Genre => "genre",
        Entity::Language => "language",
        Entity::Book => "book",
        Entity::BookInstance => "book_instance",
    }
}

async fn row_exists(
    conn: &mut SqliteConnection,
    entity: Entity,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let query = format!("SELECT COUNT(*) FROM {} WHERE id = ?", table_name(entity));
    let count: i64 = sqlx::query_scalar(&query).bind(id).fetch_one(conn).await?;
    Ok(count > 0)
}

/// Fails with a validation error on `field` unless the referenced row exists.
async fn ensure_reference(
    conn: &mut SqliteConnection,
    field: &'static str,
    entity: Entity,
    id: i64,
) -> Result<(), CatalogError> {
    let exists = row_exists(conn, entity, id).await.map_err(|err| {
        other(
            err,
            format!(r#"Failed to look up {entity} with id "{id}" for {field}"#),
        )
    })?;
    if exists {
        Ok(())
    } else {
        Err(CatalogError::missing_reference(field, entity, id))
    }
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    entity: Entity,
    id: i64,
) -> Result<(), CatalogError> {
    let exists = row_exists(conn, entity, id)
        .await
        .map_err(|err| other(err, format!(r#"Failed to look up {entity} with id "{id}""#)))?;
    if exists {
        Ok(())
    } else {
        Err(CatalogError::not_found(entity, id))
    }
}

async fn count_referencing(
    conn: &mut SqliteConnection,
    query: &str,
    id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(query).bind(id).fetch_one(conn).await
}

fn other(err: sqlx::Error, context: String) -> CatalogError {
    CatalogError::Other(anyhow!(err).context(context))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }

    false
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_foreign_key_violation();
    }

    false
}
