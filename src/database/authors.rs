use super::{BEGIN_WRITE, Sqlite, count_referencing, is_foreign_key_violation, other};
use crate::models::{Author, AuthorFields, CatalogError, Entity};
use crate::repositories::AuthorRepository;
use async_trait::async_trait;

#[async_trait]
impl AuthorRepository for Sqlite {
    async fn create_author(&self, fields: &AuthorFields) -> Result<Author, CatalogError> {
        let author = sqlx::query_as(
            "INSERT INTO author (first_name, last_name, date_of_birth, date_of_death) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(fields.first_name().as_str())
        .bind(fields.last_name().as_str())
        .bind(fields.date_of_birth())
        .bind(fields.date_of_death())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            other(
                err,
                format!(
                    r#"Failed to create author "{} {}""#,
                    fields.first_name(),
                    fields.last_name()
                ),
            )
        })?;

        Ok(author)
    }

    async fn find_author(&self, id: i64) -> Result<Author, CatalogError> {
        sqlx::query_as(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death \
             FROM author WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| other(err, format!(r#"Failed to retrieve author with id "{id}""#)))?
        .ok_or(CatalogError::not_found(Entity::Author, id))
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, CatalogError> {
        let authors = sqlx::query_as(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death \
             FROM author ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| other(err, "Failed to retrieve all authors".to_string()))?;

        Ok(authors)
    }

    async fn update_author(&self, id: i64, fields: &AuthorFields) -> Result<Author, CatalogError> {
        sqlx::query_as(
            "UPDATE author \
             SET first_name = ?, last_name = ?, date_of_birth = ?, date_of_death = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(fields.first_name().as_str())
        .bind(fields.last_name().as_str())
        .bind(fields.date_of_birth())
        .bind(fields.date_of_death())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| other(err, format!(r#"Failed to update author with id "{id}""#)))?
        .ok_or(CatalogError::not_found(Entity::Author, id))
    }

    async fn delete_author(&self, id: i64) -> Result<(), CatalogError> {
        let context = || format!(r#"Failed to delete author with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        let books = count_referencing(&mut *tx, "SELECT COUNT(*) FROM book WHERE author_id = ?", id)
            .await
            .map_err(|err| other(err, context()))?;
        if books > 0 {
            return Err(CatalogError::InUse {
                entity: Entity::Author,
                id,
                dependents: format!("{books} book(s)"),
            });
        }

        let result = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    CatalogError::InUse {
                        entity: Entity::Author,
                        id,
                        dependents: "books".to_string(),
                    }
                } else {
                    other(err, context())
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(Entity::Author, id));
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, "deleted author");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn update_replaces_every_field() {
        let db = Sqlite::in_memory().await.unwrap();
        let born = NaiveDate::from_ymd_opt(1828, 9, 9);
        let created = db
            .create_author(&AuthorFields::new("Lev", "Tolstoi", born, None).unwrap())
            .await
            .unwrap();

        let replacement = AuthorFields::new("Leo", "Tolstoy", None, None).unwrap();
        let updated = db.update_author(created.id(), &replacement).await.unwrap();
        assert_eq!(updated.fields(), &replacement);

        let fetched = db.find_author(created.id()).await.unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(fetched.date_of_birth(), None);
    }

    #[tokio::test]
    async fn missing_author_is_not_found() {
        let db = Sqlite::in_memory().await.unwrap();
        let fields = AuthorFields::new("Leo", "Tolstoy", None, None).unwrap();

        assert!(matches!(
            db.find_author(7).await,
            Err(CatalogError::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            db.update_author(7, &fields).await,
            Err(CatalogError::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            db.delete_author(7).await,
            Err(CatalogError::NotFound { id: 7, .. })
        ));
    }

    #[tokio::test]
    async fn authors_are_listed_in_id_order() {
        let db = Sqlite::in_memory().await.unwrap();
        assert!(db.find_all_authors().await.unwrap().is_empty());

        for last_name in ["Tolstoy", "Austen", "Woolf"] {
            db.create_author(&AuthorFields::new("A", last_name, None, None).unwrap())
                .await
                .unwrap();
        }

        let names: Vec<_> = db
            .find_all_authors()
            .await
            .unwrap()
            .iter()
            .map(|author| author.last_name().to_string())
            .collect();
        assert_eq!(names, ["Tolstoy", "Austen", "Woolf"]);
    }
}
