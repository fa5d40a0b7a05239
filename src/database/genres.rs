use super::{BEGIN_WRITE, Sqlite, is_unique_violation, other};
use crate::models::{CatalogError, Entity, Genre, GenreFields};
use crate::repositories::GenreRepository;
use async_trait::async_trait;

fn duplicate(fields: &GenreFields) -> CatalogError {
    CatalogError::Duplicate {
        entity: Entity::Genre,
        field: "name",
        value: fields.name().to_string(),
    }
}

#[async_trait]
impl GenreRepository for Sqlite {
    async fn create_genre(&self, fields: &GenreFields) -> Result<Genre, CatalogError> {
        let genre = sqlx::query_as("INSERT INTO genre (name) VALUES (?) RETURNING *")
            .bind(fields.name().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    duplicate(fields)
                } else {
                    other(
                        err,
                        format!(r#"Failed to create genre with name "{}""#, fields.name()),
                    )
                }
            })?;

        Ok(genre)
    }

    async fn find_genre(&self, id: i64) -> Result<Genre, CatalogError> {
        sqlx::query_as("SELECT id, name FROM genre WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| other(err, format!(r#"Failed to retrieve genre with id "{id}""#)))?
            .ok_or(CatalogError::not_found(Entity::Genre, id))
    }

    async fn find_all_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let genres = sqlx::query_as("SELECT id, name FROM genre ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| other(err, "Failed to retrieve all genres".to_string()))?;

        Ok(genres)
    }

    async fn update_genre(&self, id: i64, fields: &GenreFields) -> Result<Genre, CatalogError> {
        sqlx::query_as("UPDATE genre SET name = ? WHERE id = ? RETURNING *")
            .bind(fields.name().as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    duplicate(fields)
                } else {
                    other(err, format!(r#"Failed to update genre with id "{id}""#))
                }
            })?
            .ok_or(CatalogError::not_found(Entity::Genre, id))
    }

    async fn delete_genre(&self, id: i64) -> Result<(), CatalogError> {
        let context = || format!(r#"Failed to delete genre with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        let detached = sqlx::query("DELETE FROM book_genre WHERE genre_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| other(err, context()))?
            .rows_affected();

        let result = sqlx::query("DELETE FROM genre WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| other(err, context()))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(Entity::Genre, id));
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, detached, "deleted genre");

        Ok(())
    }
}
