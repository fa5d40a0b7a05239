use super::{
    BEGIN_WRITE, Sqlite, count_referencing, is_foreign_key_violation, is_unique_violation, other,
};
use crate::models::{CatalogError, Entity, Language, LanguageFields};
use crate::repositories::LanguageRepository;
use async_trait::async_trait;

fn duplicate(fields: &LanguageFields) -> CatalogError {
    CatalogError::Duplicate {
        entity: Entity::Language,
        field: "name",
        value: fields.name().to_string(),
    }
}

#[async_trait]
impl LanguageRepository for Sqlite {
    async fn create_language(&self, fields: &LanguageFields) -> Result<Language, CatalogError> {
        let language = sqlx::query_as("INSERT INTO language (name) VALUES (?) RETURNING *")
            .bind(fields.name().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    duplicate(fields)
                } else {
                    other(
                        err,
                        format!(r#"Failed to create language with name "{}""#, fields.name()),
                    )
                }
            })?;

        Ok(language)
    }

    async fn find_language(&self, id: i64) -> Result<Language, CatalogError> {
        sqlx::query_as("SELECT id, name FROM language WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| other(err, format!(r#"Failed to retrieve language with id "{id}""#)))?
            .ok_or(CatalogError::not_found(Entity::Language, id))
    }

    async fn find_all_languages(&self) -> Result<Vec<Language>, CatalogError> {
        let languages = sqlx::query_as("SELECT id, name FROM language ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| other(err, "Failed to retrieve all languages".to_string()))?;

        Ok(languages)
    }

    async fn update_language(
        &self,
        id: i64,
        fields: &LanguageFields,
    ) -> Result<Language, CatalogError> {
        sqlx::query_as("UPDATE language SET name = ? WHERE id = ? RETURNING *")
            .bind(fields.name().as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    duplicate(fields)
                } else {
                    other(err, format!(r#"Failed to update language with id "{id}""#))
                }
            })?
            .ok_or(CatalogError::not_found(Entity::Language, id))
    }

    async fn delete_language(&self, id: i64) -> Result<(), CatalogError> {
        let context = || format!(r#"Failed to delete language with id "{id}""#);
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(|err| other(err, context()))?;

        let books = count_referencing(
            &mut *tx,
            "SELECT COUNT(*) FROM book WHERE language_id = ?",
            id,
        )
        .await
        .map_err(|err| other(err, context()))?;
        if books > 0 {
            return Err(CatalogError::InUse {
                entity: Entity::Language,
                id,
                dependents: format!("{books} book(s)"),
            });
        }

        let result = sqlx::query("DELETE FROM language WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    CatalogError::InUse {
                        entity: Entity::Language,
                        id,
                        dependents: "books".to_string(),
                    }
                } else {
                    other(err, context())
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(Entity::Language, id));
        }

        tx.commit().await.map_err(|err| other(err, context()))?;
        tracing::debug!(id, "deleted language");

        Ok(())
    }
}
