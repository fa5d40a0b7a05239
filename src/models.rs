mod author;
mod book;
mod book_instance;
mod genre;
mod language;

pub use author::{Author, AuthorFields};
pub use book::{Book, BookFields, Isbn};
pub use book_instance::{BookInstance, BookInstanceFields, LoanStatus};
pub use genre::{Genre, GenreFields};
pub use language::{Language, LanguageFields};

use thiserror::Error;

pub const PERSON_NAME_MAX_LEN: usize = 100;
pub const TEXT_MAX_LEN: usize = 200;
pub const SUMMARY_MAX_LEN: usize = 1000;

/// The kinds of row the catalog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Author,
    Genre,
    Language,
    Book,
    BookInstance,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Author => "Author",
            Self::Genre => "Genre",
            Self::Language => "Language",
            Self::Book => "Book",
            Self::BookInstance => "Book instance",
        };
        f.write_str(name)
    }
}

/// Trimmed, non-empty text with an upper bound on its length in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(String);

impl Text {
    pub fn new(field: &'static str, raw: &str, max_len: usize) -> Result<Self, FieldError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldError::new(field, "must not be empty"));
        }
        if trimmed.chars().count() > max_len {
            return Err(FieldError::new(
                field,
                format!("must be at most {max_len} characters"),
            ));
        }
        Ok(Self(trimmed.into()))
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rejected input value, naming the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct FieldError {
    field: &'static str,
    reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub const fn field(&self) -> &'static str {
        self.field
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{entity} with id \"{id}\" does not exist")]
    NotFound { entity: Entity, id: i64 },
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("{entity} with {field} \"{value}\" already exists")]
    Duplicate {
        entity: Entity,
        field: &'static str,
        value: String,
    },
    #[error("{entity} with id \"{id}\" is still referenced by {dependents}")]
    InUse {
        entity: Entity,
        id: i64,
        dependents: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CatalogError {
    pub const fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// A foreign key in a payload that names no existing row.
    pub fn missing_reference(field: &'static str, entity: Entity, id: i64) -> Self {
        Self::Validation(FieldError::new(
            field,
            format!("references {entity} \"{id}\" which does not exist"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed() {
        let text = Text::new("name", "  Novel ", PERSON_NAME_MAX_LEN).unwrap();
        assert_eq!(text.as_str(), "Novel");
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = Text::new("name", "   ", PERSON_NAME_MAX_LEN).unwrap_err();
        assert_eq!(err.field(), "name");
        assert_eq!(err.to_string(), "name must not be empty");
    }

    #[test]
    fn text_length_counts_characters() {
        assert!(Text::new("name", &"é".repeat(3), 3).is_ok());
        let err = Text::new("name", "abcd", 3).unwrap_err();
        assert_eq!(err.reason(), "must be at most 3 characters");
    }

    #[test]
    fn missing_reference_names_the_field() {
        let err = CatalogError::missing_reference("genre_ids", Entity::Genre, 999);
        match err {
            CatalogError::Validation(field) => {
                assert_eq!(field.field(), "genre_ids");
                assert_eq!(
                    field.reason(),
                    "references Genre \"999\" which does not exist"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
