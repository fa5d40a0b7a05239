use super::{Author, FieldError, Genre, Language, SUMMARY_MAX_LEN, TEXT_MAX_LEN, Text};
use regex::Regex;
use std::sync::LazyLock;

/// ISBN-10 or ISBN-13 with separators removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        let compact: String = raw
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if Self::is_valid(&compact) {
            Ok(Self(compact))
        } else {
            Err(FieldError::new(
                "isbn",
                format!("\"{}\" is not a 10 or 13 character ISBN", raw.trim()),
            ))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^(?:[0-9]{9}[0-9X]|[0-9]{13})$").unwrap());
        RE.is_match(s)
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A book as written: scalar fields plus the ids it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    title: Text,
    summary: Text,
    isbn: Isbn,
    author_id: i64,
    language_id: i64,
    genre_ids: Vec<i64>,
}

impl BookFields {
    pub fn new(
        title: &str,
        summary: &str,
        isbn: &str,
        author_id: i64,
        language_id: i64,
        genre_ids: &[i64],
    ) -> Result<Self, FieldError> {
        let title = Text::new("title", title, TEXT_MAX_LEN)?;
        let summary = Text::new("summary", summary, SUMMARY_MAX_LEN)?;
        let isbn = Isbn::new(isbn)?;

        let mut unique = Vec::with_capacity(genre_ids.len());
        for id in genre_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        Ok(Self {
            title,
            summary,
            isbn,
            author_id,
            language_id,
            genre_ids: unique,
        })
    }

    pub const fn title(&self) -> &Text {
        &self.title
    }

    pub const fn summary(&self) -> &Text {
        &self.summary
    }

    pub const fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }

    pub const fn language_id(&self) -> i64 {
        self.language_id
    }

    pub fn genre_ids(&self) -> &[i64] {
        &self.genre_ids
    }
}

/// A book with its author, language and genres resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: i64,
    title: Text,
    summary: Text,
    isbn: Isbn,
    author: Author,
    language: Language,
    genres: Vec<Genre>,
}

impl Book {
    pub const fn new(
        id: i64,
        title: Text,
        summary: Text,
        isbn: Isbn,
        author: Author,
        language: Language,
        genres: Vec<Genre>,
    ) -> Self {
        Self {
            id,
            title,
            summary,
            isbn,
            author,
            language,
            genres,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> &Text {
        &self.title
    }

    pub const fn summary(&self) -> &Text {
        &self.summary
    }

    pub const fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub const fn author(&self) -> &Author {
        &self.author
    }

    pub const fn language(&self) -> &Language {
        &self.language
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn set_genres(&mut self, genres: Vec<Genre>) {
        self.genres = genres;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_accepts_both_lengths() {
        assert_eq!(Isbn::new("0000000000").unwrap().as_str(), "0000000000");
        assert_eq!(Isbn::new("080442957x").unwrap().as_str(), "080442957X");
        assert_eq!(
            Isbn::new("978-0-14-044793-4").unwrap().as_str(),
            "9780140447934"
        );
    }

    #[test]
    fn isbn_rejects_other_shapes() {
        for raw in ["", "12345", "X000000000", "97801404479345", "978014044793A"] {
            let err = Isbn::new(raw).unwrap_err();
            assert_eq!(err.field(), "isbn", "{raw}");
        }
    }

    #[test]
    fn duplicate_genres_are_collapsed_in_order() {
        let fields =
            BookFields::new("War and Peace", "...", "0000000000", 1, 1, &[3, 1, 3, 2, 1]).unwrap();
        assert_eq!(fields.genre_ids(), &[3, 1, 2]);
    }

    #[test]
    fn empty_summary_is_rejected() {
        let err = BookFields::new("War and Peace", "", "0000000000", 1, 1, &[]).unwrap_err();
        assert_eq!(err.field(), "summary");
    }
}
