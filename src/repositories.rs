use crate::models::{
    Author, AuthorFields, Book, BookFields, BookInstance, BookInstanceFields, CatalogError, Genre,
    GenreFields, Language, LanguageFields,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn create_author(&self, fields: &AuthorFields) -> Result<Author, CatalogError>;

    async fn find_author(&self, id: i64) -> Result<Author, CatalogError>;

    async fn find_all_authors(&self) -> Result<Vec<Author>, CatalogError>;

    async fn update_author(&self, id: i64, fields: &AuthorFields) -> Result<Author, CatalogError>;

    /// Fails with [`CatalogError::InUse`] while any book names the author.
    async fn delete_author(&self, id: i64) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait GenreRepository: Send + Sync + 'static {
    async fn create_genre(&self, fields: &GenreFields) -> Result<Genre, CatalogError>;

    async fn find_genre(&self, id: i64) -> Result<Genre, CatalogError>;

    async fn find_all_genres(&self) -> Result<Vec<Genre>, CatalogError>;

    async fn update_genre(&self, id: i64, fields: &GenreFields) -> Result<Genre, CatalogError>;

    /// Detaches the genre from every book before removing it.
    async fn delete_genre(&self, id: i64) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait LanguageRepository: Send + Sync + 'static {
    async fn create_language(&self, fields: &LanguageFields) -> Result<Language, CatalogError>;

    async fn find_language(&self, id: i64) -> Result<Language, CatalogError>;

    async fn find_all_languages(&self) -> Result<Vec<Language>, CatalogError>;

    async fn update_language(
        &self,
        id: i64,
        fields: &LanguageFields,
    ) -> Result<Language, CatalogError>;

    /// Fails with [`CatalogError::InUse`] while any book is written in it.
    async fn delete_language(&self, id: i64) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn create_book(&self, fields: &BookFields) -> Result<Book, CatalogError>;

    async fn find_book(&self, id: i64) -> Result<Book, CatalogError>;

    async fn find_all_books(&self) -> Result<Vec<Book>, CatalogError>;

    async fn find_books_by_author(&self, author_id: i64) -> Result<Vec<Book>, CatalogError>;

    async fn update_book(&self, id: i64, fields: &BookFields) -> Result<Book, CatalogError>;

    /// Fails with [`CatalogError::InUse`] while copies of the book exist.
    async fn delete_book(&self, id: i64) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait BookInstanceRepository: Send + Sync + 'static {
    async fn create_book_instance(
        &self,
        fields: &BookInstanceFields,
    ) -> Result<BookInstance, CatalogError>;

    async fn find_book_instance(&self, id: i64) -> Result<BookInstance, CatalogError>;

    async fn find_all_book_instances(&self) -> Result<Vec<BookInstance>, CatalogError>;

    async fn find_instances_of_book(
        &self,
        book_id: i64,
    ) -> Result<Vec<BookInstance>, CatalogError>;

    async fn update_book_instance(
        &self,
        id: i64,
        fields: &BookInstanceFields,
    ) -> Result<BookInstance, CatalogError>;

    async fn delete_book_instance(&self, id: i64) -> Result<(), CatalogError>;
}

/// The whole catalog behind one handle.
#[async_trait]
pub trait Catalog:
    AuthorRepository
    + GenreRepository
    + LanguageRepository
    + BookRepository
    + BookInstanceRepository
{
    /// Round trip to the store.
    async fn ping(&self) -> anyhow::Result<()>;
}
