mod auth;
mod authors;
mod book_instances;
mod books;
mod genres;
mod health;
mod languages;
mod responses;

pub use auth::AuthenticatedUser;
pub use responses::{ApiError, ApiSuccess};

use crate::auth::Authenticator;
use crate::repositories::Catalog;
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub struct AppState<C: Catalog> {
    pub catalog: Arc<C>,
    pub auth: Arc<Authenticator>,
}

impl<C: Catalog> AppState<C> {
    pub fn new(catalog: C, auth: Authenticator) -> Self {
        Self {
            catalog: Arc::new(catalog),
            auth: Arc::new(auth),
        }
    }
}

impl<C: Catalog> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            auth: Arc::clone(&self.auth),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<C: Catalog>(
        state: AppState<C>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!("listening on http://{addr}");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

/// The complete application, routes and middleware, bound to `state`.
pub fn router<C: Catalog>(state: AppState<C>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes<C: Catalog>() -> Router<AppState<C>> {
    Router::new()
        .route("/health", get(health::health_check::<C>))
        .route("/auth/token", post(auth::issue_token::<C>))
        .route(
            "/authors",
            get(authors::list_authors::<C>).post(authors::create_author::<C>),
        )
        .route(
            "/authors/{id}",
            get(authors::get_author::<C>)
                .put(authors::update_author::<C>)
                .delete(authors::delete_author::<C>),
        )
        .route("/authors/{id}/books", get(authors::list_author_books::<C>))
        .route(
            "/genres",
            get(genres::list_genres::<C>).post(genres::create_genre::<C>),
        )
        .route(
            "/genres/{id}",
            get(genres::get_genre::<C>)
                .put(genres::update_genre::<C>)
                .delete(genres::delete_genre::<C>),
        )
        .route(
            "/languages",
            get(languages::list_languages::<C>).post(languages::create_language::<C>),
        )
        .route(
            "/languages/{id}",
            get(languages::get_language::<C>)
                .put(languages::update_language::<C>)
                .delete(languages::delete_language::<C>),
        )
        .route(
            "/books",
            get(books::list_books::<C>).post(books::create_book::<C>),
        )
        .route(
            "/books/{id}",
            get(books::get_book::<C>)
                .put(books::update_book::<C>)
                .delete(books::delete_book::<C>),
        )
        .route(
            "/books/{id}/instances",
            get(books::list_book_instances_of_book::<C>),
        )
        .route(
            "/bookinstances",
            get(book_instances::list_book_instances::<C>)
                .post(book_instances::create_book_instance::<C>),
        )
        .route(
            "/bookinstances/{id}",
            get(book_instances::get_book_instance::<C>)
                .put(book_instances::update_book_instance::<C>)
                .delete(book_instances::delete_book_instance::<C>),
        )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
