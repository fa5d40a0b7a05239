use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use locallibrary::auth::Authenticator;
use locallibrary::database::Sqlite;
use locallibrary::http::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn cheap_hash(password: &str) -> String {
    let params = Params::new(8, 1, 1, None).unwrap();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::from_b64("dGVzdHNhbHR2YWx1ZQ").unwrap();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

struct TestApp {
    router: Router,
    token: String,
}

impl TestApp {
    async fn new() -> Self {
        let catalog = Sqlite::in_memory().await.unwrap();
        let auth =
            Authenticator::new("test-secret", "librarian", &cheap_hash("hunter2"), 300).unwrap();
        let token = auth.issue("librarian").unwrap().access_token().to_string();
        let router = router(AppState::new(catalog, auth));
        Self { router, token }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&self.token), Some(body))
            .await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(&self.token), Some(body))
            .await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&self.token), None).await
    }

    /// Author 1, language 1 and genre 1 for books to point at.
    async fn seed(&self) {
        let (status, _) = self
            .post(
                "/api/authors",
                json!({"first_name": "Leo", "last_name": "Tolstoy"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post("/api/languages", json!({"name": "Russian"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self.post("/api/genres", json!({"name": "Novel"})).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn war_and_peace(genre_ids: Value) -> Value {
    json!({
        "title": "War and Peace",
        "summary": "...",
        "isbn": "0000000000",
        "author_id": 1,
        "language_id": 1,
        "genre_ids": genre_ids,
    })
}

fn penguin_copy(book_id: i64) -> Value {
    json!({"book_id": book_id, "imprint": "Penguin", "status": "available"})
}

#[tokio::test]
async fn catalog_scenario_returns_hydrated_records() {
    let app = TestApp::new().await;

    let (status, author) = app
        .post(
            "/api/authors",
            json!({"first_name": "Leo", "last_name": "Tolstoy"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        author,
        json!({
            "id": 1,
            "first_name": "Leo",
            "last_name": "Tolstoy",
            "date_of_birth": null,
            "date_of_death": null,
        })
    );

    let (_, language) = app
        .post("/api/languages", json!({"name": "Russian"}))
        .await;
    assert_eq!(language, json!({"id": 1, "name": "Russian"}));
    let (_, genre) = app.post("/api/genres", json!({"name": "Novel"})).await;
    assert_eq!(genre, json!({"id": 1, "name": "Novel"}));

    let (status, book) = app.post("/api/books", war_and_peace(json!([1]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["author"], author);
    assert_eq!(book["language"], language);
    assert_eq!(book["genres"], json!([{"id": 1, "name": "Novel"}]));
    assert!(book.get("author_id").is_none());

    let book_id = book["id"].as_i64().unwrap();
    let (status, fetched) = app.get(&format!("/api/books/{book_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, book);

    let (status, instance) = app
        .post(
            "/api/bookinstances",
            json!({
                "book_id": book_id,
                "imprint": "Penguin",
                "status": "available",
                "due_back": null,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(instance["book"], book);
    assert_eq!(instance["status"], "available");
    assert_eq!(instance["due_back"], Value::Null);

    let (_, instances) = app.get("/api/bookinstances").await;
    assert_eq!(instances, json!([instance.clone()]));
    let (_, copies) = app.get(&format!("/api/books/{book_id}/instances")).await;
    assert_eq!(copies, json!([instance]));
    let (_, by_author) = app.get("/api/authors/1/books").await;
    assert_eq!(by_author, json!([book]));
}

#[tokio::test]
async fn book_with_unknown_genre_is_rejected_and_not_stored() {
    let app = TestApp::new().await;
    app.seed().await;

    let (status, body) = app.post("/api/books", war_and_peace(json!([999]))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "genre_ids");

    let (_, books) = app.get("/api/books").await;
    assert_eq!(books, json!([]));
}

#[tokio::test]
async fn book_with_unknown_author_is_rejected() {
    let app = TestApp::new().await;
    app.seed().await;

    let mut payload = war_and_peace(json!([1]));
    payload["author_id"] = json!(42);
    let (status, body) = app.post("/api/books", payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "author_id");
}

#[tokio::test]
async fn writes_without_a_valid_token_change_nothing() {
    let app = TestApp::new().await;
    app.seed().await;

    let cases = [
        (Method::POST, "/api/genres", Some(json!({"name": "Epic"}))),
        (Method::PUT, "/api/genres/1", Some(json!({"name": "Epic"}))),
        (Method::DELETE, "/api/genres/1", None),
        (Method::POST, "/api/books", Some(war_and_peace(json!([1])))),
        (Method::DELETE, "/api/authors/1", None),
        (Method::POST, "/api/languages", Some(json!({"name": "French"}))),
        (Method::PUT, "/api/languages/1", Some(json!({"name": "French"}))),
        (Method::DELETE, "/api/languages/1", None),
        (Method::POST, "/api/bookinstances", Some(penguin_copy(1))),
        (Method::PUT, "/api/bookinstances/1", Some(penguin_copy(1))),
        (Method::DELETE, "/api/bookinstances/1", None),
    ];
    for (method, uri, body) in cases {
        let (status, response) = app.send(method.clone(), uri, None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response["error"], "unauthorized");

        let (status, _) = app.send(method.clone(), uri, Some("not-a-jwt"), body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let (_, genres) = app.get("/api/genres").await;
    assert_eq!(genres, json!([{"id": 1, "name": "Novel"}]));
    let (_, languages) = app.get("/api/languages").await;
    assert_eq!(languages, json!([{"id": 1, "name": "Russian"}]));
    let (_, books) = app.get("/api/books").await;
    assert_eq!(books, json!([]));
    let (_, instances) = app.get("/api/bookinstances").await;
    assert_eq!(instances, json!([]));
    let (status, _) = app.get("/api/authors/1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_replaces_every_author_field() {
    let app = TestApp::new().await;
    let (_, created) = app
        .post(
            "/api/authors",
            json!({
                "first_name": "Lev",
                "last_name": "Tolstoi",
                "date_of_birth": "1828-09-09",
                "date_of_death": "1910-11-20",
            }),
        )
        .await;
    assert_eq!(created["date_of_birth"], "1828-09-09");

    let (status, updated) = app
        .put(
            "/api/authors/1",
            json!({"first_name": "Leo", "last_name": "Tolstoy"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = app.get("/api/authors/1").await;
    assert_eq!(fetched, updated);
    assert_eq!(
        fetched,
        json!({
            "id": 1,
            "first_name": "Leo",
            "last_name": "Tolstoy",
            "date_of_birth": null,
            "date_of_death": null,
        })
    );
}

#[tokio::test]
async fn deleted_genre_is_gone() {
    let app = TestApp::new().await;
    app.seed().await;

    let (status, body) = app.delete("/api/genres/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = app.get("/api/genres/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = app.delete("/api/genres/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn referenced_author_cannot_be_deleted() {
    let app = TestApp::new().await;
    app.seed().await;
    app.post("/api/books", war_and_peace(json!([1]))).await;

    let (status, body) = app.delete("/api/authors/1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = app.get("/api/authors/1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/authors", json!({"first_name": "Leo"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("last_name"));
    assert_eq!(body["field"], "last_name");

    let (status, _) = app
        .post(
            "/api/genres",
            json!({"name": "Novel", "description": "long stories"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app.post("/api/genres", json!({"name": "  "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "name");

    let (status, body) = app.get("/api/authors/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn loaned_instance_requires_due_back() {
    let app = TestApp::new().await;
    app.seed().await;
    app.post("/api/books", war_and_peace(json!([]))).await;

    let (status, body) = app
        .post(
            "/api/bookinstances",
            json!({"book_id": 1, "imprint": "Penguin", "status": "loaned"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "due_back");

    let (status, body) = app
        .post(
            "/api/bookinstances",
            json!({"book_id": 7, "imprint": "Penguin", "status": "available"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "book_id");
}

#[tokio::test]
async fn token_endpoint_issues_usable_tokens() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/token",
            None,
            Some(json!({"username": "librarian", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/token",
            None,
            Some(json!({"username": "librarian", "password": "hunter2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 300);

    let token = body["access_token"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::POST,
            "/api/languages",
            Some(token),
            Some(json!({"name": "French"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn book_update_round_trips_hydrated() {
    let app = TestApp::new().await;
    app.seed().await;
    app.post("/api/genres", json!({"name": "Epic"})).await;
    let (_, book) = app.post("/api/books", war_and_peace(json!([1]))).await;

    let (status, updated) = app
        .put(
            "/api/books/1",
            json!({
                "title": "Voyna i mir",
                "summary": "Napoleon invades Russia.",
                "isbn": "978-0-14-044793-4",
                "author_id": 1,
                "language_id": 1,
                "genre_ids": [2, 1],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], 1);
    assert_eq!(updated["title"], "Voyna i mir");
    assert_eq!(updated["isbn"], "9780140447934");
    assert_eq!(updated["author"], book["author"]);
    assert_eq!(updated["language"], book["language"]);
    assert_eq!(
        updated["genres"],
        json!([{"id": 1, "name": "Novel"}, {"id": 2, "name": "Epic"}])
    );

    let (_, fetched) = app.get("/api/books/1").await;
    assert_eq!(fetched, updated);

    let mut unknown_genre = war_and_peace(json!([999]));
    unknown_genre["title"] = json!("Anna Karenina");
    let (status, body) = app.put("/api/books/1", unknown_genre).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "genre_ids");

    let (_, fetched) = app.get("/api/books/1").await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let app = TestApp::new().await;
    app.seed().await;

    let (status, body) = app.post("/api/genres", json!({"name": "novel"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    let (status, body) = app
        .post("/api/languages", json!({"name": "RUSSIAN"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    app.post("/api/genres", json!({"name": "Epic"})).await;
    app.post("/api/languages", json!({"name": "French"})).await;

    let (status, body) = app.put("/api/genres/2", json!({"name": "Novel"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    let (status, body) = app
        .put("/api/languages/2", json!({"name": "Russian"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (_, genre) = app.get("/api/genres/2").await;
    assert_eq!(genre, json!({"id": 2, "name": "Epic"}));
    let (_, language) = app.get("/api/languages/2").await;
    assert_eq!(language, json!({"id": 2, "name": "French"}));
}

#[tokio::test]
async fn referenced_language_and_book_cannot_be_deleted() {
    let app = TestApp::new().await;
    app.seed().await;
    app.post("/api/books", war_and_peace(json!([1]))).await;
    app.post("/api/bookinstances", penguin_copy(1)).await;

    let (status, body) = app.delete("/api/languages/1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = app.delete("/api/books/1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = app.delete("/api/bookinstances/1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete("/api/books/1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete("/api/languages/1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn book_instance_update_replaces_fields() {
    let app = TestApp::new().await;
    app.seed().await;
    app.post("/api/books", war_and_peace(json!([1]))).await;
    app.post("/api/bookinstances", penguin_copy(1)).await;

    let (status, updated) = app
        .put(
            "/api/bookinstances/1",
            json!({
                "book_id": 1,
                "imprint": "Vintage",
                "status": "loaned",
                "due_back": "2026-12-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["imprint"], "Vintage");
    assert_eq!(updated["status"], "loaned");
    assert_eq!(updated["due_back"], "2026-12-01");
    assert_eq!(updated["book"]["id"], 1);

    let (_, fetched) = app.get("/api/bookinstances/1").await;
    assert_eq!(fetched, updated);

    let mut lost = penguin_copy(1);
    lost["status"] = json!("lost");
    let (status, body) = app.put("/api/bookinstances/1", lost).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "status");

    let (status, body) = app.put("/api/bookinstances/1", penguin_copy(999)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "book_id");

    let (status, _) = app.put("/api/bookinstances/7", penguin_copy(1)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, fetched) = app.get("/api/bookinstances/1").await;
    assert_eq!(fetched, updated);
}
