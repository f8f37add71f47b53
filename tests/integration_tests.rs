use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bookshelf::{create_app, AppState, BookStore, Config, Server};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use tower::ServiceExt;

fn relaxed_config() -> Config {
    Config {
        rate_limit_requests: 1_000,
        ..Config::default()
    }
}

fn test_app() -> Router {
    create_app(AppState::new(&relaxed_config()))
}

fn empty_app() -> Router {
    let config = Config {
        seed_books: false,
        ..relaxed_config()
    };
    create_app(AppState::new(&config))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn from_client(mut request: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 50000))));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn ids(body: &Value) -> Vec<u64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_defaults_to_first_page() {
    let app = test_app();
    let (status, body) = send(&app, request(Method::GET, "/api/books", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
    assert_eq!(body[0]["title"], "The Great Gatsby");
}

#[tokio::test]
async fn test_pagination() {
    let app = test_app();

    let (_, body) = send(&app, request(Method::GET, "/api/books?page=2&limit=10", None)).await;
    assert_eq!(ids(&body), (11..=20).collect::<Vec<_>>());

    let (status, body) = send(&app, request(Method::GET, "/api/books?page=3&limit=10", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, request(Method::GET, "/api/books?page=x&limit=y", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_author_filter() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(Method::GET, "/api/books?author=George%20Orwell", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["1984", "Animal Farm"]);
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let app = test_app();
    let uri = "/api/books?page=1&limit=5&author=George%20Orwell";

    let (_, first) = send(&app, request(Method::GET, uri, None)).await;
    let (_, second) = send(&app, request(Method::GET, uri, None)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_create_assigns_next_id() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/books",
            Some(json!({ "title": "Dune Messiah", "author": "Frank Herbert", "year": 1969 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "id": 21, "title": "Dune Messiah", "author": "Frank Herbert", "year": 1969 })
    );

    let (_, body) = send(&app, request(Method::GET, "/api/books?page=3&limit=10", None)).await;
    assert_eq!(ids(&body), vec![21]);
}

#[tokio::test]
async fn test_create_ignores_client_id() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/books",
            Some(json!({ "id": 1, "title": "X", "author": "Y" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 21);
}

#[tokio::test]
async fn test_create_on_empty_store_starts_at_one() {
    let app = empty_app();
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/books", Some(json!({ "title": "X", "author": "Y" }))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_invalid_create_does_not_mutate() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/books", Some(json!({ "title": "X" }))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid book data" }));

    let (_, body) = send(&app, request(Method::GET, "/api/books?limit=100", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_malformed_create_body() {
    let app = test_app();
    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid book data" }));

    let (status, _) = send(&app, request(Method::POST, "/api/books", Some(json!(["X", "Y"])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_overwrites_known_keys_only() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/books/2",
            Some(json!({ "title": "Nineteen Eighty-Four", "genre": "dystopia", "id": 77 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": 2, "title": "Nineteen Eighty-Four", "author": "George Orwell" })
    );

    let (_, body) = send(
        &app,
        request(Method::GET, "/api/books?author=George%20Orwell", None),
    )
    .await;
    assert_eq!(body[0]["title"], "Nineteen Eighty-Four");
    assert!(body[0].get("genre").is_none());
}

#[tokio::test]
async fn test_update_unknown_book() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request(Method::PUT, "/api/books/999", Some(json!({ "title": "X" }))),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_delete_removes_exactly_one() {
    let app = test_app();
    let (status, body) = send(&app, request(Method::DELETE, "/api/books/6", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": 6, "title": "Animal Farm", "author": "George Orwell" })
    );

    let (_, body) = send(&app, request(Method::GET, "/api/books?limit=100", None)).await;
    let remaining = ids(&body);
    assert_eq!(remaining.len(), 19);
    assert!(!remaining.contains(&6));

    let (status, body) = send(&app, request(Method::DELETE, "/api/books/6", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));

    let (status, _) = send(
        &app,
        request(Method::PUT, "/api/books/6", Some(json!({ "title": "X" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ids_unique_after_mixed_mutations() {
    let app = test_app();
    let new_book = || Some(json!({ "title": "T", "author": "A" }));

    send(&app, request(Method::DELETE, "/api/books/20", None)).await;
    send(&app, request(Method::POST, "/api/books", new_book())).await;
    send(&app, request(Method::DELETE, "/api/books/1", None)).await;
    let (_, created) = send(&app, request(Method::POST, "/api/books", new_book())).await;
    assert_eq!(created["id"], 21);

    let (_, body) = send(&app, request(Method::GET, "/api/books?limit=100", None)).await;
    let all = ids(&body);
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), all.len());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = test_app();

    let (status, body) = send(&app, request(Method::GET, "/api/authors", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));

    let (status, body) = send(
        &app,
        request(Method::PUT, "/api/books/abc", Some(json!({ "title": "X" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_undecodable_id_segment_is_unknown_route() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request(Method::PUT, "/api/books/%FF", Some(json!({ "title": "X" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));

    let (status, body) = send(&app, request(Method::DELETE, "/api/books/%FF", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));

    let (_, body) = send(&app, request(Method::GET, "/api/books?limit=100", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let app = test_app();

    let (status, body) = send(&app, request(Method::DELETE, "/api/books", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed" }));

    let (status, body) = send(&app, request(Method::GET, "/api/books/1", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed" }));
}

#[tokio::test]
async fn test_rate_limit_third_request_rejected() {
    let app = create_app(AppState::new(&Config::default()));
    let client = [198, 51, 100, 7];

    let (status, _) = send(&app, from_client(request(Method::GET, "/api/books", None), client)).await;
    assert_eq!(status, StatusCode::OK);

    // GET and POST share one bucket.
    let (status, _) = send(
        &app,
        from_client(
            request(Method::POST, "/api/books", Some(json!({ "title": "X", "author": "Y" }))),
            client,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(from_client(
            request(Method::POST, "/api/books", Some(json!({ "title": "Z", "author": "Y" }))),
            client,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Too Many Requests");

    // The rejected create never reached the store.
    let (_, health) = send(&app, request(Method::GET, "/health", None)).await;
    assert_eq!(health["books"], 21);
}

#[tokio::test]
async fn test_rate_limit_is_per_client_and_route() {
    let app = create_app(AppState::new(&Config::default()));
    let first = [198, 51, 100, 7];
    let second = [198, 51, 100, 8];

    for _ in 0..2 {
        let (status, _) = send(&app, from_client(request(Method::GET, "/api/books", None), first)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(&app, from_client(request(Method::GET, "/api/books", None), first)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = send(&app, from_client(request(Method::GET, "/api/books", None), second)).await;
    assert_eq!(status, StatusCode::OK);

    // Item routes are not rate-limited.
    for _ in 0..5 {
        let (status, _) = send(
            &app,
            from_client(
                request(Method::PUT, "/api/books/1", Some(json!({ "title": "Gatsby" }))),
                first,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_wrong_method_does_not_use_quota() {
    let app = create_app(AppState::new(&Config::default()));
    let client = [198, 51, 100, 9];

    for _ in 0..3 {
        let (status, body) = send(
            &app,
            from_client(request(Method::DELETE, "/api/books", None), client),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method Not Allowed" }));
    }

    let (status, _) = send(&app, from_client(request(Method::GET, "/api/books", None), client)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admitted_requests_carry_quota_headers() {
    let app = create_app(AppState::new(&Config::default()));
    let response = app
        .oneshot(from_client(request(Method::GET, "/api/books", None), [203, 0, 113, 1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_app(AppState::with_store(
        BookStore::new(),
        bookshelf::rate_limiter::RateLimiter::from_config(&Config::default()),
        false,
    ));
    let (status, body) = send(&app, request(Method::GET, "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["books"], 0);
    assert_eq!(body["rate_limit"]["requests"], 2);
    assert_eq!(body["rate_limit"]["window"], "1m");
    assert_eq!(body["rate_limit"]["strategy"], "sliding_window");
    assert_eq!(body["rate_limit"]["tracked_clients"], 0);
}

#[tokio::test]
async fn test_end_to_end_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(Config::default());
    let handle = tokio::spawn(server.serve(listener));

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let created = client
        .post(format!("{}/api/books", base))
        .json(&json!({ "title": "Neuromancer", "author": "William Gibson" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["id"], 21);

    let listed = client
        .get(format!("{}/api/books?author=William%20Gibson", base))
        .send()
        .await
        .unwrap();
    assert_eq!(listed.status().as_u16(), 200);
    let listed: Value = listed.json().await.unwrap();
    assert_eq!(listed, json!([created]));

    // Third collection request from the same peer address inside the window.
    let limited = client
        .get(format!("{}/api/books", base))
        .send()
        .await
        .unwrap();
    assert_eq!(limited.status().as_u16(), 429);

    let deleted = client
        .delete(format!("{}/api/books/21", base))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    handle.abort();
}
