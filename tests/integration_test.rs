#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use task_api::api::server::create_app;
    use task_api::config::{AppConfig, AuthConfig};
    use task_api::db::{create_in_memory_pool, init_schema, SharedStore, SqliteTaskStore};
    use task_api::TokenCodec;
    use tower::ServiceExt;

    const SECRET: &str = "integration-secret";

    async fn setup_test_pool() -> SqlitePool {
        let pool = create_in_memory_pool()
            .await
            .expect("Failed to create test pool");
        init_schema(&pool).await.expect("Failed to create schema");
        pool
    }

    fn build_app(pool: &SqlitePool, config: &AppConfig) -> Router {
        let store: SharedStore = Arc::new(SqliteTaskStore::new(pool.clone()));
        let codec = Arc::new(TokenCodec::new(&config.auth));
        create_app(store, config, codec).expect("Failed to build app")
    }

    fn gated_config() -> AppConfig {
        AppConfig {
            auth: AuthConfig {
                jwt_secret: Some(SECRET.to_string()),
                require_auth: true,
            },
            ..Default::default()
        }
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn timestamp(value: &Value) -> DateTime<Utc> {
        value
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .expect("timestamp should be RFC 3339")
    }

    async fn row_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &AppConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &AppConfig::default());

        let (status, created) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": "Buy milk"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();
        assert!(id > 0);
        assert_eq!(created["title"], "Buy milk");
        assert_eq!(created["description"], "");
        assert_eq!(created["completed"], false);
        assert_eq!(created["created_at"], created["updated_at"]);

        let uri = format!("/tasks/{}", id);
        let (status, fetched) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (status, updated) = call(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"title": "Buy milk", "completed": true})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], id);
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(timestamp(&updated["updated_at"]) > timestamp(&updated["created_at"]));

        let (status, body) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "not found"}));

        let (status, _) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_completed_filter_over_http() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &AppConfig::default());

        for title in ["first", "second", "third"] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/tasks",
                Some(json!({"title": title})),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = call(
            &app,
            Method::PUT,
            "/tasks/2",
            Some(json!({"title": "second", "completed": true})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, all) = call(&app, Method::GET, "/tasks", None, None).await;
        let titles: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|task| task["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);

        let (_, done) = call(&app, Method::GET, "/tasks?completed=true", None, None).await;
        assert_eq!(done.as_array().unwrap().len(), 1);
        assert_eq!(done[0]["title"], "second");

        let (_, open) = call(&app, Method::GET, "/tasks?completed=false", None, None).await;
        assert_eq!(open.as_array().unwrap().len(), 2);

        let (status, body) = call(&app, Method::GET, "/tasks?completed=1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid completed value"}));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &AppConfig::default());

        for uri in ["/tasks/abc", "/tasks/-1"] {
            let (status, body) = call(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "invalid id"}));
        }

        let (status, body) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"description": "no title"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "title is required"}));

        let (status, body) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": "x", "completed": "yes"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid json"}));

        let (status, _) = call(
            &app,
            Method::PUT,
            "/tasks/42",
            Some(json!({"title": "ghost"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_auth_required_rejects_before_store() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &gated_config());

        let (status, body) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": "sneaky"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "missing or invalid token"}));

        let forged = TokenCodec::from_secret(Some("some-other-secret"))
            .issue(1)
            .unwrap();
        let (status, body) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": "sneaky"})),
            Some(&forged),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "invalid token"}));

        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_auth_expired_token_is_rejected() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &gated_config());

        let expired = TokenCodec::from_secret(Some(SECRET))
            .issue_with_ttl(5, Duration::hours(-1))
            .unwrap();
        let (status, _) = call(&app, Method::GET, "/tasks", None, Some(&expired)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_valid_token_reaches_handlers() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &gated_config());
        let token = TokenCodec::from_secret(Some(SECRET)).issue(5).unwrap();

        let (status, _) = call(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": "allowed"})),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, Method::GET, "/tasks", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preflight_bypasses_auth() {
        let pool = setup_test_pool().await;
        let app = build_app(&pool, &gated_config());

        for uri in ["/tasks", "/tasks/1", "/does-not-exist"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(Method::OPTIONS)
                        .uri(uri)
                        .header("Origin", "https://app.example")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            assert_eq!(
                response.headers()["access-control-allow-origin"],
                "*"
            );
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_cors_allow_list_echoes_origin() {
        let pool = setup_test_pool().await;
        let config = AppConfig {
            cors_origins: "https://app.example, https://admin.example".to_string(),
            ..Default::default()
        };
        let app = build_app(&pool, &config);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/tasks")
                    .header("Origin", "https://admin.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://admin.example"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tasks")
                    .header("Origin", "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
