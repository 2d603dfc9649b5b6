use std::net::SocketAddr;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, expenses};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(expenses::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

/// `*` mirrors any origin; credentials stay allowed either way.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::llm::LlmClient;
    use async_trait::async_trait;
    use axum::extract::FromRef;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use uuid::Uuid;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    async fn spawn_app(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    fn bearer(state: &AppState) -> String {
        let token = JwtKeys::from_ref(state).sign(Uuid::new_v4(), "a@b.io").unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn health_is_ok() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn transactions_require_token() {
        let base = spawn_app(AppState::fake()).await;
        let client = reqwest::Client::new();

        let res = client.get(format!("{base}/expense/transactions")).send().await.unwrap();
        assert_eq!(res.status(), 401);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({ "message": "Unauthorized" }));

        let res = client
            .get(format!("{base}/expense/transactions"))
            .header("authorization", "Bearer not.a.jwt")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({ "message": "Invalid token" }));
    }

    #[tokio::test]
    async fn process_spending_and_analytics_require_token() {
        let base = spawn_app(AppState::fake()).await;
        let client = reqwest::Client::new();

        let res = client
            .post(format!("{base}/expense/process_spending"))
            .json(&json!({ "sentence": "spent 120 on a biryani" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);

        let res = client.get(format!("{base}/expense/analytics")).send().await.unwrap();
        assert_eq!(res.status(), 401);

        let res = client.get(format!("{base}/user/me")).send().await.unwrap();
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn signup_rejects_invalid_data() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::Client::new()
            .post(format!("{base}/user/signup"))
            .json(&json!({ "name": "", "email": "nope", "password": "short" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Invalid data");
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn signup_rejects_malformed_json() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::Client::new()
            .post(format!("{base}/user/signup"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Invalid data");
    }

    #[tokio::test]
    async fn login_rejects_missing_fields() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::Client::new()
            .post(format!("{base}/user/login"))
            .json(&json!({ "email": "a@b.io" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn process_spending_without_sentence() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let base = spawn_app(state).await;
        let client = reqwest::Client::new();

        for body in [json!({}), json!({ "sentence": "   " })] {
            let res = client
                .post(format!("{base}/expense/process_spending"))
                .header("authorization", &auth)
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), 400);
            assert_eq!(
                res.json::<Value>().await.unwrap(),
                json!({ "error": "No sentence provided" })
            );
        }
    }

    #[tokio::test]
    async fn process_spending_without_json_content_type() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let base = spawn_app(state).await;

        let res = reqwest::Client::new()
            .post(format!("{base}/expense/process_spending"))
            .header("authorization", auth)
            .body("sentence=spent 120 on a biryani")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "No sentence provided" })
        );
    }

    #[tokio::test]
    async fn transactions_database_failure_is_generic() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let base = spawn_app(state).await;

        let res = reqwest::Client::new()
            .get(format!("{base}/expense/transactions"))
            .header("authorization", auth)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "message": "Error retrieving transactions" })
        );
    }

    #[tokio::test]
    async fn process_spending_unparseable_reply() {
        let state = AppState::fake_with_llm(Arc::new(CannedLlm("Sorry, I can't help with that.")));
        let auth = bearer(&state);
        let base = spawn_app(state).await;

        let res = reqwest::Client::new()
            .post(format!("{base}/expense/process_spending"))
            .header("authorization", auth)
            .json(&json!({ "sentence": "spent 120 on a biryani" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Could not extract both amount and tag" })
        );
    }

    #[tokio::test]
    async fn process_spending_model_failure() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let base = spawn_app(state).await;

        let res = reqwest::Client::new()
            .post(format!("{base}/expense/process_spending"))
            .header("authorization", auth)
            .json(&json!({ "sentence": "spent 120 on a biryani" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Error processing sentence: LLM not configured" })
        );
    }

    #[tokio::test]
    async fn analytics_rejects_bad_month() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let base = spawn_app(state).await;

        let res = reqwest::Client::new()
            .get(format!("{base}/expense/analytics?month=2024-13"))
            .header("authorization", auth)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Invalid month, expected YYYY-MM" })
        );
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("{base}/user/login"))
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap();
        assert!(res.status().is_success());
        assert_eq!(
            res.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(res.headers()["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn cors_ignores_unknown_origin() {
        let base = spawn_app(AppState::fake()).await;
        let res = reqwest::Client::new()
            .get(format!("{base}/health"))
            .header("origin", "https://evil.example")
            .send()
            .await
            .unwrap();
        assert!(res.headers().get("access-control-allow-origin").is_none());
    }
}
