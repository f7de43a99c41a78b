use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    engine::PhishingEngine,
    error::AppError,
    types::{EmailRequest, Pipeline, PredictionResponse, UrlRequest},
};

pub type AppState = Arc<PhishingEngine>;

pub fn router(engine: AppState) -> Router {
    Router::new()
        .route("/predict/url", post(predict_url))
        .route("/predict/email", post(predict_email))
        .route("/health", get(health_check))
        // Email bodies are unbounded; the 2 MB default would answer with a plain-text 413.
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(engine)
}

/// Malformed or non-JSON bodies read as an empty request; the engine then rejects the missing field.
fn lenient_json<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

pub async fn predict_url(
    State(engine): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, AppError> {
    let request: UrlRequest = lenient_json(&body);
    Ok(Json(engine.predict_url(&request.url)?))
}

pub async fn predict_email(
    State(engine): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, AppError> {
    let request: EmailRequest = lenient_json(&body);
    Ok(Json(engine.predict_email(&request.text)?))
}

pub async fn health_check(State(engine): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "models": {
            "url": engine.model_info(Pipeline::Url),
            "email": engine.model_info(Pipeline::Email),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, CountingClassifier};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    async fn post_raw(app: Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, uri, "application/json", &body.to_string()).await
    }

    fn app() -> Router {
        router(Arc::new(testing::engine()))
    }

    #[tokio::test]
    async fn test_predict_url_success() {
        let (status, body) = post_json(
            app(),
            "/predict/url",
            json!({"url": "http://192.168.1.1/login?verify=1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let prediction = body["prediction"].as_str().unwrap();
        assert!(["phishing", "legitimate"].contains(&prediction));
        let score = body["score"].as_f64().unwrap();
        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
        assert!(confidence >= 0.5);
    }

    #[tokio::test]
    async fn test_predict_email_success() {
        let (status, body) = post_json(
            app(),
            "/predict/email",
            json!({"text": "Urgent: click to verify your password"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "phishing");
        assert_eq!(body["confidence"], body["score"]);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let (status, body) = post_json(app(), "/predict/email", json!({"text": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No text provided"}));
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let (status, body) = post_json(app(), "/predict/url", json!({"link": "x.com"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No URL provided"}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_treated_as_missing_field() {
        let (status, body) = post_raw(app(), "/predict/url", "application/json", "{url:").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No URL provided"}));

        let (status, body) = post_raw(app(), "/predict/email", "text/plain", "hello").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No text provided"}));

        let (status, _) = post_json(app(), "/predict/url", json!({"url": 42})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejected_requests_never_reach_classifier() {
        let url_model = Arc::new(CountingClassifier::new(testing::URL_TEXT_WIDTH + 8, 1, 0.8));
        let email_model = Arc::new(CountingClassifier::new(testing::EMAIL_TEXT_WIDTH, 0, 0.3));
        let app = router(Arc::new(testing::engine_with(
            url_model.clone(),
            email_model.clone(),
        )));

        let (status, _) = post_json(app.clone(), "/predict/url", json!({"url": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = post_json(app.clone(), "/predict/email", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(url_model.calls(), 0);
        assert_eq!(email_model.calls(), 0);

        let (status, body) = post_json(app, "/predict/email", json!({"text": "hello"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "legitimate");
        assert!((body["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(email_model.calls(), 1);
    }

    #[tokio::test]
    async fn test_cross_origin_allowed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/predict/url")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_email_larger_than_default_body_limit_is_classified() {
        let text = "weekly meeting ".repeat(200_000);
        assert!(text.len() > 2 * 1024 * 1024);

        let (status, body) = post_json(app(), "/predict/email", json!({ "text": text })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "legitimate");
    }

    #[tokio::test]
    async fn test_health_reports_model_widths() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["models"]["url"]["features"], testing::URL_TEXT_WIDTH + 8);
        assert_eq!(body["models"]["email"]["features"], testing::EMAIL_TEXT_WIDTH);
    }
}
