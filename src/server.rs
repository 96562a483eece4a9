//! HTTP prediction service.
//!
//! The artifact pair is loaded once before the listener starts and handed
//! to the router as shared, read-only state. Handlers never touch the
//! filesystem, so each request costs one vectorize + predict.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::pipelines::text_classification::Predictor;

/// Message returned when the request carries no usable text
pub static NO_TEXT: &str = "No text provided";

/// Shared state for every request
#[derive(new)]
pub struct AppState {
    /// The read-only artifact pair
    predictor: Predictor,
}

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// The document to classify
    #[serde(default)]
    pub text: Option<String>,
}

/// Successful body of `POST /predict`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    /// Whether the document was classified as FAKE
    pub is_fake: bool,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Human-readable cause
    pub error: String,
}

/// Build a JSON error response
fn api_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Build the axum [`Router`] with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Classify a single document
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log::debug!("Rejected /predict body: {}", rejection.body_text());
            return api_error(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let text = match request.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => {
            log::debug!("Rejected /predict request without text");
            return api_error(StatusCode::BAD_REQUEST, NO_TEXT);
        }
    };

    match state.predictor.predict(text) {
        Ok(prediction) => Json(PredictResponse {
            is_fake: prediction.is_fake(),
        })
        .into_response(),
        Err(e) => {
            log::error!("Prediction failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Liveness probe reporting the loaded vocabulary size
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "vocabulary": state.predictor.vectorizer().dim(),
    }))
    .into_response()
}

/// Serve until Ctrl-C is received
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::warn!("Unable to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::{ClassifierConfig, VectorizerConfig},
        datasets::Label,
        pipelines::text_classification::{MultinomialNb, TfIdfVectorizer},
    };

    fn test_app() -> Router {
        let texts = ["election results certified", "miracle cure doctors hate"];
        let vectorizer = TfIdfVectorizer::fit(&VectorizerConfig::default(), &texts).unwrap();
        let classifier = MultinomialNb::fit(
            &ClassifierConfig::default(),
            &vectorizer.transform_all(&texts),
            &[Label::Real, Label::Fake],
        )
        .unwrap();
        let predictor = Predictor::new(vectorizer, classifier).unwrap();

        router(Arc::new(AppState::new(predictor)))
    }

    fn post_predict(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Helper: parse a JSON response body into a `serde_json::Value`.
    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_fake() {
        let resp = test_app()
            .oneshot(post_predict(r#"{"text": "breaking miracle cure"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, serde_json::json!({"isFake": true}));
    }

    #[tokio::test]
    async fn test_predict_real() {
        let resp = test_app()
            .oneshot(post_predict(r#"{"text": "results were certified"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, serde_json::json!({"isFake": false}));
    }

    #[tokio::test]
    async fn test_missing_text() {
        let resp = test_app().oneshot(post_predict("{}")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"error": "No text provided"})
        );
    }

    #[tokio::test]
    async fn test_empty_and_blank_text() {
        for body in [r#"{"text": ""}"#, r#"{"text": "   "}"#, r#"{"text": null}"#] {
            let resp = test_app().oneshot(post_predict(body)).await.unwrap();

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await["error"], NO_TEXT);
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_client_error() {
        let resp = test_app().oneshot(post_predict("{not json")).await.unwrap();

        assert!(resp.status().is_client_error());
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::get("/health").body(Body::empty()).unwrap();

        let resp = test_app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["vocabulary"], 7);
    }

    #[tokio::test]
    async fn test_get_predict_not_allowed() {
        let req = Request::get("/predict").body(Body::empty()).unwrap();

        let resp = test_app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
