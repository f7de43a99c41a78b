//! Small in-memory artifacts for unit and handler tests.

use crate::{
    config::{EMAIL_MODEL_FILE, EMAIL_VECTORIZER_FILE, URL_MODEL_FILE, URL_VECTORIZER_FILE},
    engine::{EmailPipeline, PhishingEngine, UrlPipeline},
    error::AppError,
    model::{Classifier, ModelArtifact},
    sparse::SparseRow,
    vectorizer::{TfidfArtifact, TfidfVectorizer},
};
use serde_json::{json, Value};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

pub const URL_TEXT_WIDTH: usize = 8;
pub const EMAIL_TEXT_WIDTH: usize = 10;

pub fn url_vectorizer_json() -> Value {
    json!({
        "vocabulary": {
            "login": 0, "verify": 1, "paypal": 2, "secure": 3,
            "account": 4, "update": 5, "com": 6, "http": 7
        },
        "idf": [1.8, 2.1, 2.5, 1.9, 1.7, 1.6, 1.1, 1.0],
    })
}

pub fn url_model_json() -> Value {
    json!({
        "kind": "logistic_regression",
        // text block, then length, dots, dashes, underscores, ats, questions, slashes, ip flag
        "coef": [
            1.5, 1.4, 1.8, 1.2, 1.1, 1.0, -0.8, -0.2,
            0.02, 0.3, 0.4, 0.2, 1.5, 0.6, 0.1, 2.5
        ],
        "intercept": -2.0,
    })
}

pub fn email_vectorizer_json() -> Value {
    json!({
        "vocabulary": {
            "urgent": 0, "verify": 1, "account": 2, "password": 3, "prize": 4,
            "click": 5, "meeting": 6, "attached": 7, "minutes": 8, "weekly": 9
        },
        "idf": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    })
}

pub fn email_model_json() -> Value {
    json!({
        "kind": "logistic_regression",
        "coef": [3.0, 3.0, 3.0, 3.0, 3.0, 3.0, -3.0, -3.0, -3.0, -3.0],
        "intercept": 0.0,
    })
}

fn vectorizer(value: Value) -> Arc<TfidfVectorizer> {
    let artifact: TfidfArtifact = serde_json::from_value(value).unwrap();
    Arc::new(TfidfVectorizer::from_artifact(artifact).unwrap())
}

fn classifier(value: Value) -> Arc<dyn Classifier> {
    serde_json::from_value::<ModelArtifact>(value)
        .unwrap()
        .into_classifier()
        .unwrap()
}

pub fn url_vectorizer() -> Arc<TfidfVectorizer> {
    vectorizer(url_vectorizer_json())
}

pub fn engine() -> PhishingEngine {
    engine_with(classifier(url_model_json()), classifier(email_model_json()))
}

pub fn engine_with(url_model: Arc<dyn Classifier>, email_model: Arc<dyn Classifier>) -> PhishingEngine {
    let url = UrlPipeline::new(url_vectorizer(), url_model).unwrap();
    let email = EmailPipeline::new(vectorizer(email_vectorizer_json()), email_model).unwrap();
    PhishingEngine::new(url, email)
}

pub fn write_artifacts(dir: &Path) {
    for (file, value) in [
        (URL_MODEL_FILE, url_model_json()),
        (URL_VECTORIZER_FILE, url_vectorizer_json()),
        (EMAIL_MODEL_FILE, email_model_json()),
        (EMAIL_VECTORIZER_FILE, email_vectorizer_json()),
    ] {
        std::fs::write(dir.join(file), value.to_string()).unwrap();
    }
}

/// Fixed-output classifier that records how often it was asked for a label.
pub struct CountingClassifier {
    n_features: usize,
    label: u8,
    p1: f64,
    calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn new(n_features: usize, label: u8, p1: f64) -> Self {
        Self {
            n_features,
            label,
            p1,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for CountingClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, _row: &SparseRow) -> Result<u8, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.label)
    }

    fn predict_proba(&self, _row: &SparseRow) -> Result<[f64; 2], AppError> {
        Ok([1.0 - self.p1, self.p1])
    }
}
