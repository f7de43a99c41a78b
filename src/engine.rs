use crate::{
    combiner::{combine, FeatureSchema},
    config::ArtifactPaths,
    error::{artifact_error, validation_error, AppError},
    features::UrlFeatureExtractor,
    model::{load_classifier, Classifier},
    sparse::SparseRow,
    types::{ModelInfo, Pipeline, PredictionResponse},
    vectorizer::{TextVectorizer, TfidfVectorizer},
};
use std::{path::Path, sync::Arc, time::Instant};
use tracing::{debug, info};

/// URL path: vectorize, extract, combine, classify.
pub struct UrlPipeline {
    extractor: UrlFeatureExtractor,
    vectorizer: Arc<dyn TextVectorizer>,
    classifier: Arc<dyn Classifier>,
    schema: FeatureSchema,
}

impl UrlPipeline {
    pub fn new(
        vectorizer: Arc<dyn TextVectorizer>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, AppError> {
        let schema = FeatureSchema::url(vectorizer.width());
        schema
            .validate(classifier.n_features())
            .map_err(|e| AppError::ModelInference(format!("url pipeline: {}", e)))?;

        Ok(Self {
            extractor: UrlFeatureExtractor::new()?,
            vectorizer,
            classifier,
            schema,
        })
    }

    pub fn load(vectorizer_path: &Path, model_path: &Path) -> Result<Self, AppError> {
        let vectorizer = Arc::new(TfidfVectorizer::load(vectorizer_path)?);
        let classifier = load_classifier(model_path)?;
        Self::new(vectorizer, classifier).map_err(|e| artifact_error(model_path, e))
    }

    pub fn feature_row(&self, url: &str) -> Result<SparseRow, AppError> {
        let text = self.vectorizer.transform(url);
        let numeric = self.extractor.extract(url).to_vector();
        combine(&self.schema, &text, &numeric)
    }

    pub fn predict(&self, url: &str) -> Result<PredictionResponse, AppError> {
        let row = self.feature_row(url)?;
        let (label, p1) = self.classifier.classify(&row)?;
        Ok(PredictionResponse::from_classification(label, p1))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

/// Email path: vectorize, classify.
pub struct EmailPipeline {
    vectorizer: Arc<dyn TextVectorizer>,
    classifier: Arc<dyn Classifier>,
    schema: FeatureSchema,
}

impl EmailPipeline {
    pub fn new(
        vectorizer: Arc<dyn TextVectorizer>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, AppError> {
        let schema = FeatureSchema::text_only(vectorizer.width());
        schema
            .validate(classifier.n_features())
            .map_err(|e| AppError::ModelInference(format!("email pipeline: {}", e)))?;

        Ok(Self {
            vectorizer,
            classifier,
            schema,
        })
    }

    pub fn load(vectorizer_path: &Path, model_path: &Path) -> Result<Self, AppError> {
        let vectorizer = Arc::new(TfidfVectorizer::load(vectorizer_path)?);
        let classifier = load_classifier(model_path)?;
        Self::new(vectorizer, classifier).map_err(|e| artifact_error(model_path, e))
    }

    pub fn predict(&self, text: &str) -> Result<PredictionResponse, AppError> {
        let row = self.vectorizer.transform(text);
        let (label, p1) = self.classifier.classify(&row)?;
        Ok(PredictionResponse::from_classification(label, p1))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

/// Both pipelines, built once at startup and shared read-only by every request.
pub struct PhishingEngine {
    url: UrlPipeline,
    email: EmailPipeline,
}

impl PhishingEngine {
    pub fn new(url: UrlPipeline, email: EmailPipeline) -> Self {
        Self { url, email }
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, AppError> {
        info!("Loading model artifacts...");

        let url = UrlPipeline::load(&paths.url_vectorizer, &paths.url_model)?;
        let email = EmailPipeline::load(&paths.email_vectorizer, &paths.email_model)?;

        info!(
            "Phishing engine ready: url {} columns, email {} columns",
            url.schema().width(),
            email.schema().width()
        );
        Ok(Self::new(url, email))
    }

    pub fn predict_url(&self, url: &str) -> Result<PredictionResponse, AppError> {
        self.run(Pipeline::Url, url, |input| self.url.predict(input))
    }

    pub fn predict_email(&self, text: &str) -> Result<PredictionResponse, AppError> {
        self.run(Pipeline::Email, text, |input| self.email.predict(input))
    }

    pub fn model_info(&self, pipeline: Pipeline) -> ModelInfo {
        let schema = match pipeline {
            Pipeline::Url => self.url.schema(),
            Pipeline::Email => self.email.schema(),
        };
        ModelInfo {
            features: schema.width(),
            text_features: schema.text_width,
        }
    }

    fn run(
        &self,
        pipeline: Pipeline,
        input: &str,
        predict: impl FnOnce(&str) -> Result<PredictionResponse, AppError>,
    ) -> Result<PredictionResponse, AppError> {
        if input.is_empty() {
            metrics::counter!("prediction_rejections_total", "pipeline" => pipeline.as_str())
                .increment(1);
            return Err(validation_error(pipeline.missing_input_message()));
        }

        let start = Instant::now();
        let result = predict(input)?;

        metrics::histogram!("prediction_duration_seconds", "pipeline" => pipeline.as_str())
            .record(start.elapsed().as_secs_f64());
        metrics::counter!(
            "predictions_total",
            "pipeline" => pipeline.as_str(),
            "verdict" => result.prediction.as_str()
        )
        .increment(1);

        debug!(
            "{} prediction: {} (score {:.4}, confidence {:.4})",
            pipeline.as_str(),
            result.prediction.as_str(),
            result.score,
            result.confidence
        );
        Ok(result)
    }
}
