use crate::{
    error::{artifact_error, AppError},
    sparse::SparseRow,
};
use serde::Deserialize;
use std::{fs, path::Path, sync::Arc};
use tracing::info;

pub const PHISHING: u8 = 1;
pub const LEGITIMATE: u8 = 0;

/// A pre-trained binary classifier. Read-only after load and safe to share across requests.
pub trait Classifier: Send + Sync {
    /// Input width the model was trained on.
    fn n_features(&self) -> usize;

    fn predict(&self, row: &SparseRow) -> Result<u8, AppError>;

    /// `[p0, p1]`, summing to one.
    fn predict_proba(&self, row: &SparseRow) -> Result<[f64; 2], AppError>;

    /// Label and class-1 probability in one call.
    fn classify(&self, row: &SparseRow) -> Result<(u8, f64), AppError> {
        let label = self.predict(row)?;
        let [_, p1] = self.predict_proba(row)?;
        Ok((label, p1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
        #[serde(default = "binary_classes")]
        classes: Vec<i64>,
    },
    MultinomialNb {
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
        #[serde(default = "binary_classes")]
        classes: Vec<i64>,
    },
}

fn binary_classes() -> Vec<i64> {
    vec![0, 1]
}

impl ModelArtifact {
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, String> {
        match self {
            ModelArtifact::LogisticRegression {
                coef,
                intercept,
                classes,
            } => {
                check_classes(&classes)?;
                if coef.is_empty() {
                    return Err("logistic regression has no coefficients".to_string());
                }
                Ok(Arc::new(LogisticRegression { coef, intercept }))
            }
            ModelArtifact::MultinomialNb {
                class_log_prior,
                feature_log_prob,
                classes,
            } => {
                check_classes(&classes)?;
                let &[prior0, prior1] = class_log_prior.as_slice() else {
                    return Err(format!(
                        "expected 2 class priors, got {}",
                        class_log_prior.len()
                    ));
                };
                let [legit, phish]: [Vec<f64>; 2] = feature_log_prob.try_into().map_err(
                    |rows: Vec<Vec<f64>>| format!("expected 2 feature_log_prob rows, got {}", rows.len()),
                )?;
                if legit.len() != phish.len() || legit.is_empty() {
                    return Err(format!(
                        "feature_log_prob rows have widths {} and {}",
                        legit.len(),
                        phish.len()
                    ));
                }
                Ok(Arc::new(MultinomialNb {
                    class_log_prior: [prior0, prior1],
                    feature_log_prob: [legit, phish],
                }))
            }
        }
    }
}

fn check_classes(classes: &[i64]) -> Result<(), String> {
    if classes != [0i64, 1] {
        return Err(format!("expected classes [0, 1], got {:?}", classes));
    }
    Ok(())
}

pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, AppError> {
    let data = fs::read_to_string(path).map_err(|e| artifact_error(path, e))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&data).map_err(|e| artifact_error(path, e))?;
    let classifier = artifact
        .into_classifier()
        .map_err(|e| artifact_error(path, e))?;

    info!(
        "Loaded classifier from {}: {} features",
        path.display(),
        classifier.n_features()
    );
    Ok(classifier)
}

fn check_width(row: &SparseRow, expected: usize) -> Result<(), AppError> {
    if row.width() != expected {
        return Err(AppError::ModelInference(format!(
            "feature row has {} columns, model expects {}",
            row.width(),
            expected
        )));
    }
    Ok(())
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    fn decision_function(&self, row: &SparseRow) -> Result<f64, AppError> {
        check_width(row, self.coef.len())?;
        Ok(row.dot(&self.coef) + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn predict(&self, row: &SparseRow) -> Result<u8, AppError> {
        let z = self.decision_function(row)?;
        Ok(if z > 0.0 { PHISHING } else { LEGITIMATE })
    }

    fn predict_proba(&self, row: &SparseRow) -> Result<[f64; 2], AppError> {
        let p1 = sigmoid(self.decision_function(row)?);
        Ok([1.0 - p1, p1])
    }
}

#[derive(Debug, Clone)]
pub struct MultinomialNb {
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNb {
    fn joint_log_likelihood(&self, row: &SparseRow) -> Result<[f64; 2], AppError> {
        check_width(row, self.n_features())?;
        Ok([
            self.class_log_prior[0] + row.dot(&self.feature_log_prob[0]),
            self.class_log_prior[1] + row.dot(&self.feature_log_prob[1]),
        ])
    }
}

impl Classifier for MultinomialNb {
    fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    fn predict(&self, row: &SparseRow) -> Result<u8, AppError> {
        let [jll0, jll1] = self.joint_log_likelihood(row)?;
        Ok(if jll1 > jll0 { PHISHING } else { LEGITIMATE })
    }

    fn predict_proba(&self, row: &SparseRow) -> Result<[f64; 2], AppError> {
        let [jll0, jll1] = self.joint_log_likelihood(row)?;
        let max = jll0.max(jll1);
        let log_norm = max + ((jll0 - max).exp() + (jll1 - max).exp()).ln();
        let p1 = (jll1 - log_norm).exp();
        Ok([1.0 - p1, p1])
    }
}
