use crate::{
    error::AppError,
    features::{URL_FEATURE_COUNT, URL_FEATURE_NAMES},
    sparse::SparseRow,
};

/// Column layout a classifier was trained on: text columns, then named numeric columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    pub text_width: usize,
    pub numeric: &'static [&'static str],
}

impl FeatureSchema {
    pub fn url(text_width: usize) -> Self {
        Self {
            text_width,
            numeric: &URL_FEATURE_NAMES,
        }
    }

    pub fn text_only(text_width: usize) -> Self {
        Self {
            text_width,
            numeric: &[],
        }
    }

    pub fn width(&self) -> usize {
        self.text_width + self.numeric.len()
    }

    /// Column index of a named numeric feature.
    #[cfg(test)]
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.numeric
            .iter()
            .position(|n| *n == name)
            .map(|i| self.text_width + i)
    }

    /// Startup check against the classifier's trained input width.
    pub fn validate(&self, model_features: usize) -> Result<(), String> {
        if self.width() != model_features {
            return Err(format!(
                "schema has {} columns ({} text + {} numeric), model expects {}",
                self.width(),
                self.text_width,
                self.numeric.len(),
                model_features
            ));
        }
        Ok(())
    }
}

/// Text representation columns first, then the URL feature vector.
pub fn combine(
    schema: &FeatureSchema,
    text: &SparseRow,
    numeric: &[f64; URL_FEATURE_COUNT],
) -> Result<SparseRow, AppError> {
    if text.width() != schema.text_width || numeric.len() != schema.numeric.len() {
        return Err(AppError::ModelInference(format!(
            "cannot combine {} text + {} numeric columns into schema of {} + {}",
            text.width(),
            numeric.len(),
            schema.text_width,
            schema.numeric.len()
        )));
    }
    Ok(text.hstack(&SparseRow::from_dense(numeric)))
}
