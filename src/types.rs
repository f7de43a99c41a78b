use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Phishing,
    Legitimate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Phishing => "phishing",
            Verdict::Legitimate => "legitimate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Verdict,
    /// Probability of the predicted label; never below 0.5.
    pub confidence: f64,
    /// Raw phishing probability.
    pub score: f64,
}

impl PredictionResponse {
    pub fn from_classification(label: u8, p1: f64) -> Self {
        let (prediction, confidence) = if label == crate::model::PHISHING {
            (Verdict::Phishing, p1)
        } else {
            (Verdict::Legitimate, 1.0 - p1)
        };
        Self {
            prediction,
            confidence,
            score: p1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Url,
    Email,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Url => "url",
            Pipeline::Email => "email",
        }
    }

    pub fn missing_input_message(&self) -> &'static str {
        match self {
            Pipeline::Url => "No URL provided",
            Pipeline::Email => "No text provided",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub features: usize,
    pub text_features: usize,
}
