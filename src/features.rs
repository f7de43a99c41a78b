use crate::error::{internal_error, AppError};
use regex::Regex;

pub const URL_FEATURE_COUNT: usize = 8;

/// Column names of the URL feature block, in training order.
pub const URL_FEATURE_NAMES: [&str; URL_FEATURE_COUNT] = [
    "url_length",
    "dot_count",
    "dash_count",
    "underscore_count",
    "at_count",
    "question_count",
    "slash_count",
    "is_ip_literal",
];

// `$` in the trainer's pattern also matched before one trailing newline.
const IP_LITERAL_PATTERN: &str = r"\A\d+\.\d+\.\d+\.\d+\n?\z";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrlFeatures {
    pub length: f64,
    pub dots: f64,
    pub dashes: f64,
    pub underscores: f64,
    pub ats: f64,
    pub questions: f64,
    pub slashes: f64,
    pub ip_literal: f64,
}

impl UrlFeatures {
    pub fn to_vector(&self) -> [f64; URL_FEATURE_COUNT] {
        [
            self.length,
            self.dots,
            self.dashes,
            self.underscores,
            self.ats,
            self.questions,
            self.slashes,
            self.ip_literal,
        ]
    }
}

/// Structural and lexical signals of a raw URL string.
pub struct UrlFeatureExtractor {
    ip_literal: Regex,
}

impl UrlFeatureExtractor {
    pub fn new() -> Result<Self, AppError> {
        let ip_literal = Regex::new(IP_LITERAL_PATTERN)
            .map_err(|e| internal_error(&format!("invalid IP pattern: {}", e)))?;
        Ok(Self { ip_literal })
    }

    pub fn extract(&self, url: &str) -> UrlFeatures {
        let count = |needle: char| url.chars().filter(|c| *c == needle).count() as f64;

        UrlFeatures {
            length: url.chars().count() as f64,
            dots: count('.'),
            dashes: count('-'),
            underscores: count('_'),
            ats: count('@'),
            questions: count('?'),
            slashes: count('/'),
            ip_literal: if self.ip_literal.is_match(url) { 1.0 } else { 0.0 },
        }
    }
}
