use crate::{
    error::{artifact_error, AppError},
    sparse::SparseRow,
};
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};
use tracing::info;
use unicode_normalization::{char::canonical_combining_class, UnicodeNormalization};

/// Projects raw text onto a frozen vocabulary. Never learns from its input.
pub trait TextVectorizer: Send + Sync {
    /// Number of columns in every row this vectorizer emits.
    fn width(&self) -> usize;

    fn transform(&self, text: &str) -> SparseRow;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    #[default]
    Word,
    Char,
    CharWb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripAccents {
    /// NFKD, then drop every non-ASCII character.
    Ascii,
    /// NFKD, then drop combining marks.
    Unicode,
}

/// On-disk form of a fitted TF-IDF vectorizer.
///
/// Unknown keys fail the load: a setting this type cannot honour would change rows silently.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Vec<f64>,
    #[serde(default = "enabled")]
    pub lowercase: bool,
    #[serde(default)]
    pub analyzer: Analyzer,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "enabled")]
    pub use_idf: bool,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub strip_accents: Option<StripAccents>,
    /// Explicit word list; only the word analyzer consults it.
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
}

fn enabled() -> bool {
    true
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    lowercase: bool,
    analyzer: Analyzer,
    token_pattern: Regex,
    whitespace_runs: Regex,
    min_n: usize,
    max_n: usize,
    norm: Option<Norm>,
    sublinear_tf: bool,
    binary: bool,
    strip_accents: Option<StripAccents>,
    stop_words: HashSet<String>,
}

impl std::fmt::Debug for TfidfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfidfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("analyzer", &self.analyzer)
            .field("ngram_range", &(self.min_n, self.max_n))
            .finish()
    }
}

impl TfidfVectorizer {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let data = fs::read_to_string(path).map_err(|e| artifact_error(path, e))?;
        let artifact: TfidfArtifact =
            serde_json::from_str(&data).map_err(|e| artifact_error(path, e))?;
        let vectorizer = Self::from_artifact(artifact).map_err(|e| artifact_error(path, e))?;

        info!(
            "Loaded vectorizer from {}: {} terms, {:?} analyzer",
            path.display(),
            vectorizer.width(),
            vectorizer.analyzer
        );
        Ok(vectorizer)
    }

    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, String> {
        let width = artifact.vocabulary.len();

        let mut seen = vec![false; width];
        for (term, &col) in &artifact.vocabulary {
            if col >= width || seen[col] {
                return Err(format!("term {:?} has invalid column {}", term, col));
            }
            seen[col] = true;
        }

        let idf = if artifact.use_idf {
            if artifact.idf.len() != width {
                return Err(format!(
                    "idf has {} weights for {} terms",
                    artifact.idf.len(),
                    width
                ));
            }
            Some(artifact.idf)
        } else {
            None
        };

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }

        let token_pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| format!("invalid token_pattern: {}", e))?;
        let whitespace_runs = Regex::new(r"\s\s+").map_err(|e| e.to_string())?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf,
            lowercase: artifact.lowercase,
            analyzer: artifact.analyzer,
            token_pattern,
            whitespace_runs,
            min_n,
            max_n,
            norm: artifact.norm,
            sublinear_tf: artifact.sublinear_tf,
            binary: artifact.binary,
            strip_accents: artifact.strip_accents,
            stop_words: artifact.stop_words.unwrap_or_default().into_iter().collect(),
        })
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let text = match self.strip_accents {
            Some(StripAccents::Ascii) => text.nfkd().filter(char::is_ascii).collect(),
            Some(StripAccents::Unicode) => text
                .nfkd()
                .filter(|c| canonical_combining_class(*c) == 0)
                .collect(),
            None => text,
        };

        match self.analyzer {
            Analyzer::Word => self.word_ngrams(&text),
            Analyzer::Char => self.char_ngrams(&text),
            Analyzer::CharWb => self.char_wb_ngrams(&text),
        }
    }

    fn word_ngrams(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let mut grams = Vec::new();
        for n in self.min_n..=self.max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    fn char_ngrams(&self, text: &str) -> Vec<String> {
        let collapsed = self.whitespace_runs.replace_all(text, " ");
        let chars: Vec<char> = collapsed.chars().collect();

        let mut grams = Vec::new();
        for n in self.min_n..=self.max_n.min(chars.len()) {
            for window in chars.windows(n) {
                grams.push(window.iter().collect());
            }
        }
        grams
    }

    fn char_wb_ngrams(&self, text: &str) -> Vec<String> {
        let collapsed = self.whitespace_runs.replace_all(text, " ");

        let mut grams = Vec::new();
        for word in collapsed.split_whitespace() {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            let len = padded.len();

            for n in self.min_n..=self.max_n {
                let mut offset = 0;
                grams.push(padded[offset..(offset + n).min(len)].iter().collect());
                while offset + n < len {
                    offset += 1;
                    grams.push(padded[offset..offset + n].iter().collect());
                }
                // Words shorter than n are counted once.
                if offset == 0 {
                    break;
                }
            }
        }
        grams
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn width(&self) -> usize {
        self.vocabulary.len()
    }

    fn transform(&self, text: &str) -> SparseRow {
        let entries = self
            .analyze(text)
            .iter()
            .filter_map(|gram| self.vocabulary.get(gram).map(|&col| (col, 1.0)))
            .collect();
        let mut row = SparseRow::from_entries(self.width(), entries);

        let (binary, sublinear) = (self.binary, self.sublinear_tf);
        let idf = self.idf.as_deref();
        row.map_values(|col, tf| {
            let tf = if binary { 1.0 } else { tf };
            let tf = if sublinear { tf.ln() + 1.0 } else { tf };
            match idf {
                Some(idf) => tf * idf[col],
                None => tf,
            }
        });

        let magnitude = match self.norm {
            Some(Norm::L2) => row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => row.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 0.0,
        };
        if magnitude > 0.0 {
            row.scale(1.0 / magnitude);
        }

        row
    }
}
