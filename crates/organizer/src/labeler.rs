use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::LabelerConfig;
use crate::error::{Error, Result};
use crate::types::UNCATEGORIZED;

/// Content labeling capability for images.
///
/// Implementations never fail: anything that goes wrong inside them
/// (network, malformed response, no labels) comes back as `UNCATEGORIZED`.
pub trait Labeler: Send + Sync {
    fn label(&self, image: &[u8]) -> String;

    /// False when every answer would be `UNCATEGORIZED` anyway, so callers
    /// can skip reading images and decoding video frames.
    fn is_active(&self) -> bool {
        true
    }
}

/// Used when no labeling service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLabeler;

impl Labeler for NullLabeler {
    fn label(&self, _image: &[u8]) -> String {
        UNCATEGORIZED.to_string()
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Posts raw image bytes to a labeling endpoint.
///
/// Accepted response shapes:
/// `{"labels": [{"name": "beach", "score": 0.93}, ...]}` or `{"label": "beach"}`.
pub struct HttpLabeler {
    client: Client,
    endpoint: String,
    min_score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelResponse {
    Scored { labels: Vec<ScoredLabel> },
    Single { label: String },
}

#[derive(Debug, Deserialize)]
struct ScoredLabel {
    name: String,
    #[serde(default)]
    score: Option<f32>,
}

impl HttpLabeler {
    pub fn new(endpoint: impl Into<String>, config: &LabelerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sort-tree/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Labeler(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            min_score: config.min_score,
        })
    }

    fn request(&self, image: &[u8]) -> Result<Option<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .map_err(|e| Error::Labeler(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Labeler(format!("status {}", response.status())));
        }

        let body: LabelResponse = response
            .json()
            .map_err(|e| Error::Labeler(e.to_string()))?;

        Ok(best_label(body, self.min_score))
    }
}

impl Labeler for HttpLabeler {
    fn label(&self, image: &[u8]) -> String {
        match self.request(image) {
            Ok(Some(label)) => label,
            Ok(None) => UNCATEGORIZED.to_string(),
            Err(e) => {
                tracing::debug!(endpoint = %self.endpoint, error = %e, "labeler unavailable");
                UNCATEGORIZED.to_string()
            }
        }
    }
}

fn best_label(response: LabelResponse, min_score: f32) -> Option<String> {
    let label = match response {
        LabelResponse::Single { label } => Some(label),
        LabelResponse::Scored { labels } => labels
            .into_iter()
            .map(|l| (l.score.unwrap_or(0.0), l.name))
            .filter(|(score, _)| *score >= min_score)
            .fold(None, |best: Option<(f32, String)>, (score, name)| match best {
                Some((s, _)) if s >= score => best,
                _ => Some((score, name)),
            })
            .map(|(_, name)| name),
    };

    label
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
}

/// Most frequent usable label; ties go to the one seen first.
pub fn majority_label<I>(labels: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let counted = labels
        .into_iter()
        .filter(|l| is_usable(l))
        .fold(Vec::<(String, usize)>::new(), |mut acc, label| {
            match acc.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => acc.push((label, 1)),
            }
            acc
        });

    counted
        .into_iter()
        .fold(None, |best: Option<(String, usize)>, (label, count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

/// A label worth using as a path segment source.
pub fn is_usable(label: &str) -> bool {
    let trimmed = label.trim();
    !trimmed.is_empty() && trimmed != UNCATEGORIZED
}
