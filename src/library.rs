//! Verse Library
//!
//! Maps canonical references (`john3:16`) to verse text. Loaded from a JSON
//! object on disk, or the built-in sample verses.

use crate::error::{VoiceError, VoiceResult};
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use std::path::Path;
use strsim::normalized_levenshtein;
use tracing::{info, warn};

/// Minimum similarity for a "did you mean" suggestion
const SUGGESTION_CUTOFF: f64 = 0.75;

const SAMPLE_VERSES: &[(&str, &str)] = &[
    (
        "john3:16",
        "For God so loved the world that he gave his one and only Son, \
         that whoever believes in him shall not perish but have eternal life.",
    ),
    (
        "psalm23:1",
        "The Lord is my shepherd, I lack nothing.",
    ),
    (
        "genesis1:1",
        "In the beginning God created the heavens and the earth.",
    ),
];

/// Key to text lookup used by the session
pub trait ContentLookup: Send + Sync {
    fn lookup(&self, reference: &str) -> Option<String>;

    /// Any reference that `lookup` would resolve
    fn random_reference(&self) -> Option<String> {
        None
    }

    /// A known reference close to one that was not found
    fn suggest(&self, _reference: &str) -> Option<String> {
        None
    }
}

/// Canonical form of a reference: lower-case, no whitespace
pub fn canonical_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct VerseLibrary {
    verses: BTreeMap<String, String>,
}

impl VerseLibrary {
    /// Library holding the built-in sample verses
    pub fn with_samples() -> Self {
        Self::from_entries(
            SAMPLE_VERSES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let verses = entries
            .into_iter()
            .map(|(reference, text)| (canonical_reference(&reference), text))
            .filter(|(reference, _)| !reference.is_empty())
            .collect();
        Self { verses }
    }

    /// Load a JSON object of `"reference": "text"` pairs
    pub fn from_file(path: &Path) -> VoiceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        if entries.is_empty() {
            return Err(VoiceError::Library(format!(
                "{} contains no verses",
                path.display()
            )));
        }
        let library = Self::from_entries(entries);
        info!("📚 Loaded {} verses from {}", library.len(), path.display());
        Ok(library)
    }

    /// Load from `path` if given, falling back to the samples on any problem
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::from_file(path).unwrap_or_else(|e| {
                warn!("⚠️ Could not load verses from {}: {}", path.display(), e);
                Self::with_samples()
            }),
            None => Self::with_samples(),
        }
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }
}

impl ContentLookup for VerseLibrary {
    fn lookup(&self, reference: &str) -> Option<String> {
        self.verses.get(&canonical_reference(reference)).cloned()
    }

    fn random_reference(&self) -> Option<String> {
        self.verses.keys().choose(&mut rand::thread_rng()).cloned()
    }

    fn suggest(&self, reference: &str) -> Option<String> {
        let wanted = canonical_reference(reference);
        self.verses
            .keys()
            .map(|candidate| (candidate, normalized_levenshtein(&wanted, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_CUTOFF)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| candidate.clone())
    }
}
