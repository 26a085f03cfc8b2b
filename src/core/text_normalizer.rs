//! Text Normalization
//!
//! Cleans recognized text before intent matching: case folding, known
//! mis-hearings, spoken numbers and verse references.

use std::collections::HashMap;

/// Mis-hearings the recognizer produces for this vocabulary
const MISHEARINGS: &[(&str, &str)] = &[
    ("jeans", "genesis"),
    ("sweet", "read"),
    ("sam", "psalm"),
    ("salm", "psalm"),
    ("psalms", "psalm"),
];

/// Conversational filler stripped from the start of an utterance
const FILLERS: &[&str] = &["ok", "okay", "um", "uh", "hey", "please"];

const TENS: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Normalizes spoken text to fix common recognition errors
pub struct TextNormalizer {
    /// Manual corrections from config, longest phrase first
    corrections: Vec<(String, String)>,
    /// Number word mappings
    number_words: HashMap<&'static str, u32>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl TextNormalizer {
    /// Create a new text normalizer
    pub fn new(corrections: HashMap<String, String>) -> Self {
        let mut number_words = HashMap::new();

        for (word, num) in [
            ("one", 1),
            ("two", 2),
            ("three", 3),
            ("four", 4),
            ("five", 5),
            ("six", 6),
            ("seven", 7),
            ("eight", 8),
            ("nine", 9),
            ("ten", 10),
            ("eleven", 11),
            ("twelve", 12),
            ("thirteen", 13),
            ("fourteen", 14),
            ("fifteen", 15),
            ("sixteen", 16),
            ("seventeen", 17),
            ("eighteen", 18),
            ("nineteen", 19),
        ] {
            number_words.insert(word, num);
        }
        for (word, num) in TENS {
            number_words.insert(*word, *num);
        }

        let mut corrections: Vec<(String, String)> = corrections
            .into_iter()
            .map(|(from, to)| (from.trim().to_lowercase(), to.trim().to_lowercase()))
            .filter(|(from, _)| !from.is_empty())
            .collect();
        corrections.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            corrections,
            number_words,
        }
    }

    /// Normalize text with corrections and common fixes
    pub fn normalize(&self, text: &str) -> String {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| *c != '\'')
            .map(|c| {
                if c.is_alphanumeric() || c == ':' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let mut result = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        for (from, to) in MISHEARINGS {
            result = replace_phrase(&result, from, to);
        }
        for (from, to) in &self.corrections {
            result = replace_phrase(&result, from, to);
        }

        let mut tokens: Vec<String> = result.split_whitespace().map(str::to_string).collect();

        while tokens
            .first()
            .is_some_and(|first| FILLERS.contains(&first.as_str()))
        {
            tokens.remove(0);
        }

        let tokens = self.digits_for_number_words(tokens);
        collapse_references(drop_reference_words(tokens)).join(" ")
    }

    /// Parse a spoken number (1-99) from text
    pub fn parse_number(&self, text: &str) -> Option<u32> {
        let text_lower = text.trim().to_lowercase();

        if let Ok(num) = text_lower.parse::<u32>() {
            if num > 0 && num <= 99 {
                return Some(num);
            }
        }

        let words: Vec<&str> = text_lower.split_whitespace().collect();
        match words.as_slice() {
            [word] => self.number_words.get(word).copied(),
            [tens, ones] => {
                let tens = TENS.iter().find(|(w, _)| w == tens).map(|(_, n)| *n)?;
                let ones = self.number_words.get(ones).copied().filter(|n| *n < 10)?;
                Some(tens + ones)
            }
            _ => None,
        }
    }

    /// "twenty three" -> "23", "sixteen" -> "16"
    fn digits_for_number_words(&self, tokens: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut iter = tokens.into_iter().peekable();

        while let Some(token) = iter.next() {
            let Some(&value) = self.number_words.get(token.as_str()) else {
                out.push(token);
                continue;
            };

            let is_tens = value >= 20;
            let ones = iter
                .peek()
                .and_then(|next| self.number_words.get(next.as_str()).copied())
                .filter(|n| is_tens && *n < 10);

            if let Some(ones) = ones {
                iter.next();
                out.push((value + ones).to_string());
            } else {
                out.push(value.to_string());
            }
        }

        out
    }
}

/// Replace a word or phrase only where it stands on word boundaries
fn replace_phrase(text: &str, from: &str, to: &str) -> String {
    let pattern = format!(" {} ", from);
    let replacement = format!(" {} ", to);
    let mut padded = format!(" {} ", text);

    // A second pass catches back-to-back occurrences sharing a space
    padded = padded.replace(&pattern, &replacement);
    if !replacement.contains(&pattern) {
        padded = padded.replace(&pattern, &replacement);
    }

    padded.trim().to_string()
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// "john chapter 3 verse 16" -> "john 3 16"
fn drop_reference_words(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let next_is_number = tokens.get(i + 1).is_some_and(|t| is_number(t));
        if (token == "chapter" || token == "verse") && next_is_number {
            continue;
        }
        out.push(token.clone());
    }
    out
}

/// "john 3 16" -> "john 3:16"
fn collapse_references(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let follows_word = out
            .last()
            .is_some_and(|prev| prev.chars().all(char::is_alphabetic));
        if follows_word
            && is_number(&tokens[i])
            && tokens.get(i + 1).is_some_and(|t| is_number(t))
        {
            out.push(format!("{}:{}", tokens[i], tokens[i + 1]));
            i += 2;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }

    out
}
