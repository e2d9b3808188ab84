use serde::{Deserialize, Serialize};

/// Substrings that count against a post, English and Russian. Matched
/// case-insensitively, once per occurrence.
const TOXIC_KEYWORDS: &[&str] = &[
    "terrible", "hate", "stupid", "idiot", "dumb", "bad", "awful",
    "horrible", "worst", "sucks", "garbage", "trash", "useless",
    "ужасный", "ненавижу", "тупой", "идиот", "дурак", "плохой",
    // Insults aimed at the reader. A phrase stacks with any single keyword
    // inside it ("feel bad about your" also hits "bad").
    "you should all feel", "feel bad about your", "shut up", "nobody cares",
    "заткнись", "никому не нужен",
];

const KEYWORD_WEIGHT: f64 = 0.2;
const PUNCTUATION_WEIGHT: f64 = 0.1;
const SHOUTING_WEIGHT: f64 = 0.1;

/// More than this many `!` adds to the score.
const EXCLAMATION_THRESHOLD: usize = 2;
/// More than this many all-caps words adds to the score.
const SHOUTED_WORD_THRESHOLD: usize = 1;

pub const FLAG_THRESHOLD: f64 = 0.7;

/// Per-category scores, keyed the way moderation APIs name them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub hate: f64,
    #[serde(rename = "hate/threatening")]
    pub hate_threatening: f64,
    #[serde(rename = "self-harm")]
    pub self_harm: f64,
    pub sexual: f64,
    #[serde(rename = "sexual/minors")]
    pub sexual_minors: f64,
    pub violence: f64,
    #[serde(rename = "violence/graphic")]
    pub violence_graphic: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlags {
    pub hate: bool,
    #[serde(rename = "hate/threatening")]
    pub hate_threatening: bool,
    #[serde(rename = "self-harm")]
    pub self_harm: bool,
    pub sexual: bool,
    #[serde(rename = "sexual/minors")]
    pub sexual_minors: bool,
    pub violence: bool,
    #[serde(rename = "violence/graphic")]
    pub violence_graphic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub score: f64,
    pub flagged: bool,
    pub category_scores: CategoryScores,
    pub categories: CategoryFlags,
}

impl ModerationResult {
    /// Expand a clamped overall score into flags and category breakdown.
    pub fn from_score(score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            flagged: score > FLAG_THRESHOLD,
            category_scores: CategoryScores {
                hate: score * 0.8,
                hate_threatening: score * 0.7,
                self_harm: 0.01,
                sexual: 0.01,
                sexual_minors: 0.01,
                violence: score * 0.6,
                violence_graphic: 0.01,
            },
            categories: CategoryFlags {
                hate: score > 0.7,
                hate_threatening: score > 0.8,
                violence: score > 0.9,
                ..CategoryFlags::default()
            },
        }
    }

    /// Result used when no classifier answer is available: nothing flagged.
    pub fn clean() -> Self {
        Self::from_score(0.0)
    }
}

/// Answer shape for callers that only want a yes/no plus the reasons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToxicityCheck {
    pub is_toxic: bool,
    pub score: f64,
    pub categories: CategoryFlags,
}

impl From<ModerationResult> for ToxicityCheck {
    fn from(result: ModerationResult) -> Self {
        Self {
            is_toxic: result.flagged,
            score: result.score,
            categories: result.categories,
        }
    }
}

/// Score `text`. Pure: same input, same output.
pub fn score(text: &str) -> ModerationResult {
    let lower = text.to_lowercase();

    let keyword_hits: usize = TOXIC_KEYWORDS.iter().map(|k| lower.matches(k).count()).sum();
    let mut total = KEYWORD_WEIGHT * keyword_hits as f64;

    let exclamations = text.chars().filter(|&c| c == '!').count();
    if exclamations > EXCLAMATION_THRESHOLD {
        total += PUNCTUATION_WEIGHT * exclamations as f64;
    }

    let shouted = text.split_whitespace().filter(|w| is_shouted(w)).count();
    if shouted > SHOUTED_WORD_THRESHOLD {
        total += SHOUTING_WEIGHT * shouted as f64;
    }

    ModerationResult::from_score(total)
}

/// Token longer than two characters that upper-casing leaves unchanged.
/// Letterless tokens (`"!!!"`, `"2025"`) qualify too.
fn is_shouted(word: &str) -> bool {
    word.chars().count() > 2 && word.to_uppercase() == word
}
