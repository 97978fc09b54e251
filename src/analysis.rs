use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;
use crate::link::Platform;

const PROBABILITY_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfidence {
    pub value: f64,
    #[serde(default)]
    pub label: String,
}

impl ModelConfidence {
    pub fn percent(&self) -> f64 {
        (self.value * 100.0).clamp(0.0, 100.0)
    }

    pub fn display_label(&self) -> String {
        let mut chars = self.label.trim().chars();
        match chars.next() {
            Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
            None => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub text: String,
    pub value: f64,
}

/// Sentiment and emotion summary for one entity (a video, a post, its comments).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    #[serde(default)]
    pub overall_sentiment: String,
    #[serde(default)]
    pub overall_score: f64,
    pub emotion_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub sentiment_intensity: BTreeMap<String, f64>,
    #[serde(default)]
    pub dominant_emotion: String,
    #[serde(default, alias = "total_comment_count")]
    pub total_comments: u64,
    #[serde(default)]
    pub unique_comment: Option<String>,
    #[serde(default)]
    pub model_confidence: Option<ModelConfidence>,
    #[serde(default, deserialize_with = "deserialize_wordcloud")]
    pub wordcloud: Vec<WordFrequency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Tone {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Tone::Positive,
            "neutral" => Tone::Neutral,
            "negative" => Tone::Negative,
            _ => Tone::Unknown,
        }
    }

    /// Thresholds used for per-review and per-word scores in [-1, 1].
    pub fn from_score(score: f64) -> Self {
        if score > 0.3 {
            Tone::Positive
        } else if score < -0.3 {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Positive => "Positive",
            Tone::Neutral => "Neutral",
            Tone::Negative => "Negative",
            Tone::Unknown => "Unknown",
        }
    }
}

impl SentimentBreakdown {
    pub fn tone(&self) -> Tone {
        Tone::from_label(&self.overall_sentiment)
    }

    /// Strength of the overall score as a percentage, ignoring direction.
    pub fn score_percent(&self) -> f64 {
        (self.overall_score.abs() * 100.0).clamp(0.0, 100.0)
    }

    pub fn peak_intensity(&self) -> f64 {
        self.sentiment_intensity
            .values()
            .copied()
            .fold(0.0_f64, f64::max)
    }

    /// Emotions ordered by probability, highest first.
    pub fn ranked_emotions(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .emotion_distribution
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    fn validate(&self) -> Result<(), String> {
        if self.emotion_distribution.is_empty() {
            return Err("emotion_distribution is empty".to_string());
        }
        for (name, value) in &self.emotion_distribution {
            if !value.is_finite() || *value < -PROBABILITY_SLACK || *value > 1.0 + PROBABILITY_SLACK
            {
                return Err(format!("emotion {name:?} has probability {value} outside [0, 1]"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overall,
    Post,
    Comments,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Overall => "Overall",
            Section::Post => "Post",
            Section::Comments => "Comments",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Section::Overall => Section::Post,
            Section::Post => Section::Comments,
            Section::Comments => Section::Overall,
        }
    }
}

/// Result of a social link analysis. YouTube returns a single breakdown;
/// Reddit and Twitter split it into post, comments and their combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Composite {
        post: SentimentBreakdown,
        comments: SentimentBreakdown,
        overall: SentimentBreakdown,
    },
    Flat(SentimentBreakdown),
}

impl AnalysisResult {
    /// Validates a backend payload against the two known shapes.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let Value::Object(map) = value else {
            return Err(ApiError::MalformedResponse(
                "analysis payload is not an object".to_string(),
            ));
        };

        let is_composite = ["post", "comments", "overall"]
            .iter()
            .all(|key| map.get(*key).is_some_and(Value::is_object));

        let result = if is_composite {
            let mut map = map;
            let mut take = |key: &str| -> Result<SentimentBreakdown, ApiError> {
                let section = map.remove(key).unwrap_or(Value::Null);
                serde_json::from_value(section)
                    .map_err(|err| ApiError::MalformedResponse(format!("{key}: {err}")))
            };
            AnalysisResult::Composite {
                post: take("post")?,
                comments: take("comments")?,
                overall: take("overall")?,
            }
        } else if map.contains_key("emotion_distribution") {
            let breakdown: SentimentBreakdown = serde_json::from_value(Value::Object(map))
                .map_err(|err| ApiError::MalformedResponse(err.to_string()))?;
            AnalysisResult::Flat(breakdown)
        } else {
            return Err(ApiError::MalformedResponse(
                "payload matches neither a flat nor a composite analysis".to_string(),
            ));
        };

        for (section, breakdown) in result.sections() {
            breakdown
                .validate()
                .map_err(|msg| ApiError::MalformedResponse(format!("{}: {msg}", section.label())))?;
        }
        Ok(result)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, AnalysisResult::Composite { .. })
    }

    pub fn overall(&self) -> &SentimentBreakdown {
        match self {
            AnalysisResult::Flat(breakdown) => breakdown,
            AnalysisResult::Composite { overall, .. } => overall,
        }
    }

    /// Falls back to the overall breakdown for flat results.
    pub fn section(&self, section: Section) -> &SentimentBreakdown {
        match (self, section) {
            (AnalysisResult::Composite { post, .. }, Section::Post) => post,
            (AnalysisResult::Composite { comments, .. }, Section::Comments) => comments,
            _ => self.overall(),
        }
    }

    pub fn sections(&self) -> Vec<(Section, &SentimentBreakdown)> {
        match self {
            AnalysisResult::Flat(breakdown) => vec![(Section::Overall, breakdown)],
            AnalysisResult::Composite {
                post,
                comments,
                overall,
            } => vec![
                (Section::Overall, overall),
                (Section::Post, post),
                (Section::Comments, comments),
            ],
        }
    }
}

/// A usable analysis plus the caveat the backend attached to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub notice: Option<String>,
}

pub fn is_soft_warning(message: &str) -> bool {
    message.to_ascii_lowercase().contains("random sample")
}

/// Interprets a 2xx analysis body. An `error` field mentioning a random
/// sample is a caveat; any other `error` is a hard failure.
pub fn interpret_payload(value: Value) -> Result<AnalysisOutcome, ApiError> {
    let mut value = value;
    let mut notice = None;

    if let Some(map) = value.as_object_mut() {
        if let Some(error) = map.remove("error") {
            let message = match error {
                Value::Null => None,
                Value::String(text) => Some(text),
                other => Some(other.to_string()),
            };
            if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
                if is_soft_warning(&message) {
                    notice = Some(message);
                } else {
                    return Err(ApiError::Backend(message));
                }
            }
        }
    }

    let result = AnalysisResult::from_value(value)?;
    Ok(AnalysisOutcome { result, notice })
}

/// Last social analysis kept across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub link: String,
    pub platform: Platform,
    pub result: AnalysisResult,
    #[serde(default)]
    pub notice: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WordcloudRepr {
    Map(BTreeMap<String, f64>),
    Entries(Vec<WordcloudEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WordcloudEntry {
    Pair(String, f64),
    Object {
        #[serde(alias = "word")]
        text: String,
        #[serde(alias = "count", alias = "size", alias = "frequency")]
        value: f64,
    },
}

fn deserialize_wordcloud<'de, D>(deserializer: D) -> Result<Vec<WordFrequency>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr: Option<WordcloudRepr> = Option::deserialize(deserializer)?;
    let mut words: Vec<WordFrequency> = match repr {
        None => Vec::new(),
        Some(WordcloudRepr::Map(map)) => map
            .into_iter()
            .map(|(text, value)| WordFrequency { text, value })
            .collect(),
        Some(WordcloudRepr::Entries(entries)) => entries
            .into_iter()
            .map(|entry| match entry {
                WordcloudEntry::Pair(text, value) => WordFrequency { text, value },
                WordcloudEntry::Object { text, value } => WordFrequency { text, value },
            })
            .collect(),
    };
    words.retain(|word| !word.text.trim().is_empty());
    words.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.text.cmp(&b.text)));
    Ok(words)
}

impl fmt::Display for SentimentBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:+.2}), dominant emotion {}, {} comments",
            Tone::from_label(&self.overall_sentiment).label(),
            self.overall_score,
            if self.dominant_emotion.is_empty() {
                "n/a"
            } else {
                self.dominant_emotion.as_str()
            },
            self.total_comments
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_json() -> Value {
        json!({
            "overall_sentiment": "positive",
            "overall_score": 0.62,
            "emotion_distribution": {"positive": 0.6, "neutral": 0.3, "negative": 0.1},
            "sentiment_intensity": {"positive": 0.8, "neutral": 0.2, "negative": 0.05},
            "dominant_emotion": "joy",
            "total_comments": 120,
            "unique_comment": "this slaps",
            "model_confidence": {"value": 0.91, "label": "high"},
            "wordcloud": {"great": 12.0, "meh": 3.0}
        })
    }

    #[test]
    fn parses_flat_payload() {
        let result = AnalysisResult::from_value(flat_json()).unwrap();
        let AnalysisResult::Flat(breakdown) = &result else {
            panic!("expected flat result");
        };
        assert_eq!(breakdown.tone(), Tone::Positive);
        assert_eq!(breakdown.total_comments, 120);
        assert_eq!(breakdown.wordcloud[0].text, "great");
        assert!((breakdown.peak_intensity() - 0.8).abs() < 1e-9);
        assert_eq!(breakdown.ranked_emotions()[0].0, "positive");
        assert_eq!(
            breakdown.model_confidence.as_ref().unwrap().display_label(),
            "High"
        );
    }

    #[test]
    fn parses_composite_payload_with_legacy_field_names() {
        let mut comments = flat_json();
        comments["total_comment_count"] = json!(40);
        comments.as_object_mut().unwrap().remove("total_comments");
        let payload = json!({
            "post": flat_json(),
            "comments": comments,
            "overall": flat_json(),
        });
        let result = AnalysisResult::from_value(payload).unwrap();
        assert!(result.is_composite());
        assert_eq!(result.section(Section::Comments).total_comments, 40);
        assert_eq!(result.sections().len(), 3);
    }

    #[test]
    fn rejects_unknown_shapes() {
        let err = AnalysisResult::from_value(json!({"hello": "world"})).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let err = AnalysisResult::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let mut bad = flat_json();
        bad["emotion_distribution"] = json!({"positive": 7.5});
        let err = AnalysisResult::from_value(bad).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn random_sample_error_is_a_notice() {
        let mut payload = flat_json();
        payload["error"] = json!("Used a Random Sample of 500 comments");
        let outcome = interpret_payload(payload).unwrap();
        assert_eq!(
            outcome.notice.as_deref(),
            Some("Used a Random Sample of 500 comments")
        );
        assert!(!outcome.result.is_composite());
    }

    #[test]
    fn other_error_fields_fail_hard() {
        let mut payload = flat_json();
        payload["error"] = json!("comments are disabled");
        let err = interpret_payload(payload).unwrap_err();
        assert_eq!(err, ApiError::Backend("comments are disabled".to_string()));
    }

    #[test]
    fn wordcloud_accepts_entry_lists() {
        let mut payload = flat_json();
        payload["wordcloud"] = json!([["alpha", 2.0], {"text": "beta", "value": 5.0}, {"word": "gamma", "count": 1}]);
        let AnalysisResult::Flat(breakdown) = AnalysisResult::from_value(payload).unwrap() else {
            panic!("expected flat result");
        };
        let words: Vec<&str> = breakdown.wordcloud.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn stored_analysis_survives_serialization() {
        let stored = StoredAnalysis {
            link: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            platform: Platform::YouTube,
            result: AnalysisResult::from_value(flat_json()).unwrap(),
            notice: None,
        };
        let text = serde_json::to_string(&stored).unwrap();
        let back: StoredAnalysis = serde_json::from_str(&text).unwrap();
        assert_eq!(back, stored);
    }
}
