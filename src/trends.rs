use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response of `GET /social-media/trends/keyword/{kw}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordTrends {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub total_mentions: u64,
    #[serde(default)]
    pub average_sentiment: f64,
    #[serde(default, alias = "trend", alias = "timeline")]
    pub sentiment_over_time: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub sentiment: f64,
    #[serde(default)]
    pub mentions: u64,
}

impl KeywordTrends {
    pub fn mention_series(&self) -> Vec<u64> {
        self.sentiment_over_time.iter().map(|p| p.mentions).collect()
    }

    pub fn peak(&self) -> Option<&TrendPoint> {
        self.sentiment_over_time.iter().max_by_key(|p| p.mentions)
    }
}

/// Response of `GET /social-media/platform-comparison/{kw}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlatformComparison {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformStats>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlatformStats {
    #[serde(default)]
    pub mentions: u64,
    #[serde(default)]
    pub average_sentiment: f64,
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub negative: f64,
}

impl PlatformComparison {
    /// Platforms ordered by mention count, busiest first.
    pub fn ranked(&self) -> Vec<(&str, &PlatformStats)> {
        let mut ranked: Vec<(&str, &PlatformStats)> = self
            .platforms
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
            .collect();
        ranked.sort_by(|a, b| b.1.mentions.cmp(&a.1.mentions).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
