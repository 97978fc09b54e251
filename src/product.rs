use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Tone;

/// Response of `POST /product-analysis/scrape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub sentiment_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub emotion_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sentiment_score: f64,
}

impl Review {
    pub fn tone(&self) -> Tone {
        Tone::from_score(self.sentiment_score)
    }

    /// Calendar date of the review when the backend sent a parseable one.
    pub fn display_date(&self) -> Option<String> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc).format("%Y-%m-%d").to_string());
        }
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(parsed.format("%Y-%m-%d").to_string());
        }
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub similarity_score: f64,
}

impl Recommendation {
    pub fn is_close_match(&self) -> bool {
        self.similarity_score > 0.7
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductView {
    #[default]
    Overview,
    Reviews,
    Recommendations,
}

impl ProductView {
    pub fn next(&self) -> Self {
        match self {
            ProductView::Overview => ProductView::Reviews,
            ProductView::Reviews => ProductView::Recommendations,
            ProductView::Recommendations => ProductView::Overview,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductView::Overview => "Overview",
            ProductView::Reviews => "Reviews",
            ProductView::Recommendations => "Recommendations",
        }
    }
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(value) => format!("${value:.2}"),
        None => "n/a".to_string(),
    }
}
