use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Tone;

pub const MIN_WORDS: usize = 3;

/// Response of `POST /text/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    /// 0 to 100.
    pub sentiment_score: f64,
    #[serde(default)]
    pub emotion_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub key_phrases: Vec<String>,
    #[serde(default)]
    pub word_sentiment_scores: BTreeMap<String, f64>,
}

impl TextAnalysis {
    pub fn score_percent(&self) -> f64 {
        self.sentiment_score.clamp(0.0, 100.0)
    }

    pub fn confidence_percent(&self) -> f64 {
        (self.confidence_score * 100.0).round().clamp(0.0, 100.0)
    }

    /// Emotions normalised to proportions, highest first.
    pub fn ranked_emotions(&self) -> Vec<(&str, f64)> {
        let total: f64 = self.emotion_scores.values().filter(|v| **v > 0.0).sum();
        let mut ranked: Vec<(&str, f64)> = self
            .emotion_scores
            .iter()
            .map(|(name, value)| {
                let share = if total > 0.0 { value.max(0.0) / total } else { 0.0 };
                (name.as_str(), share)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn words(&self, filter: WordFilter) -> Vec<(&str, f64)> {
        let mut words: Vec<(&str, f64)> = self
            .word_sentiment_scores
            .iter()
            .map(|(word, score)| (word.as_str(), *score))
            .filter(|(word, score)| !word.trim().is_empty() && filter.accepts(*score))
            .collect();
        words.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(b.0)));
        words
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordFilter {
    #[default]
    All,
    Positive,
    Neutral,
    Negative,
}

impl WordFilter {
    pub fn accepts(&self, score: f64) -> bool {
        match self {
            WordFilter::All => true,
            WordFilter::Positive => Tone::from_score(score) == Tone::Positive,
            WordFilter::Neutral => Tone::from_score(score) == Tone::Neutral,
            WordFilter::Negative => Tone::from_score(score) == Tone::Negative,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            WordFilter::All => WordFilter::Positive,
            WordFilter::Positive => WordFilter::Neutral,
            WordFilter::Neutral => WordFilter::Negative,
            WordFilter::Negative => WordFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WordFilter::All => "All Words",
            WordFilter::Positive => "Positive",
            WordFilter::Neutral => "Neutral",
            WordFilter::Negative => "Negative",
        }
    }
}

/// Returns the warning to show when `text` is too short to analyze.
pub fn validate_input(text: &str) -> Option<String> {
    let words = text.split_whitespace().count();
    if words < MIN_WORDS {
        Some(format!("Please enter at least {MIN_WORDS} words to analyze"))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceStyle {
    Technical,
    Storytelling,
    Formal,
    Casual,
    Academic,
    Poetic,
}

impl EnhanceStyle {
    pub const ALL: [EnhanceStyle; 6] = [
        EnhanceStyle::Technical,
        EnhanceStyle::Storytelling,
        EnhanceStyle::Formal,
        EnhanceStyle::Casual,
        EnhanceStyle::Academic,
        EnhanceStyle::Poetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnhanceStyle::Technical => "technical",
            EnhanceStyle::Storytelling => "storytelling",
            EnhanceStyle::Formal => "formal",
            EnhanceStyle::Casual => "casual",
            EnhanceStyle::Academic => "academic",
            EnhanceStyle::Poetic => "poetic",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnhanceStyle::Technical => "Technical",
            EnhanceStyle::Storytelling => "Storytelling",
            EnhanceStyle::Formal => "Formal",
            EnhanceStyle::Casual => "Casual",
            EnhanceStyle::Academic => "Academic",
            EnhanceStyle::Poetic => "Poetic",
        }
    }

    /// Cycles through the styles, starting from none selected.
    pub fn cycle(current: Option<EnhanceStyle>) -> Option<EnhanceStyle> {
        match current {
            None => Some(EnhanceStyle::ALL[0]),
            Some(style) => {
                let idx = EnhanceStyle::ALL
                    .iter()
                    .position(|s| *s == style)
                    .unwrap_or(0);
                EnhanceStyle::ALL.get(idx + 1).copied()
            }
        }
    }
}

/// Response of `POST /text/enhance`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancedText {
    #[serde(alias = "enhancedText")]
    pub enhanced_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Csv,
    /// HTML document saved with a `.doc` name so word processors open it.
    Doc,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "enhanced-text.txt",
            ExportFormat::Csv => "enhanced-text.csv",
            ExportFormat::Doc => "enhanced-text.doc",
        }
    }

    pub fn render(&self, original: &str, enhanced: &str) -> Result<String> {
        match self {
            ExportFormat::Txt => Ok(enhanced.to_string()),
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_writer(vec![]);
                writer.write_record(["Original Text", "Enhanced Text"])?;
                writer.write_record([original, enhanced])?;
                let bytes = writer.into_inner().context("export: flush csv")?;
                Ok(String::from_utf8(bytes)?)
            }
            ExportFormat::Doc => Ok(format!(
                "<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Enhanced Text</title>\n</head>\n<body>\n\
                 <h2>Original Text:</h2>\n<p>{}</p>\n<h2>Enhanced Text:</h2>\n<p>{}</p>\n</body>\n</html>\n",
                escape_html(original),
                escape_html(enhanced)
            )),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Writes the enhanced text into `dir` and returns the written path.
pub fn export(dir: &Path, format: ExportFormat, original: &str, enhanced: &str) -> Result<PathBuf> {
    anyhow::ensure!(!enhanced.trim().is_empty(), "export: nothing to export yet");
    let path = dir.join(format.file_name());
    let contents = format.render(original, enhanced)?;
    fs::write(&path, contents).with_context(|| format!("export: write {}", path.display()))?;
    Ok(path)
}

/// Reads a `.txt` or `.csv` file to use as the text input.
pub fn load_file(path: &Path) -> Result<String> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("csv"));
    anyhow::ensure!(supported, "Only .txt or .csv files can be loaded");
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> TextAnalysis {
        serde_json::from_str(
            r#"{"sentiment_score":76,"emotion_scores":{"joy":3,"anger":1},"confidence_score":0.824,
                "key_phrases":["sunny day"],"word_sentiment_scores":{"sunny":0.8,"rain":-0.6,"the":0.0}}"#,
        )
        .unwrap()
    }

    #[test]
    fn requires_three_words() {
        assert!(validate_input("").is_some());
        assert!(validate_input("two words").is_some());
        assert_eq!(validate_input("now three words"), None);
        assert_eq!(
            validate_input("  hi  ").as_deref(),
            Some("Please enter at least 3 words to analyze")
        );
    }

    #[test]
    fn emotions_normalise_to_shares() {
        let analysis = sample();
        let ranked = analysis.ranked_emotions();
        assert_eq!(ranked[0].0, "joy");
        assert!((ranked[0].1 - 0.75).abs() < 1e-9);
        assert_eq!(analysis.confidence_percent(), 82.0);
    }

    #[test]
    fn word_filter_thresholds() {
        let analysis = sample();
        let positive: Vec<&str> = analysis
            .words(WordFilter::Positive)
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(positive, vec!["sunny"]);
        let neutral: Vec<&str> = analysis
            .words(WordFilter::Neutral)
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(neutral, vec!["the"]);
        assert_eq!(analysis.words(WordFilter::All).len(), 3);
        assert_eq!(analysis.words(WordFilter::All)[0].0, "sunny");
    }

    #[test]
    fn style_cycle_ends_with_none() {
        let mut style = None;
        let mut seen = Vec::new();
        loop {
            style = EnhanceStyle::cycle(style);
            match style {
                Some(s) => seen.push(s),
                None => break,
            }
        }
        assert_eq!(seen, EnhanceStyle::ALL.to_vec());
    }

    #[test]
    fn enhanced_text_accepts_both_field_names() {
        let a: EnhancedText = serde_json::from_str(r#"{"enhanced_text":"x"}"#).unwrap();
        let b: EnhancedText = serde_json::from_str(r#"{"enhancedText":"y"}"#).unwrap();
        assert_eq!(a.enhanced_text, "x");
        assert_eq!(b.enhanced_text, "y");
    }

    #[test]
    fn csv_export_quotes_fields() {
        let dir = tempdir().unwrap();
        let path = export(dir.path(), ExportFormat::Csv, "say \"hi\"", "Greetings.").unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            written,
            "Original Text,Enhanced Text\n\"say \"\"hi\"\"\",Greetings.\n"
        );
        assert!(export(dir.path(), ExportFormat::Txt, "a", "  ").is_err());
    }

    #[test]
    fn csv_export_quotes_multiline_fields() {
        let rendered = ExportFormat::Csv
            .render("first line\nsecond, line", "One line.")
            .unwrap();
        assert_eq!(
            rendered,
            "Original Text,Enhanced Text\n\"first line\nsecond, line\",One line.\n"
        );
    }

    #[test]
    fn doc_export_is_escaped_html() {
        let dir = tempdir().unwrap();
        let path = export(dir.path(), ExportFormat::Doc, "a < b & c", "Clearly, a is smaller.").unwrap();
        assert_eq!(path.file_name().unwrap(), "enhanced-text.doc");
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("<html>"));
        assert!(written.contains("<h2>Original Text:</h2>\n<p>a &lt; b &amp; c</p>"));
        assert!(written.contains("<h2>Enhanced Text:</h2>\n<p>Clearly, a is smaller.</p>"));
    }

    #[test]
    fn load_file_accepts_text_and_csv_only() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.TXT");
        std::fs::write(&notes, "the weather is lovely today").unwrap();
        assert_eq!(load_file(&notes).unwrap(), "the weather is lovely today");

        let other = dir.path().join("notes.md");
        std::fs::write(&other, "# heading").unwrap();
        let err = load_file(&other).unwrap_err();
        assert_eq!(err.to_string(), "Only .txt or .csv files can be loaded");

        let missing = load_file(&dir.path().join("missing.csv")).unwrap_err();
        assert!(missing.to_string().starts_with("read "));
    }
}
