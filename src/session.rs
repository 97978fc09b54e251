use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::analysis::StoredAnalysis;
use crate::config::{ChartKind, Theme};
use crate::storage;
use crate::text::TextAnalysis;

pub const THEME_KEY: &str = "theme";
pub const CHART_KEY: &str = "chart";
pub const TEXT_INPUT_KEY: &str = "text_input";
pub const TEXT_ANALYSIS_KEY: &str = "text_analysis";
pub const ENHANCED_TEXT_KEY: &str = "enhanced_text";
pub const SOCIAL_ANALYSIS_KEY: &str = "social_analysis";

/// Keys forgotten by [`State::clear_all`]. Display preferences survive.
pub const RESULT_KEYS: [&str; 4] = [
    TEXT_INPUT_KEY,
    TEXT_ANALYSIS_KEY,
    ENHANCED_TEXT_KEY,
    SOCIAL_ANALYSIS_KEY,
];

/// Application state that outlives a single run: display preferences and
/// the most recent results of each tab. Every setter writes through to the store.
pub struct State {
    store: Arc<storage::Store>,
    theme: Theme,
    chart: ChartKind,
    text_input: String,
    text_analysis: Option<TextAnalysis>,
    enhanced_text: Option<String>,
    social_analysis: Option<StoredAnalysis>,
}

impl State {
    /// Loads whatever the store holds. Entries that no longer decode are
    /// dropped from the store instead of failing startup.
    pub fn hydrate(
        store: Arc<storage::Store>,
        default_theme: Theme,
        default_chart: ChartKind,
    ) -> Result<Self> {
        let theme = read_or_discard(&store, THEME_KEY)?.unwrap_or(default_theme);
        let chart = read_or_discard(&store, CHART_KEY)?.unwrap_or(default_chart);
        let text_input = read_or_discard(&store, TEXT_INPUT_KEY)?.unwrap_or_default();
        let text_analysis = read_or_discard(&store, TEXT_ANALYSIS_KEY)?;
        let enhanced_text = read_or_discard(&store, ENHANCED_TEXT_KEY)?;
        let social_analysis = read_or_discard(&store, SOCIAL_ANALYSIS_KEY)?;

        Ok(Self {
            store,
            theme,
            chart,
            text_input,
            text_analysis,
            enhanced_text,
            social_analysis,
        })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        self.store.put_json(THEME_KEY, &theme)
    }

    pub fn chart(&self) -> ChartKind {
        self.chart
    }

    pub fn set_chart(&mut self, chart: ChartKind) -> Result<()> {
        self.chart = chart;
        self.store.put_json(CHART_KEY, &chart)
    }

    pub fn text_input(&self) -> &str {
        &self.text_input
    }

    pub fn set_text_input(&mut self, text: &str) -> Result<()> {
        self.text_input = text.to_string();
        self.store.put_json(TEXT_INPUT_KEY, text)
    }

    pub fn text_analysis(&self) -> Option<&TextAnalysis> {
        self.text_analysis.as_ref()
    }

    pub fn set_text_analysis(&mut self, analysis: Option<TextAnalysis>) -> Result<()> {
        self.text_analysis = analysis;
        write_optional(&self.store, TEXT_ANALYSIS_KEY, self.text_analysis.as_ref())
    }

    pub fn enhanced_text(&self) -> Option<&str> {
        self.enhanced_text.as_deref()
    }

    pub fn set_enhanced_text(&mut self, text: Option<String>) -> Result<()> {
        self.enhanced_text = text;
        write_optional(&self.store, ENHANCED_TEXT_KEY, self.enhanced_text.as_ref())
    }

    pub fn social_analysis(&self) -> Option<&StoredAnalysis> {
        self.social_analysis.as_ref()
    }

    pub fn set_social_analysis(&mut self, analysis: Option<StoredAnalysis>) -> Result<()> {
        self.social_analysis = analysis;
        write_optional(
            &self.store,
            SOCIAL_ANALYSIS_KEY,
            self.social_analysis.as_ref(),
        )
    }

    /// Forgets every saved result. Theme and chart preferences stay.
    pub fn clear_all(&mut self) -> Result<()> {
        self.text_input.clear();
        self.text_analysis = None;
        self.enhanced_text = None;
        self.social_analysis = None;
        let removed = self.store.remove_many(&RESULT_KEYS)?;
        tracing::info!(removed, "session state cleared");
        Ok(())
    }

    pub fn teardown(mut self, clear_on_exit: bool) -> Result<()> {
        if clear_on_exit {
            self.clear_all()?;
        }
        Ok(())
    }
}

fn read_or_discard<T: DeserializeOwned>(store: &storage::Store, key: &str) -> Result<Option<T>> {
    match store.get_json(key) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(key, error = %format!("{err:#}"), "discarding unreadable session entry");
            store.remove(key)?;
            Ok(None)
        }
    }
}

fn write_optional<T: Serialize>(store: &storage::Store, key: &str, value: Option<&T>) -> Result<()> {
    match value {
        Some(value) => store.put_json(key, value),
        None => store.remove(key).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::link::Platform;
    use serde_json::json;
    use tempfile::tempdir;

    fn store(dir: &tempfile::TempDir) -> Arc<storage::Store> {
        Arc::new(
            storage::Store::open(storage::Options {
                path: Some(dir.path().join("state.db")),
            })
            .unwrap(),
        )
    }

    fn stored_analysis() -> StoredAnalysis {
        StoredAnalysis {
            link: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            platform: Platform::YouTube,
            result: AnalysisResult::from_value(json!({
                "overall_sentiment": "neutral",
                "overall_score": 0.0,
                "emotion_distribution": {"joy": 0.5, "sadness": 0.5}
            }))
            .unwrap(),
            notice: None,
        }
    }

    #[test]
    fn hydrate_restores_previous_run() {
        let dir = tempdir().unwrap();
        {
            let mut state = State::hydrate(store(&dir), Theme::Dark, ChartKind::Bar).unwrap();
            state.set_theme(Theme::Light).unwrap();
            state.set_text_input("this is lovely").unwrap();
            state.set_enhanced_text(Some("This is delightful.".into())).unwrap();
            state.set_social_analysis(Some(stored_analysis())).unwrap();
            state.teardown(false).unwrap();
        }
        let state = State::hydrate(store(&dir), Theme::Dark, ChartKind::Bar).unwrap();
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(state.text_input(), "this is lovely");
        assert_eq!(state.enhanced_text(), Some("This is delightful."));
        assert_eq!(state.social_analysis(), Some(&stored_analysis()));
        assert!(state.text_analysis().is_none());
    }

    #[test]
    fn corrupt_entries_are_discarded() {
        let dir = tempdir().unwrap();
        let shared = store(&dir);
        shared.put(SOCIAL_ANALYSIS_KEY, "{\"link\": 5").unwrap();
        shared.put(THEME_KEY, "\"sepia\"").unwrap();
        let state = State::hydrate(shared.clone(), Theme::Light, ChartKind::Bar).unwrap();
        assert!(state.social_analysis().is_none());
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(shared.get(SOCIAL_ANALYSIS_KEY).unwrap(), None);
    }

    #[test]
    fn teardown_clears_when_configured() {
        let dir = tempdir().unwrap();
        let shared = store(&dir);
        let mut state = State::hydrate(shared.clone(), Theme::Dark, ChartKind::Bar).unwrap();
        state.set_text_input("three words here").unwrap();
        state.set_social_analysis(Some(stored_analysis())).unwrap();
        state.teardown(true).unwrap();
        for key in RESULT_KEYS {
            assert_eq!(shared.get(key).unwrap(), None, "{key} should be gone");
        }
    }

    #[test]
    fn clearing_an_analysis_removes_the_key() {
        let dir = tempdir().unwrap();
        let shared = store(&dir);
        let mut state = State::hydrate(shared.clone(), Theme::Dark, ChartKind::Bar).unwrap();
        state.set_social_analysis(Some(stored_analysis())).unwrap();
        state.set_social_analysis(None).unwrap();
        assert_eq!(shared.get(SOCIAL_ANALYSIS_KEY).unwrap(), None);
    }

    #[test]
    fn clear_all_keeps_display_preferences() {
        let dir = tempdir().unwrap();
        {
            let mut state = State::hydrate(store(&dir), Theme::Dark, ChartKind::Bar).unwrap();
            state.set_theme(Theme::Light).unwrap();
            state.set_chart(ChartKind::Strip).unwrap();
            state.set_text_input("keep nothing else").unwrap();
            state.clear_all().unwrap();
            assert_eq!(state.theme(), Theme::Light);
            assert_eq!(state.text_input(), "");
        }
        let state = State::hydrate(store(&dir), Theme::Dark, ChartKind::Bar).unwrap();
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(state.chart(), ChartKind::Strip);
        assert_eq!(state.text_input(), "");
    }
}
