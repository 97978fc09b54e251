use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;

use crate::analysis::StoredAnalysis;
use crate::api::{self, ApiError};
use crate::config::{self, Config};
use crate::data::Services;
use crate::link;
use crate::logging;
use crate::session;
use crate::social::Timing;
use crate::storage;
use crate::ui;

pub fn run() -> Result<()> {
    let (cfg, _log_guard) = load_config()?;
    let display_path = friendly_path(config::default_path().as_ref());
    let state = open_state(&cfg)?;
    let client = Arc::new(build_client(&cfg)?);
    tracing::info!(base_url = %client.base_url(), "starting terminal UI");

    let status = if state.social_analysis().is_some() {
        "Restored your last analysis. Press r to refresh it, x to clear.".to_string()
    } else {
        format!("Press i to paste a link, Tab to switch views. Config: {display_path}")
    };
    let options = ui::Options {
        status_message: status,
        services: Services::backend(client),
        state,
        timing: Timing {
            debounce: cfg.timing.debounce,
            min_progress: cfg.timing.min_progress,
        },
        toast_duration: cfg.ui.toast_duration,
        export_dir: std::env::current_dir().context("resolve working directory")?,
    };

    let mut model = ui::Model::new(options);
    let outcome = model.run();
    let teardown = model.into_state().teardown(cfg.session.clear_on_exit);
    outcome?;
    teardown.context("tear down session state")
}

/// Forgets everything saved by previous runs.
pub fn reset() -> Result<()> {
    let (cfg, _log_guard) = load_config()?;
    let mut state = open_state(&cfg)?;
    state.clear_all()
}

/// Analyzes one link without starting the UI. Logging stays active until the
/// returned guard is dropped.
pub fn analyze(raw: &str) -> Result<(StoredAnalysis, Option<WorkerGuard>)> {
    let link = raw.trim();
    let platform = link::classify(link).ok_or(ApiError::InvalidLink { platform: None })?;
    let (cfg, log_guard) = load_config()?;
    let client = build_client(&cfg)?;
    let outcome = client.analyze_link(platform, link)?;
    let stored = StoredAnalysis {
        link: link.to_string(),
        platform,
        result: outcome.result,
        notice: outcome.notice,
    };
    Ok((stored, log_guard))
}

/// Plain-text report of an analysis, one line per section.
pub fn summary(stored: &StoredAnalysis) -> String {
    let mut out = format!("{} · {}\n", stored.platform.display_name(), stored.link);
    for (section, breakdown) in stored.result.sections() {
        out.push_str(&format!("  {:<9} {}\n", section.label(), breakdown));
    }
    if let Some(notice) = &stored.notice {
        out.push_str(&format!("Note: {notice}\n"));
    }
    out
}

fn load_config() -> Result<(Config, Option<WorkerGuard>)> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let guard = logging::init(&cfg.log).context("initialise logging")?;
    Ok((cfg, guard))
}

fn open_state(cfg: &Config) -> Result<session::State> {
    let store =
        Arc::new(storage::Store::open(storage::Options::default()).context("open storage")?);
    session::State::hydrate(store, cfg.ui.theme, cfg.ui.chart).context("load session state")
}

fn build_client(cfg: &Config) -> Result<api::Client> {
    api::Client::new(api::ClientConfig {
        base_url: Some(cfg.api.base_url.clone()),
        user_agent: cfg.api.user_agent.clone(),
        timeout: Some(cfg.api.timeout),
        http_client: None,
    })
    .context("create api client")
}

fn friendly_path(path: Option<&PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/vibecheck/config.yaml".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::link::Platform;
    use serde_json::json;

    #[test]
    fn summary_lists_every_section() {
        let breakdown = json!({
            "overall_sentiment": "negative",
            "overall_score": -0.4,
            "emotion_distribution": {"anger": 0.8, "joy": 0.2},
            "dominant_emotion": "anger",
            "total_comments": 9
        });
        let stored = StoredAnalysis {
            link: "https://www.reddit.com/r/rust/comments/abc123/title/".to_string(),
            platform: Platform::Reddit,
            result: AnalysisResult::from_value(json!({
                "post": breakdown,
                "comments": breakdown,
                "overall": breakdown,
            }))
            .unwrap(),
            notice: Some("used a random sample of comments".to_string()),
        };
        let text = summary(&stored);
        assert!(text.starts_with("Reddit · https://www.reddit.com/r/rust/"));
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("Negative (-0.40), dominant emotion anger, 9 comments"));
        assert!(text.ends_with("Note: used a random sample of comments\n"));
    }

    #[test]
    fn friendly_path_shortens_home() {
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".config").join("vibecheck").join("config.yaml");
            assert_eq!(friendly_path(Some(&path)), "~/.config/vibecheck/config.yaml");
        }
        assert_eq!(friendly_path(None), "~/.config/vibecheck/config.yaml");
    }

    #[test]
    fn analyze_rejects_unsupported_links() {
        let err = analyze("https://example.com/not-social").err().unwrap();
        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError::InvalidLink { platform: None })
        );
    }
}
