use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::ApiError;
use crate::data::EmbedService;
use crate::link::{self, Platform};

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid script regex")
});
static BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</p>|</blockquote>|</div>").expect("valid break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid src regex"));
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#).expect("valid href regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex"));

/// Preview for the link the user typed, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedResult {
    Html {
        html: String,
        platform: Platform,
        link: String,
    },
    Error {
        message: String,
        link: String,
    },
}

impl EmbedResult {
    pub fn link(&self) -> &str {
        match self {
            EmbedResult::Html { link, .. } | EmbedResult::Error { link, .. } => link,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, EmbedResult::Html { .. })
    }

    fn error(err: ApiError, link: &str) -> Self {
        EmbedResult::Error {
            message: err.to_string(),
            link: link.to_string(),
        }
    }
}

pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

pub fn youtube_iframe(video_id: &str) -> String {
    format!(
        "<iframe width=\"560\" height=\"315\" src=\"{}\" frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" allowfullscreen></iframe>",
        youtube_embed_url(video_id)
    )
}

/// Produces the preview for `link`. YouTube is built locally; Twitter and
/// Reddit go through the backend proxy. Failures come back as
/// `EmbedResult::Error`, never as `Err`.
pub fn resolve(service: &dyn EmbedService, platform: Option<Platform>, link: &str) -> EmbedResult {
    let link = link.trim();
    let Some(platform) = platform else {
        return EmbedResult::error(ApiError::InvalidLink { platform: None }, link);
    };

    let outcome = match platform {
        Platform::YouTube => match link::youtube_video_id(link) {
            Some(id) => Ok(youtube_iframe(&id)),
            None => Err(ApiError::InvalidLink {
                platform: Some(platform),
            }),
        },
        Platform::Twitter | Platform::Reddit => service.embed_html(platform, link),
    };

    match outcome {
        Ok(html) => EmbedResult::Html {
            html,
            platform,
            link: link.to_string(),
        },
        Err(err) => {
            tracing::debug!(platform = platform.as_str(), error = %err, "embed resolution failed");
            EmbedResult::error(err, link)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetScript {
    pub id: &'static str,
    pub src: &'static str,
}

pub fn widget_script(platform: Platform) -> Option<WidgetScript> {
    match platform {
        Platform::Twitter => Some(WidgetScript {
            id: "twitter-wjs",
            src: "https://platform.twitter.com/widgets.js",
        }),
        Platform::Reddit => Some(WidgetScript {
            id: "reddit-widgets-js",
            src: "https://embed.reddit.com/widgets.js",
        }),
        Platform::YouTube => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetLoad {
    Injected(WidgetScript),
    Rerendered(WidgetScript),
}

/// Platform widget bootstraps loaded during this session, keyed by script id.
#[derive(Debug, Default)]
pub struct Widgets {
    loaded: HashSet<&'static str>,
    renders: HashMap<&'static str, u32>,
}

impl Widgets {
    /// Injects the platform bootstrap the first time, re-renders afterwards.
    pub fn ensure(&mut self, platform: Platform) -> Option<WidgetLoad> {
        let script = widget_script(platform)?;
        *self.renders.entry(script.id).or_insert(0) += 1;
        if self.loaded.insert(script.id) {
            tracing::debug!(id = script.id, src = script.src, "widget bootstrap injected");
            Some(WidgetLoad::Injected(script))
        } else {
            tracing::trace!(id = script.id, "widget re-render requested");
            Some(WidgetLoad::Rerendered(script))
        }
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.contains(id)
    }

    pub fn render_count(&self, id: &str) -> u32 {
        self.renders.get(id).copied().unwrap_or(0)
    }
}

/// Terminal rendition of an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub title: String,
    pub body: String,
    pub source: Option<String>,
}

pub fn preview(result: &EmbedResult) -> Preview {
    match result {
        EmbedResult::Error { message, link } => Preview {
            title: "Preview unavailable".to_string(),
            body: message.clone(),
            source: Some(link.clone()).filter(|l| !l.is_empty()),
        },
        EmbedResult::Html {
            html,
            platform,
            link,
        } => {
            let markup = SCRIPT_RE.replace_all(html, "");
            let source = SRC_RE
                .captures(&markup)
                .or_else(|| HREF_RE.captures(&markup))
                .and_then(|caps| caps.get(1))
                .map(|m| decode_entities(m.as_str()))
                .or_else(|| Some(link.clone()));
            let mut body = html_to_text(html);
            if body.is_empty() {
                body = match platform {
                    Platform::YouTube => match link::youtube_video_id(link) {
                        Some(id) => format!("YouTube video {id}"),
                        None => "YouTube video".to_string(),
                    },
                    _ => link.clone(),
                };
            }
            Preview {
                title: format!("{} preview", platform.display_name()),
                body,
                source,
            }
        }
    }
}

pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let with_breaks = BREAK_RE.replace_all(&without_scripts, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    let mut lines: Vec<String> = decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.dedup_by(|a, b| a.is_empty() && b.is_empty());
    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                "mdash" => Some('\u{2014}'),
                "ndash" => Some('\u{2013}'),
                "hellip" => Some('\u{2026}'),
                _ => {
                    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                }
            };
            decoded
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
