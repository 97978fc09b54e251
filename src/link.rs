use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TWITTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:twitter\.com|x\.com)/([A-Za-z0-9_]+)/status/(\d+)")
        .expect("valid twitter link regex")
});

static REDDIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://www\.reddit\.com/r/([A-Za-z0-9_]+)/comments/([A-Za-z0-9]+)")
        .expect("valid reddit link regex")
});

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?v=|embed/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid youtube link regex")
});

static STATUS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"status/(\d+)").expect("valid status id regex"));

static COMMENTS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"comments/([A-Za-z0-9]+)").expect("valid comments id regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Twitter, Platform::Reddit, Platform::YouTube];

    /// Path segment used by the backend (`/embed/{platform}`, `/analyze/{platform}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::YouTube => "youtube",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter",
            Platform::Reddit => "Reddit",
            Platform::YouTube => "YouTube",
        }
    }

    /// Platforms whose preview comes from the backend oEmbed proxy.
    pub fn uses_remote_embed(&self) -> bool {
        matches!(self, Platform::Twitter | Platform::Reddit)
    }
}

/// Maps a raw link to the platform it points at. Twitter wins over Reddit,
/// Reddit over YouTube.
pub fn classify(raw: &str) -> Option<Platform> {
    let link = raw.trim();
    if link.is_empty() {
        return None;
    }
    if TWITTER_RE.is_match(link) {
        return Some(Platform::Twitter);
    }
    if REDDIT_RE.is_match(link) {
        return Some(Platform::Reddit);
    }
    if YOUTUBE_RE.is_match(link) {
        return Some(Platform::YouTube);
    }
    None
}

pub fn youtube_video_id(link: &str) -> Option<String> {
    YOUTUBE_RE
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn twitter_status_id(link: &str) -> Option<String> {
    STATUS_ID_RE
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn reddit_post_id(link: &str) -> Option<String> {
    COMMENTS_ID_RE
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn reddit_subreddit(link: &str) -> Option<String> {
    REDDIT_RE
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Id the analysis endpoint for `platform` expects, if the link carries one.
pub fn analysis_id(platform: Platform, link: &str) -> Option<String> {
    match platform {
        Platform::YouTube => youtube_video_id(link),
        Platform::Twitter => twitter_status_id(link),
        Platform::Reddit => reddit_post_id(link),
    }
}

/// What the user typed plus the platform we believe it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkState {
    raw_input: String,
    detected: Option<Platform>,
    user_overridden: bool,
}

impl LinkState {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.set_input(raw);
        state
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn link(&self) -> &str {
        self.raw_input.trim()
    }

    pub fn detected(&self) -> Option<Platform> {
        self.detected
    }

    pub fn is_user_overridden(&self) -> bool {
        self.user_overridden
    }

    pub fn set_input(&mut self, raw: impl Into<String>) {
        self.raw_input = raw.into();
        if !self.user_overridden {
            self.detected = classify(&self.raw_input);
        }
    }

    /// Pins the platform. `None` hands control back to the classifier.
    pub fn override_platform(&mut self, platform: Option<Platform>) {
        match platform {
            Some(platform) => {
                self.detected = Some(platform);
                self.user_overridden = true;
            }
            None => {
                self.user_overridden = false;
                self.detected = classify(&self.raw_input);
            }
        }
    }

    /// Auto → Twitter → Reddit → YouTube → auto.
    pub fn cycle_override(&mut self) {
        let next = if !self.user_overridden {
            Some(Platform::Twitter)
        } else {
            match self.detected {
                Some(Platform::Twitter) => Some(Platform::Reddit),
                Some(Platform::Reddit) => Some(Platform::YouTube),
                _ => None,
            }
        };
        self.override_platform(next);
    }

    pub fn is_analyzable(&self) -> bool {
        self.detected.is_some() && !self.link().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_twitter_and_x_links() {
        assert_eq!(
            classify("https://twitter.com/rustlang/status/1790000000000000000"),
            Some(Platform::Twitter)
        );
        assert_eq!(
            classify("http://x.com/some_user/status/42"),
            Some(Platform::Twitter)
        );
    }

    #[test]
    fn classifies_reddit_links() {
        assert_eq!(
            classify("https://www.reddit.com/r/rust/comments/1ctt6b6/some_title/"),
            Some(Platform::Reddit)
        );
        assert_eq!(
            classify("https://www.reddit.com/r/rust/comments/abc123"),
            Some(Platform::Reddit)
        );
    }

    #[test]
    fn classifies_every_youtube_form() {
        for link in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
        ] {
            assert_eq!(classify(link), Some(Platform::YouTube), "{link}");
            assert_eq!(youtube_video_id(link).as_deref(), Some("dQw4w9WgXcQ"));
        }
    }

    #[test]
    fn unmatched_input_is_none() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
        assert_eq!(classify("hello world"), None);
        assert_eq!(classify("https://twitter.com/rustlang"), None);
        assert_eq!(classify("https://reddit.com/r/rust/comments/abc"), None);
        assert_eq!(classify("https://youtu.be/short"), None);
        assert_eq!(classify("https://example.com/status/123"), None);
    }

    #[test]
    fn extracts_ids() {
        assert_eq!(
            twitter_status_id("https://x.com/a/status/12345?s=20").as_deref(),
            Some("12345")
        );
        assert_eq!(
            reddit_post_id("https://www.reddit.com/r/rust/comments/1ctt6b6/title/").as_deref(),
            Some("1ctt6b6")
        );
        assert_eq!(
            reddit_subreddit("https://www.reddit.com/r/rust/comments/1ctt6b6/title/").as_deref(),
            Some("rust")
        );
        assert_eq!(analysis_id(Platform::Twitter, "https://x.com/a"), None);
    }

    #[test]
    fn link_state_reclassifies_unless_overridden() {
        let mut state = LinkState::new("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(state.detected(), Some(Platform::YouTube));

        state.set_input("nonsense");
        assert_eq!(state.detected(), None);
        assert!(!state.is_analyzable());

        state.override_platform(Some(Platform::Reddit));
        state.set_input("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(state.detected(), Some(Platform::Reddit));
        assert!(state.is_user_overridden());

        state.override_platform(None);
        assert_eq!(state.detected(), Some(Platform::YouTube));
    }

    #[test]
    fn cycle_override_wraps_back_to_auto() {
        let mut state = LinkState::new("https://youtu.be/dQw4w9WgXcQ");
        state.cycle_override();
        assert_eq!(state.detected(), Some(Platform::Twitter));
        state.cycle_override();
        assert_eq!(state.detected(), Some(Platform::Reddit));
        state.cycle_override();
        assert_eq!(state.detected(), Some(Platform::YouTube));
        assert!(state.is_user_overridden());
        state.cycle_override();
        assert!(!state.is_user_overridden());
        assert_eq!(state.detected(), Some(Platform::YouTube));
    }
}
