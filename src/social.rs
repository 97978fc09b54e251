use std::time::{Duration, Instant};

use crate::analysis::{AnalysisOutcome, Section, StoredAnalysis};
use crate::api::ApiError;
use crate::debounce::{self, Debouncer};
use crate::embed::{EmbedResult, WidgetLoad, Widgets};
use crate::link::{self, LinkState, Platform};
use crate::progress::{self, Gated};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    PendingEmbed,
    EmbedReady,
    EmbedError,
    Analyzing,
    AnalysisReady,
    AnalysisError,
}

impl Lifecycle {
    pub fn is_loading(&self) -> bool {
        matches!(self, Lifecycle::PendingEmbed | Lifecycle::Analyzing)
    }
}

/// Work the page asks its host to carry out. Results come back through
/// [`SocialPage::apply_embed`] and [`SocialPage::apply_analysis`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveEmbed {
        generation: u64,
        platform: Option<Platform>,
        link: String,
    },
    Analyze {
        request_id: u64,
        platform: Platform,
        link: String,
    },
    LoadWidget(WidgetLoad),
    SaveAnalysis(StoredAnalysis),
    ClearAnalysis,
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Enter a Twitter, Reddit or YouTube link first.")]
    NoLink,
    #[error("Wait for the preview to load before analyzing.")]
    EmbedNotReady,
    #[error("An analysis is already running.")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Welcome,
    Loading { label: &'static str, percent: f64 },
    Error(&'a str),
    Preview(&'a EmbedResult),
    Dashboard(&'a StoredAnalysis),
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub debounce: Duration,
    pub min_progress: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: debounce::DEFAULT_DELAY,
            min_progress: progress::DEFAULT_MIN_DISPLAY,
        }
    }
}

/// Orchestrates the social tab: link input, debounced preview resolution,
/// the analyze request and what is on screen.
#[derive(Debug)]
pub struct SocialPage {
    link: LinkState,
    lifecycle: Lifecycle,
    debouncer: Debouncer<String>,
    min_progress: Duration,
    pending_embed: Option<Gated<EmbedResult>>,
    pending_analysis: Option<Gated<Result<AnalysisOutcome, ApiError>>>,
    analyzing_link: Option<(Platform, String)>,
    embed: Option<EmbedResult>,
    analysis: Option<StoredAnalysis>,
    error: Option<String>,
    widgets: Widgets,
    section: Section,
    next_request: u64,
}

impl Default for SocialPage {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl SocialPage {
    pub fn new(timing: Timing) -> Self {
        Self {
            link: LinkState::default(),
            lifecycle: Lifecycle::Idle,
            debouncer: Debouncer::new(timing.debounce),
            min_progress: timing.min_progress,
            pending_embed: None,
            pending_analysis: None,
            analyzing_link: None,
            embed: None,
            analysis: None,
            error: None,
            widgets: Widgets::default(),
            section: Section::Overall,
            next_request: 0,
        }
    }

    pub fn link(&self) -> &LinkState {
        &self.link
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn embed(&self) -> Option<&EmbedResult> {
        self.embed.as_ref()
    }

    pub fn analysis(&self) -> Option<&StoredAnalysis> {
        self.analysis.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn widgets(&self) -> &Widgets {
        &self.widgets
    }

    pub fn cycle_section(&mut self) {
        let composite = self
            .analysis
            .as_ref()
            .is_some_and(|stored| stored.result.is_composite());
        self.section = if composite {
            self.section.next()
        } else {
            Section::Overall
        };
    }

    /// Handles an edit of the link field.
    pub fn set_input(&mut self, raw: &str, now: Instant) -> Vec<Effect> {
        if raw == self.link.raw_input() {
            return Vec::new();
        }
        self.link.set_input(raw);
        self.reschedule(now)
    }

    /// Cycles the platform override and resolves the preview again.
    pub fn cycle_override(&mut self, now: Instant) -> Vec<Effect> {
        self.link.cycle_override();
        self.reschedule(now)
    }

    fn reschedule(&mut self, now: Instant) -> Vec<Effect> {
        let effects = self.drop_results();
        if self.link.link().is_empty() {
            self.debouncer.cancel();
            self.lifecycle = Lifecycle::Idle;
            return effects;
        }
        let generation = self
            .debouncer
            .schedule(self.link.link().to_string(), now);
        tracing::trace!(generation, "embed resolution scheduled");
        self.lifecycle = Lifecycle::PendingEmbed;
        effects
    }

    /// Forgets the preview, error and analysis belonging to the previous input.
    fn drop_results(&mut self) -> Vec<Effect> {
        self.embed = None;
        self.error = None;
        self.pending_embed = None;
        self.pending_analysis = None;
        self.analyzing_link = None;
        self.section = Section::Overall;
        if self.analysis.take().is_some() {
            vec![Effect::ClearAnalysis]
        } else {
            Vec::new()
        }
    }

    /// Resolves the preview for the current input right away.
    pub fn refresh(&mut self, now: Instant) -> Vec<Effect> {
        if self.link.link().is_empty() || self.lifecycle == Lifecycle::Analyzing {
            return Vec::new();
        }
        self.embed = None;
        self.error = None;
        let fired = self.debouncer.trigger(self.link.link().to_string());
        self.lifecycle = Lifecycle::PendingEmbed;
        vec![self.start_resolution(fired.generation, fired.value, now)]
    }

    fn start_resolution(&mut self, generation: u64, link: String, now: Instant) -> Effect {
        self.pending_embed = Some(Gated::new(generation, now, self.min_progress));
        tracing::debug!(generation, link = %link, "resolving embed");
        Effect::ResolveEmbed {
            generation,
            platform: self.link.detected(),
            link,
        }
    }

    /// Advances timers: fires the debounce and releases gated outcomes.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(fired) = self.debouncer.poll(now) {
            effects.push(self.start_resolution(fired.generation, fired.value, now));
        }

        if let Some(result) = self.pending_embed.as_mut().and_then(|g| g.take_if_ready(now)) {
            self.pending_embed = None;
            effects.extend(self.finish_embed(result));
        }

        if let Some(outcome) = self
            .pending_analysis
            .as_mut()
            .and_then(|g| g.take_if_ready(now))
        {
            self.pending_analysis = None;
            effects.extend(self.finish_analysis(outcome));
        }

        effects
    }

    /// Records a finished resolution. Returns false when it was stale.
    pub fn apply_embed(
        &mut self,
        generation: u64,
        link: &str,
        result: EmbedResult,
        now: Instant,
    ) -> bool {
        if !self.debouncer.accepts(generation) || link != self.link.link() {
            tracing::debug!(generation, "dropping stale embed");
            return false;
        }
        match self.pending_embed.as_mut() {
            Some(gated) => gated.accept(generation, result, now),
            None => false,
        }
    }

    fn finish_embed(&mut self, result: EmbedResult) -> Vec<Effect> {
        let mut effects = Vec::new();
        match &result {
            EmbedResult::Html { platform, .. } => {
                self.lifecycle = Lifecycle::EmbedReady;
                if let Some(load) = self.widgets.ensure(*platform) {
                    effects.push(Effect::LoadWidget(load));
                }
            }
            EmbedResult::Error { message, .. } => {
                self.lifecycle = Lifecycle::EmbedError;
                self.error = Some(message.clone());
            }
        }
        self.embed = Some(result);
        effects
    }

    /// Starts an analysis of the current link.
    pub fn analyze(&mut self, now: Instant) -> Result<Vec<Effect>, StateError> {
        let Some(platform) = self.link.detected() else {
            return Err(StateError::NoLink);
        };
        if !self.link.is_analyzable() {
            return Err(StateError::NoLink);
        }
        match self.lifecycle {
            Lifecycle::Analyzing => return Err(StateError::Busy),
            Lifecycle::EmbedReady | Lifecycle::AnalysisReady | Lifecycle::AnalysisError => {}
            _ => return Err(StateError::EmbedNotReady),
        }
        if !self.embed.as_ref().is_some_and(EmbedResult::is_html) {
            return Err(StateError::EmbedNotReady);
        }

        let link = self.link.link().to_string();
        if link::analysis_id(platform, &link).is_none() {
            let err = ApiError::InvalidLink {
                platform: Some(platform),
            };
            tracing::debug!(error = %err, "analysis rejected before request");
            self.lifecycle = Lifecycle::AnalysisError;
            self.error = Some(err.to_string());
            return Ok(Vec::new());
        }

        self.next_request += 1;
        let request_id = self.next_request;
        self.pending_analysis = Some(Gated::new(request_id, now, self.min_progress));
        self.analyzing_link = Some((platform, link.clone()));
        self.error = None;
        self.lifecycle = Lifecycle::Analyzing;
        tracing::info!(request_id, platform = platform.as_str(), "analysis started");
        Ok(vec![Effect::Analyze {
            request_id,
            platform,
            link,
        }])
    }

    /// Records a finished analysis. Returns false when it was stale.
    pub fn apply_analysis(
        &mut self,
        request_id: u64,
        outcome: Result<AnalysisOutcome, ApiError>,
        now: Instant,
    ) -> bool {
        match self.pending_analysis.as_mut() {
            Some(gated) => gated.accept(request_id, outcome, now),
            None => false,
        }
    }

    fn finish_analysis(&mut self, outcome: Result<AnalysisOutcome, ApiError>) -> Vec<Effect> {
        let Some((platform, link)) = self.analyzing_link.take() else {
            return Vec::new();
        };
        match outcome {
            Ok(AnalysisOutcome { result, notice }) => {
                let stored = StoredAnalysis {
                    link,
                    platform,
                    result,
                    notice: notice.clone(),
                };
                self.lifecycle = Lifecycle::AnalysisReady;
                self.section = Section::Overall;
                self.analysis = Some(stored.clone());
                let mut effects = vec![Effect::SaveAnalysis(stored)];
                if let Some(notice) = notice {
                    effects.push(Effect::Notice(notice));
                }
                effects
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed");
                self.lifecycle = Lifecycle::AnalysisError;
                self.error = Some(err.to_string());
                Vec::new()
            }
        }
    }

    /// Shows a previously persisted analysis without touching the network.
    pub fn restore(&mut self, stored: StoredAnalysis) {
        self.link = LinkState::new(stored.link.clone());
        if self.link.detected() != Some(stored.platform) {
            self.link.override_platform(Some(stored.platform));
        }
        self.debouncer.cancel();
        self.pending_embed = None;
        self.pending_analysis = None;
        self.embed = None;
        self.error = None;
        self.section = Section::Overall;
        self.lifecycle = Lifecycle::AnalysisReady;
        self.analysis = Some(stored);
    }

    /// Back to the welcome panel with an empty link field.
    pub fn clear(&mut self) -> Vec<Effect> {
        self.link = LinkState::default();
        self.debouncer.cancel();
        self.lifecycle = Lifecycle::Idle;
        self.drop_results()
    }

    /// How long the host may sleep before the next [`SocialPage::tick`] matters.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        [
            self.debouncer.time_until_due(now),
            self.pending_embed.as_ref().and_then(|g| g.remaining(now)),
            self.pending_analysis.as_ref().and_then(|g| g.remaining(now)),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn view(&self, now: Instant) -> View<'_> {
        match self.lifecycle {
            Lifecycle::Idle => View::Welcome,
            Lifecycle::PendingEmbed => View::Loading {
                label: "Fetching preview",
                percent: self
                    .pending_embed
                    .as_ref()
                    .map(|g| g.percent(now))
                    .unwrap_or(0.0),
            },
            Lifecycle::Analyzing => View::Loading {
                label: "Analyzing",
                percent: self
                    .pending_analysis
                    .as_ref()
                    .map(|g| g.percent(now))
                    .unwrap_or(0.0),
            },
            Lifecycle::EmbedError | Lifecycle::AnalysisError => {
                View::Error(self.error.as_deref().unwrap_or("Something went wrong."))
            }
            Lifecycle::EmbedReady => match &self.embed {
                Some(embed) => View::Preview(embed),
                None => View::Welcome,
            },
            Lifecycle::AnalysisReady => match &self.analysis {
                Some(stored) => View::Dashboard(stored),
                None => View::Welcome,
            },
        }
    }
}
