mod boundary;
mod dashboard;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::analysis::{AnalysisOutcome, StoredAnalysis};
use crate::api::ApiError;
use crate::config::Theme;
use crate::data::Services;
use crate::embed::{self, EmbedResult, WidgetLoad};
use crate::product::{Product, ProductView};
use crate::progress;
use crate::session;
use crate::social::{Effect, Lifecycle, SocialPage, Timing, View};
use crate::text::{self, EnhanceStyle, ExportFormat, TextAnalysis, WordFilter};
use crate::trends::{KeywordTrends, PlatformComparison};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK_RATE: Duration = Duration::from_millis(120);
const TOAST_WIDTH: u16 = 44;
const PRODUCT_FAILURE: &str = "Failed to analyze product. Please check the URL and try again.";

/// Colors for one theme. The dark palette is the one the client always had;
/// the light one mirrors it with inverted surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_focused_bg: Color,
    panel_selected_bg: Color,
    border: Color,
    border_focused: Color,
    text_primary: Color,
    text_secondary: Color,
    accent: Color,
    success: Color,
    warning: Color,
    error: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Rgb(30, 30, 46),
                panel_bg: Color::Rgb(24, 24, 36),
                panel_focused_bg: Color::Rgb(49, 50, 68),
                panel_selected_bg: Color::Rgb(69, 71, 90),
                border: Color::Rgb(49, 50, 68),
                border_focused: Color::Rgb(137, 180, 250),
                text_primary: Color::Rgb(205, 214, 244),
                text_secondary: Color::Rgb(166, 173, 200),
                accent: Color::Rgb(137, 180, 250),
                success: Color::Rgb(166, 227, 161),
                warning: Color::Rgb(249, 226, 175),
                error: Color::Rgb(243, 139, 168),
            },
            Theme::Light => Self {
                bg: Color::Rgb(239, 241, 245),
                panel_bg: Color::Rgb(230, 233, 239),
                panel_focused_bg: Color::Rgb(204, 208, 218),
                panel_selected_bg: Color::Rgb(188, 192, 204),
                border: Color::Rgb(172, 176, 190),
                border_focused: Color::Rgb(30, 102, 245),
                text_primary: Color::Rgb(76, 79, 105),
                text_secondary: Color::Rgb(108, 111, 133),
                accent: Color::Rgb(30, 102, 245),
                success: Color::Rgb(64, 160, 43),
                warning: Color::Rgb(223, 142, 29),
                error: Color::Rgb(210, 15, 57),
            },
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage(100 - percent_x - (100 - percent_x) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage(100 - percent_y - (100 - percent_y) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

/// The part of `text` that fits in `width` columns, keeping the end visible.
fn input_tail(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut used = 0;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &text[start..]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Social,
    Text,
    Product,
    Trends,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Social, Tab::Text, Tab::Product, Tab::Trends];

    fn title(self) -> &'static str {
        match self {
            Tab::Social => "Social",
            Tab::Text => "Text",
            Tab::Product => "Product",
            Tab::Trends => "Trends",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn previous(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    fn from_digit(ch: char) -> Option<Self> {
        let idx = ch.to_digit(10)? as usize;
        Tab::ALL.get(idx.checked_sub(1)?).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Editing,
    /// Typing the path of a file to load into the text input.
    FilePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    kind: ToastKind,
    expires_at: Instant,
}

impl Toast {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= TICK_RATE {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

/// One in-flight backend request whose outcome is held until its progress
/// gate completes. Starting a new request supersedes the previous one.
struct Remote<T> {
    pending: Option<progress::Gated<Result<T, ApiError>>>,
    next_request: u64,
}

impl<T> Default for Remote<T> {
    fn default() -> Self {
        Self {
            pending: None,
            next_request: 0,
        }
    }
}

impl<T> Remote<T> {
    fn start(&mut self, now: Instant, min_display: Duration) -> u64 {
        self.next_request += 1;
        self.pending = Some(progress::Gated::new(self.next_request, now, min_display));
        self.next_request
    }

    fn accept(&mut self, request_id: u64, result: Result<T, ApiError>, now: Instant) -> bool {
        match self.pending.as_mut() {
            Some(gated) => gated.accept(request_id, result, now),
            None => false,
        }
    }

    fn take_ready(&mut self, now: Instant) -> Option<Result<T, ApiError>> {
        let result = self.pending.as_mut()?.take_if_ready(now)?;
        self.pending = None;
        Some(result)
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn percent(&self, now: Instant) -> Option<f64> {
        self.pending.as_ref().map(|gated| gated.percent(now))
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref().and_then(|gated| gated.remaining(now))
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TrendReport {
    trends: KeywordTrends,
    comparison: PlatformComparison,
}

enum AsyncResponse {
    Embed {
        generation: u64,
        link: String,
        result: EmbedResult,
    },
    Analysis {
        request_id: u64,
        result: Result<AnalysisOutcome, ApiError>,
    },
    TextAnalysis {
        request_id: u64,
        result: Result<TextAnalysis, ApiError>,
    },
    Enhance {
        request_id: u64,
        result: Result<String, ApiError>,
    },
    Product {
        request_id: u64,
        result: Result<Product, ApiError>,
    },
    Trends {
        request_id: u64,
        result: Result<TrendReport, ApiError>,
    },
}

pub struct Options {
    pub status_message: String,
    pub services: Services,
    pub state: session::State,
    pub timing: Timing,
    pub toast_duration: Duration,
    pub export_dir: PathBuf,
}

pub struct Model {
    status_message: String,
    services: Services,
    state: session::State,
    toast_duration: Duration,
    min_progress: Duration,
    export_dir: PathBuf,
    tab: Tab,
    input_mode: InputMode,
    social: SocialPage,
    social_input: String,
    text_input: String,
    file_path_input: String,
    text_remote: Remote<TextAnalysis>,
    text_error: Option<String>,
    word_filter: WordFilter,
    enhance_style: Option<EnhanceStyle>,
    enhance_remote: Remote<String>,
    product_input: String,
    product_remote: Remote<Product>,
    product: Option<Product>,
    product_error: Option<String>,
    product_view: ProductView,
    product_scroll: u16,
    trends_input: String,
    trends_remote: Remote<TrendReport>,
    trends: Option<TrendReport>,
    trends_error: Option<String>,
    toast: Option<Toast>,
    spinner: Spinner,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        let mut social = SocialPage::new(opts.timing);
        if let Some(stored) = opts.state.social_analysis().cloned() {
            tracing::debug!(link = %stored.link, "restoring saved analysis");
            social.restore(stored);
        }
        let social_input = social.link().raw_input().to_string();
        let text_input = opts.state.text_input().to_string();

        Self {
            status_message: opts.status_message,
            services: opts.services,
            state: opts.state,
            toast_duration: opts.toast_duration,
            min_progress: opts.timing.min_progress,
            export_dir: opts.export_dir,
            tab: Tab::Social,
            input_mode: InputMode::Normal,
            social,
            social_input,
            text_input,
            file_path_input: String::new(),
            text_remote: Remote::default(),
            text_error: None,
            word_filter: WordFilter::default(),
            enhance_style: None,
            enhance_remote: Remote::default(),
            product_input: String::new(),
            product_remote: Remote::default(),
            product: None,
            product_error: None,
            product_view: ProductView::default(),
            product_scroll: 0,
            trends_input: String::new(),
            trends_remote: Remote::default(),
            trends: None,
            trends_error: None,
            toast: None,
            spinner: Spinner::new(),
            needs_redraw: true,
            response_tx,
            response_rx,
        }
    }

    /// Hands the session state back for teardown.
    pub fn into_state(self) -> session::State {
        self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Renderer panics are caught by the dashboard boundary; keep the
        // default hook from printing over the alternate screen.
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|info| {
            tracing::error!(panic = %info, "panic while the terminal UI was active");
        }));

        let result = self.event_loop(&mut terminal);

        std::panic::set_hook(previous_hook);
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();

        loop {
            if self.poll_async(Instant::now()) {
                self.mark_dirty();
            }
            if self.tick(Instant::now()) {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let mut timeout = TICK_RATE
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));
            if let Some(deadline) = self.next_deadline(Instant::now()) {
                timeout = timeout.min(deadline.max(Duration::from_millis(1)));
            }

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                tracing::warn!(error = %format!("{err:#}"), "key action failed");
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= TICK_RATE {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.social.lifecycle().is_loading()
            || self.text_remote.is_pending()
            || self.enhance_remote.is_pending()
            || self.product_remote.is_pending()
            || self.trends_remote.is_pending()
    }

    fn next_deadline(&self, now: Instant) -> Option<Duration> {
        [
            self.social.next_deadline(now),
            self.text_remote.remaining(now),
            self.enhance_remote.remaining(now),
            self.product_remote.remaining(now),
            self.trends_remote.remaining(now),
            self.toast
                .as_ref()
                .map(|toast| toast.expires_at.saturating_duration_since(now)),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        let message = message.into();
        tracing::debug!(?kind, message = %message, "toast");
        self.toast = Some(Toast {
            message,
            kind,
            expires_at: now + self.toast_duration,
        });
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() -> AsyncResponse + Send + 'static,
    {
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let _ = tx.send(job());
        });
    }

    fn poll_async(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message, now);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse, now: Instant) {
        let accepted = match message {
            AsyncResponse::Embed {
                generation,
                link,
                result,
            } => self.social.apply_embed(generation, &link, result, now),
            AsyncResponse::Analysis { request_id, result } => {
                self.social.apply_analysis(request_id, result, now)
            }
            AsyncResponse::TextAnalysis { request_id, result } => {
                self.text_remote.accept(request_id, result, now)
            }
            AsyncResponse::Enhance { request_id, result } => {
                self.enhance_remote.accept(request_id, result, now)
            }
            AsyncResponse::Product { request_id, result } => {
                self.product_remote.accept(request_id, result, now)
            }
            AsyncResponse::Trends { request_id, result } => {
                self.trends_remote.accept(request_id, result, now)
            }
        };
        if !accepted {
            tracing::trace!("discarded stale response");
        }
    }

    /// Releases gated outcomes and fires due timers. Returns true when
    /// something visible changed.
    fn tick(&mut self, now: Instant) -> bool {
        let before = self.social.lifecycle();
        let effects = self.social.tick(now);
        let after = self.social.lifecycle();
        let mut changed = !effects.is_empty() || before != after;
        self.run_effects(effects, now);
        if before != after {
            self.describe_transition(after);
        }

        if let Some(result) = self.text_remote.take_ready(now) {
            self.finish_text_analysis(result, now);
            changed = true;
        }
        if let Some(result) = self.enhance_remote.take_ready(now) {
            self.finish_enhance(result, now);
            changed = true;
        }
        if let Some(result) = self.product_remote.take_ready(now) {
            self.finish_product(result, now);
            changed = true;
        }
        if let Some(result) = self.trends_remote.take_ready(now) {
            self.finish_trends(result);
            changed = true;
        }

        if self.toast.as_ref().is_some_and(|toast| toast.is_expired(now)) {
            self.toast = None;
            changed = true;
        }
        changed
    }

    fn describe_transition(&mut self, lifecycle: Lifecycle) {
        self.status_message = match lifecycle {
            Lifecycle::Idle => "Paste a link to get started.".to_string(),
            Lifecycle::PendingEmbed => "Fetching preview…".to_string(),
            Lifecycle::EmbedReady => "Preview ready. Press a to analyze.".to_string(),
            Lifecycle::EmbedError => "Preview failed.".to_string(),
            Lifecycle::Analyzing => "Analyzing comments…".to_string(),
            Lifecycle::AnalysisReady => "Analysis complete.".to_string(),
            Lifecycle::AnalysisError => "Analysis failed.".to_string(),
        };
    }

    fn run_effects(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::ResolveEmbed {
                    generation,
                    platform,
                    link,
                } => {
                    let service = self.services.embed.clone();
                    self.spawn(move || {
                        let result = embed::resolve(service.as_ref(), platform, &link);
                        AsyncResponse::Embed {
                            generation,
                            link,
                            result,
                        }
                    });
                }
                Effect::Analyze {
                    request_id,
                    platform,
                    link,
                } => {
                    let service = self.services.analysis.clone();
                    self.spawn(move || AsyncResponse::Analysis {
                        request_id,
                        result: service.analyze(platform, &link),
                    });
                }
                Effect::LoadWidget(WidgetLoad::Injected(script)) => {
                    tracing::debug!(id = script.id, src = script.src, "widget script injected");
                }
                Effect::LoadWidget(WidgetLoad::Rerendered(script)) => {
                    tracing::debug!(id = script.id, "widget re-rendered");
                }
                Effect::SaveAnalysis(stored) => {
                    self.persist_analysis(Some(stored), now);
                }
                Effect::ClearAnalysis => {
                    self.persist_analysis(None, now);
                }
                Effect::Notice(notice) => self.show_toast(notice, ToastKind::Warning, now),
            }
        }
    }

    fn persist_analysis(&mut self, stored: Option<StoredAnalysis>, now: Instant) {
        if let Err(err) = self.state.set_social_analysis(stored) {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist analysis");
            self.show_toast("Could not save the analysis.", ToastKind::Error, now);
        }
    }

    fn finish_text_analysis(&mut self, result: Result<TextAnalysis, ApiError>, now: Instant) {
        match result {
            Ok(analysis) => {
                self.text_error = None;
                self.state.set_text_analysis(Some(analysis)).unwrap_or_else(|err| {
                    tracing::warn!(error = %format!("{err:#}"), "failed to persist text analysis");
                });
                self.status_message = "Text analysis complete.".to_string();
                self.show_toast("Analysis complete", ToastKind::Success, now);
            }
            Err(err) => {
                tracing::warn!(error = %err, "text analysis failed");
                self.status_message = "Text analysis failed.".to_string();
                self.text_error = Some(err.to_string());
            }
        }
    }

    fn finish_enhance(&mut self, result: Result<String, ApiError>, now: Instant) {
        match result {
            Ok(enhanced) => {
                self.state.set_enhanced_text(Some(enhanced)).unwrap_or_else(|err| {
                    tracing::warn!(error = %format!("{err:#}"), "failed to persist enhanced text");
                });
                self.status_message = "Text enhanced.".to_string();
                self.show_toast("Text enhanced", ToastKind::Success, now);
            }
            Err(err) => {
                tracing::warn!(error = %err, "enhancement failed");
                self.status_message = "Enhancement failed.".to_string();
                self.show_toast(err.to_string(), ToastKind::Error, now);
            }
        }
    }

    fn finish_product(&mut self, result: Result<Product, ApiError>, now: Instant) {
        match result {
            Ok(product) => {
                self.status_message = format!("Analyzed {}.", product.name);
                self.product = Some(product);
                self.product_error = None;
                self.product_scroll = 0;
                self.show_toast("Product analysis complete!", ToastKind::Success, now);
            }
            Err(err) => {
                tracing::warn!(error = %err, "product analysis failed");
                self.status_message = "Product analysis failed.".to_string();
                self.product = None;
                self.product_error = Some(PRODUCT_FAILURE.to_string());
            }
        }
    }

    fn finish_trends(&mut self, result: Result<TrendReport, ApiError>) {
        match result {
            Ok(report) => {
                self.status_message = format!("Trends for \"{}\" loaded.", report.trends.keyword);
                self.trends = Some(report);
                self.trends_error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "trend lookup failed");
                self.status_message = "Trend lookup failed.".to_string();
                self.trends = None;
                self.trends_error = Some(err.to_string());
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        self.mark_dirty();
        let now = Instant::now();
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.commit_text_input()?;
            return Ok(true);
        }
        match self.input_mode {
            InputMode::Editing => {
                self.handle_edit_key(key.code, now)?;
                Ok(false)
            }
            InputMode::FilePath => {
                self.handle_path_key(key.code, now)?;
                Ok(false)
            }
            InputMode::Normal => self.handle_normal_key(key.code, now),
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode, now: Instant) -> Result<()> {
        match code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.commit_text_input()?;
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.submit(now)?;
            }
            KeyCode::Backspace => {
                self.active_input_mut().pop();
                self.input_changed(now);
            }
            KeyCode::Char(ch) => {
                self.active_input_mut().push(ch);
                self.input_changed(now);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_path_key(&mut self, code: KeyCode, now: Instant) -> Result<()> {
        match code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.file_path_input.clear();
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let raw = std::mem::take(&mut self.file_path_input);
                self.load_text_file(raw.trim(), now)?;
            }
            KeyCode::Backspace => {
                self.file_path_input.pop();
            }
            KeyCode::Char(ch) => self.file_path_input.push(ch),
            _ => {}
        }
        Ok(())
    }

    fn load_text_file(&mut self, raw: &str, now: Instant) -> Result<()> {
        if raw.is_empty() {
            return Ok(());
        }
        let path = match raw.strip_prefix("~/").zip(dirs::home_dir()) {
            Some((rest, home)) => home.join(rest),
            None => self.export_dir.join(raw),
        };
        match text::load_file(&path) {
            Ok(contents) => {
                self.text_input = contents;
                self.commit_text_input()?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| raw.to_string());
                tracing::info!(path = %path.display(), "text input loaded from file");
                self.show_toast(format!("Uploaded: {name}"), ToastKind::Success, now);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "file load failed");
                self.show_toast(format!("{err:#}"), ToastKind::Error, now);
            }
        }
        Ok(())
    }

    fn active_input_mut(&mut self) -> &mut String {
        match self.tab {
            Tab::Social => &mut self.social_input,
            Tab::Text => &mut self.text_input,
            Tab::Product => &mut self.product_input,
            Tab::Trends => &mut self.trends_input,
        }
    }

    fn input_changed(&mut self, now: Instant) {
        if self.tab == Tab::Social {
            let effects = self.social.set_input(&self.social_input, now);
            let lifecycle = self.social.lifecycle();
            self.describe_transition(lifecycle);
            self.run_effects(effects, now);
        }
    }

    fn commit_text_input(&mut self) -> Result<()> {
        if self.text_input != self.state.text_input() {
            self.state.set_text_input(&self.text_input)?;
        }
        Ok(())
    }

    fn submit(&mut self, now: Instant) -> Result<()> {
        match self.tab {
            Tab::Social => {
                let effects = self.social.refresh(now);
                self.run_effects(effects, now);
                Ok(())
            }
            Tab::Text => self.analyze_text(now),
            Tab::Product => {
                self.analyze_product(now);
                Ok(())
            }
            Tab::Trends => {
                self.fetch_trends(now);
                Ok(())
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, now: Instant) -> Result<bool> {
        match code {
            KeyCode::Char('q') => {
                self.commit_text_input()?;
                return Ok(true);
            }
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.previous(),
            KeyCode::Char(ch @ '1'..='4') => {
                if let Some(tab) = Tab::from_digit(ch) {
                    self.tab = tab;
                }
            }
            KeyCode::Char('i') | KeyCode::Enter => self.input_mode = InputMode::Editing,
            KeyCode::Esc => self.toast = None,
            KeyCode::Char('a') => self.primary_action(now)?,
            KeyCode::Char('c') => {
                let chart = self.state.chart().toggled();
                self.state.set_chart(chart)?;
                self.status_message = format!("Emotion chart: {}.", chart.label());
            }
            KeyCode::Char('t') => {
                let theme = self.state.theme().toggled();
                self.state.set_theme(theme)?;
                self.status_message = format!("Switched to the {} theme.", theme.label());
            }
            KeyCode::Char('x') => self.clear_all(now)?,
            other => match self.tab {
                Tab::Social => self.handle_social_key(other, now)?,
                Tab::Text => self.handle_text_key(other, now)?,
                Tab::Product => self.handle_product_key(other, now),
                Tab::Trends => {
                    if other == KeyCode::Char('r') {
                        self.fetch_trends(now);
                    }
                }
            },
        }
        Ok(false)
    }

    fn primary_action(&mut self, now: Instant) -> Result<()> {
        match self.tab {
            Tab::Social => {
                self.analyze_social(now);
                Ok(())
            }
            Tab::Text => self.analyze_text(now),
            Tab::Product => {
                self.analyze_product(now);
                Ok(())
            }
            Tab::Trends => {
                self.fetch_trends(now);
                Ok(())
            }
        }
    }

    fn handle_social_key(&mut self, code: KeyCode, now: Instant) -> Result<()> {
        match code {
            KeyCode::Char('r') => {
                let effects = self.social.refresh(now);
                if !effects.is_empty() {
                    self.describe_transition(self.social.lifecycle());
                }
                self.run_effects(effects, now);
            }
            KeyCode::Char('p') => {
                let effects = self.social.cycle_override(now);
                self.run_effects(effects, now);
                let link = self.social.link();
                self.status_message = match link.detected() {
                    Some(platform) if link.is_user_overridden() => {
                        format!("Platform pinned to {}.", platform.display_name())
                    }
                    _ => "Platform detection: automatic.".to_string(),
                };
            }
            KeyCode::Char('o') => self.open_link(now)?,
            KeyCode::Char('n') => {
                self.social.cycle_section();
                self.status_message = format!("Showing {}.", self.social.section().label());
            }
            _ => {}
        }
        Ok(())
    }

    fn analyze_social(&mut self, now: Instant) {
        match self.social.analyze(now) {
            Ok(effects) => {
                self.describe_transition(self.social.lifecycle());
                self.run_effects(effects, now);
            }
            Err(err) => self.show_toast(err.to_string(), ToastKind::Warning, now),
        }
    }

    fn open_link(&mut self, now: Instant) -> Result<()> {
        let link = self.social.link().link().to_string();
        if link.is_empty() {
            self.show_toast("There is no link to open.", ToastKind::Warning, now);
            return Ok(());
        }
        webbrowser::open(&link).with_context(|| format!("open {link} in a browser"))?;
        self.status_message = format!("Opened {link}.");
        Ok(())
    }

    fn handle_text_key(&mut self, code: KeyCode, now: Instant) -> Result<()> {
        match code {
            KeyCode::Char('s') => {
                self.enhance_style = EnhanceStyle::cycle(self.enhance_style);
                self.status_message = match self.enhance_style {
                    Some(style) => format!("Enhancement style: {}.", style.label()),
                    None => "No enhancement style selected.".to_string(),
                };
            }
            KeyCode::Char('e') => self.enhance_text(now)?,
            KeyCode::Char('y') => self.copy_enhanced(now)?,
            KeyCode::Char('w') => self.export_enhanced(ExportFormat::Txt, now)?,
            KeyCode::Char('W') => self.export_enhanced(ExportFormat::Csv, now)?,
            KeyCode::Char('d') => self.export_enhanced(ExportFormat::Doc, now)?,
            KeyCode::Char('l') => {
                self.file_path_input.clear();
                self.input_mode = InputMode::FilePath;
            }
            KeyCode::Char('f') => {
                self.word_filter = self.word_filter.next();
                self.status_message = format!("Word filter: {}.", self.word_filter.label());
            }
            _ => {}
        }
        Ok(())
    }

    fn analyze_text(&mut self, now: Instant) -> Result<()> {
        if let Some(warning) = text::validate_input(&self.text_input) {
            self.show_toast(warning, ToastKind::Warning, now);
            return Ok(());
        }
        self.commit_text_input()?;
        let request_id = self.text_remote.start(now, self.min_progress);
        self.text_error = None;
        self.status_message = "Analyzing text…".to_string();
        tracing::info!(request_id, "text analysis started");

        let service = self.services.text.clone();
        let input = self.text_input.clone();
        self.spawn(move || AsyncResponse::TextAnalysis {
            request_id,
            result: service.analyze_text(&input),
        });
        Ok(())
    }

    fn enhance_text(&mut self, now: Instant) -> Result<()> {
        let Some(style) = self.enhance_style else {
            self.show_toast("Select a style first (s).", ToastKind::Warning, now);
            return Ok(());
        };
        if self.text_input.trim().is_empty() {
            self.show_toast("Enter some text to enhance.", ToastKind::Warning, now);
            return Ok(());
        }
        self.commit_text_input()?;
        let request_id = self.enhance_remote.start(now, self.min_progress);
        self.status_message = format!("Rewriting in a {} style…", style.as_str());
        tracing::info!(request_id, style = style.as_str(), "enhancement started");

        let service = self.services.text.clone();
        let input = self.text_input.clone();
        self.spawn(move || AsyncResponse::Enhance {
            request_id,
            result: service.enhance_text(&input, style),
        });
        Ok(())
    }

    fn copy_enhanced(&mut self, now: Instant) -> Result<()> {
        let Some(enhanced) = self.state.enhanced_text().map(str::to_string) else {
            self.show_toast("Nothing to copy yet.", ToastKind::Warning, now);
            return Ok(());
        };
        let mut clipboard = arboard::Clipboard::new().context("open clipboard")?;
        clipboard
            .set_text(enhanced)
            .context("copy enhanced text to clipboard")?;
        self.show_toast("Copied to clipboard", ToastKind::Success, now);
        Ok(())
    }

    fn export_enhanced(&mut self, format: ExportFormat, now: Instant) -> Result<()> {
        let Some(enhanced) = self.state.enhanced_text() else {
            self.show_toast("Nothing to export yet.", ToastKind::Warning, now);
            return Ok(());
        };
        let path = text::export(&self.export_dir, format, &self.text_input, enhanced)?;
        tracing::info!(path = %path.display(), "enhanced text exported");
        self.show_toast(
            format!("Exported to {}", path.display()),
            ToastKind::Success,
            now,
        );
        Ok(())
    }

    fn handle_product_key(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Char('v') => {
                self.product_view = self.product_view.next();
                self.product_scroll = 0;
                self.status_message = format!("Product view: {}.", self.product_view.label());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.product_scroll = self.product_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.product_scroll = self.product_scroll.saturating_sub(1);
            }
            KeyCode::Char('r') => self.analyze_product(now),
            _ => {}
        }
    }

    fn analyze_product(&mut self, now: Instant) {
        let url = self.product_input.trim().to_string();
        if url.is_empty() {
            self.show_toast("Please enter a product URL.", ToastKind::Warning, now);
            return;
        }
        let request_id = self.product_remote.start(now, self.min_progress);
        self.product_error = None;
        self.status_message = "Scraping product reviews…".to_string();
        tracing::info!(request_id, url = %url, "product analysis started");

        let service = self.services.product.clone();
        self.spawn(move || AsyncResponse::Product {
            request_id,
            result: service.scrape(&url),
        });
    }

    fn fetch_trends(&mut self, now: Instant) {
        let keyword = self.trends_input.trim().to_string();
        if keyword.is_empty() {
            self.show_toast("Enter a keyword first.", ToastKind::Warning, now);
            return;
        }
        let request_id = self.trends_remote.start(now, self.min_progress);
        self.trends_error = None;
        self.status_message = format!("Looking up trends for \"{keyword}\"…");
        tracing::info!(request_id, keyword = %keyword, "trend lookup started");

        let service = self.services.trends.clone();
        self.spawn(move || {
            let result = service.keyword_trends(&keyword).and_then(|trends| {
                let comparison = service.platform_comparison(&keyword)?;
                Ok(TrendReport { trends, comparison })
            });
            AsyncResponse::Trends { request_id, result }
        });
    }

    fn clear_all(&mut self, now: Instant) -> Result<()> {
        self.state.clear_all()?;
        let effects = self.social.clear();
        self.run_effects(effects, now);
        self.social_input.clear();
        self.text_input.clear();
        self.text_remote.cancel();
        self.text_error = None;
        self.enhance_remote.cancel();
        self.enhance_style = None;
        self.product_input.clear();
        self.product_remote.cancel();
        self.product = None;
        self.product_error = None;
        self.product_scroll = 0;
        self.trends_input.clear();
        self.trends_remote.cancel();
        self.trends = None;
        self.trends_error = None;
        self.input_mode = InputMode::Normal;
        self.status_message = "Saved session cleared.".to_string();
        self.show_toast("Saved session cleared", ToastKind::Success, now);
        Ok(())
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let now = Instant::now();
        let palette = Palette::for_theme(self.state.theme());
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(palette.bg)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(palette.text_primary)
                .bg(palette.panel_focused_bg)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .style(
                Style::default()
                    .fg(palette.text_secondary)
                    .bg(palette.panel_bg),
            )
            .highlight_style(
                Style::default()
                    .fg(palette.accent)
                    .bg(palette.panel_selected_bg)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, layout[1]);

        match self.tab {
            Tab::Social => self.draw_social(frame, layout[2], &palette, now),
            Tab::Text => self.draw_text(frame, layout[2], &palette, now),
            Tab::Product => self.draw_product(frame, layout[2], &palette, now),
            Tab::Trends => self.draw_trends(frame, layout[2], &palette, now),
        }

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(palette.text_secondary)
                    .bg(palette.panel_bg)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[3]);

        if let Some(toast) = self.toast.as_ref().filter(|toast| !toast.is_expired(now)) {
            draw_toast(frame, layout[2], toast, &palette);
        }
    }

    fn footer_text(&self) -> String {
        match self.input_mode {
            InputMode::Editing => return "Editing · Enter submit · Esc done".to_string(),
            InputMode::FilePath => return "File path · Enter load · Esc cancel".to_string(),
            InputMode::Normal => {}
        }
        let specific = match self.tab {
            Tab::Social => "a analyze · r refresh · p platform · o open · n section",
            Tab::Text => "a analyze · l load file · s style · e enhance · y copy · w/W/d export · f words",
            Tab::Product => "a analyze · v view · j/k scroll",
            Tab::Trends => "a search · r refresh",
        };
        format!("i edit · {specific} · c chart · t theme · x clear · Tab switch · q quit")
    }

    fn draw_input(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: String,
        value: &str,
        placeholder: &str,
        palette: &Palette,
    ) {
        let editing = self.input_mode != InputMode::Normal;
        let border = if editing {
            palette.border_focused
        } else {
            palette.border
        };
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(palette.panel_bg));
        let inner_width = area.width.saturating_sub(3) as usize;
        let visible = input_tail(value, inner_width);
        let content = if value.is_empty() && !editing {
            Line::from(Span::styled(
                placeholder.to_string(),
                Style::default()
                    .fg(palette.text_secondary)
                    .add_modifier(Modifier::ITALIC),
            ))
        } else {
            Line::from(Span::styled(
                visible.to_string(),
                Style::default().fg(palette.text_primary),
            ))
        };
        frame.render_widget(Paragraph::new(content).block(block), area);
        if editing {
            frame.set_cursor(area.x + 1 + visible.width() as u16, area.y + 1);
        }
    }

    fn draw_social(&self, frame: &mut Frame<'_>, area: Rect, palette: &Palette, now: Instant) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let link = self.social.link();
        let platform = match link.detected() {
            Some(platform) if link.is_user_overridden() => {
                format!("{} (pinned)", platform.display_name())
            }
            Some(platform) => platform.display_name().to_string(),
            None => "auto".to_string(),
        };
        self.draw_input(
            frame,
            rows[0],
            format!("Link · {platform}"),
            &self.social_input,
            "Paste a Twitter/X, Reddit or YouTube link (i to edit)",
            palette,
        );

        match self.social.view(now) {
            View::Welcome => draw_message(
                frame,
                rows[1],
                "Welcome",
                vec![
                    "Paste a post or video link to preview it.".to_string(),
                    "Then press a to analyze the sentiment of its comments.".to_string(),
                ],
                palette.text_primary,
                palette,
            ),
            View::Loading { label, percent } => {
                draw_progress(frame, rows[1], label, percent, palette)
            }
            View::Error(message) => draw_message(
                frame,
                rows[1],
                "Error",
                vec![message.to_string()],
                palette.error,
                palette,
            ),
            View::Preview(result) => draw_preview(frame, rows[1], result, palette),
            View::Dashboard(stored) => self.draw_social_dashboard(frame, rows[1], stored, palette),
        }
    }

    fn draw_social_dashboard(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        stored: &StoredAnalysis,
        palette: &Palette,
    ) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        let section = self.social.section();
        let mut header = vec![
            Span::styled(
                format!(" {} ", stored.platform.display_name()),
                Style::default()
                    .fg(palette.panel_bg)
                    .bg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", stored.link),
                Style::default().fg(palette.text_secondary),
            ),
        ];
        if stored.result.is_composite() {
            header.push(Span::styled(
                format!("  [{}] (n)", section.label()),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(header)), rows[0]);

        let breakdown = stored.result.section(section);
        let chart = self.state.chart();
        boundary::guard(frame, rows[1], palette, |frame, area| {
            dashboard::sentiment(frame, area, breakdown, chart, palette)
        });
    }

    fn draw_text(&self, frame: &mut Frame<'_>, area: Rect, palette: &Palette, now: Instant) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(7),
            ])
            .split(area);
        if self.input_mode == InputMode::FilePath {
            self.draw_input(
                frame,
                rows[0],
                "Load a .txt or .csv file".to_string(),
                &self.file_path_input,
                "",
                palette,
            );
        } else {
            self.draw_input(
                frame,
                rows[0],
                "Text".to_string(),
                &self.text_input,
                "Type at least three words to analyze (i to edit)",
                palette,
            );
        }

        if let Some(percent) = self.text_remote.percent(now) {
            draw_progress(frame, rows[1], "Analyzing text", percent, palette);
        } else if let Some(error) = &self.text_error {
            draw_message(
                frame,
                rows[1],
                "Error",
                vec![error.clone()],
                palette.error,
                palette,
            );
        } else if let Some(analysis) = self.state.text_analysis() {
            let (filter, chart) = (self.word_filter, self.state.chart());
            boundary::guard(frame, rows[1], palette, |frame, area| {
                dashboard::text(frame, area, analysis, filter, chart, palette)
            });
        } else {
            draw_message(
                frame,
                rows[1],
                "Text sentiment",
                vec!["Press a to analyze the text above.".to_string()],
                palette.text_secondary,
                palette,
            );
        }

        let style = self
            .enhance_style
            .map(|style| style.label())
            .unwrap_or("none");
        let title = format!("Enhanced · style {style} (s)");
        if let Some(percent) = self.enhance_remote.percent(now) {
            draw_progress(frame, rows[2], "Enhancing", percent, palette);
        } else {
            let body = match self.state.enhanced_text() {
                Some(enhanced) => vec![enhanced.to_string()],
                None => vec!["Pick a style with s and press e to rewrite the text.".to_string()],
            };
            draw_message(frame, rows[2], &title, body, palette.text_primary, palette);
        }
    }

    fn draw_product(&self, frame: &mut Frame<'_>, area: Rect, palette: &Palette, now: Instant) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.draw_input(
            frame,
            rows[0],
            format!("Product URL · {} (v)", self.product_view.label()),
            &self.product_input,
            "Paste a product page URL (i to edit)",
            palette,
        );

        if let Some(percent) = self.product_remote.percent(now) {
            draw_progress(frame, rows[1], "Analyzing product", percent, palette);
        } else if let Some(error) = &self.product_error {
            draw_message(
                frame,
                rows[1],
                "Error",
                vec![error.clone()],
                palette.error,
                palette,
            );
        } else if let Some(product) = &self.product {
            let (view, scroll, chart) = (self.product_view, self.product_scroll, self.state.chart());
            boundary::guard(frame, rows[1], palette, |frame, area| {
                dashboard::product(frame, area, product, view, scroll, chart, palette)
            });
        } else {
            draw_message(
                frame,
                rows[1],
                "Product sentiment",
                vec!["Enter a product URL and press a to analyze its reviews.".to_string()],
                palette.text_secondary,
                palette,
            );
        }
    }

    fn draw_trends(&self, frame: &mut Frame<'_>, area: Rect, palette: &Palette, now: Instant) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.draw_input(
            frame,
            rows[0],
            "Keyword".to_string(),
            &self.trends_input,
            "Enter a keyword to track (i to edit)",
            palette,
        );

        if let Some(percent) = self.trends_remote.percent(now) {
            draw_progress(frame, rows[1], "Fetching trends", percent, palette);
        } else if let Some(error) = &self.trends_error {
            draw_message(
                frame,
                rows[1],
                "Error",
                vec![error.clone()],
                palette.error,
                palette,
            );
        } else if let Some(report) = &self.trends {
            boundary::guard(frame, rows[1], palette, |frame, area| {
                dashboard::trends(frame, area, &report.trends, &report.comparison, palette)
            });
        } else {
            draw_message(
                frame,
                rows[1],
                "Trends",
                vec!["Search a keyword to see mentions across platforms.".to_string()],
                palette.text_secondary,
                palette,
            );
        }
    }
}

fn draw_message(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    body: Vec<String>,
    color: Color,
    palette: &Palette,
) {
    let lines: Vec<Line> = body
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(color))))
        .collect();
    let block = Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_progress(frame: &mut Frame<'_>, area: Rect, label: &str, percent: f64, palette: &Palette) {
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .style(Style::default().bg(palette.panel_bg)),
        area,
    );
    let mut gauge_area = centered_rect(60, 30, area);
    gauge_area.height = gauge_area.height.clamp(1, 3);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border_focused)),
        )
        .gauge_style(Style::default().fg(palette.accent).bg(palette.panel_bg))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{label}… {percent:.0}%"));
    frame.render_widget(gauge, gauge_area);
}

fn draw_preview(frame: &mut Frame<'_>, area: Rect, result: &EmbedResult, palette: &Palette) {
    let preview = embed::preview(result);
    let mut lines: Vec<Line> = preview
        .body
        .lines()
        .map(|line| {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(palette.text_primary),
            ))
        })
        .collect();
    if let Some(source) = &preview.source {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            source.clone(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press a to analyze · o to open in a browser",
        Style::default()
            .fg(palette.text_secondary)
            .add_modifier(Modifier::ITALIC),
    )));
    let block = Block::default()
        .title(Span::styled(
            preview.title,
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border_focused))
        .style(Style::default().bg(palette.panel_bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_toast(frame: &mut Frame<'_>, area: Rect, toast: &Toast, palette: &Palette) {
    let width = TOAST_WIDTH.min(area.width);
    let text_width = width.saturating_sub(2).max(1) as usize;
    let wrapped = textwrap::wrap(&toast.message, text_width);
    let height = (wrapped.len() as u16 + 2).min(area.height);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    };
    let color = match toast.kind {
        ToastKind::Info => palette.accent,
        ToastKind::Success => palette.success,
        ToastKind::Warning => palette.warning,
        ToastKind::Error => palette.error,
    };
    let lines: Vec<Line> = wrapped
        .into_iter()
        .map(|line| Line::from(Span::styled(line.into_owned(), Style::default().fg(color))))
        .collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(palette.panel_focused_bg)),
        ),
        rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::analysis::AnalysisResult;
    use crate::config::ChartKind;
    use crate::data::{AnalysisService, EmbedService, ProductService, TextService, TrendService};
    use crate::link::Platform;
    use crate::storage;
    use crate::trends::PlatformStats;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use tempfile::TempDir;

    struct FakeBackend;

    impl EmbedService for FakeBackend {
        fn embed_html(&self, _platform: Platform, link: &str) -> Result<String, ApiError> {
            Ok(format!("<blockquote><p>hello</p><a href=\"{link}\">post</a></blockquote>"))
        }
    }

    impl AnalysisService for FakeBackend {
        fn analyze(&self, _platform: Platform, _link: &str) -> Result<AnalysisOutcome, ApiError> {
            Ok(AnalysisOutcome {
                result: AnalysisResult::from_value(json!({
                    "overall_sentiment": "positive",
                    "overall_score": 0.6,
                    "emotion_distribution": {"joy": 0.7, "anger": 0.3},
                    "total_comments": 12
                }))?,
                notice: Some("used a random sample of comments".to_string()),
            })
        }
    }

    impl TextService for FakeBackend {
        fn analyze_text(&self, _text: &str) -> Result<TextAnalysis, ApiError> {
            Ok(TextAnalysis {
                sentiment_score: 82.0,
                emotion_scores: BTreeMap::from([("joy".to_string(), 0.9)]),
                confidence_score: 0.8,
                key_phrases: vec!["lovely day".to_string()],
                word_sentiment_scores: BTreeMap::from([("lovely".to_string(), 0.9)]),
            })
        }

        fn enhance_text(&self, text: &str, style: EnhanceStyle) -> Result<String, ApiError> {
            Ok(format!("{text} ({})", style.as_str()))
        }
    }

    impl ProductService for FakeBackend {
        fn scrape(&self, _product_url: &str) -> Result<Product, ApiError> {
            Err(ApiError::Backend("scraper blocked".to_string()))
        }
    }

    impl TrendService for FakeBackend {
        fn keyword_trends(&self, keyword: &str) -> Result<KeywordTrends, ApiError> {
            Ok(KeywordTrends {
                keyword: keyword.to_string(),
                total_mentions: 3,
                ..KeywordTrends::default()
            })
        }

        fn platform_comparison(&self, keyword: &str) -> Result<PlatformComparison, ApiError> {
            Ok(PlatformComparison {
                keyword: keyword.to_string(),
                platforms: BTreeMap::from([(
                    "reddit".to_string(),
                    PlatformStats {
                        mentions: 3,
                        average_sentiment: 0.2,
                        positive: 0.5,
                        neutral: 0.3,
                        negative: 0.2,
                    },
                )]),
            })
        }
    }

    fn model(dir: &TempDir) -> Model {
        let store = Arc::new(
            storage::Store::open(storage::Options {
                path: Some(dir.path().join("state.db")),
            })
            .unwrap(),
        );
        let fake = Arc::new(FakeBackend);
        let services = Services {
            embed: fake.clone(),
            analysis: fake.clone(),
            text: fake.clone(),
            product: fake.clone(),
            trends: fake,
        };
        Model::new(Options {
            status_message: "ready".to_string(),
            services,
            state: session::State::hydrate(store, Theme::Dark, ChartKind::Bar).unwrap(),
            timing: Timing {
                debounce: Duration::ZERO,
                min_progress: Duration::ZERO,
            },
            toast_duration: Duration::from_secs(3),
            export_dir: dir.path().to_path_buf(),
        })
    }

    fn press(model: &mut Model, code: KeyCode) -> bool {
        model
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_text(model: &mut Model, text: &str) {
        press(model, KeyCode::Char('i'));
        for ch in text.chars() {
            press(model, KeyCode::Char(ch));
        }
        press(model, KeyCode::Esc);
    }

    /// Waits for `count` worker responses and lets the model settle.
    fn settle(model: &mut Model, count: usize) {
        for _ in 0..count {
            let message = model
                .response_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("worker response");
            model.handle_async_response(message, Instant::now());
        }
        model.tick(Instant::now());
    }

    fn render(model: &Model) {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).unwrap();
        terminal.draw(|frame| model.draw(frame)).unwrap();
    }

    #[test]
    fn quit_only_in_normal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('i'));
        assert!(!press(&mut model, KeyCode::Char('q')));
        assert_eq!(model.social_input, "q");
        press(&mut model, KeyCode::Esc);
        assert!(press(&mut model, KeyCode::Char('q')));
    }

    #[test]
    fn tabs_cycle_and_jump() {
        assert_eq!(Tab::Trends.next(), Tab::Social);
        assert_eq!(Tab::Social.previous(), Tab::Trends);
        assert_eq!(Tab::from_digit('3'), Some(Tab::Product));
        assert_eq!(Tab::from_digit('0'), None);
        assert_eq!(Tab::from_digit('9'), None);
    }

    #[test]
    fn input_tail_keeps_the_end_visible() {
        assert_eq!(input_tail("short", 10), "short");
        assert_eq!(input_tail("https://youtu.be/abc", 6), "be/abc");
        assert_eq!(input_tail("日本語", 4), "本語");
    }

    #[test]
    fn remote_ignores_superseded_requests() {
        let now = Instant::now();
        let mut remote: Remote<u32> = Remote::default();
        let first = remote.start(now, Duration::ZERO);
        let second = remote.start(now, Duration::ZERO);
        assert!(!remote.accept(first, Ok(1), now));
        assert!(remote.accept(second, Ok(2), now));
        assert!(matches!(remote.take_ready(now), Some(Ok(2))));
        assert!(!remote.is_pending());
    }

    #[test]
    fn remote_holds_fast_results_until_the_gate_opens() {
        let start = Instant::now();
        let mut remote: Remote<u32> = Remote::default();
        let id = remote.start(start, Duration::from_millis(1200));
        assert!(remote.accept(id, Ok(7), start + Duration::from_millis(100)));
        assert!(remote.take_ready(start + Duration::from_millis(500)).is_none());
        assert!(remote.take_ready(start + Duration::from_millis(1200)).is_some());
    }

    #[test]
    fn short_text_shows_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('2'));
        type_text(&mut model, "too short");
        press(&mut model, KeyCode::Char('a'));
        let toast = model.toast.as_ref().unwrap();
        assert_eq!(toast.message, "Please enter at least 3 words to analyze");
        assert_eq!(toast.kind, ToastKind::Warning);
        assert!(!model.text_remote.is_pending());
    }

    #[test]
    fn text_analysis_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('2'));
        type_text(&mut model, "what a lovely day");
        press(&mut model, KeyCode::Char('a'));
        settle(&mut model, 1);
        let analysis = model.state.text_analysis().unwrap();
        assert_eq!(analysis.sentiment_score, 82.0);
        assert_eq!(model.state.text_input(), "what a lovely day");
        render(&model);
    }

    #[test]
    fn enhancement_requires_a_style() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('2'));
        type_text(&mut model, "make this nicer please");
        press(&mut model, KeyCode::Char('e'));
        assert!(!model.enhance_remote.is_pending());
        assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Warning);

        press(&mut model, KeyCode::Char('s'));
        press(&mut model, KeyCode::Char('e'));
        settle(&mut model, 1);
        assert_eq!(
            model.state.enhanced_text(),
            Some("make this nicer please (technical)")
        );

        press(&mut model, KeyCode::Char('W'));
        let csv = std::fs::read_to_string(dir.path().join("enhanced-text.csv")).unwrap();
        assert!(csv.starts_with("Original Text,Enhanced Text\n"));

        press(&mut model, KeyCode::Char('d'));
        let doc = std::fs::read_to_string(dir.path().join("enhanced-text.doc")).unwrap();
        assert!(doc.contains("<p>make this nicer please (technical)</p>"));
    }

    #[test]
    fn text_can_be_loaded_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("review.txt"), "the soup was wonderful").unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('2'));
        press(&mut model, KeyCode::Char('l'));
        assert_eq!(model.input_mode, InputMode::FilePath);
        assert!(model.footer_text().starts_with("File path"));
        render(&model);
        for ch in "review.txt".chars() {
            press(&mut model, KeyCode::Char(ch));
        }
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.input_mode, InputMode::Normal);
        assert_eq!(model.text_input, "the soup was wonderful");
        assert_eq!(model.state.text_input(), "the soup was wonderful");
        assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Success);

        press(&mut model, KeyCode::Char('l'));
        for ch in "notes.pdf".chars() {
            press(&mut model, KeyCode::Char(ch));
        }
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Error);
        assert_eq!(model.text_input, "the soup was wonderful");
    }

    #[test]
    fn product_failure_shows_fixed_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('3'));
        press(&mut model, KeyCode::Char('a'));
        assert!(!model.product_remote.is_pending());

        type_text(&mut model, "https://shop.example/item/1");
        press(&mut model, KeyCode::Char('a'));
        settle(&mut model, 1);
        assert_eq!(model.product_error.as_deref(), Some(PRODUCT_FAILURE));
        render(&model);
    }

    #[test]
    fn trends_fetch_keyword_and_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('4'));
        type_text(&mut model, "rust");
        press(&mut model, KeyCode::Char('a'));
        settle(&mut model, 1);
        let report = model.trends.as_ref().unwrap();
        assert_eq!(report.trends.keyword, "rust");
        assert_eq!(report.comparison.platforms.len(), 1);
        render(&model);
    }

    #[test]
    fn social_link_previews_then_analyzes() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        type_text(&mut model, "https://youtu.be/dQw4w9WgXcQ");
        model.tick(Instant::now());
        settle(&mut model, 1);
        assert_eq!(model.social.lifecycle(), Lifecycle::EmbedReady);
        render(&model);

        press(&mut model, KeyCode::Char('a'));
        settle(&mut model, 1);
        assert_eq!(model.social.lifecycle(), Lifecycle::AnalysisReady);
        assert!(model.state.social_analysis().is_some());
        assert_eq!(model.toast.as_ref().unwrap().kind, ToastKind::Warning);
        press(&mut model, KeyCode::Char('c'));
        render(&model);
    }

    #[test]
    fn clear_all_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        type_text(&mut model, "https://youtu.be/dQw4w9WgXcQ");
        press(&mut model, KeyCode::Char('2'));
        type_text(&mut model, "keep this text around");
        press(&mut model, KeyCode::Char('x'));
        assert!(model.social_input.is_empty());
        assert!(model.text_input.is_empty());
        assert_eq!(model.social.lifecycle(), Lifecycle::Idle);
        assert_eq!(model.state.text_input(), "");
    }

    #[test]
    fn display_toggles_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        press(&mut model, KeyCode::Char('t'));
        press(&mut model, KeyCode::Char('c'));
        assert_eq!(model.state.theme(), Theme::Light);
        assert_eq!(model.state.chart(), ChartKind::Strip);
        press(&mut model, KeyCode::Char('x'));
        assert_eq!(model.state.theme(), Theme::Light);
        assert_eq!(model.state.chart(), ChartKind::Strip);
        assert_ne!(
            Palette::for_theme(Theme::Light),
            Palette::for_theme(Theme::Dark)
        );
        render(&model);
    }

    #[test]
    fn toasts_expire() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model(&dir);
        let now = Instant::now();
        model.show_toast("hello", ToastKind::Info, now);
        assert!(!model.tick(now + Duration::from_secs(1)));
        assert!(model.tick(now + Duration::from_secs(3)));
        assert!(model.toast.is_none());
    }
}
