use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::Palette;

pub(super) const FALLBACK_TITLE: &str = "Something went wrong";

/// Runs a renderer for `area`. An `Err` or a panic from inside it replaces
/// the area with a static fallback card instead of taking the UI down.
pub(super) fn guard<F>(frame: &mut Frame<'_>, area: Rect, palette: &Palette, render: F) -> bool
where
    F: FnOnce(&mut Frame<'_>, Rect) -> Result<()>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| render(frame, area)));
    let reason = match outcome {
        Ok(Ok(())) => return true,
        Ok(Err(err)) => format!("{err:#}"),
        Err(payload) => panic_message(payload.as_ref()),
    };
    tracing::error!(reason = %reason, "dashboard renderer failed");
    fallback(frame, area, palette);
    false
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "renderer panicked".to_string()
    }
}

fn fallback(frame: &mut Frame<'_>, area: Rect, palette: &Palette) {
    frame.render_widget(Clear, area);
    let body = vec![
        Line::from(Span::styled(
            FALLBACK_TITLE,
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "This view could not be displayed. Press r to retry or x to clear saved results.",
            Style::default().fg(palette.text_secondary),
        )),
    ];
    let card = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.error))
                .style(Style::default().bg(palette.panel_bg)),
        );
    frame.render_widget(card, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use ratatui::backend::TestBackend;
    use ratatui::widgets::Paragraph;
    use ratatui::Terminal;

    fn rendered(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn successful_render_is_untouched() {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        let palette = Palette::for_theme(Theme::Dark);
        let mut ok = false;
        terminal
            .draw(|frame| {
                let area = frame.size();
                ok = guard(frame, area, &palette, |frame, area| {
                    frame.render_widget(Paragraph::new("all good"), area);
                    Ok(())
                });
            })
            .unwrap();
        assert!(ok);
        assert!(rendered(&terminal).contains("all good"));
    }

    #[test]
    fn errors_show_fallback_card() {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        let palette = Palette::for_theme(Theme::Light);
        terminal
            .draw(|frame| {
                let area = frame.size();
                guard(frame, area, &palette, |_, _| {
                    anyhow::bail!("no emotions to chart")
                });
            })
            .unwrap();
        assert!(rendered(&terminal).contains(FALLBACK_TITLE));
    }

    #[test]
    fn panics_show_fallback_card() {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        let palette = Palette::for_theme(Theme::Dark);
        let mut ok = true;
        terminal
            .draw(|frame| {
                let area = frame.size();
                ok = guard(frame, area, &palette, |frame, area| {
                    frame.render_widget(Paragraph::new("half drawn"), area);
                    panic!("chart exploded");
                });
            })
            .unwrap();
        assert!(!ok);
        let screen = rendered(&terminal);
        assert!(screen.contains(FALLBACK_TITLE));
        assert!(!screen.contains("half drawn"));
    }
}
