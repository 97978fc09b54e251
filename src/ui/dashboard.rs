use anyhow::{ensure, Result};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    BarChart, Block, Borders, Cell, Gauge, Paragraph, Row, Sparkline, Table, Wrap,
};
use ratatui::Frame;

use super::Palette;
use crate::analysis::{SentimentBreakdown, Tone};
use crate::config::ChartKind;
use crate::product::{format_price, Product, ProductView};
use crate::text::{TextAnalysis, WordFilter};
use crate::trends::{KeywordTrends, PlatformComparison};

const FALLBACK_COLORS: [Color; 6] = [
    Color::Rgb(137, 180, 250),
    Color::Rgb(250, 179, 135),
    Color::Rgb(148, 226, 213),
    Color::Rgb(203, 166, 247),
    Color::Rgb(249, 226, 175),
    Color::Rgb(186, 194, 222),
];
const METER_FULL: char = '█';
const METER_EMPTY: char = '░';

pub(super) fn emotion_color(name: &str, index: usize) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "joy" | "happiness" | "positive" => Color::Rgb(249, 226, 175),
        "love" => Color::Rgb(245, 194, 231),
        "anger" | "negative" => Color::Rgb(243, 139, 168),
        "sadness" => Color::Rgb(137, 180, 250),
        "fear" => Color::Rgb(203, 166, 247),
        "surprise" => Color::Rgb(148, 226, 213),
        "disgust" => Color::Rgb(166, 227, 161),
        "neutral" => Color::Rgb(166, 173, 200),
        _ => FALLBACK_COLORS[index % FALLBACK_COLORS.len()],
    }
}

pub(super) fn tone_color(tone: Tone, palette: &Palette) -> Color {
    match tone {
        Tone::Positive => palette.success,
        Tone::Negative => palette.error,
        Tone::Neutral => palette.warning,
        Tone::Unknown => palette.text_secondary,
    }
}

/// `value` in [0, 1] as a fixed-width bar of block characters.
pub(super) fn meter(value: f64, width: usize) -> String {
    let filled = ((value.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(METER_FULL).take(filled));
    bar.extend(std::iter::repeat(METER_EMPTY).take(width - filled));
    bar
}

/// Cell widths for a proportion strip. Every non-zero share gets at least
/// one cell when there is room, and the widths always add up to `width`.
pub(super) fn strip_widths(shares: &[f64], width: usize) -> Vec<usize> {
    let total: f64 = shares.iter().filter(|s| **s > 0.0).sum();
    if shares.is_empty() || width == 0 || total <= 0.0 {
        return vec![0; shares.len()];
    }
    let mut widths: Vec<usize> = shares
        .iter()
        .map(|share| {
            let cells = (share.max(0.0) / total * width as f64).round() as usize;
            if *share > 0.0 {
                cells.max(1)
            } else {
                0
            }
        })
        .collect();
    let mut used: usize = widths.iter().sum();
    while used > width {
        let Some(widest) = (0..widths.len()).max_by_key(|&i| widths[i]) else {
            break;
        };
        widths[widest] -= 1;
        used -= 1;
    }
    if used < width {
        if let Some(widest) = (0..widths.len()).max_by_key(|&i| widths[i]) {
            widths[widest] += width - used;
        }
    }
    widths
}

fn panel<'a>(title: impl Into<String>, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            title.into(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg).fg(palette.text_primary))
}

fn percent_gauge<'a>(
    title: &str,
    percent: f64,
    label: String,
    color: Color,
    palette: &Palette,
) -> Gauge<'a> {
    Gauge::default()
        .block(panel(title.to_string(), palette))
        .gauge_style(Style::default().fg(color).bg(palette.panel_bg))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(label)
}

/// Emotion shares drawn either as vertical bars or as a proportion strip.
fn emotion_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    ranked: &[(&str, f64)],
    chart: ChartKind,
    palette: &Palette,
) {
    let block = panel(format!("{title} · {} (c)", chart.label()), palette);
    match chart {
        ChartKind::Bar => {
            let inner_width = area.width.saturating_sub(2).max(1);
            let count = ranked.len().max(1) as u16;
            let bar_width = (inner_width / count).saturating_sub(1).clamp(3, 12);
            let data: Vec<(String, u64)> = ranked
                .iter()
                .map(|(name, share)| {
                    let label: String = name.chars().take(bar_width as usize).collect();
                    (label, (share * 100.0).round() as u64)
                })
                .collect();
            let bars: Vec<(&str, u64)> = data.iter().map(|(n, v)| (n.as_str(), *v)).collect();
            let widget = BarChart::default()
                .block(block)
                .data(bars.as_slice())
                .max(100)
                .bar_width(bar_width)
                .bar_gap(1)
                .bar_style(Style::default().fg(palette.accent))
                .value_style(
                    Style::default()
                        .fg(palette.panel_bg)
                        .bg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                )
                .label_style(Style::default().fg(palette.text_secondary));
            frame.render_widget(widget, area);
        }
        ChartKind::Strip => {
            let inner_width = area.width.saturating_sub(2) as usize;
            let shares: Vec<f64> = ranked.iter().map(|(_, share)| *share).collect();
            let widths = strip_widths(&shares, inner_width);
            let strip: Vec<Span> = ranked
                .iter()
                .zip(widths.iter())
                .enumerate()
                .map(|(idx, ((name, _), cells))| {
                    Span::styled(
                        METER_FULL.to_string().repeat(*cells),
                        Style::default().fg(emotion_color(name, idx)),
                    )
                })
                .collect();
            let mut lines = vec![Line::from(strip.clone()), Line::from(strip), Line::default()];
            for (idx, (name, share)) in ranked.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled("■ ", Style::default().fg(emotion_color(name, idx))),
                    Span::styled(
                        format!("{name:<12}"),
                        Style::default().fg(palette.text_primary),
                    ),
                    Span::styled(
                        format!("{:>5.1}%", share * 100.0),
                        Style::default().fg(palette.text_secondary),
                    ),
                ]));
            }
            frame.render_widget(Paragraph::new(lines).block(block), area);
        }
    }
}

fn word_cloud_lines<'a>(
    words: &[(String, f64, Color)],
    palette: &Palette,
) -> Vec<Line<'a>> {
    if words.is_empty() {
        return vec![Line::from(Span::styled(
            "No words to show.",
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::ITALIC),
        ))];
    }
    let max = words
        .iter()
        .map(|(_, weight, _)| weight.abs())
        .fold(0.0_f64, f64::max);
    let mut spans = Vec::with_capacity(words.len() * 2);
    for (word, weight, color) in words {
        let relative = if max > 0.0 { weight.abs() / max } else { 0.0 };
        let mut style = Style::default().fg(*color);
        if relative >= 0.66 {
            style = style.add_modifier(Modifier::BOLD);
            spans.push(Span::styled(word.to_uppercase(), style));
        } else if relative >= 0.33 {
            spans.push(Span::styled(word.clone(), style.add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::styled(word.clone(), style.add_modifier(Modifier::DIM)));
        }
        spans.push(Span::raw("  "));
    }
    vec![Line::from(spans)]
}

/// Full dashboard for one social sentiment breakdown.
pub(super) fn sentiment(
    frame: &mut Frame<'_>,
    area: Rect,
    breakdown: &SentimentBreakdown,
    chart: ChartKind,
    palette: &Palette,
) -> Result<()> {
    ensure!(
        !breakdown.emotion_distribution.is_empty(),
        "analysis has no emotion distribution"
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(area);
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let tone = breakdown.tone();
    let label = if breakdown.overall_sentiment.trim().is_empty() {
        tone.label().to_string()
    } else {
        breakdown.overall_sentiment.clone()
    };
    frame.render_widget(
        percent_gauge(
            "Overall sentiment",
            breakdown.score_percent(),
            format!("{label} · score {:+.2}", breakdown.overall_score),
            tone_color(tone, palette),
            palette,
        ),
        header[0],
    );

    let (confidence, confidence_label) = match &breakdown.model_confidence {
        Some(conf) => (
            conf.percent(),
            format!("{} · {:.0}%", conf.display_label(), conf.percent()),
        ),
        None => (0.0, "Unknown".to_string()),
    };
    frame.render_widget(
        percent_gauge(
            "Model confidence",
            confidence,
            confidence_label,
            palette.accent,
            palette,
        ),
        header[1],
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    emotion_chart(
        frame,
        middle[0],
        "Emotions",
        &breakdown.ranked_emotions(),
        chart,
        palette,
    );

    let meter_width = middle[1].width.saturating_sub(24).clamp(4, 20) as usize;
    let mut details: Vec<Line> = Vec::new();
    for (name, value) in &breakdown.sentiment_intensity {
        let tone = Tone::from_label(name);
        details.push(Line::from(vec![
            Span::styled(
                format!("{name:<9}"),
                Style::default().fg(palette.text_primary),
            ),
            Span::styled(
                meter(*value, meter_width),
                Style::default().fg(tone_color(tone, palette)),
            ),
            Span::styled(
                format!(" {value:.2}"),
                Style::default().fg(palette.text_secondary),
            ),
        ]));
    }
    if !details.is_empty() {
        details.push(Line::default());
    }
    if !breakdown.dominant_emotion.is_empty() {
        details.push(Line::from(vec![
            Span::styled("Dominant  ", Style::default().fg(palette.text_secondary)),
            Span::styled(
                breakdown.dominant_emotion.clone(),
                Style::default()
                    .fg(emotion_color(&breakdown.dominant_emotion, 0))
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    details.push(Line::from(vec![
        Span::styled("Comments  ", Style::default().fg(palette.text_secondary)),
        Span::styled(
            breakdown.total_comments.to_string(),
            Style::default().fg(palette.text_primary),
        ),
    ]));
    if let Some(comment) = breakdown.unique_comment.as_deref().filter(|c| !c.is_empty()) {
        details.push(Line::default());
        details.push(Line::from(Span::styled(
            format!("“{comment}”"),
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    frame.render_widget(
        Paragraph::new(details)
            .block(panel("Intensity", palette))
            .wrap(Wrap { trim: true }),
        middle[1],
    );

    let words: Vec<(String, f64, Color)> = breakdown
        .wordcloud
        .iter()
        .take(40)
        .enumerate()
        .map(|(idx, word)| (word.text.clone(), word.value, FALLBACK_COLORS[idx % FALLBACK_COLORS.len()]))
        .collect();
    frame.render_widget(
        Paragraph::new(word_cloud_lines(&words, palette))
            .block(panel("Word frequency", palette))
            .wrap(Wrap { trim: true }),
        rows[2],
    );
    Ok(())
}

/// Dashboard for a free-text analysis.
pub(super) fn text(
    frame: &mut Frame<'_>,
    area: Rect,
    analysis: &TextAnalysis,
    filter: WordFilter,
    chart: ChartKind,
    palette: &Palette,
) -> Result<()> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let score = analysis.score_percent();
    let tone = Tone::from_score(score / 50.0 - 1.0);
    frame.render_widget(
        percent_gauge(
            "Sentiment",
            score,
            format!("{} · {score:.0}/100", tone.label()),
            tone_color(tone, palette),
            palette,
        ),
        header[0],
    );
    frame.render_widget(
        percent_gauge(
            "Confidence",
            analysis.confidence_percent(),
            format!("{:.0}%", analysis.confidence_percent()),
            palette.accent,
            palette,
        ),
        header[1],
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    let ranked = analysis.ranked_emotions();
    if ranked.is_empty() {
        frame.render_widget(
            Paragraph::new("No emotions detected.").block(panel("Emotions", palette)),
            middle[0],
        );
    } else {
        emotion_chart(frame, middle[0], "Emotions", &ranked, chart, palette);
    }

    let phrases: Vec<Line> = if analysis.key_phrases.is_empty() {
        vec![Line::from(Span::styled(
            "No key phrases found.",
            Style::default().fg(palette.text_secondary),
        ))]
    } else {
        analysis
            .key_phrases
            .iter()
            .map(|phrase| {
                Line::from(vec![
                    Span::styled("• ", Style::default().fg(palette.accent)),
                    Span::styled(phrase.clone(), Style::default().fg(palette.text_primary)),
                ])
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(phrases)
            .block(panel("Key phrases", palette))
            .wrap(Wrap { trim: true }),
        middle[1],
    );

    let words: Vec<(String, f64, Color)> = analysis
        .words(filter)
        .into_iter()
        .take(40)
        .map(|(word, score)| {
            (
                word.to_string(),
                score,
                tone_color(Tone::from_score(score), palette),
            )
        })
        .collect();
    frame.render_widget(
        Paragraph::new(word_cloud_lines(&words, palette))
            .block(panel(format!("Words · {} (f)", filter.label()), palette))
            .wrap(Wrap { trim: true }),
        rows[2],
    );
    Ok(())
}

fn distribution_lines<'a>(
    values: &std::collections::BTreeMap<String, f64>,
    width: usize,
    palette: &Palette,
) -> Vec<Line<'a>> {
    let total: f64 = values.values().filter(|v| **v > 0.0).sum();
    values
        .iter()
        .enumerate()
        .map(|(idx, (name, value))| {
            let share = if total > 0.0 { value.max(0.0) / total } else { 0.0 };
            let color = match Tone::from_label(name) {
                Tone::Unknown => emotion_color(name, idx),
                tone => tone_color(tone, palette),
            };
            Line::from(vec![
                Span::styled(format!("{name:<10}"), Style::default().fg(palette.text_primary)),
                Span::styled(meter(share, width), Style::default().fg(color)),
                Span::styled(
                    format!(" {:>5.1}%", share * 100.0),
                    Style::default().fg(palette.text_secondary),
                ),
            ])
        })
        .collect()
}

fn rating_stars(rating: f64) -> String {
    let full = rating.clamp(0.0, 5.0).round() as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

pub(super) fn product(
    frame: &mut Frame<'_>,
    area: Rect,
    product: &Product,
    view: ProductView,
    scroll: u16,
    chart: ChartKind,
    palette: &Palette,
) -> Result<()> {
    match view {
        ProductView::Overview => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(6), Constraint::Min(6)])
                .split(area);
            let summary = vec![
                Line::from(Span::styled(
                    product.name.clone(),
                    Style::default()
                        .fg(palette.text_primary)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled("Price    ", Style::default().fg(palette.text_secondary)),
                    Span::raw(format_price(product.price)),
                ]),
                Line::from(vec![
                    Span::styled("Rating   ", Style::default().fg(palette.text_secondary)),
                    Span::styled(
                        rating_stars(product.average_rating),
                        Style::default().fg(palette.warning),
                    ),
                    Span::raw(format!(" {:.1}", product.average_rating)),
                ]),
                Line::from(vec![
                    Span::styled("Reviews  ", Style::default().fg(palette.text_secondary)),
                    Span::raw(product.total_reviews.to_string()),
                ]),
            ];
            frame.render_widget(
                Paragraph::new(summary).block(panel("Product", palette)),
                rows[0],
            );

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(rows[1]);
            let width = columns[0].width.saturating_sub(22).clamp(4, 24) as usize;
            frame.render_widget(
                Paragraph::new(distribution_lines(
                    &product.sentiment_distribution,
                    width,
                    palette,
                ))
                .block(panel("Review sentiment", palette)),
                columns[0],
            );
            let total: f64 = product
                .emotion_distribution
                .values()
                .filter(|v| **v > 0.0)
                .sum();
            let mut ranked: Vec<(&str, f64)> = product
                .emotion_distribution
                .iter()
                .map(|(name, value)| {
                    let share = if total > 0.0 { value.max(0.0) / total } else { 0.0 };
                    (name.as_str(), share)
                })
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            if ranked.is_empty() {
                frame.render_widget(
                    Paragraph::new("No emotion data.").block(panel("Emotions", palette)),
                    columns[1],
                );
            } else {
                emotion_chart(frame, columns[1], "Emotions", &ranked, chart, palette);
            }
        }
        ProductView::Reviews => {
            let mut lines: Vec<Line> = Vec::new();
            if product.reviews.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No reviews found.",
                    Style::default().fg(palette.text_secondary),
                )));
            }
            for review in &product.reviews {
                let tone = review.tone();
                let mut header = vec![Span::styled(
                    review.title.clone(),
                    Style::default()
                        .fg(palette.text_primary)
                        .add_modifier(Modifier::BOLD),
                )];
                if let Some(rating) = review.rating {
                    header.push(Span::styled(
                        format!("  {}", rating_stars(rating)),
                        Style::default().fg(palette.warning),
                    ));
                }
                if let Some(date) = review.display_date() {
                    header.push(Span::styled(
                        format!("  {date}"),
                        Style::default().fg(palette.text_secondary),
                    ));
                }
                header.push(Span::styled(
                    format!("  [{}]", tone.label()),
                    Style::default()
                        .fg(tone_color(tone, palette))
                        .add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::from(header));
                lines.push(Line::from(Span::styled(
                    review.content.clone(),
                    Style::default().fg(palette.text_primary),
                )));
                lines.push(Line::default());
            }
            frame.render_widget(
                Paragraph::new(lines)
                    .block(panel(
                        format!("Reviews ({}) · j/k scroll", product.reviews.len()),
                        palette,
                    ))
                    .wrap(Wrap { trim: true })
                    .scroll((scroll, 0)),
                area,
            );
        }
        ProductView::Recommendations => {
            let header = Row::new(["Product", "Rating", "Price", "Reviews", "Match"]).style(
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            );
            let rows: Vec<Row> = product
                .recommendations
                .iter()
                .map(|rec| {
                    let badge = if rec.is_close_match() {
                        Cell::from(format!("{:.0}% high", rec.similarity_score * 100.0))
                            .style(Style::default().fg(palette.success))
                    } else {
                        Cell::from(format!("{:.0}%", rec.similarity_score * 100.0))
                            .style(Style::default().fg(palette.text_secondary))
                    };
                    Row::new(vec![
                        Cell::from(rec.name.clone()),
                        Cell::from(format!("{:.1}", rec.average_rating)),
                        Cell::from(format_price(rec.price)),
                        Cell::from(rec.total_reviews.to_string()),
                        badge,
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [
                    Constraint::Min(20),
                    Constraint::Length(7),
                    Constraint::Length(10),
                    Constraint::Length(8),
                    Constraint::Length(10),
                ],
            )
            .header(header)
            .block(panel("Recommendations", palette))
            .style(Style::default().fg(palette.text_primary));
            frame.render_widget(table, area);
        }
    }
    Ok(())
}

pub(super) fn trends(
    frame: &mut Frame<'_>,
    area: Rect,
    trends: &KeywordTrends,
    comparison: &PlatformComparison,
    palette: &Palette,
) -> Result<()> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(5),
        ])
        .split(area);

    let tone = Tone::from_score(trends.average_sentiment);
    let summary = Line::from(vec![
        Span::styled(
            trends.keyword.clone(),
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} mentions", trends.total_mentions),
            Style::default().fg(palette.text_secondary),
        ),
        Span::styled(
            format!("  avg sentiment {:+.2} ({})", trends.average_sentiment, tone.label()),
            Style::default().fg(tone_color(tone, palette)),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(summary).block(panel("Keyword", palette)),
        rows[0],
    );

    let series = trends.mention_series();
    let title = match trends.peak() {
        Some(peak) => format!("Mentions over time · peak {} on {}", peak.mentions, peak.date),
        None => "Mentions over time".to_string(),
    };
    frame.render_widget(
        Sparkline::default()
            .block(panel(title, palette))
            .data(&series)
            .style(Style::default().fg(palette.accent)),
        rows[1],
    );

    let header = Row::new(["Platform", "Mentions", "Avg", "Positive", "Neutral", "Negative"])
        .style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    let table_rows: Vec<Row> = comparison
        .ranked()
        .into_iter()
        .map(|(name, stats)| {
            let tone = Tone::from_score(stats.average_sentiment);
            Row::new(vec![
                Cell::from(name.to_string()),
                Cell::from(stats.mentions.to_string()),
                Cell::from(format!("{:+.2}", stats.average_sentiment))
                    .style(Style::default().fg(tone_color(tone, palette))),
                Cell::from(format!("{:.0}%", stats.positive * 100.0)),
                Cell::from(format!("{:.0}%", stats.neutral * 100.0)),
                Cell::from(format!("{:.0}%", stats.negative * 100.0)),
            ])
        })
        .collect();
    let table = Table::new(
        table_rows,
        [
            Constraint::Min(12),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(panel("Platforms", palette))
    .style(Style::default().fg(palette.text_primary));
    frame.render_widget(table, rows[2]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_fills_proportionally() {
        assert_eq!(meter(0.5, 4), "██░░");
        assert_eq!(meter(1.7, 3), "███");
        assert_eq!(meter(-1.0, 2), "░░");
    }

    #[test]
    fn strip_widths_cover_the_row() {
        let widths = strip_widths(&[0.6, 0.3, 0.1], 20);
        assert_eq!(widths.iter().sum::<usize>(), 20);
        assert_eq!(widths, vec![12, 6, 2]);

        let tiny = strip_widths(&[0.98, 0.01, 0.01], 10);
        assert_eq!(tiny.iter().sum::<usize>(), 10);
        assert!(tiny.iter().all(|w| *w >= 1));

        assert_eq!(strip_widths(&[0.0, 0.0], 10), vec![0, 0]);
    }

    #[test]
    fn known_emotions_have_fixed_colors() {
        assert_eq!(emotion_color("Joy", 3), emotion_color("joy", 0));
        assert_eq!(emotion_color("mystery", 1), FALLBACK_COLORS[1]);
    }

    #[test]
    fn stars_round_ratings() {
        assert_eq!(rating_stars(4.4), "★★★★☆");
        assert_eq!(rating_stars(9.0), "★★★★★");
    }
}
