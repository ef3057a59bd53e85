//! The six query results, drawn top to bottom in display order.
//!
//! When the area is tall enough each section gets its own block and the two
//! distributions are drawn as full charts. Otherwise the panel falls back to a
//! compact layout with one strip per distribution, and scrolls when even that
//! does not fit.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset as ChartDataset, GraphType,
        Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
    },
};

use crate::chart_data::{bucket_counts, format_axis_label, hourly_counts, ChartSpec};
use crate::config::Theme;
use crate::query::QueryResults;
use crate::report::{results_heading, ResultSection, NO_MATCHES};

/// Plot rows of a full-size chart, below its title line.
const CHART_ROWS: u16 = 8;
/// `MM-DD` under each bar.
const DAY_LABEL_WIDTH: u16 = 5;

/// Scroll position of the compact layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResultsScroll {
    pub offset: usize,
    /// Largest useful offset as of the last render; zero when everything fits.
    pub max: usize,
}

impl ResultsScroll {
    pub fn scroll_down(&mut self, rows: usize) {
        self.offset = (self.offset + rows).min(self.max);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct ResultsPanel<'a> {
    results: &'a QueryResults,
    theme: &'a Theme,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(results: &'a QueryResults, theme: &'a Theme) -> Self {
        Self { results, theme }
    }

    fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.theme.get("primary"))
            .add_modifier(Modifier::BOLD)
    }

    fn text_style(&self) -> Style {
        Style::default().fg(self.theme.get("text_primary"))
    }

    /// Section body as one string; places are comma separated.
    fn section_text(&self, section: ResultSection) -> String {
        let body = section.body(self.results);
        if section == ResultSection::PlaceIds {
            body.join(", ")
        } else {
            body.join(" ")
        }
    }

    fn full_heights(&self, width: u16) -> [u16; 7] {
        let text = |section| 1 + wrap_words(&self.section_text(section), width).len() as u16;
        [
            1,
            1 + CHART_ROWS,
            text(ResultSection::UniqueUsers),
            text(ResultSection::AverageLikes),
            text(ResultSection::PlaceIds),
            1 + CHART_ROWS,
            text(ResultSection::TopUser),
        ]
    }

    fn compact_lines(&self, section: ResultSection, width: u16) -> Vec<String> {
        let line = format!(
            "{}: {}",
            section.heading(&self.results.term),
            self.section_text(section)
        );
        wrap_words(&line, width)
    }

    fn compact_heights(&self, width: u16) -> [u16; 7] {
        let text = |section| self.compact_lines(section, width).len() as u16;
        [
            1,
            2,
            text(ResultSection::UniqueUsers),
            text(ResultSection::AverageLikes),
            text(ResultSection::PlaceIds),
            2,
            text(ResultSection::TopUser),
        ]
    }

    fn render_heading(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(results_heading(&self.results.term))
            .style(
                Style::default()
                    .fg(self.theme.get("secondary"))
                    .add_modifier(Modifier::BOLD),
            )
            .render(area, buf);
    }

    fn section_block(&self, section: ResultSection) -> Block<'static> {
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(self.theme.get("dimmed")))
            .title(Span::styled(
                section.heading(&self.results.term),
                self.heading_style(),
            ))
    }

    fn render_full(&self, area: Rect, buf: &mut Buffer, heights: [u16; 7]) {
        // Spare rows go to the two charts.
        let constraints = heights.iter().enumerate().map(|(i, &h)| match i {
            1 | 5 => Constraint::Min(h),
            _ => Constraint::Length(h),
        });
        let layout = Layout::vertical(constraints).split(area);
        self.render_heading(layout[0], buf);

        for (section, slot) in ResultSection::ALL.into_iter().zip(layout.iter().skip(1)) {
            match section {
                ResultSection::TweetsPerDay => self.render_per_day(*slot, buf),
                ResultSection::TweetsByTime => self.render_per_hour(*slot, buf),
                _ => {
                    let block = self.section_block(section);
                    let inner = block.inner(*slot);
                    block.render(*slot, buf);
                    let lines: Vec<Line> = wrap_words(&self.section_text(section), inner.width)
                        .into_iter()
                        .map(Line::from)
                        .collect();
                    Paragraph::new(lines)
                        .style(self.text_style())
                        .render(inner, buf);
                }
            }
        }
    }

    fn render_per_day(&self, area: Rect, buf: &mut Buffer) {
        let block = self.section_block(ResultSection::TweetsPerDay);
        let inner = block.inner(area);
        block.render(area, buf);

        let spec = ChartSpec::per_day(self.results);
        if spec.is_empty() {
            self.render_empty(inner, buf);
            return;
        }
        let n = spec.points.len() as u16;
        if n.saturating_mul(DAY_LABEL_WIDTH + 1) > inner.width {
            self.render_day_range(&spec, inner, buf);
            return;
        }
        let bars: Vec<Bar> = spec
            .labels
            .iter()
            .zip(&spec.points)
            .map(|(label, &(_, count))| {
                let short = label.get(5..).unwrap_or(label).to_string();
                Bar::default().value(count as u64).label(Line::from(short))
            })
            .collect();
        let bar_width = (inner.width.saturating_sub(n) / n.max(1)).clamp(DAY_LABEL_WIDTH, 10);
        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .bar_style(Style::default().fg(self.theme.get("chart_bar")))
            .value_style(
                Style::default()
                    .fg(self.theme.get("text_inverse"))
                    .bg(self.theme.get("chart_bar")),
            )
            .render(inner, buf);
    }

    /// Too many days for labelled bars: plot them over the whole date range.
    fn render_day_range(&self, spec: &ChartSpec, area: Rect, buf: &mut Buffer) {
        let [y_min, y_max] = spec.y_bounds();
        let label_style = self.text_style();
        let first = spec.labels.first().cloned().unwrap_or_default();
        let last = spec.labels.last().cloned().unwrap_or_default();
        let dataset = ChartDataset::default()
            .marker(symbols::Marker::HalfBlock)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(self.theme.get("chart_bar")))
            .data(&spec.points);
        let x_axis = Axis::default()
            .bounds(spec.x_bounds())
            .style(label_style)
            .labels([first, last].map(|d| Span::styled(d, label_style)));
        let y_axis = Axis::default()
            .bounds([y_min, y_max])
            .style(label_style)
            .labels([y_min, y_max].map(|v| Span::styled(format_axis_label(v), label_style)));
        Chart::new(vec![dataset])
            .x_axis(x_axis)
            .y_axis(y_axis)
            .legend_position(None)
            .render(area, buf);
    }

    fn render_per_hour(&self, area: Rect, buf: &mut Buffer) {
        let block = self.section_block(ResultSection::TweetsByTime);
        let inner = block.inner(area);
        block.render(area, buf);

        let spec = ChartSpec::per_hour(self.results);
        if spec.is_empty() {
            self.render_empty(inner, buf);
            return;
        }
        let [y_min, y_max] = spec.y_bounds();
        let label_style = self.text_style();
        let dataset = ChartDataset::default()
            .name(spec.y_label.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.get("chart_line")))
            .data(&spec.points);
        let x_axis = Axis::default()
            .title(spec.x_label.clone())
            .bounds(spec.x_bounds())
            .style(label_style)
            .labels(["00", "06", "12", "18", "23"].map(|h| Span::styled(h, label_style)));
        let y_axis = Axis::default()
            .bounds([y_min, y_max])
            .style(label_style)
            .labels(
                [y_min, (y_min + y_max) / 2.0, y_max]
                    .map(|v| Span::styled(format_axis_label(v), label_style)),
            );
        Chart::new(vec![dataset])
            .x_axis(x_axis)
            .y_axis(y_axis)
            .legend_position(None)
            .render(inner, buf);
    }

    fn render_empty(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(NO_MATCHES)
            .style(Style::default().fg(self.theme.get("dimmed")))
            .render(area, buf);
    }

    fn render_compact(&self, area: Rect, buf: &mut Buffer, heights: [u16; 7]) {
        let layout = Layout::vertical(heights.map(Constraint::Length)).split(area);
        self.render_heading(layout[0], buf);

        for (section, slot) in ResultSection::ALL.into_iter().zip(layout.iter().skip(1)) {
            match section {
                ResultSection::TweetsPerDay => {
                    let counts: Vec<u64> = self.results.tweets_per_day.values().copied().collect();
                    let first = self.results.tweets_per_day.keys().next();
                    let last = self.results.tweets_per_day.keys().next_back();
                    let ends = first
                        .zip(last)
                        .map(|(a, b)| (a.format("%Y-%m-%d").to_string(), b.format("%Y-%m-%d").to_string()));
                    self.render_strip(section, &counts, ends, *slot, buf);
                }
                ResultSection::TweetsByTime => {
                    let ends = (!self.results.tweets_by_time.is_empty())
                        .then(|| ("00".to_string(), "23".to_string()));
                    self.render_strip(section, &hourly_counts(self.results), ends, *slot, buf);
                }
                _ => {
                    let lines: Vec<Line> = self
                        .compact_lines(section, slot.width)
                        .into_iter()
                        .map(Line::from)
                        .collect();
                    Paragraph::new(lines)
                        .style(self.text_style())
                        .render(*slot, buf);
                }
            }
        }
    }

    /// Heading line, then one row of bars between the first and last x labels.
    fn render_strip(
        &self,
        section: ResultSection,
        counts: &[u64],
        ends: Option<(String, String)>,
        area: Rect,
        buf: &mut Buffer,
    ) {
        let [title, row] = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);
        Paragraph::new(format!("{}:", section.heading(&self.results.term)))
            .style(self.heading_style())
            .render(title, buf);

        let Some((first, last)) = ends else {
            self.render_empty(row, buf);
            return;
        };
        let [left, bars_area, right] = Layout::horizontal([
            Constraint::Length(first.chars().count() as u16 + 1),
            Constraint::Fill(1),
            Constraint::Length(last.chars().count() as u16 + 1),
        ])
        .areas(row);
        Paragraph::new(first).style(self.text_style()).render(left, buf);
        Paragraph::new(format!(" {}", last))
            .style(self.text_style())
            .render(right, buf);

        let bars: Vec<Bar> = bucket_counts(counts, usize::from(bars_area.width))
            .into_iter()
            .map(|count| Bar::default().value(count).text_value(String::new()))
            .collect();
        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(self.theme.get("chart_bar")))
            .render(bars_area, buf);
    }
}

impl StatefulWidget for ResultsPanel<'_> {
    type State = ResultsScroll;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ResultsScroll) {
        let full = self.full_heights(area.width);
        if full.iter().sum::<u16>() <= area.height {
            state.reset();
            self.render_full(area, buf, full);
            return;
        }
        let compact = self.compact_heights(area.width);
        if compact.iter().sum::<u16>() <= area.height {
            state.reset();
            self.render_compact(area, buf, compact);
            return;
        }

        // Draw the compact layout off screen and copy the visible rows, leaving
        // the right-most column for the scrollbar.
        let width = area.width.saturating_sub(1);
        let compact = self.compact_heights(width);
        let total: u16 = compact.iter().sum();
        state.max = usize::from(total.saturating_sub(area.height));
        state.offset = state.offset.min(state.max);

        let mut content = Buffer::empty(Rect::new(0, 0, width, total));
        self.render_compact(content.area, &mut content, compact);
        for y in 0..area.height {
            let source_y = y + state.offset as u16;
            for x in 0..width {
                buf[(area.x + x, area.y + y)] = content[(x, source_y)].clone();
            }
        }

        let mut scrollbar = ScrollbarState::new(state.max + 1).position(state.offset);
        Scrollbar::new(ScrollbarOrientation::VerticalRight).render(area, buf, &mut scrollbar);
    }
}

/// Greedy word wrap to `width` columns. Words wider than a line are split.
fn wrap_words(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(chars.drain(..width).collect());
        }
        if chars.is_empty() {
            continue;
        }
        let used = line.chars().count();
        if used > 0 && used + 1 + chars.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(chars);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
