use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

/// Bottom key bar. Actions that need a dataset are drawn dimmed until one is loaded.
pub struct Controls {
    pub dataset_loaded: bool,
    pub row_count: Option<usize>,
    pub bg: Color,
    pub dimmed: Color,
}

impl Controls {
    pub fn new(dataset_loaded: bool) -> Self {
        Self {
            dataset_loaded,
            row_count: None,
            bg: Color::Indexed(236),
            dimmed: Color::DarkGray,
        }
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn with_colors(mut self, bg: Color, dimmed: Color) -> Self {
        self.bg = bg;
        self.dimmed = dimmed;
        self
    }
}

/// (key, label, needs a dataset)
const CONTROLS: [(&str, &str, bool); 6] = [
    ("o", "Open", false),
    ("/", "Term", true),
    ("r", "Query", true),
    ("e", "Export", true),
    ("?", "Help", false),
    ("q", "Quit", false),
];

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints: Vec<Constraint> = CONTROLS
            .iter()
            .flat_map(|(key, label, _)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 2),
                    Constraint::Length(label.chars().count() as u16 + 1),
                ]
            })
            .collect();
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(16));
        }
        constraints.push(Constraint::Fill(1));
        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let bar = Style::default().bg(self.bg);
        for (i, (key, label, needs_dataset)) in CONTROLS.iter().enumerate() {
            let inert = *needs_dataset && !self.dataset_loaded;
            let style = if inert {
                Style::default().fg(self.dimmed)
            } else {
                Style::default()
            };
            Paragraph::new(*key)
                .style(style.bold())
                .centered()
                .render(layout[i * 2], buf);
            Paragraph::new(*label)
                .style(style.bg(self.bg))
                .render(layout[i * 2 + 1], buf);
        }

        let mut next = CONTROLS.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(bar)
                .right_aligned()
                .render(layout[next], buf);
            next += 1;
        }
        Paragraph::new("").style(bar).render(layout[next], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(controls: &Controls) -> Buffer {
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        controls.render(area, &mut buf);
        buf
    }

    #[test]
    fn query_keys_dimmed_without_dataset() {
        let buf = rendered(&Controls::new(false));
        // "o" is at x=1, "/" at x=1+3+5=9
        assert_ne!(buf[(1, 0)].fg, Color::DarkGray);
        assert_eq!(buf[(9, 0)].symbol(), "/");
        assert_eq!(buf[(9, 0)].fg, Color::DarkGray);
    }

    #[test]
    fn row_count_shown() {
        let buf = rendered(&Controls::new(true).with_row_count(42));
        let line: String = (0..80).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(line.contains("Rows: 42"));
        assert!(line.contains("Query"));
    }
}
