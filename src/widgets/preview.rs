use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::dataset::Dataset;

const MAX_CELL_WIDTH: u16 = 40;

/// First rows of the loaded dataset, one column per file column.
pub struct Preview<'a> {
    dataset: &'a Dataset,
    rows: usize,
    header_color: Color,
    border_color: Color,
}

impl<'a> Preview<'a> {
    pub fn new(dataset: &'a Dataset, rows: usize) -> Self {
        Self {
            dataset,
            rows,
            header_color: Color::White,
            border_color: Color::Cyan,
        }
    }

    pub fn with_colors(mut self, header: Color, border: Color) -> Self {
        self.header_color = header;
        self.border_color = border;
        self
    }

    /// Rows needed to draw the table with its borders and header.
    pub fn height(dataset: &Dataset, rows: usize) -> u16 {
        u16::try_from(dataset.height().min(rows))
            .unwrap_or(u16::MAX)
            .saturating_add(3)
    }
}

impl Widget for Preview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let headers = self.dataset.column_names();
        let rows = self.dataset.preview_rows(self.rows);

        // Each column is as wide as its widest shown value, capped.
        let widths: Vec<Constraint> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let widest = rows
                    .iter()
                    .map(|r| r.get(i).map_or(0, |v| v.chars().count()))
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0);
                Constraint::Length((widest as u16).min(MAX_CELL_WIDTH))
            })
            .collect();

        let header = Row::new(headers.into_iter().map(Cell::from)).style(
            Style::default()
                .fg(self.header_color)
                .add_modifier(Modifier::BOLD),
        );
        let body = rows
            .into_iter()
            .map(|r| Row::new(r.into_iter().map(|v| Cell::from(v.replace(['\n', '\t'], " ")))));

        Table::new(body, widths)
            .header(header)
            .column_spacing(2)
            .block(
                Block::default()
                    .borders(Borders::TOP | Borders::BOTTOM)
                    .border_style(Style::default().fg(self.border_color)),
            )
            .render(area, buf);
    }
}
