use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};
use std::time::Duration;

/// Counters shown in the `--debug` status line.
#[derive(Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "query", "open") for debugging key handling.
    pub last_action: String,
    pub last_load: Option<Duration>,
    pub last_query: Option<Duration>,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }

    fn line(&self) -> String {
        let ms = |d: Option<Duration>| {
            d.map(|d| format!("{}ms", d.as_millis()))
                .unwrap_or_else(|| "-".to_string())
        };
        format!(
            "events={} keys={} last_key={} last_action={} frames={} load={} query={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            ms(self.last_load),
            ms(self.last_query),
        )
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line()).render(area, buf);
    }
}
