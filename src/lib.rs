use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod chart_data;
pub mod chart_export;
pub mod config;
pub mod dataset;
pub mod error_display;
pub mod loader;
pub mod logging;
pub mod query;
pub mod report;
pub mod timestamp;
pub mod widgets;

pub use cache::CacheManager;
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use dataset::Dataset;
pub use potato_cli::{Args, ChartFormat, CompressionFormat};
pub use query::{run_all, QueryResults};

use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::preview::Preview;
use widgets::results::{ResultsPanel, ResultsScroll};
use widgets::text_input::{TextInput, TextInputEvent};

/// Application name used for the config and cache directories
pub const APP_NAME: &str = "potato";

const EMPTY_PROMPT: &str = "Please open a TSV file to begin querying.";
const LOADED_MESSAGE: &str = "Dataset successfully loaded. Here's a preview of the data:";
/// Rows moved by PgUp/PgDn in the results panel.
const RESULTS_PAGE: usize = 5;

/// How to read a post file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub compression: Option<CompressionFormat>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    /// CLI flags take precedence over the config file.
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        Self {
            delimiter: args.delimiter.or(config.file_loading.delimiter),
            compression: args.compression.or_else(|| {
                config
                    .file_loading
                    .compression
                    .as_deref()
                    .and_then(CompressionFormat::from_name)
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    /// Performs the load after the loading gauge has been drawn
    DoLoad(PathBuf, OpenOptions),
    Query(String),
    Export(PathBuf),
    Resize(u16, u16),
    Exit,
    Crash(String),
}

/// Whether a dataset is available to query.
#[derive(Debug, Default)]
pub enum Session {
    #[default]
    NoDatasetLoaded,
    DatasetLoaded { dataset: Dataset, path: PathBuf },
}

impl Session {
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Session::DatasetLoaded { dataset, .. } => Some(dataset),
            Session::NoDatasetLoaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Session::DatasetLoaded { .. })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading {
        file_path: PathBuf,
        current_phase: String,
        progress_percent: u16,
    },
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    EditingTerm,
    OpeningFile,
}

/// One-line message under the main area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct App {
    events: Sender<AppEvent>,
    session: Session,
    results: Option<QueryResults>,
    results_scroll: ResultsScroll,
    status: Option<Status>,
    input_mode: InputMode,
    term_input: TextInput,
    path_input: TextInput,
    loading_state: LoadingState,
    show_help: bool,
    open_options: OpenOptions,
    preview_rows: usize,
    export_dir: PathBuf,
    export_format: ChartFormat,
    cache: Option<CacheManager>,
    theme: Theme,
    pub debug: DebugState,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, &AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, config: &AppConfig) -> App {
        let theme = Theme::from_config(&config.theme).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to create theme: {}. Using defaults.", e);
            Theme::default()
        });
        let text_color = theme.get("text_primary");

        let mut term_input = TextInput::new().with_text_color(text_color);
        if config.query.enable_history {
            term_input = term_input.with_history(cache::TERM_HISTORY_FILE, config.query.history_limit);
        }
        term_input.set_value(&config.query.default_term);

        App {
            events,
            session: Session::NoDatasetLoaded,
            results: None,
            results_scroll: ResultsScroll::default(),
            status: None,
            input_mode: InputMode::Normal,
            term_input,
            path_input: TextInput::new().with_text_color(text_color),
            loading_state: LoadingState::Idle,
            show_help: false,
            open_options: OpenOptions::new(),
            preview_rows: config.display.preview_rows,
            export_dir: config
                .export
                .directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            export_format: config.export.chart_format(),
            cache: None,
            theme,
            debug: DebugState {
                enabled: config.debug.enabled,
                ..Default::default()
            },
        }
    }

    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_open_options(mut self, options: OpenOptions) -> Self {
        self.open_options = options;
        self
    }

    pub fn with_term(mut self, term: &str) -> Self {
        self.term_input.set_value(term);
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows.max(1);
        self
    }

    pub fn with_export(mut self, dir: PathBuf, format: ChartFormat) -> Self {
        self.export_dir = dir;
        self.export_format = format;
        self
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn results(&self) -> Option<&QueryResults> {
        self.results.as_ref()
    }

    pub fn results_scroll(&self) -> ResultsScroll {
        self.results_scroll
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn term(&self) -> String {
        self.term_input.value()
    }

    pub fn loading_state(&self) -> &LoadingState {
        &self.loading_state
    }

    pub fn send_event(&self, event: AppEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|e| eyre!("event channel closed: {}", e))
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => {
                self.loading_state = LoadingState::Loading {
                    file_path: path.clone(),
                    current_phase: "Reading file".to_string(),
                    progress_percent: 20,
                };
                Some(AppEvent::DoLoad(path.clone(), options.clone()))
            }
            AppEvent::DoLoad(path, options) => {
                self.load(path, options);
                None
            }
            AppEvent::Query(term) => {
                self.query(term);
                None
            }
            AppEvent::Export(dir) => {
                self.export(dir);
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Replace the session with the file at `path`. Any failure leaves no dataset loaded.
    fn load(&mut self, path: &Path, options: &OpenOptions) {
        self.debug.last_action = "open".to_string();
        // The old dataset and its results go away whether or not the new load succeeds.
        self.session = Session::NoDatasetLoaded;
        self.results = None;
        self.results_scroll.reset();

        let started = Instant::now();
        let loaded = loader::load_path(path, options);
        self.loading_state = LoadingState::Idle;
        self.debug.last_load = Some(started.elapsed());

        match loaded {
            Ok(dataset) => {
                tracing::info!(
                    path = %path.display(),
                    rows = dataset.height(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "dataset loaded"
                );
                self.status = Some(Status::Info(format!(
                    "Loaded {} posts from {}",
                    dataset.height(),
                    path.display()
                )));
                self.session = Session::DatasetLoaded {
                    dataset,
                    path: path.to_path_buf(),
                };
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "load failed");
                self.status = Some(Status::Error(error_display::user_message_from_report(
                    &e,
                    Some(path),
                )));
            }
        }
    }

    fn query(&mut self, term: &str) {
        let Some(dataset) = self.session.dataset() else {
            return;
        };
        self.debug.last_action = "query".to_string();
        let started = Instant::now();
        let outcome = query::filtered_count(dataset, term)
            .and_then(|matches| Ok((matches, run_all(dataset, term)?)));
        self.debug.last_query = Some(started.elapsed());

        match outcome {
            Ok((matches, results)) => {
                tracing::info!(
                    term,
                    matches,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "query finished"
                );
                self.status = Some(Status::Info(format!(
                    "{} of {} posts contain '{}'",
                    matches,
                    dataset.height(),
                    term
                )));
                self.results = Some(results);
                self.results_scroll.reset();
            }
            Err(e) => {
                tracing::warn!(term, error = %e, "query failed");
                self.results = None;
                self.status = Some(Status::Error(error_display::user_message_from_report(
                    &e, None,
                )));
            }
        }
    }

    fn export(&mut self, dir: &Path) {
        self.debug.last_action = "export".to_string();
        let Some(results) = &self.results else {
            self.status = Some(Status::Error(
                "Run a query before exporting charts.".to_string(),
            ));
            return;
        };
        self.status = Some(
            match chart_export::export_charts(results, dir, self.export_format) {
                Ok(paths) => Status::Info(format!(
                    "Wrote {} charts to {}",
                    paths.len(),
                    dir.display()
                )),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "export failed");
                    Status::Error(error_display::user_message_from_report(&e, None))
                }
            },
        );
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }
        if self.loading_state.is_loading() {
            return None;
        }
        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return None;
        }

        match self.input_mode {
            InputMode::EditingTerm => {
                match self.term_input.handle_key(event, self.cache.as_ref()) {
                    TextInputEvent::Submit => {
                        self.set_mode(InputMode::Normal);
                        return Some(AppEvent::Query(self.term_input.value()));
                    }
                    TextInputEvent::Cancel => self.set_mode(InputMode::Normal),
                    TextInputEvent::HistoryChanged | TextInputEvent::None => {}
                }
                None
            }
            InputMode::OpeningFile => {
                match self.path_input.handle_key(event, None) {
                    TextInputEvent::Submit => {
                        self.set_mode(InputMode::Normal);
                        let raw = self.path_input.value();
                        if raw.trim().is_empty() {
                            return None;
                        }
                        return Some(AppEvent::Open(
                            expand_home(raw.trim()),
                            self.open_options.clone(),
                        ));
                    }
                    TextInputEvent::Cancel => self.set_mode(InputMode::Normal),
                    TextInputEvent::HistoryChanged | TextInputEvent::None => {}
                }
                None
            }
            InputMode::Normal => self.normal_key(event),
        }
    }

    fn normal_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let loaded = self.session.is_loaded();
        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Exit),
            KeyCode::Char('?') => {
                self.show_help = true;
                None
            }
            KeyCode::Char('o') => {
                self.set_mode(InputMode::OpeningFile);
                None
            }
            // Everything below needs a dataset; without one these keys do nothing.
            _ if !loaded => None,
            KeyCode::Char('/') => {
                self.set_mode(InputMode::EditingTerm);
                None
            }
            KeyCode::Char('r') | KeyCode::Enter => Some(AppEvent::Query(self.term_input.value())),
            KeyCode::Char('e') => Some(AppEvent::Export(self.export_dir.clone())),
            KeyCode::PageDown => {
                self.results_scroll.scroll_down(RESULTS_PAGE);
                None
            }
            KeyCode::PageUp => {
                self.results_scroll.scroll_up(RESULTS_PAGE);
                None
            }
            KeyCode::Home => {
                self.results_scroll.offset = 0;
                None
            }
            KeyCode::End => {
                self.results_scroll.offset = self.results_scroll.max;
                None
            }
            _ => None,
        }
    }

    fn set_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.term_input.set_focused(mode == InputMode::EditingTerm);
        self.path_input.set_focused(mode == InputMode::OpeningFile);
    }

    fn render_loading_gauge(loading_state: &LoadingState, area: Rect, buf: &mut Buffer) {
        let LoadingState::Loading {
            file_path,
            current_phase,
            progress_percent,
        } = loading_state
        else {
            return;
        };
        let rows = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .split(area);
        let cols = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Percentage(50),
            Constraint::Fill(1),
        ])
        .split(rows[1]);
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Clear.render(cols[1], buf);
        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Loading {}", name)),
            )
            .percent(*progress_percent)
            .label(current_phase.clone())
            .render(cols[1], buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        const HELP: [(&str, &str); 10] = [
            ("o", "Open a .tsv file"),
            ("/", "Edit the search term"),
            ("r, Enter", "Query Data: compute all results for the term"),
            ("e", "Export the per-day and per-hour charts"),
            ("PgUp/PgDn", "Scroll the results when they do not fit"),
            ("Up/Down", "Term history while editing"),
            ("Esc", "Leave the input or close this help"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
            ("Ctrl-C", "Quit from anywhere"),
        ];
        let width = area.width.min(64);
        let height = (HELP.len() as u16 + 2).min(area.height);
        let popup = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );
        let key_style = Style::default()
            .fg(self.theme.get("secondary"))
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = HELP
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(format!("{:>10}  ", key), key_style),
                    Span::raw(*what),
                ])
            })
            .collect();
        Clear.render(popup, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .border_style(Style::default().fg(self.theme.get("primary"))),
            )
            .render(popup, buf);
    }

    /// Draws everything above the results and returns the area left for them.
    fn render_loaded(&self, dataset: &Dataset, area: Rect, buf: &mut Buffer) -> Rect {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(Preview::height(dataset, self.preview_rows)),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .split(area);

        Paragraph::new(LOADED_MESSAGE)
            .style(Style::default().fg(self.theme.get("success")))
            .render(layout[0], buf);
        Preview::new(dataset, self.preview_rows)
            .with_colors(self.theme.get("table_header"), self.theme.get("table_border"))
            .render(layout[1], buf);

        let editing = self.input_mode == InputMode::EditingTerm;
        let term_block = Block::default()
            .borders(Borders::ALL)
            .title("Search term")
            .border_style(Style::default().fg(if editing {
                self.theme.get("secondary")
            } else {
                self.theme.get("dimmed")
            }));
        let term_area = term_block.inner(layout[2]);
        term_block.render(layout[2], buf);
        (&self.term_input).render(term_area, buf);

        if self.results.is_none() {
            Paragraph::new("Press r or Enter to query the data for this term.")
                .style(Style::default().fg(self.theme.get("dimmed")))
                .render(layout[3], buf);
        }
        layout[3]
    }
}

/// `~/x` to `$HOME/x`.
fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let mut constraints = vec![Constraint::Length(1), Constraint::Fill(1)];
        if self.input_mode == InputMode::OpeningFile {
            constraints.push(Constraint::Length(3));
        }
        if self.status.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1));
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::new(Direction::Vertical, constraints).split(area);
        let mut slots = layout.iter().copied();
        let title_area = slots.next().unwrap_or_default();
        let main_area = slots.next().unwrap_or_default();

        let title = match &self.session {
            Session::DatasetLoaded { path, .. } => format!("POTATO  {}", path.display()),
            Session::NoDatasetLoaded => "POTATO".to_string(),
        };
        Paragraph::new(title)
            .style(
                Style::default()
                    .fg(self.theme.get("primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .render(title_area, buf);

        let mut results_area = None;
        match &self.session {
            Session::NoDatasetLoaded => {
                let rows = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(2),
                    Constraint::Fill(1),
                ])
                .split(main_area);
                Paragraph::new(vec![
                    Line::from(EMPTY_PROMPT),
                    Line::from(Span::styled(
                        "Press o to open a file, ? for help.",
                        Style::default().fg(self.theme.get("dimmed")),
                    )),
                ])
                .centered()
                .render(rows[1], buf);
            }
            Session::DatasetLoaded { dataset, .. } => {
                results_area = Some(self.render_loaded(dataset, main_area, buf));
            }
        }
        if let (Some(results), Some(area)) = (&self.results, results_area) {
            ResultsPanel::new(results, &self.theme).render(area, buf, &mut self.results_scroll);
        }

        if self.input_mode == InputMode::OpeningFile {
            let area = slots.next().unwrap_or_default();
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Open file (Enter to load, Esc to cancel)")
                .border_style(Style::default().fg(self.theme.get("secondary")));
            let inner = block.inner(area);
            block.render(area, buf);
            (&self.path_input).render(inner, buf);
        }

        if let Some(status) = &self.status {
            let area = slots.next().unwrap_or_default();
            let (text, color) = match status {
                Status::Info(msg) => (msg.as_str(), self.theme.get("text_primary")),
                Status::Error(msg) => (msg.as_str(), self.theme.get("error")),
            };
            Paragraph::new(text)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true })
                .render(area, buf);
        }

        let mut controls = Controls::new(self.session.is_loaded())
            .with_colors(self.theme.get("controls_bg"), self.theme.get("dimmed"));
        if let Some(dataset) = self.session.dataset() {
            controls = controls.with_row_count(dataset.height());
        }
        (&controls).render(slots.next().unwrap_or_default(), buf);

        if self.debug.enabled {
            (&self.debug).render(slots.next().unwrap_or_default(), buf);
        }

        if self.show_help {
            self.render_help(main_area, buf);
        }
        App::render_loading_gauge(&self.loading_state, main_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use std::sync::mpsc::channel;

    const SAMPLE: &str = "text\tauthor_id\tauthor_handle\tlike_count\tplace_id\tcreated_at\tts1\tts2\n\
                          I love Britney\t1\talice\t10\tp1\t2024-01-01T10:00:00Z\t\t\n\
                          britney forever\t2\tbob\t20\tp2\t2024-01-01T15:30:00Z\t\t\n\
                          Cher is great\t1\talice\t5\t\t2024-01-02T09:00:00Z\t\t\n";

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new_with_kind(
            code,
            KeyModifiers::NONE,
            KeyEventKind::Press,
        ))
    }

    fn app() -> App {
        let (tx, _rx) = channel();
        App::new(tx)
    }

    /// Feed an event and everything it triggers.
    fn drive(app: &mut App, event: AppEvent) {
        let mut next = Some(event);
        while let Some(event) = next {
            next = app.event(&event);
        }
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn starts_without_dataset_and_ignores_query_keys() {
        let mut app = app();
        assert!(!app.session().is_loaded());
        assert!(app.event(&key(KeyCode::Char('r'))).is_none());
        assert!(app.event(&key(KeyCode::Char('/'))).is_none());
        assert_eq!(app.input_mode(), InputMode::Normal);
        drive(&mut app, AppEvent::Query("Britney".to_string()));
        assert!(app.results().is_none());
    }

    #[test]
    fn open_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posts.tsv", SAMPLE);
        let mut app = app();

        let next = app.event(&AppEvent::Open(path.clone(), OpenOptions::new()));
        assert!(app.loading_state().is_loading());
        assert!(matches!(next, Some(AppEvent::DoLoad(_, _))));
        drive(&mut app, next.unwrap());
        assert!(!app.loading_state().is_loading());
        assert_eq!(app.session().dataset().map(|d| d.height()), Some(3));

        assert_eq!(app.term(), "Britney");
        let trigger = app.event(&key(KeyCode::Char('r')));
        assert!(matches!(&trigger, Some(AppEvent::Query(t)) if t == "Britney"));
        drive(&mut app, trigger.unwrap());
        let results = app.results().expect("results");
        assert_eq!(results.unique_users, 2);
        assert_eq!(results.top_user.as_deref(), Some("alice"));
    }

    #[test]
    fn editing_term_submits_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posts.tsv", SAMPLE);
        let mut app = app().with_term("");
        drive(&mut app, AppEvent::Open(path, OpenOptions::new()));

        app.event(&key(KeyCode::Char('/')));
        assert_eq!(app.input_mode(), InputMode::EditingTerm);
        for c in "cher".chars() {
            app.event(&key(KeyCode::Char(c)));
        }
        let next = app.event(&key(KeyCode::Enter));
        assert_eq!(app.input_mode(), InputMode::Normal);
        drive(&mut app, next.unwrap());
        assert_eq!(app.results().unwrap().term, "cher");
        assert_eq!(app.results().unwrap().unique_users, 1);
    }

    #[test]
    fn reopening_clears_results_and_failed_load_drops_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(&dir, "posts.tsv", SAMPLE);
        let bad = write(
            &dir,
            "bad.tsv",
            "text\tauthor_id\tauthor_handle\tlike_count\tplace_id\tcreated_at\tts1\tts2\n\
             x\t1\ta\t1\t\tnot-a-date\t\t\n",
        );
        let mut app = app();
        drive(&mut app, AppEvent::Open(good.clone(), OpenOptions::new()));
        drive(&mut app, AppEvent::Query("britney".to_string()));
        assert!(app.results().is_some());

        drive(&mut app, AppEvent::Open(good, OpenOptions::new()));
        assert!(app.session().is_loaded());
        assert!(app.results().is_none());

        drive(&mut app, AppEvent::Open(bad, OpenOptions::new()));
        assert!(!app.session().is_loaded());
        match app.status() {
            Some(Status::Error(msg)) => assert!(msg.contains("created_at"), "{msg}"),
            other => panic!("expected an error status, got {other:?}"),
        }
    }

    #[test]
    fn open_prompt_emits_open_event() {
        let mut app = app();
        app.event(&key(KeyCode::Char('o')));
        assert_eq!(app.input_mode(), InputMode::OpeningFile);
        for c in "posts.tsv".chars() {
            app.event(&key(KeyCode::Char(c)));
        }
        let next = app.event(&key(KeyCode::Enter));
        assert!(matches!(next, Some(AppEvent::Open(p, _)) if p == Path::new("posts.tsv")));
    }

    #[test]
    fn export_needs_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        drive(&mut app, AppEvent::Export(dir.path().to_path_buf()));
        assert!(matches!(app.status(), Some(Status::Error(_))));
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(matches!(app.event(&key(KeyCode::Char('q'))), Some(AppEvent::Exit)));
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(app.event(&ctrl_c), Some(AppEvent::Exit)));
    }

    #[test]
    fn renders_prompt_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posts.tsv", SAMPLE);
        let mut app = app();
        let area = Rect::new(0, 0, 120, 50);

        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        assert!(screen_text(&buf).contains(EMPTY_PROMPT));

        drive(&mut app, AppEvent::Open(path, OpenOptions::new()));
        drive(&mut app, AppEvent::Query("Britney".to_string()));
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text = screen_text(&buf);
        assert!(text.contains(LOADED_MESSAGE));
        assert!(text.contains("I love Britney"));
        assert!(text.contains("Results for the term: Britney"));
    }

    fn six_posts() -> String {
        let mut body = SAMPLE.to_string();
        body.push_str("Britney again\t3\tcarol\t1\tp3\t2024-01-03T22:00:00Z\t\t\n");
        body.push_str("more britney\t1\talice\t7\tp1\t2024-01-04T08:00:00Z\t\t\n");
        body.push_str("nothing here\t4\tdave\t2\t\t2024-01-04T09:00:00Z\t\t\n");
        body
    }

    #[test]
    fn results_fit_a_standard_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posts.tsv", &six_posts());
        let mut app = app();
        drive(&mut app, AppEvent::Open(path, OpenOptions::new()));
        drive(&mut app, AppEvent::Query("Britney".to_string()));

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text = screen_text(&buf);
        for section in report::ResultSection::ALL {
            assert!(text.contains(&section.heading("Britney")), "{text}");
        }
        assert!(
            text.contains("User who posted the most tweets containing 'Britney': alice"),
            "{text}"
        );
        assert_eq!(app.results_scroll().max, 0);
    }

    #[test]
    fn page_keys_scroll_results_that_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posts.tsv", &six_posts());
        let mut app = app();
        drive(&mut app, AppEvent::Open(path, OpenOptions::new()));
        drive(&mut app, AppEvent::Query("Britney".to_string()));

        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let max = app.results_scroll().max;
        assert!(max > 0);
        assert!(!screen_text(&buf).contains("tweets containing 'Britney': alice"));

        app.event(&key(KeyCode::End));
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        assert_eq!(app.results_scroll().offset, max);
        assert!(screen_text(&buf).contains("tweets containing 'Britney': alice"));

        app.event(&key(KeyCode::PageUp));
        assert_eq!(app.results_scroll().offset, max.saturating_sub(RESULTS_PAGE));
        app.event(&key(KeyCode::Home));
        app.event(&key(KeyCode::PageDown));
        assert_eq!(app.results_scroll().offset, RESULTS_PAGE.min(max));

        drive(&mut app, AppEvent::Query("Britney".to_string()));
        assert_eq!(app.results_scroll().offset, 0);
    }

    fn screen_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
