use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fs2::FileExt;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::cache::CacheManager;

/// Event emitted by [`TextInput::handle_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    /// Enter pressed
    Submit,
    /// Esc pressed
    Cancel,
    /// Up/Down moved through history
    HistoryChanged,
}

/// Single-line input on top of tui-textarea, with optional on-disk history.
pub struct TextInput {
    textarea: TextArea<'static>,
    /// Cache file holding the history, one entry per line. None disables history.
    history_file: Option<String>,
    history: Vec<String>,
    history_loaded: bool,
    history_index: Option<usize>,
    /// What the user had typed before starting to browse history.
    history_draft: Option<String>,
    history_limit: usize,
    text_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut input = Self {
            textarea: TextArea::default(),
            history_file: None,
            history: Vec::new(),
            history_loaded: false,
            history_index: None,
            history_draft: None,
            history_limit: 1000,
            text_color: None,
            focused: false,
        };
        input.apply_style();
        input
    }

    pub fn with_history(mut self, history_file: &str, limit: usize) -> Self {
        self.history_file = Some(history_file.to_string());
        self.history_limit = limit;
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self.apply_style();
        self
    }

    fn apply_style(&mut self) {
        let style = self
            .text_color
            .map(|c| Style::default().fg(c))
            .unwrap_or_default();
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        self.apply_cursor_style();
    }

    fn apply_cursor_style(&mut self) {
        // A cursor styled like the text is invisible.
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            self.textarea.style()
        };
        self.textarea.set_cursor_style(cursor);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_cursor_style();
    }

    pub fn value(&self) -> String {
        self.textarea.lines().first().cloned().unwrap_or_default()
    }

    /// Replace the contents and put the cursor at the end.
    pub fn set_value(&mut self, value: &str) {
        let single_line = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![single_line]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn cursor(&self) -> usize {
        self.textarea.cursor().1
    }

    pub fn load_history(&mut self, cache: &CacheManager) -> Result<()> {
        if self.history_loaded {
            return Ok(());
        }
        if let Some(name) = &self.history_file {
            self.history = read_history(cache, name)?;
        }
        self.history_loaded = true;
        Ok(())
    }

    /// Append the current value to history and persist it.
    pub fn save_to_history(&mut self, cache: &CacheManager) -> Result<()> {
        let Some(name) = self.history_file.clone() else {
            return Ok(());
        };
        let value = self.value();
        if value.trim().is_empty() {
            return Ok(());
        }
        if !self.history_loaded {
            self.load_history(cache)?;
        }
        if self.history.last() != Some(&value) {
            self.history.push(value);
        }
        let start = self.history.len().saturating_sub(self.history_limit);
        self.history.drain(..start);
        write_history(cache, &name, &self.history)
    }

    fn history_up(&mut self, cache: Option<&CacheManager>) {
        if !self.history_loaded {
            if let Some(cache) = cache {
                if let Err(e) = self.load_history(cache) {
                    tracing::warn!("could not load term history: {}", e);
                }
            }
        }
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.history_draft = Some(self.value());
                self.history.len() - 1
            }
            Some(i) => i.saturating_sub(1),
        };
        self.history_index = Some(index);
        let entry = self.history[index].clone();
        self.set_value(&entry);
    }

    fn history_down(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 >= self.history.len() {
            let draft = self.history_draft.take().unwrap_or_default();
            self.history_index = None;
            self.set_value(&draft);
        } else {
            self.history_index = Some(index + 1);
            let entry = self.history[index + 1].clone();
            self.set_value(&entry);
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent, cache: Option<&CacheManager>) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => {
                if let Some(cache) = cache {
                    if let Err(e) = self.save_to_history(cache) {
                        tracing::warn!("could not save term history: {}", e);
                    }
                }
                self.history_index = None;
                self.history_draft = None;
                TextInputEvent::Submit
            }
            KeyCode::Esc => TextInputEvent::Cancel,
            KeyCode::Up if self.history_file.is_some() => {
                self.history_up(cache);
                TextInputEvent::HistoryChanged
            }
            KeyCode::Down if self.history_file.is_some() => {
                self.history_down();
                TextInputEvent::HistoryChanged
            }
            _ => {
                self.textarea.input(to_input(event));
                self.history_index = None;
                TextInputEvent::None
            }
        }
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

fn to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

fn read_history(cache: &CacheManager, name: &str) -> Result<Vec<String>> {
    let path = cache.cache_file(name);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(fs::File::open(&path)?);
    let mut history = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            history.push(line);
        }
    }
    Ok(history)
}

/// Rewrite the history file under an exclusive lock so two running instances do not interleave.
fn write_history(cache: &CacheManager, name: &str, history: &[String]) -> Result<()> {
    cache.ensure_cache_dir()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(cache.cache_file(name))?;
    file.lock_exclusive()?;
    let result = (|| -> Result<()> {
        file.set_len(0)?;
        let mut writer = std::io::BufWriter::new(&file);
        for entry in history {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;
        Ok(())
    })();
    FileExt::unlock(&file)?;
    result
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.textarea.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn type_str(input: &mut TextInput, s: &str) {
        for c in s.chars() {
            input.handle_key(&key(KeyCode::Char(c)), None);
        }
    }

    #[test]
    fn typing_and_submit() {
        let mut input = TextInput::new();
        type_str(&mut input, "Cher");
        assert_eq!(input.value(), "Cher");
        assert_eq!(input.cursor(), 4);
        input.handle_key(&key(KeyCode::Backspace), None);
        assert_eq!(input.value(), "Che");
        assert_eq!(input.handle_key(&key(KeyCode::Enter), None), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc), None), TextInputEvent::Cancel);
    }

    #[test]
    fn set_value_flattens_newlines() {
        let mut input = TextInput::new();
        input.set_value("a\nb");
        assert_eq!(input.value(), "a b");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn history_persists_and_navigates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());

        let mut input = TextInput::new().with_history("terms.txt", 2);
        for term in ["a", "b", "b", "c"] {
            input.set_value(term);
            input.handle_key(&key(KeyCode::Enter), Some(&cache));
        }
        let saved = fs::read_to_string(cache.cache_file("terms.txt")).unwrap();
        assert_eq!(saved, "b\nc\n");

        let mut fresh = TextInput::new().with_history("terms.txt", 2);
        fresh.set_value("draft");
        fresh.handle_key(&key(KeyCode::Up), Some(&cache));
        assert_eq!(fresh.value(), "c");
        fresh.handle_key(&key(KeyCode::Up), Some(&cache));
        assert_eq!(fresh.value(), "b");
        fresh.handle_key(&key(KeyCode::Down), Some(&cache));
        fresh.handle_key(&key(KeyCode::Down), Some(&cache));
        assert_eq!(fresh.value(), "draft");
    }

    #[test]
    fn focus_shows_cursor() {
        let mut input = TextInput::new();
        assert_eq!(input.textarea.cursor_style(), input.textarea.style());
        input.set_focused(true);
        assert!(input.textarea.cursor_style().add_modifier.contains(Modifier::REVERSED));
        input.set_focused(false);
        assert_eq!(input.textarea.cursor_style(), input.textarea.style());
    }
}
