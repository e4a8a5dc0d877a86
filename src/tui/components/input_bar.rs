//! Single-line text input used for the filter bar and quick prompts

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::ui::{display_width, Styles};

/// Result of feeding a key to a focused input
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Text changed
    Edited,
    /// Cursor moved or nothing happened
    Unchanged,
    /// Enter pressed
    Submitted(String),
    /// Esc pressed
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct InputBar {
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub is_focused: bool,
    /// Cursor position in characters
    pub cursor_position: usize,
}

impl InputBar {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            value: String::new(),
            placeholder: String::new(),
            is_focused: false,
            cursor_position: 0,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.is_focused = focused;
        if focused {
            self.cursor_position = self.value.chars().count();
        }
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_position = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputOutcome {
        match key.code {
            KeyCode::Char(c) => {
                self.insert_char(c);
                InputOutcome::Edited
            }
            KeyCode::Backspace => {
                self.delete_char();
                InputOutcome::Edited
            }
            KeyCode::Delete => {
                self.delete_char_forward();
                InputOutcome::Edited
            }
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
                InputOutcome::Unchanged
            }
            KeyCode::Right => {
                self.cursor_position = (self.cursor_position + 1).min(self.value.chars().count());
                InputOutcome::Unchanged
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                InputOutcome::Unchanged
            }
            KeyCode::End => {
                self.cursor_position = self.value.chars().count();
                InputOutcome::Unchanged
            }
            KeyCode::Enter => InputOutcome::Submitted(self.value.clone()),
            KeyCode::Esc => InputOutcome::Cancelled,
            _ => InputOutcome::Unchanged,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let showing_placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display_text = if showing_placeholder {
            &self.placeholder
        } else {
            &self.value
        };

        let border_style = if self.is_focused {
            Styles::active_border()
        } else {
            Styles::inactive_border()
        };
        let block = Block::default()
            .title(self.label.as_str())
            .borders(Borders::ALL)
            .border_style(border_style);

        let text_style = if showing_placeholder {
            Styles::placeholder()
        } else {
            Styles::default()
        };
        f.render_widget(
            Paragraph::new(display_text.to_string()).style(text_style).block(block),
            area,
        );

        if self.is_focused {
            let cursor_x = area.x + 1 + display_width(&self.value, self.cursor_position);
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, cursor_y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = InputBar::new("筛选");
        input.set_focus(true);
        for c in "央企".chars() {
            assert_eq!(input.handle_key(key(KeyCode::Char(c))), InputOutcome::Edited);
        }
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Char('国')));
        assert_eq!(input.value, "央国企");
        input.handle_key(key(KeyCode::Backspace));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value, "央");
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = InputBar::new("公司名称");
        input.insert_char('A');
        assert_eq!(input.handle_key(key(KeyCode::Enter)), InputOutcome::Submitted("A".to_string()));
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputOutcome::Cancelled);
    }
}
