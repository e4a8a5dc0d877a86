//! Status bar showing the outcome of the last action

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::ui::Styles;

/// Types of status messages
#[derive(Debug, Clone, PartialEq)]
pub enum StatusType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub status_type: StatusType,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl StatusMessage {
    pub fn new(message: String, status_type: StatusType) -> Self {
        Self {
            message,
            status_type,
            timestamp: chrono::Local::now(),
        }
    }
}

/// Status display component
pub struct StatusDisplay {
    current_message: Option<StatusMessage>,
    message_history: Vec<StatusMessage>,
    max_history: usize,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self {
            current_message: None,
            message_history: Vec::new(),
            max_history: 50,
        }
    }
}

impl StatusDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_message(&mut self, message: StatusMessage) {
        if let Some(current) = self.current_message.take() {
            self.message_history.push(current);
            if self.message_history.len() > self.max_history {
                self.message_history.remove(0);
            }
        }
        self.current_message = Some(message);
    }

    pub fn set_info(&mut self, message: String) {
        self.set_message(StatusMessage::new(message, StatusType::Info));
    }

    pub fn set_success(&mut self, message: String) {
        self.set_message(StatusMessage::new(message, StatusType::Success));
    }

    pub fn set_warning(&mut self, message: String) {
        self.set_message(StatusMessage::new(message, StatusType::Warning));
    }

    pub fn set_error(&mut self, message: String) {
        self.set_message(StatusMessage::new(message, StatusType::Error));
    }

    pub fn get_current(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    pub fn get_history(&self) -> &[StatusMessage] {
        &self.message_history
    }

    /// Render the status bar; `hint` is shown on the right-hand side
    pub fn render(&self, f: &mut Frame, area: Rect, hint: &str) {
        let mut spans = Vec::new();
        match &self.current_message {
            Some(message) => {
                let (prefix, style) = match message.status_type {
                    StatusType::Info => ("ℹ", Styles::info()),
                    StatusType::Success => ("✓", Styles::success()),
                    StatusType::Warning => ("⚠", Styles::warning()),
                    StatusType::Error => ("✗", Styles::error()),
                };
                spans.push(Span::styled(
                    format!(
                        "{} [{}] {}",
                        prefix,
                        message.timestamp.format("%H:%M:%S"),
                        message.message
                    ),
                    style,
                ));
            }
            None => spans.push(Span::styled("Ready", Styles::default())),
        }
        spans.push(Span::styled(format!("  |  {}", hint), Styles::inactive()));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::inactive_border());

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_move_to_history() {
        let mut status = StatusDisplay::new();
        status.set_info("加载完成".to_string());
        status.set_error("保存失败".to_string());
        assert_eq!(status.get_current().unwrap().status_type, StatusType::Error);
        assert_eq!(status.get_history().len(), 1);
        assert_eq!(status.get_history()[0].message, "加载完成");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut status = StatusDisplay::new();
        for i in 0..60 {
            status.set_success(format!("message {}", i));
        }
        assert_eq!(status.get_history().len(), 50);
        assert_eq!(status.get_current().unwrap().message, "message 59");
    }
}
