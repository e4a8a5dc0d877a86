//! Common UI styles and layout helpers for the dashboard

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Common UI styles
pub struct Styles;

impl Styles {
    pub fn default() -> Style {
        Style::default()
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    /// Row under the cursor, outside the focused cell
    pub fn cursor_row() -> Style {
        Style::default().bg(Color::DarkGray)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn success() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn warning() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn info() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    /// Muted placeholder text
    pub fn placeholder() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn editing() -> Style {
        Style::default()
            .bg(Color::White)
            .fg(Color::Black)
    }

    pub fn link() -> Style {
        Style::default()
            .fg(Color::LightBlue)
            .add_modifier(Modifier::UNDERLINED)
    }

    /// Row being dragged
    pub fn drag_source() -> Style {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::DIM)
    }

    /// Current drop target
    pub fn drop_target() -> Style {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
    }

    pub fn active_border() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn inactive_border() -> Style {
        Style::default().fg(Color::Gray)
    }

    /// Badge colour for status, priority and category values
    pub fn badge(value: &str) -> Style {
        let color = match value {
            "未投递" => Color::Gray,
            "已投递" => Color::Blue,
            "笔试" => Color::Magenta,
            "面试" => Color::Cyan,
            "Offer" => Color::Green,
            "感谢信" | "已结束" => Color::Red,
            "高" => Color::LightRed,
            "中" => Color::Yellow,
            "低" => Color::Gray,
            _ => Color::LightCyan,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}

/// Center a rectangle within another rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Cut `text` to at most `width` terminal columns and pad it to exactly
/// `width`. Wide characters that would straddle the edge are dropped.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        if c == '\n' {
            break;
        }
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Terminal columns taken by the first `chars` characters of `text`
pub fn display_width(text: &str, chars: usize) -> u16 {
    let prefix: String = text.chars().take(chars).collect();
    prefix.width() as u16
}
