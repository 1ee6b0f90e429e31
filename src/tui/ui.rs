//! Common UI styles and helpers for the dashboard

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::forms::FormField;

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

    pub fn info() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn active_border() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn inactive_border() -> Style {
        Style::default().fg(Color::Gray)
    }
}

/// Render a single-line input box. `masked` replaces every character with `*`.
pub fn render_input(f: &mut Frame, area: Rect, field: &FormField, focused: bool, masked: bool) {
    let shown = if masked {
        "*".repeat(field.value.chars().count())
    } else {
        field.value.clone()
    };
    let placeholder = field.kind.placeholder();

    let border_style = if focused {
        Styles::active_border()
    } else if field.check().is_err() && !field.is_empty() {
        Styles::error()
    } else {
        Styles::inactive_border()
    };

    let title = if field.required {
        format!("{} *", field.label)
    } else {
        field.label.to_string()
    };

    let (text, style) = if shown.is_empty() && !placeholder.is_empty() {
        (placeholder.to_string(), Styles::inactive())
    } else {
        (shown, Styles::default())
    };

    let paragraph = Paragraph::new(text).style(style).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(paragraph, area);

    if focused {
        let before: String = field.value.chars().take(field.cursor_position).collect();
        let offset = if masked {
            field.cursor_position
        } else {
            before.width()
        };
        let cursor_x = area.x + 1 + offset as u16;
        if area.width > 1 && cursor_x < area.x + area.width - 1 {
            f.set_cursor(cursor_x, area.y + 1);
        }
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

/// Cut `text` to at most `max_width` terminal columns, marking the cut with
/// an ellipsis.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Integer with thousands separators
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_columns() {
        assert_eq!(truncate("verano", 10), "verano");
        assert_eq!(truncate("campaña de verano", 8), "campaña…");
        // Wide characters take two columns each
        assert_eq!(truncate("広告キャンペーン", 7), "広告キ…");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-45000), "-45,000");
    }
}
