//! Building blocks shared by the screens: text fields, flash messages,
//! dialogs and the colour palette.

use crate::tui::Frame;
use crossterm::event::KeyCode;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use std::time::{Duration, Instant};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const BACKGROUND: Color = Color::Rgb(16, 16, 28);
pub const PANEL: Color = Color::Rgb(22, 22, 35);
pub const BORDER: Color = Color::Rgb(75, 75, 120);
pub const HIGHLIGHT: Color = Color::Rgb(250, 250, 110);
pub const ACCENT: Color = Color::Rgb(129, 199, 245);
pub const TEXT: Color = Color::Rgb(200, 200, 220);
pub const MUTED: Color = Color::Rgb(140, 140, 170);
pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
pub const DANGER: Color = Color::Rgb(255, 100, 100);

/// How long a flash message stays on screen.
const FLASH_TIMEOUT: Duration = Duration::from_secs(5);

/// A single-line text input.
#[derive(Debug, Clone)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
    pub masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            required: false,
            masked: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Applies a character or backspace key. Returns whether the value changed.
    pub fn edit(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => {
                self.value.push(c);
                true
            }
            KeyCode::Backspace => self.value.pop().is_some(),
            _ => false,
        }
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    /// The trimmed value, or `None` when blank.
    pub fn optional(&self) -> Option<String> {
        let value = self.trimmed();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn is_missing(&self) -> bool {
        self.required && self.trimmed().is_empty()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let title = if self.required {
            format!(" {} * ", self.label)
        } else {
            format!(" {} ", self.label)
        };
        let shown = if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };
        render_input(frame, area, &title, &shown, focused);
    }
}

/// Finds the first required field left blank.
pub fn first_missing(fields: &[TextField]) -> Option<&TextField> {
    fields.iter().find(|f| f.is_missing())
}

/// Draws a bordered input box.
pub fn render_input(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string())
        .border_style(Style::default().fg(if focused { HIGHLIGHT } else { BORDER }))
        .style(Style::default().bg(PANEL));
    let style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT)
    };
    frame.render_widget(Paragraph::new(value.to_string()).style(style).block(block), area);
}

/// Draws a button-like label.
pub fn render_button(frame: &mut Frame, area: Rect, label: &str, focused: bool, color: Color) {
    let text = if focused {
        format!("► {label} ◄")
    } else {
        label.to_string()
    };
    let style = if focused {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(MUTED)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { color } else { BORDER }));
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

/// Fills the whole frame with the background colour.
pub fn render_background(frame: &mut Frame) {
    frame.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND)),
        frame.area(),
    );
}

/// Draws a screen title bar over `area`.
pub fn render_header(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(Color::Rgb(24, 24, 40)));
    let text = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle.to_string(), Style::default().fg(MUTED))),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

/// Draws the key help line.
pub fn render_help(frame: &mut Frame, area: Rect, help: &str) {
    frame.render_widget(
        Paragraph::new(help.to_string())
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

/// A transient status line, cleared after a few seconds.
#[derive(Debug, Default)]
pub struct Flash {
    message: Option<(String, bool, Instant)>,
}

impl Flash {
    pub fn error(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), true, Instant::now()));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), false, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().map(|(text, _, _)| text.as_str())
    }

    pub fn is_error(&self) -> bool {
        matches!(self.message, Some((_, true, _)))
    }

    pub fn check_timeout(&mut self) {
        if let Some((_, _, shown)) = &self.message {
            if shown.elapsed() >= FLASH_TIMEOUT {
                self.clear();
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if let Some(text) = self.text() {
            let color = if self.is_error() { DANGER } else { SUCCESS };
            frame.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                    .alignment(Alignment::Center),
                area,
            );
        }
    }
}

/// A yes/no confirmation dialog.
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    pub open: bool,
    /// `true` while "Yes" is highlighted.
    pub yes_selected: bool,
}

/// Result of feeding a key to an open [`ConfirmDialog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Pending,
    Confirmed,
    Cancelled,
}

impl ConfirmDialog {
    /// Opens the dialog with "No" highlighted.
    pub fn show(&mut self) {
        self.open = true;
        self.yes_selected = false;
    }

    pub fn handle_key(&mut self, code: KeyCode) -> DialogOutcome {
        match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.yes_selected = !self.yes_selected;
                DialogOutcome::Pending
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.open = false;
                DialogOutcome::Confirmed
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.open = false;
                DialogOutcome::Cancelled
            }
            KeyCode::Enter => {
                self.open = false;
                if self.yes_selected {
                    DialogOutcome::Confirmed
                } else {
                    DialogOutcome::Cancelled
                }
            }
            _ => DialogOutcome::Pending,
        }
    }

    pub fn render(&self, frame: &mut Frame, title: &str, message: &str) {
        if !self.open {
            return;
        }
        let area = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(140, 140, 200)))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));

        let button = |label: &'static str, active: bool, color: Color| {
            if active {
                Span::styled(
                    format!("► {label} ◄"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!("  {label}  "), Style::default().fg(MUTED))
            }
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Rgb(220, 220, 240)),
            )),
            Line::from(""),
            Line::from(vec![
                button("Yes", self.yes_selected, SUCCESS),
                Span::raw("    "),
                button("No", !self.yes_selected, DANGER),
            ]),
        ];

        frame.render_widget(
            Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
    }
}

/// Formats a stored timestamp in the local time zone, or UTC when the local
/// offset cannot be determined.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    at.to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string())
}

/// Helper function to create a centered rectangle.
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

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn header_fills_the_given_area() {
        let mut terminal = Terminal::new(TestBackend::new(40, 4)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_header(frame, area, "PATIENTS", "All records");
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String { (0..40u16).map(|x| buffer[(x, y)].symbol()).collect() };
        assert!(row(0).starts_with('╭'));
        assert!(row(1).contains("PATIENTS"));
        assert!(row(2).contains("All records"));
        assert!(row(3).starts_with('╰'));
    }

    #[test]
    fn text_field_edits_and_trims() {
        let mut field = TextField::new("Email").required();
        assert!(field.is_missing());
        for c in " a@b.c ".chars() {
            field.edit(KeyCode::Char(c));
        }
        assert_eq!(field.trimmed(), "a@b.c");
        assert!(field.edit(KeyCode::Backspace));
        assert_eq!(field.value, " a@b.c");
        assert!(!field.edit(KeyCode::Up));
        assert!(!field.is_missing());
    }

    #[test]
    fn blank_optional_field_is_none() {
        let field = TextField::new("Notes").with_value("   ");
        assert_eq!(field.optional(), None);
        let field = TextField::new("Notes").with_value(" x ");
        assert_eq!(field.optional().as_deref(), Some("x"));
    }

    #[test]
    fn first_missing_skips_optional_fields() {
        let fields = vec![
            TextField::new("Optional"),
            TextField::new("Name").required().with_value("Ann"),
            TextField::new("Phone").required(),
        ];
        assert_eq!(first_missing(&fields).map(|f| f.label), Some("Phone"));
    }

    #[test]
    fn confirm_dialog_defaults_to_no() {
        let mut dialog = ConfirmDialog::default();
        dialog.show();
        assert_eq!(dialog.handle_key(KeyCode::Enter), DialogOutcome::Cancelled);
        assert!(!dialog.open);

        dialog.show();
        assert_eq!(dialog.handle_key(KeyCode::Left), DialogOutcome::Pending);
        assert_eq!(dialog.handle_key(KeyCode::Enter), DialogOutcome::Confirmed);
    }

    #[test]
    fn timestamps_render_to_the_minute() {
        let text = format_timestamp(time::macros::datetime!(2024-03-01 09:30:45 UTC));
        assert_eq!(text.len(), "2024-03-01 09:30".len());
        assert!(text.starts_with("2024-0"));
    }

    #[test]
    fn flash_tracks_kind() {
        let mut flash = Flash::default();
        flash.error("boom");
        assert!(flash.is_error());
        assert_eq!(flash.text(), Some("boom"));
        flash.success("ok");
        assert!(!flash.is_error());
        flash.check_timeout();
        assert_eq!(flash.text(), Some("ok"));
    }
}
