//! Login component for CareDesk.

use crate::app::{AppContext, SelectedApp};
use crate::components::widgets::{
    self, ConfirmDialog, DialogOutcome, Flash, TextField, ACCENT, MUTED,
};
use crate::components::Component;
use crate::models::Credentials;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const REGISTER_LINK: usize = 2;
const EXIT: usize = 3;
const FOCUS_COUNT: usize = 4;

/// Represents the login UI component.
pub struct Login {
    email: TextField,
    password: TextField,
    /// Current selection (0: Email, 1: Password, 2: Register, 3: Exit)
    focus_index: usize,
    exit_dialog: ConfirmDialog,
    flash: Flash,
}

impl Login {
    /// Creates a new `Login` component.
    pub fn new() -> Self {
        Self {
            email: TextField::new("Email Address"),
            password: TextField::new("Password").masked(),
            focus_index: EMAIL,
            exit_dialog: ConfirmDialog::default(),
            flash: Flash::default(),
        }
    }

    fn submit(&mut self, ctx: &mut AppContext) -> Option<SelectedApp> {
        if self.email.trimmed().is_empty() {
            self.flash.error("Email cannot be empty.");
            return None;
        }
        if self.password.value.is_empty() {
            self.flash.error("Password cannot be empty.");
            return None;
        }

        let credentials = Credentials {
            email: self.email.trimmed().to_string(),
            password: self.password.value.clone(),
        };
        if ctx.auth.login(&ctx.storage, &credentials) {
            Some(SelectedApp::Home)
        } else {
            self.password.value.clear();
            if let Some(message) = ctx.auth.error() {
                self.flash.error(message);
            }
            None
        }
    }
}

impl Default for Login {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Login {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>> {
        if self.exit_dialog.open {
            return Ok(match self.exit_dialog.handle_key(event.code) {
                DialogOutcome::Confirmed => Some(SelectedApp::Quit),
                _ => None,
            });
        }

        match event.code {
            KeyCode::Char(_) | KeyCode::Backspace => {
                let field = match self.focus_index {
                    EMAIL => &mut self.email,
                    PASSWORD => &mut self.password,
                    _ => return Ok(None),
                };
                if field.edit(event.code) {
                    self.flash.clear();
                    ctx.auth.clear_error();
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter => match self.focus_index {
                REGISTER_LINK => return Ok(Some(SelectedApp::Register)),
                EXIT => self.exit_dialog.show(),
                _ => return Ok(self.submit(ctx)),
            },
            KeyCode::Esc => self.exit_dialog.show(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, _ctx: &AppContext) {
        widgets::render_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title
                Constraint::Length(1), // Spacing
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(2), // Flash
                Constraint::Length(1), // Register link
                Constraint::Length(1), // Exit
                Constraint::Length(1), // Spacing
                Constraint::Length(3), // Demo accounts
                Constraint::Min(0),
            ])
            .margin(1)
            .split(widgets::centered_rect(60, 80, frame.area()));

        widgets::render_header(
            frame,
            layout[0],
            "CareDesk",
            "Log in to your account",
        );

        self.email.render(frame, layout[2], self.focus_index == EMAIL);
        self.password.render(frame, layout[3], self.focus_index == PASSWORD);
        self.flash.render(frame, layout[4]);

        let link_style = |focused: bool| {
            if focused {
                Style::default()
                    .fg(widgets::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MUTED)
            }
        };
        frame.render_widget(
            Paragraph::new("Don't have an account? Register")
                .style(link_style(self.focus_index == REGISTER_LINK))
                .alignment(Alignment::Center),
            layout[5],
        );
        frame.render_widget(
            Paragraph::new("Exit")
                .style(link_style(self.focus_index == EXIT))
                .alignment(Alignment::Center),
            layout[6],
        );

        let demo = vec![
            Line::from(Span::styled("Demo accounts", Style::default().fg(ACCENT))),
            Line::from(Span::styled(
                "admin@hospital.com / admin123",
                Style::default().fg(MUTED),
            )),
            Line::from(Span::styled(
                "doctor@hospital.com / doctor123",
                Style::default().fg(MUTED),
            )),
        ];
        frame.render_widget(
            Paragraph::new(demo).alignment(Alignment::Center),
            layout[8],
        );

        self.exit_dialog
            .render(frame, "Confirm Exit", "Are you sure you want to quit?");
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}
