//! Registration component for CareDesk.

use crate::app::{AppContext, SelectedApp};
use crate::auth::validate_registration;
use crate::components::widgets::{self, Flash, TextField, ACCENT, DANGER};
use crate::components::Component;
use crate::models::{RegisterData, UserRole};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

const NAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;
const CONFIRM: usize = 3;
const ROLE: usize = 4;
const SUBMIT: usize = 5;
const BACK: usize = 6;
const FOCUS_COUNT: usize = 7;

/// Represents the registration UI component.
pub struct Register {
    /// Name, email, password and confirmation, in focus order.
    fields: [TextField; 4],
    role_index: usize,
    focus_index: usize,
    flash: Flash,
}

impl Register {
    /// Creates a new `Register` component.
    pub fn new() -> Self {
        Self {
            fields: [
                TextField::new("Full Name").required(),
                TextField::new("Email Address").required(),
                TextField::new("Password").required().masked(),
                TextField::new("Confirm Password").required().masked(),
            ],
            role_index: 0,
            focus_index: NAME,
            flash: Flash::default(),
        }
    }

    fn role(&self) -> UserRole {
        UserRole::ALL[self.role_index]
    }

    fn submit(&mut self, ctx: &mut AppContext) -> Option<SelectedApp> {
        if let Some(field) = widgets::first_missing(&self.fields) {
            self.flash.error(format!("{} is required.", field.label));
            return None;
        }

        let password = self.fields[PASSWORD].value.clone();
        if let Err(e) = validate_registration(&password, &self.fields[CONFIRM].value) {
            self.flash.error(e.to_string());
            return None;
        }

        let data = RegisterData {
            name: self.fields[NAME].trimmed().to_string(),
            email: self.fields[EMAIL].trimmed().to_string(),
            password,
            role: self.role(),
        };
        if ctx.auth.register(&ctx.storage, &data) {
            Some(SelectedApp::Home)
        } else {
            if let Some(message) = ctx.auth.error() {
                self.flash.error(message);
            }
            None
        }
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Register {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>> {
        match event.code {
            KeyCode::Char(_) | KeyCode::Backspace if self.focus_index < ROLE => {
                if self.fields[self.focus_index].edit(event.code) {
                    self.flash.clear();
                }
            }
            KeyCode::Left if self.focus_index == ROLE => {
                self.role_index = (self.role_index + UserRole::ALL.len() - 1) % UserRole::ALL.len();
            }
            KeyCode::Right | KeyCode::Char(' ') if self.focus_index == ROLE => {
                self.role_index = (self.role_index + 1) % UserRole::ALL.len();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter => {
                if self.focus_index == BACK {
                    return Ok(Some(SelectedApp::Login));
                }
                return Ok(self.submit(ctx));
            }
            KeyCode::Esc => return Ok(Some(SelectedApp::Login)),
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
                Constraint::Length(3), // Name
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(3), // Confirm
                Constraint::Length(3), // Role
                Constraint::Length(2), // Flash
                Constraint::Length(3), // Buttons
                Constraint::Length(1), // Help
                Constraint::Min(0),
            ])
            .margin(1)
            .split(widgets::centered_rect(60, 90, frame.area()));

        widgets::render_header(frame, layout[0], "Create an account", "Register with CareDesk");

        for (i, field) in self.fields.iter().enumerate() {
            field.render(frame, layout[1 + i], self.focus_index == i);
        }

        let role = format!("◄ {} ►", self.role());
        widgets::render_input(frame, layout[5], " Role ", &role, self.focus_index == ROLE);

        self.flash.render(frame, layout[6]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[7]);
        widgets::render_button(frame, buttons[0], "Register", self.focus_index == SUBMIT, ACCENT);
        widgets::render_button(
            frame,
            buttons[1],
            "Back to Login",
            self.focus_index == BACK,
            DANGER,
        );

        widgets::render_help(
            frame,
            layout[8],
            "Tab/↑↓: Move | ←→: Change role | Enter: Register | Esc: Back",
        );
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}
