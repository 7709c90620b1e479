//! Administrator screen for creating doctor and staff login accounts.

use crate::app::{AppContext, SelectedApp};
use crate::auth::validate_registration;
use crate::components::widgets::{self, Flash, TextField, ACCENT, DANGER};
use crate::components::Component;
use crate::models::{StaffAccountData, StaffRole};
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

pub struct CreateAccount {
    fields: [TextField; 4],
    role: StaffRole,
    focus_index: usize,
    flash: Flash,
}

impl CreateAccount {
    pub fn new() -> Self {
        Self {
            fields: [
                TextField::new("Full Name").required(),
                TextField::new("Email Address").required(),
                TextField::new("Password").required().masked(),
                TextField::new("Confirm Password").required().masked(),
            ],
            role: StaffRole::Doctor,
            focus_index: NAME,
            flash: Flash::default(),
        }
    }

    /// Creates the account and clears the form for the next one.
    fn submit(&mut self, ctx: &mut AppContext) {
        if let Some(field) = widgets::first_missing(&self.fields) {
            self.flash.error(format!("{} is required.", field.label));
            return;
        }
        if let Err(e) =
            validate_registration(&self.fields[PASSWORD].value, &self.fields[CONFIRM].value)
        {
            self.flash.error(e.to_string());
            return;
        }

        let data = StaffAccountData {
            name: self.fields[NAME].trimmed().to_string(),
            email: self.fields[EMAIL].trimmed().to_string(),
            password: self.fields[PASSWORD].value.clone(),
            role: self.role,
        };
        if ctx.auth.create_staff_account(&ctx.storage, &data) {
            self.flash.success(format!(
                "{} account created for {}.",
                data.role, data.email
            ));
            for field in &mut self.fields {
                field.value.clear();
            }
            self.focus_index = NAME;
        } else if let Some(message) = ctx.auth.error() {
            self.flash.error(message);
        }
    }
}

impl Default for CreateAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for CreateAccount {
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
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.focus_index == ROLE => {
                self.role = self.role.toggle();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter if self.focus_index == BACK => return Ok(Some(SelectedApp::Home)),
            KeyCode::Enter => self.submit(ctx),
            KeyCode::Esc => return Ok(Some(SelectedApp::Home)),
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

        widgets::render_header(
            frame,
            layout[0],
            "CREATE STAFF ACCOUNT",
            "Give a doctor or staff member access to CareDesk",
        );

        for (i, field) in self.fields.iter().enumerate() {
            field.render(frame, layout[1 + i], self.focus_index == i);
        }
        widgets::render_input(
            frame,
            layout[5],
            " Role ",
            &format!("◄ {} ►", self.role),
            self.focus_index == ROLE,
        );

        self.flash.render(frame, layout[6]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[7]);
        widgets::render_button(
            frame,
            buttons[0],
            "Create Account",
            self.focus_index == SUBMIT,
            ACCENT,
        );
        widgets::render_button(frame, buttons[1], "Back", self.focus_index == BACK, DANGER);

        widgets::render_help(
            frame,
            layout[8],
            "Tab/↑↓: Move | ←→: Change role | Enter: Create | Esc: Back",
        );
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}
