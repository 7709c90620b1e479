//! Shared add/edit form for staff members.

use crate::app::{AppContext, SelectedApp};
use crate::components::widgets::{self, Flash, TextField, ACCENT, DANGER};
use crate::components::Component;
use crate::models::{NewStaffMember, StaffPatch, StaffRole};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use tracing::error;

const NAME: usize = 0;
const EMAIL: usize = 1;
const DEPARTMENT: usize = 2;
const SPECIALIZATION: usize = 3;
const CONTACT: usize = 4;
const FIELD_COUNT: usize = 5;

// Focus slots.
const ROLE: usize = 2;
const SAVE: usize = 6;
const CANCEL: usize = 7;
const FOCUS_COUNT: usize = 8;

const NOT_FOUND: &str = "Staff member not found";

/// Maps a focus slot to its text field; the role selector has none.
fn field_at(focus: usize) -> Option<usize> {
    match focus {
        0..=1 => Some(focus),
        3..=5 => Some(focus - 1),
        _ => None,
    }
}

fn blank_fields() -> [TextField; FIELD_COUNT] {
    [
        TextField::new("Full Name").required(),
        TextField::new("Email").required(),
        TextField::new("Department"),
        TextField::new("Specialization"),
        TextField::new("Contact Number"),
    ]
}

pub struct StaffForm {
    editing: Option<String>,
    not_found: bool,
    fields: [TextField; FIELD_COUNT],
    role: StaffRole,
    focus_index: usize,
    flash: Flash,
}

impl StaffForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            not_found: false,
            fields: blank_fields(),
            role: StaffRole::Doctor,
            focus_index: 0,
            flash: Flash::default(),
        }
    }

    /// A form pre-filled from the staff member `id`.
    pub fn edit(ctx: &AppContext, id: String) -> Self {
        let mut form = Self::new();
        match ctx.data.get_staff_member_by_id(&id) {
            Some(member) => {
                let [name, email, department, specialization, contact] = blank_fields();
                let optional = |v: &Option<String>| v.clone().unwrap_or_default();
                form.fields = [
                    name.with_value(&member.name),
                    email.with_value(&member.email),
                    department.with_value(optional(&member.department)),
                    specialization.with_value(optional(&member.specialization)),
                    contact.with_value(optional(&member.contact_number)),
                ];
                form.role = member.role;
            }
            None => form.not_found = true,
        }
        form.editing = Some(id);
        form
    }

    fn collect(&self) -> Result<NewStaffMember, String> {
        if let Some(field) = widgets::first_missing(&self.fields) {
            return Err(format!("{} is required.", field.label));
        }
        Ok(NewStaffMember {
            name: self.fields[NAME].trimmed().to_string(),
            email: self.fields[EMAIL].trimmed().to_string(),
            role: self.role,
            department: self.fields[DEPARTMENT].optional(),
            specialization: self.fields[SPECIALIZATION].optional(),
            contact_number: self.fields[CONTACT].optional(),
        })
    }

    fn save(&mut self, ctx: &mut AppContext) -> Option<SelectedApp> {
        if self.not_found {
            self.flash.error(NOT_FOUND);
            return None;
        }
        let input = match self.collect() {
            Ok(input) => input,
            Err(message) => {
                self.flash.error(message);
                return None;
            }
        };

        // Editing keeps the active flag as it is.
        let result = match &self.editing {
            Some(id) => ctx
                .data
                .update_staff_member(&ctx.storage, id, &StaffPatch::from(input)),
            None => ctx
                .data
                .add_staff_member(&ctx.storage, input)
                .map(|_| true),
        };

        match result {
            Ok(true) => Some(SelectedApp::StaffList),
            Ok(false) => {
                self.not_found = true;
                self.flash.error(NOT_FOUND);
                None
            }
            Err(e) => {
                error!(error = ?e, editing = ?self.editing, "failed to save staff member");
                self.flash
                    .error("An error occurred while saving the staff member");
                None
            }
        }
    }
}

impl Default for StaffForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StaffForm {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>> {
        match event.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.focus_index == ROLE => {
                self.role = self.role.toggle();
            }
            KeyCode::Char(_) | KeyCode::Backspace => {
                if let Some(i) = field_at(self.focus_index) {
                    if self.fields[i].edit(event.code) {
                        self.flash.clear();
                    }
                }
            }
            KeyCode::Enter if self.focus_index == CANCEL => {
                return Ok(Some(SelectedApp::StaffList));
            }
            KeyCode::Enter => return Ok(self.save(ctx)),
            KeyCode::Esc => return Ok(Some(SelectedApp::StaffList)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, _ctx: &AppContext) {
        widgets::render_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),  // Title
                Constraint::Length(18), // Fields
                Constraint::Length(1),  // Flash
                Constraint::Length(3),  // Buttons
                Constraint::Length(1),  // Help
                Constraint::Min(0),
            ])
            .margin(1)
            .split(widgets::centered_rect(70, 95, frame.area()));

        let (title, subtitle) = if self.editing.is_some() {
            ("EDIT STAFF MEMBER", "Update directory details")
        } else {
            ("ADD STAFF MEMBER", "Add a doctor or staff member to the directory")
        };
        widgets::render_header(frame, layout[0], title, subtitle);

        if self.not_found {
            frame.render_widget(
                Paragraph::new(NOT_FOUND)
                    .style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD))
                    .alignment(Alignment::Center),
                layout[1],
            );
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3); 6])
                .split(layout[1]);
            for (row, area) in rows.iter().enumerate() {
                let focused = self.focus_index == row;
                match field_at(row) {
                    Some(i) => self.fields[i].render(frame, *area, focused),
                    None => widgets::render_input(
                        frame,
                        *area,
                        " Role * ",
                        &format!("◄ {} ►", self.role),
                        focused,
                    ),
                }
            }
        }

        self.flash.render(frame, layout[2]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[3]);
        widgets::render_button(frame, buttons[0], "Save", self.focus_index == SAVE, ACCENT);
        widgets::render_button(frame, buttons[1], "Cancel", self.focus_index == CANCEL, DANGER);

        widgets::render_help(
            frame,
            layout[4],
            "Tab/↑↓: Move | ←→: Role | Enter: Save | Esc: Cancel",
        );
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{key, logged_in, type_text};

    #[test]
    fn typed_member_is_added_active() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = StaffForm::new();
        type_text(&mut form, &mut ctx, "Nurse Ada");
        form.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_text(&mut form, &mut ctx, "ada@hospital.com");
        form.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        form.handle_input(key(KeyCode::Right), &mut ctx).unwrap();
        form.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_text(&mut form, &mut ctx, "Pediatrics");

        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, Some(SelectedApp::StaffList));

        let added = ctx.data.staff_members().last().unwrap();
        assert_eq!(added.name, "Nurse Ada");
        assert_eq!(added.role, StaffRole::Staff);
        assert_eq!(added.department.as_deref(), Some("Pediatrics"));
        assert_eq!(added.specialization, None);
        assert!(added.is_active);
    }

    #[test]
    fn email_is_required() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = StaffForm::new();
        type_text(&mut form, &mut ctx, "Nurse Ada");
        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, None);
        assert_eq!(form.flash.text(), Some("Email is required."));
    }

    #[test]
    fn edit_keeps_active_flag() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let id = ctx.data.staff_members()[2].id.clone();
        let patch = StaffPatch {
            is_active: Some(false),
            ..Default::default()
        };
        ctx.data
            .update_staff_member(&ctx.storage, &id, &patch)
            .unwrap();

        let mut form = StaffForm::edit(&ctx, id.clone());
        assert_eq!(form.fields[NAME].value, "Nurse Jessica Brown");
        assert_eq!(form.role, StaffRole::Staff);
        form.fields[DEPARTMENT].value = "Emergency".into();
        form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        let member = ctx.data.get_staff_member_by_id(&id).unwrap();
        assert_eq!(member.department.as_deref(), Some("Emergency"));
        assert!(!member.is_active);
    }

    #[test]
    fn unknown_member_cannot_be_saved() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = StaffForm::edit(&ctx, "missing".into());
        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, None);
        assert_eq!(form.flash.text(), Some(NOT_FOUND));
        assert_eq!(ctx.data.staff_members().len(), 3);
    }
}
