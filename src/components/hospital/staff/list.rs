//! Staff directory screen.
//!
//! This module lists every staff member and lets an administrator:
//! - Toggle a member between active and inactive
//! - Open the add and edit forms
//! - Delete a member after confirmation
//!
//! The role gate lives in the navigation layer; only administrators can reach
//! this screen.

use crate::app::{AppContext, SelectedApp};
use crate::components::hospital::{clamp_selection, select_next, select_previous};
use crate::components::widgets::{
    self, ConfirmDialog, DialogOutcome, Flash, BORDER, DANGER, PANEL, SUCCESS, TEXT,
};
use crate::components::Component;
use crate::models::{StaffMember, StaffPatch};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::error;

/// Component for browsing and maintaining the staff directory.
pub struct ListStaff {
    /// Selection state for the staff table
    state: TableState,
    /// Confirmation shown before a member is deleted
    delete_dialog: ConfirmDialog,
    /// Member the open delete dialog refers to
    pending_delete: Option<String>,
    /// Result of the last action
    flash: Flash,
}

impl ListStaff {
    /// Creates a new `ListStaff` component with the first row selected.
    pub fn new() -> Self {
        Self {
            state: TableState::default().with_selected(Some(0)),
            delete_dialog: ConfirmDialog::default(),
            pending_delete: None,
            flash: Flash::default(),
        }
    }

    /// The member under the cursor, if any.
    fn selected<'a>(&self, ctx: &'a AppContext) -> Option<&'a StaffMember> {
        self.state
            .selected()
            .and_then(|i| ctx.data.staff_members().get(i))
    }

    /// Flips the active flag of the selected member.
    fn toggle_active(&mut self, ctx: &mut AppContext) {
        let Some((id, name, is_active)) = self
            .selected(ctx)
            .map(|s| (s.id.clone(), s.name.clone(), s.is_active))
        else {
            return;
        };

        let patch = StaffPatch {
            is_active: Some(!is_active),
            ..Default::default()
        };
        match ctx.data.update_staff_member(&ctx.storage, &id, &patch) {
            Ok(true) if is_active => self.flash.success(format!("{name} marked inactive.")),
            Ok(true) => self.flash.success(format!("{name} marked active.")),
            Ok(false) => self.flash.error("Staff member not found"),
            Err(e) => {
                error!(staff_id = %id, error = ?e, "failed to toggle staff member");
                self.flash
                    .error("An error occurred while updating the staff member");
            }
        }
    }

    /// Deletes the member the dialog was opened for.
    fn confirm_delete(&mut self, ctx: &mut AppContext) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match ctx.data.delete_staff_member(&ctx.storage, &id) {
            Ok(true) => self.flash.success("Staff member removed."),
            Ok(false) => self.flash.error("Staff member not found"),
            Err(e) => {
                error!(staff_id = %id, error = ?e, "failed to delete staff member");
                self.flash
                    .error("An error occurred while deleting the staff member");
            }
        }
        clamp_selection(&mut self.state, ctx.data.staff_members().len());
    }
}

impl Default for ListStaff {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ListStaff {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut AppContext,
    ) -> Result<Option<SelectedApp>> {
        if self.delete_dialog.open {
            match self.delete_dialog.handle_key(event.code) {
                DialogOutcome::Confirmed => self.confirm_delete(ctx),
                DialogOutcome::Cancelled => self.pending_delete = None,
                DialogOutcome::Pending => {}
            }
            return Ok(None);
        }

        let len = ctx.data.staff_members().len();
        match event.code {
            KeyCode::Down => select_next(&mut self.state, len),
            KeyCode::Up => select_previous(&mut self.state, len),
            KeyCode::Char('t') | KeyCode::Char(' ') => self.toggle_active(ctx),
            KeyCode::Char('a') => return Ok(Some(SelectedApp::StaffAdd)),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(member) = self.selected(ctx) {
                    return Ok(Some(SelectedApp::StaffEdit(member.id.clone())));
                }
            }
            KeyCode::Char('d') => {
                if let Some(member) = self.selected(ctx) {
                    self.pending_delete = Some(member.id.clone());
                    self.delete_dialog.show();
                }
            }
            KeyCode::Char('c') => return Ok(Some(SelectedApp::CreateAccount)),
            KeyCode::Esc | KeyCode::Char('b') => return Ok(Some(SelectedApp::Home)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, ctx: &AppContext) {
        widgets::render_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Min(8),    // Table
                Constraint::Length(1), // Flash
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(frame.area());

        let staff = ctx.data.staff_members();
        widgets::render_header(
            frame,
            layout[0],
            "STAFF DIRECTORY",
            &format!(
                "{} members, {} active",
                staff.len(),
                ctx.data.active_staff_count()
            ),
        );

        let header_cells = [
            "Name",
            "Email",
            "Role",
            "Department",
            "Specialization",
            "Contact",
            "Status",
        ]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Rgb(230, 230, 250))));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Rgb(26, 26, 36)))
            .height(1)
            .bottom_margin(1);

        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let rows = staff.iter().map(|member| {
            let status = if member.is_active {
                Cell::from("Active").style(Style::default().fg(SUCCESS))
            } else {
                Cell::from("Inactive").style(Style::default().fg(DANGER))
            };
            Row::new(vec![
                Cell::from(member.name.clone()),
                Cell::from(member.email.clone()),
                Cell::from(member.role.to_string()),
                Cell::from(or_dash(&member.department)),
                Cell::from(or_dash(&member.specialization)),
                Cell::from(or_dash(&member.contact_number)),
                status,
            ])
            .style(Style::default().fg(TEXT))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(18),
                Constraint::Percentage(22),
                Constraint::Percentage(8),
                Constraint::Percentage(14),
                Constraint::Percentage(16),
                Constraint::Percentage(12),
                Constraint::Percentage(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Staff ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER))
                .style(Style::default().bg(PANEL)),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 65))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("► ");
        frame.render_stateful_widget(table, layout[1], &mut self.state.clone());

        self.flash.render(frame, layout[2]);
        widgets::render_help(
            frame,
            layout[3],
            "↑↓: Navigate | T: Toggle | A: Add | E: Edit | D: Delete | C: Account | Esc: Back",
        );

        let message = self
            .pending_delete
            .as_deref()
            .and_then(|id| ctx.data.get_staff_member_by_id(id))
            .map(|s| format!("Remove {} from the directory?", s.name))
            .unwrap_or_else(|| "Remove this staff member?".to_string());
        self.delete_dialog.render(frame, "Confirm Deletion", &message);
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}
