//! Patient list screen.

use crate::app::{AppContext, SelectedApp};
use crate::components::hospital::{clamp_selection, select_next, select_previous};
use crate::components::widgets::{
    self, ConfirmDialog, DialogOutcome, Flash, ACCENT, BORDER, HIGHLIGHT, MUTED, PANEL, TEXT,
};
use crate::components::Component;
use crate::models::{Patient, UserRole};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::error;

/// Component to display and search the patient list.
pub struct ListPatients {
    state: TableState,
    query: String,
    searching: bool,
    show_details: bool,
    delete_dialog: ConfirmDialog,
    /// Patient the open delete dialog refers to.
    pending_delete: Option<String>,
    flash: Flash,
}

impl ListPatients {
    /// Creates a new `ListPatients` component.
    pub fn new() -> Self {
        Self {
            state: TableState::default().with_selected(Some(0)),
            query: String::new(),
            searching: false,
            show_details: false,
            delete_dialog: ConfirmDialog::default(),
            pending_delete: None,
            flash: Flash::default(),
        }
    }

    fn visible<'a>(&self, ctx: &'a AppContext) -> Vec<&'a Patient> {
        ctx.data.search_patients(&self.query)
    }

    fn selected_patient<'a>(&self, ctx: &'a AppContext) -> Option<&'a Patient> {
        self.state
            .selected()
            .and_then(|i| self.visible(ctx).get(i).copied())
    }

    fn selected_id(&self, ctx: &AppContext) -> Option<String> {
        self.selected_patient(ctx).map(|p| p.id.clone())
    }

    fn handle_search(&mut self, code: KeyCode, ctx: &AppContext) {
        match code {
            KeyCode::Enter | KeyCode::Esc => self.searching = false,
            code => {
                match code {
                    KeyCode::Char(c) => self.query.push(c),
                    KeyCode::Backspace => {
                        self.query.pop();
                    }
                    _ => return,
                }
                let len = self.visible(ctx).len();
                self.state.select(Some(0));
                clamp_selection(&mut self.state, len);
            }
        }
    }

    fn confirm_delete(&mut self, ctx: &mut AppContext) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match ctx.data.delete_patient(&ctx.storage, &id) {
            Ok(true) => {
                self.show_details = false;
                self.flash.success("Patient record deleted.");
            }
            Ok(false) => self.flash.error("Patient not found"),
            Err(e) => {
                error!(patient_id = %id, error = ?e, "failed to delete patient");
                self.flash
                    .error("An error occurred while deleting the patient record");
            }
        }
        let len = self.visible(ctx).len();
        clamp_selection(&mut self.state, len);
    }

    fn denied(&mut self) {
        self.flash.error("You do not have permission to do that.");
    }
}

impl Default for ListPatients {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ListPatients {
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

        if self.searching {
            self.handle_search(event.code, ctx);
            return Ok(None);
        }

        let role = ctx.role();
        let len = self.visible(ctx).len();
        match event.code {
            KeyCode::Down => select_next(&mut self.state, len),
            KeyCode::Up => select_previous(&mut self.state, len),
            KeyCode::Enter | KeyCode::Char('v') => {
                if self.selected_patient(ctx).is_some() {
                    self.show_details = !self.show_details;
                }
            }
            KeyCode::Char('/') => {
                self.searching = true;
                self.show_details = false;
            }
            KeyCode::Char('a') => {
                if role.is_some_and(UserRole::can_manage_patients) {
                    return Ok(Some(SelectedApp::PatientAdd));
                }
                self.denied();
            }
            KeyCode::Char('e') => {
                if !role.is_some_and(UserRole::can_edit_patients) {
                    self.denied();
                } else if let Some(id) = self.selected_id(ctx) {
                    return Ok(Some(SelectedApp::PatientEdit(id)));
                }
            }
            KeyCode::Char('d') => {
                if !role.is_some_and(UserRole::can_manage_patients) {
                    self.denied();
                } else if let Some(id) = self.selected_id(ctx) {
                    self.pending_delete = Some(id);
                    self.delete_dialog.show();
                }
            }
            KeyCode::Esc => {
                if self.show_details {
                    self.show_details = false;
                } else if !self.query.is_empty() {
                    self.query.clear();
                    clamp_selection(&mut self.state, ctx.data.patients().len());
                } else {
                    return Ok(Some(SelectedApp::Home));
                }
            }
            KeyCode::Char('b') => return Ok(Some(SelectedApp::Home)),
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
                Constraint::Length(3), // Search
                Constraint::Min(8),    // Table
                Constraint::Length(if self.show_details { 10 } else { 0 }),
                Constraint::Length(1), // Flash
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(frame.area());

        let patients = self.visible(ctx);
        widgets::render_header(
            frame,
            layout[0],
            "PATIENT RECORDS",
            &format!("{} of {} patients", patients.len(), ctx.data.patients().len()),
        );

        let search = if self.searching {
            format!("{}▏", self.query)
        } else if self.query.is_empty() {
            "Press / to search by name, health issue or diagnosis".to_string()
        } else {
            self.query.clone()
        };
        widgets::render_input(frame, layout[1], " Search ", &search, self.searching);

        let header_cells = [
            "Name",
            "Date of Birth",
            "Gender",
            "Phone",
            "Health Issue",
            "Diagnosis",
        ]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Rgb(230, 230, 250))));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Rgb(26, 26, 36)))
            .height(1)
            .bottom_margin(1);

        let rows = patients.iter().map(|patient| {
            Row::new(vec![
                Cell::from(patient.full_name()),
                Cell::from(patient.date_of_birth.clone()),
                Cell::from(patient.gender.to_string()),
                Cell::from(patient.contact_number.clone()),
                Cell::from(patient.health_issue.clone()),
                Cell::from(patient.diagnosis.clone()),
            ])
            .style(Style::default().fg(TEXT))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Percentage(13),
                Constraint::Percentage(9),
                Constraint::Percentage(15),
                Constraint::Percentage(18),
                Constraint::Percentage(25),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Patients ")
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
        frame.render_stateful_widget(table, layout[2], &mut self.state.clone());

        if patients.is_empty() {
            let empty = Paragraph::new("No patients found")
                .style(Style::default().fg(MUTED))
                .alignment(Alignment::Center);
            frame.render_widget(empty, centered_line(layout[2]));
        }

        if self.show_details {
            if let Some(patient) = self.selected_patient(ctx) {
                render_details(frame, layout[3], patient);
            }
        }

        self.flash.render(frame, layout[4]);

        let help = match ctx.role() {
            Some(UserRole::Admin) => {
                "↑↓: Navigate | Enter: View | /: Search | A: Add | E: Edit | D: Delete | Esc: Back"
            }
            Some(UserRole::Doctor) => {
                "↑↓: Navigate | Enter: View | /: Search | E: Edit | Esc: Back"
            }
            _ => "↑↓: Navigate | Enter: View | /: Search | Esc: Back",
        };
        widgets::render_help(frame, layout[5], help);

        let message = self
            .pending_delete
            .as_deref()
            .and_then(|id| ctx.data.get_patient_by_id(id))
            .map(|p| format!("Delete the record of {}?", p.full_name()))
            .unwrap_or_else(|| "Delete this patient record?".to_string());
        self.delete_dialog.render(frame, "Confirm Deletion", &message);
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}

fn centered_line(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    }
}

fn render_details(frame: &mut Frame, area: Rect, patient: &Patient) {
    let label =
        |name: &'static str| Span::styled(format!("{name:<19}"), Style::default().fg(MUTED));
    let value = |text: &str| Span::styled(text.to_string(), Style::default().fg(TEXT));
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            label("Contact"),
            value(&format!(
                "{} | {}",
                patient.contact_number,
                or_dash(&patient.email)
            )),
        ]),
        Line::from(vec![label("Address"), value(&patient.address)]),
        Line::from(vec![label("Emergency contact"), value(&patient.emergency_contact)]),
        Line::from(vec![label("Blood type"), value(&or_dash(&patient.blood_type))]),
        Line::from(vec![label("Allergies"), value(&patient.allergies)]),
        Line::from(vec![label("Medications"), value(&patient.medications)]),
        Line::from(vec![label("Notes"), value(&or_dash(&patient.notes))]),
        Line::from(vec![
            label("Last updated"),
            value(&widgets::format_timestamp(patient.updated_at)),
        ]),
    ];

    let details = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!(" {} ", patient.full_name()))
                .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(HIGHLIGHT))
                .style(Style::default().bg(PANEL)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(details, area);
}
