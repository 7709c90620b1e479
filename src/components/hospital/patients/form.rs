//! Shared add/edit form for patient records.

use crate::app::{AppContext, SelectedApp};
use crate::components::widgets::{self, Flash, TextField, ACCENT, DANGER, MUTED};
use crate::components::Component;
use crate::models::{Gender, NewPatient, Patient, PatientPatch};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::error;

// Text field slots.
const FIRST_NAME: usize = 0;
const LAST_NAME: usize = 1;
const DATE_OF_BIRTH: usize = 2;
const CONTACT: usize = 3;
const EMAIL: usize = 4;
const ADDRESS: usize = 5;
const EMERGENCY: usize = 6;
const BLOOD_TYPE: usize = 7;
const HEALTH_ISSUE: usize = 8;
const DIAGNOSIS: usize = 9;
const ALLERGIES: usize = 10;
const MEDICATIONS: usize = 11;
const NOTES: usize = 12;
const FIELD_COUNT: usize = 13;

// Focus slots. The gender selector sits after the date of birth.
const GENDER: usize = 3;
const SAVE: usize = 14;
const CANCEL: usize = 15;
const FOCUS_COUNT: usize = 16;

/// Rows of the left column, by focus slot.
const LEFT_COLUMN: [usize; 7] = [0, 1, 2, GENDER, 4, 5, 6];

const SAVE_FAILED: &str = "An error occurred while saving the patient record";
const NOT_FOUND: &str = "Patient not found";

/// Maps a focus slot to its text field.
fn field_at(focus: usize) -> Option<usize> {
    match focus {
        0..=2 => Some(focus),
        4..=13 => Some(focus - 1),
        _ => None,
    }
}

/// Checks that `value` is a real calendar date written as `YYYY-MM-DD` and
/// not in the future.
fn validate_date_of_birth(value: &str) -> Result<(), &'static str> {
    let date = Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| "Date of birth must be a valid date (YYYY-MM-DD).")?;
    if date > OffsetDateTime::now_utc().date() {
        return Err("Date of birth cannot be in the future.");
    }
    Ok(())
}

fn blank_fields() -> [TextField; FIELD_COUNT] {
    [
        TextField::new("First Name").required(),
        TextField::new("Last Name").required(),
        TextField::new("Date of Birth (YYYY-MM-DD)").required(),
        TextField::new("Phone").required(),
        TextField::new("Email"),
        TextField::new("Address").required(),
        TextField::new("Emergency Contact").required(),
        TextField::new("Blood Type"),
        TextField::new("Health Issue").required(),
        TextField::new("Diagnosis").required(),
        TextField::new("Allergies").required(),
        TextField::new("Medications").required(),
        TextField::new("Additional Notes"),
    ]
}

fn prefilled_fields(patient: &Patient) -> [TextField; FIELD_COUNT] {
    let [
        first,
        last,
        dob,
        phone,
        email,
        address,
        emergency,
        blood,
        issue,
        diagnosis,
        allergies,
        medications,
        notes,
    ] = blank_fields();
    let optional = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        first.with_value(&patient.first_name),
        last.with_value(&patient.last_name),
        dob.with_value(&patient.date_of_birth),
        phone.with_value(&patient.contact_number),
        email.with_value(optional(&patient.email)),
        address.with_value(&patient.address),
        emergency.with_value(&patient.emergency_contact),
        blood.with_value(optional(&patient.blood_type)),
        issue.with_value(&patient.health_issue),
        diagnosis.with_value(&patient.diagnosis),
        allergies.with_value(&patient.allergies),
        medications.with_value(&patient.medications),
        notes.with_value(optional(&patient.notes)),
    ]
}

/// Add or edit a patient record.
pub struct PatientForm {
    /// Id of the record being edited; `None` when adding.
    editing: Option<String>,
    /// Set when the edited record does not exist.
    not_found: bool,
    fields: [TextField; FIELD_COUNT],
    gender: Option<Gender>,
    focus_index: usize,
    flash: Flash,
}

impl PatientForm {
    /// An empty form for a new patient.
    pub fn new() -> Self {
        Self {
            editing: None,
            not_found: false,
            fields: blank_fields(),
            gender: None,
            focus_index: 0,
            flash: Flash::default(),
        }
    }

    /// A form pre-filled from the patient `id`.
    pub fn edit(ctx: &AppContext, id: String) -> Self {
        let mut form = Self::new();
        match ctx.data.get_patient_by_id(&id) {
            Some(patient) => {
                form.fields = prefilled_fields(patient);
                form.gender = Some(patient.gender);
            }
            None => form.not_found = true,
        }
        form.editing = Some(id);
        form
    }

    fn cycle_gender(&mut self) {
        self.gender = Some(self.gender.map_or(Gender::Male, Gender::next));
    }

    /// Runs the form checks and assembles the record input.
    fn collect(&self) -> Result<NewPatient, String> {
        if let Some(field) = widgets::first_missing(&self.fields[..DATE_OF_BIRTH + 1]) {
            return Err(format!("{} is required.", field.label));
        }
        validate_date_of_birth(self.fields[DATE_OF_BIRTH].trimmed())?;
        let Some(gender) = self.gender else {
            return Err("Gender is required.".to_string());
        };
        if let Some(field) = widgets::first_missing(&self.fields[CONTACT..]) {
            return Err(format!("{} is required.", field.label));
        }

        let text = |i: usize| self.fields[i].trimmed().to_string();
        Ok(NewPatient {
            first_name: text(FIRST_NAME),
            last_name: text(LAST_NAME),
            date_of_birth: text(DATE_OF_BIRTH),
            gender,
            contact_number: text(CONTACT),
            email: self.fields[EMAIL].optional(),
            address: text(ADDRESS),
            emergency_contact: text(EMERGENCY),
            blood_type: self.fields[BLOOD_TYPE].optional(),
            health_issue: text(HEALTH_ISSUE),
            diagnosis: text(DIAGNOSIS),
            allergies: text(ALLERGIES),
            medications: text(MEDICATIONS),
            notes: self.fields[NOTES].optional(),
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

        let result = match &self.editing {
            Some(id) => ctx.data.update_patient(
                &ctx.storage,
                id,
                &PatientPatch::from(input),
                ctx.auth.user(),
            ),
            None => ctx
                .data
                .add_patient(&ctx.storage, input, ctx.auth.user())
                .map(|_| true),
        };

        match result {
            Ok(true) => Some(SelectedApp::PatientList),
            Ok(false) => {
                self.not_found = true;
                self.flash.error(NOT_FOUND);
                None
            }
            Err(e) => {
                error!(error = ?e, editing = ?self.editing, "failed to save patient");
                self.flash.error(SAVE_FAILED);
                None
            }
        }
    }
}

impl Default for PatientForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for PatientForm {
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
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.focus_index == GENDER => {
                self.cycle_gender();
            }
            KeyCode::Char(_) | KeyCode::Backspace => {
                if let Some(i) = field_at(self.focus_index) {
                    if self.fields[i].edit(event.code) {
                        self.flash.clear();
                    }
                }
            }
            KeyCode::Enter => {
                if self.focus_index == CANCEL {
                    return Ok(Some(SelectedApp::PatientList));
                }
                return Ok(self.save(ctx));
            }
            KeyCode::Esc => return Ok(Some(SelectedApp::PatientList)),
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
                Constraint::Length(21), // Fields
                Constraint::Length(1),  // Flash
                Constraint::Length(3),  // Buttons
                Constraint::Length(1),  // Help
                Constraint::Min(0),
            ])
            .margin(1)
            .split(frame.area());

        let (title, subtitle) = if self.editing.is_some() {
            ("EDIT PATIENT", "Update the patient record")
        } else {
            ("ADD PATIENT", "Create a new patient record")
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
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(layout[1]);
            let rows = |area: Rect| {
                Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3); 7])
                    .split(area)
            };
            let left = rows(columns[0]);
            let right = rows(columns[1]);

            for (row, &focus) in LEFT_COLUMN.iter().enumerate() {
                let focused = self.focus_index == focus;
                match field_at(focus) {
                    Some(i) => self.fields[i].render(frame, left[row], focused),
                    None => {
                        let gender = self
                            .gender
                            .map_or_else(|| "Select gender".to_string(), |g| g.to_string());
                        widgets::render_input(
                            frame,
                            left[row],
                            " Gender * ",
                            &format!("◄ {gender} ►"),
                            focused,
                        );
                    }
                }
            }
            for (row, focus) in (7..=13).enumerate() {
                if let Some(i) = field_at(focus) {
                    self.fields[i].render(frame, right[row], self.focus_index == focus);
                }
            }
        }

        self.flash.render(frame, layout[2]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[3]);
        let save_label = if self.editing.is_some() {
            "Update Patient"
        } else {
            "Save Patient"
        };
        widgets::render_button(frame, buttons[0], save_label, self.focus_index == SAVE, ACCENT);
        widgets::render_button(frame, buttons[1], "Cancel", self.focus_index == CANCEL, DANGER);

        frame.render_widget(
            Paragraph::new("Tab/↑↓: Move | ←→: Gender | Enter: Save | Esc: Cancel")
                .style(Style::default().fg(MUTED))
                .alignment(Alignment::Center),
            layout[4],
        );
    }

    fn tick(&mut self) {
        self.flash.check_timeout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{key, logged_in};
    use crate::models::fixtures::new_patient;

    fn fill(form: &mut PatientForm, input: &NewPatient) {
        let values: [&str; FIELD_COUNT] = [
            &input.first_name,
            &input.last_name,
            &input.date_of_birth,
            &input.contact_number,
            input.email.as_deref().unwrap_or_default(),
            &input.address,
            &input.emergency_contact,
            input.blood_type.as_deref().unwrap_or_default(),
            &input.health_issue,
            &input.diagnosis,
            &input.allergies,
            &input.medications,
            input.notes.as_deref().unwrap_or_default(),
        ];
        for (field, value) in form.fields.iter_mut().zip(values) {
            field.value = value.to_string();
        }
        form.gender = Some(input.gender);
    }

    #[test]
    fn focus_slots_cover_every_field_once() {
        let mapped: Vec<usize> = (0..FOCUS_COUNT).filter_map(field_at).collect();
        assert_eq!(mapped, (0..FIELD_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn date_of_birth_must_be_a_past_iso_date() {
        assert!(validate_date_of_birth("1985-05-15").is_ok());
        assert!(validate_date_of_birth("15/05/1985").is_err());
        assert!(validate_date_of_birth("1985-02-30").is_err());
        assert!(validate_date_of_birth("2999-01-01").is_err());
    }

    #[test]
    fn missing_required_field_is_named() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = PatientForm::new();
        let mut input = new_patient();
        input.diagnosis = "  ".into();
        fill(&mut form, &input);

        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, None);
        assert_eq!(form.flash.text(), Some("Diagnosis is required."));
        assert_eq!(ctx.data.patients().len(), 3);
    }

    #[test]
    fn gender_must_be_chosen() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = PatientForm::new();
        fill(&mut form, &new_patient());
        form.gender = None;

        form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(form.flash.text(), Some("Gender is required."));
    }

    #[test]
    fn add_saves_and_returns_to_list() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = PatientForm::new();
        fill(&mut form, &new_patient());

        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, Some(SelectedApp::PatientList));
        let found = ctx.data.search_patients("byron");
        let added = found[0];
        assert_eq!(added.blood_type.as_deref(), Some("AB+"));
        assert_eq!(added.notes, None);
        assert_eq!(added.created_by, ctx.auth.user().unwrap().id);
    }

    #[test]
    fn edit_prefills_and_updates() {
        let mut ctx = logged_in("doctor@hospital.com", "doctor123");
        let id = ctx.data.patients()[0].id.clone();
        let mut form = PatientForm::edit(&ctx, id.clone());
        assert_eq!(form.fields[FIRST_NAME].value, "John");
        assert_eq!(form.gender, Some(Gender::Male));

        form.fields[NOTES].value.clear();
        form.fields[DIAGNOSIS].value = "Hypertension".into();
        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, Some(SelectedApp::PatientList));

        let patient = ctx.data.get_patient_by_id(&id).unwrap();
        assert_eq!(patient.diagnosis, "Hypertension");
        assert_eq!(patient.notes, None);
        assert_eq!(patient.created_by, "admin");
        assert_eq!(patient.last_updated_by, ctx.auth.user().unwrap().id);
    }

    #[test]
    fn editing_missing_patient_reports_not_found() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = PatientForm::edit(&ctx, "missing".into());
        assert!(form.not_found);

        let result = form.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(result, None);
        assert_eq!(form.flash.text(), Some(NOT_FOUND));
    }

    #[test]
    fn gender_selector_cycles() {
        let mut ctx = logged_in("admin@hospital.com", "admin123");
        let mut form = PatientForm::new();
        form.focus_index = GENDER;
        form.handle_input(key(KeyCode::Right), &mut ctx).unwrap();
        assert_eq!(form.gender, Some(Gender::Male));
        form.handle_input(key(KeyCode::Char(' ')), &mut ctx).unwrap();
        assert_eq!(form.gender, Some(Gender::Female));
        assert!(form.fields.iter().all(|f| f.value.is_empty()));
    }
}
