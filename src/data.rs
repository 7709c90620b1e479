//! Patient and staff records for CareDesk.
//!
//! [`DataState`] keeps the patient and staff lists in memory and mirrors every
//! change to the `patients` and `staffMembers` storage keys. Each mutation
//! rewrites the whole list.

use crate::db::{Storage, KEY_PATIENTS, KEY_STAFF};
use crate::models::{
    generate_id, merge, now, Gender, NewPatient, NewStaffMember, Patient, PatientPatch,
    StaffMember, StaffPatch, StaffRole, User, UNKNOWN_ACTOR,
};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Audit identity of the seeded demo patients.
const SEED_ACTOR: &str = "admin";

/// The data state holder.
#[derive(Debug)]
pub struct DataState {
    patients: Vec<Patient>,
    staff_members: Vec<StaffMember>,
}

impl DataState {
    /// Loads both lists from storage, seeding whichever one is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a seeded list cannot be written.
    pub fn load(storage: &Storage) -> Result<Self> {
        let mut state = Self {
            patients: storage.get(KEY_PATIENTS, Vec::new()),
            staff_members: storage.get(KEY_STAFF, Vec::new()),
        };

        if state.patients.is_empty() {
            state.patients = demo_patients();
            storage
                .set(KEY_PATIENTS, &state.patients)
                .context("Failed to seed demo patients")?;
            info!(count = state.patients.len(), "seeded demo patients");
        }
        if state.staff_members.is_empty() {
            state.staff_members = demo_staff();
            storage
                .set(KEY_STAFF, &state.staff_members)
                .context("Failed to seed demo staff")?;
            info!(count = state.staff_members.len(), "seeded demo staff");
        }

        Ok(state)
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn staff_members(&self) -> &[StaffMember] {
        &self.staff_members
    }

    pub fn active_staff_count(&self) -> usize {
        self.staff_members.iter().filter(|s| s.is_active).count()
    }

    /// Patients whose name, health issue or diagnosis contains `query`,
    /// ignoring case. An empty query matches everyone.
    pub fn search_patients(&self, query: &str) -> Vec<&Patient> {
        let needle = query.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.full_name().to_lowercase().contains(&needle)
                    || p.health_issue.to_lowercase().contains(&needle)
                    || p.diagnosis.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Adds a patient stamped with a new id, timestamps and `actor` as
    /// creator and editor. Returns the new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the patient list cannot be written; memory is left
    /// unchanged in that case.
    pub fn add_patient(
        &mut self,
        storage: &Storage,
        new: NewPatient,
        actor: Option<&User>,
    ) -> Result<String> {
        let actor = actor_id(actor);
        let stamp = now();
        let patient = Patient {
            id: generate_id(),
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            contact_number: new.contact_number,
            email: new.email,
            address: new.address,
            emergency_contact: new.emergency_contact,
            blood_type: new.blood_type,
            health_issue: new.health_issue,
            diagnosis: new.diagnosis,
            allergies: new.allergies,
            medications: new.medications,
            notes: new.notes,
            created_at: stamp,
            updated_at: stamp,
            created_by: actor.clone(),
            last_updated_by: actor,
        };
        let id = patient.id.clone();

        let mut patients = self.patients.clone();
        patients.push(patient);
        self.commit_patients(storage, patients)?;
        info!(patient_id = %id, "added patient");
        Ok(id)
    }

    /// Merges `patch` into the patient `id`, refreshing `updated_at` and
    /// `last_updated_by`. Returns `false` if there is no such patient.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge or the write fails.
    pub fn update_patient(
        &mut self,
        storage: &Storage,
        id: &str,
        patch: &PatientPatch,
        actor: Option<&User>,
    ) -> Result<bool> {
        let Some(index) = self.patients.iter().position(|p| p.id == id) else {
            debug!(patient_id = id, "update of unknown patient");
            return Ok(false);
        };

        let mut updated = merge(&self.patients[index], patch).context("Failed to merge patient")?;
        updated.updated_at = now();
        updated.last_updated_by = actor_id(actor);

        let mut patients = self.patients.clone();
        patients[index] = updated;
        self.commit_patients(storage, patients)?;
        info!(patient_id = id, "updated patient");
        Ok(true)
    }

    pub fn get_patient_by_id(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Removes the patient `id`. Returns `false` if nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the patient list cannot be written.
    pub fn delete_patient(&mut self, storage: &Storage, id: &str) -> Result<bool> {
        let remaining: Vec<Patient> = self
            .patients
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        if remaining.len() == self.patients.len() {
            return Ok(false);
        }

        self.commit_patients(storage, remaining)?;
        info!(patient_id = id, "deleted patient");
        Ok(true)
    }

    /// Adds an active staff member. Returns the new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the staff list cannot be written.
    pub fn add_staff_member(&mut self, storage: &Storage, new: NewStaffMember) -> Result<String> {
        let member = StaffMember {
            id: generate_id(),
            name: new.name,
            email: new.email,
            role: new.role,
            department: new.department,
            specialization: new.specialization,
            contact_number: new.contact_number,
            is_active: true,
            created_at: now(),
        };
        let id = member.id.clone();

        let mut staff = self.staff_members.clone();
        staff.push(member);
        self.commit_staff(storage, staff)?;
        info!(staff_id = %id, "added staff member");
        Ok(id)
    }

    /// Merges `patch` into the staff member `id`. Returns `false` if there is
    /// no such member.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge or the write fails.
    pub fn update_staff_member(
        &mut self,
        storage: &Storage,
        id: &str,
        patch: &StaffPatch,
    ) -> Result<bool> {
        let Some(index) = self.staff_members.iter().position(|s| s.id == id) else {
            debug!(staff_id = id, "update of unknown staff member");
            return Ok(false);
        };

        let updated =
            merge(&self.staff_members[index], patch).context("Failed to merge staff member")?;
        let mut staff = self.staff_members.clone();
        staff[index] = updated;
        self.commit_staff(storage, staff)?;
        info!(staff_id = id, "updated staff member");
        Ok(true)
    }

    pub fn get_staff_member_by_id(&self, id: &str) -> Option<&StaffMember> {
        self.staff_members.iter().find(|s| s.id == id)
    }

    /// Removes the staff member `id`. Returns `false` if nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the staff list cannot be written.
    pub fn delete_staff_member(&mut self, storage: &Storage, id: &str) -> Result<bool> {
        let remaining: Vec<StaffMember> = self
            .staff_members
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        if remaining.len() == self.staff_members.len() {
            return Ok(false);
        }

        self.commit_staff(storage, remaining)?;
        info!(staff_id = id, "deleted staff member");
        Ok(true)
    }

    // Storage is written first so a failed write leaves memory untouched.
    fn commit_patients(&mut self, storage: &Storage, patients: Vec<Patient>) -> Result<()> {
        storage
            .set(KEY_PATIENTS, &patients)
            .context("Failed to save patients")?;
        self.patients = patients;
        Ok(())
    }

    fn commit_staff(&mut self, storage: &Storage, staff: Vec<StaffMember>) -> Result<()> {
        storage
            .set(KEY_STAFF, &staff)
            .context("Failed to save staff members")?;
        self.staff_members = staff;
        Ok(())
    }
}

fn actor_id(actor: Option<&User>) -> String {
    actor.map_or_else(|| UNKNOWN_ACTOR.to_string(), |u| u.id.clone())
}

#[allow(clippy::too_many_arguments)]
fn demo_patient(
    first_name: &str,
    last_name: &str,
    date_of_birth: &str,
    gender: Gender,
    contact_number: &str,
    address: &str,
    emergency_contact: &str,
    blood_type: &str,
    health_issue: &str,
    diagnosis: &str,
    allergies: &str,
    medications: &str,
    notes: &str,
) -> Patient {
    let stamp = now();
    let email = format!(
        "{}.{}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase()
    );
    Patient {
        id: generate_id(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        date_of_birth: date_of_birth.into(),
        gender,
        contact_number: contact_number.into(),
        email: Some(email),
        address: address.into(),
        emergency_contact: emergency_contact.into(),
        blood_type: Some(blood_type.into()),
        health_issue: health_issue.into(),
        diagnosis: diagnosis.into(),
        allergies: allergies.into(),
        medications: medications.into(),
        notes: Some(notes.into()),
        created_at: stamp,
        updated_at: stamp,
        created_by: SEED_ACTOR.into(),
        last_updated_by: SEED_ACTOR.into(),
    }
}

fn demo_patients() -> Vec<Patient> {
    vec![
        demo_patient(
            "John",
            "Doe",
            "1985-05-15",
            Gender::Male,
            "555-123-4567",
            "123 Main St, Anytown, USA",
            "Jane Doe - 555-987-6543",
            "O+",
            "Heart Disease",
            "Hypertension, Atrial Fibrillation",
            "Penicillin",
            "Lisinopril 10mg, Warfarin 5mg",
            "Patient requires monthly follow-up",
        ),
        demo_patient(
            "Mary",
            "Smith",
            "1990-08-22",
            Gender::Female,
            "555-222-3333",
            "456 Oak Ave, Somewhere, USA",
            "Robert Smith - 555-444-5555",
            "A-",
            "Cancer",
            "Stage 2 Breast Cancer",
            "Sulfa drugs",
            "Tamoxifen 20mg",
            "Post-surgery follow-up in 2 weeks",
        ),
        demo_patient(
            "David",
            "Johnson",
            "1978-11-30",
            Gender::Male,
            "555-666-7777",
            "789 Pine St, Elsewhere, USA",
            "Sarah Johnson - 555-888-9999",
            "B+",
            "Diabetes",
            "Type 2 Diabetes, Obesity",
            "None",
            "Metformin 1000mg, Glipizide 10mg",
            "Diet and exercise plan reviewed",
        ),
    ]
}

fn demo_staff() -> Vec<StaffMember> {
    let member = |name: &str,
                  email: &str,
                  role: StaffRole,
                  department: &str,
                  specialization: Option<&str>,
                  contact: &str| StaffMember {
        id: generate_id(),
        name: name.into(),
        email: email.into(),
        role,
        department: Some(department.into()),
        specialization: specialization.map(str::to_string),
        contact_number: Some(contact.into()),
        is_active: true,
        created_at: now(),
    };

    vec![
        member(
            "Dr. Sarah Wilson",
            "sarah.wilson@hospital.com",
            StaffRole::Doctor,
            "Cardiology",
            Some("Interventional Cardiology"),
            "555-111-2222",
        ),
        member(
            "Dr. Michael Chen",
            "michael.chen@hospital.com",
            StaffRole::Doctor,
            "Oncology",
            Some("Medical Oncology"),
            "555-333-4444",
        ),
        member(
            "Nurse Jessica Brown",
            "jessica.brown@hospital.com",
            StaffRole::Staff,
            "General Medicine",
            None,
            "555-555-6666",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{faulty_storage, memory_storage};
    use crate::models::fixtures::{new_patient, new_staff};
    use crate::models::UserRole;

    fn doctor() -> User {
        User {
            id: "doc-1".into(),
            email: "doctor@hospital.com".into(),
            name: "Dr. Smith".into(),
            role: UserRole::Doctor,
            created_at: now(),
        }
    }

    fn stored_patients(storage: &Storage) -> Vec<Patient> {
        storage.get(KEY_PATIENTS, Vec::new())
    }

    #[test]
    fn empty_store_seeds_demo_records() {
        let storage = memory_storage();
        let data = DataState::load(&storage).unwrap();
        assert_eq!(data.patients().len(), 3);
        assert_eq!(data.staff_members().len(), 3);
        assert_eq!(data.active_staff_count(), 3);
        assert_eq!(stored_patients(&storage), data.patients());
        assert!(data.patients().iter().all(|p| p.created_by == "admin"));
    }

    #[test]
    fn seeding_is_skipped_when_records_exist() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let id = data.patients()[0].id.clone();
        data.delete_patient(&storage, &id).unwrap();

        let reloaded = DataState::load(&storage).unwrap();
        assert_eq!(reloaded.patients().len(), 2);
        assert_eq!(reloaded.patients(), data.patients());
    }

    #[test]
    fn added_patient_is_stamped() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let actor = doctor();
        let input = NewPatient {
            notes: Some("Carries an inhaler".into()),
            ..new_patient()
        };

        let id = data
            .add_patient(&storage, input.clone(), Some(&actor))
            .unwrap();
        let patient = data.get_patient_by_id(&id).unwrap();

        let expected = Patient {
            id: id.clone(),
            first_name: input.first_name,
            last_name: input.last_name,
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            contact_number: input.contact_number,
            email: input.email,
            address: input.address,
            emergency_contact: input.emergency_contact,
            blood_type: input.blood_type,
            health_issue: input.health_issue,
            diagnosis: input.diagnosis,
            allergies: input.allergies,
            medications: input.medications,
            notes: input.notes,
            created_at: patient.created_at,
            updated_at: patient.created_at,
            created_by: "doc-1".into(),
            last_updated_by: "doc-1".into(),
        };
        assert_eq!(patient, &expected);
        assert_eq!(data.patients().len(), 4);
        assert_eq!(stored_patients(&storage).len(), 4);
    }

    #[test]
    fn anonymous_add_uses_unknown_actor() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let id = data.add_patient(&storage, new_patient(), None).unwrap();
        let patient = data.get_patient_by_id(&id).unwrap();
        assert_eq!(patient.created_by, UNKNOWN_ACTOR);
        assert_eq!(patient.last_updated_by, UNKNOWN_ACTOR);
    }

    #[test]
    fn delete_missing_patient_returns_false() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        assert!(!data.delete_patient(&storage, "no-such-id").unwrap());
        assert_eq!(data.patients().len(), 3);
    }

    #[test]
    fn delete_existing_patient_shrinks_by_one() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let id = data.patients()[1].id.clone();
        assert!(data.delete_patient(&storage, &id).unwrap());
        assert_eq!(data.patients().len(), 2);
        assert!(data.get_patient_by_id(&id).is_none());
        assert_eq!(stored_patients(&storage).len(), 2);
    }

    #[test]
    fn update_notes_touches_only_audit_fields() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let before = data.patients()[0].clone();
        let actor = doctor();

        let patch = PatientPatch {
            notes: Some(Some("x".into())),
            ..Default::default()
        };
        assert!(data
            .update_patient(&storage, &before.id, &patch, Some(&actor))
            .unwrap());

        let after = data.get_patient_by_id(&before.id).unwrap().clone();
        assert_eq!(after.notes.as_deref(), Some("x"));
        assert_eq!(after.last_updated_by, "doc-1");
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(
            Patient {
                notes: before.notes.clone(),
                updated_at: before.updated_at,
                last_updated_by: before.last_updated_by.clone(),
                ..after
            },
            before
        );
        assert_eq!(stored_patients(&storage), data.patients());
    }

    #[test]
    fn update_missing_patient_returns_false() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let before = data.patients().to_vec();
        let patch = PatientPatch {
            diagnosis: Some("Flu".into()),
            ..Default::default()
        };
        assert!(!data.update_patient(&storage, "missing", &patch, None).unwrap());
        assert_eq!(data.patients(), before.as_slice());
    }

    #[test]
    fn failed_patient_writes_leave_memory_unchanged() {
        let (storage, faults) = faulty_storage();
        let mut data = DataState::load(&storage).unwrap();
        let before = data.patients().to_vec();
        let id = before[0].id.clone();

        faults.writes.set(true);
        assert!(data.add_patient(&storage, new_patient(), None).is_err());
        let patch = PatientPatch {
            diagnosis: Some("Flu".into()),
            ..Default::default()
        };
        assert!(data.update_patient(&storage, &id, &patch, None).is_err());
        assert!(data.delete_patient(&storage, &id).is_err());
        assert_eq!(data.patients(), before.as_slice());

        faults.writes.set(false);
        assert_eq!(stored_patients(&storage), before);
    }

    #[test]
    fn failed_staff_writes_leave_memory_unchanged() {
        let (storage, faults) = faulty_storage();
        let mut data = DataState::load(&storage).unwrap();
        let before = data.staff_members().to_vec();
        let id = before[0].id.clone();

        faults.writes.set(true);
        assert!(data.add_staff_member(&storage, new_staff()).is_err());
        let patch = StaffPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(data.update_staff_member(&storage, &id, &patch).is_err());
        assert!(data.delete_staff_member(&storage, &id).is_err());
        assert_eq!(data.staff_members(), before.as_slice());
        assert_eq!(data.active_staff_count(), 3);
    }

    #[test]
    fn search_matches_name_and_diagnosis() {
        let storage = memory_storage();
        let data = DataState::load(&storage).unwrap();
        assert_eq!(data.search_patients("").len(), 3);
        assert_eq!(data.search_patients("mary")[0].last_name, "Smith");
        assert_eq!(data.search_patients("DIABETES")[0].first_name, "David");
        assert!(data.search_patients("zebra").is_empty());
    }

    #[test]
    fn added_staff_member_is_active() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let id = data.add_staff_member(&storage, new_staff()).unwrap();
        let member = data.get_staff_member_by_id(&id).unwrap();
        assert!(member.is_active);
        assert_eq!(member.name, "Dr. Grace Hopper");
        assert_eq!(member.role, StaffRole::Doctor);
        let stored: Vec<StaffMember> = storage.get(KEY_STAFF, Vec::new());
        assert_eq!(stored.len(), 4);
    }

    #[test]
    fn staff_update_merges_fields() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        let before = data.staff_members()[2].clone();

        let patch = StaffPatch {
            is_active: Some(false),
            department: Some(None),
            ..Default::default()
        };
        assert!(data.update_staff_member(&storage, &before.id, &patch).unwrap());
        let after = data.get_staff_member_by_id(&before.id).unwrap();
        assert!(!after.is_active);
        assert!(after.department.is_none());
        assert_eq!(after.name, before.name);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(data.active_staff_count(), 2);

        assert!(!data.update_staff_member(&storage, "missing", &patch).unwrap());
    }

    #[test]
    fn staff_delete_mirrors_patient_delete() {
        let storage = memory_storage();
        let mut data = DataState::load(&storage).unwrap();
        assert!(!data.delete_staff_member(&storage, "missing").unwrap());
        let id = data.staff_members()[0].id.clone();
        assert!(data.delete_staff_member(&storage, &id).unwrap());
        assert_eq!(data.staff_members().len(), 2);
        let stored: Vec<StaffMember> = storage.get(KEY_STAFF, Vec::new());
        assert_eq!(stored.len(), 2);
    }
}
