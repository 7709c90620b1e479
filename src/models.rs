//! Data models for CareDesk.
//!
//! Records are serialized with camelCase keys, which is the layout of the
//! JSON documents kept in storage.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Audit identity recorded when no user is logged in.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Generates a new opaque record identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp used for every created/updated stamp.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Role of a login account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Doctor,
    Staff,
}

impl UserRole {
    /// All roles, in the order the registration form cycles through them.
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Doctor, UserRole::Staff];

    /// Whether the role may create, edit and delete any patient record.
    pub fn can_manage_patients(self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Whether the role may edit existing patient records.
    pub fn can_edit_patients(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Doctor)
    }

    /// Whether the role may manage staff members and login accounts.
    pub fn can_manage_staff(self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Title shown on the role's dashboard.
    pub fn dashboard_title(self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Doctor | UserRole::Staff => "Doctor & Staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserRole::Admin => "Admin",
            UserRole::Doctor => "Doctor",
            UserRole::Staff => "Staff",
        };
        f.write_str(name)
    }
}

/// A login account as seen by the rest of the application.
///
/// Never carries password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A login account as persisted in the user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    /// bcrypt hash of the account password.
    pub password: String,
}

impl StoredUser {
    /// Drops the password material.
    pub fn into_user(self) -> User {
        self.user
    }
}

/// Login form input.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Self-registration form input.
#[derive(Debug, Clone)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Account created by an administrator for a doctor or staff member.
#[derive(Debug, Clone)]
pub struct StaffAccountData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Cycles to the next option, used by the form selectors.
    pub fn next(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Other,
            Gender::Other => Gender::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Represents a patient record in the hospital management system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// The patient's unique ID.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Date of birth as `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: Gender,
    pub contact_number: String,
    pub email: Option<String>,
    pub address: String,
    pub emergency_contact: String,
    pub blood_type: Option<String>,
    pub health_issue: String,
    pub diagnosis: String,
    pub allergies: String,
    pub medications: String,
    /// Free-text clinical notes.
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Id of the user that created the record.
    pub created_by: String,
    /// Id of the user that last edited the record.
    pub last_updated_by: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for a new patient: every field except id, timestamps and audit identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub contact_number: String,
    pub email: Option<String>,
    pub address: String,
    pub emergency_contact: String,
    pub blood_type: Option<String>,
    pub health_issue: String,
    pub diagnosis: String,
    pub allergies: String,
    pub medications: String,
    pub notes: Option<String>,
}

/// Partial update of a patient record.
///
/// Absent fields are left untouched. For optional record fields the inner
/// `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl From<NewPatient> for PatientPatch {
    /// A patch that overwrites every editable field, as the edit form submits.
    fn from(p: NewPatient) -> Self {
        Self {
            first_name: Some(p.first_name),
            last_name: Some(p.last_name),
            date_of_birth: Some(p.date_of_birth),
            gender: Some(p.gender),
            contact_number: Some(p.contact_number),
            email: Some(p.email),
            address: Some(p.address),
            emergency_contact: Some(p.emergency_contact),
            blood_type: Some(p.blood_type),
            health_issue: Some(p.health_issue),
            diagnosis: Some(p.diagnosis),
            allergies: Some(p.allergies),
            medications: Some(p.medications),
            notes: Some(p.notes),
        }
    }
}

/// Role of a staff member. Administrators are not staff members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Doctor,
    Staff,
}

impl StaffRole {
    pub fn toggle(self) -> Self {
        match self {
            StaffRole::Doctor => StaffRole::Staff,
            StaffRole::Staff => StaffRole::Doctor,
        }
    }
}

impl From<StaffRole> for UserRole {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Doctor => UserRole::Doctor,
            StaffRole::Staff => UserRole::Staff,
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&UserRole::from(*self), f)
    }
}

/// Represents a staff member in the hospital directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub contact_number: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Input for a new staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffMember {
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub contact_number: Option<String>,
}

/// Partial update of a staff member.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<NewStaffMember> for StaffPatch {
    fn from(s: NewStaffMember) -> Self {
        Self {
            name: Some(s.name),
            email: Some(s.email),
            role: Some(s.role),
            department: Some(s.department),
            specialization: Some(s.specialization),
            contact_number: Some(s.contact_number),
            is_active: None,
        }
    }
}

/// Overlays the fields present in `patch` onto `record`.
///
/// Both values are taken through their JSON form: every key of the patch
/// object replaces the same key of the record object, and the result is read
/// back as a record.
///
/// # Errors
///
/// Returns an error if either value is not a JSON object or the merged object
/// no longer describes a valid record.
pub fn merge<T, P>(record: &T, patch: &P) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    P: Serialize,
{
    let mut base = serde_json::to_value(record)?;
    let overlay = serde_json::to_value(patch)?;

    let (Some(base_fields), serde_json::Value::Object(overlay_fields)) =
        (base.as_object_mut(), overlay)
    else {
        return Err(anyhow!("merge needs two JSON objects"));
    };
    for (key, value) in overlay_fields {
        base_fields.insert(key, value);
    }

    Ok(serde_json::from_value(base)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_patient() -> NewPatient {
        NewPatient {
            first_name: "Ada".into(),
            last_name: "Byron".into(),
            date_of_birth: "1988-12-10".into(),
            gender: Gender::Female,
            contact_number: "555-010-0101".into(),
            email: Some("ada@example.com".into()),
            address: "12 Analytical Row".into(),
            emergency_contact: "Charles - 555-010-0202".into(),
            blood_type: Some("AB+".into()),
            health_issue: "Asthma".into(),
            diagnosis: "Mild persistent asthma".into(),
            allergies: "None".into(),
            medications: "Albuterol".into(),
            notes: None,
        }
    }

    pub fn new_staff() -> NewStaffMember {
        NewStaffMember {
            name: "Dr. Grace Hopper".into(),
            email: "grace.hopper@hospital.com".into(),
            role: StaffRole::Doctor,
            department: Some("Radiology".into()),
            specialization: None,
            contact_number: Some("555-777-0000".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn patient() -> Patient {
        let p = fixtures::new_patient();
        Patient {
            id: "p-1".into(),
            first_name: p.first_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            gender: p.gender,
            contact_number: p.contact_number,
            email: p.email,
            address: p.address,
            emergency_contact: p.emergency_contact,
            blood_type: p.blood_type,
            health_issue: p.health_issue,
            diagnosis: p.diagnosis,
            allergies: p.allergies,
            medications: p.medications,
            notes: p.notes,
            created_at: datetime!(2024-03-01 09:30 UTC),
            updated_at: datetime!(2024-03-01 09:30 UTC),
            created_by: "admin".into(),
            last_updated_by: "admin".into(),
        }
    }

    #[test]
    fn patient_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(patient()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["gender"], "female");
        assert_eq!(json["lastUpdatedBy"], "admin");
        assert_eq!(json["createdAt"], "2024-03-01T09:30:00Z");
        assert!(json["notes"].is_null());
    }

    #[test]
    fn stored_user_flattens_identity_next_to_password() {
        let stored = StoredUser {
            user: User {
                id: "u-1".into(),
                email: "a@b.c".into(),
                name: "A".into(),
                role: UserRole::Doctor,
                created_at: datetime!(2024-01-01 0:00 UTC),
            },
            password: "hash".into(),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["email"], "a@b.c");
        assert_eq!(json["role"], "doctor");
        assert_eq!(json["password"], "hash");

        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user, stored.into_user());
    }

    #[test]
    fn merge_replaces_only_present_fields() {
        let before = patient();
        let patch = PatientPatch {
            notes: Some(Some("x".into())),
            ..Default::default()
        };
        let after = merge(&before, &patch).unwrap();
        assert_eq!(after.notes.as_deref(), Some("x"));
        assert_eq!(
            Patient {
                notes: None,
                ..after
            },
            before
        );
    }

    #[test]
    fn merge_can_clear_optional_fields() {
        let patch = PatientPatch {
            email: Some(None),
            blood_type: Some(None),
            ..Default::default()
        };
        let after = merge(&patient(), &patch).unwrap();
        assert!(after.email.is_none());
        assert!(after.blood_type.is_none());
    }

    #[test]
    fn empty_patch_is_identity() {
        let before = patient();
        assert_eq!(merge(&before, &PatientPatch::default()).unwrap(), before);
    }

    #[test]
    fn merge_rejects_non_objects() {
        assert!(merge(&patient(), &"notes").is_err());
    }

    #[test]
    fn role_permissions() {
        assert!(UserRole::Admin.can_manage_patients());
        assert!(UserRole::Admin.can_manage_staff());
        assert!(UserRole::Doctor.can_edit_patients());
        assert!(!UserRole::Doctor.can_manage_patients());
        assert!(!UserRole::Doctor.can_manage_staff());
        assert!(!UserRole::Staff.can_edit_patients());
    }

    #[test]
    fn staff_roles_map_to_non_admin_user_roles() {
        assert_eq!(UserRole::from(StaffRole::Doctor), UserRole::Doctor);
        assert_eq!(UserRole::from(StaffRole::Staff), UserRole::Staff);
        assert_eq!(StaffRole::Doctor.to_string(), "Doctor");
    }
}
