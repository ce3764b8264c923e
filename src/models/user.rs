use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Gender, Role};

/// Account record as exposed to clients. The password hash lives only in the
/// `users` table and is never part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub medical_history: Vec<MedicalHistoryEntry>,
    pub medications: Vec<MedicationEntry>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryEntry {
    pub condition: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationEntry {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
}

/// Validated registration data, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub medical_history: Option<Vec<MedicalHistoryEntry>>,
    pub medications: Option<Vec<MedicationEntry>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
            && self.profile_picture.is_none()
            && self.medical_history.is_none()
            && self.medications.is_none()
    }

    /// Merge provided fields into `user`.
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(gender) = self.gender {
            user.gender = Some(gender);
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(picture) = self.profile_picture {
            user.profile_picture = Some(picture);
        }
        if let Some(history) = self.medical_history {
            user.medical_history = history;
        }
        if let Some(medications) = self.medications {
            user.medications = medications;
        }
    }
}
