use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate a closed string enum with as_str + FromStr + serde as the
/// display string (so "Body Ache" and "X-Ray" round-trip unchanged).
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [&'static str] = &[$($s),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
});

str_enum!(SymptomName {
    Fever => "Fever",
    Cough => "Cough",
    Sprain => "Sprain",
    Headache => "Headache",
    Nausea => "Nausea",
    Vomiting => "Vomiting",
    Rash => "Rash",
    Chills => "Chills",
    Fatigue => "Fatigue",
    BodyAche => "Body Ache",
});

str_enum!(Severity {
    Mild => "Mild",
    Moderate => "Moderate",
    Severe => "Severe",
});

str_enum!(SymptomStatus {
    Active => "Active",
    Resolved => "Resolved",
    Monitoring => "Monitoring",
});

str_enum!(ReportType {
    BloodTest => "Blood Test",
    XRay => "X-Ray",
    CtScan => "CT Scan",
    Mri => "MRI",
    Ultrasound => "Ultrasound",
    Other => "Other",
});

str_enum!(ScanStatus {
    Pending => "Pending",
    Processing => "Processing",
    Completed => "Completed",
    Error => "Error",
});

str_enum!(Sender {
    User => "user",
    Bot => "bot",
});

str_enum!(Sentiment {
    Positive => "Positive",
    Negative => "Negative",
    Neutral => "Neutral",
});

impl Role {
    /// Clinical and admin roles may read any patient's records.
    pub fn can_read_others(&self) -> bool {
        matches!(self, Role::Doctor | Role::Admin)
    }
}

impl SymptomName {
    /// Case-insensitive, whitespace-tolerant lookup for free-text symptom names.
    pub fn from_loose(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|name| name.eq_ignore_ascii_case(wanted))
            .and_then(|name| name.parse().ok())
    }
}

impl ScanStatus {
    /// Pending → Processing → {Completed | Error}. Nothing moves backward and
    /// both end states are terminal.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Processing)
                | (ScanStatus::Processing, ScanStatus::Completed)
                | (ScanStatus::Processing, ScanStatus::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Error)
    }
}
