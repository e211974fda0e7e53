//! Household member model.
//!
//! # Responsibility
//! - Define one resident row of a flat roster.
//! - Derive age projections from date of birth.
//!
//! # Invariants
//! - `full_name`, `gender` and `relation` are required for persistence.
//!   They are optional here so a partially filled form can still be
//!   represented and rejected with a precise validation error.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Member gender as captured by the roster form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Relation of a member to the flat's primary contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// The member is the primary contact.
    #[serde(rename = "Self")]
    SelfContact,
    Spouse,
    Father,
    Mother,
    Son,
    Daughter,
    Brother,
    Sister,
    #[serde(rename = "Daughter In Law")]
    DaughterInLaw,
    #[serde(rename = "Son In Law")]
    SonInLaw,
    Other,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfContact => "Self",
            Self::Spouse => "Spouse",
            Self::Father => "Father",
            Self::Mother => "Mother",
            Self::Son => "Son",
            Self::Daughter => "Daughter",
            Self::Brother => "Brother",
            Self::Sister => "Sister",
            Self::DaughterInLaw => "Daughter In Law",
            Self::SonInLaw => "Son In Law",
            Self::Other => "Other",
        }
    }
}

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

/// One resident listed on a flat roster.
///
/// Field names on the wire follow the roster form (`fullName`, `dob`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMember {
    pub full_name: String,
    pub gender: Option<Gender>,
    pub relation: Option<Relation>,
    #[serde(default)]
    pub is_primary_contact: bool,
    #[serde(default)]
    pub contact: Option<String>,
    /// Used for ownership checks; compared case-insensitively.
    #[serde(default)]
    pub email: Option<String>,
    /// ISO `YYYY-MM-DD`; an empty date input arrives as `""`.
    #[serde(rename = "dob", default, deserialize_with = "blank_date_as_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    /// City of residence for members living away from the society.
    #[serde(default)]
    pub city: Option<String>,
}

impl HouseholdMember {
    /// Creates a member with the three required fields set.
    pub fn new(full_name: impl Into<String>, gender: Gender, relation: Relation) -> Self {
        Self {
            full_name: full_name.into(),
            gender: Some(gender),
            relation: Some(relation),
            is_primary_contact: relation == Relation::SelfContact,
            contact: None,
            email: None,
            date_of_birth: None,
            blood_group: None,
            education: None,
            occupation: None,
            city: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    /// Whole years completed on `today`.
    ///
    /// Returns `None` without a date of birth or when it lies after `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth
            .and_then(|date_of_birth| today.years_since(date_of_birth))
    }

    /// Trimmed email, `None` when absent or blank.
    pub fn normalized_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::{BloodGroup, Gender, HouseholdMember, Relation};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn age_counts_completed_years_only() {
        let member = HouseholdMember::new("Asha Rao", Gender::Female, Relation::SelfContact)
            .with_date_of_birth(date(1990, 6, 15));

        assert_eq!(member.age_on(date(2024, 6, 14)), Some(33));
        assert_eq!(member.age_on(date(2024, 6, 15)), Some(34));
    }

    #[test]
    fn age_is_none_without_or_with_future_birth_date() {
        let member = HouseholdMember::new("Ravi Rao", Gender::Male, Relation::Spouse);
        assert_eq!(member.age_on(date(2024, 1, 1)), None);

        let unborn = member.with_date_of_birth(date(2030, 1, 1));
        assert_eq!(unborn.age_on(date(2024, 1, 1)), None);
    }

    #[test]
    fn blank_email_normalizes_to_none() {
        let member =
            HouseholdMember::new("Ravi Rao", Gender::Male, Relation::Spouse).with_email("   ");
        assert_eq!(member.normalized_email(), None);

        let member = member.with_email(" ravi@example.com ");
        assert_eq!(member.normalized_email(), Some("ravi@example.com"));
    }

    #[test]
    fn enums_use_form_labels_on_the_wire() {
        let mut member = HouseholdMember::new("Meera", Gender::Female, Relation::DaughterInLaw);
        member.blood_group = Some(BloodGroup::AbNegative);

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["gender"], "Female");
        assert_eq!(json["relation"], "Daughter In Law");
        assert_eq!(json["bloodGroup"], "AB-");
        assert_eq!(json["fullName"], "Meera");
        assert_eq!(json["isPrimaryContact"], false);

        let self_relation: Relation = serde_json::from_str("\"Self\"").unwrap();
        assert_eq!(self_relation, Relation::SelfContact);
        assert_eq!(Relation::SelfContact.as_str(), "Self");
    }

    #[test]
    fn form_member_payload_maps_dob_and_blank_dates() {
        let member: HouseholdMember = serde_json::from_value(serde_json::json!({
            "fullName": "Asha Rao",
            "gender": "Female",
            "relation": "Self",
            "dob": "1990-06-15",
            "bloodGroup": "O+"
        }))
        .unwrap();
        assert_eq!(member.date_of_birth, Some(date(1990, 6, 15)));
        assert_eq!(member.blood_group, Some(BloodGroup::OPositive));

        let undated: HouseholdMember = serde_json::from_value(serde_json::json!({
            "fullName": "Ravi Rao",
            "gender": "Male",
            "relation": "Spouse",
            "dob": ""
        }))
        .unwrap();
        assert_eq!(undated.date_of_birth, None);

        let misformatted = serde_json::from_value::<HouseholdMember>(serde_json::json!({
            "fullName": "Ravi Rao",
            "dob": "15/06/1990"
        }));
        assert!(misformatted.is_err());
    }
}
