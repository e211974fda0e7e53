//! CSV rendering of directory records.
//!
//! # Invariants
//! - One row per record, in the order given.
//! - Quoting and escaping are delegated to the `csv` writer; field text is
//!   never stripped of commas or quotes.

use crate::model::member::HouseholdMember;
use crate::model::record::{DirectoryRecord, Vehicle};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const CSV_HEADER: [&str; 5] = ["Flat Number", "Status", "Native Place", "Residents", "Vehicles"];

const MEMBER_SEPARATOR: &str = "; ";

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Encoding(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "csv export failed: {err}"),
            Self::Encoding(message) => write!(f, "csv export produced invalid text: {message}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Encoding(_) => None,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Renders records as CSV, computing member ages on `today`.
pub fn export_csv(records: &[DirectoryRecord], today: NaiveDate) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let residents = record
            .members
            .iter()
            .map(|member| describe_member(member, today))
            .collect::<Vec<_>>()
            .join(MEMBER_SEPARATOR);
        let vehicles = record
            .vehicles
            .iter()
            .map(describe_vehicle)
            .collect::<Vec<_>>()
            .join(MEMBER_SEPARATOR);

        writer.write_record([
            record.flat_id.as_key().as_str(),
            record.resident_class.as_str(),
            record.native_place.as_deref().unwrap_or(""),
            residents.as_str(),
            vehicles.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Encoding(err.error().to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Encoding(err.to_string()))
}

/// One-line summary such as `Asha Rao (Self), Female, Age: 34, Email: a@x.com`.
pub fn describe_member(member: &HouseholdMember, today: NaiveDate) -> String {
    let relation = member.relation.map_or("N/A", |relation| relation.as_str());
    let mut parts = vec![format!("{} ({relation})", member.full_name.trim())];

    if let Some(gender) = member.gender {
        parts.push(gender.as_str().to_string());
    }
    if let Some(age) = member.age_on(today) {
        parts.push(format!("Age: {age}"));
    }
    if let Some(blood_group) = member.blood_group {
        parts.push(format!("Blood Group: {}", blood_group.as_str()));
    }
    if member.is_primary_contact {
        parts.push("Primary Contact".to_string());
    }

    let optional_fields = [
        ("Email", member.normalized_email()),
        ("Contact", non_blank(member.contact.as_deref())),
        ("Education", non_blank(member.education.as_deref())),
        ("Occupation", non_blank(member.occupation.as_deref())),
        ("City", non_blank(member.city.as_deref())),
    ];
    for (label, value) in optional_fields {
        if let Some(value) = value {
            parts.push(format!("{label}: {value}"));
        }
    }

    parts.join(", ")
}

fn describe_vehicle(vehicle: &Vehicle) -> String {
    format!("{} {}", vehicle.class.as_str(), vehicle.registration.trim())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{describe_member, export_csv};
    use crate::model::flat::FlatId;
    use crate::model::member::{BloodGroup, Gender, HouseholdMember, Relation};
    use crate::model::record::{
        DirectoryRecord, RecordDraft, ResidentClass, Vehicle, VehicleClass,
    };
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn describe_member_lists_present_fields_only() {
        let mut member = HouseholdMember::new("Asha Rao", Gender::Female, Relation::SelfContact)
            .with_email("asha@example.com")
            .with_date_of_birth(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap());
        member.blood_group = Some(BloodGroup::OPositive);
        member.contact = Some("  ".to_string());

        assert_eq!(
            describe_member(&member, today()),
            "Asha Rao (Self), Female, Age: 34, Blood Group: O+, Primary Contact, Email: asha@example.com"
        );
    }

    #[test]
    fn export_quotes_fields_with_separators() {
        let mut member = HouseholdMember::new("Rao, Asha", Gender::Female, Relation::SelfContact);
        member.occupation = Some("Engineer \"senior\"".to_string());
        let mut draft = RecordDraft::new(FlatId::parse("302").unwrap(), ResidentClass::Owner)
            .with_member(member)
            .with_vehicle(Vehicle::new(VehicleClass::FourWheeler, "MH12AB1234"));
        draft.native_place = Some("Pune".to_string());
        let record = DirectoryRecord::from_draft(draft, "asha@example.com", 0).unwrap();

        let csv = export_csv(&[record], today()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Flat Number,Status,Native Place,Residents,Vehicles")
        );
        assert_eq!(
            lines.next(),
            Some(
                "302,Owner,Pune,\"Rao, Asha (Self), Female, Primary Contact, Occupation: Engineer \"\"senior\"\"\",Four Wheeler MH12AB1234"
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn export_of_empty_directory_is_header_only() {
        let csv = export_csv(&[], today()).unwrap();
        assert_eq!(csv, "Flat Number,Status,Native Place,Residents,Vehicles\n");
    }
}
