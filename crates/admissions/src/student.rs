//! Student record types.
//!
//! A [`StudentRecord`] is the only persisted entity. New admissions are
//! described by a [`NewStudent`] and edits by a [`StudentPatch`]; the
//! lifecycle service turns those into stored records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};

/// A label that does not name any known gender, class or age group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseLabelError {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Opaque record identifier assigned by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Wrap a backend-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StudentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StudentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Gender as recorded on the admission form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Gender {
    /// Boy.
    #[default]
    Male,
    /// Girl.
    Female,
}

impl Gender {
    /// Label used in storage and exports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" => Ok(Self::Male),
            "female" | "f" | "girl" => Ok(Self::Female),
            _ => Err(ParseLabelError::new("gender", s)),
        }
    }
}

/// Class the child is admitted into.
///
/// Variant order is the column order of the admission report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ClassLevel {
    /// Pre-primary (nursery) class.
    #[serde(rename = "Pre-Primary")]
    PrePrimary,
    /// Class 1.
    #[default]
    #[serde(rename = "1")]
    One,
    /// Class 2.
    #[serde(rename = "2")]
    Two,
    /// Class 3.
    #[serde(rename = "3")]
    Three,
    /// Class 4.
    #[serde(rename = "4")]
    Four,
    /// Class 5.
    #[serde(rename = "5")]
    Five,
}

impl ClassLevel {
    /// Every class, in report column order.
    pub const ALL: [Self; 6] = [
        Self::PrePrimary,
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
    ];

    /// Label used in storage (`"Pre-Primary"`, `"1"` .. `"5"`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PrePrimary => "Pre-Primary",
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
        }
    }

    /// Column heading used in reports and charts.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::PrePrimary => "Pre-Primary",
            Self::One => "Class 1",
            Self::Two => "Class 2",
            Self::Three => "Class 3",
            Self::Four => "Class 4",
            Self::Five => "Class 5",
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClassLevel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed
            .strip_prefix("Class ")
            .or_else(|| trimmed.strip_prefix("class "))
            .unwrap_or(trimmed);

        if normalized.eq_ignore_ascii_case("pre-primary")
            || normalized.eq_ignore_ascii_case("preprimary")
        {
            return Ok(Self::PrePrimary);
        }

        match normalized {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            "4" => Ok(Self::Four),
            "5" => Ok(Self::Five),
            _ => Err(ParseLabelError::new("class", s)),
        }
    }
}

/// Age band of a child, written `"4+"` through `"15+"`.
///
/// Ordering follows age, which is also the row order of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgeGroup(u8);

impl AgeGroup {
    /// Youngest age band.
    pub const MIN_YEARS: u8 = 4;
    /// Oldest age band.
    pub const MAX_YEARS: u8 = 15;

    /// Build an age group from completed years, if it is in range.
    #[must_use]
    pub fn new(years: u8) -> Option<Self> {
        (Self::MIN_YEARS..=Self::MAX_YEARS)
            .contains(&years)
            .then_some(Self(years))
    }

    /// Completed years this band starts at.
    #[must_use]
    pub fn years(self) -> u8 {
        self.0
    }

    /// Every age group, youngest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN_YEARS..=Self::MAX_YEARS).map(Self)
    }
}

impl Default for AgeGroup {
    fn default() -> Self {
        Self(6)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+", self.0)
    }
}

impl FromStr for AgeGroup {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('+').unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseLabelError::new("age group", s))
    }
}

impl TryFrom<String> for AgeGroup {
    type Error = ParseLabelError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgeGroup> for String {
    fn from(group: AgeGroup) -> Self {
        group.to_string()
    }
}

/// Form data for a new admission.
///
/// Everything except the id, serial number and timestamps, which are
/// assigned when the record is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// Child's full name. Required.
    pub child_name: String,
    /// Father's name.
    pub father_name: String,
    /// Mother's name.
    pub mother_name: String,
    /// Age band.
    pub age_group: AgeGroup,
    /// Gender.
    pub gender: Gender,
    /// Class admitted into.
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
    /// School attended before, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    /// Lives inside the school's catchment area.
    pub comes_from_school_coverage_area: bool,
    /// Transferred in from another school.
    pub comes_from_other_schools: bool,
    /// Guardian's phone number, free text.
    pub guardian_phone: String,
    /// Free-form remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewStudent {
    /// Start a form with the given child name and the form defaults.
    #[must_use]
    pub fn named(child_name: impl Into<String>) -> Self {
        Self {
            child_name: child_name.into(),
            ..Self::default()
        }
    }

    /// Check the fields that must be filled in before saving.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the child name is blank.
    pub fn validate(&self) -> Result<()> {
        validate_child_name(&self.child_name)
    }
}

fn validate_child_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("child_name", "must not be empty"));
    }
    Ok(())
}

/// A stored admission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Backend-assigned identifier.
    pub id: StudentId,
    /// Admission serial number, unique and increasing.
    pub serial_no: u32,
    /// Child's full name.
    pub child_name: String,
    /// Father's name.
    pub father_name: String,
    /// Mother's name.
    pub mother_name: String,
    /// Age band.
    pub age_group: AgeGroup,
    /// Gender.
    pub gender: Gender,
    /// Class admitted into.
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
    /// School attended before, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    /// Lives inside the school's catchment area.
    pub comes_from_school_coverage_area: bool,
    /// Transferred in from another school.
    pub comes_from_other_schools: bool,
    /// Guardian's phone number.
    pub guardian_phone: String,
    /// Free-form remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl StudentRecord {
    /// Assemble a record from form data and the values assigned at creation.
    #[must_use]
    pub fn from_new(id: StudentId, serial_no: u32, timestamp: i64, student: NewStudent) -> Self {
        Self {
            id,
            serial_no,
            child_name: student.child_name,
            father_name: student.father_name,
            mother_name: student.mother_name,
            age_group: student.age_group,
            gender: student.gender,
            class_level: student.class_level,
            previous_school: student.previous_school,
            comes_from_school_coverage_area: student.comes_from_school_coverage_area,
            comes_from_other_schools: student.comes_from_other_schools,
            guardian_phone: student.guardian_phone,
            notes: student.notes,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Merge a patch into this record and stamp `updated_at`.
    ///
    /// `id`, `serial_no` and `created_at` are never touched. The stamp is
    /// clamped so that `updated_at` never falls below `created_at`.
    pub fn apply(&mut self, patch: &StudentPatch, updated_at: i64) {
        if let Some(v) = &patch.child_name {
            self.child_name.clone_from(v);
        }
        if let Some(v) = &patch.father_name {
            self.father_name.clone_from(v);
        }
        if let Some(v) = &patch.mother_name {
            self.mother_name.clone_from(v);
        }
        if let Some(v) = patch.age_group {
            self.age_group = v;
        }
        if let Some(v) = patch.gender {
            self.gender = v;
        }
        if let Some(v) = patch.class_level {
            self.class_level = v;
        }
        if let Some(v) = &patch.previous_school {
            self.previous_school.clone_from(v);
        }
        if let Some(v) = patch.comes_from_school_coverage_area {
            self.comes_from_school_coverage_area = v;
        }
        if let Some(v) = patch.comes_from_other_schools {
            self.comes_from_other_schools = v;
        }
        if let Some(v) = &patch.guardian_phone {
            self.guardian_phone.clone_from(v);
        }
        if let Some(v) = &patch.notes {
            self.notes.clone_from(v);
        }
        self.updated_at = updated_at.max(self.created_at);
    }

    /// Case-insensitive match used by the register's search box.
    ///
    /// Matches on child name, father name or the serial number's digits.
    /// An empty term matches every record.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.child_name.to_lowercase().contains(&term)
            || self.father_name.to_lowercase().contains(&term)
            || self.serial_no.to_string().contains(&term)
    }
}

/// A partial update: `None` leaves a field as it is.
///
/// The optional text fields take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    /// New child name.
    pub child_name: Option<String>,
    /// New father name.
    pub father_name: Option<String>,
    /// New mother name.
    pub mother_name: Option<String>,
    /// New age group.
    pub age_group: Option<AgeGroup>,
    /// New gender.
    pub gender: Option<Gender>,
    /// New class.
    pub class_level: Option<ClassLevel>,
    /// New previous school, or `Some(None)` to clear.
    pub previous_school: Option<Option<String>>,
    /// New coverage-area flag.
    pub comes_from_school_coverage_area: Option<bool>,
    /// New other-schools flag.
    pub comes_from_other_schools: Option<bool>,
    /// New guardian phone.
    pub guardian_phone: Option<String>,
    /// New notes, or `Some(None)` to clear.
    pub notes: Option<Option<String>>,
}

impl StudentPatch {
    /// True when the patch would change nothing but `updated_at`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject patches that would blank out a required field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patch sets an empty child name.
    pub fn validate(&self) -> Result<()> {
        match &self.child_name {
            Some(name) => validate_child_name(name),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> StudentRecord {
        let mut form = NewStudent::named("Rahim Uddin");
        form.father_name = "Karim Uddin".to_string();
        form.mother_name = "Amina Begum".to_string();
        form.notes = Some("walks to school".to_string());
        StudentRecord::from_new(StudentId::new("s1"), 12, 1_000, form)
    }

    #[test]
    fn test_gender_parse_and_display() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("girl".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(Gender::Female.to_string(), "Female");
    }

    #[test]
    fn test_class_level_parse() {
        assert_eq!(
            "Pre-Primary".parse::<ClassLevel>().unwrap(),
            ClassLevel::PrePrimary
        );
        assert_eq!(
            "preprimary".parse::<ClassLevel>().unwrap(),
            ClassLevel::PrePrimary
        );
        assert_eq!("3".parse::<ClassLevel>().unwrap(), ClassLevel::Three);
        assert_eq!("Class 5".parse::<ClassLevel>().unwrap(), ClassLevel::Five);
        let err = "6".parse::<ClassLevel>().unwrap_err();
        assert_eq!(err.to_string(), "unknown class: \"6\"");
    }

    #[test]
    fn test_class_level_order_matches_report_columns() {
        let mut sorted = ClassLevel::ALL;
        sorted.sort();
        assert_eq!(sorted, ClassLevel::ALL);
        assert_eq!(ClassLevel::PrePrimary.heading(), "Pre-Primary");
        assert_eq!(ClassLevel::Two.heading(), "Class 2");
    }

    #[test]
    fn test_age_group_bounds() {
        assert!(AgeGroup::new(3).is_none());
        assert!(AgeGroup::new(16).is_none());
        assert_eq!(AgeGroup::new(4).unwrap().to_string(), "4+");
        assert_eq!(AgeGroup::all().count(), 12);
        assert_eq!(AgeGroup::all().last().unwrap().to_string(), "15+");
    }

    #[test]
    fn test_age_group_parse() {
        assert_eq!("6+".parse::<AgeGroup>().unwrap().years(), 6);
        assert_eq!(" 10 ".parse::<AgeGroup>().unwrap().years(), 10);
        assert!("16+".parse::<AgeGroup>().is_err());
        assert!("six".parse::<AgeGroup>().is_err());
    }

    #[test]
    fn test_age_groups_sort_by_age_not_text() {
        let mut groups: Vec<AgeGroup> = ["10+", "9+", "4+", "15+"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        groups.sort();
        let labels: Vec<String> = groups.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["4+", "9+", "10+", "15+"]);
    }

    #[test]
    fn test_new_student_defaults() {
        let form = NewStudent::default();
        assert_eq!(form.age_group.to_string(), "6+");
        assert_eq!(form.gender, Gender::Male);
        assert_eq!(form.class_level, ClassLevel::One);
        assert!(!form.comes_from_school_coverage_area);
        assert!(!form.comes_from_other_schools);
    }

    #[test]
    fn test_new_student_validation() {
        assert!(NewStudent::named("Nadia").validate().is_ok());
        let err = NewStudent::named("   ").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_record_serializes_with_original_field_names() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["serialNo"], 12);
        assert_eq!(json["childName"], "Rahim Uddin");
        assert_eq!(json["class"], "1");
        assert_eq!(json["ageGroup"], "6+");
        assert_eq!(json["gender"], "Male");
        assert_eq!(json["comesFromSchoolCoverageArea"], false);
        assert!(json.get("previousSchool").is_none());

        let back: StudentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_rejects_unknown_age_group() {
        let mut json = serde_json::to_value(sample_record()).unwrap();
        json["ageGroup"] = serde_json::Value::from("3+");
        assert!(serde_json::from_value::<StudentRecord>(json).is_err());
    }

    #[test]
    fn test_apply_patch_changes_only_given_fields() {
        let mut record = sample_record();
        let before = record.clone();
        let patch = StudentPatch {
            class_level: Some(ClassLevel::Two),
            notes: Some(None),
            ..StudentPatch::default()
        };

        record.apply(&patch, 5_000);

        assert_eq!(record.class_level, ClassLevel::Two);
        assert_eq!(record.notes, None);
        assert_eq!(record.updated_at, 5_000);
        assert_eq!(record.id, before.id);
        assert_eq!(record.serial_no, before.serial_no);
        assert_eq!(record.created_at, before.created_at);
        assert_eq!(record.child_name, before.child_name);
        assert_eq!(record.father_name, before.father_name);
    }

    #[test]
    fn test_apply_patch_never_moves_updated_at_before_created_at() {
        let mut record = sample_record();
        record.apply(&StudentPatch::default(), 10);
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn test_patch_validation() {
        assert!(StudentPatch::default().validate().is_ok());
        assert!(StudentPatch::default().is_empty());
        let patch = StudentPatch {
            child_name: Some(String::new()),
            ..StudentPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_matches_search() {
        let record = sample_record();
        assert!(record.matches_search(""));
        assert!(record.matches_search("rahim"));
        assert!(record.matches_search("KARIM"));
        assert!(record.matches_search("12"));
        assert!(!record.matches_search("amina"));
        assert!(!record.matches_search("99"));
    }
}
