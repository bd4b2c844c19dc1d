//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::report::ReportFormat;
use crate::student::{AgeGroup, ClassLevel, Gender, NewStudent, StudentPatch};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Child's full name
    #[arg(short, long)]
    pub name: String,

    /// Father's name
    #[arg(long, default_value = "")]
    pub father: String,

    /// Mother's name
    #[arg(long, default_value = "")]
    pub mother: String,

    /// Age group (4+ to 15+)
    #[arg(short, long, default_value = "6+")]
    pub age: AgeGroup,

    /// Gender
    #[arg(short, long, value_enum, default_value = "male")]
    pub gender: GenderArg,

    /// Class admitted into (Pre-Primary, 1-5)
    #[arg(long = "class", default_value = "1")]
    pub class_level: ClassLevel,

    /// School attended before
    #[arg(long)]
    pub previous_school: Option<String>,

    /// Child lives in the school's coverage area
    #[arg(long)]
    pub coverage_area: bool,

    /// Child comes from another school
    #[arg(long)]
    pub other_school: bool,

    /// Guardian's phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Free-form remarks
    #[arg(long)]
    pub notes: Option<String>,
}

impl AddCommand {
    /// Build the admission form from the arguments.
    #[must_use]
    pub fn to_new_student(&self) -> NewStudent {
        NewStudent {
            child_name: self.name.clone(),
            father_name: self.father.clone(),
            mother_name: self.mother.clone(),
            age_group: self.age,
            gender: self.gender.into(),
            class_level: self.class_level,
            previous_school: self.previous_school.clone(),
            comes_from_school_coverage_area: self.coverage_area,
            comes_from_other_schools: self.other_school,
            guardian_phone: self.phone.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Update command arguments. Only the given fields change.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Record id
    pub id: String,

    /// New child name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New father's name
    #[arg(long)]
    pub father: Option<String>,

    /// New mother's name
    #[arg(long)]
    pub mother: Option<String>,

    /// New age group
    #[arg(short, long)]
    pub age: Option<AgeGroup>,

    /// New gender
    #[arg(short, long, value_enum)]
    pub gender: Option<GenderArg>,

    /// New class
    #[arg(long = "class")]
    pub class_level: Option<ClassLevel>,

    /// New previous school
    #[arg(long, conflicts_with = "clear_previous_school")]
    pub previous_school: Option<String>,

    /// Remove the previous school
    #[arg(long)]
    pub clear_previous_school: bool,

    /// Set the coverage-area flag
    #[arg(long, value_name = "BOOL")]
    pub coverage_area: Option<bool>,

    /// Set the other-school flag
    #[arg(long, value_name = "BOOL")]
    pub other_school: Option<bool>,

    /// New guardian phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// New remarks
    #[arg(long, conflicts_with = "clear_notes")]
    pub notes: Option<String>,

    /// Remove the remarks
    #[arg(long)]
    pub clear_notes: bool,
}

impl UpdateCommand {
    /// Build the patch from the arguments.
    #[must_use]
    pub fn to_patch(&self) -> StudentPatch {
        StudentPatch {
            child_name: self.name.clone(),
            father_name: self.father.clone(),
            mother_name: self.mother.clone(),
            age_group: self.age,
            gender: self.gender.map(Gender::from),
            class_level: self.class_level,
            previous_school: clearable(self.previous_school.as_ref(), self.clear_previous_school),
            comes_from_school_coverage_area: self.coverage_area,
            comes_from_other_schools: self.other_school,
            guardian_phone: self.phone.clone(),
            notes: clearable(self.notes.as_ref(), self.clear_notes),
        }
    }
}

fn clearable(value: Option<&String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(|v| Some(v.clone()))
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record id
    pub id: String,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only records whose child name, father name or serial contains this
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Include chart series (age, class and source breakdowns)
    #[arg(long)]
    pub charts: bool,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormatArg,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Write the report to the default file name in the current directory
    #[arg(long)]
    pub save: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Gender argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    /// Boy
    #[value(alias = "m", alias = "boy")]
    Male,
    /// Girl
    #[value(alias = "f", alias = "girl")]
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Self::Male,
            GenderArg::Female => Self::Female,
        }
    }
}

/// Report format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormatArg {
    /// Printable fixed-width table
    #[default]
    Text,
    /// Comma-separated values
    Csv,
    /// JSON
    Json,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Text => Self::Text,
            ReportFormatArg::Csv => Self::Csv,
            ReportFormatArg::Json => Self::Json,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_command(name: &str) -> AddCommand {
        AddCommand {
            name: name.to_string(),
            father: String::new(),
            mother: String::new(),
            age: AgeGroup::default(),
            gender: GenderArg::Female,
            class_level: ClassLevel::PrePrimary,
            previous_school: None,
            coverage_area: true,
            other_school: false,
            phone: "01700000000".to_string(),
            notes: None,
        }
    }

    fn update_command() -> UpdateCommand {
        UpdateCommand {
            id: "7".to_string(),
            name: None,
            father: None,
            mother: None,
            age: None,
            gender: None,
            class_level: None,
            previous_school: None,
            clear_previous_school: false,
            coverage_area: None,
            other_school: None,
            phone: None,
            notes: None,
            clear_notes: false,
        }
    }

    #[test]
    fn test_gender_arg_conversion() {
        assert_eq!(Gender::from(GenderArg::Male), Gender::Male);
        assert_eq!(Gender::from(GenderArg::Female), Gender::Female);
    }

    #[test]
    fn test_report_format_arg_conversion() {
        assert_eq!(ReportFormat::from(ReportFormatArg::Text), ReportFormat::Text);
        assert_eq!(ReportFormat::from(ReportFormatArg::Csv), ReportFormat::Csv);
        assert_eq!(ReportFormat::from(ReportFormatArg::Json), ReportFormat::Json);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_add_to_new_student() {
        let form = add_command("Nusrat").to_new_student();
        assert_eq!(form.child_name, "Nusrat");
        assert_eq!(form.gender, Gender::Female);
        assert_eq!(form.class_level, ClassLevel::PrePrimary);
        assert!(form.comes_from_school_coverage_area);
        assert!(!form.comes_from_other_schools);
        assert_eq!(form.guardian_phone, "01700000000");
    }

    #[test]
    fn test_empty_update_is_empty_patch() {
        assert!(update_command().to_patch().is_empty());
    }

    #[test]
    fn test_update_to_patch() {
        let mut cmd = update_command();
        cmd.name = Some("New Name".to_string());
        cmd.gender = Some(GenderArg::Male);
        cmd.other_school = Some(true);
        cmd.notes = Some("moved".to_string());
        cmd.clear_previous_school = true;

        let patch = cmd.to_patch();
        assert_eq!(patch.child_name.as_deref(), Some("New Name"));
        assert_eq!(patch.gender, Some(Gender::Male));
        assert_eq!(patch.comes_from_other_schools, Some(true));
        assert_eq!(patch.notes, Some(Some("moved".to_string())));
        assert_eq!(patch.previous_school, Some(None));
        assert_eq!(patch.class_level, None);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
