//! Government admission report export.
//!
//! The column layout is fixed: age group, surveyed children (B/G/T), one
//! B/G/T triple per class from Pre-Primary to Class 5, then total admitted
//! (B/G/T). Every rendered row has the same 25 cells.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{CrossTab, GenderCount};
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::student::ClassLevel;

/// Number of cells in every report row.
pub const COLUMN_COUNT: usize = 1 + 3 + 3 * ClassLevel::ALL.len() + 3;

const SURVEYED: &str = "Surveyed Children";
const TOTAL_ADMITTED: &str = "Total Admitted";
const GRAND_TOTAL: &str = "Grand Total";
const SURVEYOR_SIGNATURE: &str = "Surveyor Signature";
const HEADMASTER_SIGNATURE: &str = "Headmaster Signature";

const LABEL_WIDTH: usize = 12;
const CELL_WIDTH: usize = 5;
const GROUP_WIDTH: usize = 3 * CELL_WIDTH + 2;

/// Title block printed above the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    /// School name.
    pub school_name: String,
    /// Report title line.
    pub report_title: String,
    /// Upazila (sub-district).
    pub upazila: String,
    /// Government school code.
    pub school_code: String,
    /// Academic year.
    pub year: u16,
}

impl From<&ReportConfig> for ReportHeader {
    fn from(config: &ReportConfig) -> Self {
        Self {
            school_name: config.school_name.clone(),
            report_title: config.report_title.clone(),
            upazila: config.upazila.clone(),
            school_code: config.school_code.clone(),
            year: config.year,
        }
    }
}

impl Default for ReportHeader {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl ReportHeader {
    /// Suggested file name for a report exported on `date`.
    ///
    /// `Admission_Report_<year>_<YYYY-MM-DD>.<ext>`
    #[must_use]
    pub fn file_name(&self, date: NaiveDate, format: ReportFormat) -> String {
        format!(
            "Admission_Report_{}_{}.{}",
            self.year,
            date.format("%Y-%m-%d"),
            format.extension()
        )
    }
}

/// Output format of an exported report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Fixed-width printable table.
    #[default]
    Text,
    /// Comma-separated values.
    Csv,
    /// Header plus the raw cross-tab.
    Json,
}

impl ReportFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Render a cross-tab in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(self, header: &ReportHeader, table: &CrossTab) -> Result<String> {
        match self {
            Self::Text => Ok(render_text(header, table)),
            Self::Csv => Ok(render_csv(table)),
            Self::Json => render_json(header, table),
        }
    }
}

/// Flat column headings, one per cell.
#[must_use]
pub fn column_headers() -> Vec<String> {
    let mut headers = Vec::with_capacity(COLUMN_COUNT);
    headers.push("Age Group".to_string());
    push_triple_headers(&mut headers, SURVEYED);
    for class in ClassLevel::ALL {
        push_triple_headers(&mut headers, class.heading());
    }
    push_triple_headers(&mut headers, TOTAL_ADMITTED);
    headers
}

fn push_triple_headers(headers: &mut Vec<String>, group: &str) {
    for suffix in ["B", "G", "T"] {
        headers.push(format!("{group} {suffix}"));
    }
}

/// A rendered line of the table before formatting.
struct ReportLine {
    label: String,
    surveyed: GenderCount,
    classes: Vec<GenderCount>,
    admitted: GenderCount,
}

impl ReportLine {
    fn cells(&self, dash_empty_classes: bool) -> Vec<String> {
        let mut cells = Vec::with_capacity(COLUMN_COUNT);
        cells.push(self.label.clone());
        push_triple(&mut cells, self.surveyed, false);
        for count in &self.classes {
            push_triple(&mut cells, *count, dash_empty_classes);
        }
        push_triple(&mut cells, self.admitted, false);
        cells
    }
}

fn push_triple(cells: &mut Vec<String>, count: GenderCount, dash_empty: bool) {
    for n in [count.boys, count.girls, count.total()] {
        if dash_empty && n == 0 {
            cells.push("-".to_string());
        } else {
            cells.push(n.to_string());
        }
    }
}

fn data_lines(table: &CrossTab) -> Vec<ReportLine> {
    table
        .rows
        .iter()
        .map(|row| {
            let totals = GenderCount {
                boys: row.boys_total,
                girls: row.girls_total,
            };
            ReportLine {
                label: row.age_group.to_string(),
                surveyed: totals,
                classes: ClassLevel::ALL
                    .iter()
                    .map(|&class| row.class_count(class))
                    .collect(),
                admitted: totals,
            }
        })
        .collect()
}

fn footer_line(table: &CrossTab) -> ReportLine {
    let totals = GenderCount {
        boys: table.footer.boys_total,
        girls: table.footer.girls_total,
    };
    ReportLine {
        label: GRAND_TOTAL.to_string(),
        surveyed: totals,
        classes: ClassLevel::ALL
            .iter()
            .map(|&class| table.footer.class_count(class))
            .collect(),
        admitted: totals,
    }
}

/// Render the report as CSV: a heading row, one row per age group and a
/// grand-total row. All cells are numeric.
#[must_use]
pub fn render_csv(table: &CrossTab) -> String {
    let mut out = String::new();
    push_csv_row(&mut out, &column_headers());
    for line in data_lines(table) {
        push_csv_row(&mut out, &line.cells(false));
    }
    push_csv_row(&mut out, &footer_line(table).cells(false));
    out
}

fn push_csv_row(out: &mut String, cells: &[String]) {
    let escaped: Vec<String> = cells.iter().map(|c| csv_field(c)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the printable report: title block, fixed-width table and
/// signature lines.
///
/// Empty class cells in the age-group rows print as `-`; the surveyed,
/// admitted and grand-total cells always print numbers.
#[must_use]
pub fn render_text(header: &ReportHeader, table: &CrossTab) -> String {
    let mut groups = vec![SURVEYED];
    groups.extend(ClassLevel::ALL.iter().map(|c| c.heading()));
    groups.push(TOTAL_ADMITTED);

    let group_line: String = std::iter::once(format!("{:<LABEL_WIDTH$}", ""))
        .chain(groups.iter().map(|group| format!(" | {group:^GROUP_WIDTH$}")))
        .collect();
    let sub_heading = format!(" | {:>CELL_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$}", "B", "G", "T");
    let sub_line = format!("{:<LABEL_WIDTH$}{}", "Age Group", sub_heading.repeat(groups.len()));
    let rule = "-".repeat(sub_line.len());

    let mut lines = vec![
        header.school_name.clone(),
        header.report_title.clone(),
        format!(
            "Upazila: {}    School Code: {}    Year: {}",
            header.upazila, header.school_code, header.year
        ),
        String::new(),
        group_line.trim_end().to_string(),
        sub_line,
        rule.clone(),
    ];
    lines.extend(data_lines(table).iter().map(|line| text_row(&line.cells(true))));
    lines.push(rule);
    lines.push(text_row(&footer_line(table).cells(false)));
    lines.extend([String::new(), String::new()]);
    lines.push(format!("{:<40}{}", "____________________", "____________________"));
    lines.push(format!("{SURVEYOR_SIGNATURE:<40}{HEADMASTER_SIGNATURE}"));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn text_row(cells: &[String]) -> String {
    let Some((label, rest)) = cells.split_first() else {
        return String::new();
    };
    let mut row = format!("{label:<LABEL_WIDTH$}");
    for triple in rest.chunks(3) {
        row.push_str(" |");
        row.extend(triple.iter().map(|cell| format!(" {cell:>CELL_WIDTH$}")));
    }
    row
}

#[derive(Serialize)]
struct JsonReport<'a> {
    header: &'a ReportHeader,
    #[serde(flatten)]
    table: &'a CrossTab,
}

/// Render the header and cross-tab as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(header: &ReportHeader, table: &CrossTab) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { header, table }).map_err(Error::from)
}
