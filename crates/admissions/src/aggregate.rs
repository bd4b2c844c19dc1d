//! Summary counts derived from a snapshot of the register.
//!
//! Everything here is a pure function of the records passed in. Nothing is
//! cached; callers take a fresh snapshot and recompute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::student::{AgeGroup, ClassLevel, Gender, StudentRecord};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Number of records.
    pub total_students: usize,
    /// Records with gender Male.
    pub boys_count: usize,
    /// Records with gender Female.
    pub girls_count: usize,
    /// Records flagged as coming from the coverage area.
    pub from_coverage_area: usize,
    /// Records flagged as coming from other schools.
    pub from_other_schools: usize,
    /// New admissions. Every record counts until an admission year exists.
    pub new_admission: usize,
}

/// Boy and girl counts for one report cell group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCount {
    /// Boys.
    pub boys: usize,
    /// Girls.
    pub girls: usize,
}

impl GenderCount {
    /// Boys plus girls.
    #[must_use]
    pub fn total(&self) -> usize {
        self.boys + self.girls
    }

    fn record(&mut self, gender: Gender) {
        match gender {
            Gender::Male => self.boys += 1,
            Gender::Female => self.girls += 1,
        }
    }

    fn absorb(&mut self, other: GenderCount) {
        self.boys += other.boys;
        self.girls += other.girls;
    }
}

fn empty_breakdown() -> BTreeMap<ClassLevel, GenderCount> {
    ClassLevel::ALL
        .iter()
        .map(|&class| (class, GenderCount::default()))
        .collect()
}

/// One age-group row of the admission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroupReportRow {
    /// Age band of this row.
    pub age_group: AgeGroup,
    /// Boys in this age band, all classes.
    pub boys_total: usize,
    /// Girls in this age band, all classes.
    pub girls_total: usize,
    /// Per-class counts; every class has an entry.
    pub class_breakdown: BTreeMap<ClassLevel, GenderCount>,
}

impl AgeGroupReportRow {
    fn empty(age_group: AgeGroup) -> Self {
        Self {
            age_group,
            boys_total: 0,
            girls_total: 0,
            class_breakdown: empty_breakdown(),
        }
    }

    /// Counts for one class (zero if the class has no entry).
    #[must_use]
    pub fn class_count(&self, class: ClassLevel) -> GenderCount {
        self.class_breakdown.get(&class).copied().unwrap_or_default()
    }

    /// Children in this age band.
    #[must_use]
    pub fn total(&self) -> usize {
        self.boys_total + self.girls_total
    }
}

/// Grand-total line of the admission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTabFooter {
    /// Boys across all rows.
    pub boys_total: usize,
    /// Girls across all rows.
    pub girls_total: usize,
    /// Per-class counts across all rows.
    pub class_breakdown: BTreeMap<ClassLevel, GenderCount>,
}

impl CrossTabFooter {
    /// Counts for one class (zero if the class has no entry).
    #[must_use]
    pub fn class_count(&self, class: ClassLevel) -> GenderCount {
        self.class_breakdown.get(&class).copied().unwrap_or_default()
    }

    /// All children counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.boys_total + self.girls_total
    }
}

/// Age group × class × gender matrix behind the admission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTab {
    /// One row per age group, youngest first.
    pub rows: Vec<AgeGroupReportRow>,
    /// Column sums over all rows.
    pub footer: CrossTabFooter,
}

impl CrossTab {
    /// The row for a given age group.
    #[must_use]
    pub fn row(&self, age_group: AgeGroup) -> Option<&AgeGroupReportRow> {
        self.rows.iter().find(|r| r.age_group == age_group)
    }
}

/// Count of records in one age band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBucket {
    /// Age band.
    pub age_group: AgeGroup,
    /// Records in the band.
    pub count: usize,
}

/// Count of records in one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBucket {
    /// Class.
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
    /// Records in the class.
    pub count: usize,
}

/// Where admitted children come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakdown {
    /// Flagged as living in the coverage area.
    pub coverage_area: usize,
    /// Flagged as coming from other schools.
    pub other_schools: usize,
    /// Whatever is left of the total; never negative.
    pub new_or_other: usize,
}

/// Series drawn on the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Records per age group, youngest first.
    pub age_distribution: Vec<AgeBucket>,
    /// Records per class, report column order.
    pub class_distribution: Vec<ClassBucket>,
    /// Admission source split.
    pub source_breakdown: SourceBreakdown,
}

/// Compute the dashboard numbers.
#[must_use]
pub fn dashboard_stats(records: &[StudentRecord]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_students: records.len(),
        new_admission: records.len(),
        ..DashboardStats::default()
    };

    for record in records {
        match record.gender {
            Gender::Male => stats.boys_count += 1,
            Gender::Female => stats.girls_count += 1,
        }
        if record.comes_from_school_coverage_area {
            stats.from_coverage_area += 1;
        }
        if record.comes_from_other_schools {
            stats.from_other_schools += 1;
        }
    }

    stats
}

/// Build the age × class × gender matrix.
///
/// Rows follow the age-group order regardless of counts, and every age group
/// gets a row even when empty.
#[must_use]
pub fn cross_tab(records: &[StudentRecord]) -> CrossTab {
    let mut rows: Vec<AgeGroupReportRow> = AgeGroup::all().map(AgeGroupReportRow::empty).collect();

    for record in records {
        let Some(row) = rows.iter_mut().find(|r| r.age_group == record.age_group) else {
            continue;
        };
        match record.gender {
            Gender::Male => row.boys_total += 1,
            Gender::Female => row.girls_total += 1,
        }
        row.class_breakdown
            .entry(record.class_level)
            .or_default()
            .record(record.gender);
    }

    let mut footer = CrossTabFooter {
        boys_total: 0,
        girls_total: 0,
        class_breakdown: empty_breakdown(),
    };
    for row in &rows {
        footer.boys_total += row.boys_total;
        footer.girls_total += row.girls_total;
        for (class, count) in &row.class_breakdown {
            footer
                .class_breakdown
                .entry(*class)
                .or_default()
                .absorb(*count);
        }
    }

    CrossTab { rows, footer }
}

/// Compute the dashboard chart series.
#[must_use]
pub fn chart_series(records: &[StudentRecord]) -> ChartSeries {
    let age_distribution = AgeGroup::all()
        .map(|age_group| AgeBucket {
            age_group,
            count: records.iter().filter(|r| r.age_group == age_group).count(),
        })
        .collect();

    let class_distribution = ClassLevel::ALL
        .iter()
        .map(|&class_level| ClassBucket {
            class_level,
            count: records
                .iter()
                .filter(|r| r.class_level == class_level)
                .count(),
        })
        .collect();

    let stats = dashboard_stats(records);
    let source_breakdown = SourceBreakdown {
        coverage_area: stats.from_coverage_area,
        other_schools: stats.from_other_schools,
        new_or_other: stats
            .total_students
            .saturating_sub(stats.from_coverage_area + stats.from_other_schools),
    };

    ChartSeries {
        age_distribution,
        class_distribution,
        source_breakdown,
    }
}
