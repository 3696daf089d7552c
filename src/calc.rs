use crate::model::{AttendanceBook, Mark, Student, StudentId, YearMonth, DAYS_IN_GRID};
use serde::Serialize;

const GRID: usize = DAYS_IN_GRID as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassFilter {
    All,
    Class(String),
}

impl ClassFilter {
    /// `None`, empty and `"all"` disable filtering; anything else is an exact
    /// class label.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => ClassFilter::All,
            Some(s) if s.is_empty() || s == "all" => ClassFilter::All,
            Some(s) => ClassFilter::Class(s.to_string()),
        }
    }

    pub fn admits(&self, student: &Student) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Class(c) => student.class_label == *c,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClassFilter::All => "all",
            ClassFilter::Class(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub month: YearMonth,
    pub class_filter: ClassFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    pub present: [u32; GRID],
    pub absent: [u32; GRID],
    pub student_count: usize,
}

/// Per-day head counts over the filtered students. Unmarked counts as absent.
pub fn daily_totals(students: &[Student], book: &AttendanceBook, scope: &Scope) -> DailyTotals {
    let mut present = [0u32; GRID];
    let mut absent = [0u32; GRID];
    let mut student_count = 0;

    for s in students.iter().filter(|s| scope.class_filter.admits(s)) {
        student_count += 1;
        for day in 1..=DAYS_IN_GRID {
            let idx = usize::from(day - 1);
            if book.mark(&s.id, scope.month, day).is_present() {
                present[idx] += 1;
            } else {
                absent[idx] += 1;
            }
        }
    }

    DailyTotals {
        present,
        absent,
        student_count,
    }
}

/// Percentage in tenths, truncated. `None` when there is nothing to divide by.
fn percent_tenths(part: u64, total: u64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    Some(part * 1000 / total)
}

pub fn format_percent(tenths: Option<u64>) -> String {
    match tenths {
        Some(t) => format!("{}.{}", t / 10, t % 10),
        None => "0".to_string(),
    }
}

pub fn clamp_days(days: Option<u64>) -> u8 {
    match days {
        None => DAYS_IN_GRID,
        Some(d) => d.clamp(1, u64::from(DAYS_IN_GRID)) as u8,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub days: u8,
    pub total_present: u64,
    pub total_absent: u64,
    pub percent_present: String,
    pub percent_absent: String,
}

pub fn range_summary(daily: &DailyTotals, days: u8) -> RangeSummary {
    let n = usize::from(days.clamp(1, DAYS_IN_GRID));
    let total_present: u64 = daily.present[..n].iter().map(|v| u64::from(*v)).sum();
    let total_absent: u64 = daily.absent[..n].iter().map(|v| u64::from(*v)).sum();
    let checks = total_present + total_absent;

    RangeSummary {
        days: n as u8,
        total_present,
        total_absent,
        percent_present: format_percent(percent_tenths(total_present, checks)),
        percent_absent: format_percent(percent_tenths(total_absent, checks)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartTotals {
    pub present: u64,
    pub absent: u64,
}

/// Everything the external chart widget draws: a per-day bar pair and a
/// present/absent proportion over the same range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartFeed {
    pub labels: Vec<u8>,
    pub present: Vec<u32>,
    pub absent: Vec<u32>,
    pub totals: ChartTotals,
}

pub fn chart_feed(daily: &DailyTotals, days: u8) -> ChartFeed {
    let n = usize::from(days.clamp(1, DAYS_IN_GRID));
    let present = daily.present[..n].to_vec();
    let absent = daily.absent[..n].to_vec();
    ChartFeed {
        labels: (1..=n as u8).collect(),
        totals: ChartTotals {
            present: present.iter().map(|v| u64::from(*v)).sum(),
            absent: absent.iter().map(|v| u64::from(*v)).sum(),
        },
        present,
        absent,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub student_id: StudentId,
    pub name: String,
    pub marks: Vec<Mark>,
}

/// Rows of the attendance grid for the scope, in roster order.
pub fn month_grid(students: &[Student], book: &AttendanceBook, scope: &Scope) -> Vec<GridRow> {
    students
        .iter()
        .filter(|s| scope.class_filter.admits(s))
        .map(|s| GridRow {
            student_id: s.id.clone(),
            name: s.name.clone(),
            marks: (1..=DAYS_IN_GRID)
                .map(|day| book.mark(&s.id, scope.month, day))
                .collect(),
        })
        .collect()
}

/// Distinct non-empty class labels in first-seen order.
pub fn class_options(students: &[Student]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in students {
        if s.class_label.is_empty() || out.iter().any(|c| *c == s.class_label) {
            continue;
        }
        out.push(s.class_label.clone());
    }
    out
}
