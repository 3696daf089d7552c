use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The attendance grid is a fixed 30 columns regardless of the calendar month.
pub const DAYS_IN_GRID: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(raw: impl Into<String>) -> Self {
        StudentId(raw.into())
    }

    pub fn generate() -> Self {
        StudentId::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Older exports carry numeric millisecond ids; keep them as their decimal text.
impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Ok(StudentId::new(s)),
            Raw::Number(n) => Ok(StudentId::new(n.to_string())),
        }
    }
}

/// Text fields written by hand-edited exports may hold numbers or booleans;
/// they are kept as their JSON text. Null or missing becomes empty.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Flag(b)) => b.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub roll: String,
    #[serde(rename = "studentClass", default, deserialize_with = "lenient_text")]
    pub class_label: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub section: String,
    #[serde(rename = "mobile", default, deserialize_with = "lenient_text")]
    pub contact: String,
}

/// Calendar month key, always rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if !(1..=9999).contains(&year) {
            return Err(DomainError::Validation(
                "year must be between 0001 and 9999".to_string(),
            ));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::Validation(
                "month must be between 01 and 12".to_string(),
            ));
        }
        Ok(YearMonth { year, month })
    }

    pub fn current() -> Self {
        use chrono::Datelike;
        let today = chrono::Local::now().date_naive();
        YearMonth {
            year: today.year(),
            month: today.month(),
        }
    }

}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || DomainError::Validation(format!("month must be YYYY-MM, got {:?}", s));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(bad());
        }
        if !y.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let year = y.parse::<i32>().map_err(|_| bad())?;
        let month = m.parse::<u32>().map_err(|_| bad())?;
        YearMonth::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Storage-side view of one grid cell. A missing entry is `Unmarked`, which
/// only the aggregator decides to count as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Present,
    Absent,
    Unmarked,
}

impl Mark {
    pub fn is_present(self) -> bool {
        matches!(self, Mark::Present)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Present => "present",
            Mark::Absent => "absent",
            Mark::Unmarked => "unmarked",
        }
    }
}

pub fn check_day(day: u8) -> Result<u8, DomainError> {
    if day == 0 || day > DAYS_IN_GRID {
        return Err(DomainError::Validation(format!(
            "day must be between 1 and {}",
            DAYS_IN_GRID
        )));
    }
    Ok(day)
}

type MonthMarks = BTreeMap<u8, bool>;

/// studentId -> YYYY-MM -> day -> present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceBook(BTreeMap<String, BTreeMap<YearMonth, MonthMarks>>);

impl AttendanceBook {
    pub fn mark(&self, student: &StudentId, month: YearMonth, day: u8) -> Mark {
        match self
            .0
            .get(student.as_str())
            .and_then(|months| months.get(&month))
            .and_then(|days| days.get(&day))
        {
            Some(true) => Mark::Present,
            Some(false) => Mark::Absent,
            None => Mark::Unmarked,
        }
    }

    pub fn set(&mut self, student: &StudentId, month: YearMonth, day: u8, present: bool) {
        self.0
            .entry(student.as_str().to_string())
            .or_default()
            .entry(month)
            .or_default()
            .insert(day, present);
    }

    /// Flips presence for one cell and returns the new value. Unmarked cells
    /// become present; present becomes an explicit absent.
    pub fn toggle(&mut self, student: &StudentId, month: YearMonth, day: u8) -> bool {
        let next = !self.mark(student, month, day).is_present();
        self.set(student, month, day, next);
        next
    }

    pub fn remove_student(&mut self, student: &StudentId) -> bool {
        self.0.remove(student.as_str()).is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn student_count(&self) -> usize {
        self.0.len()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (student, months) in &self.0 {
            for (month, days) in months {
                if let Some(day) = days.keys().find(|d| **d == 0 || **d > DAYS_IN_GRID) {
                    return Err(DomainError::MalformedData(format!(
                        "attendance for {} in {} has day {} outside 1..={}",
                        student, month, day, DAYS_IN_GRID
                    )));
                }
            }
        }
        Ok(())
    }
}
