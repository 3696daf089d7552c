use crate::error::DomainError;
use crate::model::{AttendanceBook, Student};
use anyhow::{anyhow, Context};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const STUDENTS_ENTRY: &str = "students.json";
pub const ATTENDANCE_ENTRY: &str = "attendance.json";
pub const BUNDLE_FORMAT_V1: &str = "attendance-export-v1";

/// Recognized shapes of an import document.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// A bare array of students.
    Roster(Vec<Student>),
    /// An object carrying either collection. Absent, mistyped or unparseable
    /// fields are `None` and leave current data alone.
    Document {
        students: Option<Vec<Student>>,
        attendance: Option<AttendanceBook>,
    },
}

fn malformed(what: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::MalformedData(format!("{}: {}", what, e))
}

fn parse_students(v: Value) -> Result<Vec<Student>, DomainError> {
    serde_json::from_value(v).map_err(|e| malformed("invalid student record", e))
}

fn parse_attendance(v: Value) -> Result<AttendanceBook, DomainError> {
    let book: AttendanceBook =
        serde_json::from_value(v).map_err(|e| malformed("invalid attendance map", e))?;
    book.validate()?;
    Ok(book)
}

/// In the object shape a field that does not parse is skipped like a field
/// of the wrong type, so the other field still applies.
fn keep_or_skip<T>(field: &str, parsed: Result<T, DomainError>) -> Option<T> {
    match parsed {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("import: ignoring {} field: {}", field, e.message());
            None
        }
    }
}

pub fn parse_import(text: &str) -> Result<ImportPayload, DomainError> {
    let data: Value = serde_json::from_str(text).map_err(|e| malformed("invalid JSON", e))?;
    match data {
        Value::Array(_) => Ok(ImportPayload::Roster(parse_students(data)?)),
        Value::Object(mut obj) => {
            let students = match obj.remove("students") {
                Some(v @ Value::Array(_)) => keep_or_skip("students", parse_students(v)),
                _ => None,
            };
            let attendance = match obj.remove("attendance") {
                Some(v @ Value::Object(_)) => keep_or_skip("attendance", parse_attendance(v)),
                _ => None,
            };
            Ok(ImportPayload::Document {
                students,
                attendance,
            })
        }
        _ => Err(DomainError::MalformedData(
            "expected a student array or an object with students/attendance".to_string(),
        )),
    }
}

pub fn students_json(students: &[Student]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(students).context("failed to serialize students")
}

pub fn attendance_json(book: &AttendanceBook) -> anyhow::Result<String> {
    serde_json::to_string_pretty(book).context("failed to serialize attendance")
}

pub fn write_text(out_path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(out_path, text)
        .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

pub fn export_bundle(
    students: &[Student],
    book: &AttendanceBook,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().timestamp_millis(),
        "studentCount": students.len(),
    });
    let entries = [
        (
            MANIFEST_ENTRY,
            serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?,
        ),
        (STUDENTS_ENTRY, students_json(students)?),
        (ATTENDANCE_ENTRY, attendance_json(book)?),
    ];
    for (name, body) in &entries {
        zip.start_file(*name, opts)
            .with_context(|| format!("failed to start {} entry", name))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write {} entry", name))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len(),
    })
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> anyhow::Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(e) => e,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(anyhow!(e).context(format!("failed to open {}", name))),
    };
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {}", name))?;
    Ok(Some(text))
}

/// Outer `Err` is an I/O failure; inner `Err` means the file was read but its
/// content is not something we can import.
pub fn read_import_file(in_path: &Path) -> anyhow::Result<Result<ImportPayload, DomainError>> {
    if !is_zip_file(in_path)? {
        let text = std::fs::read_to_string(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        return Ok(parse_import(&text));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = match ZipArchive::new(in_file) {
        Ok(a) => a,
        Err(e) => return Ok(Err(malformed("invalid zip archive", e))),
    };

    let Some(manifest_text) = read_entry(&mut archive, MANIFEST_ENTRY)? else {
        return Ok(Err(DomainError::MalformedData(
            "bundle missing manifest.json".to_string(),
        )));
    };
    let manifest: Value = match serde_json::from_str(&manifest_text) {
        Ok(v) => v,
        Err(e) => return Ok(Err(malformed("manifest.json is invalid JSON", e))),
    };
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Ok(Err(DomainError::MalformedData(format!(
            "unsupported bundle format: {}",
            format
        ))));
    }

    let students = match read_entry(&mut archive, STUDENTS_ENTRY)? {
        Some(text) => match serde_json::from_str::<Value>(&text) {
            Ok(v) => match parse_students(v) {
                Ok(s) => Some(s),
                Err(e) => return Ok(Err(e)),
            },
            Err(e) => return Ok(Err(malformed("students.json is invalid JSON", e))),
        },
        None => None,
    };
    let attendance = match read_entry(&mut archive, ATTENDANCE_ENTRY)? {
        Some(text) => match serde_json::from_str::<Value>(&text) {
            Ok(v) => match parse_attendance(v) {
                Ok(b) => Some(b),
                Err(e) => return Ok(Err(e)),
            },
            Err(e) => return Ok(Err(malformed("attendance.json is invalid JSON", e))),
        },
        None => None,
    };

    Ok(Ok(ImportPayload::Document {
        students,
        attendance,
    }))
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
