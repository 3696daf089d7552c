use crate::error::DomainError;
use crate::model::{check_day, AttendanceBook, Student, StudentId, YearMonth};
use serde::Deserialize;
use std::collections::HashSet;

/// Fields submitted by the add-student form. Every one is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default, rename = "studentClass")]
    pub class_label: String,
    #[serde(default)]
    pub section: String,
    #[serde(default, rename = "mobile")]
    pub contact: String,
}

impl StudentForm {
    fn into_student(self, id: StudentId) -> Result<Student, DomainError> {
        let student = Student {
            id,
            name: self.name.trim().to_string(),
            roll: self.roll.trim().to_string(),
            class_label: self.class_label.trim().to_string(),
            section: self.section.trim().to_string(),
            contact: self.contact.trim().to_string(),
        };
        let missing: Vec<&str> = [
            ("name", &student.name),
            ("roll", &student.roll),
            ("studentClass", &student.class_label),
            ("section", &student.section),
            ("mobile", &student.contact),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "fill all fields to add a student (missing: {})",
                missing.join(", ")
            )));
        }
        Ok(student)
    }
}

/// The dashboard's in-memory data: roster plus attendance. Mutations here
/// never touch storage; callers persist afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub students: Vec<Student>,
    pub attendance: AttendanceBook,
}

impl Dashboard {
    pub fn new(students: Vec<Student>, attendance: AttendanceBook) -> Self {
        Dashboard {
            students,
            attendance,
        }
    }

    pub fn find(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == *id)
    }

    pub fn add(&mut self, form: StudentForm) -> Result<&Student, DomainError> {
        let mut id = StudentId::generate();
        while self.find(&id).is_some() {
            id = StudentId::generate();
        }
        let student = form.into_student(id)?;
        self.students.push(student);
        Ok(&self.students[self.students.len() - 1])
    }

    /// Removes the student and every attendance mark recorded for them.
    pub fn delete(&mut self, id: &StudentId) -> Result<Student, DomainError> {
        let pos = self
            .students
            .iter()
            .position(|s| s.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("student {} not found", id)))?;
        let removed = self.students.remove(pos);
        self.attendance.remove_student(id);
        Ok(removed)
    }

    fn require(&self, id: &StudentId) -> Result<(), DomainError> {
        match self.find(id) {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound(format!("student {} not found", id))),
        }
    }

    pub fn toggle_mark(
        &mut self,
        id: &StudentId,
        month: YearMonth,
        day: u8,
    ) -> Result<bool, DomainError> {
        check_day(day)?;
        self.require(id)?;
        Ok(self.attendance.toggle(id, month, day))
    }

    pub fn set_mark(
        &mut self,
        id: &StudentId,
        month: YearMonth,
        day: u8,
        present: bool,
    ) -> Result<(), DomainError> {
        check_day(day)?;
        self.require(id)?;
        self.attendance.set(id, month, day, present);
        Ok(())
    }

    pub fn replace_students(&mut self, students: Vec<Student>) -> Result<(), DomainError> {
        check_unique_ids(&students)?;
        self.students = students;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.students.clear();
        self.attendance.clear();
    }
}

pub fn check_unique_ids(students: &[Student]) -> Result<(), DomainError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for s in students {
        if !seen.insert(s.id.as_str()) {
            return Err(DomainError::MalformedData(format!(
                "duplicate student id {}",
                s.id
            )));
        }
    }
    Ok(())
}
