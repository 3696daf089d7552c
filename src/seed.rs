use crate::model::{AttendanceBook, Student, StudentId, YearMonth, DAYS_IN_GRID};
use rand::Rng;

const PRESENT_CHANCE: f64 = 0.7;

const DEMO_STUDENTS: [(&str, &str, &str, &str, &str); 5] = [
    ("Aarav Kumar", "1", "10", "A", "9000000001"),
    ("Priya Sharma", "2", "10", "A", "9000000002"),
    ("Rahul Singh", "3", "10", "B", "9000000003"),
    ("Neha Verma", "4", "9", "A", "9000000004"),
    ("Karan Patel", "5", "9", "A", "9000000005"),
];

pub fn demo_students() -> Vec<Student> {
    DEMO_STUDENTS
        .iter()
        .map(|(name, roll, class_label, section, contact)| Student {
            id: StudentId::generate(),
            name: name.to_string(),
            roll: roll.to_string(),
            class_label: class_label.to_string(),
            section: section.to_string(),
            contact: contact.to_string(),
        })
        .collect()
}

/// Random marks for every grid day of `month`, so a fresh dashboard has
/// something to chart.
pub fn demo_attendance<R: Rng>(rng: &mut R, students: &[Student], month: YearMonth) -> AttendanceBook {
    let mut book = AttendanceBook::default();
    for s in students {
        for day in 1..=DAYS_IN_GRID {
            book.set(&s.id, month, day, rng.gen_bool(PRESENT_CHANCE));
        }
    }
    book
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::class_options;
    use crate::model::Mark;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn demo_roster_spans_two_classes() {
        let students = demo_students();
        assert_eq!(students.len(), 5);
        assert_eq!(class_options(&students), vec!["10".to_string(), "9".to_string()]);
    }

    #[test]
    fn demo_attendance_marks_every_day() {
        let students = demo_students();
        let month = YearMonth::new(2024, 11).expect("ym");
        let mut rng = StdRng::seed_from_u64(7);
        let book = demo_attendance(&mut rng, &students, month);
        for s in &students {
            for day in 1..=DAYS_IN_GRID {
                assert_ne!(book.mark(&s.id, month, day), Mark::Unmarked);
            }
        }
        assert!(book.validate().is_ok());
    }
}
