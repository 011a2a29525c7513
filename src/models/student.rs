//! Student record types
//!
//! `Student` is what the store hands back and what the listing cache holds;
//! `NewStudent` and `StudentUpdate` are the write-side payloads.

use serde::{Deserialize, Serialize};

/// Maximum length of the text attributes
pub const MAX_NAME_LENGTH: usize = 100;

// == Student ==
/// A persisted student record. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub lastname: String,
    pub firstname: String,
    pub faculty: String,
    pub course: i32,
    pub result: f64,
}

// == New Student ==
/// Body of `POST /students/` and one row of a CSV import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub lastname: String,
    pub firstname: String,
    pub faculty: String,
    pub course: i32,
    pub result: f64,
}

impl NewStudent {
    /// Validates the record.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_text("lastname", &self.lastname)
            .or_else(|| validate_text("firstname", &self.firstname))
            .or_else(|| validate_text("faculty", &self.faculty))
            .or_else(|| validate_course(self.course))
            .or_else(|| validate_result(self.result))
    }

    /// Attaches a store-assigned id.
    pub fn into_student(self, id: i64) -> Student {
        Student {
            id,
            lastname: self.lastname,
            firstname: self.firstname,
            faculty: self.faculty,
            course: self.course,
            result: self.result,
        }
    }
}

// == Student Update ==
/// Body of `PATCH /students/{id}`.
///
/// Present fields replace the stored value; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub course: Option<i32>,
    #[serde(default)]
    pub result: Option<f64>,
}

impl StudentUpdate {
    /// Validates every field that is present.
    pub fn validate(&self) -> Option<String> {
        self.lastname
            .as_deref()
            .and_then(|v| validate_text("lastname", v))
            .or_else(|| {
                self.firstname
                    .as_deref()
                    .and_then(|v| validate_text("firstname", v))
            })
            .or_else(|| {
                self.faculty
                    .as_deref()
                    .and_then(|v| validate_text("faculty", v))
            })
            .or_else(|| self.course.and_then(validate_course))
            .or_else(|| self.result.and_then(validate_result))
    }

    /// Applies the present fields to `student` in place.
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(lastname) = &self.lastname {
            student.lastname = lastname.clone();
        }
        if let Some(firstname) = &self.firstname {
            student.firstname = firstname.clone();
        }
        if let Some(faculty) = &self.faculty {
            student.faculty = faculty.clone();
        }
        if let Some(course) = self.course {
            student.course = course;
        }
        if let Some(result) = self.result {
            student.result = result;
        }
    }
}

fn validate_text(field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} cannot be empty", field));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Some(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_NAME_LENGTH
        ));
    }
    None
}

fn validate_course(course: i32) -> Option<String> {
    (course < 1).then(|| "course must be a positive number".to_string())
}

fn validate_result(result: f64) -> Option<String> {
    (!result.is_finite()).then(|| "result must be a finite number".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ivanov() -> NewStudent {
        NewStudent {
            lastname: "Ivanov".to_string(),
            firstname: "Ivan".to_string(),
            faculty: "Physics".to_string(),
            course: 2,
            result: 87.5,
        }
    }

    #[test]
    fn test_new_student_deserialize() {
        let json = r#"{"lastname":"Ivanov","firstname":"Ivan","faculty":"Physics","course":2,"result":87.5}"#;
        let student: NewStudent = serde_json::from_str(json).unwrap();
        assert_eq!(student, ivanov());
        assert!(student.validate().is_none());
    }

    #[test]
    fn test_validate_empty_lastname() {
        let student = NewStudent {
            lastname: "   ".to_string(),
            ..ivanov()
        };
        assert!(student.validate().unwrap().contains("lastname"));
    }

    #[test]
    fn test_validate_course_and_result() {
        let student = NewStudent { course: 0, ..ivanov() };
        assert!(student.validate().unwrap().contains("course"));

        let student = NewStudent {
            result: f64::NAN,
            ..ivanov()
        };
        assert!(student.validate().unwrap().contains("result"));
    }

    #[test]
    fn test_update_partial_apply() {
        let mut student = ivanov().into_student(7);
        let update = StudentUpdate {
            course: Some(3),
            ..Default::default()
        };
        assert!(update.validate().is_none());
        update.apply_to(&mut student);

        assert_eq!(student.id, 7);
        assert_eq!(student.course, 3);
        assert_eq!(student.lastname, "Ivanov");
    }

    #[test]
    fn test_update_rejects_too_long_faculty() {
        let update = StudentUpdate {
            faculty: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..Default::default()
        };
        assert!(update.validate().is_some());
    }
}
