//! Class records and their grade history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grade::{percentage_to_letter, Letter};

/// Source tag written on history entries created by grade edits.
pub const DEFAULT_HISTORY_SOURCE: &str = "manual";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    #[default]
    Core,
    Elective,
}

/// A tracked class. Archived classes keep `is_active = false` and stay in
/// the state together with their history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub class_type: ClassType,
    #[serde(default)]
    pub current_grade: f64,
    #[serde(default)]
    pub missing_assignments: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl ClassRecord {
    /// New active class with grade 0 and nothing missing.
    pub fn new(name: impl Into<String>, class_type: ClassType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            class_type,
            current_grade: 0.0,
            missing_assignments: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn letter(&self) -> Letter {
        percentage_to_letter(self.current_grade)
    }
}

/// Partial update for [`ClassRecord`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub class_type: Option<ClassType>,
    pub current_grade: Option<f64>,
    pub missing_assignments: Option<u32>,
}

impl ClassPatch {
    pub fn grade(grade: f64) -> Self {
        Self {
            current_grade: Some(grade),
            ..Default::default()
        }
    }

    pub fn missing(count: u32) -> Self {
        Self {
            missing_assignments: Some(count),
            ..Default::default()
        }
    }

    /// Whether applying this patch to `class` must first snapshot its current
    /// grade/missing pair.
    ///
    /// A grade change always snapshots. A missing-count change snapshots only
    /// when the patch carries no grade at all.
    pub fn requires_snapshot(&self, class: &ClassRecord) -> bool {
        match (self.current_grade, self.missing_assignments) {
            (Some(grade), _) => grade != class.current_grade,
            (None, Some(missing)) => missing != class.missing_assignments,
            (None, None) => false,
        }
    }

    pub(crate) fn apply_to(self, class: &mut ClassRecord, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            class.name = name;
        }
        if let Some(class_type) = self.class_type {
            class.class_type = class_type;
        }
        if let Some(grade) = self.current_grade {
            class.current_grade = grade;
        }
        if let Some(missing) = self.missing_assignments {
            class.missing_assignments = missing;
        }
        class.updated_at = now;
    }
}

/// Snapshot of a class's grade/missing pair taken just before it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeHistoryEntry {
    pub id: String,
    pub class_id: String,
    pub grade: f64,
    #[serde(default)]
    pub missing_assignments: u32,
    pub recorded_at: DateTime<Utc>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    DEFAULT_HISTORY_SOURCE.to_string()
}

impl GradeHistoryEntry {
    pub fn snapshot_of(class: &ClassRecord, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            class_id: class.id.clone(),
            grade: class.current_grade,
            missing_assignments: class.missing_assignments,
            recorded_at,
            source: default_source(),
        }
    }

    /// UTC calendar day the entry was recorded on.
    pub fn recorded_on(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_record_json_shape() {
        let now = Utc::now();
        let mut class = ClassRecord::new("Biology 2", ClassType::Core, now);
        class.current_grade = 61.23;
        class.missing_assignments = 4;

        let json = serde_json::to_value(&class).unwrap();
        assert_eq!(json["type"], "core");
        assert_eq!(json["currentGrade"], 61.23);
        assert_eq!(json["missingAssignments"], 4);
        assert_eq!(json["isActive"], true);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_parse_class_from_browser_export() {
        let json = r#"{
            "id": "b8c1", "name": "Art 2", "type": "elective",
            "currentGrade": 84.25, "missingAssignments": 1, "isActive": false,
            "createdAt": "2025-01-10T14:03:22.512Z", "updatedAt": "2025-01-11T08:00:00.000Z"
        }"#;
        let class: ClassRecord = serde_json::from_str(json).unwrap();
        assert_eq!(class.class_type, ClassType::Elective);
        assert_eq!(class.letter(), Letter::B);
        assert!(!class.is_active);
    }

    #[test]
    fn test_requires_snapshot_rules() {
        let mut class = ClassRecord::new("Math", ClassType::Core, Utc::now());
        class.current_grade = 70.0;
        class.missing_assignments = 2;

        assert!(ClassPatch::grade(75.0).requires_snapshot(&class));
        assert!(!ClassPatch::grade(70.0).requires_snapshot(&class));
        assert!(ClassPatch::missing(3).requires_snapshot(&class));
        assert!(!ClassPatch::missing(2).requires_snapshot(&class));

        // Same grade with a new missing count: the grade is present, so no snapshot.
        let patch = ClassPatch {
            current_grade: Some(70.0),
            missing_assignments: Some(5),
            ..Default::default()
        };
        assert!(!patch.requires_snapshot(&class));

        let rename = ClassPatch {
            name: Some("Algebra".into()),
            ..Default::default()
        };
        assert!(!rename.requires_snapshot(&class));
    }
}
