//! Teacher-assignment workflow state.
//!
//! The assignment pane builds a draft (one teacher, a set of students with
//! per-student task notes), submits it as a task-creation call, and shows
//! two client-side aggregations: the session's assignment records and the
//! backend task history grouped by teacher.

use crate::api::models::HistoryTask;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A teacher available as an assignment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherRef {
    pub id: i64,
    pub name: String,
}

/// A student added to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStudent {
    /// Backend primary key; history rows carry only the business id
    pub pk: Option<i64>,
    /// Business user id
    pub student_id: String,
    pub name: String,
    pub note: String,
}

/// The in-progress assignment: one teacher, many students.
#[derive(Debug, Default)]
pub struct AssignmentDraft {
    pub teacher: Option<TeacherRef>,
    pub students: Vec<DraftStudent>,
}

impl AssignmentDraft {
    /// Add a student, de-duplicating by business id.
    ///
    /// # Returns
    /// * `bool` - false if the student was already in the draft
    pub fn add(&mut self, student: DraftStudent) -> bool {
        if self
            .students
            .iter()
            .any(|existing| existing.student_id == student.student_id)
        {
            return false;
        }
        self.students.push(student);
        true
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.students.len() {
            self.students.remove(index);
        }
    }

    pub fn clear_students(&mut self) {
        self.students.clear();
    }

    /// Students resolvable to a backend pk, as `(pk, note)` pairs for the
    /// task-creation payload.
    pub fn assignments(&self) -> Vec<(i64, String)> {
        self.students
            .iter()
            .filter_map(|s| s.pk.map(|pk| (pk, s.note.clone())))
            .collect()
    }

    /// Business ids of students lacking a backend pk.
    pub fn unresolved(&self) -> Vec<String> {
        self.students
            .iter()
            .filter(|s| s.pk.is_none())
            .map(|s| s.student_id.clone())
            .collect()
    }
}

/// One student inside a history group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStudent {
    pub student_id: String,
    pub student_name: String,
    pub task_note: String,
}

/// History rows aggregated under one teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryGroup {
    pub teacher_id: String,
    pub teacher_name: String,
    pub students: Vec<HistoryStudent>,
}

/// Group task-history rows by teacher, de-duplicating students per teacher.
///
/// # Details
/// Rows without a teacher id or student id are skipped. Group order is
/// first-seen; a student appears at most once per teacher, keeping the note
/// from the newest row (the backend returns newest first).
pub fn group_history(tasks: &[HistoryTask]) -> Vec<HistoryGroup> {
    let mut groups: Vec<HistoryGroup> = Vec::new();
    let mut seen: Vec<HashSet<String>> = Vec::new();

    for task in tasks {
        if task.teacher_id.is_empty() || task.student_id.is_empty() {
            continue;
        }
        let index = match groups
            .iter()
            .position(|g| g.teacher_id == task.teacher_id)
        {
            Some(index) => index,
            None => {
                groups.push(HistoryGroup {
                    teacher_id: task.teacher_id.clone(),
                    teacher_name: task.teacher_name.clone(),
                    students: Vec::new(),
                });
                seen.push(HashSet::new());
                groups.len() - 1
            }
        };
        if !seen[index].insert(task.student_id.clone()) {
            continue;
        }
        groups[index].students.push(HistoryStudent {
            student_id: task.student_id.clone(),
            student_name: task.student_name.clone(),
            task_note: task.task_note.clone(),
        });
    }

    groups
}

/// Teachers derivable from history rows, first-seen order.
pub fn teachers_from_history(tasks: &[HistoryTask]) -> Vec<TeacherRef> {
    let mut teachers: Vec<TeacherRef> = Vec::new();
    for task in tasks {
        let Ok(id) = task.teacher_id.parse::<i64>() else {
            continue;
        };
        if teachers.iter().any(|t| t.id == id) {
            continue;
        }
        teachers.push(TeacherRef {
            id,
            name: task.teacher_name.clone(),
        });
    }
    teachers
}

/// A student line inside a completed assignment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStudent {
    pub name: String,
    pub note: String,
}

/// One completed assignment, kept client-side for the records list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub teacher: String,
    pub date: String,
    pub students: Vec<RecordStudent>,
}

/// Render assignment records as the plain-text export.
pub fn export_text(records: &[AssignmentRecord]) -> String {
    let mut out = String::from("Teaching task assignments\n\n");
    for (index, record) in records.iter().enumerate() {
        out.push_str(&format!("Assignment {}:\n", index + 1));
        out.push_str(&format!("Teacher: {}\n", record.teacher));
        out.push_str(&format!("Date: {}\n", record.date));
        out.push_str("Students:\n");
        for student in &record.students {
            let note = if student.note.is_empty() {
                "none"
            } else {
                student.note.as_str()
            };
            out.push_str(&format!("  - {} (note: {})\n", student.name, note));
        }
        out.push('\n');
    }
    out
}

/// Write the export to `assignments_<date>.txt` under `dir`.
///
/// # Returns
/// * `Result<PathBuf>` - Path of the written file
pub fn export_to_file(records: &[AssignmentRecord], dir: &Path, date: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = dir.join(format!("assignments_{}.txt", date));
    fs::write(&path, export_text(records))
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_task(teacher_id: &str, teacher: &str, sid: &str, name: &str, note: &str) -> HistoryTask {
        HistoryTask {
            teacher_id: teacher_id.to_string(),
            teacher_name: teacher.to_string(),
            student_id: sid.to_string(),
            student_name: name.to_string(),
            task_note: note.to_string(),
        }
    }

    #[test]
    fn test_group_history_dedupes_students_per_teacher() {
        let tasks = vec![
            history_task("7", "Ms. Lin", "S1", "Wren", "warmups"),
            history_task("7", "Ms. Lin", "S2", "Ivo", ""),
            history_task("7", "Ms. Lin", "S1", "Wren", "older note"),
            history_task("9", "Mr. Okafor", "S1", "Wren", "scales"),
        ];
        let groups = group_history(&tasks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].teacher_name, "Ms. Lin");
        assert_eq!(groups[0].students.len(), 2);
        // The first (newest) note wins over the duplicate
        assert_eq!(groups[0].students[0].task_note, "warmups");
        // The same student may appear under a different teacher
        assert_eq!(groups[1].students.len(), 1);
    }

    #[test]
    fn test_group_history_skips_incomplete_rows() {
        let tasks = vec![
            history_task("", "Ms. Lin", "S1", "Wren", ""),
            history_task("7", "Ms. Lin", "", "", ""),
        ];
        assert!(group_history(&tasks).is_empty());
    }

    #[test]
    fn test_teachers_from_history_first_seen_order() {
        let tasks = vec![
            history_task("9", "Mr. Okafor", "S1", "Wren", ""),
            history_task("7", "Ms. Lin", "S2", "Ivo", ""),
            history_task("9", "Mr. Okafor", "S3", "Ada", ""),
            history_task("x", "Broken", "S4", "Nn", ""),
        ];
        let teachers = teachers_from_history(&tasks);
        assert_eq!(teachers.len(), 2);
        assert_eq!(teachers[0].id, 9);
        assert_eq!(teachers[1].name, "Ms. Lin");
    }

    #[test]
    fn test_draft_add_dedupes_by_business_id() {
        let mut draft = AssignmentDraft::default();
        let wren = DraftStudent {
            pk: Some(3),
            student_id: "S1".to_string(),
            name: "Wren".to_string(),
            note: String::new(),
        };
        assert!(draft.add(wren.clone()));
        assert!(!draft.add(wren));
        assert_eq!(draft.students.len(), 1);
    }

    #[test]
    fn test_draft_assignments_skip_unresolved() {
        let mut draft = AssignmentDraft::default();
        draft.add(DraftStudent {
            pk: Some(3),
            student_id: "S1".to_string(),
            name: "Wren".to_string(),
            note: "warmups".to_string(),
        });
        draft.add(DraftStudent {
            pk: None,
            student_id: "S2".to_string(),
            name: "Ivo".to_string(),
            note: String::new(),
        });
        assert_eq!(draft.assignments(), vec![(3, "warmups".to_string())]);
        assert_eq!(draft.unresolved(), vec!["S2".to_string()]);
    }

    #[test]
    fn test_export_text_layout() {
        let records = vec![AssignmentRecord {
            teacher: "Ms. Lin".to_string(),
            date: "2026-08-05".to_string(),
            students: vec![
                RecordStudent {
                    name: "Wren".to_string(),
                    note: "warmups".to_string(),
                },
                RecordStudent {
                    name: "Ivo".to_string(),
                    note: String::new(),
                },
            ],
        }];
        let text = export_text(&records);
        assert!(text.starts_with("Teaching task assignments\n"));
        assert!(text.contains("Assignment 1:\n"));
        assert!(text.contains("  - Wren (note: warmups)\n"));
        assert!(text.contains("  - Ivo (note: none)\n"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let records = vec![AssignmentRecord {
            teacher: "Ms. Lin".to_string(),
            date: "2026-08-05".to_string(),
            students: Vec::new(),
        }];
        let path = export_to_file(&records, dir.path(), "2026-08-05").unwrap();
        assert!(path.ends_with("assignments_2026-08-05.txt"));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, export_text(&records));
    }
}
