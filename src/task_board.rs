use chrono::{Days, NaiveDate, Utc};
use tracing::info;

use crate::domain::{Priority, Task, TaskCategory, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reschedule {
    OneDay,
    ThreeDays,
    OneWeek,
    TwoWeeks,
}

impl Reschedule {
    pub const ALL: [Reschedule; 4] = [
        Reschedule::OneDay,
        Reschedule::ThreeDays,
        Reschedule::OneWeek,
        Reschedule::TwoWeeks,
    ];

    pub fn days(&self) -> u64 {
        match self {
            Reschedule::OneDay => 1,
            Reschedule::ThreeDays => 3,
            Reschedule::OneWeek => 7,
            Reschedule::TwoWeeks => 14,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reschedule::OneDay => "+1 day",
            Reschedule::ThreeDays => "+3 days",
            Reschedule::OneWeek => "+1 week",
            Reschedule::TwoWeeks => "+2 weeks",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: TaskCategory,
    pub due_date: NaiveDate,
    pub donor_id: Option<String>,
}

impl TaskDraft {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            description: None,
            priority: Priority::Medium,
            category: TaskCategory::Todo,
            due_date: today,
            donor_id: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            category: task.category,
            due_date: task.due_date,
            donor_id: task.donor_id.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn create(&mut self, draft: TaskDraft) -> Option<String> {
        if !draft.is_valid() {
            return None;
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.tasks.push(Task {
            id: id.clone(),
            title: draft.title.trim().to_owned(),
            description: draft.description.filter(|text| !text.trim().is_empty()),
            status: TaskStatus::Open,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
            donor_id: draft.donor_id,
            created_at: Utc::now(),
        });
        info!(task = %id, "task created");
        Some(id)
    }

    pub fn update(&mut self, id: &str, draft: TaskDraft) -> bool {
        if !draft.is_valid() {
            return false;
        }
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.title = draft.title.trim().to_owned();
        task.description = draft.description.filter(|text| !text.trim().is_empty());
        task.priority = draft.priority;
        task.category = draft.category;
        task.due_date = draft.due_date;
        task.donor_id = draft.donor_id;
        true
    }

    pub fn toggle_status(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(task) if task.status == TaskStatus::Open => {
                task.status = TaskStatus::Completed;
                info!(task = %id, "task completed");
                true
            }
            _ => false,
        }
    }

    pub fn reschedule(&mut self, id: &str, by: Reschedule) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        match task.due_date.checked_add_days(Days::new(by.days())) {
            Some(due) => {
                task.due_date = due;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            info!(task = %id, "task deleted");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{DataProvider, MockData};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn board() -> TaskBoard {
        TaskBoard::new(MockData::seeded(today()).tasks().to_vec())
    }

    #[test]
    fn toggle_is_one_way() {
        let mut board = board();
        assert!(board.toggle_status("t-01"));
        assert_eq!(board.get("t-01").map(|t| t.status), Some(TaskStatus::Completed));
        assert!(!board.toggle_status("t-01"));
        assert_eq!(board.get("t-01").map(|t| t.status), Some(TaskStatus::Completed));
        assert!(!board.toggle_status("missing"));
    }

    #[test]
    fn reschedule_shifts_date_and_keeps_status() {
        let mut board = board();
        let before = board.get("t-05").cloned().unwrap();
        assert!(board.reschedule("t-05", Reschedule::TwoWeeks));
        let after = board.get("t-05").unwrap();
        assert_eq!(after.due_date, before.due_date + Days::new(14));
        assert_eq!(after.status, TaskStatus::Completed);
        assert!(!board.reschedule("missing", Reschedule::OneDay));
    }

    #[test]
    fn reschedule_offsets() {
        let days: Vec<u64> = Reschedule::ALL.iter().map(Reschedule::days).collect();
        assert_eq!(days, vec![1, 3, 7, 14]);
    }

    #[test]
    fn create_edit_delete() {
        let mut board = board();
        let count = board.tasks().len();

        assert_eq!(board.create(TaskDraft::blank(today())), None);
        let mut draft = TaskDraft::blank(today());
        draft.title = "  Mail receipt  ".into();
        draft.description = Some("   ".into());
        let id = board.create(draft).expect("valid draft");
        let created = board.get(&id).unwrap();
        assert_eq!(created.title, "Mail receipt");
        assert_eq!(created.description, None);
        assert_eq!(created.status, TaskStatus::Open);
        assert_eq!(board.tasks().len(), count + 1);

        let mut edit = TaskDraft::from_task(created);
        edit.priority = Priority::High;
        edit.category = TaskCategory::Call;
        assert!(board.update(&id, edit));
        assert_eq!(board.get(&id).map(|t| t.priority), Some(Priority::High));

        assert!(board.delete(&id));
        assert!(!board.delete(&id));
        assert!(board.get(&id).is_none());
        assert_eq!(board.tasks().len(), count);
    }
}
