//! Checklist tasks and templates

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Category given to tasks created without one
pub const DEFAULT_TASK_CATEGORY: &str = "geral";

text_enum! {
    pub enum TaskStatus {
        Pendente => "pendente",
        Concluida => "concluida",
        Cancelada => "cancelada",
    }
}

text_enum! {
    pub enum TaskPriority {
        Alta => "alta",
        Media => "media",
        Baixa => "baixa",
    }
}

text_enum! {
    pub enum TaskOrigin {
        Manual => "manual",
        Template => "template",
        Alert => "alert",
    }
}

/// Field values written when a task's completion flag changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChange {
    pub completed: bool,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
}

/// Toggle completion: completing stamps who and when, reopening clears both
pub fn completion_change(completed: bool, by: Uuid, at: DateTime<Utc>) -> CompletionChange {
    if completed {
        CompletionChange {
            completed,
            status: TaskStatus::Concluida,
            completed_at: Some(at),
            completed_by: Some(by),
        }
    } else {
        CompletionChange {
            completed,
            status: TaskStatus::Pendente,
            completed_at: None,
            completed_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_toggle() {
        let by = Uuid::new_v4();
        let now = Utc::now();

        let done = completion_change(true, by, now);
        assert_eq!(done.status, TaskStatus::Concluida);
        assert_eq!(done.completed_by, Some(by));

        let reopened = completion_change(false, by, now);
        assert_eq!(reopened.status, TaskStatus::Pendente);
        assert_eq!(reopened.completed_at, None);
        assert_eq!(reopened.completed_by, None);
    }
}
