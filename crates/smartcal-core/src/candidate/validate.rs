//! Structural validation of preview inputs.
//!
//! Runs at the boundary, before anything is placed. Scheduling problems such
//! as a zero duration are not validation failures.

use std::collections::HashSet;

use super::input::{CalendarEvent, Frequency, PreviewHabit, PreviewTask};
use crate::error::ValidationError;

fn require(record: &str, field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            record: record.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

fn unique<'a>(
    record: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                record: record.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_tasks(tasks: &[PreviewTask]) -> Result<(), ValidationError> {
    for task in tasks {
        require("task", "id", &task.id)?;
        require(&format!("task '{}'", task.id), "title", &task.title)?;
    }
    unique("task", tasks.iter().map(|t| t.id.as_str()))
}

pub fn validate_habits(habits: &[PreviewHabit]) -> Result<(), ValidationError> {
    for habit in habits {
        require("habit", "id", &habit.id)?;
        let record = format!("habit '{}'", habit.id);
        require(&record, "title", &habit.title)?;

        let rule = &habit.recurrence;
        if rule.interval == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("{record}.recurrence.interval"),
                message: "must be at least 1".to_string(),
            });
        }
        if rule.frequency == Frequency::Weekly && rule.days.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("{record}.recurrence.days"),
                message: "weekly recurrence needs at least one weekday".to_string(),
            });
        }
        if let (Some(start), Some(end)) = (rule.start_date, rule.end_date) {
            if end < start {
                return Err(ValidationError::InvalidRange {
                    field: format!("{record}.recurrence"),
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
    }
    unique("habit", habits.iter().map(|h| h.id.as_str()))
}

pub fn validate_events(events: &[CalendarEvent]) -> Result<(), ValidationError> {
    for event in events {
        require("event", "id", &event.id)?;
        if event.end <= event.start {
            return Err(ValidationError::InvalidRange {
                field: format!("event '{}'", event.id),
                start: event.start.to_rfc3339(),
                end: event.end.to_rfc3339(),
            });
        }
    }
    unique("event", events.iter().map(|e| e.id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::input::Recurrence;
    use chrono::{Duration, Utc};

    #[test]
    fn zero_duration_is_not_a_validation_error() {
        assert!(validate_tasks(&[PreviewTask::new("a", "A", 0)]).is_ok());
        assert!(validate_tasks(&[PreviewTask::new("a", "A", -15)]).is_ok());
    }

    #[test]
    fn blank_id_and_title_are_rejected() {
        assert!(matches!(
            validate_tasks(&[PreviewTask::new(" ", "A", 30)]),
            Err(ValidationError::MissingField { .. })
        ));
        assert!(matches!(
            validate_tasks(&[PreviewTask::new("a", "", 30)]),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let tasks = vec![PreviewTask::new("a", "A", 30), PreviewTask::new("a", "B", 30)];
        assert_eq!(
            validate_tasks(&tasks),
            Err(ValidationError::DuplicateId {
                record: "task".into(),
                id: "a".into()
            })
        );
    }

    #[test]
    fn habit_recurrence_rules_are_checked() {
        let zero = PreviewHabit::new("h", "H", 30, Recurrence::daily().every(0));
        assert!(validate_habits(&[zero]).is_err());

        let no_days = PreviewHabit::new("h", "H", 30, Recurrence::weekly(vec![]));
        assert!(validate_habits(&[no_days]).is_err());

        let ok = PreviewHabit::new("h", "H", 30, Recurrence::daily());
        assert!(validate_habits(&[ok]).is_ok());
    }

    #[test]
    fn inverted_events_are_rejected() {
        let now = Utc::now();
        let event = CalendarEvent::new("e", now, now - Duration::minutes(5));
        assert!(matches!(
            validate_events(&[event]),
            Err(ValidationError::InvalidRange { .. })
        ));
    }
}
