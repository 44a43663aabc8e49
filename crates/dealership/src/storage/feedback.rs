//! Feedback operations.

use chrono::Utc;
use rusqlite::params;
use tracing::debug;

use super::{format_timestamp, parse_timestamp, Storage};
use crate::error::Result;
use crate::model::{Feedback, NewFeedback};

impl Storage {
    /// Store a feedback message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback> {
        let created_at = format_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO feedback (name, email, subject, message, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                feedback.name,
                feedback.email,
                feedback.subject,
                feedback.message,
                created_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Stored feedback with id {}", id);
        Ok(Feedback {
            id,
            name: feedback.name.clone(),
            email: feedback.email.clone(),
            subject: feedback.subject.clone(),
            message: feedback.message.clone(),
            created_at: parse_timestamp(&created_at),
        })
    }

    /// All feedback, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_feedback(&self) -> Result<Vec<Feedback>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, email, subject, message, created_at
            FROM feedback ORDER BY created_at DESC, id DESC
            ",
        )?;
        let feedback = stmt
            .query_map([], |row| {
                let created_at: String = row.get(5)?;
                Ok(Feedback {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    subject: row.get(3)?,
                    message: row.get(4)?,
                    created_at: parse_timestamp(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(subject: Option<&str>, body: &str) -> NewFeedback {
        NewFeedback {
            name: "Minh".to_string(),
            email: "minh@mail.vn".to_string(),
            subject: subject.map(str::to_string),
            message: body.to_string(),
        }
    }

    #[test]
    fn test_insert_and_list_newest_first() {
        let storage = Storage::open_in_memory().unwrap();
        let first = storage.insert_feedback(&message(None, "first")).unwrap();
        let second = storage
            .insert_feedback(&message(Some("Hỏi giá"), "second"))
            .unwrap();

        let all = storage.list_feedback().unwrap();
        assert_eq!(all, vec![second, first]);
        assert_eq!(all[0].subject.as_deref(), Some("Hỏi giá"));
        assert_eq!(all[1].subject, None);
    }

    #[test]
    fn test_list_empty() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.list_feedback().unwrap().is_empty());
    }
}
