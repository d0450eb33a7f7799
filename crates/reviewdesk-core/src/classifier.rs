//! Turns a provider-neutral [`ReviewRecord`] into a [`ReviewStatus`].
//!
//! Classification is a pure function of the record, the current user and the
//! supplied `now`; it performs no I/O and never fails.

use chrono::{DateTime, Duration, Utc};

use crate::models::ReviewRecord;
use crate::status::ReviewStatus;

/// Items younger than this are reported as [`ReviewStatus::New`].
pub const NEW_ITEM_WINDOW_MINUTES: i64 = 10;

/// Quantities derived from a record that drive the decision rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSignals {
    pub authored_by_me: bool,
    pub approved_by_me: bool,
    /// Open threads in which the current user wrote at least one note
    pub unresolved_involved_count: usize,
    /// Latest note in any thread the current user took part in
    pub last_involved_update: Option<DateTime<Utc>>,
    /// Latest note written by the current user, in any thread
    pub my_last_action_at: Option<DateTime<Utc>>,
    /// Latest system note that is not an approval (e.g. pushed commits)
    pub last_non_approval_system_note_at: Option<DateTime<Utc>>,
}

impl ReviewSignals {
    pub fn derive(record: &ReviewRecord, current_user_id: &str) -> Self {
        let approved_by_me = record.approver_ids.iter().any(|id| id == current_user_id);

        let involved: Vec<_> = record
            .discussions
            .iter()
            .filter(|d| d.involves(current_user_id))
            .collect();

        let unresolved_involved_count = involved.iter().filter(|d| d.is_open()).count();

        let last_involved_update = involved
            .iter()
            .flat_map(|d| d.notes.iter())
            .map(|n| n.updated_at)
            .max();

        let all_notes = || record.discussions.iter().flat_map(|d| d.notes.iter());

        let my_last_action_at = all_notes()
            .filter(|n| n.author_id == current_user_id)
            .map(|n| n.updated_at)
            .max();

        let last_non_approval_system_note_at = all_notes()
            .filter(|n| n.is_non_approval_system())
            .map(|n| n.updated_at)
            .max();

        Self {
            authored_by_me: record.author_id == current_user_id,
            approved_by_me,
            unresolved_involved_count,
            last_involved_update,
            my_last_action_at,
            last_non_approval_system_note_at,
        }
    }

    /// Something moved in one of your open threads since you last acted.
    pub fn relevant_update_since_my_last_action(&self) -> bool {
        if self.unresolved_involved_count == 0 {
            return false;
        }

        let newer = |at: Option<DateTime<Utc>>| match (at, self.my_last_action_at) {
            (Some(at), Some(mine)) => at > mine,
            (Some(_), None) => true,
            (None, _) => false,
        };

        newer(self.last_involved_update) || newer(self.last_non_approval_system_note_at)
    }
}

/// Classify a record for `current_user_id` as of `now`.
///
/// Rules are evaluated in order and the first match wins.
pub fn classify(record: &ReviewRecord, current_user_id: &str, now: DateTime<Utc>) -> ReviewStatus {
    let signals = ReviewSignals::derive(record, current_user_id);
    let has_open_threads = signals.unresolved_involved_count > 0;

    if signals.authored_by_me {
        ReviewStatus::Mine
    } else if signals.relevant_update_since_my_last_action() {
        ReviewStatus::ReReviewNeeded
    } else if signals.approved_by_me && !has_open_threads {
        ReviewStatus::Approved
    } else if has_open_threads {
        ReviewStatus::WaitingForResponse
    } else if signals.approved_by_me && has_open_threads {
        // Shadowed by the WaitingForResponse rule above; kept so the rule
        // order stays documented in one place.
        ReviewStatus::Checked
    } else if now - record.created_at < Duration::minutes(NEW_ITEM_WINDOW_MINUTES) {
        ReviewStatus::New
    } else {
        ReviewStatus::NotChecked
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::models::{Discussion, Note, APPROVAL_NOTE_KIND};

    const ME: &str = "gid://gitlab/User/2";
    const AUTHOR: &str = "gid://gitlab/User/1";

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        now() - Duration::minutes(minutes)
    }

    fn record(created_minutes_ago: i64) -> ReviewRecord {
        ReviewRecord {
            author_id: AUTHOR.to_string(),
            approver_ids: vec![],
            discussions: vec![],
            created_at: minutes_ago(created_minutes_ago),
        }
    }

    fn thread(resolved: bool, notes: Vec<Note>) -> Discussion {
        Discussion {
            resolvable: true,
            resolved,
            notes,
        }
    }

    #[test]
    fn test_fresh_item_is_new() {
        let r = record(5);
        assert_eq!(classify(&r, ME, now()), ReviewStatus::New);
    }

    #[test]
    fn test_old_untouched_item_is_not_checked() {
        let r = record(60);
        assert_eq!(classify(&r, ME, now()), ReviewStatus::NotChecked);
    }

    #[test]
    fn test_new_window_boundary_is_exclusive() {
        let r = record(NEW_ITEM_WINDOW_MINUTES);
        assert_eq!(classify(&r, ME, now()), ReviewStatus::NotChecked);
    }

    #[test]
    fn test_author_is_always_mine() {
        let mut r = record(60);
        r.author_id = ME.to_string();
        r.approver_ids = vec![ME.to_string()];
        r.discussions = vec![thread(
            false,
            vec![Note::comment(ME, minutes_ago(30)), Note::comment(AUTHOR, minutes_ago(1))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::Mine);

        r.discussions.clear();
        r.created_at = minutes_ago(1);
        assert_eq!(classify(&r, ME, now()), ReviewStatus::Mine);
    }

    #[test]
    fn test_reply_after_my_note_needs_re_review() {
        let mut r = record(60);
        r.discussions = vec![thread(
            false,
            vec![Note::comment(ME, minutes_ago(30)), Note::comment(AUTHOR, minutes_ago(10))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::ReReviewNeeded);
    }

    #[test]
    fn test_pushed_commits_after_my_note_need_re_review() {
        let mut r = record(60);
        r.discussions = vec![
            thread(false, vec![Note::comment(ME, minutes_ago(30))]),
            Discussion {
                resolvable: false,
                resolved: false,
                notes: vec![Note::system(AUTHOR, minutes_ago(5), "commit")],
            },
        ];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::ReReviewNeeded);
    }

    #[test]
    fn test_approval_system_note_does_not_trigger_re_review() {
        let mut r = record(60);
        r.discussions = vec![
            thread(false, vec![Note::comment(ME, minutes_ago(30))]),
            Discussion {
                resolvable: false,
                resolved: false,
                notes: vec![Note::system(
                    "gid://gitlab/User/9",
                    minutes_ago(5),
                    APPROVAL_NOTE_KIND,
                )],
            },
        ];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::WaitingForResponse);
    }

    #[test]
    fn test_open_thread_without_reply_is_waiting() {
        let mut r = record(60);
        r.discussions = vec![thread(
            false,
            vec![Note::comment(AUTHOR, minutes_ago(40)), Note::comment(ME, minutes_ago(30))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::WaitingForResponse);
    }

    #[test]
    fn test_approved_without_open_threads() {
        let mut r = record(60);
        r.approver_ids = vec!["gid://gitlab/User/7".to_string(), ME.to_string()];
        r.discussions = vec![thread(
            true,
            vec![Note::comment(ME, minutes_ago(30)), Note::comment(AUTHOR, minutes_ago(10))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::Approved);
    }

    #[test]
    fn test_approved_with_open_thread_reports_waiting() {
        let mut r = record(60);
        r.approver_ids = vec![ME.to_string()];
        r.discussions = vec![thread(false, vec![Note::comment(ME, minutes_ago(30))])];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::WaitingForResponse);
    }

    #[test]
    fn test_resolved_threads_do_not_count() {
        let mut r = record(60);
        r.discussions = vec![thread(
            true,
            vec![Note::comment(ME, minutes_ago(30)), Note::comment(AUTHOR, minutes_ago(10))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::NotChecked);
    }

    #[test]
    fn test_threads_without_me_are_ignored() {
        let mut r = record(60);
        r.discussions = vec![thread(
            false,
            vec![Note::comment("gid://gitlab/User/5", minutes_ago(1))],
        )];
        assert_eq!(classify(&r, ME, now()), ReviewStatus::NotChecked);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut r = record(3);
        r.discussions = vec![thread(
            false,
            vec![Note::comment(ME, minutes_ago(2)), Note::comment(AUTHOR, minutes_ago(1))],
        )];
        assert_eq!(classify(&r, ME, now()), classify(&r, ME, now()));
    }

    #[test]
    fn test_signals() {
        let mut r = record(60);
        r.discussions = vec![
            thread(
                false,
                vec![
                    Note::comment(ME, minutes_ago(30)),
                    Note::comment(AUTHOR, minutes_ago(20)),
                ],
            ),
            thread(false, vec![Note::comment(AUTHOR, minutes_ago(2))]),
            thread(true, vec![Note::comment(ME, minutes_ago(25))]),
        ];
        let signals = ReviewSignals::derive(&r, ME);
        assert_eq!(signals.unresolved_involved_count, 1);
        assert_eq!(signals.last_involved_update, Some(minutes_ago(20)));
        assert_eq!(signals.my_last_action_at, Some(minutes_ago(25)));
        assert_eq!(signals.last_non_approval_system_note_at, None);
        assert!(signals.relevant_update_since_my_last_action());
    }
}
