//! Ordering and label filtering of classified items.

use crate::models::{Label, PullRequest};

/// Sort by status rank, then oldest first.
///
/// The sort is stable: items equal on both keys keep the provider's order.
pub fn sort_pull_requests(items: &mut [PullRequest]) {
    items.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

/// Owned variant of [`sort_pull_requests`].
pub fn sorted(mut items: Vec<PullRequest>) -> Vec<PullRequest> {
    sort_pull_requests(&mut items);
    items
}

/// Case-insensitive label filter.
///
/// With no configured labels every item passes; otherwise an item passes when
/// at least one of its labels equals a configured label, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct LabelFilter {
    labels_lowercase: Vec<String>,
}

impl LabelFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels_lowercase: labels
                .into_iter()
                .map(|label| label.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels_lowercase.is_empty()
    }

    pub fn matches(&self, labels: &[Label]) -> bool {
        self.is_empty()
            || labels
                .iter()
                .any(|label| self.labels_lowercase.contains(&label.title.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::status::ReviewStatus;
    use chrono::{DateTime, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        format!("2026-03-01T12:{:02}:00Z", minute).parse().unwrap()
    }

    fn pr(url: &str, status: ReviewStatus, minute: u32) -> PullRequest {
        PullRequest {
            name: url.to_string(),
            url: url.to_string(),
            status,
            labels: vec![],
            created_at: at(minute),
        }
    }

    fn urls(items: &[PullRequest]) -> Vec<&str> {
        items.iter().map(|p| p.url.as_str()).collect()
    }

    #[test]
    fn test_sort_by_status_then_created_at() {
        let items = sorted(vec![
            pr("mine", ReviewStatus::Mine, 1),
            pr("new", ReviewStatus::New, 50),
            pr("not-checked-late", ReviewStatus::NotChecked, 30),
            pr("not-checked-early", ReviewStatus::NotChecked, 10),
            pr("rereview", ReviewStatus::ReReviewNeeded, 40),
        ]);
        assert_eq!(
            urls(&items),
            vec!["not-checked-early", "not-checked-late", "rereview", "new", "mine"]
        );
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let items = sorted(vec![
            pr("c", ReviewStatus::Approved, 5),
            pr("a", ReviewStatus::Approved, 5),
            pr("b", ReviewStatus::Approved, 5),
        ]);
        assert_eq!(urls(&items), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sorted_pairs_are_ordered() {
        let items = sorted(vec![
            pr("1", ReviewStatus::Checked, 3),
            pr("2", ReviewStatus::New, 9),
            pr("3", ReviewStatus::Checked, 1),
            pr("4", ReviewStatus::WaitingForResponse, 7),
            pr("5", ReviewStatus::New, 2),
        ]);
        for pair in items.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.status.rank() < b.status.rank()
                    || (a.status == b.status && a.created_at <= b.created_at)
            );
        }
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = LabelFilter::new(Vec::<String>::new());
        assert!(filter.matches(&[]));
        assert!(filter.matches(&[Label::new("anything")]));
    }

    #[test]
    fn test_filter_is_case_insensitive_exact_match() {
        let filter = LabelFilter::new(["Backend", "needs review"]);
        assert!(filter.matches(&[Label::new("backend")]));
        assert!(filter.matches(&[Label::new("docs"), Label::new("NEEDS REVIEW")]));
        assert!(!filter.matches(&[Label::new("backend-api")]));
        assert!(!filter.matches(&[]));
    }
}
