//! Review status of a merge request from the current user's point of view.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Review state of an item relative to the current user.
///
/// Display order is defined by [`ReviewStatus::rank`], not by the declaration
/// order of the variants, so reordering the variants never changes either
/// the sort order or the serialized names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Nobody asked anything of you yet and it is not new.
    NotChecked,
    /// Something changed in a thread you are waiting on.
    ReReviewNeeded,
    /// Created less than ten minutes ago.
    New,
    /// The author still has to address your comments.
    WaitingForResponse,
    /// You approved and have no open threads.
    Approved,
    /// You approved while still having open threads.
    Checked,
    /// You are the author.
    Mine,
}

impl ReviewStatus {
    /// All statuses, in display order.
    pub const ALL: [ReviewStatus; 7] = [
        ReviewStatus::NotChecked,
        ReviewStatus::ReReviewNeeded,
        ReviewStatus::New,
        ReviewStatus::WaitingForResponse,
        ReviewStatus::Approved,
        ReviewStatus::Checked,
        ReviewStatus::Mine,
    ];

    /// Sort priority; lower ranks are shown first.
    pub const fn rank(self) -> u8 {
        match self {
            ReviewStatus::NotChecked => 0,
            ReviewStatus::ReReviewNeeded => 1,
            ReviewStatus::New => 2,
            ReviewStatus::WaitingForResponse => 3,
            ReviewStatus::Approved => 4,
            ReviewStatus::Checked => 5,
            ReviewStatus::Mine => 6,
        }
    }

    /// Short glyph shown next to the item, if any.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            ReviewStatus::NotChecked => None,
            ReviewStatus::ReReviewNeeded => Some("👀"),
            ReviewStatus::New => Some("🆕"),
            ReviewStatus::WaitingForResponse => Some("⏳"),
            ReviewStatus::Approved => Some("👍"),
            ReviewStatus::Checked => Some("✔️"),
            ReviewStatus::Mine => Some("😜"),
        }
    }

    /// Explanation shown alongside the icon.
    pub fn description(self) -> Option<&'static str> {
        match self {
            ReviewStatus::NotChecked => None,
            ReviewStatus::ReReviewNeeded => Some(
                "Some new changes have been pushed since your last comments. \
                 How about taking a look again?",
            ),
            ReviewStatus::New => Some("This merge request was created less than 10 minutes ago."),
            ReviewStatus::WaitingForResponse => Some("The author needs to address your comments."),
            ReviewStatus::Approved => Some("You have approved this merge request."),
            ReviewStatus::Checked => {
                Some("You have left some feedback and pre-approved this merge request.")
            }
            ReviewStatus::Mine => Some("This is your own merge request."),
        }
    }

    /// Items that need nothing from you right now are rendered dimmed.
    pub fn is_dimmed(self) -> bool {
        matches!(
            self,
            ReviewStatus::Approved
                | ReviewStatus::WaitingForResponse
                | ReviewStatus::Checked
                | ReviewStatus::Mine
        )
    }
}

impl PartialOrd for ReviewStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReviewStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_order_matches_display_priority() {
        let mut shuffled = vec![
            ReviewStatus::Mine,
            ReviewStatus::New,
            ReviewStatus::Checked,
            ReviewStatus::NotChecked,
            ReviewStatus::Approved,
            ReviewStatus::WaitingForResponse,
            ReviewStatus::ReReviewNeeded,
        ];
        shuffled.sort();
        assert_eq!(shuffled, ReviewStatus::ALL.to_vec());
    }

    #[test]
    fn test_ranks_are_distinct() {
        let mut ranks: Vec<u8> = ReviewStatus::ALL.iter().map(|s| s.rank()).collect();
        ranks.dedup();
        assert_eq!(ranks.len(), ReviewStatus::ALL.len());
    }

    #[test]
    fn test_serialized_names_are_stable() {
        let json = serde_json::to_string(&ReviewStatus::ReReviewNeeded).unwrap();
        assert_eq!(json, "\"re_review_needed\"");
        let back: ReviewStatus = serde_json::from_str("\"mine\"").unwrap();
        assert_eq!(back, ReviewStatus::Mine);
    }

    #[test]
    fn test_only_not_checked_has_no_icon() {
        for status in ReviewStatus::ALL {
            assert_eq!(status.icon().is_none(), status == ReviewStatus::NotChecked);
            assert_eq!(status.description().is_none(), status == ReviewStatus::NotChecked);
        }
    }

    #[test]
    fn test_dimmed_statuses() {
        assert!(ReviewStatus::Mine.is_dimmed());
        assert!(ReviewStatus::Approved.is_dimmed());
        assert!(!ReviewStatus::New.is_dimmed());
        assert!(!ReviewStatus::ReReviewNeeded.is_dimmed());
        assert!(!ReviewStatus::NotChecked.is_dimmed());
    }
}
