use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIORITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestinationStatus {
    #[serde(rename = "backlog")]
    Backlog,
    #[serde(rename = "ready for action")]
    ReadyForAction,
    #[serde(rename = "work in progress")]
    WorkInProgress,
    #[serde(rename = "in review")]
    InReview,
    #[serde(rename = "waiting/blocked")]
    WaitingBlocked,
    #[serde(rename = "done")]
    Done,
}

impl DestinationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::ReadyForAction => "ready for action",
            Self::WorkInProgress => "work in progress",
            Self::InReview => "in review",
            Self::WaitingBlocked => "waiting/blocked",
            Self::Done => "done",
        }
    }
}

const PRIORITIES: &[(&str, u8)] = &[
    ("Highest", 1),
    ("High", 2),
    ("Medium", 3),
    ("Low", 4),
    ("Lowest", 4),
];

const STATUSES: &[(&str, DestinationStatus)] = &[
    ("To Do", DestinationStatus::ReadyForAction),
    ("Open", DestinationStatus::ReadyForAction),
    ("Ready", DestinationStatus::ReadyForAction),
    ("Backlog", DestinationStatus::Backlog),
    ("In Progress", DestinationStatus::WorkInProgress),
    ("In Review", DestinationStatus::InReview),
    ("Review", DestinationStatus::InReview),
    ("Testing", DestinationStatus::InReview),
    ("QA", DestinationStatus::InReview),
    ("Done", DestinationStatus::Done),
    ("Closed", DestinationStatus::Done),
    ("Resolved", DestinationStatus::Done),
    ("Complete", DestinationStatus::Done),
    ("Completed", DestinationStatus::Done),
    ("Cancelled", DestinationStatus::Done),
    ("Won't Do", DestinationStatus::Done),
    ("Blocked", DestinationStatus::WaitingBlocked),
    ("Waiting", DestinationStatus::WaitingBlocked),
    ("On Hold", DestinationStatus::WaitingBlocked),
];

/// 1 is urgent, 4 is low.
pub fn map_priority(priority: &str) -> u8 {
    let priority = priority.trim();
    PRIORITIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(priority))
        .map_or(DEFAULT_PRIORITY, |(_, value)| *value)
}

pub fn map_status(status: &str) -> Option<DestinationStatus> {
    let status = status.trim();
    STATUSES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(status))
        .map(|(_, bucket)| *bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_table() {
        assert_eq!(map_priority("Highest"), 1);
        assert_eq!(map_priority("High"), 2);
        assert_eq!(map_priority("Medium"), 3);
        assert_eq!(map_priority("Low"), 4);
        assert_eq!(map_priority("Lowest"), 4);
    }

    #[test]
    fn priority_is_total() {
        for input in ["", "Blocker", "P0", "  high ", "\u{1F525}"] {
            assert!((1..=4).contains(&map_priority(input)), "{input:?}");
        }
        assert_eq!(map_priority("Blocker"), DEFAULT_PRIORITY);
    }

    #[test]
    fn status_table() {
        assert_eq!(map_status("Done"), Some(DestinationStatus::Done));
        assert_eq!(map_status("Done").map(DestinationStatus::as_str), Some("done"));
        assert_eq!(map_status("To Do"), Some(DestinationStatus::ReadyForAction));
        assert_eq!(map_status("On Hold"), Some(DestinationStatus::WaitingBlocked));
        assert_eq!(map_status("QA"), Some(DestinationStatus::InReview));
        assert_eq!(map_status("Backlog"), Some(DestinationStatus::Backlog));
    }

    #[test]
    fn unknown_status_is_absent() {
        assert_eq!(map_status("Unknown Custom State"), None);
        assert_eq!(map_status(""), None);
    }

    #[test]
    fn status_serializes_to_destination_spelling() {
        let json = serde_json::to_string(&DestinationStatus::WaitingBlocked).unwrap();
        assert_eq!(json, "\"waiting/blocked\"");
    }
}
