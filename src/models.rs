use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dropdown entry
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FilterOption {
    pub value: &'static str,
    pub view_value: &'static str,
}

pub const PHASES: [FilterOption; 7] = [
    FilterOption {
        value: "1",
        view_value: "Fase 1",
    },
    FilterOption {
        value: "2",
        view_value: "Fase 2",
    },
    FilterOption {
        value: "3",
        view_value: "Fase 3",
    },
    FilterOption {
        value: "4",
        view_value: "Fase 4",
    },
    FilterOption {
        value: "5",
        view_value: "Fase 5",
    },
    FilterOption {
        value: "6",
        view_value: "Fase 6",
    },
    FilterOption {
        value: "7",
        view_value: "Fase 7",
    },
];

pub const ACTIVITIES: [FilterOption; 7] = [
    FilterOption {
        value: "1",
        view_value: "Atividade 1",
    },
    FilterOption {
        value: "2",
        view_value: "Atividade 2",
    },
    FilterOption {
        value: "3",
        view_value: "Atividade 3",
    },
    FilterOption {
        value: "4",
        view_value: "Atividade 4",
    },
    FilterOption {
        value: "5",
        view_value: "Atividade 5",
    },
    FilterOption {
        value: "6",
        view_value: "Atividade 6",
    },
    FilterOption {
        value: "7",
        view_value: "Atividade 7",
    },
];

/// What the user picked in the search form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSelection {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl FilterSelection {
    /// A search needs at least one of phase/activity
    pub fn has_filter(&self) -> bool {
        !self.phase.trim().is_empty() || !self.activity.trim().is_empty()
    }

    /// Dated only when both ends of the range are set
    pub fn window(&self) -> QueryWindow {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => QueryWindow::Dated { start, end },
            _ => QueryWindow::Unbounded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryWindow {
    Unbounded,
    Dated { start: NaiveDate, end: NaiveDate },
}

impl QueryWindow {
    pub fn is_dated(&self) -> bool {
        matches!(self, QueryWindow::Dated { .. })
    }
}

/// Question record as returned by the backend, kept opaque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(pub serde_json::Value);

/// Aggregate counts over a search; empty object when unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticsSummary(pub serde_json::Map<String, serde_json::Value>);

impl StatisticsSummary {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Progress of one query slot (list or statistics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Idle,
    Pending,
    Loaded,
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Rejected,
    Searching,
    Success,
    Empty,
    Error,
}

/// View-model the form renders from.
///
/// The list and statistics queries each own an error slot, so a late
/// statistics success can no longer wipe out a list failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    pub results: Vec<Question>,
    pub statistics: StatisticsSummary,
    pub validation_error: Option<String>,
    pub list_error: Option<String>,
    pub statistics_error: Option<String>,
    pub list_status: SlotStatus,
    pub statistics_status: SlotStatus,
    pub generation: u64,
}

impl DisplayState {
    /// Single message shown to the user: validation, then list, then statistics
    pub fn error_message(&self) -> &str {
        self.validation_error
            .as_deref()
            .or(self.list_error.as_deref())
            .or(self.statistics_error.as_deref())
            .unwrap_or("")
    }

    pub fn status(&self) -> SearchStatus {
        let slots = [self.list_status, self.statistics_status];
        if self.validation_error.is_some() {
            SearchStatus::Rejected
        } else if slots.contains(&SlotStatus::Pending) {
            SearchStatus::Searching
        } else if slots.contains(&SlotStatus::Failed) {
            SearchStatus::Error
        } else if self.list_status == SlotStatus::Empty {
            SearchStatus::Empty
        } else if self.list_status == SlotStatus::Loaded {
            SearchStatus::Success
        } else {
            SearchStatus::Idle
        }
    }

    pub fn view(&self) -> DisplayView {
        DisplayView {
            generation: self.generation,
            status: self.status(),
            results: self.results.clone(),
            statistics: self.statistics.clone(),
            error_message: self.error_message().to_string(),
            list_error: self.list_error.clone(),
            statistics_error: self.statistics_error.clone(),
        }
    }
}

/// Serializable snapshot of the display state
#[derive(Debug, Serialize)]
pub struct DisplayView {
    pub generation: u64,
    pub status: SearchStatus,
    pub results: Vec<Question>,
    pub statistics: StatisticsSummary,
    pub error_message: String,
    pub list_error: Option<String>,
    pub statistics_error: Option<String>,
}

/// API Response
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}
