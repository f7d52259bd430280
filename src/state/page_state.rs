/// Page state definitions for tracking crawl progress
use std::fmt;

/// Represents the state of one detail page of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Request dispatched, response not yet seen
    Pending,

    /// Response received and recorded
    Fetched,

    /// Fetch gave up (HTTP error, retries exhausted, network failure)
    Failed,
}

impl PageState {
    /// Returns true if no further processing is expected
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Converts the page state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }

    /// Parses a page state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> [Self; 3] {
        [Self::Pending, Self::Fetched, Self::Failed]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
