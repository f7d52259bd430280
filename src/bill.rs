//! Bill data model
//!
//! A listing row yields a [`BillReference`], which fans out into one
//! [`PageRequest`] per [`PageType`]; each fetched page becomes a [`PageRecord`].

use std::fmt;
use std::str::FromStr;

/// A (bill id, link id) pair extracted from one listing row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BillReference {
    /// Public bill number shown in the listing
    pub bill_id: String,

    /// Internal tracking token used to build detail page URLs
    pub link_id: String,
}

impl BillReference {
    pub fn new(bill_id: impl Into<String>, link_id: impl Into<String>) -> Self {
        Self {
            bill_id: bill_id.into(),
            link_id: link_id.into(),
        }
    }
}

/// The four detail pages fetched for every bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageType {
    Spec,
    Summary,
    Proposers,
    Withdrawers,
}

impl PageType {
    /// Every page type, in dispatch order
    pub const ALL: [PageType; 4] = [
        PageType::Spec,
        PageType::Summary,
        PageType::Proposers,
        PageType::Withdrawers,
    ];

    /// Short name used in output paths and the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Summary => "summary",
            Self::Proposers => "proposers",
            Self::Withdrawers => "withdrawers",
        }
    }

    /// Name of the URL rule that builds this page's address
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Spec => "bill-spec",
            Self::Summary => "bill-summary",
            Self::Proposers => "bill-proposers",
            Self::Withdrawers => "bill-withdrawers",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.operation() == s)
            .ok_or_else(|| format!("unknown page type '{}'", s))
    }
}

/// A detail page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub bill_id: String,
    pub link_id: String,
    pub pagetype: PageType,
}

impl PageRequest {
    /// The metadata that travels with the request and comes back with its response
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            bill_id: self.bill_id.clone(),
            pagetype: self.pagetype,
        }
    }
}

/// Per-request metadata threaded from dispatch to the response handler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageMeta {
    pub bill_id: String,
    pub pagetype: PageType,
}

/// A fetched detail page, ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub bill_id: String,
    pub pagetype: PageType,
    pub body: Vec<u8>,
}
