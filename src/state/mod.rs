//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: state of one detail page (pending, fetched, failed)
//! - `BillProgress`: the four page states of a bill
//! - `CrawlProgress`: every bill seen during a run

mod bill_state;
mod page_state;

// Re-export main types
pub use bill_state::{BillProgress, BillStage, CrawlProgress};
pub use page_state::PageState;
