//! Per-bill progress through the fan-out
//!
//! `Discovered -> Dispatched(4 pending) -> each page Fetched | Failed`.
//! Pages are independent; a bill is finished once none is pending, whether
//! or not every page succeeded.

use crate::bill::{PageMeta, PageType};
use crate::state::PageState;
use crate::LikmsError;
use std::collections::{BTreeMap, HashMap};

/// Coarse stage of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillStage {
    /// Seen on the listing, no page requested yet
    Discovered,
    /// At least one page still in flight
    Dispatched { pending: usize },
    /// Every dispatched page reached a terminal state
    Finished,
}

/// Page states of a single bill
#[derive(Debug, Clone, Default)]
pub struct BillProgress {
    pages: BTreeMap<PageType, PageState>,
}

impl BillProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, pagetype: PageType) -> Option<PageState> {
        self.pages.get(&pagetype).copied()
    }

    pub fn stage(&self) -> BillStage {
        if self.pages.is_empty() {
            return BillStage::Discovered;
        }
        match self.count(PageState::Pending) {
            0 => BillStage::Finished,
            pending => BillStage::Dispatched { pending },
        }
    }

    pub fn count(&self, state: PageState) -> usize {
        self.pages.values().filter(|s| **s == state).count()
    }

    /// Moves a page from "not requested" (`None`) or `Pending` to `to`
    fn transition(&mut self, pagetype: PageType, to: PageState) -> Result<(), Option<PageState>> {
        let from = self.state(pagetype);
        let allowed = match (from, to) {
            (None, PageState::Pending) => true,
            (Some(PageState::Pending), to) => to.is_terminal(),
            _ => false,
        };

        if !allowed {
            return Err(from);
        }

        self.pages.insert(pagetype, to);
        Ok(())
    }
}

/// Progress of every bill seen during one crawl run
#[derive(Debug, Default)]
pub struct CrawlProgress {
    bills: HashMap<String, BillProgress>,
}

impl CrawlProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bill; a no-op if it is already known
    pub fn discover(&mut self, bill_id: &str) {
        self.bills.entry(bill_id.to_string()).or_default();
    }

    /// True once the page has been requested, whatever its current state
    pub fn is_dispatched(&self, meta: &PageMeta) -> bool {
        self.bills
            .get(&meta.bill_id)
            .is_some_and(|bill| bill.state(meta.pagetype).is_some())
    }

    /// Marks a page as requested
    pub fn dispatch(&mut self, meta: &PageMeta) -> Result<(), LikmsError> {
        self.transition(meta, PageState::Pending)
    }

    /// Marks a requested page as `Fetched` or `Failed`
    pub fn complete(&mut self, meta: &PageMeta, state: PageState) -> Result<(), LikmsError> {
        self.transition(meta, state)
    }

    fn transition(&mut self, meta: &PageMeta, to: PageState) -> Result<(), LikmsError> {
        self.bills
            .entry(meta.bill_id.clone())
            .or_default()
            .transition(meta.pagetype, to)
            .map_err(|from| LikmsError::InvalidTransition {
                bill_id: meta.bill_id.clone(),
                pagetype: meta.pagetype,
                from,
                to,
            })
    }

    pub fn bill(&self, bill_id: &str) -> Option<&BillProgress> {
        self.bills.get(bill_id)
    }

    pub fn bill_count(&self) -> usize {
        self.bills.len()
    }

    /// Bills past [`BillStage::Discovered`]
    pub fn dispatched_bill_count(&self) -> usize {
        self.bills
            .values()
            .filter(|b| b.stage() != BillStage::Discovered)
            .count()
    }

    /// Number of pages in `state` across all bills
    pub fn page_count(&self, state: PageState) -> usize {
        self.bills.values().map(|b| b.count(state)).sum()
    }

    /// Bills with at least one page that failed
    pub fn incomplete_bills(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .bills
            .iter()
            .filter(|(_, progress)| progress.count(PageState::Failed) > 0)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_finished(&self) -> bool {
        self.bills
            .values()
            .all(|b| !matches!(b.stage(), BillStage::Dispatched { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(bill_id: &str, pagetype: PageType) -> PageMeta {
        PageMeta {
            bill_id: bill_id.to_string(),
            pagetype,
        }
    }

    #[test]
    fn test_bill_lifecycle() {
        let mut progress = CrawlProgress::new();
        progress.discover("2100123");
        assert_eq!(
            progress.bill("2100123").unwrap().stage(),
            BillStage::Discovered
        );

        for pagetype in PageType::ALL {
            progress.dispatch(&meta("2100123", pagetype)).unwrap();
        }
        assert_eq!(
            progress.bill("2100123").unwrap().stage(),
            BillStage::Dispatched { pending: 4 }
        );
        assert!(!progress.is_finished());

        progress
            .complete(&meta("2100123", PageType::Spec), PageState::Fetched)
            .unwrap();
        progress
            .complete(&meta("2100123", PageType::Summary), PageState::Failed)
            .unwrap();
        assert_eq!(
            progress.bill("2100123").unwrap().stage(),
            BillStage::Dispatched { pending: 2 }
        );

        progress
            .complete(&meta("2100123", PageType::Proposers), PageState::Fetched)
            .unwrap();
        progress
            .complete(&meta("2100123", PageType::Withdrawers), PageState::Fetched)
            .unwrap();

        let bill = progress.bill("2100123").unwrap();
        assert_eq!(bill.stage(), BillStage::Finished);
        assert_eq!(bill.count(PageState::Fetched), 3);
        assert_eq!(bill.count(PageState::Failed), 1);
        assert!(progress.is_finished());
        assert_eq!(progress.incomplete_bills(), vec!["2100123"]);
    }

    #[test]
    fn test_complete_without_dispatch_rejected() {
        let mut progress = CrawlProgress::new();
        let result = progress.complete(&meta("1", PageType::Spec), PageState::Fetched);
        assert!(matches!(
            result,
            Err(LikmsError::InvalidTransition { from: None, .. })
        ));
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut progress = CrawlProgress::new();
        let m = meta("1", PageType::Spec);
        progress.dispatch(&m).unwrap();
        progress.complete(&m, PageState::Failed).unwrap();

        assert!(progress.complete(&m, PageState::Fetched).is_err());
        assert!(progress.dispatch(&m).is_err());
    }

    #[test]
    fn test_double_dispatch_rejected() {
        let mut progress = CrawlProgress::new();
        let m = meta("1", PageType::Summary);
        progress.dispatch(&m).unwrap();
        assert!(matches!(
            progress.dispatch(&m),
            Err(LikmsError::InvalidTransition {
                from: Some(PageState::Pending),
                ..
            })
        ));
    }

    #[test]
    fn test_discovered_bill_without_pages() {
        let mut progress = CrawlProgress::new();
        progress.discover("1");
        progress.discover("2");
        progress.discover("1");
        progress.dispatch(&meta("2", PageType::Spec)).unwrap();

        assert_eq!(progress.bill_count(), 2);
        assert_eq!(progress.dispatched_bill_count(), 1);
        assert!(!progress.is_dispatched(&meta("1", PageType::Spec)));
        assert!(progress.is_dispatched(&meta("2", PageType::Spec)));
        assert!(!progress.is_dispatched(&meta("2", PageType::Summary)));

        progress
            .complete(&meta("2", PageType::Spec), PageState::Fetched)
            .unwrap();
        assert!(progress.is_dispatched(&meta("2", PageType::Spec)));
        assert!(progress.is_finished());
    }

    #[test]
    fn test_counts_across_bills() {
        let mut progress = CrawlProgress::new();
        for bill in ["1", "2"] {
            for pagetype in PageType::ALL {
                let m = meta(bill, pagetype);
                progress.dispatch(&m).unwrap();
                progress.complete(&m, PageState::Fetched).unwrap();
            }
        }
        assert_eq!(progress.bill_count(), 2);
        assert_eq!(progress.page_count(PageState::Fetched), 8);
        assert_eq!(progress.page_count(PageState::Pending), 0);
        assert!(progress.incomplete_bills().is_empty());
    }
}
