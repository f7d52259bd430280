//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::PageState;
use crate::storage::{RunRecord, Storage};
use crate::LikmsError;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of page rows across all runs
    pub total_pages: u64,

    /// Count of pages by state
    pub pages_by_state: HashMap<PageState, u64>,

    /// Number of distinct bills
    pub total_bills: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Share of stored pages that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.count(PageState::Fetched) as f64 / self.total_pages as f64) * 100.0
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, LikmsError> {
    let total_pages = storage.count_total_pages()?;
    let total_bills = storage.count_bills()?;

    let mut pages_by_state = HashMap::new();
    for state in PageState::all_states() {
        let count = storage.count_pages_by_state(state)?;
        if count > 0 {
            pages_by_state.insert(state, count);
        }
    }

    let latest_run = storage.get_latest_run()?;

    Ok(CrawlStatistics {
        total_pages,
        pages_by_state,
        total_bills,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Bills: {}", stats.total_bills);
    println!("  Pages stored: {}", stats.total_pages);
    println!();

    println!("Pages by State:");
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Since: {}", run.since_date);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        stats.success_rate(),
        stats.count(PageState::Fetched),
        stats.total_pages
    );
}
