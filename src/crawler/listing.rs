//! Listing page parser
//!
//! Each data row of the new-bill listing has exactly eight cells: the bill
//! number in the first, and in the second an anchor whose href embeds the
//! internal link id as its third word token, e.g.
//! `javascript:GoDetail('PRC_L1A2B3')` -> `PRC_L1A2B3`.

use crate::bill::BillReference;
use crate::crawler::document::{attr_of, text_of, Document, Row, RowRule};
use crate::ExtractionError;
use regex::Regex;
use std::sync::LazyLock;

/// Cell count of a data row; any other count marks a header or footer row
pub const LISTING_COLUMNS: usize = 8;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("invalid regex: word token"));

/// Extracts bill references from a listing page
///
/// Lazily walks the rows selected by `rule`. Rows without exactly
/// [`LISTING_COLUMNS`] cells yield nothing; a data row whose id pair cannot be
/// extracted yields an [`ExtractionError`] and the walk continues.
pub fn bill_references<'a>(
    document: &'a Document,
    rule: &'a RowRule,
) -> impl Iterator<Item = Result<BillReference, ExtractionError>> + 'a {
    document
        .select_rows(rule)
        .enumerate()
        .filter(|(_, row)| row.len() == LISTING_COLUMNS)
        .map(move |(index, row)| parse_row(index, &row, rule))
}

/// Extracts the id pair from a row's first two cells
fn parse_row(index: usize, row: &Row<'_>, rule: &RowRule) -> Result<BillReference, ExtractionError> {
    let cells = row.cells();

    let bill_id = cells.first().map(|cell| text_of(*cell)).unwrap_or_default();
    if bill_id.is_empty() {
        return Err(ExtractionError::EmptyBillId { row: index });
    }

    let href = cells
        .get(1)
        .and_then(|cell| attr_of(*cell, rule.link(), "href"))
        .ok_or(ExtractionError::MissingLink { row: index })?;

    let link_id = link_id_from_href(&href)
        .ok_or_else(|| ExtractionError::MalformedHref {
            row: index,
            href: href.clone(),
        })?
        .to_string();

    Ok(BillReference { bill_id, link_id })
}

/// Third word token of an href, if there is one
pub fn link_id_from_href(href: &str) -> Option<&str> {
    WORD_RE.find_iter(href).nth(2).map(|m| m.as_str())
}
