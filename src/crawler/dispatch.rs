//! Fan-out from bills to detail pages

use crate::bill::{BillReference, PageMeta, PageRecord, PageRequest, PageType};

pub fn page_request(bill: &BillReference, pagetype: PageType) -> PageRequest {
    PageRequest {
        bill_id: bill.bill_id.clone(),
        link_id: bill.link_id.clone(),
        pagetype,
    }
}

/// One request per page type, in [`PageType::ALL`] order
pub fn requests_for_bill(bill: &BillReference) -> impl Iterator<Item = PageRequest> {
    let bill = bill.clone();
    PageType::ALL
        .into_iter()
        .map(move |pagetype| page_request(&bill, pagetype))
}

/// Lazily flattens the fan-out of every bill
pub fn requests_for_bills<I>(bills: I) -> impl Iterator<Item = PageRequest>
where
    I: IntoIterator<Item = BillReference>,
{
    bills.into_iter().flat_map(|bill| requests_for_bill(&bill))
}

/// Wraps a detail page body with the metadata its request carried
pub fn record_from_response(meta: PageMeta, body: Vec<u8>) -> PageRecord {
    PageRecord {
        bill_id: meta.bill_id,
        pagetype: meta.pagetype,
        body,
    }
}
