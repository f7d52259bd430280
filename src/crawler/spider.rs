//! Spider abstraction and the new-bill spider
//!
//! A spider only turns responses into more requests and records. The
//! coordinator owns all I/O and routes each response back through
//! [`Spider::parse`] with the [`RequestMeta`] its request carried.

use crate::bill::{BillReference, PageMeta, PageRecord, PageRequest};
use crate::config::Config;
use crate::crawler::dispatch::{record_from_response, requests_for_bills};
use crate::crawler::document::{Document, RowRule};
use crate::crawler::listing::bill_references;
use crate::rules::{RuleRegistry, NEW_BILL_LIST};
use crate::{ConfigError, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use url::Url;

/// Selects the callback a response is routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMeta {
    Listing,
    Page(PageMeta),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub headers: HeaderMap,
    pub meta: RequestMeta,
}

#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    pub body: Vec<u8>,
    pub meta: RequestMeta,
}

#[derive(Debug)]
pub enum SpiderOutput {
    /// A bill found on a listing; precedes the requests for its pages
    Bill(BillReference),
    Request(Request),
    Record(PageRecord),
}

pub trait Spider: Send + Sync {
    fn name(&self) -> &str;

    /// Host patterns requests may target; anything else is dropped
    fn allowed_domains(&self) -> &[String];

    fn start_requests(&self) -> Result<Vec<Request>>;

    /// Handles one successful response
    ///
    /// Each item is independent: an error for one row never hides the
    /// outputs of the others.
    fn parse(&self, response: Response) -> Vec<Result<SpiderOutput>>;
}

/// Crawls bills filed since a given date
pub struct NewBillSpider {
    rules: RuleRegistry,
    row_rule: RowRule,
    allowed_domains: Vec<String>,
    headers: HeaderMap,
    since: NaiveDate,
    page_size: u32,
}

impl NewBillSpider {
    pub const NAME: &'static str = "new-bills";

    /// Builds the spider; `since` defaults to today's local date
    pub fn new(config: &Config, since: Option<NaiveDate>) -> Result<Self> {
        let referer = HeaderValue::from_str(config.site.referer()).map_err(|e| {
            ConfigError::InvalidUrl(format!("referer '{}': {}", config.site.referer(), e))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, referer);

        Ok(Self {
            rules: RuleRegistry::from_config(config)?,
            row_rule: RowRule::from_config(&config.selectors)?,
            allowed_domains: config.site.allowed_domains.clone(),
            headers,
            since: since.unwrap_or_else(|| chrono::Local::now().date_naive()),
            page_size: config.crawler.page_size,
        })
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// The request for the listing of bills filed since [`Self::since`]
    pub fn listing_request(&self) -> Result<Request> {
        let date_since = self.since.format("%Y-%m-%d").to_string();
        let size = self.page_size.to_string();
        let url = self.rules.url(
            NEW_BILL_LIST,
            &[("date_since", date_since.as_str()), ("size", size.as_str())],
        )?;

        Ok(Request {
            url,
            headers: self.headers.clone(),
            meta: RequestMeta::Listing,
        })
    }

    /// The request for one detail page of a bill
    pub fn bill_page_request(&self, page: &PageRequest) -> Result<Request> {
        let url = self
            .rules
            .url(page.pagetype.operation(), &[("link_id", page.link_id.as_str())])?;

        Ok(Request {
            url,
            headers: self.headers.clone(),
            meta: RequestMeta::Page(page.meta()),
        })
    }

    /// Listing callback
    ///
    /// Yields an error for every row whose id pair cannot be extracted, then
    /// every extracted bill, then four page requests per bill.
    fn parse_new_bills(&self, response: &Response) -> Vec<Result<SpiderOutput>> {
        let document = Document::parse(&response.body);
        let mut outputs = Vec::new();
        let mut bills = Vec::new();

        for reference in bill_references(&document, &self.row_rule) {
            match reference {
                Ok(bill) => bills.push(bill),
                Err(e) => outputs.push(Err(e.into())),
            }
        }

        outputs.extend(bills.iter().cloned().map(|bill| Ok(SpiderOutput::Bill(bill))));
        outputs.extend(
            requests_for_bills(bills)
                .map(|page| self.bill_page_request(&page).map(SpiderOutput::Request)),
        );

        tracing::debug!(
            "Listing {} produced {} outputs",
            response.url,
            outputs.len()
        );
        outputs
    }

    /// Detail callback: exactly one record
    fn parse_bill_page(meta: PageMeta, response: Response) -> SpiderOutput {
        SpiderOutput::Record(record_from_response(meta, response.body))
    }
}

impl Spider for NewBillSpider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    fn start_requests(&self) -> Result<Vec<Request>> {
        Ok(vec![self.listing_request()?])
    }

    fn parse(&self, response: Response) -> Vec<Result<SpiderOutput>> {
        match response.meta.clone() {
            RequestMeta::Listing => self.parse_new_bills(&response),
            RequestMeta::Page(meta) => vec![Ok(Self::parse_bill_page(meta, response))],
        }
    }
}
