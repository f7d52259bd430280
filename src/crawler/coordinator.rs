//! Crawler coordinator - main crawl orchestration logic
//!
//! Runs the request/callback cycle of a [`Spider`]:
//! - Submitting requests, dropping those outside the allowed domains
//! - Fetching on tokio tasks bounded by the [`Scheduler`]
//! - Routing responses back to the spider and its outputs to handlers
//! - Tracking every bill and detail page in [`CrawlProgress`], requesting each
//!   bill page at most once

use crate::bill::PageRecord;
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_with_retry, FetchResult, RetryPolicy};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::spider::{Request, RequestMeta, Response, Spider, SpiderOutput};
use crate::output::{OutputHandler, PageFailure};
use crate::state::{CrawlProgress, PageState};
use crate::storage::RunStatus;
use crate::url::is_allowed_domain;
use crate::{ConfigError, LikmsError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Counters describing one finished crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlReport {
    /// Listing pages fetched and parsed
    pub listing_pages: u64,
    /// Distinct bills extracted from the listing
    pub bills_discovered: u64,
    /// Distinct bills with at least one detail request sent
    pub bills_dispatched: u64,
    pub pages_dispatched: u64,
    /// Page requests skipped because the same bill page was already requested
    pub duplicates_skipped: u64,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    /// Listing rows whose id pair could not be extracted
    pub extraction_errors: u64,
    /// Requests dropped for targeting a host outside the allowed domains
    pub offsite_dropped: u64,
    /// Bills with at least one failed page, sorted
    pub incomplete_bills: Vec<String>,
    pub duration: Duration,
}

impl CrawlReport {
    /// Share of finished detail pages that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        let finished = self.pages_fetched + self.pages_failed;
        if finished == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / finished as f64) * 100.0
    }
}

/// What a fetch task hands back to the coordinator
struct Fetched {
    request: Request,
    result: FetchResult,
    attempts: u32,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Spider> {
    spider: S,
    client: Client,
    scheduler: Scheduler,
    retry: RetryPolicy,
    outputs: Vec<Box<dyn OutputHandler>>,
    progress: CrawlProgress,
    report: CrawlReport,
}

impl<S: Spider> Coordinator<S> {
    pub fn new(config: &Config, spider: S, outputs: Vec<Box<dyn OutputHandler>>) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;

        Ok(Self {
            spider,
            client,
            scheduler: Scheduler::from_config(&config.crawler),
            retry: RetryPolicy::from_config(&config.crawler),
            outputs,
            progress: CrawlProgress::new(),
            report: CrawlReport::default(),
        })
    }

    /// Runs the crawl to completion and finalizes every output handler
    ///
    /// Handlers are finalized with `Failed` if the crawl aborted; the abort
    /// error is returned in that case.
    pub async fn run(mut self) -> Result<CrawlReport> {
        tracing::info!("Starting spider '{}'", self.spider.name());
        let start_time = Instant::now();

        let outcome = self.crawl().await;
        let status = if outcome.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        let finalized = self.finalize(status);

        if let Err(e) = outcome {
            if let Err(finalize_error) = finalized {
                tracing::error!("Failed to finalize outputs: {}", finalize_error);
            }
            return Err(e);
        }
        finalized?;

        self.report.bills_discovered = self.progress.bill_count() as u64;
        self.report.bills_dispatched = self.progress.dispatched_bill_count() as u64;
        self.report.incomplete_bills = self
            .progress
            .incomplete_bills()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.report.duration = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} pages fetched, {} failed, {} extraction errors in {:?}",
            self.report.pages_fetched,
            self.report.pages_failed,
            self.report.extraction_errors,
            self.report.duration
        );

        Ok(self.report)
    }

    async fn crawl(&mut self) -> Result<()> {
        let mut tasks = JoinSet::new();

        for request in self.spider.start_requests()? {
            self.submit(&mut tasks, request)?;
        }

        while let Some(joined) = tasks.join_next().await {
            let fetched = joined?;
            self.handle(&mut tasks, fetched)?;
        }

        debug_assert!(self.progress.is_finished());
        Ok(())
    }

    fn submit(&mut self, tasks: &mut JoinSet<Fetched>, request: Request) -> Result<()> {
        if !is_allowed_domain(&request.url, self.spider.allowed_domains()) {
            if request.meta == RequestMeta::Listing {
                return Err(ConfigError::Validation(format!(
                    "listing URL {} is outside the allowed domains",
                    request.url
                ))
                .into());
            }
            tracing::warn!("Dropping offsite request to {}", request.url);
            self.report.offsite_dropped += 1;
            return Ok(());
        }

        if let RequestMeta::Page(meta) = &request.meta {
            if self.progress.is_dispatched(meta) {
                tracing::warn!(
                    "Skipping repeated request for {} page of bill {}: {}",
                    meta.pagetype,
                    meta.bill_id,
                    request.url
                );
                self.report.duplicates_skipped += 1;
                return Ok(());
            }
            self.progress.dispatch(meta)?;
            self.report.pages_dispatched += 1;
        }

        tracing::debug!("Queueing {}", request.url);
        let client = self.client.clone();
        let scheduler = self.scheduler.clone();
        let retry = self.retry;

        tasks.spawn(async move {
            let Some(_permit) = scheduler.acquire().await else {
                return Fetched {
                    request,
                    result: FetchResult::NetworkError {
                        error: "Scheduler closed".to_string(),
                        retryable: false,
                    },
                    attempts: 0,
                };
            };
            let (result, attempts) =
                fetch_with_retry(&client, &request.url, &request.headers, retry).await;
            Fetched {
                request,
                result,
                attempts,
            }
        });

        Ok(())
    }

    fn handle(&mut self, tasks: &mut JoinSet<Fetched>, fetched: Fetched) -> Result<()> {
        let Fetched {
            request,
            result,
            attempts,
        } = fetched;

        let (final_url, status, body) = match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => (final_url, status_code, body),
            failed => return self.handle_failure(request, &failed, attempts),
        };

        match &request.meta {
            RequestMeta::Listing => self.report.listing_pages += 1,
            RequestMeta::Page(meta) => {
                self.progress.complete(meta, PageState::Fetched)?;
                self.report.pages_fetched += 1;
                if self.report.pages_fetched % 50 == 0 {
                    tracing::info!(
                        "Progress: {} pages fetched, {} failed, {} in flight",
                        self.report.pages_fetched,
                        self.report.pages_failed,
                        tasks.len()
                    );
                }
            }
        }

        let response = Response {
            url: final_url,
            status,
            body,
            meta: request.meta,
        };

        for output in self.spider.parse(response) {
            match output {
                Ok(SpiderOutput::Bill(bill)) => {
                    if self.progress.bill(&bill.bill_id).is_some() {
                        tracing::warn!("Bill {} is listed more than once", bill.bill_id);
                    }
                    self.progress.discover(&bill.bill_id);
                }
                Ok(SpiderOutput::Request(next)) => self.submit(tasks, next)?,
                Ok(SpiderOutput::Record(record)) => self.emit(&record)?,
                Err(LikmsError::Extraction(e)) => {
                    tracing::error!("Skipping listing row: {}", e);
                    self.report.extraction_errors += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    fn handle_failure(&mut self, request: Request, result: &FetchResult, attempts: u32) -> Result<()> {
        let message = result
            .failure_message()
            .unwrap_or_else(|| "unknown error".to_string());

        let meta = match request.meta {
            RequestMeta::Listing => {
                return Err(LikmsError::Fetch {
                    url: request.url.to_string(),
                    message,
                });
            }
            RequestMeta::Page(meta) => meta,
        };

        tracing::warn!(
            "Giving up on {} page of bill {} after {} attempt(s): {}",
            meta.pagetype,
            meta.bill_id,
            attempts,
            message
        );
        self.progress.complete(&meta, PageState::Failed)?;
        self.report.pages_failed += 1;

        let failure = PageFailure {
            bill_id: meta.bill_id,
            pagetype: meta.pagetype,
            url: request.url.to_string(),
            message,
            attempts,
        };
        for output in &mut self.outputs {
            output.record_failure(&failure)?;
        }
        Ok(())
    }

    fn emit(&mut self, record: &PageRecord) -> Result<()> {
        for output in &mut self.outputs {
            output.record_page(record)?;
        }
        Ok(())
    }

    /// Finalizes every handler, returning the first error
    fn finalize(&mut self, status: RunStatus) -> Result<()> {
        let mut first_error = None;
        for output in &mut self.outputs {
            if let Err(e) = output.finalize(status) {
                tracing::error!("Output '{}' failed to finalize: {}", output.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::{BillReference, PageMeta, PageType};
    use crate::config::{CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig, UserAgentConfig};
    use crate::output::OutputResult;
    use reqwest::header::HeaderMap;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                max_concurrent_requests: 4,
                request_delay: 0,
                max_retries: 1,
                retry_delay: 10,
                request_timeout: 5,
                page_size: 150,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            site: SiteConfig::default(),
            selectors: SelectorConfig::default(),
            output: OutputConfig::default(),
            rules: BTreeMap::new(),
        }
    }

    /// Start page yields fixed bills, then fixed page requests
    struct StubSpider {
        start: Url,
        bills: Vec<BillReference>,
        pages: Vec<(Url, PageMeta)>,
        allowed: Vec<String>,
    }

    impl Spider for StubSpider {
        fn name(&self) -> &str {
            "stub"
        }

        fn allowed_domains(&self) -> &[String] {
            &self.allowed
        }

        fn start_requests(&self) -> Result<Vec<Request>> {
            Ok(vec![Request {
                url: self.start.clone(),
                headers: HeaderMap::new(),
                meta: RequestMeta::Listing,
            }])
        }

        fn parse(&self, response: Response) -> Vec<Result<SpiderOutput>> {
            match response.meta {
                RequestMeta::Listing => self
                    .bills
                    .iter()
                    .map(|bill| Ok(SpiderOutput::Bill(bill.clone())))
                    .chain(self.pages.iter().map(|(url, meta)| {
                        Ok(SpiderOutput::Request(Request {
                            url: url.clone(),
                            headers: HeaderMap::new(),
                            meta: RequestMeta::Page(meta.clone()),
                        }))
                    }))
                    .collect(),
                RequestMeta::Page(meta) => vec![Ok(SpiderOutput::Record(PageRecord {
                    bill_id: meta.bill_id,
                    pagetype: meta.pagetype,
                    body: response.body,
                }))],
            }
        }
    }

    #[derive(Default)]
    struct Recorded {
        pages: Vec<PageRecord>,
        failures: Vec<PageFailure>,
        status: Option<RunStatus>,
    }

    struct MemoryOutput(Arc<Mutex<Recorded>>);

    impl OutputHandler for MemoryOutput {
        fn name(&self) -> &str {
            "memory"
        }

        fn record_page(&mut self, record: &PageRecord) -> OutputResult<()> {
            self.0.lock().unwrap().pages.push(record.clone());
            Ok(())
        }

        fn record_failure(&mut self, failure: &PageFailure) -> OutputResult<()> {
            self.0.lock().unwrap().failures.push(failure.clone());
            Ok(())
        }

        fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
            self.0.lock().unwrap().status = Some(status);
            Ok(())
        }
    }

    fn meta(bill_id: &str, pagetype: PageType) -> PageMeta {
        PageMeta {
            bill_id: bill_id.to_string(),
            pagetype,
        }
    }

    #[test]
    fn test_success_rate() {
        let report = CrawlReport {
            pages_fetched: 3,
            pages_failed: 1,
            ..Default::default()
        };
        assert!((report.success_rate() - 75.0).abs() < 0.01);
        assert_eq!(CrawlReport::default().success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_pages_failures_and_offsite() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("list"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let spider = StubSpider {
            start: base.join("/list").unwrap(),
            bills: vec![],
            pages: vec![
                (base.join("/ok").unwrap(), meta("1", PageType::Spec)),
                (base.join("/broken").unwrap(), meta("1", PageType::Summary)),
                (base.join("/gone").unwrap(), meta("2", PageType::Spec)),
                (
                    Url::parse("http://elsewhere.example/x").unwrap(),
                    meta("2", PageType::Summary),
                ),
            ],
            allowed: vec!["127.0.0.1".to_string()],
        };

        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let outputs: Vec<Box<dyn OutputHandler>> = vec![Box::new(MemoryOutput(recorded.clone()))];
        let coordinator = Coordinator::new(&create_test_config(), spider, outputs).unwrap();
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.listing_pages, 1);
        assert_eq!(report.pages_dispatched, 3);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.pages_failed, 2);
        assert_eq!(report.offsite_dropped, 1);
        assert_eq!(report.bills_dispatched, 2);
        assert_eq!(report.duplicates_skipped, 0);
        assert_eq!(report.incomplete_bills, vec!["1".to_string(), "2".to_string()]);

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.pages.len(), 1);
        assert_eq!(recorded.pages[0].body, b"ok");
        assert_eq!(recorded.failures.len(), 2);
        let broken = recorded
            .failures
            .iter()
            .find(|f| f.pagetype == PageType::Summary)
            .unwrap();
        assert_eq!(broken.attempts, 2);
        assert_eq!(broken.message, "HTTP 503");
        assert_eq!(recorded.status, Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let spider = StubSpider {
            start: base.join("/list").unwrap(),
            bills: vec![],
            pages: vec![],
            allowed: vec!["127.0.0.1".to_string()],
        };
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let outputs: Vec<Box<dyn OutputHandler>> = vec![Box::new(MemoryOutput(recorded.clone()))];
        let coordinator = Coordinator::new(&create_test_config(), spider, outputs).unwrap();

        let result = coordinator.run().await;
        assert!(matches!(result, Err(LikmsError::Fetch { .. })));
        assert_eq!(recorded.lock().unwrap().status, Some(RunStatus::Failed));
    }

    #[tokio::test]
    async fn test_repeated_bill_pages_fetched_once() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("list"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/spec"))
            .respond_with(ResponseTemplate::new(200).set_body_string("spec"))
            .expect(1)
            .mount(&server)
            .await;

        let spec = base.join("/spec").unwrap();
        let spider = StubSpider {
            start: base.join("/list").unwrap(),
            bills: vec![
                BillReference::new("1", "A"),
                BillReference::new("2", "B"),
                BillReference::new("1", "A"),
            ],
            pages: vec![
                (spec.clone(), meta("1", PageType::Spec)),
                (spec, meta("1", PageType::Spec)),
            ],
            allowed: vec!["127.0.0.1".to_string()],
        };

        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let outputs: Vec<Box<dyn OutputHandler>> = vec![Box::new(MemoryOutput(recorded.clone()))];
        let coordinator = Coordinator::new(&create_test_config(), spider, outputs).unwrap();
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.bills_discovered, 2);
        assert_eq!(report.bills_dispatched, 1);
        assert_eq!(report.pages_dispatched, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(report.pages_fetched, 1);

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.pages.len(), 1);
        assert_eq!(recorded.status, Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_offsite_listing_is_fatal() {
        let spider = StubSpider {
            start: Url::parse("http://elsewhere.example/list").unwrap(),
            bills: vec![],
            pages: vec![],
            allowed: vec!["127.0.0.1".to_string()],
        };
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let outputs: Vec<Box<dyn OutputHandler>> = vec![Box::new(MemoryOutput(recorded.clone()))];
        let coordinator = Coordinator::new(&create_test_config(), spider, outputs).unwrap();

        let result = coordinator.run().await;
        assert!(matches!(
            result,
            Err(LikmsError::Config(ConfigError::Validation(_)))
        ));
        assert_eq!(recorded.lock().unwrap().status, Some(RunStatus::Failed));
    }
}
