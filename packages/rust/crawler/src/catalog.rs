//! Paginated catalog traversal for one expansion.
//!
//! The crawl is strictly sequential: release date, page count, then every
//! listing page from 1 to the page count, with a randomized pause before each
//! fetch. Any missing row element aborts the whole crawl.

use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use scraper::ElementRef;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cardtrack_shared::{CardtrackError, CrawlConfig, Record, Result};

use crate::page::{self, Page};
use crate::session::{PageSource, Session};
use crate::throttle::Throttle;

/// Trailing run of digits, once `+` and whitespace are removed.
static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("static regex"));

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// CSS selectors locating catalog data. The page structure is assumed stable;
/// a layout change on the site is handled by editing these.
#[derive(Debug, Clone)]
pub struct CatalogSelectors {
    /// Release date on the expansion's set-info page.
    pub release_date: String,
    /// Page-count indicator on the listing page.
    pub page_count: String,
    /// One element per product row.
    pub product_row: String,
    /// Links inside a row; the second one carries the name and detail URL.
    pub row_link: String,
    pub min_price: String,
    pub availability: String,
    /// Graphical rarity indicator; the rarity is its `aria-label`.
    pub rarity_icon: String,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            release_date: "body > main > div:nth-of-type(2) > div:nth-of-type(2) > div > \
                           div:nth-of-type(1) > div:nth-of-type(2)"
                .into(),
            page_count: ".mx-1".into(),
            product_row: r#"[id^="productRow"]"#.into(),
            row_link: "a".into(),
            min_price: ".col-price.pe-sm-2".into(),
            availability: ".d-none.d-md-inline".into(),
            rarity_icon: "svg".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for catalog crawls.
pub trait CrawlProgress: Send + Sync {
    /// Called once the page count is known.
    fn pages_resolved(&self, expansion: &str, pages: u32);
    /// Called after each listing page has been extracted.
    fn page_done(&self, page: u32, pages: u32, rows: usize);
}

/// No-op crawl progress.
pub struct SilentCrawlProgress;

impl CrawlProgress for SilentCrawlProgress {
    fn pages_resolved(&self, _expansion: &str, _pages: u32) {}
    fn page_done(&self, _page: u32, _pages: u32, _rows: usize) {}
}

// ---------------------------------------------------------------------------
// CatalogCrawler
// ---------------------------------------------------------------------------

/// Walks every listing page of an expansion and extracts one [`Record`] per row.
pub struct CatalogCrawler {
    config: CrawlConfig,
    selectors: CatalogSelectors,
    throttle: Throttle,
}

impl CatalogCrawler {
    pub fn new(config: CrawlConfig) -> Self {
        let throttle = Throttle::new(config.delay);
        Self {
            config,
            selectors: CatalogSelectors::default(),
            throttle,
        }
    }

    /// Override the default selectors.
    pub fn with_selectors(mut self, selectors: CatalogSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// `<base>Expansions/<expansion>#SetInfoSection`
    pub fn expansion_url(&self, expansion: &str) -> Result<Url> {
        let mut url = self.join(&format!("Expansions/{expansion}"))?;
        url.set_fragment(Some("SetInfoSection"));
        Ok(url)
    }

    /// `<base>Products/Singles/<expansion>`, with `?site=<page>` when a page is given.
    pub fn listing_url(&self, expansion: &str, page: Option<u32>) -> Result<Url> {
        let mut url = self.join(&format!("Products/Singles/{expansion}"))?;
        if let Some(page) = page {
            url.query_pairs_mut().append_pair("site", &page.to_string());
        }
        Ok(url)
    }

    /// Crawl all rows of `expansion`, in page-then-row order.
    #[instrument(skip_all, fields(expansion = %expansion))]
    pub async fn crawl<S: PageSource>(
        &self,
        session: &Session<S>,
        expansion: &str,
        progress: &dyn CrawlProgress,
    ) -> Result<Vec<Record>> {
        let start = Instant::now();

        self.throttle.pause().await;
        let release_date = {
            let page = session.page(&self.expansion_url(expansion)?).await?;
            page::text(page.find_one(&self.selectors.release_date)?)
        };
        debug!(%release_date, "release date resolved");

        self.throttle.pause().await;
        let pages = {
            let page = session.page(&self.listing_url(expansion, None)?).await?;
            self.page_count(&page)?
        };
        progress.pages_resolved(expansion, pages);
        info!(pages, "starting catalog crawl");

        let mut records = Vec::new();
        for n in 1..=pages {
            self.throttle.pause().await;
            let extracted = {
                let page = session.page(&self.listing_url(expansion, Some(n))?).await?;
                self.extract_rows(&page, expansion, &release_date)?
            };
            if extracted.is_empty() {
                warn!(page = n, "listing page has no product rows");
            }
            debug!(page = n, rows = extracted.len(), "page extracted");
            progress.page_done(n, pages, extracted.len());
            records.extend(extracted);
        }

        info!(
            pages,
            rows = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "catalog crawl completed"
        );
        Ok(records)
    }

    fn page_count(&self, page: &Page) -> Result<u32> {
        let el = page.find_one(&self.selectors.page_count).map_err(|_| {
            CardtrackError::Pagination(format!(
                "page-count indicator '{}' not found on {}",
                self.selectors.page_count,
                page.url()
            ))
        })?;
        parse_page_count(&page::text(el))
    }

    fn extract_rows(&self, page: &Page, expansion: &str, release_date: &str) -> Result<Vec<Record>> {
        page.find(&self.selectors.product_row)?
            .into_iter()
            .map(|row| self.extract_row(page, row, expansion, release_date))
            .collect()
    }

    fn extract_row(
        &self,
        page: &Page,
        row: ElementRef<'_>,
        expansion: &str,
        release_date: &str,
    ) -> Result<Record> {
        let links = page::find_in(row, &self.selectors.row_link)?;
        let link = *links.get(1).ok_or_else(|| {
            CardtrackError::extraction(format!(
                "{} has {} link(s), expected at least 2",
                page::describe(row),
                links.len()
            ))
        })?;

        let rarity_icon = page::find_one_in(row, &self.selectors.rarity_icon)?;
        let rarity = page::attribute(rarity_icon, "aria-label").ok_or_else(|| {
            CardtrackError::extraction(format!(
                "rarity icon in {} has no aria-label",
                page::describe(row)
            ))
        })?;

        Ok(Record {
            name: page::text(link),
            expansion: expansion.to_string(),
            min_price: page::text(page::find_one_in(row, &self.selectors.min_price)?),
            availability_count: page::text(page::find_one_in(row, &self.selectors.availability)?),
            rarity,
            detail_url: page.link(link, "href")?.to_string(),
            expansion_release_date: release_date.to_string(),
        })
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.config
            .catalog_base
            .join(path)
            .map_err(|e| CardtrackError::config(format!("cannot build catalog URL '{path}': {e}")))
    }
}

/// Read the page count from the indicator text, e.g. `"1 of 12"` or `"Page 1 / 15+"`.
pub fn parse_page_count(text: &str) -> Result<u32> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '+' && !c.is_whitespace())
        .collect();
    TRAILING_DIGITS
        .captures(&cleaned)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| CardtrackError::Pagination(format!("unparsable page count '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardtrack_shared::DelayRange;
    use std::time::Duration;

    fn crawler(base: &str) -> CatalogCrawler {
        CatalogCrawler::new(CrawlConfig {
            catalog_base: cardtrack_shared::parse_base_url(base).unwrap(),
            delay: DelayRange::none(),
            timeout: Duration::from_secs(5),
        })
    }

    fn row(id: u32, name: &str, price: &str, count: &str, rarity: &str) -> String {
        format!(
            r#"<div id="productRow{id}" class="row">
                <a href="/img/{id}.jpg"><img></a>
                <div class="col"><a href="/en/Pokemon/Products/Singles/Test-Set/{name}">{name}</a></div>
                <span class="icon"><svg aria-label="{rarity}"></svg></span>
                <div class="col-price pe-sm-2">{price}</div>
                <div class="col-available"><span class="d-none d-md-inline">{count}</span></div>
            </div>"#
        )
    }

    fn listing(rows: &[String], pages: &str) -> String {
        format!(
            r#"<html><body><main>
                <div class="pagination"><span class="mx-1">{pages}</span></div>
                <div class="table-body">{}</div>
            </main></body></html>"#,
            rows.join("\n")
        )
    }

    const EXPANSION_PAGE: &str = r#"<html><body><main>
        <div>header</div>
        <div>
            <div>nav</div>
            <div><div>
                <div><div>Release Date</div><div> 31 March 2023 </div></div>
            </div></div>
        </div>
    </main></body></html>"#;

    #[test]
    fn parse_page_count_variants() {
        assert_eq!(parse_page_count("1 of 12").unwrap(), 12);
        assert_eq!(parse_page_count("Page 1 of 5").unwrap(), 5);
        assert_eq!(parse_page_count("1 / 15+").unwrap(), 15);
        assert_eq!(parse_page_count(" 7 ").unwrap(), 7);
    }

    #[test]
    fn parse_page_count_rejects_garbage() {
        let err = parse_page_count("next page").unwrap_err();
        assert!(matches!(err, CardtrackError::Pagination(_)));
        assert!(parse_page_count("").is_err());
    }

    #[test]
    fn catalog_urls() {
        let c = crawler("https://www.cardmarket.com/en/Pokemon");
        assert_eq!(
            c.expansion_url("Paldea-Evolved").unwrap().as_str(),
            "https://www.cardmarket.com/en/Pokemon/Expansions/Paldea-Evolved#SetInfoSection"
        );
        assert_eq!(
            c.listing_url("Paldea-Evolved", Some(3)).unwrap().as_str(),
            "https://www.cardmarket.com/en/Pokemon/Products/Singles/Paldea-Evolved?site=3"
        );
    }

    #[test]
    fn extract_rows_reads_every_field() {
        let c = crawler("https://shop.example.com/en/Pokemon/");
        let html = listing(
            &[
                row(1, "Pikachu", "0,02 €", "1 234", "Common"),
                row(2, "Raichu", "0,10 €", "87", "Rare"),
            ],
            "1 of 1",
        );
        let page = Page::parse(c.listing_url("Test-Set", Some(1)).unwrap(), &html);
        let records = c.extract_rows(&page, "Test-Set", "31 March 2023").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Pikachu");
        assert_eq!(records[0].min_price, "0,02 €");
        assert_eq!(records[0].availability_count, "1 234");
        assert_eq!(records[0].rarity, "Common");
        assert_eq!(
            records[0].detail_url,
            "https://shop.example.com/en/Pokemon/Products/Singles/Test-Set/Pikachu"
        );
        assert_eq!(records[1].expansion, "Test-Set");
        assert_eq!(records[1].expansion_release_date, "31 March 2023");
    }

    #[test]
    fn malformed_row_aborts_extraction() {
        let c = crawler("https://shop.example.com/en/Pokemon/");
        let broken = r#"<div id="productRow9"><a href="/x">only one link</a></div>"#.to_string();
        let html = listing(&[row(1, "Pikachu", "1", "1", "Common"), broken], "1 of 1");
        let page = Page::parse(c.listing_url("Test-Set", Some(1)).unwrap(), &html);
        let err = c.extract_rows(&page, "Test-Set", "d").unwrap_err();
        assert!(err.to_string().contains("productRow9"));
    }

    #[tokio::test]
    async fn crawl_walks_all_pages_against_mock_server() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/en/Pokemon/Expansions/Test-Set"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EXPANSION_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let page1 = listing(
            &[
                row(1, "Pikachu", "0,02 €", "10", "Common"),
                row(2, "Raichu", "0,20 €", "5", "Uncommon"),
            ],
            "1 of 2",
        );
        let page2 = listing(&[row(3, "Mew", "4,00 €", "2", "Rare")], "2 of 2");

        Mock::given(method("GET"))
            .and(path("/en/Pokemon/Products/Singles/Test-Set"))
            .and(query_param("site", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page2))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        // Count page and ?site=1 share the first listing page
        Mock::given(method("GET"))
            .and(path("/en/Pokemon/Products/Singles/Test-Set"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page1))
            .expect(2)
            .mount(&server)
            .await;

        let c = crawler(&format!("{}/en/Pokemon/", server.uri()));
        let session = Session::open(crate::HttpPageSource::new(Duration::from_secs(5)).unwrap());
        let records = c
            .crawl(&session, "Test-Set", &SilentCrawlProgress)
            .await
            .unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pikachu", "Raichu", "Mew"]);
        assert!(records.iter().all(|r| r.expansion_release_date == "31 March 2023"));
    }

    #[tokio::test]
    async fn missing_page_count_is_pagination_error() {
        use wiremock::matchers::path;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(path("/en/Pokemon/Expansions/Test-Set"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EXPANSION_PAGE))
            .mount(&server)
            .await;
        Mock::given(path("/en/Pokemon/Products/Singles/Test-Set"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let c = crawler(&format!("{}/en/Pokemon/", server.uri()));
        let session = Session::open(crate::HttpPageSource::new(Duration::from_secs(5)).unwrap());
        let err = c
            .crawl(&session, "Test-Set", &SilentCrawlProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CardtrackError::Pagination(_)));
    }

    /// Canned pages keyed by URL without fragment.
    struct MapSource {
        pages: std::collections::HashMap<String, String>,
        fetches: std::sync::atomic::AtomicUsize,
    }

    impl PageSource for MapSource {
        async fn fetch(&self, url: &Url) -> Result<String> {
            self.fetches
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let mut key = url.clone();
            key.set_fragment(None);
            self.pages
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| CardtrackError::Network(format!("{key}: HTTP 404")))
        }

        fn name(&self) -> &str {
            "map"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn crawl_pauses_before_every_fetch() {
        let base = "https://shop.test/en/Pokemon/";
        let listing_url = format!("{base}Products/Singles/Test-Set");
        let page1 = listing(&[row(1, "Pikachu", "0,02 €", "10", "Common")], "1 of 2");
        let page2 = listing(&[row(2, "Mew", "4,00 €", "2", "Rare")], "2 of 2");
        let pages = [
            (format!("{base}Expansions/Test-Set"), EXPANSION_PAGE.to_string()),
            (listing_url.clone(), page1.clone()),
            (format!("{listing_url}?site=1"), page1),
            (format!("{listing_url}?site=2"), page2),
        ]
        .into_iter()
        .collect();

        let c = CatalogCrawler::new(CrawlConfig {
            catalog_base: cardtrack_shared::parse_base_url(base).unwrap(),
            delay: DelayRange::from_millis(2_000, 5_000).unwrap(),
            timeout: Duration::from_secs(5),
        });
        let session = Session::open(MapSource {
            pages,
            fetches: Default::default(),
        });

        let start = tokio::time::Instant::now();
        let records = c
            .crawl(&session, "Test-Set", &SilentCrawlProgress)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        // Release date, page count, then two listing pages
        assert!(start.elapsed() >= Duration::from_secs(4 * 2));
    }
}
