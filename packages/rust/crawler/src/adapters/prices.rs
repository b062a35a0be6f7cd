//! Price trend and rolling averages, read from the row's own catalog detail page.

use url::Url;

use cardtrack_shared::{CardtrackError, EnrichmentKind, Result, columns};
use cardtrack_storage::WorkingRow;

use super::{EnrichmentAdapter, Fields};
use crate::page::{self, Page};

/// Definition list of the product info tab.
const INFO_LIST: &str = "#tabContent-info > div > div:nth-of-type(1) > div > \
                         div:nth-of-type(2) > dl";

/// Position of each value among the list's `<dd>` entries.
const TREND_DD: usize = 8;
const AVG_30_DD: usize = 9;
const AVG_7_DD: usize = 10;

/// Reads trend, 7-day and 30-day prices from the stored `mkm_url`.
pub struct PriceTrendAdapter;

impl EnrichmentAdapter for PriceTrendAdapter {
    fn kind(&self) -> EnrichmentKind {
        EnrichmentKind::Prices
    }

    fn page_url(&self, row: &WorkingRow) -> Result<Url> {
        let raw = row.mkm_url.trim();
        if raw.is_empty() {
            return Err(CardtrackError::validation(format!(
                "index {} has no detail URL",
                row.index
            )));
        }
        Url::parse(raw).map_err(|e| {
            CardtrackError::validation(format!("index {}: bad detail URL '{raw}': {e}", row.index))
        })
    }

    fn extract(&self, page: &Page) -> Result<Fields> {
        let list = page.find_one(INFO_LIST)?;
        let value = |n: usize| -> Result<String> {
            let css = format!("dd:nth-of-type({n}) > span");
            Ok(page::text(page::find_one_in(list, &css)?))
        };

        Ok(vec![
            (columns::PRICE_TREND, value(TREND_DD)?),
            (columns::PRICE_7_DAYS, value(AVG_7_DD)?),
            (columns::PRICE_30_DAYS, value(AVG_30_DD)?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_page(trend: &str, avg30: &str, avg7: &str) -> String {
        let mut dds = String::new();
        for i in 1..=11 {
            let v = match i {
                8 => trend.to_string(),
                9 => avg30.to_string(),
                10 => avg7.to_string(),
                _ => format!("v{i}"),
            };
            dds.push_str(&format!("<dt>k{i}</dt><dd><span>{v}</span></dd>"));
        }
        format!(
            r#"<html><body><div id="tabContent-info"><div>
                <div><div>
                    <div>image</div>
                    <div><dl>{dds}</dl></div>
                </div></div>
            </div></div></body></html>"#
        )
    }

    #[test]
    fn reads_price_columns_by_position() {
        let html = detail_page("1,25 €", "1,40 €", "1,30 €");
        let page = Page::parse(Url::parse("https://shop.example.com/p").unwrap(), &html);
        let fields = PriceTrendAdapter.extract(&page).unwrap();
        assert_eq!(
            fields,
            vec![
                (columns::PRICE_TREND, "1,25 €".to_string()),
                (columns::PRICE_7_DAYS, "1,30 €".to_string()),
                (columns::PRICE_30_DAYS, "1,40 €".to_string()),
            ]
        );
    }

    #[test]
    fn short_info_list_is_extraction_error() {
        let html = r#"<div id="tabContent-info"><div><div><div><div></div>
            <div><dl><dt>a</dt><dd><span>1</span></dd></dl></div></div></div></div></div>"#;
        let page = Page::parse(Url::parse("https://shop.example.com/p").unwrap(), html);
        assert!(PriceTrendAdapter.extract(&page).is_err());
    }

    #[test]
    fn url_comes_from_working_row() {
        let row = WorkingRow {
            index: 0,
            expansion_code: String::new(),
            number_code: String::new(),
            mkm_url: "https://shop.example.com/en/Pokemon/Products/Singles/X/Y".into(),
        };
        assert_eq!(
            PriceTrendAdapter.page_url(&row).unwrap().path(),
            "/en/Pokemon/Products/Singles/X/Y"
        );

        let empty = WorkingRow { mkm_url: " ".into(), ..row };
        assert!(PriceTrendAdapter.page_url(&empty).is_err());
    }
}
