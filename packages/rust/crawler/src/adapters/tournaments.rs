//! Competitive usage over the last month, from the tournament statistics site.

use url::Url;

use cardtrack_shared::{CardtrackError, EnrichmentKind, Result, columns, normalize_code};
use cardtrack_storage::WorkingRow;

use super::{EnrichmentAdapter, Fields};
use crate::page::{self, Page};

/// Decklist table; one header row plus one row per tournament result.
const DECKLIST_TABLE: &str = ".data-table.striped";

/// Counts decklist rows on `<base><expansion_code>/<number_code>/decklists?<query>`.
pub struct TournamentUsageAdapter {
    base: Url,
    query: String,
}

impl TournamentUsageAdapter {
    pub fn new(base: Url, query: String) -> Self {
        Self { base, query }
    }
}

impl EnrichmentAdapter for TournamentUsageAdapter {
    fn kind(&self) -> EnrichmentKind {
        EnrichmentKind::Tournaments
    }

    fn page_url(&self, row: &WorkingRow) -> Result<Url> {
        let expansion = row.expansion_code.trim();
        let number = normalize_code(row.number_code.trim());
        if expansion.is_empty() || number.is_empty() {
            return Err(CardtrackError::validation(format!(
                "index {} has no expansion/number code",
                row.index
            )));
        }

        let mut url = self
            .base
            .join(&format!("{expansion}/{number}/decklists"))
            .map_err(|e| CardtrackError::validation(format!("index {}: {e}", row.index)))?;
        if !self.query.is_empty() {
            url.set_query(Some(&self.query));
        }
        Ok(url)
    }

    fn extract(&self, page: &Page) -> Result<Fields> {
        let table = page.find_one(DECKLIST_TABLE)?;
        let rows = page::find_in(table, "tr")?.len();
        Ok(vec![(
            columns::TOURNAMENT_LAST_MONTH,
            rows.saturating_sub(1).to_string(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TournamentUsageAdapter {
        TournamentUsageAdapter::new(
            cardtrack_shared::parse_base_url("https://limitlesstcg.com/cards").unwrap(),
            "time=1months&type=all".into(),
        )
    }

    fn working(code: &str, number: &str) -> WorkingRow {
        WorkingRow {
            index: 3,
            expansion_code: code.into(),
            number_code: number.into(),
            mkm_url: String::new(),
        }
    }

    #[test]
    fn url_uses_normalized_number() {
        let url = adapter().page_url(&working("SVI", "063")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://limitlesstcg.com/cards/SVI/63/decklists?time=1months&type=all"
        );
    }

    #[test]
    fn url_requires_codes() {
        assert!(adapter().page_url(&working("", "12")).is_err());
        assert!(adapter().page_url(&working("SVI", "000")).is_err());
    }

    #[test]
    fn counts_rows_minus_header() {
        let html = r#"<table class="data-table striped">
            <tr><th>Player</th><th>Event</th></tr>
            <tr><td>a</td><td>x</td></tr>
            <tr><td>b</td><td>y</td></tr>
            <tr><td>c</td><td>z</td></tr>
        </table>"#;
        let page = Page::parse(url::Url::parse("https://limitlesstcg.com/").unwrap(), html);
        let fields = adapter().extract(&page).unwrap();
        assert_eq!(fields, vec![(columns::TOURNAMENT_LAST_MONTH, "3".to_string())]);
    }

    #[test]
    fn header_only_table_counts_zero() {
        let html = r#"<table class="data-table striped"><tr><th>Player</th></tr></table>"#;
        let page = Page::parse(url::Url::parse("https://limitlesstcg.com/").unwrap(), html);
        let fields = adapter().extract(&page).unwrap();
        assert_eq!(fields[0].1, "0");
    }

    #[test]
    fn missing_table_is_extraction_error() {
        let page = Page::parse(url::Url::parse("https://limitlesstcg.com/").unwrap(), "<p>none</p>");
        assert!(matches!(
            adapter().extract(&page),
            Err(CardtrackError::Extraction { .. })
        ));
    }
}
