//! Core domain types for the card catalog dataset.

use serde::{Deserialize, Serialize};

use crate::error::CardtrackError;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Dataset column names as they appear in the persisted header.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const EXPANSION: &str = "Expansion";
    pub const MIN_PRICE: &str = "Min price";
    pub const AVAILABILITY: &str = "Exemplaires en vente";
    pub const RARITY: &str = "Rareté";
    pub const MKM_URL: &str = "mkm_url";
    pub const RELEASE_DATE: &str = "expansion_release_date";

    pub const TOURNAMENT_LAST_MONTH: &str = "Tournament_last_month";
    pub const PRICE_TREND: &str = "Price trend";
    pub const PRICE_7_DAYS: &str = "Price 7 days";
    pub const PRICE_30_DAYS: &str = "Price 30 days";

    /// Working subset columns.
    pub const INDEX: &str = "Index";
    pub const EXPANSION_CODE: &str = "Expansion_code";
    pub const NUMBER_CODE: &str = "Number_code";
}

/// Columns every extracted record carries, in header order.
pub const BASE_COLUMNS: [&str; 7] = [
    columns::NAME,
    columns::EXPANSION,
    columns::MIN_PRICE,
    columns::AVAILABILITY,
    columns::RARITY,
    columns::MKM_URL,
    columns::RELEASE_DATE,
];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One catalog item as extracted from a listing page.
///
/// Enrichment columns are not part of a freshly extracted record; they are
/// patched onto the persisted row later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub expansion: String,
    /// Locale-formatted price string, kept verbatim.
    pub min_price: String,
    pub availability_count: String,
    pub rarity: String,
    pub detail_url: String,
    pub expansion_release_date: String,
}

impl Record {
    /// Value for a base column, or `None` for columns a record does not carry.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column {
            columns::NAME => &self.name,
            columns::EXPANSION => &self.expansion,
            columns::MIN_PRICE => &self.min_price,
            columns::AVAILABILITY => &self.availability_count,
            columns::RARITY => &self.rarity,
            columns::MKM_URL => &self.detail_url,
            columns::RELEASE_DATE => &self.expansion_release_date,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Lay the record out along `header`; columns it does not carry are left empty.
    pub fn to_row(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|col| self.field(col).unwrap_or_default().to_string())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// EnrichmentKind
// ---------------------------------------------------------------------------

/// The two enrichment passes and the dataset columns each one owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    /// Competitive usage count over the last month.
    Tournaments,
    /// Price trend plus 7-day and 30-day averages.
    Prices,
}

impl EnrichmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tournaments => "tournaments",
            Self::Prices => "prices",
        }
    }

    /// Columns written by this pass.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Tournaments => &[columns::TOURNAMENT_LAST_MONTH],
            Self::Prices => &[
                columns::PRICE_TREND,
                columns::PRICE_7_DAYS,
                columns::PRICE_30_DAYS,
            ],
        }
    }

    /// Column whose presence marks a row as already enriched by this pass.
    pub fn marker_column(&self) -> &'static str {
        self.columns()[0]
    }
}

impl std::fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrichmentKind {
    type Err = CardtrackError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tournaments" => Ok(Self::Tournaments),
            "prices" => Ok(Self::Prices),
            other => Err(CardtrackError::validation(format!(
                "unknown enrichment kind '{other}': expected 'tournaments' or 'prices'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            name: "Pikachu".into(),
            expansion: "Scarlet-Violet".into(),
            min_price: "0,02 €".into(),
            availability_count: "1234".into(),
            rarity: "Common".into(),
            detail_url: "https://example.com/pikachu".into(),
            expansion_release_date: "31 March 2023".into(),
        }
    }

    #[test]
    fn record_to_row_follows_header_order() {
        let header: Vec<String> = vec![
            columns::RARITY.into(),
            columns::NAME.into(),
            columns::PRICE_TREND.into(),
        ];
        let row = sample().to_row(&header);
        assert_eq!(row, vec!["Common", "Pikachu", ""]);
    }

    #[test]
    fn record_covers_all_base_columns() {
        let r = sample();
        for col in BASE_COLUMNS {
            assert!(r.field(col).is_some(), "missing base column {col}");
        }
        assert!(r.field(columns::TOURNAMENT_LAST_MONTH).is_none());
    }

    #[test]
    fn enrichment_kind_parse_and_columns() {
        let kind: EnrichmentKind = "prices".parse().unwrap();
        assert_eq!(kind, EnrichmentKind::Prices);
        assert_eq!(kind.columns().len(), 3);
        assert_eq!(
            EnrichmentKind::Tournaments.marker_column(),
            columns::TOURNAMENT_LAST_MONTH
        );
        assert!("weather".parse::<EnrichmentKind>().is_err());
    }
}
