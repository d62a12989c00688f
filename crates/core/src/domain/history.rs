use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{lenient_decimal, lenient_u64};
use crate::domain::quote::Quote;

/// Most recent committed quotes kept in history.
pub const HISTORY_LIMIT: usize = 50;

/// A committed quote. `company`, `client`, `date` and `total` are denormalized
/// from `quote` so a listing never has to open the full snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch at commit time, bumped when needed to
    /// stay unique within the list.
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub number: u64,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub client: String,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub quote: Quote,
}

impl HistoryEntry {
    pub fn from_quote(id: i64, quote: &Quote, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            number: quote.metadata.number,
            company: quote.company.name.clone(),
            client: quote.client.name.clone(),
            date: quote.metadata.issue_date,
            total: quote.financial.total,
            created_at,
            quote: quote.clone(),
        }
    }
}

/// A history entry without its snapshot, for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub id: i64,
    pub number: u64,
    pub company: String,
    pub client: String,
    pub date: NaiveDate,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&HistoryEntry> for HistorySummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            number: entry.number,
            company: entry.company.clone(),
            client: entry.client.clone(),
            date: entry.date,
            total: entry.total,
            created_at: entry.created_at,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceState {
    pub last_number: u64,
}

impl SequenceState {
    pub fn next_number(self) -> u64 {
        self.last_number.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{HistoryEntry, SequenceState};
    use crate::domain::quote::{CompanyInfo, ItemPatch, Quote};

    #[test]
    fn entry_denormalizes_listing_fields() {
        let company = CompanyInfo { name: "Vidraçaria Sol".to_string(), ..CompanyInfo::default() };
        let mut quote = Quote::draft(
            12,
            NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
            company,
            30,
            "",
        );
        quote.client.name = "Maria".to_string();
        quote
            .update_item(
                0,
                ItemPatch { unit_price: Some(Decimal::from(80)), ..ItemPatch::default() },
            )
            .expect("price row");

        let created_at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).single().expect("instant");
        let entry = HistoryEntry::from_quote(1, &quote, created_at);

        assert_eq!(entry.number, 12);
        assert_eq!(entry.company, "Vidraçaria Sol");
        assert_eq!(entry.client, "Maria");
        assert_eq!(entry.total, Decimal::from(80));
        assert_eq!(entry.quote, quote);

        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["date"], "2026-10-18");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["quote"]["metadata"]["number"], 12);
    }

    #[test]
    fn next_number_follows_last_committed() {
        assert_eq!(SequenceState::default().next_number(), 1);
        assert_eq!(SequenceState { last_number: 41 }.next_number(), 42);
    }
}
