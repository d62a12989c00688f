use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{lenient_date, lenient_decimal, lenient_u32, lenient_u64};
use crate::cpq::aggregate;
use crate::cpq::pricing;
use crate::errors::DomainError;

pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub name: String,
    pub cnpj: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub site: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub name: String,
    pub phone: String,
    /// CPF or CNPJ, digits with or without punctuation.
    pub tax_id: String,
    pub email: String,
    pub address: String,
    pub city: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteMetadata {
    #[serde(deserialize_with = "lenient_u64")]
    pub number: u64,
    #[serde(deserialize_with = "lenient_date")]
    pub issue_date: NaiveDate,
    #[serde(deserialize_with = "lenient_u32")]
    pub validity_days: u32,
    pub salesperson: String,
}

impl Default for QuoteMetadata {
    fn default() -> Self {
        Self {
            number: 0,
            issue_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
            validity_days: DEFAULT_VALIDITY_DAYS,
            salesperson: String::new(),
        }
    }
}

impl QuoteMetadata {
    /// Calendar days, not business days. `None` only past the end of the calendar.
    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.issue_date.checked_add_days(Days::new(u64::from(self.validity_days)))
    }
}

/// One row of the quote. Height and width are descriptive only and never take
/// part in any monetary computation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    #[serde(deserialize_with = "lenient_decimal")]
    pub quantity: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub height: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub width: Decimal,
    pub description: String,
    #[serde(deserialize_with = "lenient_decimal")]
    pub unit_price: Decimal,
}

impl Item {
    /// A freshly added row: one unit at zero price.
    pub fn new_row() -> Self {
        Self { quantity: Decimal::ONE, ..Self::default() }
    }

    pub fn line_total(&self) -> Decimal {
        aggregate::line_total(self)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub quantity: Option<Decimal>,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
}

impl ItemPatch {
    fn apply(self, item: &mut Item) {
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(height) = self.height {
            item.height = height;
        }
        if let Some(width) = self.width {
            item.width = width;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
    }
}

/// `total = subtotal - discount_value + surcharge` and
/// `discount_value = subtotal * discount_percent / 100`, always rebuilt by
/// [`pricing::recompute`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialSummary {
    #[serde(deserialize_with = "lenient_decimal")]
    pub subtotal: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub discount_percent: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub discount_value: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub surcharge: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Observations {
    pub payment_method: String,
    pub conditions: String,
    pub delivery_time: String,
    pub notes: String,
}

impl Observations {
    pub fn is_empty(&self) -> bool {
        [&self.payment_method, &self.conditions, &self.delivery_time, &self.notes]
            .iter()
            .all(|value| value.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    pub company: CompanyInfo,
    pub client: ClientInfo,
    pub metadata: QuoteMetadata,
    pub items: Vec<Item>,
    pub financial: FinancialSummary,
    pub observations: Observations,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub has_company: bool,
    pub has_client: bool,
    pub has_number: bool,
    pub has_items: bool,
    pub has_observations: bool,
    pub total_value: Decimal,
    pub items_count: usize,
}

impl Quote {
    /// A new quote as it looks when a session starts: one empty row, no
    /// adjustments, totals already computed.
    pub fn draft(
        number: u64,
        issue_date: NaiveDate,
        company: CompanyInfo,
        validity_days: u32,
        salesperson: impl Into<String>,
    ) -> Self {
        let mut quote = Self {
            company,
            metadata: QuoteMetadata {
                number,
                issue_date,
                validity_days,
                salesperson: salesperson.into(),
            },
            items: vec![Item::new_row()],
            ..Self::default()
        };
        quote.refresh_financial();
        quote
    }

    /// Rebuilds the financial summary from the items and the two user inputs.
    pub fn refresh_financial(&mut self) -> &FinancialSummary {
        self.financial = pricing::recompute(
            &self.items,
            self.financial.discount_percent,
            self.financial.surcharge,
        );
        &self.financial
    }

    pub fn set_adjustments(&mut self, discount_percent: Decimal, surcharge: Decimal) {
        self.financial.discount_percent = discount_percent;
        self.financial.surcharge = surcharge;
        self.refresh_financial();
    }

    fn check_index(&self, index: usize) -> Result<(), DomainError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(DomainError::ItemIndexOutOfRange { index, len: self.items.len() })
        }
    }

    pub fn add_item(&mut self) -> usize {
        self.items.push(Item::new_row());
        self.refresh_financial();
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Result<Item, DomainError> {
        self.check_index(index)?;
        let removed = self.items.remove(index);
        self.refresh_financial();
        Ok(removed)
    }

    pub fn update_item(&mut self, index: usize, patch: ItemPatch) -> Result<(), DomainError> {
        self.check_index(index)?;
        patch.apply(&mut self.items[index]);
        self.refresh_financial();
        Ok(())
    }

    /// Appends a copy of the row at `index` to the end of the list.
    pub fn duplicate_item(&mut self, index: usize) -> Result<usize, DomainError> {
        self.check_index(index)?;
        let copy = self.items[index].clone();
        self.items.push(copy);
        self.refresh_financial();
        Ok(self.items.len() - 1)
    }

    /// `false` when the row is already first.
    pub fn move_item_up(&mut self, index: usize) -> Result<bool, DomainError> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }
        self.items.swap(index, index - 1);
        Ok(true)
    }

    /// `false` when the row is already last.
    pub fn move_item_down(&mut self, index: usize) -> Result<bool, DomainError> {
        self.check_index(index)?;
        if index + 1 == self.items.len() {
            return Ok(false);
        }
        self.items.swap(index, index + 1);
        Ok(true)
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
        self.refresh_financial();
    }

    /// Advisory check of the fields a printed quote is expected to carry.
    /// Nothing in the crate refuses to preview, render or save on this basis.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let text_fields = [
            ("company.name", &self.company.name),
            ("company.cnpj", &self.company.cnpj),
            ("company.address", &self.company.address),
            ("company.phone", &self.company.phone),
            ("client.name", &self.client.name),
            ("client.phone", &self.client.phone),
            ("client.taxId", &self.client.tax_id),
            ("client.address", &self.client.address),
        ];

        let mut missing: Vec<&'static str> = text_fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();

        if self.metadata.number == 0 {
            missing.push("metadata.number");
        }
        if self.metadata.validity_days == 0 {
            missing.push("metadata.validityDays");
        }
        missing
    }

    pub fn stats(&self) -> QuoteStats {
        QuoteStats {
            has_company: !self.company.name.trim().is_empty(),
            has_client: !self.client.name.trim().is_empty(),
            has_number: self.metadata.number > 0,
            has_items: !self.items.is_empty(),
            has_observations: !self.observations.is_empty(),
            total_value: self.financial.total,
            items_count: self.items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{CompanyInfo, Item, ItemPatch, Quote};
    use crate::errors::DomainError;

    fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    fn priced(quantity: i64, cents: i64) -> ItemPatch {
        ItemPatch {
            quantity: Some(Decimal::from(quantity)),
            unit_price: Some(Decimal::new(cents, 2)),
            ..ItemPatch::default()
        }
    }

    #[test]
    fn draft_starts_with_one_default_row() {
        let quote = Quote::draft(3, issue_date(), CompanyInfo::default(), 30, "Ana");

        assert_eq!(quote.items, vec![Item::new_row()]);
        assert_eq!(quote.metadata.number, 3);
        assert_eq!(quote.financial.total, Decimal::ZERO);
    }

    #[test]
    fn validity_uses_calendar_days() {
        let quote = Quote::draft(1, issue_date(), CompanyInfo::default(), 30, "");
        assert_eq!(quote.metadata.valid_until(), NaiveDate::from_ymd_opt(2026, 11, 17));
    }

    #[test]
    fn every_item_edit_recomputes_totals() {
        let mut quote = Quote::draft(1, issue_date(), CompanyInfo::default(), 30, "");
        quote.update_item(0, priced(2, 1000)).expect("update first row");
        assert_eq!(quote.financial.subtotal, Decimal::new(2000, 2));

        let second = quote.add_item();
        quote.update_item(second, priced(1, 550)).expect("update second row");
        quote.set_adjustments(Decimal::from(10), Decimal::ZERO);
        assert_eq!(quote.financial.total, Decimal::new(2295, 2));

        quote.remove_item(0).expect("remove first row");
        assert_eq!(quote.financial.subtotal, Decimal::new(550, 2));
        assert_eq!(quote.financial.discount_value, Decimal::new(55, 2));
    }

    #[test]
    fn duplicate_appends_a_copy() {
        let mut quote = Quote::draft(1, issue_date(), CompanyInfo::default(), 30, "");
        quote.update_item(0, priced(3, 100)).expect("update row");

        let copy = quote.duplicate_item(0).expect("duplicate row");
        assert_eq!(copy, 1);
        assert_eq!(quote.items[0], quote.items[1]);
        assert_eq!(quote.financial.subtotal, Decimal::from(6));
    }

    #[test]
    fn moves_stop_at_the_edges() {
        let mut quote = Quote::draft(1, issue_date(), CompanyInfo::default(), 30, "");
        quote.add_item();
        quote
            .update_item(1, ItemPatch { description: Some("porta".into()), ..ItemPatch::default() })
            .expect("describe second row");

        assert!(!quote.move_item_up(0).expect("first row"));
        assert!(quote.move_item_up(1).expect("second row"));
        assert_eq!(quote.items[0].description, "porta");
        assert!(!quote.move_item_down(1).expect("last row"));
        assert!(quote.move_item_down(0).expect("first row"));
        assert_eq!(quote.items[1].description, "porta");
    }

    #[test]
    fn out_of_range_rows_are_rejected() {
        let mut quote = Quote::draft(1, issue_date(), CompanyInfo::default(), 30, "");
        let error = quote.remove_item(4).expect_err("index 4 is out of range");
        assert_eq!(error, DomainError::ItemIndexOutOfRange { index: 4, len: 1 });
        assert_eq!(quote.items.len(), 1);
    }

    #[test]
    fn missing_fields_are_reported_not_enforced() {
        let mut quote = Quote::draft(0, issue_date(), CompanyInfo::default(), 30, "");
        let missing = quote.missing_required_fields();
        assert!(missing.contains(&"company.name"));
        assert!(missing.contains(&"metadata.number"));

        quote.client.name = "Maria".to_string();
        assert!(!quote.missing_required_fields().contains(&"client.name"));
        assert!(quote.stats().has_client);
    }

    #[test]
    fn snapshot_json_uses_camel_case_and_tolerates_loose_numbers() {
        let raw = r#"{
            "metadata": {"number": "007", "issueDate": "2026-10-18", "validityDays": "15"},
            "items": [{"quantity": "2", "unitPrice": "10,00", "height": null}],
            "financial": {"discountPercent": 10}
        }"#;

        let quote: Quote = serde_json::from_str(raw).expect("loose quote json");
        assert_eq!(quote.metadata.number, 7);
        assert_eq!(quote.metadata.validity_days, 15);
        assert_eq!(quote.items[0].unit_price, Decimal::from(10));
        assert_eq!(quote.items[0].height, Decimal::ZERO);
        assert_eq!(quote.financial.discount_percent, Decimal::from(10));

        let json = serde_json::to_value(&quote).expect("serialize quote");
        assert_eq!(json["metadata"]["issueDate"], "2026-10-18");
        assert!(json["items"][0].get("unitPrice").is_some());
    }
}
