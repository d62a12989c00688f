//! Quote export envelope and partial import.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::quote::Quote;
use crate::format::sanitize_file_component;

pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

const ENVELOPE_KEYS: [&str; 2] = ["exportedAt", "version"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("import payload must be a JSON object")]
    NotAnObject,
    #[error("import payload does not fit the quote shape: {0}")]
    Incompatible(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteExport {
    #[serde(flatten)]
    pub quote: Quote,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

impl QuoteExport {
    pub fn new(quote: Quote, exported_at: DateTime<Utc>) -> Self {
        Self { quote, exported_at, version: EXPORT_FORMAT_VERSION.to_string() }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `orcamento_<Company_Name>_<number>_<yyyy-mm-dd>.json`
pub fn suggested_export_file_name(quote: &Quote, today: NaiveDate) -> String {
    format!(
        "orcamento_{}_{}_{}.json",
        sanitize_file_component(&quote.company.name),
        quote.metadata.number,
        today.format("%Y-%m-%d")
    )
}

/// `Orcamento_<Company_Name>_<number>_<yyyy-mm-dd>.pdf`
pub fn suggested_pdf_file_name(quote: &Quote, today: NaiveDate) -> String {
    format!(
        "Orcamento_{}_{}_{}.pdf",
        sanitize_file_component(&quote.company.name),
        quote.metadata.number,
        today.format("%Y-%m-%d")
    )
}

/// Applies a JSON payload on top of `prior` and returns the merged quote with
/// freshly computed totals. Fields absent from the payload, or `null`, keep
/// their prior value; arrays replace wholesale. `prior` is never modified, so
/// a failed import leaves the caller's state as it was.
pub fn import_quote(prior: &Quote, payload: &str) -> Result<Quote, ImportError> {
    let incoming: Value = serde_json::from_str(payload).map_err(ImportError::InvalidJson)?;
    let Value::Object(mut incoming) = incoming else {
        return Err(ImportError::NotAnObject);
    };
    for key in ENVELOPE_KEYS {
        incoming.remove(key);
    }

    let mut merged =
        serde_json::to_value(prior).map_err(|error| ImportError::Incompatible(error.to_string()))?;
    merge_object(&mut merged, incoming);

    let mut quote: Quote = serde_json::from_value(merged)
        .map_err(|error| ImportError::Incompatible(error.to_string()))?;
    quote.refresh_financial();
    Ok(quote)
}

fn merge_object(target: &mut Value, patch: Map<String, Value>) {
    let Value::Object(target) = target else {
        *target = Value::Object(patch);
        return;
    };

    for (key, value) in patch {
        match value {
            Value::Null => {}
            Value::Object(nested) => {
                merge_object(target.entry(key).or_insert(Value::Null), nested);
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        import_quote, suggested_export_file_name, suggested_pdf_file_name, ImportError,
        QuoteExport,
    };
    use crate::domain::quote::{CompanyInfo, ItemPatch, Quote};

    fn prior() -> Quote {
        let company = CompanyInfo { name: "Barros Vidraçaria".to_string(), ..CompanyInfo::default() };
        let mut quote = Quote::draft(
            7,
            NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
            company,
            30,
            "Carlos",
        );
        quote.client.name = "Maria".to_string();
        quote
            .update_item(
                0,
                ItemPatch {
                    quantity: Some(Decimal::from(2)),
                    unit_price: Some(Decimal::from(50)),
                    ..ItemPatch::default()
                },
            )
            .expect("price row");
        quote
    }

    #[test]
    fn export_envelope_flattens_the_quote() {
        let exported_at = Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).single().expect("instant");
        let export = QuoteExport::new(prior(), exported_at);
        let json: serde_json::Value =
            serde_json::from_str(&export.to_json_pretty().expect("serialize")).expect("parse");

        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["exportedAt"], "2026-10-18T15:30:00Z");
        assert_eq!(json["company"]["name"], "Barros Vidraçaria");
        assert_eq!(json["metadata"]["number"], 7);
    }

    #[test]
    fn export_then_import_restores_the_quote() {
        let exported_at = Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).single().expect("instant");
        let payload = QuoteExport::new(prior(), exported_at).to_json_pretty().expect("serialize");

        let imported = import_quote(&Quote::default(), &payload).expect("import");
        assert_eq!(imported, prior());
    }

    #[test]
    fn partial_import_keeps_prior_values() {
        let imported = import_quote(
            &prior(),
            r#"{"client": {"phone": "84999998888", "name": null}, "financial": {"discountPercent": 10}}"#,
        )
        .expect("partial import");

        assert_eq!(imported.client.name, "Maria");
        assert_eq!(imported.client.phone, "84999998888");
        assert_eq!(imported.company.name, "Barros Vidraçaria");
        assert_eq!(imported.financial.subtotal, Decimal::from(100));
        assert_eq!(imported.financial.total, Decimal::from(90));
    }

    #[test]
    fn imported_items_replace_the_list_and_totals_are_recomputed() {
        let imported = import_quote(
            &prior(),
            r#"{"items": [{"quantity": 3, "unitPrice": "2.50"}], "financial": {"total": 999}}"#,
        )
        .expect("items import");

        assert_eq!(imported.items.len(), 1);
        assert_eq!(imported.financial.total, Decimal::new(750, 2));
    }

    #[test]
    fn invalid_payloads_are_rejected() {
        assert!(matches!(import_quote(&prior(), "{not json"), Err(ImportError::InvalidJson(_))));
        assert!(matches!(import_quote(&prior(), "[1, 2]"), Err(ImportError::NotAnObject)));
        assert!(matches!(
            import_quote(&prior(), r#"{"items": "many"}"#),
            Err(ImportError::Incompatible(_))
        ));
    }

    #[test]
    fn file_names_use_company_number_and_day() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
        assert_eq!(
            suggested_export_file_name(&prior(), today),
            "orcamento_Barros_Vidraçaria_7_2026-10-18.json"
        );
        assert_eq!(
            suggested_pdf_file_name(&prior(), today),
            "Orcamento_Barros_Vidraçaria_7_2026-10-18.pdf"
        );
    }
}
