//! Print-ready HTML for an assembled [`Document`].

use std::collections::HashMap;

use orcamento_core::amount::{amount_from_f64, coerce_amount};
use orcamento_core::document::Document;
use orcamento_core::domain::quote::FinancialSummary;
use orcamento_core::format::{format_currency, format_title};
use rust_decimal::Decimal;
use tera::{Context, Tera};
use thiserror::Error;

const QUOTE_TEMPLATE: &str = "quote.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load template: {0}")]
    Template(#[source] tera::Error),
    #[error("failed to render quote: {0}")]
    Render(#[source] tera::Error),
}

/// Registers the filters the quote template relies on.
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
    tera.register_filter("title_case", tera_title_case_filter);
}

/// Formats a decimal (JSON string or number) as Brazilian currency.
fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(raw) => coerce_amount(raw),
        tera::Value::Number(number) => number.as_f64().map(amount_from_f64).unwrap_or_default(),
        tera::Value::Null => Decimal::ZERO,
        _ => return Err(tera::Error::msg("money filter expects a number or numeric string")),
    };
    Ok(tera::Value::String(format_currency(amount)))
}

fn tera_title_case_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("title_case filter expects a string input"))?;
    Ok(tera::Value::String(format_title(text)))
}

pub struct QuoteRenderer {
    tera: Tera,
}

impl QuoteRenderer {
    pub fn with_embedded_template() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(QUOTE_TEMPLATE, include_str!("../templates/quote.html.tera"))
            .map_err(RenderError::Template)?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        document: &Document,
        summary: &FinancialSummary,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("document", document);
        context.insert("summary", summary);
        self.tera.render(QUOTE_TEMPLATE, &context).map_err(RenderError::Render)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use orcamento_core::document::assemble_quote;
    use orcamento_core::domain::quote::{CompanyInfo, ItemPatch, Quote};
    use rust_decimal::Decimal;

    use super::{tera_money_filter, QuoteRenderer};

    fn quote() -> Quote {
        let company = CompanyInfo {
            name: "BARROS vidraçaria".to_string(),
            cnpj: "12345678000195".to_string(),
            ..CompanyInfo::default()
        };
        let mut quote = Quote::draft(
            12,
            NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
            company,
            30,
            "Carlos",
        );
        quote
            .update_item(
                0,
                ItemPatch {
                    quantity: Some(Decimal::from(3)),
                    description: Some("Vidro temperado 8mm".to_string()),
                    unit_price: Some(Decimal::new(15050, 2)),
                    ..ItemPatch::default()
                },
            )
            .expect("first row exists");
        quote
    }

    #[test]
    fn renders_items_totals_and_title() {
        let renderer = QuoteRenderer::with_embedded_template().expect("template loads");
        let quote = quote();
        let html = renderer.render(&assemble_quote(&quote), &quote.financial).expect("render");

        assert!(html.contains("Barros Vidraçaria"));
        assert!(html.contains("Vidro temperado 8mm"));
        assert!(html.contains("R$ 451,50"));
        assert!(html.contains("TOTAL"));
        assert!(html.contains("Cliente"));
    }

    #[test]
    fn renders_empty_items_notice() {
        let renderer = QuoteRenderer::with_embedded_template().expect("template loads");
        let mut quote = quote();
        quote.clear_items();
        let html = renderer.render(&assemble_quote(&quote), &quote.financial).expect("render");

        assert!(html.contains("Nenhum item adicionado"));
        assert!(html.contains("R$ 0,00"));
    }

    #[test]
    fn money_filter_accepts_strings_numbers_and_null() {
        let args = HashMap::new();
        let from_string =
            tera_money_filter(&tera::Value::String("1234.5".to_string()), &args).expect("string");
        assert_eq!(from_string, tera::Value::String("R$ 1.234,50".to_string()));

        let from_number = tera_money_filter(&serde_json::json!(2.5), &args).expect("number");
        assert_eq!(from_number, tera::Value::String("R$ 2,50".to_string()));

        let from_null = tera_money_filter(&tera::Value::Null, &args).expect("null");
        assert_eq!(from_null, tera::Value::String("R$ 0,00".to_string()));

        assert!(tera_money_filter(&serde_json::json!([1]), &args).is_err());
    }
}
