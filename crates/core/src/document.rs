//! Printable, renderer-agnostic view of a quote.
//!
//! Assembly only composes strings: every figure comes from the quote's items
//! (via the aggregator's line totals) or from an already computed
//! [`FinancialSummary`], and every value passes through [`crate::format`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::aggregate::line_total;
use crate::domain::quote::{FinancialSummary, Observations, Quote};
use crate::format::{
    format_cpf_cnpj, format_currency, format_measurement, format_naive_date, format_phone,
    format_plain_number, format_quote_number, parse_currency, PLACEHOLDER,
};

pub const EMPTY_ITEMS_MESSAGE: &str = "Nenhum item adicionado";
pub const EMPTY_ITEMS_HINT: &str = "Adicione itens ao orçamento para ver os detalhes aqui";
pub const SIGNATURES: [&str; 2] = ["Cliente", "Responsável"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub header: CompanyBlock,
    pub metadata: MetadataBlock,
    pub client: ClientBlock,
    pub items: ItemsSection,
    /// Subtotal, discount and surcharge rows are omitted when zero or
    /// negative; a missing row means zero. The total row is always present.
    pub financial: Vec<FinancialRow>,
    pub observations: Vec<LabeledValue>,
    pub signatures: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyBlock {
    pub name: String,
    pub cnpj: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub site: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    pub number: String,
    pub issued_on: String,
    pub valid_until: String,
    pub validity: String,
    pub salesperson: Option<String>,
    pub page: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBlock {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub tax_id: String,
    pub address: String,
    pub city: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemsSection {
    Table { rows: Vec<ItemRow> },
    Empty { message: String, hint: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub position: usize,
    pub quantity: String,
    pub measurement: String,
    pub description: String,
    pub unit_price: String,
    pub total: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialRowKind {
    Subtotal,
    Discount,
    Surcharge,
    Total,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRow {
    pub kind: FinancialRowKind,
    pub label: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl Document {
    pub fn row(&self, kind: FinancialRowKind) -> Option<&FinancialRow> {
        self.financial.iter().find(|row| row.kind == kind)
    }

    /// Parsed amount of a financial row, zero when the row is absent.
    pub fn amount(&self, kind: FinancialRowKind) -> Decimal {
        self.row(kind).map_or(Decimal::ZERO, |row| parse_currency(&row.amount))
    }

    pub fn item_rows(&self) -> &[ItemRow] {
        match &self.items {
            ItemsSection::Table { rows } => rows,
            ItemsSection::Empty { .. } => &[],
        }
    }
}

/// Assembles with the summary stored on the quote.
pub fn assemble_quote(quote: &Quote) -> Document {
    assemble(quote, &quote.financial)
}

pub fn assemble(quote: &Quote, financial: &FinancialSummary) -> Document {
    let company = &quote.company;
    let metadata = &quote.metadata;
    let client = &quote.client;

    Document {
        title: format!("Orçamento {}", company.name).trim_end().to_string(),
        header: CompanyBlock {
            name: company.name.clone(),
            cnpj: format_cpf_cnpj(&company.cnpj),
            address: company.address.clone(),
            phone: format_phone(&company.phone),
            email: company.email.clone(),
            site: non_blank(&company.site),
        },
        metadata: MetadataBlock {
            number: format_quote_number(metadata.number),
            issued_on: format_naive_date(metadata.issue_date),
            valid_until: metadata
                .valid_until()
                .map(format_naive_date)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            validity: format!("{} dias", metadata.validity_days),
            salesperson: non_blank(&metadata.salesperson),
            page: "1 de 1".to_string(),
        },
        client: ClientBlock {
            name: client.name.clone(),
            phone: format_phone(&client.phone),
            email: non_blank(&client.email).unwrap_or_else(|| PLACEHOLDER.to_string()),
            tax_id: format_cpf_cnpj(&client.tax_id),
            address: client.address.clone(),
            city: client.city.clone(),
        },
        items: items_section(quote),
        financial: financial_rows(financial),
        observations: observation_rows(&quote.observations),
        signatures: SIGNATURES.iter().map(|label| label.to_string()).collect(),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn items_section(quote: &Quote) -> ItemsSection {
    if quote.items.is_empty() {
        return ItemsSection::Empty {
            message: EMPTY_ITEMS_MESSAGE.to_string(),
            hint: EMPTY_ITEMS_HINT.to_string(),
        };
    }

    let rows = quote
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemRow {
            position: index + 1,
            quantity: format_plain_number(item.quantity),
            measurement: format_measurement(item.height, item.width),
            description: item.description.clone(),
            unit_price: format_currency(item.unit_price),
            total: format_currency(line_total(item)),
        })
        .collect();

    ItemsSection::Table { rows }
}

/// Subtotal, discount and surcharge appear only when positive, so a missing
/// row means zero. The total row is always present.
fn financial_rows(financial: &FinancialSummary) -> Vec<FinancialRow> {
    let optional = [
        (FinancialRowKind::Subtotal, "Subtotal", financial.subtotal),
        (FinancialRowKind::Discount, "Desconto", financial.discount_value),
        (FinancialRowKind::Surcharge, "Acréscimo", financial.surcharge),
    ];

    let mut rows: Vec<FinancialRow> = optional
        .into_iter()
        .filter(|(_, _, amount)| *amount > Decimal::ZERO)
        .map(|(kind, label, amount)| FinancialRow {
            kind,
            label: label.to_string(),
            amount: format_currency(amount),
        })
        .collect();

    rows.push(FinancialRow {
        kind: FinancialRowKind::Total,
        label: "TOTAL".to_string(),
        amount: format_currency(financial.total),
    });
    rows
}

fn observation_rows(observations: &Observations) -> Vec<LabeledValue> {
    [
        ("Forma de Pagamento", &observations.payment_method, "A combinar"),
        ("Condições", &observations.conditions, "Condições a combinar"),
        ("Prazo de Entrega", &observations.delivery_time, "Prazo a combinar"),
        ("Observações", &observations.notes, "Observações adicionais"),
    ]
    .into_iter()
    .map(|(label, value, fallback)| LabeledValue {
        label: label.to_string(),
        value: non_blank(value).unwrap_or_else(|| fallback.to_string()),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{assemble_quote, FinancialRowKind, ItemsSection, EMPTY_ITEMS_MESSAGE};
    use crate::domain::quote::{ClientInfo, CompanyInfo, Item, ItemPatch, Quote};
    use crate::format::parse_currency;

    fn sample_quote() -> Quote {
        let company = CompanyInfo {
            name: "Barros Vidraçaria".to_string(),
            cnpj: "12345678000195".to_string(),
            address: "Rua Augustinho Filozina".to_string(),
            phone: "84994114275".to_string(),
            email: "contato@barros.com.br".to_string(),
            site: String::new(),
        };
        let mut quote = Quote::draft(
            7,
            NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date"),
            company,
            30,
            "",
        );
        quote.client = ClientInfo {
            name: "Maria Souza".to_string(),
            phone: "8433221100".to_string(),
            tax_id: "12345678901".to_string(),
            ..ClientInfo::default()
        };
        quote.items = vec![
            Item {
                quantity: Decimal::from(2),
                height: Decimal::new(21, 1),
                width: Decimal::new(8, 1),
                description: "Porta de vidro".to_string(),
                unit_price: Decimal::new(1000, 2),
            },
            Item { quantity: Decimal::ONE, unit_price: Decimal::new(550, 2), ..Item::default() },
            Item { quantity: Decimal::ZERO, unit_price: Decimal::from(99), ..Item::default() },
        ];
        quote.set_adjustments(Decimal::from(10), Decimal::new(445, 2));
        quote
    }

    #[test]
    fn header_metadata_and_client_are_formatted() {
        let document = assemble_quote(&sample_quote());

        assert_eq!(document.title, "Orçamento Barros Vidraçaria");
        assert_eq!(document.header.cnpj, "12.345.678/0001-95");
        assert_eq!(document.header.phone, "(84) 99411-4275");
        assert_eq!(document.header.site, None);
        assert_eq!(document.metadata.number, "0007");
        assert_eq!(document.metadata.issued_on, "15/01/2026");
        assert_eq!(document.metadata.valid_until, "14/02/2026");
        assert_eq!(document.metadata.validity, "30 dias");
        assert_eq!(document.metadata.salesperson, None);
        assert_eq!(document.client.tax_id, "123.456.789-01");
        assert_eq!(document.client.phone, "(84) 3322-1100");
        assert_eq!(document.client.email, "-");
    }

    #[test]
    fn item_rows_follow_list_order() {
        let document = assemble_quote(&sample_quote());
        let rows = document.item_rows();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[0].measurement, "2.1 x 0.8 m");
        assert_eq!(rows[0].total, "R$ 20,00");
        assert_eq!(rows[1].measurement, "-");
        assert_eq!(rows[2].quantity, "0");
        assert_eq!(rows[2].total, "R$ 0,00");
    }

    #[test]
    fn financial_rows_reproduce_the_total() {
        let quote = sample_quote();
        let document = assemble_quote(&quote);

        let amount = |kind| document.row(kind).map(|row| parse_currency(&row.amount));
        assert_eq!(amount(FinancialRowKind::Subtotal), Some(Decimal::new(2550, 2)));
        assert_eq!(amount(FinancialRowKind::Discount), Some(Decimal::new(255, 2)));
        assert_eq!(amount(FinancialRowKind::Surcharge), Some(Decimal::new(445, 2)));

        let total = amount(FinancialRowKind::Total).expect("total row");
        assert!((total - quote.financial.total).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn zero_adjustments_leave_only_the_total_row() {
        let mut quote = sample_quote();
        quote.clear_items();
        quote.set_adjustments(Decimal::ZERO, Decimal::ZERO);

        let document = assemble_quote(&quote);
        assert_eq!(document.financial.len(), 1);
        assert_eq!(document.financial[0].amount, "R$ 0,00");
    }

    #[test]
    fn missing_rows_read_as_zero_when_rebuilding_the_total() {
        let mut quote = sample_quote();
        quote.set_adjustments(Decimal::ZERO, Decimal::ZERO);

        let document = assemble_quote(&quote);
        assert!(document.row(FinancialRowKind::Discount).is_none());
        assert!(document.row(FinancialRowKind::Surcharge).is_none());
        assert_eq!(document.amount(FinancialRowKind::Discount), Decimal::ZERO);

        let rebuilt = document.amount(FinancialRowKind::Subtotal)
            - document.amount(FinancialRowKind::Discount)
            + document.amount(FinancialRowKind::Surcharge);
        assert_eq!(rebuilt, document.amount(FinancialRowKind::Total));
        assert_eq!(rebuilt, Decimal::new(2550, 2));
    }

    #[test]
    fn empty_item_list_produces_placeholder_section() {
        let mut quote = sample_quote();
        quote.clear_items();

        let document = assemble_quote(&quote);
        assert!(matches!(
            &document.items,
            ItemsSection::Empty { message, .. } if message == EMPTY_ITEMS_MESSAGE
        ));
        assert!(document.item_rows().is_empty());
    }

    #[test]
    fn observations_fall_back_to_defaults() {
        let mut quote = sample_quote();
        quote.observations.payment_method = "Pix".to_string();

        let document = assemble_quote(&quote);
        assert_eq!(document.observations[0].value, "Pix");
        assert_eq!(document.observations[1].value, "Condições a combinar");
        assert_eq!(document.observations[3].value, "Observações adicionais");
        assert_eq!(document.signatures, vec!["Cliente".to_string(), "Responsável".to_string()]);
    }
}
