//! Display formatting for the pt-BR locale.
//!
//! Every function here is total: malformed, empty or missing input degrades to
//! a placeholder (`"-"`, `"R$ 0,00"`, `"0000"`, or the input itself) instead of
//! failing. Callers holding an `Option<&str>` pass `value.unwrap_or_default()`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::amount::parse_calendar_date;

pub const CURRENCY_SYMBOL: &str = "R$";
pub const PLACEHOLDER: &str = "-";
pub const DEFAULT_TRUNCATE_LENGTH: usize = 50;

const CPF_MASK: &str = "###.###.###-##";
const CNPJ_MASK: &str = "##.###.###/####-##";
const MOBILE_MASK: &str = "(##) #####-####";
const LANDLINE_MASK: &str = "(##) ####-####";
const LOCAL_PHONE_MASK: &str = "####-####";

/// `R$ 1.234,56`. Missing values render as `R$ 0,00`.
pub fn format_currency(value: impl Into<Option<Decimal>>) -> String {
    let mut rounded = value
        .into()
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    rounded.set_sign_positive(true);
    rounded.rescale(2);
    let fixed = rounded.to_string();
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let sign = if negative { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL} {},{cents}", group_thousands(whole))
}

/// Inverse of [`format_currency`]. Unparsable text is zero.
pub fn parse_currency(text: &str) -> Decimal {
    let cleaned: String = text
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '.')
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();

    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

pub fn format_naive_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `dd/mm/yyyy`, or `-` when the input is not a date.
pub fn format_date(value: &str) -> String {
    parse_calendar_date(value).map(format_naive_date).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// `dd/mm/yyyy, HH:MM:SS` in the offset the timestamp was written with.
pub fn format_date_time(value: &str) -> String {
    let trimmed = value.trim();
    let naive = DateTime::parse_from_rfc3339(trimmed)
        .map(|value| value.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| parse_calendar_date(trimmed).and_then(|date| date.and_hms_opt(0, 0, 0)));

    match naive {
        Some(naive) => naive.format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn apply_mask(digits: &str, mask: &str) -> String {
    let mut digits = digits.chars();
    mask.chars()
        .filter_map(|slot| if slot == '#' { digits.next() } else { Some(slot) })
        .collect()
}

/// CPF (11 digits) or CNPJ (14 digits). Other lengths come back untouched.
pub fn format_cpf_cnpj(value: &str) -> String {
    if value.trim().is_empty() {
        return PLACEHOLDER.to_string();
    }

    let digits = digits_only(value);
    match digits.len() {
        11 => apply_mask(&digits, CPF_MASK),
        14 => apply_mask(&digits, CNPJ_MASK),
        _ => value.to_string(),
    }
}

pub fn format_phone(value: &str) -> String {
    if value.trim().is_empty() {
        return PLACEHOLDER.to_string();
    }

    let digits = digits_only(value);
    match digits.len() {
        11 => apply_mask(&digits, MOBILE_MASK),
        10 => apply_mask(&digits, LANDLINE_MASK),
        8 => apply_mask(&digits, LOCAL_PHONE_MASK),
        _ => value.to_string(),
    }
}

/// Zero-padded to four digits; zero or missing is `0000`.
pub fn format_quote_number(number: impl Into<Option<u64>>) -> String {
    match number.into() {
        Some(number) if number > 0 => format!("{number:04}"),
        _ => "0000".to_string(),
    }
}

/// Plain numeric text without forced decimal places (`2`, `1.5`).
pub fn format_plain_number(value: Decimal) -> String {
    value.normalize().to_string()
}

/// `"<height> x <width> m"`, or `-` when neither dimension is set.
pub fn format_measurement(height: Decimal, width: Decimal) -> String {
    if height.is_zero() && width.is_zero() {
        return PLACEHOLDER.to_string();
    }
    format!("{} x {} m", format_plain_number(height), format_plain_number(width))
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

fn plural(count: i64, singular: &str) -> String {
    if count > 1 {
        format!("{count} {singular}s atrás")
    } else {
        format!("{count} {singular} atrás")
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|value| value.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|value| value.and_utc())
        })
        .or_else(|| {
            parse_calendar_date(trimmed)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|value| value.and_utc())
        })
}

/// Human distance between `value` and `now`. Anything older than 30 days falls
/// back to the plain date.
pub fn format_relative_time(value: &str, now: DateTime<Utc>) -> String {
    let Some(instant) = parse_instant(value) else {
        return PLACEHOLDER.to_string();
    };

    let seconds = (now - instant).num_seconds();
    match seconds {
        s if s < 60 => "agora mesmo".to_string(),
        s if s < 3_600 => plural(s / 60, "minuto"),
        s if s < 86_400 => plural(s / 3_600, "hora"),
        s if s < 2_592_000 => plural(s / 86_400, "dia"),
        _ => format_naive_date(instant.date_naive()),
    }
}

pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let head: String = text.chars().take(max_length).collect();
    format!("{head}...")
}

/// Lower-cases the text and capitalises each space-separated word.
pub fn format_title(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses whitespace runs into `_` for use inside file names.
pub fn sanitize_file_component(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn currency_zero_and_missing_share_placeholder() {
        assert_eq!(format_currency(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_currency(None), "R$ 0,00");
    }

    #[test]
    fn currency_groups_thousands_and_rounds_half_away_from_zero() {
        assert_eq!(format_currency(Decimal::new(123456789, 2)), "R$ 1.234.567,89");
        assert_eq!(format_currency(Decimal::new(1005, 3)), "R$ 1,01");
        assert_eq!(format_currency(Decimal::from(999)), "R$ 999,00");
        assert_eq!(format_currency(Decimal::new(-550, 2)), "-R$ 5,50");
        assert_eq!(format_currency(Decimal::new(-1, 3)), "R$ 0,00");
    }

    #[test]
    fn currency_text_parses_back_to_the_rounded_value() {
        for cents in [0_i64, 5, 2_740, 123_456, 100_000_000] {
            let value = Decimal::new(cents, 2);
            assert_eq!(parse_currency(&format_currency(value)), value);
        }
        assert_eq!(parse_currency("-R$ 5,50"), Decimal::new(-550, 2));
        assert_eq!(parse_currency("garbage"), Decimal::ZERO);
    }

    #[test]
    fn tax_identifiers_are_masked_by_length() {
        assert_eq!(format_cpf_cnpj("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf_cnpj("123.456.789-01"), "123.456.789-01");
        assert_eq!(format_cpf_cnpj("12345678000195"), "12.345.678/0001-95");
        assert_eq!(format_cpf_cnpj("12 345"), "12 345");
        assert_eq!(format_cpf_cnpj(""), "-");
    }

    #[test]
    fn phones_are_masked_by_length() {
        assert_eq!(format_phone("84994114275"), "(84) 99411-4275");
        assert_eq!(format_phone("8433221100"), "(84) 3322-1100");
        assert_eq!(format_phone("33221100"), "3322-1100");
        assert_eq!(format_phone("+55 84 9 9411-4275"), "+55 84 9 9411-4275");
        assert_eq!(format_phone("   "), "-");
    }

    #[test]
    fn quote_numbers_are_zero_padded() {
        assert_eq!(format_quote_number(7), "0007");
        assert_eq!(format_quote_number(12345), "12345");
        assert_eq!(format_quote_number(0), "0000");
        assert_eq!(format_quote_number(None), "0000");
    }

    #[test]
    fn measurement_uses_plain_numbers() {
        assert_eq!(format_measurement(Decimal::ZERO, Decimal::ZERO), "-");
        assert_eq!(format_measurement(Decimal::new(150, 2), Decimal::from(2)), "1.5 x 2 m");
        assert_eq!(format_measurement(Decimal::ZERO, Decimal::new(75, 2)), "0 x 0.75 m");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date("2026-10-18"), "18/10/2026");
        assert_eq!(format_date("2026-10-18T23:59:00-03:00"), "18/10/2026");
        assert_eq!(format_date(""), "-");
        assert_eq!(format_date("31/02/2026"), "-");
        assert_eq!(format_date_time("2026-10-18T14:03:09Z"), "18/10/2026, 14:03:09");
        assert_eq!(format_date_time("2026-10-18"), "18/10/2026, 00:00:00");
        assert_eq!(format_date_time("soon"), "-");
    }

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).single().expect("valid instant");
        let ago = |delta: Duration| (now - delta).to_rfc3339();

        assert_eq!(format_relative_time(&ago(Duration::seconds(30)), now), "agora mesmo");
        assert_eq!(format_relative_time(&ago(Duration::minutes(1)), now), "1 minuto atrás");
        assert_eq!(format_relative_time(&ago(Duration::minutes(5)), now), "5 minutos atrás");
        assert_eq!(format_relative_time(&ago(Duration::hours(3)), now), "3 horas atrás");
        assert_eq!(format_relative_time(&ago(Duration::days(1)), now), "1 dia atrás");
        assert_eq!(format_relative_time(&ago(Duration::days(45)), now), "03/09/2026");
        assert_eq!(format_relative_time("whenever", now), "-");
    }

    #[test]
    fn text_helpers_degrade_gracefully() {
        assert_eq!(truncate_text("", DEFAULT_TRUNCATE_LENGTH), "");
        assert_eq!(truncate_text("vidro temperado", 5), "vidro...");
        assert_eq!(truncate_text("curto", 10), "curto");
        assert_eq!(format_title("JANELA de  correr"), "Janela De  Correr");
        assert_eq!(format_title(""), "");
        assert_eq!(sanitize_file_component("  Barros  Vidraçaria "), "Barros_Vidraçaria");
    }
}
