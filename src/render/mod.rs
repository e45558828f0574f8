pub mod receipt;
pub mod words;

use chrono::NaiveDate;

/// Moneda con convención es-CO: símbolo, miles con punto, sin decimales.
pub fn format_money(value: f64) -> String {
    let negative = value < -0.5;
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Fecha corta es-CO.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands_with_dots() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(950.0), "$950");
        assert_eq!(format_money(1_234_567.0), "$1.234.567");
        assert_eq!(format_money(-45_000.0), "-$45.000");
    }

    #[test]
    fn money_rounds_fractions_away() {
        assert_eq!(format_money(999.6), "$1.000");
    }

    #[test]
    fn date_is_short_es_co() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_date(date), "05/03/2026");
    }
}
