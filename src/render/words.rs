//! Conversión de montos enteros a letras en español, para la línea "SON:"
//! del comprobante. Solo enteros: los centavos se truncan antes de llegar
//! aquí y el texto nunca incluye fracciones.

const UNITS: [&str; 10] = [
    "", "UN", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE",
];

const TEENS: [&str; 10] = [
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISEIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
];

const TWENTIES: [&str; 10] = [
    "VEINTE",
    "VEINTIUN",
    "VEINTIDOS",
    "VEINTITRES",
    "VEINTICUATRO",
    "VEINTICINCO",
    "VEINTISEIS",
    "VEINTISIETE",
    "VEINTIOCHO",
    "VEINTINUEVE",
];

const TENS: [&str; 10] = [
    "", "", "", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
];

const HUNDREDS: [&str; 10] = [
    "",
    "CIENTO",
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

/// Monto entero en letras, en mayúsculas sin tildes, hasta 999.999.999.
pub fn amount_in_words(value: u64) -> String {
    if value == 0 {
        return "CERO".to_string();
    }

    let millions = value / 1_000_000;
    let remainder = value % 1_000_000;
    let mut parts: Vec<String> = Vec::new();

    match millions {
        0 => {}
        1 => parts.push("UN MILLON".to_string()),
        n => parts.push(format!("{} MILLONES", under_million(n))),
    }

    if remainder > 0 {
        parts.push(under_million(remainder));
    }

    parts.join(" ")
}

fn under_million(value: u64) -> String {
    debug_assert!(value < 1_000_000);
    let thousands = value / 1_000;
    let remainder = value % 1_000;
    let mut parts: Vec<String> = Vec::new();

    match thousands {
        0 => {}
        1 => parts.push("MIL".to_string()),
        n => parts.push(format!("{} MIL", under_thousand(n))),
    }

    if remainder > 0 {
        parts.push(under_thousand(remainder));
    }

    parts.join(" ")
}

fn under_thousand(value: u64) -> String {
    debug_assert!(value < 1_000);
    if value == 100 {
        return "CIEN".to_string();
    }

    let hundreds = (value / 100) as usize;
    let rest = value % 100;
    let mut parts: Vec<String> = Vec::new();

    if hundreds > 0 {
        parts.push(HUNDREDS[hundreds].to_string());
    }

    if rest > 0 {
        parts.push(under_hundred(rest));
    }

    parts.join(" ")
}

fn under_hundred(value: u64) -> String {
    debug_assert!(0 < value && value < 100);
    match value {
        1..=9 => UNITS[value as usize].to_string(),
        10..=19 => TEENS[(value - 10) as usize].to_string(),
        20..=29 => TWENTIES[(value - 20) as usize].to_string(),
        _ => {
            let tens = (value / 10) as usize;
            let units = value % 10;
            if units == 0 {
                TENS[tens].to_string()
            } else {
                format!("{} Y {}", TENS[tens], UNITS[units as usize])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_cero() {
        assert_eq!(amount_in_words(0), "CERO");
    }

    #[test]
    fn one_uses_apocopated_form() {
        assert_eq!(amount_in_words(1), "UN");
    }

    #[test]
    fn teens_and_twenties() {
        assert_eq!(amount_in_words(16), "DIECISEIS");
        assert_eq!(amount_in_words(21), "VEINTIUN");
        assert_eq!(amount_in_words(99), "NOVENTA Y NUEVE");
    }

    #[test]
    fn hundreds() {
        assert_eq!(amount_in_words(100), "CIEN");
        assert_eq!(amount_in_words(101), "CIENTO UN");
        assert_eq!(amount_in_words(555), "QUINIENTOS CINCUENTA Y CINCO");
        assert_eq!(amount_in_words(900), "NOVECIENTOS");
    }

    #[test]
    fn thousands() {
        assert_eq!(amount_in_words(1_000), "MIL");
        assert_eq!(amount_in_words(1_500), "MIL QUINIENTOS");
        assert_eq!(amount_in_words(21_000), "VEINTIUN MIL");
        assert_eq!(
            amount_in_words(987_654),
            "NOVECIENTOS OCHENTA Y SIETE MIL SEISCIENTOS CINCUENTA Y CUATRO"
        );
    }

    #[test]
    fn millions() {
        assert_eq!(amount_in_words(1_000_000), "UN MILLON");
        assert_eq!(amount_in_words(2_000_000), "DOS MILLONES");
        assert_eq!(
            amount_in_words(3_250_000),
            "TRES MILLONES DOSCIENTOS CINCUENTA MIL"
        );
    }

    #[test]
    fn words_never_mention_fractions() {
        for value in [0u64, 1, 999, 1_000_000] {
            let words = amount_in_words(value);
            assert!(!words.contains("CENTAVO"));
            assert!(!words.contains(','));
        }
    }
}
