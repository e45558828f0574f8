//! Métricas AFM de Helvetica y Helvetica-Bold (fuentes base-14) para medir
//! texto sin incrustar archivos de fuente, más la codificación WinAnsi de
//! literales de cadena PDF.

/// Ancho por defecto (milésimas de em) para caracteres fuera de la tabla.
const FALLBACK_WIDTH: u32 = 556;

/// Ancho de un carácter en milésimas de em.
pub fn char_width(c: char, bold: bool) -> u32 {
    let c = fold_accent(c);
    if bold {
        bold_width(c)
    } else {
        regular_width(c)
    }
}

/// Ancho de una cadena en puntos al tamaño dado.
pub fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let units: u32 = text.chars().map(|c| char_width(c, bold)).sum();
    units as f64 * size / 1000.0
}

/// Codifica texto como literal de cadena PDF en WinAnsi (Latin-1), con los
/// escapes obligatorios. Caracteres fuera de Latin-1 degradan a `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    for c in text.chars() {
        let byte = match c as u32 {
            // Viñeta: fuera de Latin-1 pero presente en WinAnsi.
            0x2022 => 0x95,
            code if code <= 0xFF => code as u8,
            _ => b'?',
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(byte),
        }
    }
    out
}

/// Las vocales acentuadas del español comparten ancho con su letra base.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        _ => c,
    }
}

fn regular_width(c: char) -> u32 {
    match c {
        ' ' | ',' | '.' | '/' | ':' | ';' | '!' => 278,
        '"' => 355,
        '\'' => 191,
        '#' | '$' | '?' | '_' | '0'..='9' => 556,
        '%' => 889,
        '&' => 667,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' => 584,
        '@' => 1015,
        'A' | 'B' | 'E' | 'K' | 'P' | 'V' | 'X' | 'Y' => 667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'I' | '[' | ']' | '\\' => 278,
        'J' | 'k' => 500,
        'L' => 556,
        'M' => 833,
        'S' => 667,
        'W' => 944,
        '^' => 469,
        'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 556,
        'c' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        'f' | 't' => 278,
        'i' | 'j' | 'l' => 222,
        'm' => 833,
        'w' => 722,
        '{' | '}' => 334,
        '|' => 260,
        '°' => 400,
        '•' => 350,
        _ => FALLBACK_WIDTH,
    }
}

fn bold_width(c: char) -> u32 {
    match c {
        ' ' | ',' | '.' | '/' | '\\' => 278,
        '!' | ':' | ';' | '(' | ')' | '-' | '[' | ']' | '`' | 't' | 'f' => 333,
        '"' => 474,
        '\'' => 238,
        '#' | '$' | '_' | '0'..='9' => 556,
        '%' => 889,
        '&' => 722,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' | '^' => 584,
        '?' => 611,
        '@' => 975,
        'A' | 'B' | 'C' | 'D' | 'H' | 'K' | 'N' | 'R' | 'U' => 722,
        'E' | 'P' | 'V' | 'X' | 'Y' => 667,
        'F' | 'T' | 'Z' | 'L' => 611,
        'G' | 'O' | 'Q' => 778,
        'I' => 278,
        'J' => 556,
        'M' => 833,
        'S' => 667,
        'W' => 944,
        'a' | 'c' | 'e' | 's' | 'v' | 'x' | 'y' => 556,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 611,
        'i' | 'j' | 'l' => 278,
        'k' => 556,
        'm' => 889,
        'r' => 389,
        'w' => 778,
        'z' => 500,
        '{' | '}' => 389,
        '|' => 280,
        '°' => 400,
        '•' => 350,
        _ => FALLBACK_WIDTH,
    }
}
