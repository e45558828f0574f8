//! Renderizador del comprobante de egreso: un documento autocontenido por
//! pago, con plantilla fija. El compositor luego lo repagina dentro del
//! paquete como a cualquier otro documento.

use tracing::warn;

use crate::core::{
    config::{ALERT, DARK, GRAY, PRIMARY, TOTAL_FILL, TOTAL_TEXT},
    AssemblyResult, Color, EngineConfig,
};
use crate::geometry::{fit_within_bounds, LETTER_HEIGHT, LETTER_WIDTH, PAGE_PADDING};
use crate::models::{PaymentRecord, UnitInfo};
use crate::pdf::{embed, DocumentBuilder, FontStyle, PageBuilder};

use super::{format_date, format_money, words};

const WHITE: Color = Color::new(1.0, 1.0, 1.0);
const LIGHT_LINE: Color = Color::from_rgb8(229, 231, 235);

const MARGIN: f64 = PAGE_PADDING;
const RIGHT_EDGE: f64 = LETTER_WIDTH - MARGIN;
const HEADER_HEIGHT: f64 = 90.0;
const ROW_HEIGHT: f64 = 16.0;
/// Altura del bloque fijo bajo la tabla: total, letras, observaciones,
/// banco, firmas y pie.
const TRAILER_HEIGHT: f64 = 210.0;

// Geometría de la tabla de facturas.
const COL_NUMBER: f64 = MARGIN + 4.0;
const COL_DATE: f64 = 140.0;
const COL_CONCEPT: f64 = 215.0;
const COL_AMOUNT_RIGHT: f64 = RIGHT_EDGE - 4.0;

pub struct ReceiptInput<'a> {
    pub unit: &'a UnitInfo,
    pub payment: &'a PaymentRecord,
    /// Bytes del logo ya descargados por el compositor; el renderizador no
    /// realiza E/S.
    pub logo: Option<&'a [u8]>,
}

/// Genera el comprobante como un PDF independiente (una o más páginas).
pub fn render_receipt(input: &ReceiptInput<'_>, config: &EngineConfig) -> AssemblyResult<Vec<u8>> {
    let mut builder = DocumentBuilder::new();
    let payment = input.payment;

    let mut page = builder.start_page();
    draw_header(&mut builder, &mut page, input);
    let mut y = draw_identity_block(&mut page, input);

    // Tabla de facturas aplicadas.
    y -= 24.0;
    page.draw_text(MARGIN, y, 10.0, FontStyle::Bold, PRIMARY, "DETALLE DE FACTURAS");
    y -= 8.0;
    y = draw_table_head(&mut page, y);

    for line in &payment.invoice_lines {
        if y < TRAILER_HEIGHT {
            builder.push_page(page);
            page = builder.start_page();
            y = LETTER_HEIGHT - 60.0;
            page.draw_text(
                MARGIN,
                y,
                10.0,
                FontStyle::Bold,
                PRIMARY,
                "DETALLE DE FACTURAS (continuación)",
            );
            y -= 8.0;
            y = draw_table_head(&mut page, y);
        }

        let concept = line.description.as_deref().unwrap_or("");
        page.draw_text(COL_NUMBER, y, 8.5, FontStyle::Regular, DARK, &line.number);
        page.draw_text(COL_DATE, y, 8.5, FontStyle::Regular, DARK, &format_date(line.date));
        page.draw_text(COL_CONCEPT, y, 8.5, FontStyle::Regular, DARK, &truncate(concept, 52));
        page.draw_text_right(
            COL_AMOUNT_RIGHT,
            y,
            8.5,
            FontStyle::Regular,
            DARK,
            &format_money(line.amount_applied),
        );
        page.stroke_line(MARGIN, y - 4.0, RIGHT_EDGE, y - 4.0, 0.4, LIGHT_LINE);
        y -= ROW_HEIGHT;
    }

    // Filas sintéticas de retenciones, en negativo.
    if payment.retefuente > 0.0 {
        y = draw_deduction_row(&mut page, y, "(-) Retención Fuente", payment.retefuente);
    }
    if payment.reteica > 0.0 {
        y = draw_deduction_row(&mut page, y, "(-) Retención ICA", payment.reteica);
    }

    // El bloque de cierre nunca se parte entre páginas.
    if y < TRAILER_HEIGHT {
        builder.push_page(page);
        page = builder.start_page();
        y = LETTER_HEIGHT - 60.0;
    }

    // Total girado, resaltado.
    page.fill_rect(MARGIN, y - 5.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT + 2.0, TOTAL_FILL);
    page.draw_text(COL_CONCEPT, y, 10.0, FontStyle::Bold, TOTAL_TEXT, "TOTAL GIRADO");
    page.draw_text_right(
        COL_AMOUNT_RIGHT,
        y,
        10.0,
        FontStyle::Bold,
        TOTAL_TEXT,
        &format_money(payment.net_amount),
    );
    y -= 26.0;

    // Valor en letras. Los montos se manejan como enteros; ver conversor.
    let in_words = words::amount_in_words(payment.net_amount.max(0.0) as u64);
    page.draw_text(
        MARGIN,
        y,
        8.5,
        FontStyle::Bold,
        DARK,
        &format!("SON: {} PESOS M/CTE", in_words),
    );
    y -= 18.0;

    if let Some(observations) = &payment.observations {
        page.draw_text(
            MARGIN,
            y,
            8.5,
            FontStyle::Regular,
            GRAY,
            &format!("Observaciones: {}", truncate(observations, 95)),
        );
        y -= 16.0;
    }

    draw_bank_line(&mut page, y, input);
    draw_signatures(&mut page, input);
    draw_footer(&mut page, config);

    builder.push_page(page);
    builder.finish()
}

fn draw_header(builder: &mut DocumentBuilder, page: &mut PageBuilder, input: &ReceiptInput<'_>) {
    let top = LETTER_HEIGHT - HEADER_HEIGHT;
    page.fill_rect(0.0, top, LETTER_WIDTH, HEADER_HEIGHT, PRIMARY);

    // Celda del logo: opcional, y su falla nunca tumba el comprobante.
    if let Some(bytes) = input.logo {
        match embed::embed_image(builder, bytes, None) {
            Ok(logo) => {
                let scale =
                    fit_within_bounds(logo.width as f64, logo.height as f64, 70.0, 70.0);
                let width = logo.width as f64 * scale;
                let height = logo.height as f64 * scale;
                let name = page.register_xobject(logo.xobject);
                page.draw_image(&name, width, height, MARGIN, top + (HEADER_HEIGHT - height) / 2.0);
            }
            Err(error) => {
                warn!(%error, "no se pudo incrustar el logo en el comprobante");
            }
        }
    }

    page.draw_text_centered(
        LETTER_WIDTH / 2.0,
        LETTER_HEIGHT - 42.0,
        18.0,
        FontStyle::Bold,
        WHITE,
        "COMPROBANTE DE EGRESO",
    );
    page.draw_text_centered(
        LETTER_WIDTH / 2.0,
        LETTER_HEIGHT - 68.0,
        13.0,
        FontStyle::Bold,
        WHITE,
        &input.payment.document_number(),
    );
}

/// Identidad de la unidad, fecha y la grilla de dos filas del beneficiario.
/// Devuelve el cursor vertical tras el bloque.
fn draw_identity_block(page: &mut PageBuilder, input: &ReceiptInput<'_>) -> f64 {
    let unit = input.unit;
    let payment = input.payment;
    let mut y = LETTER_HEIGHT - HEADER_HEIGHT - 24.0;

    page.draw_text(MARGIN, y, 11.0, FontStyle::Bold, DARK, &unit.name);
    page.draw_text(RIGHT_EDGE - 130.0, y, 9.0, FontStyle::Bold, DARK, "Fecha:");
    page.draw_text(
        RIGHT_EDGE - 130.0,
        y - 13.0,
        9.0,
        FontStyle::Regular,
        DARK,
        &format_date(payment.date),
    );
    y -= 13.0;
    page.draw_text(MARGIN, y, 9.0, FontStyle::Regular, GRAY, &format!("NIT: {}", unit.tax_id));
    if let Some(address) = &unit.address {
        y -= 12.0;
        page.draw_text(MARGIN, y, 9.0, FontStyle::Regular, GRAY, address);
    }

    y -= 18.0;
    page.stroke_line(MARGIN, y, RIGHT_EDGE, y, 0.5, LIGHT_LINE);

    y -= 20.0;
    page.draw_text(MARGIN, y, 10.0, FontStyle::Bold, PRIMARY, "BENEFICIARIO");

    // Grilla de identidad: nombre | teléfono, NIT | ciudad.
    let counterpart = &payment.counterpart;
    let grid_top = y - 8.0;
    let row_h = 18.0;
    let mid_x = LETTER_WIDTH * 0.62;

    page.stroke_line(MARGIN, grid_top, RIGHT_EDGE, grid_top, 0.5, LIGHT_LINE);
    page.stroke_line(MARGIN, grid_top - row_h, RIGHT_EDGE, grid_top - row_h, 0.5, LIGHT_LINE);
    page.stroke_line(
        MARGIN,
        grid_top - row_h * 2.0,
        RIGHT_EDGE,
        grid_top - row_h * 2.0,
        0.5,
        LIGHT_LINE,
    );
    page.stroke_line(MARGIN, grid_top, MARGIN, grid_top - row_h * 2.0, 0.5, LIGHT_LINE);
    page.stroke_line(mid_x, grid_top, mid_x, grid_top - row_h * 2.0, 0.5, LIGHT_LINE);
    page.stroke_line(RIGHT_EDGE, grid_top, RIGHT_EDGE, grid_top - row_h * 2.0, 0.5, LIGHT_LINE);

    let row1 = grid_top - 13.0;
    let row2 = grid_top - row_h - 13.0;
    page.draw_text(MARGIN + 6.0, row1, 10.0, FontStyle::Bold, DARK, &counterpart.name);
    if let Some(phone) = &counterpart.phone {
        page.draw_text(mid_x + 6.0, row1, 9.0, FontStyle::Regular, GRAY, &format!("Tel: {}", phone));
    }
    page.draw_text(
        MARGIN + 6.0,
        row2,
        9.0,
        FontStyle::Regular,
        GRAY,
        &format!("NIT: {}", counterpart.full_nit()),
    );
    if let Some(city) = &counterpart.city {
        page.draw_text(mid_x + 6.0, row2, 9.0, FontStyle::Regular, GRAY, city);
    }

    grid_top - row_h * 2.0
}

fn draw_table_head(page: &mut PageBuilder, y: f64) -> f64 {
    page.fill_rect(MARGIN, y - 16.0, RIGHT_EDGE - MARGIN, 16.0, PRIMARY);
    let text_y = y - 11.5;
    page.draw_text(COL_NUMBER, text_y, 8.5, FontStyle::Bold, WHITE, "Número");
    page.draw_text(COL_DATE, text_y, 8.5, FontStyle::Bold, WHITE, "Fecha");
    page.draw_text(COL_CONCEPT, text_y, 8.5, FontStyle::Bold, WHITE, "Concepto");
    page.draw_text_right(COL_AMOUNT_RIGHT, text_y, 8.5, FontStyle::Bold, WHITE, "Valor");
    y - 16.0 - 13.0
}

fn draw_deduction_row(page: &mut PageBuilder, y: f64, concept: &str, amount: f64) -> f64 {
    page.draw_text_right(
        COL_AMOUNT_RIGHT - 90.0,
        y,
        8.5,
        FontStyle::Bold,
        ALERT,
        concept,
    );
    page.draw_text_right(
        COL_AMOUNT_RIGHT,
        y,
        8.5,
        FontStyle::Bold,
        ALERT,
        &format_money(-amount),
    );
    y - ROW_HEIGHT
}

fn draw_bank_line(page: &mut PageBuilder, y: f64, input: &ReceiptInput<'_>) {
    let payment = input.payment;
    let unit = input.unit;

    let mut parts: Vec<String> = Vec::new();
    if let Some(method) = &payment.payment_method {
        parts.push(format!("Método: {}", method));
    }
    let bank = payment.bank_name.as_ref().or(unit.default_bank_name.as_ref());
    if let Some(bank) = bank {
        parts.push(format!("Banco: {}", bank));
    }
    let account_type = payment
        .account_type
        .as_ref()
        .or(unit.default_account_type.as_ref());
    if let Some(kind) = account_type {
        parts.push(format!("Tipo de cuenta: {}", kind));
    }
    if let Some(account) = &payment.counterpart.bank_account {
        parts.push(format!("Cuenta: {}", account));
    }
    if let Some(reference) = &payment.transaction_ref {
        parts.push(format!("Ref. Transacción: {}", reference));
    }

    if parts.is_empty() {
        return;
    }

    page.draw_text(MARGIN, y, 9.0, FontStyle::Bold, PRIMARY, "INFORMACIÓN DE PAGO");
    page.draw_text(MARGIN, y - 13.0, 8.5, FontStyle::Regular, DARK, &parts.join("  •  "));
}

/// Cuatro columnas de firma: elaboró, revisó, aprobó y contabilizó.
fn draw_signatures(page: &mut PageBuilder, input: &ReceiptInput<'_>) {
    let unit = input.unit;
    let labels = [
        ("Elaboró", unit.default_elaborated_by.as_deref()),
        ("Revisó", unit.default_reviewed_by.as_deref()),
        ("Aprobó", unit.default_approved_by.as_deref()),
        ("Contabilizó", unit.default_recorded_by.as_deref()),
    ];

    let line_y = 110.0;
    let gap = 16.0;
    let total_width = RIGHT_EDGE - MARGIN;
    let column = (total_width - gap * 3.0) / 4.0;

    for (i, (caption, name)) in labels.iter().enumerate() {
        let x = MARGIN + i as f64 * (column + gap);
        page.stroke_line(x, line_y, x + column, line_y, 0.4, Color::from_rgb8(200, 200, 200));
        page.draw_text_centered(
            x + column / 2.0,
            line_y - 12.0,
            8.0,
            FontStyle::Regular,
            GRAY,
            caption,
        );
        if let Some(name) = name {
            page.draw_text_centered(
                x + column / 2.0,
                line_y + 5.0,
                7.5,
                FontStyle::Regular,
                DARK,
                &truncate(name, 24),
            );
        }
    }
}

fn draw_footer(page: &mut PageBuilder, config: &EngineConfig) {
    let generated = config.now();
    page.draw_text_centered(
        LETTER_WIDTH / 2.0,
        42.0,
        8.0,
        FontStyle::Regular,
        GRAY,
        &format!("Generado el {}", generated.format("%d/%m/%Y %H:%M")),
    );
    page.draw_text_centered(
        LETTER_WIDTH / 2.0,
        30.0,
        8.0,
        FontStyle::Regular,
        GRAY,
        &config.byline,
    );
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use crate::models::{Counterpart, FileReference, InvoiceLineRef};

    fn unit() -> UnitInfo {
        UnitInfo {
            name: "Edificio Los Cedros PH".to_string(),
            tax_id: "901234567".to_string(),
            address: Some("Calle 10 # 5-51".to_string()),
            logo: None,
            default_bank_name: Some("Bancolombia".to_string()),
            default_account_type: Some("Ahorros".to_string()),
            default_elaborated_by: Some("A. Pérez".to_string()),
            default_reviewed_by: None,
            default_approved_by: None,
            default_recorded_by: None,
        }
    }

    fn payment(lines: usize) -> PaymentRecord {
        let invoice_lines = (0..lines)
            .map(|i| InvoiceLineRef {
                number: format!("FV-{}", i + 1),
                date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
                description: Some("Mantenimiento ascensor".to_string()),
                amount_applied: 250_000.0,
                file: Some(FileReference::new("https://files.example/fv.pdf")),
            })
            .collect();

        PaymentRecord {
            consecutive: Some(7),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            counterpart: Counterpart {
                name: "Ascensores Andinos SAS".to_string(),
                nit: "800999111".to_string(),
                dv: Some("2".to_string()),
                phone: Some("3001234567".to_string()),
                city: Some("Bogotá".to_string()),
                bank_account: Some("123-456789-01".to_string()),
            },
            gross_amount: 250_000.0 * lines as f64,
            retefuente: 8_750.0,
            reteica: 2_415.0,
            net_amount: 250_000.0 * lines as f64 - 11_165.0,
            payment_method: Some("Transferencia".to_string()),
            bank_name: None,
            account_type: None,
            transaction_ref: Some("TRX-5521".to_string()),
            observations: Some("Pago mensual según contrato".to_string()),
            invoice_lines,
            support_file: None,
            payroll_file: None,
        }
    }

    fn fixed_config() -> EngineConfig {
        EngineConfig {
            generated_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn single_payment_fits_one_page() {
        let unit = unit();
        let payment = payment(3);
        let input = ReceiptInput { unit: &unit, payment: &payment, logo: None };

        let bytes = render_receipt(&input, &fixed_config()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn many_lines_overflow_to_second_page() {
        let unit = unit();
        let payment = payment(40);
        let input = ReceiptInput { unit: &unit, payment: &payment, logo: None };

        let bytes = render_receipt(&input, &fixed_config()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 2);
    }

    #[test]
    fn broken_logo_is_not_fatal() {
        let unit = unit();
        let payment = payment(1);
        let input = ReceiptInput {
            unit: &unit,
            payment: &payment,
            logo: Some(b"bytes corruptos"),
        };

        assert!(render_receipt(&input, &fixed_config()).is_ok());
    }

    #[test]
    fn deterministic_output_with_fixed_clock() {
        let unit = unit();
        let payment = payment(2);
        let input = ReceiptInput { unit: &unit, payment: &payment, logo: None };
        let config = fixed_config();

        let first = render_receipt(&input, &config).unwrap();
        let second = render_receipt(&input, &config).unwrap();
        assert_eq!(first, second);
    }
}
