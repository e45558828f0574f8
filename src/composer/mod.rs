//! Compositor del paquete: portada, índice paginado y la secuencia legal de
//! comprobantes y soportes de cada pago, seguida de las facturas pendientes.
//!
//! El `DocumentBuilder` se enhebra por propiedad a través de cada etapa; las
//! descargas se adelantan en paralelo pero toda mutación de páginas ocurre en
//! el orden fijo del paquete.

use std::sync::Arc;

use tracing::{info, warn};

use crate::attach::{self, Watermark};
use crate::core::{
    config::{ALERT, DARK, GRAY, PRIMARY, TOTAL_FILL, TOTAL_TEXT, ZEBRA},
    AssemblyError, AssemblyResult, Color, EngineConfig,
};
use crate::fetch::{self, FileFetcher};
use crate::geometry::{fit_within_bounds, LETTER_HEIGHT, LETTER_WIDTH, PAGE_PADDING};
use crate::models::{PackageRequest, PaymentRecord, PendingInvoiceRecord};
use crate::pdf::{embed, DocumentBuilder, FontStyle, PageBuilder};
use crate::render::{format_date, format_money, receipt, receipt::ReceiptInput};

const WHITE: Color = Color::new(1.0, 1.0, 1.0);

const MARGIN: f64 = PAGE_PADDING;
const RIGHT_EDGE: f64 = LETTER_WIDTH - MARGIN;
const ROW_HEIGHT: f64 = 15.0;
/// Cursor mínimo antes de abrir una página nueva del índice.
const INDEX_FLOOR: f64 = 70.0;

// Columnas del índice de pagos.
const COL_DOC: f64 = MARGIN + 4.0;
const COL_DATE: f64 = 112.0;
const COL_NAME: f64 = 178.0;
const COL_INVOICES: f64 = 372.0;
const COL_TOTAL_RIGHT: f64 = RIGHT_EDGE - 4.0;

/// Etiqueta del sello para facturas aún no pagadas.
const PENDING_LABEL: &str = "FACTURA PENDIENTE";

/// Ensambla el paquete completo del período y devuelve los bytes del PDF.
///
/// Las fallas por adjunto se registran y el paquete continúa; solo los
/// errores de construcción del documento base abortan la llamada.
pub async fn assemble(
    request: &PackageRequest,
    fetcher: Arc<dyn FileFetcher>,
    config: &EngineConfig,
) -> AssemblyResult<Vec<u8>> {
    validate(request)?;

    let mut builder = DocumentBuilder::new();

    // El logo se descarga una sola vez y se reutiliza en portada y
    // comprobantes; su ausencia o falla nunca es fatal.
    let logo = match &request.unit.logo {
        Some(reference) => match fetcher.fetch(&reference.url).await {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(url = %reference.url, %error, "no se pudo descargar el logo");
                None
            }
        },
        None => None,
    };

    let mut payments: Vec<&PaymentRecord> = request.payments.iter().collect();
    payments.sort_by_key(|p| p.consecutive.unwrap_or(0));

    draw_cover(&mut builder, request, logo.as_deref(), config);
    draw_payment_index(&mut builder, &payments);
    if !request.pending_invoices.is_empty() {
        draw_pending_index(&mut builder, &request.pending_invoices);
    }

    for payment in &payments {
        append_payment(
            &mut builder,
            request,
            payment,
            logo.as_deref(),
            &fetcher,
            config,
        )
        .await;
    }
    append_pending_invoices(&mut builder, &request.pending_invoices, &fetcher, config).await;

    let pages = builder.page_count();
    info!(
        pages,
        payments = payments.len(),
        pending = request.pending_invoices.len(),
        "paquete ensamblado"
    );
    builder.finish()
}

fn validate(request: &PackageRequest) -> AssemblyResult<()> {
    if request.unit.name.trim().is_empty() {
        return Err(AssemblyError::InvalidRequest(
            "el nombre de la unidad es obligatorio".to_string(),
        ));
    }
    if request.unit.tax_id.trim().is_empty() {
        return Err(AssemblyError::InvalidRequest(
            "el NIT de la unidad es obligatorio".to_string(),
        ));
    }
    if request.month.trim().is_empty() || request.year.trim().is_empty() {
        return Err(AssemblyError::InvalidRequest(
            "el período (mes y año) es obligatorio".to_string(),
        ));
    }
    Ok(())
}

fn draw_cover(
    builder: &mut DocumentBuilder,
    request: &PackageRequest,
    logo: Option<&[u8]>,
    config: &EngineConfig,
) {
    let mut page = builder.start_page();

    if let Some(bytes) = logo {
        match embed::embed_image(builder, bytes, None) {
            Ok(image) => {
                let scale = fit_within_bounds(image.width as f64, image.height as f64, 140.0, 90.0);
                let width = image.width as f64 * scale;
                let height = image.height as f64 * scale;
                let name = page.register_xobject(image.xobject);
                page.draw_image(
                    &name,
                    width,
                    height,
                    (LETTER_WIDTH - width) / 2.0,
                    LETTER_HEIGHT - 160.0,
                );
            }
            Err(error) => {
                warn!(%error, "no se pudo incrustar el logo en la portada");
            }
        }
    }

    let title = if request.skip_internal_receipts {
        "CARPETA CONTABLE (SOLO SOPORTES)"
    } else {
        "CARPETA CONTABLE"
    };
    let center = LETTER_WIDTH / 2.0;
    page.draw_text_centered(center, LETTER_HEIGHT - 250.0, 22.0, FontStyle::Bold, PRIMARY, title);
    page.draw_text_centered(
        center,
        LETTER_HEIGHT - 282.0,
        15.0,
        FontStyle::Bold,
        DARK,
        &format!("{} {}", request.month, request.year),
    );

    page.stroke_line(center - 110.0, LETTER_HEIGHT - 302.0, center + 110.0, LETTER_HEIGHT - 302.0, 1.0, PRIMARY);

    page.draw_text_centered(
        center,
        LETTER_HEIGHT - 330.0,
        12.0,
        FontStyle::Bold,
        DARK,
        &request.unit.name,
    );
    page.draw_text_centered(
        center,
        LETTER_HEIGHT - 347.0,
        10.0,
        FontStyle::Regular,
        GRAY,
        &format!("NIT: {}", request.unit.tax_id),
    );
    if let Some(address) = &request.unit.address {
        page.draw_text_centered(center, LETTER_HEIGHT - 362.0, 10.0, FontStyle::Regular, GRAY, address);
    }

    page.draw_text_centered(
        center,
        90.0,
        8.5,
        FontStyle::Regular,
        GRAY,
        &format!("Generado el {}", config.now().format("%d/%m/%Y %H:%M")),
    );
    page.draw_text_centered(center, 76.0, 8.5, FontStyle::Regular, GRAY, &config.byline);

    builder.push_page(page);
}

/// Índice de pagos: una fila por comprobante, paginado con el título y la
/// franja de encabezado redibujados en cada página nueva.
fn draw_payment_index(builder: &mut DocumentBuilder, payments: &[&PaymentRecord]) {
    let mut page = builder.start_page();
    let mut y = LETTER_HEIGHT - 70.0;
    page.draw_text(MARGIN, y, 13.0, FontStyle::Bold, PRIMARY, "ÍNDICE DE PAGOS");
    y -= 10.0;
    y = draw_payment_head(&mut page, y);

    for (i, payment) in payments.iter().enumerate() {
        if y < INDEX_FLOOR {
            builder.push_page(page);
            page = builder.start_page();
            y = LETTER_HEIGHT - 70.0;
            page.draw_text(
                MARGIN,
                y,
                13.0,
                FontStyle::Bold,
                PRIMARY,
                "ÍNDICE DE PAGOS (continuación)",
            );
            y -= 10.0;
            y = draw_payment_head(&mut page, y);
        }

        if i % 2 == 1 {
            page.fill_rect(MARGIN, y - 4.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT, ZEBRA);
        }

        let invoices: Vec<&str> = payment
            .invoice_lines
            .iter()
            .map(|line| line.number.as_str())
            .collect();
        page.draw_text(COL_DOC, y, 8.0, FontStyle::Bold, DARK, &payment.document_number());
        page.draw_text(COL_DATE, y, 8.0, FontStyle::Regular, DARK, &format_date(payment.date));
        page.draw_text(
            COL_NAME,
            y,
            8.0,
            FontStyle::Regular,
            DARK,
            &truncate(&payment.counterpart.name, 38),
        );
        page.draw_text(
            COL_INVOICES,
            y,
            8.0,
            FontStyle::Regular,
            GRAY,
            &truncate(&invoices.join(", "), 24),
        );
        page.draw_text_right(
            COL_TOTAL_RIGHT,
            y,
            8.0,
            FontStyle::Regular,
            DARK,
            &format_money(payment.net_amount),
        );
        y -= ROW_HEIGHT;
    }

    // Fila de cierre con el total girado del período.
    if y < INDEX_FLOOR {
        builder.push_page(page);
        page = builder.start_page();
        y = LETTER_HEIGHT - 70.0;
    }
    let total: f64 = payments.iter().map(|p| p.net_amount).sum();
    page.fill_rect(MARGIN, y - 4.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT + 2.0, TOTAL_FILL);
    page.draw_text(COL_DOC, y, 9.0, FontStyle::Bold, TOTAL_TEXT, "TOTAL DEL PERÍODO");
    page.draw_text_right(
        COL_TOTAL_RIGHT,
        y,
        9.0,
        FontStyle::Bold,
        TOTAL_TEXT,
        &format_money(total),
    );

    builder.push_page(page);
}

fn draw_payment_head(page: &mut PageBuilder, y: f64) -> f64 {
    page.fill_rect(MARGIN, y - 4.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT + 2.0, PRIMARY);
    page.draw_text(COL_DOC, y, 8.0, FontStyle::Bold, WHITE, "Comprobante");
    page.draw_text(COL_DATE, y, 8.0, FontStyle::Bold, WHITE, "Fecha");
    page.draw_text(COL_NAME, y, 8.0, FontStyle::Bold, WHITE, "Beneficiario");
    page.draw_text(COL_INVOICES, y, 8.0, FontStyle::Bold, WHITE, "Facturas");
    page.draw_text_right(COL_TOTAL_RIGHT, y, 8.0, FontStyle::Bold, WHITE, "Valor Neto");
    y - (ROW_HEIGHT + 6.0)
}

/// Tabla de facturas pendientes, con encabezado en color de alerta.
fn draw_pending_index(builder: &mut DocumentBuilder, pending: &[PendingInvoiceRecord]) {
    let mut page = builder.start_page();
    let mut y = LETTER_HEIGHT - 70.0;
    page.draw_text(MARGIN, y, 13.0, FontStyle::Bold, ALERT, "FACTURAS PENDIENTES POR PAGAR");
    y -= 10.0;
    y = draw_pending_head(&mut page, y);

    for (i, invoice) in pending.iter().enumerate() {
        if y < INDEX_FLOOR {
            builder.push_page(page);
            page = builder.start_page();
            y = LETTER_HEIGHT - 70.0;
            page.draw_text(
                MARGIN,
                y,
                13.0,
                FontStyle::Bold,
                ALERT,
                "FACTURAS PENDIENTES POR PAGAR (continuación)",
            );
            y -= 10.0;
            y = draw_pending_head(&mut page, y);
        }

        if i % 2 == 1 {
            page.fill_rect(MARGIN, y - 4.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT, ZEBRA);
        }

        page.draw_text(COL_DOC, y, 8.0, FontStyle::Bold, DARK, &invoice.number);
        page.draw_text(COL_DATE, y, 8.0, FontStyle::Regular, DARK, &format_date(invoice.date));
        page.draw_text(
            COL_NAME,
            y,
            8.0,
            FontStyle::Regular,
            DARK,
            &truncate(&invoice.counterpart_name, 40),
        );
        page.draw_text_right(
            COL_INVOICES + 60.0,
            y,
            8.0,
            FontStyle::Regular,
            DARK,
            &format_money(invoice.total_amount),
        );
        page.draw_text_right(
            COL_TOTAL_RIGHT,
            y,
            8.0,
            FontStyle::Bold,
            ALERT,
            &format_money(invoice.outstanding()),
        );
        y -= ROW_HEIGHT;
    }

    builder.push_page(page);
}

fn draw_pending_head(page: &mut PageBuilder, y: f64) -> f64 {
    page.fill_rect(MARGIN, y - 4.0, RIGHT_EDGE - MARGIN, ROW_HEIGHT + 2.0, ALERT);
    page.draw_text(COL_DOC, y, 8.0, FontStyle::Bold, WHITE, "Factura");
    page.draw_text(COL_DATE, y, 8.0, FontStyle::Bold, WHITE, "Fecha");
    page.draw_text(COL_NAME, y, 8.0, FontStyle::Bold, WHITE, "Proveedor");
    page.draw_text_right(COL_INVOICES + 60.0, y, 8.0, FontStyle::Bold, WHITE, "Valor Total");
    page.draw_text_right(COL_TOTAL_RIGHT, y, 8.0, FontStyle::Bold, WHITE, "Saldo");
    y - (ROW_HEIGHT + 6.0)
}

/// Comprobante más soportes de un pago, en el orden legal: comprobante,
/// facturas originales, soporte firmado y planilla PILA.
async fn append_payment(
    builder: &mut DocumentBuilder,
    request: &PackageRequest,
    payment: &PaymentRecord,
    logo: Option<&[u8]>,
    fetcher: &Arc<dyn FileFetcher>,
    config: &EngineConfig,
) {
    let label = payment.label();

    if !request.skip_internal_receipts {
        let input = ReceiptInput {
            unit: &request.unit,
            payment,
            logo,
        };
        match receipt::render_receipt(&input, config) {
            // El comprobante entra al paquete por la misma vía paginada que
            // cualquier PDF, sin sello.
            Ok(bytes) => {
                if let Err(error) = attach::normalize(builder, &bytes, None) {
                    warn!(%label, %error, "no se pudo repaginar el comprobante");
                }
            }
            Err(error) => {
                warn!(%label, %error, "no se pudo renderizar el comprobante");
            }
        }
    }

    // Soportes del pago, en orden: cada URL con el texto de su sello.
    let mut jobs: Vec<(String, String)> = Vec::new();
    for line in &payment.invoice_lines {
        if let Some(file) = &line.file {
            jobs.push((file.url.clone(), label.clone()));
        }
    }
    if let Some(file) = &payment.support_file {
        jobs.push((file.url.clone(), label.clone()));
    }
    if request.include_payroll_filings {
        if let Some(file) = &payment.payroll_file {
            jobs.push((file.url.clone(), format!("PILA {}", label)));
        }
    }

    let urls: Vec<String> = jobs.iter().map(|(url, _)| url.clone()).collect();
    let downloads = fetch::prefetch(Arc::clone(fetcher), &urls, config.fetch_concurrency).await;

    for ((url, text), download) in jobs.iter().zip(downloads) {
        match download {
            Ok(bytes) => {
                let mark = Watermark::new(text, config.watermark_size);
                if let Err(error) = attach::normalize(builder, &bytes, Some(mark)) {
                    warn!(%url, %error, "soporte omitido por error de normalización");
                }
            }
            Err(error) => {
                warn!(%url, %error, "soporte omitido por error de descarga");
            }
        }
    }
}

async fn append_pending_invoices(
    builder: &mut DocumentBuilder,
    pending: &[PendingInvoiceRecord],
    fetcher: &Arc<dyn FileFetcher>,
    config: &EngineConfig,
) {
    let urls: Vec<String> = pending
        .iter()
        .filter_map(|invoice| invoice.file.as_ref().map(|f| f.url.clone()))
        .collect();
    let downloads = fetch::prefetch(Arc::clone(fetcher), &urls, config.fetch_concurrency).await;

    for (url, download) in urls.iter().zip(downloads) {
        match download {
            Ok(bytes) => {
                let mark = Watermark::new(PENDING_LABEL, config.pending_watermark_size);
                if let Err(error) = attach::normalize(builder, &bytes, Some(mark)) {
                    warn!(%url, %error, "factura pendiente omitida por error de normalización");
                }
            }
            Err(error) => {
                warn!(%url, %error, "factura pendiente omitida por error de descarga");
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
