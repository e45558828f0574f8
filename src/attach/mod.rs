//! Normalizador de adjuntos: convierte un blob crudo en cero o más páginas
//! carta dentro del documento de salida, con el sello inferior correcto.
//!
//! El tipo se decide una sola vez por contenido (nunca por el nombre del
//! archivo) y el resto del flujo despacha sobre esa variante.

use crate::core::{config::ALERT, AttachmentError};
use crate::geometry::{
    fit_scale, fit_within_bounds, safe_area, watermark_anchor, Rotation, LETTER_HEIGHT,
    LETTER_WIDTH, PAGE_PADDING, STAMP_GAP, STAMP_MARGIN,
};
use crate::pdf::{embed, metrics, DocumentBuilder, FontStyle, PageBuilder};

/// Clasificación por bytes mágicos del contenido descargado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Png,
    Jpeg,
    /// Sin firma reconocible; se intenta decodificar como imagen de todos
    /// modos antes de descartar el adjunto.
    Unknown,
}

impl SourceKind {
    pub fn sniff(bytes: &[u8]) -> SourceKind {
        if bytes.starts_with(b"%PDF-") {
            SourceKind::Pdf
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            SourceKind::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            SourceKind::Jpeg
        } else {
            SourceKind::Unknown
        }
    }
}

/// Sello de texto rojo en el borde inferior visual de la página.
#[derive(Debug, Clone, Copy)]
pub struct Watermark<'a> {
    pub text: &'a str,
    pub size: f64,
}

impl<'a> Watermark<'a> {
    pub fn new(text: &'a str, size: f64) -> Self {
        Watermark { text, size }
    }
}

/// Normaliza un adjunto dentro del documento. Devuelve cuántas páginas
/// aportó; cualquier error deja el documento sin páginas nuevas y es
/// responsabilidad del compositor registrarlo y continuar.
pub fn normalize(
    builder: &mut DocumentBuilder,
    bytes: &[u8],
    watermark: Option<Watermark<'_>>,
) -> Result<usize, AttachmentError> {
    match SourceKind::sniff(bytes) {
        SourceKind::Pdf => normalize_pdf(builder, bytes, watermark),
        SourceKind::Png => normalize_image(builder, bytes, Some(image::ImageFormat::Png), watermark),
        SourceKind::Jpeg => {
            normalize_image(builder, bytes, Some(image::ImageFormat::Jpeg), watermark)
        }
        SourceKind::Unknown => normalize_image(builder, bytes, None, watermark),
    }
}

/// Repagina cada página del documento de origen en una página carta nueva,
/// centrada en la zona segura sobre la franja del sello.
fn normalize_pdf(
    builder: &mut DocumentBuilder,
    bytes: &[u8],
    watermark: Option<Watermark<'_>>,
) -> Result<usize, AttachmentError> {
    let pages = embed::embed_pdf_pages(builder, bytes)?;
    let area = safe_area(
        LETTER_WIDTH,
        LETTER_HEIGHT,
        STAMP_MARGIN + STAMP_GAP,
        PAGE_PADDING,
    );
    let appended = pages.len();

    for source in pages {
        let scale = fit_scale(source.width, source.height, area.width, area.height);
        let draw_w = source.width * scale;
        let draw_h = source.height * scale;
        let x = (LETTER_WIDTH - draw_w) / 2.0;
        let y = area.y + (area.height - draw_h) / 2.0;

        let mut page = builder.start_page();
        // La página nueva hereda la rotación declarada por la de origen.
        page.set_rotation(source.rotation.degrees());
        let name = page.register_xobject(source.xobject);
        page.draw_form(
            &name,
            scale,
            x - scale * source.origin_x,
            y - scale * source.origin_y,
        );

        if let Some(mark) = watermark {
            draw_watermark(&mut page, mark, source.rotation);
        }
        builder.push_page(page);
    }

    Ok(appended)
}

/// Una imagen ocupa exactamente una página carta; nunca se agranda más allá
/// de su tamaño original.
fn normalize_image(
    builder: &mut DocumentBuilder,
    bytes: &[u8],
    format: Option<image::ImageFormat>,
    watermark: Option<Watermark<'_>>,
) -> Result<usize, AttachmentError> {
    let image = embed::embed_image(builder, bytes, format)?;

    let max_w = LETTER_WIDTH - PAGE_PADDING * 2.0;
    let max_h = LETTER_HEIGHT - PAGE_PADDING * 2.0 - STAMP_MARGIN;
    let scale = fit_within_bounds(image.width as f64, image.height as f64, max_w, max_h);
    let draw_w = image.width as f64 * scale;
    let draw_h = image.height as f64 * scale;

    let mut page = builder.start_page();
    let name = page.register_xobject(image.xobject);
    page.draw_image(
        &name,
        draw_w,
        draw_h,
        (LETTER_WIDTH - draw_w) / 2.0,
        STAMP_MARGIN + (LETTER_HEIGHT - STAMP_MARGIN - draw_h) / 2.0,
    );

    if let Some(mark) = watermark {
        draw_watermark(&mut page, mark, Rotation::None);
    }
    builder.push_page(page);

    Ok(1)
}

fn draw_watermark(page: &mut PageBuilder, mark: Watermark<'_>, rotation: Rotation) {
    let text_width = metrics::text_width(mark.text, mark.size, true);
    let margin = STAMP_MARGIN / 2.0;
    let (x, y) = watermark_anchor(LETTER_WIDTH, LETTER_HEIGHT, rotation, text_width, margin);
    page.draw_rotated_text(
        x,
        y,
        mark.size,
        rotation.degrees(),
        FontStyle::Bold,
        ALERT,
        mark.text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DARK;

    fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut builder = DocumentBuilder::new();
        for i in 0..pages {
            let mut page = builder.start_page();
            page.draw_text(
                72.0,
                700.0,
                11.0,
                FontStyle::Regular,
                DARK,
                &format!("página {}", i + 1),
            );
            builder.push_page(page);
        }
        builder.finish().unwrap()
    }

    fn sample_jpeg() -> Vec<u8> {
        let mut bytes = Vec::new();
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([200, 200, 200]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Jpeg(90),
            )
            .unwrap();
        bytes
    }

    #[test]
    fn sniff_by_magic_bytes() {
        assert_eq!(SourceKind::sniff(b"%PDF-1.4 ..."), SourceKind::Pdf);
        assert_eq!(
            SourceKind::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            SourceKind::Png
        );
        assert_eq!(SourceKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), SourceKind::Jpeg);
        assert_eq!(SourceKind::sniff(b"cualquier otra cosa"), SourceKind::Unknown);
    }

    #[test]
    fn pdf_contributes_one_letter_page_per_source_page() {
        let mut builder = DocumentBuilder::new();
        let source = sample_pdf(3);

        let pages =
            normalize(&mut builder, &source, Some(Watermark::new("CE-12", 9.0))).unwrap();
        assert_eq!(pages, 3);
        assert_eq!(builder.page_count(), 3);
    }

    #[test]
    fn rotated_source_keeps_its_rotation_and_rotates_the_watermark() {
        let mut origin = DocumentBuilder::new();
        let mut page = origin.start_page();
        page.set_rotation(90);
        page.draw_text(72.0, 700.0, 11.0, FontStyle::Regular, DARK, "apaisado");
        origin.push_page(page);
        let source = origin.finish().unwrap();

        let mut builder = DocumentBuilder::new();
        normalize(&mut builder, &source, Some(Watermark::new("CE-9", 9.0))).unwrap();
        let bytes = builder.finish().unwrap();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();

        // La página nueva hereda el /Rotate de la de origen.
        let dict = doc.get_dictionary(page_id).unwrap();
        assert_eq!(dict.get(b"Rotate").unwrap().as_i64().unwrap(), 90);

        // Y el sello se dibuja con la matriz de 90 grados, no horizontal.
        let content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
        let stamp = content
            .lines()
            .find(|line| line.contains("(CE-9)"))
            .expect("sello presente");
        assert!(stamp.contains("0 1 -1 0"));
    }

    #[test]
    fn image_contributes_exactly_one_page() {
        let mut builder = DocumentBuilder::new();

        let pages = normalize(&mut builder, &sample_jpeg(), None).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(builder.page_count(), 1);
    }

    #[test]
    fn unknown_bytes_fall_back_to_image_decoding() {
        let mut builder = DocumentBuilder::new();

        // Firma irreconocible y contenido indecodificable: error recuperable
        // sin páginas a medias.
        let result = normalize(&mut builder, b"blob opaco", None);
        assert!(result.is_err());
        assert_eq!(builder.page_count(), 0);
    }
}
