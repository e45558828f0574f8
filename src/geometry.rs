//! Primitivas de geometría de página: tamaño carta, franja de sello,
//! escalado proporcional y ancla del sello según la rotación de origen.

/// Tamaño carta en puntos PDF.
pub const LETTER_WIDTH: f64 = 612.0;
pub const LETTER_HEIGHT: f64 = 792.0;

/// Franja inferior reservada para el sello físico (~1.4 cm). El contenido
/// visual nunca la ocupa; solo la marca de agua se dibuja dentro de ella.
pub const STAMP_MARGIN: f64 = 40.0;

/// Margen lateral y superior de la zona segura.
pub const PAGE_PADDING: f64 = 40.0;

/// Separación extra entre el contenido incrustado y la franja del sello.
pub const STAMP_GAP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rotación declarada de una página de origen. Es una propiedad de la página
/// incrustada, no de la página nueva, y gobierna la posición del sello.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Normaliza cualquier múltiplo de 90 (incluidos negativos) a los cuatro
    /// casos válidos. Valores fuera de la grilla caen en 0 grados.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Quarter,
            180 => Rotation::Half,
            270 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

/// Escala para encajar `source` dentro de `max`, sin agrandar nunca: si el
/// contenido ya cabe, la escala es 1.0.
pub fn fit_within_bounds(source_w: f64, source_h: f64, max_w: f64, max_h: f64) -> f64 {
    fit_scale(source_w, source_h, max_w, max_h).min(1.0)
}

/// Variante sin tope superior, usada al repaginar documentos completos donde
/// una página pequeña sí puede ampliarse hasta la zona segura.
pub fn fit_scale(source_w: f64, source_h: f64, max_w: f64, max_h: f64) -> f64 {
    if source_w <= 0.0 || source_h <= 0.0 {
        return 1.0;
    }
    (max_w / source_w).min(max_h / source_h)
}

/// Rectángulo dibujable de una página: excluye la franja del sello abajo y
/// los márgenes simétricos a los lados y arriba.
pub fn safe_area(page_w: f64, page_h: f64, reserved_bottom: f64, margin: f64) -> Rect {
    Rect {
        x: margin,
        y: reserved_bottom,
        width: page_w - margin * 2.0,
        height: page_h - reserved_bottom - margin,
    }
}

/// Ancla del sello inferior según la rotación de la página de origen.
///
/// El "abajo" visual de una página rotada no coincide con el origen de sus
/// coordenadas internas; cada caso reubica el texto para que, ya impreso,
/// quede centrado en el borde inferior tal como lo ve una persona.
pub fn watermark_anchor(
    page_w: f64,
    page_h: f64,
    rotation: Rotation,
    text_width: f64,
    margin: f64,
) -> (f64, f64) {
    match rotation {
        Rotation::None => ((page_w - text_width) / 2.0, margin),
        Rotation::Quarter => (page_w - margin, (page_h - text_width) / 2.0),
        Rotation::Half => ((page_w + text_width) / 2.0, page_h - margin),
        Rotation::ThreeQuarter => (margin, (page_h + text_width) / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_normalizes_degrees() {
        assert_eq!(Rotation::from_degrees(0), Rotation::None);
        assert_eq!(Rotation::from_degrees(90), Rotation::Quarter);
        assert_eq!(Rotation::from_degrees(450), Rotation::Quarter);
        assert_eq!(Rotation::from_degrees(-90), Rotation::ThreeQuarter);
        assert_eq!(Rotation::from_degrees(360), Rotation::None);
        assert_eq!(Rotation::from_degrees(45), Rotation::None);
    }

    #[test]
    fn fit_never_upscales_content_already_inside() {
        let scale = fit_within_bounds(200.0, 100.0, 500.0, 500.0);
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn fit_downscales_oversized_content() {
        let scale = fit_within_bounds(1000.0, 500.0, 500.0, 500.0);
        assert!((scale - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fit_scale_may_enlarge_small_pages() {
        let scale = fit_scale(100.0, 100.0, 500.0, 400.0);
        assert!((scale - 4.0).abs() < 1e-9);
    }

    #[test]
    fn safe_area_excludes_stamp_strip() {
        let area = safe_area(LETTER_WIDTH, LETTER_HEIGHT, STAMP_MARGIN + STAMP_GAP, PAGE_PADDING);
        assert_eq!(area.y, 50.0);
        assert_eq!(area.width, LETTER_WIDTH - 80.0);
        assert_eq!(area.height, LETTER_HEIGHT - 50.0 - 40.0);
    }

    // El ancla debe caer en la banda inferior *visual* para cada rotación.
    #[test]
    fn watermark_anchor_per_rotation_quadrant() {
        let (w, h, tw, m) = (612.0, 792.0, 100.0, 20.0);

        let (x, y) = watermark_anchor(w, h, Rotation::None, tw, m);
        assert!(y < h / 4.0);
        assert!((x - (w - tw) / 2.0).abs() < 1e-9);

        let (x, y) = watermark_anchor(w, h, Rotation::Quarter, tw, m);
        assert!(x > w * 3.0 / 4.0);
        assert!((y - (h - tw) / 2.0).abs() < 1e-9);

        let (x, y) = watermark_anchor(w, h, Rotation::Half, tw, m);
        assert!(y > h * 3.0 / 4.0);
        assert!(x > w / 2.0);

        let (x, y) = watermark_anchor(w, h, Rotation::ThreeQuarter, tw, m);
        assert!(x < w / 4.0);
        assert!(y > h / 2.0);
    }
}
