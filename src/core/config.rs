use chrono::{DateTime, Utc};

/// Color RGB en el rango 0.0..=1.0, tal como lo esperan los operadores PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// Conversión desde los valores 0-255 usados por el sistema de origen.
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Color {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

// Paleta del sistema (Indigo-600, Gray-500, Gray-900, rojo de alerta).
pub const PRIMARY: Color = Color::from_rgb8(79, 70, 229);
pub const GRAY: Color = Color::from_rgb8(107, 114, 128);
pub const DARK: Color = Color::from_rgb8(17, 24, 39);
pub const ALERT: Color = Color::new(0.8, 0.0, 0.0);
pub const ZEBRA: Color = Color::from_rgb8(245, 245, 245);
pub const TOTAL_FILL: Color = Color::from_rgb8(236, 253, 245);
pub const TOTAL_TEXT: Color = Color::from_rgb8(5, 150, 105);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Descargas simultáneas máximas por lote de adjuntos.
    pub fetch_concurrency: usize,
    /// Tamaño del sello inferior en adjuntos de pagos.
    pub watermark_size: f64,
    /// Tamaño del sello en facturas pendientes (más visible).
    pub pending_watermark_size: f64,
    /// Marca de tiempo fija para salidas deterministas; `None` usa `Utc::now()`.
    pub generated_at: Option<DateTime<Utc>>,
    /// Línea institucional del pie de página de los comprobantes.
    pub byline: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fetch_concurrency: 4,
            watermark_size: 9.0,
            pending_watermark_size: 12.0,
            generated_at: None,
            byline: "Sistema de Gestión Administrativa".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn now(&self) -> DateTime<Utc> {
        self.generated_at.unwrap_or_else(Utc::now)
    }
}
