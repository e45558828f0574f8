use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::core::{AssemblyResult, Color};
use crate::geometry::{LETTER_HEIGHT, LETTER_WIDTH};

use super::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold)
    }
}

/// Acumulador del documento de salida: una secuencia de páginas carta en
/// orden de inserción. Se enhebra por propiedad a través del compositor; toda
/// mutación de páginas pasa por aquí, lo que serializa el orden final.
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_regular: ObjectId,
    font_bold: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        DocumentBuilder {
            doc,
            pages_id,
            font_regular,
            font_bold,
            page_ids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Página carta nueva, aún sin anexar; el contenido se dibuja sobre el
    /// `PageBuilder` y se anexa con [`DocumentBuilder::push_page`].
    pub fn start_page(&self) -> PageBuilder {
        PageBuilder::new()
    }

    /// Anexa la página al final del documento. El orden de anexado es el
    /// orden legal del paquete; nunca se reordena.
    pub fn push_page(&mut self, page: PageBuilder) {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), page.content.into_bytes()));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => self.font_regular,
                "F2" => self.font_bold,
            },
        };
        if !page.xobjects.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in &page.xobjects {
                xobjects.set(name.as_bytes(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(LETTER_WIDTH as f32),
                Object::Real(LETTER_HEIGHT as f32),
            ],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(resources),
        };
        if let Some(degrees) = page.rotate {
            page_dict.set("Rotate", Object::Integer(degrees));
        }

        let page_id = self.doc.add_object(page_dict);
        self.page_ids.push(page_id);
    }

    /// Cierra el árbol de páginas y serializa el PDF completo.
    pub fn finish(mut self) -> AssemblyResult<Vec<u8>> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();
        let count = self.page_ids.len() as i64;

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Página en construcción: acumula operadores de contenido y los XObjects
/// que referencia. No toca el documento hasta `push_page`.
pub struct PageBuilder {
    content: String,
    xobjects: Vec<(String, ObjectId)>,
    rotate: Option<i64>,
}

impl PageBuilder {
    fn new() -> Self {
        PageBuilder {
            content: String::new(),
            xobjects: Vec::new(),
            rotate: None,
        }
    }

    /// Declara la rotación heredada de la página de origen incrustada.
    pub fn set_rotation(&mut self, degrees: i64) {
        if degrees != 0 {
            self.rotate = Some(degrees);
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.content.push_str(&format!(
            "{:.3} {:.3} {:.3} rg {:.2} {:.2} {:.2} {:.2} re f\n",
            color.r, color.g, color.b, x, y, width, height
        ));
    }

    pub fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color) {
        self.content.push_str(&format!(
            "{:.3} {:.3} {:.3} RG {:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n",
            color.r, color.g, color.b, width, x1, y1, x2, y2
        ));
    }

    pub fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        font: FontStyle,
        color: Color,
        text: &str,
    ) {
        self.content.push_str(&format!(
            "BT /{} {:.2} Tf {:.3} {:.3} {:.3} rg 1 0 0 1 {:.2} {:.2} Tm ",
            font.resource_name(),
            size,
            color.r,
            color.g,
            color.b,
            x,
            y
        ));
        self.push_string_literal(text);
        self.content.push_str(" Tj ET\n");
    }

    /// Texto centrado horizontalmente alrededor de `center_x`.
    pub fn draw_text_centered(
        &mut self,
        center_x: f64,
        y: f64,
        size: f64,
        font: FontStyle,
        color: Color,
        text: &str,
    ) {
        let width = metrics::text_width(text, size, font.is_bold());
        self.draw_text(center_x - width / 2.0, y, size, font, color, text);
    }

    /// Texto alineado a la derecha contra `right_x` (columnas de moneda).
    pub fn draw_text_right(
        &mut self,
        right_x: f64,
        y: f64,
        size: f64,
        font: FontStyle,
        color: Color,
        text: &str,
    ) {
        let width = metrics::text_width(text, size, font.is_bold());
        self.draw_text(right_x - width, y, size, font, color, text);
    }

    /// Texto rotado en múltiplos de 90 grados, anclado en `(x, y)`. Usado por
    /// el sello inferior de adjuntos rotados.
    pub fn draw_rotated_text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        degrees: i64,
        font: FontStyle,
        color: Color,
        text: &str,
    ) {
        let (cos, sin) = match degrees.rem_euclid(360) {
            90 => (0.0, 1.0),
            180 => (-1.0, 0.0),
            270 => (0.0, -1.0),
            _ => (1.0, 0.0),
        };
        self.content.push_str(&format!(
            "BT /{} {:.2} Tf {:.3} {:.3} {:.3} rg {:.0} {:.0} {:.0} {:.0} {:.2} {:.2} Tm ",
            font.resource_name(),
            size,
            color.r,
            color.g,
            color.b,
            cos,
            sin,
            -sin,
            cos,
            x,
            y
        ));
        self.push_string_literal(text);
        self.content.push_str(" Tj ET\n");
    }

    /// Registra un XObject para esta página y devuelve su nombre de recurso.
    pub fn register_xobject(&mut self, id: ObjectId) -> String {
        let name = format!("X{}", self.xobjects.len());
        self.xobjects.push((name.clone(), id));
        name
    }

    /// Dibuja un Form XObject con escala uniforme y traslación.
    pub fn draw_form(&mut self, name: &str, scale: f64, tx: f64, ty: f64) {
        self.content.push_str(&format!(
            "q {:.4} 0 0 {:.4} {:.2} {:.2} cm /{} Do Q\n",
            scale, scale, tx, ty, name
        ));
    }

    /// Dibuja un Image XObject con el tamaño de despliegue dado.
    pub fn draw_image(&mut self, name: &str, width: f64, height: f64, x: f64, y: f64) {
        self.content.push_str(&format!(
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{} Do Q\n",
            width, height, x, y, name
        ));
    }

    fn push_string_literal(&mut self, text: &str) {
        self.content.push('(');
        // Bytes WinAnsi ya escapados; son Latin-1 válidos dentro del literal.
        for byte in metrics::encode_win_ansi(text) {
            self.content.push(byte as char);
        }
        self.content.push(')');
    }

    #[cfg(test)]
    pub(crate) fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DARK;

    #[test]
    fn finished_document_has_pdf_magic_and_pages() {
        let mut builder = DocumentBuilder::new();
        let mut page = builder.start_page();
        page.draw_text(50.0, 700.0, 12.0, FontStyle::Bold, DARK, "Hola");
        builder.push_page(page);
        builder.push_page(builder.start_page());

        assert_eq!(builder.page_count(), 2);
        let bytes = builder.finish().expect("documento serializable");
        assert!(bytes.starts_with(b"%PDF-"));

        let parsed = lopdf::Document::load_mem(&bytes).expect("PDF legible");
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn rotated_text_uses_rotation_matrix() {
        let builder = DocumentBuilder::new();
        let mut page = builder.start_page();
        page.draw_rotated_text(10.0, 20.0, 9.0, 90, FontStyle::Bold, DARK, "CE-1");
        assert!(page.content().contains("0 1 -1 0 10.00 20.00 Tm"));
    }

    #[test]
    fn string_literal_escapes_parentheses() {
        let builder = DocumentBuilder::new();
        let mut page = builder.start_page();
        page.draw_text(0.0, 0.0, 9.0, FontStyle::Regular, DARK, "(-) Retención");
        assert!(page.content().contains("\\(-\\)"));
    }
}
