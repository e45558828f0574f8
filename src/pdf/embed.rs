//! Incrustación de contenido ajeno en el documento de salida: páginas de
//! otros PDF como Form XObjects y rasters decodificados como Image XObjects.

use std::collections::BTreeSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::core::AttachmentError;
use crate::geometry::Rotation;

use super::document::DocumentBuilder;

/// Una página de origen ya copiada al documento destino, lista para
/// dibujarse con `PageBuilder::draw_form`.
pub struct EmbeddedPage {
    pub xobject: ObjectId,
    pub width: f64,
    pub height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Rotación declarada por la página de origen; gobierna el sello.
    pub rotation: Rotation,
}

pub struct EmbeddedImage {
    pub xobject: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Copia todas las páginas de un PDF de origen al documento destino como
/// Form XObjects. Los objetos del origen se renumeran por encima del máximo
/// del destino para que las referencias internas sobrevivan la copia.
pub fn embed_pdf_pages(
    builder: &mut DocumentBuilder,
    bytes: &[u8],
) -> Result<Vec<EmbeddedPage>, AttachmentError> {
    let mut source = Document::load_mem(bytes)?;
    let dest = builder.doc_mut();

    source.renumber_objects_with(dest.max_id + 1);

    let page_ids: Vec<ObjectId> = source.page_iter().collect();
    if page_ids.is_empty() {
        return Err(AttachmentError::Embed("documento sin páginas".to_string()));
    }

    // La información por página se extrae antes de mover los objetos.
    let mut drafts = Vec::with_capacity(page_ids.len());
    for page_id in &page_ids {
        let content = source
            .get_page_content(*page_id)
            .map_err(|e| AttachmentError::Embed(e.to_string()))?;
        let media_box = inherited_rect(&source, *page_id, b"MediaBox")
            .ok_or_else(|| AttachmentError::Embed("página sin MediaBox".to_string()))?;
        let rotation = inherited_i64(&source, *page_id, b"Rotate").unwrap_or(0);
        let resources = inherited_object(&source, *page_id, b"Resources");
        drafts.push((content, media_box, rotation, resources));
    }

    // Solo cruza el grafo alcanzable desde los recursos de cada página; el
    // árbol de páginas y el catálogo del origen no viajan al destino.
    let mut needed = BTreeSet::new();
    for (_, _, _, resources) in &drafts {
        if let Some(resources) = resources {
            collect_references(&source, resources, &mut needed);
        }
    }
    let source_max = source.max_id;
    let mut source_objects = std::mem::take(&mut source.objects);
    for id in &needed {
        if let Some(object) = source_objects.remove(id) {
            dest.objects.insert(*id, object);
        }
    }
    if source_max > dest.max_id {
        dest.max_id = source_max;
    }

    let mut pages = Vec::with_capacity(drafts.len());
    for (content, [x0, y0, x1, y1], rotation, resources) in drafts {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => vec![
                Object::Real(x0 as f32),
                Object::Real(y0 as f32),
                Object::Real(x1 as f32),
                Object::Real(y1 as f32),
            ],
        };
        if let Some(resources) = resources {
            dict.set("Resources", resources);
        }

        let xobject = dest.add_object(Stream::new(dict, content));
        pages.push(EmbeddedPage {
            xobject,
            width: x1 - x0,
            height: y1 - y0,
            origin_x: x0,
            origin_y: y0,
            rotation: Rotation::from_degrees(rotation),
        });
    }

    Ok(pages)
}

/// Decodifica un raster (PNG/JPEG) y lo agrega como Image XObject RGB con
/// FlateDecode. El canal alfa se compone sobre blanco: los soportes
/// escaneados no dependen de transparencia.
pub fn embed_image(
    builder: &mut DocumentBuilder,
    bytes: &[u8],
    format: Option<image::ImageFormat>,
) -> Result<EmbeddedImage, AttachmentError> {
    let decoded = match format {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in rgba.pixels() {
        let alpha = pixel[3] as u32;
        for channel in 0..3 {
            let value = (pixel[channel] as u32 * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(value as u8);
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&rgb)
        .map_err(|e| AttachmentError::Decode(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| AttachmentError::Decode(e.to_string()))?;

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        compressed,
    );

    let xobject = builder.doc_mut().add_object(stream);
    Ok(EmbeddedImage {
        xobject,
        width,
        height,
    })
}

/// Marca `id` y todo lo alcanzable desde él siguiendo referencias, arreglos,
/// diccionarios y streams. El guardián de `seen` corta los ciclos.
fn collect_references(doc: &Document, object: &Object, seen: &mut BTreeSet<ObjectId>) {
    match object {
        Object::Reference(id) => {
            if seen.insert(*id) {
                if let Ok(target) = doc.get_object(*id) {
                    collect_references(doc, target, seen);
                }
            }
        }
        Object::Array(items) => {
            for item in items {
                collect_references(doc, item, seen);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        _ => {}
    }
}

fn inherited_object(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok());
    }
    None
}

fn inherited_i64(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<i64> {
    match resolve(doc, &inherited_object(doc, page_id, key)?)? {
        Object::Integer(value) => Some(value),
        _ => None,
    }
}

fn inherited_rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f64; 4]> {
    let raw = inherited_object(doc, page_id, key)?;
    let resolved = resolve(doc, &raw)?;
    let array = resolved.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0f64; 4];
    for (slot, object) in values.iter_mut().zip(array.iter()) {
        *slot = number(doc, object)?;
    }
    // Normaliza el rectángulo: algunos productores invierten las esquinas.
    Some([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

fn resolve(doc: &Document, object: &Object) -> Option<Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok().cloned(),
        other => Some(other.clone()),
    }
}

fn number(doc: &Document, object: &Object) -> Option<f64> {
    match resolve(doc, object)? {
        Object::Integer(value) => Some(value as f64),
        Object::Real(value) => Some(value as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DARK;
    use crate::pdf::document::FontStyle;

    fn one_page_pdf() -> Vec<u8> {
        let mut builder = DocumentBuilder::new();
        let mut page = builder.start_page();
        page.draw_text(100.0, 700.0, 12.0, FontStyle::Regular, DARK, "origen");
        builder.push_page(page);
        builder.finish().unwrap()
    }

    #[test]
    fn embeds_every_source_page_as_form() {
        let source = one_page_pdf();
        let mut dest = DocumentBuilder::new();
        let pages = embed_pdf_pages(&mut dest, &source).unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.width, 612.0);
        assert_eq!(page.height, 792.0);
        assert_eq!(page.rotation, Rotation::None);
    }

    #[test]
    fn copy_prunes_the_source_page_tree() {
        let source = one_page_pdf();
        let mut dest = DocumentBuilder::new();
        embed_pdf_pages(&mut dest, &source).unwrap();

        // Del origen solo sobreviven los recursos; su catálogo y su árbol de
        // páginas no tienen referencias en el destino y no deben copiarse.
        let leaked = dest
            .doc_mut()
            .objects
            .values()
            .filter(|object| {
                let kind = object
                    .as_dict()
                    .ok()
                    .and_then(|dict| dict.get(b"Type").ok())
                    .and_then(|name| name.as_name().ok());
                matches!(kind, Some(name) if name == b"Catalog" || name == b"Pages" || name == b"Page")
            })
            .count();
        assert_eq!(leaked, 0);
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let mut dest = DocumentBuilder::new();
        assert!(embed_pdf_pages(&mut dest, b"no es un pdf").is_err());
    }

    #[test]
    fn embeds_png_with_correct_dimensions() {
        let mut png = Vec::new();
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageOutputFormat::Png,
            )
            .unwrap();

        let mut dest = DocumentBuilder::new();
        let embedded = embed_image(&mut dest, &png, Some(image::ImageFormat::Png)).unwrap();
        assert_eq!((embedded.width, embedded.height), (3, 2));
    }

    #[test]
    fn corrupt_image_is_a_decode_error() {
        let mut dest = DocumentBuilder::new();
        let result = embed_image(&mut dest, &[0xFF, 0xD8, 0xFF, 0x00], None);
        assert!(matches!(result, Err(AttachmentError::Decode(_))));
    }
}
