use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};

use crate::models::delivery_note::DeliveryNoteDetail;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pdf generation failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 20.0;
const TOP_Y: f32 = PAGE_HEIGHT - 20.0;
const BOTTOM_Y: f32 = 25.0;
const LINE_HEIGHT: f32 = 6.0;

/// Renders delivery notes as A4 PDF documents.
///
/// Rendering is deliberately stateless: every call lays out the note from
/// its current data, so a download after an edit reflects the edit. The
/// signature image is fetched from its pinned URL at render time; when the
/// fetch or the decode fails the document falls back to a textual
/// placeholder instead of failing the render.
pub struct DocumentRenderer {
    http: reqwest::Client,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRenderer {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub async fn render(&self, detail: &DeliveryNoteDetail) -> Result<Vec<u8>, RenderError> {
        let signature_image = match detail.signature.image_url.as_deref() {
            Some(url) => self.fetch_signature_image(url).await,
            None => None,
        };
        build_document(detail, signature_image)
    }

    async fn fetch_signature_image(&self, url: &str) -> Option<Vec<u8>> {
        let result = async {
            self.http
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await
        }
        .await;

        match result {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                tracing::warn!(url, error = %e, "signature image fetch failed, using placeholder");
                None
            }
        }
    }
}

/// Writing cursor over a growing document. Flows onto a new page whenever a
/// block would cross the bottom margin.
struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn ensure_space(&mut self, doc: &PdfDocumentReference, needed: f32) {
        if self.y - needed < BOTTOM_Y {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
    }

    fn text(&mut self, doc: &PdfDocumentReference, s: &str, size: f32, font: &IndirectFontRef) {
        self.ensure_space(doc, LINE_HEIGHT);
        self.layer.use_text(s, size, Mm(MARGIN_LEFT), Mm(self.y), font);
        self.y -= LINE_HEIGHT;
    }

    fn text_at(&self, s: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(s, size, Mm(x), Mm(self.y), font);
    }

    fn rule(&mut self, doc: &PdfDocumentReference) {
        self.ensure_space(doc, LINE_HEIGHT);
        self.layer.set_outline_thickness(0.4);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN_RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn build_document(
    detail: &DeliveryNoteDetail,
    signature_image: Option<Vec<u8>>,
) -> Result<Vec<u8>, RenderError> {
    let title = format!("Albarán {}", detail.number);
    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: TOP_Y,
    };

    cursor.text(&doc, "ALBARÁN", 18.0, &bold);
    cursor.text(&doc, &detail.number, 12.0, &regular);
    cursor.text(&doc, &format!("Fecha: {}", format_date(detail.date)), 10.0, &regular);
    cursor.gap(4.0);

    cursor.text(&doc, "Datos del cliente", 12.0, &bold);
    cursor.text(&doc, &detail.client.name, 10.0, &regular);
    if let Some(ref nif) = detail.client.nif {
        cursor.text(&doc, &format!("NIF: {}", nif), 10.0, &regular);
    }
    if let Some(ref address) = detail.client.address {
        for line in wrap_text(address, 80) {
            cursor.text(&doc, &line, 10.0, &regular);
        }
    }
    cursor.text(&doc, &detail.client.email, 10.0, &regular);
    cursor.gap(4.0);

    cursor.text(&doc, "Proyecto", 12.0, &bold);
    cursor.text(&doc, &detail.project.name, 10.0, &regular);
    if let Some(ref desc) = detail.project.description {
        for line in wrap_text(desc, 80) {
            cursor.text(&doc, &line, 10.0, &regular);
        }
    }
    cursor.gap(4.0);

    if let Some(ref description) = detail.description {
        cursor.text(&doc, "Descripción", 12.0, &bold);
        for line in wrap_text(description, 90) {
            cursor.text(&doc, &line, 10.0, &regular);
        }
        cursor.gap(4.0);
    }

    if !detail.hours_entries.is_empty() {
        render_hours_table(&doc, &mut cursor, detail, &regular, &bold);
    }
    if !detail.material_entries.is_empty() {
        render_materials_table(&doc, &mut cursor, detail, &regular, &bold);
    }

    render_signature_block(&doc, &mut cursor, detail, signature_image, &regular, &bold);

    cursor.ensure_space(&doc, LINE_HEIGHT * 2.0);
    cursor.gap(4.0);
    cursor.text(
        &doc,
        &format!("Documento generado el {}", format_date(Utc::now())),
        8.0,
        &regular,
    );

    Ok(doc.save_to_bytes()?)
}

fn render_hours_table(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    detail: &DeliveryNoteDetail,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    cursor.text(doc, "Horas trabajadas", 12.0, bold);
    cursor.ensure_space(doc, LINE_HEIGHT * 2.0);
    cursor.text_at("Trabajador", 10.0, MARGIN_LEFT, bold);
    cursor.text_at("Horas", 10.0, 90.0, bold);
    cursor.text_at("Fecha", 10.0, 115.0, bold);
    cursor.text_at("Descripción", 10.0, 145.0, bold);
    cursor.y -= LINE_HEIGHT;
    cursor.rule(doc);

    let mut total_hours = 0.0;
    for entry in &detail.hours_entries {
        let worker = entry
            .user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("(usuario eliminado)");
        // Row height follows the wrapped description.
        let desc_lines = entry
            .description
            .as_deref()
            .map(|d| wrap_text(d, 22))
            .unwrap_or_default();
        cursor.ensure_space(doc, LINE_HEIGHT * desc_lines.len().max(1) as f32);
        cursor.text_at(&truncate(worker, 35), 10.0, MARGIN_LEFT, regular);
        cursor.text_at(&format_quantity(entry.hours), 10.0, 90.0, regular);
        cursor.text_at(&format_date(entry.date), 10.0, 115.0, regular);
        for (i, line) in desc_lines.iter().enumerate() {
            if i > 0 {
                cursor.y -= LINE_HEIGHT;
            }
            cursor.text_at(line, 10.0, 145.0, regular);
        }
        cursor.y -= LINE_HEIGHT;
        total_hours += entry.hours;
    }

    cursor.rule(doc);
    cursor.text(
        doc,
        &format!("Total horas: {}", format_quantity(total_hours)),
        10.0,
        bold,
    );
    cursor.gap(4.0);
}

fn render_materials_table(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    detail: &DeliveryNoteDetail,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    cursor.text(doc, "Materiales", 12.0, bold);
    cursor.ensure_space(doc, LINE_HEIGHT * 2.0);
    cursor.text_at("Material", 10.0, MARGIN_LEFT, bold);
    cursor.text_at("Cantidad", 10.0, 68.0, bold);
    cursor.text_at("Unidad", 10.0, 90.0, bold);
    cursor.text_at("Precio", 10.0, 110.0, bold);
    cursor.text_at("Importe", 10.0, 132.0, bold);
    cursor.text_at("Descripción", 10.0, 156.0, bold);
    cursor.y -= LINE_HEIGHT;
    cursor.rule(doc);

    let mut total = 0.0;
    let mut any_priced = false;
    for entry in &detail.material_entries {
        let desc_lines = entry
            .description
            .as_deref()
            .map(|d| wrap_text(d, 16))
            .unwrap_or_default();
        cursor.ensure_space(doc, LINE_HEIGHT * desc_lines.len().max(1) as f32);
        cursor.text_at(&truncate(&entry.name, 22), 10.0, MARGIN_LEFT, regular);
        cursor.text_at(&format_quantity(entry.quantity), 10.0, 68.0, regular);
        cursor.text_at(&truncate(&entry.unit, 10), 10.0, 90.0, regular);
        if let Some(price) = entry.price {
            cursor.text_at(&format_price(price), 10.0, 110.0, regular);
            cursor.text_at(&format_price(price * entry.quantity), 10.0, 132.0, regular);
            total += price * entry.quantity;
            any_priced = true;
        }
        for (i, line) in desc_lines.iter().enumerate() {
            if i > 0 {
                cursor.y -= LINE_HEIGHT;
            }
            cursor.text_at(line, 10.0, 156.0, regular);
        }
        cursor.y -= LINE_HEIGHT;
    }

    cursor.rule(doc);
    if any_priced {
        cursor.text(doc, &format!("Total materiales: {}", format_price(total)), 10.0, bold);
    }
    cursor.gap(4.0);
}

fn render_signature_block(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    detail: &DeliveryNoteDetail,
    signature_image: Option<Vec<u8>>,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    // Keep the whole block on one page: heading, image area, caption lines.
    cursor.ensure_space(doc, 50.0);
    cursor.text(doc, "Firma", 12.0, bold);

    if detail.signature.is_signed {
        // Uploads are arbitrary bytes; a corrupt image degrades to the same
        // placeholder as a failed fetch.
        let decoded = signature_image.and_then(|bytes| {
            match printpdf::image_crate::load_from_memory(&bytes) {
                Ok(dynamic) => Some(dynamic),
                Err(e) => {
                    tracing::warn!(error = %e, "signature image decode failed, using placeholder");
                    None
                }
            }
        });
        if let Some(dynamic) = decoded {
            let image = Image::from_dynamic_image(&dynamic);
            cursor.gap(30.0);
            image.add_to_layer(
                cursor.layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(MARGIN_LEFT)),
                    translate_y: Some(Mm(cursor.y)),
                    dpi: Some(300.0),
                    ..Default::default()
                },
            );
            cursor.gap(LINE_HEIGHT);
        } else {
            cursor.text(doc, "[imagen de firma no disponible]", 10.0, regular);
        }
        if let Some(ref signed_by) = detail.signature.signed_by {
            cursor.text(doc, &format!("Firmado por: {}", signed_by), 10.0, regular);
        }
        if let Some(date) = detail.signature.date {
            cursor.text(doc, &format!("Fecha de firma: {}", format_date(date)), 10.0, regular);
        }
    } else {
        cursor.text(doc, "Pendiente de firma", 10.0, regular);
        // Blank space for a handwritten signature on the printed copy.
        cursor.gap(18.0);
        cursor.layer.set_outline_thickness(0.4);
        cursor.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(cursor.y)), false),
                (Point::new(Mm(MARGIN_LEFT + 70.0), Mm(cursor.y)), false),
            ],
            is_closed: false,
        });
        cursor.y -= LINE_HEIGHT;
        cursor.text(doc, "Firma del cliente", 9.0, regular);
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Monetary amounts always render with two decimals and a euro suffix.
fn format_price(amount: f64) -> String {
    format!("{:.2} €", amount)
}

/// Quantities drop trailing noise: whole numbers render without decimals,
/// fractional ones with two.
fn format_quantity(q: f64) -> String {
    if (q - q.round()).abs() < f64::EPSILON {
        format!("{}", q.round() as i64)
    } else {
        format!("{:.2}", q)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

/// Greedy word wrap by character count. Words longer than the limit get a
/// line of their own rather than being split.
fn wrap_text(s: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
