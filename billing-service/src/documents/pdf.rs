//! PDF adapter: composes the block model onto A4 pages with printpdf.
//!
//! Layout uses a flowing y cursor in millimeters from the top of the page
//! (printpdf itself is bottom-left origin; `at()` converts). Page breaks
//! repeat the pinned footer; the page number is suppressed on the first
//! page per print convention.

use std::io::BufWriter;
use std::path::Path;

use printpdf::image_crate::DynamicImage;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::documents::model::{Block, Document, FooterBlock, ItemTableBlock, JobTableBlock};
use crate::documents::style::DocumentStyle;
use crate::documents::read_image_bytes;
use crate::utils::money::format_currency;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 15.0;
const FOOTER_RESERVE: f32 = 14.0;
const IMAGE_DPI: f32 = 300.0;

const PT_TO_MM: f32 = 0.3528;
// Pragmatic average glyph width for the builtin fonts; printpdf exposes no
// text metrics for them.
const AVG_GLYPH_EM: f32 = 0.52;

fn est_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * PT_TO_MM * AVG_GLYPH_EM
}

fn wrap_text(input: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in input.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn parse_hex_color(hex: &str) -> Rgb {
    let trimmed = hex.trim_start_matches('#');
    if trimmed.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&trimmed[0..2], 16),
            u8::from_str_radix(&trimmed[2..4], 16),
            u8::from_str_radix(&trimmed[4..6], 16),
        ) {
            return Rgb::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
                None,
            );
        }
    }
    Rgb::new(0.0, 0.0, 0.0, None)
}

fn builtin_fonts(family: &str) -> (BuiltinFont, BuiltinFont) {
    match family.to_ascii_lowercase().as_str() {
        "times" | "times new roman" => (BuiltinFont::TimesRoman, BuiltinFont::TimesBold),
        "courier" => (BuiltinFont::Courier, BuiltinFont::CourierBold),
        _ => (BuiltinFont::Helvetica, BuiltinFont::HelveticaBold),
    }
}

/// Fade an image toward white so it reads as a faint watermark once drawn
/// under the page content. The builtin image path has no alpha blending,
/// so opacity is applied to the pixels directly.
fn soften_image(img: DynamicImage, opacity: f32) -> DynamicImage {
    let mut rgb = img.to_rgb8();
    let keep = opacity.clamp(0.0, 1.0);
    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = 255 - ((255 - *channel) as f32 * keep) as u8;
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    page_no: u32,
    body_size: f32,
    text_color: Rgb,
    top_start: f32,
    bottom_limit: f32,
}

impl PdfWriter {
    fn new(title: &str, style: &DocumentStyle) -> Result<Self, AppError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let (regular, bold) = builtin_fonts(&style.font_family);
        let font = doc
            .add_builtin_font(regular)
            .map_err(|e| AppError::RenderError(anyhow::anyhow!("Font load failed: {}", e)))?;
        let font_bold = doc
            .add_builtin_font(bold)
            .map_err(|e| AppError::RenderError(anyhow::anyhow!("Font load failed: {}", e)))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(PdfWriter {
            doc,
            font,
            font_bold,
            layer,
            y: style.margin_top_mm,
            page_no: 1,
            body_size: style.font_size,
            text_color: parse_hex_color(&style.font_color),
            top_start: style.margin_top_mm,
            bottom_limit: PAGE_H - style.margin_bottom_mm - FOOTER_RESERVE,
        })
    }

    /// Convert a from-top y coordinate to printpdf's bottom-left origin.
    fn at(&self, y_from_top: f32) -> Mm {
        Mm(PAGE_H - y_from_top)
    }

    fn text(&self, text: &str, size: f32, x: f32, y_from_top: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer
            .set_fill_color(Color::Rgb(self.text_color.clone()));
        self.layer
            .use_text(text, size, Mm(x), self.at(y_from_top), font);
    }

    fn text_right(&self, text: &str, size: f32, x_right: f32, y_from_top: f32, bold: bool) {
        let x = x_right - est_text_width(text, size);
        self.text(text, size, x, y_from_top, bold);
    }

    fn text_center(&self, text: &str, size: f32, y_from_top: f32, bold: bool) {
        let x = (PAGE_W - est_text_width(text, size)) / 2.0;
        self.text(text, size, x, y_from_top, bold);
    }

    fn rule(&self, x1: f32, x2: f32, y_from_top: f32) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.2, 0.2, 0.2, None)));
        self.layer.set_outline_thickness(0.3);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), self.at(y_from_top)), false),
                (Point::new(Mm(x2), self.at(y_from_top)), false),
            ],
            is_closed: false,
        });
    }

    fn box_outline(&self, x: f32, y_top: f32, w: f32, h: f32) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.2, 0.2, 0.2, None)));
        self.layer.set_outline_thickness(0.3);
        let rect = Rect::new(
            Mm(x),
            self.at(y_top + h),
            Mm(x + w),
            self.at(y_top),
        )
        .with_mode(PaintMode::Stroke);
        self.layer.add_rect(rect);
    }

    fn fill_rect(&self, x: f32, y_top: f32, w: f32, h: f32, gray: f32) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
        let rect = Rect::new(Mm(x), self.at(y_top + h), Mm(x + w), self.at(y_top))
            .with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
        self.layer
            .set_fill_color(Color::Rgb(self.text_color.clone()));
    }

    fn embed_image(
        &self,
        bytes: &[u8],
        x: f32,
        y_top: f32,
        target_w: f32,
        target_h: f32,
        opacity: Option<f32>,
    ) {
        let Ok(decoded) = printpdf::image_crate::load_from_memory(bytes) else {
            tracing::warn!("Image decode failed, skipping asset");
            return;
        };
        let decoded = match opacity {
            Some(alpha) => soften_image(decoded, alpha),
            None => decoded,
        };
        let rgb = decoded.to_rgb8();
        let (w_px, h_px) = rgb.dimensions();
        if w_px == 0 || h_px == 0 {
            return;
        }
        let native_w_mm = w_px as f32 * 25.4 / IMAGE_DPI;
        let native_h_mm = h_px as f32 * 25.4 / IMAGE_DPI;

        let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(self.at(y_top + target_h)),
                scale_x: Some(target_w / native_w_mm),
                scale_y: Some(target_h / native_h_mm),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    /// Draw the pinned page furniture (watermark under content, footer at
    /// the bottom). Called once per page before content flows.
    fn dress_page(&mut self, footer: &FooterBlock, style: &DocumentStyle, assets_path: &Path) {
        if style.pad_enabled {
            if let Some(reference) = &style.pad_image {
                if let Some(bytes) = read_image_bytes(assets_path, reference) {
                    let pad_w = 120.0;
                    let pad_h = 120.0;
                    self.embed_image(
                        &bytes,
                        (PAGE_W - pad_w) / 2.0,
                        70.0,
                        pad_w,
                        pad_h,
                        Some(style.pad_opacity),
                    );
                }
            }
        }

        let footer_y = PAGE_H - style.margin_bottom_mm + 4.0;
        self.rule(MARGIN_X, PAGE_W - MARGIN_X, footer_y - 4.0);
        self.text(&footer.document_number, 7.0, MARGIN_X, footer_y, false);
        self.text_right(
            &footer.contact_line,
            7.0,
            PAGE_W - MARGIN_X,
            footer_y,
            false,
        );
        if self.page_no > 1 {
            self.text_center(&format!("Page {}", self.page_no), 7.0, footer_y, false);
        }
    }

    fn new_page(&mut self, footer: &FooterBlock, style: &DocumentStyle, assets_path: &Path) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_no += 1;
        self.y = self.top_start;
        self.dress_page(footer, style, assets_path);
    }

    fn ensure_space(
        &mut self,
        needed: f32,
        footer: &FooterBlock,
        style: &DocumentStyle,
        assets_path: &Path,
    ) {
        if self.y + needed > self.bottom_limit {
            self.new_page(footer, style, assets_path);
        }
    }

    fn save(self) -> Result<Vec<u8>, AppError> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| AppError::RenderError(anyhow::anyhow!("PDF serialization failed: {}", e)))?;
        writer
            .into_inner()
            .map_err(|e| AppError::RenderError(anyhow::anyhow!("PDF buffer error: {}", e)))
    }
}

fn find_footer(document: &Document) -> FooterBlock {
    document
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Footer(f) => Some(f.clone()),
            _ => None,
        })
        .unwrap_or(FooterBlock {
            document_number: document.number.clone(),
            contact_line: String::new(),
        })
}

fn money(d: Decimal) -> String {
    format_currency(d)
}

fn render_item_table(
    w: &mut PdfWriter,
    table: &ItemTableBlock,
    footer: &FooterBlock,
    style: &DocumentStyle,
    assets_path: &Path,
) {
    let right = PAGE_W - MARGIN_X;
    // Column x positions: pricing tables carry five columns, challan three.
    let (details_x, qty_x, price_x, total_x) = if table.show_pricing {
        (27.0, 115.0, 142.0, 169.0)
    } else {
        (27.0, 150.0, right, right)
    };
    let details_chars = if table.show_pricing { 46 } else { 64 };

    let size = w.body_size;
    let header_h = 7.0;
    w.ensure_space(header_h + 6.0, footer, style, assets_path);

    w.fill_rect(MARGIN_X, w.y, right - MARGIN_X, header_h, 0.93);
    w.box_outline(MARGIN_X, w.y, right - MARGIN_X, header_h);
    let label_y = w.y + 4.8;
    w.text("SL", size, MARGIN_X + 2.0, label_y, true);
    w.text("Work Details", size, details_x + 2.0, label_y, true);
    w.text("Qty", size, qty_x + 2.0, label_y, true);
    if table.show_pricing {
        w.text("Unit Price", size, price_x + 2.0, label_y, true);
        w.text("Total", size, total_x + 2.0, label_y, true);
    }
    w.y += header_h;

    let line_h = size * PT_TO_MM * 1.45;
    let sub_size = size - 1.5;
    let sub_h = sub_size * PT_TO_MM * 1.45;

    for row in &table.rows {
        let desc_lines = wrap_text(&row.description, details_chars);
        let row_h = 2.0 + desc_lines.len() as f32 * line_h + row.sub_lines.len() as f32 * sub_h + 1.5;
        w.ensure_space(row_h, footer, style, assets_path);

        let mut text_y = w.y + line_h + 0.5;
        w.text(&row.serial.to_string(), size, MARGIN_X + 2.0, text_y, false);
        for line in &desc_lines {
            w.text(line, size, details_x + 2.0, text_y, false);
            text_y += line_h;
        }
        for sub in &row.sub_lines {
            w.text(sub, sub_size, details_x + 5.0, text_y, false);
            text_y += sub_h;
        }
        let first_line_y = w.y + line_h + 0.5;
        w.text(&row.quantity_text, size, qty_x + 2.0, first_line_y, false);
        if table.show_pricing {
            if let Some(unit_price) = row.unit_price {
                w.text_right(&money(unit_price), size, total_x - 2.0, first_line_y, false);
            }
            if let Some(total) = row.total {
                w.text_right(&money(total), size, right - 2.0, first_line_y, false);
            }
        }

        w.y += row_h;
        w.rule(MARGIN_X, right, w.y);
    }

    if let Some(grand) = table.grand_total {
        let row_h = 7.0;
        w.ensure_space(row_h, footer, style, assets_path);
        let text_y = w.y + 5.0;
        w.text_right("Grand Total", size, total_x - 2.0, text_y, true);
        w.text_right(&money(grand), size, right - 2.0, text_y, true);
        w.y += row_h;
        w.rule(MARGIN_X, right, w.y);
    }
    w.y += 2.0;
}

fn render_job_table(
    w: &mut PdfWriter,
    table: &JobTableBlock,
    footer: &FooterBlock,
    style: &DocumentStyle,
    assets_path: &Path,
) {
    let right = PAGE_W - MARGIN_X;
    // SL | Work Details | Location | Bill No | Challan Date | Amount | BBL
    let cols = [MARGIN_X, 25.0, 75.0, 105.0, 130.0, 152.0, 176.0];
    let size = w.body_size - 1.0;
    let header_h = 7.0;

    w.ensure_space(header_h + 6.0, footer, style, assets_path);
    w.fill_rect(MARGIN_X, w.y, right - MARGIN_X, header_h, 0.93);
    w.box_outline(MARGIN_X, w.y, right - MARGIN_X, header_h);
    let labels = [
        "SL",
        "Work Details",
        "Location",
        "Bill No",
        "Challan Date",
        "Amount",
        "BBL Bill No",
    ];
    let label_y = w.y + 4.8;
    for (x, label) in cols.iter().zip(labels.iter()) {
        w.text(label, size, x + 1.5, label_y, true);
    }
    w.y += header_h;

    let line_h = size * PT_TO_MM * 1.45;
    for row in &table.rows {
        let detail_lines = wrap_text(&row.detail, 30);
        let location_lines = wrap_text(&row.location, 18);
        let lines = detail_lines.len().max(location_lines.len());
        let row_h = 2.0 + lines as f32 * line_h + 1.5;
        w.ensure_space(row_h, footer, style, assets_path);

        let first_y = w.y + line_h + 0.5;
        w.text(&row.serial.to_string(), size, cols[0] + 1.5, first_y, false);
        let mut y = first_y;
        for line in &detail_lines {
            w.text(line, size, cols[1] + 1.5, y, false);
            y += line_h;
        }
        let mut y = first_y;
        for line in &location_lines {
            w.text(line, size, cols[2] + 1.5, y, false);
            y += line_h;
        }
        w.text(&row.bill_number, size, cols[3] + 1.5, first_y, false);
        w.text(&row.challan_date_text, size, cols[4] + 1.5, first_y, false);
        w.text_right(&money(row.total), size, cols[6] - 1.5, first_y, false);
        w.text(&row.secondary_bill_number, size, cols[6] + 1.5, first_y, false);

        w.y += row_h;
        w.rule(MARGIN_X, right, w.y);
    }

    let row_h = 7.0;
    w.ensure_space(row_h, footer, style, assets_path);
    let text_y = w.y + 5.0;
    w.text_right("Grand Total", size, cols[5] - 1.5, text_y, true);
    w.text_right(&money(table.grand_total), size, cols[6] - 1.5, text_y, true);
    w.y += row_h;
    w.rule(MARGIN_X, right, w.y);
    w.y += 2.0;
}

fn render_blocks(
    w: &mut PdfWriter,
    document: &Document,
    style: &DocumentStyle,
    assets_path: &Path,
) {
    let footer = find_footer(document);
    let right = PAGE_W - MARGIN_X;
    let size = w.body_size;
    let line_h = size * PT_TO_MM * 1.5;

    for block in &document.blocks {
        match block {
            Block::Header(h) => {
                w.text_center(&h.company_name, size + 6.0, w.y + 6.0, true);
                w.y += 8.0;
                if !h.tagline.is_empty() {
                    w.text_center(&h.tagline, size - 1.0, w.y + 4.0, false);
                    w.y += 5.0;
                }
                w.text_center(&h.contact_line, size - 1.0, w.y + 4.0, false);
                w.y += 6.0;
                w.rule(MARGIN_X, right, w.y);
                w.y += 2.0;
            }
            Block::Meta(m) => {
                let y = w.y + line_h;
                w.text(&format!("No: {}", m.document_number), size, MARGIN_X, y, false);
                w.text_center(&format!("Ref: {}", m.ref_number), size, y, false);
                w.text_right(&m.date_text, size, right, y, false);
                w.y += line_h + 2.0;
            }
            Block::Title(t) => {
                let y = w.y + 6.0;
                w.text_center(t, size + 3.0, y, true);
                let width = est_text_width(t, size + 3.0);
                w.rule((PAGE_W - width) / 2.0, (PAGE_W + width) / 2.0, y + 1.2);
                w.y += 10.0;
            }
            Block::Customer(c) => {
                let mut lines = vec![c.name.clone()];
                lines.extend(c.address_lines.iter().cloned());
                if let Some(location) = &c.location {
                    lines.push(format!("Work Location: {}", location));
                }
                let box_h = lines.len() as f32 * line_h + 3.0;
                w.box_outline(MARGIN_X, w.y, right - MARGIN_X, box_h);
                let mut y = w.y + line_h;
                for (i, line) in lines.iter().enumerate() {
                    w.text(line, size, MARGIN_X + 3.0, y, i == 0);
                    y += line_h;
                }
                w.y += box_h + 3.0;
            }
            Block::Subject(s) => {
                for line in wrap_text(&format!("Subject: {}", s), 80) {
                    w.text(&line, size, MARGIN_X, w.y + line_h, true);
                    w.y += line_h;
                }
                w.y += 2.0;
            }
            Block::ItemTable(table) => {
                render_item_table(w, table, &footer, style, assets_path);
            }
            Block::JobTable(table) => {
                render_job_table(w, table, &footer, style, assets_path);
            }
            Block::AmountInWords(words) => {
                for line in wrap_text(&format!("In Words: {}", words), 90) {
                    w.text(&line, size, MARGIN_X, w.y + line_h, false);
                    w.y += line_h;
                }
                w.y += 2.0;
            }
            Block::Notes(notes) => {
                w.ensure_space(line_h * 2.0, &footer, style, assets_path);
                w.text("Notes:", size, MARGIN_X, w.y + line_h, true);
                w.y += line_h;
                for line in wrap_text(notes, 95) {
                    w.ensure_space(line_h, &footer, style, assets_path);
                    w.text(&line, size - 1.0, MARGIN_X + 3.0, w.y + line_h, false);
                    w.y += line_h;
                }
                w.y += 2.0;
            }
            Block::Terms(terms) => {
                w.ensure_space(line_h * 2.0, &footer, style, assets_path);
                w.text("Terms & Conditions:", size, MARGIN_X, w.y + line_h, true);
                w.y += line_h;
                for line in wrap_text(terms, 95) {
                    w.ensure_space(line_h, &footer, style, assets_path);
                    w.text(&line, size - 1.0, MARGIN_X + 3.0, w.y + line_h, false);
                    w.y += line_h;
                }
                w.y += 2.0;
            }
            Block::Signature(sig) => {
                // Space above the rule is reserved from configuration
                // whether or not an image is drawn, so enabling the
                // signature never shifts the layout.
                let space_h = style.signature_height_mm + 6.0;
                let block_h = space_h + line_h + 4.0;
                w.ensure_space(block_h + 8.0, &footer, style, assets_path);
                w.y += 8.0;

                let box_w = 55.0;
                let left_x = MARGIN_X + 5.0;
                let right_x = right - box_w - 5.0;

                if style.signature_enabled {
                    if let Some(reference) = &style.signature_image {
                        if let Some(bytes) = read_image_bytes(assets_path, reference) {
                            let img_x =
                                right_x + (box_w - style.signature_width_mm) / 2.0;
                            w.embed_image(
                                &bytes,
                                img_x,
                                w.y + space_h - style.signature_height_mm - 1.0,
                                style.signature_width_mm,
                                style.signature_height_mm,
                                None,
                            );
                        }
                    }
                }

                let rule_y = w.y + space_h;
                for (x, label) in [(left_x, &sig.left_label), (right_x, &sig.right_label)] {
                    w.rule(x, x + box_w, rule_y);
                    let label_x = x + (box_w - est_text_width(label, size)) / 2.0;
                    w.text(label, size, label_x, rule_y + line_h, false);
                }
                w.y += block_h;
            }
            // Pinned furniture, drawn by dress_page on every page.
            Block::Footer(_) => {}
        }
    }
}

/// Render one or more documents into a single PDF, one or more pages per
/// document depending on content length.
pub fn render_pdf(
    documents: &[Document],
    style: &DocumentStyle,
    assets_path: &Path,
) -> Result<Vec<u8>, AppError> {
    let first = documents
        .first()
        .ok_or_else(|| AppError::RenderError(anyhow::anyhow!("No documents to render")))?;

    let mut writer = PdfWriter::new(&first.number, style)?;

    for (i, document) in documents.iter().enumerate() {
        let footer = find_footer(document);
        if i > 0 {
            writer.new_page(&footer, style, assets_path);
        } else {
            writer.dress_page(&footer, style, assets_path);
        }
        render_blocks(&mut writer, document, style, assets_path);
    }

    writer.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_limit() {
        let lines = wrap_text("one two three four five six seven", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }

    #[test]
    fn test_parse_hex_color() {
        let c = parse_hex_color("#ff0000");
        assert!((c.r - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.g, 0.0);
        let fallback = parse_hex_color("bogus");
        assert_eq!(fallback.r, 0.0);
    }

    #[test]
    fn test_empty_document_list_is_an_error() {
        let result = render_pdf(&[], &DocumentStyle::default(), Path::new("assets"));
        assert!(result.is_err());
    }
}
