//! Spreadsheet adapter: one worksheet per document, explicit cell and
//! column styling, built with rust_xlsxwriter.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Image, Workbook, XlsxError};
use service_core::error::AppError;

use crate::documents::model::{Block, Document};
use crate::documents::read_image_bytes;
use crate::documents::style::DocumentStyle;

fn xe(e: XlsxError) -> AppError {
    AppError::RenderError(anyhow::anyhow!("Workbook error: {}", e))
}

fn color_from_hex(hex: &str) -> Color {
    let trimmed = hex.trim_start_matches('#');
    match u32::from_str_radix(trimmed, 16) {
        Ok(rgb) if trimmed.len() == 6 => Color::RGB(rgb),
        _ => Color::Black,
    }
}

struct Formats {
    title: Format,
    company: Format,
    plain: Format,
    bold: Format,
    boxed: Format,
    boxed_bold: Format,
    table_header: Format,
    cell: Format,
    cell_center: Format,
    money: Format,
    money_bold: Format,
    words: Format,
    footer: Format,
}

impl Formats {
    fn new(style: &DocumentStyle) -> Self {
        let base = || {
            Format::new()
                .set_font_name(&style.font_family)
                .set_font_size(style.font_size as f64)
                .set_font_color(color_from_hex(&style.font_color))
        };
        Formats {
            title: base()
                .set_bold()
                .set_font_size(style.font_size as f64 + 3.0)
                .set_align(FormatAlign::Center),
            company: base()
                .set_bold()
                .set_font_size(style.font_size as f64 + 6.0)
                .set_align(FormatAlign::Center),
            plain: base(),
            bold: base().set_bold(),
            boxed: base().set_border(FormatBorder::Thin),
            boxed_bold: base().set_bold().set_border(FormatBorder::Thin),
            table_header: base()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_background_color(Color::RGB(0xF0F0F0))
                .set_align(FormatAlign::Center),
            cell: base().set_border(FormatBorder::Thin),
            cell_center: base()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            money: base()
                .set_border(FormatBorder::Thin)
                .set_num_format("#,##0.00")
                .set_align(FormatAlign::Right),
            money_bold: base()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_num_format("#,##0.00")
                .set_align(FormatAlign::Right),
            words: base().set_italic(),
            footer: base()
                .set_font_size(style.font_size as f64 - 2.0)
                .set_font_color(Color::RGB(0x555555)),
        }
    }
}

fn num(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Render one or more documents as a single workbook, one worksheet each.
pub fn render_xlsx(
    documents: &[Document],
    style: &DocumentStyle,
    assets_path: &Path,
) -> Result<Vec<u8>, AppError> {
    if documents.is_empty() {
        return Err(AppError::RenderError(anyhow::anyhow!(
            "No documents to render"
        )));
    }

    let formats = Formats::new(style);
    let mut workbook = Workbook::new();

    for document in documents {
        let worksheet = workbook.add_worksheet();
        let mut sheet_name: String = document
            .number
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '*' | '?' | ':' | '/' | '\\'))
            .collect();
        sheet_name.truncate(31);
        worksheet.set_name(&sheet_name).map_err(xe)?;

        worksheet.set_column_width(0, 6).map_err(xe)?;
        worksheet.set_column_width(1, 44).map_err(xe)?;
        worksheet.set_column_width(2, 14).map_err(xe)?;
        worksheet.set_column_width(3, 14).map_err(xe)?;
        worksheet.set_column_width(4, 14).map_err(xe)?;
        worksheet.set_column_width(5, 14).map_err(xe)?;
        worksheet.set_column_width(6, 14).map_err(xe)?;

        // Page number lives in the print footer; spreadsheet viewers show
        // it only on paginated output, matching the print convention.
        worksheet.set_footer("&CPage &P");

        let mut row: u32 = 0;
        for block in &document.blocks {
            match block {
                Block::Header(h) => {
                    worksheet
                        .merge_range(row, 0, row, 6, &h.company_name, &formats.company)
                        .map_err(xe)?;
                    row += 1;
                    if !h.tagline.is_empty() {
                        worksheet
                            .merge_range(row, 0, row, 6, &h.tagline, &formats.title)
                            .map_err(xe)?;
                        row += 1;
                    }
                    worksheet
                        .merge_range(row, 0, row, 6, &h.contact_line, &formats.plain)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::Meta(m) => {
                    worksheet
                        .write_string_with_format(
                            row,
                            0,
                            &format!("No: {}", m.document_number),
                            &formats.plain,
                        )
                        .map_err(xe)?;
                    worksheet
                        .write_string_with_format(
                            row,
                            2,
                            &format!("Ref: {}", m.ref_number),
                            &formats.plain,
                        )
                        .map_err(xe)?;
                    worksheet
                        .write_string_with_format(row, 5, &m.date_text, &formats.plain)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::Title(t) => {
                    worksheet
                        .merge_range(row, 0, row, 6, t, &formats.title)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::Customer(c) => {
                    worksheet
                        .merge_range(row, 0, row, 3, &c.name, &formats.boxed_bold)
                        .map_err(xe)?;
                    row += 1;
                    for line in &c.address_lines {
                        worksheet
                            .merge_range(row, 0, row, 3, line, &formats.boxed)
                            .map_err(xe)?;
                        row += 1;
                    }
                    if let Some(location) = &c.location {
                        worksheet
                            .merge_range(
                                row,
                                0,
                                row,
                                3,
                                &format!("Work Location: {}", location),
                                &formats.boxed,
                            )
                            .map_err(xe)?;
                        row += 1;
                    }
                    row += 1;
                }
                Block::Subject(s) => {
                    worksheet
                        .merge_range(row, 0, row, 6, &format!("Subject: {}", s), &formats.bold)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::ItemTable(table) => {
                    worksheet
                        .write_string_with_format(row, 0, "SL", &formats.table_header)
                        .map_err(xe)?;
                    worksheet
                        .write_string_with_format(row, 1, "Work Details", &formats.table_header)
                        .map_err(xe)?;
                    worksheet
                        .write_string_with_format(row, 2, "Qty", &formats.table_header)
                        .map_err(xe)?;
                    if table.show_pricing {
                        worksheet
                            .write_string_with_format(row, 3, "Unit Price", &formats.table_header)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 4, "Total", &formats.table_header)
                            .map_err(xe)?;
                    }
                    row += 1;

                    for item in &table.rows {
                        let mut details = item.description.clone();
                        for sub in &item.sub_lines {
                            details.push('\n');
                            details.push_str(sub);
                        }
                        worksheet
                            .write_number_with_format(
                                row,
                                0,
                                item.serial as f64,
                                &formats.cell_center,
                            )
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 1, &details, &formats.cell)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 2, &item.quantity_text, &formats.cell_center)
                            .map_err(xe)?;
                        if table.show_pricing {
                            if let Some(unit_price) = item.unit_price {
                                worksheet
                                    .write_number_with_format(row, 3, num(unit_price), &formats.money)
                                    .map_err(xe)?;
                            }
                            if let Some(total) = item.total {
                                worksheet
                                    .write_number_with_format(row, 4, num(total), &formats.money)
                                    .map_err(xe)?;
                            }
                        }
                        row += 1;
                    }

                    if let Some(grand) = table.grand_total {
                        worksheet
                            .merge_range(row, 0, row, 3, "Grand Total", &formats.boxed_bold)
                            .map_err(xe)?;
                        worksheet
                            .write_number_with_format(row, 4, num(grand), &formats.money_bold)
                            .map_err(xe)?;
                        row += 1;
                    }
                    row += 1;
                }
                Block::JobTable(table) => {
                    let headers = [
                        "SL",
                        "Work Details",
                        "Location",
                        "Bill No",
                        "Challan Date",
                        "Amount",
                        "BBL Bill No",
                    ];
                    for (col, header) in headers.iter().enumerate() {
                        worksheet
                            .write_string_with_format(row, col as u16, *header, &formats.table_header)
                            .map_err(xe)?;
                    }
                    row += 1;

                    for line in &table.rows {
                        worksheet
                            .write_number_with_format(row, 0, line.serial as f64, &formats.cell_center)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 1, &line.detail, &formats.cell)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 2, &line.location, &formats.cell)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 3, &line.bill_number, &formats.cell_center)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 4, &line.challan_date_text, &formats.cell_center)
                            .map_err(xe)?;
                        worksheet
                            .write_number_with_format(row, 5, num(line.total), &formats.money)
                            .map_err(xe)?;
                        worksheet
                            .write_string_with_format(row, 6, &line.secondary_bill_number, &formats.cell_center)
                            .map_err(xe)?;
                        row += 1;
                    }

                    worksheet
                        .merge_range(row, 0, row, 4, "Grand Total", &formats.boxed_bold)
                        .map_err(xe)?;
                    worksheet
                        .write_number_with_format(row, 5, num(table.grand_total), &formats.money_bold)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::AmountInWords(words) => {
                    worksheet
                        .merge_range(row, 0, row, 6, &format!("In Words: {}", words), &formats.words)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::Notes(notes) => {
                    worksheet
                        .merge_range(row, 0, row, 6, &format!("Notes: {}", notes), &formats.plain)
                        .map_err(xe)?;
                    row += 1;
                }
                Block::Terms(terms) => {
                    worksheet
                        .merge_range(
                            row,
                            0,
                            row,
                            6,
                            &format!("Terms & Conditions: {}", terms),
                            &formats.plain,
                        )
                        .map_err(xe)?;
                    row += 1;
                }
                Block::Signature(sig) => {
                    // Reserve the configured vertical space whether or not
                    // an image lands in it.
                    let reserved_rows = (style.signature_height_mm / 5.0).ceil() as u32 + 1;
                    if style.signature_enabled {
                        if let Some(reference) = &style.signature_image {
                            if let Some(bytes) = read_image_bytes(assets_path, reference) {
                                match Image::new_from_buffer(&bytes) {
                                    Ok(image) => {
                                        worksheet
                                            .insert_image(row + 1, 4, &image)
                                            .map_err(xe)?;
                                    }
                                    Err(e) => {
                                        tracing::warn!(error = %e, "Signature image decode failed, skipping");
                                    }
                                }
                            }
                        }
                    }
                    row += reserved_rows;
                    worksheet
                        .write_string_with_format(row, 1, &sig.left_label, &formats.bold)
                        .map_err(xe)?;
                    worksheet
                        .write_string_with_format(row, 4, &sig.right_label, &formats.bold)
                        .map_err(xe)?;
                    row += 2;
                }
                Block::Footer(f) => {
                    worksheet
                        .write_string_with_format(row, 0, &f.document_number, &formats.footer)
                        .map_err(xe)?;
                    worksheet
                        .merge_range(row, 2, row, 6, &f.contact_line, &formats.footer)
                        .map_err(xe)?;
                    row += 1;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(xe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::model::{Block, FooterBlock, HeaderBlock};

    fn minimal_doc(number: &str) -> Document {
        Document {
            number: number.to_string(),
            blocks: vec![
                Block::Header(HeaderBlock {
                    company_name: "Test Co".to_string(),
                    tagline: String::new(),
                    contact_line: "a@b.example".to_string(),
                }),
                Block::Footer(FooterBlock {
                    document_number: number.to_string(),
                    contact_line: "a@b.example".to_string(),
                }),
            ],
        }
    }

    #[test]
    fn test_workbook_bytes_are_zip() {
        let bytes = render_xlsx(
            &[minimal_doc("QT-2026-0806")],
            &DocumentStyle::default(),
            Path::new("assets"),
        )
        .expect("render");
        // xlsx is a zip container
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_empty_document_list_is_an_error() {
        let result = render_xlsx(&[], &DocumentStyle::default(), Path::new("assets"));
        assert!(result.is_err());
    }

    #[test]
    fn test_bulk_gets_one_sheet_per_document() {
        let bytes = render_xlsx(
            &[minimal_doc("INV-2026-0806-1"), minimal_doc("INV-2026-0806-2")],
            &DocumentStyle::default(),
            Path::new("assets"),
        )
        .expect("render");
        assert!(!bytes.is_empty());
    }
}
