//! HTML adapter: emits a complete standalone markup document, one
//! `.page` container per logical document, for conversion to PDF by an
//! external print pipeline.

use crate::documents::model::{Block, Document};
use crate::documents::style::DocumentStyle;
use crate::utils::money::format_currency;

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn push_page_css(css: &mut String, style: &DocumentStyle) {
    css.push_str(&format!(
        "body{{margin:0;font-family:{},Arial,sans-serif;font-size:{}pt;color:{};}}",
        escape_html(&style.font_family),
        style.font_size,
        escape_html(&style.font_color),
    ));
    css.push_str(&format!(
        ".page{{position:relative;width:180mm;min-height:260mm;margin:0 auto;\
padding:{}mm 15mm {}mm 15mm;page-break-after:always;}}",
        style.margin_top_mm, style.margin_bottom_mm
    ));
    css.push_str(
        ".header{text-align:center;}\
.header .name{font-size:1.6em;font-weight:700;}\
.header .tagline{color:#444;}\
.meta{display:flex;justify-content:space-between;margin-top:8px;font-size:0.95em;}\
.title{text-align:center;font-weight:700;font-size:1.2em;letter-spacing:2px;\
margin:10px 0;text-decoration:underline;}\
.customer{border:1px solid #333;padding:6px 10px;margin-bottom:8px;}\
.subject{margin:6px 0;font-weight:600;}\
table.items{width:100%;border-collapse:collapse;margin-top:6px;}\
table.items th,table.items td{border:1px solid #333;padding:4px 6px;vertical-align:top;}\
table.items th{background:#f0f0f0;text-align:center;}\
td.num{text-align:right;white-space:nowrap;}\
td.center{text-align:center;}\
.sub-line{color:#555;font-size:0.9em;}\
tr.grand td{font-weight:700;}\
.words{margin-top:8px;font-style:italic;}\
.notes,.terms{margin-top:10px;white-space:pre-wrap;}\
.notes .label,.terms .label{font-weight:700;}\
.signature{display:flex;justify-content:space-between;margin-top:36px;}\
.signature .box{width:45%;text-align:center;}\
.signature .space{height:var(--sig-h);}\
.signature .line{border-top:1px solid #333;padding-top:4px;}\
.footer{position:absolute;bottom:4mm;left:15mm;right:15mm;display:flex;\
justify-content:space-between;font-size:0.85em;color:#555;\
border-top:1px solid #999;padding-top:3px;}\
.pad{position:absolute;top:30%;left:50%;transform:translate(-50%,-30%);\
max-width:70%;z-index:-1;}",
    );
}

fn push_block(html: &mut String, block: &Block, style: &DocumentStyle) {
    match block {
        Block::Header(h) => {
            html.push_str("<div class=\"header\">");
            html.push_str(&format!(
                "<div class=\"name\">{}</div>",
                escape_html(&h.company_name)
            ));
            if !h.tagline.is_empty() {
                html.push_str(&format!(
                    "<div class=\"tagline\">{}</div>",
                    escape_html(&h.tagline)
                ));
            }
            html.push_str(&format!("<div>{}</div>", escape_html(&h.contact_line)));
            html.push_str("</div>");
        }
        Block::Meta(m) => {
            html.push_str(&format!(
                "<div class=\"meta\"><span>No: {}</span><span>Ref: {}</span><span>{}</span></div>",
                escape_html(&m.document_number),
                escape_html(&m.ref_number),
                escape_html(&m.date_text),
            ));
        }
        Block::Title(t) => {
            html.push_str(&format!("<div class=\"title\">{}</div>", escape_html(t)));
        }
        Block::Customer(c) => {
            html.push_str("<div class=\"customer\">");
            html.push_str(&format!("<div><b>{}</b></div>", escape_html(&c.name)));
            for line in &c.address_lines {
                html.push_str(&format!("<div>{}</div>", escape_html(line)));
            }
            if let Some(location) = &c.location {
                html.push_str(&format!(
                    "<div>Work Location: {}</div>",
                    escape_html(location)
                ));
            }
            html.push_str("</div>");
        }
        Block::Subject(s) => {
            html.push_str(&format!(
                "<div class=\"subject\">Subject: {}</div>",
                escape_html(s)
            ));
        }
        Block::ItemTable(table) => {
            html.push_str("<table class=\"items\"><thead><tr>");
            html.push_str("<th>SL</th><th>Work Details</th><th>Qty</th>");
            if table.show_pricing {
                html.push_str("<th>Unit Price</th><th>Total</th>");
            }
            html.push_str("</tr></thead><tbody>");
            for row in &table.rows {
                html.push_str("<tr>");
                html.push_str(&format!("<td class=\"center\">{}</td>", row.serial));
                html.push_str("<td>");
                html.push_str(&escape_html(&row.description));
                for sub in &row.sub_lines {
                    html.push_str(&format!(
                        "<div class=\"sub-line\">{}</div>",
                        escape_html(sub)
                    ));
                }
                html.push_str("</td>");
                html.push_str(&format!(
                    "<td class=\"center\">{}</td>",
                    escape_html(&row.quantity_text)
                ));
                if table.show_pricing {
                    let unit_price = row
                        .unit_price
                        .map(format_currency)
                        .unwrap_or_default();
                    let total = row.total.map(format_currency).unwrap_or_default();
                    html.push_str(&format!(
                        "<td class=\"num\">{}</td><td class=\"num\">{}</td>",
                        unit_price, total
                    ));
                }
                html.push_str("</tr>");
            }
            if let Some(grand) = table.grand_total {
                html.push_str(&format!(
                    "<tr class=\"grand\"><td colspan=\"4\" class=\"num\">Grand Total</td>\
<td class=\"num\">{}</td></tr>",
                    format_currency(grand)
                ));
            }
            html.push_str("</tbody></table>");
        }
        Block::JobTable(table) => {
            html.push_str("<table class=\"items\"><thead><tr>");
            html.push_str(
                "<th>SL</th><th>Work Details</th><th>Location</th><th>Bill No</th>\
<th>Challan Date</th><th>Amount</th><th>BBL Bill No</th>",
            );
            html.push_str("</tr></thead><tbody>");
            for row in &table.rows {
                html.push_str(&format!(
                    "<tr><td class=\"center\">{}</td><td>{}</td><td>{}</td><td>{}</td>\
<td class=\"center\">{}</td><td class=\"num\">{}</td><td class=\"center\">{}</td></tr>",
                    row.serial,
                    escape_html(&row.detail),
                    escape_html(&row.location),
                    escape_html(&row.bill_number),
                    escape_html(&row.challan_date_text),
                    format_currency(row.total),
                    escape_html(&row.secondary_bill_number),
                ));
            }
            html.push_str(&format!(
                "<tr class=\"grand\"><td colspan=\"5\" class=\"num\">Grand Total</td>\
<td class=\"num\">{}</td><td></td></tr>",
                format_currency(table.grand_total)
            ));
            html.push_str("</tbody></table>");
        }
        Block::AmountInWords(words) => {
            html.push_str(&format!(
                "<div class=\"words\">In Words: {}</div>",
                escape_html(words)
            ));
        }
        Block::Notes(notes) => {
            html.push_str(&format!(
                "<div class=\"notes\"><span class=\"label\">Notes:</span> {}</div>",
                escape_html(notes)
            ));
        }
        Block::Terms(terms) => {
            html.push_str(&format!(
                "<div class=\"terms\"><span class=\"label\">Terms &amp; Conditions:</span> {}</div>",
                escape_html(terms)
            ));
        }
        Block::Signature(sig) => {
            // The vertical space is reserved whether or not an image is
            // drawn, so toggling the signature never shifts the layout.
            let image = if style.signature_enabled {
                style.signature_image.as_deref()
            } else {
                None
            };
            html.push_str("<div class=\"signature\">");
            for (label, with_image) in [(&sig.left_label, false), (&sig.right_label, true)] {
                html.push_str("<div class=\"box\">");
                match (with_image, image) {
                    (true, Some(src)) => html.push_str(&format!(
                        "<div class=\"space\"><img src=\"{}\" style=\"width:{}mm;height:{}mm;\"></div>",
                        escape_html(src),
                        style.signature_width_mm,
                        style.signature_height_mm
                    )),
                    _ => html.push_str("<div class=\"space\"></div>"),
                }
                html.push_str(&format!(
                    "<div class=\"line\">{}</div>",
                    escape_html(label)
                ));
                html.push_str("</div>");
            }
            html.push_str("</div>");
        }
        Block::Footer(f) => {
            html.push_str(&format!(
                "<div class=\"footer\"><span>{}</span><span>{}</span></div>",
                escape_html(&f.document_number),
                escape_html(&f.contact_line),
            ));
        }
    }
}

/// Render one or more documents as a single standalone HTML payload.
pub fn render_html(documents: &[Document], style: &DocumentStyle) -> String {
    let mut css = String::new();
    push_page_css(&mut css, style);

    let mut html = String::new();
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<style>:root{{--sig-h:{}mm;}}{}</style>",
        style.signature_height_mm, css
    ));
    html.push_str("</head><body>");

    for document in documents {
        html.push_str("<div class=\"page\">");
        if style.pad_enabled {
            if let Some(pad) = &style.pad_image {
                html.push_str(&format!(
                    "<img class=\"pad\" src=\"{}\" style=\"opacity:{};\">",
                    escape_html(pad),
                    style.pad_opacity
                ));
            }
        }
        for block in &document.blocks {
            push_block(&mut html, block, style);
        }
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::model::{Block, FooterBlock, HeaderBlock};

    fn minimal_doc() -> Document {
        Document {
            number: "QT-2026-0806".to_string(),
            blocks: vec![
                Block::Header(HeaderBlock {
                    company_name: "A & B <Signs>".to_string(),
                    tagline: String::new(),
                    contact_line: "a@b.example | 123".to_string(),
                }),
                Block::Footer(FooterBlock {
                    document_number: "QT-2026-0806".to_string(),
                    contact_line: "a@b.example | 123".to_string(),
                }),
            ],
        }
    }

    #[test]
    fn test_output_is_standalone_and_escaped() {
        let html = render_html(&[minimal_doc()], &DocumentStyle::default());
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.ends_with("</body></html>"));
        assert!(html.contains("A &amp; B &lt;Signs&gt;"));
    }

    #[test]
    fn test_bulk_renders_one_page_per_document() {
        let html = render_html(&[minimal_doc(), minimal_doc()], &DocumentStyle::default());
        assert_eq!(html.matches("<div class=\"page\">").count(), 2);
    }

    #[test]
    fn test_pad_rendered_only_when_enabled() {
        let mut style = DocumentStyle::default();
        style.pad_enabled = true;
        style.pad_image = Some("pad.png".to_string());
        let with_pad = render_html(&[minimal_doc()], &style);
        assert!(with_pad.contains("class=\"pad\""));

        let without = render_html(&[minimal_doc()], &DocumentStyle::default());
        assert!(!without.contains("class=\"pad\""));
    }
}
