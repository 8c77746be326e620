//! Bordered layout with the photo framed at the top of the page.

use super::document::{Document, HeaderBlock, Row, SectionKind};
use super::layout::{escape_html, photo_img, Layout, LabelColumn};

#[derive(Default)]
pub struct Bordered {
    html: String,
    label_width: usize,
}

impl Layout for Bordered {
    type Output = String;

    fn begin(&mut self, _doc: &Document, column: LabelColumn) {
        self.label_width = column.width + 2;
        self.html.push_str(
            r#"<div id="biodata-preview" class="biodata bordered" style="border:3px double #8b0000;padding:24px">"#,
        );
    }

    fn header(&mut self, header: &HeaderBlock) {
        self.html.push_str(r#"<header style="text-align:center">"#);
        if let Some(image) = &header.deity_image {
            self.html.push_str(&format!(
                r#"<img class="deity" src="{}" alt="deity" />"#,
                escape_html(image)
            ));
        }
        self.html.push_str(&format!(
            "<p>{}</p><h1>{}</h1></header>",
            escape_html(&header.invocation),
            escape_html(header.title)
        ));
    }

    fn photo(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            self.html.push_str(&format!(
                r#"<div class="photo-frame" style="text-align:center;border:1px solid #8b0000;padding:4px;width:fit-content;margin:0 auto">{}</div>"#,
                photo_img(url, "photo")
            ));
        }
    }

    fn section_start(&mut self, kind: SectionKind) {
        self.html.push_str(&format!(
            r#"<fieldset><legend>{}</legend>"#,
            escape_html(kind.title())
        ));
        if !kind.is_paragraph() {
            self.html.push_str(&format!(
                r#"<table><colgroup><col style="width:{}ch" /><col style="width:2ch" /><col /></colgroup>"#,
                self.label_width
            ));
        }
    }

    fn row(&mut self, row: &Row, _column: LabelColumn) {
        self.html.push_str(&format!(
            r#"<tr><th class="label">{}</th><td class="colon">:</td><td class="value">{}</td></tr>"#,
            escape_html(row.label),
            escape_html(&row.value.text)
        ));
    }

    fn paragraph(&mut self, _kind: SectionKind, text: &str) {
        self.html
            .push_str(&format!("<p>{}</p>", escape_html(text).replace('\n', "<br />")));
    }

    fn section_end(&mut self, kind: SectionKind) {
        if !kind.is_paragraph() {
            self.html.push_str("</table>");
        }
        self.html.push_str("</fieldset>");
    }

    fn finish(mut self, footer: &str) -> String {
        self.html.push_str(&format!(
            "<footer>{}</footer></div>",
            escape_html(footer)
        ));
        self.html
    }
}
