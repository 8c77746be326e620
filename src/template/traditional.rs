//! Compact aligned-label layout: one table, colon column shared by every row.

use super::document::{Document, HeaderBlock, Row, SectionKind};
use super::layout::{escape_html, photo_img, Layout, LabelColumn};

#[derive(Default)]
pub struct Traditional {
    html: String,
    photo: Option<String>,
    label_width: usize,
}

impl Layout for Traditional {
    type Output = String;

    fn begin(&mut self, _doc: &Document, column: LabelColumn) {
        self.label_width = column.width;
        self.html.push_str(r#"<div id="biodata-preview" class="biodata traditional">"#);
    }

    fn header(&mut self, header: &HeaderBlock) {
        self.html.push_str(r#"<header class="invocation">"#);
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
        self.photo = url.map(|url| photo_img(url, "photo"));
    }

    fn section_start(&mut self, kind: SectionKind) {
        self.html.push_str(&format!(
            r#"<section class="{:?}"><h2>{}</h2>"#,
            kind,
            escape_html(kind.title())
        ));
        if kind == SectionKind::Personal {
            if let Some(img) = self.photo.take() {
                self.html.push_str(&format!(r#"<div class="photo-frame">{img}</div>"#));
            }
        }
        if !kind.is_paragraph() {
            self.html.push_str(&format!(
                r#"<table><colgroup><col style="width:{}ch" /><col style="width:2ch" /><col /></colgroup>"#,
                self.label_width + 2
            ));
        }
    }

    fn row(&mut self, row: &Row, _column: LabelColumn) {
        self.html.push_str(&format!(
            r#"<tr><td class="label">{}</td><td class="colon">:</td><td class="value">{}</td></tr>"#,
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
        self.html.push_str("</section>");
    }

    fn finish(mut self, footer: &str) -> String {
        // no personal section to anchor the photo to
        if let Some(img) = self.photo.take() {
            self.html
                .push_str(&format!(r#"<div class="photo-frame">{img}</div>"#));
        }
        self.html.push_str(&format!(
            r#"<footer>{}</footer></div>"#,
            escape_html(footer)
        ));
        self.html
    }
}
