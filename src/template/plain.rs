//! Monospace fill-in-the-blank layout.
//!
//! Labels are bilingual and padded to one width; placeholder values are
//! printed as a blank line to be filled in by hand.

use super::document::{Document, HeaderBlock, Row, SectionKind};
use super::layout::{display_width, Layout, LabelColumn};

pub const BLANK: &str = "_________________";
const RULE_WIDTH: usize = 48;

#[derive(Default)]
pub struct Plain {
    text: String,
    label_width: usize,
}

fn bilingual(row: &Row) -> String {
    format!("{} / {}", row.label, row.label_en)
}

impl Plain {
    fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn centered(&mut self, line: &str) {
        let padding = RULE_WIDTH.saturating_sub(display_width(line)) / 2;
        let line = format!("{}{}", " ".repeat(padding), line);
        self.line(&line);
    }
}

impl Layout for Plain {
    type Output = String;

    fn begin(&mut self, doc: &Document, _column: LabelColumn) {
        self.label_width = doc
            .rows()
            .map(|row| display_width(&bilingual(row)))
            .max()
            .unwrap_or(0);
    }

    fn header(&mut self, header: &HeaderBlock) {
        self.centered(&header.invocation);
        self.centered(header.title);
        self.line(&"=".repeat(RULE_WIDTH));
    }

    fn photo(&mut self, url: Option<&str>) {
        if url.is_some() {
            self.line("[ फोटो / Photo ]");
            self.line("");
        }
    }

    fn section_start(&mut self, kind: SectionKind) {
        let title = format!("{} / {}", kind.title(), kind.title_en());
        self.line(&title);
        self.line(&"-".repeat(RULE_WIDTH));
    }

    fn row(&mut self, row: &Row, _column: LabelColumn) {
        let label = LabelColumn {
            width: self.label_width,
        }
        .pad(&bilingual(row));
        let value = if row.value.placeholder {
            BLANK
        } else {
            row.value.text.as_str()
        };
        let line = format!("{label} : {value}");
        self.line(&line);
    }

    fn paragraph(&mut self, _kind: SectionKind, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    fn section_end(&mut self, _kind: SectionKind) {
        self.line("");
    }

    fn finish(mut self, footer: &str) -> String {
        self.line(&"=".repeat(RULE_WIDTH));
        self.centered(footer);
        self.text
    }
}
