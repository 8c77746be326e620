//! Print-dialog strategy. Success means the dialog was handed a page; no
//! file comes back.

use crate::record::Record;
use crate::template::{escape_html, render, TemplateStyle};

use super::ExportError;

const PRINT_STYLESHEET: &str = r#"
@page { size: A4; margin: 12mm; }
body { font-family: "Noto Sans Devanagari", "Noto Sans", sans-serif; margin: 0; }
#biodata-preview { max-width: 186mm; margin: 0 auto; }
#biodata-preview table { border-collapse: collapse; width: 100%; }
#biodata-preview td, #biodata-preview th { padding: 2px 4px; text-align: left; vertical-align: top; }
#biodata-preview .photo-frame { float: right; }
@media print {
  .no-print { display: none !important; }
  #biodata-preview { box-shadow: none; }
  section, fieldset, .card { break-inside: avoid; }
}
"#;

/// Standalone HTML document that prints itself when opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintPage {
    pub title: String,
    pub html: String,
}

pub fn print_page(record: &Record, style: TemplateStyle) -> PrintPage {
    let title = super::filename::pdf_filename(record)
        .trim_end_matches(".pdf")
        .to_string();
    let body = render(record, style);
    let html = format!(
        "<!DOCTYPE html>\n<html lang=\"mr\">\n<head>\n<meta charset=\"utf-8\" />\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n<script>window.addEventListener(\"load\", function () {{ window.print(); }});</script>\n</body>\n</html>\n",
        escape_html(&title),
        PRINT_STYLESHEET,
        body
    );
    PrintPage { title, html }
}

/// Platform print flow.
pub trait PrintDialog {
    fn open(&mut self, page: PrintPage) -> Result<(), ExportError>;
}

/// Hands the page back to the HTTP caller; the browser opening it is the dialog.
#[derive(Debug, Default)]
pub struct BrowserPrint {
    page: Option<PrintPage>,
}

impl BrowserPrint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_page(&mut self) -> Option<PrintPage> {
        self.page.take()
    }
}

impl PrintDialog for BrowserPrint {
    fn open(&mut self, page: PrintPage) -> Result<(), ExportError> {
        if self.page.is_some() {
            return Err(ExportError::Print("a print page is already pending".into()));
        }
        self.page = Some(page);
        Ok(())
    }
}

/// Render `record` and open it in `dialog`.
pub fn print<D: PrintDialog>(
    record: &Record,
    style: TemplateStyle,
    dialog: &mut D,
) -> Result<(), ExportError> {
    dialog.open(print_page(record, style))
}
