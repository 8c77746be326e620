mod common;

use biodata_maker::export::{declarative, dated_pdf_filename, pdf_filename, print::print_page};
use biodata_maker::record::Record;
use biodata_maker::resolve::{resolve_text, LogicalField};
use biodata_maker::template::{render, render_text, TemplateStyle};
use chrono::NaiveDate;
use serde_json::json;

use common::{complete_record, legacy_record};

fn from_json(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_legacy_record_resolves_through_old_paths() {
    let record = from_json(legacy_record());

    assert_eq!(resolve_text(&record, LogicalField::Invocation).unwrap(), "|| श्री गणेश ||");
    assert_eq!(resolve_text(&record, LogicalField::Name).unwrap(), "राम पाटील");
    assert_eq!(resolve_text(&record, LogicalField::Age).unwrap(), "29 वर्षे");
    assert_eq!(resolve_text(&record, LogicalField::Mobile).unwrap(), "9876543210");
    assert_eq!(resolve_text(&record, LogicalField::Brothers).unwrap(), "2 (विवाहित: 1)");
    assert_eq!(resolve_text(&record, LogicalField::FamilyType).unwrap(), "संयुक्त");
    assert_eq!(resolve_text(&record, LogicalField::MotherName).unwrap(), "N/A");
    assert!(resolve_text(&record, LogicalField::Mama).is_none());
}

#[test]
fn test_mixed_record_prefers_new_generation() {
    let mut value = legacy_record();
    value["personalInfo"] = json!({ "name": "सीता" });
    value["familyInfo"] = json!({ "brothers": [] });
    let record = from_json(value);

    assert_eq!(resolve_text(&record, LogicalField::Name).unwrap(), "सीता");
    // An empty list is not a value; the legacy counts still show.
    assert_eq!(resolve_text(&record, LogicalField::Brothers).unwrap(), "2 (विवाहित: 1)");
}

#[test]
fn test_every_layout_renders_a_legacy_record() {
    let record = from_json(legacy_record());
    for style in TemplateStyle::ALL {
        let html = render(&record, style);
        assert!(html.contains("biodata-preview"), "{:?}", style);
        assert!(html.contains("राम पाटील"), "{:?}", style);
        assert!(html.contains("शांत स्वभाव"), "{:?}", style);
    }
    assert!(render_text(&record).contains("राम पाटील"));
}

#[test]
fn test_declarative_source_matches_the_preview_rows() {
    let record = from_json(complete_record());
    let job = declarative::build_job(&record, None);

    assert!(job.source.contains(r#"  "नाव", ":", "राम पाटील","#));
    assert!(job.source.contains(r#"  "जन्मवेळ", ":", "2:30 PM","#));
    assert!(job.assets.is_empty());
    assert_eq!(job, declarative::build_job(&record, None));
}

#[test]
fn test_download_names_follow_the_resolved_name() {
    let record = from_json(legacy_record());
    assert_eq!(pdf_filename(&record), "राम_पाटील_biodata.pdf");

    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(dated_pdf_filename(&record, date), "राम_पाटील_2024-03-09.pdf");
    assert_eq!(dated_pdf_filename(&Record::default(), date), "biodata_2024-03-09.pdf");
}

#[test]
fn test_print_page_uses_the_chosen_layout() {
    let record = from_json(complete_record());
    let page = print_page(&record, TemplateStyle::Plain);
    assert_eq!(page.title, "राम_पाटील_biodata");
    assert!(page.html.contains("plain"));
    assert!(page.html.contains("window.print()"));
}
