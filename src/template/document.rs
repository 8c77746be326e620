//! The resolved document: which sections and rows a record produces.
//!
//! Built once per render from the precedence table. Layouts and exporters
//! only ever see this structure, so they cannot disagree on content.

use serde::Serialize;

use crate::record::Record;
use crate::resolve::{resolve, DisplayValue, LogicalField};

pub const DOCUMENT_TITLE: &str = "विवाह सूचक माहिती पत्रक";
pub const FOOTER_TEXT: &str = "Created with Marathi Biodata Maker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Personal,
    Family,
    EducationCareer,
    Contact,
    PartnerPreferences,
    AboutMe,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Personal,
        SectionKind::Family,
        SectionKind::EducationCareer,
        SectionKind::Contact,
        SectionKind::PartnerPreferences,
        SectionKind::AboutMe,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Personal => "वैयक्तिक माहिती",
            Self::Family => "कौटुंबिक माहिती",
            Self::EducationCareer => "शिक्षण आणि व्यवसाय",
            Self::Contact => "संपर्क माहिती",
            Self::PartnerPreferences => "अपेक्षा",
            Self::AboutMe => "स्वतः विषयी",
        }
    }

    pub fn title_en(self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL DETAILS",
            Self::Family => "FAMILY DETAILS",
            Self::EducationCareer => "EDUCATION & CAREER",
            Self::Contact => "CONTACT DETAILS",
            Self::PartnerPreferences => "PARTNER PREFERENCES",
            Self::AboutMe => "ABOUT",
        }
    }

    /// Fields of the section, in display order.
    pub fn fields(self) -> &'static [LogicalField] {
        use LogicalField::*;
        match self {
            Self::Personal => &[
                Name,
                DateOfBirth,
                BirthTime,
                BirthPlace,
                Age,
                Religion,
                Caste,
                Height,
                BloodGroup,
                Complexion,
                Kuldaivat,
                Gotra,
                Devak,
                Rashi,
                Nakshatra,
                Gan,
                Nadi,
                Manglik,
                Education,
                JobOrBusiness,
                Salary,
            ],
            Self::Family => &[
                FatherName,
                FatherOccupation,
                MotherName,
                MotherOccupation,
                Sisters,
                Brothers,
                Mama,
                RelativeSurnames,
                FamilyType,
                NativePlace,
            ],
            Self::EducationCareer => &[Qualification, Occupation, Company, Income, WorkLocation],
            Self::Contact => &[Mobile, AlternatePhone, Email, Address],
            Self::PartnerPreferences => &[
                PreferredAge,
                PreferredHeight,
                PreferredEducation,
                PreferredOccupation,
                PreferredOther,
            ],
            Self::AboutMe => &[AboutMe],
        }
    }

    /// Free-text sections render as a paragraph instead of label rows.
    pub fn is_paragraph(self) -> bool {
        matches!(self, Self::AboutMe)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub field: &'static str,
    pub label: &'static str,
    pub label_en: &'static str,
    pub value: DisplayValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "content")]
pub enum SectionBody {
    Rows(Vec<Row>),
    Paragraph(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

impl Section {
    pub fn rows(&self) -> &[Row] {
        match &self.body {
            SectionBody::Rows(rows) => rows,
            SectionBody::Paragraph(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderBlock {
    pub invocation: String,
    pub deity_image: Option<String>,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub header: HeaderBlock,
    pub photo: Option<String>,
    /// Only sections with at least one resolved row.
    pub sections: Vec<Section>,
    pub footer: &'static str,
}

impl Document {
    pub fn build(record: &Record) -> Self {
        let invocation = resolve(record, LogicalField::Invocation)
            .map(|value| value.text)
            .unwrap_or_default();

        let deity_image = record
            .deity
            .as_ref()
            .filter(|deity| deity.show_image)
            .and_then(|deity| deity.image_url.clone())
            .filter(|url| !url.trim().is_empty());

        let photo = record
            .photo_url
            .clone()
            .filter(|url| !url.trim().is_empty());

        let sections = SectionKind::ALL
            .iter()
            .filter_map(|kind| build_section(record, *kind))
            .collect();

        Self {
            header: HeaderBlock {
                invocation,
                deity_image,
                title: DOCUMENT_TITLE,
            },
            photo,
            sections,
            footer: FOOTER_TEXT,
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.sections.iter().flat_map(|section| section.rows())
    }

    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows().find(|row| row.field == key)
    }
}

fn build_section(record: &Record, kind: SectionKind) -> Option<Section> {
    if kind.is_paragraph() {
        let text = kind
            .fields()
            .iter()
            .filter_map(|field| resolve(record, *field))
            .map(|value| value.text)
            .collect::<Vec<_>>()
            .join("\n\n");
        if text.is_empty() {
            return None;
        }
        return Some(Section {
            kind,
            body: SectionBody::Paragraph(text),
        });
    }

    let rows: Vec<Row> = kind
        .fields()
        .iter()
        .filter_map(|field| {
            let spec = field.spec();
            resolve(record, *field).map(|value| Row {
                field: spec.key,
                label: spec.label,
                label_en: spec.label_en,
                value,
            })
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(Section {
            kind,
            body: SectionBody::Rows(rows),
        })
    }
}
