use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::draft::{DraftStore, LocalDraftStorage, WizardStep};
use crate::export::{ExportStrategy, PREVIEW_REGION};
use crate::photo::{CropArea, PreviewRect};
use crate::record::{Record, RecordPatch};
use crate::resolve::{Generation, LogicalField};
use crate::template::TemplateStyle;
use crate::validation::{ValidationError, ValidationErrors};

/// A biodata record in its wire form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct RecordBody(pub Record);

/// Top-level keys to merge into the draft record.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct PatchBody(pub RecordPatch);

#[derive(Debug, Deserialize, IntoParams)]
pub struct TemplateQuery {
    /// Template id such as `template-2`; defaults to the record's own.
    pub template: Option<String>,
}

impl TemplateQuery {
    pub fn style_for(&self, record: &Record) -> TemplateStyle {
        match self.template.as_deref() {
            Some(id) => TemplateStyle::from_id(id),
            None => TemplateStyle::for_record(record),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
}

impl From<TemplateStyle> for TemplateInfo {
    fn from(style: TemplateStyle) -> Self {
        Self {
            id: style.id(),
            name: style.display_name(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldInfo {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

impl From<LogicalField> for FieldInfo {
    fn from(field: LogicalField) -> Self {
        let spec = field.spec();
        Self {
            key: spec.key,
            label: spec.label,
            placeholder: spec.placeholder,
        }
    }
}

/// Outcome of resolving one field against a record.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolvedField {
    pub field: &'static str,
    pub label: &'static str,
    /// `None` when the row is omitted from every layout.
    pub text: Option<String>,
    pub placeholder: bool,
    /// `new` or `legacy`, absent when nothing in the record supplied a value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<&'static str>,
}

pub fn generation_name(generation: Generation) -> &'static str {
    match generation {
        Generation::New => "new",
        Generation::Legacy => "legacy",
    }
}

fn default_region() -> String {
    PREVIEW_REGION.to_string()
}

/// A browser capture of a rendered region.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureUpload {
    #[serde(default = "default_region")]
    pub region: String,
    /// `data:image/png;base64,...`
    pub data_uri: String,
    /// Device pixels per CSS pixel the capture was taken at.
    pub scale: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub strategy: ExportStrategy,
    /// Layout for the print strategy; defaults to the record's own.
    #[serde(default)]
    pub template: Option<TemplateStyle>,
    #[schema(value_type = Object)]
    pub record: Record,
    /// Required by the raster strategy, ignored otherwise.
    #[serde(default)]
    pub captures: Vec<CaptureUpload>,
}

/// Selection drawn on a scaled-down preview of the source image.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSelection {
    pub rect: PreviewRect,
    pub display_width: f64,
    pub display_height: f64,
}

/// Crop in source pixels (`area`), in preview space (`preview`), or when
/// neither is given, the largest centred portrait crop.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropRequest {
    pub data_uri: String,
    #[serde(default)]
    pub area: Option<CropArea>,
    #[serde(default)]
    pub preview: Option<PreviewSelection>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropResponse {
    pub data_uri: String,
    pub area: CropArea,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<WizardStep>,
    #[schema(value_type = Object)]
    pub record: Record,
}

impl<S: LocalDraftStorage> From<&DraftStore<S>> for DraftResponse {
    fn from(store: &DraftStore<S>) -> Self {
        Self {
            step: store.step(),
            step_name: WizardStep::from_index(store.step()),
            record: store.record().clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StepRequest {
    pub step: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl From<ValidationErrors> for ValidationReport {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            valid: errors.is_empty(),
            errors: errors.errors().to_vec(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedId {
    pub id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoUrl {
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadPhotoRequest {
    #[allow(unused)]
    pub file: Vec<u8>,
}
