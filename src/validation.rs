//! Form validation.
//!
//! Errors are per field and never stop other fields from being edited. A
//! wizard step only refuses to advance on its own required fields.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::draft::WizardStep;
use crate::record::Record;

lazy_static! {
    static ref MOBILE: Regex = Regex::new(r"^[0-9]{10}$").expect("static pattern");
}

/// Validation error with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationError {
    /// Wire path of the offending field, e.g. `personalInfo.name`
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn invalid_mobile(field: &str) -> Self {
        Self::new(field, "Please enter a valid 10-digit mobile number")
            .with_suggestion("Digits only, without +91 or spaces, e.g. 9876543210")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn field(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|error| error.field == field)
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate that a value is present and not blank
pub fn validate_required(
    value: Option<&String>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Required, exactly ten digits.
pub fn validate_mobile(value: Option<&String>, field: &str, errors: &mut ValidationErrors) {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => errors.add(ValidationError::empty_field(field, "Mobile number")),
        Some(mobile) if !MOBILE.is_match(mobile) => {
            errors.add(ValidationError::invalid_mobile(field))
        }
        Some(_) => {}
    }
}

/// Required fields owned by one wizard step.
pub fn validate_step(record: &Record, step: WizardStep) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        WizardStep::Personal => {
            let info = record.personal_info.as_ref();
            for (value, field, label) in [
                (info.and_then(|p| p.name.as_ref()), "personalInfo.name", "Name"),
                (info.and_then(|p| p.date_of_birth.as_ref()), "personalInfo.dateOfBirth", "Date of birth"),
                (info.and_then(|p| p.religion.as_ref()), "personalInfo.religion", "Religion"),
                (info.and_then(|p| p.caste.as_ref()), "personalInfo.caste", "Caste"),
                (info.and_then(|p| p.height.as_ref()), "personalInfo.height", "Height"),
                (info.and_then(|p| p.education.as_ref()), "personalInfo.education", "Education"),
                (info.and_then(|p| p.job_or_business.as_ref()), "personalInfo.jobOrBusiness", "Job or business"),
                (info.and_then(|p| p.salary.as_ref()), "personalInfo.salary", "Salary"),
            ] {
                validate_required(value, field, label, &mut errors);
            }
        }
        WizardStep::Family => {
            let family = record.family_info.as_ref();
            validate_required(
                family.and_then(|f| f.father_name.as_ref()),
                "familyInfo.fatherName",
                "Father's name",
                &mut errors,
            );
            validate_required(
                family.and_then(|f| f.mother_name.as_ref()),
                "familyInfo.motherName",
                "Mother's name",
                &mut errors,
            );
        }
        WizardStep::Contact => {
            let contact = record.contact.as_ref();
            validate_required(
                contact.and_then(|c| c.address.as_ref()),
                "contact.address",
                "Address",
                &mut errors,
            );
            validate_mobile(
                contact.and_then(|c| c.mobile_number.as_ref()),
                "contact.mobileNumber",
                &mut errors,
            );
        }
        WizardStep::Deity | WizardStep::Photo => {}
    }

    errors
}

/// Every step at once, used before saving.
pub fn validate_record(record: &Record) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for step in WizardStep::ALL {
        errors.extend(validate_step(record, step));
    }
    errors
}
