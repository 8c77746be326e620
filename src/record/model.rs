use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Keys the current schema does not know about. Kept verbatim so records
/// written by newer or older front ends survive a load/save cycle.
pub type Extra = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_TEMPLATE_ID: &str = "template-1";

fn default_template_id() -> String {
    DEFAULT_TEMPLATE_ID.to_string()
}

/// Select-box values: the form stores `""` for "not chosen", and older
/// front ends may have written values this build does not know. Both read
/// as unset instead of rejecting the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => {
                log::debug!("Ignoring unrecognised choice {}", value);
                Ok(None)
            }
        },
    }
}

/// One person's biodata, carrying both schema generations side by side.
///
/// The new generation lives in `personal_info`, `family_info`, `deity` and the
/// `address`/`mobile_number` pair of `contact`. The legacy generation lives in
/// `legacy_personal` (`personalDetails` on the wire), `legacy_family`
/// (`familyDetails`), `header`, `education`, `partner_preferences`, `about_me`
/// and the old phone fields of `contact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "userId", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deity: Option<Deity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, rename = "personalDetails", skip_serializing_if = "Option::is_none")]
    pub legacy_personal: Option<LegacyPersonal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_info: Option<FamilyInfo>,
    #[serde(default, rename = "familyDetails", skip_serializing_if = "Option::is_none")]
    pub legacy_family: Option<LegacyFamily>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<LegacyEducation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_preferences: Option<PartnerPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,

    #[serde(default = "default_template_id")]
    pub template_id: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: None,
            owner: None,
            deity: None,
            header: None,
            personal_info: None,
            legacy_personal: None,
            family_info: None,
            legacy_family: None,
            contact: None,
            photo_url: None,
            education: None,
            partner_preferences: None,
            about_me: None,
            template_id: default_template_id(),
            language: None,
            created_at: None,
            updated_at: None,
            extra: Extra::new(),
        }
    }
}

impl Record {
    /// True once the record has been written to the cloud backend.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Apply `patch` one level deep: each top-level key in the patch
    /// replaces the whole value under that key.
    pub fn merged(&self, patch: &RecordPatch) -> Result<Record, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut value {
            for (key, patch_value) in patch {
                fields.insert(key.clone(), patch_value.clone());
            }
        }
        serde_json::from_value(value)
    }
}

/// Partial record keyed by wire name, as sent by one form step.
pub type RecordPatch = serde_json::Map<String, serde_json::Value>;

/// Invocation line of the new generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deity {
    /// Already wrapped (`|| ॐ ||`) or plain, exactly as chosen in the form.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub show_image: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Invocation line of the legacy generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default)]
    pub text: String,
    /// Wrap the text in `|| … ||` when rendering.
    #[serde(default)]
    pub show_symbols: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caste: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kuldaivat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gotra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rashi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nakshatra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nadi: Option<String>,
    /// `Yes`, `No` or `Anshik`; shown as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manglik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_or_business: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPersonal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name_marathi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manglik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gotra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devak: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Anything but `Married` reads as unmarried, as the form's default is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MaritalStatus {
    Married,
    #[default]
    Unmarried,
}

impl From<String> for MaritalStatus {
    fn from(value: String) -> Self {
        if value.trim() == "Married" {
            Self::Married
        } else {
            Self::Unmarried
        }
    }
}

impl MaritalStatus {
    pub fn marathi(self) -> &'static str {
        match self {
            Self::Married => "विवाहित",
            Self::Unmarried => "अविवाहित",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sibling {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Sibling {
    pub fn new(name: impl Into<String>, marital_status: MaritalStatus) -> Self {
        Self {
            name: name.into(),
            marital_status,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_job_or_business: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_job_or_business: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sisters: Option<Vec<Sibling>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brothers: Option<Vec<Sibling>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mama: Option<String>,
    /// Comma-separated surnames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_surnames: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilyType {
    Joint,
    Nuclear,
}

impl FamilyType {
    pub fn marathi(self) -> &'static str {
        match self {
            Self::Joint => "संयुक्त",
            Self::Nuclear => "एकटे",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFamily {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brothers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brothers_married: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sisters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sisters_married: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub family_type: Option<FamilyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_place: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    // legacy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEducation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_location: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Marathi,
    English,
    Both,
}
