//! The precedence table: every logical field, where it is read from, and in
//! which order.

use std::borrow::Cow;

use crate::record::{MaritalStatus, Record, Sibling};

/// Schema generation a source path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    New,
    Legacy,
}

/// Post-processing applied to the winning value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Text,
    /// 24-hour input shown as 12-hour, see [`super::format_time`].
    Time,
}

/// A named display fact, independent of which generation backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalField {
    Invocation,
    // personal
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
    // family
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
    // education and career
    Qualification,
    Occupation,
    Company,
    Income,
    WorkLocation,
    // contact
    Mobile,
    AlternatePhone,
    Email,
    Address,
    // partner preferences
    PreferredAge,
    PreferredHeight,
    PreferredEducation,
    PreferredOccupation,
    PreferredOther,
    AboutMe,
}

/// One concrete location in the record a value can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourcePath {
    DeityName,
    HeaderText,

    InfoName,
    InfoDateOfBirth,
    InfoBirthTime,
    InfoBirthPlace,
    InfoReligion,
    InfoCaste,
    InfoHeight,
    InfoBloodGroup,
    InfoColour,
    InfoKuldaivat,
    InfoGotra,
    InfoRashi,
    InfoNakshatra,
    InfoGan,
    InfoNadi,
    InfoManglik,
    InfoEducation,
    InfoJobOrBusiness,
    InfoSalary,

    DetailsFullNameMarathi,
    DetailsFullName,
    DetailsAge,
    DetailsDateOfBirth,
    DetailsBirthTime,
    DetailsBirthPlace,
    DetailsHeight,
    DetailsBloodGroup,
    DetailsComplexion,
    DetailsManglik,
    DetailsGotra,
    DetailsDevak,

    FamilyFatherName,
    FamilyFatherJob,
    FamilyMotherName,
    FamilyMotherJob,
    FamilySisterList,
    FamilyBrotherList,
    FamilyMama,
    FamilyRelativeSurnames,

    LegacyFatherName,
    LegacyFatherOccupation,
    LegacyMotherName,
    LegacyMotherOccupation,
    LegacySisterCount,
    LegacyBrotherCount,
    LegacyFamilyType,
    LegacyNativePlace,

    EducationQualification,
    EducationOccupation,
    EducationCompany,
    EducationIncome,
    EducationWorkLocation,

    ContactMobileNumber,
    ContactAddress,
    ContactPhone,
    ContactAlternatePhone,
    ContactEmail,

    PreferenceAgeRange,
    PreferenceHeightRange,
    PreferenceEducation,
    PreferenceOccupation,
    PreferenceOther,

    AboutMe,
}

/// Resolution rule for one logical field.
#[derive(Debug)]
pub struct FieldSpec {
    pub field: LogicalField,
    /// camelCase identifier used by API callers.
    pub key: &'static str,
    pub label: &'static str,
    pub label_en: &'static str,
    /// Consulted in order; the first present, non-empty value wins.
    pub sources: &'static [SourcePath],
    /// Shown when no source has a value. `None` means the row is omitted.
    pub placeholder: Option<&'static str>,
    pub format: ValueFormat,
}

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_INVOCATION: &str = "|| श्री गणेशाय नमः ||";

const fn spec(
    field: LogicalField,
    key: &'static str,
    label: &'static str,
    label_en: &'static str,
    sources: &'static [SourcePath],
    placeholder: Option<&'static str>,
) -> FieldSpec {
    FieldSpec {
        field,
        key,
        label,
        label_en,
        sources,
        placeholder,
        format: ValueFormat::Text,
    }
}

use LogicalField as F;
use SourcePath as S;

/// Indexed by `LogicalField as usize`.
pub static FIELD_TABLE: [FieldSpec; 47] = [
    spec(F::Invocation, "invocation", "", "Invocation", &[S::DeityName, S::HeaderText], Some(DEFAULT_INVOCATION)),
    spec(F::Name, "name", "नाव", "Name", &[S::InfoName, S::DetailsFullNameMarathi, S::DetailsFullName], Some(NOT_AVAILABLE)),
    spec(F::DateOfBirth, "dateOfBirth", "जन्मतारीख", "Date of Birth", &[S::InfoDateOfBirth, S::DetailsDateOfBirth], Some(NOT_AVAILABLE)),
    FieldSpec {
        format: ValueFormat::Time,
        ..spec(F::BirthTime, "birthTime", "जन्मवेळ", "Birth Time", &[S::InfoBirthTime, S::DetailsBirthTime], None)
    },
    spec(F::BirthPlace, "birthPlace", "जन्मस्थळ", "Birth Place", &[S::InfoBirthPlace, S::DetailsBirthPlace], None),
    spec(F::Age, "age", "वय", "Age", &[S::DetailsAge], None),
    spec(F::Religion, "religion", "धर्म", "Religion", &[S::InfoReligion], None),
    spec(F::Caste, "caste", "जात", "Caste", &[S::InfoCaste], None),
    spec(F::Height, "height", "उंची", "Height", &[S::InfoHeight, S::DetailsHeight], Some(NOT_AVAILABLE)),
    spec(F::BloodGroup, "bloodGroup", "रक्तगट", "Blood Group", &[S::InfoBloodGroup, S::DetailsBloodGroup], None),
    spec(F::Complexion, "colour", "रंग", "Complexion", &[S::InfoColour, S::DetailsComplexion], None),
    spec(F::Kuldaivat, "kuldaivat", "कुलदैवत", "Kuldaivat", &[S::InfoKuldaivat], None),
    spec(F::Gotra, "gotra", "गोत्र", "Gotra", &[S::InfoGotra, S::DetailsGotra], None),
    spec(F::Devak, "devak", "देवक", "Devak", &[S::DetailsDevak], None),
    spec(F::Rashi, "rashi", "राशी", "Rashi", &[S::InfoRashi], None),
    spec(F::Nakshatra, "nakshatra", "नक्षत्र", "Nakshatra", &[S::InfoNakshatra], None),
    spec(F::Gan, "gan", "गण", "Gan", &[S::InfoGan], None),
    spec(F::Nadi, "nadi", "नाडी", "Nadi", &[S::InfoNadi], None),
    spec(F::Manglik, "manglik", "मांगलिक", "Manglik", &[S::InfoManglik, S::DetailsManglik], None),
    spec(F::Education, "education", "शिक्षण", "Education", &[S::InfoEducation], None),
    spec(F::JobOrBusiness, "jobOrBusiness", "नोकरी/व्यवसाय", "Job/Business", &[S::InfoJobOrBusiness], None),
    spec(F::Salary, "salary", "वार्षिक उत्पन्न", "Annual Income", &[S::InfoSalary], None),
    spec(F::FatherName, "fatherName", "वडीलांचे नाव", "Father's Name", &[S::FamilyFatherName, S::LegacyFatherName], Some(NOT_AVAILABLE)),
    spec(F::FatherOccupation, "fatherOccupation", "वडीलांचा व्यवसाय", "Father's Occupation", &[S::FamilyFatherJob, S::LegacyFatherOccupation], None),
    spec(F::MotherName, "motherName", "आईचे नाव", "Mother's Name", &[S::FamilyMotherName, S::LegacyMotherName], Some(NOT_AVAILABLE)),
    spec(F::MotherOccupation, "motherOccupation", "आईचा व्यवसाय", "Mother's Occupation", &[S::FamilyMotherJob, S::LegacyMotherOccupation], None),
    spec(F::Sisters, "sisters", "बहिणी", "Sisters", &[S::FamilySisterList, S::LegacySisterCount], None),
    spec(F::Brothers, "brothers", "भाऊ", "Brothers", &[S::FamilyBrotherList, S::LegacyBrotherCount], None),
    spec(F::Mama, "mama", "मामा", "Maternal Uncle", &[S::FamilyMama], None),
    spec(F::RelativeSurnames, "relativeSurnames", "नातेवाईक आडनावे", "Relative Surnames", &[S::FamilyRelativeSurnames], None),
    spec(F::FamilyType, "familyType", "कुटुंब प्रकार", "Family Type", &[S::LegacyFamilyType], None),
    spec(F::NativePlace, "nativePlace", "मूळ गाव", "Native Place", &[S::LegacyNativePlace], None),
    spec(F::Qualification, "qualification", "शिक्षण", "Education", &[S::EducationQualification], None),
    spec(F::Occupation, "occupation", "व्यवसाय", "Occupation", &[S::EducationOccupation], None),
    spec(F::Company, "company", "कंपनी", "Company", &[S::EducationCompany], None),
    spec(F::Income, "income", "उत्पन्न", "Income", &[S::EducationIncome], None),
    spec(F::WorkLocation, "workLocation", "कामाचे ठिकाण", "Work Location", &[S::EducationWorkLocation], None),
    spec(F::Mobile, "mobile", "मोबाईल", "Mobile", &[S::ContactMobileNumber, S::ContactPhone], Some(NOT_AVAILABLE)),
    spec(F::AlternatePhone, "alternatePhone", "पर्यायी मोबाईल", "Alternate Mobile", &[S::ContactAlternatePhone], None),
    spec(F::Email, "email", "ईमेल", "Email", &[S::ContactEmail], None),
    spec(F::Address, "address", "पत्ता", "Address", &[S::ContactAddress], Some(NOT_AVAILABLE)),
    spec(F::PreferredAge, "preferredAge", "वय", "Age", &[S::PreferenceAgeRange], None),
    spec(F::PreferredHeight, "preferredHeight", "उंची", "Height", &[S::PreferenceHeightRange], None),
    spec(F::PreferredEducation, "preferredEducation", "शिक्षण", "Education", &[S::PreferenceEducation], None),
    spec(F::PreferredOccupation, "preferredOccupation", "व्यवसाय", "Occupation", &[S::PreferenceOccupation], None),
    spec(F::PreferredOther, "preferredOther", "इतर", "Other", &[S::PreferenceOther], None),
    spec(F::AboutMe, "aboutMe", "स्वतः विषयी", "About", &[S::AboutMe], None),
];

impl LogicalField {
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_TABLE[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn all() -> impl Iterator<Item = LogicalField> {
        FIELD_TABLE.iter().map(|spec| spec.field)
    }
}

impl std::str::FromStr for LogicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_TABLE
            .iter()
            .find(|spec| spec.key == s)
            .map(|spec| spec.field)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

impl std::fmt::Display for LogicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

fn text(value: Option<&String>) -> Option<Cow<'_, str>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| Cow::Borrowed(v.as_str()))
}

fn sibling_list(siblings: Option<&Vec<Sibling>>) -> Option<Cow<'static, str>> {
    let siblings = siblings.filter(|list| !list.is_empty())?;
    let joined = siblings
        .iter()
        .map(|s| format!("{} ({})", s.name, s.marital_status.marathi()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(Cow::Owned(joined))
}

fn sibling_count(count: Option<u32>, married: Option<u32>) -> Option<Cow<'static, str>> {
    count.map(|count| {
        Cow::Owned(format!(
            "{count} ({}: {})",
            MaritalStatus::Married.marathi(),
            married.unwrap_or(0)
        ))
    })
}

impl SourcePath {
    pub fn generation(self) -> Generation {
        match self {
            S::HeaderText
            | S::DetailsFullNameMarathi
            | S::DetailsFullName
            | S::DetailsAge
            | S::DetailsDateOfBirth
            | S::DetailsBirthTime
            | S::DetailsBirthPlace
            | S::DetailsHeight
            | S::DetailsBloodGroup
            | S::DetailsComplexion
            | S::DetailsManglik
            | S::DetailsGotra
            | S::DetailsDevak
            | S::LegacyFatherName
            | S::LegacyFatherOccupation
            | S::LegacyMotherName
            | S::LegacyMotherOccupation
            | S::LegacySisterCount
            | S::LegacyBrotherCount
            | S::LegacyFamilyType
            | S::LegacyNativePlace
            | S::EducationQualification
            | S::EducationOccupation
            | S::EducationCompany
            | S::EducationIncome
            | S::EducationWorkLocation
            | S::ContactPhone
            | S::ContactAlternatePhone
            | S::ContactEmail
            | S::PreferenceAgeRange
            | S::PreferenceHeightRange
            | S::PreferenceEducation
            | S::PreferenceOccupation
            | S::PreferenceOther
            | S::AboutMe => Generation::Legacy,
            _ => Generation::New,
        }
    }

    /// Read this path from the record. Empty and whitespace-only strings,
    /// empty sibling lists and zero ages count as absent.
    pub fn extract(self, record: &Record) -> Option<Cow<'_, str>> {
        let info = record.personal_info.as_ref();
        let details = record.legacy_personal.as_ref();
        let family = record.family_info.as_ref();
        let legacy_family = record.legacy_family.as_ref();
        let education = record.education.as_ref();
        let contact = record.contact.as_ref();
        let prefs = record.partner_preferences.as_ref();

        match self {
            S::DeityName => text(record.deity.as_ref().map(|d| &d.name)),
            S::HeaderText => {
                let header = record.header.as_ref()?;
                let value = text(Some(&header.text))?;
                if header.show_symbols {
                    Some(Cow::Owned(format!("|| {value} ||")))
                } else {
                    Some(value)
                }
            }

            S::InfoName => text(info.and_then(|p| p.name.as_ref())),
            S::InfoDateOfBirth => text(info.and_then(|p| p.date_of_birth.as_ref())),
            S::InfoBirthTime => text(info.and_then(|p| p.birth_time.as_ref())),
            S::InfoBirthPlace => text(info.and_then(|p| p.birth_place.as_ref())),
            S::InfoReligion => text(info.and_then(|p| p.religion.as_ref())),
            S::InfoCaste => text(info.and_then(|p| p.caste.as_ref())),
            S::InfoHeight => text(info.and_then(|p| p.height.as_ref())),
            S::InfoBloodGroup => text(info.and_then(|p| p.blood_group.as_ref())),
            S::InfoColour => text(info.and_then(|p| p.colour.as_ref())),
            S::InfoKuldaivat => text(info.and_then(|p| p.kuldaivat.as_ref())),
            S::InfoGotra => text(info.and_then(|p| p.gotra.as_ref())),
            S::InfoRashi => text(info.and_then(|p| p.rashi.as_ref())),
            S::InfoNakshatra => text(info.and_then(|p| p.nakshatra.as_ref())),
            S::InfoGan => text(info.and_then(|p| p.gan.as_ref())),
            S::InfoNadi => text(info.and_then(|p| p.nadi.as_ref())),
            S::InfoManglik => text(info.and_then(|p| p.manglik.as_ref())),
            S::InfoEducation => text(info.and_then(|p| p.education.as_ref())),
            S::InfoJobOrBusiness => text(info.and_then(|p| p.job_or_business.as_ref())),
            S::InfoSalary => text(info.and_then(|p| p.salary.as_ref())),

            S::DetailsFullNameMarathi => text(details.and_then(|p| p.full_name_marathi.as_ref())),
            S::DetailsFullName => text(details.and_then(|p| p.full_name.as_ref())),
            S::DetailsAge => details
                .and_then(|p| p.age)
                .filter(|age| *age > 0)
                .map(|age| Cow::Owned(format!("{age} वर्षे"))),
            S::DetailsDateOfBirth => text(details.and_then(|p| p.date_of_birth.as_ref())),
            S::DetailsBirthTime => text(details.and_then(|p| p.birth_time.as_ref())),
            S::DetailsBirthPlace => text(details.and_then(|p| p.birth_place.as_ref())),
            S::DetailsHeight => text(details.and_then(|p| p.height.as_ref())),
            S::DetailsBloodGroup => text(details.and_then(|p| p.blood_group.as_ref())),
            S::DetailsComplexion => text(details.and_then(|p| p.complexion.as_ref())),
            S::DetailsManglik => text(details.and_then(|p| p.manglik.as_ref())),
            S::DetailsGotra => text(details.and_then(|p| p.gotra.as_ref())),
            S::DetailsDevak => text(details.and_then(|p| p.devak.as_ref())),

            S::FamilyFatherName => text(family.and_then(|f| f.father_name.as_ref())),
            S::FamilyFatherJob => text(family.and_then(|f| f.father_job_or_business.as_ref())),
            S::FamilyMotherName => text(family.and_then(|f| f.mother_name.as_ref())),
            S::FamilyMotherJob => text(family.and_then(|f| f.mother_job_or_business.as_ref())),
            S::FamilySisterList => sibling_list(family.and_then(|f| f.sisters.as_ref())),
            S::FamilyBrotherList => sibling_list(family.and_then(|f| f.brothers.as_ref())),
            S::FamilyMama => text(family.and_then(|f| f.mama.as_ref())),
            S::FamilyRelativeSurnames => text(family.and_then(|f| f.relative_surnames.as_ref())),

            S::LegacyFatherName => text(legacy_family.and_then(|f| f.father_name.as_ref())),
            S::LegacyFatherOccupation => {
                text(legacy_family.and_then(|f| f.father_occupation.as_ref()))
            }
            S::LegacyMotherName => text(legacy_family.and_then(|f| f.mother_name.as_ref())),
            S::LegacyMotherOccupation => {
                text(legacy_family.and_then(|f| f.mother_occupation.as_ref()))
            }
            S::LegacySisterCount => {
                let f = legacy_family?;
                sibling_count(f.sisters, f.sisters_married)
            }
            S::LegacyBrotherCount => {
                let f = legacy_family?;
                sibling_count(f.brothers, f.brothers_married)
            }
            S::LegacyFamilyType => legacy_family
                .and_then(|f| f.family_type)
                .map(|t| Cow::Borrowed(t.marathi())),
            S::LegacyNativePlace => text(legacy_family.and_then(|f| f.native_place.as_ref())),

            S::EducationQualification => text(education.and_then(|e| e.qualification.as_ref())),
            S::EducationOccupation => text(education.and_then(|e| e.occupation.as_ref())),
            S::EducationCompany => text(education.and_then(|e| e.company.as_ref())),
            S::EducationIncome => text(education.and_then(|e| e.income.as_ref())),
            S::EducationWorkLocation => text(education.and_then(|e| e.work_location.as_ref())),

            S::ContactMobileNumber => text(contact.and_then(|c| c.mobile_number.as_ref())),
            S::ContactAddress => text(contact.and_then(|c| c.address.as_ref())),
            S::ContactPhone => text(contact.and_then(|c| c.phone.as_ref())),
            S::ContactAlternatePhone => text(contact.and_then(|c| c.alternate_phone.as_ref())),
            S::ContactEmail => text(contact.and_then(|c| c.email.as_ref())),

            S::PreferenceAgeRange => text(prefs.and_then(|p| p.age_range.as_ref())),
            S::PreferenceHeightRange => text(prefs.and_then(|p| p.height_range.as_ref())),
            S::PreferenceEducation => text(prefs.and_then(|p| p.education.as_ref())),
            S::PreferenceOccupation => text(prefs.and_then(|p| p.occupation.as_ref())),
            S::PreferenceOther => text(prefs.and_then(|p| p.other.as_ref())),

            S::AboutMe => text(record.about_me.as_ref()),
        }
    }
}
