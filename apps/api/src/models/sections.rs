use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resume as stored: section key → entry. The key set differs per resume.
pub type ResumeDocument = BTreeMap<String, SectionEntry>;

/// Preferred display order for known sections. Unknown keys follow, sorted.
pub const SECTION_ORDER: [&str; 7] = [
    "contactInfo",
    "summary",
    "workExperience",
    "education",
    "skills",
    "projects",
    "certifications",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionEntry {
    /// Section-specific shape: object, list or scalar.
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Map<String, Value>>,
}

/// Decodes a JSON value as a resume document. Fails if the value is not an
/// object of `{data, analysis?}` entries.
pub fn parse_document(value: &Value) -> Result<ResumeDocument, serde_json::Error> {
    ResumeDocument::deserialize(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperienceItem {
    pub company: String,
    #[serde(alias = "role")]
    pub title: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(alias = "bullets")]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    pub institution: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectItem {
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationItem {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
}

/// Typed view of a section. Keys the service does not know, and known keys
/// whose data does not fit the expected shape, become `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    ContactInfo(ContactInfo),
    Summary(String),
    /// Group name → items, e.g. `{"hard": [..], "soft": [..]}`.
    Skills(BTreeMap<String, Vec<String>>),
    WorkExperience(Vec<WorkExperienceItem>),
    Education(Vec<EducationItem>),
    Projects(Vec<ProjectItem>),
    Certifications(Vec<CertificationItem>),
    Other { key: String, data: Value },
}

impl Section {
    pub fn from_entry(key: &str, entry: &SectionEntry) -> Section {
        let data = entry.data.clone();
        let typed = match key {
            "contactInfo" => serde_json::from_value(data).map(Section::ContactInfo),
            "summary" => serde_json::from_value(data).map(Section::Summary),
            "skills" => serde_json::from_value(data).map(Section::Skills),
            "workExperience" => serde_json::from_value(data).map(Section::WorkExperience),
            "education" => serde_json::from_value(data).map(Section::Education),
            "projects" => serde_json::from_value(data).map(Section::Projects),
            "certifications" => serde_json::from_value(data).map(Section::Certifications),
            _ => {
                return Section::Other {
                    key: key.to_string(),
                    data,
                }
            }
        };
        typed.unwrap_or_else(|_| Section::Other {
            key: key.to_string(),
            data: entry.data.clone(),
        })
    }

    pub fn key(&self) -> &str {
        match self {
            Section::ContactInfo(_) => "contactInfo",
            Section::Summary(_) => "summary",
            Section::Skills(_) => "skills",
            Section::WorkExperience(_) => "workExperience",
            Section::Education(_) => "education",
            Section::Projects(_) => "projects",
            Section::Certifications(_) => "certifications",
            Section::Other { key, .. } => key.as_str(),
        }
    }
}

/// Sections of a document in display order.
pub fn ordered_sections(doc: &ResumeDocument) -> Vec<Section> {
    let known = SECTION_ORDER
        .iter()
        .filter_map(|key| doc.get(*key).map(|entry| Section::from_entry(key, entry)));
    let rest = doc
        .iter()
        .filter(|(key, _)| !SECTION_ORDER.contains(&key.as_str()))
        .map(|(key, entry)| Section::from_entry(key, entry));
    known.chain(rest).collect()
}
