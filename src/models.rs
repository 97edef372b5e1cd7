use serde::{Deserialize, Serialize};

/// Outcome of a section parse that can fail unrecoverably.
///
/// `Parsed(vec![])` means the section was reachable and legitimately empty.
/// `Fatal` means a mandatory field or the section root could not be
/// recovered; no records from that section should be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum SectionResult<T> {
    Parsed(Vec<T>),
    Fatal(String),
}

impl<T> SectionResult<T> {
    pub fn records(&self) -> Option<&[T]> {
        match self {
            SectionResult::Parsed(records) => Some(records),
            SectionResult::Fatal(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SectionResult::Fatal(_))
    }
}

impl<T> Default for SectionResult<T> {
    fn default() -> Self {
        SectionResult::Parsed(Vec::new())
    }
}

/// One role at one employer. `position` and `company_name` are mandatory;
/// their absence aborts the section parse. An absent `end_date` encodes a
/// current role or an unknown end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company_name: String,
    pub position: String,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    /// Reserved, never populated.
    pub media: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub degree_type: String,
    pub institution: Option<String>,
    pub gpa: Option<String>,
    pub activities: Option<String>,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    /// Reserved, never populated.
    pub media: Option<String>,
}

/// One skill category pane. Categories keep discovery order and names are
/// unique per profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
}

/// Assembled profile record. Built incrementally by the assembler and not
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub user_url_id: String,
    pub name: String,
    pub location: Option<String>,
    pub header: Option<String>,
    pub about: Option<String>,
    /// Carries the experience parser's fatal outcome verbatim; check before
    /// treating this as a well-formed list.
    pub experience: SectionResult<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<SkillCategory>,
}
