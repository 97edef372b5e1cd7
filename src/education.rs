use log::{error, warn};

use crate::dom::{text_of, DomAccessor, Locator, SHORT_WAIT};
use crate::models::Education;

const SUBPAGE: &str = "/details/education";

const DEGREE_LABEL: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/span[1]/span[1]");
const INSTITUTION: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/div/span/span[1]");
const DATE_RANGE: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/span[2]/span[1]");
const DETAIL_DESCRIPTION: Locator<'static> = Locator::Path("./div/ul/li/div/div/div/span[1]");

const GRADE_LABEL: &str = "Grade:";
const ACTIVITIES_LABEL: &str = "Activities and societies:";

/// Parses the education sub-page of `profile_url`.
///
/// A missing root is treated as "no education" rather than a render
/// failure: this root is commonly absent, not slow. A missing mandatory
/// label abandons the parse with no partial records retained.
pub fn extract<D: DomAccessor>(dom: &mut D, profile_url: &str) -> Vec<Education> {
    let url = format!("{}{}", profile_url, SUBPAGE);
    if let Err(e) = dom.navigate(&url) {
        error!("Education navigation failed: {}", e);
        return Vec::new();
    }

    let main = match dom.await_presence(None, &Locator::Tag("main"), SHORT_WAIT) {
        Ok(main) => main,
        Err(_) => {
            warn!("Could not find education root");
            return Vec::new();
        }
    };

    let entries = match dom.locate(Some(&main), &Locator::Tag("ul")) {
        Ok(list) => dom.locate_all(Some(&list), &Locator::Path("./child::*")),
        Err(_) => {
            warn!("Could not find education list");
            Vec::new()
        }
    };

    let mut education = Vec::new();
    for entry in &entries {
        match parse_entry(dom, entry) {
            Some(record) => education.push(record),
            None => return Vec::new(),
        }
    }
    education
}

fn parse_entry<D: DomAccessor>(dom: &D, entry: &D::Node) -> Option<Education> {
    let degree_line = match text_of(dom, entry, &DEGREE_LABEL) {
        Some(line) => line,
        None => {
            error!("Could not find degree information");
            return None;
        }
    };
    // "<degree>, <degree_type>"
    let degree = degree_line.split(", ").next().unwrap_or_default().to_string();
    let degree_type = degree_line.split(", ").last().unwrap_or_default().to_string();

    let institution = text_of(dom, entry, &INSTITUTION);

    let mut gpa = None;
    let mut activities = None;
    let mut description = None;

    let detail_items = match dom.locate(Some(entry), &Locator::Tag("ul")) {
        Ok(list) => dom.locate_all(Some(&list), &Locator::Path("./child::*")),
        Err(_) => {
            warn!("Could not find description list");
            Vec::new()
        }
    };

    for item in &detail_items {
        let text = dom.text(item);
        if let Some(value) = labeled_capture(&text, GRADE_LABEL) {
            gpa = Some(value);
            continue;
        }
        if let Some(value) = labeled_capture(&text, ACTIVITIES_LABEL) {
            activities = Some(value);
            continue;
        }
        description = Some(match text_of(dom, item, &DETAIL_DESCRIPTION) {
            Some(text) => text,
            None => {
                warn!("Could not extract description");
                String::new()
            }
        });
    }

    let raw_dates = match text_of(dom, entry, &DATE_RANGE) {
        Some(raw) => raw,
        None => {
            error!("Could not find education dates");
            return None;
        }
    };
    // "<start> - <end>"
    let start_date = raw_dates.split(" - ").next().unwrap_or_default().to_string();
    let end_date = raw_dates.split(" - ").last().unwrap_or_default().to_string();

    Some(Education {
        degree,
        degree_type,
        institution,
        gpa,
        activities,
        description,
        start_date,
        end_date,
        media: None,
    })
}

/// Captures the text following `label`, stopping at the next occurrence of
/// the same label: these fields are sometimes stored twice in the markup,
/// one copy hidden.
fn labeled_capture(text: &str, label: &str) -> Option<String> {
    let pos = text.find(label)?;
    let rest = &text[pos + label.len()..];
    let value = match rest.find(label) {
        Some(duplicate) => &rest[..duplicate],
        None => rest,
    };
    Some(value.trim().to_string())
}
