use log::{error, warn};

use crate::dom::{text_of, DomAccessor, Locator, SHORT_WAIT};
use crate::models::{Experience, SectionResult};

const SUBPAGE: &str = "/details/experience";

const ENTRY_LIST: Locator<'static> = Locator::Path("./section/div[2]/div/div[1]/ul");

/// Grouped entries nest their role list two lists deep, but flat entries
/// embed description lists at the same depth. Only this probe element
/// actually distinguishes the grouped layout.
const GROUPED_PROBE: Locator<'static> =
    Locator::Path("./div/div[2]/div[2]/ul/li/div/div/div[1]/ul/li[1]/span");
const ROLE_LIST: Locator<'static> = Locator::Path("./div/div[2]/div[2]/ul/li/div/div/div[1]/ul");

const GROUP_COMPANY: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/div/span/span[1]");
const GROUP_TYPE: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/span[1]/span[1]");
const GROUP_LOCATION: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/span[2]/span[1]");

const SUB_POSITION: Locator<'static> = Locator::Path("./div/div[2]/div/a/div/span/span[1]");
const SUB_TYPE_FALLBACK: Locator<'static> =
    Locator::Path("./div/div/div[1]/ul/li[1]/div/div[2]/div/a/span[1]");
const SUB_LOCATION_FALLBACK: Locator<'static> =
    Locator::Path("./div/div[2]/div/a/span[3]/span[1]");
const SUB_DATES: Locator<'static> = Locator::Path("./div/div[2]/div/a/span/span[1]");

const FLAT_POSITION: Locator<'static> =
    Locator::Path("./div/div[2]/div/div[1]/div/span/span[1]");
const FLAT_COMPANY_TYPE: Locator<'static> =
    Locator::Path("./div/div[2]/div/div[1]/span[1]/span[1]");
const FLAT_LOCATION: Locator<'static> = Locator::Path("./div/div[2]/div/div[1]/span[3]/span[1]");
const FLAT_DATES: Locator<'static> = Locator::Path("./div/div[2]/div/div[1]/span[2]/span[1]");
const FLAT_DESCRIPTION: Locator<'static> =
    Locator::Path("./div/div[2]/div[2]/ul/li/div/ul/li/div/div/div/span[1]");

/// Parses the experience sub-page of `profile_url`.
///
/// A missing entry-list root is fatal: the page failed to render, which is
/// distinct from a person with no experience. A page without `<main>` at
/// all yields the empty parse.
pub fn extract<D: DomAccessor>(dom: &mut D, profile_url: &str) -> SectionResult<Experience> {
    let url = format!("{}{}", profile_url, SUBPAGE);
    if let Err(e) = dom.navigate(&url) {
        error!("Experience navigation failed: {}", e);
        return SectionResult::Fatal(format!("navigation failed: {}", e));
    }

    let section = match dom.locate(None, &Locator::Tag("main")) {
        Ok(main) => main,
        Err(_) => {
            warn!("Experience page has no <main>");
            return SectionResult::Parsed(Vec::new());
        }
    };

    let list_root = match dom.await_presence(Some(&section), &ENTRY_LIST, SHORT_WAIT) {
        Ok(list) => list,
        Err(_) => {
            error!("Could not find experience entry list");
            return SectionResult::Fatal("experience entry list not found".to_string());
        }
    };

    let entries = dom.locate_all(Some(&list_root), &Locator::Path("./li"));
    let mut experiences = Vec::new();

    for entry in &entries {
        match classify(dom, entry) {
            Some(roles) => {
                if let Err(reason) = parse_grouped(dom, entry, &roles, &mut experiences) {
                    return SectionResult::Fatal(reason);
                }
            }
            None => match parse_flat(dom, entry) {
                Ok(experience) => experiences.push(experience),
                Err(reason) => return SectionResult::Fatal(reason),
            },
        }
    }

    SectionResult::Parsed(experiences)
}

/// Classifies one top-level entry, returning the role sub-entries when the
/// entry is grouped (one employer, several roles). A nested list alone is
/// not enough; the disambiguating probe must also resolve.
fn classify<D: DomAccessor>(dom: &D, entry: &D::Node) -> Option<Vec<D::Node>> {
    let outer = dom
        .await_presence(Some(entry), &Locator::Tag("ul"), SHORT_WAIT)
        .ok()?;
    dom.await_presence(Some(&outer), &Locator::Tag("ul"), SHORT_WAIT)
        .ok()?;
    dom.locate(Some(entry), &GROUPED_PROBE).ok()?;

    let roles = dom
        .locate(Some(entry), &ROLE_LIST)
        .map(|list| dom.locate_all(Some(&list), &Locator::Path("./li")))
        .unwrap_or_default();
    Some(roles)
}

fn parse_grouped<D: DomAccessor>(
    dom: &D,
    entry: &D::Node,
    roles: &[D::Node],
    out: &mut Vec<Experience>,
) -> Result<(), String> {
    let company = match text_of(dom, entry, &GROUP_COMPANY) {
        Some(company) => company,
        None => {
            error!("Could not find company for grouped entry");
            return Err("company name not found".to_string());
        }
    };

    // The shared label reads like "Full-time · 7 mos"; only the first token
    // is the employment type.
    let shared_type = text_of(dom, entry, &GROUP_TYPE)
        .and_then(|label| label.split_whitespace().next().map(str::to_string));
    let shared_location = text_of(dom, entry, &GROUP_LOCATION);

    for role in roles {
        let position = match text_of(dom, role, &SUB_POSITION) {
            Some(position) => position,
            None => {
                error!("Could not find position in grouped entry");
                return Err("position not found in grouped entry".to_string());
            }
        };

        let employment_type = shared_type
            .clone()
            .or_else(|| text_of(dom, role, &SUB_TYPE_FALLBACK));
        let location = shared_location
            .clone()
            .or_else(|| text_of(dom, role, &SUB_LOCATION_FALLBACK));

        let (start_date, end_date) = match text_of(dom, role, &SUB_DATES) {
            Some(raw) => parse_date_span(&raw),
            None => (None, None),
        };

        out.push(Experience {
            company_name: company.clone(),
            position,
            employment_type,
            location,
            start_date,
            end_date,
            description: None,
            media: None,
        });
    }

    Ok(())
}

fn parse_flat<D: DomAccessor>(dom: &D, entry: &D::Node) -> Result<Experience, String> {
    let position = match text_of(dom, entry, &FLAT_POSITION) {
        Some(position) => position,
        None => {
            error!("Could not find position");
            return Err("position not found".to_string());
        }
    };

    // "<company> · <type>" with the type half optional.
    let label = match text_of(dom, entry, &FLAT_COMPANY_TYPE) {
        Some(label) => label,
        None => {
            error!("Could not find company");
            return Err("company label not found".to_string());
        }
    };
    let (company_name, employment_type) = match label.rfind('·') {
        Some(pos) => (
            label[..pos].trim().to_string(),
            Some(label[pos + '·'.len_utf8()..].trim().to_string()),
        ),
        None => (label, None),
    };

    let (start_date, end_date) = match text_of(dom, entry, &FLAT_DATES) {
        Some(raw) => parse_date_span(&raw),
        None => (None, None),
    };

    Ok(Experience {
        company_name,
        position,
        employment_type,
        location: text_of(dom, entry, &FLAT_LOCATION),
        start_date,
        end_date,
        description: text_of(dom, entry, &FLAT_DESCRIPTION),
        media: None,
    })
}

/// Splits a raw `"<start> - <end> · <duration>"` span. Both separators are
/// searched from the right: dates and surrounding text can contain the same
/// characters earlier in the string.
pub(crate) fn parse_date_span(raw: &str) -> (Option<String>, Option<String>) {
    let dash = match raw.rfind('-') {
        Some(dash) => dash,
        None => return (Some(raw.trim().to_string()), None),
    };
    let start = raw[..dash].trim().to_string();
    let rest = &raw[dash + 1..];
    let end = match rest.rfind('·') {
        Some(dot) => rest[..dot].trim(),
        None => rest.trim(),
    };
    let end = if end.is_empty() {
        None
    } else {
        Some(end.to_string())
    };
    (Some(start), end)
}
