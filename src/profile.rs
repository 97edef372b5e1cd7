use log::{error, info};

use crate::dom::{await_text_of, text_of, DomAccessor, Locator, SHORT_WAIT};
use crate::education;
use crate::experience;
use crate::models::Employee;
use crate::skills;

const NAME: Locator<'static> = Locator::Path("./section[1]/div[2]/div[2]/div[1]/div[1]/h1");
const LOCATION: Locator<'static> = Locator::Path("./section[1]/div[2]/div[2]/div[2]/span[1]");
const HEADER: Locator<'static> = Locator::Path("./section[1]/div[2]/div[2]/div[1]/div[2]");
const ABOUT: Locator<'static> = Locator::Path("./div/div/div[5]/section/div");

const SEE_MORE_SUFFIX: &str = "see more";

/// Assembles one Employee record from a canonical profile identifier.
///
/// `None` when the page or the name element never renders; everything else
/// is best-effort. The experience result is attached verbatim, fatal
/// outcome included - callers must check it rather than assume a list.
pub fn extract_profile<D: DomAccessor>(dom: &mut D, profile_url: &str) -> Option<Employee> {
    if let Err(e) = dom.navigate(profile_url) {
        error!("Profile navigation failed: {}", e);
        return None;
    }
    info!("Extracting attributes from: {}", profile_url);

    let main = match dom.await_presence(None, &Locator::Tag("main"), SHORT_WAIT) {
        Ok(main) => main,
        Err(_) => {
            error!("Could not find <main> for {}", profile_url);
            return None;
        }
    };

    let mut employee = Employee {
        user_url_id: profile_url
            .rsplit('/')
            .next()
            .unwrap_or(profile_url)
            .to_string(),
        ..Default::default()
    };

    match await_text_of(dom, &main, &NAME, SHORT_WAIT) {
        Some(name) => employee.name = name,
        None => {
            error!("Could not find name for {}", profile_url);
            return None;
        }
    }

    employee.location = text_of(dom, &main, &LOCATION);
    employee.header = await_text_of(dom, &main, &HEADER, SHORT_WAIT);
    employee.about = await_text_of(dom, &main, &ABOUT, SHORT_WAIT).map(trim_disclosure);

    employee.experience = experience::extract(dom, profile_url);
    employee.education = education::extract(dom, profile_url);
    employee.skills = skills::extract(dom, profile_url);

    Some(employee)
}

/// The about blurb can carry the expander's trailing "see more" label.
fn trim_disclosure(about: String) -> String {
    match about.strip_suffix(SEE_MORE_SUFFIX) {
        Some(stripped) => stripped.trim_end().to_string(),
        None => about,
    }
}
