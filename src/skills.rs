use std::thread;
use std::time::Duration;

use log::{error, warn};

use crate::dom::{text_of, DomAccessor, Locator, SHORT_WAIT};
use crate::models::SkillCategory;

const SUBPAGE: &str = "/details/skills";

const HEADING: Locator<'static> =
    Locator::Path("/html/body/div[6]/div[3]/div/div/div[2]/div/div/main/section/div[1]/div/h2");
const HEADING_TEXT: &str = "Skills";
const HEADING_ATTEMPTS: usize = 5;
const HEADING_POLL: Duration = Duration::from_millis(250);

const CONTROL_ROW: Locator<'static> = Locator::Path("./section/div[2]/div[1]");
const SKILL_NAME: Locator<'static> = Locator::Path("./div/div[2]/div[1]/a/div/span[1]/span[1]");

/// Content panes sit alongside the control row; the pane for control `i`
/// lives at sibling position `PANE_BASE_INDEX + i`.
const PANE_BASE_INDEX: usize = 3;

/// Parses the skills sub-page of `profile_url` into ordered categories.
///
/// The page is only trusted once the section heading reads "Skills";
/// otherwise it is assumed not to have loaded, which is not the same as a
/// person with no skills.
pub fn extract<D: DomAccessor>(dom: &mut D, profile_url: &str) -> Vec<SkillCategory> {
    let url = format!("{}{}", profile_url, SUBPAGE);
    if let Err(e) = dom.navigate(&url) {
        error!("Skills navigation failed: {}", e);
        return Vec::new();
    }

    if !confirm_heading(dom) {
        warn!("Skills page didn't load properly");
        return Vec::new();
    }

    let main = match dom.await_visible(None, &Locator::Tag("main"), SHORT_WAIT) {
        Ok(main) => main,
        Err(_) => {
            warn!("Could not find skills root");
            return Vec::new();
        }
    };

    let row = match dom.await_presence(Some(&main), &CONTROL_ROW, SHORT_WAIT) {
        Ok(row) => row,
        Err(_) => {
            warn!("Could not find category controls");
            return Vec::new();
        }
    };

    let mut controls = dom.locate_all(Some(&row), &Locator::Tag("button"));
    // The leading "All" control is redundant with the union of the rest.
    if controls.len() > 1 {
        controls.remove(0);
    }

    let mut categories = Vec::new();
    for (index, control) in controls.iter().enumerate() {
        let name = dom.text(control);
        let mut skills = Vec::new();

        match reveal_category_pane(dom, &main, control, index) {
            Some(pane) => {
                for item in dom.locate_all(Some(&pane), &Locator::Path("./child::*")) {
                    match text_of(dom, &item, &SKILL_NAME) {
                        Some(skill) => skills.push(skill),
                        None => warn!("Could not extract a skill name in '{}'", name),
                    }
                }
            }
            None => warn!("Could not extract skill list for '{}'", name),
        }

        categories.push(SkillCategory { name, skills });
    }
    categories
}

/// Bounded poll for the section heading: up to `HEADING_ATTEMPTS` lookups
/// with an early exit as soon as the heading matches.
fn confirm_heading<D: DomAccessor>(dom: &D) -> bool {
    for attempt in 0..HEADING_ATTEMPTS {
        if let Ok(heading) = dom.locate(None, &HEADING) {
            if dom.text(&heading) == HEADING_TEXT {
                return true;
            }
        }
        if attempt + 1 < HEADING_ATTEMPTS {
            thread::sleep(HEADING_POLL);
        }
    }
    false
}

/// Activating a category control mutates the page; only afterwards does
/// that category's pane resolve, at a position derived from the control's
/// index. Returns the revealed pane list.
fn reveal_category_pane<D: DomAccessor>(
    dom: &mut D,
    main: &D::Node,
    control: &D::Node,
    index: usize,
) -> Option<D::Node> {
    if let Err(e) = dom.trigger(control) {
        warn!("Could not activate category control: {}", e);
        return None;
    }
    let path = format!(
        "./section/div[2]/div[{}]/div/div/div[1]/ul",
        PANE_BASE_INDEX + index
    );
    dom.locate(Some(main), &Locator::Path(&path)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureDom, FixturePage};

    const PROFILE: &str = "https://www.linkedin.com/in/jdoe";

    fn skills_url() -> String {
        format!("{}{}", PROFILE, SUBPAGE)
    }

    /// Builds the skills page skeleton: confirmed heading plus the control
    /// row. Returns the page and the `main` node.
    fn page_with_heading() -> (FixturePage, usize) {
        let mut page = FixturePage::new();
        let root = page.root();
        let main = page.ensure(
            root,
            "/html/body/div[6]/div[3]/div/div/div[2]/div/div/main",
        );
        page.ensure_text(main, "./section/div[1]/div/h2", "Skills");
        (page, main)
    }

    #[test]
    fn categories_are_revealed_by_their_controls_in_order() {
        let (mut page, main) = page_with_heading();
        let row = page.ensure(main, "./section/div[2]/div[1]");
        let all = page.add(row, "button");
        page.set_text(all, "All");
        let first = page.add(row, "button");
        page.set_text(first, "Industry Knowledge");
        let second = page.add(row, "button");
        page.set_text(second, "Tools");

        let pane_one = page.ensure(main, "./section/div[2]/div[3]/div/div/div[1]/ul");
        page.reveal_after(pane_one, first);
        for skill in ["C++", "Rust"] {
            let item = page.add(pane_one, "li");
            page.ensure_text(item, "./div/div[2]/div[1]/a/div/span[1]/span[1]", skill);
        }

        let pane_two = page.ensure(main, "./section/div[2]/div[4]/div/div/div[1]/ul");
        page.reveal_after(pane_two, second);
        let item = page.add(pane_two, "li");
        page.ensure_text(item, "./div/div[2]/div[1]/a/div/span[1]/span[1]", "Git");

        let mut dom = FixtureDom::new();
        dom.insert_page(&skills_url(), page);

        let categories = extract(&mut dom, PROFILE);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Industry Knowledge");
        assert_eq!(categories[0].skills, ["C++", "Rust"]);
        assert_eq!(categories[1].name, "Tools");
        assert_eq!(categories[1].skills, ["Git"]);
    }

    #[test]
    fn unrevealed_pane_leaves_its_category_empty() {
        let (mut page, main) = page_with_heading();
        let row = page.ensure(main, "./section/div[2]/div[1]");
        let all = page.add(row, "button");
        page.set_text(all, "All");
        let only = page.add(row, "button");
        page.set_text(only, "Languages");
        // No pane exists for this control at all.

        let mut dom = FixtureDom::new();
        dom.insert_page(&skills_url(), page);

        let categories = extract(&mut dom, PROFILE);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Languages");
        assert!(categories[0].skills.is_empty());
    }

    #[test]
    fn unconfirmed_heading_is_treated_as_unloaded_page() {
        let mut page = FixturePage::new();
        let root = page.root();
        let main = page.ensure(
            root,
            "/html/body/div[6]/div[3]/div/div/div[2]/div/div/main",
        );
        page.ensure_text(main, "./section/div[1]/div/h2", "Interests");

        let mut dom = FixtureDom::new();
        dom.insert_page(&skills_url(), page);

        assert!(extract(&mut dom, PROFILE).is_empty());
    }

    #[test]
    fn single_control_is_not_skipped() {
        let (mut page, main) = page_with_heading();
        let row = page.ensure(main, "./section/div[2]/div[1]");
        let only = page.add(row, "button");
        page.set_text(only, "Main");
        let pane = page.ensure(main, "./section/div[2]/div[3]/div/div/div[1]/ul");
        page.reveal_after(pane, only);
        let item = page.add(pane, "li");
        page.ensure_text(item, "./div/div[2]/div[1]/a/div/span[1]/span[1]", "Python");

        let mut dom = FixtureDom::new();
        dom.insert_page(&skills_url(), page);

        let categories = extract(&mut dom, PROFILE);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Main");
        assert_eq!(categories[0].skills, ["Python"]);
    }
}
