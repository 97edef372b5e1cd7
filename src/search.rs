use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::dom::{DomAccessor, Locator};
use crate::registry::{canonicalize, is_addressable_profile, IdentifierRegistry};

/// Fixed page-size assumption for the results list. Anything past the cap
/// on a page is silently truncated.
pub const RESULTS_PAGE_CAP: usize = 10;

/// Locate attempts for the results container before giving up on a page.
const CONTAINER_ATTEMPTS: usize = 5;

/// Search terms join with this token instead of whitespace.
const TERM_SEPARATOR: &str = "%20";
/// The one reserved character the search interface requires escaped.
const ESCAPED_AMPERSAND: &str = "%26";

const RESULT_REGION: Locator<'static> = Locator::Path("./div/div/div[2]");
const RESULT_LINK: Locator<'static> =
    Locator::Path("./div/div/div[2]/div[1]/div[1]/div/span[1]/span/a[@href]");

enum ProbeRoot {
    Main,
    Document,
}

struct PageCountProbe {
    root: ProbeRoot,
    path: &'static str,
}

/// Known layout variants for the paginator, tried in order; the first probe
/// that resolves supplies the page-count text.
const PAGE_COUNT_PROBES: [PageCountProbe; 4] = [
    PageCountProbe {
        root: ProbeRoot::Main,
        path: "./div/div/div[5]/div/div/ul/li[last()]/span",
    },
    PageCountProbe {
        root: ProbeRoot::Main,
        path: "./div/div/div[5]/div/div/ul/li[last()]/button/span",
    },
    PageCountProbe {
        root: ProbeRoot::Main,
        path: "./div/div/div[4]/div/div/ul/li[last()]/button/span",
    },
    PageCountProbe {
        root: ProbeRoot::Document,
        path: "/html/body/div[5]/div[3]/div/div[2]/div/div[1]/main/div/div/div[5]/div/div/ul/li[10]/button/span",
    },
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// People-search results page; `?keywords=` and `&page=` are appended.
    pub results_base: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            results_base: "https://www.linkedin.com/search/results/people/".to_string(),
        }
    }
}

/// Drives multi-page people searches against the rendered search interface,
/// feeding every newly discovered canonical identifier into a registry.
pub struct SearchEngine<'d, D: DomAccessor> {
    dom: &'d mut D,
    config: SearchConfig,
}

impl<'d, D: DomAccessor> SearchEngine<'d, D> {
    pub fn new(dom: &'d mut D) -> Self {
        SearchEngine::with_config(dom, SearchConfig::default())
    }

    pub fn with_config(dom: &'d mut D, config: SearchConfig) -> Self {
        SearchEngine { dom, config }
    }

    /// Runs one free-text people search. Returns the number of identifiers
    /// added to `registry`.
    pub fn people_search(&mut self, query: &str, registry: &mut IdentifierRegistry) -> usize {
        let before = registry.len();
        let token = encode_query(query);
        let base_url = format!("{}?keywords={}", self.config.results_base, token);

        if let Err(e) = self.dom.navigate(&base_url) {
            error!("Search navigation failed: {}", e);
            return 0;
        }
        // Result widgets only render once the viewport moves.
        self.dom.scroll_by(2000);

        let page_count = self.resolve_page_count();
        for page in 0..page_count {
            info!("Parsing page {}", page);
            // The base query already renders the second page's content, so
            // only every other index re-navigates with an explicit page
            // parameter.
            if page != 1 {
                let page_url = format!("{}&page={}", base_url, page);
                if let Err(e) = self.dom.navigate(&page_url) {
                    warn!("Could not open results page {}: {}", page, e);
                    continue;
                }
            }
            self.collect_page(registry);
        }

        let additions = registry.len() - before;
        info!("Done extracting identifiers from search. New entries: {}", additions);
        additions
    }

    /// Sequentially runs `people_search` for each query.
    pub fn batch_search(&mut self, queries: &[String], registry: &mut IdentifierRegistry) -> usize {
        queries
            .iter()
            .map(|query| self.people_search(query, registry))
            .sum()
    }

    fn resolve_page_count(&self) -> u32 {
        let main = match self.dom.locate(None, &Locator::Tag("main")) {
            Ok(main) => main,
            Err(_) => {
                warn!("Could not find results root");
                return 0;
            }
        };

        for probe in &PAGE_COUNT_PROBES {
            let root = match probe.root {
                ProbeRoot::Main => Some(&main),
                ProbeRoot::Document => None,
            };
            match self.dom.locate(root, &Locator::Path(probe.path)) {
                Ok(node) => {
                    let text = self.dom.text(&node);
                    return match text.trim().parse() {
                        Ok(count) => count,
                        Err(_) => {
                            warn!("Page count {:?} is not a number, defaulting to 0", text);
                            0
                        }
                    };
                }
                Err(_) => debug!("Page-count probe missed: {}", probe.path),
            }
        }

        warn!("No page-count element found, defaulting to 0");
        0
    }

    /// Result-item extraction for the currently rendered page.
    fn collect_page(&mut self, registry: &mut IdentifierRegistry) {
        self.dom.scroll_by(2000);

        let mut container = None;
        for attempt in 1..=CONTAINER_ATTEMPTS {
            match self.dom.locate(None, &Locator::Tag("main")) {
                Ok(main) => {
                    container = Some(main);
                    break;
                }
                Err(_) => info!(
                    "Couldn't find results container, retrying... {} more times",
                    CONTAINER_ATTEMPTS - attempt
                ),
            }
        }
        let container = match container {
            Some(container) => container,
            None => return,
        };

        let region = match self.dom.locate(Some(&container), &RESULT_REGION) {
            Ok(region) => region,
            Err(_) => {
                warn!("Results region missing under container");
                return;
            }
        };

        let items = self.dom.locate_all(Some(&region), &Locator::Tag("li"));
        for (index, item) in items.iter().enumerate() {
            if index >= RESULTS_PAGE_CAP {
                break;
            }

            let link = self
                .dom
                .locate(Some(item), &RESULT_LINK)
                .ok()
                .and_then(|node| self.dom.attribute(&node, "href"));
            let link = match link {
                Some(link) => link,
                None => {
                    warn!("Result item {} carries no profile link", index);
                    continue;
                }
            };
            debug!("Discovered link: {}", link);

            // Placeholder "member" results carry no addressable path.
            if is_addressable_profile(&link) {
                registry.insert(canonicalize(&link));
            }
        }
    }
}

/// Encodes a free-text query into the search interface's token form: terms
/// joined by the separator token, ampersands escaped.
pub fn encode_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| term.replace('&', ESCAPED_AMPERSAND))
        .collect::<Vec<_>>()
        .join(TERM_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureDom, FixturePage};

    fn base_url(token: &str) -> String {
        format!("{}?keywords={}", SearchConfig::default().results_base, token)
    }

    /// Results page whose paginator only resolves through the fourth,
    /// document-rooted probe. The decoy `main` is found first by tag search
    /// and matches none of the main-rooted probes.
    fn probe4_page(count: &str) -> FixturePage {
        let mut page = FixturePage::new();
        let root = page.root();
        page.ensure(root, "/html/body/div[1]/main");
        let span = page.ensure(
            root,
            "/html/body/div[5]/div[3]/div/div[2]/div/div[1]/main/div/div/div[5]/div/div/ul/li[10]/button/span",
        );
        page.set_text(span, count);
        page
    }

    /// Results page with a first-probe paginator and a populated result
    /// region.
    fn results_page(count: &str, links: &[&str]) -> FixturePage {
        let mut page = FixturePage::new();
        let root = page.root();
        let main = page.add(root, "main");
        let span = page.ensure(main, "./div/div/div[5]/div/div/ul/li[1]/span");
        page.set_text(span, count);

        let region = page.ensure(main, "./div/div/div[2]");
        for link in links {
            let item = page.add(region, "li");
            let anchor = page.ensure(item, "./div/div/div[2]/div[1]/div[1]/div/span[1]/span/a");
            page.set_attr(anchor, "href", link);
        }
        page
    }

    #[test]
    fn encoded_query_has_no_whitespace_and_escapes_ampersand() {
        let token = encode_query("Johnson & Johnson alum");
        assert_eq!(token, "Johnson%20%26%20Johnson%20alum");
        assert!(!token.contains(char::is_whitespace));
    }

    #[test]
    fn fourth_probe_drives_seven_page_fetches_skipping_index_one() {
        let token = "quality%20assurance";
        let base = base_url(token);

        let mut dom = FixtureDom::new();
        dom.insert_page(&base, probe4_page("7"));
        for page in [0, 2, 3, 4, 5, 6] {
            dom.insert_page(&format!("{}&page={}", base, page), probe4_page("7"));
        }

        let mut registry = IdentifierRegistry::new();
        let mut engine = SearchEngine::new(&mut dom);
        engine.people_search("quality assurance", &mut registry);

        assert_eq!(dom.navigations.len(), 7);
        assert_eq!(dom.navigations[0], base);
        let paged: Vec<String> = dom.navigations[1..].to_vec();
        let expected: Vec<String> = [0, 2, 3, 4, 5, 6]
            .iter()
            .map(|page| format!("{}&page={}", base, page))
            .collect();
        assert_eq!(paged, expected);
        assert!(registry.is_empty());
    }

    #[test]
    fn results_container_that_never_renders_leaves_registry_unchanged() {
        let token = "ghost";
        let base = base_url(token);

        // The base page advertises one results page, but the paged URL
        // renders nothing at all.
        let mut dom = FixtureDom::new();
        dom.insert_page(&base, results_page("1", &[]));

        let mut registry = IdentifierRegistry::new();
        registry.insert("https://www.linkedin.com/in/seeded");

        let mut engine = SearchEngine::new(&mut dom);
        let additions = engine.people_search("ghost", &mut registry);

        assert_eq!(additions, 0);
        assert_eq!(registry.urls(), ["https://www.linkedin.com/in/seeded"]);
    }

    #[test]
    fn accepted_links_are_canonicalized_and_deduplicated() {
        let token = "data%20engineer";
        let base = base_url(token);

        let links = [
            "https://www.linkedin.com/in/alice?miniProfileUrn=abc",
            "https://www.linkedin.com/in/bob?miniProfileUrn=def",
            "https://www.linkedin.com/in/alice?miniProfileUrn=ghi",
            "https://www.linkedin.com/search/results/people/member",
        ];
        let page = results_page("1", &links);

        let mut dom = FixtureDom::new();
        dom.insert_page(&base, page.clone());
        dom.insert_page(&format!("{}&page=0", base), page);

        let mut registry = IdentifierRegistry::new();
        let mut engine = SearchEngine::new(&mut dom);
        let additions = engine.people_search("data engineer", &mut registry);

        assert_eq!(additions, 2);
        assert_eq!(
            registry.urls(),
            [
                "https://www.linkedin.com/in/alice",
                "https://www.linkedin.com/in/bob"
            ]
        );
    }

    #[test]
    fn result_items_past_the_page_cap_are_truncated() {
        let token = "prolific";
        let base = base_url(token);

        let links: Vec<String> = (0..12)
            .map(|i| format!("https://www.linkedin.com/in/person-{:02}?x=1", i))
            .collect();
        let borrowed: Vec<&str> = links.iter().map(String::as_str).collect();
        let page = results_page("1", &borrowed);

        let mut dom = FixtureDom::new();
        dom.insert_page(&base, page.clone());
        dom.insert_page(&format!("{}&page=0", base), page);

        let mut registry = IdentifierRegistry::new();
        let mut engine = SearchEngine::new(&mut dom);
        engine.people_search("prolific", &mut registry);

        assert_eq!(registry.len(), RESULTS_PAGE_CAP);
    }

    #[test]
    fn batch_search_accumulates_across_queries() {
        let first_base = base_url("alpha");
        let second_base = base_url("beta");

        let first = results_page("1", &["https://www.linkedin.com/in/carol?x=1"]);
        let second = results_page(
            "1",
            &[
                "https://www.linkedin.com/in/carol?y=2",
                "https://www.linkedin.com/in/dave?z=3",
            ],
        );

        let mut dom = FixtureDom::new();
        dom.insert_page(&first_base, first.clone());
        dom.insert_page(&format!("{}&page=0", first_base), first);
        dom.insert_page(&second_base, second.clone());
        dom.insert_page(&format!("{}&page=0", second_base), second);

        let mut registry = IdentifierRegistry::new();
        let mut engine = SearchEngine::new(&mut dom);
        let additions = engine.batch_search(
            &["alpha".to_string(), "beta".to_string()],
            &mut registry,
        );

        assert_eq!(additions, 2);
        assert_eq!(
            registry.urls(),
            [
                "https://www.linkedin.com/in/carol",
                "https://www.linkedin.com/in/dave"
            ]
        );
    }
}
