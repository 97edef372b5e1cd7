//! In-memory document trees for parser tests.
//!
//! Non-rendering implementation of [`DomAccessor`]: bounded waits resolve
//! immediately, scrolling is a no-op and every navigation is recorded so
//! tests can assert fetch patterns.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::dom::{DomAccessor, DomError, Locator};

#[derive(Debug, Clone, Default)]
struct FixtureNode {
    tag: String,
    text: String,
    attrs: Vec<(String, String)>,
    children: Vec<usize>,
    hidden: bool,
    /// Only locatable once this control node has been triggered.
    revealed_by: Option<usize>,
}

/// One document tree. Node 0 is the document root.
#[derive(Debug, Clone)]
pub struct FixturePage {
    nodes: Vec<FixtureNode>,
}

impl FixturePage {
    pub fn new() -> Self {
        FixturePage {
            nodes: vec![FixtureNode {
                tag: "#document".to_string(),
                ..Default::default()
            }],
        }
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn add(&mut self, parent: usize, tag: &str) -> usize {
        let id = self.nodes.len();
        self.nodes.push(FixtureNode {
            tag: tag.to_string(),
            ..Default::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn set_text(&mut self, node: usize, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    pub fn set_attr(&mut self, node: usize, name: &str, value: &str) {
        self.nodes[node]
            .attrs
            .push((name.to_string(), value.to_string()));
    }

    #[allow(dead_code)]
    pub fn hide(&mut self, node: usize) {
        self.nodes[node].hidden = true;
    }

    /// Makes `node` (and its subtree) resolvable only after `control` has
    /// been triggered.
    pub fn reveal_after(&mut self, node: usize, control: usize) {
        self.nodes[node].revealed_by = Some(control);
    }

    /// Creates (or reuses) the element chain so that `path` resolves from
    /// `from`, returning the final node. Steps may carry 1-based indexes;
    /// `tag[N]` guarantees at least N same-tag children exist.
    pub fn ensure(&mut self, from: usize, path: &str) -> usize {
        let mut current = from;
        for step in path
            .trim_start_matches("./")
            .split('/')
            .filter(|step| !step.is_empty())
        {
            let (tag, index) = parse_ensure_step(step);
            loop {
                let same_tag: Vec<usize> = self.nodes[current]
                    .children
                    .iter()
                    .copied()
                    .filter(|&child| self.nodes[child].tag == tag)
                    .collect();
                if same_tag.len() >= index {
                    current = same_tag[index - 1];
                    break;
                }
                self.add(current, &tag);
            }
        }
        current
    }

    /// [`FixturePage::ensure`] plus text assignment on the final node.
    pub fn ensure_text(&mut self, from: usize, path: &str, text: &str) -> usize {
        let node = self.ensure(from, path);
        self.set_text(node, text);
        node
    }
}

impl Default for FixturePage {
    fn default() -> Self {
        FixturePage::new()
    }
}

fn parse_ensure_step(step: &str) -> (String, usize) {
    match step.find('[') {
        Some(open) => {
            let tag = step[..open].to_string();
            let inner = &step[open + 1..step.len() - 1];
            if inner.starts_with('@') || inner == "last()" {
                (tag, 1)
            } else {
                (tag, inner.parse().unwrap_or(1))
            }
        }
        None => (step.to_string(), 1),
    }
}

/// A multi-page fixture session keyed by URL.
#[derive(Default)]
pub struct FixtureDom {
    pages: HashMap<String, FixturePage>,
    current: Option<String>,
    triggered: HashSet<(String, usize)>,
    pub navigations: Vec<String>,
}

impl FixtureDom {
    pub fn new() -> Self {
        FixtureDom::default()
    }

    pub fn insert_page(&mut self, url: &str, page: FixturePage) {
        self.pages.insert(url.to_string(), page);
    }

    fn page(&self) -> Option<(&str, &FixturePage)> {
        let url = self.current.as_deref()?;
        Some((url, self.pages.get(url)?))
    }

    fn locatable(&self, url: &str, page: &FixturePage, node: usize) -> bool {
        match page.nodes[node].revealed_by {
            Some(control) => self.triggered.contains(&(url.to_string(), control)),
            None => true,
        }
    }

    fn resolve(&self, root: Option<usize>, locator: &Locator) -> Vec<usize> {
        let Some((url, page)) = self.page() else {
            return Vec::new();
        };
        let start = root.unwrap_or_else(|| page.root());
        match *locator {
            Locator::Tag(tag) => self.descendants_with_tag(url, page, start, tag),
            Locator::Path(path) => self.walk_path(url, page, start, path),
        }
    }

    fn descendants_with_tag(
        &self,
        url: &str,
        page: &FixturePage,
        start: usize,
        tag: &str,
    ) -> Vec<usize> {
        let mut matches = Vec::new();
        let mut stack: Vec<usize> = page.nodes[start].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if !self.locatable(url, page, node) {
                continue;
            }
            if page.nodes[node].tag == tag {
                matches.push(node);
            }
            stack.extend(page.nodes[node].children.iter().rev().copied());
        }
        matches
    }

    fn walk_path(&self, url: &str, page: &FixturePage, start: usize, path: &str) -> Vec<usize> {
        let (origin, steps) = if let Some(absolute) = path.strip_prefix('/') {
            (page.root(), absolute)
        } else {
            (start, path.trim_start_matches("./"))
        };

        let mut nodes = vec![origin];
        for step in steps.split('/').filter(|step| !step.is_empty()) {
            let mut next = Vec::new();
            for &node in &nodes {
                next.extend(self.match_step(url, page, node, step));
            }
            nodes = next;
            if nodes.is_empty() {
                break;
            }
        }
        nodes
    }

    fn match_step(&self, url: &str, page: &FixturePage, node: usize, step: &str) -> Vec<usize> {
        let children: Vec<usize> = page.nodes[node]
            .children
            .iter()
            .copied()
            .filter(|&child| self.locatable(url, page, child))
            .collect();

        if step == "child::*" || step == "*" {
            return children;
        }

        let (tag, filter) = match step.find('[') {
            Some(open) => (&step[..open], Some(&step[open + 1..step.len() - 1])),
            None => (step, None),
        };

        let tagged: Vec<usize> = children
            .into_iter()
            .filter(|&child| page.nodes[child].tag == tag)
            .collect();

        match filter {
            None => tagged,
            Some("last()") => tagged.last().map(|&last| vec![last]).unwrap_or_default(),
            Some(attr) if attr.starts_with('@') => {
                let name = &attr[1..];
                tagged
                    .into_iter()
                    .filter(|&child| page.nodes[child].attrs.iter().any(|(key, _)| key == name))
                    .collect()
            }
            Some(index) => match index.parse::<usize>() {
                Ok(position) if position >= 1 => tagged
                    .get(position - 1)
                    .map(|&found| vec![found])
                    .unwrap_or_default(),
                _ => Vec::new(),
            },
        }
    }
}

impl DomAccessor for FixtureDom {
    type Node = usize;

    fn navigate(&mut self, url: &str) -> Result<(), DomError> {
        self.navigations.push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    fn scroll_by(&mut self, _y: i64) {}

    fn locate(&self, root: Option<&usize>, locator: &Locator) -> Result<usize, DomError> {
        self.resolve(root.copied(), locator)
            .into_iter()
            .next()
            .ok_or_else(|| DomError::NotFound(locator.to_string()))
    }

    fn locate_all(&self, root: Option<&usize>, locator: &Locator) -> Vec<usize> {
        self.resolve(root.copied(), locator)
    }

    fn await_presence(
        &self,
        root: Option<&usize>,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<usize, DomError> {
        self.resolve(root.copied(), locator)
            .into_iter()
            .next()
            .ok_or_else(|| DomError::Timeout(locator.to_string()))
    }

    fn await_visible(
        &self,
        root: Option<&usize>,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<usize, DomError> {
        let hidden = |node: usize| {
            self.page()
                .map(|(_, page)| page.nodes[node].hidden)
                .unwrap_or(true)
        };
        self.resolve(root.copied(), locator)
            .into_iter()
            .find(|&node| !hidden(node))
            .ok_or_else(|| DomError::Timeout(locator.to_string()))
    }

    fn text(&self, node: &usize) -> String {
        self.page()
            .map(|(_, page)| page.nodes[*node].text.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: &usize, name: &str) -> Option<String> {
        self.page().and_then(|(_, page)| {
            page.nodes[*node]
                .attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
    }

    fn trigger(&mut self, node: &usize) -> Result<(), DomError> {
        let url = self
            .current
            .clone()
            .ok_or_else(|| DomError::NotFound("no current page".to_string()))?;
        self.triggered.insert((url, *node));
        Ok(())
    }
}
