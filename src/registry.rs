use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use log::{error, info};

/// Byte offset of the path marker inside an absolute profile link; for
/// `https://www.linkedin.com/in/<id>` the marker `in` sits at offset 25.
/// Brittle by construction: the offset tracks the host's URL shape.
pub const PROFILE_MARKER_OFFSET: usize = 25;
pub const PROFILE_PATH_MARKER: &str = "in";

/// Addressable profiles expose the path marker; placeholder "member"
/// results do not and carry no extractable identifier.
pub fn is_addressable_profile(link: &str) -> bool {
    link.get(PROFILE_MARKER_OFFSET..PROFILE_MARKER_OFFSET + PROFILE_PATH_MARKER.len())
        == Some(PROFILE_PATH_MARKER)
}

/// Canonical identifier: the address with its query suffix removed.
pub fn canonicalize(link: &str) -> &str {
    match link.rfind('?') {
        Some(pos) => &link[..pos],
        None => link,
    }
}

/// Ordered, duplicate-free set of canonical profile identifiers. Insertion
/// order is discovery order and survives save/load.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    urls: Vec<String>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        IdentifierRegistry::default()
    }

    /// Seeds the registry from a previously persisted sequence, dropping
    /// duplicates while keeping first-occurrence order.
    pub fn with_seed<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut registry = IdentifierRegistry::new();
        for url in seed {
            registry.insert(&url);
        }
        registry
    }

    pub fn contains(&self, url: &str) -> bool {
        // Linear scan; registries hold a few hundred identifiers at most.
        self.urls.iter().any(|known| known == url)
    }

    /// Appends `url` unless already present. Returns whether it was new.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Loads a newline-delimited identifier file. A missing or unreadable
    /// file yields an empty registry.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(_) => {
                info!("No identifier file at {:?}. Starting fresh.", path);
                return IdentifierRegistry::new();
            }
        };

        let mut registry = IdentifierRegistry::new();
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => {
                    let url = line.trim();
                    if !url.is_empty() {
                        registry.insert(url);
                    }
                }
                Err(e) => {
                    error!("Failed to read identifier file: {}", e);
                    break;
                }
            }
        }
        info!("Loaded {} identifiers from {:?}", registry.len(), path);
        registry
    }

    /// Writes the registry back out, one identifier per line.
    pub fn save<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        let mut file = match File::create(path) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to open identifier file for writing: {}", e);
                return;
            }
        };
        for url in &self.urls {
            if let Err(e) = writeln!(file, "{}", url) {
                error!("Failed to write identifier file: {}", e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_from_last_query_marker() {
        assert_eq!(
            canonicalize("https://www.linkedin.com/in/jdoe?miniProfile=abc?x=1"),
            "https://www.linkedin.com/in/jdoe?miniProfile=abc"
        );
        assert_eq!(
            canonicalize("https://www.linkedin.com/in/jdoe"),
            "https://www.linkedin.com/in/jdoe"
        );
    }

    #[test]
    fn marker_predicate_separates_profiles_from_placeholders() {
        assert!(is_addressable_profile("https://www.linkedin.com/in/jdoe"));
        assert!(!is_addressable_profile(
            "https://www.linkedin.com/search/results/people/"
        ));
        assert!(!is_addressable_profile("short"));
    }

    #[test]
    fn seed_dedups_and_preserves_first_occurrence_order() {
        let registry = IdentifierRegistry::with_seed(
            ["a", "b", "a", "c", "b"].into_iter().map(String::from),
        );
        assert_eq!(registry.urls(), ["a", "b", "c"]);
    }

    #[test]
    fn insert_reports_novelty_and_size_never_shrinks() {
        let mut registry = IdentifierRegistry::new();
        assert!(registry.insert("x"));
        let after_first = registry.len();
        assert!(!registry.insert("x"));
        assert!(registry.len() >= after_first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn file_round_trip_preserves_order() {
        let path = std::env::temp_dir().join("identifier_registry_round_trip.txt");
        let mut registry = IdentifierRegistry::new();
        registry.insert("https://www.linkedin.com/in/first");
        registry.insert("https://www.linkedin.com/in/second");
        registry.save(&path);

        let reloaded = IdentifierRegistry::load(&path);
        assert_eq!(reloaded.urls(), registry.urls());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_of_missing_file_starts_fresh() {
        let registry =
            IdentifierRegistry::load(std::env::temp_dir().join("does_not_exist_registry.txt"));
        assert!(registry.is_empty());
    }
}
