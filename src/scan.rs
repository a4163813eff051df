use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashSet};

/// Finds the alphanumeric tokens of a name that contain an indicator keyword.
///
/// Each keyword is compiled into `[a-zA-Z0-9]*<keyword>[a-zA-Z0-9]*` (case-insensitive),
/// so a match always covers the whole alphanumeric run around the keyword.
/// A token whose lowercase form equals one of the exclusion keywords is dropped.
#[derive(Debug, Clone)]
pub struct HitScanner {
    patterns: Vec<Regex>,
    exclusions: HashSet<String>,
}

impl HitScanner {
    pub fn new<I, E>(indicators: I, exclusions: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let patterns = indicators
            .into_iter()
            .map(|keyword| {
                let keyword = keyword.as_ref();
                if keyword.is_empty() {
                    bail!("Empty indicator keyword");
                }
                RegexBuilder::new(&format!(
                    "[a-zA-Z0-9]*{}[a-zA-Z0-9]*",
                    regex::escape(keyword)
                ))
                .case_insensitive(true)
                .build()
                .context(format!("Failed to compile indicator keyword {keyword:?}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let exclusions = exclusions
            .into_iter()
            .map(|keyword| keyword.as_ref().to_lowercase())
            .collect();

        Ok(Self {
            patterns,
            exclusions,
        })
    }

    /// All hits in `name`, deduplicated and sorted.
    pub fn hits(&self, name: &str) -> BTreeSet<String> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.find_iter(name))
            .map(|m| m.as_str())
            .filter(|hit| !self.exclusions.contains(&hit.to_lowercase()))
            .map(str::to_owned)
            .collect()
    }
}

/// One-shot convenience over [`HitScanner`].
pub fn string_hits<I, E>(name: &str, indicators: I, exclusions: E) -> Result<BTreeSet<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    Ok(HitScanner::new(indicators, exclusions)?.hits(name))
}
