use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use regex::{NoExpand, Regex, RegexBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::*;

/// An ordered list of literal `old -> new` replacements.
///
/// Order matters: every rule sees the output of the rules before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionRules(Vec<(String, String)>);

impl SubstitutionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, old: impl Into<String>, new: impl Into<String>) -> &mut Self {
        self.0.push((old.into(), new.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(old, new)| (old.as_str(), new.as_str()))
    }

    /// Reads rules from a headered two-column CSV (`old,new`), keeping row order.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(reader);
        let mut rules = Self::new();
        for (row, result) in rdr.records().enumerate() {
            let record: StringRecord = result.context(format!("Bad substitution rule at row {}", row + 1))?;
            let (Some(old), Some(new)) = (record.get(0), record.get(1)) else {
                bail!("Substitution rule at row {} needs two columns: {:?}", row + 1, record);
            };
            if old.is_empty() {
                warn!("Skipping substitution rule with empty search text at row {}", row + 1);
                continue;
            }
            rules.push(old, new);
        }
        Ok(rules)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open substitution rules {}", path.display()))?;
        Self::from_csv_reader(file).context(format!("Failed to read substitution rules {}", path.display()))
    }
}

impl<O: Into<String>, N: Into<String>> FromIterator<(O, N)> for SubstitutionRules {
    fn from_iter<T: IntoIterator<Item = (O, N)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(old, new)| (old.into(), new.into())).collect())
    }
}

/// Compiled form of [`SubstitutionRules`]: each search text becomes an escaped,
/// case-insensitive regex, replacements are inserted literally.
#[derive(Debug, Clone)]
pub struct SubstitutionEngine {
    rules: Vec<(Regex, String)>,
}

impl SubstitutionEngine {
    pub fn new(rules: &SubstitutionRules) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|(old, new)| {
                if old.is_empty() {
                    bail!("Substitution rule with empty search text (replacement {new:?})");
                }
                let regex = RegexBuilder::new(&regex::escape(old))
                    .case_insensitive(true)
                    .build()
                    .context(format!("Failed to compile substitution rule {old:?}"))?;
                Ok((regex, new.to_owned()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn apply(&self, name: &str) -> String {
        let mut result = name.to_owned();
        for (regex, new) in &self.rules {
            result = regex.replace_all(&result, NoExpand(new.as_str())).into_owned();
        }
        result
    }
}

/// Applies `rules` to `name` in order, without keeping the compiled engine around.
pub fn replace_by_rules(name: &str, rules: &SubstitutionRules) -> Result<String> {
    Ok(SubstitutionEngine::new(rules)?.apply(name))
}
