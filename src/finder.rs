use super::*;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::rc::Rc;
use thiserror::Error;
use tracing::*;

pub const BRAS: [char; 3] = ['(', '[', '{'];
pub const KETS: [char; 3] = [')', ']', '}'];

lazy_static! {
    static ref BRACKET_SPACING: Regex = Regex::new(r"\s*([(\[{)\]}])\s*").expect("static regex");
}

/// Why a name produced no molecule. Every variant carries the finder name and the name as
/// given to the finder, before cleaning and substitution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinderError {
    #[error("no possible hit by {0}: {1}")]
    NoHit(String, String),
    #[error("no possible extended hit by {0}: {1}")]
    NoExtendedHit(String, String),
    #[error("no IUPAC names by {0}: {1}")]
    NoConversion(String, String),
    #[error("even suggestion-based correction found no IUPAC names by {0}: {1}")]
    CorrectionExhausted(String, String),
    #[error("only multi-component structures found by {0}: {1}")]
    NoSingleComponentResult(String, String),
}

/// Immutable description of one kind of finder.
#[derive(Debug, Clone, Default)]
pub struct FinderConfig {
    pub name: String,
    pub indicators: Vec<String>,
    pub exclusions: Vec<String>,
    pub rules: SubstitutionRules,
}

impl FinderConfig {
    pub fn new<I>(name: impl Into<String>, indicators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            indicators: indicators.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_exclusions<E>(mut self, exclusions: E) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rules(mut self, rules: SubstitutionRules) -> Self {
        self.rules = rules;
        self
    }
}

/// The fragment picked out of a name, with its structure notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMolecule {
    pub name: String,
    pub notation: String,
}

impl Display for FoundMolecule {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{} {}", self.name, self.notation)
    }
}

/// Collapses whitespace around brackets, e.g. `"cobalt(ii) ]"` becomes `"cobalt(ii)]"`.
pub fn clean(name: &str) -> String {
    BRACKET_SPACING.replace_all(name, "$1").into_owned()
}

/// Picks the entry with the longest name among single-component notations (no `.`).
/// Equally long names resolve to the lexicographically smallest one.
pub fn select_longest(conversion: &Conversion) -> Option<FoundMolecule> {
    let mut best: Option<(&String, &String, usize)> = None;
    // Ascending key order, so the first of equally long names is the smallest.
    for (name, notation) in conversion {
        if notation.contains('.') {
            continue;
        }
        let len = name.chars().count();
        if best.map_or(true, |(_, _, best_len)| len > best_len) {
            best = Some((name, notation, len));
        }
    }
    best.map(|(name, notation, _)| FoundMolecule {
        name: name.clone(),
        notation: notation.clone(),
    })
}

/// Mines fragment names of one molecule class out of long compound names.
///
/// A name goes through clean, substitute, scan, extend and convert. When nothing converts
/// and correction is allowed, each hit is run past the suggestion service and the
/// corrected names go through the same steps again.
pub struct MoleculeFinder {
    name: String,
    scanner: HitScanner,
    substitutions: SubstitutionEngine,
    format: OutputFormat,
    converter: Rc<dyn StructureConverter>,
    suggester: Option<Rc<dyn SuggestionService>>,
}

impl MoleculeFinder {
    pub fn new(config: FinderConfig, converter: Rc<dyn StructureConverter>) -> Result<Self> {
        Ok(Self {
            scanner: HitScanner::new(&config.indicators, &config.exclusions)?,
            substitutions: SubstitutionEngine::new(&config.rules)?,
            name: config.name,
            format: OutputFormat::default(),
            converter,
            suggester: None,
        })
    }

    /// Service consulted when correction is requested. Without one, correction never succeeds.
    pub fn with_suggestions(mut self, suggester: Rc<dyn SuggestionService>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Clean and substitute.
    pub fn prepare(&self, name: &str) -> String {
        let prepared = self.substitutions.apply(&clean(name));
        if prepared != name {
            debug!("{}: prepared name --> {}", self.name, prepared);
        }
        prepared
    }

    /// Hits in an already prepared name.
    pub fn hits(&self, prepared: &str) -> BTreeSet<String> {
        self.scanner.hits(prepared)
    }

    /// Scan and extend a prepared name, returning the hits and all extended candidates.
    pub fn sniff(&self, prepared: &str) -> Result<(BTreeSet<String>, BTreeSet<String>), FinderError> {
        self.sniff_reporting(prepared, prepared)
    }

    /// [`Self::sniff`], with errors naming `name` rather than its prepared form.
    fn sniff_reporting(
        &self,
        prepared: &str,
        name: &str,
    ) -> Result<(BTreeSet<String>, BTreeSet<String>), FinderError> {
        let hits = self.hits(prepared);
        if hits.is_empty() {
            return Err(FinderError::NoHit(self.name.clone(), name.to_owned()));
        }
        let candidates = extend_hits(prepared, &hits);
        if candidates.is_empty() {
            return Err(FinderError::NoExtendedHit(self.name.clone(), name.to_owned()));
        }
        Ok((hits, candidates))
    }

    /// Clean, substitute, scan, extend and convert one name.
    /// Returns the conversion together with the prepared name and its hits.
    fn parse_one_name(&self, name: &str) -> Result<(Conversion, String, BTreeSet<String>), FinderError> {
        let prepared = self.prepare(name);
        let (hits, candidates) = self.sniff_reporting(&prepared, name)?;
        info!("{}: hits {:?}", self.name, hits);
        debug!("{}: {} candidates", self.name, candidates.len());

        let candidates: Vec<String> = candidates.into_iter().collect();
        let conversion = self.converter.convert_names(&candidates, self.format);
        info!("{}: converted {:?}", self.name, conversion);
        Ok((conversion, prepared, hits))
    }

    /// Every candidate of `name` that converted, without selecting one.
    pub fn parse_name(&self, name: &str, allow_correction: bool) -> Result<Conversion, FinderError> {
        info!("*** parse name in {}: {}", self.name, name);
        let (conversion, prepared, hits) = self.parse_one_name(name)?;
        if !conversion.is_empty() {
            return Ok(conversion);
        }
        if !allow_correction {
            return Err(FinderError::NoConversion(self.name.clone(), name.to_owned()));
        }

        warn!(
            "no IUPAC names by {}: {}, trying suggestion-based correction, check the result!",
            self.name, name
        );
        let exhausted = || FinderError::CorrectionExhausted(self.name.clone(), name.to_owned());
        let Some(suggester) = &self.suggester else {
            warn!("{}: no suggestion service configured", self.name);
            return Err(exhausted());
        };

        let corrected_names = correct_name_by_hits(&**suggester, &prepared, &hits);
        if corrected_names.is_empty() {
            warn!("{}: no corrected name suggested for {}", self.name, name);
            return Err(exhausted());
        }

        let mut combined = Conversion::new();
        for corrected_name in &corrected_names {
            info!("{}: parsing corrected name {}", self.name, corrected_name);
            match self.parse_one_name(corrected_name) {
                Ok((conversion, _, _)) => combined.extend(conversion),
                Err(e) => warn!("{}: corrected name rejected: {}", self.name, e),
            }
        }
        if combined.is_empty() {
            return Err(exhausted());
        }
        Ok(combined)
    }

    /// The converted fragment of `name` with the longest single-component name.
    pub fn find_molecule(&self, name: &str, allow_correction: bool) -> Result<FoundMolecule, FinderError> {
        let conversion = self.parse_name(name, allow_correction)?;
        let found = select_longest(&conversion)
            .ok_or_else(|| FinderError::NoSingleComponentResult(self.name.clone(), name.to_owned()))?;
        info!("{}: final {}", self.name, found);
        Ok(found)
    }
}

impl Display for MoleculeFinder {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, HashMap};

    /// Converts exactly the names it knows and records every batch it receives.
    struct FakeConverter {
        known: BTreeMap<String, String>,
        batches: RefCell<Vec<Vec<String>>>,
    }

    impl FakeConverter {
        fn new(known: &[(&str, &str)]) -> Rc<Self> {
            Rc::new(Self {
                known: known.iter().map(|(n, s)| (n.to_string(), s.to_string())).collect(),
                batches: RefCell::new(Vec::new()),
            })
        }
    }

    impl StructureConverter for FakeConverter {
        fn convert_names(&self, names: &[String], _format: OutputFormat) -> Conversion {
            self.batches.borrow_mut().push(names.to_vec());
            names
                .iter()
                .filter_map(|n| self.known.get(n).map(|s| (n.clone(), s.clone())))
                .collect()
        }
    }

    struct FakeSuggestions {
        responses: HashMap<String, Vec<String>>,
        calls: Cell<usize>,
    }

    impl FakeSuggestions {
        fn new(responses: &[(&str, &[&str])]) -> Rc<Self> {
            Rc::new(Self {
                responses: responses
                    .iter()
                    .map(|(q, r)| (q.to_string(), r.iter().map(|s| s.to_string()).collect()))
                    .collect(),
                calls: Cell::new(0),
            })
        }
    }

    impl SuggestionService for FakeSuggestions {
        fn suggest(&self, query: &str) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            self.responses
                .get(query)
                .cloned()
                .ok_or_else(|| anyhow!("network unreachable"))
        }
    }

    fn amine_config() -> FinderConfig {
        FinderConfig::new("AmineFinder", ["amin", "piperaz", "pyrid"]).with_exclusions(["Gismondine"])
    }

    #[test]
    fn test_clean() {
        let name = "catena-[dimethylammonium tris(\u{3bc}-formato)-cobalt(ii) ]";
        assert_eq!(clean(name), "catena-[dimethylammonium tris(\u{3bc}-formato)-cobalt(ii)]");
        assert_eq!(clean("a ( b ) { c }d"), "a(b){c}d");
        assert_eq!(clean("no brackets  here"), "no brackets  here");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for name in [
            "catena-[1,2-Ethyldiamine bis( \u{3bc}4-phosphato)-di-zinc ]",
            "  ( [ { } ] )  ",
            "tris(2-aminoethyl)amine",
            "",
        ] {
            let once = clean(name);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn test_no_hit() {
        init_logging("debug");
        let converter = FakeConverter::new(&[]);
        let finder = MoleculeFinder::new(amine_config(), converter.clone()).unwrap();
        let err = finder.find_molecule("bis(\u{3bc}2-chloro)-di-copper", true).unwrap_err();
        assert!(matches!(err, FinderError::NoHit(..)));
        assert!(converter.batches.borrow().is_empty());
    }

    #[test]
    fn test_excluded_hit_is_no_hit() {
        let config = FinderConfig::new("AmineFinder", ["ine"]).with_exclusions(["Gismondine"]);
        let finder = MoleculeFinder::new(config, FakeConverter::new(&[])).unwrap();
        assert!(finder.hits("Gismondine").is_empty());
        let err = finder.find_molecule("Gismondine", false).unwrap_err();
        assert_eq!(err, FinderError::NoHit("AmineFinder".to_string(), "Gismondine".to_string()));
    }

    #[test]
    fn test_ethyldiamine() {
        let converter = FakeConverter::new(&[("1,2-Ethyldiamine", "NCCN")]);
        let finder = MoleculeFinder::new(FinderConfig::new("AmineFinder", ["amin"]), converter.clone()).unwrap();

        let (hits, candidates) = finder.sniff("1,2-Ethyldiamine").unwrap();
        assert!(hits.iter().all(|hit| hit.to_lowercase().contains("amin")));
        assert!(candidates.contains("Ethyldiamine"));
        assert!(candidates.contains("1,2-Ethyldiamine"));

        let found = finder.find_molecule("1,2-Ethyldiamine", false).unwrap();
        assert_eq!(found.name, "1,2-Ethyldiamine");
        assert_eq!(found.notation, "NCCN");
        // One batch per name.
        assert_eq!(converter.batches.borrow().len(), 1);
    }

    #[test]
    fn test_substitution_happens_before_scan() {
        let rules: SubstitutionRules = [("Ethyldiamine", "ethylenediamine")].into_iter().collect();
        let converter = FakeConverter::new(&[("1,2-ethylenediamine", "NCCN")]);
        let finder =
            MoleculeFinder::new(FinderConfig::new("AmineFinder", ["amin"]).with_rules(rules), converter.clone())
                .unwrap();
        let found = finder
            .find_molecule("catena-[1,2-Ethyldiamine bis(\u{3bc}4-phosphato)-di-zinc]", false)
            .unwrap();
        assert_eq!(found.name, "1,2-ethylenediamine");
        assert!(converter.batches.borrow()[0].iter().all(|c| !c.contains("Ethyldiamine")));
    }

    #[test]
    fn test_no_conversion_without_correction() {
        let suggester = FakeSuggestions::new(&[("\"diaminooctane\"", &["diaminooctane"])]);
        let finder = MoleculeFinder::new(amine_config(), FakeConverter::new(&[]))
            .unwrap()
            .with_suggestions(suggester.clone());
        let err = finder.find_molecule("catena-(1,8-diaminooctane bis(phosphato))", false).unwrap_err();
        assert!(matches!(err, FinderError::NoConversion(..)));
        assert_eq!(suggester.calls.get(), 0);
    }

    #[test]
    fn test_correction_rescues_typo() {
        let converter = FakeConverter::new(&[("ethylenediamine", "NCCN")]);
        let suggester = FakeSuggestions::new(&[("\"ethylendiamine\"", &["ethylenediamine", "ethylene"])]);
        let finder = MoleculeFinder::new(amine_config(), converter.clone())
            .unwrap()
            .with_suggestions(suggester.clone());

        let name = "catena-(ethylendiamine bis(chloro)-copper)";
        let found = finder.find_molecule(name, true).unwrap();
        assert_eq!(
            found,
            FoundMolecule {
                name: "ethylenediamine".to_string(),
                notation: "NCCN".to_string()
            }
        );
        assert_eq!(suggester.calls.get(), 1);
        // The original name, then the corrected one.
        assert_eq!(converter.batches.borrow().len(), 2);
    }

    #[test]
    fn test_correction_exhausted() {
        // The service is unreachable for every hit.
        let suggester = FakeSuggestions::new(&[]);
        let finder = MoleculeFinder::new(amine_config(), FakeConverter::new(&[]))
            .unwrap()
            .with_suggestions(suggester.clone());
        let err = finder.find_molecule("catena-(ethylendiamine bis(chloro)-copper)", true).unwrap_err();
        assert!(matches!(err, FinderError::CorrectionExhausted(..)));
        assert_eq!(suggester.calls.get(), 1);
    }

    #[test]
    fn test_correction_without_service() {
        let finder = MoleculeFinder::new(amine_config(), FakeConverter::new(&[])).unwrap();
        let err = finder.find_molecule("ethylendiamine", true).unwrap_err();
        assert!(matches!(err, FinderError::CorrectionExhausted(..)));
    }

    #[test]
    fn test_corrected_name_without_hit_is_skipped() {
        // The suggestion removes the only indicator keyword from the name.
        let suggester = FakeSuggestions::new(&[("\"ethylamin\"", &["ethanol"])]);
        let converter = FakeConverter::new(&[("ethanol", "CCO")]);
        let finder = MoleculeFinder::new(amine_config(), converter.clone())
            .unwrap()
            .with_suggestions(suggester);
        let err = finder.find_molecule("ethylamin", true).unwrap_err();
        assert!(matches!(err, FinderError::CorrectionExhausted(..)));
        assert_eq!(converter.batches.borrow().len(), 1);
    }

    #[test]
    fn test_longest_name_wins() {
        let converter = FakeConverter::new(&[("ethylenediamine", "NCCN"), ("1,2-ethylenediamine", "NCCN")]);
        let finder = MoleculeFinder::new(amine_config(), converter).unwrap();
        let found = finder.find_molecule("catena-(1,2-ethylenediamine tetrachloro-zinc)", false).unwrap();
        assert_eq!(found.name, "1,2-ethylenediamine");

        let all = finder.parse_name("catena-(1,2-ethylenediamine tetrachloro-zinc)", false).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_multi_component_results_are_skipped() {
        let converter = FakeConverter::new(&[
            ("ethylenediamine dihydrochloride", "NCCN.Cl.Cl"),
            ("ethylenediamine", "NCCN"),
        ]);
        let finder = MoleculeFinder::new(amine_config(), converter).unwrap();
        let found = finder.find_molecule("ethylenediamine dihydrochloride", false).unwrap();
        assert_eq!(found.name, "ethylenediamine");
        assert!(!found.notation.contains('.'));
    }

    #[test]
    fn test_only_multi_component_results() {
        let converter = FakeConverter::new(&[("ethylenediamine dihydrochloride", "NCCN.Cl.Cl")]);
        let finder = MoleculeFinder::new(amine_config(), converter).unwrap();
        let err = finder.find_molecule("ethylenediamine dihydrochloride", false).unwrap_err();
        assert!(matches!(err, FinderError::NoSingleComponentResult(..)));
    }

    #[test]
    fn test_select_longest_tie_break() {
        let conversion: Conversion = [("abd", "N"), ("abc", "C"), ("ab", "O"), ("abcd", "C.C")]
            .iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();
        assert_eq!(
            select_longest(&conversion),
            Some(FoundMolecule {
                name: "abc".to_string(),
                notation: "C".to_string()
            })
        );
        assert_eq!(select_longest(&Conversion::new()), None);
    }

    #[test]
    fn test_select_longest_counts_characters() {
        // Two bytes per Greek letter, one character each.
        let conversion: Conversion = [("\u{3bc}\u{3bc}", "A"), ("abc", "B")]
            .iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();
        assert_eq!(select_longest(&conversion).unwrap().name, "abc");
    }

    #[test]
    fn test_finders_share_collaborators() {
        let converter = FakeConverter::new(&[("piperazine", "C1CNCCN1"), ("pyridine", "c1ccncc1")]);
        let piperazines = MoleculeFinder::new(FinderConfig::new("PiperazineFinder", ["piperaz"]), converter.clone())
            .unwrap();
        let pyridines =
            MoleculeFinder::new(FinderConfig::new("PyridineFinder", ["pyrid"]), converter.clone()).unwrap();

        let name = "piperazine pyridine";
        assert_eq!(piperazines.find_molecule(name, false).unwrap().name, "piperazine");
        assert_eq!(pyridines.find_molecule(name, false).unwrap().name, "pyridine");
        assert_eq!(piperazines.to_string(), "PiperazineFinder");
        assert_eq!(converter.batches.borrow().len(), 2);
    }

    #[test]
    fn test_error_messages_name_the_finder() {
        let finder = MoleculeFinder::new(amine_config(), FakeConverter::new(&[])).unwrap();
        let err = finder.find_molecule("benzoic acid", false).unwrap_err();
        assert_eq!(err.to_string(), "no possible hit by AmineFinder: benzoic acid");
    }

    #[test]
    fn test_errors_carry_the_name_as_given() {
        let finder = MoleculeFinder::new(amine_config(), FakeConverter::new(&[])).unwrap();
        let name = "bis( \u{3bc}2-chloro )-di-copper";
        let err = finder.find_molecule(name, false).unwrap_err();
        assert_eq!(err, FinderError::NoHit("AmineFinder".to_string(), name.to_string()));
    }

    /// Answers call `i` with the `i`-th table, restricted to the names in the batch.
    struct ScriptedConverter {
        calls: Vec<Vec<(&'static str, &'static str)>>,
        next: Cell<usize>,
    }

    impl StructureConverter for ScriptedConverter {
        fn convert_names(&self, names: &[String], _format: OutputFormat) -> Conversion {
            let call = self.next.get();
            self.next.set(call + 1);
            self.calls
                .get(call)
                .into_iter()
                .flatten()
                .filter(|(known, _)| names.iter().any(|name| name == known))
                .map(|(name, notation)| (name.to_string(), notation.to_string()))
                .collect()
        }
    }

    #[test]
    fn test_corrected_names_merge_last_write_wins() {
        // Corrected names are parsed in order:
        //   "ethylendiamine piperazine pyridine"  (pyridne corrected)
        //   "ethylenediamine piperazine pyridne"  (ethylendiamine corrected)
        // Both convert "piperazine"; the later one's notation is kept.
        let converter = Rc::new(ScriptedConverter {
            calls: vec![
                vec![],
                vec![("piperazine", "N1CCNCC1"), ("pyridine", "c1ccncc1")],
                vec![("piperazine", "C1CNCCN1"), ("ethylenediamine", "NCCN")],
            ],
            next: Cell::new(0),
        });
        let suggester = FakeSuggestions::new(&[
            ("\"ethylendiamine\"", &["ethylenediamine"]),
            ("\"pyridne\"", &["pyridine"]),
        ]);
        let finder = MoleculeFinder::new(amine_config(), converter.clone())
            .unwrap()
            .with_suggestions(suggester.clone());

        let merged = finder.parse_name("ethylendiamine piperazine pyridne", true).unwrap();
        assert_eq!(converter.next.get(), 3);
        // "piperazine" has no correction of its own.
        assert_eq!(suggester.calls.get(), 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["piperazine"], "C1CNCCN1");
        assert_eq!(merged["pyridine"], "c1ccncc1");
        assert_eq!(merged["ethylenediamine"], "NCCN");
    }
}
