use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::*;

mod web;
pub use web::*;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").expect("static regex");
}

/// An autocomplete-style service that proposes completions for a short query.
///
/// Implementations report transport and decoding failures as errors; the corrector
/// turns every failure into "no suggestion".
pub trait SuggestionService {
    fn suggest(&self, query: &str) -> Result<Vec<String>>;
}

/// Normalized indel similarity of two strings in `[0, 1]`.
///
/// `(|a| + |b| - indel(a, b)) / (|a| + |b|)`, where `indel` counts insertions and
/// deletions only. Two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    // indel(a, b) = |a| + |b| - 2 * lcs(a, b)
    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    let lcs = row[b.len()];
    (2 * lcs) as f64 / total as f64
}

/// Asks `service` about the quoted `keyword` and returns the suggested word closest to it.
///
/// Suggestions are split into `\w+` words and ranked by [`similarity_ratio`] against the
/// quoted keyword; the first of equally ranked words wins. Any service failure, or a
/// response with no words in it, yields `None`.
pub fn suggest_correction(service: &dyn SuggestionService, keyword: &str) -> Option<String> {
    let quoted = format!("\"{keyword}\"");
    let suggestions = match service.suggest(&quoted) {
        Ok(suggestions) => suggestions,
        Err(e) => {
            error!("Suggestion lookup for {} failed: {:#}", quoted, e);
            return None;
        }
    };

    let mut best: Option<(&str, f64)> = None;
    for word in suggestions.iter().flat_map(|s| WORD.find_iter(s)).map(|m| m.as_str()) {
        let score = similarity_ratio(&quoted, word);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((word, score));
        }
    }

    match best {
        Some((word, score)) => {
            debug!("Suggestion for {}: {} (ratio {:.3})", quoted, word, score);
            Some(word.to_owned())
        }
        None => {
            debug!("No suggestion for {}", quoted);
            None
        }
    }
}

/// For every hit with a usable correction, the name with the first occurrence of that hit
/// replaced by the correction. The occurrence is a plain substring match, so it may sit inside
/// a longer token. Names identical to the input are dropped.
pub fn correct_name_by_hits<'a, I>(service: &dyn SuggestionService, name: &str, hits: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    hits.into_iter()
        .filter_map(|hit| {
            let corrected = suggest_correction(service, hit)?;
            if corrected.is_empty() || corrected == *hit {
                return None;
            }
            info!("Correcting {} -> {}", hit, corrected);
            Some(name.replacen(hit.as_str(), &corrected, 1))
        })
        .filter(|corrected_name| corrected_name != name)
        .collect()
}
