use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W").expect("static regex");
}

/// Splits `text` on single non-word characters, keeping each delimiter as its own token.
/// Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for delimiter in NON_WORD.find_iter(text) {
        if delimiter.start() > last {
            tokens.push(&text[last..delimiter.start()]);
        }
        tokens.push(delimiter.as_str());
        last = delimiter.end();
    }
    if last < text.len() {
        tokens.push(&text[last..]);
    }
    tokens
}

/// Every prefix that can be glued to the left of a hit, nearest token first:
/// `""`, `t[n]`, `t[n-1] t[n]`, ... up to the whole left context.
fn left_extensions(left: &str) -> Vec<&str> {
    let tokens = tokenize(left);
    let mut extensions = Vec::with_capacity(tokens.len() + 1);
    extensions.push("");
    let mut start = left.len();
    for token in tokens.iter().rev() {
        start -= token.len();
        extensions.push(&left[start..]);
    }
    extensions
}

/// Every suffix that can be glued to the right of a hit, nearest token first.
fn right_extensions(right: &str) -> Vec<&str> {
    let tokens = tokenize(right);
    let mut extensions = Vec::with_capacity(tokens.len() + 1);
    extensions.push("");
    let mut end = 0;
    for token in &tokens {
        end += token.len();
        extensions.push(&right[..end]);
    }
    extensions
}

/// Grows `hit` token by token to the left and to the right inside `name`.
///
/// Context is taken around the *first* occurrence of `hit`; later occurrences are never
/// used. The result has exactly `(L + 1) * (R + 1)` entries for `L` tokens on the left and
/// `R` on the right, starting with the bare hit. Extension crosses whitespace, so long
/// names produce many candidates.
///
/// Returns an empty list if `hit` does not occur in `name`.
pub fn extend_hit(name: &str, hit: &str) -> Vec<String> {
    let Some(start) = name.find(hit) else {
        return Vec::new();
    };
    let (left, right) = (&name[..start], &name[start + hit.len()..]);

    let lefts = left_extensions(left);
    let rights = right_extensions(right);
    let mut candidates = Vec::with_capacity(lefts.len() * rights.len());
    for l in &lefts {
        for r in &rights {
            candidates.push(format!("{l}{hit}{r}"));
        }
    }
    candidates
}

/// Union of [`extend_hit`] over every hit, deduplicated and sorted.
pub fn extend_hits<'a, I>(name: &str, hits: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    hits.into_iter()
        .flat_map(|hit| extend_hit(name, hit))
        .collect()
}
