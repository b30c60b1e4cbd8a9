//! Best-edition selection.
//!
//! An edition qualifies only if it has an ISBN-13, is tagged English and has
//! a cover. Among qualifying editions the most recently published wins, ties
//! broken by how many descriptive fields are filled in. When no edition has a
//! usable year, the most complete one wins. Full ties keep input order.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::RawEdition;

/// Language key the catalog uses for English.
pub const ENGLISH_LANGUAGE_KEY: &str = "/languages/eng";

#[allow(clippy::expect_used)]
static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("year regex is valid")); // Static pattern, safe to panic

/// Extracts the first four-digit run of a free-form publish date.
///
/// `"March 1990"` → `Some(1990)`. A run of `0000` counts as no year.
#[must_use]
pub fn parse_year(publish_date: &str) -> Option<i32> {
    YEAR_PATTERN
        .find(publish_date)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .filter(|year| *year != 0)
}

/// Publish year of an edition, if its date carries one.
#[must_use]
pub fn edition_year(edition: &RawEdition) -> Option<i32> {
    edition.publish_date.as_deref().and_then(parse_year)
}

/// Number of non-empty descriptive fields.
#[must_use]
pub fn completeness_score(edition: &RawEdition) -> u8 {
    let filled = [
        has_cover(edition),
        edition.subtitle.as_deref().is_some_and(|s| !s.trim().is_empty()),
        edition
            .publish_date
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty()),
        !edition.publishers.is_empty(),
        !edition.subjects.is_empty(),
        edition.number_of_pages.is_some_and(|pages| pages > 0),
    ];
    filled.into_iter().map(u8::from).sum()
}

/// True when the edition is tagged English.
#[must_use]
pub fn is_english(edition: &RawEdition) -> bool {
    edition
        .languages
        .iter()
        .any(|language| language.key == ENGLISH_LANGUAGE_KEY)
}

// The catalog uses -1 as a "no cover" placeholder.
fn has_cover(edition: &RawEdition) -> bool {
    edition.covers.iter().any(|id| *id > 0)
}

fn qualifies(edition: &RawEdition) -> bool {
    edition.isbn_13.iter().any(|isbn| !isbn.trim().is_empty())
        && is_english(edition)
        && has_cover(edition)
}

/// Selects the best edition, or `None` when no edition qualifies.
#[must_use]
pub fn select_best_edition(editions: &[RawEdition]) -> Option<&RawEdition> {
    let candidates: Vec<(&RawEdition, Option<i32>, u8)> = editions
        .iter()
        .filter(|edition| qualifies(edition))
        .map(|edition| (edition, edition_year(edition), completeness_score(edition)))
        .collect();

    let has_dated = candidates.iter().any(|(_, year, _)| year.is_some());
    let mut best: Option<(&RawEdition, Option<i32>, u8)> = None;
    for candidate in candidates {
        if has_dated && candidate.1.is_none() {
            continue;
        }
        // Replace only on strict improvement so the earliest full tie survives.
        let better = best.is_none_or(|(_, best_year, best_score)| {
            (candidate.1, candidate.2) > (best_year, best_score)
        });
        if better {
            best = Some(candidate);
        }
    }
    best.map(|(edition, _, _)| edition)
}
