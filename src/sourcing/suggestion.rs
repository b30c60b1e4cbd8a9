//! Generative-suggestion feed.

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use super::Candidate;
use crate::catalog::{BookSearch, Catalog, SearchDoc};
use crate::suggest::{BookSuggestion, SuggestionService};

/// Picks the catalog result that best matches a suggestion.
///
/// Preference order: a case-insensitive title match, then a result whose
/// author list contains the suggested author (case-insensitive substring),
/// then the first result.
#[must_use]
pub fn choose_search_match<'a>(
    suggestion: &BookSuggestion,
    results: &'a [SearchDoc],
) -> Option<&'a SearchDoc> {
    let wanted_title = suggestion.title.trim().to_lowercase();
    if let Some(exact) = results
        .iter()
        .find(|doc| doc.title.trim().to_lowercase() == wanted_title)
    {
        return Some(exact);
    }

    let wanted_author = suggestion
        .author
        .as_deref()
        .map(|author| author.trim().to_lowercase())
        .filter(|author| !author.is_empty());
    if let Some(author) = wanted_author {
        if let Some(by_author) = results.iter().find(|doc| {
            doc.author_name
                .iter()
                .any(|name| name.to_lowercase().contains(&author))
        }) {
            return Some(by_author);
        }
    }

    results.first()
}

#[instrument(skip(catalog, suggestion), fields(title = %suggestion.title))]
async fn resolve_suggestion(
    catalog: &dyn Catalog,
    suggestion: BookSuggestion,
) -> Option<Candidate> {
    let query = BookSearch::english(suggestion.title.trim(), suggestion.author.as_deref());
    let results = match catalog.search_books(&query).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "Suggestion search failed");
            return None;
        }
    };
    let Some(chosen) = choose_search_match(&suggestion, &results).cloned() else {
        debug!("No catalog match for suggestion");
        return None;
    };
    Some(Candidate::from_search_doc(chosen, suggestion.reason))
}

/// Asks for suggestions seeded with liked titles and resolves them in the catalog.
pub(crate) async fn suggestion_feed(
    catalog: &dyn Catalog,
    suggester: &dyn SuggestionService,
    liked_titles: &[String],
    limit: usize,
) -> Vec<Candidate> {
    let suggestions = match suggester.suggest_books(liked_titles, limit).await {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!(error = %e, "Book suggestions unavailable");
            return Vec::new();
        }
    };

    let lookups = suggestions
        .into_iter()
        .take(limit)
        .filter(|s| !s.title.trim().is_empty())
        .map(|suggestion| resolve_suggestion(catalog, suggestion));
    join_all(lookups).await.into_iter().flatten().collect()
}
