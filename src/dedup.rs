//! Duplicate filtering against a user's known books.

use std::collections::HashSet;

use crate::sourcing::Candidate;

/// Removes candidates whose work key or document id is already known.
///
/// Candidates repeated within the input are collapsed to their first
/// occurrence. Order is preserved.
#[must_use]
pub fn filter_known(candidates: Vec<Candidate>, known: &HashSet<String>) -> Vec<Candidate> {
    let mut seen_in_run: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let doc_id = candidate.doc_id();
            !known.contains(&candidate.work_key)
                && !known.contains(doc_id)
                && seen_in_run.insert(doc_id.to_string())
        })
        .collect()
}
