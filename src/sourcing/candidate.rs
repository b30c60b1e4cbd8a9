//! Candidate works produced by the sourcing feeds.

use std::fmt;

use crate::catalog::{AuthorRef, SearchDoc, SubjectWork, TrendingWork, WorkDetail};

/// Path prefix of catalog work keys.
pub const WORK_KEY_PREFIX: &str = "/works/";

/// Feed a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Subject,
    Suggestion,
    Trending,
}

impl CandidateSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Suggestion => "suggestion",
            Self::Trending => "trending",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A work proposed for the queue, before edition resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub work_key: String,
    pub title: String,
    pub authors: Vec<AuthorRef>,
    pub subjects: Vec<String>,
    pub first_publish_year: Option<i32>,
    pub description: Option<String>,
    pub cover_id: Option<i64>,
    /// Why the suggestion service proposed this work.
    pub reason: Option<String>,
    pub source: CandidateSource,
    pub discovered_at: Option<String>,
}

/// Document id for a work key: `/works/OL45883W` → `OL45883W`.
#[must_use]
pub fn doc_id_for(work_key: &str) -> &str {
    work_key.strip_prefix(WORK_KEY_PREFIX).unwrap_or(work_key)
}

fn zip_authors(names: &[String], keys: &[String]) -> Vec<AuthorRef> {
    let len = names.len().max(keys.len());
    (0..len)
        .map(|i| AuthorRef {
            key: keys.get(i).map(|key| {
                if key.starts_with("/authors/") {
                    key.clone()
                } else {
                    format!("/authors/{key}")
                }
            }),
            name: names.get(i).cloned(),
        })
        .collect()
}

impl Candidate {
    /// Document id derived from the work key.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        doc_id_for(&self.work_key)
    }

    #[must_use]
    pub fn from_subject_work(work: SubjectWork, discovered_at: &str) -> Self {
        Self {
            work_key: work.key,
            title: work.title,
            authors: work.authors,
            subjects: work.subject,
            first_publish_year: work.first_publish_year,
            description: None,
            cover_id: work.cover_id,
            reason: None,
            source: CandidateSource::Subject,
            discovered_at: Some(discovered_at.to_string()),
        }
    }

    #[must_use]
    pub fn from_search_doc(doc: SearchDoc, reason: Option<String>) -> Self {
        Self {
            authors: zip_authors(&doc.author_name, &doc.author_key),
            work_key: doc.key,
            title: doc.title,
            subjects: doc.subject,
            first_publish_year: doc.first_publish_year,
            description: None,
            cover_id: doc.cover_i,
            reason,
            source: CandidateSource::Suggestion,
            discovered_at: None,
        }
    }

    /// Trending work, completed with subjects and description from its detail record.
    #[must_use]
    pub fn from_trending(work: TrendingWork, detail: Option<WorkDetail>) -> Self {
        let (subjects, description) = detail
            .map(|d| (d.subjects, d.description.map(|text| text.as_str().to_string())))
            .unwrap_or_default();
        Self {
            authors: zip_authors(&work.author_name, &work.author_key),
            work_key: work.key,
            title: work.title,
            subjects,
            first_publish_year: work.first_publish_year,
            description,
            cover_id: work.cover_i,
            reason: None,
            source: CandidateSource::Trending,
            discovered_at: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::TextValue;

    #[test]
    fn test_doc_id_strips_work_prefix() {
        assert_eq!(doc_id_for("/works/OL45883W"), "OL45883W");
        assert_eq!(doc_id_for("OL45883W"), "OL45883W");
    }

    #[test]
    fn test_from_search_doc_pairs_names_and_keys() {
        let doc = SearchDoc {
            key: "/works/OL1W".to_string(),
            title: "Good Omens".to_string(),
            author_name: vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()],
            author_key: vec!["OL25712A".to_string()],
            first_publish_year: Some(1990),
            cover_i: Some(42),
            subject: vec![],
        };
        let candidate = Candidate::from_search_doc(doc, Some("Funny".to_string()));
        assert_eq!(candidate.authors.len(), 2);
        assert_eq!(candidate.authors[0].key.as_deref(), Some("/authors/OL25712A"));
        assert_eq!(candidate.authors[1].key, None);
        assert_eq!(candidate.authors[1].name.as_deref(), Some("Neil Gaiman"));
        assert_eq!(candidate.source, CandidateSource::Suggestion);
        assert_eq!(candidate.reason.as_deref(), Some("Funny"));
    }

    #[test]
    fn test_from_trending_takes_detail_fields() {
        let work = TrendingWork {
            key: "/works/OL2W".to_string(),
            title: "Project Hail Mary".to_string(),
            author_name: vec!["Andy Weir".to_string()],
            author_key: vec!["OL7234434A".to_string()],
            first_publish_year: Some(2021),
            cover_i: None,
        };
        let detail = WorkDetail {
            key: "/works/OL2W".to_string(),
            subjects: vec!["Space".to_string()],
            description: Some(TextValue::Plain("An astronaut wakes up.".to_string())),
        };
        let candidate = Candidate::from_trending(work, Some(detail));
        assert_eq!(candidate.subjects, vec!["Space".to_string()]);
        assert_eq!(candidate.description.as_deref(), Some("An astronaut wakes up."));
        assert_eq!(candidate.doc_id(), "OL2W");
    }
}
