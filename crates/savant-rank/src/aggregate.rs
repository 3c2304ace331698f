//! Per-author folding of scored hits.
//!
//! Every `(hit, author)` pair that survives filtering credits the author once
//! per distinct sentence text. Evidence is grouped by publication, then by
//! sentence id. Maps are ordered so that iteration, and therefore output, is
//! deterministic.

use crate::filter::{ScoredHit, TextDeduper};
use savant_core::{AuthorRef, PublicationRef};
use std::collections::BTreeMap;
use tracing::trace;

/// `min_distance` of an accumulator that has not been credited yet.
pub const DISTANCE_SENTINEL: f64 = 2.0;

/// One matched sentence credited to an author.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceRecord {
    pub sentence_id: String,
    pub text: String,
    pub score: f64,
}

/// Evidence from one publication, credited through one author.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationAccumulator {
    pub publication: PublicationRef,
    /// Sum of sentence scores from this publication.
    pub score: f64,
    pub sentences: BTreeMap<String, SentenceRecord>,
}

impl PublicationAccumulator {
    fn new(publication: &PublicationRef) -> Self {
        Self {
            publication: publication.clone(),
            score: 0.0,
            sentences: BTreeMap::new(),
        }
    }
}

/// Running totals for one author.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorAccumulator {
    pub author: AuthorRef,
    pub total_score: f64,
    pub max_score: f64,
    pub min_distance: f64,
    pub avg_score: f64,
    pub avg_distance: f64,
    pub score_samples: Vec<f64>,
    pub distance_samples: Vec<f64>,
    pub publications: BTreeMap<String, PublicationAccumulator>,
}

impl AuthorAccumulator {
    #[must_use]
    pub fn new(author: &AuthorRef) -> Self {
        Self {
            author: author.clone(),
            total_score: 0.0,
            max_score: 0.0,
            min_distance: DISTANCE_SENTINEL,
            avg_score: 0.0,
            avg_distance: 0.0,
            score_samples: Vec::new(),
            distance_samples: Vec::new(),
            publications: BTreeMap::new(),
        }
    }

    /// Fold one credited sentence into the totals.
    pub fn credit(&mut self, scored: &ScoredHit<'_>) {
        let score = scored.score;
        let distance = scored.hit.distance;

        self.total_score += score;
        self.max_score = self.max_score.max(score);
        self.min_distance = if self.distance_samples.is_empty() {
            distance
        } else {
            self.min_distance.min(distance)
        };
        self.score_samples.push(score);
        self.distance_samples.push(distance);
        self.avg_score = mean(&self.score_samples);
        self.avg_distance = mean(&self.distance_samples);

        let publication = self
            .publications
            .entry(scored.publication.doc_id.clone())
            .or_insert_with(|| PublicationAccumulator::new(scored.publication));
        publication.score += score;
        publication
            .sentences
            .entry(scored.hit.sentence_id.clone())
            .or_insert_with(|| SentenceRecord {
                sentence_id: scored.hit.sentence_id.clone(),
                text: scored.hit.text.clone(),
                score,
            });
    }
}

/// Mean of a sample sequence, recomputed from scratch on every update.
#[allow(clippy::cast_precision_loss)]
fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Builds one [`AuthorAccumulator`] per distinct author identifier.
#[derive(Debug, Default)]
pub struct AuthorAggregator<'h> {
    authors: BTreeMap<String, AuthorAccumulator>,
    dedup: TextDeduper<'h>,
    duplicate_credits: usize,
}

impl<'h> AuthorAggregator<'h> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit every author of `scored`, skipping texts already credited.
    pub fn add(&mut self, scored: &ScoredHit<'h>) {
        for author in scored.authors {
            if !self
                .dedup
                .first_credit(author.identifier.as_str(), scored.hit.text.as_str())
            {
                trace!(
                    "author {} already credited for sentence {}",
                    author.identifier, scored.hit.sentence_id
                );
                self.duplicate_credits += 1;
                continue;
            }

            self.authors
                .entry(author.identifier.clone())
                .or_insert_with(|| AuthorAccumulator::new(author))
                .credit(scored);
        }
    }

    /// Number of `(hit, author)` credits skipped as duplicate text.
    #[must_use]
    pub const fn duplicate_credits(&self) -> usize {
        self.duplicate_credits
    }

    #[must_use]
    pub fn finish(self) -> BTreeMap<String, AuthorAccumulator> {
        self.authors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savant_core::SentenceHit;

    fn author(id: &str) -> AuthorRef {
        AuthorRef {
            identifier: id.into(),
            name: format!("Author {id}"),
            own_institution: id.ends_with('1'),
        }
    }

    fn hit(sentence_id: &str, distance: f64, text: &str, doc: &str, authors: &[&str]) -> SentenceHit {
        SentenceHit {
            distance,
            text: text.into(),
            sentence_id: sentence_id.into(),
            publication: Some(PublicationRef::with_doc_id(doc)),
            authors: Some(authors.iter().map(|id| author(id)).collect()),
            model: None,
        }
    }

    fn scored(hit: &SentenceHit, score: f64) -> ScoredHit<'_> {
        let (publication, authors) = hit.relations().expect("test hits are well-formed");
        ScoredHit {
            hit,
            publication,
            authors,
            score,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn aggregate(scored: &[ScoredHit<'_>]) -> BTreeMap<String, AuthorAccumulator> {
        let mut aggregator = AuthorAggregator::new();
        for hit in scored {
            aggregator.add(hit);
        }
        aggregator.finish()
    }

    #[test]
    fn two_sentences_same_publication() {
        let h1 = hit("s1", 0.1, "A", "1", &["a1"]);
        let h2 = hit("s2", 0.2, "B", "1", &["a1"]);
        let authors = aggregate(&[scored(&h1, 0.8), scored(&h2, 0.6)]);

        let a1 = &authors["a1"];
        assert!(approx(a1.total_score, 1.4));
        assert!(approx(a1.max_score, 0.8));
        assert!(approx(a1.min_distance, 0.1));
        assert!(approx(a1.avg_score, 0.7));
        assert!(approx(a1.avg_distance, 0.15));
        assert_eq!(a1.publications.len(), 1);
        let publication = &a1.publications["1"];
        assert!(approx(publication.score, 1.4));
        assert_eq!(publication.sentences.len(), 2);
        assert!(a1.author.own_institution);
    }

    #[test]
    fn co_authors_each_receive_full_score() {
        let h = hit("s1", 0.1, "A", "1", &["a1", "a2"]);
        let authors = aggregate(&[scored(&h, 0.8)]);

        assert_eq!(authors.len(), 2);
        assert!(approx(authors["a1"].total_score, 0.8));
        assert!(approx(authors["a2"].total_score, 0.8));
    }

    #[test]
    fn duplicate_text_is_credited_once_and_first_evidence_kept() {
        // Same sentence embedded by two models under two sentence ids.
        let first = hit("sbert-1", 0.1, "A", "1", &["a1"]);
        let second = hit("ada-1", 0.15, "A", "1", &["a1"]);
        let mut aggregator = AuthorAggregator::new();
        aggregator.add(&scored(&first, 0.8));
        aggregator.add(&scored(&second, 0.7));
        assert_eq!(aggregator.duplicate_credits(), 1);

        let authors = aggregator.finish();
        let a1 = &authors["a1"];
        assert!(approx(a1.total_score, 0.8));
        assert_eq!(a1.score_samples.len(), 1);
        let sentences = &a1.publications["1"].sentences;
        assert_eq!(sentences.len(), 1);
        assert!(sentences.contains_key("sbert-1"));
    }

    #[test]
    fn same_sentence_id_is_not_inserted_twice() {
        // Distinct texts sharing an id across publications stay separate.
        let h1 = hit("s1", 0.1, "A", "1", &["a1"]);
        let h2 = hit("s1", 0.2, "B", "2", &["a1"]);
        let authors = aggregate(&[scored(&h1, 0.8), scored(&h2, 0.6)]);

        let a1 = &authors["a1"];
        assert_eq!(a1.publications.len(), 2);
        assert!(approx(a1.publications["1"].score, 0.8));
        assert!(approx(a1.publications["2"].score, 0.6));
    }

    #[test]
    fn untouched_accumulator_keeps_sentinel() {
        let acc = AuthorAccumulator::new(&author("a9"));
        assert!(approx(acc.min_distance, DISTANCE_SENTINEL));
        assert!(approx(acc.total_score, 0.0));
        assert!(approx(mean(&acc.score_samples), 0.0));
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(aggregate(&[]).is_empty());
    }
}
