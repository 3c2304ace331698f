//! Final ordering and serializable output records.
//!
//! Ordering rules:
//! - authors by total score descending, then identifier ascending
//! - publications by score descending, then `doc_id` ascending
//! - sentences by score descending, then `sentence_id` ascending

use crate::aggregate::{AuthorAccumulator, PublicationAccumulator, SentenceRecord};
use savant_core::PublicationRef;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A ranked expert with supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRanking {
    pub identifier: String,
    pub name: String,
    pub own_institution: bool,
    /// Sum of distinct-text sentence scores.
    pub score: f64,
    pub max_score: f64,
    pub avg_score: f64,
    pub min_distance: f64,
    pub avg_distance: f64,
    pub publications: Vec<PublicationRanking>,
}

/// One publication backing an expert, with its metadata inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationRanking {
    #[serde(flatten)]
    pub publication: PublicationRef,
    pub score: f64,
    pub sentences: Vec<SentenceEvidence>,
}

/// A matched sentence shown as evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceEvidence {
    pub sentence_id: String,
    pub text: String,
    pub score: f64,
}

/// Drop non-positive authors, order the rest, and cap at `max_experts`.
#[must_use]
pub fn format_rankings(
    authors: BTreeMap<String, AuthorAccumulator>,
    max_experts: Option<usize>,
) -> Vec<AuthorRanking> {
    let mut ranked: Vec<AuthorRanking> = authors
        .into_values()
        .filter(|acc| acc.total_score > 0.0)
        .map(author_ranking)
        .collect();

    ranked.sort_by(|a, b| {
        by_score_desc(a.score, b.score).then_with(|| a.identifier.cmp(&b.identifier))
    });

    if let Some(limit) = max_experts {
        ranked.truncate(limit);
    }
    ranked
}

fn author_ranking(acc: AuthorAccumulator) -> AuthorRanking {
    let mut publications: Vec<PublicationRanking> =
        acc.publications.into_values().map(publication_ranking).collect();
    publications.sort_by(|a, b| {
        by_score_desc(a.score, b.score)
            .then_with(|| a.publication.doc_id.cmp(&b.publication.doc_id))
    });

    AuthorRanking {
        identifier: acc.author.identifier,
        name: acc.author.name,
        own_institution: acc.author.own_institution,
        score: acc.total_score,
        max_score: acc.max_score,
        avg_score: acc.avg_score,
        min_distance: acc.min_distance,
        avg_distance: acc.avg_distance,
        publications,
    }
}

fn publication_ranking(acc: PublicationAccumulator) -> PublicationRanking {
    let mut sentences: Vec<SentenceEvidence> = acc
        .sentences
        .into_values()
        .map(|SentenceRecord { sentence_id, text, score }| SentenceEvidence {
            sentence_id,
            text,
            score,
        })
        .collect();
    sentences.sort_by(|a, b| {
        by_score_desc(a.score, b.score).then_with(|| a.sentence_id.cmp(&b.sentence_id))
    });

    PublicationRanking {
        publication: acc.publication,
        score: acc.score,
        sentences,
    }
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
