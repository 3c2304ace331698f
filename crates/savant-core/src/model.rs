//! Typed records for nearest-neighbor sentence hits.
//!
//! A [`SentenceHit`] is one result of the upstream vector search: a matched
//! sentence, its distance to the query embedding, and the publication and
//! authors it came from. Relations are optional because the index returns
//! `null` for dangling links; the ranking engine drops such hits.
//!
//! Identifiers are kept as strings. The bibliographic source emits numeric
//! document ids, so deserialization accepts either JSON strings or integers.

use serde::{Deserialize, Deserializer, Serialize};

/// One nearest-neighbor search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceHit {
    /// Distance to the query vector. Smaller is more similar.
    pub distance: f64,
    /// The matched sentence.
    pub text: String,
    /// Sentence identifier, unique within its publication.
    #[serde(deserialize_with = "string_or_number")]
    pub sentence_id: String,
    /// Source publication, `None` when the index link is dangling.
    #[serde(default)]
    pub publication: Option<PublicationRef>,
    /// Publication authors, `None` when the index link is dangling.
    #[serde(default)]
    pub authors: Option<Vec<AuthorRef>>,
    /// Embedding model that produced the sentence vector (e.g. `sbert`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SentenceHit {
    /// Borrow the publication and a non-empty author list, if both are present.
    #[must_use]
    pub fn relations(&self) -> Option<(&PublicationRef, &[AuthorRef])> {
        let publication = self.publication.as_ref()?;
        let authors = self.authors.as_deref().filter(|a| !a.is_empty())?;
        Some((publication, authors))
    }

    /// True when the distance is a finite, non-negative number.
    #[must_use]
    pub fn has_valid_distance(&self) -> bool {
        self.distance.is_finite() && self.distance >= 0.0
    }
}

/// An author linked to a publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Globally unique author identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Whether the author belongs to the querying institution.
    #[serde(default, deserialize_with = "null_as_default")]
    pub own_institution: bool,
}

/// A French/English pair of bibliographic strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub en: String,
}

impl Localized {
    #[must_use]
    pub fn new(fr: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            fr: fr.into(),
            en: en.into(),
        }
    }
}

/// Bibliographic metadata echoed verbatim into rankings.
///
/// Only `doc_id` is interpreted (as the evidence grouping key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRef {
    #[serde(deserialize_with = "string_or_number")]
    pub doc_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Localized,
    #[serde(rename = "abstract", default, deserialize_with = "null_as_default")]
    pub summary: Localized,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Localized,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citation_short: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citation_full: String,
}

impl PublicationRef {
    /// Publication with only an identifier, all metadata empty.
    #[must_use]
    pub fn with_doc_id(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

/// Accept a JSON string or number and keep its textual form.
///
/// # Errors
///
/// Fails when the value is neither a string nor a number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Integer(n) => n.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

/// Treat an explicit JSON `null` like a missing field.
///
/// # Errors
///
/// Fails when the value is present but not a valid `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn author(id: &str) -> AuthorRef {
        AuthorRef {
            identifier: id.into(),
            name: format!("Author {id}"),
            own_institution: false,
        }
    }

    fn hit(publication: Option<PublicationRef>, authors: Option<Vec<AuthorRef>>) -> SentenceHit {
        SentenceHit {
            distance: 0.1,
            text: "A".into(),
            sentence_id: "s1".into(),
            publication,
            authors,
            model: None,
        }
    }

    #[test]
    fn relations_require_publication_and_authors() {
        let pub1 = PublicationRef::with_doc_id("1");

        assert!(hit(Some(pub1.clone()), Some(vec![author("a1")])).relations().is_some());
        assert!(hit(None, Some(vec![author("a1")])).relations().is_none());
        assert!(hit(Some(pub1.clone()), None).relations().is_none());
        assert!(hit(Some(pub1), Some(vec![])).relations().is_none());
    }

    #[test]
    fn distance_validity() {
        let mut h = hit(None, None);
        assert!(h.has_valid_distance());
        h.distance = -0.01;
        assert!(!h.has_valid_distance());
        h.distance = f64::NAN;
        assert!(!h.has_valid_distance());
        h.distance = f64::INFINITY;
        assert!(!h.has_valid_distance());
    }

    #[test]
    fn deserializes_numeric_ids_and_null_metadata() {
        let value = json!({
            "distance": 0.25,
            "text": "Deep learning for protein folding.",
            "sentence_id": 7,
            "publication": {
                "doc_id": 123456,
                "title": {"fr": null, "en": "Folding"},
                "abstract": null,
                "doc_type": "ART"
            },
            "authors": [{"identifier": "jdoe", "name": null, "own_institution": true}]
        });

        let hit: SentenceHit = serde_json::from_value(value).expect("hit should parse");
        assert_eq!(hit.sentence_id, "7");
        let publication = hit.publication.expect("publication present");
        assert_eq!(publication.doc_id, "123456");
        assert_eq!(publication.title, Localized::new("", "Folding"));
        assert_eq!(publication.summary, Localized::default());
        assert_eq!(publication.citation_full, "");
        let authors = hit.authors.expect("authors present");
        assert_eq!(authors[0].name, "");
        assert!(authors[0].own_institution);
        assert!(hit.model.is_none());
    }

    #[test]
    fn null_relations_deserialize_as_none() {
        let value = json!({
            "distance": 0.3,
            "text": "orphan",
            "sentence_id": "x",
            "publication": null,
            "authors": null
        });
        let hit: SentenceHit = serde_json::from_value(value).expect("hit should parse");
        assert!(hit.publication.is_none());
        assert!(hit.authors.is_none());
    }

    #[test]
    fn abstract_field_round_trips_under_its_wire_name() {
        let publication = PublicationRef {
            summary: Localized::new("résumé", "summary"),
            ..PublicationRef::with_doc_id("9")
        };
        let value = serde_json::to_value(&publication).expect("serialize");
        assert_eq!(value["abstract"]["fr"], "résumé");
        assert!(value.get("summary").is_none());
    }

    proptest! {
        #[test]
        fn numeric_and_string_ids_agree(id in any::<i64>()) {
            let from_number: AuthorRef =
                serde_json::from_value(json!({"identifier": id})).expect("numeric id");
            let from_string: AuthorRef =
                serde_json::from_value(json!({"identifier": id.to_string()})).expect("string id");
            prop_assert_eq!(from_number, from_string);
        }
    }
}
