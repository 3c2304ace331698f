//! Adapter for raw vector-store GraphQL responses.
//!
//! The sentence index answers `nearVector` queries with:
//!
//! ```text
//! {"data": {"Get": {"<Class>": [
//!   {"docid": .., "text": .., "sentid": .., "model": ..,
//!    "hasPublication": [{"docid": .., "fr_title": .., ...,
//!                        "hasAuthors": [{"identifier": .., "name": .., "own_inst": ..}]}] | null,
//!    "_additional": {"distance": .., "certainty": ..}}
//! ]}}}
//! ```
//!
//! Authors hang off the publication, not the sentence. Only the first linked
//! publication is used. Null scalar fields become empty strings.

use savant_core::model::{null_as_default, string_or_number};
use savant_core::{AuthorRef, Localized, PublicationRef, SentenceHit};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Sentence classes the index has been populated with.
pub const KNOWN_CLASSES: [&str; 3] = ["Sentence", "SbertSentence", "AdaSentence"];

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid vector-store response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("vector-store query failed: {0}")]
    Backend(String),

    #[error("response has no `data.Get` section")]
    MissingData,

    #[error("class {0:?} not found in response (available: {1})")]
    UnknownClass(String, String),

    #[error("response holds several classes ({0}); pick one explicitly")]
    AmbiguousClass(String),
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(rename = "Get")]
    get: Option<BTreeMap<String, Option<Vec<Value>>>>,
}

#[derive(Debug, Deserialize)]
struct RawSentence {
    #[serde(default)]
    docid: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    text: String,
    #[serde(deserialize_with = "string_or_number")]
    sentid: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(rename = "hasPublication", default)]
    has_publication: Option<Vec<RawPublication>>,
    #[serde(rename = "_additional")]
    additional: RawAdditional,
}

#[derive(Debug, Deserialize)]
struct RawAdditional {
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct RawPublication {
    #[serde(default)]
    docid: Option<Value>,
    #[serde(default, deserialize_with = "text_or_list")]
    doc_type: String,
    #[serde(default, deserialize_with = "text_or_list")]
    fr_title: String,
    #[serde(default, deserialize_with = "text_or_list")]
    en_title: String,
    #[serde(default, deserialize_with = "text_or_list")]
    fr_abstract: String,
    #[serde(default, deserialize_with = "text_or_list")]
    en_abstract: String,
    #[serde(default, deserialize_with = "text_or_list")]
    fr_keyword: String,
    #[serde(default, deserialize_with = "text_or_list")]
    en_keyword: String,
    #[serde(default, deserialize_with = "text_or_list")]
    citation_ref: String,
    #[serde(default, deserialize_with = "text_or_list")]
    citation_full: String,
    #[serde(rename = "hasAuthors", default)]
    has_authors: Option<Vec<RawAuthor>>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(deserialize_with = "string_or_number")]
    identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    own_inst: bool,
}

/// Hits read from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Readable records, in result order.
    pub hits: Vec<SentenceHit>,
    /// Records of the selected class that could not be read as hits.
    pub unreadable: usize,
}

/// Parse a raw response body into typed hits, preserving result order.
///
/// With `class = None` the single class present in the response is used.
/// A record that does not have the sentence shape is skipped and counted;
/// it never fails the whole response.
///
/// # Errors
///
/// Fails on invalid JSON, GraphQL errors, a missing `data.Get` section, or
/// when the requested class is absent.
pub fn parse_response(body: &str, class: Option<&str>) -> Result<ParsedResponse, ResponseError> {
    let response: RawResponse = serde_json::from_str(body)?;
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(ResponseError::Backend(messages.join("; ")));
    }

    let mut classes = response
        .data
        .and_then(|data| data.get)
        .ok_or(ResponseError::MissingData)?;

    let name = match class {
        Some(name) => name.to_string(),
        None if classes.len() == 1 => classes.keys().next().cloned().unwrap_or_default(),
        None => {
            let listed: Vec<&str> = classes.keys().map(String::as_str).collect();
            return Err(ResponseError::AmbiguousClass(listed.join(", ")));
        }
    };

    let Some(records) = classes.remove(&name) else {
        let listed: Vec<&str> = classes.keys().map(String::as_str).collect();
        return Err(ResponseError::UnknownClass(name, listed.join(", ")));
    };

    let records = records.unwrap_or_default();
    let total = records.len();
    let hits: Vec<SentenceHit> = records
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, record)| match serde_json::from_value::<RawSentence>(record) {
                Ok(raw) => Some(into_hit(raw)),
                Err(err) => {
                    warn!("skipping unreadable {name} record #{index}: {err}");
                    None
                }
            },
        )
        .collect();

    Ok(ParsedResponse {
        unreadable: total - hits.len(),
        hits,
    })
}

/// True when `value` looks like a raw GraphQL response rather than a hit array.
#[must_use]
pub fn is_raw_response(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("data") || obj.contains_key("errors"))
}

fn into_hit(raw: RawSentence) -> SentenceHit {
    let sentence_doc_id = raw.docid.as_ref().and_then(id_text);
    let first = raw.has_publication.and_then(|pubs| pubs.into_iter().next());

    let (publication, authors) = match first {
        Some(publication) => {
            let authors = publication.has_authors.map(|authors| {
                authors
                    .into_iter()
                    .map(|a| AuthorRef {
                        identifier: a.identifier,
                        name: a.name,
                        own_institution: a.own_inst,
                    })
                    .collect()
            });
            let doc_id = publication
                .docid
                .as_ref()
                .and_then(id_text)
                .or_else(|| sentence_doc_id.clone())
                .unwrap_or_default();
            let publication = PublicationRef {
                doc_id,
                title: Localized::new(publication.fr_title, publication.en_title),
                summary: Localized::new(publication.fr_abstract, publication.en_abstract),
                keywords: Localized::new(publication.fr_keyword, publication.en_keyword),
                doc_type: publication.doc_type,
                citation_short: publication.citation_ref,
                citation_full: publication.citation_full,
            };
            (Some(publication), authors)
        }
        None => (None, None),
    };

    SentenceHit {
        distance: raw.additional.distance,
        text: raw.text,
        sentence_id: raw.sentid,
        publication,
        authors,
        model: raw.model,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Keyword fields are stored either as one string or as a list of strings.
fn text_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    })
}

/// `own_inst` is a bool in recent imports and a `"True"`/`"False"` string in
/// older ones.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
        }
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
      "data": {"Get": {"SbertSentence": [
        {
          "docid": 4242,
          "text": "We study protein folding with graph networks.",
          "sentid": 3,
          "hasPublication": [{
            "doc_type": "ART",
            "docid": 4242,
            "fr_title": null,
            "en_title": "Graph networks for folding",
            "fr_abstract": "",
            "en_abstract": "Abstract text",
            "fr_keyword": ["repliement", "protéines"],
            "en_keyword": "folding",
            "citation_ref": "Doe 2021",
            "citation_full": "J. Doe, Graph networks for folding, 2021.",
            "hasAuthors": [
              {"identifier": "jdoe", "name": "Jane Doe", "own_inst": "True"},
              {"identifier": 77, "name": null, "own_inst": null}
            ]
          }],
          "_additional": {"distance": 0.12, "certainty": 0.94}
        },
        {
          "docid": 5,
          "text": "Dangling sentence.",
          "sentid": "5-1",
          "hasPublication": null,
          "_additional": {"distance": 0.2, "certainty": 0.9}
        }
      ]}}
    }"#;

    #[test]
    fn parses_single_class_response() {
        let parsed = parse_response(RESPONSE, None).expect("response should parse");
        assert_eq!(parsed.unreadable, 0);
        let hits = parsed.hits;
        assert_eq!(hits.len(), 2);

        let first = &hits[0];
        assert!((first.distance - 0.12).abs() < 1e-12);
        assert_eq!(first.sentence_id, "3");
        let publication = first.publication.as_ref().expect("publication");
        assert_eq!(publication.doc_id, "4242");
        assert_eq!(publication.title, Localized::new("", "Graph networks for folding"));
        assert_eq!(publication.keywords.fr, "repliement, protéines");
        assert_eq!(publication.citation_short, "Doe 2021");
        let authors = first.authors.as_ref().expect("authors");
        assert_eq!(authors.len(), 2);
        assert!(authors[0].own_institution);
        assert_eq!(authors[1].identifier, "77");
        assert!(!authors[1].own_institution);

        let dangling = &hits[1];
        assert!(dangling.publication.is_none());
        assert!(dangling.authors.is_none());
    }

    #[test]
    fn explicit_class_must_exist() {
        let err = parse_response(RESPONSE, Some("AdaSentence")).expect_err("class is absent");
        assert!(matches!(err, ResponseError::UnknownClass(ref name, _) if name == "AdaSentence"));
    }

    #[test]
    fn graphql_errors_are_surfaced() {
        let body = r#"{"errors": [{"message": "vector length mismatch"}], "data": null}"#;
        let err = parse_response(body, None).expect_err("backend error");
        assert!(err.to_string().contains("vector length mismatch"));
    }

    #[test]
    fn multiple_classes_need_a_name() {
        let body = r#"{"data": {"Get": {"AdaSentence": [], "SbertSentence": []}}}"#;
        assert!(matches!(
            parse_response(body, None),
            Err(ResponseError::AmbiguousClass(_))
        ));
        assert!(parse_response(body, Some("AdaSentence"))
                .expect("class exists")
                .hits
                .is_empty());
    }

    #[test]
    fn null_class_result_is_empty() {
        let body = r#"{"data": {"Get": {"Sentence": null}}}"#;
        let parsed = parse_response(body, None).expect("parses");
        assert!(parsed.hits.is_empty());
        assert_eq!(parsed.unreadable, 0);
    }

    #[test]
    fn unreadable_records_are_skipped_and_counted() {
        let body = r#"{"data": {"Get": {"SbertSentence": [
          {"docid": 1, "text": "Kept before.", "sentid": 0,
           "_additional": {"distance": 0.1}},
          {"docid": 1, "text": "No sentence id.", "sentid": null,
           "_additional": {"distance": 0.15}},
          {"docid": 1, "text": "No distance.", "sentid": 2, "_additional": {}},
          "not a record",
          {"docid": 2, "text": "Kept after.", "sentid": "2-3",
           "_additional": {"distance": 0.3}}
        ]}}}"#;

        let parsed = parse_response(body, None).expect("bad records are not fatal");
        assert_eq!(parsed.unreadable, 3);
        let ids: Vec<&str> = parsed.hits.iter().map(|h| h.sentence_id.as_str()).collect();
        assert_eq!(ids, ["0", "2-3"]);
    }

    #[test]
    fn missing_data_is_an_error() {
        assert!(matches!(parse_response("{}", None), Err(ResponseError::MissingData)));
        assert!(matches!(parse_response("[", None), Err(ResponseError::Json(_))));
    }

    #[test]
    fn detects_raw_responses() {
        let raw: Value = serde_json::from_str(RESPONSE).expect("json");
        assert!(is_raw_response(&raw));
        assert!(!is_raw_response(&serde_json::json!([])));
        assert!(KNOWN_CLASSES.contains(&"SbertSentence"));
    }
}
