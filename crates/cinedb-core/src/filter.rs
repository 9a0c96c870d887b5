//! Structured filter predicates for hybrid search.
//!
//! A predicate is a conjunction of clauses. Each clause is either a numeric
//! range with independent inclusive/exclusive bounds or a phrase match on a
//! text field. The empty predicate has no conjuncts and matches everything.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::schema::{RATING_FIELD, TITLE_FIELD, YEAR_FIELD};
use crate::types::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub field: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub inclusive_min: bool,
    pub inclusive_max: bool,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        let above = match self.min {
            Some(min) if self.inclusive_min => value >= min,
            Some(min) => value > min,
            None => true,
        };
        let below = match self.max {
            Some(max) if self.inclusive_max => value <= max,
            Some(max) => value < max,
            None => true,
        };
        above && below
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    NumericRange(NumericRange),
    PhraseMatch { field: String, phrase: String },
}

impl Clause {
    pub fn field(&self) -> &str {
        match self {
            Clause::NumericRange(r) => &r.field,
            Clause::PhraseMatch { field, .. } => field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Clause::NumericRange(range) => doc
                .get(&range.field)
                .and_then(|v| v.as_f64())
                .is_some_and(|v| range.contains(v)),
            Clause::PhraseMatch { field, phrase } => doc
                .get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|text| phrase_matches(text, phrase)),
        }
    }

    /// Wire form used by the search service's query DSL.
    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match self {
            Clause::NumericRange(r) => {
                if let Some(min) = r.min {
                    obj.insert("min".into(), json!(min));
                    obj.insert("inclusive_min".into(), json!(r.inclusive_min));
                }
                if let Some(max) = r.max {
                    obj.insert("max".into(), json!(max));
                    obj.insert("inclusive_max".into(), json!(r.inclusive_max));
                }
                obj.insert("field".into(), json!(r.field));
            }
            Clause::PhraseMatch { field, phrase } => {
                obj.insert("match_phrase".into(), json!(phrase));
                obj.insert("field".into(), json!(field));
            }
        }
        Value::Object(obj)
    }
}

/// Conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub conjuncts: Vec<Clause>,
}

impl FilterPredicate {
    /// Predicate with no conjuncts; matches every document.
    pub fn match_all() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.conjuncts.is_empty() }

    pub fn len(&self) -> usize { self.conjuncts.len() }

    pub fn and(mut self, clause: Clause) -> Self {
        self.conjuncts.push(clause);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conjuncts.iter().all(|c| c.matches(doc))
    }

    /// Reject bounds no store can compare against (NaN, infinities).
    pub fn validate(&self) -> Result<()> {
        for clause in &self.conjuncts {
            if let Clause::NumericRange(r) = clause {
                for bound in [r.min, r.max].into_iter().flatten() {
                    if !bound.is_finite() {
                        return Err(Error::InvalidArgument(format!("non-finite bound {bound} on '{}'", r.field)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Render as the search request body fragment:
    /// `{"query": {"conjuncts": [...]}}`.
    pub fn to_search_request(&self) -> Value {
        let conjuncts: Vec<Value> = self.conjuncts.iter().map(Clause::to_json).collect();
        json!({ "query": { "conjuncts": conjuncts } })
    }
}

/// Builds the movie filter from optional user constraints.
///
/// Year range is inclusive on both ends. The rating bound is an exclusive
/// minimum with no maximum, so a film rated exactly `min_rating` is excluded.
/// Inputs are not validated: an inverted year range yields a predicate that
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBuilder {
    year_range: Option<(i32, i32)>,
    min_rating: Option<f64>,
    title_phrase: Option<String>,
}

impl FilterBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn year_range(mut self, lo: i32, hi: i32) -> Self {
        self.year_range = Some((lo, hi));
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn title_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.title_phrase = Some(phrase.into());
        self
    }

    pub fn build(&self) -> FilterPredicate {
        build(self.year_range, self.min_rating, self.title_phrase.as_deref())
    }
}

pub fn build(year_range: Option<(i32, i32)>, min_rating: Option<f64>, title_phrase: Option<&str>) -> FilterPredicate {
    let mut predicate = FilterPredicate::match_all();
    if let Some((lo, hi)) = year_range {
        predicate = predicate.and(Clause::NumericRange(NumericRange {
            field: YEAR_FIELD.to_string(),
            min: Some(f64::from(lo)),
            max: Some(f64::from(hi)),
            inclusive_min: true,
            inclusive_max: true,
        }));
    }
    if let Some(rating) = min_rating {
        predicate = predicate.and(Clause::NumericRange(NumericRange {
            field: RATING_FIELD.to_string(),
            min: Some(rating),
            max: None,
            inclusive_min: false,
            inclusive_max: false,
        }));
    }
    if let Some(phrase) = title_phrase {
        predicate = predicate.and(Clause::PhraseMatch { field: TITLE_FIELD.to_string(), phrase: phrase.to_string() });
    }
    predicate
}

/// Lowercased alphanumeric word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Case-insensitive contiguous token match. A phrase with no tokens matches
/// nothing.
pub fn phrase_matches(text: &str, phrase: &str) -> bool {
    let needle = tokenize(phrase);
    if needle.is_empty() { return false; }
    let hay = tokenize(text);
    hay.windows(needle.len()).any(|w| w == needle.as_slice())
}
