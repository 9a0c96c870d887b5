//! Render a `FilterPredicate` as a LanceDB prefilter (`only_if`) expression.
//!
//! Column names are backtick-quoted since the dataset uses mixed case. Each
//! clause is resolved against the collection schema first: a range over a
//! text or unknown column, a phrase over a numeric or unknown column, and a
//! phrase with no word tokens all render as an always-false clause.
//!
//! Phrase matches compile to a `regexp_like` over the lowercased column that
//! only accepts the phrase tokens as whole, contiguous words, so
//! "spider man" matches "Spider-Man: No Way Home" and "dark knight" does not
//! match "The Dark Knightly Tale".

use cinedb_core::error::Result;
use cinedb_core::filter::{tokenize, Clause, FilterPredicate, NumericRange};
use cinedb_core::schema::{CollectionSchema, FieldKind};

const NEVER: &str = "1 = 0";

// Same split as `tokenize`: anything that is neither alphabetic nor numeric.
const SEPARATOR: &str = r"[^\p{Alphabetic}\p{N}]";

fn quote_ident(name: &str) -> String { format!("`{}`", name.replace('`', "")) }

fn quote_literal(s: &str) -> String { format!("'{}'", s.replace('\'', "''")) }

/// Word-boundary pattern for a tokenized phrase; `None` when it has no tokens.
fn phrase_pattern(phrase: &str) -> Option<String> {
	let tokens = tokenize(phrase);
	if tokens.is_empty() {
		return None;
	}
	// tokens are purely alphanumeric, so none of them carries regex syntax
	let body = tokens.join(&format!("{SEPARATOR}+"));
	Some(format!("(^|{SEPARATOR}){body}({SEPARATOR}|$)"))
}

fn range_sql(r: &NumericRange) -> Option<String> {
	let col = quote_ident(&r.field);
	let mut parts = Vec::new();
	if let Some(min) = r.min {
		let op = if r.inclusive_min { ">=" } else { ">" };
		parts.push(format!("{col} {op} {min}"));
	}
	if let Some(max) = r.max {
		let op = if r.inclusive_max { "<=" } else { "<" };
		parts.push(format!("{col} {op} {max}"));
	}
	if parts.is_empty() { None } else { Some(parts.join(" AND ")) }
}

fn clause_sql(schema: &CollectionSchema, clause: &Clause) -> Option<String> {
	let kind = schema.field(clause.field()).map(|spec| spec.kind);
	match clause {
		Clause::NumericRange(r) => match kind {
			Some(FieldKind::Integer | FieldKind::Float) => range_sql(r),
			_ => Some(NEVER.to_string()),
		},
		Clause::PhraseMatch { field, phrase } => match (kind, phrase_pattern(phrase)) {
			(Some(FieldKind::Text), Some(pattern)) => {
				Some(format!("regexp_like(lower({}), {})", quote_ident(field), quote_literal(&pattern)))
			}
			_ => Some(NEVER.to_string()),
		},
	}
}

/// `None` when the predicate places no constraint (match-all).
pub fn to_sql(schema: &CollectionSchema, predicate: &FilterPredicate) -> Result<Option<String>> {
	predicate.validate()?;
	let parts: Vec<String> = predicate
		.conjuncts
		.iter()
		.filter_map(|c| clause_sql(schema, c))
		.map(|sql| format!("({sql})"))
		.collect();
	Ok(if parts.is_empty() { None } else { Some(parts.join(" AND ")) })
}

#[cfg(test)]
mod tests {
	use super::*;
	use cinedb_core::error::Error;
	use cinedb_core::filter::build;

	fn movies() -> CollectionSchema { CollectionSchema::movies(4) }

	#[test]
	fn empty_predicate_has_no_filter() {
		assert_eq!(to_sql(&movies(), &FilterPredicate::match_all()).unwrap(), None);
	}

	#[test]
	fn scenario_predicate_sql() {
		let sql = to_sql(&movies(), &build(Some((1990, 2024)), Some(7.5), None)).unwrap().unwrap();
		assert_eq!(sql, "(`Released_Year` >= 1990 AND `Released_Year` <= 2024) AND (`IMDB_Rating` > 7.5)");
	}

	#[test]
	fn phrase_becomes_word_boundary_regex() {
		let sql = to_sql(&movies(), &build(None, None, Some("Spider-Man"))).unwrap().unwrap();
		assert_eq!(
			sql,
			r"(regexp_like(lower(`Series_Title`), '(^|[^\p{Alphabetic}\p{N}])spider[^\p{Alphabetic}\p{N}]+man([^\p{Alphabetic}\p{N}]|$)'))"
		);
		// punctuation and extra whitespace only change the split, not the tokens
		let spaced = to_sql(&movies(), &build(None, None, Some("  spider   man "))).unwrap();
		assert_eq!(spaced, Some(sql));
	}

	#[test]
	fn quotes_never_reach_the_literal() {
		let sql = to_sql(&movies(), &build(None, None, Some("Schindler's List"))).unwrap().unwrap();
		assert!(sql.contains("schindler[^"));
		assert!(!sql.contains("''"));
		assert_eq!(to_sql(&movies(), &build(None, None, Some(" ? "))).unwrap().unwrap(), "(1 = 0)");
	}

	#[test]
	fn clauses_on_wrong_or_unknown_columns_never_match() {
		let on_title = FilterPredicate::match_all().and(Clause::NumericRange(NumericRange {
			field: "Series_Title".into(), min: Some(0.0), max: None, inclusive_min: true, inclusive_max: true,
		}));
		assert_eq!(to_sql(&movies(), &on_title).unwrap().unwrap(), "(1 = 0)");

		let unknown = FilterPredicate::match_all().and(Clause::NumericRange(NumericRange {
			field: "Budget".into(), min: Some(1.0), max: None, inclusive_min: true, inclusive_max: true,
		}));
		assert_eq!(to_sql(&movies(), &unknown).unwrap().unwrap(), "(1 = 0)");

		let phrase_on_year = FilterPredicate::match_all()
			.and(Clause::PhraseMatch { field: "Released_Year".into(), phrase: "1999".into() });
		assert_eq!(to_sql(&movies(), &phrase_on_year).unwrap().unwrap(), "(1 = 0)");
	}

	#[test]
	fn non_finite_bound_is_rejected() {
		let p = build(None, Some(f64::NAN), None);
		assert!(matches!(to_sql(&movies(), &p), Err(Error::InvalidArgument(_))));
	}
}
