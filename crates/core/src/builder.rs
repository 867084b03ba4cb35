//! Criteria builders: dispatch keyword + segments + parameters → criteria.
//!
//! Each function translates the URI segments that follow one dispatch
//! keyword (the keyword itself already consumed) plus the request's
//! parameter bag into exactly one criterion or search specification.
//! Builders are pure: no I/O, no state, deterministic output.
//!
//! Flags are presence-based booleans (`?STRICT`, `?R`, `?OR`, `?BEFORE`,
//! `?AFTER`, `?INVERSE`): presence alone triggers them, even with an empty
//! value, and absence is the only "false".

use chrono::NaiveDate;

use crate::config::ServiceConfig;
use crate::criteria::{
    CombineMode, Criterion, DateOperator, SearchSpecification, SetKind, SetTerm,
};
use crate::error::{CoreError, CoreResult};
use crate::request::ParamBag;

/// Flag selecting strict (exact) name matching.
pub const FLAG_STRICT: &str = "STRICT";
/// Flag selecting recursive path matching.
pub const FLAG_RECURSIVE: &str = "R";
/// Flag selecting OR combination for term lists.
pub const FLAG_OR: &str = "OR";
/// Flag comparing a single date with `<`.
pub const FLAG_BEFORE: &str = "BEFORE";
/// Flag comparing a single date with `>`.
pub const FLAG_AFTER: &str = "AFTER";
/// Flag inverting the whole search specification.
pub const FLAG_INVERSE: &str = "INVERSE";

/// The first-segment keywords that select a search builder. Any other
/// first segment makes a GET a raw (path, key) lookup.
pub const DISPATCH_KEYWORDS: &[&str] = &[
    "by-name",
    "by-path",
    "by-keywords",
    "by-user",
    "by-group",
    "by-mimetype",
    "by-license",
    "by-date",
    "search",
];

pub fn is_dispatch_keyword(segment: &str) -> bool {
    DISPATCH_KEYWORDS.contains(&segment)
}

fn require_segment<'a>(
    segments: &'a [String],
    keyword: &'static str,
    expected: &'static str,
) -> CoreResult<&'a str> {
    segments
        .first()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(CoreError::MissingSegment { keyword, expected })
}

fn parse_date(value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(value.to_string()))
}

/// Split a comma-separated term list; a `!` prefix marks (and is stripped
/// from) a negated term. Empty items are dropped.
pub fn parse_term_list(raw: &str) -> Vec<SetTerm> {
    raw.split(',')
        .filter(|t| !t.is_empty() && *t != "!")
        .map(|t| match t.strip_prefix('!') {
            Some(stripped) => SetTerm::negated(stripped),
            None => SetTerm::wanted(t),
        })
        .collect()
}

/// Plain comma-separated list, used for create/update keyword and group
/// parameters where negation has no meaning.
pub fn parse_plain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `by-name/{name}` with optional `STRICT`. Without the flag the match is
/// fuzzy (substring).
pub fn by_name(segments: &[String], params: &ParamBag) -> CoreResult<Criterion> {
    let name = require_segment(segments, "by-name", "name")?;
    Ok(Criterion::Name {
        pattern: name.to_string(),
        strict: params.has_flag(FLAG_STRICT),
    })
}

/// `by-path/{segments...}` with optional `R` for recursion. The path may
/// be empty (the store root), which with `R` spans the whole store.
pub fn by_path(segments: &[String], params: &ParamBag) -> CoreResult<Criterion> {
    Ok(Criterion::Path {
        path: segments.join("/"),
        recursive: params.has_flag(FLAG_RECURSIVE),
    })
}

/// `by-keywords/{term,term,...}` with optional `OR`. `!term` negates.
pub fn by_keywords(segments: &[String], params: &ParamBag) -> CoreResult<Criterion> {
    let list = require_segment(segments, "by-keywords", "keyword list")?;
    Ok(Criterion::Set {
        kind: SetKind::Keyword,
        terms: parse_term_list(list),
        mode: term_mode(params),
    })
}

/// `by-group/{group}`: exact-membership criterion, no combinators.
pub fn by_group(segments: &[String], _params: &ParamBag) -> CoreResult<Criterion> {
    let group = require_segment(segments, "by-group", "group")?;
    Ok(Criterion::Set {
        kind: SetKind::Group,
        terms: vec![SetTerm::wanted(group)],
        mode: CombineMode::And,
    })
}

/// `by-user/{user}`: exact match.
pub fn by_user(segments: &[String], _params: &ParamBag) -> CoreResult<Criterion> {
    let user = require_segment(segments, "by-user", "user")?;
    Ok(Criterion::User {
        user: user.to_string(),
    })
}

/// `by-mimetype/{type}/{subtype}`: exact match. MIME types contain a
/// slash, so the remaining segments are joined back together.
pub fn by_mimetype(segments: &[String], _params: &ParamBag) -> CoreResult<Criterion> {
    require_segment(segments, "by-mimetype", "media type")?;
    Ok(Criterion::Mimetype {
        mimetype: segments.join("/"),
    })
}

/// `by-license/{license}`: exact match.
pub fn by_license(segments: &[String], _params: &ParamBag) -> CoreResult<Criterion> {
    let license = require_segment(segments, "by-license", "license")?;
    Ok(Criterion::License {
        license: license.to_string(),
    })
}

/// `by-date/{date1}[/{date2}]` with optional `BEFORE`/`AFTER`.
///
/// Two dates form an inclusive range and the operator is ignored. With a
/// single date, `BEFORE` compares `<`, `AFTER` compares `>`, and neither
/// means `=`. Supplying both flags is an input error.
pub fn by_date(
    segments: &[String],
    params: &ParamBag,
    config: &ServiceConfig,
) -> CoreResult<Criterion> {
    let first = require_segment(segments, "by-date", "date")?;
    let date1 = parse_date(first)?;
    let date2 = segments
        .get(1)
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(s))
        .transpose()?;

    let operator = if date2.is_some() {
        DateOperator::Eq
    } else {
        match (params.has_flag(FLAG_BEFORE), params.has_flag(FLAG_AFTER)) {
            (true, true) => return Err(CoreError::ConflictingDateFlags),
            (true, false) => DateOperator::Lt,
            (false, true) => DateOperator::Gt,
            (false, false) => DateOperator::Eq,
        }
    };

    Ok(Criterion::Date {
        column: config.date_column(),
        from: Some(date1),
        to: date2,
        operator,
    })
}

/// `search[/{term}]`: fuzzy cross-field search or advanced search.
///
/// With a positional term, the term applies simultaneously as a fuzzy name
/// criterion and a keywords-OR criterion, combined with OR. Without one,
/// the whole parameter bag is interpreted as named criteria combined with
/// the configured default mode (overridable per request via `mode=`). An
/// empty bag is the valid "all records" specification.
pub fn search(
    segments: &[String],
    params: &ParamBag,
    config: &ServiceConfig,
) -> CoreResult<SearchSpecification> {
    if let Some(term) = segments.first().filter(|s| !s.is_empty()) {
        let mut spec = SearchSpecification::all().with_mode(CombineMode::Or);
        spec.push(Criterion::Name {
            pattern: term.to_string(),
            strict: false,
        });
        spec.push(Criterion::Set {
            kind: SetKind::Keyword,
            terms: parse_term_list(term),
            mode: CombineMode::Or,
        });
        return Ok(spec);
    }

    search_params(params, config)
}

/// Advanced search: every parameter is a named criterion.
fn search_params(params: &ParamBag, config: &ServiceConfig) -> CoreResult<SearchSpecification> {
    let mut spec = SearchSpecification::all().with_mode(config.default_search_mode());
    let mut date_from: Option<NaiveDate> = None;
    let mut date_to: Option<NaiveDate> = None;

    for (name, value) in params.iter() {
        match name.as_str() {
            "name" => spec.push(Criterion::Name {
                pattern: value.clone(),
                strict: params.has_flag(FLAG_STRICT),
            }),
            "path" => spec.push(Criterion::Path {
                path: value.trim_matches('/').to_string(),
                recursive: params.has_flag(FLAG_RECURSIVE),
            }),
            "keywords" => spec.push(Criterion::Set {
                kind: SetKind::Keyword,
                terms: parse_term_list(value),
                mode: term_mode(params),
            }),
            "group" | "groups" => spec.push(Criterion::Set {
                kind: SetKind::Group,
                terms: parse_term_list(value),
                mode: term_mode(params),
            }),
            "user" => spec.push(Criterion::User {
                user: value.clone(),
            }),
            "mimetype" => spec.push(Criterion::Mimetype {
                mimetype: value.clone(),
            }),
            "license" => spec.push(Criterion::License {
                license: value.clone(),
            }),
            "date" => spec.push(Criterion::Date {
                column: config.date_column(),
                from: Some(parse_date(value)?),
                to: None,
                operator: DateOperator::Eq,
            }),
            "date-from" => date_from = Some(parse_date(value)?),
            "date-to" => date_to = Some(parse_date(value)?),
            "mode" => spec = spec.with_mode(value.parse()?),
            // Flags consumed by the criteria above.
            FLAG_STRICT | FLAG_RECURSIVE | FLAG_OR | FLAG_INVERSE => {}
            other => return Err(CoreError::UnknownParameter(other.to_string())),
        }
    }

    match (date_from, date_to) {
        (Some(from), Some(to)) => spec.push(Criterion::Date {
            column: config.date_column(),
            from: Some(from),
            to: Some(to),
            operator: DateOperator::Eq,
        }),
        (Some(from), None) => spec.push(Criterion::Date {
            column: config.date_column(),
            from: Some(from),
            to: None,
            operator: DateOperator::Gt,
        }),
        (None, Some(to)) => spec.push(Criterion::Date {
            column: config.date_column(),
            from: Some(to),
            to: None,
            operator: DateOperator::Lt,
        }),
        (None, None) => {}
    }

    Ok(spec)
}

fn term_mode(params: &ParamBag) -> CombineMode {
    if params.has_flag(FLAG_OR) {
        CombineMode::Or
    } else {
        CombineMode::And
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::DateColumn;

    fn config() -> ServiceConfig {
        ServiceConfig::new("/", "memory", CombineMode::Or, DateColumn::Created).unwrap()
    }

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn by_name_defaults_to_fuzzy() {
        let criterion = by_name(&segments(&["compte rendu"]), &ParamBag::new()).unwrap();
        assert_eq!(
            criterion,
            Criterion::Name {
                pattern: "compte rendu".into(),
                strict: false
            }
        );
    }

    #[test]
    fn by_name_strict_on_presence_even_with_empty_value() {
        let bag = ParamBag::parse_query("STRICT=");
        let criterion = by_name(&segments(&["report"]), &bag).unwrap();
        assert_eq!(
            criterion,
            Criterion::Name {
                pattern: "report".into(),
                strict: true
            }
        );
    }

    #[test]
    fn by_name_requires_its_segment() {
        let err = by_name(&[], &ParamBag::new()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingSegment {
                keyword: "by-name",
                ..
            }
        ));
    }

    #[test]
    fn by_path_recursion_is_independent_of_depth() {
        let bag = ParamBag::parse_query("R");
        let criterion = by_path(&segments(&["a", "b", "c"]), &bag).unwrap();
        assert_eq!(
            criterion,
            Criterion::Path {
                path: "a/b/c".into(),
                recursive: true
            }
        );

        let criterion = by_path(&segments(&["a", "b", "c"]), &ParamBag::new()).unwrap();
        assert_eq!(
            criterion,
            Criterion::Path {
                path: "a/b/c".into(),
                recursive: false
            }
        );
    }

    #[test]
    fn by_keywords_splits_terms_and_negation() {
        let criterion = by_keywords(&segments(&["foo,!bar"]), &ParamBag::new()).unwrap();
        assert_eq!(
            criterion,
            Criterion::Set {
                kind: SetKind::Keyword,
                terms: vec![SetTerm::wanted("foo"), SetTerm::negated("bar")],
                mode: CombineMode::And,
            }
        );

        let criterion = by_keywords(&segments(&["foo,!bar"]), &ParamBag::parse_query("OR"))
            .unwrap();
        assert_eq!(
            criterion,
            Criterion::Set {
                kind: SetKind::Keyword,
                terms: vec![SetTerm::wanted("foo"), SetTerm::negated("bar")],
                mode: CombineMode::Or,
            }
        );
    }

    #[test]
    fn by_keywords_or_scenario() {
        let criterion =
            by_keywords(&segments(&["foo,bar,couscous"]), &ParamBag::parse_query("OR")).unwrap();
        assert_eq!(
            criterion,
            Criterion::Set {
                kind: SetKind::Keyword,
                terms: vec![
                    SetTerm::wanted("foo"),
                    SetTerm::wanted("bar"),
                    SetTerm::wanted("couscous"),
                ],
                mode: CombineMode::Or,
            }
        );
    }

    #[test]
    fn only_negated_terms_are_well_defined() {
        let criterion =
            by_keywords(&segments(&["!draft,!private"]), &ParamBag::parse_query("OR")).unwrap();
        assert_eq!(
            criterion,
            Criterion::Set {
                kind: SetKind::Keyword,
                terms: vec![SetTerm::negated("draft"), SetTerm::negated("private")],
                mode: CombineMode::Or,
            }
        );
    }

    #[test]
    fn by_mimetype_joins_the_subtype_segment() {
        let criterion = by_mimetype(&segments(&["image", "png"]), &ParamBag::new()).unwrap();
        assert_eq!(
            criterion,
            Criterion::Mimetype {
                mimetype: "image/png".into()
            }
        );
    }

    #[test]
    fn by_date_single_date_defaults_to_eq() {
        let criterion = by_date(&segments(&["2015-02-04"]), &ParamBag::new(), &config()).unwrap();
        assert_eq!(
            criterion,
            Criterion::Date {
                column: DateColumn::Created,
                from: Some(NaiveDate::from_ymd_opt(2015, 2, 4).unwrap()),
                to: None,
                operator: DateOperator::Eq,
            }
        );
    }

    #[test]
    fn by_date_before_and_after_select_the_operator() {
        let before = by_date(
            &segments(&["2015-02-04"]),
            &ParamBag::parse_query("BEFORE"),
            &config(),
        )
        .unwrap();
        assert!(matches!(
            before,
            Criterion::Date {
                operator: DateOperator::Lt,
                to: None,
                ..
            }
        ));

        let after = by_date(
            &segments(&["2015-02-04"]),
            &ParamBag::parse_query("AFTER"),
            &config(),
        )
        .unwrap();
        assert!(matches!(
            after,
            Criterion::Date {
                operator: DateOperator::Gt,
                to: None,
                ..
            }
        ));
    }

    #[test]
    fn by_date_range_ignores_operator_flags() {
        let criterion = by_date(
            &segments(&["2014-07-13", "2015-02-04"]),
            &ParamBag::parse_query("BEFORE"),
            &config(),
        )
        .unwrap();
        assert_eq!(
            criterion,
            Criterion::Date {
                column: DateColumn::Created,
                from: Some(NaiveDate::from_ymd_opt(2014, 7, 13).unwrap()),
                to: Some(NaiveDate::from_ymd_opt(2015, 2, 4).unwrap()),
                operator: DateOperator::Eq,
            }
        );
    }

    #[test]
    fn by_date_rejects_conflicting_flags() {
        let err = by_date(
            &segments(&["2015-02-04"]),
            &ParamBag::parse_query("BEFORE&AFTER"),
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConflictingDateFlags));
    }

    #[test]
    fn by_date_rejects_unparseable_dates() {
        let err = by_date(&segments(&["couscous"]), &ParamBag::new(), &config()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDate(v) if v == "couscous"));
    }

    #[test]
    fn search_term_hits_names_and_keywords() {
        let spec = search(&segments(&["foo,bar"]), &ParamBag::new(), &config()).unwrap();
        assert_eq!(spec.mode, CombineMode::Or);
        assert_eq!(
            spec.criteria,
            vec![
                Criterion::Name {
                    pattern: "foo,bar".into(),
                    strict: false
                },
                Criterion::Set {
                    kind: SetKind::Keyword,
                    terms: vec![SetTerm::wanted("foo"), SetTerm::wanted("bar")],
                    mode: CombineMode::Or,
                },
            ]
        );
    }

    #[test]
    fn search_empty_bag_means_all_records() {
        let spec = search(&[], &ParamBag::new(), &config()).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.mode, CombineMode::Or);
    }

    #[test]
    fn search_bag_maps_named_criteria() {
        let bag = ParamBag::parse_query("name=report&user=jb@example.org&mimetype=image/png");
        let spec = search(&[], &bag, &config()).unwrap();
        assert_eq!(
            spec.criteria,
            vec![
                Criterion::Mimetype {
                    mimetype: "image/png".into()
                },
                Criterion::Name {
                    pattern: "report".into(),
                    strict: false
                },
                Criterion::User {
                    user: "jb@example.org".into()
                },
            ]
        );
    }

    #[test]
    fn search_bag_mode_overrides_the_default() {
        let bag = ParamBag::parse_query("name=report&mode=AND");
        let spec = search(&[], &bag, &config()).unwrap();
        assert_eq!(spec.mode, CombineMode::And);
    }

    #[test]
    fn search_bag_date_bounds_fold_into_one_criterion() {
        let bag = ParamBag::parse_query("date-from=2014-07-13&date-to=2015-02-04");
        let spec = search(&[], &bag, &config()).unwrap();
        assert_eq!(
            spec.criteria,
            vec![Criterion::Date {
                column: DateColumn::Created,
                from: Some(NaiveDate::from_ymd_opt(2014, 7, 13).unwrap()),
                to: Some(NaiveDate::from_ymd_opt(2015, 2, 4).unwrap()),
                operator: DateOperator::Eq,
            }]
        );

        let bag = ParamBag::parse_query("date-from=2014-07-13");
        let spec = search(&[], &bag, &config()).unwrap();
        assert!(matches!(
            spec.criteria[0],
            Criterion::Date {
                operator: DateOperator::Gt,
                to: None,
                ..
            }
        ));

        let bag = ParamBag::parse_query("date-to=2015-02-04");
        let spec = search(&[], &bag, &config()).unwrap();
        assert!(matches!(
            spec.criteria[0],
            Criterion::Date {
                operator: DateOperator::Lt,
                to: None,
                ..
            }
        ));
    }

    #[test]
    fn search_bag_rejects_unknown_parameters() {
        let bag = ParamBag::parse_query("colour=blue");
        let err = search(&[], &bag, &config()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownParameter(p) if p == "colour"));
    }

    #[test]
    fn building_is_deterministic() {
        let bag = ParamBag::parse_query("keywords=foo,!bar&user=jb&OR");
        let first = search(&[], &bag, &config()).unwrap();
        let second = search(&[], &bag, &config()).unwrap();
        assert_eq!(first, second);
    }
}
