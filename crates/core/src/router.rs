//! Request router: (verb, first URI segment) → storage operation.
//!
//! The router is a pure mapping from an immutable [`RequestContext`] onto
//! one [`Operation`]. File payloads travel out of band: the transport
//! attaches them when it executes the resolved operation against the
//! storage facade.

use serde_json::Value;

use crate::builder;
use crate::config::ServiceConfig;
use crate::criteria::SearchSpecification;
use crate::error::{CoreError, CoreResult};
use crate::request::{ParamBag, RequestContext, Verb};

/// Flag on DELETE keeping the stored bytes while removing the reference.
pub const FLAG_KEEP_FILE: &str = "keepFile";

/// A resolved create operation. The payload itself is supplied by the
/// transport when the operation is executed.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub path: String,
    /// Target key; the adapter assigns one when absent.
    pub key: Option<String>,
    /// Display-name override; defaults to the uploaded filename or key.
    pub name: Option<String>,
    pub keywords: Vec<String>,
    pub groups: Vec<String>,
    pub license: Option<String>,
    pub meta: Option<Value>,
}

/// A resolved update operation. `None` fields leave the stored value
/// untouched; content is replaced only when the transport carries a
/// payload. Content and metadata go to the adapter as one combined call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub path: String,
    pub key: String,
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub license: Option<String>,
    pub meta: Option<Value>,
}

/// One fully resolved storage operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Direct (path, key) lookup retrieving the payload.
    Fetch { path: String, key: String },
    /// Search returning matching records.
    List(SearchSpecification),
    /// Create a stored file.
    Create(CreateRequest),
    /// Replace content and/or metadata of an existing file.
    Update(UpdateRequest),
    /// Remove a file; `keep_bytes` removes only the reference.
    Delete {
        path: String,
        key: String,
        keep_bytes: bool,
    },
    /// Metadata-only read, no payload.
    Attributes { path: String, key: String },
}

/// Resolve a request context into exactly one operation.
pub fn resolve(ctx: &RequestContext, config: &ServiceConfig) -> CoreResult<Operation> {
    match ctx.verb() {
        Verb::Get => resolve_get(ctx, config),
        Verb::Post => {
            let params = ctx.params();
            Ok(Operation::Create(CreateRequest {
                path: ctx.resources().join("/"),
                key: params.get_non_empty("key").map(str::to_string),
                name: params.get_non_empty("name").map(str::to_string),
                keywords: params
                    .get("keywords")
                    .map(builder::parse_plain_list)
                    .unwrap_or_default(),
                groups: params
                    .get("groups")
                    .map(builder::parse_plain_list)
                    .unwrap_or_default(),
                license: params.get_non_empty("license").map(str::to_string),
                meta: parse_meta(params)?,
            }))
        }
        Verb::Put => {
            let (path, key) = pop_key(ctx, "PUT")?;
            let params = ctx.params();
            Ok(Operation::Update(UpdateRequest {
                path,
                key,
                name: params.get_non_empty("name").map(str::to_string),
                keywords: params.get("keywords").map(builder::parse_plain_list),
                groups: params.get("groups").map(builder::parse_plain_list),
                license: params.get_non_empty("license").map(str::to_string),
                meta: parse_meta(params)?,
            }))
        }
        Verb::Delete => {
            let (path, key) = pop_key(ctx, "DELETE")?;
            Ok(Operation::Delete {
                path,
                key,
                keep_bytes: ctx.params().has_flag(FLAG_KEEP_FILE),
            })
        }
        Verb::Options => {
            let (path, key) = pop_key(ctx, "OPTIONS")?;
            Ok(Operation::Attributes { path, key })
        }
    }
}

fn resolve_get(ctx: &RequestContext, config: &ServiceConfig) -> CoreResult<Operation> {
    let resources = ctx.resources();
    let params = ctx.params();

    let Some(first) = resources.first() else {
        return Err(CoreError::EmptyResourcePath);
    };
    let tail = &resources[1..];

    let criterion = match first.as_str() {
        "by-name" => builder::by_name(tail, params)?,
        "by-path" => builder::by_path(tail, params)?,
        "by-keywords" => builder::by_keywords(tail, params)?,
        "by-user" => builder::by_user(tail, params)?,
        "by-group" => builder::by_group(tail, params)?,
        "by-mimetype" => builder::by_mimetype(tail, params)?,
        "by-license" => builder::by_license(tail, params)?,
        "by-date" => builder::by_date(tail, params, config)?,
        "search" => {
            let mut spec = builder::search(tail, params, config)?;
            spec.set_inverse(params.has_flag(builder::FLAG_INVERSE));
            return Ok(Operation::List(spec));
        }
        // Anything else is a raw (path, key) lookup.
        _ => {
            let mut segments = resources.to_vec();
            let key = segments.pop().unwrap_or_default();
            return Ok(Operation::Fetch {
                path: segments.join("/"),
                key,
            });
        }
    };

    let mut spec = SearchSpecification::single(criterion);
    spec.set_inverse(params.has_flag(builder::FLAG_INVERSE));
    Ok(Operation::List(spec))
}

/// Last segment = key, the remainder joined = path.
fn pop_key(ctx: &RequestContext, verb: &'static str) -> CoreResult<(String, String)> {
    let mut segments = ctx.resources().to_vec();
    let key = segments.pop().ok_or(CoreError::MissingKey { verb })?;
    Ok((segments.join("/"), key))
}

fn parse_meta(params: &ParamBag) -> CoreResult<Option<Value>> {
    params
        .get_non_empty("meta")
        .map(|raw| serde_json::from_str(raw).map_err(CoreError::InvalidMeta))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{
        CombineMode, Criterion, DateColumn, DateOperator, SetKind, SetTerm,
    };

    fn config() -> ServiceConfig {
        ServiceConfig::new("/", "memory", CombineMode::Or, DateColumn::Created).unwrap()
    }

    fn get(path: &str, query: Option<&str>) -> RequestContext {
        RequestContext::new("GET", path, query, &config()).unwrap()
    }

    #[test]
    fn get_with_no_segments_is_not_found() {
        let err = resolve(&get("/", None), &config()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyResourcePath));
    }

    #[test]
    fn get_by_date_scenario() {
        let op = resolve(&get("/by-date/2015-02-04", None), &config()).unwrap();
        let Operation::List(spec) = op else {
            panic!("expected a search operation");
        };
        assert_eq!(
            spec.criteria,
            vec![Criterion::Date {
                column: DateColumn::Created,
                from: Some(chrono::NaiveDate::from_ymd_opt(2015, 2, 4).unwrap()),
                to: None,
                operator: DateOperator::Eq,
            }]
        );
        assert!(!spec.inverse);
    }

    #[test]
    fn get_by_keywords_or_scenario() {
        let op = resolve(
            &get("/by-keywords/foo,bar,couscous", Some("OR")),
            &config(),
        )
        .unwrap();
        let Operation::List(spec) = op else {
            panic!("expected a search operation");
        };
        assert_eq!(
            spec.criteria,
            vec![Criterion::Set {
                kind: SetKind::Keyword,
                terms: vec![
                    SetTerm::wanted("foo"),
                    SetTerm::wanted("bar"),
                    SetTerm::wanted("couscous"),
                ],
                mode: CombineMode::Or,
            }]
        );
    }

    #[test]
    fn get_unknown_first_segment_is_a_raw_lookup() {
        let op = resolve(&get("/docs/report/report-2015", None), &config()).unwrap();
        assert_eq!(
            op,
            Operation::Fetch {
                path: "docs/report".into(),
                key: "report-2015".into(),
            }
        );

        // A single segment is a key at the store root.
        let op = resolve(&get("/report-2015", None), &config()).unwrap();
        assert_eq!(
            op,
            Operation::Fetch {
                path: "".into(),
                key: "report-2015".into(),
            }
        );
    }

    #[test]
    fn inverse_flag_is_request_scoped() {
        let op = resolve(&get("/by-name/report", Some("INVERSE")), &config()).unwrap();
        let Operation::List(spec) = op else {
            panic!("expected a search operation");
        };
        assert!(spec.inverse);

        // The next request starts clean.
        let op = resolve(&get("/by-name/report", None), &config()).unwrap();
        let Operation::List(spec) = op else {
            panic!("expected a search operation");
        };
        assert!(!spec.inverse);
    }

    #[test]
    fn post_collects_create_parameters() {
        let ctx = RequestContext::new(
            "POST",
            "/docs/report",
            Some("key=report-2015&keywords=annual,finance&license=CC-BY-SA&meta=%7B%22a%22%3A1%7D"),
            &config(),
        )
        .unwrap();
        let op = resolve(&ctx, &config()).unwrap();
        assert_eq!(
            op,
            Operation::Create(CreateRequest {
                path: "docs/report".into(),
                key: Some("report-2015".into()),
                name: None,
                keywords: vec!["annual".into(), "finance".into()],
                groups: vec![],
                license: Some("CC-BY-SA".into()),
                meta: Some(serde_json::json!({"a": 1})),
            })
        );
    }

    #[test]
    fn post_rejects_malformed_meta() {
        let ctx =
            RequestContext::new("POST", "/docs", Some("meta=notjson"), &config()).unwrap();
        let err = resolve(&ctx, &config()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMeta(_)));
    }

    #[test]
    fn put_takes_the_key_positionally() {
        let ctx = RequestContext::new(
            "PUT",
            "/docs/report/report-2015",
            Some("keywords=annual"),
            &config(),
        )
        .unwrap();
        let op = resolve(&ctx, &config()).unwrap();
        assert_eq!(
            op,
            Operation::Update(UpdateRequest {
                path: "docs/report".into(),
                key: "report-2015".into(),
                name: None,
                keywords: Some(vec!["annual".into()]),
                groups: None,
                license: None,
                meta: None,
            })
        );
    }

    #[test]
    fn put_without_a_key_is_an_input_error() {
        let ctx = RequestContext::new("PUT", "/", None, &config()).unwrap();
        let err = resolve(&ctx, &config()).unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { verb: "PUT" }));
    }

    #[test]
    fn delete_keep_file_scenario() {
        let ctx = RequestContext::new(
            "DELETE",
            "/docs/report/report-2015",
            Some("keepFile"),
            &config(),
        )
        .unwrap();
        let op = resolve(&ctx, &config()).unwrap();
        assert_eq!(
            op,
            Operation::Delete {
                path: "docs/report".into(),
                key: "report-2015".into(),
                keep_bytes: true,
            }
        );
    }

    #[test]
    fn options_is_an_attributes_read() {
        let ctx =
            RequestContext::new("OPTIONS", "/docs/report/report-2015", None, &config()).unwrap();
        let op = resolve(&ctx, &config()).unwrap();
        assert_eq!(
            op,
            Operation::Attributes {
                path: "docs/report".into(),
                key: "report-2015".into(),
            }
        );
    }
}
