//! Per-request context: verb, URI segments and parameter bag.
//!
//! A [`RequestContext`] is constructed once per incoming call and passed
//! explicitly through the router and criteria builders. It is immutable;
//! there is no request-global mutable state.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::config::ServiceConfig;
use crate::error::{CoreError, CoreResult};

/// The recognised HTTP verbs. Anything else is a method error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl Verb {
    pub fn parse(method: &str) -> CoreResult<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            "OPTIONS" => Ok(Verb::Options),
            other => Err(CoreError::UnrecognizedMethod(other.to_string())),
        }
    }
}

/// Decoded query parameters.
///
/// Multi-valued parameters collapse to their last value. A parameter that
/// is present without a value (`?STRICT` or `?STRICT=`) is a presence
/// flag: [`ParamBag::has_flag`] reports it even when the value is the
/// empty string. There is no "false" sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    values: BTreeMap<String, String>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse_query(raw: &str) -> Self {
        let mut bag = Self::new();
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            bag.insert(decode(key), decode(&value.replace('+', " ")));
        }
        bag
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The value of `name`, if the parameter is present at all.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The value of `name`, filtered to non-empty strings.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Whether `name` is present, with or without a value.
    pub fn has_flag(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.values.iter()
    }
}

/// Percent-decode a URI component, falling back to the raw text when the
/// escape sequence is malformed.
fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Split a request path into ordered, non-empty, decoded segments.
///
/// The configured base prefix is stripped first; anything after a `?` is
/// ignored. A path outside the base prefix yields no segments.
pub fn split_resources(base_uri: &str, path: &str) -> Vec<String> {
    let path = path.split('?').next().unwrap_or("");
    let base = base_uri.trim_end_matches('/');
    let remainder = path.strip_prefix(base).unwrap_or("");

    remainder
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode)
        .collect()
}

/// Immutable snapshot of one incoming request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    verb: Verb,
    resources: Vec<String>,
    params: ParamBag,
}

impl RequestContext {
    /// Build a context from the transport's raw method, path and query.
    pub fn new(
        method: &str,
        path: &str,
        raw_query: Option<&str>,
        config: &ServiceConfig,
    ) -> CoreResult<Self> {
        let verb = Verb::parse(method)?;
        let resources = split_resources(config.base_uri(), path);
        let params = raw_query.map(ParamBag::parse_query).unwrap_or_default();

        Ok(Self {
            verb,
            resources,
            params,
        })
    }

    /// A context built from already-decomposed parts, mainly for tests.
    pub fn from_parts(verb: Verb, resources: Vec<String>, params: ParamBag) -> Self {
        Self {
            verb,
            resources,
            params,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn params(&self) -> &ParamBag {
        &self.params
    }
}
