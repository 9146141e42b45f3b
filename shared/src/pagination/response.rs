use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use super::request::{PAGE, RECORDS_PER_PAGE};
use crate::config::EngineConfig;

/// Navigation links, each a fully-qualified URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// Paging metadata returned alongside a list payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_records: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub records_per_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_pages: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// `{ "data": ..., "pagination": ... }`, either part omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Query parameters keyed by name, encoded in sorted key order.
#[derive(Debug, Clone, Default)]
struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        let mut params = BTreeMap::<String, Vec<String>>::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Self(params)
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn set(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), vec![value.to_string()]);
    }

    fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.0 {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// Split a request target (absolute URL or origin-form) into path and query.
fn split_target(original_url: &str) -> (String, String) {
    if let Ok(parsed) = Url::parse(original_url) {
        return (
            parsed.path().to_string(),
            parsed.query().unwrap_or_default().to_string(),
        );
    }
    let target = original_url.split('#').next().unwrap_or_default();
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    }
}

fn nonzero_or(raw: Option<&str>, default: i64) -> i64 {
    match raw.and_then(|value| value.parse::<i64>().ok()) {
        Some(0) | None => default,
        Some(value) => value,
    }
}

/// Build the pagination envelope for `original_url` given the total count.
///
/// `page` and `records_per_page` are read back from the URL; missing,
/// unparsable or zero values fall back to the policy defaults. Links are
/// `config.domain` + path + `?` + the re-encoded query.
pub fn format_pagination(
    config: &EngineConfig,
    original_url: &str,
    total_records: i64,
) -> Pagination {
    let policy = &config.pagination;
    let (path, query) = split_target(original_url);
    let params = QueryParams::parse(&query);

    let current_page = nonzero_or(params.first(PAGE), policy.default_page);
    let records_per_page = nonzero_or(
        params.first(RECORDS_PER_PAGE),
        policy.default_records_per_page,
    );
    let total_pages = (total_records as f64 / records_per_page as f64).ceil() as i64;

    let mut pagination = Pagination {
        total_records,
        records_per_page,
        total_pages,
        links: None,
    };
    if total_records == 0 {
        return pagination;
    }

    let base = format!("{}{}?", config.domain, path);
    let link_to = |page: i64| {
        let mut params = params.clone();
        params.set(PAGE, page);
        params.set(RECORDS_PER_PAGE, records_per_page);
        format!("{}{}", base, params.encode())
    };

    let mut links = Links {
        self_link: Some(link_to(current_page)),
        ..Links::default()
    };
    if total_pages > 0 {
        // pages at the ends of the i64 range get no link past them
        if let Some(next) = current_page.checked_add(1).filter(|next| *next <= total_pages) {
            links.next = Some(link_to(next));
        }
        if let Some(previous) = current_page.checked_sub(1).filter(|previous| *previous != 0) {
            links.previous = Some(link_to(previous));
        }
    }
    pagination.links = Some(links);
    pagination
}

/// Wrap `data` and, when the original request URL is known, its pagination.
///
/// Responses without a request URL (single resources, for instance) carry no
/// pagination at all.
pub fn format_response<T>(
    config: &EngineConfig,
    original_url: Option<&str>,
    data: Option<T>,
    count: i64,
) -> ResponseEnvelope<T> {
    ResponseEnvelope {
        data,
        pagination: original_url.map(|url| format_pagination(config, url, count)),
    }
}
