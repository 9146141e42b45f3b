use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{PaginationPolicy, CONDITIONS, SORT_DIRECTIONS};
use crate::error::{DispatchError, RuleError, ValidationError};
use crate::rules::{FieldValue, RuleRegistry};
use crate::validation::{ValidationResult, Validator};

pub const PAGE: &str = "page";
pub const RECORDS_PER_PAGE: &str = "records_per_page";
pub const CONDITION: &str = "condition";
pub const SORT_ORDER: &str = "sort_order";

/// Raw paging parameters as they arrive on the query string.
///
/// Every field is optional; an empty string means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationRequest {
    pub page: String,
    pub records_per_page: String,
    pub condition: String,
    #[serde(rename = "sort_order")]
    pub sort_direction: String,
}

/// How filter clauses are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Condition {
    #[default]
    And,
    Or,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::And => "AND",
            Condition::Or => "OR",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Condition::And),
            "OR" => Ok(Condition::Or),
            _ => Err(format!("Unknown condition: {}", s)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed paging parameters with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: i64,
    pub records_per_page: i64,
    pub condition: Condition,
    pub sort: SortDirection,
}

impl PageQuery {
    /// Rows to skip for the current page.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.records_per_page)
    }

    pub fn limit(&self) -> i64 {
        self.records_per_page
    }
}

impl PaginationRequest {
    /// Apply defaults. Values outside the policy fall back to the default too,
    /// so only call this on a request that already passed validation.
    pub fn resolve(&self, policy: &PaginationPolicy) -> PageQuery {
        let page = self
            .page
            .parse::<i64>()
            .ok()
            .filter(|page| *page >= policy.min_page)
            .unwrap_or(policy.default_page);
        let records_per_page = self
            .records_per_page
            .parse::<i64>()
            .ok()
            .filter(|size| {
                (policy.min_records_per_page..=policy.max_records_per_page).contains(size)
            })
            .unwrap_or(policy.default_records_per_page);

        PageQuery {
            page,
            records_per_page,
            condition: self.condition.parse().unwrap_or_default(),
            sort: self.sort_direction.parse().unwrap_or_default(),
        }
    }
}

/// Validates the four paging parameters against a [`PaginationPolicy`].
///
/// Each field holds at most one message. When several checks fail on the
/// same field the last one wins: `records_per_page` runs its lower bound
/// before its upper bound, so a failing upper bound replaces a failing lower
/// bound.
#[derive(Debug, Clone)]
pub struct PaginationValidator {
    registry: Arc<RuleRegistry>,
    policy: PaginationPolicy,
}

impl Default for PaginationValidator {
    fn default() -> Self {
        Self::new(Arc::new(RuleRegistry::default()), PaginationPolicy::default())
    }
}

impl PaginationValidator {
    pub fn new(registry: Arc<RuleRegistry>, policy: PaginationPolicy) -> Self {
        Self { registry, policy }
    }

    /// Share the registry of an existing dispatcher.
    pub fn from_validator(validator: &Validator, policy: PaginationPolicy) -> Self {
        Self::new(Arc::clone(validator.registry()), policy)
    }

    pub fn policy(&self) -> &PaginationPolicy {
        &self.policy
    }

    pub fn validate(&self, request: &PaginationRequest) -> Result<ValidationResult, DispatchError> {
        let mut result = ValidationResult::new();
        let policy = &self.policy;

        self.integer_field(
            &mut result,
            PAGE,
            &request.page,
            &[("min", policy.min_page)],
        )?;
        self.integer_field(
            &mut result,
            RECORDS_PER_PAGE,
            &request.records_per_page,
            &[
                ("min", policy.min_records_per_page),
                ("max", policy.max_records_per_page),
            ],
        )?;

        if !request.condition.is_empty() {
            self.apply(
                &mut result,
                CONDITION,
                FieldValue::Text(&request.condition),
                "enum",
                &CONDITIONS.join("|"),
            )?;
        }
        if !request.sort_direction.is_empty() {
            self.apply(
                &mut result,
                SORT_ORDER,
                FieldValue::Text(&request.sort_direction),
                "enum",
                &SORT_DIRECTIONS.join("|"),
            )?;
        }

        if !result.is_empty() {
            tracing::debug!(
                fields = ?result.fields().collect::<Vec<_>>(),
                "pagination request rejected"
            );
        }
        Ok(result)
    }

    /// Validate, then resolve into a [`PageQuery`].
    pub fn check(&self, request: &PaginationRequest) -> Result<PageQuery, ValidationError> {
        self.validate(request)?.into_result()?;
        Ok(request.resolve(&self.policy))
    }

    fn integer_field(
        &self,
        result: &mut ValidationResult,
        field: &'static str,
        raw: &str,
        bounds: &[(&str, i64)],
    ) -> Result<(), DispatchError> {
        if raw.is_empty() {
            return Ok(());
        }
        let Ok(value) = raw.parse::<i64>() else {
            result.set(field, "should be a number");
            return Ok(());
        };
        for (rule, bound) in bounds {
            self.apply(
                result,
                field,
                FieldValue::Integer(value),
                rule,
                &bound.to_string(),
            )?;
        }
        Ok(())
    }

    fn apply(
        &self,
        result: &mut ValidationResult,
        field: &'static str,
        value: FieldValue<'_>,
        rule_name: &str,
        parameter: &str,
    ) -> Result<(), DispatchError> {
        let rule = self
            .registry
            .resolve(rule_name)
            .ok_or_else(|| DispatchError::UnknownRule {
                field: field.to_string(),
                rule: rule_name.to_string(),
            })?;

        match rule(&value, parameter) {
            Ok(()) => Ok(()),
            Err(RuleError::Violation(message)) => {
                result.set(field, message);
                Ok(())
            }
            Err(source) => Err(DispatchError::Misconfigured {
                field: field.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: &str, size: &str, condition: &str, sort: &str) -> PaginationRequest {
        PaginationRequest {
            page: page.to_string(),
            records_per_page: size.to_string(),
            condition: condition.to_string(),
            sort_direction: sort.to_string(),
        }
    }

    fn validate(req: &PaginationRequest) -> ValidationResult {
        PaginationValidator::default().validate(req).unwrap()
    }

    #[test]
    fn test_empty_request_is_valid_and_defaults_apply() {
        let validator = PaginationValidator::default();
        let req = PaginationRequest::default();
        assert!(validator.validate(&req).unwrap().is_empty());

        let query = validator.check(&req).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.records_per_page, 10);
        assert_eq!(query.condition, Condition::And);
        assert_eq!(query.sort, SortDirection::Asc);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_valid_request_resolves() {
        let query = PaginationValidator::default()
            .check(&request("3", "25", "OR", "DESC"))
            .unwrap();
        assert_eq!(
            query,
            PageQuery {
                page: 3,
                records_per_page: 25,
                condition: Condition::Or,
                sort: SortDirection::Desc,
            }
        );
        assert_eq!(query.offset(), 50);
        assert_eq!(query.limit(), 25);
    }

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        let query = PaginationValidator::default()
            .check(&request(&i64::MAX.to_string(), "50", "", ""))
            .unwrap();
        assert_eq!(query.page, i64::MAX);
        assert_eq!(query.offset(), i64::MAX);
        assert_eq!(query.limit(), 50);
    }

    #[test]
    fn test_page_not_a_number() {
        let result = validate(&request("two", "", "", ""));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(PAGE).unwrap(), &["should be a number"]);
    }

    #[test]
    fn test_page_below_minimum() {
        for page in ["0", "-1", "-100"] {
            let result = validate(&request(page, "", "", ""));
            assert_eq!(
                result.get(PAGE).unwrap(),
                &["should be greater than or equal to 1"],
                "page={page}"
            );
        }
        assert!(validate(&request("1", "", "", "")).is_empty());
    }

    #[test]
    fn test_records_per_page_bounds() {
        assert_eq!(
            validate(&request("", "0", "", "")).get(RECORDS_PER_PAGE).unwrap(),
            &["should be greater than or equal to 1"]
        );
        assert_eq!(
            validate(&request("", "51", "", "")).get(RECORDS_PER_PAGE).unwrap(),
            &["should be less than or equal to 50"]
        );
        assert_eq!(
            validate(&request("", "1.5", "", "")).get(RECORDS_PER_PAGE).unwrap(),
            &["should be a number"]
        );
        assert!(validate(&request("", "1", "", "")).is_empty());
        assert!(validate(&request("", "50", "", "")).is_empty());
    }

    #[test]
    fn test_condition_and_sort_order_are_case_sensitive() {
        let result = validate(&request("", "", "and", "desc"));
        assert_eq!(result.get(CONDITION).unwrap(), &["values supported: [AND|OR]"]);
        assert_eq!(result.get(SORT_ORDER).unwrap(), &["values supported: [ASC|DESC]"]);
    }

    #[test]
    fn test_two_violations_give_two_keys() {
        let result = validate(&request("x", "500", "", ""));
        let fields: Vec<&str> = result.fields().collect();
        assert_eq!(fields, vec![PAGE, RECORDS_PER_PAGE]);
        assert!(result.iter().all(|(_, messages)| !messages.is_empty()));
    }

    #[test]
    fn test_last_failing_check_wins_per_field() {
        // an inverted policy makes both bounds fail for the same value
        let policy = PaginationPolicy {
            min_records_per_page: 10,
            max_records_per_page: 5,
            ..PaginationPolicy::default()
        };
        let validator = PaginationValidator::new(Arc::new(RuleRegistry::default()), policy);
        let result = validator.validate(&request("", "7", "", "")).unwrap();
        assert_eq!(
            result.get(RECORDS_PER_PAGE).unwrap(),
            &["should be less than or equal to 5"]
        );
    }

    #[test]
    fn test_missing_bound_rule_is_a_dispatch_error() {
        let validator =
            PaginationValidator::new(Arc::new(RuleRegistry::empty()), PaginationPolicy::default());
        let err = validator.check(&request("2", "", "", "")).unwrap_err();
        assert_eq!(err.code(), "validation_error");
        // empty fields never reach the registry
        assert!(validator.validate(&PaginationRequest::default()).is_ok());
    }

    #[test]
    fn test_check_reports_invalid_model() {
        let err = PaginationValidator::default()
            .check(&request("0", "", "", "UP"))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_model");
        assert_eq!(err.details().unwrap().len(), 2);
    }

    #[test]
    fn test_deserialize_from_query_names() {
        let req: PaginationRequest = serde_json::from_value(serde_json::json!({
            "page": "2",
            "sort_order": "DESC"
        }))
        .unwrap();
        assert_eq!(req.page, "2");
        assert_eq!(req.sort_direction, "DESC");
        assert!(req.records_per_page.is_empty());
    }
}
