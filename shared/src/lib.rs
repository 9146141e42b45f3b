pub mod config;
pub mod error;
pub mod pagination;
pub mod rules;
pub mod validation;

pub use config::*;
pub use error::*;
pub use pagination::{
    format_pagination, format_response, Condition, Links, PageQuery, Pagination,
    PaginationRequest, PaginationValidator, ResponseEnvelope, SortDirection,
};
pub use rules::{FieldValue, RuleDescriptor, RuleFn, RuleRegistry};
pub use validation::{Annotated, FieldAnnotation, FieldFailure, ValidationResult, Validator};
