//! Paging contract: request validation and the response envelope.

mod request;
mod response;

pub use request::{
    Condition, PageQuery, PaginationRequest, PaginationValidator, SortDirection, CONDITION,
    PAGE, RECORDS_PER_PAGE, SORT_ORDER,
};
pub use response::{format_pagination, format_response, Links, Pagination, ResponseEnvelope};
