pub mod classify;
pub mod comments;
pub mod crawler;
pub mod error;
pub mod html;
pub mod result;
pub mod syntax;
pub mod traverse;

#[cfg(test)]
mod test_logs;

pub use crawler::Crawler;
pub use error::ScanError;
pub use html::{HtmlScriptParseResult, ScriptHandler, html_content_to_parse_result};
pub use result::{CrawlState, EndpointCandidateMatch, LabelFailure, LabelMatches};
pub use traverse::{ScanOptions, find_endpoint_candidates};
