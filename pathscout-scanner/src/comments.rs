//! Endpoint mining in source comments.
//!
//! Each comment line is first tried as a script fragment so that commented-out
//! code is reported the same way live code is. Lines that are not valid script
//! fall back to the bare endpoint heuristic, and so do lines that parse but
//! hold a literal with no reportable context around it.

use crate::classify::looks_like_endpoint;
use crate::error::{Result, ScanError};
use crate::result::EndpointCandidateMatch;
use crate::syntax::{JsParser, SyntaxTree};
use crate::traverse::collect_matches;
use tracing::{debug, error};

/// Scan every comment of an already parsed `source`.
pub fn scan_comments(
    parser: &mut JsParser,
    source: &str,
    tree: &SyntaxTree,
    color_context: bool,
) -> Result<Vec<EndpointCandidateMatch>> {
    let mut matches = Vec::new();
    for comment in tree.comments(source) {
        for line in comment.lines() {
            matches.extend(scan_comment_line(parser, line, color_context)?);
        }
    }
    Ok(matches)
}

/// Scan one comment line. Offsets in the returned matches are relative to the
/// line itself.
pub fn scan_comment_line(
    parser: &mut JsParser,
    line: &str,
    color_context: bool,
) -> Result<Vec<EndpointCandidateMatch>> {
    match parser.parse(line) {
        Ok(fragment) => match collect_matches(line, fragment.statements(), color_context) {
            Err(e @ ScanError::MissingContext { .. }) => {
                error!("Comment line {:?}: {}, using heuristic", line.trim(), e);
                Ok(heuristic_match(line).into_iter().collect())
            }
            other => other,
        },
        Err(e) if e.is_syntax() => {
            debug!("Comment line is not a script fragment ({}), using heuristic", e);
            Ok(heuristic_match(line).into_iter().collect())
        }
        Err(e) => Err(e),
    }
}

fn heuristic_match(line: &str) -> Option<EndpointCandidateMatch> {
    looks_like_endpoint(line).then(|| EndpointCandidateMatch::new(line.trim_start(), line))
}
