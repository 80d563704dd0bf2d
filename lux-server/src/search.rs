use thiserror::Error;

/// Failure modes for the combined `company+post` query format
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Combined search requires 'company+post' format")]
    MissingDelimiter,
    #[error("Both sides of 'company+post' must be non-empty")]
    EmptyPart,
}

/// How a general search query should be interpreted.
///
/// Exactly two whitespace-separated tokens trigger the exact company/title
/// resolution path; anything else falls through to fuzzy matching over the
/// whole raw query. The raw form is kept on `TwoToken` so the caller can
/// fall back to fuzzy matching when exact resolution finds nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedQuery {
    /// Blank query, list everything
    Empty,
    /// Two tokens: try company-name then post-title exact resolution
    TwoToken {
        company: String,
        post: String,
        raw: String,
    },
    /// Substring filter over company names and post titles
    Fuzzy(String),
}

/// Parse a general search query into its dispatch form.
pub fn parse(raw: &str) -> ParsedQuery {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedQuery::Empty;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() == 2 {
        ParsedQuery::TwoToken {
            company: tokens[0].to_string(),
            post: tokens[1].to_string(),
            raw: trimmed.to_string(),
        }
    } else {
        ParsedQuery::Fuzzy(trimmed.to_string())
    }
}

/// Parse a combined `company+post` query into its two parts.
///
/// The delimiter is the first `+`; both sides are trimmed and must be
/// non-empty. Unlike the general parser this form never falls back, a
/// malformed query is an error.
pub fn parse_combined(raw: &str) -> Result<(String, String), QueryError> {
    let (company, post) = raw.split_once('+').ok_or(QueryError::MissingDelimiter)?;
    let company = company.trim();
    let post = post.trim();
    if company.is_empty() || post.is_empty() {
        return Err(QueryError::EmptyPart);
    }
    Ok((company.to_string(), post.to_string()))
}
