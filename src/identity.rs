//! Identity-key derivation.
//!
//! Every [`CatalogRecord`](crate::models::CatalogRecord) gets an id of the
//! form `<provider-tag>:<provider-native-id>`. The native id is the first
//! non-empty candidate of: primary key, alternate edition key, first ISBN,
//! raw title.

use crate::models::Source;

/// Candidate native identifiers for one provider record, in priority order.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCandidates<'a> {
    pub primary: Option<&'a str>,
    pub alternate: Option<&'a str>,
    pub isbns: &'a [String],
    pub title: &'a str,
}

/// Build the identity key for a record from `source`.
pub fn derive_id(source: Source, candidates: IdentityCandidates<'_>) -> String {
    format!("{}:{}", source.as_str(), native_id(candidates))
}

fn native_id(candidates: IdentityCandidates<'_>) -> &str {
    let non_empty = |s: &&str| !s.trim().is_empty();

    candidates
        .primary
        .filter(non_empty)
        .or_else(|| candidates.alternate.filter(non_empty))
        .or_else(|| {
            candidates
                .isbns
                .first()
                .map(String::as_str)
                .filter(non_empty)
        })
        .unwrap_or(candidates.title)
}
