use serde::Deserialize;
use updraft_backend::{FeedParseError, FeedParser, ReleaseCandidate};

/// Parses the JSON appcast.
///
/// The document is either `{ "items": [ ... ] }` or a bare array of items.
/// Each item carries the [`ReleaseCandidate`] fields; unknown fields are
/// ignored and missing optional fields take their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeedParser;

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Wrapped { items: Vec<ReleaseCandidate> },
    Bare(Vec<ReleaseCandidate>),
}

impl FeedParser for JsonFeedParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<ReleaseCandidate>, FeedParseError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(FeedParseError::Empty);
        }

        let document: FeedDocument = serde_json::from_slice(bytes)
            .map_err(|error| FeedParseError::malformed(error.to_string()))?;

        Ok(match document {
            FeedDocument::Wrapped { items } | FeedDocument::Bare(items) => items,
        })
    }
}
