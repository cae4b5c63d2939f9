//! Circonus tags (`category:value`).

use regex::Regex;

use crate::error::{Error, Result};

/// A tag is a category, optionally followed by `:` and a value. Commas are
/// the API's list separator and never valid inside a tag.
pub const TAG_REGEX: &str = r"^[^:,\s]+(:[^,]*)?$";

/// Check one tag.
///
/// # Errors
///
/// Returns a validation error when the tag is empty or malformed.
pub fn validate(tag: &str) -> Result<()> {
    let re = Regex::new(TAG_REGEX).map_err(|e| Error::provider_bug(format!("tag pattern: {e}")))?;
    if re.is_match(tag) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid tag {tag:?}: expected \"category\" or \"category:value\""
        )))
    }
}

/// Sort and de-duplicate tags so set semantics survive a round trip.
#[must_use]
pub fn normalize<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = tags.into_iter().map(Into::into).collect();
    out.sort();
    out.dedup();
    out
}
