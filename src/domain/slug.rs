//! Slug helpers built on the `slug` crate.
//!
//! Editors may type a slug by hand or leave it blank and let the title decide.
//! Either way the stored value must survive a round trip through
//! [`slugify`] unchanged so it can be used verbatim in URLs.

use slug::slugify;
use thiserror::Error;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Whether `slug` is already in canonical URL-safe form.
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
