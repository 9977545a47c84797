//! Post invariants that do not depend on storage.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::entities::PostWithRelations;
use crate::domain::error::DomainError;
use crate::domain::slug::{derive_slug, is_url_safe};

/// Trim tag names, drop blanks and duplicates, keep first-seen order.
pub fn normalize_tag_names(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Resolve the slug to store for a post.
///
/// A blank request derives the slug from the title; anything else must
/// already be canonical.
pub fn resolve_slug(requested: &str, title: &str) -> Result<String, DomainError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return derive_slug(title).map_err(|err| DomainError::validation(err.to_string()));
    }

    if !is_url_safe(requested) {
        return Err(DomainError::validation(format!(
            "slug `{requested}` must be lowercase letters, digits and single hyphens"
        )));
    }

    Ok(requested.to_string())
}

/// Rank `candidates` by the number of tags shared with `anchor_tags`.
///
/// Posts sharing no tag and the anchor itself are dropped. The sort is
/// stable, so equally related posts keep the incoming (date) order.
pub fn rank_related(
    anchor_id: Uuid,
    anchor_tags: &[String],
    candidates: Vec<PostWithRelations>,
    limit: usize,
) -> Vec<PostWithRelations> {
    let mut scored: Vec<(usize, PostWithRelations)> = candidates
        .into_iter()
        .filter(|candidate| candidate.post.id != anchor_id)
        .filter_map(|candidate| {
            let shared = anchor_tags
                .iter()
                .filter(|tag| candidate.has_tag(tag))
                .count();
            (shared > 0).then_some((shared, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, post)| post)
        .collect()
}
