//! Slug derivation.
//!
//! Slugs are stored NOT NULL and unique within their scope, so every save
//! path must end up with a usable slug no matter how little the caller
//! supplied: explicit slug, else slugified title, else a synthesized one.

/// Lower-case, with runs of non-alphanumeric characters collapsed to a
/// single underscore. May return an empty string for degenerate input.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(c.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Guaranteed-nonempty slug for callers that supplied neither a slug nor a
/// usable title.
pub fn synthesized_slug(prefix: &str) -> String {
    let stamp = chrono::Utc::now().timestamp();
    let tail = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{stamp}_{}", &tail[..8])
}

/// Resolve the slug for a save: explicit slug, slugified title, synthesized
/// fallback, in that order, skipping any that degenerate to empty.
pub fn resolve_slug(explicit: Option<&str>, title: &str, prefix: &str) -> String {
    if let Some(s) = explicit {
        let s = slugify(s);
        if !s.is_empty() {
            return s;
        }
    }
    let s = slugify(title);
    if !s.is_empty() {
        return s;
    }
    synthesized_slug(prefix)
}
