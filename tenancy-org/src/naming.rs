//! Tenant collection naming
//!
//! Every organization owns one collection in the tenant database. Its name
//! is derived from the organization name so that the same organization
//! always maps to the same collection, and so that the result is safe to
//! splice into a query as a bare identifier.

/// Prefix shared by every tenant collection.
pub const COLLECTION_PREFIX: &str = "org_";

/// Derive the tenant collection name for an organization.
///
/// The name is trimmed and lowercased, spaces become underscores and any
/// other character outside `[a-z0-9_]` is replaced by an underscore.
///
/// # Examples
///
/// ```
/// use tenancy_org::collection_name_for;
///
/// assert_eq!(collection_name_for("Tredence Labs"), "org_tredence_labs");
/// assert_eq!(collection_name_for("  Acme  "), "org_acme");
/// assert_eq!(collection_name_for("A&B Co."), "org_a_b_co_");
/// ```
pub fn collection_name_for(organization_name: &str) -> String {
    let normalized: String = organization_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect();

    format!("{COLLECTION_PREFIX}{normalized}")
}

/// Check that a collection name is one this crate could have produced.
///
/// Backends that interpolate the name into a query must refuse anything
/// that fails this check.
pub fn is_valid_collection_name(name: &str) -> bool {
    name.len() > COLLECTION_PREFIX.len()
        && name.starts_with(COLLECTION_PREFIX)
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
