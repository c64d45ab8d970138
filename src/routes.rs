// Route builders for host-driven navigation
// Pure string construction; the views behind these paths are rendered
// elsewhere

use crate::store::SiteRef;

pub const READER: &str = "/read";
pub const PROFILE: &str = "/me";
pub const HELP: &str = "/help";

/// Stats view for a selected site, or the generic stats view when no
/// site is selected.
pub fn stats_path(site: Option<&SiteRef>) -> String {
    match site.and_then(|s| s.slug.as_deref()) {
        Some(slug) => format!("/stats/day/{slug}"),
        None => "/stats/day".to_string(),
    }
}

/// Post-creation view for a selected site, or the generic editor when
/// no site is selected.
pub fn new_post_path(site: Option<&SiteRef>) -> String {
    match site.and_then(|s| s.slug.as_deref()) {
        Some(slug) => format!("/post/{slug}"),
        None => "/post".to_string(),
    }
}
