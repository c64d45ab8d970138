// Pure selectors over the shared state snapshot
// The bridge's only read path into application state

use crate::store::{AppState, SiteId};

/// Whether the notifications panel is currently open.
pub fn is_notifications_open(state: &AppState) -> bool {
    state.notifications_open
}

/// Whether the embedded editor has finished loading.
pub fn is_editor_loaded(state: &AppState) -> bool {
    state.editor_loaded
}

/// The cached unseen-notification count, if one is known.
pub fn unseen_count(state: &AppState) -> Option<i64> {
    state.unseen_count
}

/// Whether the current user may manage options on the given site.
/// Unknown sites report `false`.
pub fn can_manage_site_options(state: &AppState, site_id: SiteId) -> bool {
    state
        .site_capabilities
        .get(&site_id)
        .map(|caps| caps.can_manage_options)
        .unwrap_or(false)
}
