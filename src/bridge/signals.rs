// Signal name catalogue for the host/client bridge
// Host-originated command names, client-originated command names, and
// the internal application-event surface consumed by the bridge

/// Commands the host sends to the client.
pub mod host {
    pub const PAGE_MY_SITES: &str = "page-my-sites";
    pub const PAGE_READER: &str = "page-reader";
    pub const PAGE_PROFILE: &str = "page-profile";
    pub const NEW_POST: &str = "new-post";
    pub const SIGNOUT: &str = "signout";
    pub const TOGGLE_NOTIFICATION_BAR: &str = "toggle-notification-bar";
    pub const CLOSE_NOTIFICATIONS_PANEL: &str = "close-notifications-panel";
    pub const PAGE_HELP: &str = "page-help";
    pub const NAVIGATE: &str = "navigate";
    pub const REQUEST_SITE: &str = "request-site";
    pub const ENABLE_SITE_OPTION: &str = "enable-site-option";
}

/// Commands the client sends to the host.
pub mod client {
    pub const UNREAD_NOTICES_COUNT: &str = "unread-notices-count";
    pub const USER_LOGIN_STATUS: &str = "user-login-status";
    pub const USER_AUTH: &str = "user-auth";
    pub const CANNOT_USE_EDITOR: &str = "cannot-use-editor";
    pub const VIEW_POST_CLICKED: &str = "view-post-clicked";
    pub const PRINT: &str = "print";
    pub const EDITOR_LOADED: &str = "editor-loaded";
}

/// Internal application-event surface: signals raised by other client
/// subsystems and consumed by the bridge through the same subscription
/// contract as transport messages.
pub mod notify {
    pub const CANNOT_USE_EDITOR: &str = "desktop-notify-cannot-use-editor";
    pub const VIEW_POST_CLICKED: &str = "desktop-notify-view-post-clicked";
    pub const SEND_TO_PRINTER: &str = "desktop-notify-send-to-printer";
    pub const UNSEEN_COUNT: &str = "desktop-notify-unseen-count";
    pub const DID_REQUEST_SITE: &str = "desktop-did-request-site";
    pub const DID_ACTIVATE_SITE_MODULE: &str = "desktop-did-activate-site-module";
}

/// Suffix appended to a request signal to form the name of the
/// correlated response command sent back to the host.
pub const RESPONSE_SUFFIX: &str = "-response";
