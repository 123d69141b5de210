use serde::{Deserialize, Serialize};
use url::Url;

use super::request::DialogKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleMessageLevel {
    Verbose,
    Info,
    Warning,
    Error,
}

/// Focus and visibility of the surface a page renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub has_focus: bool,
    pub is_showing: bool,
}

/// The page a [`DialogSession`](super::DialogSession) acts for.
pub trait DialogPage {
    /// State of the page's current rendering surface. When the page is
    /// fullscreen this should describe the fullscreen surface. `None`
    /// means the page has no surface and can never be foreground.
    fn view_state(&self) -> Option<ViewState>;

    /// URL of the last committed navigation; the origin shown by
    /// before-unload dialogs.
    fn last_committed_url(&self) -> Url;

    fn add_console_message(&self, _level: ConsoleMessageLevel, _message: &str) {}
}

pub(crate) fn unsupported_message(kind: DialogKind) -> String {
    format!(
        "A window.{kind}() dialog requested by this page was suppressed because the \
         embedding view does not support displaying dialogs"
    )
}

pub(crate) fn not_focused_message(kind: DialogKind) -> String {
    format!(
        "A window.{kind}() dialog requested by this page was suppressed because the \
         embedding view does not have active focus. Please ensure that dialogs are \
         requested based on user interactions"
    )
}

pub(crate) const BEFORE_UNLOAD_UNSUPPORTED_MESSAGE: &str =
    "A beforeunload dialog requested by this page was suppressed because the \
     embedding view does not support displaying dialogs";
