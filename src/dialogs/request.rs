use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use url::Url;

static NEXT_DIALOG_ID: AtomicU64 = AtomicU64::new(1);

/// The flavour of a script-initiated dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    /// `window.alert()`
    Alert,
    /// `window.confirm()`
    Confirm,
    /// `window.prompt()`
    Prompt,
}

impl DialogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Confirm => "confirm",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives `(accepted, user_input)` once the page's request is resolved.
pub type DialogClosedCallback = Box<dyn FnOnce(bool, String)>;

/// A dialog request that has not been put on screen yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRequest {
    pub origin_url: Url,
    pub kind: DialogKind,
    pub message_text: String,
    pub default_prompt_text: String,
}

impl DialogRequest {
    pub fn new(
        origin_url: Url,
        kind: DialogKind,
        message_text: impl Into<String>,
        default_prompt_text: impl Into<String>,
    ) -> Self {
        Self {
            origin_url,
            kind,
            message_text: message_text.into(),
            default_prompt_text: default_prompt_text.into(),
        }
    }

    /// Before-unload dialogs carry no text of their own.
    pub(crate) fn before_unload(origin_url: Url) -> Self {
        Self::new(origin_url, DialogKind::Confirm, String::new(), String::new())
    }
}

/// Identifies one dialog host for its whole lifetime. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DialogId(u64);

impl DialogId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DIALOG_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_window_methods() {
        assert_eq!(DialogKind::Alert.as_str(), "alert");
        assert_eq!(DialogKind::Confirm.to_string(), "confirm");
        assert_eq!(DialogKind::Prompt.as_str(), "prompt");
    }

    #[test]
    fn dialog_ids_are_unique() {
        let first = DialogId::next();
        let second = DialogId::next();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn before_unload_request_has_no_text() {
        let url = Url::parse("https://example.com/").unwrap();
        let request = DialogRequest::before_unload(url.clone());
        assert_eq!(request.origin_url, url);
        assert!(request.message_text.is_empty());
        assert!(request.default_prompt_text.is_empty());
    }
}
