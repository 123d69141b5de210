use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a page registered with a [`FocusTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(u64);

impl PageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

/// Remembers which page most recently gained focus.
///
/// Pages that lose direct input focus to a sibling surface (a fullscreen
/// view, for example) keep foreground status while they are the last
/// focused page. One tracker is shared by every session in the process.
#[derive(Debug, Default)]
pub struct FocusTracker {
    next_page: Cell<u64>,
    last_focused: Cell<Option<PageId>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> PageId {
        let id = self.next_page.get() + 1;
        self.next_page.set(id);
        PageId(id)
    }

    /// Clears the last focused page if it is `page`.
    pub fn unregister(&self, page: PageId) {
        if self.last_focused.get() == Some(page) {
            self.last_focused.set(None);
        }
    }

    /// Marks `page` as last focused.
    ///
    /// Returns the page that held that status before, if it was a
    /// different page. That page's foreground status may have changed.
    pub fn focus(&self, page: PageId) -> Option<PageId> {
        self.last_focused
            .replace(Some(page))
            .filter(|previous| *previous != page)
    }

    pub fn is_last_focused(&self, page: PageId) -> bool {
        self.last_focused.get() == Some(page)
    }

    pub fn last_focused(&self) -> Option<PageId> {
        self.last_focused.get()
    }
}
