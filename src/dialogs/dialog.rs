use url::Url;

use super::focus::PageId;
use super::request::{DialogId, DialogKind};

/// A dialog widget supplied by the embedding UI toolkit.
pub trait JavaScriptDialog {
    fn show(&mut self);
    fn hide(&mut self);
    /// Text currently entered in a prompt dialog. Only queried for prompts.
    fn current_prompt_text(&self) -> String;
}

/// Builds dialog widgets on behalf of a page.
///
/// Returning `None` means the embedder cannot display this dialog. The
/// `client` token must be handed back to the owning
/// [`DialogSession`](super::DialogSession) through
/// [`close_dialog`](super::DialogSession::close_dialog) when the user
/// answers the dialog.
pub trait JavaScriptDialogFactory {
    fn create_dialog(
        &self,
        client: DialogClient,
        origin_url: &Url,
        kind: DialogKind,
        message_text: &str,
        default_prompt_text: &str,
    ) -> Option<Box<dyn JavaScriptDialog>>;

    fn create_before_unload_dialog(
        &self,
        client: DialogClient,
        origin_url: &Url,
    ) -> Option<Box<dyn JavaScriptDialog>>;
}

/// Routes a UI response back to the dialog that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogClient {
    page: PageId,
    dialog: DialogId,
}

impl DialogClient {
    pub(crate) fn new(page: PageId, dialog: DialogId) -> Self {
        Self { page, dialog }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn dialog(&self) -> DialogId {
        self.dialog
    }
}
