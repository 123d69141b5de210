use std::fmt;

use tracing::debug;

use super::dialog::{DialogClient, JavaScriptDialog, JavaScriptDialogFactory};
use super::focus::PageId;
use super::request::{DialogClosedCallback, DialogId, DialogKind, DialogRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Created,
    Shown,
    Completed,
}

/// Owns the UI for a single dialog and resolves its callback exactly once.
///
/// A host is never reused. Once [`HostState::Completed`] is reached every
/// further completion attempt is ignored.
pub struct DialogHost {
    client: DialogClient,
    request: DialogRequest,
    is_before_unload: bool,
    state: HostState,
    callback: Option<DialogClosedCallback>,
    dialog: Option<Box<dyn JavaScriptDialog>>,
}

impl DialogHost {
    /// `callback` is `None` for requests whose page was already answered
    /// (a queued background alert).
    pub fn new(
        page: PageId,
        request: DialogRequest,
        is_before_unload: bool,
        callback: Option<DialogClosedCallback>,
    ) -> Self {
        Self {
            client: DialogClient::new(page, DialogId::next()),
            request,
            is_before_unload,
            state: HostState::Created,
            callback,
            dialog: None,
        }
    }

    pub fn id(&self) -> DialogId {
        self.client.dialog()
    }

    pub fn request(&self) -> &DialogRequest {
        &self.request
    }

    pub fn is_before_unload(&self) -> bool {
        self.is_before_unload
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == HostState::Completed
    }

    /// Builds the dialog through `factory` and puts it on screen.
    ///
    /// Without a factory, or if the factory declines, the callback runs
    /// with `accepted` equal to [`is_before_unload`](Self::is_before_unload)
    /// so an unsupported before-unload dialog never blocks navigation.
    pub fn show(&mut self, factory: Option<&dyn JavaScriptDialogFactory>) -> bool {
        debug_assert_eq!(self.state, HostState::Created);

        let dialog = factory.and_then(|factory| {
            if self.is_before_unload {
                factory.create_before_unload_dialog(self.client, &self.request.origin_url)
            } else {
                factory.create_dialog(
                    self.client,
                    &self.request.origin_url,
                    self.request.kind,
                    &self.request.message_text,
                    &self.request.default_prompt_text,
                )
            }
        });

        let Some(mut dialog) = dialog else {
            self.complete(self.is_before_unload, String::new());
            return false;
        };

        dialog.show();
        self.dialog = Some(dialog);
        self.state = HostState::Shown;
        debug!(target = "dialogs", dialog = %self.id(), kind = %self.request.kind, "dialog shown");
        true
    }

    /// Cancels the dialog on behalf of the page.
    pub fn dismiss(&mut self) {
        debug_assert!(!self.is_completed(), "dismissing a completed dialog");

        if self.complete(false, String::new()) {
            self.hide_dialog();
        }
    }

    /// Closes the dialog on behalf of the embedder. Without an override a
    /// prompt reports whatever text the user has typed so far.
    pub fn handle(&mut self, accepted: bool, prompt_override: Option<&str>) {
        debug_assert!(!self.is_completed(), "handling a completed dialog");

        let user_input = match prompt_override {
            Some(text) => text.to_owned(),
            None => self.current_prompt_text(),
        };

        if self.complete(accepted, user_input) {
            self.hide_dialog();
        }
    }

    /// The dialog's own close notification, e.g. the user pressed OK.
    /// Ignored once the host has completed.
    pub fn on_user_closed(&mut self, accepted: bool, user_input: String) -> bool {
        if !self.complete(accepted, user_input) {
            return false;
        }
        self.hide_dialog();
        true
    }

    fn current_prompt_text(&self) -> String {
        if self.is_before_unload || self.request.kind != DialogKind::Prompt {
            return String::new();
        }
        self.dialog
            .as_ref()
            .map(|dialog| dialog.current_prompt_text())
            .unwrap_or_default()
    }

    fn complete(&mut self, accepted: bool, user_input: String) -> bool {
        if self.is_completed() {
            return false;
        }
        self.state = HostState::Completed;
        debug!(target = "dialogs", dialog = %self.id(), accepted, "dialog completed");

        if let Some(callback) = self.callback.take() {
            callback(accepted, user_input);
        }
        true
    }

    fn hide_dialog(&mut self) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.hide();
        }
    }
}

impl fmt::Debug for DialogHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHost")
            .field("id", &self.id())
            .field("request", &self.request)
            .field("is_before_unload", &self.is_before_unload)
            .field("state", &self.state)
            .field("has_dialog", &self.dialog.is_some())
            .finish()
    }
}
