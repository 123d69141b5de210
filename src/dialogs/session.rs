use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, warn};

use super::dialog::JavaScriptDialogFactory;
use super::focus::{FocusTracker, PageId};
use super::host::DialogHost;
use super::page::{
    not_focused_message, unsupported_message, ConsoleMessageLevel, DialogPage,
    BEFORE_UNLOAD_UNSUPPORTED_MESSAGE,
};
use super::policy::DialogPolicy;
use super::request::{DialogClosedCallback, DialogId, DialogKind, DialogRequest};

/// Why a request was dropped without showing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// A before-unload dialog is on screen and always wins.
    BeforeUnloadInProgress,
    /// No factory is registered for this page.
    Unsupported,
    /// A confirm or prompt from a page that is not in the foreground.
    NotForeground,
    /// A renderer-initiated before-unload without a user gesture.
    NoUserGesture,
}

/// What became of a dialog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogDisposition {
    /// A dialog is on screen. The callback runs when it closes.
    Shown,
    /// Background alert. The callback already ran with `(true, "")`.
    AutoAccepted,
    /// Background before-unload. The callback already ran with `(false, "")`.
    Blocked,
    /// The factory would not build the dialog. The callback already ran.
    Declined,
    /// Nothing was shown and the callback was dropped without running.
    Suppressed(SuppressReason),
}

impl DialogDisposition {
    pub fn did_suppress(self) -> bool {
        matches!(self, Self::Suppressed(_))
    }
}

struct PendingDialog {
    request: DialogRequest,
    callback: Option<DialogClosedCallback>,
}

/// Decides, for one page, whether and when a script dialog is shown.
///
/// At most one request is held at a time: either pending (waiting for the
/// page to reach the foreground) or active (on screen inside a
/// [`DialogHost`]). Completed hosts are retired and only dropped on the
/// next entry into the session or on [`run_until_idle`](Self::run_until_idle).
pub struct DialogSession {
    page_id: PageId,
    page: Rc<dyn DialogPage>,
    focus: Rc<FocusTracker>,
    policy: DialogPolicy,
    factory: Option<Weak<dyn JavaScriptDialogFactory>>,
    pending: Option<PendingDialog>,
    active: Option<DialogHost>,
    is_displaying_before_unload_dialog: bool,
    retired: Vec<DialogHost>,
}

impl DialogSession {
    pub fn new(page: Rc<dyn DialogPage>, focus: Rc<FocusTracker>, policy: DialogPolicy) -> Self {
        let page_id = focus.register();
        Self {
            page_id,
            page,
            focus,
            policy,
            factory: None,
            pending: None,
            active: None,
            is_displaying_before_unload_dialog: false,
            retired: Vec::new(),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn policy(&self) -> DialogPolicy {
        self.policy
    }

    /// The factory stays owned by the embedder. The session only keeps a
    /// weak reference and treats a dropped factory as unregistered.
    pub fn set_factory(&mut self, factory: Option<&Rc<dyn JavaScriptDialogFactory>>) {
        self.factory = factory.map(Rc::downgrade);
    }

    pub fn factory(&self) -> Option<Rc<dyn JavaScriptDialogFactory>> {
        self.factory.as_ref().and_then(Weak::upgrade)
    }

    pub fn has_pending_dialog(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_active_dialog(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_dialog_id(&self) -> Option<DialogId> {
        self.active.as_ref().map(DialogHost::id)
    }

    pub fn is_displaying_before_unload_dialog(&self) -> bool {
        self.is_displaying_before_unload_dialog
    }

    /// Completed hosts waiting to be dropped.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// True if the page's surface is showing and the page either has
    /// input focus or is the last focused page.
    pub fn is_foreground(&self) -> bool {
        let Some(view) = self.page.view_state() else {
            return false;
        };
        (view.has_focus || self.focus.is_last_focused(self.page_id)) && view.is_showing
    }

    /// Handles `alert()`, `confirm()` and `prompt()` requests from the page.
    pub fn run_dialog(
        &mut self,
        request: DialogRequest,
        callback: DialogClosedCallback,
    ) -> DialogDisposition {
        self.run_until_idle();

        if self.is_displaying_before_unload_dialog {
            debug!(target = "dialogs", page = %self.page_id, kind = %request.kind,
                "suppressed while a beforeunload dialog is showing");
            return DialogDisposition::Suppressed(SuppressReason::BeforeUnloadInProgress);
        }

        if self.factory().is_none() {
            self.report(&unsupported_message(request.kind));
            return DialogDisposition::Suppressed(SuppressReason::Unsupported);
        }

        let foreground = self.is_foreground();
        if !foreground && request.kind != DialogKind::Alert {
            self.report(&not_focused_message(request.kind));
            return DialogDisposition::Suppressed(SuppressReason::NotForeground);
        }

        self.dismiss_pending_or_active();

        if !foreground {
            // Background alerts never block script execution.
            if self.policy.queue_background_alerts {
                self.pending = Some(PendingDialog {
                    request,
                    callback: None,
                });
            }
            callback(true, String::new());
            return DialogDisposition::AutoAccepted;
        }

        self.run_pending_dialog(PendingDialog {
            request,
            callback: Some(callback),
        })
    }

    /// Handles a before-unload confirmation request.
    pub fn run_before_unload_dialog(
        &mut self,
        is_renderer_initiated: bool,
        has_user_gesture: bool,
        callback: DialogClosedCallback,
    ) -> DialogDisposition {
        self.run_until_idle();

        if is_renderer_initiated {
            if !has_user_gesture {
                debug!(target = "dialogs", page = %self.page_id,
                    "beforeunload suppressed without user gesture");
                return DialogDisposition::Suppressed(SuppressReason::NoUserGesture);
            }
            if !self.is_foreground() {
                callback(false, String::new());
                return DialogDisposition::Blocked;
            }
        }

        let Some(factory) = self.factory() else {
            self.report(BEFORE_UNLOAD_UNSUPPORTED_MESSAGE);
            return DialogDisposition::Suppressed(SuppressReason::Unsupported);
        };

        self.dismiss_pending_or_active();

        let request = DialogRequest::before_unload(self.page.last_committed_url());
        let mut host = DialogHost::new(self.page_id, request, true, Some(callback));
        if !host.show(Some(factory.as_ref())) {
            self.retire(host);
            self.report(BEFORE_UNLOAD_UNSUPPORTED_MESSAGE);
            return DialogDisposition::Declined;
        }

        self.active = Some(host);
        self.is_displaying_before_unload_dialog = true;
        DialogDisposition::Shown
    }

    /// Closes the active dialog on the embedder's behalf. Returns `false`
    /// if there is no active dialog.
    pub fn handle_javascript_dialog(&mut self, accepted: bool, prompt_override: Option<&str>) -> bool {
        self.run_until_idle();

        let Some(mut host) = self.active.take() else {
            return false;
        };
        host.handle(accepted, prompt_override);
        self.finish_active(host);
        true
    }

    /// Delivers the user's answer from the dialog identified by `dialog`.
    /// Answers for dialogs that are no longer active are ignored.
    pub fn close_dialog(&mut self, dialog: DialogId, accepted: bool, user_input: String) -> bool {
        self.run_until_idle();

        let Some(mut host) = self.active.take_if(|host| host.id() == dialog) else {
            debug!(target = "dialogs", page = %self.page_id, %dialog, "ignoring close for inactive dialog");
            return false;
        };
        let closed = host.on_user_closed(accepted, user_input);
        self.finish_active(host);
        closed
    }

    /// Drops a pending request and dismisses an active dialog. Used when
    /// the page navigates away or its renderer goes away.
    pub fn cancel_dialogs(&mut self) {
        self.run_until_idle();
        self.dismiss_pending_or_active();
    }

    pub fn on_shown(&mut self) {
        self.handle_focus_or_visibility_change();
    }

    pub fn on_hidden(&mut self) {
        self.handle_focus_or_visibility_change();
    }

    /// Records this page as the last focused page.
    ///
    /// Returns the page that was last focused before, if any. The caller
    /// must call [`handle_focus_or_visibility_change`] on that page's
    /// session since it may just have moved to the background.
    ///
    /// [`handle_focus_or_visibility_change`]: Self::handle_focus_or_visibility_change
    pub fn on_focus_gained(&mut self) -> Option<PageId> {
        let previous = self.focus.focus(self.page_id);
        self.handle_focus_or_visibility_change();
        previous
    }

    /// Promotes a pending request once the page is in the foreground, and
    /// dismisses an active dialog once it is not. Before-unload dialogs
    /// survive the page moving to the background.
    pub fn handle_focus_or_visibility_change(&mut self) {
        self.run_until_idle();

        if self.is_foreground() {
            if let Some(pending) = self.pending.take() {
                debug_assert!(self.active.is_none());
                debug_assert!(!self.is_displaying_before_unload_dialog);
                self.run_pending_dialog(pending);
            }
        } else if self.active.is_some() && !self.is_displaying_before_unload_dialog {
            self.dismiss_active_dialog();
        }
    }

    /// Drops hosts that completed during earlier calls. Returns how many
    /// were dropped.
    pub fn run_until_idle(&mut self) -> usize {
        let retired = std::mem::take(&mut self.retired);
        let count = retired.len();
        drop(retired);
        count
    }

    fn run_pending_dialog(&mut self, pending: PendingDialog) -> DialogDisposition {
        debug_assert!(self.active.is_none());

        let PendingDialog { request, callback } = pending;
        let kind = request.kind;
        let factory = self.factory();
        let mut host = DialogHost::new(self.page_id, request, false, callback);

        if !host.show(factory.as_deref()) {
            self.retire(host);
            self.report(&unsupported_message(kind));
            return DialogDisposition::Declined;
        }

        debug!(target = "dialogs", page = %self.page_id, dialog = %host.id(), "promoted pending dialog");
        self.active = Some(host);
        DialogDisposition::Shown
    }

    fn dismiss_pending_or_active(&mut self) {
        if self.pending.take().is_some() {
            debug_assert!(self.active.is_none());
            debug_assert!(!self.is_displaying_before_unload_dialog);
            debug!(target = "dialogs", page = %self.page_id, "discarded pending dialog");
        } else {
            self.dismiss_active_dialog();
        }
    }

    fn dismiss_active_dialog(&mut self) {
        let Some(mut host) = self.active.take() else {
            debug_assert!(!self.is_displaying_before_unload_dialog);
            return;
        };
        debug_assert!(self.pending.is_none());

        debug!(target = "dialogs", page = %self.page_id, dialog = %host.id(), "dismissing active dialog");
        host.dismiss();
        self.finish_active(host);
    }

    fn finish_active(&mut self, host: DialogHost) {
        self.retire(host);
        self.is_displaying_before_unload_dialog = false;
    }

    fn retire(&mut self, host: DialogHost) {
        debug_assert!(host.is_completed());
        self.retired.push(host);
    }

    fn report(&self, message: &str) {
        warn!(target = "dialogs", page = %self.page_id, "{message}");
        if self.policy.report_to_console {
            self.page
                .add_console_message(ConsoleMessageLevel::Warning, message);
        }
    }
}

impl Drop for DialogSession {
    fn drop(&mut self) {
        // The page is going away; outstanding callbacks are dropped unrun.
        self.focus.unregister(self.page_id);
    }
}

impl fmt::Debug for DialogSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSession")
            .field("page_id", &self.page_id)
            .field("policy", &self.policy)
            .field("has_factory", &self.factory().is_some())
            .field("pending", &self.pending.as_ref().map(|pending| &pending.request))
            .field("active", &self.active)
            .field(
                "is_displaying_before_unload_dialog",
                &self.is_displaying_before_unload_dialog,
            )
            .field("retired", &self.retired.len())
            .finish()
    }
}
