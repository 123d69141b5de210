use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use url::Url;

use crate::dialogs::{
    ConsoleMessageLevel, DialogClient, DialogClosedCallback, DialogDisposition, DialogId,
    DialogKind, DialogPage, JavaScriptDialog, JavaScriptDialogFactory, ViewState,
};

/// Everything observable about a replayed scenario, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    DialogCreated {
        page: String,
        dialog: DialogId,
        before_unload: bool,
        kind: DialogKind,
        origin: String,
        message: String,
        default_prompt: String,
    },
    DialogDeclined {
        page: String,
        before_unload: bool,
    },
    DialogShown {
        page: String,
        dialog: DialogId,
    },
    DialogHidden {
        page: String,
        dialog: DialogId,
    },
    PromptTextQueried {
        page: String,
        dialog: DialogId,
    },
    DialogDropped {
        page: String,
        dialog: DialogId,
    },
    ConsoleMessage {
        page: String,
        level: ConsoleMessageLevel,
        message: String,
    },
    Callback {
        page: String,
        request: String,
        accepted: bool,
        user_input: String,
    },
    Disposition {
        page: String,
        request: String,
        disposition: DialogDisposition,
    },
    Handled {
        page: String,
        handled: bool,
    },
    /// `false` when the answered dialog was no longer active.
    Responded {
        page: String,
        responded: bool,
    },
}

/// Shared, append-only event list.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ReplayEvent>>>,
}

impl EventLog {
    pub fn push(&self, event: ReplayEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<ReplayEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn count(&self, predicate: impl Fn(&ReplayEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| predicate(event)).count()
    }

    pub fn position(&self, predicate: impl Fn(&ReplayEvent) -> bool) -> Option<usize> {
        self.events.borrow().iter().position(predicate)
    }

    /// A completion callback that records what it receives.
    pub fn callback(&self, page: &str, request: &str) -> DialogClosedCallback {
        let log = self.clone();
        let page = page.to_string();
        let request = request.to_string();
        Box::new(move |accepted, user_input| {
            log.push(ReplayEvent::Callback {
                page,
                request,
                accepted,
                user_input,
            });
        })
    }

    /// `(accepted, user_input)` pairs delivered to `request`'s callback.
    pub fn callbacks_for(&self, request: &str) -> Vec<(bool, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ReplayEvent::Callback {
                    request: name,
                    accepted,
                    user_input,
                    ..
                } if name == request => Some((*accepted, user_input.clone())),
                _ => None,
            })
            .collect()
    }
}

/// A dialog factory that records what it builds instead of drawing it.
#[derive(Debug)]
pub struct RecordingFactory {
    page: String,
    log: EventLog,
    declining: Cell<bool>,
    prompt_text: Rc<RefCell<String>>,
    clients: RefCell<Vec<DialogClient>>,
}

impl RecordingFactory {
    pub fn new(page: impl Into<String>, log: EventLog) -> Self {
        Self {
            page: page.into(),
            log,
            declining: Cell::new(false),
            prompt_text: Rc::new(RefCell::new(String::new())),
            clients: RefCell::new(Vec::new()),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Refuse to build any further dialogs.
    pub fn set_declining(&self, declining: bool) {
        self.declining.set(declining);
    }

    /// Text that open prompt dialogs report as typed by the user.
    pub fn set_prompt_text(&self, text: &str) {
        *self.prompt_text.borrow_mut() = text.to_string();
    }

    /// Client handle of the most recently built dialog.
    pub fn last_client(&self) -> Option<DialogClient> {
        self.clients.borrow().last().copied()
    }

    fn build(
        &self,
        client: DialogClient,
        before_unload: bool,
        kind: DialogKind,
        origin_url: &Url,
        message_text: &str,
        default_prompt_text: &str,
    ) -> Option<Box<dyn JavaScriptDialog>> {
        if self.declining.get() {
            self.log.push(ReplayEvent::DialogDeclined {
                page: self.page.clone(),
                before_unload,
            });
            return None;
        }

        self.log.push(ReplayEvent::DialogCreated {
            page: self.page.clone(),
            dialog: client.dialog(),
            before_unload,
            kind,
            origin: origin_url.to_string(),
            message: message_text.to_string(),
            default_prompt: default_prompt_text.to_string(),
        });
        self.clients.borrow_mut().push(client);

        Some(Box::new(RecordingDialog {
            page: self.page.clone(),
            dialog: client.dialog(),
            log: self.log.clone(),
            prompt_text: Rc::clone(&self.prompt_text),
        }))
    }
}

impl JavaScriptDialogFactory for RecordingFactory {
    fn create_dialog(
        &self,
        client: DialogClient,
        origin_url: &Url,
        kind: DialogKind,
        message_text: &str,
        default_prompt_text: &str,
    ) -> Option<Box<dyn JavaScriptDialog>> {
        self.build(client, false, kind, origin_url, message_text, default_prompt_text)
    }

    fn create_before_unload_dialog(
        &self,
        client: DialogClient,
        origin_url: &Url,
    ) -> Option<Box<dyn JavaScriptDialog>> {
        self.build(client, true, DialogKind::Confirm, origin_url, "", "")
    }
}

struct RecordingDialog {
    page: String,
    dialog: DialogId,
    log: EventLog,
    prompt_text: Rc<RefCell<String>>,
}

impl JavaScriptDialog for RecordingDialog {
    fn show(&mut self) {
        self.log.push(ReplayEvent::DialogShown {
            page: self.page.clone(),
            dialog: self.dialog,
        });
    }

    fn hide(&mut self) {
        self.log.push(ReplayEvent::DialogHidden {
            page: self.page.clone(),
            dialog: self.dialog,
        });
    }

    fn current_prompt_text(&self) -> String {
        self.log.push(ReplayEvent::PromptTextQueried {
            page: self.page.clone(),
            dialog: self.dialog,
        });
        self.prompt_text.borrow().clone()
    }
}

impl Drop for RecordingDialog {
    fn drop(&mut self) {
        self.log.push(ReplayEvent::DialogDropped {
            page: self.page.clone(),
            dialog: self.dialog,
        });
    }
}

/// A page whose focus and visibility are set by hand.
#[derive(Debug)]
pub struct ScriptedPage {
    name: String,
    log: EventLog,
    url: RefCell<Url>,
    view: Cell<Option<ViewState>>,
}

impl ScriptedPage {
    /// Starts with a hidden, unfocused surface.
    pub fn new(name: impl Into<String>, url: Url, log: EventLog) -> Self {
        Self {
            name: name.into(),
            log,
            url: RefCell::new(url),
            view: Cell::new(Some(ViewState::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_showing(&self, showing: bool) {
        let mut view = self.view.get().unwrap_or_default();
        view.is_showing = showing;
        self.view.set(Some(view));
    }

    pub fn set_focus(&self, focused: bool) {
        let mut view = self.view.get().unwrap_or_default();
        view.has_focus = focused;
        self.view.set(Some(view));
    }

    pub fn has_focus(&self) -> bool {
        self.view.get().is_some_and(|view| view.has_focus)
    }

    /// Drops the rendering surface entirely.
    pub fn detach_view(&self) {
        self.view.set(None);
    }

    pub fn navigate(&self, url: Url) {
        *self.url.borrow_mut() = url;
    }
}

impl DialogPage for ScriptedPage {
    fn view_state(&self) -> Option<ViewState> {
        self.view.get()
    }

    fn last_committed_url(&self) -> Url {
        self.url.borrow().clone()
    }

    fn add_console_message(&self, level: ConsoleMessageLevel, message: &str) {
        self.log.push(ReplayEvent::ConsoleMessage {
            page: self.name.clone(),
            level,
            message: message.to_string(),
        });
    }
}
