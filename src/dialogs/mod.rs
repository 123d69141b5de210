mod dialog;
mod focus;
mod host;
mod page;
mod policy;
mod request;
mod session;

#[cfg(test)]
mod testing;

pub use dialog::{DialogClient, JavaScriptDialog, JavaScriptDialogFactory};
pub use focus::{FocusTracker, PageId};
pub use host::{DialogHost, HostState};
pub use page::{ConsoleMessageLevel, DialogPage, ViewState};
pub use policy::{DialogPolicy, DialogPolicyError, POLICY_ENV_VAR};
pub use request::{DialogClosedCallback, DialogId, DialogKind, DialogRequest};
pub use session::{DialogDisposition, DialogSession, SuppressReason};
