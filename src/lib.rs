// Library exports for embedders and tests

pub mod dialogs;
pub mod replay;

// Re-export commonly used types
pub use dialogs::{
    DialogDisposition, DialogKind, DialogPage, DialogPolicy, DialogRequest, DialogSession,
    FocusTracker, JavaScriptDialog, JavaScriptDialogFactory,
};
