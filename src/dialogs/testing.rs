use std::cell::RefCell;
use std::rc::Rc;

use super::DialogClosedCallback;

/// Records every `(accepted, user_input)` pair a callback receives.
#[derive(Clone, Default)]
pub struct CallbackLog {
    calls: Rc<RefCell<Vec<(bool, String)>>>,
}

impl CallbackLog {
    pub fn callback(&self) -> DialogClosedCallback {
        let calls = Rc::clone(&self.calls);
        Box::new(move |accepted, user_input| calls.borrow_mut().push((accepted, user_input)))
    }

    pub fn calls(&self) -> Vec<(bool, String)> {
        self.calls.borrow().clone()
    }
}
