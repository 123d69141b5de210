use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::dialogs::{
    DialogKind, DialogPage, DialogPolicy, DialogRequest, DialogSession, FocusTracker,
    JavaScriptDialogFactory, PageId,
};

use super::recorder::{EventLog, RecordingFactory, ReplayEvent, ScriptedPage};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown page: {0}")]
    UnknownPage(String),
    #[error("page declared twice: {0}")]
    DuplicatePage(String),
    #[error("page {0} has no dialog to respond to")]
    NoDialog(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    pub name: String,
    pub url: Url,
    #[serde(default = "default_true")]
    pub factory: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunDialogStep {
    pub page: String,
    pub id: String,
    pub kind: DialogKind,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub default_prompt: String,
    /// Defaults to the page's current URL.
    #[serde(default)]
    pub origin: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunBeforeUnloadStep {
    pub page: String,
    pub id: String,
    #[serde(default)]
    pub renderer_initiated: bool,
    #[serde(default)]
    pub user_gesture: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespondStep {
    pub page: String,
    pub accepted: bool,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandleStep {
    pub page: String,
    pub accepted: bool,
    #[serde(default)]
    pub prompt_override: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleStep {
    pub page: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigateStep {
    pub page: String,
    pub url: Url,
}

/// One thing that happens to a page during a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Show(String),
    Hide(String),
    /// The page gains input focus; every other page loses it.
    Focus(String),
    /// The page loses input focus without another page gaining it.
    Blur(String),
    RunDialog(RunDialogStep),
    RunBeforeUnload(RunBeforeUnloadStep),
    /// The user answers the most recently built dialog of the page.
    Respond(RespondStep),
    /// The embedder answers the active dialog of the page.
    Handle(HandleStep),
    Cancel(String),
    Navigate(NavigateStep),
    SetFactory(ToggleStep),
    Decline(ToggleStep),
    ClosePage(String),
    /// Lets every page drop its completed dialogs.
    Idle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub policy: Option<DialogPolicy>,
    pub pages: Vec<PageSpec>,
    /// Steps are written as single-key maps, e.g. `- show: a`.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

struct PageSlot {
    page: Rc<ScriptedPage>,
    factory: Rc<RecordingFactory>,
    session: DialogSession,
}

impl PageSlot {
    fn attach_factory(&mut self, enabled: bool) {
        if enabled {
            let factory: Rc<dyn JavaScriptDialogFactory> = self.factory.clone();
            self.session.set_factory(Some(&factory));
        } else {
            self.session.set_factory(None);
        }
    }
}

/// Drives a set of pages, each with its own dialog session, through a
/// scenario and records what happens.
pub struct ScenarioRunner {
    focus: Rc<FocusTracker>,
    policy: DialogPolicy,
    log: EventLog,
    pages: BTreeMap<String, PageSlot>,
}

impl ScenarioRunner {
    pub fn new(policy: DialogPolicy) -> Self {
        Self {
            focus: Rc::new(FocusTracker::new()),
            policy,
            log: EventLog::default(),
            pages: BTreeMap::new(),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn session(&self, page: &str) -> Option<&DialogSession> {
        self.pages.get(page).map(|slot| &slot.session)
    }

    pub fn add_page(&mut self, spec: &PageSpec) -> Result<PageId, ScenarioError> {
        if self.pages.contains_key(&spec.name) {
            return Err(ScenarioError::DuplicatePage(spec.name.clone()));
        }

        let page = Rc::new(ScriptedPage::new(
            spec.name.clone(),
            spec.url.clone(),
            self.log.clone(),
        ));
        let factory = Rc::new(RecordingFactory::new(spec.name.clone(), self.log.clone()));
        let session = DialogSession::new(page.clone(), Rc::clone(&self.focus), self.policy);
        let page_id = session.page_id();

        let mut slot = PageSlot {
            page,
            factory,
            session,
        };
        slot.attach_factory(spec.factory);
        self.pages.insert(spec.name.clone(), slot);
        Ok(page_id)
    }

    /// Runs every step of `scenario` and returns the recorded events.
    pub fn run(mut self, scenario: &Scenario) -> Result<Vec<ReplayEvent>, ScenarioError> {
        for page in &scenario.pages {
            self.add_page(page)?;
        }
        for step in &scenario.steps {
            self.apply(step)?;
        }
        Ok(self.log.events())
    }

    pub fn apply(&mut self, step: &Step) -> Result<(), ScenarioError> {
        debug!(target = "replay", ?step, "applying step");

        match step {
            Step::Show(name) => {
                let slot = self.slot_mut(name)?;
                slot.page.set_showing(true);
                slot.session.on_shown();
            }
            Step::Hide(name) => {
                let slot = self.slot_mut(name)?;
                slot.page.set_showing(false);
                slot.session.on_hidden();
            }
            Step::Focus(name) => self.focus_page(name)?,
            Step::Blur(name) => {
                let slot = self.slot_mut(name)?;
                slot.page.set_focus(false);
                slot.session.handle_focus_or_visibility_change();
            }
            Step::RunDialog(step) => {
                let slot = self.slot_mut(&step.page)?;
                let origin = step
                    .origin
                    .clone()
                    .unwrap_or_else(|| slot.page.last_committed_url());
                let request =
                    DialogRequest::new(origin, step.kind, &*step.message, &*step.default_prompt);
                let callback = self.log.callback(&step.page, &step.id);
                let disposition = self.slot_mut(&step.page)?.session.run_dialog(request, callback);
                self.log.push(ReplayEvent::Disposition {
                    page: step.page.clone(),
                    request: step.id.clone(),
                    disposition,
                });
            }
            Step::RunBeforeUnload(step) => {
                let callback = self.log.callback(&step.page, &step.id);
                let disposition = self.slot_mut(&step.page)?.session.run_before_unload_dialog(
                    step.renderer_initiated,
                    step.user_gesture,
                    callback,
                );
                self.log.push(ReplayEvent::Disposition {
                    page: step.page.clone(),
                    request: step.id.clone(),
                    disposition,
                });
            }
            Step::Respond(step) => {
                let slot = self.slot_mut(&step.page)?;
                let client = slot
                    .factory
                    .last_client()
                    .ok_or_else(|| ScenarioError::NoDialog(step.page.clone()))?;
                let responded =
                    slot.session
                        .close_dialog(client.dialog(), step.accepted, step.text.clone());
                self.log.push(ReplayEvent::Responded {
                    page: step.page.clone(),
                    responded,
                });
            }
            Step::Handle(step) => {
                let handled = self
                    .slot_mut(&step.page)?
                    .session
                    .handle_javascript_dialog(step.accepted, step.prompt_override.as_deref());
                self.log.push(ReplayEvent::Handled {
                    page: step.page.clone(),
                    handled,
                });
            }
            Step::Cancel(name) => self.slot_mut(name)?.session.cancel_dialogs(),
            Step::Navigate(step) => {
                let slot = self.slot_mut(&step.page)?;
                slot.session.cancel_dialogs();
                slot.page.navigate(step.url.clone());
            }
            Step::SetFactory(step) => self.slot_mut(&step.page)?.attach_factory(step.enabled),
            Step::Decline(step) => self.slot_mut(&step.page)?.factory.set_declining(step.enabled),
            Step::ClosePage(name) => {
                let slot = self
                    .pages
                    .remove(name)
                    .ok_or_else(|| ScenarioError::UnknownPage(name.clone()))?;
                drop(slot);
            }
            Step::Idle => {
                for slot in self.pages.values_mut() {
                    slot.session.run_until_idle();
                }
            }
        }
        Ok(())
    }

    fn focus_page(&mut self, name: &str) -> Result<(), ScenarioError> {
        if !self.pages.contains_key(name) {
            return Err(ScenarioError::UnknownPage(name.to_string()));
        }

        // Only one page holds input focus at a time.
        let mut lost_focus = Vec::new();
        for (other, slot) in &self.pages {
            if other != name && slot.page.has_focus() {
                slot.page.set_focus(false);
                lost_focus.push(slot.session.page_id());
            }
        }

        let slot = self.slot_mut(name)?;
        slot.page.set_focus(true);
        let previous = slot.session.on_focus_gained();

        lost_focus.extend(previous);
        lost_focus.sort();
        lost_focus.dedup();
        for slot in self.pages.values_mut() {
            if lost_focus.contains(&slot.session.page_id()) {
                slot.session.handle_focus_or_visibility_change();
            }
        }
        Ok(())
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut PageSlot, ScenarioError> {
        self.pages
            .get_mut(name)
            .ok_or_else(|| ScenarioError::UnknownPage(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps() {
        let scenario = Scenario::from_yaml(
            r#"
pages:
  - name: a
    url: https://a.test/
  - name: b
    url: https://b.test/
    factory: false
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: first
      kind: prompt
      message: Enter name
      default_prompt: Bob
  - respond:
      page: a
      accepted: true
      text: Alice
  - idle
"#,
        )
        .unwrap();

        assert_eq!(scenario.pages.len(), 2);
        assert!(!scenario.pages[1].factory);
        assert_eq!(scenario.steps.len(), 5);
        assert!(matches!(
            &scenario.steps[2],
            Step::RunDialog(RunDialogStep { kind: DialogKind::Prompt, .. })
        ));
        assert!(matches!(scenario.steps[4], Step::Idle));
    }

    #[test]
    fn unknown_page_is_an_error() {
        let mut runner = ScenarioRunner::new(DialogPolicy::default());
        let err = runner.apply(&Step::Show("missing".to_string())).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownPage(name) if name == "missing"));
    }

    #[test]
    fn duplicate_page_is_an_error() {
        let mut runner = ScenarioRunner::new(DialogPolicy::default());
        let spec = PageSpec {
            name: "a".to_string(),
            url: Url::parse("https://a.test/").unwrap(),
            factory: true,
        };
        runner.add_page(&spec).unwrap();
        assert!(matches!(
            runner.add_page(&spec),
            Err(ScenarioError::DuplicatePage(_))
        ));
    }

    #[test]
    fn respond_without_dialog_is_an_error() {
        let mut runner = ScenarioRunner::new(DialogPolicy::default());
        runner
            .add_page(&PageSpec {
                name: "a".to_string(),
                url: Url::parse("https://a.test/").unwrap(),
                factory: true,
            })
            .unwrap();
        let err = runner
            .apply(&Step::Respond(RespondStep {
                page: "a".to_string(),
                accepted: true,
                text: String::new(),
            }))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::NoDialog(_)));
    }
}
