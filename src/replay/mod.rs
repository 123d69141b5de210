mod recorder;
mod scenario;

pub use recorder::{EventLog, RecordingFactory, ReplayEvent, ScriptedPage};
pub use scenario::{
    HandleStep, NavigateStep, PageSpec, RespondStep, RunBeforeUnloadStep, RunDialogStep, Scenario,
    ScenarioError, ScenarioRunner, Step, ToggleStep,
};
