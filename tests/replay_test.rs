use std::fs;

use frontier_dialogs::dialogs::{DialogDisposition, DialogPolicy, SuppressReason};
use frontier_dialogs::replay::{ReplayEvent, Scenario, ScenarioError, ScenarioRunner};
use tempfile::tempdir;

fn run_yaml(contents: &str) -> Vec<ReplayEvent> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.yaml");
    fs::write(&path, contents).unwrap();

    let scenario = Scenario::load(&path).unwrap();
    let policy = scenario.policy.unwrap_or_default();
    ScenarioRunner::new(policy).run(&scenario).unwrap()
}

fn disposition_of(events: &[ReplayEvent], id: &str) -> DialogDisposition {
    events
        .iter()
        .find_map(|event| match event {
            ReplayEvent::Disposition {
                request,
                disposition,
                ..
            } if request == id => Some(*disposition),
            _ => None,
        })
        .unwrap()
}

fn callbacks_of(events: &[ReplayEvent], id: &str) -> Vec<(bool, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Callback {
                request,
                accepted,
                user_input,
                ..
            } if request == id => Some((*accepted, user_input.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn prompt_round_trip_through_user() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: name
      kind: prompt
      message: Enter name
      default_prompt: Bob
  - respond:
      page: a
      accepted: true
      text: Alice
  - idle
"#,
    );

    assert_eq!(disposition_of(&events, "name"), DialogDisposition::Shown);
    assert_eq!(callbacks_of(&events, "name"), vec![(true, "Alice".to_string())]);
    assert!(events.iter().any(|event| matches!(event,
        ReplayEvent::DialogCreated { origin, message, default_prompt, .. }
            if origin == "https://a.test/" && message == "Enter name" && default_prompt == "Bob")));
    assert!(matches!(events.last(), Some(ReplayEvent::DialogDropped { .. })));
}

#[test]
fn background_page_cannot_confirm() {
    let events = run_yaml(
        r#"
pages:
  - name: front
    url: https://front.test/
  - name: back
    url: https://back.test/
steps:
  - show: front
  - focus: front
  - run_dialog:
      page: back
      id: ask
      kind: confirm
      message: Leave?
  - run_dialog:
      page: back
      id: tell
      kind: alert
"#,
    );

    assert_eq!(
        disposition_of(&events, "ask"),
        DialogDisposition::Suppressed(SuppressReason::NotForeground)
    );
    assert!(callbacks_of(&events, "ask").is_empty());
    assert_eq!(disposition_of(&events, "tell"), DialogDisposition::AutoAccepted);
    assert_eq!(callbacks_of(&events, "tell"), vec![(true, String::new())]);
    assert!(events.iter().any(|event| matches!(event,
        ReplayEvent::ConsoleMessage { page, .. } if page == "back")));
}

#[test]
fn focus_switch_dismisses_other_page_dialog() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
  - name: b
    url: https://b.test/
steps:
  - show: a
  - show: b
  - focus: a
  - run_dialog:
      page: a
      id: question
      kind: confirm
  - focus: b
"#,
    );

    assert_eq!(disposition_of(&events, "question"), DialogDisposition::Shown);
    assert_eq!(callbacks_of(&events, "question"), vec![(false, String::new())]);
}

#[test]
fn queued_alert_policy_from_scenario() {
    let events = run_yaml(
        r#"
policy:
  queue_background_alerts: true
pages:
  - name: a
    url: https://a.test/
steps:
  - run_dialog:
      page: a
      id: note
      kind: alert
      message: Saved
  - show: a
  - focus: a
"#,
    );

    assert_eq!(disposition_of(&events, "note"), DialogDisposition::AutoAccepted);
    assert!(events.iter().any(|event| matches!(event,
        ReplayEvent::DialogShown { page, .. } if page == "a")));
    assert_eq!(callbacks_of(&events, "note").len(), 1);
}

#[test]
fn navigation_cancels_active_dialog() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: first
      kind: confirm
  - navigate:
      page: a
      url: https://a.test/next
  - run_before_unload:
      page: a
      id: leave
"#,
    );

    assert_eq!(callbacks_of(&events, "first"), vec![(false, String::new())]);
    assert_eq!(disposition_of(&events, "leave"), DialogDisposition::Shown);
    assert!(events.iter().any(|event| matches!(event,
        ReplayEvent::DialogCreated { before_unload: true, origin, .. }
            if origin == "https://a.test/next")));
}

#[test]
fn handle_reports_whether_a_dialog_was_active() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - handle:
      page: a
      accepted: true
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: p
      kind: prompt
  - handle:
      page: a
      accepted: true
      prompt_override: typed
"#,
    );

    let handled: Vec<bool> = events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Handled { handled, .. } => Some(*handled),
            _ => None,
        })
        .collect();
    assert_eq!(handled, vec![false, true]);
    assert_eq!(callbacks_of(&events, "p"), vec![(true, "typed".to_string())]);
}

#[test]
fn page_without_factory_reports_to_console() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
    factory: false
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: x
      kind: alert
"#,
    );

    assert_eq!(
        disposition_of(&events, "x"),
        DialogDisposition::Suppressed(SuppressReason::Unsupported)
    );
    assert!(events.iter().any(|event| matches!(event,
        ReplayEvent::ConsoleMessage { message, .. }
            if message.starts_with("A window.alert() dialog requested by this page was suppressed"))));
}

#[test]
fn closing_page_drops_its_dialog_without_callback() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: c
      kind: confirm
  - close_page: a
"#,
    );

    assert!(callbacks_of(&events, "c").is_empty());
    assert!(matches!(events.last(), Some(ReplayEvent::DialogDropped { .. })));
}

#[test]
fn missing_scenario_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = Scenario::load(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, ScenarioError::Io(_)));
}

#[test]
fn unknown_page_in_step_fails_the_run() {
    let scenario = Scenario::from_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - focus: b
"#,
    )
    .unwrap();

    let err = ScenarioRunner::new(DialogPolicy::default())
        .run(&scenario)
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownPage(name) if name == "b"));
}

#[test]
fn stale_response_is_recorded() {
    let events = run_yaml(
        r#"
pages:
  - name: a
    url: https://a.test/
steps:
  - show: a
  - focus: a
  - run_dialog:
      page: a
      id: q
      kind: confirm
  - respond:
      page: a
      accepted: true
  - respond:
      page: a
      accepted: false
"#,
    );

    let responded: Vec<bool> = events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Responded { responded, .. } => Some(*responded),
            _ => None,
        })
        .collect();
    assert_eq!(responded, vec![true, false]);
    assert_eq!(callbacks_of(&events, "q"), vec![(true, String::new())]);
}
