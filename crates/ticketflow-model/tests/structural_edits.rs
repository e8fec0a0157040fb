//! Structural edit properties of the workflow model.

use proptest::prelude::*;
use ticketflow_model::{
  DEFAULT_CAPACITY, ModelError, StatusRegistry, Target, WorkflowModel,
};

const POOL: &[&str] = &["new", "accepted", "closed", "review", "assigned", "reopened"];

#[derive(Debug, Clone)]
enum Edit {
  Append(usize),
  Remove(usize),
  Rename(usize, usize),
  Swap(usize, usize),
  Toggle(usize, usize),
  Target(usize, usize),
}

fn edit() -> impl Strategy<Value = Edit> {
  prop_oneof![
    (0..POOL.len()).prop_map(Edit::Append),
    (0..8usize).prop_map(Edit::Remove),
    (0..8usize, 0..POOL.len()).prop_map(|(a, b)| Edit::Rename(a, b)),
    (0..8usize, 0..8usize).prop_map(|(a, b)| Edit::Swap(a, b)),
    (0..3usize, 0..8usize).prop_map(|(a, s)| Edit::Toggle(a, s)),
    (0..3usize, 0..9usize).prop_map(|(a, s)| Edit::Target(a, s)),
  ]
}

fn seed() -> WorkflowModel {
  let statuses = StatusRegistry::from_names(["new", "accepted", "closed"], DEFAULT_CAPACITY).unwrap();
  let mut model = WorkflowModel::new(statuses);
  for (id, sources, target) in [
    ("accept", vec!["new"], "accepted"),
    ("resolve", vec!["new", "accepted"], "closed"),
    ("leave", vec!["new", "accepted", "closed"], "*"),
  ] {
    model.create_transition(id, "").unwrap();
    model.set_sources(id, sources).unwrap();
    model.set_target(id, target).unwrap();
  }
  model
}

fn status_at(model: &WorkflowModel, index: usize) -> Option<String> {
  model
    .statuses()
    .names()
    .get(index)
    .map(|name| name.to_string())
}

fn action_at(model: &WorkflowModel, index: usize) -> String {
  model
    .transitions()
    .iter()
    .nth(index % model.transitions().len())
    .map(|t| t.action_id().to_string())
    .unwrap()
}

/// Apply an edit; failures must leave the model untouched.
fn apply(model: &mut WorkflowModel, edit: &Edit) {
  let before = model.clone();
  let result: Result<(), ModelError> = match edit {
    Edit::Append(i) => model.append_status(POOL[*i]).map(|_| ()),
    Edit::Remove(i) => match status_at(model, *i) {
      Some(name) => model.remove_status(&name).map(|_| ()),
      None => Ok(()),
    },
    Edit::Rename(i, j) => match status_at(model, *i) {
      Some(name) => model.rename_status(&name, POOL[*j]).map(|_| ()),
      None => Ok(()),
    },
    Edit::Swap(a, b) => model.swap_statuses(*a, *b),
    Edit::Toggle(a, s) => match status_at(model, *s) {
      Some(name) => {
        let action = action_at(model, *a);
        model.toggle_source(&action, &name).map(|_| ())
      }
      None => Ok(()),
    },
    Edit::Target(a, s) => {
      let action = action_at(model, *a);
      let target = status_at(model, *s).unwrap_or_else(|| "*".to_string());
      model.set_target(&action, &target)
    }
  };
  if result.is_err() {
    assert_eq!(*model, before, "failed edit {edit:?} mutated the model");
  }
}

proptest! {
  #[test]
  fn prop_no_dangling_references(edits in prop::collection::vec(edit(), 0..40)) {
    let mut model = seed();
    for e in &edits {
      apply(&mut model, e);
      prop_assert!(model.dangling_references().is_empty(), "dangling after {:?}", e);
      prop_assert!(!model.statuses().is_empty());
    }
  }

  #[test]
  fn prop_double_swap_is_identity(i in 0usize..2, toggles in prop::collection::vec((0..3usize, 0..3usize), 0..6)) {
    let mut model = seed();
    for (a, s) in toggles {
      apply(&mut model, &Edit::Toggle(a, s));
    }
    let before = model.clone();
    let sources_before: Vec<Vec<String>> = model
      .transitions()
      .iter()
      .map(|t| model.source_names(t).iter().map(|s| s.to_string()).collect())
      .collect();

    model.swap_statuses(i, i + 1).unwrap();
    model.swap_statuses(i, i + 1).unwrap();

    prop_assert_eq!(&model, &before);
    let sources_after: Vec<Vec<String>> = model
      .transitions()
      .iter()
      .map(|t| model.source_names(t).iter().map(|s| s.to_string()).collect())
      .collect();
    prop_assert_eq!(sources_before, sources_after);
  }
}

#[test]
fn rename_collision_leaves_everything_unchanged() {
  let mut model = seed();
  let before = model.clone();
  let err = model.rename_status("new", "closed").unwrap_err();
  assert!(matches!(err, ModelError::DuplicateName { .. }));
  assert_eq!(model, before);
}

#[test]
fn removing_every_status_stops_at_one() {
  let mut model = seed();
  model.remove_status("new").unwrap();
  model.remove_status("accepted").unwrap();
  let err = model.remove_status("closed").unwrap_err();
  assert!(matches!(err, ModelError::LastStatus { .. }));
  assert_eq!(model.statuses().names(), vec!["closed"]);
}

#[test]
fn removed_target_becomes_wildcard() {
  let statuses = StatusRegistry::from_names(["new", "accepted", "closed"], DEFAULT_CAPACITY).unwrap();
  let mut model = WorkflowModel::new(statuses);
  model.create_transition("accept", "").unwrap();
  model.set_sources("accept", ["new"]).unwrap();
  model.set_target("accept", "accepted").unwrap();

  model.remove_status("accepted").unwrap();

  let accept = model.transitions().get("accept").unwrap();
  assert_eq!(accept.target(), Target::Any);
  assert_eq!(model.statuses().names(), vec!["new", "closed"]);
}
