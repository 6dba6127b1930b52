mod support;

use support::{at, minutes, scheduled_subtask};
use tracker::error::Error;
use tracker::manager::TaskManager;
use tracker::task::{Epic, Status, Subtask, TaskKind};

#[test]
fn epic_state_follows_its_subtasks() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Move house", "")).unwrap();
    let epic_id = epic.id();
    assert_eq!(epic.status(), Status::New);
    assert_eq!(epic.duration(), minutes(0));

    let pack = manager
        .create_subtask(scheduled_subtask(epic_id, "Pack", Status::New, at(10, 0), 60))
        .unwrap();
    let load = manager
        .create_subtask(scheduled_subtask(epic_id, "Load", Status::Done, at(9, 0), 30))
        .unwrap();

    let epic = manager.get_epic(epic_id).unwrap();
    assert_eq!(epic.status(), Status::InProgress);
    assert_eq!(epic.start_time(), Some(at(9, 0)));
    assert_eq!(epic.duration(), minutes(90));
    assert_eq!(epic.end_time(), Some(at(10, 30)));
    assert_eq!(epic.subtask_ids(), &[pack.id(), load.id()]);

    let mut pack = pack;
    pack.status = Status::Done;
    manager.update_subtask(pack).unwrap();
    assert_eq!(manager.get_epic(epic_id).unwrap().status(), Status::Done);

    manager.delete_all_subtasks();
    let epic = manager.get_epic(epic_id).unwrap();
    assert_eq!(epic.status(), Status::New);
    assert_eq!(epic.start_time(), None);
    assert_eq!(epic.duration(), minutes(0));
    assert!(epic.subtask_ids().is_empty());
}

#[test]
fn epic_update_only_touches_name_and_description() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Old", "old")).unwrap();
    manager
        .create_subtask(Subtask::new(epic.id(), "Sub", "", Status::Done))
        .unwrap();

    let updated = manager
        .update_epic(Epic::with_id(epic.id(), "New", "new"))
        .unwrap();
    assert_eq!(updated.name, "New");
    assert_eq!(updated.description, "new");
    assert_eq!(updated.status(), Status::Done);
    assert_eq!(updated.subtask_ids().len(), 1);
}

#[test]
fn subtask_needs_an_existing_epic() {
    let mut manager = TaskManager::default();
    let err = manager
        .create_subtask(Subtask::new(42, "Orphan", "", Status::New))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            kind: TaskKind::Epic,
            id: 42
        }
    ));
    assert!(manager.get_all_subtasks().is_empty());
}

#[test]
fn moving_a_subtask_to_another_epic_is_rejected_without_changes() {
    let mut manager = TaskManager::default();
    let first = manager.create_epic(Epic::new("First", "")).unwrap();
    let second = manager.create_epic(Epic::new("Second", "")).unwrap();
    let sub = manager
        .create_subtask(Subtask::new(first.id(), "Sub", "", Status::New))
        .unwrap();

    let moved = Subtask::with_id(sub.id(), second.id(), "Moved", "", Status::Done);
    let err = manager.update_subtask(moved).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let stored = manager.get_subtask(sub.id()).unwrap();
    assert_eq!(stored.epic_id(), first.id());
    assert_eq!(stored.name, "Sub");
    assert_eq!(manager.get_epic(first.id()).unwrap().status(), Status::New);
    assert!(manager.get_epic(second.id()).unwrap().subtask_ids().is_empty());
}

#[test]
fn deleting_an_epic_deletes_its_subtasks() {
    let mut manager = TaskManager::default();
    let keep = manager.create_epic(Epic::new("Keep", "")).unwrap();
    let drop = manager.create_epic(Epic::new("Drop", "")).unwrap();
    let kept = manager
        .create_subtask(Subtask::new(keep.id(), "Kept", "", Status::New))
        .unwrap();
    let gone = manager
        .create_subtask(scheduled_subtask(drop.id(), "Gone", Status::New, at(9, 0), 60))
        .unwrap();

    let removed = manager.delete_epic(drop.id()).unwrap();
    assert_eq!(removed.id(), drop.id());

    assert!(manager.get_subtask(gone.id()).is_err());
    assert!(manager.get_subtask(kept.id()).is_ok());
    assert!(manager.get_prioritized_tasks().is_empty());

    manager.delete_all_epics();
    assert!(manager.get_all_epics().is_empty());
    assert!(manager.get_all_subtasks().is_empty());
}

#[test]
fn deleting_a_subtask_detaches_it_from_its_epic() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Epic", "")).unwrap();
    let a = manager
        .create_subtask(Subtask::new(epic.id(), "A", "", Status::Done))
        .unwrap();
    let b = manager
        .create_subtask(Subtask::new(epic.id(), "B", "", Status::New))
        .unwrap();
    assert_eq!(manager.get_epic(epic.id()).unwrap().status(), Status::InProgress);

    manager.delete_subtask(b.id()).unwrap();
    let epic = manager.get_epic(epic.id()).unwrap();
    assert_eq!(epic.subtask_ids(), &[a.id()]);
    assert_eq!(epic.status(), Status::Done);
    assert_eq!(manager.get_epic_subtasks(epic.id()).len(), 1);

    assert!(manager.delete_subtask(b.id()).is_none());
}

#[test]
fn subtask_that_would_overflow_the_epic_total_is_rejected() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Long haul", "")).unwrap();
    let huge = minutes(100_000_000_000_000);
    let first = manager
        .create_subtask(Subtask::new(epic.id(), "First", "", Status::New).with_duration(huge))
        .unwrap();

    let err = manager
        .create_subtask(Subtask::new(epic.id(), "Second", "", Status::Done).with_duration(huge))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert_eq!(manager.get_all_subtasks().len(), 1);
    let stored = manager.get_epic(epic.id()).unwrap();
    assert_eq!(stored.subtask_ids(), &[first.id()]);
    assert_eq!(stored.duration(), huge);
    assert_eq!(stored.status(), Status::New);
    assert_eq!(manager.next_id(), first.id() + 1);
}

#[test]
fn update_that_would_overflow_the_epic_total_is_rejected() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Long haul", "")).unwrap();
    let huge = minutes(100_000_000_000_000);
    manager
        .create_subtask(Subtask::new(epic.id(), "First", "", Status::New).with_duration(huge))
        .unwrap();
    let second = manager
        .create_subtask(Subtask::new(epic.id(), "Second", "", Status::New).with_duration(minutes(30)))
        .unwrap();

    let mut grown = second.clone();
    grown.duration = Some(huge);
    grown.status = Status::Done;
    let err = manager.update_subtask(grown).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let stored = manager.get_subtask(second.id()).unwrap();
    assert_eq!(stored.duration, Some(minutes(30)));
    assert_eq!(stored.status, Status::New);
    let epic = manager.get_epic(epic.id()).unwrap();
    assert_eq!(epic.duration(), huge + minutes(30));
    assert_eq!(epic.status(), Status::New);
}
