mod support;

use support::{at, scheduled_subtask, scheduled_task};
use tracker::error::Error;
use tracker::manager::TaskManager;
use tracker::task::{Epic, Status, Task};

#[test]
fn overlapping_create_is_rejected() {
    let mut manager = TaskManager::default();
    let first = manager
        .create_task(scheduled_task("First", at(9, 0), 60))
        .unwrap();

    let err = manager
        .create_task(scheduled_task("Second", at(9, 30), 60))
        .unwrap_err();
    match err {
        Error::ScheduleConflict { conflicting_id, .. } => assert_eq!(conflicting_id, first.id()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.get_all_tasks().len(), 1);
}

#[test]
fn back_to_back_intervals_do_not_conflict() {
    let mut manager = TaskManager::default();
    manager
        .create_task(scheduled_task("First", at(9, 0), 60))
        .unwrap();
    manager
        .create_task(scheduled_task("Second", at(10, 0), 30))
        .unwrap();
    manager
        .create_task(scheduled_task("Before", at(8, 0), 60))
        .unwrap();
    assert_eq!(manager.get_all_tasks().len(), 3);
}

#[test]
fn subtasks_and_tasks_share_one_timeline() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Epic", "")).unwrap();
    let task = manager
        .create_task(scheduled_task("Task", at(9, 0), 60))
        .unwrap();

    let err = manager
        .create_subtask(scheduled_subtask(epic.id(), "Sub", Status::New, at(9, 45), 30))
        .unwrap_err();
    assert!(matches!(err, Error::ScheduleConflict { conflicting_id, .. } if conflicting_id == task.id()));
    assert!(manager.get_epic(epic.id()).unwrap().subtask_ids().is_empty());
}

#[test]
fn unscheduled_records_never_conflict() {
    let mut manager = TaskManager::default();
    manager
        .create_task(scheduled_task("Busy", at(9, 0), 120))
        .unwrap();
    manager
        .create_task(Task::new("Someday", "", Status::New))
        .unwrap();
    manager
        .create_task(Task::new("Start only", "", Status::New).with_start_time(at(10, 0)))
        .unwrap();
    assert_eq!(manager.get_all_tasks().len(), 3);
}

#[test]
fn update_is_not_checked_against_itself() {
    let mut manager = TaskManager::default();
    let task = manager
        .create_task(scheduled_task("Task", at(9, 0), 60))
        .unwrap();

    let mut longer = task.clone();
    longer.duration = Some(support::minutes(90));
    manager.update_task(longer).unwrap();

    let mut moved = task;
    moved.start_time = Some(at(9, 15));
    let updated = manager.update_task(moved).unwrap();
    assert_eq!(updated.end_time(), Some(at(10, 15)));
}

#[test]
fn rejected_update_keeps_the_stored_version() {
    let mut manager = TaskManager::default();
    manager
        .create_task(scheduled_task("Morning", at(9, 0), 60))
        .unwrap();
    let later = manager
        .create_task(scheduled_task("Later", at(11, 0), 60))
        .unwrap();

    let mut clash = later.clone();
    clash.start_time = Some(at(9, 30));
    clash.name = "Clash".to_string();
    assert!(manager.update_task(clash).is_err());

    let stored = manager.get_task(later.id()).unwrap();
    assert_eq!(stored.name, "Later");
    assert_eq!(stored.start_time, Some(at(11, 0)));
}

#[test]
fn prioritized_lists_scheduled_work_by_start_time() {
    let mut manager = TaskManager::default();
    let epic = manager.create_epic(Epic::new("Epic", "")).unwrap();
    let late = manager
        .create_task(scheduled_task("Late", at(15, 0), 30))
        .unwrap();
    let early = manager
        .create_subtask(scheduled_subtask(epic.id(), "Early", Status::New, at(8, 0), 30))
        .unwrap();
    manager
        .create_task(Task::new("Unscheduled", "", Status::New))
        .unwrap();
    let middle = manager
        .create_task(scheduled_task("Middle", at(12, 0), 30))
        .unwrap();

    let order: Vec<u64> = manager
        .get_prioritized_tasks()
        .iter()
        .map(|entity| entity.id())
        .collect();
    assert_eq!(order, vec![early.id(), middle.id(), late.id()]);

    let mut moved = late;
    moved.start_time = None;
    manager.update_task(moved).unwrap();
    assert_eq!(manager.get_prioritized_tasks().len(), 2);
}

#[test]
fn negative_durations_are_invalid() {
    let mut manager = TaskManager::default();
    let err = manager
        .create_task(scheduled_task("Backwards", at(9, 0), -10))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn schedule_whose_end_is_out_of_range_is_rejected() {
    let mut manager = TaskManager::default();
    let endless = Task::new("Endless", "", Status::New)
        .with_start_time(at(9, 0))
        .with_duration(support::minutes(1_000_000_000_000));

    let err = manager.create_task(endless).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(manager.get_all_tasks().is_empty());
    assert!(manager.get_prioritized_tasks().is_empty());

    let task = manager
        .create_task(scheduled_task("Normal", at(10, 0), 60))
        .unwrap();
    let mut stretched = task.clone();
    stretched.duration = Some(support::minutes(1_000_000_000_000));
    assert!(matches!(manager.update_task(stretched), Err(Error::Validation(_))));
    assert_eq!(manager.get_task(task.id()).unwrap().duration, Some(support::minutes(60)));
}
