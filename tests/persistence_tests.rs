use chrono::NaiveDate;
use sprint_scheduler::persistence::{
    PersistenceError, ScheduleSnapshot, load_schedule_from_json, save_schedule_to_json,
};
use sprint_scheduler::{ProgressNode, Schedule, ScheduleError, TaskInput, TimelineScope};
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample() -> Schedule {
    let mut s = Schedule::new();
    let c = s.add_campaign("Warehouse", 3).unwrap();
    let sp1 = s.add_sprint(c, "Groundwork").unwrap();
    let sp2 = s.add_sprint(c, "Shell").unwrap();
    let a = s
        .upsert_task(TaskInput::new(sp1, "Excavate", 4).starting(d(2024, 4, 1)))
        .unwrap();
    let b = s
        .upsert_task(TaskInput::new(sp1, "Pour", 2).after([a]).completed(true))
        .unwrap();
    s.upsert_task(TaskInput::new(sp2, "Steel", 5).after([b]).resource("Steelwork"))
        .unwrap();
    s.set_task_comments(a, Some("needs permit".into())).unwrap();
    s
}

#[test]
fn json_round_trip_preserves_hierarchy_and_dates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let original = sample();

    save_schedule_to_json(&original, &path).unwrap();
    let loaded = load_schedule_from_json(&path).unwrap();

    assert_eq!(
        ScheduleSnapshot::from_schedule(&loaded),
        ScheduleSnapshot::from_schedule(&original)
    );
    assert_eq!(
        loaded.timeline_at(TimelineScope::All, d(2024, 1, 1)).unwrap(),
        original.timeline_at(TimelineScope::All, d(2024, 1, 1)).unwrap()
    );
    assert_eq!(loaded.progress(ProgressNode::Campaign(1)).unwrap(), 33);
    assert_eq!(loaded.task(1).unwrap().comments.as_deref(), Some("needs permit"));
}

#[test]
fn snapshot_does_not_store_effective_dates() {
    let json = serde_json::to_value(ScheduleSnapshot::from_schedule(&sample())).unwrap();
    let follower = &json["tasks"][1];
    assert_eq!(follower["name"], "Pour");
    assert!(follower.get("start_date").is_none());
    assert_eq!(follower["predecessors"], serde_json::json!([1]));
}

#[test]
fn stored_cycle_is_rejected_on_load() {
    let mut snapshot = ScheduleSnapshot::from_schedule(&sample());
    // Excavate <- Steel closes Excavate -> Pour -> Steel
    snapshot.tasks[0].predecessors = vec![3];
    let err = snapshot.into_schedule().unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Schedule(ScheduleError::CycleDetected { .. })
    ));
}

#[test]
fn stored_zero_duration_is_rejected_on_load() {
    let mut snapshot = ScheduleSnapshot::from_schedule(&sample());
    snapshot.tasks[2].task.duration_days = 0;
    assert!(matches!(
        snapshot.into_schedule().unwrap_err(),
        PersistenceError::Schedule(ScheduleError::InvalidDuration { task: 3, duration: 0 })
    ));
}

#[test]
fn duplicate_sprint_ids_are_invalid_data() {
    let mut snapshot = ScheduleSnapshot::from_schedule(&sample());
    let dup = snapshot.sprints[0].clone();
    snapshot.sprints.push(dup);
    assert!(matches!(
        snapshot.into_schedule().unwrap_err(),
        PersistenceError::InvalidData(_)
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_schedule_from_json(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));
}
