use chrono::{Duration, NaiveDate};
use sprint_scheduler::task_validation::MAX_DURATION_DAYS;
use sprint_scheduler::{
    Campaign, EffectiveDates, Schedule, ScheduleError, Sprint, SprintId, TaskInput, TimelineScope,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn schedule_with_sprint() -> (Schedule, SprintId) {
    let mut schedule = Schedule::new();
    let campaign = schedule.add_campaign("Office move", 1).unwrap();
    let sprint = schedule.add_sprint(campaign, "Prep").unwrap();
    (schedule, sprint)
}

fn dates(start: NaiveDate, end: NaiveDate) -> EffectiveDates {
    EffectiveDates {
        start: Some(start),
        end: Some(end),
    }
}

#[test]
fn follower_starts_on_predecessor_end() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "Pack", 5).starting(d(2024, 1, 1)))
        .unwrap();
    let b = s
        .upsert_task(TaskInput::new(sp, "Ship", 3).after([a]))
        .unwrap();

    assert_eq!(s.effective_dates(a).unwrap(), dates(d(2024, 1, 1), d(2024, 1, 8)));
    assert_eq!(s.effective_dates(b).unwrap(), dates(d(2024, 1, 8), d(2024, 1, 11)));
}

#[test]
fn completion_does_not_move_dates() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "Pack", 5).starting(d(2024, 1, 1)))
        .unwrap();
    let b = s
        .upsert_task(TaskInput::new(sp, "Ship", 3).after([a]))
        .unwrap();
    let before = s.effective_dates(b).unwrap();

    assert!(s.toggle_task_completion(a).unwrap());
    assert_eq!(s.effective_dates(b).unwrap(), before);
    assert!(!s.toggle_task_completion(a).unwrap());
    assert_eq!(s.effective_dates(b).unwrap(), before);
}

#[test]
fn predecessor_overrides_explicit_start() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "Pack", 5).starting(d(2024, 1, 1)))
        .unwrap();
    let b = s
        .upsert_task(
            TaskInput::new(sp, "Ship", 1)
                .starting(d(2024, 3, 1))
                .after([a]),
        )
        .unwrap();
    assert_eq!(s.effective_dates(b).unwrap().start, Some(d(2024, 1, 8)));
}

#[test]
fn unresolved_predecessor_falls_back_to_explicit_start() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s.upsert_task(TaskInput::new(sp, "Quote", 2)).unwrap();
    let b = s
        .upsert_task(
            TaskInput::new(sp, "Order", 1)
                .starting(d(2024, 2, 5))
                .after([a]),
        )
        .unwrap();
    let c = s
        .upsert_task(TaskInput::new(sp, "Receive", 1).after([a]))
        .unwrap();

    assert_eq!(s.effective_dates(a).unwrap(), EffectiveDates::default());
    assert_eq!(s.effective_dates(b).unwrap(), dates(d(2024, 2, 5), d(2024, 2, 6)));
    assert!(!s.effective_dates(c).unwrap().is_scheduled());
}

#[test]
fn weekend_explicit_start_is_kept() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "Site visit", 1).starting(d(2024, 1, 6)))
        .unwrap();
    assert_eq!(s.effective_dates(a).unwrap(), dates(d(2024, 1, 6), d(2024, 1, 8)));
}

#[test]
fn latest_predecessor_wins() {
    let (mut s, sp) = schedule_with_sprint();
    let short = s
        .upsert_task(TaskInput::new(sp, "Permit", 1).starting(d(2024, 1, 1)))
        .unwrap();
    let long = s
        .upsert_task(TaskInput::new(sp, "Survey", 4).starting(d(2024, 1, 1)))
        .unwrap();
    let joined = s
        .upsert_task(TaskInput::new(sp, "Build", 2).after([short, long]))
        .unwrap();
    // latest end is Fri 2024-01-05
    assert_eq!(s.effective_dates(joined).unwrap(), dates(d(2024, 1, 5), d(2024, 1, 9)));
}

#[test]
fn self_predecessor_is_dropped_on_save() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s.upsert_task(TaskInput::new(sp, "Pack", 1)).unwrap();
    let b = s
        .upsert_task(TaskInput::new(sp, "Ship", 1).with_id(7).after([7, a]))
        .unwrap();
    assert_eq!(b, 7);
    assert_eq!(s.predecessors_of(b), vec![a]);
}

#[test]
fn cycle_is_rejected_and_existing_edges_survive() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s.upsert_task(TaskInput::new(sp, "A", 1)).unwrap();
    let b = s.upsert_task(TaskInput::new(sp, "B", 1).after([a])).unwrap();

    let err = s
        .upsert_task(TaskInput::new(sp, "A", 1).with_id(a).after([b]))
        .unwrap_err();
    assert_eq!(err, ScheduleError::CycleDetected { task: a, predecessor: b });
    assert!(s.predecessors_of(a).is_empty());
    assert_eq!(s.predecessors_of(b), vec![a]);
    assert_eq!(s.task(a).unwrap().name, "A");
}

#[test]
fn zero_duration_is_rejected_without_side_effects() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "Pack", 2).starting(d(2024, 1, 1)))
        .unwrap();

    let err = s
        .upsert_task(TaskInput::new(sp, "Pack", 0).with_id(a))
        .unwrap_err();
    assert_eq!(err, ScheduleError::InvalidDuration { task: a, duration: 0 });
    assert_eq!(s.task(a).unwrap().duration_days, 2);

    assert!(s.set_task_duration(a, -1).is_err());
    assert_eq!(s.task(a).unwrap().duration_days, 2);
}

#[test]
fn oversized_duration_is_rejected_without_side_effects() {
    let (mut s, sp) = schedule_with_sprint();
    let err = s
        .upsert_task(TaskInput::new(sp, "Forever", 200_000_000).starting(d(2024, 1, 1)))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidDuration { duration: 200_000_000, .. }));
    assert_eq!(s.tasks().count(), 0);

    let a = s.upsert_task(TaskInput::new(sp, "Pack", 2)).unwrap();
    let too_long = MAX_DURATION_DAYS + 1;
    assert!(s.set_task_duration(a, too_long).is_err());
    assert_eq!(s.task(a).unwrap().duration_days, 2);
}

#[test]
fn tasks_near_the_last_date_are_unscheduled_not_fatal() {
    let (mut s, sp) = schedule_with_sprint();
    let late = NaiveDate::MAX - Duration::days(10);
    let a = s
        .upsert_task(TaskInput::new(sp, "Late", 500).starting(late))
        .unwrap();
    let b = s.upsert_task(TaskInput::new(sp, "After", 1).after([a])).unwrap();

    assert_eq!(s.effective_dates(a).unwrap(), EffectiveDates::default());
    assert_eq!(s.effective_dates(b).unwrap(), EffectiveDates::default());

    for today in [d(2024, 1, 1), NaiveDate::MAX - Duration::days(3), NaiveDate::MAX] {
        let rows = s.timeline_at(TimelineScope::Sprint(sp), today).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.start <= row.end));
        s.timeline_at(TimelineScope::All, today).unwrap();
    }
}

#[test]
fn exhausted_campaign_ids_are_an_error() {
    let mut s = Schedule::new();
    s.insert_campaign(Campaign::new(i32::MAX, "Last", 1)).unwrap();
    assert_eq!(
        s.add_campaign("One more", 1).unwrap_err(),
        ScheduleError::IdsExhausted { kind: "campaign" }
    );
    assert_eq!(s.campaigns().count(), 1);
}

#[test]
fn exhausted_sprint_and_task_ids_leave_the_schedule_unchanged() {
    let mut s = Schedule::new();
    let c = s.add_campaign("C", 1).unwrap();
    s.insert_sprint(Sprint::new(i32::MAX, c, "Last")).unwrap();
    assert_eq!(
        s.add_sprint(c, "One more").unwrap_err(),
        ScheduleError::IdsExhausted { kind: "sprint" }
    );

    let top = s
        .upsert_task(TaskInput::new(i32::MAX, "Top", 1).with_id(i32::MAX))
        .unwrap();
    assert_eq!(
        s.upsert_task(TaskInput::new(i32::MAX, "Next", 1)).unwrap_err(),
        ScheduleError::IdsExhausted { kind: "task" }
    );
    let ids: Vec<_> = s.tasks().map(|t| t.id).collect();
    assert_eq!(ids, vec![top]);
    assert_eq!(s.graph().task_count(), 1);
}

#[test]
fn clone_without_id_room_changes_nothing() {
    let mut s = Schedule::new();
    let c = s.add_campaign("Source", 1).unwrap();
    let sp = s.add_sprint(c, "Only").unwrap();
    s.upsert_task(TaskInput::new(sp, "Top", 1).with_id(i32::MAX))
        .unwrap();

    assert_eq!(
        s.clone_campaign(c, 2).unwrap_err(),
        ScheduleError::IdsExhausted { kind: "task" }
    );
    assert_eq!(s.campaigns().count(), 1);
    assert_eq!(s.sprints_of(c).count(), 1);
    assert_eq!(s.tasks().count(), 1);
}

#[test]
fn unknown_sprint_is_rejected() {
    let (mut s, _) = schedule_with_sprint();
    assert_eq!(
        s.upsert_task(TaskInput::new(99, "Orphan", 1)).unwrap_err(),
        ScheduleError::UnknownSprint(99)
    );
}

#[test]
fn longer_predecessor_shifts_every_follower() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "A", 2).starting(d(2024, 1, 1)))
        .unwrap();
    let b = s.upsert_task(TaskInput::new(sp, "B", 3).after([a])).unwrap();
    let c = s.upsert_task(TaskInput::new(sp, "C", 1).after([b])).unwrap();
    let before: Vec<_> = [b, c]
        .iter()
        .map(|id| s.effective_dates(*id).unwrap())
        .collect();

    // A grows by four business days, so B and C move by exactly four
    s.set_task_duration(a, 6).unwrap();
    for (id, old) in [b, c].iter().zip(before) {
        let new = s.effective_dates(*id).unwrap();
        let cal = s.calendar();
        assert_eq!(cal.business_days_between(old.start.unwrap(), new.start.unwrap()), 4);
        assert_eq!(cal.business_days_between(old.end.unwrap(), new.end.unwrap()), 4);
    }
    assert_eq!(s.effective_dates(b).unwrap(), dates(d(2024, 1, 9), d(2024, 1, 12)));
    assert_eq!(s.effective_dates(c).unwrap(), dates(d(2024, 1, 12), d(2024, 1, 15)));
}

#[test]
fn deleting_a_predecessor_releases_followers() {
    let (mut s, sp) = schedule_with_sprint();
    let a = s
        .upsert_task(TaskInput::new(sp, "A", 2).starting(d(2024, 1, 1)))
        .unwrap();
    let b = s
        .upsert_task(
            TaskInput::new(sp, "B", 1)
                .starting(d(2024, 5, 6))
                .after([a]),
        )
        .unwrap();

    s.delete_task(a).unwrap();
    assert!(s.predecessors_of(b).is_empty());
    assert_eq!(s.effective_dates(b).unwrap().start, Some(d(2024, 5, 6)));
    assert_eq!(s.effective_dates(a).unwrap_err(), ScheduleError::UnknownTask(a));
}

#[test]
fn deleting_a_campaign_cascades() {
    let (mut s, sp) = schedule_with_sprint();
    let campaign = s.sprint(sp).unwrap().campaign_id;
    let a = s.upsert_task(TaskInput::new(sp, "A", 1)).unwrap();

    s.delete_campaign(campaign).unwrap();
    assert!(s.campaign(campaign).is_none());
    assert!(s.sprint(sp).is_none());
    assert!(s.task(a).is_none());
    assert_eq!(s.graph().task_count(), 0);
}

#[test]
fn clone_remaps_internal_edges_and_keeps_external_ones() {
    let mut s = Schedule::new();
    let upstream = s.add_campaign("Procurement", 1).unwrap();
    let up_sprint = s.add_sprint(upstream, "Orders").unwrap();
    let external = s
        .upsert_task(TaskInput::new(up_sprint, "Order steel", 3).starting(d(2024, 1, 1)))
        .unwrap();

    let source = s.add_campaign("Build", 1).unwrap();
    let sprint = s.add_sprint(source, "Frame").unwrap();
    let a = s
        .upsert_task(TaskInput::new(sprint, "Erect", 2).after([external]).completed(true))
        .unwrap();
    let b = s.upsert_task(TaskInput::new(sprint, "Clad", 2).after([a])).unwrap();

    let copy = s.clone_campaign(source, 42).unwrap();
    let campaign = s.campaign(copy).unwrap();
    assert_eq!(campaign.name, "Build (copy)");
    assert_eq!(campaign.owner_id, 42);

    let copied: Vec<_> = s.tasks_of_campaign(copy).cloned().collect();
    assert_eq!(copied.len(), 2);
    let (ca, cb) = (&copied[0], &copied[1]);
    assert_ne!(ca.id, a);
    assert_ne!(cb.id, b);
    assert!(!ca.completed);
    assert_eq!(s.predecessors_of(ca.id), vec![external]);
    assert_eq!(s.predecessors_of(cb.id), vec![ca.id]);
    assert_eq!(
        s.effective_dates(cb.id).unwrap(),
        s.effective_dates(b).unwrap()
    );
}

#[test]
fn pending_tasks_filter_by_assignee_and_completion() {
    let (mut s, sp) = schedule_with_sprint();
    let mine = s.upsert_task(TaskInput::new(sp, "Mine", 1)).unwrap();
    let done = s.upsert_task(TaskInput::new(sp, "Done", 1)).unwrap();
    let theirs = s.upsert_task(TaskInput::new(sp, "Theirs", 1)).unwrap();
    s.set_task_assignees(mine, vec![], vec![5]).unwrap();
    s.set_task_assignees(done, vec![], vec![5]).unwrap();
    s.set_task_assignees(theirs, vec![], vec![6]).unwrap();
    s.set_task_completed(done, true).unwrap();

    let pending: Vec<_> = s.pending_tasks_for(5).iter().map(|t| t.id).collect();
    assert_eq!(pending, vec![mine]);
}
