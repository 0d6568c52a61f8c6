use chrono::Utc;

use super::common::*;
use crate::marketplace::catalog::{JobId, StoreError};
use crate::marketplace::ledger::{
    Application, ApplicationKey, ApplicationStatus, ApplicationStore, InMemoryApplicationStore,
};
use crate::marketplace::stages::PipelineStage;

fn application(job: &str, who: &str) -> Application {
    Application::submit(JobId(job.to_string()), user(who), Utc::now())
}

#[test]
fn submit_stamps_the_first_stage() {
    let application = application("job-a", "user-1");

    assert_eq!(application.status, ApplicationStatus::Applied);
    assert_eq!(application.current_stage, 0);
    assert_eq!(application.progress_percent(), 0);
    assert_eq!(application.current_stage_name(), "Applied");
    assert_eq!(application.stages.len(), PipelineStage::ordered().len());
    assert!(application.stages[0].completed);
    assert!(application.stages[0].completed_on.is_some());
    assert!(application.stages[1..].iter().all(|record| !record.completed));
    assert!(application.completed_at.is_none());
}

#[test]
fn advance_to_next_stage_marks_the_record() {
    let mut application = application("job-a", "user-1");

    let reached = application
        .advance_to(1, Utc::now())
        .expect("next stage accepted");

    assert_eq!(reached, Some(PipelineStage::Shortlisted));
    assert_eq!(application.status, ApplicationStatus::InProgress);
    assert_eq!(application.current_stage, 1);
    assert_eq!(application.progress_percent(), 25);
    assert!(application.stages[1].completed);
}

#[test]
fn advance_same_stage_refreshes_without_a_new_arrival() {
    let mut application = application("job-a", "user-1");
    application
        .advance_to(1, Utc::now())
        .expect("next stage accepted");

    let reached = application
        .advance_to(1, Utc::now())
        .expect("same stage accepted");

    assert_eq!(reached, None);
    assert_eq!(application.current_stage, 1);
    assert!(application.stages[1].completed);
}

#[test]
fn advance_rejects_skipping_ahead() {
    let mut application = application("job-a", "user-1");

    let rejected = application
        .advance_to(3, Utc::now())
        .expect_err("skip rejected");

    assert_eq!(rejected.current, 0);
    assert_eq!(rejected.target, 3);
    assert_eq!(application.status, ApplicationStatus::Applied);
    assert_eq!(application.current_stage, 0);
    assert!(!application.stages[3].completed);
}

#[test]
fn advance_rejects_moving_backwards() {
    let mut application = application("job-a", "user-1");
    application.advance_to(1, Utc::now()).expect("advance");
    application.advance_to(2, Utc::now()).expect("advance");

    let rejected = application
        .advance_to(1, Utc::now())
        .expect_err("regression rejected");

    assert_eq!(rejected.current, 2);
    assert_eq!(rejected.target, 1);
    assert_eq!(application.current_stage, 2);
}

#[test]
fn advance_rejects_targets_past_the_pipeline() {
    let mut application = application("job-a", "user-1");
    let rejected = application
        .advance_to(7, Utc::now())
        .expect_err("out of bounds rejected");
    assert_eq!(rejected.target, 7);
}

#[test]
fn full_walk_reaches_completed() {
    let mut application = application("job-a", "user-1");
    let mut percents = vec![application.progress_percent()];

    for target in 1..PipelineStage::ordered().len() {
        application
            .advance_to(target, Utc::now())
            .expect("pipeline walk succeeds");
        percents.push(application.progress_percent());
    }

    assert_eq!(percents, vec![0, 25, 50, 75, 100]);
    assert_eq!(application.status, ApplicationStatus::Completed);
    assert_eq!(application.current_stage_name(), "Completed");
    assert!(application.completed_at.is_some());
    assert!(application.stages.iter().all(|record| record.completed));
}

#[test]
fn view_reports_stage_labels_and_progress() {
    let mut application = application("job-a", "user-1");
    application.advance_to(1, Utc::now()).expect("advance");

    let view = application.to_view();
    assert_eq!(view.status, "In Progress");
    assert_eq!(view.current_stage, "Shortlisted");
    assert_eq!(view.progress_percent, 25);
    assert_eq!(view.stages.len(), 5);
    assert_eq!(view.stages[2].name, "Document Verification");
    assert!(view.stages[1].completed);
    assert!(!view.stages[2].completed);
}

#[test]
fn store_rejects_second_application_for_same_pair() {
    let store = InMemoryApplicationStore::default();
    store
        .insert(application("job-a", "user-1"))
        .expect("first insert succeeds");

    match store.insert(application("job-a", "user-1")) {
        Err(StoreError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn by_user_returns_submission_order() {
    let store = InMemoryApplicationStore::default();
    store
        .insert(application("job-a", "user-1"))
        .expect("insert succeeds");
    store
        .insert(application("job-b", "user-2"))
        .expect("insert succeeds");
    store
        .insert(application("job-c", "user-1"))
        .expect("insert succeeds");

    let mine = store.by_user(&user("user-1")).expect("query succeeds");
    let jobs: Vec<&str> = mine.iter().map(|app| app.job_id.0.as_str()).collect();
    assert_eq!(jobs, vec!["job-a", "job-c"]);
}

#[test]
fn remove_for_job_drops_only_that_job() {
    let store = InMemoryApplicationStore::default();
    store
        .insert(application("job-a", "user-1"))
        .expect("insert succeeds");
    store
        .insert(application("job-a", "user-2"))
        .expect("insert succeeds");
    store
        .insert(application("job-b", "user-1"))
        .expect("insert succeeds");

    let removed = store
        .remove_for_job(&JobId("job-a".to_string()))
        .expect("cascade succeeds");
    assert_eq!(removed.len(), 2);

    let key = ApplicationKey::new(JobId("job-a".to_string()), user("user-1"));
    assert!(store.fetch(&key).expect("fetch succeeds").is_none());
    let survivors = store.by_user(&user("user-1")).expect("query succeeds");
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].job_id.0, "job-b");
}
