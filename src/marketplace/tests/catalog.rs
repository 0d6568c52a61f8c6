use super::common::*;
use crate::marketplace::catalog::{
    CounterDelta, InMemoryJobCatalog, JobCatalog, JobId, JobStatus, JobUpdate, PayCadence,
    StoreError,
};

#[test]
fn insert_then_fetch_round_trips() {
    let catalog = InMemoryJobCatalog::default();
    let job = job_from_draft("job-a", plumbing_draft());

    catalog.insert(job.clone()).expect("insert succeeds");
    let fetched = catalog
        .fetch(&job.id)
        .expect("fetch succeeds")
        .expect("job present");

    assert_eq!(fetched, job);
    assert_eq!(fetched.status, JobStatus::Active);
    assert_eq!(fetched.applicants, 0);
}

#[test]
fn insert_rejects_duplicate_ids() {
    let catalog = InMemoryJobCatalog::default();
    let job = job_from_draft("job-a", plumbing_draft());

    catalog.insert(job.clone()).expect("first insert succeeds");
    match catalog.insert(job) {
        Err(StoreError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn list_returns_most_recent_posting_first() {
    let catalog = InMemoryJobCatalog::default();
    catalog
        .insert(job_from_draft("job-a", plumbing_draft()))
        .expect("insert succeeds");
    catalog
        .insert(job_from_draft("job-b", cleaning_draft()))
        .expect("insert succeeds");

    let listed = catalog.list().expect("list succeeds");
    let ids: Vec<&str> = listed.iter().map(|job| job.id.0.as_str()).collect();
    assert_eq!(ids, vec!["job-b", "job-a"]);
}

#[test]
fn update_merges_only_populated_fields() {
    let catalog = InMemoryJobCatalog::default();
    let job = job_from_draft("job-a", plumbing_draft());
    catalog.insert(job.clone()).expect("insert succeeds");

    let patch = JobUpdate {
        title: Some("Senior Plumbing Rounds".to_string()),
        pay_amount: Some(22_000),
        ..JobUpdate::default()
    };
    let updated = catalog.update(&job.id, patch).expect("update succeeds");

    assert_eq!(updated.title, "Senior Plumbing Rounds");
    assert_eq!(updated.pay_amount, 22_000);
    assert_eq!(updated.location, job.location);
    assert_eq!(updated.pay_cadence, PayCadence::Monthly);
    assert_eq!(updated.posted_at, job.posted_at);
}

#[test]
fn update_missing_job_reports_not_found() {
    let catalog = InMemoryJobCatalog::default();
    match catalog.update(&JobId("job-missing".to_string()), JobUpdate::default()) {
        Err(StoreError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn remove_clears_the_listing_order() {
    let catalog = InMemoryJobCatalog::default();
    let doomed = job_from_draft("job-a", plumbing_draft());
    catalog.insert(doomed.clone()).expect("insert succeeds");
    catalog
        .insert(job_from_draft("job-b", cleaning_draft()))
        .expect("insert succeeds");

    let removed = catalog
        .remove(&doomed.id)
        .expect("remove succeeds")
        .expect("job present");
    assert_eq!(removed.id, doomed.id);

    let listed = catalog.list().expect("list succeeds");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.0, "job-b");
    assert!(catalog
        .fetch(&doomed.id)
        .expect("fetch succeeds")
        .is_none());
}

#[test]
fn adjust_counters_applies_signed_deltas() {
    let catalog = InMemoryJobCatalog::default();
    let job = job_from_draft("job-a", plumbing_draft());
    catalog.insert(job.clone()).expect("insert succeeds");

    catalog
        .adjust_counters(
            &job.id,
            CounterDelta {
                applicants: 2,
                shortlisted: 1,
                recruited: 0,
            },
        )
        .expect("adjust succeeds");
    catalog
        .adjust_counters(
            &job.id,
            CounterDelta {
                applicants: -1,
                shortlisted: 0,
                recruited: 0,
            },
        )
        .expect("adjust succeeds");

    let fetched = catalog
        .fetch(&job.id)
        .expect("fetch succeeds")
        .expect("job present");
    assert_eq!(fetched.applicants, 1);
    assert_eq!(fetched.shortlisted, 1);
    assert_eq!(fetched.recruited, 0);
}

#[test]
fn adjust_counters_saturates_at_zero() {
    let catalog = InMemoryJobCatalog::default();
    let job = job_from_draft("job-a", plumbing_draft());
    catalog.insert(job.clone()).expect("insert succeeds");

    catalog
        .adjust_counters(
            &job.id,
            CounterDelta {
                applicants: -3,
                shortlisted: -1,
                recruited: -1,
            },
        )
        .expect("adjust succeeds");

    let fetched = catalog
        .fetch(&job.id)
        .expect("fetch succeeds")
        .expect("job present");
    assert_eq!(fetched.applicants, 0);
    assert_eq!(fetched.shortlisted, 0);
    assert_eq!(fetched.recruited, 0);
}

#[test]
fn adjust_counters_missing_job_reports_not_found() {
    let catalog = InMemoryJobCatalog::default();
    match catalog.adjust_counters(&JobId("job-missing".to_string()), CounterDelta::default()) {
        Err(StoreError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
