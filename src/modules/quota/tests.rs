use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{Days, NaiveDate};

use super::*;

fn day(offset: i64) -> NaiveDate {
    let base = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    base.checked_add_days(Days::new(offset as u64)).unwrap()
}

fn tracker_with_limit(limit: u32) -> (Arc<QuotaTracker>, Arc<AtomicI64>) {
    let offset = Arc::new(AtomicI64::new(0));
    let clock = offset.clone();
    let policy = DailyLimitPolicy::new(limit, 2000, ["gmail.com".to_string()].into());
    let tracker = QuotaTracker::with_date_source(
        policy,
        Arc::new(move || day(clock.load(Ordering::SeqCst))),
    );
    (Arc::new(tracker), offset)
}

#[test]
fn unknown_user_starts_at_zero() {
    let (tracker, _) = tracker_with_limit(2);
    let stats = tracker.get_daily_stats("alice");
    assert_eq!(stats.emails_sent_today, 0);
    assert_eq!(stats.daily_limit, 2);
    assert_eq!(stats.last_reset_date, day(0));
    assert_eq!(stats.account_kind, AccountKind::Free);
}

#[test]
fn record_send_increments_by_one_and_refuses_at_limit() {
    let (tracker, _) = tracker_with_limit(2);
    assert_eq!(tracker.record_send("alice").unwrap().emails_sent_today, 1);
    assert_eq!(tracker.record_send("alice").unwrap().emails_sent_today, 2);
    let err = tracker.record_send("alice").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExceedsLimitation);
    assert_eq!(tracker.get_daily_stats("alice").emails_sent_today, 2);
    assert_eq!(tracker.get_daily_stats("bob").emails_sent_today, 0);
}

#[test]
fn dropped_permit_does_not_consume_quota() {
    let (tracker, _) = tracker_with_limit(1);
    {
        let _permit = tracker.try_acquire("alice").unwrap();
        assert!(tracker.try_acquire("alice").is_err());
    }
    assert_eq!(tracker.get_daily_stats("alice").emails_sent_today, 0);
    let permit = tracker.try_acquire("alice").unwrap();
    let state = permit.commit();
    assert_eq!(state.emails_sent_today, 1);
    assert!(state.is_exhausted());
    let refused = tracker.try_acquire("alice").err().unwrap();
    assert_eq!(refused.emails_sent_today, 1);
    assert_eq!(refused.remaining(), 0);
}

#[test]
fn counter_resets_on_a_new_day() {
    let (tracker, offset) = tracker_with_limit(5);
    for _ in 0..3 {
        tracker.record_send("alice").unwrap();
    }
    assert_eq!(tracker.get_daily_stats("alice").emails_sent_today, 3);

    offset.store(1, Ordering::SeqCst);
    let stats = tracker.get_daily_stats("alice");
    assert_eq!(stats.emails_sent_today, 0);
    assert_eq!(stats.last_reset_date, day(1));
}

#[test]
fn permit_committed_after_midnight_counts_on_the_new_day() {
    let (tracker, offset) = tracker_with_limit(3);
    let permit = tracker.try_acquire("alice").unwrap();
    offset.store(1, Ordering::SeqCst);
    let state = permit.commit();
    assert_eq!(state.last_reset_date, day(1));
    assert_eq!(state.emails_sent_today, 1);
}

#[test]
fn late_commit_never_pushes_the_new_day_past_its_ceiling() {
    let (tracker, offset) = tracker_with_limit(1);
    let permit = tracker.try_acquire("alice").unwrap();
    offset.store(1, Ordering::SeqCst);
    assert_eq!(tracker.record_send("alice").unwrap().emails_sent_today, 1);

    let state = permit.commit();
    assert_eq!(state.last_reset_date, day(1));
    assert_eq!(state.emails_sent_today, 1);
    assert!(tracker.try_acquire("alice").is_err());
}

#[test]
fn organization_accounts_get_the_higher_ceiling() {
    let (tracker, _) = tracker_with_limit(2);
    let kind = tracker.policy().classify(Some("ceo@acme.io"));
    assert_eq!(kind, AccountKind::Organization);
    tracker.set_account_kind("alice", kind);
    assert_eq!(tracker.daily_limit_for("alice"), 2000);
    assert_eq!(tracker.get_daily_stats("alice").daily_limit, 2000);
}

#[test]
fn policy_classification_and_overrides() {
    let policy = DailyLimitPolicy::default().with_override("vip", 50);
    assert_eq!(policy.classify(Some("someone@GMAIL.com")), AccountKind::Free);
    assert_eq!(policy.classify(Some("a@googlemail.com")), AccountKind::Free);
    assert_eq!(policy.classify(Some("a@corp.example")), AccountKind::Organization);
    assert_eq!(policy.classify(None), AccountKind::Free);
    assert_eq!(policy.classify(Some("not-an-address")), AccountKind::Free);
    assert_eq!(policy.daily_limit_for("someone", AccountKind::Free), 2);
    assert_eq!(policy.daily_limit_for("vip", AccountKind::Free), 50);
    assert_eq!(
        policy.daily_limit_for("someone", AccountKind::Organization),
        2000
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquires_never_exceed_the_limit() {
    let (tracker, _) = tracker_with_limit(7);
    let mut handles = Vec::new();
    for _ in 0..64 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            match tracker.try_acquire("alice") {
                Ok(permit) => {
                    tokio::task::yield_now().await;
                    permit.commit();
                    true
                }
                Err(state) => {
                    assert!(state.emails_sent_today <= state.daily_limit);
                    false
                }
            }
        }));
    }
    let mut committed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            committed += 1;
        }
    }
    assert_eq!(committed, 7);
    let stats = tracker.get_daily_stats("alice");
    assert_eq!(stats.emails_sent_today, 7);
    assert!(stats.emails_sent_today <= stats.daily_limit);
}
