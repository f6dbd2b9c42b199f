use std::sync::Arc;

use chrono::NaiveDate;

use super::support::{sample_template, MemoryStore, MockGateway};
use crate::models::{EntityKind, RecurringFrequency, RecurringTransaction, Transaction};
use crate::session::SessionContext;
use crate::sync::{RecurringGenerator, SyncService};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn setup() -> (Arc<MemoryStore>, Arc<SyncService>, RecurringGenerator) {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let engine = Arc::new(SyncService::new(store.clone(), gateway));
    let generator = RecurringGenerator::new(engine.clone());
    (store, engine, generator)
}

async fn seed_template(
    engine: &SyncService,
    ctx: &SessionContext,
    template: RecurringTransaction,
) {
    engine.add_record(ctx, template).await.expect("seed template");
}

async fn transactions(engine: &SyncService, ctx: &SessionContext) -> Vec<Transaction> {
    engine.load_records(ctx).await.expect("load transactions")
}

async fn template_by_id(
    engine: &SyncService,
    ctx: &SessionContext,
    id: &str,
) -> RecurringTransaction {
    engine
        .load_records::<RecurringTransaction>(ctx)
        .await
        .expect("load templates")
        .into_iter()
        .find(|template| template.id == id)
        .expect("template present")
}

#[tokio::test]
async fn monthly_day_31_series_clamps_february_and_reverts_in_march() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Monthly,
        date(2026, 1, 31),
    );
    seed_template(&engine, &ctx, template).await;

    let produced = generator
        .generate_due(&ctx, date(2026, 3, 31))
        .await
        .expect("generate");

    assert_eq!(produced, 3);
    let mut dates: Vec<NaiveDate> = transactions(&engine, &ctx)
        .await
        .iter()
        .map(|txn| txn.date)
        .collect();
    dates.sort();
    assert_eq!(
        dates,
        vec![date(2026, 1, 31), date(2026, 2, 28), date(2026, 3, 31)]
    );

    let template = template_by_id(&engine, &ctx, "rt-1").await;
    assert_eq!(template.current_occurrences, 3);
    assert_eq!(template.next_execution_date, Some(date(2026, 4, 30)));
}

#[tokio::test]
async fn monthly_day_31_series_uses_feb_29_on_leap_years() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Monthly,
        date(2024, 1, 31),
    );
    seed_template(&engine, &ctx, template).await;

    generator
        .generate_due(&ctx, date(2024, 2, 29))
        .await
        .expect("generate");

    let mut dates: Vec<NaiveDate> = transactions(&engine, &ctx)
        .await
        .iter()
        .map(|txn| txn.date)
        .collect();
    dates.sort();
    assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
}

#[tokio::test]
async fn max_occurrences_caps_the_series_across_invocations() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let mut template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Daily,
        date(2026, 1, 1),
    );
    template.max_occurrences = Some(3);
    seed_template(&engine, &ctx, template).await;

    let produced = generator
        .generate_due(&ctx, date(2026, 2, 1))
        .await
        .expect("generate");
    assert_eq!(produced, 3);

    // Further elapsed time must not produce more occurrences.
    let later = generator
        .generate_due(&ctx, date(2026, 6, 1))
        .await
        .expect("generate again");
    assert_eq!(later, 0);
    assert_eq!(transactions(&engine, &ctx).await.len(), 3);

    let template = template_by_id(&engine, &ctx, "rt-1").await;
    assert!(!template.is_active);
    assert_eq!(template.next_execution_date, None);
    assert_eq!(template.current_occurrences, 3);
}

#[tokio::test]
async fn idle_weekly_series_materializes_one_record_per_elapsed_period() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Weekly,
        date(2026, 1, 5),
    );
    seed_template(&engine, &ctx, template).await;

    let produced = generator
        .generate_due(&ctx, date(2026, 2, 1))
        .await
        .expect("generate");

    // Jan 5, 12, 19, 26 are due; Feb 2 is not.
    assert_eq!(produced, 4);
    let template = template_by_id(&engine, &ctx, "rt-1").await;
    assert_eq!(template.next_execution_date, Some(date(2026, 2, 2)));
}

#[tokio::test]
async fn end_date_stops_and_deactivates_the_series() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let mut template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Daily,
        date(2026, 1, 1),
    );
    template.end_date = Some(date(2026, 1, 3));
    seed_template(&engine, &ctx, template).await;

    let produced = generator
        .generate_due(&ctx, date(2026, 1, 10))
        .await
        .expect("generate");

    assert_eq!(produced, 3);
    let template = template_by_id(&engine, &ctx, "rt-1").await;
    assert!(!template.is_active);
    assert_eq!(template.next_execution_date, None);
}

#[tokio::test]
async fn inactive_templates_produce_nothing() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let mut template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Daily,
        date(2026, 1, 1),
    );
    template.is_active = false;
    seed_template(&engine, &ctx, template).await;

    let produced = generator
        .generate_due(&ctx, date(2026, 6, 1))
        .await
        .expect("generate");

    assert_eq!(produced, 0);
    assert!(transactions(&engine, &ctx).await.is_empty());
}

#[tokio::test]
async fn occurrences_link_to_their_template() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Daily,
        date(2026, 1, 1),
    );
    seed_template(&engine, &ctx, template).await;

    generator
        .generate_due(&ctx, date(2026, 1, 2))
        .await
        .expect("generate");

    for txn in transactions(&engine, &ctx).await {
        assert_eq!(txn.parent_recurring_id.as_deref(), Some("rt-1"));
        assert!(!txn.is_recurring);
    }
}

#[tokio::test]
async fn deleting_the_template_keeps_materialized_children() {
    let (_store, engine, generator) = setup();
    let ctx = SessionContext::for_user("user-1");
    let template = sample_template(
        "rt-1",
        "user-1",
        RecurringFrequency::Daily,
        date(2026, 1, 1),
    );
    seed_template(&engine, &ctx, template).await;
    generator
        .generate_due(&ctx, date(2026, 1, 3))
        .await
        .expect("generate");
    assert_eq!(transactions(&engine, &ctx).await.len(), 3);

    engine
        .delete_record(&ctx, EntityKind::RecurringTransaction, "rt-1")
        .await
        .expect("delete template");

    let children = transactions(&engine, &ctx).await;
    assert_eq!(children.len(), 3, "no cascade delete of materialized children");
    for child in children {
        assert_eq!(child.parent_recurring_id.as_deref(), Some("rt-1"));
    }
}
