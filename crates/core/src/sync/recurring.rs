//! Materializes due occurrences of recurring templates into concrete
//! transactions.
//!
//! All month-end and leap-year date arithmetic lives here.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use log::info;

use super::engine::SyncService;
use crate::errors::Result;
use crate::models::{RecurringFrequency, RecurringTransaction, SyncModel};
use crate::session::SessionContext;

/// Walks recurring templates forward and adds one transaction per elapsed
/// period through the sync engine.
pub struct RecurringGenerator {
    engine: Arc<SyncService>,
}

impl RecurringGenerator {
    pub fn new(engine: Arc<SyncService>) -> Self {
        Self { engine }
    }

    /// Materialize every due occurrence across all templates in the scope.
    /// Returns the number of transactions produced.
    pub async fn generate_due(&self, ctx: &SessionContext, today: NaiveDate) -> Result<usize> {
        let templates: Vec<RecurringTransaction> = self.engine.load_records(ctx).await?;
        let mut produced = 0;
        for mut template in templates {
            produced += self.run_template(ctx, &mut template, today).await?;
        }
        if produced > 0 {
            info!("materialized {produced} recurring occurrence(s)");
        }
        Ok(produced)
    }

    /// Advance one template. A template left idle for several periods
    /// produces one transaction per elapsed period, not a single catch-up
    /// record.
    async fn run_template(
        &self,
        ctx: &SessionContext,
        template: &mut RecurringTransaction,
        today: NaiveDate,
    ) -> Result<usize> {
        let mut produced = 0;
        let mut changed = false;

        loop {
            if !template.is_active {
                break;
            }
            let Some(due) = template.next_execution_date else {
                break;
            };
            if due > today {
                break;
            }
            if template.end_date.is_some_and(|end| due > end) {
                template.is_active = false;
                template.next_execution_date = None;
                changed = true;
                break;
            }
            if template
                .max_occurrences
                .is_some_and(|max| template.current_occurrences >= max)
            {
                template.is_active = false;
                template.next_execution_date = None;
                changed = true;
                break;
            }

            let occurrence = template.materialize(due);
            self.engine.add_record(ctx, occurrence).await?;
            template.current_occurrences += 1;
            template.next_execution_date = Some(next_occurrence(
                due,
                template.frequency,
                template.original_target_day,
            ));
            changed = true;
            produced += 1;
        }

        if changed {
            template.touch();
            self.engine.add_record(ctx, template.clone()).await?;
        }
        Ok(produced)
    }
}

/// Next scheduled date one period after `current`. Monthly and yearly
/// series anchor to `original_target_day`: a target day past the end of the
/// landing month clamps to that month's actual last day (31 → Jun 30,
/// Feb 29 → Feb 28 off leap years).
pub fn next_occurrence(
    current: NaiveDate,
    frequency: RecurringFrequency,
    original_target_day: u32,
) -> NaiveDate {
    match frequency {
        RecurringFrequency::Daily => current + Duration::days(1),
        RecurringFrequency::Weekly => current + Duration::days(7),
        RecurringFrequency::Monthly => {
            let (year, month) = next_month(current.year(), current.month());
            clamped_date(year, month, original_target_day)
        }
        RecurringFrequency::Yearly => {
            clamped_date(current.year() + 1, current.month(), original_target_day)
        }
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The target day in the given month, or the month's last day when the
/// target overflows it.
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| last_day_of_month(year, month))
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = next_month(year, month);
    // First of the following month is always a valid date.
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap() - Duration::days(1)
}
