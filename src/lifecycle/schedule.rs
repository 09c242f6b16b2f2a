// schedule.rs
// Recurrence calculator: given a recurring invoice definition and a
// reference date, produce the next emission date. Pure; persisting the
// refreshed value is the caller's job (refresh_next_emission does both).

use bson::DateTime;
use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::error::{EngineError, EngineResult};
use crate::models::{Frequency, RecurringInvoice};
use crate::store::RecurringInvoiceStore;

use super::MAX_EMISSION_DAY;

/// Next emission date on/after `reference`.
///
/// Monthly schedules emit on `emission_day` every month, rolling to the
/// next month when the day has already passed. Other frequencies emit on
/// `emission_day` of the earliest allowed month on/after the reference,
/// wrapping across the year boundary.
pub fn next_emission(
    frequency: Frequency,
    emission_day: u32,
    emission_months: &[u32],
    reference: NaiveDate,
) -> EngineResult<NaiveDate> {
    if emission_day < 1 || emission_day > MAX_EMISSION_DAY {
        return Err(EngineError::InvalidConfiguration(format!(
            "emission day {emission_day} outside 1-{MAX_EMISSION_DAY}"
        )));
    }

    if frequency.is_monthly() {
        let candidate = date_on(reference.year(), reference.month(), emission_day);
        if candidate < reference {
            let (year, month) = next_month(reference.year(), reference.month());
            return Ok(date_on(year, month, emission_day));
        }
        return Ok(candidate);
    }

    let mut months: Vec<u32> = emission_months.to_vec();
    months.sort_unstable();
    months.dedup();
    if months.is_empty() {
        return Err(EngineError::InvalidConfiguration(format!(
            "{} schedule has no emission months",
            frequency.as_str()
        )));
    }
    if let Some(bad) = months.iter().find(|m| **m < 1 || **m > 12) {
        return Err(EngineError::InvalidConfiguration(format!(
            "emission month {bad} outside 1-12"
        )));
    }

    // Earliest allowed month whose emission day is still on/after the
    // reference; otherwise wrap into next year's first allowed month.
    for &month in &months {
        if month < reference.month() {
            continue;
        }
        let candidate = date_on(reference.year(), month, emission_day);
        if candidate >= reference {
            return Ok(candidate);
        }
    }
    Ok(date_on(reference.year() + 1, months[0], emission_day))
}

/// Next emission for a stored definition, honouring its repetition limit.
/// Returns `Ok(None)` once all planned repetitions have been emitted.
pub fn next_emission_for(
    definition: &RecurringInvoice,
    reference: NaiveDate,
) -> EngineResult<Option<NaiveDate>> {
    if let Some(planned) = definition.repetitions_planned {
        if definition.repetitions_done >= planned {
            return Ok(None);
        }
    }
    next_emission(
        definition.frequency,
        definition.emission_day,
        &definition.emission_months,
        reference,
    )
    .map(Some)
}

/// Recompute `next_emission` and persist the definition. Invoked whenever
/// frequency, emission day or emission months change, and after each
/// emission. On InvalidConfiguration nothing is saved and the stored value
/// stays as it was.
pub async fn refresh_next_emission<S: RecurringInvoiceStore>(
    store: &S,
    definition: &mut RecurringInvoice,
    reference: NaiveDate,
) -> EngineResult<Option<NaiveDate>> {
    let next = next_emission_for(definition, reference)?;
    definition.next_emission = next.map(at_midnight);
    store.save(definition).await?;
    Ok(next)
}

fn at_midnight(date: NaiveDate) -> DateTime {
    DateTime::from_chrono(date.and_time(NaiveTime::MIN).and_utc())
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn date_on(year: i32, month: u32, day: u32) -> NaiveDate {
    let clamped = clamp_day(year, month, day);
    // clamp_day guarantees the day exists in (year, month)
    NaiveDate::from_ymd_opt(year, month, clamped)
        .unwrap_or_else(|| panic!("invalid date {year}-{month}-{clamped}"))
}

fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    if day < 1 {
        return 1;
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.day())
        .unwrap_or_else(|| {
            let (next_year, next_month) = next_month(year, month);
            NaiveDate::from_ymd_opt(next_year, next_month, 1)
                .and_then(|d| d.pred_opt())
                .map(|d| d.day())
                .unwrap_or(28)
        })
}
