use bson::oid::ObjectId;
use chrono::NaiveDate;

use facturapp::error::EngineError;
use facturapp::lifecycle::{next_emission, next_emission_for, refresh_next_emission};
use facturapp::models::{Frequency, PaymentTerm, RecurringInvoice};
use facturapp::store::MemoryStore;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn definition(frequency: Frequency, day: u32, months: Vec<u32>) -> RecurringInvoice {
    RecurringInvoice {
        id: Some(ObjectId::new()),
        user_id: ObjectId::new(),
        client_name: "Acme".into(),
        amount: 500.0,
        payment_term: PaymentTerm::Days30,
        frequency,
        emission_day: day,
        emission_months: months,
        next_emission: None,
        repetitions_planned: None,
        repetitions_done: 0,
    }
}

#[test]
fn monthly_day_still_ahead_stays_in_month() {
    let next = next_emission(Frequency::Monthly, 15, &[], date(2024, 2, 10)).unwrap();
    assert_eq!(next, date(2024, 2, 15));
}

#[test]
fn monthly_day_already_passed_rolls_forward() {
    let next = next_emission(Frequency::Monthly, 15, &[], date(2024, 2, 20)).unwrap();
    assert_eq!(next, date(2024, 3, 15));
}

#[test]
fn monthly_emission_day_today_emits_today() {
    let next = next_emission(Frequency::Monthly, 20, &[], date(2024, 2, 20)).unwrap();
    assert_eq!(next, date(2024, 2, 20));
}

#[test]
fn quarterly_picks_earliest_allowed_month() {
    let next = next_emission(Frequency::Quarterly, 1, &[1, 4, 7, 10], date(2024, 2, 1)).unwrap();
    assert_eq!(next, date(2024, 4, 1));
}

#[test]
fn quarterly_passed_day_in_allowed_month_rolls_to_next_allowed() {
    let next = next_emission(Frequency::Quarterly, 5, &[2, 5, 8, 11], date(2024, 2, 10)).unwrap();
    assert_eq!(next, date(2024, 5, 5));
}

#[test]
fn annual_wraps_across_year_boundary() {
    let next = next_emission(Frequency::Annual, 28, &[4], date(2024, 11, 5)).unwrap();
    assert_eq!(next, date(2025, 4, 28));
}

#[test]
fn emission_day_above_twenty_eight_is_rejected() {
    let err = next_emission(Frequency::Monthly, 31, &[], date(2024, 2, 15)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration(_)));
}

#[test]
fn non_monthly_without_months_is_rejected() {
    let err = next_emission(Frequency::Quarterly, 1, &[], date(2024, 2, 1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration(_)));
}

#[test]
fn out_of_range_month_is_rejected() {
    let err = next_emission(Frequency::Annual, 1, &[13], date(2024, 2, 1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration(_)));
}

#[test]
fn exhausted_repetitions_stop_emitting() {
    let mut def = definition(Frequency::Monthly, 15, vec![]);
    def.repetitions_planned = Some(12);
    def.repetitions_done = 12;
    assert_eq!(next_emission_for(&def, date(2024, 2, 10)).unwrap(), None);
}

#[test]
fn remaining_repetitions_keep_emitting() {
    let mut def = definition(Frequency::Monthly, 15, vec![]);
    def.repetitions_planned = Some(12);
    def.repetitions_done = 11;
    assert_eq!(
        next_emission_for(&def, date(2024, 2, 10)).unwrap(),
        Some(date(2024, 2, 15))
    );
}

#[tokio::test]
async fn refresh_persists_the_new_emission_date() {
    let store = MemoryStore::new();
    let mut def = definition(Frequency::Quarterly, 1, vec![1, 4, 7, 10]);
    store.insert_recurring(def.clone());

    let next = refresh_next_emission(&store, &mut def, date(2024, 2, 1))
        .await
        .unwrap();
    assert_eq!(next, Some(date(2024, 4, 1)));

    let saved = &store.recurring_invoices()[0];
    let stored_date = saved.next_emission.expect("next_emission saved");
    assert_eq!(stored_date.to_chrono().date_naive(), date(2024, 4, 1));
}

#[tokio::test]
async fn invalid_configuration_leaves_stored_value_unchanged() {
    let store = MemoryStore::new();
    let mut def = definition(Frequency::Quarterly, 1, vec![]);
    let before = bson::DateTime::now();
    def.next_emission = Some(before);
    store.insert_recurring(def.clone());

    let err = refresh_next_emission(&store, &mut def, date(2024, 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration(_)));

    let saved = &store.recurring_invoices()[0];
    assert_eq!(saved.next_emission, Some(before));
}
