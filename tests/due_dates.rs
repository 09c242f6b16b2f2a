use bson::{oid::ObjectId, DateTime};
use chrono::{NaiveDate, NaiveTime};

use facturapp::lifecycle::{classify, classify_invoice, due_date, InvoiceClass};
use facturapp::models::{Invoice, InvoiceStatus, PaymentTerm};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn stored(day: NaiveDate) -> DateTime {
    DateTime::from_chrono(day.and_time(NaiveTime::MIN).and_utc())
}

fn invoice(creation: NaiveDate, term: PaymentTerm, status: InvoiceStatus) -> Invoice {
    Invoice {
        id: Some(ObjectId::new()),
        user_id: ObjectId::new(),
        number: "F-0001".into(),
        client_name: "Acme".into(),
        amount: 1200.0,
        creation_date: stored(creation),
        payment_term: term,
        status,
    }
}

#[test]
fn due_date_rule_table() {
    let creation = date(2024, 1, 1);
    assert_eq!(due_date(creation, PaymentTerm::OnReceipt), date(2024, 1, 1));
    assert_eq!(due_date(creation, PaymentTerm::Days8), date(2024, 1, 9));
    assert_eq!(due_date(creation, PaymentTerm::Days30), date(2024, 1, 31));
    assert_eq!(due_date(creation, PaymentTerm::Days60), date(2024, 3, 1));
}

#[test]
fn missing_term_behaves_as_thirty_days() {
    assert_eq!(PaymentTerm::default(), PaymentTerm::Days30);
    assert_eq!(
        due_date(date(2024, 1, 1), PaymentTerm::default()),
        date(2024, 1, 31)
    );
}

#[test]
fn due_in_three_days_is_due_soon() {
    let today = date(2024, 5, 10);
    assert_eq!(classify(date(2024, 5, 13), today), InvoiceClass::DueSoon);
}

#[test]
fn due_in_four_days_is_current() {
    let today = date(2024, 5, 10);
    assert_eq!(classify(date(2024, 5, 14), today), InvoiceClass::Current);
}

#[test]
fn due_today_is_due_soon() {
    let today = date(2024, 5, 10);
    assert_eq!(classify(today, today), InvoiceClass::DueSoon);
}

#[test]
fn one_day_past_due_is_overdue() {
    let today = date(2024, 5, 10);
    assert_eq!(classify(date(2024, 5, 9), today), InvoiceClass::Overdue);
}

#[test]
fn sent_invoice_is_classified_from_its_term() {
    let inv = invoice(date(2024, 1, 1), PaymentTerm::Days30, InvoiceStatus::Sent);
    assert_eq!(
        classify_invoice(&inv, date(2024, 3, 1)),
        Some(InvoiceClass::Overdue)
    );
}

#[test]
fn paid_invoice_is_never_classified() {
    let inv = invoice(date(2024, 1, 1), PaymentTerm::OnReceipt, InvoiceStatus::Paid);
    assert_eq!(classify_invoice(&inv, date(2024, 3, 1)), None);
}
