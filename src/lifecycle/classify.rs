// classify.rs
// Due-date calculation and payment classification. Both are pure functions
// over date-only values; time-of-day and timezone never enter the
// comparison, so a pass started at 23:59 classifies the same as one at
// 00:01.

use bson::DateTime;
use chrono::{Duration, NaiveDate};

use crate::models::{Invoice, PaymentTerm};

use super::DUE_SOON_WINDOW_DAYS;

/// Payment state of a single invoice relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceClass {
    Current,
    DueSoon,
    Overdue,
}

/// Due date of an invoice: creation date plus the days its payment term
/// grants.
pub fn due_date(creation: NaiveDate, term: PaymentTerm) -> NaiveDate {
    creation + Duration::days(term.days())
}

/// Classify a due date against `today`.
///
/// Strictly past due is `Overdue`; due within `DUE_SOON_WINDOW_DAYS`
/// (inclusive, counting today) is `DueSoon`; anything further out is
/// `Current`.
pub fn classify(due: NaiveDate, today: NaiveDate) -> InvoiceClass {
    if today > due {
        return InvoiceClass::Overdue;
    }
    if (due - today).num_days() <= DUE_SOON_WINDOW_DAYS {
        return InvoiceClass::DueSoon;
    }
    InvoiceClass::Current
}

/// Classify an invoice. Paid invoices are never classified; callers are
/// expected to have filtered them out already, this just refuses to guess.
pub fn classify_invoice(invoice: &Invoice, today: NaiveDate) -> Option<InvoiceClass> {
    if invoice.status.is_paid() {
        return None;
    }
    let due = due_date(as_date(invoice.creation_date), invoice.payment_term);
    Some(classify(due, today))
}

/// Strip a stored timestamp down to its calendar date.
pub fn as_date(dt: DateTime) -> NaiveDate {
    dt.to_chrono().date_naive()
}
