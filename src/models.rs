// models.rs
// Domain models for the invoicing collections the lifecycle engine reads and writes.

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// How long a client has to pay an invoice, counted from its creation date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentTerm {
    #[serde(rename = "on-receipt")]
    OnReceipt,
    #[serde(rename = "8-days")]
    Days8,
    #[serde(rename = "30-days")]
    Days30,
    #[serde(rename = "60-days")]
    Days60,
}

impl PaymentTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTerm::OnReceipt => "on-receipt",
            PaymentTerm::Days8 => "8-days",
            PaymentTerm::Days30 => "30-days",
            PaymentTerm::Days60 => "60-days",
        }
    }

    /// Days granted on top of the creation date.
    pub fn days(&self) -> i64 {
        match self {
            PaymentTerm::OnReceipt => 0,
            PaymentTerm::Days8 => 8,
            PaymentTerm::Days30 => 30,
            PaymentTerm::Days60 => 60,
        }
    }
}

impl Default for PaymentTerm {
    // Invoices stored without a term behave as 30 days.
    fn default() -> Self {
        PaymentTerm::Days30
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Sent,
    Paid,
    #[serde(rename = "to-chase")]
    ToChase,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::ToChase => "to-chase",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

/// Invoice document stored in MongoDB. The engine only reads invoices and
/// transitions `status` to `to-chase`; everything else belongs to the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub number: String,
    pub client_name: String,
    pub amount: f64,
    pub creation_date: DateTime,
    #[serde(default)]
    pub payment_term: PaymentTerm,
    pub status: InvoiceStatus,
}

/// How often a recurring invoice template emits a new invoice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
        }
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, Frequency::Monthly)
    }
}

/// Recurring invoice definition. `next_emission` is maintained by the
/// schedule calculator; `repetitions_done` is incremented by the app on
/// each emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringInvoice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub client_name: String,
    pub amount: f64,
    #[serde(default)]
    pub payment_term: PaymentTerm,
    pub frequency: Frequency,
    /// Day of month the invoice is emitted on, 1–28.
    pub emission_day: u32,
    /// Calendar months (1–12) the invoice is emitted in. Ignored for
    /// monthly frequency.
    #[serde(default)]
    pub emission_months: Vec<u32>,
    pub next_emission: Option<DateTime>,
    /// None = unlimited.
    pub repetitions_planned: Option<u32>,
    #[serde(default)]
    pub repetitions_done: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    #[serde(rename = "overdue")]
    Overdue,
    #[serde(rename = "due-soon")]
    DueSoon,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Overdue => "overdue",
            NotificationKind::DueSoon => "due-soon",
        }
    }
}

/// Notification document. The engine is the sole writer of `kind`,
/// `created_at` and existence; `read` belongs to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub invoice_id: ObjectId,
    pub kind: NotificationKind,
    pub created_at: DateTime,
    #[serde(default)]
    pub read: bool,
    pub amount: f64,
    pub invoice_number: String,
    pub client_name: String,
}
