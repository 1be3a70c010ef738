//! Invoices for stays arranged outside the guest checkout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::DateSpan;
use crate::error::{StaybookError, StaybookResult};
use crate::store::{Document, new_id};

/// Invoice state. Older records carry the Japanese labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    #[serde(alias = "未払い", alias = "pending")]
    Unpaid,
    #[serde(alias = "支払済")]
    Paid,
    #[serde(alias = "期限切れ")]
    Overdue,
}

/// Payment processor details recorded when an invoice is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_intent_id: String,
    pub payment_method: String,
    pub payment_status: String,
}

impl PaymentInfo {
    fn validate(&self) -> StaybookResult<()> {
        if self.payment_intent_id.trim().is_empty() {
            return Err(StaybookError::Validation(
                "payment_intent_id is required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer_name: String,
    pub amount: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Document for Invoice {
    const COLLECTION: &'static str = "invoices";
    const KIND: &'static str = "Invoice";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Invoice {
    pub fn stay(&self) -> StaybookResult<DateSpan> {
        DateSpan::stay(self.check_in_date, self.check_out_date)
    }

    /// Mark unpaid invoices past their due date as overdue. Returns whether
    /// the status changed.
    pub fn refresh_status(&mut self, today: NaiveDate) -> bool {
        if self.status == InvoiceStatus::Unpaid && today > self.due_date {
            self.status = InvoiceStatus::Overdue;
            return true;
        }
        false
    }

    /// Settle the invoice. Overdue invoices can still be paid.
    /// Fails with an invalid transition once the invoice is paid.
    pub fn ensure_unpaid(&self) -> StaybookResult<()> {
        if self.status == InvoiceStatus::Paid {
            return Err(StaybookError::InvalidTransition {
                kind: Self::KIND,
                from: "paid".into(),
                to: "paid".into(),
            });
        }
        Ok(())
    }

    pub fn mark_paid(&mut self, payment: PaymentInfo) -> StaybookResult<()> {
        self.ensure_unpaid()?;
        payment.validate()?;
        self.status = InvoiceStatus::Paid;
        self.payment = Some(payment);
        self.paid_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_name: String,
    pub amount: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewInvoice {
    pub fn into_invoice(self) -> StaybookResult<Invoice> {
        if self.customer_name.trim().is_empty() {
            return Err(StaybookError::Validation("customer_name is required".into()));
        }
        if self.amount <= 0 {
            return Err(StaybookError::Validation("amount must be positive".into()));
        }
        DateSpan::stay(self.check_in_date, self.check_out_date)?;

        Ok(Invoice {
            id: new_id(),
            customer_name: self.customer_name,
            amount: self.amount,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            due_date: self.due_date,
            status: InvoiceStatus::Unpaid,
            property_id: self.property_id,
            description: self.description,
            payment: None,
            booking_id: None,
            paid_at: None,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn invoice() -> Invoice {
        NewInvoice {
            customer_name: "Sato".to_string(),
            amount: 80_000,
            check_in_date: d("2025-05-01"),
            check_out_date: d("2025-05-05"),
            due_date: d("2025-04-20"),
            property_id: None,
            description: None,
        }
        .into_invoice()
        .unwrap()
    }

    fn stripe() -> PaymentInfo {
        PaymentInfo {
            payment_intent_id: "pi_123".to_string(),
            payment_method: "card".to_string(),
            payment_status: "succeeded".to_string(),
        }
    }

    #[test]
    fn legacy_labels_are_accepted() {
        let status: InvoiceStatus = serde_json::from_str("\"支払済\"").unwrap();
        assert_eq!(status, InvoiceStatus::Paid);
        let status: InvoiceStatus = serde_json::from_str("\"期限切れ\"").unwrap();
        assert_eq!(status, InvoiceStatus::Overdue);
        let status: InvoiceStatus = serde_json::from_str("\"未払い\"").unwrap();
        assert_eq!(status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn unpaid_invoice_goes_overdue_after_due_date() {
        let mut inv = invoice();
        assert!(!inv.refresh_status(d("2025-04-20")));
        assert!(inv.refresh_status(d("2025-04-21")));
        assert_eq!(inv.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn paid_invoice_carries_payment_and_is_final() {
        let mut inv = invoice();
        inv.refresh_status(d("2025-04-25"));
        inv.mark_paid(stripe()).unwrap();

        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(inv.payment.is_some());
        assert!(!inv.refresh_status(d("2025-06-01")));
        assert!(inv.mark_paid(stripe()).is_err());
    }

    #[test]
    fn empty_payment_intent_is_rejected() {
        let mut inv = invoice();
        let mut payment = stripe();
        payment.payment_intent_id = String::new();
        assert!(inv.mark_paid(payment).is_err());
        assert_eq!(inv.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn invalid_drafts_are_rejected() {
        let draft = NewInvoice {
            customer_name: "Sato".to_string(),
            amount: 1000,
            check_in_date: d("2025-05-05"),
            check_out_date: d("2025-05-05"),
            due_date: d("2025-04-20"),
            property_id: None,
            description: None,
        };
        assert!(draft.into_invoice().is_err());
    }
}
