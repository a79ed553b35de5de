use bson::{oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    Phonepe,
    Upi,
    Card,
    Netbanking,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user: ObjectId,
    pub category: String, // display name
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub gateway_response: Document,
    #[serde(default)]
    pub post_id: Option<ObjectId>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::dates::option_datetime", default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(
        user: ObjectId,
        category: &str,
        amount: i64,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            user,
            category: category.to_string(),
            amount,
            currency: "INR".to_string(),
            status: PaymentStatus::Pending,
            payment_method,
            transaction_id: None,
            gateway_response: Document::new(),
            post_id: None,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn mark_completed(
        &mut self,
        transaction_id: String,
        gateway_response: Document,
        now: DateTime<Utc>,
    ) {
        self.status = PaymentStatus::Completed;
        self.transaction_id = Some(transaction_id);
        self.gateway_response = gateway_response;
        self.completed_at = Some(now);
    }

    pub fn mark_failed(&mut self, gateway_response: Document) {
        self.status = PaymentStatus::Failed;
        self.gateway_response = gateway_response;
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentDto {
    pub category_name: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentDto {
    pub payment_id: String,
    pub transaction_id: String,
    pub gateway_response: Option<Document>,
}

#[derive(Debug, Serialize)]
pub struct PaymentOut {
    pub id: String,
    pub category: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentOut {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.to_hex(),
            category: p.category,
            amount: p.amount,
            currency: p.currency,
            status: p.status,
            transaction_id: p.transaction_id,
            created_at: p.created_at,
            completed_at: p.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn completing_a_payment_stamps_everything() {
        let now = Utc::now();
        let mut p = Payment::new(ObjectId::new(), "Cars", 199, PaymentMethod::Upi, now);
        assert_eq!(p.status, PaymentStatus::Pending);

        p.mark_completed("txn_1".into(), doc! { "ok": true }, now);
        assert_eq!(p.status, PaymentStatus::Completed);
        assert_eq!(p.transaction_id.as_deref(), Some("txn_1"));
        assert_eq!(p.completed_at, Some(now));
    }

    #[test]
    fn failing_keeps_transaction_empty() {
        let mut p = Payment::new(ObjectId::new(), "Bikes", 99, PaymentMethod::Card, Utc::now());
        p.mark_failed(doc! { "code": "DECLINED" });
        assert_eq!(p.status, PaymentStatus::Failed);
        assert!(p.transaction_id.is_none());
        assert!(p.completed_at.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Refunded).unwrap(),
            "\"refunded\""
        );
        let m: PaymentMethod = serde_json::from_str("\"razorpay\"").unwrap();
        assert_eq!(m, PaymentMethod::Razorpay);
    }
}
