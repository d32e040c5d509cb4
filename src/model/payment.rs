use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Membership,
    Donation,
    EventTicket,
    Merchandise,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Hormuud,
    Zaad,
    Paypal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Provider payload; kept out of API responses and exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<bson::Document>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Copy safe to hand to clients.
    pub fn redacted(&self) -> Payment {
        Payment { payment_details: None, ..self.clone() }
    }
}
