use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::model::payment::{Payment, PaymentStatus, PaymentType};
use crate::repository::repository_error::RepositoryResult;
use crate::repository::{all_of, DateRange, Page, Paged};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    pub created: Option<DateRange>,
}

impl PaymentFilter {
    pub fn completed() -> Self {
        PaymentFilter { status: Some(PaymentStatus::Completed), ..Default::default() }
    }

    pub fn to_document(&self) -> RepositoryResult<Document> {
        let mut conditions = Vec::new();
        if let Some(status) = self.status {
            conditions.push(doc! { "status": bson::to_bson(&status)? });
        }
        if let Some(payment_type) = self.payment_type {
            conditions.push(doc! { "type": bson::to_bson(&payment_type)? });
        }
        if let Some(range) = &self.created {
            conditions.push(doc! { "createdAt": range.to_document() });
        }
        Ok(all_of(conditions))
    }
}

/// Completed revenue for one `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    #[serde(rename(deserialize = "_id", serialize = "month"))]
    pub month: String,
    pub revenue: f64,
    pub transactions: i64,
}

#[derive(Deserialize)]
struct Total {
    total: f64,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, payment: Payment) -> RepositoryResult<Payment>;
    /// Newest first
    async fn find_page(&self, filter: &PaymentFilter, page: Page) -> RepositoryResult<Paged<Payment>>;
    async fn find_all(&self, filter: &PaymentFilter) -> RepositoryResult<Vec<Payment>>;
    /// Sum of completed amounts, optionally inside `range`
    async fn total_revenue(&self, range: Option<DateRange>) -> RepositoryResult<f64>;
    /// Completed revenue per month, oldest month first
    async fn monthly_revenue(&self, range: Option<DateRange>) -> RepositoryResult<Vec<MonthlyRevenue>>;
}

pub struct MongoPaymentRepository {
    collection: Collection<Payment>,
}

impl MongoPaymentRepository {
    pub fn new(db: &Database) -> Self {
        MongoPaymentRepository { collection: db.collection::<Payment>("payments") }
    }

    fn completed_in(range: Option<DateRange>) -> RepositoryResult<Document> {
        PaymentFilter { created: range, ..PaymentFilter::completed() }.to_document()
    }
}

#[async_trait]
impl PaymentRepository for MongoPaymentRepository {
    #[instrument(skip(self, payment), fields(amount = payment.amount))]
    async fn insert(&self, mut payment: Payment) -> RepositoryResult<Payment> {
        payment.id = Some(ObjectId::new());
        match self.collection.insert_one(&payment, None).await {
            Ok(_) => {
                info!("Payment inserted");
                Ok(payment)
            }
            Err(e) => {
                error!("Failed to insert payment: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_page(&self, filter: &PaymentFilter, page: Page) -> RepositoryResult<Paged<Payment>> {
        let query = filter.to_document()?;
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let items: Vec<Payment> = self.collection.find(query.clone(), options).await?.try_collect().await?;
        let total = self.collection.count_documents(query, None).await?;
        debug!(returned = items.len(), total, "Payment page fetched");
        Ok(Paged { items, total })
    }

    async fn find_all(&self, filter: &PaymentFilter) -> RepositoryResult<Vec<Payment>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.collection.find(filter.to_document()?, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn total_revenue(&self, range: Option<DateRange>) -> RepositoryResult<f64> {
        let pipeline = vec![
            doc! { "$match": Self::completed_in(range)? },
            doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
        ];
        let rows: Vec<Document> = self.collection.aggregate(pipeline, None).await?.try_collect().await?;
        match rows.into_iter().next() {
            Some(row) => Ok(bson::from_document::<Total>(row)?.total),
            None => Ok(0.0),
        }
    }

    async fn monthly_revenue(&self, range: Option<DateRange>) -> RepositoryResult<Vec<MonthlyRevenue>> {
        let pipeline = vec![
            doc! { "$match": Self::completed_in(range)? },
            doc! { "$group": {
                "_id": { "$substrBytes": ["$createdAt", 0, 7] },
                "revenue": { "$sum": "$amount" },
                "transactions": { "$sum": 1 },
            } },
            doc! { "$sort": { "_id": 1 } },
        ];
        let rows: Vec<Document> = self.collection.aggregate(pipeline, None).await?.try_collect().await?;
        rows.into_iter()
            .map(|row| bson::from_document::<MonthlyRevenue>(row).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_document() {
        let filter = PaymentFilter {
            payment_type: Some(PaymentType::Donation),
            ..PaymentFilter::completed()
        };
        assert_eq!(
            filter.to_document().unwrap(),
            doc! { "$and": [{ "status": "completed" }, { "type": "donation" }] }
        );
    }

    #[test]
    fn test_monthly_row_shape() {
        let row = doc! { "_id": "2025-03", "revenue": 120.5, "transactions": 3 };
        let month: MonthlyRevenue = bson::from_document(row).unwrap();
        assert_eq!(month.month, "2025-03");
        assert_eq!(month.transactions, 3);
    }
}
