pub mod announcement_repo;
pub mod event_repo;
pub mod job_repo;
pub mod payment_repo;
pub mod repository_error;
pub mod user_repo;

use std::collections::BTreeMap;
use std::time::Duration;

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::{ClientOptions, Credential, ResolverConfig};
use mongodb::{Client, Collection, Database};
use serde::Deserialize;
use tracing::info;

use crate::config::MongoConfig;
use crate::repository::repository_error::RepositoryResult;
use crate::util::time;

pub use announcement_repo::{AnnouncementFilter, AnnouncementRepository, MongoAnnouncementRepository};
pub use event_repo::{EventFilter, EventRepository, MongoEventRepository};
pub use job_repo::{JobFilter, JobRepository, MongoJobRepository};
pub use payment_repo::{MonthlyRevenue, MongoPaymentRepository, PaymentFilter, PaymentRepository};
pub use repository_error::RepositoryError;
pub use user_repo::{MongoUserRepository, UserFilter, UserRepository};

/// Opens the pooled client every repository shares.
pub async fn connect(config: &MongoConfig) -> Result<Database, mongodb::error::Error> {
    let mut client_options =
        ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
    client_options.app_name = Some("AlumniBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(Duration::from_secs(config.connection_timeout_secs));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    let client = Client::with_options(client_options)?;
    info!(database = %config.database, "MongoDB client ready");
    Ok(client.database(&config.database))
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(page: u64, limit: u64) -> Self {
        Page { page: page.max(1), limit: limit.max(1) }
    }

    /// Documents to skip, capped at what the server accepts as a 64-bit signed skip.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Inclusive `createdAt` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn to_document(&self) -> Document {
        doc! { "$gte": time::format(&self.start), "$lte": time::format(&self.end) }
    }
}

/// Combines conditions so that none overwrites another.
pub(crate) fn all_of(mut conditions: Vec<Document>) -> Document {
    match conditions.len() {
        0 => Document::new(),
        1 => conditions.remove(0),
        _ => doc! { "$and": conditions },
    }
}

/// Case-insensitive substring match on user-supplied text.
pub(crate) fn contains_ci(text: &str) -> Document {
    doc! { "$regex": escape_regex(text.trim()), "$options": "i" }
}

/// Matches `text` against any of `fields`.
pub(crate) fn search_any(fields: &[&str], text: &str) -> Document {
    let branches: Vec<Bson> = fields
        .iter()
        .map(|field| {
            let mut branch = Document::new();
            branch.insert(*field, contains_ci(text));
            Bson::Document(branch)
        })
        .collect();
    doc! { "$or": branches }
}

pub(crate) fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Deserialize)]
struct GroupCount {
    #[serde(rename = "_id")]
    key: Option<String>,
    count: i64,
}

/// Runs `$match` then `$group` on `field`, returning a key to count map.
pub(crate) async fn count_by<T: Send + Sync>(
    collection: &Collection<T>,
    filter: Document,
    field: &str,
) -> RepositoryResult<BTreeMap<String, u64>> {
    let pipeline = vec![
        doc! { "$match": filter },
        doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
    ];
    let rows: Vec<Document> = collection.aggregate(pipeline, None).await?.try_collect().await?;
    let mut counts = BTreeMap::new();
    for row in rows {
        let group: GroupCount = bson::from_document(row)?;
        if let Some(key) = group.key {
            counts.insert(key, group.count.max(0) as u64);
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_skip() {
        assert_eq!(Page::new(1, 20).skip(), 0);
        assert_eq!(Page::new(3, 20).skip(), 40);
        assert_eq!(Page::new(0, 0), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(u64::MAX, 100).skip(), i64::MAX as u64);
    }

    #[test]
    fn test_all_of_never_overwrites() {
        assert_eq!(all_of(vec![]), Document::new());
        assert_eq!(all_of(vec![doc! { "a": 1 }]), doc! { "a": 1 });
        let both = all_of(vec![doc! { "$or": [{ "a": 1 }] }, doc! { "$or": [{ "b": 2 }] }]);
        assert_eq!(both.get_array("$and").unwrap().len(), 2);
    }

    #[test]
    fn test_user_text_is_escaped() {
        assert_eq!(escape_regex("c++ (dev)"), "c\\+\\+ \\(dev\\)");
        assert_eq!(
            search_any(&["title"], " a.b "),
            doc! { "$or": [{ "title": { "$regex": "a\\.b", "$options": "i" } }] }
        );
    }
}
