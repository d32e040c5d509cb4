use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::stream::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use crate::model::user::{Role, User};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::{all_of, contains_ci, count_by, search_any, DateRange, Page, Paged};

/// Which users a query should return. Empty vectors mean "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub active: Option<bool>,
    pub roles: Vec<Role>,
    pub graduation_years: Vec<i32>,
    /// Case-insensitive substrings of `profile.location.city`
    pub locations: Vec<String>,
    pub profession: Option<String>,
    pub search: Option<String>,
    pub created: Option<DateRange>,
}

impl UserFilter {
    pub fn active() -> Self {
        UserFilter { active: Some(true), ..Default::default() }
    }

    pub fn to_document(&self) -> Document {
        let mut conditions = Vec::new();
        if let Some(active) = self.active {
            conditions.push(doc! { "isActive": active });
        }
        if !self.roles.is_empty() {
            let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
            conditions.push(doc! { "role": { "$in": roles } });
        }
        if !self.graduation_years.is_empty() {
            conditions.push(doc! { "profile.graduationYear": { "$in": self.graduation_years.clone() } });
        }
        if !self.locations.is_empty() {
            let cities: Vec<Bson> = self
                .locations
                .iter()
                .map(|city| Bson::Document(doc! { "profile.location.city": contains_ci(city) }))
                .collect();
            conditions.push(doc! { "$or": cities });
        }
        if let Some(profession) = &self.profession {
            conditions.push(doc! { "profile.profession": contains_ci(profession) });
        }
        if let Some(search) = &self.search {
            conditions.push(search_any(
                &["firstName", "lastName", "email", "profile.profession", "profile.company"],
                search,
            ));
        }
        if let Some(range) = &self.created {
            conditions.push(doc! { "createdAt": range.to_document() });
        }
        all_of(conditions)
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn save(&self, user: &User) -> RepositoryResult<()>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<User>>;
    /// Newest first
    async fn find_page(&self, filter: &UserFilter, page: Page) -> RepositoryResult<Paged<User>>;
    async fn find_all(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>>;
    async fn count(&self, filter: &UserFilter) -> RepositoryResult<u64>;
    /// Active users per role
    async fn count_by_role(&self) -> RepositoryResult<BTreeMap<String, u64>>;
    /// Distinct graduation years of active users, newest first
    async fn graduation_years(&self) -> RepositoryResult<Vec<i32>>;
    /// Distinct non-empty cities of active users, sorted
    async fn cities(&self) -> RepositoryResult<Vec<String>>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        MongoUserRepository { collection: db.collection::<User>("users") }
    }

    /// Unique email, and unique phone where one is set.
    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let phone = IndexModel::builder()
            .keys(doc! { "phone": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();
        self.collection.create_indexes(vec![email, phone], None).await?;
        info!("User indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        match self.collection.insert_one(&user, None).await {
            Ok(_) => {
                info!("User inserted");
                Ok(user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, user), fields(id = ?user.id))]
    async fn save(&self, user: &User) -> RepositoryResult<()> {
        let id = user
            .id
            .ok_or_else(|| RepositoryError::validation("Cannot save a user without an id"))?;
        let result = self.collection.replace_one(doc! { "_id": id }, user, None).await?;
        if result.matched_count == 0 {
            error!("No user found to update for ID: {}", id);
            return Err(RepositoryError::not_found(format!("No user found for ID: {}", id)));
        }
        debug!("User saved");
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        self.collection
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by id: {}", e)))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim().to_lowercase();
        self.collection
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by email: {}", e)))
    }

    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>> {
        self.collection
            .find_one(doc! { "phone": phone.trim() }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by phone: {}", e)))
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection.find(doc! { "_id": { "$in": ids.to_vec() } }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn find_page(&self, filter: &UserFilter, page: Page) -> RepositoryResult<Paged<User>> {
        let query = filter.to_document();
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let items: Vec<User> = self.collection.find(query.clone(), options).await?.try_collect().await?;
        let total = self.collection.count_documents(query, None).await?;
        debug!(returned = items.len(), total, "User page fetched");
        Ok(Paged { items, total })
    }

    async fn find_all(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.collection.find(filter.to_document(), options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, filter: &UserFilter) -> RepositoryResult<u64> {
        Ok(self.collection.count_documents(filter.to_document(), None).await?)
    }

    async fn count_by_role(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        count_by(&self.collection, UserFilter::active().to_document(), "role").await
    }

    async fn graduation_years(&self) -> RepositoryResult<Vec<i32>> {
        let values = self
            .collection
            .distinct("profile.graduationYear", doc! { "isActive": true }, None)
            .await?;
        let mut years: Vec<i32> = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::Int32(y) => Some(y),
                Bson::Int64(y) => i32::try_from(y).ok(),
                _ => None,
            })
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn cities(&self) -> RepositoryResult<Vec<String>> {
        let values = self
            .collection
            .distinct("profile.location.city", doc! { "isActive": true }, None)
            .await?;
        let mut cities: Vec<String> = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(city) if !city.trim().is_empty() => Some(city),
                _ => None,
            })
            .collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }
}
