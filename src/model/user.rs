use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Alumni,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Alumni, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alumni => "alumni",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub show_email: bool,
    pub show_phone: bool,
    pub show_location: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        PrivacySettings { show_email: false, show_phone: false, show_location: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub privacy: PrivacySettings,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            email_notifications: true,
            sms_notifications: true,
            push_notifications: true,
            privacy: PrivacySettings::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub membership_status: MembershipStatus,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        User {
            id: None,
            first_name,
            last_name,
            email: email.trim().to_lowercase(),
            phone: None,
            password_hash,
            role,
            profile: UserProfile::default(),
            preferences: UserPreferences::default(),
            is_active: true,
            membership_status: MembershipStatus::Active,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// Deactivates the account and frees its email and phone for reuse.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        let prefix = format!("deleted_{}_", now.timestamp_millis());
        self.email = format!("{}{}", prefix, self.email);
        if let Some(phone) = self.phone.take() {
            self.phone = Some(format!("{}{}", prefix, phone));
        }
        self.is_active = false;
        self.updated_at = now;
    }

    pub fn wants_email(&self) -> bool {
        self.is_active && self.preferences.email_notifications
    }

    pub fn wants_sms(&self) -> bool {
        self.is_active && self.preferences.sms_notifications && self.phone.is_some()
    }
}

/// Client-facing user document; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
    pub is_active: bool,
    pub membership_status: MembershipStatus,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserView {
    /// Everything but the hash, for the account owner and admins.
    pub fn full(user: &User) -> Self {
        UserView {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: Some(user.email.clone()),
            phone: user.phone.clone(),
            role: user.role,
            profile: user.profile.clone(),
            preferences: Some(user.preferences.clone()),
            is_active: user.is_active,
            membership_status: user.membership_status,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }

    /// Directory view honoring the owner's privacy settings.
    pub fn public(user: &User) -> Self {
        let privacy = &user.preferences.privacy;
        let mut view = Self::full(user);
        view.preferences = None;
        view.last_login = None;
        if !privacy.show_email {
            view.email = None;
        }
        if !privacy.show_phone {
            view.phone = None;
        }
        if !privacy.show_location {
            view.profile.location = None;
        }
        view
    }
}

/// Reference shape used when populating `organizer`, `author` and friends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl UserSummary {
    pub fn brief(user: &User) -> Self {
        UserSummary {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: None,
            phone: None,
            profile_picture: user.profile.profile_picture.clone(),
        }
    }

    pub fn contact(user: &User) -> Self {
        UserSummary {
            email: Some(user.email.clone()),
            phone: user.phone.clone(),
            ..Self::brief(user)
        }
    }
}
