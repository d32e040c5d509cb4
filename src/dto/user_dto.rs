use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{clean, not_blank, phone_number};
use crate::model::user::{Location, SocialLinks, User, UserPreferences};
use crate::util::sms::normalize_phone;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[validate(range(min = 1950, max = 2100, message = "Invalid graduation year"))]
    pub graduation_year: Option<i32>,
    pub location: Option<String>,
    pub profession: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationPatch {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SocialLinksPatch {
    #[validate(url(message = "LinkedIn must be a valid URL"))]
    pub linkedin: Option<String>,
    #[validate(url(message = "Twitter must be a valid URL"))]
    pub twitter: Option<String>,
    #[validate(url(message = "Facebook must be a valid URL"))]
    pub facebook: Option<String>,
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[validate(range(min = 1950, max = 2100, message = "Please provide a valid graduation year"))]
    pub graduation_year: Option<i32>,
    pub degree: Option<String>,
    pub major: Option<String>,
    pub profession: Option<String>,
    pub company: Option<String>,
    #[validate(nested)]
    pub location: Option<LocationPatch>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(url(message = "Profile picture must be a valid URL"))]
    pub profile_picture: Option<String>,
    #[validate(nested)]
    pub social_links: Option<SocialLinksPatch>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank", message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "not_blank", message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(custom(function = "phone_number", message = "Please provide a valid phone number"))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub profile: Option<ProfilePatch>,
}

fn set<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

impl LocationPatch {
    fn merge_into(self, location: &mut Location) {
        set(&mut location.city, clean(self.city));
        set(&mut location.country, clean(self.country));
    }
}

impl SocialLinksPatch {
    fn merge_into(self, links: &mut SocialLinks) {
        set(&mut links.linkedin, self.linkedin);
        set(&mut links.twitter, self.twitter);
        set(&mut links.facebook, self.facebook);
        set(&mut links.website, self.website);
    }
}

impl UpdateProfileRequest {
    /// Applies present keys only; nested objects merge key by key.
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        let phone = self.new_phone();
        if let Some(first_name) = clean(self.first_name) {
            user.first_name = first_name;
        }
        if let Some(last_name) = clean(self.last_name) {
            user.last_name = last_name;
        }
        set(&mut user.phone, phone);

        if let Some(patch) = self.profile {
            let profile = &mut user.profile;
            set(&mut profile.graduation_year, patch.graduation_year);
            set(&mut profile.degree, patch.degree);
            set(&mut profile.major, patch.major);
            set(&mut profile.profession, patch.profession);
            set(&mut profile.company, patch.company);
            set(&mut profile.bio, patch.bio);
            set(&mut profile.profile_picture, patch.profile_picture);
            if let Some(location) = patch.location {
                location.merge_into(profile.location.get_or_insert_with(Location::default));
            }
            if let Some(links) = patch.social_links {
                links.merge_into(profile.social_links.get_or_insert_with(SocialLinks::default));
            }
            if let Some(skills) = patch.skills {
                profile.skills = skills;
            }
            if let Some(interests) = patch.interests {
                profile.interests = interests;
            }
        }
        user.updated_at = now;
    }

    /// Normalized phone number the update would set, for the uniqueness check.
    pub fn new_phone(&self) -> Option<String> {
        clean(self.phone.clone()).and_then(|p| normalize_phone(&p))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPatch {
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
    pub show_location: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    #[validate(nested)]
    pub privacy: Option<PrivacyPatch>,
}

impl UpdatePreferencesRequest {
    pub fn apply(self, preferences: &mut UserPreferences) {
        let flags = [
            (&mut preferences.email_notifications, self.email_notifications),
            (&mut preferences.sms_notifications, self.sms_notifications),
            (&mut preferences.push_notifications, self.push_notifications),
        ];
        for (target, value) in flags {
            if let Some(value) = value {
                *target = value;
            }
        }
        if let Some(privacy) = self.privacy {
            let target = &mut preferences.privacy;
            target.show_email = privacy.show_email.unwrap_or(target.show_email);
            target.show_phone = privacy.show_phone.unwrap_or(target.show_phone);
            target.show_location = privacy.show_location.unwrap_or(target.show_location);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Role;
    use chrono::TimeZone;

    fn user() -> User {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut user = User::new("Ayan".into(), "Ali".into(), "ayan@example.com".into(), "h".into(), Role::Alumni, now);
        user.profile.location = Some(Location { city: Some("Hargeisa".into()), country: Some("Somaliland".into()) });
        user.profile.profession = Some("Nurse".into());
        user
    }

    #[test]
    fn test_profile_merge_keeps_unmentioned_keys() {
        let mut user = user();
        let request: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "lastName": "Farah",
            "profile": { "location": { "city": "Berbera" }, "company": "MoH" }
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        request.apply(&mut user, Utc::now());

        assert_eq!(user.first_name, "Ayan");
        assert_eq!(user.last_name, "Farah");
        assert_eq!(user.profile.profession.as_deref(), Some("Nurse"));
        assert_eq!(user.profile.company.as_deref(), Some("MoH"));
        let location = user.profile.location.unwrap();
        assert_eq!(location.city.as_deref(), Some("Berbera"));
        assert_eq!(location.country.as_deref(), Some("Somaliland"));
    }

    #[test]
    fn test_nested_url_is_validated() {
        let request: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "profile": { "socialLinks": { "linkedin": "not a url" } }
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_preferences_merge() {
        let mut preferences = UserPreferences::default();
        let request: UpdatePreferencesRequest = serde_json::from_value(serde_json::json!({
            "smsNotifications": false,
            "privacy": { "showEmail": true }
        }))
        .unwrap();
        request.apply(&mut preferences);
        assert!(preferences.email_notifications);
        assert!(!preferences.sms_notifications);
        assert!(preferences.privacy.show_email);
        assert!(preferences.privacy.show_location);
    }
}
