//! User registration.

use chrono::Utc;
use common::{User, UserId, UserProfile};
use document_store::{DocumentStore, UserFilter};

use crate::error::{CommerceError, Result};
use crate::settings::EngineSettings;
use crate::store_call::StoreGateway;

#[derive(Clone)]
pub struct UserService<S> {
    gateway: StoreGateway<S>,
}

impl<S: DocumentStore + Clone> UserService<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            gateway: StoreGateway::new(store, settings),
        }
    }

    /// Creates a user with an empty cart, address book and order history.
    ///
    /// Email and phone must both be unused.
    #[tracing::instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn register(&self, profile: UserProfile) -> Result<User> {
        let profile = normalize(profile)?;

        let probe = UserFilter::new()
            .email(profile.email.clone())
            .phone(profile.phone.clone())
            .any_of();
        if self.gateway.count_users(probe).await? > 0 {
            return Err(CommerceError::DuplicateUser(
                "email or phone number already in use".to_string(),
            ));
        }

        // The store's unique keys still catch a registration racing this one
        let user = User::new(profile, Utc::now());
        self.gateway.insert_user(user.clone()).await?;

        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    /// Loads a user document.
    pub async fn get_user(&self, user_id: UserId) -> Result<User> {
        Ok(self.gateway.load_user(user_id).await?.user)
    }
}

fn normalize(profile: UserProfile) -> Result<UserProfile> {
    let profile = UserProfile {
        first_name: profile.first_name.trim().to_string(),
        last_name: profile.last_name.trim().to_string(),
        email: profile.email.trim().to_ascii_lowercase(),
        phone: profile.phone.trim().to_string(),
    };

    if profile.first_name.is_empty() || profile.last_name.is_empty() {
        return Err(CommerceError::InvalidInput(
            "first and last name are required".to_string(),
        ));
    }
    if !profile.email.contains('@') {
        return Err(CommerceError::InvalidInput(format!(
            "'{}' is not an email address",
            profile.email
        )));
    }
    if profile.phone.is_empty() {
        return Err(CommerceError::InvalidInput(
            "phone number is required".to_string(),
        ));
    }
    Ok(profile)
}
