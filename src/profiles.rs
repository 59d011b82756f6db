//! Profile picker rules
//!
//! Limits are enforced locally before any request goes out: at most five
//! profiles, names must not be blank, and the last profile cannot be
//! deleted.

use thiserror::Error;

use crate::api::{ApiClient, ApiError, NewProfile, ProfileUpdate};
use crate::models::{Profile, DEFAULT_AVATARS};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile limit reached ({max})", max = Profile::MAX_PER_ACCOUNT)]
    LimitReached,

    #[error("Profile name cannot be empty")]
    EmptyName,

    #[error("At least one profile must remain")]
    LastProfile,

    #[error("No profile with id {0}")]
    Unknown(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Profiles of the signed-in account
#[derive(Debug, Clone, Default)]
pub struct Profiles {
    items: Vec<Profile>,
    /// Listing failed; showing the local stand-in
    pub fallback: bool,
}

impl Profiles {
    pub fn new(items: Vec<Profile>) -> Self {
        Self {
            items,
            fallback: false,
        }
    }

    /// Single local "Profile 1" used when the backend listing fails
    pub fn fallback() -> Self {
        Self {
            items: vec![Profile::fallback()],
            fallback: true,
        }
    }

    pub fn items(&self) -> &[Profile] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn can_add(&self) -> bool {
        self.items.len() < Profile::MAX_PER_ACCOUNT
    }

    /// Avatar the next new profile receives
    pub fn next_avatar(&self) -> &'static str {
        DEFAULT_AVATARS[self.items.len() % DEFAULT_AVATARS.len()]
    }

    /// Validate a create request and build its body
    pub fn prepare_new(&self, name: &str) -> Result<NewProfile, ProfileError> {
        if !self.can_add() {
            return Err(ProfileError::LimitReached);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(NewProfile {
            name: name.to_string(),
            avatar: self.next_avatar().to_string(),
            is_kids: false,
        })
    }

    pub fn check_delete(&self, id: &str) -> Result<(), ProfileError> {
        if self.get(id).is_none() {
            return Err(ProfileError::Unknown(id.to_string()));
        }
        if self.items.len() <= 1 {
            return Err(ProfileError::LastProfile);
        }
        Ok(())
    }

    fn check_rename(&self, id: &str, name: &str) -> Result<(), ProfileError> {
        if self.get(id).is_none() {
            return Err(ProfileError::Unknown(id.to_string()));
        }
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Backend operations
    // -------------------------------------------------------------------------

    /// Fetch the account's profiles, falling back to the local stand-in
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        match api.profiles().await {
            Ok(items) if !items.is_empty() => Ok(Self::new(items)),
            Ok(_) => Ok(Self::fallback()),
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "could not load profiles, using fallback");
                Ok(Self::fallback())
            }
        }
    }

    pub async fn create(&mut self, api: &ApiClient, name: &str) -> Result<&Profile, ProfileError> {
        let body = self.prepare_new(name)?;
        let created = api.create_profile(&body).await?;
        tracing::info!(profile = %created.name, "profile created");
        self.items.push(created);
        let idx = self.items.len() - 1;
        Ok(&self.items[idx])
    }

    pub async fn rename(
        &mut self,
        api: &ApiClient,
        id: &str,
        name: &str,
    ) -> Result<(), ProfileError> {
        self.check_rename(id, name)?;
        let name = name.trim().to_string();
        let update = ProfileUpdate {
            name: Some(name.clone()),
            ..ProfileUpdate::default()
        };
        api.update_profile(id, &update).await?;
        if let Some(p) = self.items.iter_mut().find(|p| p.id == id) {
            p.name = name;
        }
        Ok(())
    }

    pub async fn delete(&mut self, api: &ApiClient, id: &str) -> Result<(), ProfileError> {
        self.check_delete(id)?;
        api.delete_profile(id).await?;
        self.items.retain(|p| p.id != id);
        tracing::info!(profile = id, "profile deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.into(),
            name: format!("P{}", id),
            avatar: String::new(),
            is_kids: false,
        }
    }

    #[test]
    fn test_create_refused_at_limit() {
        let full = Profiles::new((0..5).map(|i| profile(&i.to_string())).collect());
        assert!(matches!(full.prepare_new("Six"), Err(ProfileError::LimitReached)));
    }

    #[test]
    fn test_create_refuses_blank_name() {
        let p = Profiles::new(vec![profile("a")]);
        assert!(matches!(p.prepare_new("   "), Err(ProfileError::EmptyName)));
    }

    #[test]
    fn test_avatar_round_robin() {
        let p = Profiles::new((0..1).map(|i| profile(&i.to_string())).collect());
        let body = p.prepare_new(" Kid ").unwrap();
        assert_eq!(body.name, "Kid");
        assert_eq!(body.avatar, DEFAULT_AVATARS[1]);
        assert!(!body.is_kids);

        let four = Profiles::new((0..4).map(|i| profile(&i.to_string())).collect());
        assert_eq!(four.next_avatar(), DEFAULT_AVATARS[0]);
    }

    #[test]
    fn test_last_profile_cannot_be_deleted() {
        let one = Profiles::new(vec![profile("a")]);
        assert!(matches!(one.check_delete("a"), Err(ProfileError::LastProfile)));

        let two = Profiles::new(vec![profile("a"), profile("b")]);
        assert!(two.check_delete("a").is_ok());
        assert!(matches!(two.check_delete("zz"), Err(ProfileError::Unknown(_))));
    }

    #[test]
    fn test_fallback() {
        let p = Profiles::fallback();
        assert!(p.fallback);
        assert_eq!(p.items()[0].name, "Profile 1");
    }
}
