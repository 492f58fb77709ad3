//! Session state kept in client storage: the bearer credential and the
//! selected gym location.

use color_eyre::Result;
use std::sync::Arc;

use crate::storage::ClientStorage;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the selected location id.
pub const SELECTED_LOCATION_KEY: &str = "gymdesk:selected-location";

/// Owner of the persisted bearer credential.
///
/// Anyone may read the credential. Writing is crate-private: login and OTP
/// verification set it, logout and the transport's 401 handler clear it.
#[derive(Clone)]
pub struct CredentialStore {
  storage: Arc<dyn ClientStorage>,
}

impl CredentialStore {
  pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
    Self { storage }
  }

  /// Current token, if any. An empty stored value counts as absent.
  pub fn get(&self) -> Result<Option<String>> {
    Ok(
      self
        .storage
        .get_item(TOKEN_KEY)?
        .filter(|token| !token.is_empty()),
    )
  }

  pub fn is_authenticated(&self) -> Result<bool> {
    Ok(self.get()?.is_some())
  }

  pub(crate) fn set(&self, token: &str) -> Result<()> {
    self.storage.set_item(TOKEN_KEY, token)
  }

  pub(crate) fn clear(&self) -> Result<()> {
    self.storage.remove_item(TOKEN_KEY)
  }
}

impl std::fmt::Debug for CredentialStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CredentialStore").finish_non_exhaustive()
  }
}

/// Persisted location filter shared by the members and plans screens.
#[derive(Clone)]
pub struct LocationStore {
  storage: Arc<dyn ClientStorage>,
}

impl LocationStore {
  pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
    Self { storage }
  }

  /// Selected location id; `None` when unset or stored empty.
  pub fn selected(&self) -> Result<Option<String>> {
    Ok(
      self
        .storage
        .get_item(SELECTED_LOCATION_KEY)?
        .filter(|id| !id.is_empty()),
    )
  }

  pub fn select(&self, location_id: &str) -> Result<()> {
    self.storage.set_item(SELECTED_LOCATION_KEY, location_id)
  }

  pub fn clear(&self) -> Result<()> {
    self.storage.set_item(SELECTED_LOCATION_KEY, "")
  }
}

impl std::fmt::Debug for LocationStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocationStore").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStorage;

  #[test]
  fn test_credential_lifecycle() {
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
    let credentials = CredentialStore::new(storage.clone());

    assert!(!credentials.is_authenticated().unwrap());

    credentials.set("tok123").unwrap();
    assert_eq!(credentials.get().unwrap().as_deref(), Some("tok123"));
    assert_eq!(
      storage.get_item(TOKEN_KEY).unwrap().as_deref(),
      Some("tok123")
    );

    credentials.clear().unwrap();
    assert_eq!(credentials.get().unwrap(), None);
  }

  #[test]
  fn test_empty_token_is_absent() {
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
    storage.set_item(TOKEN_KEY, "").unwrap();

    assert_eq!(CredentialStore::new(storage).get().unwrap(), None);
  }

  #[test]
  fn test_debug_hides_storage() {
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
    storage.set_item(TOKEN_KEY, "tok123").unwrap();

    let credentials = format!("{:?}", CredentialStore::new(storage.clone()));
    let locations = format!("{:?}", LocationStore::new(storage));

    assert_eq!(credentials, "CredentialStore { .. }");
    assert_eq!(locations, "LocationStore { .. }");
  }

  #[test]
  fn test_selected_location() {
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
    let locations = LocationStore::new(storage.clone());

    assert_eq!(locations.selected().unwrap(), None);

    locations.select("loc-42").unwrap();
    assert_eq!(locations.selected().unwrap().as_deref(), Some("loc-42"));

    locations.clear().unwrap();
    assert_eq!(locations.selected().unwrap(), None);
    assert_eq!(
      storage
        .get_item(SELECTED_LOCATION_KEY)
        .unwrap()
        .as_deref(),
      Some("")
    );
  }
}
