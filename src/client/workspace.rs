//! Session and workspace-level client state.

use std::sync::Arc;

use log::{error, info};
use parking_lot::Mutex;

use super::{ApiClient, ClientResult};
use crate::models::project::ProjectOverview;
use crate::models::user::User;

/// The signed-in user. Logging in installs the token on the client.
pub struct Session<C: ApiClient + ?Sized> {
    client: Arc<C>,
    current: Mutex<Option<(User, String)>>,
}

impl<C: ApiClient + ?Sized> Session<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            current: Mutex::new(None),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let response = self
            .client
            .login(email, password)
            .await
            .inspect_err(|e| error!("Login failed for {}: {}", email, e))?;

        self.client.set_token(Some(response.token.clone()));
        *self.current.lock() = Some((response.user.clone(), response.token));
        info!("Signed in as user {}", response.user.id);
        Ok(response.user)
    }

    pub fn logout(&self) {
        self.client.set_token(None);
        *self.current.lock() = None;
    }

    pub fn user(&self) -> Option<User> {
        self.current.lock().as_ref().map(|(user, _)| user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current.lock().as_ref().map(|(_, token)| token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.lock().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProjectsState {
    pub user_id: Option<i32>,
    pub projects: Vec<ProjectOverview>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The caller's project list.
pub struct UserProjectsStore<C: ApiClient + ?Sized> {
    client: Arc<C>,
    state: Mutex<UserProjectsState>,
}

impl<C: ApiClient + ?Sized> UserProjectsStore<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Mutex::new(UserProjectsState::default()),
        }
    }

    pub fn snapshot(&self) -> UserProjectsState {
        self.state.lock().clone()
    }

    pub async fn load(&self, user_id: i32) -> ClientResult<()> {
        {
            let mut state = self.state.lock();
            state.user_id = Some(user_id);
            state.is_loading = true;
            state.error = None;
        }

        let result = self.client.get_user_projects(user_id).await;
        let mut state = self.state.lock();
        state.is_loading = false;
        match result {
            Ok(response) => {
                state.projects = response.projects;
                Ok(())
            }
            Err(err) => {
                error!("Failed to load projects of user {}: {}", user_id, err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Reloads for the last loaded user; a no-op before the first load.
    pub async fn refetch(&self) -> ClientResult<()> {
        let user_id = self.state.lock().user_id;
        match user_id {
            Some(user_id) => self.load(user_id).await,
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersState {
    pub users: Vec<User>,
    pub loaded: bool,
    pub error: Option<String>,
}

/// Every user, fetched once and then served from memory.
pub struct UsersDirectory<C: ApiClient + ?Sized> {
    client: Arc<C>,
    state: Mutex<UsersState>,
}

impl<C: ApiClient + ?Sized> UsersDirectory<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Mutex::new(UsersState::default()),
        }
    }

    pub fn snapshot(&self) -> UsersState {
        self.state.lock().clone()
    }

    pub async fn fetch(&self) -> ClientResult<()> {
        if self.state.lock().loaded {
            return Ok(());
        }

        let result = self.client.get_users().await;
        let mut state = self.state.lock();
        match result {
            Ok(users) => {
                state.users = users;
                state.loaded = true;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                error!("Failed to fetch users: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn find(&self, user_id: i32) -> Option<User> {
        self.state
            .lock()
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::project_details::tests::{sample_details, FakeClient};

    #[tokio::test]
    async fn login_and_logout() {
        let session = Session::new(Arc::new(FakeClient::new(sample_details())));
        assert!(!session.is_authenticated());

        let user = session.login("sarah.chen@company.com", "password123").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(session.token().as_deref(), Some("token"));

        session.logout();
        assert_eq!(session.user(), None);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn projects_load_and_refetch() {
        let client = Arc::new(FakeClient::new(sample_details()));
        let store = UserProjectsStore::new(client.clone());

        store.refetch().await.unwrap();
        assert!(client.calls.lock().is_empty());

        store.load(1).await.unwrap();
        store.refetch().await.unwrap();
        let state = store.snapshot();
        assert_eq!(state.projects.len(), 1);
        assert!(!state.is_loading);
        assert_eq!(client.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn project_errors_are_recorded() {
        let mut client = FakeClient::new(sample_details());
        client.fail_all = true;
        let store = UserProjectsStore::new(Arc::new(client));

        assert!(store.load(1).await.is_err());
        assert_eq!(store.snapshot().error.as_deref(), Some("Unauthorized: Invalid token"));
    }

    #[tokio::test]
    async fn users_are_fetched_once() {
        let client = Arc::new(FakeClient::new(sample_details()));
        let directory = UsersDirectory::new(client.clone());

        directory.fetch().await.unwrap();
        directory.fetch().await.unwrap();

        assert_eq!(*client.calls.lock(), vec!["get_users".to_string()]);
        assert_eq!(directory.find(1).map(|user| user.name).as_deref(), Some("Sarah Chen"));
        assert_eq!(directory.find(2), None);
    }

    #[tokio::test]
    async fn failed_user_fetch_can_be_retried() {
        let mut client = FakeClient::new(sample_details());
        client.fail_all = true;
        let directory = UsersDirectory::new(Arc::new(client));

        assert!(directory.fetch().await.is_err());
        let state = directory.snapshot();
        assert!(!state.loaded);
        assert_eq!(state.error.as_deref(), Some("Network error: connection refused"));
    }
}
