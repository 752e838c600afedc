//! 认证会话
//!
//! 会话是一个普通值，由前端通过上下文注入，不使用全局状态。
//! 启动时从令牌存储水合，注销或刷新失败时清空。

use ehs_learn_shared::{Domain, Role, User};

use crate::api::LearnApi;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;
use crate::storage::KeyValueStore;
use crate::token::TokenStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    is_authenticated: bool,
    selected_domain: Option<Domain>,
}

impl Session {
    /// 未登录状态
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            selected_domain: user.domain.clone(),
            user: Some(user),
            is_authenticated: true,
        }
    }

    /// 同时存有令牌和用户记录才视为已登录
    pub fn hydrate<S: KeyValueStore>(tokens: &TokenStore<S>) -> Self {
        match (tokens.token(), tokens.user()) {
            (Some(_), Some(user)) => {
                tracing::debug!(user = %user.id, "session restored from storage");
                Self::authenticated(user)
            }
            _ => Self::anonymous(),
        }
    }

    pub async fn login<C: HttpClient, S: KeyValueStore>(
        api: &LearnApi<C, S>,
        email: &str,
        password: &str,
    ) -> ApiResult<Self> {
        let user = api.login(email, password).await?;
        Ok(Self::authenticated(user))
    }

    pub fn logout<C: HttpClient, S: KeyValueStore>(&mut self, api: &LearnApi<C, S>) {
        api.logout();
        *self = Self::anonymous();
    }

    /// 通知服务器并把领域写回存储中的用户记录
    pub async fn select_domain<C: HttpClient, S: KeyValueStore>(
        &mut self,
        api: &LearnApi<C, S>,
        domain: Domain,
    ) -> ApiResult<()> {
        if !self.is_authenticated {
            return Err(ApiError::unauthorized("not logged in").in_op("session.select_domain"));
        }

        let mut user = api.select_domain(&domain.id).await?;
        if user.domain.is_none() {
            user.domain = Some(domain.clone());
        }
        api.tokens().set_user(&user)?;

        tracing::info!(domain = %domain.id, "domain selected");
        self.selected_domain = user.domain.clone();
        self.user = Some(user);
        Ok(())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn selected_domain(&self) -> Option<&Domain> {
        self.selected_domain.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    /// 已登录的学员还没有选择领域
    pub fn needs_domain(&self) -> bool {
        self.is_authenticated && !self.is_admin() && self.selected_domain.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::request::MockHttpClient;
    use crate::storage::MemoryStore;
    use crate::token::tests::test_user;
    use serde_json::json;

    fn fire_safety() -> Domain {
        Domain {
            id: "d-1".into(),
            name: "Fire Safety".into(),
            description: None,
        }
    }

    fn create_api() -> LearnApi<MockHttpClient, MemoryStore> {
        LearnApi::new(
            MockHttpClient::new(),
            TokenStore::new(MemoryStore::new()),
            ClientConfig::default(),
        )
    }

    #[test]
    fn test_hydrate_requires_token_and_user() {
        let tokens = TokenStore::new(MemoryStore::new());
        assert!(!Session::hydrate(&tokens).is_authenticated());

        tokens.set_token("t");
        assert!(!Session::hydrate(&tokens).is_authenticated());

        let mut user = test_user();
        user.domain = Some(fire_safety());
        tokens.set_user(&user).unwrap();
        let session = Session::hydrate(&tokens);
        assert!(session.is_authenticated());
        assert_eq!(session.selected_domain(), Some(&fire_safety()));
        assert!(!session.needs_domain());
    }

    #[test]
    fn test_needs_domain() {
        let session = Session::authenticated(test_user());
        assert!(session.needs_domain());

        let mut admin = test_user();
        admin.role = Role::Admin;
        let session = Session::authenticated(admin);
        assert!(session.is_admin());
        assert!(!session.needs_domain());

        assert!(!Session::anonymous().needs_domain());
    }

    #[tokio::test]
    async fn test_select_domain_persists_on_stored_user() {
        let api = create_api();
        api.tokens().save_credentials("t", None, &test_user()).unwrap();
        api.client().http().mock_response(
            "/api/users/me/domain",
            200,
            json!({ "id": "u-1", "name": "Ana", "email": "ana@example.com" }),
        );

        let mut session = Session::hydrate(api.tokens());
        session.select_domain(&api, fire_safety()).await.unwrap();

        assert_eq!(session.selected_domain(), Some(&fire_safety()));
        assert_eq!(api.tokens().user().unwrap().domain, Some(fire_safety()));
        assert_eq!(Session::hydrate(api.tokens()), session);
    }

    #[tokio::test]
    async fn test_select_domain_requires_login() {
        let api = create_api();
        let mut session = Session::anonymous();
        assert!(session.select_domain(&api, fire_safety()).await.is_err());
        assert!(api.client().http().requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let api = create_api();
        api.tokens().save_credentials("t", Some("r"), &test_user()).unwrap();
        let mut session = Session::hydrate(api.tokens());

        session.logout(&api);
        assert_eq!(session, Session::anonymous());
        assert!(api.tokens().store().is_empty());
    }
}
