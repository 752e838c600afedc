//! 认证模块
//!
//! 管理会话状态，与路由系统解耦：路由服务只读取注入的会话信号。
//! API 客户端持有浏览器资源（非 Send），以本地 StoredValue 保存在上下文中。

use std::rc::Rc;

use ehs_learn::config::{VAR_API_BASE_URL, VAR_REFRESH_PATH, VAR_REQUEST_TIMEOUT_MS};
use ehs_learn::shared::Domain;
use ehs_learn::{ApiResult, ClientConfig, LearnApi, Session, TokenStore};
use leptos::prelude::*;

use crate::web::{FetchHttpClient, WebStorage};

pub type Api = LearnApi<FetchHttpClient, WebStorage>;

/// 认证上下文
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub session: RwSignal<Session>,
    api: StoredValue<Rc<Api>, LocalStorage>,
}

impl AuthContext {
    pub fn new(config: ClientConfig) -> Self {
        let http = FetchHttpClient::new(config.request_timeout_ms);
        let api = LearnApi::new(http, TokenStore::new(WebStorage), config);
        Self {
            session: RwSignal::new(Session::anonymous()),
            api: StoredValue::new_local(Rc::new(api)),
        }
    }

    pub fn api(&self) -> Rc<Api> {
        self.api.get_value()
    }

    /// 会话信号（用于路由服务注入）
    pub fn session_signal(&self) -> Signal<Session> {
        self.session.into()
    }
}

/// 编译期环境变量中的配置
pub fn compiled_config() -> ClientConfig {
    ClientConfig::from_lookup(|name| {
        let value = match name {
            VAR_API_BASE_URL => option_env!("EHS_API_BASE_URL"),
            VAR_REFRESH_PATH => option_env!("EHS_REFRESH_PATH"),
            VAR_REQUEST_TIMEOUT_MS => option_env!("EHS_REQUEST_TIMEOUT_MS"),
            _ => None,
        };
        value.map(str::to_string)
    })
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 初始化认证状态
///
/// 从 localStorage 水合会话，并注册令牌刷新失败时的回调。
pub fn init_auth(ctx: &AuthContext) {
    let api = ctx.api();
    ctx.session.set(Session::hydrate(api.tokens()));

    let session = ctx.session;
    api.set_session_expired_handler(move || {
        tracing::warn!("session expired, returning to login");
        session.set(Session::anonymous());
    });
}

/// 登录成功后更新会话，路由服务会自动跳转到对应首页
pub async fn login(ctx: &AuthContext, email: String, password: String) -> ApiResult<()> {
    let api = ctx.api();
    let session = Session::login(&api, &email, &password).await?;
    ctx.session.set(session);
    Ok(())
}

/// 注销并清除存储，导航由路由服务的会话监听处理
pub fn logout(ctx: &AuthContext) {
    let api = ctx.api();
    ctx.session.update(|session| session.logout(&api));
}

pub async fn select_domain(ctx: &AuthContext, domain: Domain) -> ApiResult<()> {
    let api = ctx.api();
    let mut session = ctx.session.get_untracked();
    session.select_domain(&api, domain).await?;
    ctx.session.set(session);
    Ok(())
}
