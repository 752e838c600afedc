//! EHS Learn 前端应用
//!
//! 采用 Context-Driven 的架构：
//! - `web::route`: 路由定义与访问级别
//! - `web::router`: 路由服务（守卫 + History）
//! - `auth`: 会话状态管理
//! - `components`: UI 组件层
//!
//! 业务状态机（测评、培训流程、素材完成度）都在 `ehs_learn` 核心库中。

mod auth;
mod components {
    pub mod admin;
    pub mod assessment;
    pub mod dashboard;
    pub mod domain_select;
    pub mod login;
    pub mod material_viewer;
    pub mod toast;
    pub mod training;
}
pub mod logging;

use crate::auth::{AuthContext, compiled_config, init_auth};
use crate::components::admin::AdminPage;
use crate::components::dashboard::DashboardPage;
use crate::components::domain_select::DomainSelectPage;
use crate::components::login::LoginPage;
use crate::components::training::TrainingPage;

use leptos::prelude::*;

// 浏览器原生 API 封装：fetch、localStorage、setInterval、History
pub(crate) mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use http::FetchHttpClient;
    pub use storage::WebStorage;
    pub use timer::Interval;
}

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet};

/// 路由匹配函数
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::DomainSelect => view! { <DomainSelectPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::Admin => view! { <AdminPage /> }.into_any(),
        AppRoute::Training(id) => view! { <TrainingPage id=id /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link route=AppRoute::Dashboard class="btn btn-primary mt-6">
                        "Back to dashboard"
                    </Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建认证上下文
    let auth_ctx = AuthContext::new(compiled_config());
    provide_context(auth_ctx);

    // 2. 从 localStorage 水合会话
    init_auth(&auth_ctx);

    // 3. 会话信号注入路由服务
    let session = auth_ctx.session_signal();

    view! {
        <Router session=session>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
