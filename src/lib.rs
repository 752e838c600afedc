//! EHS Learn 客户端核心
//!
//! 与浏览器无关的部分都在这里，便于在本地直接测试：
//! 认证客户端（含令牌刷新）、会话与路由守卫、测评引擎、培训流程以及素材展示逻辑。
//! 浏览器适配（fetch、localStorage、定时器）由前端 crate 实现 `HttpClient` / `KeyValueStore`。

pub mod api;
pub mod assessment;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod material;
pub mod request;
pub mod session;
pub mod storage;
pub mod token;
pub mod training;

pub use ehs_learn_shared as shared;

pub use api::LearnApi;
pub use assessment::{AssessmentEngine, AssessmentError, AssessmentState, Step, Tick};
pub use client::{AuthClient, RefreshState};
pub use config::ClientConfig;
pub use error::{ApiError, ApiErrorStatus, ApiResult};
pub use guard::{Destination, GuardDecision, RouteAccess, guard, home_for};
pub use material::{MaterialError, MaterialKind, ModuleEvent, ModuleProgress, ViewerPlan};
pub use request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use session::Session;
pub use storage::{KeyValueStore, MemoryStore};
pub use token::TokenStore;
pub use training::{
    Improvement, Phase, PhaseChange, TrainingError, TrainingFlow, TrainingOutcome, TrainingSource,
};
