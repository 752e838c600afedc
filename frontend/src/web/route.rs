//! 路由定义模块 - 领域模型
//!
//! 纯粹的路由表，不依赖于 DOM 或 web_sys。
//! 每个路由声明自己的访问级别，守卫逻辑由核心库的 `guard` 统一判定。

use std::fmt::Display;

use ehs_learn::shared::Role;
use ehs_learn::{Destination, RouteAccess};

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面 (默认路由)
    #[default]
    Login,
    DomainSelect,
    /// 学员首页：培训列表
    Dashboard,
    /// 管理员首页
    Admin,
    /// 培训流程页
    Training(String),
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/login" => Self::Login,
            "/select-domain" => Self::DomainSelect,
            "/dashboard" => Self::Dashboard,
            "/admin" => Self::Admin,
            _ => match trimmed.strip_prefix("/training/") {
                Some(id) if !id.is_empty() && !id.contains('/') => urlencoding::decode(id)
                    .map(|id| Self::Training(id.into_owned()))
                    .unwrap_or(Self::NotFound),
                _ => Self::NotFound,
            },
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::DomainSelect => "/select-domain".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::Training(id) => format!("/training/{}", urlencoding::encode(id)),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// 访问级别
    pub fn access(&self) -> RouteAccess {
        match self {
            Self::Login => RouteAccess::GuestOnly,
            Self::DomainSelect => RouteAccess::Authenticated,
            Self::Dashboard | Self::Training(_) => RouteAccess::LearnerArea,
            Self::Admin => RouteAccess::AdminOnly,
            Self::NotFound => RouteAccess::Public,
        }
    }

    /// 守卫重定向目标对应的路由
    pub fn from_destination(destination: Destination) -> Self {
        match destination {
            Destination::Login => Self::Login,
            Destination::DomainSelection => Self::DomainSelect,
            Destination::Home(Role::Admin) => Self::Admin,
            Destination::Home(Role::Learner) => Self::Dashboard,
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/dashboard/"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/training/t-1"), AppRoute::Training("t-1".into()));
        assert_eq!(AppRoute::from_path("/training/"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn test_training_id_is_percent_decoded() {
        assert_eq!(AppRoute::from_path("/training/t%201"), AppRoute::Training("t 1".into()));
        assert_eq!(AppRoute::from_path("/training/%FF"), AppRoute::NotFound);

        let route = AppRoute::Training("a/b c".into());
        assert_eq!(route.to_path(), "/training/a%2Fb%20c");
        assert_eq!(AppRoute::from_path(&route.to_path()), route);
    }

    #[test]
    fn test_round_trip_and_access() {
        let route = AppRoute::Training("t-1".into());
        assert_eq!(AppRoute::from_path(&route.to_path()), route);
        assert_eq!(route.access(), RouteAccess::LearnerArea);
        assert_eq!(
            AppRoute::from_destination(Destination::Home(Role::Admin)),
            AppRoute::Admin
        );
    }
}
