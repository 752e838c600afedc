//! 路由守卫
//!
//! 每个路由声明一个访问级别，导航、浏览器前进/后退以及会话变化时重新判定。

use ehs_learn_shared::Role;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// 仅限未登录（登录页）
    GuestOnly,
    /// 已登录即可，不要求领域（领域选择页）
    Authenticated,
    /// 学员区域：学员必须已选领域，管理员直接放行
    LearnerArea,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Login,
    DomainSelection,
    Home(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Destination),
}

/// 会话对应的落地页
pub fn home_for(session: &Session) -> Destination {
    if !session.is_authenticated() {
        Destination::Login
    } else if session.is_admin() {
        Destination::Home(Role::Admin)
    } else if session.needs_domain() {
        Destination::DomainSelection
    } else {
        Destination::Home(Role::Learner)
    }
}

pub fn guard(access: RouteAccess, session: &Session) -> GuardDecision {
    let decision = match access {
        RouteAccess::Public => GuardDecision::Allow,
        _ if !session.is_authenticated() => match access {
            RouteAccess::GuestOnly => GuardDecision::Allow,
            _ => GuardDecision::Redirect(Destination::Login),
        },
        RouteAccess::GuestOnly => GuardDecision::Redirect(home_for(session)),
        RouteAccess::Authenticated => GuardDecision::Allow,
        RouteAccess::LearnerArea if session.needs_domain() => {
            GuardDecision::Redirect(Destination::DomainSelection)
        }
        RouteAccess::LearnerArea => GuardDecision::Allow,
        RouteAccess::AdminOnly if session.is_admin() => GuardDecision::Allow,
        RouteAccess::AdminOnly => GuardDecision::Redirect(home_for(session)),
    };

    if let GuardDecision::Redirect(to) = decision {
        tracing::debug!(?access, ?to, "route guard redirect");
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::test_user;
    use ehs_learn_shared::Domain;

    fn learner(with_domain: bool) -> Session {
        let mut user = test_user();
        if with_domain {
            user.domain = Some(Domain {
                id: "d-1".into(),
                name: "Fire Safety".into(),
                description: None,
            });
        }
        Session::authenticated(user)
    }

    fn admin() -> Session {
        let mut user = test_user();
        user.role = Role::Admin;
        Session::authenticated(user)
    }

    #[test]
    fn test_anonymous() {
        let s = Session::anonymous();
        assert_eq!(guard(RouteAccess::Public, &s), GuardDecision::Allow);
        assert_eq!(guard(RouteAccess::GuestOnly, &s), GuardDecision::Allow);
        for access in [RouteAccess::Authenticated, RouteAccess::LearnerArea, RouteAccess::AdminOnly] {
            assert_eq!(guard(access, &s), GuardDecision::Redirect(Destination::Login));
        }
    }

    #[test]
    fn test_learner_without_domain() {
        let s = learner(false);
        assert_eq!(
            guard(RouteAccess::GuestOnly, &s),
            GuardDecision::Redirect(Destination::DomainSelection)
        );
        assert_eq!(guard(RouteAccess::Authenticated, &s), GuardDecision::Allow);
        assert_eq!(
            guard(RouteAccess::LearnerArea, &s),
            GuardDecision::Redirect(Destination::DomainSelection)
        );
    }

    #[test]
    fn test_learner_with_domain() {
        let s = learner(true);
        assert_eq!(guard(RouteAccess::LearnerArea, &s), GuardDecision::Allow);
        assert_eq!(
            guard(RouteAccess::GuestOnly, &s),
            GuardDecision::Redirect(Destination::Home(Role::Learner))
        );
        assert_eq!(
            guard(RouteAccess::AdminOnly, &s),
            GuardDecision::Redirect(Destination::Home(Role::Learner))
        );
    }

    #[test]
    fn test_admin() {
        let s = admin();
        assert_eq!(guard(RouteAccess::AdminOnly, &s), GuardDecision::Allow);
        assert_eq!(guard(RouteAccess::LearnerArea, &s), GuardDecision::Allow);
        assert_eq!(
            guard(RouteAccess::GuestOnly, &s),
            GuardDecision::Redirect(Destination::Home(Role::Admin))
        );
    }
}
