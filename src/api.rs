use async_trait::async_trait;
use ehs_learn_shared::protocol::{
    GetTrainingRequest, ListDomainsRequest, ListTrainingsRequest, LoginRequest,
    ReportProgressRequest, SelectDomainRequest, SubmitAssessmentRequest, material_stream_path,
};
use ehs_learn_shared::{
    Ack, AssessmentKind, AssessmentResult, Domain, TrainingDefinition, TrainingSummary, User,
};

use crate::client::AuthClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;
use crate::storage::KeyValueStore;
use crate::token::TokenStore;
use crate::training::TrainingSource;

// =========================================================
// Gateway
// =========================================================

/// 远程 REST API 的类型化入口
pub struct LearnApi<C, S> {
    client: AuthClient<C, S>,
}

impl<C: HttpClient, S: KeyValueStore> LearnApi<C, S> {
    pub fn new(http: C, tokens: TokenStore<S>, config: ClientConfig) -> Self {
        Self {
            client: AuthClient::new(http, tokens, config),
        }
    }

    pub fn client(&self) -> &AuthClient<C, S> {
        &self.client
    }

    pub fn tokens(&self) -> &TokenStore<S> {
        self.client.tokens()
    }

    pub fn set_session_expired_handler(&self, handler: impl Fn() + 'static) {
        self.client.set_session_expired_handler(handler);
    }

    // --- Auth ---

    /// 登录并保存令牌、刷新令牌与用户记录
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::invalid_input("email and password are required").in_op("auth.login"));
        }

        let resp = self
            .client
            .execute(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(|e| e.in_op("auth.login"))?;

        self.tokens()
            .save_credentials(&resp.token, resp.refresh_token.as_deref(), &resp.user)?;
        self.client.rearm_session_guard();
        tracing::info!(user = %resp.user.id, role = ?resp.user.role, "logged in");
        Ok(resp.user)
    }

    /// 仅清除本地凭据，不通知服务器
    pub fn logout(&self) {
        self.tokens().clear();
        tracing::info!("logged out");
    }

    // --- Domains ---

    pub async fn list_domains(&self) -> ApiResult<Vec<Domain>> {
        self.client.execute(&ListDomainsRequest).await
    }

    /// 通知服务器用户选择的领域，返回更新后的用户
    pub async fn select_domain(&self, domain_id: &str) -> ApiResult<User> {
        self.client
            .execute(&SelectDomainRequest {
                domain_id: domain_id.to_string(),
            })
            .await
            .map_err(|e| e.in_op_with("domain.select", domain_id))
    }

    // --- Trainings ---

    pub async fn list_trainings(&self, domain_id: Option<&str>) -> ApiResult<Vec<TrainingSummary>> {
        self.client
            .execute(&ListTrainingsRequest {
                domain_id: domain_id.map(str::to_string),
            })
            .await
    }

    pub async fn get_training(&self, id: &str) -> ApiResult<TrainingDefinition> {
        self.client
            .execute(&GetTrainingRequest { id: id.to_string() })
            .await
    }

    pub async fn submit_assessment(
        &self,
        training_id: &str,
        kind: AssessmentKind,
        result: &AssessmentResult,
    ) -> ApiResult<Ack> {
        self.client
            .execute(&SubmitAssessmentRequest {
                training_id: training_id.to_string(),
                kind,
                result: result.clone(),
            })
            .await
            .map_err(|e| e.in_op_with("assessment.submit", kind.as_str()))
    }

    // --- Materials ---

    /// 上报素材进度（尽力而为，调用方可以忽略错误）
    pub async fn report_progress(&self, material_id: &str, progress: u8) -> ApiResult<Ack> {
        self.client
            .execute(&ReportProgressRequest {
                material_id: material_id.to_string(),
                progress: progress.min(100),
            })
            .await
            .map_err(|e| e.in_op_with("material.progress", material_id))
    }

    pub fn material_stream_url(&self, material_id: &str) -> String {
        self.client.config().url(&material_stream_path(material_id))
    }
}

#[async_trait(?Send)]
impl<C: HttpClient, S: KeyValueStore> TrainingSource for LearnApi<C, S> {
    async fn fetch_training(&self, id: &str) -> ApiResult<TrainingDefinition> {
        self.get_training(id).await
    }
}
