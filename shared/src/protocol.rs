use crate::{Ack, AssessmentKind, AssessmentResult, Domain, TrainingDefinition, TrainingSummary, User};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// GET 请求不携带请求体
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// Non-GET requests are sent with the request itself serialized as the JSON body.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Whether the request carries the bearer token.
    const AUTHENTICATED: bool = true;
    /// The URL path, relative to the API base URL.
    fn path(&self) -> String;
}

pub const PATH_LOGIN: &str = "/auth/login";
pub const PATH_REFRESH_TOKEN: &str = "/auth/refresh-token";

/// 素材流式地址，返回原始字节与 content-type
pub fn material_stream_path(material_id: &str) -> String {
    format!("/materials/{}/stream", urlencoding::encode(material_id))
}

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: User,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;

    fn path(&self) -> String {
        PATH_LOGIN.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}

impl ApiRequest for RefreshTokenRequest {
    type Response = RefreshTokenResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;

    fn path(&self) -> String {
        PATH_REFRESH_TOKEN.to_string()
    }
}

// =========================================================
// Domains
// =========================================================

/// List all training domains
#[derive(Debug, Serialize, Deserialize)]
pub struct ListDomainsRequest;

impl ApiRequest for ListDomainsRequest {
    type Response = Vec<Domain>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/domains".to_string()
    }
}

/// Assign the current user to a domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectDomainRequest {
    pub domain_id: String,
}

impl ApiRequest for SelectDomainRequest {
    type Response = User;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/users/me/domain".to_string()
    }
}

// =========================================================
// Trainings
// =========================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTrainingsRequest {
    pub domain_id: Option<String>,
}

impl ApiRequest for ListTrainingsRequest {
    type Response = Vec<TrainingSummary>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        match &self.domain_id {
            Some(id) => format!("/trainings?domainId={}", urlencoding::encode(id)),
            None => "/trainings".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetTrainingRequest {
    pub id: String,
}

impl ApiRequest for GetTrainingRequest {
    type Response = TrainingDefinition;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/trainings/{}", urlencoding::encode(&self.id))
    }
}

/// Submit a finished pre/post assessment. The body is the result itself.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitAssessmentRequest {
    #[serde(skip)]
    pub training_id: String,
    #[serde(skip)]
    pub kind: AssessmentKind,
    #[serde(flatten)]
    pub result: AssessmentResult,
}

impl ApiRequest for SubmitAssessmentRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!(
            "/assessments/{}/{}",
            urlencoding::encode(&self.training_id),
            self.kind.as_str()
        )
    }
}

// =========================================================
// Materials
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReportProgressRequest {
    #[serde(skip)]
    pub material_id: String,
    /// 0–100
    pub progress: u8,
}

impl ApiRequest for ReportProgressRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("/materials/{}/progress", urlencoding::encode(&self.material_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timestamp;

    #[test]
    fn test_paths() {
        assert_eq!(GetTrainingRequest { id: "t 1".into() }.path(), "/trainings/t%201");
        assert_eq!(ListTrainingsRequest::default().path(), "/trainings");
        assert_eq!(
            ListTrainingsRequest {
                domain_id: Some("fire&safety".into())
            }
            .path(),
            "/trainings?domainId=fire%26safety"
        );
        assert_eq!(material_stream_path("m-9"), "/materials/m-9/stream");
        assert_eq!(material_stream_path("m/9 ü"), "/materials/m%2F9%20%C3%BC/stream");
        assert_eq!(
            ReportProgressRequest {
                material_id: "m 1".into(),
                progress: 50,
            }
            .path(),
            "/materials/m%201/progress"
        );
    }

    #[test]
    fn test_submit_assessment_path_and_body() {
        let req = SubmitAssessmentRequest {
            training_id: "t-1".into(),
            kind: AssessmentKind::Post,
            result: AssessmentResult {
                score: 75,
                correct_count: 3,
                incorrect_count: 1,
                total_questions: 4,
                per_question: vec![],
                time_spent_seconds: 42,
                completed_at: Timestamp::new(1),
            },
        };
        assert_eq!(req.path(), "/assessments/t-1/post");

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["score"], 75);
        assert_eq!(body["timeSpentSeconds"], 42);
        assert!(body.get("trainingId").is_none());
        assert!(body.get("kind").is_none());
    }

    #[test]
    fn test_auth_requests_are_unauthenticated() {
        assert!(!LoginRequest::AUTHENTICATED);
        assert!(!RefreshTokenRequest::AUTHENTICATED);
        assert!(ListDomainsRequest::AUTHENTICATED);
    }
}
