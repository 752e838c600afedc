use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;

pub use date::{Timestamp, format_clock};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 本地存储键：访问令牌（不带 `Bearer ` 前缀）
pub const STORAGE_KEY_TOKEN: &str = "token";
/// 本地存储键：序列化后的用户记录
pub const STORAGE_KEY_USER: &str = "user";
/// 本地存储键：刷新令牌
pub const STORAGE_KEY_REFRESH_TOKEN: &str = "refreshToken";

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// 每道题分配的作答时间（秒）
pub const SECONDS_PER_QUESTION: u32 = 60;

// =========================================================
// 用户与领域 (Users & Domains)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Learner,
    Admin,
}

/// 培训领域（如 "Fire Safety"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// 用户当前选定的领域
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =========================================================
// 题目模型 (Questions)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// 每道题应当恰好有一个正确选项
    pub fn has_single_correct_option(&self) -> bool {
        self.options.iter().filter(|o| o.is_correct).count() == 1
    }

    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDefinition {
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Pre,
    Post,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Pre => "pre",
            AssessmentKind::Post => "post",
        }
    }
}

// =========================================================
// 作答结果 (Results)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question: String,
    pub correct: bool,
    pub user_answer_text: Option<String>,
    pub correct_answer_text: String,
}

/// 一次测评的最终结果，生成后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// 0–100
    pub score: u8,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_questions: u32,
    pub per_question: Vec<QuestionOutcome>,
    pub time_spent_seconds: u32,
    pub completed_at: Timestamp,
}

// =========================================================
// 培训定义 (Training)
// =========================================================

/// 学习模块的内容类型
///
/// 封闭枚举：未知的字符串统一落到 `Other`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Presentation,
    Document,
    External,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    /// 素材 ID，用于流式地址与进度上报
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub content_type: ContentType,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 分页内容（演示文稿）的总页数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDefinition {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pre_assessment: AssessmentDefinition,
    pub learning_module: LearningModule,
    pub post_assessment: AssessmentDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// 控制面板列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub status: TrainingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_score: Option<u8>,
}

/// 通用确认响应
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
