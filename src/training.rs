//! 培训流程编排
//!
//! 固定四个阶段：前测 -> 模块学习 -> 后测 -> 结果。
//! 进入之前处于 `Loading`。只能按顺序前进，不能跳过也不能回退；
//! 乱序调用返回 `PhaseViolation` 且不修改任何状态。

use std::fmt;

use async_trait::async_trait;
use ehs_learn_shared::{AssessmentResult, TrainingDefinition};
use thiserror::Error;

use crate::assessment::AssessmentEngine;
use crate::error::{ApiErrorStatus, ApiResult};
use crate::material::{ModuleEvent, ModuleProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Loading,
    PreAssessment,
    ModuleLearning,
    PostAssessment,
    Results,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Loading => "Loading",
            Phase::PreAssessment => "Pre-Assessment",
            Phase::ModuleLearning => "Learning Module",
            Phase::PostAssessment => "Post-Assessment",
            Phase::Results => "Results",
        }
    }

    /// 进度条上的序号（1-4），`Loading` 为 0
    pub fn step(&self) -> u8 {
        match self {
            Phase::Loading => 0,
            Phase::PreAssessment => 1,
            Phase::ModuleLearning => 2,
            Phase::PostAssessment => 3,
            Phase::Results => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainingError {
    #[error("expected phase {expected}, but the training is in {actual}")]
    PhaseViolation { expected: Phase, actual: Phase },

    #[error("the learning module has not been completed")]
    ModuleIncomplete,

    #[error("training {0} not found")]
    NotFound(String),

    #[error("failed to load training: {0}")]
    Network(String),

    #[error("invalid training definition: {0}")]
    InvalidDefinition(String),
}

/// 每次成功的阶段切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
}

/// 后测相对前测的分数变化
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Improvement(pub i16);

impl Improvement {
    pub fn between(pre: &AssessmentResult, post: &AssessmentResult) -> Self {
        Improvement(post.score as i16 - pre.score as i16)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Improvement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// `finish` 交给调用方的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingOutcome {
    pub training_id: String,
    pub pre_assessment_result: AssessmentResult,
    pub post_assessment_result: AssessmentResult,
    pub improvement: Improvement,
}

/// 培训定义的来源（正常情况下是远程 API）
#[async_trait(?Send)]
pub trait TrainingSource {
    async fn fetch_training(&self, id: &str) -> ApiResult<TrainingDefinition>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingFlow {
    training_id: String,
    phase: Phase,
    definition: Option<TrainingDefinition>,
    engine: Option<AssessmentEngine>,
    module_progress: Option<ModuleProgress>,
    pre_result: Option<AssessmentResult>,
    post_result: Option<AssessmentResult>,
    improvement: Option<Improvement>,
}

impl TrainingFlow {
    pub fn new(training_id: impl Into<String>) -> Self {
        Self {
            training_id: training_id.into(),
            phase: Phase::Loading,
            definition: None,
            engine: None,
            module_progress: None,
            pre_result: None,
            post_result: None,
            improvement: None,
        }
    }

    // --- 查询 ---

    pub fn training_id(&self) -> &str {
        &self.training_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn definition(&self) -> Option<&TrainingDefinition> {
        self.definition.as_ref()
    }

    /// 当前阶段的测评引擎（仅前测/后测阶段存在）
    pub fn engine(&self) -> Option<&AssessmentEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut AssessmentEngine> {
        self.engine.as_mut()
    }

    pub fn module_progress(&self) -> Option<&ModuleProgress> {
        self.module_progress.as_ref()
    }

    pub fn pre_result(&self) -> Option<&AssessmentResult> {
        self.pre_result.as_ref()
    }

    pub fn post_result(&self) -> Option<&AssessmentResult> {
        self.post_result.as_ref()
    }

    pub fn improvement(&self) -> Option<Improvement> {
        self.improvement
    }

    // --- 阶段切换 ---

    fn expect_phase(&self, expected: Phase) -> Result<(), TrainingError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TrainingError::PhaseViolation {
                expected,
                actual: self.phase,
            })
        }
    }

    fn transition(&mut self, to: Phase) -> PhaseChange {
        let change = PhaseChange {
            from: self.phase,
            to,
        };
        self.phase = to;
        tracing::info!(training = %self.training_id, from = %change.from, to = %change.to, "training phase changed");
        change
    }

    /// 拉取培训定义并进入前测。失败时保持 `Loading`，可重试。
    pub async fn enter<S: TrainingSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<PhaseChange, TrainingError> {
        self.expect_phase(Phase::Loading)?;

        let definition = source
            .fetch_training(&self.training_id)
            .await
            .map_err(|e| {
                tracing::warn!(training = %self.training_id, error = %e, "failed to load training");
                match e.status {
                    ApiErrorStatus::NotFound => TrainingError::NotFound(self.training_id.clone()),
                    _ => TrainingError::Network(e.message().to_string()),
                }
            })?;

        self.load(definition)
    }

    /// 使用已拉取的定义进入前测
    pub fn load(&mut self, definition: TrainingDefinition) -> Result<PhaseChange, TrainingError> {
        self.expect_phase(Phase::Loading)?;

        if definition.post_assessment.questions.is_empty() {
            return Err(TrainingError::InvalidDefinition(
                "post-assessment has no questions".into(),
            ));
        }
        let engine = AssessmentEngine::new(definition.pre_assessment.questions.clone())
            .map_err(|e| TrainingError::InvalidDefinition(format!("pre-assessment: {}", e)))?;

        self.engine = Some(engine);
        self.definition = Some(definition);
        Ok(self.transition(Phase::PreAssessment))
    }

    pub fn on_pre_assessment_complete(
        &mut self,
        result: AssessmentResult,
    ) -> Result<PhaseChange, TrainingError> {
        self.expect_phase(Phase::PreAssessment)?;
        let Some(definition) = &self.definition else {
            return Err(TrainingError::InvalidDefinition("definition missing".into()));
        };

        self.module_progress = Some(ModuleProgress::new(&definition.learning_module));
        self.engine = None;
        self.pre_result = Some(result);
        Ok(self.transition(Phase::ModuleLearning))
    }

    /// 转发素材事件，返回上升后的进度
    pub fn apply_module_event(&mut self, event: ModuleEvent) -> Result<Option<u8>, TrainingError> {
        self.expect_phase(Phase::ModuleLearning)?;
        Ok(self
            .module_progress
            .as_mut()
            .and_then(|progress| progress.apply(event)))
    }

    pub fn on_module_learning_complete(&mut self) -> Result<PhaseChange, TrainingError> {
        self.expect_phase(Phase::ModuleLearning)?;
        if !self.module_progress.as_ref().is_some_and(ModuleProgress::is_complete) {
            return Err(TrainingError::ModuleIncomplete);
        }
        let Some(definition) = &self.definition else {
            return Err(TrainingError::InvalidDefinition("definition missing".into()));
        };

        let engine = AssessmentEngine::new(definition.post_assessment.questions.clone())
            .map_err(|e| TrainingError::InvalidDefinition(format!("post-assessment: {}", e)))?;
        self.engine = Some(engine);
        Ok(self.transition(Phase::PostAssessment))
    }

    pub fn on_post_assessment_complete(
        &mut self,
        result: AssessmentResult,
    ) -> Result<PhaseChange, TrainingError> {
        self.expect_phase(Phase::PostAssessment)?;
        let Some(pre) = &self.pre_result else {
            return Err(TrainingError::PhaseViolation {
                expected: Phase::ModuleLearning,
                actual: self.phase,
            });
        };

        let improvement = Improvement::between(pre, &result);
        self.improvement = Some(improvement);
        self.engine = None;
        self.post_result = Some(result);
        Ok(self.transition(Phase::Results))
    }

    /// 结束流程并交出结果。只能在 `Results` 阶段调用。
    pub fn finish(self) -> Result<TrainingOutcome, TrainingError> {
        self.expect_phase(Phase::Results)?;
        match (self.pre_result, self.post_result, self.improvement) {
            (Some(pre), Some(post), Some(improvement)) => Ok(TrainingOutcome {
                training_id: self.training_id,
                pre_assessment_result: pre,
                post_assessment_result: post,
                improvement,
            }),
            _ => Err(TrainingError::InvalidDefinition("results are incomplete".into())),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assessment::tests::make_questions;
    use crate::error::ApiError;
    use ehs_learn_shared::{AssessmentDefinition, ContentType, LearningModule, Timestamp};

    pub fn make_definition(content_type: ContentType) -> TrainingDefinition {
        TrainingDefinition {
            id: "t-1".into(),
            title: "Fire Safety Basics".into(),
            description: None,
            pre_assessment: AssessmentDefinition {
                questions: make_questions(4),
            },
            learning_module: LearningModule {
                id: Some("m-1".into()),
                content_type,
                url: "/files/fire.pdf".into(),
                title: "Fire Safety".into(),
                description: String::new(),
                page_count: None,
            },
            post_assessment: AssessmentDefinition {
                questions: make_questions(5),
            },
        }
    }

    fn result_with_score(score: u8) -> AssessmentResult {
        AssessmentResult {
            score,
            correct_count: 0,
            incorrect_count: 0,
            total_questions: 0,
            per_question: vec![],
            time_spent_seconds: 0,
            completed_at: Timestamp::new(0),
        }
    }

    enum FakeSource {
        Found(TrainingDefinition),
        Missing,
        Offline,
    }

    #[async_trait(?Send)]
    impl TrainingSource for FakeSource {
        async fn fetch_training(&self, id: &str) -> ApiResult<TrainingDefinition> {
            match self {
                FakeSource::Found(def) => Ok(def.clone()),
                FakeSource::Missing => Err(ApiError::not_found(format!("training {}", id))),
                FakeSource::Offline => Err(ApiError::network("connection refused")),
            }
        }
    }

    async fn entered_flow() -> TrainingFlow {
        let mut flow = TrainingFlow::new("t-1");
        flow.enter(&FakeSource::Found(make_definition(ContentType::Document)))
            .await
            .unwrap();
        flow
    }

    #[tokio::test]
    async fn test_enter_initializes_pre_assessment() {
        let flow = entered_flow().await;
        assert_eq!(flow.phase(), Phase::PreAssessment);
        let engine = flow.engine().unwrap();
        assert_eq!(engine.total_questions(), 4);
        assert_eq!(engine.time_remaining(), 240);
    }

    #[tokio::test]
    async fn test_enter_failure_stays_loading() {
        let mut flow = TrainingFlow::new("t-404");
        let err = flow.enter(&FakeSource::Missing).await.unwrap_err();
        assert_eq!(err, TrainingError::NotFound("t-404".into()));
        assert_eq!(flow.phase(), Phase::Loading);

        let err = flow.enter(&FakeSource::Offline).await.unwrap_err();
        assert!(matches!(err, TrainingError::Network(_)));

        // 重试成功
        flow.enter(&FakeSource::Found(make_definition(ContentType::Document)))
            .await
            .unwrap();
        assert_eq!(flow.phase(), Phase::PreAssessment);
    }

    #[test]
    fn test_pre_complete_before_enter_is_rejected() {
        let mut flow = TrainingFlow::new("t-1");
        let before = flow.clone();
        let err = flow.on_pre_assessment_complete(result_with_score(60)).unwrap_err();
        assert_eq!(
            err,
            TrainingError::PhaseViolation {
                expected: Phase::PreAssessment,
                actual: Phase::Loading,
            }
        );
        assert_eq!(flow, before);
    }

    #[test]
    fn test_empty_assessment_is_invalid() {
        let mut definition = make_definition(ContentType::Video);
        definition.pre_assessment.questions.clear();
        let mut flow = TrainingFlow::new("t-1");
        assert!(matches!(flow.load(definition), Err(TrainingError::InvalidDefinition(_))));
        assert_eq!(flow.phase(), Phase::Loading);
    }

    #[tokio::test]
    async fn test_no_reentry_after_module_learning() {
        let mut flow = entered_flow().await;
        flow.on_pre_assessment_complete(result_with_score(60)).unwrap();
        assert_eq!(flow.phase(), Phase::ModuleLearning);
        let before = flow.clone();

        let source = FakeSource::Found(make_definition(ContentType::Document));
        assert!(matches!(
            flow.enter(&source).await,
            Err(TrainingError::PhaseViolation { expected: Phase::Loading, .. })
        ));
        assert!(flow.on_pre_assessment_complete(result_with_score(90)).is_err());
        assert_eq!(flow, before);
    }

    #[tokio::test]
    async fn test_module_must_be_complete_before_post() {
        let mut flow = entered_flow().await;
        flow.on_pre_assessment_complete(result_with_score(60)).unwrap();

        assert_eq!(flow.on_module_learning_complete(), Err(TrainingError::ModuleIncomplete));
        assert_eq!(flow.phase(), Phase::ModuleLearning);

        flow.apply_module_event(ModuleEvent::DocumentLoaded).unwrap();
        let change = flow.on_module_learning_complete().unwrap();
        assert_eq!(change, PhaseChange { from: Phase::ModuleLearning, to: Phase::PostAssessment });
        assert_eq!(flow.engine().unwrap().total_questions(), 5);
    }

    #[tokio::test]
    async fn test_module_learning_cannot_be_skipped() {
        let mut flow = entered_flow().await;
        let before = flow.clone();

        assert_eq!(
            flow.on_module_learning_complete(),
            Err(TrainingError::PhaseViolation {
                expected: Phase::ModuleLearning,
                actual: Phase::PreAssessment,
            })
        );
        assert!(flow.apply_module_event(ModuleEvent::MarkComplete).is_err());
        assert_eq!(flow, before);
    }

    #[tokio::test]
    async fn test_post_assessment_cannot_be_skipped() {
        let mut flow = entered_flow().await;
        flow.on_pre_assessment_complete(result_with_score(60)).unwrap();
        flow.apply_module_event(ModuleEvent::MarkComplete).unwrap();
        let before = flow.clone();

        assert_eq!(
            flow.on_post_assessment_complete(result_with_score(85)),
            Err(TrainingError::PhaseViolation {
                expected: Phase::PostAssessment,
                actual: Phase::ModuleLearning,
            })
        );
        assert_eq!(flow, before);
        assert!(flow.improvement().is_none());
    }

    #[tokio::test]
    async fn test_finish_during_post_assessment_is_rejected() {
        let mut flow = entered_flow().await;
        flow.on_pre_assessment_complete(result_with_score(60)).unwrap();
        flow.apply_module_event(ModuleEvent::MarkComplete).unwrap();
        flow.on_module_learning_complete().unwrap();
        let before = flow.clone();

        assert_eq!(
            flow.clone().finish(),
            Err(TrainingError::PhaseViolation {
                expected: Phase::Results,
                actual: Phase::PostAssessment,
            })
        );
        assert_eq!(flow, before);
        assert_eq!(flow.phase(), Phase::PostAssessment);
    }

    #[tokio::test]
    async fn test_full_run_reports_improvement() {
        let mut flow = entered_flow().await;
        flow.on_pre_assessment_complete(result_with_score(60)).unwrap();
        flow.apply_module_event(ModuleEvent::MarkComplete).unwrap();
        flow.on_module_learning_complete().unwrap();
        flow.on_post_assessment_complete(result_with_score(85)).unwrap();

        assert_eq!(flow.phase(), Phase::Results);
        assert_eq!(flow.improvement().unwrap().to_string(), "+25");

        let outcome = flow.finish().unwrap();
        assert_eq!(outcome.pre_assessment_result.score, 60);
        assert_eq!(outcome.post_assessment_result.score, 85);
        assert_eq!(outcome.improvement, Improvement(25));
    }

    #[test]
    fn test_finish_requires_results() {
        let flow = TrainingFlow::new("t-1");
        assert!(matches!(
            flow.finish(),
            Err(TrainingError::PhaseViolation { expected: Phase::Results, .. })
        ));
    }

    #[test]
    fn test_improvement_display() {
        assert_eq!(Improvement(25).to_string(), "+25");
        assert_eq!(Improvement(-10).to_string(), "-10");
        assert_eq!(Improvement(0).to_string(), "0");
    }
}
