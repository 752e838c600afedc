//! 测评引擎
//!
//! 负责一次限时单选测评：按顺序展示固定题目、记录每题作答、倒计时与计分。
//! 前测与后测共用同一个引擎，每个阶段各自创建一次。
//!
//! 状态机：`Active(index)` -> `Submitted`。
//! 最后一题上调用 `next`、倒计时归零、或显式 `submit` 都会进入 `Submitted`，
//! 此后所有修改操作都被拒绝。

use ehs_learn_shared::{
    AssessmentResult, Question, QuestionOutcome, SECONDS_PER_QUESTION, Timestamp, format_clock,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    #[error("an assessment needs at least one question")]
    NoQuestions,

    #[error("option {index} is out of range for a question with {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("assessment already submitted")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentState {
    Active { index: usize },
    Submitted,
}

/// `next` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// 移动到了新的题目下标
    Moved(usize),
    /// 在最后一题上前进，触发了提交
    Submitted(AssessmentResult),
}

/// `tick` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// 剩余秒数
    Running(u32),
    /// 倒计时归零，强制提交
    Expired(AssessmentResult),
    /// 已提交，定时器应当被取消
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentEngine {
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    time_limit: u32,
    time_remaining: u32,
    current_index: usize,
    result: Option<AssessmentResult>,
}

impl AssessmentEngine {
    pub fn new(questions: Vec<Question>) -> Result<Self, AssessmentError> {
        if questions.is_empty() {
            return Err(AssessmentError::NoQuestions);
        }

        for (i, q) in questions.iter().enumerate() {
            if !q.has_single_correct_option() {
                tracing::warn!(question = i, "question does not have exactly one correct option");
            }
        }

        let time_limit = SECONDS_PER_QUESTION.saturating_mul(questions.len() as u32);
        Ok(Self {
            answers: vec![None; questions.len()],
            questions,
            time_limit,
            time_remaining: time_limit,
            current_index: 0,
            result: None,
        })
    }

    // --- 查询 ---

    pub fn state(&self) -> AssessmentState {
        if self.result.is_some() {
            AssessmentState::Submitted
        } else {
            AssessmentState::Active {
                index: self.current_index,
            }
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn answer(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answer(self.current_index)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// 当前题目位置的进度百分比（第 1 题为 1/N）
    pub fn progress_percent(&self) -> u8 {
        ((self.current_index + 1) * 100 / self.questions.len()) as u8
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn formatted_time_remaining(&self) -> String {
        format_clock(self.time_remaining)
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    // --- 操作 ---

    fn ensure_active(&self) -> Result<(), AssessmentError> {
        if self.is_submitted() {
            Err(AssessmentError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }

    /// 为当前题目选择选项，重复选择会覆盖，不影响计时
    pub fn select_answer(&mut self, option_index: usize) -> Result<(), AssessmentError> {
        self.ensure_active()?;
        let len = self.current_question().options.len();
        if option_index >= len {
            return Err(AssessmentError::OptionOutOfRange {
                index: option_index,
                len,
            });
        }
        self.answers[self.current_index] = Some(option_index);
        Ok(())
    }

    /// 前进到下一题；已在最后一题时提交
    pub fn next(&mut self) -> Result<Step, AssessmentError> {
        self.ensure_active()?;
        if self.is_last_question() {
            return Ok(Step::Submitted(self.submit()));
        }
        self.current_index += 1;
        Ok(Step::Moved(self.current_index))
    }

    /// 回到上一题，第一题上为空操作；不清除已选答案
    pub fn previous(&mut self) -> Result<usize, AssessmentError> {
        self.ensure_active()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// 每秒调用一次
    pub fn tick(&mut self) -> Tick {
        if self.is_submitted() {
            return Tick::Idle;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            tracing::info!("assessment time expired, submitting");
            return Tick::Expired(self.submit());
        }
        Tick::Running(self.time_remaining)
    }

    /// 提交并计分，幂等：重复调用返回同一份结果
    pub fn submit(&mut self) -> AssessmentResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let result = self.score();
        tracing::debug!(
            score = result.score,
            correct = result.correct_count,
            total = result.total_questions,
            "assessment submitted"
        );
        self.result = Some(result.clone());
        result
    }

    fn score(&self) -> AssessmentResult {
        let per_question: Vec<QuestionOutcome> = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(question, answer)| {
                let chosen = answer.and_then(|i| question.options.get(i));
                QuestionOutcome {
                    question: question.text.clone(),
                    correct: chosen.is_some_and(|o| o.is_correct),
                    user_answer_text: chosen.map(|o| o.text.clone()),
                    correct_answer_text: question
                        .correct_option()
                        .map(|o| o.text.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let total = per_question.len() as u32;
        let correct = per_question.iter().filter(|o| o.correct).count() as u32;

        AssessmentResult {
            score: round_percent(correct, total),
            correct_count: correct,
            incorrect_count: total - correct,
            total_questions: total,
            per_question,
            time_spent_seconds: self.time_limit - self.time_remaining,
            completed_at: Timestamp::now(),
        }
    }
}

/// round(100 * part / whole)，.5 向上取整
fn round_percent(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((200 * part as u64 + whole as u64) / (2 * whole as u64)) as u8
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ehs_learn_shared::AnswerOption;

    /// 第 0 个选项为正确答案
    pub fn make_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                text: format!("Q{}", i + 1),
                options: vec![
                    AnswerOption {
                        text: format!("right-{}", i + 1),
                        is_correct: true,
                    },
                    AnswerOption {
                        text: format!("wrong-{}", i + 1),
                        is_correct: false,
                    },
                    AnswerOption {
                        text: "none of the above".into(),
                        is_correct: false,
                    },
                ],
            })
            .collect()
    }

    /// 依次作答：Some(true) 答对，Some(false) 答错，None 跳过
    fn answer_all(engine: &mut AssessmentEngine, plan: &[Option<bool>]) -> AssessmentResult {
        for (i, choice) in plan.iter().enumerate() {
            if let Some(correct) = choice {
                engine.select_answer(if *correct { 0 } else { 1 }).unwrap();
            }
            match engine.next().unwrap() {
                Step::Moved(idx) => assert_eq!(idx, i + 1),
                Step::Submitted(result) => return result,
            }
        }
        unreachable!("last next() must submit")
    }

    #[test]
    fn test_initialize_sets_timer_and_clears_answers() {
        for n in 1..=7 {
            let engine = AssessmentEngine::new(make_questions(n)).unwrap();
            assert_eq!(engine.time_remaining(), 60 * n as u32);
            assert_eq!(engine.current_index(), 0);
            assert_eq!(engine.answered_count(), 0);
            assert!((0..n).all(|i| engine.answer(i).is_none()));
            assert_eq!(engine.state(), AssessmentState::Active { index: 0 });
        }
    }

    #[test]
    fn test_empty_question_list_is_rejected() {
        assert_eq!(
            AssessmentEngine::new(vec![]).unwrap_err(),
            AssessmentError::NoQuestions
        );
    }

    #[test]
    fn test_select_answer_out_of_range_does_not_mutate() {
        let mut engine = AssessmentEngine::new(make_questions(2)).unwrap();
        engine.select_answer(1).unwrap();
        let before = engine.clone();

        let err = engine.select_answer(3).unwrap_err();
        assert_eq!(err, AssessmentError::OptionOutOfRange { index: 3, len: 3 });
        assert_eq!(engine, before);
    }

    #[test]
    fn test_reselect_overwrites_without_touching_timer() {
        let mut engine = AssessmentEngine::new(make_questions(2)).unwrap();
        engine.tick();
        engine.select_answer(1).unwrap();
        engine.select_answer(2).unwrap();
        assert_eq!(engine.current_answer(), Some(2));
        assert_eq!(engine.time_remaining(), 119);
    }

    #[test]
    fn test_answers_persist_across_navigation() {
        let mut engine = AssessmentEngine::new(make_questions(3)).unwrap();
        engine.select_answer(2).unwrap();
        engine.next().unwrap();
        engine.select_answer(1).unwrap();
        engine.previous().unwrap();
        assert_eq!(engine.current_answer(), Some(2));
        engine.next().unwrap();
        assert_eq!(engine.current_answer(), Some(1));
        assert_eq!(engine.answered_count(), 2);
    }

    #[test]
    fn test_previous_at_first_question_is_noop() {
        let mut engine = AssessmentEngine::new(make_questions(3)).unwrap();
        assert_eq!(engine.previous().unwrap(), 0);
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn test_next_at_last_question_submits() {
        let mut engine = AssessmentEngine::new(make_questions(1)).unwrap();
        engine.select_answer(0).unwrap();
        let Step::Submitted(result) = engine.next().unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(result.score, 100);
        assert_eq!(engine.state(), AssessmentState::Submitted);
    }

    #[test]
    fn test_submit_is_idempotent() {
        let mut engine = AssessmentEngine::new(make_questions(2)).unwrap();
        engine.select_answer(0).unwrap();
        let first = engine.submit();
        let second = engine.submit();
        assert_eq!(first, second);
        assert_eq!(engine.result(), Some(&first));
    }

    #[test]
    fn test_mutations_after_submit_are_rejected() {
        let mut engine = AssessmentEngine::new(make_questions(3)).unwrap();
        engine.select_answer(0).unwrap();
        engine.submit();
        let before = engine.clone();

        assert_eq!(engine.select_answer(1), Err(AssessmentError::AlreadySubmitted));
        assert_eq!(engine.next(), Err(AssessmentError::AlreadySubmitted));
        assert_eq!(engine.previous(), Err(AssessmentError::AlreadySubmitted));
        assert_eq!(engine.tick(), Tick::Idle);
        assert_eq!(engine, before);
    }

    #[test]
    fn test_score_rounding() {
        let mut all = AssessmentEngine::new(make_questions(5)).unwrap();
        assert_eq!(answer_all(&mut all, &[Some(true); 5]).score, 100);

        let mut none = AssessmentEngine::new(make_questions(5)).unwrap();
        assert_eq!(answer_all(&mut none, &[Some(false); 5]).score, 0);

        let mut three = AssessmentEngine::new(make_questions(5)).unwrap();
        let result = answer_all(
            &mut three,
            &[Some(true), Some(false), Some(true), None, Some(true)],
        );
        assert_eq!(result.score, 60);
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.incorrect_count, 2);

        assert_eq!(round_percent(1, 3), 33);
        assert_eq!(round_percent(2, 3), 67);
        assert_eq!(round_percent(1, 8), 13);
    }

    #[test]
    fn test_unanswered_last_question_counts_incorrect() {
        let mut engine = AssessmentEngine::new(make_questions(4)).unwrap();
        let result = answer_all(&mut engine, &[Some(true), Some(true), Some(true), None]);

        assert_eq!(result.correct_count, 3);
        assert_eq!(result.incorrect_count, 1);
        assert_eq!(result.score, 75);
        assert_eq!(result.total_questions, 4);

        let last = &result.per_question[3];
        assert!(!last.correct);
        assert_eq!(last.user_answer_text, None);
        assert_eq!(last.correct_answer_text, "right-4");
        assert_eq!(
            result.per_question[0].user_answer_text.as_deref(),
            Some("right-1")
        );
    }

    #[test]
    fn test_timer_expiry_forces_submit() {
        let mut engine = AssessmentEngine::new(make_questions(2)).unwrap();
        engine.select_answer(0).unwrap();

        for expected in (1..120).rev() {
            assert_eq!(engine.tick(), Tick::Running(expected));
        }
        let Tick::Expired(result) = engine.tick() else {
            panic!("timer should expire on the 120th tick");
        };

        assert!(engine.is_submitted());
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.incorrect_count, 1);
        assert_eq!(result.score, 50);
        assert_eq!(result.time_spent_seconds, 120);
        assert_eq!(engine.tick(), Tick::Idle);
    }

    #[test]
    fn test_time_spent_is_limit_minus_remaining() {
        let mut engine = AssessmentEngine::new(make_questions(3)).unwrap();
        for _ in 0..25 {
            engine.tick();
        }
        assert_eq!(engine.formatted_time_remaining(), "02:35");
        assert_eq!(engine.submit().time_spent_seconds, 25);
    }

    #[test]
    fn test_question_without_correct_option_never_scores() {
        let mut questions = make_questions(2);
        questions[1].options.iter_mut().for_each(|o| o.is_correct = false);
        let mut engine = AssessmentEngine::new(questions).unwrap();
        let result = answer_all(&mut engine, &[Some(true), Some(true)]);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.per_question[1].correct_answer_text, "");
    }

    #[test]
    fn test_progress_percent() {
        let mut engine = AssessmentEngine::new(make_questions(4)).unwrap();
        assert_eq!(engine.progress_percent(), 25);
        engine.next().unwrap();
        engine.next().unwrap();
        engine.next().unwrap();
        assert_eq!(engine.progress_percent(), 100);
    }
}
