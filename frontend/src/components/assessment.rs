use std::time::Duration;

use crate::web::Interval;
use ehs_learn::shared::{AssessmentKind, AssessmentResult};
use ehs_learn::{AssessmentEngine, Step, Tick, TrainingFlow};
use leptos::prelude::*;

/// 在当前阶段的测评引擎上执行操作，不在测评阶段时返回 None
fn with_engine<T>(
    flow: RwSignal<TrainingFlow>,
    op: impl FnOnce(&mut AssessmentEngine) -> T,
) -> Option<T> {
    flow.try_update(|f| f.engine_mut().map(op)).flatten()
}

#[derive(Clone, PartialEq)]
struct QuestionView {
    index: usize,
    total: usize,
    text: String,
    options: Vec<String>,
    selected: Option<usize>,
    is_last: bool,
    progress: u8,
    clock: String,
    low_time: bool,
}

fn snapshot(engine: &AssessmentEngine) -> QuestionView {
    let question = engine.current_question();
    QuestionView {
        index: engine.current_index(),
        total: engine.total_questions(),
        text: question.text.clone(),
        options: question.options.iter().map(|o| o.text.clone()).collect(),
        selected: engine.current_answer(),
        is_last: engine.is_last_question(),
        progress: engine.progress_percent(),
        clock: engine.formatted_time_remaining(),
        low_time: engine.time_remaining() <= 30,
    }
}

/// 限时测评视图
///
/// 每秒驱动一次引擎计时；提交（手动或超时）后把结果交给 `on_complete`。
#[component]
pub fn AssessmentView(
    flow: RwSignal<TrainingFlow>,
    kind: AssessmentKind,
    on_complete: Callback<AssessmentResult>,
) -> impl IntoView {
    let timer = StoredValue::new_local(None::<Interval>);
    // 不能在定时器自己的回调里 drop 它，推迟到下一轮事件循环
    let stop_timer = move || {
        set_timeout(
            move || timer.update_value(|t| *t = None),
            Duration::ZERO,
        );
    };

    let on_tick = move || {
        if let Some(Tick::Expired(result)) = with_engine(flow, AssessmentEngine::tick) {
            stop_timer();
            on_complete.run(result);
        }
    };
    timer.update_value(|t| *t = Interval::new(1000, on_tick));
    on_cleanup(move || timer.update_value(|t| *t = None));

    let select = move |option: usize| {
        if let Some(Err(e)) = with_engine(flow, |engine| engine.select_answer(option)) {
            tracing::debug!(error = %e, "answer rejected");
        }
    };

    let next = move |_| match with_engine(flow, AssessmentEngine::next) {
        Some(Ok(Step::Submitted(result))) => {
            stop_timer();
            on_complete.run(result);
        }
        Some(Err(e)) => tracing::debug!(error = %e, "next rejected"),
        _ => {}
    };

    let previous = move |_| {
        if let Some(Err(e)) = with_engine(flow, AssessmentEngine::previous) {
            tracing::debug!(error = %e, "previous rejected");
        }
    };

    let title = match kind {
        AssessmentKind::Pre => "Pre-Assessment",
        AssessmentKind::Post => "Post-Assessment",
    };
    let view_state = Memo::new(move |_| flow.with(|f| f.engine().map(snapshot)));

    move || {
        view_state.get().map(|q| {
            let clock_class = if q.low_time {
                "badge badge-error badge-lg font-mono"
            } else {
                "badge badge-neutral badge-lg font-mono"
            };
            let options = q
                .options
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    let class = if q.selected == Some(i) {
                        "btn btn-primary justify-start w-full normal-case"
                    } else {
                        "btn btn-outline justify-start w-full normal-case"
                    };
                    view! {
                        <li>
                            <button class=class on:click=move |_| select(i)>{text}</button>
                        </li>
                    }
                })
                .collect_view();

            view! {
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body space-y-4">
                        <div class="flex items-center justify-between">
                            <h2 class="card-title">{title}</h2>
                            <span class=clock_class>{q.clock}</span>
                        </div>
                        <progress class="progress progress-primary w-full" value={q.progress.to_string()} max="100"></progress>
                        <p class="text-sm opacity-70">
                            {format!("Question {} of {}", q.index + 1, q.total)}
                        </p>
                        <h3 class="text-lg font-semibold">{q.text}</h3>
                        <ul class="space-y-2">{options}</ul>
                        <div class="card-actions justify-between">
                            <button class="btn" disabled={q.index == 0} on:click=previous>
                                "Previous"
                            </button>
                            <button class="btn btn-primary" on:click=next>
                                {if q.is_last { "Submit" } else { "Next" }}
                            </button>
                        </div>
                    </div>
                </div>
            }
        })
    }
}
