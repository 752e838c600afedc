use crate::auth::use_auth;
use crate::components::assessment::AssessmentView;
use crate::components::material_viewer::MaterialViewer;
use crate::components::toast::{Notice, Toast};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use ehs_learn::shared::{AssessmentKind, AssessmentResult};
use ehs_learn::{ModuleEvent, Phase, PhaseChange, TrainingError, TrainingFlow};
use leptos::prelude::*;
use leptos::task::spawn_local;

const STEPS: [Phase; 4] = [
    Phase::PreAssessment,
    Phase::ModuleLearning,
    Phase::PostAssessment,
    Phase::Results,
];

fn log_change(outcome: Option<Result<PhaseChange, TrainingError>>) {
    match outcome {
        Some(Ok(change)) => tracing::debug!(from = %change.from, to = %change.to, "phase advanced"),
        Some(Err(e)) => tracing::error!(error = %e, "phase transition rejected"),
        None => {}
    }
}

/// 培训页面：前测 -> 学习素材 -> 后测 -> 结果
#[component]
pub fn TrainingPage(id: String) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let flow = RwSignal::new(TrainingFlow::new(id));
    let notice = RwSignal::new(Option::<Notice>::None);
    let load_error = RwSignal::new(Option::<TrainingError>::None);
    let module_hint = RwSignal::new(Option::<String>::None);

    let load = move || {
        let api = auth.api();
        load_error.set(None);
        spawn_local(async move {
            let mut next = flow.get_untracked();
            match next.enter(&*api).await {
                Ok(_) => flow.set(next),
                Err(e) => {
                    if matches!(e, TrainingError::Network(_)) {
                        notice.set(Some(Notice {
                            message: e.to_string(),
                            is_error: true,
                            retryable: true,
                        }));
                    }
                    load_error.set(Some(e));
                }
            }
        });
    };
    load();

    // 提交结果失败不阻塞流程
    let record = move |kind: AssessmentKind, result: AssessmentResult| {
        let api = auth.api();
        let training_id = flow.with_untracked(|f| f.training_id().to_string());
        spawn_local(async move {
            match api.submit_assessment(&training_id, kind, &result).await {
                Ok(_) if kind == AssessmentKind::Post => {
                    notice.set(Some(Notice::success("Results saved")));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to record assessment result"),
            }
        });
    };

    let on_pre_complete = Callback::new(move |result: AssessmentResult| {
        record(AssessmentKind::Pre, result.clone());
        log_change(flow.try_update(|f| f.on_pre_assessment_complete(result)));
    });

    let on_post_complete = Callback::new(move |result: AssessmentResult| {
        record(AssessmentKind::Post, result.clone());
        log_change(flow.try_update(|f| f.on_post_assessment_complete(result)));
    });

    let on_module_event = Callback::new(move |event: ModuleEvent| {
        match flow.try_update(|f| f.apply_module_event(event)) {
            Some(Ok(Some(percent))) => {
                module_hint.set(None);
                let material_id = flow.with_untracked(|f| {
                    f.definition().and_then(|d| d.learning_module.id.clone())
                });
                if let Some(material_id) = material_id {
                    let api = auth.api();
                    spawn_local(async move {
                        if let Err(e) = api.report_progress(&material_id, percent).await {
                            tracing::warn!(error = %e, "failed to report progress");
                        }
                    });
                }
            }
            Some(Err(e)) => tracing::debug!(error = %e, "module event ignored"),
            _ => {}
        }
    });

    let continue_to_post = move |_| match flow.try_update(|f| f.on_module_learning_complete()) {
        Some(Err(TrainingError::ModuleIncomplete)) => {
            module_hint.set(Some("Finish the material before the post-assessment.".to_string()));
        }
        other => log_change(other),
    };

    let back_to_dashboard = move |_| {
        let current = flow.get_untracked();
        if current.phase() == Phase::Results {
            match current.finish() {
                Ok(outcome) => tracing::info!(
                    training = %outcome.training_id,
                    pre = outcome.pre_assessment_result.score,
                    post = outcome.post_assessment_result.score,
                    improvement = %outcome.improvement,
                    "training completed"
                ),
                Err(e) => tracing::warn!(error = %e, "training finished without results"),
            }
        }
        router.navigate_to(AppRoute::Dashboard);
    };

    let phase = Memo::new(move |_| flow.with(TrainingFlow::phase));
    let title = move || {
        flow.with(|f| {
            f.definition()
                .map(|d| d.title.clone())
                .unwrap_or_else(|| "Training".to_string())
        })
    };

    let steps = STEPS
        .into_iter()
        .map(|step| {
            let class = move || {
                if phase.get().step() >= step.step() {
                    "step step-primary"
                } else {
                    "step"
                }
            };
            view! { <li class=class>{step.label()}</li> }
        })
        .collect_view();

    let loading_view = move || match load_error.get() {
        None => view! {
            <div class="flex justify-center py-16">
                <span class="loading loading-spinner loading-lg"></span>
            </div>
        }
        .into_any(),
        Some(TrainingError::NotFound(id)) => view! {
            <div class="text-center py-16 space-y-4">
                <p class="text-lg">{format!("Training \"{}\" was not found.", id)}</p>
                <Link route=AppRoute::Dashboard class="btn btn-primary">"Back to dashboard"</Link>
            </div>
        }
        .into_any(),
        Some(e) => view! {
            <div class="text-center py-16 space-y-4">
                <div role="alert" class="alert alert-error">
                    <span>{e.to_string()}</span>
                </div>
                <button class="btn" on:click=move |_| load()>"Try again"</button>
            </div>
        }
        .into_any(),
    };

    let module_view = move || {
        let module = flow.with_untracked(|f| f.definition().map(|d| d.learning_module.clone()));
        let percent = move || {
            flow.with(|f| f.module_progress().map(|p| p.percent()).unwrap_or(0))
        };
        let complete = move || {
            flow.with(|f| f.module_progress().is_some_and(|p| p.is_complete()))
        };
        view! {
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body space-y-4">
                    {module.map(|module| view! { <MaterialViewer module=module on_event=on_module_event /> })}
                    <div class="flex items-center gap-4">
                        <progress
                            class="progress progress-success flex-1"
                            value=move || percent().to_string()
                            max="100"
                        ></progress>
                        <span class="font-mono text-sm">{move || format!("{}%", percent())}</span>
                    </div>
                    {move || module_hint.get().map(|hint| view! {
                        <div role="alert" class="alert alert-info text-sm py-2">
                            <span>{hint}</span>
                        </div>
                    })}
                    <div class="card-actions justify-end">
                        <button
                            class="btn btn-primary"
                            class:btn-disabled=move || !complete()
                            on:click=continue_to_post
                        >
                            "Continue to post-assessment"
                        </button>
                    </div>
                </div>
            </div>
        }
    };

    let results_view = move || {
        let (pre, post, improvement) = flow.with_untracked(|f| {
            (f.pre_result().cloned(), f.post_result().cloned(), f.improvement())
        });
        let pre_score = pre.as_ref().map(|r| r.score).unwrap_or(0);
        let improvement_class = match improvement {
            Some(i) if i.is_positive() => "stat-value text-success",
            Some(i) if i.0 < 0 => "stat-value text-error",
            _ => "stat-value",
        };
        let improvement_text = improvement.map(|i| i.to_string()).unwrap_or_default();
        let summary = post.as_ref().map(|r| {
            format!(
                "{} of {} correct in {}s",
                r.correct_count, r.total_questions, r.time_spent_seconds
            )
        });
        let review = post
            .map(|r| r.per_question)
            .unwrap_or_default()
            .into_iter()
            .map(|q| {
                let (badge, label) = if q.correct {
                    ("badge badge-success", "Correct")
                } else {
                    ("badge badge-error", "Incorrect")
                };
                let answer = q.user_answer_text.unwrap_or_else(|| "No answer".to_string());
                view! {
                    <li class="py-2 space-y-1">
                        <div class="flex justify-between gap-2">
                            <span class="font-medium">{q.question}</span>
                            <span class=badge>{label}</span>
                        </div>
                        <div class="text-sm opacity-70">
                            {format!("Your answer: {} · Correct answer: {}", answer, q.correct_answer_text)}
                        </div>
                    </li>
                }
            })
            .collect_view();
        let post_score = flow.with_untracked(|f| f.post_result().map(|r| r.score).unwrap_or(0));

        view! {
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body space-y-6">
                    <div class="stats stats-vertical md:stats-horizontal shadow">
                        <div class="stat">
                            <div class="stat-title">"Pre-assessment"</div>
                            <div class="stat-value">{format!("{}%", pre_score)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Post-assessment"</div>
                            <div class="stat-value text-primary">{format!("{}%", post_score)}</div>
                            <div class="stat-desc">{summary}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Improvement"</div>
                            <div class=improvement_class>{improvement_text}</div>
                        </div>
                    </div>
                    <div>
                        <h3 class="font-semibold mb-2">"Post-assessment review"</h3>
                        <ul class="divide-y divide-base-300">{review}</ul>
                    </div>
                    <div class="card-actions justify-end">
                        <button class="btn btn-primary" on:click=back_to_dashboard>
                            "Back to dashboard"
                        </button>
                    </div>
                </div>
            </div>
        }
    };

    let content = move || match phase.get() {
        Phase::Loading => loading_view.into_any(),
        Phase::PreAssessment => view! {
            <AssessmentView flow=flow kind=AssessmentKind::Pre on_complete=on_pre_complete />
        }
        .into_any(),
        Phase::ModuleLearning => module_view().into_any(),
        Phase::PostAssessment => view! {
            <AssessmentView flow=flow kind=AssessmentKind::Post on_complete=on_post_complete />
        }
        .into_any(),
        Phase::Results => results_view().into_any(),
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8">
            <Toast notice=notice on_retry=Callback::new(move |_| load()) />
            <div class="max-w-4xl mx-auto space-y-6">
                <div class="flex items-center justify-between">
                    <h1 class="text-2xl font-bold">{title}</h1>
                    <Link route=AppRoute::Dashboard class="btn btn-ghost btn-sm">"Exit"</Link>
                </div>
                <ul class="steps w-full">{steps}</ul>
                {content}
            </div>
        </div>
    }
}
