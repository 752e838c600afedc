use crate::auth::{logout, use_auth};
use crate::components::toast::{Notice, Toast};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use ehs_learn::shared::{TrainingStatus, TrainingSummary};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn status_badge(status: TrainingStatus) -> (&'static str, &'static str) {
    match status {
        TrainingStatus::NotStarted => ("Not started", "badge badge-ghost"),
        TrainingStatus::InProgress => ("In progress", "badge badge-warning"),
        TrainingStatus::Completed => ("Completed", "badge badge-success"),
    }
}

fn score_cell(score: Option<u8>) -> String {
    score.map(|s| format!("{}%", s)).unwrap_or_else(|| "–".to_string())
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let (trainings, set_trainings) = signal(Vec::<TrainingSummary>::new());
    let (loading, set_loading) = signal(true);
    let notice = RwSignal::new(Option::<Notice>::None);

    let load_trainings = move || {
        let api = auth.api();
        let domain_id = auth
            .session
            .with_untracked(|s| s.selected_domain().map(|d| d.id.clone()));
        set_loading.set(true);
        spawn_local(async move {
            match api.list_trainings(domain_id.as_deref()).await {
                Ok(list) => set_trainings.set(list),
                Err(e) => notice.set(Some(Notice::from_error("Failed to load trainings", &e))),
            }
            set_loading.set(false);
        });
    };
    load_trainings();

    let user_name = move || auth.session.with(|s| s.user().map(|u| u.name.clone()).unwrap_or_default());
    let domain_name = move || {
        auth.session
            .with(|s| s.selected_domain().map(|d| d.name.clone()).unwrap_or_default())
    };
    let is_admin = move || auth.session.with(|s| s.is_admin());
    let completed = move || {
        trainings.with(|list| {
            list.iter()
                .filter(|t| t.status == TrainingStatus::Completed)
                .count()
        })
    };
    let total = move || trainings.with(Vec::len);

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <Toast notice=notice on_retry=Callback::new(move |_| load_trainings()) />
            <div class="max-w-7xl mx-auto space-y-8">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <a class="btn btn-ghost text-xl">"EHS Learn"</a>
                        <span class="badge badge-neutral hidden md:inline-flex">{domain_name}</span>
                    </div>
                    <div class="flex-none gap-2">
                        <span class="hidden md:inline">{user_name}</span>
                        <Show when=is_admin>
                            <Link route=AppRoute::Admin class="btn btn-ghost">"Admin"</Link>
                        </Show>
                        <Link route=AppRoute::DomainSelect class="btn btn-ghost">"Change domain"</Link>
                        <button on:click=move |_| logout(&auth) class="btn btn-outline btn-error">
                            "Sign out"
                        </button>
                    </div>
                </div>

                <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                    <div class="stat">
                        <div class="stat-title">"Trainings"</div>
                        <div class="stat-value text-primary">{total}</div>
                    </div>
                    <div class="stat">
                        <div class="stat-title">"Completed"</div>
                        <div class="stat-value text-success">{completed}</div>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body p-0">
                        <div class="p-6 pb-2">
                            <h3 class="card-title">"Your trainings"</h3>
                        </div>
                        <div class="overflow-x-auto w-full">
                            <table class="table table-zebra w-full">
                                <thead>
                                    <tr>
                                        <th>"Training"</th>
                                        <th>"Status"</th>
                                        <th class="hidden md:table-cell">"Pre"</th>
                                        <th class="hidden md:table-cell">"Post"</th>
                                        <th></th>
                                    </tr>
                                </thead>
                                <tbody>
                                    <Show when=move || total() == 0 && !loading.get()>
                                        <tr>
                                            <td colspan="5" class="text-center py-8 text-base-content/50">
                                                "No trainings are assigned to this domain yet."
                                            </td>
                                        </tr>
                                    </Show>
                                    <Show when=move || loading.get() && total() == 0>
                                        <tr>
                                            <td colspan="5" class="text-center py-8 text-base-content/50">
                                                <span class="loading loading-spinner loading-md"></span>
                                                " Loading..."
                                            </td>
                                        </tr>
                                    </Show>
                                    <For
                                        each=move || trainings.get()
                                        key=|t| t.id.clone()
                                        children=move |training| {
                                            let (label, badge) = status_badge(training.status);
                                            let action = match training.status {
                                                TrainingStatus::NotStarted => "Start",
                                                TrainingStatus::InProgress => "Continue",
                                                TrainingStatus::Completed => "Retake",
                                            };
                                            let id = training.id.clone();
                                            view! {
                                                <tr>
                                                    <td>
                                                        <div class="font-bold">{training.title.clone()}</div>
                                                        <div class="text-sm opacity-60">
                                                            {training.description.clone().unwrap_or_default()}
                                                        </div>
                                                    </td>
                                                    <td><span class=badge>{label}</span></td>
                                                    <td class="hidden md:table-cell">{score_cell(training.pre_score)}</td>
                                                    <td class="hidden md:table-cell">{score_cell(training.post_score)}</td>
                                                    <td>
                                                        <button
                                                            class="btn btn-primary btn-sm"
                                                            on:click=move |_| router.navigate_to(AppRoute::Training(id.clone()))
                                                        >
                                                            {action}
                                                        </button>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    />
                                </tbody>
                            </table>
                        </div>
                    </div>
                </div>
            </div>
        </div>
    }
}
