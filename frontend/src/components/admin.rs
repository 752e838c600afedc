use crate::auth::{logout, use_auth};
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;

/// 管理员落地页
///
/// 只展示账号信息与入口，内容管理界面不在此前端中。
#[component]
pub fn AdminPage() -> impl IntoView {
    let auth = use_auth();

    let user = move || auth.session.with(|s| s.user().cloned());

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8">
            <div class="max-w-3xl mx-auto space-y-6">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1">
                        <a class="btn btn-ghost text-xl">"EHS Learn · Admin"</a>
                    </div>
                    <div class="flex-none gap-2">
                        <Link route=AppRoute::Dashboard class="btn btn-ghost">"Learner view"</Link>
                        <button class="btn btn-outline btn-error" on:click=move |_| logout(&auth)>
                            "Sign out"
                        </button>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <h2 class="card-title">"Signed in as administrator"</h2>
                        {move || user().map(|u| view! {
                            <p>{u.name} " · " <span class="font-mono">{u.email}</span></p>
                        })}
                        <p class="text-base-content/70">
                            "Trainings, domains and users are managed in the administration console."
                        </p>
                    </div>
                </div>
            </div>
        </div>
    }
}
