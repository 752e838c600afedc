use crate::auth::{logout, select_domain, use_auth};
use crate::components::toast::{Notice, Toast};
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use ehs_learn::shared::Domain;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn DomainSelectPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let (domains, set_domains) = signal(Vec::<Domain>::new());
    let (loading, set_loading) = signal(true);
    let (selecting, set_selecting) = signal(Option::<String>::None);
    let notice = RwSignal::new(Option::<Notice>::None);

    let load_domains = move || {
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            match api.list_domains().await {
                Ok(list) => set_domains.set(list),
                Err(e) => notice.set(Some(Notice::from_error("Failed to load domains", &e))),
            }
            set_loading.set(false);
        });
    };
    load_domains();

    let choose = move |domain: Domain| {
        set_selecting.set(Some(domain.id.clone()));
        spawn_local(async move {
            match select_domain(&auth, domain).await {
                Ok(()) => router.navigate_to(AppRoute::Dashboard),
                Err(e) => notice.set(Some(Notice::from_error("Failed to select domain", &e))),
            }
            set_selecting.set(None);
        });
    };

    let current = move || auth.session.with(|s| s.selected_domain().map(|d| d.id.clone()));

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8">
            <Toast notice=notice on_retry=Callback::new(move |_| load_domains()) />
            <div class="max-w-3xl mx-auto space-y-6">
                <div class="flex items-center justify-between">
                    <div>
                        <h1 class="text-3xl font-bold">"Choose your domain"</h1>
                        <p class="text-base-content/70">
                            "Your trainings are grouped by EHS domain."
                        </p>
                    </div>
                    <button class="btn btn-ghost" on:click=move |_| logout(&auth)>"Sign out"</button>
                </div>

                <Show when=move || loading.get()>
                    <div class="flex justify-center py-12">
                        <span class="loading loading-spinner loading-lg"></span>
                    </div>
                </Show>

                <div class="grid gap-4 md:grid-cols-2">
                    <For
                        each=move || domains.get()
                        key=|d| d.id.clone()
                        children=move |domain| {
                            let id = domain.id.clone();
                            let is_current = {
                                let id = id.clone();
                                move || current().as_deref() == Some(id.as_str())
                            };
                            let is_busy = move || selecting.get().as_deref() == Some(id.as_str());
                            let description = domain.description.clone().unwrap_or_default();
                            let name = domain.name.clone();
                            view! {
                                <div class="card bg-base-100 shadow-xl">
                                    <div class="card-body">
                                        <h2 class="card-title">
                                            {name}
                                            <Show when=is_current.clone()>
                                                <span class="badge badge-primary">"Current"</span>
                                            </Show>
                                        </h2>
                                        <p class="text-base-content/70">{description}</p>
                                        <div class="card-actions justify-end">
                                            <button
                                                class="btn btn-primary"
                                                disabled=move || selecting.get().is_some()
                                                on:click=move |_| choose(domain.clone())
                                            >
                                                {move || if is_busy() { "Selecting..." } else { "Select" }}
                                            </button>
                                        </div>
                                    </div>
                                </div>
                            }
                        }
                    />
                </div>
            </div>
        </div>
    }
}
