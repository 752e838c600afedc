use crate::auth::use_auth;
use ehs_learn::shared::LearningModule;
use ehs_learn::{MaterialError, MaterialKind, ModuleEvent, ViewerPlan};
use leptos::prelude::*;
use web_sys::HtmlMediaElement;

fn media_position(ev: &leptos::ev::Event) -> ModuleEvent {
    let media = event_target::<HtmlMediaElement>(ev);
    ModuleEvent::VideoPosition {
        position: media.current_time(),
        duration: media.duration(),
    }
}

/// 学习素材查看器
///
/// 能内嵌的内容直接展示，其余（或加载失败的）改为新窗口打开。
/// 查看进度通过 `on_event` 交给培训流程。
#[component]
pub fn MaterialViewer(module: LearningModule, on_event: Callback<ModuleEvent>) -> impl IntoView {
    let auth = use_auth();
    let plan = RwSignal::new(ViewerPlan::for_module(&module, auth.api().client().config()));

    let fail = move |reason: &str| {
        plan.update(|p| {
            if let Ok(current) = p {
                let error = MaterialError::ContentLoad {
                    url: current.url().to_string(),
                    reason: reason.to_string(),
                };
                *current = current.clone().degrade(&error);
            }
        });
    };

    let stored_module = StoredValue::new(module.clone());
    let slides = Memo::new(move |_| {
        plan.with(|p| {
            p.as_ref()
                .ok()
                .and_then(|p| stored_module.with_value(|m| p.slide_count(m)))
        })
    });
    let (page, set_page) = signal(0u32);
    let go_to = move |index: u32| {
        set_page.set(index);
        on_event.run(ModuleEvent::PageViewed { index });
    };
    Effect::new(move |_| {
        if slides.get().is_some() {
            on_event.run(ModuleEvent::PageViewed { index: 0 });
        }
    });

    let body = move || match plan.get() {
        Ok(ViewerPlan::Embed { kind, url }) => match kind {
            MaterialKind::Video => view! {
                <video
                    class="w-full rounded-box bg-black"
                    src=url
                    controls
                    preload="metadata"
                    on:timeupdate=move |ev| on_event.run(media_position(&ev))
                    on:ended=move |ev| on_event.run(media_position(&ev))
                    on:error=move |_| fail("video could not be played")
                ></video>
            }
            .into_any(),
            MaterialKind::Image => view! {
                <img
                    class="max-w-full mx-auto rounded-box"
                    src=url
                    on:load=move |_| on_event.run(ModuleEvent::DocumentLoaded)
                    on:error=move |_| fail("image could not be loaded")
                />
            }
            .into_any(),
            _ => {
                let src = move || match slides.get() {
                    Some(_) => format!("{}#page={}", url, page.get() + 1),
                    None => url.clone(),
                };
                view! {
                    <iframe
                        class="w-full h-[70vh] rounded-box border border-base-300"
                        src=src
                        on:load=move |_| on_event.run(ModuleEvent::DocumentLoaded)
                    ></iframe>
                }
                .into_any()
            }
        },
        Ok(ViewerPlan::OpenExternally { url, reason }) => {
            tracing::debug!(%url, %reason, "material opens externally");
            view! {
                <div class="flex flex-col items-center gap-4 py-10 text-center">
                    <p class="text-base-content/70">
                        "This material opens in a new window."
                    </p>
                    <a
                        class="btn btn-primary"
                        href=url
                        target="_blank"
                        rel="noopener noreferrer"
                        on:click=move |_| on_event.run(ModuleEvent::DocumentLoaded)
                    >
                        "Open material"
                    </a>
                </div>
            }
            .into_any()
        }
        Err(e) => view! {
            <div role="alert" class="alert alert-warning">
                <span>{format!("Material unavailable: {}", e)}</span>
            </div>
        }
        .into_any(),
    };

    let pager = move || {
        slides.get().map(|pages| view! {
            <div class="join justify-center w-full">
                <button
                    class="join-item btn"
                    disabled=move || page.get() == 0
                    on:click=move |_| go_to(page.get_untracked().saturating_sub(1))
                >
                    "«"
                </button>
                <span class="join-item btn btn-disabled">
                    {move || format!("Slide {} / {}", page.get() + 1, pages)}
                </span>
                <button
                    class="join-item btn"
                    disabled=move || page.get() + 1 >= pages
                    on:click=move |_| go_to((page.get_untracked() + 1).min(pages - 1))
                >
                    "»"
                </button>
            </div>
        })
    };

    view! {
        <div class="space-y-4">
            <div>
                <h3 class="text-xl font-semibold">{module.title.clone()}</h3>
                <p class="text-base-content/70">{module.description.clone()}</p>
            </div>
            {body}
            {pager}
            <div class="flex justify-end">
                <button
                    class="btn btn-outline btn-success btn-sm"
                    on:click=move |_| on_event.run(ModuleEvent::MarkComplete)
                >
                    "Mark as complete"
                </button>
            </div>
        </div>
    }
}
