use ehs_learn::ApiError;
use leptos::prelude::*;

const DISMISS_AFTER_SECS: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
    /// 可重试的错误（网络/服务端）显示“重试”按钮
    pub retryable: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            retryable: false,
        }
    }

    pub fn from_error(context: &str, err: &ApiError) -> Self {
        tracing::warn!(error = %err, "{}", context);
        Self {
            message: format!("{}: {}", context, err.message()),
            is_error: true,
            retryable: err.status.is_retryable(),
        }
    }
}

/// 右上角通知，数秒后自动消失
#[component]
pub fn Toast(
    notice: RwSignal<Option<Notice>>,
    #[prop(optional)] on_retry: Option<Callback<()>>,
) -> impl IntoView {
    Effect::new(move |_| {
        if notice.with(|n| n.as_ref().is_some_and(|n| !n.retryable)) {
            set_timeout(
                move || notice.set(None),
                std::time::Duration::from_secs(DISMISS_AFTER_SECS),
            );
        }
    });

    move || {
        notice.get().map(|n| {
            let class = if n.is_error {
                "alert alert-error shadow-lg"
            } else {
                "alert alert-success shadow-lg"
            };
            let retry = match (n.retryable, on_retry) {
                (true, Some(cb)) => Some(view! {
                    <button
                        class="btn btn-sm"
                        on:click=move |_| {
                            notice.set(None);
                            cb.run(());
                        }
                    >
                        "Retry"
                    </button>
                }),
                _ => None,
            };
            view! {
                <div class="toast toast-top toast-end z-50">
                    <div class=class>
                        <span>{n.message}</span>
                        {retry}
                        <button class="btn btn-sm btn-ghost" on:click=move |_| notice.set(None)>
                            "✕"
                        </button>
                    </div>
                </div>
            }
        })
    }
}
