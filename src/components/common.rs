use chrono::Utc;
use dioxus::prelude::*;

use crate::components::{AppState, ToastKind};
use crate::Route;

const TOAST_LIFETIME_SECS: i64 = 4;

#[component]
pub fn ToastHost() -> Element {
    let mut app_state = use_context::<AppState>();
    let mut toasts = app_state.toasts;

    // Expire old toasts
    use_future(move || async move {
        loop {
            #[cfg(not(target_arch = "wasm32"))]
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            #[cfg(target_arch = "wasm32")]
            gloo_timers::future::sleep(std::time::Duration::from_secs(1)).await;

            let now = Utc::now();
            let expired = toasts
                .read()
                .iter()
                .any(|t| (now - t.created_at).num_seconds() >= TOAST_LIFETIME_SECS);
            if expired {
                toasts
                    .write()
                    .retain(|t| (now - t.created_at).num_seconds() < TOAST_LIFETIME_SECS);
            }
        }
    });

    let visible = app_state.toasts.read().clone();

    rsx! {
        div { class: "toast-stack",
            for toast in visible {
                {
                    let kind_class = match toast.kind {
                        ToastKind::Info => "toast toast-info",
                        ToastKind::Success => "toast toast-success",
                        ToastKind::Error => "toast toast-error",
                    };
                    let id = toast.id;
                    rsx! {
                        div { key: "{toast.id}", class: "{kind_class} animate-fade-in",
                            span { "{toast.message}" }
                            button {
                                class: "toast-close",
                                onclick: move |_| app_state.dismiss(id),
                                "✕"
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Blocking inline error with a way back to the user's dashboard.
#[component]
pub fn BlockingError(title: String, message: String) -> Element {
    let app_state = use_context::<AppState>();
    let dashboard = dashboard_route(&app_state);

    rsx! {
        div { class: "page-container py-12 animate-fade-in",
            div { class: "panel text-center max-w-lg mx-auto",
                div { class: "empty-state-icon", "⚠️" }
                h2 { class: "text-xl font-bold mb-2", "{title}" }
                p { class: "text-[var(--text-secondary)] mb-6", "{message}" }
                Link { to: dashboard, class: "btn btn-primary", "Return to dashboard" }
            }
        }
    }
}

#[component]
pub fn ProgressBar(percent: f64, class: Option<String>) -> Element {
    let width = percent.clamp(0.0, 100.0);
    let extra_class = class.unwrap_or_default();
    rsx! {
        div { class: "w-full bg-[var(--bg-secondary)] rounded-full h-2 {extra_class}",
            div {
                class: "bg-[var(--primary)] h-2 rounded-full transition-all",
                style: "width: {width}%"
            }
        }
    }
}

#[component]
pub fn LoadingPanel(label: String) -> Element {
    rsx! {
        div { class: "empty-state py-12",
            div { class: "empty-state-icon animate-pulse", "⏳" }
            p { class: "empty-state-title", "{label}" }
        }
    }
}

/// Where "back to dashboard" leads for the signed-in role.
pub fn dashboard_route(app_state: &AppState) -> Route {
    use crate::backend::models::UserRole;

    match app_state.session.read().as_ref().map(|s| s.role) {
        Some(UserRole::SuperAdmin) => Route::SuperAdminComponent {},
        Some(UserRole::OrgAdmin) => Route::OrgAdminComponent {},
        Some(UserRole::Employee) => Route::EmployeeComponent {},
        None => Route::LoginComponent {},
    }
}
