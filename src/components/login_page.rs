use dioxus::prelude::*;
use dioxus::core::use_drop;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::{AppCmd, RequestScope};
use crate::components::common::dashboard_route;
use crate::components::{AppState, ToastKind};

#[component]
pub fn LoginComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);

    // Route by role as soon as a session exists
    use_effect(move || {
        if app_state.session.read().is_some() {
            navigator().replace(dashboard_route(&app_state));
        }
    });

    let cmd_tx_drop = cmd_tx.clone();
    use_drop(move || {
        let _ = cmd_tx_drop.send(AppCmd::CancelScope(RequestScope::Login));
    });

    let on_submit = move |_| {
        if email().trim().is_empty() || password().is_empty() {
            app_state.notify(ToastKind::Error, "Enter your email and password.");
            return;
        }
        app_state.login_pending.set(true);
        let _ = cmd_tx.send(AppCmd::Login {
            email: email().trim().to_string(),
            password: password(),
        });
        password.set(String::new());
    };

    let pending = (app_state.login_pending)();

    rsx! {
        div { class: "page-container py-12 animate-fade-in",
            div { class: "panel max-w-md mx-auto",
                div { class: "panel-header",
                    h1 { class: "panel-title", "Sign in" }
                }
                div { class: "grid gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Email" }
                        input {
                            class: "input",
                            "type": "email",
                            value: "{email}",
                            oninput: move |e| email.set(e.value())
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Password" }
                        input {
                            class: "input",
                            "type": "password",
                            value: "{password}",
                            oninput: move |e| password.set(e.value())
                        }
                    }
                    button {
                        class: "btn btn-primary",
                        disabled: pending,
                        onclick: on_submit,
                        if pending { "Signing in..." } else { "Sign in" }
                    }
                }
            }
        }
    }
}
