use dioxus::prelude::*;
use dioxus::core::use_drop;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::models::ContactRequest;
use crate::backend::{AppCmd, RequestScope};
use crate::components::{AppState, ToastKind};

#[component]
pub fn ContactComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();

    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut company = use_signal(String::new);
    let mut message = use_signal(String::new);

    let cmd_tx_drop = cmd_tx.clone();
    use_drop(move || {
        let _ = cmd_tx_drop.send(AppCmd::CancelScope(RequestScope::Marketing));
    });

    let on_submit = move |_| {
        let request = ContactRequest {
            name: name(),
            email: email(),
            company: company(),
            message: message(),
        };
        if !request.is_complete() {
            app_state.notify(ToastKind::Error, "Please enter your name, a valid email and a message.");
            return;
        }
        app_state.contact_sent.set(false);
        let _ = cmd_tx.send(AppCmd::SubmitContact(request));
    };

    if (app_state.contact_sent)() {
        return rsx! {
            div { class: "page-container py-12 animate-fade-in",
                div { class: "panel text-center max-w-lg mx-auto",
                    div { class: "empty-state-icon", "✉️" }
                    h2 { class: "text-xl font-bold mb-2", "Message sent" }
                    p { class: "text-[var(--text-secondary)] mb-4", "Our team will get back to you within one business day." }
                    button {
                        class: "btn btn-secondary",
                        onclick: move |_| {
                            app_state.contact_sent.set(false);
                            message.set(String::new());
                        },
                        "Send another message"
                    }
                }
            }
        };
    }

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Contact us" }
                p { class: "text-[var(--text-secondary)] mt-1", "Tell us about your organization and training needs." }
            }
            div { class: "panel max-w-2xl",
                div { class: "grid gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Name" }
                        input { class: "input", value: "{name}", oninput: move |e| name.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Work email" }
                        input { class: "input", "type": "email", value: "{email}", oninput: move |e| email.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Company" }
                        input { class: "input", value: "{company}", oninput: move |e| company.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Message" }
                        textarea {
                            class: "input",
                            style: "min-height: 120px;",
                            value: "{message}",
                            oninput: move |e| message.set(e.value())
                        }
                    }
                    button { class: "btn btn-primary", onclick: on_submit, "Send" }
                }
            }
        }
    }
}
