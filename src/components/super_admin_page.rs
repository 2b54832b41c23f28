use dioxus::prelude::*;
use dioxus::core::use_drop;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::models::{NewTenant, UserRole};
use crate::backend::{AppCmd, RequestScope};
use crate::components::common::BlockingError;
use crate::components::{AppState, ToastKind};

#[component]
pub fn SuperAdminComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();

    let mut name = use_signal(String::new);
    let mut admin_email = use_signal(String::new);
    let mut admin_password = use_signal(String::new);

    let fetch_tx = cmd_tx.clone();
    use_hook(move || {
        let _ = fetch_tx.send(AppCmd::FetchTenants);
    });

    let drop_tx = cmd_tx.clone();
    use_drop(move || {
        let _ = drop_tx.send(AppCmd::CancelScope(RequestScope::SuperAdmin));
    });

    let is_super_admin = app_state.session.read().as_ref().is_some_and(|s| s.role == UserRole::SuperAdmin);
    if !is_super_admin {
        return rsx! {
            BlockingError {
                title: "Not authorized".to_string(),
                message: "Only platform administrators can manage organizations.".to_string()
            }
        };
    }

    let on_create = move |_| {
        let tenant = NewTenant {
            name: name().trim().to_string(),
            admin_email: admin_email().trim().to_string(),
            admin_password: admin_password(),
        };
        if tenant.name.is_empty() || !tenant.admin_email.contains('@') || tenant.admin_password.len() < 8 {
            app_state.notify(
                ToastKind::Error,
                "Enter an organization name, an admin email and a password of at least 8 characters.",
            );
            return;
        }
        let _ = cmd_tx.send(AppCmd::CreateTenant(tenant));
        name.set(String::new());
        admin_email.set(String::new());
        admin_password.set(String::new());
    };

    let tenants = app_state.tenants.read().clone();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Organizations" }
                p { class: "text-[var(--text-secondary)] mt-1", "{tenants.len()} tenants on the platform" }
            }

            div { class: "grid grid-cols-1 lg:grid-cols-3 gap-6",
                div { class: "panel lg:col-span-2",
                    h3 { class: "panel-title mb-3", "All organizations" }
                    if tenants.is_empty() {
                        div { class: "empty-state",
                            div { class: "empty-state-icon", "🏢" }
                            p { class: "empty-state-title", "No organizations yet" }
                        }
                    } else {
                        table { class: "table",
                            thead {
                                tr {
                                    th { "Name" }
                                    th { "Admin" }
                                    th { "Created" }
                                }
                            }
                            tbody {
                                for tenant in tenants {
                                    tr { key: "{tenant.id}",
                                        td { "{tenant.name}" }
                                        td { "{tenant.admin_email}" }
                                        td {
                                            {tenant.created_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string())}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                div { class: "panel",
                    h3 { class: "panel-title mb-3", "New organization" }
                    div { class: "grid gap-3",
                        input {
                            class: "input",
                            placeholder: "Organization name",
                            value: "{name}",
                            oninput: move |e| name.set(e.value())
                        }
                        input {
                            class: "input",
                            "type": "email",
                            placeholder: "Admin email",
                            value: "{admin_email}",
                            oninput: move |e| admin_email.set(e.value())
                        }
                        input {
                            class: "input",
                            "type": "password",
                            placeholder: "Admin password",
                            value: "{admin_password}",
                            oninput: move |e| admin_password.set(e.value())
                        }
                        button { class: "btn btn-primary", onclick: on_create, "Create organization" }
                    }
                }
            }
        }
    }
}
