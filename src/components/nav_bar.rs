use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::models::UserRole;
use crate::backend::AppCmd;
use crate::Route;

#[component]
pub fn NavComponent() -> Element {
    let app_state = use_context::<crate::components::AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let session = app_state.session.read().clone();
    let role = session.as_ref().map(|s| s.role);

    let on_logout = move |_| {
        let _ = cmd_tx.send(AppCmd::Logout);
        navigator().push(Route::HomeComponent {});
    };

    rsx! {
        div { class: "min-h-screen flex flex-col",
            nav { class: "nav-bar",
                div { class: "page-container",
                    // Logo section
                    div { class: "nav-logo",
                        div { class: "logo-icon" }
                        span { class: "logo-text", "ComplyTrain" }
                        if let Some(role) = role {
                            span { class: "badge badge-verified ml-2", "{role.label()}" }
                        }
                    }

                    // Navigation links
                    div { class: "nav-links",
                        match role {
                            None => rsx! {
                                Link { to: Route::HomeComponent {}, class: "nav-link", active_class: "active", "Home" }
                                Link { to: Route::ContactComponent {}, class: "nav-link", active_class: "active", "Contact" }
                                Link { to: Route::LoginComponent {}, class: "nav-link", active_class: "active", "Sign in" }
                            },
                            Some(UserRole::SuperAdmin) => rsx! {
                                Link { to: Route::SuperAdminComponent {}, class: "nav-link", active_class: "active", "Organizations" }
                            },
                            Some(UserRole::OrgAdmin) => rsx! {
                                Link { to: Route::OrgAdminComponent {}, class: "nav-link", active_class: "active", "Dashboard" }
                            },
                            Some(UserRole::Employee) => rsx! {
                                Link { to: Route::EmployeeComponent {}, class: "nav-link", active_class: "active", "My Courses" }
                            },
                        }
                        if let Some(session) = session {
                            span { class: "nav-user", "{session.user_name}" }
                            button { class: "btn btn-ghost btn-sm", onclick: on_logout, "Sign out" }
                        }
                    }
                }
            }

            div { class: "fixed-header-spacer" }

            div { class: "flex-1",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
pub fn NotFoundComponent(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div { class: "page-container py-12",
            div { class: "empty-state",
                div { class: "empty-state-icon", "🧭" }
                p { class: "empty-state-title", "Page not found" }
                p { class: "empty-state-text", "/{path}" }
                Link { to: Route::HomeComponent {}, class: "btn btn-primary mt-4", "Go home" }
            }
        }
    }
}
