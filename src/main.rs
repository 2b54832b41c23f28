mod backend;
mod components;

use backend::config::Config;
use backend::store::Store;
use backend::{AppCmd, AppEvent};
use components::contact_page::ContactComponent;
use components::course_player_page::CoursePlayerComponent;
use components::employee_page::EmployeeComponent;
use components::home_page::HomeComponent;
use components::login_page::LoginComponent;
use components::nav_bar::{NavComponent, NotFoundComponent};
use components::org_admin_page::OrgAdminComponent;
use components::quiz_page::QuizComponent;
use components::quiz_results_page::QuizResultsComponent;
use components::super_admin_page::SuperAdminComponent;
use components::common::ToastHost;
use components::AppState;

use dioxus::prelude::*;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Routable, Clone, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(NavComponent)]
        #[route("/")]
        HomeComponent {},
        #[route("/contact")]
        ContactComponent {},
        #[route("/login")]
        LoginComponent {},
        #[route("/admin")]
        SuperAdminComponent {},
        #[route("/org")]
        OrgAdminComponent {},
        #[route("/learn")]
        EmployeeComponent {},
        #[route("/course/:course_id")]
        CoursePlayerComponent { course_id: String },
        #[route("/quiz/:course_id")]
        QuizComponent { course_id: String },
        #[route("/quiz/:course_id/results")]
        QuizResultsComponent { course_id: String },
    #[end_layout]
    #[route("/:..segments")]
    NotFoundComponent { segments: Vec<String> },
}

fn main() {
    let config = Config::load();

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = tracing_subscriber::fmt().with_max_level(config.log_level).try_init();
    }

    let store = match Store::new(&config.store_path) {
        Ok(store) => store,
        Err(e) => {
            warn!("Failed to open store at {}: {e}; using memory", config.store_path);
            match Store::new_in_memory() {
                Ok(store) => store,
                Err(e) => {
                    error!("Failed to create store: {e}");
                    return;
                }
            }
        }
    };

    info!("Starting compliance trainer against {}", config.api_base_url);
    dioxus::LaunchBuilder::new().with_context(config).with_context(store).launch(App);
}

#[component]
fn App() -> Element {
    let config = use_context::<Config>();
    let store = use_context::<Store>();
    let mut app_state = AppState::new(&store);
    use_context_provider(|| app_state);

    let cmd_tx = use_hook(move || {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCmd>();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

        spawn(backend::init(config, store, cmd_rx, event_tx));
        spawn(async move {
            while let Some(event) = event_rx.recv().await {
                app_state.apply(event);
            }
        });
        cmd_tx
    });
    use_context_provider(|| cmd_tx);

    rsx! {
        document::Stylesheet { href: asset!("/assets/main.css") }
        ToastHost {}
        Router::<Route> {}
    }
}
