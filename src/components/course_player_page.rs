use dioxus::prelude::*;
use dioxus::core::{use_drop, Task};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::backend::error::Recovery;
use crate::backend::player::{
    PlayState, PlayerEvent, SlidePlayer, SlideStatus, TimerLease, PLAYBACK_RATES, TICK_INTERVAL_MS,
};
use crate::backend::{AppCmd, RequestScope};
use crate::components::common::{BlockingError, LoadingPanel, ProgressBar};
use crate::components::{AppState, ToastKind};
use crate::Route;

/// Everything the player controls and the ticker share. All fields are
/// signal handles, so the whole thing is `Copy` and can move into closures.
#[derive(Clone, Copy)]
struct PlayerHandle {
    player: Signal<Option<SlidePlayer>>,
    ticker: Signal<Option<Task>>,
    app_state: AppState,
    cmd_tx: CopyValue<UnboundedSender<AppCmd>>,
    course_id: CopyValue<String>,
}

impl PlayerHandle {
    fn dispatch(self, action: impl FnOnce(&mut SlidePlayer) -> Vec<PlayerEvent>) {
        let events = {
            let mut player = self.player;
            let mut guard = player.write();
            match guard.as_mut() {
                Some(p) => action(p),
                None => return,
            }
        };
        self.apply(events);
    }

    fn apply(mut self, events: Vec<PlayerEvent>) {
        for event in events {
            match event {
                PlayerEvent::TimerStarted(lease) => {
                    self.start_ticker(lease);
                    self.narrate_current();
                }
                PlayerEvent::TimerStopped => self.stop_ticker(),
                PlayerEvent::SlideChanged(index) => {
                    debug!("Slide {index} selected");
                    self.app_state.speech.set(None);
                }
                PlayerEvent::GateOpened(index) => debug!("Slide {index} can be left"),
                PlayerEvent::SlideFinished(index) => debug!("Slide {index} finished"),
                PlayerEvent::CourseCompleted => self.complete_course(),
                PlayerEvent::Rejected(notice) => self.app_state.notify(ToastKind::Info, notice),
            }
        }
    }

    fn start_ticker(mut self, lease: TimerLease) {
        self.stop_ticker();
        let task = spawn(async move {
            loop {
                #[cfg(not(target_arch = "wasm32"))]
                tokio::time::sleep(std::time::Duration::from_millis(TICK_INTERVAL_MS)).await;
                #[cfg(target_arch = "wasm32")]
                gloo_timers::future::sleep(std::time::Duration::from_millis(TICK_INTERVAL_MS)).await;

                let (events, still_leased) = {
                    let mut player = self.player;
                    let mut guard = player.write();
                    let Some(p) = guard.as_mut() else {
                        break;
                    };
                    let events = p.tick(lease);
                    (events, p.active_lease() == Some(lease))
                };
                // The ticker cannot cancel itself; it just returns
                let events = events.into_iter().filter(|e| *e != PlayerEvent::TimerStopped).collect();
                self.apply(events);
                if !still_leased {
                    break;
                }
            }
            self.ticker.set(None);
        });
        self.ticker.set(Some(task));
    }

    fn stop_ticker(mut self) {
        if let Some(task) = self.ticker.write().take() {
            task.cancel();
        }
    }

    /// Revokes the lease and cancels the ticker on unmount. Signals may
    /// already be gone at that point, so nothing here may panic.
    fn shutdown(self) {
        let mut player = self.player;
        if let Ok(mut guard) = player.try_write() {
            if let Some(p) = guard.as_mut() {
                let revoked = p.stop();
                debug!("Player unmounted ({} event(s))", revoked.len());
            }
        }
        let mut ticker = self.ticker;
        if let Ok(mut guard) = ticker.try_write() {
            if let Some(task) = guard.take() {
                task.cancel();
            }
        };
    }

    /// Requests narration for the current slide if none is loaded yet.
    fn narrate_current(mut self) {
        let Some(bundle) = self.app_state.course_bundle.read().clone() else {
            return;
        };
        let Some(slide) = self.player.read().as_ref().and_then(|p| p.current_slide().cloned()) else {
            return;
        };
        let already = self
            .app_state
            .speech
            .read()
            .as_ref()
            .is_some_and(|(slide_id, _)| *slide_id == slide.id);
        if already {
            return;
        }
        let text = bundle
            .explanation_for(&slide.id)
            .map(str::to_string)
            .unwrap_or_else(|| slide.content.clone());
        if text.trim().is_empty() {
            return;
        }
        self.app_state.speech.set(None);
        let _ = self.cmd_tx.read().send(AppCmd::Speak { slide_id: slide.id, text });
    }

    fn complete_course(mut self) {
        if (self.app_state.generating_quiz)() {
            return;
        }
        let course_title = self
            .app_state
            .course_bundle
            .read()
            .as_ref()
            .map(|b| b.course.title.clone())
            .unwrap_or_default();
        info!("Course {} completed, preparing quiz", self.course_id.read());
        self.app_state.generating_quiz.set(true);
        self.app_state.notify(ToastKind::Info, "Course complete! Generating your quiz...");
        let _ = self.cmd_tx.read().send(AppCmd::CompleteCourse {
            course_id: self.course_id.read().clone(),
            course_title,
        });
    }
}

#[component]
pub fn CoursePlayerComponent(course_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let sender = use_context::<UnboundedSender<AppCmd>>();
    let cmd_tx = use_hook(move || CopyValue::new(sender));

    let handle = PlayerHandle {
        player: use_signal(|| None),
        ticker: use_signal(|| None),
        app_state,
        cmd_tx,
        course_id: use_hook({
            let course_id = course_id.clone();
            move || CopyValue::new(course_id)
        }),
    };

    // Load on mount
    use_effect({
        let course_id = course_id.clone();
        move || {
            app_state.course_bundle.set(None);
            app_state.course_error.set(None);
            app_state.quiz_ready.set(None);
            app_state.speech.set(None);
            app_state.generating_quiz.set(false);
            let _ = cmd_tx.read().send(AppCmd::LoadCourse { course_id: course_id.clone() });
        }
    });

    // Build the player once the course arrives
    use_effect(move || {
        let bundle = app_state.course_bundle.read();
        if let Some(bundle) = bundle.as_ref() {
            if *handle.course_id.read() == bundle.course.id && handle.player.peek().is_none() {
                let mut player = handle.player;
                player.set(Some(SlidePlayer::new(bundle.slides.clone())));
            }
        }
    });

    // Hand off to the quiz
    use_effect(move || {
        if let Some(ready) = app_state.quiz_ready.read().clone() {
            if ready == *handle.course_id.peek() {
                navigator().push(Route::QuizComponent { course_id: ready });
            }
        }
    });

    // Mirror volume and rate onto the narration audio element
    use_effect(move || {
        let Some((volume, rate)) = handle
            .player
            .read()
            .as_ref()
            .map(|p| (p.effective_volume(), p.state().playback_rate))
        else {
            return;
        };
        let _ = app_state.speech.read();
        document::eval(&format!(
            "const a = document.getElementById('narration'); if (a) {{ a.volume = {volume}; a.playbackRate = {rate}; }}"
        ));
    });

    let drop_tx = cmd_tx.read().clone();
    use_drop(move || {
        handle.shutdown();
        let _ = drop_tx.send(AppCmd::CancelScope(RequestScope::Player));
    });

    if let Some(error) = app_state.course_error.read().clone() {
        if error.recovery() != Recovery::Toast || app_state.course_bundle.read().is_none() {
            return rsx! {
                BlockingError { title: "Course unavailable".to_string(), message: error.user_message() }
            };
        }
    }

    let Some(bundle) = app_state.course_bundle.read().clone() else {
        return rsx! { LoadingPanel { label: "Loading course...".to_string() } };
    };
    let player_guard = handle.player.read();
    let Some(player) = player_guard.as_ref() else {
        return rsx! { LoadingPanel { label: "Preparing slides...".to_string() } };
    };

    if player.slides().is_empty() {
        return rsx! {
            BlockingError {
                title: "No slides".to_string(),
                message: "This course has no slides yet. Please check back later.".to_string()
            }
        };
    }

    let state = player.state().clone();
    let play_state = player.play_state();
    let statuses = player.slide_statuses();
    let is_last = player.is_last_slide();
    let gate_secs = (player.ticks_until_gate() as u64 * TICK_INTERVAL_MS).div_ceil(1000);
    let total = player.slides().len();
    let completed = player.completed_count();
    let slide = player.current_slide().cloned();
    let slide_titles: Vec<String> = player.slides().iter().map(|s| s.title.clone()).collect();
    drop(player_guard);

    let subtitle = slide
        .as_ref()
        .and_then(|s| bundle.explanation_for(&s.id).map(str::to_string));
    let narration = app_state
        .speech
        .read()
        .clone()
        .filter(|(slide_id, _)| slide.as_ref().is_some_and(|s| s.id == *slide_id))
        .map(|(_, url)| url);
    let generating = (app_state.generating_quiz)();
    let course_progress = completed as f64 * 100.0 / total as f64;
    let play_label = match play_state {
        PlayState::Playing => "⏸ Pause",
        PlayState::Paused => "▶ Resume",
        PlayState::Idle => "▶ Play",
    };

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "{bundle.course.title}" }
                p { class: "text-[var(--text-secondary)] mt-1", "{completed} of {total} slides completed" }
                ProgressBar { percent: course_progress, class: "mt-2".to_string() }
            }

            div { class: "grid grid-cols-1 lg:grid-cols-4 gap-6",
                // Slide list
                div { class: "panel lg:col-span-1",
                    h3 { class: "panel-title mb-3", "Slides" }
                    div { class: "space-y-1",
                        for (index, (title, status)) in slide_titles.into_iter().zip(statuses).enumerate() {
                            {
                                let (icon, class) = match status {
                                    SlideStatus::Completed => ("✓", "slide-item slide-completed"),
                                    SlideStatus::Current => ("▶", "slide-item slide-current"),
                                    SlideStatus::Available => ("○", "slide-item"),
                                    SlideStatus::Locked => ("🔒", "slide-item slide-locked"),
                                };
                                rsx! {
                                    button {
                                        key: "{index}",
                                        class: "{class}",
                                        onclick: move |_| handle.dispatch(|p| p.handle_slide_select(index)),
                                        span { class: "slide-icon", "{icon}" }
                                        span { "{index + 1}. {title}" }
                                    }
                                }
                            }
                        }
                    }
                }

                // Stage
                div { class: "panel lg:col-span-3",
                    if let Some(slide) = slide {
                        div { class: "slide-stage",
                            h2 { class: "text-2xl font-bold mb-4", "{slide.title}" }
                            div { class: "slide-content", "{slide.content}" }
                        }
                        if state.show_subtitles {
                            if let Some(text) = subtitle {
                                div { class: "subtitles", "{text}" }
                            }
                        }
                    }

                    ProgressBar { percent: state.progress_percent, class: "mt-4".to_string() }
                    p { class: "text-xs text-[var(--text-secondary)] mt-1",
                        "{state.progress_percent:.0}% viewed"
                        if !state.can_advance { " · next unlocks in {gate_secs}s of viewing" }
                    }

                    if let Some(url) = narration {
                        audio {
                            id: "narration",
                            src: "{url}",
                            autoplay: state.is_playing,
                            muted: state.is_muted,
                            controls: true,
                            class: "w-full mt-3"
                        }
                    }

                    // Controls
                    div { class: "player-controls",
                        button {
                            class: "btn btn-secondary",
                            disabled: state.current_index == 0,
                            onclick: move |_| handle.dispatch(|p| p.handle_prev()),
                            "⏮ Previous"
                        }
                        button {
                            class: "btn btn-primary",
                            onclick: move |_| handle.dispatch(|p| p.toggle_playback()),
                            "{play_label}"
                        }
                        if is_last {
                            button {
                                class: "btn btn-primary",
                                disabled: !state.can_advance || generating,
                                onclick: move |_| handle.dispatch(|p| p.handle_next()),
                                if generating { "Generating quiz..." } else { "Complete Course" }
                            }
                        } else {
                            button {
                                class: "btn btn-secondary",
                                disabled: !state.can_advance,
                                onclick: move |_| handle.dispatch(|p| p.handle_next()),
                                "Next ⏭"
                            }
                        }
                    }

                    div { class: "player-settings",
                        label { class: "form-label", "Speed" }
                        select {
                            class: "input input-sm",
                            value: "{state.playback_rate}",
                            onchange: move |e| {
                                if let Ok(rate) = e.value().parse::<f64>() {
                                    handle.dispatch(|p| {
                                        p.set_playback_rate(rate);
                                        vec![]
                                    });
                                }
                            },
                            for rate in PLAYBACK_RATES {
                                option { value: "{rate}", selected: rate == state.playback_rate, "{rate}x" }
                            }
                        }

                        label { class: "form-label", "Volume" }
                        input {
                            "type": "range",
                            min: "0",
                            max: "1",
                            step: "0.05",
                            value: "{state.volume}",
                            oninput: move |e| {
                                if let Ok(volume) = e.value().parse::<f64>() {
                                    handle.dispatch(|p| {
                                        p.set_volume(volume);
                                        vec![]
                                    });
                                }
                            }
                        }
                        button {
                            class: "btn btn-ghost btn-sm",
                            onclick: move |_| handle.dispatch(|p| {
                                p.toggle_mute();
                                vec![]
                            }),
                            if state.is_muted { "🔇 Unmute" } else { "🔊 Mute" }
                        }
                        button {
                            class: "btn btn-ghost btn-sm",
                            onclick: move |_| handle.dispatch(|p| {
                                p.toggle_subtitles();
                                vec![]
                            }),
                            if state.show_subtitles { "Hide subtitles" } else { "Show subtitles" }
                        }
                        button {
                            class: "btn btn-ghost btn-sm",
                            onclick: move |_| {
                                app_state.speech.set(None);
                                handle.narrate_current();
                            },
                            "🗣 Narrate"
                        }
                    }
                }
            }
        }
    }
}
