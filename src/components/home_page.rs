use dioxus::prelude::*;

use crate::Route;

const FEATURES: [(&str, &str, &str); 6] = [
    ("🎞", "Slide-based courses", "Upload your policy decks and we turn them into narrated, paced lessons."),
    ("🔒", "Watch-time gating", "Learners can only move on after they have actually viewed each slide."),
    ("🧠", "AI-generated quizzes", "Every course ends with a multiple-choice assessment built from its own material."),
    ("🏢", "Multi-tenant", "Each organization manages its own employees, courses and assignments."),
    ("🔊", "Narration & subtitles", "Text-to-speech narration with subtitles for every slide."),
    ("🏆", "Certificates", "Learners who pass download a certificate of completion on the spot."),
];

#[component]
pub fn HomeComponent() -> Element {
    rsx! {
        div { class: "page-container py-12 animate-fade-in",
            // Hero
            div { class: "text-center mb-12",
                h1 { class: "text-4xl font-bold bg-gradient-to-r from-[var(--primary)] to-[var(--accent)] bg-clip-text text-transparent mb-4",
                    "Compliance training your people actually finish"
                }
                p { class: "text-[var(--text-secondary)] text-lg max-w-2xl mx-auto mb-8",
                    "Turn policy documents into guided courses, verify understanding with automatic quizzes, and issue certificates, all in one place."
                }
                div { class: "flex gap-4 justify-center",
                    Link { to: Route::LoginComponent {}, class: "btn btn-primary", "Sign in" }
                    Link { to: Route::ContactComponent {}, class: "btn btn-secondary", "Book a demo" }
                }
            }

            // Features
            div { class: "grid grid-cols-1 md:grid-cols-3 gap-6",
                for (icon, title, text) in FEATURES {
                    div { key: "{title}", class: "panel",
                        div { class: "text-3xl mb-3", "{icon}" }
                        h3 { class: "font-bold text-lg mb-1", "{title}" }
                        p { class: "text-sm text-[var(--text-secondary)]", "{text}" }
                    }
                }
            }

            // How it works
            div { class: "panel mt-12",
                h2 { class: "panel-title mb-4", "How it works" }
                ol { class: "space-y-2 text-[var(--text-secondary)] list-decimal pl-6",
                    li { "Your administrator uploads a course deck." }
                    li { "Employees watch each slide; the next one unlocks at 80% viewed." }
                    li { "A quiz is generated from the course material." }
                    li { "Score 70% or more to earn your certificate." }
                }
            }
        }
    }
}
