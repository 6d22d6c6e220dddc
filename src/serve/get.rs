// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::markdown::markdown_to_html;
use crate::markdown::markdown_to_html_inline;
use crate::serve::state::ServerState;
use crate::serve::template::page_template;
use crate::session::controller::Feedback;
use crate::session::controller::Phase;
use crate::session::view::SessionView;
use crate::types::question::Answer;
use crate::types::question::Question;
use crate::types::question::QuestionKind;
use crate::types::question::Selection;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let view = match state.acquire() {
        Ok(controller) => controller.view(),
        Err(e) => {
            log::error!("{e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Internal Server Error".to_string()),
            );
        }
    };
    let body = match &view.phase {
        Phase::Menu => render_menu(&state),
        Phase::Loading => render_loading(&view),
        Phase::Error(message) => render_error(&view, message),
        Phase::InProgress => match &view.question {
            Some(question) => render_question(&view, question),
            None => render_error(&view, "There is no current question."),
        },
        Phase::Complete => render_complete(&view),
    };
    let refresh = view.phase == Phase::Loading;
    let html = page_template(&state.title, refresh, body);
    (StatusCode::OK, Html(html.into_string()))
}

fn render_menu(state: &ServerState) -> Markup {
    html! {
        div.root {
            div.menu {
                h1 { (state.title) }
                @for (subject, quizzes) in state.library.by_subject() {
                    h2 { (subject) }
                    div.quiz-list {
                        @for quiz in quizzes {
                            form action="/" method="post" {
                                input type="hidden" name="action" value="Select";
                                button.quiz-button type="submit" name="quiz" value=(quiz.id) {
                                    (quiz.title)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn quiz_title(view: &SessionView) -> &str {
    view.quiz
        .as_ref()
        .map(|quiz| quiz.title.as_str())
        .unwrap_or_default()
}

fn render_loading(view: &SessionView) -> Markup {
    html! {
        div.root {
            div.card {
                div.header {
                    h1 { (quiz_title(view)) }
                }
                p.loading { "Loading questions..." }
            }
        }
    }
}

fn render_error(view: &SessionView, message: &str) -> Markup {
    html! {
        div.root {
            div.card {
                div.header {
                    h1 { (quiz_title(view)) }
                }
                p.error { (message) }
                form.controls action="/" method="post" {
                    @if view.has_menu {
                        input id="menu" type="submit" name="action" value="Menu";
                    } @else if let Some(quiz) = &view.quiz {
                        input type="hidden" name="action" value="Select";
                        button id="retry" type="submit" name="quiz" value=(quiz.id) { "Retry" }
                    }
                }
            }
        }
    }
}

fn render_header(view: &SessionView) -> Markup {
    let position = view.question_number.min(view.total);
    html! {
        div.header {
            h1 { (quiz_title(view)) }
            div.progress { (format!("{position} / {}", view.total)) }
        }
        div.progress-bar {
            div.progress-fill style=(format!("width: {}%;", view.percent())) {}
        }
        div.score {
            span.score-correct { "Correct: " (view.correct) }
            span.score-incorrect { "Incorrect: " (view.incorrect) }
            span.score-total { "Total: " (view.total) }
        }
    }
}

fn render_controls(view: &SessionView, answered: bool) -> Markup {
    html! {
        form.controls action="/" method="post" {
            @if view.has_menu {
                input id="menu" type="submit" name="action" value="Menu";
            }
            input id="reset" type="submit" name="action" value="Reset";
            div.spacer {}
            @if answered {
                input id="next" type="submit" name="action" value="Next";
            }
        }
    }
}

fn render_question(view: &SessionView, question: &Question) -> Markup {
    let feedback = view.feedback.as_ref();
    let prompt = markdown_to_html(question.prompt());
    html! {
        div.root {
            div.card {
                (render_header(view))
                div.question .rich-text {
                    (PreEscaped(prompt))
                }
                (render_answers(question, feedback))
                @if let Some(feedback) = feedback {
                    (render_feedback(question, feedback))
                }
                (render_controls(view, feedback.is_some()))
            }
        }
    }
}

/// Styling of one answer option. Before an answer is given, all options look
/// alike; afterwards the picked options are marked, and on a wrong answer so
/// are the correct options that were missed.
fn option_class(selected: bool, correct: bool, feedback: Option<&Feedback>) -> &'static str {
    match feedback {
        None => "option",
        Some(feedback) => {
            if selected && feedback.correct {
                "option user-selected-correct"
            } else if selected {
                "option user-selected-incorrect"
            } else if correct && !feedback.correct {
                "option actual-correct-answer"
            } else {
                "option"
            }
        }
    }
}

fn render_answers(question: &Question, feedback: Option<&Feedback>) -> Markup {
    let answered = feedback.is_some();
    let kind = question.kind();
    html! {
        form.answers action="/" method="post" {
            input type="hidden" name="action" value="Answer";
            input type="hidden" name="kind" value=(kind.as_str());
            @match kind {
                QuestionKind::Boolean => {
                    @for (value, text) in [(true, "True"), (false, "False")] {
                        @let selected = feedback.is_some_and(|f| f.selection == Selection::Boolean(value));
                        @let correct = *question.answer() == Answer::Boolean(value);
                        button class=(option_class(selected, correct, feedback)) type="submit" name="value" value=(text.to_lowercase()) disabled[answered] {
                            (text)
                        }
                    }
                }
                QuestionKind::SingleChoice => {
                    @for (label, text) in question.options() {
                        @let selected = feedback.is_some_and(|f| f.selection.includes(label));
                        @let correct = question.answer().includes(label);
                        button class=(option_class(selected, correct, feedback)) type="submit" name="value" value=(label) disabled[answered] {
                            (label) ": " (PreEscaped(markdown_to_html_inline(text)))
                        }
                    }
                }
                QuestionKind::MultipleChoice => {
                    @for (label, text) in question.options() {
                        @let selected = feedback.is_some_and(|f| f.selection.includes(label));
                        @let correct = question.answer().includes(label);
                        @let id = format!("option-{label}");
                        div class=(option_class(selected, correct, feedback)) {
                            input id=(id) type="checkbox" name="choice" value=(label) checked[selected] disabled[answered];
                            label for=(id) {
                                (label) ": " (PreEscaped(markdown_to_html_inline(text)))
                            }
                        }
                    }
                    input id="submit-answers" type="submit" value="Submit answers" disabled[answered];
                }
            }
        }
    }
}

fn render_feedback(question: &Question, feedback: &Feedback) -> Markup {
    let justification = markdown_to_html(&feedback.justification);
    html! {
        div.feedback {
            @if feedback.correct {
                p.feedback-correct { "Correct!" }
            } @else {
                p.feedback-incorrect {
                    "Incorrect. The correct answer is " (question.answer().to_string()) "."
                }
            }
            div.justification .rich-text {
                (PreEscaped(justification))
            }
        }
    }
}

fn render_complete(view: &SessionView) -> Markup {
    html! {
        div.root {
            div.card {
                (render_header(view))
                div.finished {
                    h1 { "Quiz complete!" }
                    @if let Some(message) = view.final_message() {
                        p.final-score { (message) }
                    }
                }
                (render_controls(view, false))
            }
        }
    }
}
