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

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::serve::server::load_questions;
use crate::serve::state::ServerState;
use crate::session::controller::Submission;
use crate::types::question::QuestionKind;
use crate::types::question::Selection;

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Fallible<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| ErrorReport::new(format!("missing form field: {name}")))
}

#[derive(Debug, PartialEq)]
enum Action {
    Select(String),
    Answer(Selection),
    Next,
    Reset,
    Menu,
}

impl Action {
    /// Parse the fields of a submitted form. Fields may repeat: a
    /// multiple-choice answer sends one `choice` per ticked box.
    fn from_form(fields: &[(String, String)]) -> Fallible<Self> {
        match field(fields, "action")? {
            "Select" => Ok(Action::Select(field(fields, "quiz")?.to_string())),
            "Answer" => {
                let kind = QuestionKind::try_from(field(fields, "kind")?)?;
                let selection = match kind {
                    QuestionKind::Boolean => match field(fields, "value")? {
                        "true" => Selection::Boolean(true),
                        "false" => Selection::Boolean(false),
                        other => return fail(format!("invalid boolean answer: {other}")),
                    },
                    QuestionKind::SingleChoice => {
                        Selection::Single(field(fields, "value")?.to_string())
                    }
                    QuestionKind::MultipleChoice => Selection::Multiple(
                        fields
                            .iter()
                            .filter(|(key, _)| key == "choice")
                            .map(|(_, value)| value.clone())
                            .collect(),
                    ),
                };
                Ok(Action::Answer(selection))
            }
            "Next" => Ok(Action::Next),
            "Reset" => Ok(Action::Reset),
            "Menu" => Ok(Action::Menu),
            other => fail(format!("unknown action: {other}")),
        }
    }
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let result = match Action::from_form(&fields) {
        Ok(action) => action_handler(state, action).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => {}
        Err(e) => {
            log::error!("{e}");
        }
    }
    Redirect::to("/")
}

async fn action_handler(state: ServerState, action: Action) -> Fallible<()> {
    match action {
        Action::Select(quiz_id) => {
            let quiz = match state.library.find(&quiz_id) {
                Some(quiz) => quiz.clone(),
                None => return fail(format!("no quiz with id '{quiz_id}' in manifest")),
            };
            let ticket = state.acquire()?.select_quiz(quiz.clone())?;
            load_questions(&state, ticket, &quiz).await?;
        }
        Action::Answer(selection) => {
            let mut controller = state.acquire()?;
            match controller.submit_answer(&selection)? {
                Submission::Scored(feedback) => {
                    log::debug!("Answered {selection:?}, correct: {}.", feedback.correct);
                }
                Submission::AlreadyAnswered(feedback) => {
                    log::debug!(
                        "Ignoring second answer, the first was correct: {}.",
                        feedback.correct
                    );
                }
                Submission::Ignored => {}
            }
        }
        Action::Next => {
            state.acquire()?.advance()?;
        }
        Action::Reset => {
            state.acquire()?.reset()?;
        }
        Action::Menu => {
            state.acquire()?.back_to_menu()?;
        }
    }
    Ok(())
}
