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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QuestionKind {
    Boolean,
    SingleChoice,
    MultipleChoice,
}

impl QuestionKind {
    /// The value of the `kind` field in answer forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Boolean => "boolean",
            QuestionKind::SingleChoice => "single",
            QuestionKind::MultipleChoice => "multiple",
        }
    }
}

impl TryFrom<&str> for QuestionKind {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "boolean" => Ok(QuestionKind::Boolean),
            "single" => Ok(QuestionKind::SingleChoice),
            "multiple" => Ok(QuestionKind::MultipleChoice),
            _ => fail(format!("Invalid question kind: {value}")),
        }
    }
}

/// The correct answer to a question.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Answer {
    Boolean(bool),
    Single(String),
    Multiple(BTreeSet<String>),
}

impl Answer {
    /// Whether the given option label is part of the correct answer.
    pub fn includes(&self, label: &str) -> bool {
        match self {
            Answer::Boolean(_) => false,
            Answer::Single(correct) => correct == label,
            Answer::Multiple(correct) => correct.contains(label),
        }
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Boolean(true) => write!(f, "True"),
            Answer::Boolean(false) => write!(f, "False"),
            Answer::Single(label) => write!(f, "{label}"),
            Answer::Multiple(labels) => {
                let labels: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
                write!(f, "{}", labels.join(", "))
            }
        }
    }
}

/// What the user picked, as sent by the presentation layer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Selection {
    Boolean(bool),
    Single(String),
    Multiple(Vec<String>),
}

impl Selection {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Selection::Boolean(_) => QuestionKind::Boolean,
            Selection::Single(_) => QuestionKind::SingleChoice,
            Selection::Multiple(_) => QuestionKind::MultipleChoice,
        }
    }

    /// Whether the given option label was picked.
    pub fn includes(&self, label: &str) -> bool {
        match self {
            Selection::Boolean(_) => false,
            Selection::Single(picked) => picked == label,
            Selection::Multiple(picked) => picked.iter().any(|p| p == label),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    prompt: String,
    /// Option labels mapped to their text, ordered by label. Empty for
    /// boolean questions.
    options: BTreeMap<String, String>,
    answer: Answer,
    justification: String,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: BTreeMap<String, String>,
        answer: Answer,
        justification: impl Into<String>,
    ) -> Fallible<Self> {
        let question = Self {
            prompt: prompt.into(),
            options,
            answer,
            justification: justification.into(),
        };
        question.validate()?;
        Ok(question)
    }

    pub fn kind(&self) -> QuestionKind {
        match self.answer {
            Answer::Boolean(_) => QuestionKind::Boolean,
            Answer::Single(_) => QuestionKind::SingleChoice,
            Answer::Multiple(_) => QuestionKind::MultipleChoice,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }

    /// Score a selection. Multiple-choice answers are compared as sets, so
    /// the order of the picked labels does not matter.
    pub fn is_correct(&self, selection: &Selection) -> Fallible<bool> {
        match (&self.answer, selection) {
            (Answer::Boolean(correct), Selection::Boolean(picked)) => Ok(correct == picked),
            (Answer::Single(correct), Selection::Single(picked)) => Ok(correct == picked),
            (Answer::Multiple(correct), Selection::Multiple(picked)) => {
                let picked: BTreeSet<&str> = picked.iter().map(|s| s.as_str()).collect();
                let correct: BTreeSet<&str> = correct.iter().map(|s| s.as_str()).collect();
                Ok(picked == correct)
            }
            _ => fail(format!(
                "a {} selection cannot answer a {} question",
                selection.kind().as_str(),
                self.kind().as_str()
            )),
        }
    }

    fn validate(&self) -> Fallible<()> {
        match &self.answer {
            Answer::Boolean(_) => Ok(()),
            Answer::Single(label) => {
                if self.options.is_empty() {
                    return fail("choice question has no options");
                }
                if !self.options.contains_key(label) {
                    return fail(format!("answer '{label}' is not one of the options"));
                }
                Ok(())
            }
            Answer::Multiple(labels) => {
                if self.options.is_empty() {
                    return fail("choice question has no options");
                }
                if labels.is_empty() {
                    return fail("multiple-choice answer is empty");
                }
                for label in labels {
                    if !self.options.contains_key(label) {
                        return fail(format!("answer '{label}' is not one of the options"));
                    }
                }
                Ok(())
            }
        }
    }
}

/// A question as it appears in a quiz data file.
#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    #[serde(rename = "type")]
    kind: RawKind,
    #[serde(default)]
    options: BTreeMap<String, String>,
    answer: RawAnswer,
    #[serde(default)]
    justification: String,
}

#[derive(Deserialize)]
enum RawKind {
    #[serde(rename = "true_false", alias = "boolean")]
    Boolean,
    #[serde(rename = "single_choice_abcd", alias = "single_choice")]
    SingleChoice,
    #[serde(rename = "multiple_choice_abcd", alias = "multiple_choice")]
    MultipleChoice,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Boolean(bool),
    Label(String),
    Labels(Vec<String>),
}

impl TryFrom<RawQuestion> for Question {
    type Error = ErrorReport;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let (options, answer) = match (raw.kind, raw.answer) {
            (RawKind::Boolean, RawAnswer::Boolean(value)) => {
                (BTreeMap::new(), Answer::Boolean(value))
            }
            (RawKind::SingleChoice, RawAnswer::Label(label)) => {
                (raw.options, Answer::Single(label))
            }
            (RawKind::MultipleChoice, RawAnswer::Labels(labels)) => {
                (raw.options, Answer::Multiple(labels.into_iter().collect()))
            }
            (RawKind::Boolean, _) => return fail("boolean question needs a true/false answer"),
            (RawKind::SingleChoice, _) => {
                return fail("single-choice question needs a single label as its answer");
            }
            (RawKind::MultipleChoice, _) => {
                return fail("multiple-choice question needs a list of labels as its answer");
            }
        };
        Question::new(raw.question, options, answer, raw.justification)
    }
}

/// Parse the contents of a quiz data file.
pub fn parse_questions(content: &str) -> Fallible<Vec<Question>> {
    let questions: Vec<Question> = serde_json::from_str(content)?;
    Ok(questions)
}
