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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::db::Database;
use crate::error::Fallible;
use crate::library::Library;
use crate::resume;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum ProgressFormat {
    /// One line per quiz.
    Text,
    /// JSON output.
    Json,
}

impl Display for ProgressFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressFormat::Text => write!(f, "text"),
            ProgressFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgress {
    id: String,
    title: String,
    index: usize,
    correct: usize,
    incorrect: usize,
    total: usize,
    last_updated: Option<Timestamp>,
    /// Why the question file could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl QuizProgress {
    fn started(&self) -> bool {
        self.last_updated.is_some()
    }

    fn complete(&self) -> bool {
        self.total > 0 && self.index == self.total
    }
}

fn collect_progress(library: &Library) -> Fallible<Vec<QuizProgress>> {
    let db = Database::new(&library.db_path()?)?;
    let mut result = Vec::new();
    for quiz in &library.quizzes {
        let (total, error) = match library.read_questions(quiz) {
            Ok(questions) => (questions.len(), None),
            Err(e) => {
                log::warn!("{e}");
                (0, Some(e.message().to_string()))
            }
        };
        // Without a question count the stored index cannot be checked.
        let bound = if error.is_some() { usize::MAX } else { total };
        let record = resume::restore(&db, &quiz.id, bound)?;
        let last_updated = db.last_updated(&resume::key_prefix(&quiz.id))?;
        result.push(QuizProgress {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            index: record.index,
            correct: record.correct,
            incorrect: record.incorrect,
            total,
            last_updated,
            error,
        });
    }
    Ok(result)
}

fn format_line(progress: &QuizProgress) -> String {
    if let Some(error) = &progress.error {
        return format!("{}: {} (error: {error})", progress.id, progress.title);
    }
    let status = if progress.complete() {
        "complete".to_string()
    } else if progress.started() {
        format!("question {} of {}", progress.index + 1, progress.total)
    } else {
        "not started".to_string()
    };
    let mut line = format!(
        "{}: {} ({}), {} correct, {} incorrect",
        progress.id, progress.title, status, progress.correct, progress.incorrect
    );
    if let Some(ts) = progress.last_updated {
        line.push_str(&format!(", last answered {}", ts.to_local_string()));
    }
    line
}

pub fn print_progress(directory: Option<String>, format: ProgressFormat) -> Fallible<()> {
    let library = Library::open(directory)?;
    let progress = collect_progress(&library)?;
    match format {
        ProgressFormat::Text => {
            for entry in &progress {
                println!("{}", format_line(entry));
            }
        }
        ProgressFormat::Json => {
            let json = serde_json::to_string_pretty(&progress)?;
            println!("{json}");
        }
    }
    Ok(())
}
