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

use std::collections::HashSet;
use std::env::current_dir;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::descriptor::QuizDescriptor;
use crate::types::question::Question;
use crate::types::question::parse_questions;

pub const DATABASE_FILE: &str = "quizrunner.db";

/// A directory of quizzes: a manifest, the question files it points to, and
/// an optional configuration file.
pub struct Library {
    pub directory: PathBuf,
    pub config: Config,
    pub quizzes: Vec<QuizDescriptor>,
}

impl Library {
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };
        let config = Config::load(&directory)?;

        log::debug!("Loading manifest...");
        let manifest_path = directory.join(&config.manifest);
        let content = read_to_string(&manifest_path).map_err(|e| {
            ErrorReport::new(format!(
                "failed to read manifest {}: {e}",
                manifest_path.display()
            ))
        })?;
        let quizzes: Vec<QuizDescriptor> = serde_json::from_str(&content)?;
        if quizzes.is_empty() {
            return fail("no quizzes found in manifest.");
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for quiz in &quizzes {
            if !seen.insert(quiz.id.as_str()) {
                return fail(format!("duplicate quiz id in manifest: {}", quiz.id));
            }
        }
        log::debug!("Found {} quizzes.", quizzes.len());

        Ok(Self {
            directory,
            config,
            quizzes,
        })
    }

    pub fn db_path(&self) -> Fallible<String> {
        let path = self.directory.join(DATABASE_FILE);
        match path.to_str() {
            Some(path) => Ok(path.to_string()),
            None => fail("invalid path"),
        }
    }

    pub fn find(&self, quiz_id: &str) -> Option<&QuizDescriptor> {
        self.quizzes.iter().find(|quiz| quiz.id == quiz_id)
    }

    /// Quizzes grouped by subject, for the menu. Subjects appear in the
    /// order they are first mentioned, quizzes in manifest order.
    pub fn by_subject(&self) -> Vec<(&str, Vec<&QuizDescriptor>)> {
        let mut groups: Vec<(&str, Vec<&QuizDescriptor>)> = Vec::new();
        for quiz in &self.quizzes {
            match groups
                .iter()
                .position(|(subject, _)| *subject == quiz.subject)
            {
                Some(i) => groups[i].1.push(quiz),
                None => groups.push((quiz.subject.as_str(), vec![quiz])),
            }
        }
        groups
    }

    pub fn question_path(&self, quiz: &QuizDescriptor) -> PathBuf {
        self.directory.join(&quiz.file)
    }

    pub fn read_questions(&self, quiz: &QuizDescriptor) -> Fallible<Vec<Question>> {
        let path = self.question_path(quiz);
        let content = read_to_string(&path).map_err(|e| read_error(quiz, e))?;
        parse_questions(&content).map_err(|e| parse_error(quiz, e))
    }

    pub async fn load_questions(&self, quiz: &QuizDescriptor) -> Fallible<Vec<Question>> {
        let path = self.question_path(quiz);
        let start = Instant::now();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| read_error(quiz, e))?;
        let questions = parse_questions(&content).map_err(|e| parse_error(quiz, e))?;
        let duration = start.elapsed().as_millis();
        log::debug!("Questions for {} loaded in {duration}ms.", quiz.id);
        Ok(questions)
    }
}

fn read_error(quiz: &QuizDescriptor, e: std::io::Error) -> ErrorReport {
    ErrorReport::new(format!("failed to read {}: {e}", quiz.file))
}

fn parse_error(quiz: &QuizDescriptor, e: ErrorReport) -> ErrorReport {
    ErrorReport::new(format!("failed to parse {}: {}", quiz.file, e.message()))
}
