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

use crate::session::controller::Capability;
use crate::session::controller::Controller;
use crate::session::controller::Feedback;
use crate::session::controller::Phase;
use crate::types::descriptor::QuizDescriptor;
use crate::types::question::Question;

/// Everything the presentation layer needs to render the session after a
/// transition.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub phase: Phase,
    pub quiz: Option<QuizDescriptor>,
    /// The current question, while the quiz is in progress.
    pub question: Option<Question>,
    /// One-based number of the current question.
    pub question_number: usize,
    pub feedback: Option<Feedback>,
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
    /// Fraction of the quiz behind the user, from 0 to 1.
    pub progress: f64,
    pub has_menu: bool,
}

impl SessionView {
    pub fn of(controller: &Controller) -> Self {
        let record = controller.record();
        let total = controller.questions().len();
        let progress = if total == 0 {
            0.0
        } else if *controller.phase() == Phase::Complete {
            1.0
        } else {
            record.index as f64 / total as f64
        };
        Self {
            phase: controller.phase().clone(),
            quiz: controller.quiz().cloned(),
            question: controller.current_question().cloned(),
            question_number: record.index + 1,
            feedback: controller.feedback().cloned(),
            correct: record.correct,
            incorrect: record.incorrect,
            total,
            progress,
            has_menu: matches!(controller.capability(), Capability::Menu),
        }
    }

    /// Progress as a whole percentage.
    pub fn percent(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }

    /// The message shown once the quiz is complete.
    pub fn final_message(&self) -> Option<String> {
        match self.phase {
            Phase::Complete => Some(format!(
                "Final score: {} correct, {} incorrect of {} questions.",
                self.correct, self.incorrect, self.total
            )),
            _ => None,
        }
    }
}
