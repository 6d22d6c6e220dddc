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

use crate::error::Fallible;
use crate::error::fail;
use crate::resume;
use crate::resume::ResumeRecord;
use crate::session::view::SessionView;
use crate::store::KeyValueStore;
use crate::types::descriptor::QuizDescriptor;
use crate::types::question::Question;
use crate::types::question::Selection;

pub const NO_QUESTIONS: &str = "no questions found";

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    /// No quiz is selected. Only reachable with the quiz menu enabled.
    Menu,
    /// Waiting for the question list of the selected quiz.
    Loading,
    InProgress,
    Complete,
    /// Loading the selected quiz failed. Holds a user-facing message.
    Error(String),
}

/// Whether the user can pick among quizzes, or is locked to one.
#[derive(Clone, Debug)]
pub enum Capability {
    Menu,
    Single(QuizDescriptor),
}

/// Names the selection a question load was started for. A load result is
/// only committed while its ticket is still current.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LoadTicket {
    quiz_id: String,
    generation: u64,
}

impl LoadTicket {
    #[cfg(test)]
    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }
}

/// Per-question feedback, shown after an answer is submitted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Feedback {
    pub correct: bool,
    pub selection: Selection,
    pub justification: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Submission {
    /// The answer was scored.
    Scored(Feedback),
    /// The current question was already answered. Nothing changed; this is
    /// the feedback of the first answer.
    AlreadyAnswered(Feedback),
    /// There is no question to answer in the current phase.
    Ignored,
}

/// The state machine of one quiz attempt, mirrored into a durable store.
pub struct Controller {
    store: Box<dyn KeyValueStore + Send>,
    capability: Capability,
    quiz: Option<QuizDescriptor>,
    questions: Vec<Question>,
    index: usize,
    correct: usize,
    incorrect: usize,
    /// Feedback for the question at `index`, if it has been answered.
    feedback: Option<Feedback>,
    phase: Phase,
    /// Bumped on every selection, so that reselecting the same quiz also
    /// invalidates earlier tickets.
    generation: u64,
}

impl Controller {
    /// A controller that starts at the quiz menu.
    pub fn with_menu(store: Box<dyn KeyValueStore + Send>) -> Self {
        Self {
            store,
            capability: Capability::Menu,
            quiz: None,
            questions: Vec::new(),
            index: 0,
            correct: 0,
            incorrect: 0,
            feedback: None,
            phase: Phase::Menu,
            generation: 0,
        }
    }

    /// A controller locked to one quiz, already loading it.
    pub fn single(
        store: Box<dyn KeyValueStore + Send>,
        descriptor: QuizDescriptor,
    ) -> (Self, LoadTicket) {
        let mut controller = Self::with_menu(store);
        controller.capability = Capability::Single(descriptor.clone());
        let ticket = controller.start_loading(descriptor);
        (controller, ticket)
    }

    pub fn select_quiz(&mut self, descriptor: QuizDescriptor) -> Fallible<LoadTicket> {
        if let Capability::Single(only) = &self.capability {
            if only.id != descriptor.id {
                return fail(format!(
                    "cannot select quiz '{}': this session only runs '{}'",
                    descriptor.id, only.id
                ));
            }
        }
        Ok(self.start_loading(descriptor))
    }

    fn start_loading(&mut self, descriptor: QuizDescriptor) -> LoadTicket {
        log::debug!("Selected quiz {}.", descriptor.id);
        self.generation += 1;
        let ticket = LoadTicket {
            quiz_id: descriptor.id.clone(),
            generation: self.generation,
        };
        self.quiz = Some(descriptor);
        self.questions.clear();
        self.set_record(ResumeRecord::default());
        self.feedback = None;
        self.phase = Phase::Loading;
        ticket
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.phase == Phase::Loading
            && ticket.generation == self.generation
            && self.quiz_id() == Some(ticket.quiz_id.as_str())
    }

    /// Commit a loaded question list. Returns false, changing nothing, if
    /// the ticket has been overtaken by a later selection.
    pub fn on_questions_loaded(
        &mut self,
        ticket: &LoadTicket,
        questions: Vec<Question>,
    ) -> Fallible<bool> {
        if !self.is_current(ticket) {
            log::debug!("Dropping stale questions for quiz {}.", ticket.quiz_id);
            return Ok(false);
        }
        if questions.is_empty() {
            resume::clear(&mut *self.store, &ticket.quiz_id)?;
            self.phase = Phase::Error(NO_QUESTIONS.to_string());
            return Ok(true);
        }
        let mut record = resume::restore(&*self.store, &ticket.quiz_id, questions.len())?;
        let mut feedback = None;
        if record.index < questions.len() && record.correct + record.incorrect > record.index {
            // The current question was scored before the session was left.
            let question = &questions[record.index];
            feedback = restore_feedback(&*self.store, &ticket.quiz_id, question)?;
            if feedback.is_none() {
                log::warn!(
                    "Answer to question {} of quiz {} is missing, starting over.",
                    record.index,
                    ticket.quiz_id
                );
                resume::clear(&mut *self.store, &ticket.quiz_id)?;
                record = ResumeRecord::default();
            }
        }
        log::debug!(
            "Loaded {} questions for quiz {}, resuming at {}.",
            questions.len(),
            ticket.quiz_id,
            record.index
        );
        self.questions = questions;
        self.set_record(record);
        self.feedback = feedback;
        self.phase = if self.index == self.questions.len() {
            Phase::Complete
        } else {
            Phase::InProgress
        };
        Ok(true)
    }

    /// Record a failed load. Returns false, changing nothing, if the ticket
    /// has been overtaken by a later selection.
    pub fn on_questions_load_failed(
        &mut self,
        ticket: &LoadTicket,
        message: &str,
    ) -> Fallible<bool> {
        if !self.is_current(ticket) {
            log::debug!("Dropping stale load failure for quiz {}.", ticket.quiz_id);
            return Ok(false);
        }
        resume::clear(&mut *self.store, &ticket.quiz_id)?;
        self.set_record(ResumeRecord::default());
        self.phase = Phase::Error(message.to_string());
        Ok(true)
    }

    /// Score an answer to the current question without moving on. A second
    /// answer to the same question is not counted.
    pub fn submit_answer(&mut self, selection: &Selection) -> Fallible<Submission> {
        if self.phase != Phase::InProgress {
            log::debug!("Ignoring answer in phase {:?}.", self.phase);
            return Ok(Submission::Ignored);
        }
        if let Some(feedback) = &self.feedback {
            log::warn!("Question {} was already answered.", self.index);
            return Ok(Submission::AlreadyAnswered(feedback.clone()));
        }
        let question = &self.questions[self.index];
        let correct = question.is_correct(selection)?;
        let feedback = Feedback {
            correct,
            selection: selection.clone(),
            justification: question.justification().to_string(),
        };
        let mut record = self.record();
        if correct {
            record.correct += 1;
        } else {
            record.incorrect += 1;
        }
        let quiz_id = self.current_quiz_id()?;
        resume::save_answer(&mut *self.store, &quiz_id, record, selection)?;
        self.set_record(record);
        self.feedback = Some(feedback.clone());
        Ok(Submission::Scored(feedback))
    }

    /// Move past an answered question. Returns false if the current question
    /// has not been answered yet.
    pub fn advance(&mut self) -> Fallible<bool> {
        if self.phase != Phase::InProgress || self.feedback.is_none() {
            log::warn!("Ignoring advance before an answer was submitted.");
            return Ok(false);
        }
        let quiz_id = self.current_quiz_id()?;
        resume::save_index(&mut *self.store, &quiz_id, self.index + 1)?;
        self.index += 1;
        self.feedback = None;
        if self.index == self.questions.len() {
            log::debug!("Quiz {quiz_id} complete.");
            self.phase = Phase::Complete;
        }
        Ok(true)
    }

    /// Start the current quiz over. Returns false outside of a running or
    /// completed quiz.
    pub fn reset(&mut self) -> Fallible<bool> {
        if !matches!(self.phase, Phase::InProgress | Phase::Complete) {
            log::warn!("Ignoring reset in phase {:?}.", self.phase);
            return Ok(false);
        }
        let quiz_id = self.current_quiz_id()?;
        resume::clear(&mut *self.store, &quiz_id)?;
        self.set_record(ResumeRecord::default());
        self.feedback = None;
        self.phase = if self.questions.is_empty() {
            Phase::Complete
        } else {
            Phase::InProgress
        };
        Ok(true)
    }

    /// Leave the current quiz. Its resume record stays in the store.
    pub fn back_to_menu(&mut self) -> Fallible<()> {
        if let Capability::Single(_) = self.capability {
            return fail("there is no quiz menu in a single-quiz session");
        }
        self.generation += 1;
        self.quiz = None;
        self.questions.clear();
        self.set_record(ResumeRecord::default());
        self.feedback = None;
        self.phase = Phase::Menu;
        Ok(())
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> SessionView {
        SessionView::of(self)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn quiz(&self) -> Option<&QuizDescriptor> {
        self.quiz.as_ref()
    }

    pub fn quiz_id(&self) -> Option<&str> {
        self.quiz.as_ref().map(|quiz| quiz.id.as_str())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question at the current index, while the quiz is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::InProgress => self.questions.get(self.index),
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn record(&self) -> ResumeRecord {
        ResumeRecord {
            index: self.index,
            correct: self.correct,
            incorrect: self.incorrect,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    fn set_record(&mut self, record: ResumeRecord) {
        self.index = record.index;
        self.correct = record.correct;
        self.incorrect = record.incorrect;
    }

    fn current_quiz_id(&self) -> Fallible<String> {
        match self.quiz_id() {
            Some(id) => Ok(id.to_string()),
            None => fail("no quiz is selected"),
        }
    }
}

/// Rebuild the feedback for a question answered in an earlier session.
fn restore_feedback(
    store: &dyn KeyValueStore,
    quiz_id: &str,
    question: &Question,
) -> Fallible<Option<Feedback>> {
    let Some(selection) = resume::restore_answer(store, quiz_id)? else {
        return Ok(None);
    };
    match question.is_correct(&selection) {
        Ok(correct) => Ok(Some(Feedback {
            correct,
            selection,
            justification: question.justification().to_string(),
        })),
        Err(e) => {
            log::warn!("Ignoring saved answer for quiz {quiz_id}: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::question::Answer;

    fn boolean(answer: bool) -> Question {
        Question::new("Is it?", BTreeMap::new(), Answer::Boolean(answer), "Because.").unwrap()
    }

    fn multiple(correct: &[&str]) -> Question {
        let options = ["A", "B", "C", "D"]
            .iter()
            .map(|l| (l.to_string(), format!("option {l}")))
            .collect();
        let answer = Answer::Multiple(correct.iter().map(|l| l.to_string()).collect());
        Question::new("Which?", options, answer, "Those.").unwrap()
    }

    fn geo() -> QuizDescriptor {
        QuizDescriptor::new("geo", "Capitals", "Geography", "geo.json")
    }

    fn logic() -> QuizDescriptor {
        QuizDescriptor::new("logic", "Logic", "Maths", "logic.json")
    }

    fn labels(labels: &[&str]) -> Selection {
        Selection::Multiple(labels.iter().map(|l| l.to_string()).collect())
    }

    fn loaded(questions: Vec<Question>) -> Controller {
        loaded_with_store(MemoryStore::new(), questions)
    }

    fn loaded_with_store(store: MemoryStore, questions: Vec<Question>) -> Controller {
        let mut controller = Controller::with_menu(Box::new(store));
        let ticket = controller.select_quiz(geo()).unwrap();
        assert!(controller.on_questions_loaded(&ticket, questions).unwrap());
        controller
    }

    fn assert_index_in_bounds(controller: &Controller) {
        assert!(controller.record().index <= controller.questions().len());
    }

    #[test]
    fn test_starts_at_menu() {
        let controller = Controller::with_menu(Box::new(MemoryStore::new()));
        assert_eq!(controller.phase(), &Phase::Menu);
        assert_eq!(controller.quiz_id(), None);
    }

    #[test]
    fn test_select_enters_loading() -> Fallible<()> {
        let mut controller = Controller::with_menu(Box::new(MemoryStore::new()));
        let ticket = controller.select_quiz(geo())?;
        assert_eq!(ticket.quiz_id(), "geo");
        assert_eq!(controller.phase(), &Phase::Loading);
        assert_eq!(controller.record(), ResumeRecord::default());
        assert!(controller.questions().is_empty());
        Ok(())
    }

    #[test]
    fn test_boolean_scenario() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true)]);
        assert_eq!(controller.phase(), &Phase::InProgress);
        let submission = controller.submit_answer(&Selection::Boolean(false))?;
        let Submission::Scored(feedback) = submission else {
            panic!("Expected a scored submission");
        };
        assert!(!feedback.correct);
        assert_eq!(feedback.justification, "Because.");
        assert_eq!(controller.record().incorrect, 1);
        assert_eq!(controller.record().index, 0);
        assert!(controller.advance()?);
        assert_eq!(controller.phase(), &Phase::Complete);
        assert_eq!(
            controller.record(),
            ResumeRecord {
                index: 1,
                correct: 0,
                incorrect: 1
            }
        );
        Ok(())
    }

    #[test]
    fn test_multiple_choice_any_order() -> Fallible<()> {
        let mut controller = loaded(vec![multiple(&["A", "C"])]);
        let submission = controller.submit_answer(&labels(&["C", "A"]))?;
        assert!(matches!(submission, Submission::Scored(Feedback { correct: true, .. })));
        assert_eq!(controller.record().correct, 1);
        Ok(())
    }

    #[test]
    fn test_answer_is_persisted() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), boolean(false)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        let store = controller.store();
        assert_eq!(store.get("quiz/geo/index")?, Some("0".to_string()));
        assert_eq!(store.get("quiz/geo/correct")?, Some("1".to_string()));
        assert_eq!(store.get("quiz/geo/incorrect")?, Some("0".to_string()));
        controller.advance()?;
        assert_eq!(controller.store().get("quiz/geo/index")?, Some("1".to_string()));
        Ok(())
    }

    #[test]
    fn test_resubmission_is_not_counted() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), boolean(true)]);
        controller.submit_answer(&Selection::Boolean(false))?;
        let second = controller.submit_answer(&Selection::Boolean(true))?;
        let Submission::AlreadyAnswered(feedback) = second else {
            panic!("Expected the first feedback back");
        };
        assert!(!feedback.correct);
        assert_eq!(feedback.selection, Selection::Boolean(false));
        assert_eq!(controller.record().correct, 0);
        assert_eq!(controller.record().incorrect, 1);
        Ok(())
    }

    #[test]
    fn test_advance_requires_answer() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), boolean(true)]);
        assert!(!controller.advance()?);
        assert_eq!(controller.record().index, 0);
        Ok(())
    }

    #[test]
    fn test_answer_after_complete_is_ignored() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        controller.advance()?;
        let submission = controller.submit_answer(&Selection::Boolean(true))?;
        assert_eq!(submission, Submission::Ignored);
        assert_eq!(controller.record().correct, 1);
        assert!(!controller.advance()?);
        assert_index_in_bounds(&controller);
        Ok(())
    }

    #[test]
    fn test_mismatched_selection_is_an_error() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true)]);
        assert!(controller.submit_answer(&labels(&["A"])).is_err());
        assert_eq!(controller.record(), ResumeRecord::default());
        assert_eq!(controller.feedback(), None);
        Ok(())
    }

    #[test]
    fn test_reset() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), boolean(false), boolean(true)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        controller.advance()?;
        controller.submit_answer(&Selection::Boolean(true))?;
        assert!(controller.reset()?);
        assert_eq!(controller.record(), ResumeRecord::default());
        assert_eq!(controller.phase(), &Phase::InProgress);
        assert_eq!(controller.feedback(), None);
        assert_eq!(controller.store().get("quiz/geo/index")?, None);
        assert_eq!(controller.store().get("quiz/geo/correct")?, None);
        assert_eq!(controller.store().get("quiz/geo/incorrect")?, None);
        Ok(())
    }

    #[test]
    fn test_reset_from_complete() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        controller.advance()?;
        assert!(controller.reset()?);
        assert_eq!(controller.phase(), &Phase::InProgress);
        Ok(())
    }

    #[test]
    fn test_reset_while_loading_is_rejected() -> Fallible<()> {
        let mut controller = Controller::with_menu(Box::new(MemoryStore::new()));
        controller.select_quiz(geo())?;
        assert!(!controller.reset()?);
        assert_eq!(controller.phase(), &Phase::Loading);
        Ok(())
    }

    #[test]
    fn test_resume() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "2")?;
        store.set("quiz/geo/correct", "1")?;
        store.set("quiz/geo/incorrect", "1")?;
        let controller = loaded_with_store(store, vec![boolean(true); 5]);
        assert_eq!(
            controller.record(),
            ResumeRecord {
                index: 2,
                correct: 1,
                incorrect: 1
            }
        );
        assert_eq!(controller.phase(), &Phase::InProgress);
        Ok(())
    }

    #[test]
    fn test_resume_out_of_range() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "7")?;
        let controller = loaded_with_store(store, vec![boolean(true); 5]);
        assert_eq!(controller.record().index, 0);
        assert_eq!(controller.phase(), &Phase::InProgress);
        Ok(())
    }

    #[test]
    fn test_resume_at_end_is_complete() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "2")?;
        let controller = loaded_with_store(store, vec![boolean(true); 2]);
        assert_eq!(controller.phase(), &Phase::Complete);
        Ok(())
    }

    #[test]
    fn test_empty_question_list() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "1")?;
        let mut controller = Controller::with_menu(Box::new(store));
        let ticket = controller.select_quiz(geo())?;
        assert!(controller.on_questions_loaded(&ticket, Vec::new())?);
        assert_eq!(controller.phase(), &Phase::Error(NO_QUESTIONS.to_string()));
        assert_eq!(controller.store().get("quiz/geo/index")?, None);
        Ok(())
    }

    #[test]
    fn test_load_failure_clears_record() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "1")?;
        store.set("quiz/logic/index", "1")?;
        let mut controller = Controller::with_menu(Box::new(store));
        let ticket = controller.select_quiz(geo())?;
        assert!(controller.on_questions_load_failed(&ticket, "file not found")?);
        assert_eq!(controller.phase(), &Phase::Error("file not found".to_string()));
        assert_eq!(controller.store().get("quiz/geo/index")?, None);
        assert_eq!(controller.store().get("quiz/logic/index")?, Some("1".to_string()));
        let submission = controller.submit_answer(&Selection::Boolean(true))?;
        assert_eq!(submission, Submission::Ignored);
        Ok(())
    }

    #[test]
    fn test_stale_load_is_dropped() -> Fallible<()> {
        let mut controller = Controller::with_menu(Box::new(MemoryStore::new()));
        let first = controller.select_quiz(geo())?;
        let second = controller.select_quiz(logic())?;
        assert!(!controller.on_questions_loaded(&first, vec![boolean(true)])?);
        assert_eq!(controller.phase(), &Phase::Loading);
        assert_eq!(controller.quiz_id(), Some("logic"));
        assert!(!controller.on_questions_load_failed(&first, "late")?);
        assert_eq!(controller.phase(), &Phase::Loading);
        assert!(controller.on_questions_loaded(&second, vec![boolean(true), boolean(false)])?);
        assert_eq!(controller.questions().len(), 2);
        Ok(())
    }

    #[test]
    fn test_reselecting_same_quiz_invalidates_ticket() -> Fallible<()> {
        let mut controller = Controller::with_menu(Box::new(MemoryStore::new()));
        let first = controller.select_quiz(geo())?;
        let second = controller.select_quiz(geo())?;
        assert!(!controller.on_questions_loaded(&first, vec![boolean(true)])?);
        assert!(controller.on_questions_loaded(&second, vec![boolean(true)])?);
        Ok(())
    }

    #[test]
    fn test_load_after_menu_is_dropped() -> Fallible<()> {
        let mut controller = Controller::with_menu(Box::new(MemoryStore::new()));
        let ticket = controller.select_quiz(geo())?;
        controller.back_to_menu()?;
        assert!(!controller.on_questions_loaded(&ticket, vec![boolean(true)])?);
        assert_eq!(controller.phase(), &Phase::Menu);
        Ok(())
    }

    #[test]
    fn test_back_to_menu_keeps_record() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), boolean(true)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        controller.advance()?;
        controller.back_to_menu()?;
        assert_eq!(controller.phase(), &Phase::Menu);
        assert_eq!(controller.quiz_id(), None);
        assert!(controller.questions().is_empty());
        assert_eq!(controller.record(), ResumeRecord::default());
        assert_eq!(controller.store().get("quiz/geo/index")?, Some("1".to_string()));
        // Selecting the quiz again resumes where we left off.
        let ticket = controller.select_quiz(geo())?;
        controller.on_questions_loaded(&ticket, vec![boolean(true), boolean(true)])?;
        assert_eq!(controller.record().index, 1);
        assert_eq!(controller.record().correct, 1);
        Ok(())
    }

    #[test]
    fn test_answer_survives_leaving_the_quiz() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true)]);
        controller.submit_answer(&Selection::Boolean(true))?;
        controller.back_to_menu()?;
        let ticket = controller.select_quiz(geo())?;
        controller.on_questions_loaded(&ticket, vec![boolean(true)])?;
        // The question is still answered: the first feedback is back.
        let feedback = controller.feedback().cloned().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.selection, Selection::Boolean(true));
        let second = controller.submit_answer(&Selection::Boolean(false))?;
        assert_eq!(second, Submission::AlreadyAnswered(feedback));
        assert!(controller.advance()?);
        assert_eq!(
            controller.record(),
            ResumeRecord {
                index: 1,
                correct: 1,
                incorrect: 0
            }
        );
        assert_eq!(
            controller.view().final_message().unwrap(),
            "Final score: 1 correct, 0 incorrect of 1 questions."
        );
        Ok(())
    }

    #[test]
    fn test_resume_answered_question() -> Fallible<()> {
        let mut store = MemoryStore::new();
        let record = ResumeRecord {
            index: 1,
            correct: 1,
            incorrect: 1,
        };
        resume::save_answer(&mut store, "geo", record, &labels(&["C", "A"]))?;
        let mut controller = loaded_with_store(store, vec![boolean(true), multiple(&["A", "B"])]);
        assert_eq!(controller.record(), record);
        let feedback = controller.feedback().cloned().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.justification, "Those.");
        let second = controller.submit_answer(&labels(&["A", "B"]))?;
        assert!(matches!(second, Submission::AlreadyAnswered(_)));
        assert_eq!(controller.record(), record);
        assert!(controller.advance()?);
        assert_eq!(controller.phase(), &Phase::Complete);
        assert_eq!(controller.store().get("quiz/geo/answer")?, None);
        Ok(())
    }

    #[test]
    fn test_resume_with_missing_answer_starts_over() -> Fallible<()> {
        let mut store = MemoryStore::new();
        store.set("quiz/geo/index", "0")?;
        store.set("quiz/geo/correct", "1")?;
        let controller = loaded_with_store(store, vec![boolean(true), boolean(true)]);
        assert_eq!(controller.record(), ResumeRecord::default());
        assert_eq!(controller.feedback(), None);
        assert_eq!(controller.store().get("quiz/geo/correct")?, None);
        Ok(())
    }

    /// A store whose writes fail while `broken` is set.
    struct FlakyStore {
        inner: MemoryStore,
        broken: Arc<AtomicBool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Fallible<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
            if self.broken.load(Ordering::SeqCst) {
                return fail("disk full");
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Fallible<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_write_changes_nothing() -> Fallible<()> {
        let broken = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner: MemoryStore::new(),
            broken: broken.clone(),
        };
        let mut controller = Controller::with_menu(Box::new(store));
        let ticket = controller.select_quiz(geo())?;
        controller.on_questions_loaded(&ticket, vec![boolean(true), boolean(true)])?;

        broken.store(true, Ordering::SeqCst);
        assert!(controller.submit_answer(&Selection::Boolean(true)).is_err());
        assert_eq!(controller.record(), ResumeRecord::default());
        assert_eq!(controller.feedback(), None);

        broken.store(false, Ordering::SeqCst);
        controller.submit_answer(&Selection::Boolean(true))?;
        broken.store(true, Ordering::SeqCst);
        assert!(controller.advance().is_err());
        assert_eq!(controller.record().index, 0);
        assert!(controller.feedback().is_some());
        Ok(())
    }

    #[test]
    fn test_single_quiz_session() -> Fallible<()> {
        let (mut controller, ticket) = Controller::single(Box::new(MemoryStore::new()), geo());
        assert_eq!(controller.phase(), &Phase::Loading);
        assert!(controller.on_questions_loaded(&ticket, vec![boolean(true)])?);
        assert!(controller.back_to_menu().is_err());
        assert!(controller.select_quiz(logic()).is_err());
        assert!(controller.select_quiz(geo()).is_ok());
        Ok(())
    }

    #[test]
    fn test_index_stays_in_bounds() -> Fallible<()> {
        let mut controller = loaded(vec![boolean(true), multiple(&["B"]), boolean(false)]);
        let selections = [
            Selection::Boolean(true),
            labels(&["B"]),
            Selection::Boolean(true),
        ];
        for selection in selections.iter().cycle().take(12) {
            let _ = controller.submit_answer(selection);
            assert_index_in_bounds(&controller);
            controller.advance()?;
            assert_index_in_bounds(&controller);
        }
        assert_eq!(controller.phase(), &Phase::Complete);
        assert_eq!(controller.record().index, 3);
        Ok(())
    }
}
