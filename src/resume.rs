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

//! Resume records: the durable snapshot of a session's position and score,
//! stored as independent keys per quiz. Besides the three counters, the
//! selection made for the current question is kept until the user moves on,
//! so an answered question stays answered across restarts.

use crate::error::Fallible;
use crate::store::KeyValueStore;
use crate::types::question::Selection;

const INDEX: &str = "index";
const CORRECT: &str = "correct";
const INCORRECT: &str = "incorrect";
const ANSWER: &str = "answer";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ResumeRecord {
    pub index: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// The key prefix shared by every field of a quiz's record.
pub fn key_prefix(quiz_id: &str) -> String {
    format!("quiz/{quiz_id}/")
}

fn key(quiz_id: &str, field: &str) -> String {
    format!("{}{field}", key_prefix(quiz_id))
}

/// Read the record for a quiz with `question_count` questions. Absent,
/// non-numeric and negative fields read as zero, and so does an index past
/// the end of the quiz.
pub fn restore(
    store: &dyn KeyValueStore,
    quiz_id: &str,
    question_count: usize,
) -> Fallible<ResumeRecord> {
    let mut index = read_count(store, quiz_id, INDEX)?;
    if index > question_count {
        log::warn!("Stored index {index} is out of range for quiz {quiz_id}, starting over.");
        index = 0;
    }
    let correct = read_count(store, quiz_id, CORRECT)?;
    let incorrect = read_count(store, quiz_id, INCORRECT)?;
    Ok(ResumeRecord {
        index,
        correct,
        incorrect,
    })
}

fn read_count(store: &dyn KeyValueStore, quiz_id: &str, field: &str) -> Fallible<usize> {
    let key = key(quiz_id, field);
    let count = match store.get(&key)? {
        None => 0,
        Some(value) => match value.trim().parse::<usize>() {
            Ok(count) => count,
            Err(_) => {
                log::warn!("Ignoring malformed value {value:?} for {key}.");
                0
            }
        },
    };
    Ok(count)
}

pub fn save(store: &mut dyn KeyValueStore, quiz_id: &str, record: ResumeRecord) -> Fallible<()> {
    save_index(store, quiz_id, record.index)?;
    store.set(&key(quiz_id, CORRECT), &record.correct.to_string())?;
    store.set(&key(quiz_id, INCORRECT), &record.incorrect.to_string())?;
    Ok(())
}

/// Save a scored answer. The selection is written before the counters: a
/// selection without matching counters is ignored on restore.
pub fn save_answer(
    store: &mut dyn KeyValueStore,
    quiz_id: &str,
    record: ResumeRecord,
    selection: &Selection,
) -> Fallible<()> {
    let json = serde_json::to_string(selection)?;
    store.set(&key(quiz_id, ANSWER), &json)?;
    save(store, quiz_id, record)
}

/// The selection saved for the current question, if any. A malformed value
/// reads as absent.
pub fn restore_answer(store: &dyn KeyValueStore, quiz_id: &str) -> Fallible<Option<Selection>> {
    let key = key(quiz_id, ANSWER);
    let selection = match store.get(&key)? {
        None => None,
        Some(value) => match serde_json::from_str::<Selection>(&value) {
            Ok(selection) => Some(selection),
            Err(e) => {
                log::warn!("Ignoring malformed value {value:?} for {key}: {e}");
                None
            }
        },
    };
    Ok(selection)
}

/// Move to the question at `index`, dropping the answer to the previous one.
pub fn save_index(store: &mut dyn KeyValueStore, quiz_id: &str, index: usize) -> Fallible<()> {
    store.set(&key(quiz_id, INDEX), &index.to_string())?;
    store.remove(&key(quiz_id, ANSWER))
}

pub fn clear(store: &mut dyn KeyValueStore, quiz_id: &str) -> Fallible<()> {
    for field in [INDEX, CORRECT, INCORRECT, ANSWER] {
        store.remove(&key(quiz_id, field))?;
    }
    Ok(())
}
