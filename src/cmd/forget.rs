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

use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::library::Library;
use crate::resume;
use crate::store::KeyValueStore;

/// Remove saved progress, for one quiz or for all of them. Returns the
/// number of keys removed.
fn forget(db: &mut Database, quiz_id: Option<&str>) -> Fallible<usize> {
    let prefix = match quiz_id {
        Some(quiz_id) => resume::key_prefix(quiz_id),
        None => "quiz/".to_string(),
    };
    let keys = db.keys_with_prefix(&prefix)?;
    for key in &keys {
        db.remove(key)?;
    }
    Ok(keys.len())
}

pub fn forget_progress(directory: Option<String>, quiz: Option<String>) -> Fallible<()> {
    let library = Library::open(directory)?;
    if let Some(quiz_id) = &quiz {
        if library.find(quiz_id).is_none() {
            return fail(format!("no quiz with id '{quiz_id}' in manifest"));
        }
    }
    let mut db = Database::new(&library.db_path()?)?;
    let removed = forget(&mut db, quiz.as_deref())?;
    log::debug!("Removed {removed} keys.");
    match quiz {
        Some(quiz_id) => println!("Forgot progress for {quiz_id}."),
        None => println!("Forgot progress for all quizzes."),
    }
    Ok(())
}
