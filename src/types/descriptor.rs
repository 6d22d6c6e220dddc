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

use serde::Deserialize;
use serde::Serialize;

/// Identifies a selectable quiz. One entry of the quiz manifest.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct QuizDescriptor {
    pub id: String,
    pub title: String,
    pub subject: String,
    /// Path to the question file, relative to the library directory.
    pub file: String,
}

#[cfg(test)]
impl QuizDescriptor {
    pub fn new(id: &str, title: &str, subject: &str, file: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subject: subject.to_string(),
            file: file.to_string(),
        }
    }
}
