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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::library::Library;
use crate::session::controller::Controller;

#[derive(Clone)]
pub struct ServerState {
    pub title: String,
    pub library: Arc<Library>,
    pub mutable: Arc<Mutex<Controller>>,
}

impl ServerState {
    /// Lock the session. Never hold the guard across an `.await`.
    pub fn acquire(&self) -> Fallible<MutexGuard<'_, Controller>> {
        self.mutable
            .lock()
            .map_err(|_| ErrorReport::new("session state is poisoned"))
    }
}
