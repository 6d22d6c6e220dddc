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
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::library::Library;
use crate::serve::get::get_handler;
use crate::serve::post::post_handler;
use crate::serve::state::ServerState;
use crate::session::controller::Controller;
use crate::session::controller::LoadTicket;
use crate::store::KeyValueStore;
use crate::store::MemoryStore;
use crate::types::descriptor::QuizDescriptor;

/// Command-line overrides for serving a library. `None` means: use the value
/// from the library's configuration file.
#[derive(Default)]
pub struct ServeOptions {
    pub directory: Option<String>,
    pub port: Option<u16>,
    /// Run only this quiz, without the menu.
    pub quiz: Option<String>,
    pub open_browser: Option<bool>,
    /// Keep progress in memory instead of the library's database.
    pub ephemeral: bool,
}

pub async fn start_server(options: ServeOptions) -> Fallible<()> {
    let library = Library::open(options.directory)?;
    let port = options.port.unwrap_or(library.config.port);
    let open_browser = options.open_browser.unwrap_or(library.config.open_browser);

    let store: Box<dyn KeyValueStore + Send> = if options.ephemeral {
        log::debug!("Keeping progress in memory.");
        Box::new(MemoryStore::new())
    } else {
        Box::new(Database::new(&library.db_path()?)?)
    };

    let single: Option<QuizDescriptor> = match &options.quiz {
        Some(quiz_id) => match library.find(quiz_id) {
            Some(quiz) => Some(quiz.clone()),
            None => {
                return Err(ErrorReport::new(format!(
                    "no quiz with id '{quiz_id}' in manifest"
                )));
            }
        },
        None => None,
    };
    let (controller, pending) = match single {
        Some(quiz) => {
            let (controller, ticket) = Controller::single(store, quiz.clone());
            (controller, Some((ticket, quiz)))
        }
        None => (Controller::with_menu(store), None),
    };

    let state = ServerState {
        title: library.config.title.clone(),
        library: Arc::new(library),
        mutable: Arc::new(Mutex::new(controller)),
    };
    if let Some((ticket, quiz)) = pending {
        load_questions(&state, ticket, &quiz).await?;
    }

    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{port}");

    if open_browser {
        // Start a separate task to open the browser.
        let url = format!("http://{bind}/");
        let target = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&target).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    // Start the server.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Load a quiz's questions and hand them to the session. The session lock
/// is only taken once the file has been read.
pub async fn load_questions(
    state: &ServerState,
    ticket: LoadTicket,
    quiz: &QuizDescriptor,
) -> Fallible<()> {
    let result = state.library.load_questions(quiz).await;
    let mut controller = state.acquire()?;
    match result {
        Ok(questions) => {
            controller.on_questions_loaded(&ticket, questions)?;
        }
        Err(e) => {
            log::error!("{e}");
            let message = format!("Failed to load questions: {}", e.message());
            controller.on_questions_load_failed(&ticket, &message)?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::debug!("Shutting down."),
        Err(e) => {
            log::error!("failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
