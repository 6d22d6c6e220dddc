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

use clap::Parser;

use crate::cmd::check::check_library;
use crate::cmd::forget::forget_progress;
use crate::cmd::progress::ProgressFormat;
use crate::cmd::progress::print_progress;
use crate::error::Fallible;
use crate::serve::server::ServeOptions;
use crate::serve::server::start_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve a quiz library in the browser.
    Serve {
        /// Path to the library directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The port to use for the web server. Overrides the configuration file.
        #[arg(long)]
        port: Option<u16>,
        /// Run a single quiz, without the menu.
        #[arg(long)]
        quiz: Option<String>,
        /// Don't open the browser automatically.
        #[arg(long)]
        no_open: bool,
        /// Keep progress in memory only.
        #[arg(long)]
        ephemeral: bool,
    },
    /// Check the manifest and every question file.
    Check {
        /// Path to the library directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print the saved progress of every quiz.
    Progress {
        /// Path to the library directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = ProgressFormat::Text)]
        format: ProgressFormat,
    },
    /// Clear saved progress.
    Forget {
        /// Path to the library directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The quiz to forget. By default, progress for every quiz is cleared.
        quiz: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            directory,
            port,
            quiz,
            no_open,
            ephemeral,
        } => {
            let options = ServeOptions {
                directory,
                port,
                quiz,
                open_browser: if no_open { Some(false) } else { None },
                ephemeral,
            };
            start_server(options).await
        }
        Command::Check { directory } => check_library(directory),
        Command::Progress { directory, format } => print_progress(directory, format),
        Command::Forget { directory, quiz } => forget_progress(directory, quiz),
    }
}
