//! A terminal front end for the assistant.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;
use zikomo::SessionBuilder;
use zikomo::core::transcript::{Content, Entry, Role};
use zikomo::settings::Settings;
use zikomo::translate::LibreTranslator;
use zikomo_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", format!("Invalid settings: {err}").red());
            return;
        }
    };
    debug!("starting with {settings:?}");

    let mut config = OpenAIConfigBuilder::with_api_key(settings.api_key);
    if let Some(base_url) = settings.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(model) = settings.model {
        config = config.with_model(model);
    }
    let model_provider = OpenAIProvider::new(config.build());

    let mut builder = SessionBuilder::with_model_provider(model_provider)
        .with_system_prompt(include_str!("./system_prompt.md"))
        .with_config(settings.agent);
    if let Some(url) = settings.translate_url {
        let mut translator = LibreTranslator::new(url);
        if let Some(api_key) = settings.translate_api_key {
            translator = translator.with_api_key(api_key);
        }
        builder = builder.with_translator(translator);
    }
    let session = match builder.build() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", format!("Failed to start: {err}").red());
            return;
        }
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut turn = session.send_message(line);

        let mut progress_bar = None;
        let mut printed = 0;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let snapshot = select! {
                snapshot = turn.snapshots().next() => {
                    let Some(snapshot) = snapshot else {
                        break;
                    };
                    snapshot
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = progress_bar.take() {
                progress_bar.finish_and_clear();
            }

            for entry in snapshot.entries().iter().skip(printed) {
                print_entry(entry);
            }
            printed = snapshot.entries().len();
        }

        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        if let Err(err) = turn.finish().await {
            println!("{}{}", BAR_CHAR.red(), format!("❌ {err}").red());
        }
        println!();
    }
}

fn print_entry(entry: &Entry) {
    match (entry.role(), entry.content()) {
        // The user has just typed it.
        (Role::User, _) => {}
        (Role::Assistant, Content::ToolCalls { text, calls }) => {
            if !text.is_empty() {
                println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
            }
            for call in calls {
                println!(
                    "{}🔧 {}({})",
                    BAR_CHAR.bright_yellow(),
                    call.name.bold(),
                    call.arguments.dimmed()
                );
            }
        }
        (Role::Assistant, _) => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                entry.text().bright_white()
            );
        }
        (Role::Tool, Content::ToolResult(result)) if !result.is_success() => {
            println!("{}   {}", BAR_CHAR.bright_yellow(), entry.text().red());
        }
        (Role::Tool, _) => {
            println!("{}   {}", BAR_CHAR.bright_yellow(), entry.text().dimmed());
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
