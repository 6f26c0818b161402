use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    feedback::CopyButton, session::SIGNUP_COMPLETE_NOTICE, HttpAuthBackend, HttpTutorBackend,
    TutorClient,
};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod clipboard;
mod commands;
mod config;
mod render;

use clipboard::SystemClipboard;
use commands::Command;
use config::Settings;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the Python tutor")]
struct Args {
    #[arg(long)]
    tutor_api_url: Option<String>,
    #[arg(long)]
    auth_api_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    /// Delay between revealed words of an answer.
    #[arg(long)]
    reveal_interval_ms: Option<u64>,
    /// Discard the stored identity on logout instead of keeping it.
    #[arg(long)]
    reset_identity_on_logout: bool,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.tutor_api_url {
            settings.tutor_api_url = v;
        }
        if let Some(v) = self.auth_api_url {
            settings.auth_api_url = v;
        }
        if let Some(v) = self.database_url {
            settings.database_url = v;
        }
        if let Some(v) = self.reveal_interval_ms {
            settings.reveal_interval_ms = v;
        }
        if self.reset_identity_on_logout {
            settings.logout_clears_identity = true;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    client: Arc<TutorClient>,
    clipboard: SystemClipboard,
    copy_buttons: Vec<CopyButton>,
}

impl App {
    async fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Chat(text) => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    client.conversation().submit(&text).await;
                });
            }
            Command::ToggleCode => {
                self.client.view().toggle().await;
            }
            Command::Problem(problem) => {
                println!("문제 {problem} 선택됨");
                self.client.submission().select_problem(problem).await;
            }
            Command::Submit(path) => self.submit_file(&path).await?,
            Command::Feedback => self.print_feedback().await,
            Command::Dismiss => {
                self.client.submission().dismiss().await;
                self.copy_buttons.clear();
            }
            Command::Copy(index) => match self.copy_buttons.get_mut(index - 1) {
                Some(button) => {
                    if button.copy(&self.clipboard) {
                        println!("[{index}] {}", button.label());
                    }
                }
                None => println!("코드 조각 [{index}]이(가) 없습니다."),
            },
            Command::Login {
                email,
                password,
                remember_me,
            } => match self.client.login(&email, &password, remember_me).await {
                Ok(user) => println!("{}님 환영합니다.", user.name),
                Err(err) => {
                    warn!(error = %err, "login failed");
                    println!("{}", err.notice());
                }
            },
            Command::Signup(form) => match self.client.signup(form).await {
                Ok(()) => println!("{SIGNUP_COMPLETE_NOTICE}"),
                Err(err) => {
                    warn!(error = %err, "signup failed");
                    println!("{}", err.notice());
                }
            },
            Command::Logout => {
                self.client.logout().await?;
                println!("로그아웃되었습니다.");
            }
            Command::WhoAmI => {
                let session = self.client.session();
                match session.current_user().await {
                    Some(user) => println!("{} (식별자 {})", user.name, session.identity().await),
                    None => println!("로그인하지 않음 (식별자 {})", session.identity().await),
                }
            }
            Command::Topics => print!("{}", render::render_topics()),
            Command::Help => println!("{}", commands::HELP),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Grading blocks the prompt until the verdict arrives.
    async fn submit_file(&mut self, path: &Path) -> Result<()> {
        let code = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        if self.client.submission().submit_code(&code).await.is_some() {
            self.copy_buttons.clear();
            self.print_feedback().await;
        }
        Ok(())
    }

    async fn print_feedback(&mut self) {
        let Some(result) = self.client.submission().result().await else {
            println!("채점 결과가 없습니다.");
            return;
        };
        if self.copy_buttons.is_empty() {
            self.copy_buttons = result.copy_buttons(self.client.settings().copy_revert);
        }
        print!("{}", render::render_feedback(&result, &self.copy_buttons));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = config::load_settings();
    args.apply(&mut settings);
    settings.validate()?;

    let database_url = config::prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await?;
    let client = TutorClient::open(
        settings.tutor_settings(),
        storage,
        Arc::new(HttpTutorBackend::new(settings.tutor_api_url.as_str())),
        Arc::new(HttpAuthBackend::new(settings.auth_api_url.as_str())),
    )
    .await?;
    info!(
        tutor_api_url = %settings.tutor_api_url,
        auth_api_url = %settings.auth_api_url,
        database_url = %database_url,
        "tutor client ready"
    );

    let printer = tokio::spawn(render::run_event_printer(
        Arc::clone(&client),
        client.subscribe_events(),
    ));

    print!("{}", render::render_topics());
    if let Some(user) = client.session().current_user().await {
        println!("{}님 환영합니다.", user.name);
    }
    println!("/help 로 명령어를 볼 수 있습니다.");

    let mut app = App {
        client,
        clipboard: SystemClipboard,
        copy_buttons: Vec::new(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match app.handle(command).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => println!("{err:#}"),
        }
    }

    app.client.shutdown().await;
    printer.abort();
    Ok(())
}
