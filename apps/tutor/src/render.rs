//! Terminal rendering of tutor state. The pure `render_*` helpers build text;
//! [`run_event_printer`] owns stdout for everything driven by events.

use std::{
    fmt::Write as _,
    io::{self, Write},
    sync::Arc,
};

use client_core::{
    conversation::{typing_dots, PENDING_ANSWER_LABEL, TYPING_DOTS_INTERVAL},
    feedback::{CopyButton, FeedbackBlock},
    submission::GRADING_OVERLAY_MESSAGE,
    timer::TimerReadout,
    Pane, SubmissionResult, TutorClient, TutorEvent, ViewSnapshot,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

pub const INTRO_MESSAGE: &str = "파이썬 학습을 위한 다양한 주제들이 준비되어 있습니다. 원하는 주제를 선택하고, '이론' 또는 '연습문제'를 추가하여 채팅창에 입력해주세요. 예를 들어, '내장 함수 이론' 또는 '내장 함수 연습문제'와 같이 입력하시면 됩니다.";

pub const TOPICS: [&str; 27] = [
    "파이썬의 특징",
    "파이썬으로 무엇을 할 수 있을까?",
    "파이썬 설치하기",
    "파이썬 둘러보기",
    "파이썬과 에디터",
    "숫자형",
    "문자열 자료형",
    "리스트 자료형",
    "튜플 자료형",
    "딕셔너리 자료형",
    "집합 자료형",
    "불 자료형",
    "변수",
    "if문",
    "while문",
    "for문",
    "함수",
    "사용자 입출력",
    "파일 읽고 쓰기",
    "프로그램의 입출력",
    "클래스",
    "모듈",
    "패키지",
    "예외 처리",
    "내장 함수",
    "표준 라이브러리",
    "외부 라이브러리",
];

const CLEAR_LINE: &str = "\r\x1b[2K";

pub fn render_topics() -> String {
    let mut out = format!("{INTRO_MESSAGE}\n");
    for (index, topic) in TOPICS.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {topic}", index + 1);
    }
    out
}

/// Feedback blocks in message order; code blocks are numbered for `/copy`.
pub fn render_feedback(result: &SubmissionResult, buttons: &[CopyButton]) -> String {
    let mut out = String::new();
    let mut code_index = 0;
    for block in result.blocks() {
        match block {
            FeedbackBlock::Paragraph(text) => {
                let _ = writeln!(out, "{}", text.trim_end_matches('\n'));
            }
            FeedbackBlock::Code(code) => {
                let label = buttons
                    .get(code_index)
                    .map(CopyButton::label)
                    .unwrap_or_default();
                code_index += 1;
                let _ = writeln!(out, "┌─ [{code_index}] python  ({label})");
                for line in code.lines() {
                    let _ = writeln!(out, "│ {line}");
                }
                let _ = writeln!(out, "└─");
            }
        }
    }
    out
}

/// Status shown while a turn is pending: the typing indicator, followed by
/// the elapsed time once the grace delay has passed.
pub fn render_pending_status(step: usize, readout: TimerReadout) -> String {
    let mut status = format!("{PENDING_ANSWER_LABEL}{}", typing_dots(step));
    if let Some(label) = readout.label() {
        let _ = write!(status, "  ({label})");
    }
    status
}

pub fn render_view(snapshot: &ViewSnapshot) -> String {
    let pane = match snapshot.target {
        Pane::Conversation => "대화",
        Pane::CodeEditor => "코드 편집기",
    };
    let palette = snapshot.theme().palette();
    format!(
        "[{pane}] {:?} theme (background {}, text {})",
        snapshot.theme(),
        palette.background,
        palette.text
    )
}

/// Prints reveal progress, the pending indicator, the grading overlay and
/// view changes until the event channel closes.
pub async fn run_event_printer(
    client: Arc<TutorClient>,
    mut events: broadcast::Receiver<TutorEvent>,
) {
    let mut ticker = tokio::time::interval(TYPING_DOTS_INTERVAL);
    let mut pending: Option<usize> = None;
    let mut step = 0usize;

    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "event printer lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                match event {
                    TutorEvent::TurnStarted { turn } => {
                        pending = Some(turn);
                        step = 0;
                    }
                    TutorEvent::TurnResolved { turn, succeeded } => {
                        pending = None;
                        print!("{CLEAR_LINE}튜터: ");
                        if !succeeded {
                            let text = client
                                .conversation()
                                .turn(turn)
                                .await
                                .and_then(|turn| turn.assistant_text)
                                .unwrap_or_default();
                            println!("{text}");
                        }
                    }
                    TutorEvent::RevealToken { token, .. } => print!("{token}"),
                    TutorEvent::RevealCompleted { turn } => {
                        println!();
                        if let Some(label) = client.conversation().timer(turn).await.label() {
                            println!("  ({label})");
                        }
                    }
                    TutorEvent::SubmissionStarted { problem } => {
                        println!("[{problem}] {GRADING_OVERLAY_MESSAGE}");
                    }
                    TutorEvent::ViewChanged(snapshot) if !snapshot.is_transitioning() => {
                        println!("{}", render_view(&snapshot));
                    }
                    TutorEvent::ViewChanged(_)
                    | TutorEvent::SubmissionFinished { .. }
                    | TutorEvent::SessionChanged { .. } => {}
                }
                let _ = io::stdout().flush();
            }
            _ = ticker.tick() => {
                if let Some(turn) = pending {
                    let readout = client.conversation().timer(turn).await;
                    print!("{CLEAR_LINE}{}", render_pending_status(step, readout));
                    let _ = io::stdout().flush();
                    step += 1;
                }
            }
        }
    }
}
