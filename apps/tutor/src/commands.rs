use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use client_core::SignupForm;
use shared::domain::ProblemNumber;

pub const HELP: &str = "\
명령어:
  <질문>                              튜터에게 질문하기
  /code                               대화창 <-> 코드 편집기 전환
  /problem N                          문제 선택 (001, 002, 003)
  /submit PATH                        파일의 코드를 채점 요청
  /feedback                           마지막 채점 결과 다시 보기
  /dismiss                            채점 결과 닫기
  /copy N                             N번째 코드 조각 복사
  /login EMAIL PASSWORD [--remember]  로그인
  /signup NAME EMAIL PASSWORD CONFIRM 회원가입
  /logout                             로그아웃
  /whoami                             현재 사용자와 식별자
  /topics                             학습 주제 목록
  /help                               도움말
  /quit                               종료";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat(String),
    ToggleCode,
    Problem(ProblemNumber),
    Submit(PathBuf),
    Feedback,
    Dismiss,
    /// One-based index into the code fragments of the current feedback.
    Copy(usize),
    Login {
        email: String,
        password: String,
        remember_me: bool,
    },
    Signup(SignupForm),
    Logout,
    WhoAmI,
    Topics,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Chat(line.trim_end_matches(['\r', '\n']).to_string())));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let command = match (name, args.as_slice()) {
        ("code", []) => Command::ToggleCode,
        ("problem", [number]) => Command::Problem(
            ProblemNumber::from_catalog(number).ok_or_else(|| {
                anyhow!(
                    "unknown problem '{number}', choose one of {}",
                    ProblemNumber::CATALOG.join(", ")
                )
            })?,
        ),
        ("submit", []) => bail!("usage: /submit PATH"),
        ("submit", _) => Command::Submit(PathBuf::from(rest["submit".len()..].trim())),
        ("feedback", []) => Command::Feedback,
        ("dismiss", []) => Command::Dismiss,
        ("copy", [index]) => match index.parse::<usize>() {
            Ok(index) if index > 0 => Command::Copy(index),
            _ => bail!("usage: /copy N (N starts at 1)"),
        },
        ("login", [email, password]) => Command::Login {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: false,
        },
        ("login", [email, password, "--remember"]) => Command::Login {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: true,
        },
        ("login", _) => bail!("usage: /login EMAIL PASSWORD [--remember]"),
        ("signup", [name, email, password, password_confirm]) => Command::Signup(SignupForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password_confirm.to_string(),
        }),
        ("signup", _) => bail!("usage: /signup NAME EMAIL PASSWORD CONFIRM"),
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::WhoAmI,
        ("topics", []) => Command::Topics,
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => bail!("unknown command '/{rest}', try /help"),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Command {
        parse(line).expect("parse").expect("command")
    }

    #[test]
    fn plain_text_is_a_chat_turn() {
        assert_eq!(
            parsed("  리스트 자료형 이론\n"),
            Command::Chat("  리스트 자료형 이론".into())
        );
        assert_eq!(parse("   ").expect("parse"), None);
    }

    #[test]
    fn problem_numbers_come_from_the_catalog() {
        assert_eq!(
            parsed("/problem 2"),
            Command::Problem(ProblemNumber::from("002"))
        );
        assert!(parse("/problem 9").is_err());
        assert!(parse("/problem").is_err());
    }

    #[test]
    fn submit_keeps_paths_with_spaces() {
        assert_eq!(
            parsed("/submit ./my solutions/answer.py"),
            Command::Submit(PathBuf::from("./my solutions/answer.py"))
        );
        assert!(parse("/submit").is_err());
    }

    #[test]
    fn login_accepts_optional_remember_flag() {
        assert_eq!(
            parsed("/login kim@example.com pw --remember"),
            Command::Login {
                email: "kim@example.com".into(),
                password: "pw".into(),
                remember_me: true,
            }
        );
        assert!(matches!(
            parsed("/login kim@example.com pw"),
            Command::Login {
                remember_me: false,
                ..
            }
        ));
        assert!(parse("/login kim@example.com").is_err());
    }

    #[test]
    fn signup_takes_four_fields() {
        let Command::Signup(form) = parsed("/signup 김파이 kim@example.com pw pw2") else {
            panic!("expected signup");
        };
        assert_eq!(form.name, "김파이");
        assert_eq!(form.password_confirm, "pw2");
        assert!(parse("/signup a b c").is_err());
    }

    #[test]
    fn copy_index_is_one_based() {
        assert_eq!(parsed("/copy 1"), Command::Copy(1));
        assert!(parse("/copy 0").is_err());
        assert!(parse("/copy x").is_err());
    }

    #[test]
    fn simple_commands_and_unknowns() {
        assert_eq!(parsed("/code"), Command::ToggleCode);
        assert_eq!(parsed("/exit"), Command::Quit);
        assert_eq!(parsed("/whoami"), Command::WhoAmI);
        assert!(parse("/dance").is_err());
        assert!(parse("/code now").is_err());
    }
}
