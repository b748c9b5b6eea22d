//! Interactive cooking session.
//!
//! Commands are read line by line from stdin; every session event is
//! written to stdout as one JSON object per line. The session clock ticks
//! on `timer.tick_interval_ms`.

use std::time::Duration;

use brewguide_core::session::default_step_label;
use brewguide_core::{Config, Language, Locales, SessionController, SessionPhase};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::common::{self, TerminalHost};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookCommand {
    Next,
    Prev,
    /// 1-based step number.
    Goto(usize),
    Press(Option<String>),
    Finish,
    Enter(String),
    Advance,
    Done(Option<String>),
    Leave,
    Timer { id: String, secs: u64 },
    Stop(String),
    Lang(Language),
    Status,
    /// Drop confirmations and timers, keep the position.
    Clear,
    Reset,
    Quit,
}

pub fn parse(line: &str) -> Result<Option<CookCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = || (!rest.is_empty()).then(|| rest.to_string());
    let required = |what: &str| arg().ok_or_else(|| format!("{word}: missing {what}"));

    let cmd = match word {
        "next" | "n" => CookCommand::Next,
        "prev" | "p" => CookCommand::Prev,
        "goto" => {
            let n: usize = required("step number")?
                .parse()
                .map_err(|_| format!("goto: not a step number: {rest}"))?;
            if n == 0 {
                return Err("goto: steps are numbered from 1".into());
            }
            CookCommand::Goto(n)
        }
        "press" => CookCommand::Press(arg()),
        "finish" => CookCommand::Finish,
        "enter" => CookCommand::Enter(required("block id")?),
        "advance" | "a" => CookCommand::Advance,
        "done" => CookCommand::Done(arg()),
        "leave" => CookCommand::Leave,
        "timer" => {
            let (id, secs) = rest
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| "timer: usage is 'timer ID SECONDS'".to_string())?;
            let secs = secs
                .parse()
                .map_err(|_| format!("timer: not a number of seconds: {secs}"))?;
            CookCommand::Timer {
                id: id.trim().to_string(),
                secs,
            }
        }
        "stop" => CookCommand::Stop(required("timer id")?),
        "lang" => CookCommand::Lang(required("language code")?.parse()?),
        "status" | "s" => CookCommand::Status,
        "clear" => CookCommand::Clear,
        "reset" => CookCommand::Reset,
        "quit" | "q" | "exit" => CookCommand::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(cmd))
}

/// Apply one command. Returns `false` when the session ignored it.
pub fn apply(session: &mut SessionController, cmd: CookCommand) -> bool {
    let in_block = session.phase() == SessionPhase::InBlock;
    match cmd {
        CookCommand::Next if in_block => session.next_block_step().is_some(),
        CookCommand::Next => session.next_step().is_some(),
        CookCommand::Prev if in_block => session.previous_block_step().is_some(),
        CookCommand::Prev => session.previous_step().is_some(),
        CookCommand::Goto(n) => session.go_to_step(n - 1).is_some(),
        CookCommand::Press(_) if in_block => !session.confirm_block_step().is_empty(),
        CookCommand::Press(label) => {
            let label = label.or_else(|| session.current_step().map(default_step_label));
            match label {
                Some(label) => !session.press_button(&label).is_empty(),
                None => false,
            }
        }
        CookCommand::Finish => session.finish_recipe().is_some(),
        CookCommand::Enter(block) => session.enter_block(&block).is_some(),
        CookCommand::Advance => session.advance_block().is_some(),
        CookCommand::Done(block) => {
            let block = block.or_else(|| session.active_block_id().map(String::from));
            match block {
                Some(block) => session.complete_block(&block).is_some(),
                None => false,
            }
        }
        CookCommand::Leave => session.leave_block().is_some(),
        CookCommand::Timer { id, secs } => {
            session.start_timer(&id, secs);
            true
        }
        CookCommand::Stop(id) => session.stop_timer(&id).is_some(),
        CookCommand::Lang(language) => {
            session.set_language(language);
            true
        }
        CookCommand::Status => {
            print_json(&session.snapshot());
            true
        }
        CookCommand::Clear => {
            session.reset_progress();
            true
        }
        CookCommand::Reset => {
            if session.multi_task_recipe().is_some() {
                session.reset_multi_task().is_some()
            } else {
                match session.current_recipe().cloned() {
                    Some(recipe) => {
                        session.select_recipe(recipe);
                        true
                    }
                    None => false,
                }
            }
        }
        CookCommand::Quit => true,
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "event not serializable"),
    }
}

pub async fn run(id: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = common::load_settings(&config);
    let catalog = common::load_catalog(&config, &settings).await?;
    let bell = config.timer.bell;

    let mut session = SessionController::with_settings(
        catalog,
        settings,
        Box::new(Locales::embedded()),
        Box::new(TerminalHost::from_env(bell)),
    );
    session.subscribe(|event| print_json(event));
    if bell {
        session.on_timer_complete(|_| eprint!("\x07"));
    }
    session
        .select_recipe_by_id(id)
        .ok_or_else(|| format!("recipe {id} not found"))?;
    if let Some(caption) = session.step_caption() {
        eprintln!("{caption}");
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(config.timer.tick_interval_ms));
    // The first tick completes immediately.
    ticker.tick().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick();
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                match parse(&line) {
                    Ok(Some(CookCommand::Quit)) => break,
                    Ok(Some(cmd)) => {
                        if apply(&mut session, cmd) {
                            if let Some(caption) = session.step_caption() {
                                eprintln!("{caption}");
                            }
                        } else {
                            eprintln!("ignored: {}", line.trim());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
        if session.phase() == SessionPhase::Completed {
            break;
        }
    }

    tracing::info!(session_id = %session.session_id(), progress = session.progress_percent(), "session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewguide_core::{MemoryPreferences, NoHost, RecipeCatalog};

    fn session() -> SessionController {
        SessionController::new(
            RecipeCatalog::builtin().unwrap(),
            Box::new(MemoryPreferences::new()),
            Box::new(Locales::embedded()),
            Box::new(NoHost),
        )
    }

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(parse("next").unwrap(), Some(CookCommand::Next));
        assert_eq!(parse("  p ").unwrap(), Some(CookCommand::Prev));
        assert_eq!(parse("goto 3").unwrap(), Some(CookCommand::Goto(3)));
        assert_eq!(parse("enter sauce").unwrap(), Some(CookCommand::Enter("sauce".into())));
        assert_eq!(parse("done").unwrap(), Some(CookCommand::Done(None)));
        assert_eq!(parse("q").unwrap(), Some(CookCommand::Quit));
    }

    #[test]
    fn press_keeps_labels_with_spaces() {
        assert_eq!(
            parse("press Спагетти готовы").unwrap(),
            Some(CookCommand::Press(Some("Спагетти готовы".into())))
        );
        assert_eq!(parse("press").unwrap(), Some(CookCommand::Press(None)));
    }

    #[test]
    fn timer_takes_the_last_word_as_seconds() {
        assert_eq!(
            parse("timer tea bag 90").unwrap(),
            Some(CookCommand::Timer { id: "tea bag".into(), secs: 90 })
        );
        assert!(parse("timer 90").is_err());
        assert!(parse("timer tea soon").is_err());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("# warm the pan").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("goto 0").is_err());
        assert!(parse("goto x").is_err());
        assert!(parse("enter").is_err());
        assert!(parse("lang xx").is_err());
        assert!(parse("dance").is_err());
    }

    #[test]
    fn simple_flow_through_apply() {
        let mut s = session();
        s.select_recipe_by_id(1).unwrap();
        assert!(apply(&mut s, CookCommand::Press(None)));
        assert_eq!(s.tracker().completed_count(), 1);
        assert!(!apply(&mut s, CookCommand::Prev));
        assert!(apply(&mut s, CookCommand::Goto(3)));
        assert_eq!(s.step_index(), 2);
        assert!(!apply(&mut s, CookCommand::Finish));
        assert!(!apply(&mut s, CookCommand::Enter("sauce".into())));
    }

    #[test]
    fn block_flow_through_apply() {
        let mut s = session();
        s.select_recipe_by_id(101).unwrap();
        assert!(!apply(&mut s, CookCommand::Enter("assembly".into())));
        assert!(apply(&mut s, CookCommand::Enter("sauce".into())));
        assert!(apply(&mut s, CookCommand::Done(None)));
        assert!(s.is_block_completed("sauce"));
        assert!(s.is_block_eligible("pasta"));
        assert!(!apply(&mut s, CookCommand::Done(Some("sauce".into()))));
    }

    #[test]
    fn reset_restarts_the_recipe() {
        let mut s = session();
        s.select_recipe_by_id(1).unwrap();
        apply(&mut s, CookCommand::Press(None));
        apply(&mut s, CookCommand::Next);
        assert!(apply(&mut s, CookCommand::Reset));
        assert_eq!(s.step_index(), 0);
        assert_eq!(s.tracker().completed_count(), 0);
    }
}
