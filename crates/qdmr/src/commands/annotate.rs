//! `qdmr annotate` -- interactive decomposition session.
//!
//! Reads one command per line from stdin and applies it to the session's
//! decomposition store. Human mode prints styled text; `--json` prints one
//! JSON object per line, tagged with an `event` field.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use qdmr_config::config::TokenValidation;
use qdmr_core::question::QuestionId;
use qdmr_core::resolver::invalid_references;
use qdmr_core::session::Session;
use qdmr_core::step::{Step, StepId};
use qdmr_core::store::PreviewState;
use qdmr_core::token::Token;
use qdmr_ui::styles::{
    render_category, render_fail, render_fail_icon, render_muted, render_pass,
    render_pass_icon, render_warn, render_warn_icon,
};
use qdmr_ui::terminal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::AnnotateArgs;
use crate::context::RuntimeContext;
use crate::output::{
    PreviewView, StepView, SubmissionView, format_preview, format_question, format_steps,
};

const PROMPT: &str = "qdmr> ";

/// Character that stands for a space inside an entered token.
const SPACE_PLACEHOLDER: char = '_';

const HELP: &[&str] = &[
    "add [tokens...]        append a step (no tokens: an empty step)",
    "edit <n> <tokens...>   replace the content of step n",
    "clear <n>              remove the content of step n",
    "delete <n>             delete step n and renumber the steps after it",
    "display                resolve references and show the preview",
    "show                   show the raw steps",
    "submit                 print the submission code and finish",
    "tokens                 list the question's vocabulary",
    "help                   show this help",
    "quit                   leave without submitting",
];

const HELP_FOOTER: &str = "Use #n to refer to step n and _ for a space inside a token (number_of).";

/// Execute the `qdmr annotate` command.
pub fn run(ctx: &RuntimeContext, args: &AnnotateArgs) -> Result<()> {
    let id = QuestionId::parse(&args.question_id)?;
    let dataset = ctx.open_dataset()?;

    let mut session = Session::new(ctx.policy());
    session.load_question(&id, &dataset)?;

    let options = SessionOptions {
        json: ctx.json,
        quiet: ctx.quiet,
        validation: ctx.token_validation(),
        prompt: !ctx.json && terminal::is_stdin_tty(),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_session(&mut session, &options, stdin.lock(), &mut out)? {
        Outcome::Submitted(code) => debug!(%code, "decomposition submitted"),
        Outcome::Quit => debug!("annotation session ended without submission"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// Settings for one interactive session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub json: bool,
    pub quiet: bool,
    pub validation: TokenValidation,
    /// Print a prompt before each command.
    pub prompt: bool,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The decomposition was submitted with this code.
    Submitted(String),
    /// The user quit or input ended.
    Quit,
}

/// Runs commands from `input` against a session with a loaded question
/// until `submit`, `quit` or end of input.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    options: &SessionOptions,
    input: R,
    out: &mut W,
) -> Result<Outcome> {
    let mut annotator = Annotator {
        session,
        options,
        out,
    };

    annotator.greet()?;
    annotator.prompt()?;
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                debug!(?command, "annotate command");
                if let Some(outcome) = annotator.execute(command)? {
                    return Ok(outcome);
                }
            }
            Err(message) => annotator.error(&message)?,
        }
        annotator.prompt()?;
    }
    Ok(Outcome::Quit)
}

/// JSON events written in `--json` mode.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Reply {
    Loaded {
        question_id: String,
        granular: bool,
        text: String,
    },
    Added {
        step: StepId,
    },
    Updated {
        step: StepId,
    },
    Cleared {
        step: StepId,
    },
    Deleted {
        step: StepId,
        remaining: usize,
    },
    Preview(PreviewView),
    Steps {
        state: PreviewState,
        steps: Vec<StepView>,
    },
    Submitted(SubmissionView),
    Tokens {
        tokens: Vec<String>,
    },
    Help {
        commands: Vec<&'static str>,
    },
    Warning {
        step: StepId,
        message: String,
    },
    Error {
        error: String,
    },
}

struct Annotator<'a, W> {
    session: &'a mut Session,
    options: &'a SessionOptions,
    out: &'a mut W,
}

impl<W: Write> Annotator<'_, W> {
    fn greet(&mut self) -> Result<()> {
        let loaded = self.session.loaded()?;
        if self.options.json {
            let reply = Reply::Loaded {
                question_id: loaded.id.to_string(),
                granular: loaded.id.is_granular(),
                text: loaded.question.text.clone(),
            };
            return self.emit(&reply);
        }
        if self.options.quiet {
            return Ok(());
        }
        let header = format_question(&loaded.id, &loaded.question.text);
        write!(self.out, "{header}")?;
        writeln!(self.out, "{}", render_muted("Type 'help' for commands."))?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        if self.options.prompt {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<Option<Outcome>> {
        match command {
            Command::Add(tokens) => {
                let id = self.session.store()?.next_step_id();
                let step = match tokens {
                    Some(tokens) => {
                        if !self.check_tokens(id, &tokens)? {
                            return Ok(None);
                        }
                        Step::new(id, tokens)
                    }
                    None => Step::empty(id),
                };
                let result = self.session.store_mut()?.add_step(step);
                match result {
                    Ok(()) => self.confirm(Reply::Added { step: id }, format!("Added step {id}"))?,
                    Err(e) => self.error(&e.to_string())?,
                }
            }

            Command::Edit(id, tokens) => {
                if !self.check_tokens(id, &tokens)? {
                    return Ok(None);
                }
                let result = self.session.store_mut()?.edit_step(Step::new(id, tokens));
                match result {
                    Ok(()) => self.confirm(Reply::Updated { step: id }, format!("Updated step {id}"))?,
                    Err(e) => self.error(&e.to_string())?,
                }
            }

            Command::Clear(id) => {
                let result = self.session.store_mut()?.edit_step(Step::empty(id));
                match result {
                    Ok(()) => self.confirm(Reply::Cleared { step: id }, format!("Cleared step {id}"))?,
                    Err(e) => self.error(&e.to_string())?,
                }
            }

            Command::Delete(id) => {
                let store = self.session.store_mut()?;
                match store.delete_step(id) {
                    Ok(()) => {
                        let remaining = store.len();
                        self.confirm(
                            Reply::Deleted { step: id, remaining },
                            format!("Deleted step {id} ({remaining} left)"),
                        )?
                    }
                    Err(e) => self.error(&e.to_string())?,
                }
            }

            Command::Display => {
                let preview = self.session.store_mut()?.display_decomposition();
                if self.options.json {
                    self.emit(&Reply::Preview(PreviewView::from_preview(&preview)))?;
                } else {
                    write!(self.out, "{}", format_preview(&preview))?;
                }
            }

            Command::Show => {
                let store = self.session.store()?;
                if self.options.json {
                    let reply = Reply::Steps {
                        state: store.state(),
                        steps: store.steps().iter().map(StepView::from_step).collect(),
                    };
                    self.emit(&reply)?;
                } else {
                    let text = format_steps(store.steps(), store.state());
                    write!(self.out, "{text}")?;
                }
            }

            Command::Submit => match self.session.submission_code() {
                Ok(code) => {
                    let loaded = self.session.loaded()?;
                    let view = SubmissionView::new(&loaded.id, code.clone(), loaded.store.len());
                    if self.options.json {
                        self.emit(&Reply::Submitted(view))?;
                    } else {
                        writeln!(
                            self.out,
                            "{} {}",
                            render_pass_icon(),
                            render_pass("Submission code:")
                        )?;
                        writeln!(self.out, "{}", view.submission_code)?;
                    }
                    return Ok(Some(Outcome::Submitted(code)));
                }
                Err(e) => self.error(&e.to_string())?,
            },

            Command::Tokens => {
                let words: Vec<String> = self
                    .session
                    .loaded()?
                    .vocabulary
                    .sorted_words()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if self.options.json {
                    self.emit(&Reply::Tokens { tokens: words })?;
                } else if words.is_empty() {
                    writeln!(self.out, "{}", render_muted("(no vocabulary for this question)"))?;
                } else {
                    writeln!(self.out, "{}", render_category("vocabulary"))?;
                    writeln!(self.out, "{}", words.join(", "))?;
                }
            }

            Command::Help => {
                if self.options.json {
                    self.emit(&Reply::Help {
                        commands: HELP.to_vec(),
                    })?;
                } else {
                    for line in HELP {
                        writeln!(self.out, "  {line}")?;
                    }
                    writeln!(self.out, "{}", render_muted(HELP_FOOTER))?;
                }
            }

            Command::Quit => return Ok(Some(Outcome::Quit)),
        }
        Ok(None)
    }

    /// Checks entered tokens before they reach the store.
    ///
    /// Returns `false` when the step must be refused. Unresolvable
    /// references only produce a warning since the preview flags them too.
    fn check_tokens(&mut self, id: StepId, tokens: &[Token]) -> Result<bool> {
        let loaded = self.session.loaded()?;
        let unknown: Vec<String> = if loaded.vocabulary.is_empty() {
            Vec::new()
        } else {
            loaded
                .vocabulary
                .unknown(tokens)
                .iter()
                .map(|t| t.label().to_string())
                .collect()
        };

        if !unknown.is_empty() {
            let message = format!("not in the question's vocabulary: {}", unknown.join(", "));
            match self.options.validation {
                TokenValidation::None => {}
                TokenValidation::Warn => {
                    warn!(step = id, ?unknown, "tokens outside vocabulary");
                    self.warning(id, &message)?;
                }
                TokenValidation::Error => {
                    self.error(&format!("step {id} refused, {message}"))?;
                    return Ok(false);
                }
            }
        }

        for target in invalid_references(id, tokens) {
            self.warning(
                id,
                &format!("#{target} is not an earlier step and will not resolve"),
            )?;
        }
        Ok(true)
    }

    fn confirm(&mut self, reply: Reply, message: String) -> Result<()> {
        if self.options.json {
            self.emit(&reply)
        } else if self.options.quiet {
            Ok(())
        } else {
            writeln!(self.out, "{}", render_muted(&message))?;
            Ok(())
        }
    }

    fn warning(&mut self, step: StepId, message: &str) -> Result<()> {
        if self.options.json {
            return self.emit(&Reply::Warning {
                step,
                message: message.to_string(),
            });
        }
        writeln!(
            self.out,
            "{} {}",
            render_warn_icon(),
            render_warn(&format!("step {step}: {message}"))
        )?;
        Ok(())
    }

    fn error(&mut self, message: &str) -> Result<()> {
        if self.options.json {
            return self.emit(&Reply::Error {
                error: message.to_string(),
            });
        }
        writeln!(self.out, "{} {}", render_fail_icon(), render_fail(message))?;
        Ok(())
    }

    fn emit(&mut self, reply: &Reply) -> Result<()> {
        let line = serde_json::to_string(reply).context("failed to serialize reply")?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

/// One line of session input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// `None` adds an empty step.
    Add(Option<Vec<Token>>),
    Edit(StepId, Vec<Token>),
    Clear(StepId),
    Delete(StepId),
    Display,
    Show,
    Submit,
    Tokens,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_lowercase().as_str() {
        "add" | "a" => {
            if rest.is_empty() {
                Command::Add(None)
            } else {
                Command::Add(Some(entry_tokens(&rest)))
            }
        }
        "edit" | "e" => {
            let (id, tokens) = rest
                .split_first()
                .ok_or_else(|| "usage: edit <n> <tokens...>".to_string())?;
            if tokens.is_empty() {
                return Err("usage: edit <n> <tokens...> (use 'clear <n>' to empty a step)".into());
            }
            Command::Edit(parse_step_id(id)?, entry_tokens(tokens))
        }
        "clear" => Command::Clear(single_step_id("clear", &rest)?),
        "delete" | "del" | "rm" => Command::Delete(single_step_id("delete", &rest)?),
        "display" | "preview" | "p" => Command::Display,
        "show" | "ls" => Command::Show,
        "submit" => Command::Submit,
        "tokens" | "vocab" => Command::Tokens,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (type 'help' for commands)")),
    };
    Ok(Some(command))
}

fn single_step_id(verb: &str, rest: &[&str]) -> std::result::Result<StepId, String> {
    match rest {
        [id] => parse_step_id(id),
        _ => Err(format!("usage: {verb} <n>")),
    }
}

/// Accepts `3` or `#3`.
fn parse_step_id(word: &str) -> std::result::Result<StepId, String> {
    word.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("expected a step number, got '{word}'"))
}

/// Turns entered words into tokens, expanding `_` to a space.
fn entry_tokens(words: &[&str]) -> Vec<Token> {
    words
        .iter()
        .map(|word| Token::parse(&word.replace(SPACE_PLACEHOLDER, " ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qdmr_core::dataset::QuestionStore;
    use qdmr_core::question::Question;
    use qdmr_core::store::ReferencePolicy;
    use serde_json::Value;

    fn session(policy: ReferencePolicy) -> Session {
        let dataset = QuestionStore::from_questions([(
            "SPIDER_train_1",
            Question::new(
                "How many dogs bark?",
                ["dogs", "bark", "that", "number of", "and", "cats"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        )]);
        let mut session = Session::new(policy);
        session
            .load_question(&QuestionId::parse("SPIDER_train_1").unwrap(), &dataset)
            .unwrap();
        session
    }

    fn options(validation: TokenValidation) -> SessionOptions {
        SessionOptions {
            json: true,
            quiet: false,
            validation,
            prompt: false,
        }
    }

    fn run_json(
        session: &mut Session,
        validation: TokenValidation,
        script: &str,
    ) -> (Outcome, Vec<Value>) {
        let mut out = Vec::new();
        let outcome =
            run_session(session, &options(validation), script.as_bytes(), &mut out).unwrap();
        let events = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (outcome, events)
    }

    fn events_of<'a>(events: &'a [Value], kind: &str) -> Vec<&'a Value> {
        events.iter().filter(|e| e["event"] == kind).collect()
    }

    #[test]
    fn full_flow_submits_code() {
        let mut session = session(ReferencePolicy::Renumber);
        let script = "edit 1 dogs\nadd #1 that bark\nadd number_of #2\ndisplay\nsubmit\nadd ignored\n";
        let (outcome, events) = run_json(&mut session, TokenValidation::Error, script);

        assert_eq!(
            outcome,
            Outcome::Submitted("return dogs ;return #1 that bark ;return number of #2 ".into())
        );
        assert_eq!(events[0]["event"], "loaded");
        assert_eq!(events[0]["text"], "How many dogs bark?");

        let preview = events_of(&events, "preview")[0];
        assert_eq!(preview["steps"][2]["display"], "number of dogs that bark");
        assert_eq!(preview["state"], "previewed");

        let last = events.last().unwrap();
        assert_eq!(last["event"], "submitted");
        assert_eq!(last["question_id"], "SPIDER_train_1");
        assert_eq!(session.store().unwrap().len(), 3);
    }

    #[test]
    fn submit_before_display_is_refused() {
        let mut session = session(ReferencePolicy::Renumber);
        let (outcome, events) =
            run_json(&mut session, TokenValidation::Warn, "edit 1 dogs\nsubmit\n");
        assert_eq!(outcome, Outcome::Quit);
        let errors = events_of(&events, "error");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]["error"].as_str().unwrap().contains("out of date"));
    }

    #[test]
    fn delete_renumbers_references() {
        let mut session = session(ReferencePolicy::Renumber);
        let script = "edit 1 dogs\nadd cats\nadd #2 and #1\ndelete 1\ndisplay\n";
        let (_, events) = run_json(&mut session, TokenValidation::None, script);

        let deleted = events_of(&events, "deleted")[0];
        assert_eq!(deleted["remaining"], 2);

        let preview = events_of(&events, "preview")[0];
        assert_eq!(
            preview["steps"][1]["display"],
            "cats and <ERROR - invalid step reference!>"
        );
        assert_eq!(preview["invalid_steps"], serde_json::json!([2]));
        assert_eq!(session.store().unwrap().steps()[1].text(), "#1 and #0");
    }

    #[test]
    fn preserve_policy_keeps_references() {
        let mut session = session(ReferencePolicy::Preserve);
        let script = "edit 1 dogs\nadd cats\nadd #2 and #1\ndelete 1\n";
        run_json(&mut session, TokenValidation::None, script);
        assert_eq!(session.store().unwrap().steps()[1].text(), "#2 and #1");
    }

    #[test]
    fn error_validation_refuses_unknown_tokens() {
        let mut session = session(ReferencePolicy::Renumber);
        let (_, events) = run_json(&mut session, TokenValidation::Error, "add meow\nedit 1 purr\n");
        assert_eq!(events_of(&events, "error").len(), 2);
        assert!(events_of(&events, "added").is_empty());
        assert_eq!(session.store().unwrap().steps(), &[Step::empty(1)]);
    }

    #[test]
    fn warn_validation_accepts_with_warning() {
        let mut session = session(ReferencePolicy::Renumber);
        let (_, events) = run_json(&mut session, TokenValidation::Warn, "edit 1 meow dogs\n");
        let warnings = events_of(&events, "warning");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0]["message"].as_str().unwrap().contains("meow"));
        assert_eq!(events_of(&events, "updated").len(), 1);
    }

    #[test]
    fn forward_reference_warns_but_is_stored() {
        let mut session = session(ReferencePolicy::Renumber);
        let (_, events) = run_json(&mut session, TokenValidation::Warn, "edit 1 #2 dogs\n");
        let warnings = events_of(&events, "warning");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["step"], 1);
        assert_eq!(session.store().unwrap().steps()[0].text(), "#2 dogs");
    }

    #[test]
    fn structural_errors_leave_store_unchanged() {
        let mut session = session(ReferencePolicy::Renumber);
        let (_, events) = run_json(
            &mut session,
            TokenValidation::None,
            "delete 1\nedit 4 dogs\nclear 0\nfrobnicate\n",
        );
        assert_eq!(events_of(&events, "error").len(), 4);
        assert_eq!(session.store().unwrap().steps(), &[Step::empty(1)]);
    }

    #[test]
    fn show_lists_raw_steps() {
        let mut session = session(ReferencePolicy::Renumber);
        let (_, events) = run_json(&mut session, TokenValidation::None, "add\nedit 2 #1\nshow\n");
        let steps = events_of(&events, "steps")[0];
        assert_eq!(steps["state"], "editing");
        assert_eq!(
            steps["steps"],
            serde_json::json!([{"id": 1, "tokens": null}, {"id": 2, "tokens": ["#1"]}])
        );
    }

    #[test]
    fn quit_stops_reading() {
        let mut session = session(ReferencePolicy::Renumber);
        let (outcome, events) = run_json(&mut session, TokenValidation::None, "quit\nadd dogs\n");
        assert_eq!(outcome, Outcome::Quit);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn human_mode_prints_preview_and_code() {
        let mut session = session(ReferencePolicy::Renumber);
        let options = SessionOptions {
            json: false,
            quiet: true,
            validation: TokenValidation::Warn,
            prompt: false,
        };
        let mut out = Vec::new();
        let outcome = run_session(
            &mut session,
            &options,
            "edit 1 dogs\ndisplay\nsubmit\n".as_bytes(),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(outcome, Outcome::Submitted("return dogs ".into()));
        assert!(text.contains("dogs"));
        assert!(text.contains("return dogs "));
        assert!(!text.contains("Updated step"));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("add"), Ok(Some(Command::Add(None))));
        assert_eq!(
            parse_command("ADD #1 for_each"),
            Ok(Some(Command::Add(Some(vec![
                Token::reference(1),
                Token::literal("for each"),
            ]))))
        );
        assert_eq!(
            parse_command("edit #2 dogs"),
            Ok(Some(Command::Edit(2, vec![Token::literal("dogs")])))
        );
        assert_eq!(parse_command("delete 3"), Ok(Some(Command::Delete(3))));
        assert_eq!(parse_command("preview"), Ok(Some(Command::Display)));
        assert_eq!(parse_command("q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("edit 2").is_err());
        assert!(parse_command("edit").is_err());
        assert!(parse_command("delete two").is_err());
        assert!(parse_command("clear 1 2").is_err());
        assert!(parse_command("undo").is_err());
    }
}
