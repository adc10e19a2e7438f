//! REPL for arithmetic expressions.

use rustyline::{error::ReadlineError, DefaultEditor};

use crate::common::{Env, ANSWER_VAR};

/// Command entered in the REPL.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Help,
    Vars,
    Clear,
    Set { name: &'a str, code: &'a str },
    Eval(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Result<Self, &'static str> {
        let trimmed = line.trim();
        if !trimmed.starts_with('.') {
            return Ok(Self::Eval(line));
        }

        let (command, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let rest = rest.trim_start();
        match (command, rest.is_empty()) {
            (".help", true) => Ok(Self::Help),
            (".vars", true) => Ok(Self::Vars),
            (".clear", true) => Ok(Self::Clear),
            (".set", false) => {
                let (name, code) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("`.set` expects a variable name and an expression")?;
                if !is_identifier(name) {
                    return Err("Invalid variable name");
                }
                Ok(Self::Set { name, code })
            }
            (".set", true) => Err("`.set` expects a variable name and an expression"),
            (".help" | ".vars" | ".clear", false) => Err("Command does not accept arguments"),
            _ => Err("Unknown command"),
        }
    }
}

/// Checks that `name` can be referenced from expressions, i.e., is lexed as an identifier.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, |ch| ch.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn execute(env: &mut Env, line: &str) -> anyhow::Result<()> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(message) => {
            env.report_command_error(line, message)?;
            return Ok(());
        }
    };
    log::trace!("executing {command:?}");

    match command {
        Command::Help => env.print_help()?,
        Command::Vars => env.dump_scope()?,
        Command::Clear => {
            let scope = env.scope_mut();
            let names: Vec<_> = scope.local_names().map(str::to_owned).collect();
            for name in &names {
                scope.remove(name);
            }
        }
        Command::Set { name, code } => {
            if let Some(value) = env.evaluate(code)? {
                if let Err(err) = env.scope_mut().create_with_value(name, value) {
                    env.report_scope_error(&err)?;
                }
            }
        }
        Command::Eval(code) => {
            if let Some(value) = env.parse_and_eval(code)? {
                if let Err(err) = env.scope_mut().create_with_value(ANSWER_VAR, value) {
                    env.report_scope_error(&err)?;
                }
            }
        }
    }
    Ok(())
}

pub fn repl(mut env: Env) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    env.print_greeting()?;

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                execute(&mut env, &line)?;
            }

            Err(ReadlineError::Interrupted) => {
                println!("Bye");
                break Ok(());
            }

            Err(ReadlineError::Eof) => {
                break Ok(());
            }

            Err(err) => break Err(err.into()),
        }
    }
}
