//! Common utils.

use codespan::{FileId, Files};
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor},
    term::{emit, Config as ReportingConfig},
};

use std::io::{self, Write};

use arithmetic_expr::{
    error::{ErrorCategory, EvalError, ParseErrors, ScopeError},
    ParsedExpression, Parser, Scope,
};

/// Exit code on parse or evaluation error.
pub const ERROR_EXIT_CODE: i32 = 2;

/// Name of the variable holding the last evaluated value in the REPL.
pub const ANSWER_VAR: &str = "ans";

/// Parsing and evaluation environment that reports errors to stderr.
pub struct Env {
    parser: Parser<'static>,
    scope: Scope<'static>,
    files: Files<String>,
    snippet_count: usize,
    writer: StandardStream,
    config: ReportingConfig,
}

impl Env {
    pub fn new(parser: Parser<'static>, scope: Scope<'static>, color_choice: ColorChoice) -> Self {
        Self {
            parser,
            scope,
            files: Files::new(),
            snippet_count: 0,
            writer: StandardStream::stderr(color_choice),
            config: ReportingConfig::default(),
        }
    }

    pub fn scope_mut(&mut self) -> &mut Scope<'static> {
        &mut self.scope
    }

    pub fn print_greeting(&mut self) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(writer, "arithmetic-expr REPL v{}", env!("CARGO_PKG_VERSION"))?;
        writer.reset()?;
        writeln!(writer, "{}", env!("CARGO_PKG_DESCRIPTION"))?;
        writeln!(writer, "Use `.help` to list available commands.")
    }

    pub fn print_help(&mut self) -> io::Result<()> {
        const COMMANDS: &[(&str, &str)] = &[
            (".help", "Print this help"),
            (".vars", "List variables visible in the session"),
            (".set <name> <expr>", "Evaluate the expression and bind its value to a variable"),
            (".clear", "Remove all variables defined in the session"),
        ];

        let mut writer = self.writer.lock();
        for &(command, description) in COMMANDS {
            writer.set_color(ColorSpec::new().set_bold(true))?;
            write!(writer, "{command:<20}")?;
            writer.reset()?;
            writeln!(writer, "{description}")?;
        }
        writeln!(
            writer,
            "Any other input is evaluated; its value is stored in the `{ANSWER_VAR}` variable."
        )
    }

    pub fn dump_scope(&mut self) -> io::Result<()> {
        let mut variables: Vec<_> = self.scope.variables().collect();
        variables.sort_unstable_by(|lhs, rhs| lhs.name().cmp(rhs.name()));

        let num_color = ColorSpec::new().set_fg(Some(Color::Green)).clone();
        let mut writer = self.writer.lock();
        for variable in variables {
            write!(writer, "{} = ", variable.name())?;
            writer.set_color(&num_color)?;
            write!(writer, "{}", variable.value())?;
            writer.reset()?;
            if variable.is_constant() {
                write!(writer, " (const)")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn emit(&mut self, diagnostic: &Diagnostic<FileId>) -> io::Result<()> {
        emit(&mut self.writer.lock(), &self.config, &self.files, diagnostic)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
    }

    fn add_snippet(&mut self, code: &str) -> FileId {
        self.snippet_count += 1;
        let file_name = format!("Snip #{}", self.snippet_count);
        self.files.add(file_name, code.to_owned())
    }

    /// Reports all parsing errors for a snippet.
    pub fn report_parse_errors(&mut self, file: FileId, errors: &ParseErrors) -> io::Result<()> {
        for err in errors {
            let start = err.span().location_offset();
            let range = start..(start + err.snippet().len());
            let code = match err.kind().category() {
                ErrorCategory::Lexical => "LEX",
                ErrorCategory::Syntax => "PARSE",
            };
            let label = Label::primary(file, range).with_message("Error occurred here");
            let diagnostic = Diagnostic::error()
                .with_message(err.kind().to_string())
                .with_code(code)
                .with_labels(vec![label]);
            self.emit(&diagnostic)?;
        }
        Ok(())
    }

    /// Reports an evaluation error. The entire snippet is highlighted since evaluation errors
    /// are not attached to spans.
    pub fn report_eval_error(&mut self, file: FileId, code: &str, err: &EvalError) -> io::Result<()> {
        let range = trimmed_range(code);
        let label = Label::primary(file, range).with_message("Error occurred evaluating this");
        let mut diagnostic = Diagnostic::error()
            .with_message(err.to_string())
            .with_code("EVAL")
            .with_labels(vec![label]);

        if let EvalError::MissingVariables(names) = err {
            let note = match names.as_slice() {
                [name] => format!("Bind the variable with `-v {name}=<value>`"),
                _ => "Bind variables with `-v <name>=<value>`".to_owned(),
            };
            diagnostic = diagnostic.with_notes(vec![note]);
        }
        self.emit(&diagnostic)
    }

    /// Reports an invalid REPL command.
    pub fn report_command_error(&mut self, line: &str, message: &str) -> io::Result<()> {
        let file = self.add_snippet(line);
        let label = Label::primary(file, trimmed_range(line))
            .with_message("Use `.help` to find out commands");
        let diagnostic = Diagnostic::error()
            .with_message(message)
            .with_code("CMD")
            .with_labels(vec![label]);
        self.emit(&diagnostic)
    }

    /// Reports an error assigning a variable.
    pub fn report_scope_error(&mut self, err: &ScopeError) -> io::Result<()> {
        let diagnostic = Diagnostic::error()
            .with_message(err.to_string())
            .with_code("SCOPE");
        self.emit(&diagnostic)
    }

    fn parse_snippet(&mut self, code: &str) -> io::Result<(FileId, Option<ParsedExpression>)> {
        let file = self.add_snippet(code);
        match self.parser.parse(code) {
            Ok(expr) => {
                log::debug!(
                    "parsed snippet with variables {:?}: {expr}",
                    expr.variable_names()
                );
                Ok((file, Some(expr)))
            }
            Err(errors) => {
                log::debug!("snippet has {} parsing error(s)", errors.len());
                self.report_parse_errors(file, &errors)?;
                Ok((file, None))
            }
        }
    }

    /// Parses a snippet, reporting errors if any.
    pub fn parse(&mut self, code: &str) -> io::Result<Option<ParsedExpression>> {
        Ok(self.parse_snippet(code)?.1)
    }

    /// Parses and evaluates a snippet without printing the result.
    pub fn evaluate(&mut self, code: &str) -> io::Result<Option<f64>> {
        let (file, expr) = self.parse_snippet(code)?;
        let Some(expr) = expr else {
            return Ok(None);
        };
        match expr.evaluate(&self.scope) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.report_eval_error(file, code, &err)?;
                Ok(None)
            }
        }
    }

    /// Parses and evaluates a snippet, printing the result to stdout.
    pub fn parse_and_eval(&mut self, code: &str) -> io::Result<Option<f64>> {
        let value = self.evaluate(code)?;
        if let Some(value) = value {
            println!("{value}");
        }
        Ok(value)
    }
}

fn trimmed_range(code: &str) -> std::ops::Range<usize> {
    let start = code.len() - code.trim_start().len();
    let end = code.trim_end().len().max(start);
    start..end
}
