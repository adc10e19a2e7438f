//! Simple CLI / REPL for evaluating arithmetic expressions.

use anyhow::format_err;
use clap::{Parser as _, ValueEnum};
use codespan_reporting::term::termcolor::ColorChoice;
use is_terminal::IsTerminal;

use std::{
    io::{self, Read},
    process,
    str::FromStr,
};

use arithmetic_expr::{Features, Parser, Scope};

mod common;
mod repl;

use crate::{
    common::{Env, ERROR_EXIT_CODE},
    repl::repl,
};

const ABOUT: &str = "CLI and REPL for parsing and evaluating arithmetic expressions.";

const AFTER_HELP: &str = "\
EXIT CODES:
    0    Normal exit
    1    Invalid command-line option
    2    Parsing or evaluation error in non-interactive mode

Set the `RUST_LOG` env variable (e.g., `RUST_LOG=debug`) to output diagnostic logs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorPreference {
    /// Use colors if the error stream is a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorPreference {
    fn choice(self) -> ColorChoice {
        match self {
            Self::Auto if io::stderr().is_terminal() => ColorChoice::Auto,
            Self::Auto | Self::Never => ColorChoice::Never,
            Self::Always => ColorChoice::Always,
        }
    }
}

/// Variable binding specified on the command line, such as `x=1.5`.
#[derive(Debug, Clone)]
struct VarBinding {
    name: String,
    value: String,
}

impl FromStr for VarBinding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format_err!("Invalid binding; use `name=value` format"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format_err!("Variable name is empty"));
        }
        Ok(Self {
            name: name.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

#[derive(Debug, clap::Parser)]
#[command(version, about = ABOUT, after_help = AFTER_HELP)]
enum Args {
    /// Parse the input and output the simplified expression tree.
    Ast(AstArgs),
    /// Evaluate the input.
    Eval(EvalArgs),
}

/// Options shared by all subcommands.
#[derive(Debug, clap::Args)]
struct CommonArgs {
    /// Do not fold constant subexpressions after parsing.
    #[arg(long)]
    no_fold: bool,
    /// Maximum nesting depth of grammar rules.
    #[arg(long, default_value_t = 512)]
    max_depth: usize,
    /// Whether to use colors in diagnostics.
    #[arg(long, value_enum, default_value_t = ColorPreference::Auto, env = "ARITHMETIC_EXPR_COLOR")]
    color: ColorPreference,
}

impl CommonArgs {
    fn parser(&self) -> Parser<'static> {
        let mut features = Features::all();
        features.set(Features::FOLD_CONSTANTS, !self.no_fold);
        Parser::new()
            .with_features(features)
            .max_depth(self.max_depth)
    }
}

#[derive(Debug, clap::Args)]
struct AstArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Output the tree in the debug format instead of the compact one.
    #[arg(long)]
    debug: bool,
    /// Command to interpret. If omitted, the command will be read from stdin.
    command: Option<String>,
}

#[derive(Debug, clap::Args)]
struct EvalArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Launch the REPL for arithmetic expressions.
    #[arg(long, short = 'i')]
    interactive: bool,
    /// Variable binding in the `name=value` format. Can be specified multiple times.
    #[arg(long = "var", short = 'v', value_name = "NAME=VALUE")]
    vars: Vec<VarBinding>,
    /// Treat all variables without a binding as optional.
    #[arg(long)]
    optional: bool,
    /// Value substituted for optional variables without a binding.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    default: f64,
    /// Command to interpret. If omitted, the command will be read from stdin.
    #[arg(conflicts_with = "interactive")]
    command: Option<String>,
}

fn read_command(command: Option<String>) -> io::Result<String> {
    if let Some(command) = command {
        Ok(command)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

impl Args {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Ast(args) => args.run(),
            Self::Eval(args) => args.run(),
        }
    }
}

impl AstArgs {
    fn run(self) -> anyhow::Result<()> {
        let command = read_command(self.command)?;
        let parser = self.common.parser();
        let mut env = Env::new(parser, Scope::new(), self.common.color.choice());

        if let Some(expr) = env.parse(&command)? {
            if self.debug {
                println!("{:#?}", expr.root());
            } else {
                println!("{expr}");
            }
            Ok(())
        } else {
            process::exit(ERROR_EXIT_CODE);
        }
    }
}

impl EvalArgs {
    fn run(self) -> anyhow::Result<()> {
        let parser = self
            .common
            .parser()
            .optional_by_default(self.optional)
            .default_value(self.default);
        let color_choice = self.common.color.choice();

        let mut scope = Scope::new();
        for binding in &self.vars {
            scope
                .create_with_value(&binding.name, binding.value.as_str())
                .map_err(|err| format_err!("Invalid binding for `{}`: {err}", binding.name))?;
        }
        log::debug!("bound {} variable(s) from command line", self.vars.len());

        let mut env = Env::new(parser, scope, color_choice);
        if self.interactive {
            return repl(env);
        }

        let command = read_command(self.command)?;
        if env.parse_and_eval(&command)?.is_some() {
            Ok(())
        } else {
            process::exit(ERROR_EXIT_CODE);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::try_parse().unwrap_or_else(|err| {
        let exit_code = if err.use_stderr() { 1 } else { 0 };
        err.print().ok();
        process::exit(exit_code);
    });
    args.run()
}
