use bfi::cli_util::{STEP_TABLE_HEADER, format_step_row, print_interpreter_error};
use bfi::config::{Overrides, Settings, parse_eof};
use bfi::{EofPolicy, ExitStatus, Interpreter, Program};
use clap::Parser;
use std::env;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] <FILE>   # Run the Brainfuck program stored in FILE

Options:
  --eof <zero|unchanged>  What `,` stores at end of input (fallback BF_EOF; default zero)
  --strict, -s            Reject unbalanced brackets before running (fallback BF_STRICT)
  --debug,  -d            Print a step-by-step table of operations to stderr
  --help,   -h            Show this help

Notes:
- Programs are limited to {1} bytes and end at the first NUL byte.
- Bytes other than ><+-.,[] are ignored.
- Settings may also be given in bf.toml under [interpreter] in the XDG config home.
"#,
        program,
        bfi::MAX_CODESIZE,
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// What `,` stores at end of input
    #[arg(long = "eof", value_name = "POLICY", value_parser = eof_arg)]
    eof: Option<EofPolicy>,

    /// Reject unbalanced brackets before running
    #[arg(short = 's', long = "strict")]
    strict: bool,

    /// Print a step-by-step table of operations to stderr
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Path to the program file
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

fn eof_arg(value: &str) -> Result<EofPolicy, String> {
    parse_eof(value).ok_or_else(|| format!("expected `zero` or `unchanged`, got `{value}`"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bfi=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// First Ctrl+C asks the interpreter to stop; a second one exits at once
/// (the run may be blocked reading stdin).
fn install_interrupt_handler(flag: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::Relaxed) {
            let _ = io::stderr().flush();
            std::process::exit(ExitStatus::Interrupted.code());
        }
    }) {
        warn!("failed to set ctrl+c handler: {e}");
    }
}

fn run_file(program: &str, path: PathBuf, cli: &Cli) -> ExitStatus {
    let settings = Settings::resolve(Overrides {
        eof: cli.eof,
        strict: cli.strict.then_some(true),
    });

    let code = match Program::from_file(&path) {
        Ok(code) => code,
        Err(err) => {
            print_interpreter_error(Some(program), &[], &err);
            return ExitStatus::from(&err);
        }
    };

    if settings.strict {
        if let Err(err) = code.check_brackets() {
            print_interpreter_error(Some(program), code.instructions(), &err);
            return ExitStatus::from(&err);
        }
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(interrupt.clone());

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    let mut bf = Interpreter::new(stdin, stdout);
    bf.set_eof_policy(settings.eof);
    bf.set_interrupt(interrupt);

    if cli.debug {
        eprintln!("{STEP_TABLE_HEADER}");
        bf.set_step_observer(|step| eprintln!("{}", format_step_row(step)));
    }

    let result = bf.run(&code);
    if let Err(err) = &result {
        print_interpreter_error(Some(program), code.instructions(), err);
    }
    ExitStatus::from(&result)
}

fn main() {
    init_tracing();

    // argv[0] prefixes every message and the usage text
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let rendered = e.to_string();
            eprintln!("{program}: {}", rendered.lines().next().unwrap_or_default());
            usage_and_exit(&program, ExitStatus::Usage.code());
        }
    };

    if cli.help {
        usage_and_exit(&program, 0);
    }

    let Some(path) = cli.file.clone() else {
        usage_and_exit(&program, ExitStatus::Usage.code());
    };

    let status = run_file(&program, path, &cli);
    std::process::exit(status.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_positional_file_is_accepted() {
        let cli = Cli::try_parse_from(["bf", "--eof", "unchanged", "-d", "prog.b"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("prog.b")));
        assert_eq!(cli.eof, Some(EofPolicy::Unchanged));
        assert!(cli.debug);
        assert!(!cli.strict);
    }

    #[test]
    fn extra_positional_is_rejected() {
        assert!(Cli::try_parse_from(["bf", "a.b", "b.b"]).is_err());
    }

    #[test]
    fn unknown_eof_policy_is_rejected() {
        assert!(Cli::try_parse_from(["bf", "--eof", "minus-one", "a.b"]).is_err());
    }
}
