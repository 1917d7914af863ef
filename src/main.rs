use std::io::{self, Write};
use std::process;

use stackvm::config::{Config, Selection, EXIT_USAGE};
use stackvm::report::{Report, EXIT_FAULT};
use stackvm::{run_program, Strategy};

/// One run's output and report, for comparing strategies.
struct Outcome {
  strategy : Strategy,
  output   : Vec<u8>,
  report   : Report,
}

fn run(config: &Config) -> Result<i32, Box<dyn std::error::Error>> {
  let program = config.program.load()?;

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let stdout = io::stdout();
  let mut stdout = stdout.lock();

  if let Selection::Single(strategy) = config.selection {
    let report = run_program(&program, strategy, config.step_limit, &mut stdout)?;
    writeln!(stdout, "{}", report)?;
    return Ok(report.exit_code());
  }

  let mut outcomes: Vec<Outcome> = Vec::new();
  for strategy in config.selection.strategies() {
    let mut output: Vec<u8> = Vec::new();
    let report = run_program(&program, strategy, config.step_limit, &mut output)?;
    outcomes.push(Outcome{ strategy, output, report });
  }

  let mut exit_code = 0;
  if let Some(first) = outcomes.first() {
    stdout.write_all(&first.output)?;
    writeln!(stdout, "{}", first.report)?;
    exit_code = first.report.exit_code();

    for other in &outcomes[1..] {
      if other.output != first.output || other.report != first.report {
        eprintln!(
          "{} and {} disagree on {}:\n{}\n{}",
          first.strategy, other.strategy, config.program, first.report, other.report
        );
        exit_code = EXIT_FAULT;
      }
    }
  }
  Ok(exit_code)
}

fn main() {
  let config = match Config::from_args(std::env::args().skip(1)) {
    Ok(config) => config,
    Err(error) => {
      eprintln!("{}", error);
      process::exit(EXIT_USAGE);
    }
  };

  match run(&config) {
    Ok(code) => process::exit(code),
    Err(error) => {
      eprintln!("{}", error);
      process::exit(EXIT_USAGE);
    }
  }
}
