//! OS simulator CLI.
//!
//! This binary wraps the simulator core in a small command shell. It performs:
//! 1. **Script run:** execute a file of shell commands, one per line.
//! 2. **Interactive shell:** read the same commands from stdin.
//! 3. **Clock pumping:** after each command the clock runs until the
//!    scheduler goes idle (disable with `--manual-clock` and drive `step`).

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use osim_core::common::error::KernelError;
use osim_core::config::{Config, ScheduleAlgorithm};
use osim_core::kernel::Kernel;
use osim_core::kernel::console::StdoutConsole;

/// Safety bound on automatic clock pumping: no realistic workload on this
/// machine needs more pulses than this to drain.
const MAX_AUTO_PULSES: u64 = 1_000_000;

#[derive(Parser, Debug)]
#[command(
    name = "osim",
    author,
    version,
    about = "Pedagogical operating-system simulator",
    long_about = "Run a command script or an interactive shell against the simulated machine.\n\n\
        Commands: load <file> [priority], run <pid>, runall, ps, kill <pid>, killall,\n\
        clearmem, quantum <n>, getschedule, setschedule <alg>, format [-quick],\n\
        create/read/write/delete/copy/rename/ls [-a], step [n], stats, quit.\n\n\
        Examples:\n  osim demo.osh\n  osim --config machine.json\n  echo 'format' | osim"
)]
struct Cli {
    /// Command script to execute before (or instead of) the interactive shell.
    script: Option<PathBuf>,

    /// Machine configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not pump the clock automatically; use the `step` command.
    #[arg(long)]
    manual_clock: bool,

    /// Stay in the interactive shell after running a script.
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match fs::read_to_string(path).map_err(|e| e.to_string()).and_then(
            |text| serde_json::from_str::<Config>(&text).map_err(|e| e.to_string()),
        ) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("osim: bad config {}: {err}", path.display());
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let mut shell = Shell {
        kernel: Kernel::new(&config, Box::new(StdoutConsole::new())),
        auto_clock: !cli.manual_clock,
        done: false,
    };

    if let Some(script) = cli.script.as_deref() {
        let text = match fs::read_to_string(script) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("osim: cannot read {}: {err}", script.display());
                process::exit(1);
            }
        };
        for line in text.lines() {
            shell.execute(line);
            if shell.done {
                return;
            }
        }
        if !cli.interactive {
            return;
        }
    }

    let stdin = io::stdin();
    loop {
        print!("osim> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => shell.execute(&line),
        }
        if shell.done {
            return;
        }
    }
}

/// Shell state: the kernel plus clock mode.
struct Shell {
    kernel: Kernel,
    auto_clock: bool,
    done: bool,
}

impl Shell {
    /// Parses and executes one command line.
    fn execute(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return;
        };
        let args: Vec<&str> = parts.collect();

        if let Err(err) = self.dispatch(command, &args) {
            println!("{err}");
        }
        if self.auto_clock {
            let _ = self.kernel.run_until_idle(MAX_AUTO_PULSES);
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<(), KernelError> {
        match command {
            "load" => {
                let path = args
                    .first()
                    .ok_or_else(|| invalid("usage: load <file> [priority]"))?;
                let priority = match args.get(1) {
                    Some(p) => Some(
                        p.parse::<u8>()
                            .map_err(|_| invalid("priority must be 0-255"))?,
                    ),
                    None => None,
                };
                let source = fs::read_to_string(path)
                    .map_err(|e| invalid(&format!("cannot read {path}: {e}")))?;
                let pid = self.kernel.load(&source, priority)?;
                println!("loaded process {pid}");
            }
            "run" => {
                let pid = parse_pid(args.first().copied())?;
                self.kernel.run(pid)?;
            }
            "runall" => {
                let pids = self.kernel.run_all();
                println!("enqueued {} process(es)", pids.len());
            }
            "ps" => {
                for row in self.kernel.ps() {
                    println!(
                        "{:>4}  {:<10}  {:<3}  prio {:>3}  pc {:#06X}",
                        row.pid, row.state, row.location, row.priority, row.pc
                    );
                }
            }
            "kill" => {
                let pid = parse_pid(args.first().copied())?;
                self.kernel.kill(pid)?;
            }
            "killall" => self.kernel.kill_all(),
            "clearmem" => self.kernel.clear_mem()?,
            "quantum" => {
                let n = args
                    .first()
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(|| invalid("usage: quantum <n>"))?;
                self.kernel.set_quantum(n)?;
            }
            "getschedule" => println!("{}", self.kernel.schedule()),
            "setschedule" => {
                let name = args.join(" ");
                let algorithm = name
                    .parse::<ScheduleAlgorithm>()
                    .map_err(|e| invalid(&e))?;
                self.kernel.set_schedule(algorithm);
            }
            "format" => self.kernel.format(args.first() == Some(&"-quick"))?,
            "create" => self.kernel.create_file(one_arg(args, "create <file>")?)?,
            "read" => {
                let contents = self.kernel.read_file(one_arg(args, "read <file>")?)?;
                println!("{contents}");
            }
            "write" => {
                let name = args
                    .first()
                    .ok_or_else(|| invalid("usage: write <file> <text>"))?;
                let data = args[1..].join(" ");
                self.kernel.write_file(name, &data)?;
            }
            "delete" => self.kernel.delete_file(one_arg(args, "delete <file>")?)?,
            "copy" => {
                let (a, b) = two_args(args, "copy <existing> <new>")?;
                self.kernel.copy_file(a, b)?;
            }
            "rename" => {
                let (a, b) = two_args(args, "rename <old> <new>")?;
                self.kernel.rename_file(a, b)?;
            }
            "ls" => {
                for name in self.kernel.list_files(args.first() == Some(&"-a"))? {
                    println!("{name}");
                }
            }
            "step" => {
                let n = args
                    .first()
                    .and_then(|a| a.parse::<u64>().ok())
                    .unwrap_or(1);
                for _ in 0..n {
                    let _ = self.kernel.pulse();
                }
            }
            "stats" => println!("{}", self.kernel.stats().report()),
            "quit" | "exit" => self.done = true,
            other => return Err(invalid(&format!("unknown command: {other}"))),
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> KernelError {
    KernelError::InvalidArgument(msg.to_string())
}

fn parse_pid(arg: Option<&str>) -> Result<u32, KernelError> {
    arg.and_then(|a| a.parse::<u32>().ok())
        .ok_or_else(|| invalid("expected a process id"))
}

fn one_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, KernelError> {
    args.first()
        .copied()
        .ok_or_else(|| invalid(&format!("usage: {usage}")))
}

fn two_args<'a>(args: &[&'a str], usage: &str) -> Result<(&'a str, &'a str), KernelError> {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(invalid(&format!("usage: {usage}"))),
    }
}
