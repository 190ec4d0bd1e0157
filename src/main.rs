//! shellbox CLI: run a script file or a -c command string against a
//! fresh sandbox and print the captured output.

use std::process::ExitCode;

use clap::Parser;

use shellbox::{Shell, ShellOptions};

#[derive(Parser)]
#[command(name = "shellbox", about = "Run bash scripts in a hermetic sandbox")]
struct Cli {
    /// Script file to execute
    script: Option<String>,

    /// Command string to execute
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// Enable the network hook for curl
    #[arg(long)]
    allow_network: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match (&cli.command, &cli.script) {
        (Some(command), _) => command.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("shellbox: {}: {}", path, e);
                return ExitCode::from(127);
            }
        },
        (None, None) => {
            eprintln!("usage: shellbox <script> | shellbox -c 'command'");
            return ExitCode::from(2);
        }
    };

    let mut shell = Shell::new(ShellOptions {
        network: shellbox::NetworkConfig { enabled: cli.allow_network },
        ..Default::default()
    })
    .await;

    let result = shell.exec(&source).await;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    ExitCode::from(result.exit_code.rem_euclid(256) as u8)
}
