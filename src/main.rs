use std::io::{self, BufReader, Read};
use std::rc::Rc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use embed_bash::ast::json::to_json_string;
use embed_bash::interpreter::{empty_input, in_stream, out_stream, InStream};
use embed_bash::{parse, Session, Shell, ShellOptions, Status, MAX_DEPTH};

#[derive(Parser)]
#[command(name = "embed-bash")]
#[command(about = "Run scripts with an embeddable Bash-like interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Print the parsed tree as JSON instead of running it
    #[arg(long = "json")]
    json: bool,

    /// Bound on nested eval and function calls
    #[arg(long = "max-depth", default_value_t = MAX_DEPTH)]
    max_depth: usize,

    /// Stop a block at the first command that is not found
    #[arg(long = "stop-on-not-found")]
    stop_on_not_found: bool,

    /// Script file to execute (stdin when absent)
    #[arg()]
    script_file: Option<String>,

    /// Positional arguments, available as $1..$n
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn read_script(cli: &Cli) -> io::Result<(String, String)> {
    if let Some(script) = &cli.script {
        return Ok(("embed-bash".to_string(), script.clone()));
    }
    if let Some(file) = &cli.script_file {
        return Ok((file.clone(), std::fs::read_to_string(file)?));
    }
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;
    Ok(("embed-bash".to_string(), source))
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (name, source) = match read_script(&cli) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("embed-bash: cannot read script: {}", e);
            std::process::exit(i32::from(Status::ERROR));
        }
    };

    if cli.json {
        let tree = match parse(&source) {
            Ok(tree) => tree,
            Err(e) => {
                eprint!("{}", e);
                std::process::exit(i32::from(e.status()));
            }
        };
        match to_json_string(&tree) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("embed-bash: cannot serialize tree: {}", e);
                std::process::exit(i32::from(Status::ERROR));
            }
        }
        return;
    }

    let shell = Shell::with_defaults().with_options(ShellOptions {
        max_depth: cli.max_depth,
        stop_on_command_not_found: cli.stop_on_not_found,
    });

    // The script itself came from stdin, so commands see end of file.
    let input: InStream = if cli.script.is_some() || cli.script_file.is_some() {
        in_stream(BufReader::new(io::stdin()))
    } else {
        empty_input()
    };

    // With -c there is no script file, so the first positional is $1.
    let mut args = vec![name];
    if cli.script.is_some() {
        args.extend(cli.script_file.iter().cloned());
    }
    args.extend(cli.args.iter().cloned());
    let mut session = Session::new(Rc::new(shell), input, out_stream(io::stdout()), out_stream(io::stderr()))
        .with_args(args)
        .with_env(std::env::vars());

    let status = Shell::run(&source, &mut session);

    for stream in [session.output(), session.error()] {
        if let Err(e) = stream.borrow_mut().flush() {
            warn!(error = %e, "flush failed");
        }
    }
    std::process::exit(i32::from(status));
}
