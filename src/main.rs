use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdgraph::args::{Arg, ArgOpts};
use cmdgraph::completion::SimpleCompleter;
use cmdgraph::core::{serial, ExecutorProcessor, GraphNode};
use cmdgraph::flags::{flag, BoolFlag, FlagProcessor};
use cmdgraph::input::Count;
use cmdgraph::shell::Shell;

#[derive(Parser)]
#[command(name = "cmdgraph")]
#[command(about = "Demo driver for the cmdgraph processor-graph engine")]
#[command(version)]
struct Cli {
    /// Complete instead of executing; the value is the raw COMP_LINE
    #[arg(long = "complete")]
    complete: Option<String>,

    /// Print the demo command's usage text
    #[arg(long = "usage")]
    usage: bool,

    /// Output results as JSON (stdout, stderr, evalLines, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Arguments forwarded to the demo command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// A small greeting command exercising flags, typed args, and completion.
fn demo_graph() -> Arc<dyn GraphNode> {
    let flags = FlagProcessor::new(vec![
        BoolFlag::new("shout", Some('s'), "print in caps"),
        flag::<i64>("times", Some('t'), "repeat count", ArgOpts::new().default_value(1)),
    ]);
    let name = Arg::<String>::new(
        "name",
        "who to greet",
        ArgOpts::new().completer(SimpleCompleter::new(["world", "friend", "stranger"])),
    );
    let titles = Arg::<Vec<String>>::list("titles", "their titles", 0, Count::Unbounded, ArgOpts::new());
    let greet = ExecutorProcessor::new(|output, data| {
        let mut words = data.string_list("titles").unwrap_or_default();
        words.insert(0, data.string("name").unwrap_or_default());
        let mut line = format!("hello {}", words.join(" "));
        if data.bool("shout").unwrap_or(false) {
            line = line.to_uppercase();
        }
        for _ in 0..data.int("times").unwrap_or(1).max(1) {
            output.stdoutln(&line);
        }
        Ok(())
    });
    serial(vec![flags.arc(), name.arc(), titles.arc(), Arc::new(greet)])
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shell = Shell::new("cmdgraph", demo_graph());

    if let Some(comp_line) = cli.complete {
        for suggestion in shell.autocomplete(&comp_line).await {
            println!("{}", suggestion);
        }
        return;
    }

    if cli.usage {
        match shell.usage() {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let result = shell.execute(cli.args).await;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.stdout,
                "stderr": result.stderr,
                "evalLines": result.eval_lines,
                "functionWrap": result.function_wrap,
                "exitCode": result.exit_code,
            })
        );
    } else {
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
        for line in &result.eval_lines {
            println!("{}", line);
        }
    }

    std::process::exit(result.exit_code);
}
