//! Thin CLI harness around the interpreter core (SPEC_FULL §A): reads
//! a pre-built AST as JSON (parsing is out of scope for this crate)
//! and runs it. Mirrors the teacher's `src/bin/why.rs` shape — one
//! flat `Cli` struct, `simple_logger` initialized from a verbosity
//! flag, a nonzero exit on any diagnostic.
use cb::ast::Ast;
use cb::runtime::Runtime;
use clap::Parser;
use log::error;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON-encoded `Ast` to run.
    #[arg(short, long)]
    file: std::path::PathBuf,

    /// Function to invoke as the root task.
    #[arg(short, long, default_value = "main")]
    entry: String,

    /// Raise the scheduler's log target to `trace` (SPEC_FULL §B).
    #[arg(long)]
    trace_scheduler: bool,
}

fn main() {
    let args = Cli::parse();
    let level = if args.trace_scheduler { log::Level::Trace } else { log::Level::Warn };
    simple_logger::init_with_level(level).expect("logger already initialized");

    let file_content = match std::fs::read_to_string(&args.file) {
        Ok(content) => content,
        Err(e) => {
            error!("could not read file '{}': {e}", args.file.display());
            std::process::exit(1);
        }
    };

    let ast: Ast = match serde_json::from_str(&file_content) {
        Ok(ast) => ast,
        Err(e) => {
            error!("could not parse '{}' as a Cb AST: {e}", args.file.display());
            std::process::exit(1);
        }
    };

    let mut runtime = Runtime::new();
    if let Err(e) = runtime.load(&ast) {
        error!("{e}");
        std::process::exit(1);
    }

    match runtime.run(&args.entry, vec![]) {
        Ok(_) => print!("{}", runtime.output()),
        Err(e) => {
            print!("{}", runtime.output());
            error!("{e}");
            std::process::exit(1);
        }
    }
}
