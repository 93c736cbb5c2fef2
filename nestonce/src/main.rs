use clap::Parser;
use log::info;
use nestonce_lib::nest_once;
use nestonce_lib::nesting::{NestingContext, NestingOptions, StalePolicy};
use std::fs;

#[derive(Parser)]
#[command(name = "nestonce")]
#[command(about = "Flatten nested CSS rules into plain top-level rules")]
struct Args {
    /// Input stylesheet.
    input: String,

    /// Output file. Printed to stdout when omitted.
    output: Option<String>,

    /// Keep rules that end up with no declarations.
    #[arg(long)]
    preserve_empty: bool,

    /// Extra at-rule to bubble out of rules (repeatable).
    #[arg(long = "bubble", value_name = "NAME")]
    bubble: Vec<String>,

    /// Extra at-rule to lift out of rules unchanged (repeatable).
    #[arg(long = "unwrap", value_name = "NAME")]
    unwrap: Vec<String>,

    /// At-rule whose contents escape the parent selector.
    #[arg(long, value_name = "NAME")]
    root_rule_name: Option<String>,

    /// Hand rules removed earlier in the pass to the expander anyway.
    #[arg(long)]
    dispatch_stale: bool,
}

impl Args {
    fn nesting_options(&self) -> NestingOptions {
        let mut options = NestingOptions::default().with_preserve_empty(self.preserve_empty);
        for name in &self.bubble {
            options = options.with_bubble(name);
        }
        for name in &self.unwrap {
            options = options.with_unwrap(name);
        }
        if let Some(name) = &self.root_rule_name {
            options = options.with_root_rule_name(name);
        }
        if self.dispatch_stale {
            options = options.with_stale_policy(StalePolicy::Dispatch);
        }
        options
    }
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();
    let context = NestingContext::new(args.nesting_options()).with_source(&args.input);

    let css_content = match fs::read_to_string(&args.input) {
        Ok(css_content) => css_content,
        Err(e) => {
            eprintln!("Error reading CSS file: {}", e);
            std::process::exit(1);
        }
    };
    info!("read {} bytes from {}", css_content.len(), args.input);

    let flattened = match nest_once::flatten_css(&css_content, &context) {
        Ok(flattened) => flattened,
        Err(e) => {
            eprintln!("Error flattening {}: {}", args.input, e);
            std::process::exit(1);
        }
    };

    match &args.output {
        Some(output) => {
            if let Err(e) = fs::write(output, flattened) {
                eprintln!("Error writing {}: {}", output, e);
                std::process::exit(1);
            }
        }
        None => print!("{}", flattened),
    }
}
