//! kiln's main application entry point.
//! Handles command-line argument parsing and drives one generator run.

use kiln::{
    cli::{get_args, Args},
    config::{find_config, load_config},
    error::{default_error_handler, Result},
    logger::init_logger,
    parser::{get_answers, load_from_stdin, select_generator},
    processor::Processor,
    prompt::DialoguerPrompter,
    registry::Registry,
    renderer::MiniJinjaRenderer,
};
use serde_json::Value;

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose, args.quiet);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn list_generators(registry: &Registry) {
    for (id, generator) in registry.generators() {
        if generator.description.is_empty() {
            println!("{id}");
        } else {
            println!("{id}\t{}", generator.description);
        }
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Locates and loads the configuration file
/// 2. Selects the generator
/// 3. Collects answers from stdin and prompts
/// 4. Runs the generator's operations against the destination
fn run(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => find_config(std::env::current_dir()?)?,
    };
    let registry = load_config(&config_path)?;

    if args.list {
        list_generators(&registry);
        return Ok(());
    }

    let engine = MiniJinjaRenderer::with_partials(registry.partials())?;
    let prompt = DialoguerPrompter::new();

    let generator_id = select_generator(&registry, &prompt, args.generator.as_deref())?;
    let preloaded_answers = if args.stdin { load_from_stdin()? } else { Value::Null };

    let questions = registry
        .generator(&generator_id)
        .map(|generator| generator.prompts.clone())
        .unwrap_or_default();
    let answers = get_answers(&engine, &prompt, &questions, &preloaded_answers)?;

    let processor = Processor::new(&registry, &engine, &args.dest, &config_path).with_force(args.force);
    let summary = processor.run_generator(&generator_id, &answers)?;

    if summary.failed > 0 {
        log::warn!("'{generator_id}' finished with {} failed operations.", summary.failed);
    }
    processor.logger().success(format!(
        "Generator '{generator_id}' completed successfully in {}.",
        processor.destination().display()
    ));
    Ok(())
}
