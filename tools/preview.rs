/// Preview: generate variations of a template from the command line.
///
/// Usage: preview --template <file> --catalog <catalog.ron|.json> [--catalog <more>]
///                [--context <ctx.ron>] [--config <cfg.ron>] [--seed <s>]
///                [--count <n>] [--verbose]

use encounter_forge::core::context::GenerationContext;
use encounter_forge::core::generator::TemplateEngine;
use encounter_forge::schema::catalog::{CatalogError, VariableCatalog};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut template_path = None;
    let mut catalog_paths = Vec::new();
    let mut context_path = None;
    let mut config_path = None;
    let mut seed = None;
    let mut count: usize = 5;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--template" if i + 1 < args.len() => {
                i += 1;
                template_path = Some(args[i].clone());
            }
            "--catalog" if i + 1 < args.len() => {
                i += 1;
                catalog_paths.push(args[i].clone());
            }
            "--context" if i + 1 < args.len() => {
                i += 1;
                context_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = Some(args[i].clone());
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = args[i].parse().unwrap_or(5);
            }
            "--verbose" | "-v" => verbose = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    init_logging(verbose);

    let Some(template_path) = template_path else {
        eprintln!("ERROR: --template is required");
        process::exit(1);
    };

    let raw = match std::fs::read_to_string(&template_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("ERROR: Failed to read template '{}': {}", template_path, e);
            process::exit(1);
        }
    };

    let mut catalog = VariableCatalog::new();
    for path in &catalog_paths {
        match load_catalog(Path::new(path)) {
            Ok(loaded) => {
                println!("Loaded {} variables from {}", loaded.len(), path);
                catalog.merge(loaded);
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load catalog '{}': {}", path, e);
                process::exit(1);
            }
        }
    }

    let context = match context_path {
        Some(ref path) => match GenerationContext::load_from_ron(Path::new(path)) {
            Ok(context) => context,
            Err(e) => {
                eprintln!("ERROR: Failed to load context '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => GenerationContext::new(),
    };

    let mut builder = TemplateEngine::builder();
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: Invalid engine config: {}", e);
            process::exit(1);
        }
    };

    let template = match engine.parse(&raw) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("ERROR: {}: {}", template_path, e);
            process::exit(1);
        }
    };

    let result = match engine.generate(&template, &catalog, &context, seed.as_deref(), count) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("Seed: {}\n", result.seed);
    for (i, variation) in result.variations.iter().enumerate() {
        println!("--- Variation {} ---", i + 1);
        println!("{}\n", variation);
    }

    if !result.diagnostics.is_empty() {
        println!("=== Diagnostics ===");
        for diagnostic in &result.diagnostics {
            println!("[variation {}] {}", diagnostic.variation + 1, diagnostic.error);
        }
    }
}

fn load_catalog(path: &Path) -> Result<VariableCatalog, CatalogError> {
    if path.extension().and_then(|s| s.to_str()) == Some("json") {
        let contents = std::fs::read_to_string(path)?;
        VariableCatalog::from_json(&contents)
    } else {
        VariableCatalog::load_from_ron(path)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!("Usage: preview --template <file> --catalog <catalog.ron|.json> [options]");
    println!();
    println!("Options:");
    println!("  --catalog <path>   Variable catalog; repeat to merge, later files win");
    println!("  --context <path>   Generation context (RON map)");
    println!("  --config <path>    Engine config (RON)");
    println!("  --seed <s>         Seed string; omitted draws a random one");
    println!("  --count <n>        Number of variations (default 5)");
    println!("  --verbose, -v      Debug logging to stderr");
}
