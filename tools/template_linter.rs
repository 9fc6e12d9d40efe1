/// Template Linter: checks a template and its catalog without generating.
///
/// Usage: template_linter <template file> --catalog <catalog.ron> [--catalog <more>]

use encounter_forge::core::lint::lint;
use encounter_forge::core::template::Template;
use encounter_forge::schema::catalog::VariableCatalog;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: template_linter <template file> --catalog <catalog.ron> [--catalog <more>]");
        process::exit(0);
    }

    let template_path = &args[1];
    let mut catalog_paths = Vec::new();

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--catalog" && i + 1 < args.len() {
            i += 1;
            catalog_paths.push(args[i].clone());
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let raw = match std::fs::read_to_string(template_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("ERROR: Failed to read template '{}': {}", template_path, e);
            process::exit(1);
        }
    };

    let mut catalog = VariableCatalog::new();
    for path in &catalog_paths {
        match VariableCatalog::load_from_ron(Path::new(path)) {
            Ok(loaded) => {
                println!("  Loaded: {}", path);
                catalog.merge(loaded);
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load catalog '{}': {}", path, e);
                process::exit(1);
            }
        }
    }
    println!("Loaded {} variables", catalog.len());

    let template = match Template::parse(&raw) {
        Ok(template) => template,
        Err(e) => {
            println!("\n=== Template Lint Report ===\n");
            println!("ERROR: {}", e);
            println!("\nSummary: 1 errors, 0 warnings");
            process::exit(1);
        }
    };

    let report = lint(&template, &catalog);

    println!("\n=== Template Lint Report ===\n");

    if report.is_clean() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    if report.has_errors() {
        process::exit(1);
    }
}
