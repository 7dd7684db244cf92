use logo_ico::{IcoConverter, IcoSummary, INPUT_PATH, OUTPUT_PATH};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("Converting PNG to ICO...");
    println!("   input:  {INPUT_PATH}");
    println!("   output: {OUTPUT_PATH}");

    match IcoConverter::default()
        .source_file(INPUT_PATH)
        .build_file(OUTPUT_PATH)
    {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(summary: &IcoSummary) {
    let sizes: Vec<_> = summary.sizes.iter().map(u32::to_string).collect();
    println!("Conversion complete!");
    println!("   created: {}", summary.path.display());
    println!("   sizes:   {}", sizes.join(", "));
    println!("   size:    {:.2} KB", summary.size_kib());
}
