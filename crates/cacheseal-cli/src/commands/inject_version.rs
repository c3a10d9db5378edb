use super::{json_pretty, EXIT_SUCCESS};
use cacheseal_core::Pipeline;
use cacheseal_store::InjectOutcome;

pub fn run(pipeline: &Pipeline, json: bool) -> Result<u8, String> {
    let report = pipeline.inject_version().map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for target in &report.targets {
            match target.outcome {
                InjectOutcome::Replaced { count } => println!(
                    "injected {} into {} ({count} occurrences)",
                    report.version,
                    target.path.display()
                ),
                InjectOutcome::PlaceholderNotFound => println!(
                    "warning: {} not found in {}, left unchanged",
                    target.placeholder,
                    target.path.display()
                ),
            }
        }
        println!(
            "version {}: {}/{} targets updated",
            report.version,
            report.replaced_files(),
            report.targets.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
