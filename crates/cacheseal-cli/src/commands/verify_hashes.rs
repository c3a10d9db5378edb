use super::{colorize_status, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use cacheseal_core::Pipeline;

pub fn run(pipeline: &Pipeline, json: bool) -> Result<u8, String> {
    let report = pipeline.verify_hashes().map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "passed": report.passed(),
            "failed": report.failed(),
            "checks": report.checks,
            "untracked": report.untracked,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for check in &report.checks {
            match &check.finding {
                None => println!("{} {}", colorize_status(check.status), check.key),
                Some(finding) => println!("{} {finding}", colorize_status(check.status)),
            }
        }
        for key in &report.untracked {
            println!("warning: {key} is embedded but not tracked");
        }
        println!(
            "integrity: {}/{} artifacts passed",
            report.passed(),
            report.checks.len()
        );
    }

    if report.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
