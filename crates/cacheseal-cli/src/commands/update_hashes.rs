use super::{json_pretty, EXIT_SUCCESS};
use cacheseal_core::Pipeline;

pub fn run(pipeline: &Pipeline, json: bool) -> Result<u8, String> {
    let report = pipeline.update_hashes().map_err(|e| e.to_string())?;
    let host = pipeline.config().host_artifact.display().to_string();

    if json {
        let payload = serde_json::json!({
            "host_artifact": host,
            "rewritten": report.rewritten,
            "records": report.records,
            "skipped": report.skipped,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for record in &report.records {
            println!("  {} {}", record.key, record.digest);
        }
        for key in &report.skipped {
            println!("warning: {key} skipped, artifact missing");
        }
        let action = if report.rewritten {
            "updated"
        } else {
            "unchanged"
        };
        println!(
            "{host}: {action}, {} digests written and verified",
            report.records.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
