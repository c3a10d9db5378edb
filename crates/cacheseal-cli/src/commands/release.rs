use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use cacheseal_core::Pipeline;

pub fn run(pipeline: &Pipeline, json: bool) -> Result<u8, String> {
    let vcs = pipeline.vcs_backend().map_err(|e| e.to_string())?;

    let pb = if json {
        None
    } else {
        Some(spinner(&format!("releasing via {}...", vcs.name())))
    };

    let report = match pipeline.release(vcs.as_ref()) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("released v{}", r.version));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "release aborted");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        let steps: Vec<String> = report.steps.iter().map(ToString::to_string).collect();
        println!("steps: {}", steps.join(" -> "));
        println!("commit: {}", report.commit_message);
    }
    Ok(EXIT_SUCCESS)
}
