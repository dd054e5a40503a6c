use std::path::Path;

use action_toolkit::{Action, ActionManifest, Result};

use super::{print_structured, Format};

pub(crate) fn run(path: &Path, check_inputs: bool, format: Format) -> Result<i32> {
    let manifest = ActionManifest::load(path)?;

    if check_inputs {
        let mut action = Action::from_process();
        let missing = manifest.missing_required_inputs(action.env());
        if !missing.is_empty() {
            let message = format!("Missing required inputs: {}", missing.join(", "));
            return Ok(action.set_failed(message).into());
        }
    }

    match format {
        Format::Json => print_structured(&manifest, format)?,
        Format::Text => {
            println!("{}: {}", manifest.name, manifest.description);
            println!("runs: {}", manifest.runs.using);
            for (name, spec) in &manifest.inputs {
                let default = spec.default.as_deref().unwrap_or("-");
                let required = if spec.required { " (required)" } else { "" };
                println!("input {name}{required}: default {default}");
            }
            for name in manifest.outputs.keys() {
                println!("output {name}");
            }
        }
    }
    Ok(0)
}
