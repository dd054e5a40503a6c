use std::path::PathBuf;

use action_toolkit::setup::{detect_runtime_version, SetupInputs};
use action_toolkit::{Action, AnnotationProperties, Result, ToolkitError};

pub(crate) fn run(version_file: Option<PathBuf>) -> Result<i32> {
    let mut action = Action::from_process();
    let mut inputs = SetupInputs::from_action(&action)?;
    if let Some(file) = version_file {
        inputs.version_file = file;
    }
    tracing::info!(
        uv_version = %inputs.uv_version,
        enable_cache = inputs.enable_cache,
        "setup inputs"
    );

    match detect_runtime_version(&inputs.version_file) {
        Ok(version) => {
            action.set_output("python-version", &version)?;
            Ok(0)
        }
        Err(ToolkitError::Input { reason, .. }) => {
            let props = AnnotationProperties {
                title: Some("Missing version".into()),
                file: Some(inputs.version_file.to_string_lossy().into_owned()),
                ..Default::default()
            };
            action.error(&reason, Some(&props))?;
            Ok(1)
        }
        Err(e) => Err(e),
    }
}
