use action_toolkit::{Action, AnnotationProperties, Result};

use super::Level;

pub(crate) fn run(level: Level, message: &str, props: AnnotationProperties) -> Result<i32> {
    let mut action = Action::from_process();
    let props = (props != AnnotationProperties::default()).then_some(props);
    match level {
        Level::Debug => action.debug(message)?,
        Level::Notice => action.notice(message, props.as_ref())?,
        Level::Warning => action.warning(message, props.as_ref())?,
        Level::Error => action.error(message, props.as_ref())?,
    }
    Ok(0)
}

pub(crate) fn group(name: &str) -> Result<i32> {
    Action::from_process().start_group(name)?;
    Ok(0)
}

pub(crate) fn endgroup() -> Result<i32> {
    Action::from_process().end_group()?;
    Ok(0)
}
