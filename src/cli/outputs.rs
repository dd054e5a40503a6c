use std::path::Path;

use action_toolkit::{Action, Result};

pub(crate) fn set_output(name: &str, value: &str) -> Result<i32> {
    Action::from_process().set_output(name, value)?;
    Ok(0)
}

pub(crate) fn export(name: &str, value: &str) -> Result<i32> {
    Action::from_process().export_variable(name, value)?;
    Ok(0)
}

pub(crate) fn add_path(dir: &Path) -> Result<i32> {
    Action::from_process().add_path(dir)?;
    Ok(0)
}

pub(crate) fn mask(value: &str) -> Result<i32> {
    Action::from_process().set_secret(value)?;
    Ok(0)
}

pub(crate) fn save_state(name: &str, value: &str) -> Result<i32> {
    Action::from_process().save_state(name, value)?;
    Ok(0)
}

pub(crate) fn get_state(name: &str) -> Result<i32> {
    println!("{}", Action::from_process().get_state(name));
    Ok(0)
}
