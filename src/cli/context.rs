use action_toolkit::{get_platform, GithubContext, ProcessEnv, Result, RunnerContext};

use super::{print_structured, Format};

pub(crate) fn run(runner: bool, format: Format) -> Result<i32> {
    if runner {
        print_structured(&RunnerContext::load(&ProcessEnv), format)?;
    } else {
        print_structured(&GithubContext::load(&ProcessEnv)?, format)?;
    }
    Ok(0)
}

pub(crate) fn platform(format: Format) -> Result<i32> {
    print_structured(&get_platform(), format)?;
    Ok(0)
}
