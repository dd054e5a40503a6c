use action_toolkit::io;
use action_toolkit::Result;

pub(crate) fn run(tool: &str, check: bool) -> Result<i32> {
    match io::which(tool, check)? {
        Some(path) => {
            println!("{}", path.display());
            Ok(0)
        }
        None => Ok(1),
    }
}
