use action_toolkit::{Action, InputOptions, MultilineInputOptions, Result};

pub(crate) fn run(
    name: &str,
    required: bool,
    no_trim: bool,
    multiline: bool,
    as_bool: bool,
    strict: bool,
) -> Result<i32> {
    let action = Action::from_process();
    let options = InputOptions {
        required,
        trim_whitespace: !no_trim,
    };

    if multiline {
        let lines = action.get_multiline_input(
            name,
            MultilineInputOptions {
                required,
                trim_whitespace: !no_trim,
                ..Default::default()
            },
        )?;
        for line in lines {
            println!("{line}");
        }
    } else if as_bool {
        let value = if strict {
            action.get_bool_input_strict(name, options)?
        } else {
            action.get_bool_input(name, options)?
        };
        println!("{value}");
    } else {
        println!("{}", action.get_input(name, options)?);
    }
    Ok(0)
}
