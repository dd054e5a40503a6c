use action_toolkit::summary::WriteOptions;
use action_toolkit::{ProcessEnv, Result, Summary, SummaryTableCell, ToolkitError};

pub(crate) struct SummaryArgs {
    pub heading: Option<String>,
    pub heading_level: u8,
    pub text: Vec<String>,
    pub code: Option<String>,
    pub lang: Option<String>,
    pub items: Vec<String>,
    pub ordered: bool,
    pub rows: Vec<String>,
    pub quote: Option<String>,
    pub link: Option<String>,
    pub separator: bool,
    pub overwrite: bool,
    pub clear: bool,
    pub print: bool,
}

fn table_rows(rows: &[String]) -> Vec<Vec<SummaryTableCell>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.split(',')
                .map(str::trim)
                .map(|cell| {
                    if i == 0 {
                        SummaryTableCell::header(cell)
                    } else {
                        SummaryTableCell::new(cell)
                    }
                })
                .collect()
        })
        .collect()
}

pub(crate) fn run(args: SummaryArgs) -> Result<i32> {
    let mut summary = if args.print {
        Summary::new("")
    } else {
        Summary::from_env(&ProcessEnv)?
    };

    if args.clear {
        summary.clear()?;
        return Ok(0);
    }

    if let Some(heading) = &args.heading {
        summary.add_heading(heading, args.heading_level);
    }
    for text in &args.text {
        summary.add_raw(text, true);
    }
    if let Some(code) = &args.code {
        summary.add_code_block(code, args.lang.as_deref());
    }
    if !args.items.is_empty() {
        summary.add_list(&args.items, args.ordered);
    }
    if !args.rows.is_empty() {
        summary.add_table(&table_rows(&args.rows));
    }
    if let Some(quote) = &args.quote {
        summary.add_quote(quote, None);
    }
    if let Some(link) = &args.link {
        let (text, href) = link.split_once('=').ok_or_else(|| ToolkitError::Summary {
            message: format!("--link expects TEXT=HREF, got '{link}'"),
        })?;
        summary.add_link(text, href);
    }
    if args.separator {
        summary.add_separator();
    }

    if args.print {
        print!("{}", summary.stringify());
    } else {
        summary.write(WriteOptions {
            overwrite: args.overwrite,
        })?;
    }
    Ok(0)
}
