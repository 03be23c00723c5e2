use clap::Args;
use serde::Serialize;

use threads::{Result, reference, workspace};

use super::Context;
use crate::args::FormatArgs;
use crate::output;

#[derive(Args)]
pub struct PathArgs {
    /// Thread ID or name reference
    reference: String,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct PathOutput {
    path: String,
    path_absolute: String,
}

pub fn run(args: PathArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let abs_path = workspace::canonical(&file);

    if format.is_human() {
        println!("{}", abs_path.display());
        return Ok(());
    }
    output::print_structured(
        &PathOutput {
            path: workspace::path_relative_to_root(&ctx.root, &file),
            path_absolute: abs_path.to_string_lossy().to_string(),
        },
        format,
    )
}
