//! milestone-sync add - Attach a milestone to every issue in the CSV

use clap::Args;

use crate::app::AppContext;
use crate::core::Operation;
use crate::error::Result;

use super::batch::{BatchArgs, execute};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Milestone to add (default: MILESTONE or TARGET_MILESTONE)
    #[arg(long, short)]
    pub milestone: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let milestone = target_milestone(args.milestone.as_deref(), ctx);
    execute(ctx, &args.batch, Operation::Add { milestone })
}

/// Flag value, else the configured target; blank when neither is set.
pub(super) fn target_milestone(flag: Option<&str>, ctx: &AppContext) -> String {
    flag.or(ctx.config.run.milestone.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string()
}
