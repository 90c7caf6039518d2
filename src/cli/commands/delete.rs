//! milestone-sync delete - Detach a milestone from every issue in the CSV

use clap::Args;

use crate::app::AppContext;
use crate::core::Operation;
use crate::error::Result;

use super::add::target_milestone;
use super::batch::{BatchArgs, execute};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Milestone to remove (default: MILESTONE or TARGET_MILESTONE)
    #[arg(long, short)]
    pub milestone: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    let milestone = target_milestone(args.milestone.as_deref(), ctx);
    execute(ctx, &args.batch, Operation::Delete { milestone })
}
