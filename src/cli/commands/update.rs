//! milestone-sync update - Set each issue's milestones to its CSV row

use clap::Args;

use crate::app::AppContext;
use crate::core::Operation;
use crate::error::Result;

use super::batch::{BatchArgs, execute};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Column with comma-separated milestone names (default: MILESTONE_COLUMN or "マイルストーン")
    #[arg(long, value_name = "COLUMN")]
    pub milestone_column: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let milestone_column = args
        .milestone_column
        .clone()
        .unwrap_or_else(|| ctx.config.csv.milestone_column.clone());
    execute(ctx, &args.batch, Operation::Reconcile { milestone_column })
}
