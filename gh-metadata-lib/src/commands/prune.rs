use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::metadata::{ErrorLog, prune_all};
use chrono::Utc;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct PruneArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Drop commit history older than twelve months from every record.
pub fn prune_metadata<H: Host>(host: &mut H, args: &PruneArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common, |_| {})?;

    let mut records = common.load_records()?;
    let mut errors = ErrorLog::new();
    let summary = prune_all(&common.store, &mut records, Utc::now(), &mut errors);

    common.print(&format!(
        "Pruned {} history entries from {} records; {} written",
        summary.removed, summary.records, summary.written
    ));

    common.finish(&errors)
}
