//! Everything a running query-set needs from its scenario

use crate::cancel::CancellationToken;
use crate::progress::ProgressMonitors;
use crate::strategy::{MetaQuerySetStrategy, ResultStrategy};
use sp_db::{ConnectionStrategy, DbConnection};

/// Borrowed view of the scenario state shared by all queries of a run
pub struct ExecutionContext<'a> {
    pub conn: &'a dyn DbConnection,
    /// Asked whether `conn` is still usable after a statement fails
    pub connection_strategy: &'a dyn ConnectionStrategy,
    /// Judges main queries
    pub result_strategy: &'a dyn ResultStrategy,
    /// Judges queries of meta-query-sets
    pub meta_strategy: &'a MetaQuerySetStrategy,
    pub monitors: &'a ProgressMonitors,
    pub cancel: &'a CancellationToken,
}
