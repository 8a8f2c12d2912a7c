use prometheus::Registry;

use crate::cuckoo;
use crate::Result;

#[tracing::instrument(level = "trace")]
pub fn register_metrics(registry: &Registry) -> Result<()> {
    registry.register(Box::new(cuckoo::CUCKOO_QUERY_TIME.clone()))?;
    registry.register(Box::new(cuckoo::CUCKOO_ERRORS.clone()))?;
    registry.register(Box::new(cuckoo::CUCKOO_SKIPPED_ENTRIES.clone()))?;
    Ok(())
}
