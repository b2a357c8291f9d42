use super::{Pages, RdsApi};
use crate::error::Result;
use tracing::{debug, info};

/// Resolve the database instances to inspect.
///
/// With clusters given, returns the members of each cluster in the order the
/// clusters were listed; overlapping clusters yield duplicate identifiers.
/// Without clusters, pages through every instance in the region. Any failure
/// aborts the whole call.
pub async fn list_instances<R>(api: &R, clusters: &[String]) -> Result<Vec<String>>
where
    R: RdsApi + ?Sized,
{
    if clusters.is_empty() {
        let instances = Pages::new(|marker| api.describe_instances(marker))
            .try_collect()
            .await?;
        info!(count = instances.len(), "Listed all instances");
        return Ok(instances);
    }

    let mut instances = Vec::new();
    for cluster in clusters {
        let members = api.describe_cluster_members(cluster).await?;
        debug!(cluster = %cluster, members = members.len(), "Described cluster");
        instances.extend(members);
    }
    info!(
        clusters = clusters.len(),
        count = instances.len(),
        "Listed cluster instances"
    );
    Ok(instances)
}
