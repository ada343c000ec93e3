//! CMS reachability check.

use fernleaf_storefront::cms::CmsClient;

use super::CommandError;

/// Ping the REST and GraphQL APIs.
///
/// # Errors
///
/// Returns `CommandError::CheckFailed` naming every API that did not answer.
pub async fn run(cms: &CmsClient) -> Result<(), CommandError> {
    let (rest, graphql) = tokio::join!(cms.rest().ping(), cms.graphql().ping());

    let mut failed = Vec::new();
    match rest {
        Ok(()) => tracing::info!("REST API: ok"),
        Err(e) => {
            tracing::error!("REST API: {e}");
            failed.push("REST");
        }
    }
    match graphql {
        Ok(()) => tracing::info!("GraphQL API: ok"),
        Err(e) => {
            tracing::error!("GraphQL API: {e}");
            failed.push("GraphQL");
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CommandError::CheckFailed(format!(
            "unreachable: {}",
            failed.join(", ")
        )))
    }
}
