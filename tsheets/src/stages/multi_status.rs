//! Partial-failure aggregation.

use async_trait::async_trait;
use tracing::debug;

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::{Error, MultiStatusError, Result};
use crate::model::Entity;

/// Raises one [`MultiStatusError`] if any record failed.
///
/// Runs last, so the aggregate carries every success and every failure of
/// the call. The context keeps its results either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiStatusHandler;

#[async_trait]
impl<T: Entity> Stage<T> for MultiStatusHandler {
    fn name(&self) -> &str {
        "multi_status_handler"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let results = ctx.results();
        if !results.has_errors() {
            return Ok(());
        }

        let successes = results
            .items
            .iter()
            .map(|item| serde_json::to_value(item).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;
        let failures = results
            .errors
            .iter()
            .map(crate::context::ErrorItem::to_failed_item)
            .collect::<Vec<_>>();

        debug!(
            correlation_id = %ctx.log().correlation_id,
            endpoint = %ctx.endpoint(),
            successes = successes.len(),
            failures = failures.len(),
            "partial failure"
        );
        Err(Box::new(MultiStatusError::new(successes, failures)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ErrorItem, ResultStatus};
    use crate::errors::ErrorKind;
    use crate::model::{EndPoint, User};

    fn named(name: &str) -> User {
        User {
            first_name: Some(name.to_string()),
            ..User::default()
        }
    }

    #[tokio::test]
    async fn test_no_failures_is_noop() {
        let mut ctx = ApiContext::create(EndPoint::Users, vec![named("a")]);
        ctx.results_mut().items.push(named("a"));

        MultiStatusHandler
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unset_results_is_noop() {
        let mut ctx = ApiContext::<User>::delete(EndPoint::Users, vec![1]).unwrap();
        MultiStatusHandler
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failures_raise_aggregate_with_successes() {
        let mut ctx = ApiContext::create(EndPoint::Users, vec![named("a"), named("b")]);
        ctx.results_mut().items.push(named("a"));
        ctx.results_mut().errors.push(ErrorItem {
            index: 1,
            id: None,
            item: Some(named("b")),
            status: ResultStatus::new(409, "Conflict"),
        });

        let err = MultiStatusHandler
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        let multi = err.as_multi_status().unwrap();
        let successes: Vec<User> = multi.successes_as().unwrap();
        assert_eq!(successes[0].first_name.as_deref(), Some("a"));
        assert_eq!(multi.failures[0].index, 1);
        assert_eq!(multi.failures[0].error.kind, ErrorKind::Conflict);
        assert_eq!(ctx.results().errors.len(), 1);
    }
}
