//! Input validators for write and delete calls.

use async_trait::async_trait;

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::{Error, Result};
use crate::model::Entity;

/// Rejects create and update calls with no items or a null item.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteValidator;

#[async_trait]
impl<T: Entity> Stage<T> for WriteValidator {
    fn name(&self) -> &str {
        "write_validator"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let items = ctx.items()?;
        if items.is_empty() {
            return Err(Error::invalid_request(format!(
                "{} {} requires at least one item",
                ctx.operation(),
                ctx.endpoint()
            )));
        }

        for (index, item) in items.iter().enumerate() {
            if serde_json::to_value(item)?.is_null() {
                return Err(Error::invalid_request(format!(
                    "item {index} of {} {} is null",
                    ctx.operation(),
                    ctx.endpoint()
                )));
            }
        }
        Ok(())
    }
}

/// Rejects delete calls with no ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteValidator;

#[async_trait]
impl<T: Entity> Stage<T> for DeleteValidator {
    fn name(&self) -> &str {
        "delete_validator"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        if ctx.ids()?.is_empty() {
            return Err(Error::invalid_request(format!(
                "delete {} requires at least one id",
                ctx.endpoint()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::model::{EndPoint, User};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_items_are_bad_request() {
        let mut ctx: ApiContext<User> = ApiContext::create(EndPoint::Users, Vec::new());
        let err = WriteValidator
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    }

    #[tokio::test]
    async fn test_null_item_is_bad_request() {
        let mut ctx = ApiContext::update(EndPoint::Users, vec![json!({"id": 1}), json!(null)]);
        let err = WriteValidator
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("item 1"));
    }

    #[tokio::test]
    async fn test_valid_items_pass() {
        let mut ctx = ApiContext::create(EndPoint::Users, vec![User::default()]);
        WriteValidator
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_validator_accepts_ids() {
        let mut ctx = ApiContext::<User>::delete(EndPoint::Users, vec![1]).unwrap();
        DeleteValidator
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validator_against_get_context_is_internal() {
        let mut ctx: ApiContext<User> = ApiContext::get(
            EndPoint::Users,
            Default::default(),
            crate::context::RequestOptions::default(),
        );
        let err = WriteValidator
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
