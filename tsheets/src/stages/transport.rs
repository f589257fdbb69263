//! Transport-invocation stages, one per verb.
//!
//! These are the only stages that perform I/O. Transport failures propagate
//! unchanged.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::Result;
use crate::model::Entity;
use crate::transport::Transport;

macro_rules! invoker {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            transport: Arc<dyn Transport>,
        }

        impl $name {
            /// Creates the stage around a transport.
            #[must_use]
            pub fn new(transport: Arc<dyn Transport>) -> Self {
                Self { transport }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}

invoker!(
    /// GETs a page of records, adding paging and supplemental query keys.
    GetInvoker
);
invoker!(
    /// POSTs the serialized body of a create or report call.
    PostInvoker
);
invoker!(
    /// PUTs the serialized body of an update call.
    PutInvoker
);
invoker!(
    /// DELETEs the ids of a delete call.
    DeleteInvoker
);
invoker!(
    /// GETs raw bytes for a download call.
    DownloadInvoker
);

#[async_trait]
impl<T: Entity> Stage<T> for GetInvoker {
    fn name(&self) -> &str {
        "get_invoker"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let options = ctx.options()?.clone();
        let mut query = ctx.filter()?.clone();

        if let Some(page) = options.page {
            query.insert("page".to_string(), page.to_string());
        }
        if let Some(per_page) = options.per_page {
            query.insert("limit".to_string(), per_page.to_string());
        }
        let supplemental = if options.include_supplemental_data {
            "yes"
        } else {
            "no"
        };
        query.insert("supplemental_data".to_string(), supplemental.to_string());

        debug!(
            correlation_id = %ctx.log().correlation_id,
            endpoint = %ctx.endpoint(),
            page = options.page.unwrap_or(1),
            "GET"
        );
        let raw = self
            .transport
            .get(ctx.endpoint(), &query, ctx.log(), cancel)
            .await?;
        ctx.set_raw_response(raw);
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for PostInvoker {
    fn name(&self) -> &str {
        "post_invoker"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let raw = self
            .transport
            .create(ctx.endpoint(), ctx.body()?, ctx.log(), cancel)
            .await?;
        ctx.set_raw_response(raw);
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for PutInvoker {
    fn name(&self) -> &str {
        "put_invoker"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let raw = self
            .transport
            .update(ctx.endpoint(), ctx.body()?, ctx.log(), cancel)
            .await?;
        ctx.set_raw_response(raw);
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for DeleteInvoker {
    fn name(&self) -> &str {
        "delete_invoker"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let raw = self
            .transport
            .delete(ctx.endpoint(), ctx.ids()?, ctx.log(), cancel)
            .await?;
        ctx.set_raw_response(raw);
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for DownloadInvoker {
    fn name(&self) -> &str {
        "download_invoker"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let bytes = self
            .transport
            .download(ctx.endpoint(), ctx.filter()?, ctx.log(), cancel)
            .await?;
        ctx.set_payload(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestOptions;
    use crate::errors::{ApiError, ErrorKind};
    use crate::model::EndPoint;
    use crate::transport::MockTransport;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_get_adds_paging_and_supplemental_keys() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .withf(|endpoint, query, _, _| {
                *endpoint == EndPoint::Jobcodes
                    && query.get("page").map(String::as_str) == Some("2")
                    && query.get("limit").map(String::as_str) == Some("25")
                    && query.get("supplemental_data").map(String::as_str) == Some("no")
                    && query.get("active").map(String::as_str) == Some("yes")
            })
            .times(1)
            .returning(|_, _, _, _| Ok("{\"results\":{}}".to_string()));

        let filter = BTreeMap::from([("active".to_string(), "yes".to_string())]);
        let options = RequestOptions::new()
            .with_page(2)
            .with_per_page(25)
            .with_supplemental_data(false);
        let mut ctx: ApiContext<serde_json::Value> =
            ApiContext::get(EndPoint::Jobcodes, filter, options);

        GetInvoker::new(Arc::new(mock))
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ctx.raw_response().unwrap(), "{\"results\":{}}");
    }

    #[tokio::test]
    async fn test_post_sends_serialized_body() {
        let mut mock = MockTransport::new();
        mock.expect_create()
            .withf(|endpoint, body, _, _| {
                *endpoint == EndPoint::Users && body.to_string() == "{\"data\":[]}"
            })
            .times(1)
            .returning(|_, _, _, _| Ok("ok".to_string()));

        let mut ctx = ApiContext::<serde_json::Value>::create(EndPoint::Users, Vec::new());
        ctx.set_body("{\"data\":[]}".to_string()).unwrap();

        PostInvoker::new(Arc::new(mock))
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ctx.raw_response().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_transport_errors_propagate_unchanged() {
        let mut mock = MockTransport::new();
        mock.expect_delete()
            .returning(|_, _, _, _| Err(ApiError::new(401, "Unauthorized").into()));

        let mut ctx = ApiContext::<serde_json::Value>::delete(EndPoint::Users, vec![1]).unwrap();
        let err = DeleteInvoker::new(Arc::new(mock))
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
        assert!(ctx.raw_response().is_err());
    }

    #[tokio::test]
    async fn test_download_stores_payload() {
        let mut mock = MockTransport::new();
        mock.expect_download()
            .returning(|_, _, _, _| Ok(vec![0xde, 0xad]));

        let mut ctx: ApiContext<serde_json::Value> =
            ApiContext::download(EndPoint::FilesRaw, BTreeMap::new());
        DownloadInvoker::new(Arc::new(mock))
            .process(&mut ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ctx.payload(), &[0xde, 0xad]);
    }
}
