//! Stage trait and implementations.
//!
//! Stages are the units of work in a request pipeline. Each is stateless
//! apart from injected collaborators and can be shared across calls.
//!
//! This module provides:
//! - The [`Stage`] trait
//! - Validators, request serializers and transport invokers
//! - Results, paging, report and supplemental deserializers
//! - The multi-status aggregator

mod deserializers;
mod multi_status;
mod serializers;
mod supplemental;
mod transport;
mod validators;

pub use deserializers::{
    DeleteResultsDeserializer, PagingMetaDeserializer, ReportDeserializer, ResultsDeserializer,
    WriteResultsDeserializer,
};
pub use multi_status::MultiStatusHandler;
pub use serializers::{ReportSerializer, WriteSerializer};
pub use supplemental::SupplementalDeserializer;
pub use transport::{DeleteInvoker, DownloadInvoker, GetInvoker, PostInvoker, PutInvoker};
pub use validators::{DeleteValidator, WriteValidator};

use async_trait::async_trait;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::Result;
use crate::model::Entity;

/// Trait for pipeline stages.
///
/// A stage mutates the context in place. Returning an error aborts the
/// remaining stages of the sequence.
#[async_trait]
pub trait Stage<T: Entity>: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Processes the context.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The call context
    /// * `cancel` - The caller's cancellation token
    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()>;
}

/// A simple function-based stage.
pub struct FnStage<T, F>
where
    F: Fn(&mut ApiContext<T>) -> Result<()> + Send + Sync,
{
    name: String,
    func: F,
    _entity: PhantomData<fn() -> T>,
}

impl<T, F> FnStage<T, F>
where
    F: Fn(&mut ApiContext<T>) -> Result<()> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _entity: PhantomData,
        }
    }
}

impl<T, F> Debug for FnStage<T, F>
where
    F: Fn(&mut ApiContext<T>) -> Result<()> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<T, F> Stage<T> for FnStage<T, F>
where
    T: Entity,
    F: Fn(&mut ApiContext<T>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        (self.func)(ctx)
    }
}
