//! Typed entry point to the API.
//!
//! [`DataService`] turns each call into a context, runs the sequence the
//! factory picks for it and unpacks the context into a typed result.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cancellation::CancellationToken;
use crate::context::{ApiContext, RequestOptions, SupplementalData};
use crate::errors::{Error, Result};
use crate::events::EventSink;
use crate::model::{
    to_query, CurrentTotalsReport, CurrentTotalsReportFilter, CustomField, CustomFieldFilter,
    CustomFieldItem, CustomFieldItemFilter, EndPoint, Entity, File, FileFilter, GeoLocation,
    GeolocationFilter, Group, GroupFilter, Jobcode, JobcodeAssignment, JobcodeAssignmentFilter,
    JobcodeFilter, Location, LocationFilter, PayrollReport, PayrollReportFilter, Timesheet,
    TimesheetFilter, User, UserFilter,
};
use crate::observability::SpanTimer;
use crate::pipeline::PipelineFactory;
use crate::transport::Transport;

#[cfg(feature = "http")]
use crate::config::ClientConfig;

/// Records of a get call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    /// Records in server order, across every fetched page.
    pub items: Vec<T>,
    /// Related records referenced by the items.
    pub supplemental_data: SupplementalData,
    /// Whether the server has more pages after the last one fetched.
    pub more: bool,
    /// The last page fetched.
    pub page: u32,
}

/// Records echoed back by a create or update call.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult<T> {
    /// Written records, in input order.
    pub items: Vec<T>,
    /// Related records referenced by the items.
    pub supplemental_data: SupplementalData,
}

/// Outcome of a report call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResult<T> {
    /// The decoded report.
    pub report: T,
    /// Related records referenced by the report.
    pub supplemental_data: SupplementalData,
}

/// Typed client for the API.
///
/// Partial failures of writes and deletes surface as
/// [`Error::MultiStatus`], which carries the successful records as well.
#[derive(Debug, Clone)]
pub struct DataService {
    factory: PipelineFactory,
}

impl DataService {
    /// Creates a service over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            factory: PipelineFactory::new(transport),
        }
    }

    /// Builds a retrying REST service from a configuration.
    #[cfg(feature = "http")]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::from_config_with_events(config, Arc::new(crate::events::NoOpEventSink))
    }

    /// Builds a retrying REST service whose transport and pipelines report to `events`.
    #[cfg(feature = "http")]
    pub fn from_config_with_events(
        config: &ClientConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        use crate::transport::{ResilientTransport, RestClient};

        let rest = RestClient::new(config)?;
        let transport = ResilientTransport::new(Arc::new(rest), config.retry.clone())
            .with_event_sink(events.clone());
        Ok(Self::new(Arc::new(transport)).with_event_sink(events))
    }

    /// Sets the sink receiving batch and page events.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.factory = self.factory.with_event_sink(events);
        self
    }

    /// Fetches records matching `filter`.
    pub async fn get<T: Entity, F: Serialize + Sync>(
        &self,
        endpoint: EndPoint,
        filter: &F,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<T>> {
        let mut ctx = ApiContext::get(endpoint, to_query(filter)?, options);
        self.run(&mut ctx, cancel).await?;

        let paging = ctx.paging();
        Ok(ListResult {
            items: ctx.take_results().items,
            supplemental_data: ctx.take_supplemental(),
            more: paging.is_some_and(|p| p.has_more),
            page: paging.map_or(1, |p| p.current_page),
        })
    }

    /// Creates records, batching as needed.
    pub async fn create<T: Entity>(
        &self,
        endpoint: EndPoint,
        items: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<T>> {
        let mut ctx = ApiContext::create(endpoint, items);
        self.run(&mut ctx, cancel).await?;
        Ok(write_result(ctx))
    }

    /// Updates records, batching as needed.
    pub async fn update<T: Entity>(
        &self,
        endpoint: EndPoint,
        items: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<T>> {
        let mut ctx = ApiContext::update(endpoint, items);
        self.run(&mut ctx, cancel).await?;
        Ok(write_result(ctx))
    }

    /// Deletes records by id.
    pub async fn delete(
        &self,
        endpoint: EndPoint,
        ids: Vec<i64>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut ctx = ApiContext::<serde_json::Value>::delete(endpoint, ids)?;
        self.run(&mut ctx, cancel).await
    }

    /// Downloads raw content.
    pub async fn download<F: Serialize + Sync>(
        &self,
        endpoint: EndPoint,
        filter: &F,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut ctx = ApiContext::<serde_json::Value>::download(endpoint, to_query(filter)?);
        self.run(&mut ctx, cancel).await?;
        Ok(ctx.take_payload())
    }

    /// Retrieves a report.
    pub async fn report<T: Entity, F: Serialize + Sync>(
        &self,
        endpoint: EndPoint,
        filter: &F,
        cancel: &CancellationToken,
    ) -> Result<ReportResult<T>> {
        let mut ctx = ApiContext::report(endpoint, serde_json::to_value(filter)?);
        self.run(&mut ctx, cancel).await?;

        let report = ctx.take_report().ok_or_else(|| {
            Error::Internal(format!("{endpoint} report sequence produced no report"))
        })?;
        Ok(ReportResult {
            report,
            supplemental_data: ctx.take_supplemental(),
        })
    }

    async fn run<T: Entity>(
        &self,
        ctx: &mut ApiContext<T>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let timer = SpanTimer::start(format!("{}:{}", ctx.operation(), ctx.endpoint()));
        let outcome = self.factory.execute(ctx, cancel).await;

        match &outcome {
            Ok(()) => info!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                operation = %ctx.operation(),
                endpoint = %ctx.endpoint(),
                duration_ms = timer.elapsed_ms(),
                "call completed"
            ),
            Err(err) => warn!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                operation = %ctx.operation(),
                endpoint = %ctx.endpoint(),
                duration_ms = timer.elapsed_ms(),
                error = %err,
                "call failed"
            ),
        }
        outcome
    }
}

fn write_result<T>(mut ctx: ApiContext<T>) -> WriteResult<T> {
    WriteResult {
        items: ctx.take_results().items,
        supplemental_data: ctx.take_supplemental(),
    }
}

// Typed helpers.
impl DataService {
    /// Fetches users.
    pub async fn get_users(
        &self,
        filter: &UserFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<User>> {
        self.get(EndPoint::Users, filter, options, cancel).await
    }

    /// Fetches the authenticated user.
    pub async fn get_current_user(&self, cancel: &CancellationToken) -> Result<User> {
        let options = RequestOptions::new().with_auto_paging(false);
        let result: ListResult<User> = self
            .get(EndPoint::CurrentUser, &serde_json::json!({}), options, cancel)
            .await?;
        result
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidState("current_user response has no user".to_string()))
    }

    /// Creates users.
    pub async fn create_users(
        &self,
        users: Vec<User>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<User>> {
        self.create(EndPoint::Users, users, cancel).await
    }

    /// Updates users.
    pub async fn update_users(
        &self,
        users: Vec<User>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<User>> {
        self.update(EndPoint::Users, users, cancel).await
    }

    /// Fetches groups.
    pub async fn get_groups(
        &self,
        filter: &GroupFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<Group>> {
        self.get(EndPoint::Groups, filter, options, cancel).await
    }

    /// Creates groups.
    pub async fn create_groups(
        &self,
        groups: Vec<Group>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Group>> {
        self.create(EndPoint::Groups, groups, cancel).await
    }

    /// Updates groups.
    pub async fn update_groups(
        &self,
        groups: Vec<Group>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Group>> {
        self.update(EndPoint::Groups, groups, cancel).await
    }

    /// Fetches jobcodes.
    pub async fn get_jobcodes(
        &self,
        filter: &JobcodeFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<Jobcode>> {
        self.get(EndPoint::Jobcodes, filter, options, cancel).await
    }

    /// Creates jobcodes.
    pub async fn create_jobcodes(
        &self,
        jobcodes: Vec<Jobcode>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Jobcode>> {
        self.create(EndPoint::Jobcodes, jobcodes, cancel).await
    }

    /// Updates jobcodes.
    pub async fn update_jobcodes(
        &self,
        jobcodes: Vec<Jobcode>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Jobcode>> {
        self.update(EndPoint::Jobcodes, jobcodes, cancel).await
    }

    /// Fetches jobcode assignments.
    pub async fn get_jobcode_assignments(
        &self,
        filter: &JobcodeAssignmentFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<JobcodeAssignment>> {
        self.get(EndPoint::JobcodeAssignments, filter, options, cancel)
            .await
    }

    /// Creates jobcode assignments.
    pub async fn create_jobcode_assignments(
        &self,
        assignments: Vec<JobcodeAssignment>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<JobcodeAssignment>> {
        self.create(EndPoint::JobcodeAssignments, assignments, cancel)
            .await
    }

    /// Deletes jobcode assignments.
    pub async fn delete_jobcode_assignments(
        &self,
        ids: Vec<i64>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.delete(EndPoint::JobcodeAssignments, ids, cancel).await
    }

    /// Fetches timesheets.
    pub async fn get_timesheets(
        &self,
        filter: &TimesheetFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<Timesheet>> {
        self.get(EndPoint::Timesheets, filter, options, cancel).await
    }

    /// Fetches deleted timesheets.
    pub async fn get_deleted_timesheets(
        &self,
        filter: &TimesheetFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<Timesheet>> {
        self.get(EndPoint::TimesheetsDeleted, filter, options, cancel)
            .await
    }

    /// Creates timesheets.
    pub async fn create_timesheets(
        &self,
        timesheets: Vec<Timesheet>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Timesheet>> {
        self.create(EndPoint::Timesheets, timesheets, cancel).await
    }

    /// Updates timesheets.
    pub async fn update_timesheets(
        &self,
        timesheets: Vec<Timesheet>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Timesheet>> {
        self.update(EndPoint::Timesheets, timesheets, cancel).await
    }

    /// Deletes timesheets.
    pub async fn delete_timesheets(&self, ids: Vec<i64>, cancel: &CancellationToken) -> Result<()> {
        self.delete(EndPoint::Timesheets, ids, cancel).await
    }

    /// Fetches custom fields.
    pub async fn get_custom_fields(
        &self,
        filter: &CustomFieldFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<CustomField>> {
        self.get(EndPoint::CustomFields, filter, options, cancel).await
    }

    /// Fetches the items of a list-type custom field.
    pub async fn get_custom_field_items(
        &self,
        filter: &CustomFieldItemFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<CustomFieldItem>> {
        self.get(EndPoint::CustomFieldItems, filter, options, cancel)
            .await
    }

    /// Creates custom field items.
    pub async fn create_custom_field_items(
        &self,
        items: Vec<CustomFieldItem>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<CustomFieldItem>> {
        self.create(EndPoint::CustomFieldItems, items, cancel).await
    }

    /// Updates custom field items.
    pub async fn update_custom_field_items(
        &self,
        items: Vec<CustomFieldItem>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<CustomFieldItem>> {
        self.update(EndPoint::CustomFieldItems, items, cancel).await
    }

    /// Fetches locations.
    pub async fn get_locations(
        &self,
        filter: &LocationFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<Location>> {
        self.get(EndPoint::Locations, filter, options, cancel).await
    }

    /// Creates locations.
    pub async fn create_locations(
        &self,
        locations: Vec<Location>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Location>> {
        self.create(EndPoint::Locations, locations, cancel).await
    }

    /// Updates locations.
    pub async fn update_locations(
        &self,
        locations: Vec<Location>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<Location>> {
        self.update(EndPoint::Locations, locations, cancel).await
    }

    /// Fetches geolocation points.
    pub async fn get_geolocations(
        &self,
        filter: &GeolocationFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<GeoLocation>> {
        self.get(EndPoint::GeoLocations, filter, options, cancel).await
    }

    /// Records geolocation points.
    pub async fn create_geolocations(
        &self,
        points: Vec<GeoLocation>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<GeoLocation>> {
        self.create(EndPoint::GeoLocations, points, cancel).await
    }

    /// Fetches file metadata.
    pub async fn get_files(
        &self,
        filter: &FileFilter,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ListResult<File>> {
        self.get(EndPoint::Files, filter, options, cancel).await
    }

    /// Updates file metadata.
    pub async fn update_files(
        &self,
        files: Vec<File>,
        cancel: &CancellationToken,
    ) -> Result<WriteResult<File>> {
        self.update(EndPoint::Files, files, cancel).await
    }

    /// Deletes files.
    pub async fn delete_files(&self, ids: Vec<i64>, cancel: &CancellationToken) -> Result<()> {
        self.delete(EndPoint::Files, ids, cancel).await
    }

    /// Downloads the content of one file.
    pub async fn download_file(&self, id: i64, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.download(EndPoint::FilesRaw, &serde_json::json!({ "id": id }), cancel)
            .await
    }

    /// Retrieves the current totals report.
    pub async fn get_current_totals_report(
        &self,
        filter: &CurrentTotalsReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult<CurrentTotalsReport>> {
        self.report(EndPoint::CurrentTotalsReport, filter, cancel)
            .await
    }

    /// Retrieves the payroll report.
    pub async fn get_payroll_report(
        &self,
        filter: &PayrollReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult<PayrollReport>> {
        self.report(EndPoint::PayrollReport, filter, cancel).await
    }
}
