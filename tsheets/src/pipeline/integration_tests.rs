//! End-to-end tests for factory-built pipelines against a mocked transport.

#[cfg(test)]
mod tests {
    use crate::cancellation::CancellationToken;
    use crate::context::{ApiContext, RequestOptions};
    use crate::errors::{ApiError, Error, ErrorKind};
    use crate::events::{CollectingEventSink, BATCH_COMPLETED, PAGE_FETCHED};
    use crate::model::{EndPoint, PayrollReport, User};
    use crate::pipeline::PipelineFactory;
    use crate::transport::MockTransport;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn user(first_name: &str) -> User {
        User {
            first_name: Some(first_name.to_string()),
            ..User::default()
        }
    }

    fn users_page(ids: &[i64], more: bool) -> String {
        let records: serde_json::Map<String, Value> = ids
            .iter()
            .map(|id| (id.to_string(), json!({"id": id, "first_name": format!("user-{id}")})))
            .collect();
        let group_id = ids[0] * 10;
        let mut groups = serde_json::Map::new();
        groups.insert(group_id.to_string(), json!({"id": group_id, "name": "crew"}));
        json!({
            "results": {"users": records},
            "more": more,
            "supplemental_data": {"groups": groups}
        })
        .to_string()
    }

    /// Echoes each posted item back with an id; names starting with "fail" get 409.
    fn echo_users(body: &str) -> String {
        let body: Value = serde_json::from_str(body).unwrap();
        let mut records = serde_json::Map::new();
        for (i, item) in body["data"].as_array().unwrap().iter().enumerate() {
            let mut record = item.clone();
            let failed = record["first_name"]
                .as_str()
                .is_some_and(|name| name.starts_with("fail"));
            record["id"] = json!(1000 + i);
            record["_status_code"] = json!(if failed { 409 } else { 200 });
            record["_status_message"] = json!(if failed { "Conflict" } else { "Created" });
            records.insert((i + 1).to_string(), record);
        }
        json!({"results": {"users": records}}).to_string()
    }

    fn data_len(body: &str) -> usize {
        let body: Value = serde_json::from_str(body).unwrap();
        body["data"].as_array().map_or(0, Vec::len)
    }

    #[tokio::test]
    async fn test_auto_paging_concatenates_pages_in_order() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .withf(|endpoint, query, _, _| *endpoint == EndPoint::Users && !query.contains_key("page"))
            .times(1)
            .returning(|_, _, _, _| Ok(users_page(&[1, 2], true)));
        mock.expect_get()
            .withf(|_, query, _, _| query.get("page").map(String::as_str) == Some("2"))
            .times(1)
            .returning(|_, _, _, _| Ok(users_page(&[3], false)));

        let events = Arc::new(CollectingEventSink::new());
        let factory = PipelineFactory::new(Arc::new(mock)).with_event_sink(events.clone());
        let mut ctx: ApiContext<User> =
            ApiContext::get(EndPoint::Users, BTreeMap::new(), RequestOptions::default());

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        let ids: Vec<_> = ctx.results().items.iter().filter_map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ctx.supplemental().groups.len(), 2);
        assert_eq!(ctx.paging().map(|p| p.has_more), Some(false));
        assert_eq!(events.events_of_type(PAGE_FETCHED).len(), 2);
    }

    #[tokio::test]
    async fn test_max_pages_stops_early() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _, _, _| Ok(users_page(&[1], true)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let options = RequestOptions::new().with_max_pages(1);
        let mut ctx: ApiContext<User> = ApiContext::get(EndPoint::Users, BTreeMap::new(), options);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();
        assert_eq!(ctx.results().items.len(), 1);
    }

    #[tokio::test]
    async fn test_more_on_last_page_number_is_invalid_state() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _, _, _| Ok(users_page(&[1], true)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let options = RequestOptions::new().with_page(u32::MAX);
        let mut ctx: ApiContext<User> = ApiContext::get(EndPoint::Users, BTreeMap::new(), options);

        let err = factory
            .execute(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_single_page_when_auto_paging_disabled() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .withf(|_, query, _, _| query.get("page").map(String::as_str) == Some("3"))
            .times(1)
            .returning(|_, _, _, _| Ok(users_page(&[7], true)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let options = RequestOptions::new().with_page(3).with_auto_paging(false);
        let mut ctx: ApiContext<User> = ApiContext::get(EndPoint::Users, BTreeMap::new(), options);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        assert_eq!(ctx.results().items.len(), 1);
        let paging = ctx.paging().unwrap();
        assert!(paging.has_more);
        assert_eq!(paging.current_page, 3);
    }

    #[tokio::test]
    async fn test_cancellation_between_pages_skips_next_page() {
        let cancel = Arc::new(CancellationToken::new());
        let trigger = cancel.clone();

        let mut mock = MockTransport::new();
        mock.expect_get().times(1).returning(move |_, _, _, _| {
            trigger.cancel("caller gave up");
            Ok(users_page(&[1, 2], true))
        });

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut ctx: ApiContext<User> =
            ApiContext::get(EndPoint::Users, BTreeMap::new(), RequestOptions::default());

        let err = factory.execute(&mut ctx, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_large_create_is_split_into_batches() {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let recorded = sizes.clone();

        let mut mock = MockTransport::new();
        mock.expect_create().times(3).returning(move |_, body, _, _| {
            recorded.lock().push(data_len(body));
            Ok(echo_users(body))
        });

        let events = Arc::new(CollectingEventSink::new());
        let factory = PipelineFactory::new(Arc::new(mock)).with_event_sink(events.clone());
        let items: Vec<User> = (0..120).map(|i| user(&format!("u{i}"))).collect();
        let mut ctx = ApiContext::create(EndPoint::Users, items);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        assert_eq!(*sizes.lock(), vec![50, 50, 20]);
        assert_eq!(ctx.results().items.len(), 120);
        assert_eq!(ctx.results().items[119].first_name.as_deref(), Some("u119"));
        assert_eq!(ctx.items().unwrap().len(), 120);
        assert_eq!(events.events_of_type(BATCH_COMPLETED).len(), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_fills_last_batch() {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let recorded = sizes.clone();

        let mut mock = MockTransport::new();
        mock.expect_create().times(2).returning(move |_, body, _, _| {
            recorded.lock().push(data_len(body));
            Ok(echo_users(body))
        });

        let factory = PipelineFactory::new(Arc::new(mock));
        let items: Vec<User> = (0..100).map(|i| user(&format!("u{i}"))).collect();
        let mut ctx = ApiContext::create(EndPoint::Users, items);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        assert_eq!(*sizes.lock(), vec![50, 50]);
        assert_eq!(ctx.results().items.len(), 100);
    }

    #[tokio::test]
    async fn test_whole_batch_failure_aborts_remaining_batches() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();

        let mut mock = MockTransport::new();
        mock.expect_create().times(2).returning(move |_, body, _, _| {
            let mut calls = counter.lock();
            *calls += 1;
            if *calls == 2 {
                return Err(ApiError::new(401, "Unauthorized").into());
            }
            Ok(echo_users(body))
        });

        let factory = PipelineFactory::new(Arc::new(mock));
        let items: Vec<User> = (0..120).map(|i| user(&format!("u{i}"))).collect();
        let mut ctx = ApiContext::create(EndPoint::Users, items);

        let err = factory
            .execute(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(*calls.lock(), 2);
        let restored = ctx.items().unwrap();
        assert_eq!(restored.len(), 120);
        assert_eq!(restored[119].first_name.as_deref(), Some("u119"));
    }

    #[tokio::test]
    async fn test_batched_failures_raise_once_with_original_indices() {
        let mut mock = MockTransport::new();
        mock.expect_create()
            .times(3)
            .returning(|_, body, _, _| Ok(echo_users(body)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let items: Vec<User> = (0..120)
            .map(|i| match i {
                3 | 75 => user(&format!("fail{i}")),
                _ => user(&format!("u{i}")),
            })
            .collect();
        let mut ctx = ApiContext::create(EndPoint::Users, items);

        let err = factory
            .execute(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        let multi = err.as_multi_status().unwrap();
        let indices: Vec<_> = multi.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![3, 75]);
        assert_eq!(multi.success_count(), 118);
        assert!(multi.errors().all(|e| e.kind == ErrorKind::Conflict));
        assert_eq!(ctx.results().items.len(), 118);
    }

    #[tokio::test]
    async fn test_cancellation_between_batches() {
        let cancel = Arc::new(CancellationToken::new());
        let trigger = cancel.clone();

        let mut mock = MockTransport::new();
        mock.expect_create().times(1).returning(move |_, body, _, _| {
            trigger.cancel("shutdown");
            Ok(echo_users(body))
        });

        let factory = PipelineFactory::new(Arc::new(mock));
        let items: Vec<User> = (0..60).map(|i| user(&format!("u{i}"))).collect();
        let mut ctx = ApiContext::create(EndPoint::Users, items);

        let err = factory.execute(&mut ctx, &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(ctx.items().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_create_round_trip_omits_id() {
        let mut mock = MockTransport::new();
        mock.expect_create()
            .withf(|endpoint, body, _, _| {
                let body: Value = serde_json::from_str(body).unwrap();
                *endpoint == EndPoint::Users
                    && body["data"]
                        .as_array()
                        .is_some_and(|items| items.len() == 2 && items.iter().all(|i| i.get("id").is_none()))
            })
            .times(1)
            .returning(|_, body, _, _| Ok(echo_users(body)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut first = user("Ann");
        first.id = Some(99);
        let mut ctx = ApiContext::create(EndPoint::Users, vec![first, user("Bob")]);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        let created = &ctx.results().items;
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].id, Some(1000));
        assert_eq!(created[1].first_name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_update_uses_put() {
        let mut mock = MockTransport::new();
        mock.expect_update()
            .times(1)
            .returning(|_, body, _, _| Ok(echo_users(body)));

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut renamed = user("Renamed");
        renamed.id = Some(12);
        let mut ctx = ApiContext::update(EndPoint::Users, vec![renamed]);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();
        assert_eq!(ctx.results().items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_empty_results_succeeds() {
        let mut mock = MockTransport::new();
        mock.expect_delete()
            .withf(|endpoint, ids, _, _| *endpoint == EndPoint::Jobcodes && ids.to_vec() == vec![4, 5])
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"results": {"jobcodes": {}}}).to_string()));

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut ctx = ApiContext::<Value>::delete(EndPoint::Jobcodes, vec![4, 5]).unwrap();

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();
        assert!(ctx.results().is_empty());
    }

    #[tokio::test]
    async fn test_delete_partial_failure() {
        let mut mock = MockTransport::new();
        mock.expect_delete().times(1).returning(|_, _, _, _| {
            Ok(json!({"results": {"jobcodes": {
                "4": {"id": 4, "_status_code": 200, "_status_message": "OK"},
                "5": {"id": 5, "_status_code": 404, "_status_message": "Not Found"}
            }}})
            .to_string())
        });

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut ctx = ApiContext::<Value>::delete(EndPoint::Jobcodes, vec![4, 5]).unwrap();

        let err = factory
            .execute(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        let multi = err.as_multi_status().unwrap();
        assert_eq!(multi.failures[0].id, Some(5));
        assert_eq!(multi.failures[0].index, 1);
        assert_eq!(multi.failures[0].error.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_whole_call_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::new(401, "Unauthorized").into()));

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut ctx: ApiContext<User> =
            ApiContext::get(EndPoint::Users, BTreeMap::new(), RequestOptions::default());

        let err = factory
            .execute(&mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[tokio::test]
    async fn test_report_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect_create()
            .withf(|endpoint, body, _, _| {
                let body: Value = serde_json::from_str(body).unwrap();
                *endpoint == EndPoint::PayrollReport && body["data"]["start_date"] == "2024-01-01"
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(json!({
                    "results": {"payroll_report": {
                        "7": {"user_id": 7, "total_re_seconds": 3600, "total_work_seconds": 3600}
                    }},
                    "supplemental_data": {"users": {"7": {"id": 7, "first_name": "Ann"}}}
                })
                .to_string())
            });

        let factory = PipelineFactory::new(Arc::new(mock));
        let mut ctx: ApiContext<PayrollReport> = ApiContext::report(
            EndPoint::PayrollReport,
            json!({"start_date": "2024-01-01", "end_date": "2024-01-15", "user_ids": null}),
        );

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();

        let report = ctx.decoded_report().unwrap();
        assert_eq!(report.for_user(7).and_then(|r| r.total_re_seconds), Some(3600));
        assert_eq!(ctx.supplemental().users.len(), 1);
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let mut mock = MockTransport::new();
        mock.expect_download()
            .withf(|_, query, _, _| query.get("id").map(String::as_str) == Some("3"))
            .times(1)
            .returning(|_, _, _, _| Ok(b"image".to_vec()));

        let factory = PipelineFactory::new(Arc::new(mock));
        let filter = BTreeMap::from([("id".to_string(), "3".to_string())]);
        let mut ctx: ApiContext<Value> = ApiContext::download(EndPoint::FilesRaw, filter);

        factory.execute(&mut ctx, &CancellationToken::new()).await.unwrap();
        assert_eq!(ctx.payload(), b"image");
    }
}
