#[cfg(test)]
mod tests {
    use crate::db::app_state::{self, LAST_MONITORED_TRANSACTION_INDEX};
    use crate::db::{registry, transaction};
    use crate::state::AppState;
    use crate::sync::ingestion::{self, compute_window};
    use crate::tests::support::{base_record, setup_pool, test_config, transaction_record};
    use crate::upstream::NodeClient;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[test]
    fn window_reaches_tip_on_small_backlog() {
        // empty store, tip at 5: the whole range fits in one batch
        assert_eq!(compute_window(-1, 5, 3000), (0, 5, true));
    }

    #[test]
    fn window_is_capped_by_batch_size() {
        let (start, end, reached_tip) = compute_window(-1, 10_000, 3000);
        assert_eq!((start, end), (0, 2999));
        assert!(!reached_tip);

        let (start, end, reached_tip) = compute_window(2999, 10_000, 3000);
        assert_eq!((start, end), (3000, 5999));
        assert!(!reached_tip);
    }

    #[test]
    fn window_is_empty_when_caught_up() {
        let (start, end, reached_tip) = compute_window(5, 5, 3000);
        assert!(start > end);
        assert!(reached_tip);
    }

    #[tokio::test]
    async fn batch_ingest_persists_transactions_and_registries() {
        let pool = setup_pool().await;
        let records = vec![
            transaction_record(
                "tx-a",
                Some(2),
                Some(1_500.0),
                vec![
                    base_record("IBT", "addr-1", "-10.50"),
                    base_record("RBT", "addr-2", "10.50"),
                ],
            ),
            transaction_record("tx-b", Some(5), None, vec![base_record("IBT", "addr-1", "-1")]),
        ];

        let mut conn = pool.acquire().await.unwrap();
        let max_seen = ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        assert_eq!(max_seen, 5);

        let stored = transaction::find_by_hashes(
            &mut conn,
            &["tx-a".to_string(), "tx-b".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(stored.len(), 2);

        // addr-1 appears in both transactions, addr-2 in one
        assert_eq!(registry::get_transaction_count(&mut conn, "addr-1").await.unwrap(), 2);
        assert_eq!(registry::get_transaction_count(&mut conn, "addr-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reingestion_is_idempotent() {
        let pool = setup_pool().await;
        let records = vec![transaction_record(
            "tx-a",
            Some(1),
            Some(1_500.0),
            vec![
                base_record("IBT", "addr-1", "-2"),
                base_record("RBT", "addr-2", "2"),
            ],
        )];

        let mut conn = pool.acquire().await.unwrap();
        ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        ingestion::ingest_batch(&mut conn, &records).await.unwrap();

        let stored = transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(registry::get_transaction_count(&mut conn, "addr-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_rows_are_updated_in_place() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        // first sighting: still pending
        let pending = vec![transaction_record("tx-a", None, None, vec![])];
        ingestion::ingest_batch(&mut conn, &pending).await.unwrap();
        let stored = &transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap()[0];
        assert!(stored.ledger_index.is_none());
        assert!(stored.consensus_update_time.is_none());

        // later sighting carries index and consensus
        let confirmed = vec![transaction_record("tx-a", Some(7), Some(1_500.0), vec![])];
        ingestion::ingest_batch(&mut conn, &confirmed).await.unwrap();
        let stored = &transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap()[0];
        assert_eq!(stored.ledger_index, Some(7));
        assert_eq!(stored.consensus_update_time, Some(1_500.0));
        assert!((stored.trust_chain_trust_score - 110.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn trust_score_never_regresses() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut record = transaction_record("tx-a", None, None, vec![]);
        record.trust_chain_trust_score = 80.0;
        ingestion::ingest_batch(&mut conn, &[record.clone()]).await.unwrap();

        record.trust_chain_trust_score = 40.0;
        ingestion::ingest_batch(&mut conn, &[record]).await.unwrap();

        let stored = &transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap()[0];
        assert!((stored.trust_chain_trust_score - 80.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_sub_record_tag_is_skipped() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let records = vec![transaction_record(
            "tx-a",
            Some(1),
            Some(1_500.0),
            vec![
                base_record("XYZ", "addr-weird", "3"),
                base_record("IBT", "addr-1", "-3"),
            ],
        )];
        ingestion::ingest_batch(&mut conn, &records).await.unwrap();

        // the transaction and the recognized sub-record survive
        let stored = transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(registry::get_transaction_count(&mut conn, "addr-1").await.unwrap(), 1);
        // the unrecognized one leaves no trace
        assert_eq!(registry::get_transaction_count(&mut conn, "addr-weird").await.unwrap(), 0);
    }

    async fn spawn_mock_node(tip: i64, batch: Value) -> String {
        let app = Router::new()
            .route(
                "/transaction/lastIndex",
                get(move || async move { Json(json!({"status": "success", "lastIndex": tip})) }),
            )
            .route(
                "/transaction_batch",
                post(move |_body: Json<Value>| {
                    let batch = batch.clone();
                    async move { Json(batch) }
                }),
            )
            .route(
                "/transaction/none-indexed/batch",
                get(|| async { Json(json!([])) }),
            )
            .route(
                "/transaction/multiple",
                post(|_body: Json<Value>| async { Json(json!([])) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn full_iteration_advances_the_cursor() {
        let batch = json!([
            {
                "hash": "tx-a",
                "index": 2,
                "amount": "10.50",
                "attachmentTime": 1000.0,
                "type": "Transfer",
                "transactionConsensusUpdateTime": 1500.0,
                "trustChainConsensus": true,
                "trustChainTrustScore": 110.0,
                "baseTransactions": [
                    {"hash": "bt-1", "name": "IBT", "addressHash": "addr-1", "amount": "-10.50"},
                    {"hash": "bt-2", "name": "RBT", "addressHash": "addr-2", "amount": "10.50"}
                ]
            },
            {
                "hash": "tx-b",
                "index": 5,
                "amount": "1",
                "attachmentTime": 1001.0,
                "type": "Transfer",
                "baseTransactions": []
            }
        ]);
        let base_url = spawn_mock_node(5, batch).await;

        let pool = setup_pool().await;
        let mut config = test_config();
        config.fullnode_url = base_url.clone();
        config.backup_fullnode_url = base_url.clone();
        let client = NodeClient::new(&config).unwrap();
        let state = Arc::new(AppState::new(config, pool.clone()));

        let mut include_unindexed = false;
        ingestion::sync_iteration(&state, &client, &base_url, &mut include_unindexed)
            .await
            .unwrap();

        // reached the tip, so the pending set joins future iterations
        assert!(include_unindexed);
        assert_eq!(state.last_iteration_index.load(Ordering::Relaxed), 5);

        let mut conn = pool.acquire().await.unwrap();
        let cursor = app_state::get_cursor(&mut conn, LAST_MONITORED_TRANSACTION_INDEX)
            .await
            .unwrap();
        assert_eq!(cursor, 5);

        let stored = transaction::find_by_hashes(
            &mut conn,
            &["tx-a".to_string(), "tx-b".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(stored.len(), 2);
    }

    async fn spawn_failing_node(tip: i64) -> String {
        let app = Router::new()
            .route(
                "/transaction/lastIndex",
                get(move || async move { Json(json!({"status": "success", "lastIndex": tip})) }),
            )
            .route(
                "/transaction_batch",
                post(|_body: Json<Value>| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn failed_iteration_leaves_cursor_and_rows_untouched() {
        let batch = json!([
            {
                "hash": "tx-a",
                "index": 5,
                "amount": "1",
                "attachmentTime": 1000.0,
                "type": "Transfer",
                "baseTransactions": []
            }
        ]);
        let good_url = spawn_mock_node(5, batch).await;

        let pool = setup_pool().await;
        let mut config = test_config();
        config.fullnode_url = good_url.clone();
        config.backup_fullnode_url = good_url.clone();
        let client = NodeClient::new(&config).unwrap();
        let state = Arc::new(AppState::new(config, pool.clone()));

        let mut include_unindexed = false;
        ingestion::sync_iteration(&state, &client, &good_url, &mut include_unindexed)
            .await
            .unwrap();

        // the node advances but its batch endpoint starts erroring
        let failing_url = spawn_failing_node(10).await;
        let result =
            ingestion::sync_iteration(&state, &client, &failing_url, &mut include_unindexed).await;
        assert!(result.is_err());

        let mut conn = pool.acquire().await.unwrap();
        let cursor = app_state::get_cursor(&mut conn, LAST_MONITORED_TRANSACTION_INDEX)
            .await
            .unwrap();
        assert_eq!(cursor, 5);
        let stored = transaction::find_by_hashes(&mut conn, &["tx-a".to_string()])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn cursor_starts_at_minus_one() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let cursor = app_state::get_cursor(&mut conn, LAST_MONITORED_TRANSACTION_INDEX)
            .await
            .unwrap();
        assert_eq!(cursor, -1);
    }
}
