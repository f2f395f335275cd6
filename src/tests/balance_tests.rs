#[cfg(test)]
mod tests {
    use crate::currency::{currency_hash_for_symbol, CurrencyNormalizer};
    use crate::db::registry;
    use crate::state::AppState;
    use crate::sync::{balances, ingestion};
    use crate::tests::support::{base_record, setup_pool, test_config, transaction_record};
    use crate::upstream::models::{OriginatorCurrencyData, TokenGenerationServiceData};
    use rust_decimal::Decimal;
    use sqlx::Row;
    use std::str::FromStr;
    use std::sync::Arc;

    fn normalizer() -> CurrencyNormalizer {
        CurrencyNormalizer::new("coti")
    }

    #[tokio::test]
    async fn transfer_conserves_value() {
        let pool = setup_pool().await;
        let state = Arc::new(AppState::new(test_config(), pool.clone()));
        let native = normalizer().native_currency_hash().to_string();

        let records = vec![transaction_record(
            "tx-a",
            Some(1),
            Some(1_500.0),
            vec![
                base_record("IBT", "addr-1", "-10.50"),
                base_record("RBT", "addr-2", "10.50"),
            ],
        )];
        {
            let mut conn = pool.acquire().await.unwrap();
            ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        }

        let processed = balances::aggregate_iteration(&state, &normalizer()).await.unwrap();
        assert_eq!(processed, 1);

        let mut conn = pool.acquire().await.unwrap();
        let debit = registry::get_balance(&mut conn, "addr-1", &native)
            .await
            .unwrap()
            .unwrap();
        let credit = registry::get_balance(&mut conn, "addr-2", &native)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(debit, Decimal::from_str("-10.50").unwrap());
        assert_eq!(credit, Decimal::from_str("10.50").unwrap());
        assert_eq!(debit + credit, Decimal::ZERO);
    }

    #[tokio::test]
    async fn aggregation_is_exactly_once() {
        let pool = setup_pool().await;
        let state = Arc::new(AppState::new(test_config(), pool.clone()));
        let native = normalizer().native_currency_hash().to_string();

        let records = vec![transaction_record(
            "tx-a",
            Some(1),
            Some(1_500.0),
            vec![base_record("RBT", "addr-1", "3")],
        )];
        {
            let mut conn = pool.acquire().await.unwrap();
            ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        }

        assert_eq!(balances::aggregate_iteration(&state, &normalizer()).await.unwrap(), 1);
        // the second pass finds nothing unprocessed
        assert_eq!(balances::aggregate_iteration(&state, &normalizer()).await.unwrap(), 0);

        let mut conn = pool.acquire().await.unwrap();
        let balance = registry::get_balance(&mut conn, "addr-1", &native)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance, Decimal::from(3));
    }

    #[tokio::test]
    async fn pending_and_zero_spend_are_not_aggregated() {
        let pool = setup_pool().await;
        let state = Arc::new(AppState::new(test_config(), pool.clone()));

        let pending = transaction_record(
            "tx-pending",
            Some(1),
            None,
            vec![base_record("RBT", "addr-1", "5")],
        );
        let mut zero_spend = transaction_record(
            "tx-zero",
            Some(2),
            Some(1_500.0),
            vec![base_record("IBT", "addr-2", "0")],
        );
        zero_spend.transaction_type = "ZeroSpend".to_string();
        {
            let mut conn = pool.acquire().await.unwrap();
            ingestion::ingest_batch(&mut conn, &[pending, zero_spend]).await.unwrap();
        }

        assert_eq!(balances::aggregate_iteration(&state, &normalizer()).await.unwrap(), 0);

        let mut conn = pool.acquire().await.unwrap();
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM address_balances")
            .fetch_one(&mut *conn)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn explicit_currency_is_kept_apart_from_native() {
        let pool = setup_pool().await;
        let state = Arc::new(AppState::new(test_config(), pool.clone()));
        let native = normalizer().native_currency_hash().to_string();

        let mut token_credit = base_record("RBT", "addr-1", "5");
        token_credit.currency_hash = Some("cafe01".to_string());
        let records = vec![transaction_record(
            "tx-a",
            Some(1),
            Some(1_500.0),
            vec![base_record("RBT", "addr-1", "2"), token_credit],
        )];
        {
            let mut conn = pool.acquire().await.unwrap();
            ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        }

        balances::aggregate_iteration(&state, &normalizer()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let native_balance = registry::get_balance(&mut conn, "addr-1", &native)
            .await
            .unwrap()
            .unwrap();
        let token_balance = registry::get_balance(&mut conn, "addr-1", "cafe01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(native_balance, Decimal::from(2));
        assert_eq!(token_balance, Decimal::from(5));
    }

    #[tokio::test]
    async fn token_generation_registers_the_new_currency() {
        let pool = setup_pool().await;
        let state = Arc::new(AppState::new(test_config(), pool.clone()));

        let mut fee = base_record("TGBT", "addr-1", "-1");
        fee.token_generation_service_data = Some(TokenGenerationServiceData {
            fee_amount: Decimal::ONE,
            originator_currency_data: Some(OriginatorCurrencyData {
                name: Some("Test Token".to_string()),
                symbol: "abc".to_string(),
                description: None,
                originator_hash: None,
                total_supply: Decimal::from(1_000_000),
                scale: 8,
            }),
        });
        let records = vec![transaction_record("tx-gen", Some(1), Some(1_500.0), vec![fee])];
        {
            let mut conn = pool.acquire().await.unwrap();
            ingestion::ingest_batch(&mut conn, &records).await.unwrap();
        }

        balances::aggregate_iteration(&state, &normalizer()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let expected_hash = currency_hash_for_symbol("abc");
        let row = sqlx::query("SELECT transaction_id FROM currencies WHERE hash = ?")
            .bind(&expected_hash)
            .fetch_optional(&mut *conn)
            .await
            .unwrap();
        let transaction_id: Option<i64> = row.expect("currency row").get("transaction_id");
        assert!(transaction_id.is_some());
    }
}
