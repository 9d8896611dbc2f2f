//! TWAP scheduler tests
//!
//! Slices go through the real order builder and dispatcher; only the
//! transport and the clock are fakes, so no test ever sleeps for real.

use basicbot_exchanges::binance::TwapPlan;
use basicbot_exchanges::{ErrorKind, ExchangeError, HttpMethod};
use basicbot_tests::*;
use proptest::prelude::*;
use rstest::*;
use std::time::Duration;

fn quantity_of(query: &str) -> String {
    query_pairs(query)
        .into_iter()
        .find(|(k, _)| k == "quantity")
        .map(|(_, v)| v)
        .unwrap()
}

// ============================================================================
// SCHEDULE
// ============================================================================

#[cfg(test)]
mod schedule_tests {
    use super::*;

    #[monoio::test]
    async fn test_eth_sell_five_slices_over_a_minute() {
        let client = live_client(ScriptedTransport::new());

        let run = client
            .run_twap("ETHUSDT", "SELL", qty("0.5"), 5, 60)
            .await
            .unwrap();

        assert_eq!(run.len(), 5);
        assert_eq!(run.succeeded(), 5);

        let orders = client.transport().order_requests();
        assert_eq!(orders.len(), 5);
        for order in &orders {
            assert_eq!(order.method, HttpMethod::Post);
            assert!(order.url.ends_with("/fapi/v1/order"));
            assert!(order.query.starts_with("symbol=ETHUSDT&side=SELL&type=MARKET&quantity=0.1&"));
        }

        assert_eq!(client.clock().sleeps(), vec![Duration::from_secs(12); 4]);
    }

    #[monoio::test]
    async fn test_results_in_submission_order() {
        let client = live_client(ScriptedTransport::new());

        let run = client
            .run_twap("BTCUSDT", "BUY", qty("0.004"), 4, 8)
            .await
            .unwrap();

        let indices: Vec<u32> = run.iter().map(|slice| slice.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        let order_ids: Vec<u64> = run
            .iter()
            .map(|slice| slice.outcome.as_ref().unwrap().order_ack().unwrap().order_id)
            .collect();
        assert_eq!(order_ids, vec![1, 2, 3, 4]);
    }

    #[rstest]
    #[case(1, 60)]
    #[case(3, 0)]
    #[monoio::test]
    async fn test_no_sleep_after_last_slice(#[case] slices: u32, #[case] duration: i64) {
        let client = live_client(ScriptedTransport::new());

        let run = client
            .run_twap("BTCUSDT", "BUY", qty("0.003"), slices, duration)
            .await
            .unwrap();

        assert_eq!(run.len(), slices as usize);
        assert!(client.clock().sleeps().is_empty());
    }

    #[monoio::test]
    async fn test_fractional_interval() {
        let client = live_client(ScriptedTransport::new());
        client
            .run_twap("BTCUSDT", "BUY", qty("0.003"), 3, 10)
            .await
            .unwrap();

        let sleeps = client.clock().sleeps();
        assert_eq!(sleeps.len(), 2);
        assert!(sleeps.iter().all(|d| (d.as_secs_f64() - 10.0 / 3.0).abs() < 1e-6));
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[rstest]
    #[case(0, 60)]
    #[case(5, -1)]
    #[monoio::test]
    async fn test_bad_plan_rejected_before_any_order(#[case] slices: u32, #[case] duration: i64) {
        let client = live_client(ScriptedTransport::new());

        let err = client
            .run_twap("BTCUSDT", "BUY", qty("1"), slices, duration)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(client.transport().requests().is_empty());
    }

    #[rstest]
    #[case(0, 60)]
    #[case(2, -4)]
    #[monoio::test]
    async fn test_hand_built_plan_rejected_before_any_order(#[case] slices: u32, #[case] duration: i64) {
        let client = live_client(ScriptedTransport::new());
        let plan = TwapPlan {
            symbol: "BTCUSDT".to_string(),
            side: "BUY".to_string(),
            total_quantity: qty("1"),
            slices,
            duration_secs: duration,
        };

        let err = client.execute_twap(plan).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(client.transport().requests().is_empty());
        assert!(client.clock().sleeps().is_empty());
    }

    #[monoio::test]
    async fn test_invalid_side_recorded_on_every_slice() {
        let client = live_client(ScriptedTransport::new());

        let run = client
            .run_twap("BTCUSDT", "HOLD", qty("1"), 3, 0)
            .await
            .unwrap();

        assert_eq!(run.len(), 3);
        assert_eq!(run.failed(), 3);
        assert!(run.iter().all(|slice| slice.error().unwrap().is_validation()));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_plan_quantities() {
        let plan = TwapPlan::new("BTCUSDT", "BUY", qty("1"), 4, 60).unwrap();
        assert_eq!(plan.slice_quantity().unwrap(), qty("0.25"));
        assert_eq!(plan.interval(), Duration::from_secs(15));
    }
}

// ============================================================================
// FAILURE ISOLATION
// ============================================================================

#[cfg(test)]
mod isolation_tests {
    use super::*;

    fn failing_at(k: u32, error: ExchangeError) -> ScriptedTransport {
        let mut transport = ScriptedTransport::new();
        for i in 1..=5 {
            transport = if i == k {
                transport.then_fail(error.clone())
            } else {
                transport.then_respond(200, &order_ack_body(u64::from(i)))
            };
        }
        transport
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(5)]
    #[monoio::test]
    async fn test_transport_failure_at_slice_k(#[case] k: u32) {
        let client = live_client(failing_at(k, ExchangeError::ConnectionFailed("reset by peer".into())));

        let run = client
            .run_twap("ETHUSDT", "SELL", qty("0.5"), 5, 60)
            .await
            .unwrap();

        assert_eq!(run.len(), 5);
        assert_eq!(run.failed(), 1);
        for slice in run.iter() {
            if slice.index == k {
                assert_eq!(slice.error().unwrap().kind(), ErrorKind::Transport);
            } else {
                assert!(slice.is_ok(), "slice {} should have succeeded", slice.index);
            }
        }

        assert_eq!(client.transport().order_requests().len(), 5);
        assert_eq!(client.clock().sleeps().len(), 4);
    }

    #[monoio::test]
    async fn test_functional_error_mid_run() {
        let transport = ScriptedTransport::new()
            .then_respond(200, &order_ack_body(1))
            .then_respond(200, r#"{"code":-2019,"msg":"Margin is insufficient."}"#)
            .then_respond(200, &order_ack_body(3));
        let client = live_client(transport);

        let run = client
            .run_twap("BTCUSDT", "BUY", qty("0.3"), 3, 3)
            .await
            .unwrap();

        assert!(run.results[0].is_ok());
        assert!(run.results[1].error().unwrap().is_api());
        assert!(run.results[2].is_ok());
        assert_eq!(
            run.results[1].to_string(),
            r#"{"error":"Binance error -2019: Margin is insufficient."}"#
        );
    }

    #[monoio::test]
    async fn test_every_slice_failing_still_returns_full_run() {
        let transport = ScriptedTransport::new()
            .then_fail(ExchangeError::Timeout("10s".into()))
            .then_fail(ExchangeError::Timeout("10s".into()));
        let client = live_client(transport);

        let run = client
            .run_twap("BTCUSDT", "BUY", qty("0.2"), 2, 2)
            .await
            .unwrap();

        assert_eq!(run.len(), 2);
        assert_eq!(run.succeeded(), 0);
        assert_eq!(client.clock().sleeps(), vec![Duration::from_secs(1)]);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_quantity_conservation(
            units in 1u64..1_000_000,
            scale in 0u32..6,
            slices in 1u32..20,
        ) {
            let total = scaled(units, scale);
            let client = dry_run_client(ScriptedTransport::new());

            let run = block_on(client.run_twap("BTCUSDT", "BUY", total, slices, 0)).unwrap();

            prop_assert_eq!(run.len(), slices as usize);
            let requested: f64 = run.requested_quantity().to_string().parse().unwrap();
            let expected: f64 = total.to_string().parse().unwrap();
            prop_assert!((requested - expected).abs() < 1e-9);

            let echoed: Vec<String> = run
                .iter()
                .map(|slice| {
                    let echo = slice.outcome.as_ref().unwrap().dry_run_echo().unwrap().clone();
                    quantity_of(&echo.params.to_query_string())
                })
                .collect();
            prop_assert!(echoed.iter().all(|q| q == &echoed[0]));
            prop_assert!(client.transport().requests().is_empty());
        }
    }
}
