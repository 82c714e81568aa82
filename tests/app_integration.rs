use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const MARKETS_BODY: &str = r#"[
        {
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.example/btc.png",
            "current_price": 50000.0,
            "market_cap": 980000000000.0,
            "market_cap_rank": 1,
            "price_change_percentage_24h": 2.5,
            "price_change_percentage_24h_in_currency": 2.4,
            "last_updated": "2025-09-11T12:00:00.000Z"
        },
        {
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "image": "https://assets.example/eth.png",
            "current_price": 3000.0,
            "market_cap": 360000000000.0,
            "market_cap_rank": 2,
            "price_change_percentage_24h": -1.2
        }
    ]"#;

    pub const DETAIL_BODY: &str = r#"{
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "market_cap_rank": 1,
        "description": {"en": "Digital gold."},
        "market_data": {
            "current_price": {"usd": 50000.0},
            "high_24h": {"usd": 51000.0},
            "low_24h": {"usd": 49000.0},
            "total_volume": {"usd": 30000000000.0},
            "circulating_supply": 19500000.0
        }
    }"#;

    pub const CHART_BODY: &str = r#"{
        "prices": [
            [1757548800000, 49000.0],
            [1757635200000, 49500.0],
            [1757721600000, 50000.0]
        ]
    }"#;

    /// Mounts all three CoinGecko endpoints on one server.
    pub async fn create_coingecko_mock() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MARKETS_BODY))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/coins/bitcoin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_BODY))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CHART_BODY))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
            api:
              base_url: {base_url}
            currency: "usd"
        "#
        );
        std::fs::write(config_file.path(), &config_content).expect("Failed to write config file");
        config_file
    }
}

#[test_log::test(tokio::test)]
async fn test_markets_flow_with_mock() {
    let mock_server = test_utils::create_coingecko_mock().await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = coindeck::run_command(
        coindeck::AppCommand::Markets(coindeck::MarketFilterArgs::default()),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Markets command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_coin_detail_flow_with_mock() {
    let mock_server = test_utils::create_coingecko_mock().await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = coindeck::run_command(
        coindeck::AppCommand::Coin {
            id: "bitcoin".to_string(),
            currency: None,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Coin command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_portfolio_flow_with_mock() {
    let mock_server = test_utils::create_coingecko_mock().await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = coindeck::run_command(
        coindeck::AppCommand::Portfolio {
            holds: vec![
                ("bitcoin".to_string(), "2".to_string()),
                ("ethereum".to_string(), "0.5".to_string()),
            ],
            currency: None,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Portfolio command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_api_error_surfaces_through_run_command() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"error": "rate limit exceeded"}"#),
        )
        .mount(&mock_server)
        .await;

    let config_file = test_utils::write_config(&mock_server.uri());

    let result = coindeck::run_command(
        coindeck::AppCommand::Markets(coindeck::MarketFilterArgs::default()),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("rate-limited request must fail");
    let message = format!("{err}");
    info!(%message, "run_command returned the normalized API error");
    assert!(message.contains("rate limit exceeded"));
    assert!(message.contains("429"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_currency_is_rejected() {
    let mock_server = test_utils::create_coingecko_mock().await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
        api:
          base_url: {}
        currency: "gbp"
    "#,
        mock_server.uri()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = coindeck::run_command(
        coindeck::AppCommand::Markets(coindeck::MarketFilterArgs::default()),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_err(), "unsupported currency must be rejected");
}

#[test_log::test(tokio::test)]
async fn test_session_flow_against_mock_provider() {
    use coindeck::filter::FilterSpec;
    use coindeck::providers::CoinGeckoProvider;
    use coindeck::session::{DetailState, Session};

    let mock_server = test_utils::create_coingecko_mock().await;
    let provider = CoinGeckoProvider::new(&mock_server.uri(), None).expect("provider");

    let mut session = Session::new(FilterSpec::default());
    session.refresh(&provider).await;

    assert_eq!(session.coins().len(), 2);
    assert_eq!(session.selected_coin(), Some("bitcoin"));
    match session.detail() {
        DetailState::Ready { detail, chart } => {
            assert_eq!(detail.id, "bitcoin");
            assert_eq!(chart.len(), 3);
            assert_eq!(chart[0].label, "Sep 11");
        }
        other => panic!("expected Ready detail state, got {other:?}"),
    }

    session.add_holding("bitcoin", "2").expect("valid holding");
    let valuations = session.valuations();
    assert_eq!(valuations.len(), 1);
    assert_eq!(valuations[0].current_value, 100_000.0);
}
