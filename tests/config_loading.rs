use homebound::config::Config;
use homebound::homes::{CostAggregation, OverwritePolicy};

#[tokio::test]
async fn default_config_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homebound.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let config = Config::load(path).await.unwrap();
    assert_eq!(config.homes.data_dir, "./data");
    assert_eq!(config.costs.default_currency, "coins");
    assert_eq!(config.costs.aggregation, CostAggregation::Sum);
    assert_eq!(config.capacity.overwrite_policy, OverwritePolicy::Exempt);
}

#[tokio::test]
async fn partial_config_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("homebound.toml");
    tokio::fs::write(
        &path,
        "[costs]\ndefault_currency = \"emeralds\"\naggregation = \"max\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .await
    .unwrap();

    let config = Config::load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(config.costs.default_currency, "emeralds");
    assert_eq!(config.costs.aggregation, CostAggregation::Max);
    assert_eq!(config.homes.save_file, "homes.csv");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[tokio::test]
async fn invalid_configs_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.toml");
    let err = Config::load(missing.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));

    let clash = dir.path().join("clash.toml");
    tokio::fs::write(&clash, "[homes]\nsave_file = \"a.csv\"\nbackup_file = \"a.csv\"\n")
        .await
        .unwrap();
    let err = Config::load(clash.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("must differ"));

    let bad_policy = dir.path().join("bad.toml");
    tokio::fs::write(&bad_policy, "[costs]\naggregation = \"average\"\n")
        .await
        .unwrap();
    assert!(Config::load(bad_policy.to_str().unwrap()).await.is_err());
}
