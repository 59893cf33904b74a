use chrono::{TimeZone, Utc};
use futurecoin_core::{
    Candle, Currency, Dataset, DatasetStore, IntervalClass, Symbol, merge_datasets,
};
use rust_decimal::Decimal;

fn candle(symbol: &str, day: u32, hour: u32, close: i64) -> Candle {
    let px = Decimal::new(close, 2);
    Candle {
        ts: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
        open: px,
        high: px,
        low: px,
        close: px,
        volume: Decimal::new(15, 1),
        symbol: Symbol::new(symbol).unwrap(),
        currency: Currency::Usdt,
    }
}

fn hourly(symbol: &str, rows: Vec<Candle>) -> Dataset {
    Dataset::new(Symbol::new(symbol).unwrap(), IntervalClass::Hourly, Currency::Usdt, rows)
}

#[test]
fn roundtrips_and_uses_interval_specific_time_column() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    let ds = hourly("BTC", vec![candle("BTC", 1, 2, 100), candle("BTC", 1, 1, 99)]);

    let path = store.write(&ds).unwrap();
    assert!(path.ends_with("btc_hourly.csv"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Datetime,Open,High,Low,Close,Volume,Symbol,Currency"));
    assert!(text.contains("2024-05-01T01:00:00Z"));

    let back = store
        .read(&Symbol::new("BTC").unwrap(), IntervalClass::Hourly)
        .unwrap()
        .unwrap();
    assert_eq!(back, ds);
}

#[test]
fn rewrite_dedups_on_timestamp_and_prefers_fresh_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    store
        .write(&hourly("ETH", vec![candle("ETH", 1, 0, 100), candle("ETH", 1, 1, 101)]))
        .unwrap();
    store
        .write(&hourly("ETH", vec![candle("ETH", 1, 1, 555), candle("ETH", 1, 2, 102)]))
        .unwrap();

    let back = store
        .read(&Symbol::new("ETH").unwrap(), IntervalClass::Hourly)
        .unwrap()
        .unwrap();
    let closes: Vec<Decimal> = back.closes();
    assert_eq!(
        closes,
        vec![Decimal::new(100, 2), Decimal::new(555, 2), Decimal::new(102, 2)]
    );
}

#[test]
fn daily_files_use_date_column() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    let ds = Dataset::new(
        Symbol::new("SOL").unwrap(),
        IntervalClass::Daily,
        Currency::Usdt,
        vec![candle("SOL", 3, 0, 42)],
    );
    let path = store.write(&ds).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("Date,"));
    assert!(text.contains("\n2024-05-03,0.42,"));
}

#[test]
fn merged_table_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    let build = || {
        merge_datasets(
            IntervalClass::Hourly,
            [
                hourly("ETH", vec![candle("ETH", 1, 0, 1), candle("ETH", 1, 1, 2)]),
                hourly("BTC", vec![candle("BTC", 1, 1, 3), candle("BTC", 1, 0, 4)]),
            ],
        )
        .unwrap()
    };
    let first = std::fs::read(store.write_merged(&build()).unwrap()).unwrap();
    let second = std::fs::read(store.write_merged(&build()).unwrap()).unwrap();
    assert_eq!(first, second);

    let merged = store.read_merged(IntervalClass::Hourly).unwrap().unwrap();
    let order: Vec<String> = merged
        .rows()
        .iter()
        .map(|r| format!("{}@{}", r.symbol, r.ts.format("%H")))
        .collect();
    assert_eq!(order, vec!["BTC@00", "ETH@00", "BTC@01", "ETH@01"]);
}

#[test]
fn reads_legacy_files_without_currency_column() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("btc_daily.csv"),
        "Date,Open,High,Low,Close,Volume,Symbol\n2024-01-02,10,12,9,11,100,BTC\n",
    )
    .unwrap();
    let store = DatasetStore::new(dir.path());
    let ds = store
        .read(&Symbol::new("BTC").unwrap(), IntervalClass::Daily)
        .unwrap()
        .unwrap();
    assert_eq!(ds.currency(), Currency::Usd);
    assert_eq!(ds.len(), 1);
}

#[test]
fn missing_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    assert!(
        store
            .read(&Symbol::new("ADA").unwrap(), IntervalClass::Daily)
            .unwrap()
            .is_none()
    );
}

#[test]
fn invalid_stored_rows_are_dropped_and_not_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btc_hourly.csv");
    std::fs::write(
        &path,
        "Datetime,Open,High,Low,Close,Volume,Symbol,Currency\n\
         2024-05-01T00:00:00Z,1.00,1.00,1.00,1.00,1.5,BTC,USDT\n\
         2024-05-01T01:00:00Z,50,10,20,15,-3,BTC,USDT\n",
    )
    .unwrap();
    let store = DatasetStore::new(dir.path());
    let btc = Symbol::new("BTC").unwrap();

    let ds = store.read(&btc, IntervalClass::Hourly).unwrap().unwrap();
    assert_eq!(ds.len(), 1);
    assert!(ds.candles().iter().all(|c| c.validate().is_ok()));

    store
        .write(&hourly("BTC", vec![candle("BTC", 1, 2, 300)]))
        .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("-3"), "{text}");
    assert_eq!(store.read(&btc, IntervalClass::Hourly).unwrap().unwrap().len(), 2);
}

#[test]
fn unparsable_row_does_not_block_later_writes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("eth_hourly.csv"),
        "Datetime,Open,High,Low,Close,Volume,Symbol,Currency\n\
         2024-05-01T00:00:00Z,abc,1,1,1,1,ETH,USDT\n\
         not-a-date,1,1,1,1,1,ETH,USDT\n\
         2024-05-01T01:00:00Z,1.01,1.01,1.01,1.01,1.5,ETH,USDT\n",
    )
    .unwrap();
    let store = DatasetStore::new(dir.path());
    let eth = Symbol::new("ETH").unwrap();

    let ds = store.read(&eth, IntervalClass::Hourly).unwrap().unwrap();
    assert_eq!(ds.closes(), vec![Decimal::new(101, 2)]);

    store
        .write(&hourly("ETH", vec![candle("ETH", 1, 2, 102)]))
        .unwrap();
    let back = store.read(&eth, IntervalClass::Hourly).unwrap().unwrap();
    assert_eq!(back.closes(), vec![Decimal::new(101, 2), Decimal::new(102, 2)]);
}
