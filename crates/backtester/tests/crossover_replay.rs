//! Replay over a synthetic trending series with real moving-average
//! dynamics: decline, rally (bullish cross), decline again (bearish cross).

use backtester::simulate;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use trendline_core::types::Bar;

fn trailing_mean(closes: &[Decimal], i: usize, window: usize) -> Option<Decimal> {
    if i + 1 < window {
        return None;
    }
    let sum: Decimal = closes[i + 1 - window..=i].iter().copied().sum();
    Some(sum / Decimal::from(window as u64))
}

fn bars_from_closes(closes: &[Decimal]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: "TEST".to_string(),
            date: start + Duration::days(i as i64),
            close_price: close,
            ma_50: trailing_mean(closes, i, 5),
            ma_100: trailing_mean(closes, i, 10),
            volume: Some(1_000_000),
        })
        .collect()
}

#[test]
fn test_replay_matches_hand_computed_trades() {
    // 20 days down from 100, 25 days up to 130, 25 days back down to 80.
    let mut closes: Vec<Decimal> = Vec::new();
    for i in 0..20 {
        closes.push(Decimal::from(100 - i));
    }
    for i in 0..25 {
        closes.push(Decimal::from(81 + 2 * i));
    }
    for i in 0..25 {
        closes.push(Decimal::from(129 - 2 * i));
    }

    let bars = bars_from_closes(&closes);
    let initial = Decimal::from(10_000);
    let result = simulate(&bars, initial);

    // Locate the crossovers the simulator must have acted on.
    let mut buy_price = None;
    let mut sell_price = None;
    for pair in bars.windows(2) {
        let (Some(p50), Some(p100), Some(c50), Some(c100)) = (
            pair[0].ma_50,
            pair[0].ma_100,
            pair[1].ma_50,
            pair[1].ma_100,
        ) else {
            continue;
        };
        if buy_price.is_none() && p50 < p100 && c50 > c100 {
            buy_price = Some(pair[1].close_price);
        } else if buy_price.is_some() && sell_price.is_none() && p50 > p100 && c50 < c100 {
            sell_price = Some(pair[1].close_price);
        }
    }

    let buy_price = buy_price.expect("series must produce a bullish cross");
    let sell_price = sell_price.expect("series must produce a bearish cross");

    let shares = (initial / buy_price).floor();
    let expected = initial - shares * buy_price + shares * sell_price;

    assert_eq!(result.final_value, expected);
    assert_eq!(result.daily_prices.len(), bars.len());
    assert_eq!(
        result.total_return_pct,
        (expected - initial) / initial * Decimal::ONE_HUNDRED
    );
}

#[test]
fn test_flat_series_never_trades() {
    let closes: Vec<Decimal> = vec![Decimal::from(50); 30];
    let bars = bars_from_closes(&closes);

    let result = simulate(&bars, Decimal::from(10_000));
    assert_eq!(result.final_value, Decimal::from(10_000));
}
