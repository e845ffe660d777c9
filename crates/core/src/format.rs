//! Display formatting for engine values

use chrono::DateTime;

use crate::types::U256;

/// Wei per ether (18 decimals)
const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Fractional digits shown for ether amounts before trimming
const ETHER_DECIMALS: usize = 18;

/// Placeholder substituted by [`gateway_url`]
pub const CID_PLACEHOLDER: &str = "%C";

/// Format a wei amount as ether.
///
/// Exact integer arithmetic: trailing fractional zeros are trimmed but one
/// digit is always kept, so `10^18` is `"1.0"` and `0` is `"0.0"`.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let fraction = format!("{:0>width$}", (wei % unit).to_string(), width = ETHER_DECIMALS);
    let trimmed = fraction.trim_end_matches('0');

    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}

/// Format a fixed-point rate multiplier, e.g. `"1.5x"`
pub fn format_rate(rate: U256) -> String {
    format!("{}x", format_ether(rate))
}

/// Render a block timestamp as absolute UTC time plus a relative phrase.
///
/// `now` is unix seconds. A zero blocktime (unset record) renders as `-`.
pub fn render_blocktime(blocktime: u64, now: u64) -> String {
    if blocktime == 0 {
        return "-".to_string();
    }

    let absolute = i64::try_from(blocktime)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    match absolute {
        Some(absolute) => format!("{absolute} ({})", relative_time(blocktime, now)),
        None => blocktime.to_string(),
    }
}

fn relative_time(then: u64, now: u64) -> String {
    let (delta, future) = if now >= then { (now - then, false) } else { (then - now, true) };

    let (count, unit) = match delta {
        0..=4 => return "just now".to_string(),
        5..=59 => (delta, "second"),
        60..=3_599 => (delta / 60, "minute"),
        3_600..=86_399 => (delta / 3_600, "hour"),
        _ => (delta / 86_400, "day"),
    };
    let plural = if count == 1 { "" } else { "s" };

    if future {
        format!("in {count} {unit}{plural}")
    } else {
        format!("{count} {unit}{plural} ago")
    }
}

/// Render raw multihash bytes as a base58btc content identifier (`Qm...`).
///
/// Empty bytes (an unset cid) render as the empty string.
pub fn cidify(cid: &[u8]) -> String {
    if cid.is_empty() {
        return String::new();
    }
    bs58::encode(cid).into_string()
}

/// Substitute a formatted cid into a gateway URL template
pub fn gateway_url(template: &str, cid: &str) -> String {
    template.replace(CID_PLACEHOLDER, cid)
}
