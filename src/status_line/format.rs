//! Number and duration formatting shared by the status line styles.

pub const BAR_WIDTH: usize = 8;
const BAR_FILLED: char = '\u{2588}';
const BAR_EMPTY: char = '\u{2591}';

/// Dollar amount: `$0.00` for zero, four decimals below a cent, else two.
pub fn format_cost(cost: f64) -> String {
    if cost == 0.0 {
        "$0.00".to_string()
    } else if cost < 0.01 {
        format!("${cost:.4}")
    } else {
        format!("${cost:.2}")
    }
}

/// Compact token count: `950`, `15.2k` style below 10k, `152k`, `1.5M`.
pub fn format_tokens(tokens: u64) -> String {
    let n = tokens as f64;
    if tokens < 1_000 {
        tokens.to_string()
    } else if tokens < 10_000 {
        format!("{:.1}k", n / 1_000.0)
    } else if tokens < 1_000_000 {
        format!("{:.0}k", n / 1_000.0)
    } else {
        format!("{:.1}M", n / 1_000_000.0)
    }
}

/// Wall-clock style `Xm Ys`.
pub fn format_clock(ms: f64) -> String {
    let total = (ms / 1000.0).max(0.0) as u64;
    format!("{}m {}s", total / 60, total % 60)
}

/// `1.5s` under a minute, `Xm Ys` above.
pub fn format_short_duration(ms: f64) -> String {
    if ms <= 0.0 {
        return "0s".to_string();
    }
    let seconds = ms / 1000.0;
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.0}s", minutes as u64, seconds - minutes * 60.0)
    }
}

/// Fixed-width bar with `floor(pct / 100 * width)` filled cells.
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = if percentage <= 0.0 {
        0
    } else {
        ((percentage / 100.0 * width as f64) as usize).min(width)
    };
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n(BAR_FILLED, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, width - filled));
    bar
}
