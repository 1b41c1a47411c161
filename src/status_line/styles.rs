use std::path::Path;

use crossterm::style::{StyledContent, Stylize};

use super::Telemetry;
use super::format::{
    BAR_WIDTH, format_clock, format_cost, format_short_duration, format_tokens, progress_bar,
};
use crate::cli::StatusStyle;

pub fn render(style: StatusStyle, telemetry: &Telemetry, branch: Option<&str>) -> String {
    match style {
        StatusStyle::Pulse => pulse(telemetry),
        StatusStyle::Cost => cost(telemetry),
        StatusStyle::Tokens => tokens(telemetry),
        StatusStyle::ApiTime => api_time(telemetry),
        StatusStyle::Changes => changes(telemetry),
        StatusStyle::Segments => segments(telemetry, branch),
    }
}

fn model_tag(telemetry: &Telemetry) -> StyledContent<String> {
    format!("[{}]", telemetry.model_name()).cyan().bold()
}

/// Green below half, then yellow, magenta, red as the window fills.
fn usage_color(percentage: f64, text: String) -> StyledContent<String> {
    if percentage < 50.0 {
        text.green()
    } else if percentage < 75.0 {
        text.yellow()
    } else if percentage < 90.0 {
        text.magenta()
    } else {
        text.red()
    }
}

/// `[Opus] ● Active | 42% ███░░░░░ | $0.12 | 0m 45s`
fn pulse(t: &Telemetry) -> String {
    let pct = t.used_percentage();
    format!(
        "{} {} {} | {} | {} | {}",
        model_tag(t),
        "\u{25cf}".green(),
        "Active".white(),
        usage_color(pct, format!("{pct:.0}% {}", progress_bar(pct, BAR_WIDTH))),
        format_cost(t.total_cost()).magenta(),
        format_clock(t.duration_ms()).dim(),
    )
}

/// `[Opus] $ $0.0123 | +156/-23 lines | @ 2m 5s`
fn cost(t: &Telemetry) -> String {
    format!(
        "{} | {} {} | {}/{} lines | {} {}",
        format!("[{}]", t.model_name()).cyan(),
        "$".yellow(),
        format_cost(t.total_cost()).white(),
        format!("+{}", t.lines_added()).green(),
        format!("-{}", t.lines_removed()).red(),
        "@".dark_grey(),
        format_clock(t.duration_ms()).white(),
    )
}

/// `[Opus] | # | In: 15k | Out: 4.5k | Cache: ^5.0k v2.0k`
fn tokens(t: &Telemetry) -> String {
    format!(
        "{} | {} | In: {} | Out: {} | Cache: {} {}",
        format!("[{}]", t.model_name()).cyan(),
        "#".magenta(),
        format_tokens(t.input_tokens()).green(),
        format_tokens(t.output_tokens()).yellow(),
        format!("^{}", format_tokens(t.cache_creation_tokens())).blue(),
        format!("v{}", format_tokens(t.cache_read_tokens())).dark_grey(),
    )
}

/// `[Opus] ⚡ 1.5s API | 45.0s total | $0.12`, API time colored by latency.
fn api_time(t: &Telemetry) -> String {
    let api_ms = t.api_duration_ms();
    let api = format!("\u{26a1} {} API", format_short_duration(api_ms));
    let api = if api_ms < 1_000.0 {
        api.green()
    } else if api_ms < 3_000.0 {
        api.yellow()
    } else {
        api.red()
    };
    format!(
        "{} {} | {} | {}",
        model_tag(t),
        api,
        format!("{} total", format_short_duration(t.duration_ms())).white(),
        format_cost(t.total_cost()).magenta(),
    )
}

/// `[Opus] +156/-23 lines (+133 net) | $0.12 | Style: default`
fn changes(t: &Telemetry) -> String {
    let (added, removed) = (t.lines_added(), t.lines_removed());
    let net = added - removed;
    let net_text = if net > 0 {
        format!("+{net}").green()
    } else if net < 0 {
        net.to_string().red()
    } else {
        "0".to_string().white()
    };
    format!(
        "{} {}/{} lines {}{}{} | {} | {}",
        model_tag(t),
        format!("+{added}").green(),
        format!("-{removed}").red(),
        "(".dim(),
        net_text,
        " net)".dim(),
        format_cost(t.total_cost()).magenta(),
        format!("Style: {}", t.output_style_name()).yellow(),
    )
}

/// `🤖 Opus | 📁 project | 🌿 main | 💰 $0.12 | 📊 42%`
fn segments(t: &Telemetry, branch: Option<&str>) -> String {
    let pct = t.used_percentage();
    let mut parts = vec![
        format!("\u{1F916} {}", t.model_name().to_string().cyan().bold()),
        format!("\u{1F4C1} {}", project_name(t.project_dir()).blue()),
    ];
    if let Some(branch) = branch.filter(|b| !b.is_empty()) {
        parts.push(format!("\u{1F33F} {}", branch.to_string().green()));
    }
    parts.push(format!("\u{1F4B0} {}", format_cost(t.total_cost()).magenta()));
    parts.push(format!("\u{1F4CA} {}", usage_color(pct, format!("{pct:.0}%"))));

    let separator = format!(" {} ", "|".dim());
    parts.join(separator.as_str())
}

/// Last path component, or `~` when there is none.
fn project_name(project_dir: Option<&str>) -> String {
    let dir = match project_dir {
        Some(dir) => dir.to_string(),
        None => std::env::current_dir()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Path::new(&dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "~".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn plain(text: &str) -> String {
        Regex::new(r"\x1b\[[0-9;]*m")
            .unwrap()
            .replace_all(text, "")
            .into_owned()
    }

    fn telemetry(json: &str) -> Telemetry {
        serde_json::from_str(json).unwrap()
    }

    const SAMPLE: &str = r#"{
        "model": {"display_name": "Opus"},
        "cost": {
            "total_cost_usd": 0.0123,
            "total_duration_ms": 45000,
            "total_api_duration_ms": 1500,
            "total_lines_added": 156,
            "total_lines_removed": 23
        },
        "context_window": {
            "used_percentage": 42,
            "total_input_tokens": 15200,
            "total_output_tokens": 4500,
            "current_usage": {
                "cache_creation_input_tokens": 5000,
                "cache_read_input_tokens": 2000
            }
        },
        "workspace": {"project_dir": "/home/dev/widgets"},
        "output_style": {"name": "concise"}
    }"#;

    #[test]
    fn pulse_layout() {
        let line = plain(&render(StatusStyle::Pulse, &telemetry(SAMPLE), None));
        assert_eq!(line, "[Opus] \u{25cf} Active | 42% ███░░░░░ | $0.0123 | 0m 45s");
    }

    #[test]
    fn cost_layout() {
        let line = plain(&render(StatusStyle::Cost, &telemetry(SAMPLE), None));
        assert_eq!(line, "[Opus] | $ $0.0123 | +156/-23 lines | @ 0m 45s");
    }

    #[test]
    fn tokens_layout() {
        let line = plain(&render(StatusStyle::Tokens, &telemetry(SAMPLE), None));
        assert_eq!(line, "[Opus] | # | In: 15k | Out: 4.5k | Cache: ^5.0k v2.0k");
    }

    #[test]
    fn api_time_layout() {
        let line = plain(&render(StatusStyle::ApiTime, &telemetry(SAMPLE), None));
        assert_eq!(line, "[Opus] \u{26a1} 1.5s API | 45.0s total | $0.0123");
    }

    #[test]
    fn changes_layout() {
        let line = plain(&render(StatusStyle::Changes, &telemetry(SAMPLE), None));
        assert_eq!(
            line,
            "[Opus] +156/-23 lines (+133 net) | $0.0123 | Style: concise"
        );

        let shrinking = telemetry(r#"{"cost": {"total_lines_added": 1, "total_lines_removed": 4}}"#);
        let line = plain(&render(StatusStyle::Changes, &shrinking, None));
        assert!(line.contains("(-3 net)"));
    }

    #[test]
    fn segments_layout() {
        let line = plain(&render(StatusStyle::Segments, &telemetry(SAMPLE), Some("main")));
        assert_eq!(
            line,
            "\u{1F916} Opus | \u{1F4C1} widgets | \u{1F33F} main | \u{1F4B0} $0.0123 | \u{1F4CA} 42%"
        );

        let line = plain(&render(StatusStyle::Segments, &telemetry(SAMPLE), None));
        assert!(!line.contains('\u{1F33F}'));
    }

    #[test]
    fn empty_input_uses_defaults() {
        let line = plain(&render(StatusStyle::Pulse, &telemetry("{}"), None));
        assert_eq!(line, "[Claude] \u{25cf} Active | 0% ░░░░░░░░ | $0.00 | 0m 0s");
    }

    #[test]
    fn project_name_falls_back_to_tilde() {
        assert_eq!(project_name(Some("/")), "~");
        assert_eq!(project_name(Some("/srv/app")), "app");
    }
}
