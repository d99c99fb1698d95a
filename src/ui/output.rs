//! Styled status lines
//!
//! Terminals get cliclack's log lines. Pipes and CI get a tagged plain line
//! built by [`plain_line`], so scripts can grep for `[OK]` or `[WARN]`.

use super::context::UiContext;
use console::{style, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Warn,
    Info,
}

impl Level {
    fn tag(self) -> String {
        match self {
            Self::Ok => style("[OK]").green().to_string(),
            Self::Warn => style("[WARN]").yellow().to_string(),
            Self::Info => style("[INFO]").cyan().to_string(),
        }
    }

    fn log(self, text: String) {
        let written = match self {
            Self::Ok => cliclack::log::success(text),
            Self::Warn => cliclack::log::warning(text),
            Self::Info => cliclack::log::info(text),
        };
        // Nothing useful to do if the terminal is gone
        written.ok();
    }
}

/// Plain form of a step: indented tag, message, then an optional note
fn plain_line(level: Level, message: &str, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("  {} {} ({})", level.tag(), message, note),
        None => format!("  {} {}", level.tag(), message),
    }
}

fn step(ctx: &UiContext, level: Level, message: &str, note: Option<&str>) {
    if !ctx.use_fancy_output() {
        println!("{}", plain_line(level, message, note));
        return;
    }

    match note {
        Some(note) => level.log(format!("{} ({})", message, style(note).dim())),
        None => level.log(message.to_string()),
    }
}

/// Closing line of a command that changed something
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", Level::Ok.tag(), message);
    }
}

/// Bold header before a group of key-value lines
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        Level::Info.log(style(title).bold().to_string());
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    step(ctx, Level::Ok, message, None);
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Level::Ok, message, Some(detail));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    step(ctx, Level::Warn, message, Some(hint));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Level::Info, message, None);
}

/// Dimmed follow-up, usually the next command to run
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = if ctx.use_fancy_output() {
        style(key).dim().to_string()
    } else {
        key.to_string()
    };
    println!("  {}: {}", key, value);
}

/// Key-value line for something that is either live (`ok`) or stale
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    if !ctx.use_fancy_output() {
        let level = if ok { Level::Ok } else { Level::Warn };
        println!("  {} {}: {}", level.tag(), key, value);
        return;
    }

    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
}
