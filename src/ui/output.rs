//! Human-readable status lines.
//!
//! Status goes to stderr so that stdout carries only program text
//! (synthesized source, captured output) and can be piped.

use crate::synth::Incomplete;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    eprintln!("{} {}", Icons::ROCKET, text.style(theme().header));
}

pub fn success(label: &str) {
    eprintln!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn info(label: &str, value: &str) {
    eprintln!(
        "{} {}: {}",
        Icons::INFO.style(theme().info),
        label.style(theme().dim),
        value
    );
}

pub fn summary_row(label: &str, value: &str) {
    eprintln!("  {} {}", label.style(theme().dim), value);
}

/// One line per node the synthesizer could not complete
pub fn incomplete(records: &[Incomplete]) {
    if records.is_empty() {
        return;
    }
    warn(&format!("{} incomplete node(s)", records.len()));
    for record in records {
        eprintln!(
            "  {} {} {}",
            record.node.as_str().style(theme().id),
            record.label,
            record.reason.style(theme().missing)
        );
    }
}
