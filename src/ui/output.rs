use crate::model::EntityKind;
use crate::reference::RefStatus;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;

/// A finished write or import
pub fn done(message: &str) {
    println!("{} {}", Icons::CHECK, message.style(theme().done.clone()));
}

/// A command that failed, on stderr
pub fn failure(message: &str) {
    eprintln!("{} {}", Icons::CROSS, message.style(theme().failure.clone()));
}

/// Data problems that did not stop the command, on stderr
pub fn caution(message: &str) {
    eprintln!("{} {}", Icons::WARN, message.style(theme().caution.clone()));
}

pub fn section(icon: &str, title: &str) {
    println!();
    println!("{} {}", icon, title.style(theme().title.clone()));
}

pub fn snapshot_written(path: &Path) {
    println!("{} {}", Icons::SAVE, path.display().style(theme().path.clone()));
}

/// Printed instead of a table when a collection is empty
pub fn empty_listing(kind: EntityKind) {
    println!("  {}", format!("no {}s loaded", kind).style(theme().label.clone()));
}

/// Entity kind and key, e.g. `order 100`
pub fn entity_ref(kind: EntityKind, key: &str) -> String {
    format!("{} {}", kind, key.style(theme().key.clone()))
}

/// Entity reference with its resolution state, e.g. `order 100 (invalid)`
pub fn status_ref(kind: EntityKind, key: &str, status: RefStatus) -> String {
    format!(
        "{} ({})",
        entity_ref(kind, key),
        status.to_string().style(theme().status(status))
    )
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label.clone()), value);
}

pub fn timing(elapsed: Duration) {
    println!(
        "{} {}",
        Icons::CLOCK.style(theme().label.clone()),
        format_duration(elapsed)
    );
}

pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}
