//! Progress lines and per-mille rates from raw byte counts.

/// One rendered progress sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub text: String,
    /// Completion in thousandths; 1000 exactly when `done == total`.
    pub rate: u16,
}

const MB: u64 = 1_048_576;
const KB: u64 = 1024;
const FILLED: char = '█';
const EMPTY: char = '░';

/// Completion rate in thousandths, floored. `done` past `total` saturates
/// and an empty transfer counts as complete.
pub fn rate_per_mille(total: u64, done: u64) -> u16 {
    if total == 0 {
        return 1000;
    }
    let done = done.min(total);
    (u128::from(done) * 1000 / u128::from(total)) as u16
}

/// Longer names get a shorter bar so lines stay roughly the same width.
fn bar_len(name: &str) -> usize {
    match name.chars().count() {
        0..=20 => 40,
        21..=40 => 30,
        _ => 20,
    }
}

fn size_text(bytes: u64, total: u64) -> String {
    if total >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    }
}

/// Renders `name |████░░░░| 42.1% | 1.2/2.9MB` plus a done marker at 100%.
pub fn compute_progress(name: &str, total: u64, done: u64) -> ProgressLine {
    let rate = rate_per_mille(total, done);
    let done = done.min(total);
    let len = bar_len(name);
    let filled = len * usize::from(rate) / 1000;
    let bar: String = std::iter::repeat(FILLED)
        .take(filled)
        .chain(std::iter::repeat(EMPTY).take(len - filled))
        .collect();

    let mut text = format!(
        "{name} |{bar}| {:.1}% | {}/{}",
        f64::from(rate) / 10.0,
        size_text(done, total),
        size_text(total, total),
    );
    if rate == 1000 {
        text.push_str(" | Done!");
    }
    ProgressLine { text, rate }
}
