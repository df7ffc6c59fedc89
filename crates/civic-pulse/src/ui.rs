//! Console formatting for the civic-pulse CLI.

use colored::{ColoredString, Colorize};

use civic_pulse::analysis::{Sentiment, Urgency};
use civic_pulse::storage::StoredFeedback;
use civic_pulse::FeedbackSummary;

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(70).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(70).bright_black());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

fn priority_badge(priority: u8) -> ColoredString {
    let text = format!("{priority:>3}");
    match priority {
        80.. => text.red().bold(),
        50..=79 => text.yellow(),
        _ => text.green(),
    }
}

fn sentiment_label(sentiment: Sentiment) -> ColoredString {
    let text = format!("{sentiment:<8}");
    match sentiment {
        Sentiment::Negative => text.red(),
        Sentiment::Neutral => text.normal(),
        Sentiment::Positive => text.green(),
    }
}

fn urgency_label(urgency: Urgency) -> ColoredString {
    let text = format!("{urgency:<10}");
    match urgency {
        Urgency::Urgent => text.red().bold(),
        Urgency::NotUrgent => text.bright_black(),
    }
}

/// Print one stored entry as a table row.
pub fn print_entry(entry: &StoredFeedback) {
    let record = &entry.record;
    println!(
        "{} {} {} {:<20} {}",
        priority_badge(record.priority_score),
        sentiment_label(record.sentiment),
        urgency_label(record.urgency),
        record.topic,
        entry.posted_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    let author = entry
        .author
        .as_deref()
        .map(|a| format!("@{a}: "))
        .unwrap_or_default();
    println!("    {author}{}", truncate_preview(&record.original_text));
}

/// Print summary counts.
pub fn print_summary(summary: &FeedbackSummary) {
    print_section("Summary");
    println!("   Records: {}", summary.total);
    if summary.failed > 0 {
        println!("   Failed: {}", summary.failed);
    }
    println!("   Mean priority: {:.1}", summary.mean_priority);
    println!("   Urgent: {:.0}%", summary.urgent_share() * 100.0);
    for (label, counts) in [
        ("Sentiment", &summary.by_sentiment),
        ("Urgency", &summary.by_urgency),
        ("Topic", &summary.by_topic),
    ] {
        let parts: Vec<String> = counts.iter().map(|(k, n)| format!("{k}: {n}")).collect();
        println!("   {label}: {}", parts.join(", "));
    }
}

/// Truncate text for preview, respecting UTF-8 character boundaries.
fn truncate_preview(text: &str) -> String {
    const MAX_CHARS: usize = 100;

    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    }
}
