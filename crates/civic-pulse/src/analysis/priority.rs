//! Priority scoring from sentiment and urgency.

use super::sentiment::Sentiment;
use super::urgency::Urgency;

/// Lowest possible score (positive, not urgent).
pub const MIN_PRIORITY: u8 = 10;

/// Highest possible score (negative, urgent).
pub const MAX_PRIORITY: u8 = 100;

/// Sentiment contribution.
#[must_use]
pub const fn sentiment_weight(sentiment: Sentiment) -> u8 {
    match sentiment {
        Sentiment::Negative => 50,
        Sentiment::Neutral => 30,
        Sentiment::Positive => 10,
    }
}

/// Urgency contribution.
#[must_use]
pub const fn urgency_weight(urgency: Urgency) -> u8 {
    match urgency {
        Urgency::Urgent => 50,
        Urgency::NotUrgent => 0,
    }
}

/// Combined priority, 10 to 100.
#[must_use]
pub const fn priority_score(sentiment: Sentiment, urgency: Urgency) -> u8 {
    sentiment_weight(sentiment) + urgency_weight(urgency)
}

/// Priority for a loosely-typed sentiment label from an upstream source.
///
/// A label that does not parse is weighted as Neutral (30) and logged.
pub fn priority_score_for_label(label: &str, urgency: Urgency) -> u8 {
    let sentiment = Sentiment::parse(label).unwrap_or_else(|| {
        tracing::warn!(label, "Unknown sentiment label, using neutral weight");
        Sentiment::Neutral
    });
    priority_score(sentiment, urgency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_table() {
        let cases = [
            (Sentiment::Negative, Urgency::Urgent, 100),
            (Sentiment::Negative, Urgency::NotUrgent, 50),
            (Sentiment::Neutral, Urgency::Urgent, 80),
            (Sentiment::Neutral, Urgency::NotUrgent, 30),
            (Sentiment::Positive, Urgency::Urgent, 60),
            (Sentiment::Positive, Urgency::NotUrgent, 10),
        ];
        for (sentiment, urgency, expected) in cases {
            assert_eq!(priority_score(sentiment, urgency), expected);
            assert_eq!(
                priority_score(sentiment, urgency),
                sentiment_weight(sentiment) + urgency_weight(urgency)
            );
        }
    }

    #[test]
    fn test_range() {
        assert_eq!(priority_score(Sentiment::Positive, Urgency::NotUrgent), MIN_PRIORITY);
        assert_eq!(priority_score(Sentiment::Negative, Urgency::Urgent), MAX_PRIORITY);
    }

    #[test]
    fn test_unknown_label_uses_neutral_weight() {
        assert_eq!(priority_score_for_label("Mixed", Urgency::NotUrgent), 30);
        assert_eq!(priority_score_for_label("", Urgency::Urgent), 80);
        assert_eq!(priority_score_for_label("LABEL_1", Urgency::Urgent), 30 + 50);
    }

    #[test]
    fn test_known_labels_parse_loosely() {
        assert_eq!(priority_score_for_label("negative", Urgency::Urgent), 100);
        assert_eq!(priority_score_for_label("POSITIVE", Urgency::NotUrgent), 10);
    }
}
