pub const DEFAULT_TASK_EMOJI: &str = "📝";
pub const DEFAULT_EVENT_EMOJI: &str = "📌";

/// Keyword rules checked in order against a lowercased task title.
const TASK_EMOJI_RULES: &[(&[&str], &str)] = &[
    (&["gym", "sport", "fitness"], "🏋️"),
    (&["run", "jogging"], "🏃"),
    (&["study", "homework", "exam"], "📚"),
    (&["party", "celebration"], "🎉"),
    (&["work", "job"], "💼"),
    (&["dinner", "eat", "lunch", "meal"], "🍽️"),
    (&["friend", "girl", "boyfriend"], "👯‍♀️"),
    (&["sleep", "nap"], "🛌"),
    (&["rencard", "date", "love"], "💖"),
    (&["call", "phone", "parent"], "☎️"),
];

pub fn emoji_for_title(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    TASK_EMOJI_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_TASK_EMOJI)
}
