//! Prompt templates for the generation and engagement stages.

use postpilot_core::Tone;

/// System prompt for drafting a post in the requested voice.
#[must_use]
pub fn generation_system_prompt(tone: Tone) -> String {
    let tone_instructions = match tone {
        Tone::Professional => {
            "Write in a professional, authoritative tone suitable for business leaders and \
             industry experts. Focus on insights, best practices, and strategic implications."
        }
        Tone::Casual => {
            "Write in a conversational, approachable tone that's still professional but more \
             relatable. Use a friendly voice that encourages discussion."
        }
        Tone::Technical => {
            "Write in a technical tone with detailed explanations suitable for developers and \
             technical professionals. Include specific details and technical insights."
        }
    };

    format!(
        "You are an expert social-media content creator specializing in technology and \
         business topics.\n\n\
         Instructions:\n\
         - {tone_instructions}\n\
         - Target length: approximately 1500 characters\n\
         - Provide value to a professional audience: insights, actionable takeaways, or a \
           thought-provoking question\n\
         - Use line breaks for readability\n\
         - Do NOT include hashtags in the content (they are added separately)\n\
         - Make it likely to generate meaningful professional discussion"
    )
}

/// User prompt for drafting a post about one topic.
#[must_use]
pub fn generation_prompt(topic: &str, relevance: Option<f64>) -> String {
    let context = match relevance {
        Some(score) => format!("This is currently a trending topic with relevance score {score:.2}."),
        None => "This is a custom topic supplied by the author.".to_string(),
    };
    format!(
        "Create a social post about: {topic}\n\n\
         Context: {context}\n\n\
         Generate engaging content that will resonate with a professional tech audience."
    )
}

/// Prompt asking the model to rate one topic's relevance in `[0, 1]`.
#[must_use]
pub fn relevance_prompt(topic: &str) -> String {
    format!(
        "Rate the relevance of this topic for a professional tech audience on a scale of 0 to 1:\n\
         Topic: {topic}\n\n\
         Consider professional relevance, technology focus, business impact, and current \
         interest level. Respond with just a number between 0 and 1."
    )
}

/// System prompt for drafting a reply to an inbound comment.
pub const REPLY_SYSTEM_PROMPT: &str = "You are replying to a comment on a professional \
social-media post. Write a short, courteous, substantive reply that addresses the \
commenter's point. No hashtags, no signatures. Respond with the reply text only.";

/// User prompt for drafting a reply to one comment.
#[must_use]
pub fn reply_prompt(author_name: &str, comment: &str) -> String {
    format!("Write a reply to this comment from {author_name}: {comment}")
}
