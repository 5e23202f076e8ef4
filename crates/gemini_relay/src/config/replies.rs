//! Canned replies returned to the chat page

use phf::phf_map;

/// Fixed reply texts, keyed by situation
static REPLIES: phf::Map<&'static str, &'static str> = phf_map! {
    "empty_input" => "Please type something!",
    "missing_api_key" => "❌ ERROR: Google API key not configured. Please check your .env file.",
    "no_models" => "❌ ERROR: No Gemini models available. Please check your Google API access and billing.",
    "empty_response" => "I couldn't generate a response. Please try again.",
    "invalid_api_key" => "❌ ERROR: Invalid Google API key. Please check your API key in the .env file.",
    "quota_exceeded" => "❌ ERROR: Google API quota exceeded. Please check your billing or usage limits.",
    "demo_echo" => "I'm currently using a demo mode since the Gemini API isn't available. Your message was: ",
    "demo_test" => "This is a test response. To get real AI responses, please get a proper Gemini API key from Google AI Studio.",
    "demo_active" => "Demo mode active. Please configure a valid Gemini API key to get intelligent responses.",
    "generic_error" => "❌ Sorry, I encountered an error: ",
};

/// Get a reply by key, falling back to the key itself
pub fn get_reply(key: &str) -> &str {
    REPLIES.get(key).copied().unwrap_or(key)
}

/// The three demo-mode replies, the first one echoing `message`
pub fn demo_replies(message: &str) -> [String; 3] {
    [
        format!("{}{}", get_reply("demo_echo"), message),
        get_reply("demo_test").to_string(),
        get_reply("demo_active").to_string(),
    ]
}

/// Generic failure reply carrying the provider's message
pub fn error_reply(detail: &str) -> String {
    format!("{}{}", get_reply("generic_error"), detail)
}
