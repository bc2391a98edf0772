use crate::chatbot::completion::{ChatTurn, CompletionClient};
use crate::chatbot::context::ContextBuilder;
use crate::chatbot::topics::{match_topics, Topic};

/// Static answer for the about-centre topic
const ABOUT_TEXT: &str = "The Jaffna Thiruvalluvar Cultural Centre hosts cultural programs, \
concerts, exhibitions, workshops and community events across its venues.";

/// Static answer for the contact topic
const CONTACT_TEXT: &str = "You can reach the centre by phone at +94 21 222 5555 or by email \
at info@eventaura.lk. The front office is open daily from 9:00 to 17:00.";

/// Stateless chatbot responder
///
/// Each message is keyword-matched against the topic set, matching rows
/// are pulled through read-only queries, and a templated reply is
/// rendered. When a completion client is configured the same context is
/// handed to it as a system prompt instead; any failure there falls back
/// to the template and never surfaces to the caller.
#[derive(Clone)]
pub struct Responder {
    context: ContextBuilder,
    completion: Option<CompletionClient>,
}

impl Responder {
    /// Create a new Responder; `completion` is None when no API key is
    /// configured
    pub fn new(context: ContextBuilder, completion: Option<CompletionClient>) -> Self {
        Self {
            context,
            completion,
        }
    }

    /// Produce a reply for one inbound message
    ///
    /// This is infallible by design: database context failures degrade to
    /// a placeholder line, completion failures degrade to the template.
    pub async fn respond(&self, message: &str, history: &[ChatTurn]) -> String {
        let topics = match_topics(message);

        let db_context = match self.context.build(&topics).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("Failed to build chatbot context: {}", e);
                "Database information temporarily unavailable.".to_string()
            }
        };

        if let Some(ref client) = self.completion {
            let system_prompt = Self::system_prompt(&db_context);
            match client.chat(&system_prompt, history, message).await {
                Ok(reply) => return reply,
                Err(e) => {
                    tracing::warn!("Completion API failed, using templated reply: {}", e);
                }
            }
        }

        Self::fallback_response(&topics, &db_context)
    }

    /// System prompt carrying the database context
    fn system_prompt(db_context: &str) -> String {
        format!(
            "You are the EventAura assistant for the Jaffna Thiruvalluvar Cultural Centre. \
             Help users with venue bookings, pricing, and event information. \
             Be helpful, friendly, and professional.\n\n\
             Current database information:\n{}\n\n\
             Use this information to provide accurate, specific answers about venues, \
             bookings, and availability.",
            db_context
        )
    }

    /// Templated reply for the highest-priority matched topic
    pub fn fallback_response(topics: &[Topic], db_context: &str) -> String {
        match topics.first() {
            Some(Topic::Venues) => {
                if db_context.contains("Available Venues:") {
                    format!(
                        "I can help you with venue bookings! Here's what we have available:\n\n{}\n\nWhat type of venue are you looking for?",
                        db_context
                    )
                } else {
                    "I can help you with venue bookings! We have various spaces available. \
                     What type of venue are you looking for?"
                        .to_string()
                }
            }
            Some(Topic::Pricing) => {
                if db_context.contains("Venue Pricing:") {
                    format!(
                        "Here are our current venue rates:\n\n{}\n\nWould you like more specific pricing for a particular venue?",
                        db_context
                    )
                } else {
                    "Our venue pricing varies by space and duration. Would you like \
                     pricing for a particular venue?"
                        .to_string()
                }
            }
            Some(Topic::Booking) => "Great! To book a venue, I'll need the date, time, \
                expected number of people, and the type of event. You can also check \
                availability for specific dates. When would you like to book?"
                .to_string(),
            Some(Topic::Availability) => {
                if db_context.contains("Available Venues:") {
                    format!(
                        "Here's our current venue list:\n\n{}\n\nTell me the date and time you're interested in and I can check specific availability.",
                        db_context
                    )
                } else {
                    "I can check venue availability for you. Please tell me the date \
                     and time you're interested in."
                        .to_string()
                }
            }
            Some(Topic::Capacity) => {
                if db_context.contains("Venue Capacities:") {
                    format!(
                        "Here are our venue capacities:\n\n{}\n\nWhat size event are you planning?",
                        db_context
                    )
                } else {
                    "Our venues have different capacities. What size event are you planning?"
                        .to_string()
                }
            }
            Some(Topic::Services) => {
                if db_context.contains("Additional Services:") {
                    format!(
                        "These services can be added to a booking:\n\n{}\n\nWould you like any of these included?",
                        db_context
                    )
                } else {
                    "We offer additional services such as sound, cleaning and security \
                     with every booking. Would you like details?"
                        .to_string()
                }
            }
            Some(Topic::AboutCentre) => ABOUT_TEXT.to_string(),
            Some(Topic::Contact) => CONTACT_TEXT.to_string(),
            Some(Topic::Greeting) => "Hello! Welcome to EventAura. I'm here to help you \
                with venue bookings, pricing information, and event planning. How can I \
                assist you today?"
                .to_string(),
            Some(Topic::Help) | None => "Thank you for your message! I'm here to help \
                with venue bookings and event planning. You can ask me about available \
                spaces, pricing, capacities, or how to make a reservation. What would \
                you like to know?"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_fallback_interpolates_context() {
        let context = "Venue Pricing:\n- Hall A:\n    2h = 5000\n    4h = 9000\n- Hall B:\n    2h = 3000";
        let reply = Responder::fallback_response(&[Topic::Pricing], context);

        assert!(reply.contains("Hall A"));
        assert!(reply.contains("Hall B"));
        assert!(reply.contains("5000"));
        assert!(reply.contains("9000"));
    }

    #[test]
    fn test_pricing_fallback_without_context() {
        let reply = Responder::fallback_response(&[Topic::Pricing], "");
        assert!(reply.contains("pricing"));
    }

    #[test]
    fn test_greeting_fallback() {
        let reply = Responder::fallback_response(&[Topic::Greeting], "");
        assert!(reply.contains("Welcome to EventAura"));
    }

    #[test]
    fn test_unmatched_message_gets_default_reply() {
        let reply = Responder::fallback_response(&[], "");
        assert!(reply.contains("venue bookings"));
    }

    #[test]
    fn test_contact_fallback_is_static() {
        let reply = Responder::fallback_response(&[Topic::Contact], "ignored");
        assert_eq!(reply, CONTACT_TEXT);
    }

    #[test]
    fn test_first_topic_wins() {
        let context = "Available Venues:\n- Hall A: capacity 500.";
        let reply = Responder::fallback_response(&[Topic::Venues, Topic::Pricing], context);
        assert!(reply.contains("venue bookings"));
        assert!(reply.contains("Hall A"));
    }
}
