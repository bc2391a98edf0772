/// Topics the chatbot can answer about
///
/// Dispatch is an explicit enumerated tag: each inbound message is
/// keyword-matched against these topics, and each matched topic maps to a
/// database lookup plus a response template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Venues,
    Pricing,
    Booking,
    Availability,
    Capacity,
    Services,
    AboutCentre,
    Contact,
    Greeting,
    Help,
}

impl Topic {
    /// Every topic, in match-priority order
    pub const ALL: [Topic; 10] = [
        Topic::Venues,
        Topic::Pricing,
        Topic::Booking,
        Topic::Availability,
        Topic::Capacity,
        Topic::Services,
        Topic::AboutCentre,
        Topic::Contact,
        Topic::Greeting,
        Topic::Help,
    ];

    /// Keywords that select this topic
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Venues => &["venue", "space", "hall", "room", "auditorium"],
            Topic::Pricing => &["price", "cost", "rate", "fee", "charge"],
            Topic::Booking => &["book", "reserve", "reservation", "schedule"],
            Topic::Availability => &["availability", "available", "free", "vacant"],
            Topic::Capacity => &["capacity", "people", "seats", "size", "large", "small"],
            Topic::Services => &["service", "catering", "sound", "equipment", "facilities"],
            Topic::AboutCentre => &["about", "centre", "center", "cultural", "jtcc"],
            Topic::Contact => &["contact", "phone", "email", "address", "reach"],
            Topic::Greeting => &["hello", "hi", "hey", "vanakkam", "good morning"],
            Topic::Help => &["help", "how do i", "what can you"],
        }
    }

    /// Whether this topic pulls rows from the database
    pub fn needs_database(&self) -> bool {
        matches!(
            self,
            Topic::Venues
                | Topic::Pricing
                | Topic::Booking
                | Topic::Availability
                | Topic::Capacity
                | Topic::Services
        )
    }
}

/// Match an inbound message against the topic keyword sets
///
/// Matching is case-insensitive substring search; topics come back in
/// priority order with no duplicates. An empty result means the message
/// fits no known topic and gets the default reply.
pub fn match_topics(message: &str) -> Vec<Topic> {
    let lowered = message.to_lowercase();

    Topic::ALL
        .iter()
        .filter(|topic| {
            topic
                .keywords()
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_question_matches_pricing() {
        let topics = match_topics("What are your prices?");
        assert!(topics.contains(&Topic::Pricing));
    }

    #[test]
    fn test_venue_question_matches_venues() {
        let topics = match_topics("Which halls do you have?");
        assert!(topics.contains(&Topic::Venues));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let topics = match_topics("HELLO there");
        assert!(topics.contains(&Topic::Greeting));
    }

    #[test]
    fn test_multiple_topics_in_priority_order() {
        let topics = match_topics("How much does it cost to book the main hall?");
        assert_eq!(topics, vec![Topic::Venues, Topic::Pricing, Topic::Booking]);
    }

    #[test]
    fn test_unrelated_message_matches_nothing() {
        let topics = match_topics("The weather is nice today");
        assert!(topics.is_empty());
    }

    #[test]
    fn test_no_duplicate_topics() {
        let topics = match_topics("price prices pricing cost");
        assert_eq!(topics, vec![Topic::Pricing]);
    }

    #[test]
    fn test_database_topics() {
        assert!(Topic::Pricing.needs_database());
        assert!(Topic::Venues.needs_database());
        assert!(!Topic::Greeting.needs_database());
        assert!(!Topic::Contact.needs_database());
    }
}
