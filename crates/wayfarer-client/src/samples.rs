//! Hardcoded sample datasets for the mock data path.
//!
//! Screens constructed with the mock source render these instead of backend
//! data; the selection is explicit at construction time, never a silent
//! fallback.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use wayfarer_shared::{Chat, ChatId, ChatMessage, Destination, DestinationId, MessageId, UserId};

fn destination(
    id: &str,
    title: &str,
    country: &str,
    description: &str,
    rating: f32,
    review_count: u32,
    tags: &[&str],
) -> Destination {
    Destination {
        id: DestinationId(id.to_string()),
        title: title.to_string(),
        country: country.to_string(),
        image_url: format!("https://img.wayfarer.example/{id}.jpg"),
        description: description.to_string(),
        rating,
        review_count,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        is_favorite: false,
    }
}

/// The bundled destination catalogue.
pub fn destinations() -> Vec<Destination> {
    vec![
        destination(
            "maasai-mara",
            "Maasai Mara",
            "Kenya",
            "Vast savannah famous for the great wildebeest migration.",
            4.9,
            2841,
            &["Safari"],
        ),
        destination(
            "pyramids-giza",
            "Pyramids of Giza",
            "Egypt",
            "The last remaining wonder of the ancient world.",
            4.8,
            5312,
            &["Cultural"],
        ),
        destination(
            "zanzibar",
            "Zanzibar",
            "Tanzania",
            "Spice-island beaches and the alleys of Stone Town.",
            4.7,
            1954,
            &["Beach", "Cultural"],
        ),
        destination(
            "kilimanjaro",
            "Mount Kilimanjaro",
            "Tanzania",
            "Africa's highest peak, a trek through five climate zones.",
            4.8,
            1287,
            &["Mountain"],
        ),
        destination(
            "marrakech",
            "Marrakech Medina",
            "Morocco",
            "Souks, riads and the nightly spectacle of Jemaa el-Fnaa.",
            4.5,
            3108,
            &["City", "Cultural"],
        ),
        destination(
            "seychelles",
            "Anse Source d'Argent",
            "Seychelles",
            "Granite boulders over shallow turquoise water.",
            4.9,
            987,
            &["Beach"],
        ),
    ]
}

/// The bundled conversation list plus per-chat message history.
pub fn chats() -> (Vec<Chat>, HashMap<ChatId, Vec<ChatMessage>>) {
    let now = Utc::now();

    let amina = Chat {
        id: ChatId("chat-amina".to_string()),
        partner_id: UserId("user-amina".to_string()),
        partner_name: "Amina".to_string(),
        partner_photo_url: None,
        last_message: "See you at the airport!".to_string(),
        unread_count: 2,
    };
    let jonas = Chat {
        id: ChatId("chat-jonas".to_string()),
        partner_id: UserId("user-jonas".to_string()),
        partner_name: "Jonas".to_string(),
        partner_photo_url: None,
        last_message: "The riad is booked.".to_string(),
        unread_count: 0,
    };

    let mut messages = HashMap::new();
    messages.insert(
        amina.id.clone(),
        vec![
            ChatMessage {
                id: MessageId("m1".to_string()),
                text: "Flight lands at 14:20.".to_string(),
                sent_at: now - Duration::hours(3),
                is_mine: true,
            },
            ChatMessage {
                id: MessageId("m2".to_string()),
                text: "Perfect, I'll pick you up.".to_string(),
                sent_at: now - Duration::hours(2),
                is_mine: false,
            },
            ChatMessage {
                id: MessageId("m3".to_string()),
                text: "See you at the airport!".to_string(),
                sent_at: now - Duration::hours(1),
                is_mine: false,
            },
        ],
    );
    messages.insert(
        jonas.id.clone(),
        vec![ChatMessage {
            id: MessageId("m4".to_string()),
            text: "The riad is booked.".to_string(),
            sent_at: now - Duration::days(1),
            is_mine: false,
        }],
    );

    (vec![amina, jonas], messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_shared::Category;

    #[test]
    fn every_destination_is_categorized() {
        for dest in destinations() {
            assert!(!dest.tags.is_empty(), "{} has no tags", dest.title);
            assert!(dest.matches_category(Category::All));
        }
    }

    #[test]
    fn chat_histories_match_the_list() {
        let (chats, messages) = chats();
        for chat in &chats {
            assert!(messages.contains_key(&chat.id), "{} has no history", chat.partner_name);
        }
    }
}
