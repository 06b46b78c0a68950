use serde::{Deserialize, Serialize};

use super::metadata::LegalCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// Attached to completed assistant responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub legal_sources: Vec<String>,
    pub elapsed_ms: u64,
    pub fragments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub author: Author,
    pub created_at_ms: u64,
    /// Only the in-flight assistant placeholder is `true`.
    pub streaming: bool,
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at_ms: u64,
    pub last_updated_ms: u64,
    /// Set with the first user message; title and preview never change after.
    pub title_fixed: bool,
    pub message_count: u32,
    pub legal_categories: Vec<LegalCategory>,
}

impl ChatSession {
    pub(super) fn add_categories(&mut self, categories: impl IntoIterator<Item = LegalCategory>) {
        for category in categories {
            if !self.legal_categories.contains(&category) {
                self.legal_categories.push(category);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: LegalCategory,
    pub count: usize,
}

/// Aggregate over the in-memory session list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnalytics {
    pub total_chats: usize,
    pub total_messages: u64,
    /// Rounded to two decimals; 0 with no sessions.
    pub avg_messages_per_chat: f64,
    /// At most five, most frequent first.
    pub top_legal_categories: Vec<CategoryCount>,
}

impl ChatAnalytics {
    pub fn from_sessions(sessions: &[ChatSession]) -> Self {
        let total_chats = sessions.len();
        let total_messages: u64 = sessions.iter().map(|s| u64::from(s.message_count)).sum();
        let avg_messages_per_chat = if total_chats == 0 {
            0.0
        } else {
            (total_messages as f64 / total_chats as f64 * 100.0).round() / 100.0
        };

        let mut counts: Vec<CategoryCount> = Vec::new();
        for category in sessions.iter().flat_map(|s| s.legal_categories.iter()) {
            match counts.iter_mut().find(|c| c.category == *category) {
                Some(entry) => entry.count += 1,
                None => counts.push(CategoryCount {
                    category: *category,
                    count: 1,
                }),
            }
        }
        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(5);

        Self {
            total_chats,
            total_messages,
            avg_messages_per_chat,
            top_legal_categories: counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(message_count: u32, categories: &[LegalCategory]) -> ChatSession {
        ChatSession {
            id: format!("chat_{message_count}"),
            title: String::new(),
            preview: String::new(),
            created_at_ms: 0,
            last_updated_ms: 0,
            title_fixed: true,
            message_count,
            legal_categories: categories.to_vec(),
        }
    }

    #[test]
    fn test_analytics_empty() {
        let analytics = ChatAnalytics::from_sessions(&[]);
        assert_eq!(analytics.total_chats, 0);
        assert_eq!(analytics.total_messages, 0);
        assert_eq!(analytics.avg_messages_per_chat, 0.0);
        assert!(analytics.top_legal_categories.is_empty());
    }

    #[test]
    fn test_analytics_counts_and_ranks() {
        use LegalCategory::*;
        let sessions = [
            session(4, &[Insurance, FinesPenalties]),
            session(2, &[FinesPenalties]),
            session(1, &[Accidents, Documents, PoliceProcedures, CourtLegal]),
        ];
        let analytics = ChatAnalytics::from_sessions(&sessions);
        assert_eq!(analytics.total_chats, 3);
        assert_eq!(analytics.total_messages, 7);
        assert_eq!(analytics.avg_messages_per_chat, 2.33);
        assert_eq!(analytics.top_legal_categories.len(), 5);
        assert_eq!(
            analytics.top_legal_categories[0],
            CategoryCount {
                category: FinesPenalties,
                count: 2
            }
        );
        assert_eq!(analytics.top_legal_categories[1].category, Insurance);
        assert_eq!(analytics.top_legal_categories[4].category, PoliceProcedures);
    }
}
