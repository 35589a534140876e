// Chatdeck Core — Saved template catalog
// Static in-memory data backing the dashboard's template browser. Entries
// are read-only; search and category listing are the only operations.

use serde::{Deserialize, Serialize};

/// One saved template as shown in the library view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Creation date, display-only ("YYYY-MM-DD").
    pub created_at: String,
    /// Full template body for the preview pane.
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<SavedTemplate>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<SavedTemplate>) -> Self {
        TemplateCatalog { templates }
    }

    /// The stock catalog shipped with the dashboard.
    pub fn builtin() -> Self {
        let t = |id: &str, name: &str, description: &str, category: &str, created_at: &str, content: &str| {
            SavedTemplate {
                id: id.into(),
                name: name.into(),
                description: description.into(),
                category: category.into(),
                created_at: created_at.into(),
                content: content.into(),
            }
        };

        TemplateCatalog::new(vec![
            t(
                "1",
                "Welcome Email",
                "A warm welcome email template for new users",
                "Email",
                "2024-01-15",
                "Welcome to our platform! We're excited to have you on board...",
            ),
            t(
                "2",
                "Product Launch",
                "Template for announcing new product launches",
                "Marketing",
                "2024-01-10",
                "Exciting news! We're thrilled to announce the launch of our latest product...",
            ),
            t(
                "3",
                "Meeting Notes",
                "Standard template for meeting documentation",
                "Business",
                "2024-01-08",
                "Meeting Date: [DATE]\nAttendees: [NAMES]\nAgenda Items:\n1. ...",
            ),
            t(
                "4",
                "Support Response",
                "Customer support response template",
                "Support",
                "2024-01-05",
                "Thank you for contacting our support team. We have received your inquiry...",
            ),
        ])
    }

    pub fn all(&self) -> &[SavedTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SavedTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Case-insensitive substring search over name, description, and
    /// category. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&SavedTemplate> {
        let needle = term.to_lowercase();
        self.templates
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
                    || t.category.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Distinct categories, in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for t in &self.templates {
            if !seen.contains(&t.category.as_str()) {
                seen.push(t.category.as_str());
            }
        }
        seen
    }
}
