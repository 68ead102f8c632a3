//! System prompt construction.

use crate::catalog::{ApartmentLocation, Catalog};
use crate::conversation::{AgentMessage, MessageRole};
use crate::facade::FacadeId;
use crate::state::ShowroomState;
use std::fmt::Write as _;

/// Project details the prompt needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectContext {
    /// Project name, used in the prompt and the welcome message
    pub project_name: String,
    /// Language the classifier should answer in
    pub response_language: String,
}

impl ProjectContext {
    /// Context for `project_name`, answering in Serbian
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            response_language: "Serbian".to_string(),
        }
    }

    /// Builder: set the reply language
    #[must_use]
    pub fn with_response_language(mut self, language: impl Into<String>) -> Self {
        self.response_language = language.into();
        self
    }
}

/// Format a euro amount with German digit grouping (`185000` → `185.000`)
#[must_use]
#[allow(clippy::cast_possible_truncation)] // prices are far below i64::MAX
pub fn format_eur(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

/// Build the classifier's system prompt
///
/// Describes the current view, the apartments on the market, the facade
/// legend, the recent conversation and the exact JSON reply contract.
#[must_use]
pub fn build_system_prompt(
    state: &ShowroomState,
    project: &ProjectContext,
    catalog: &Catalog,
    recent: &[AgentMessage],
) -> String {
    let selected_apartment = state
        .selected_apartment_id
        .as_deref()
        .map_or("none", |id| {
            catalog
                .apartments()
                .into_iter()
                .find(|apartment| apartment.id == id)
                .map_or(id, |apartment| apartment.code.as_str())
        });
    let selected_room = state.selected_room.map_or("none", |room| room.as_str());

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are the showroom guide for \"{}\", a residential development.",
        project.project_name
    );
    prompt.push_str(
        "You help visitors explore the building and its apartments through an interactive showroom.\n\n",
    );

    prompt.push_str("CURRENT STATE:\n");
    let _ = writeln!(prompt, "- View: {}", state.current_view);
    let _ = writeln!(prompt, "- Facade: {}", state.current_facade);
    let _ = writeln!(prompt, "- Selected apartment: {selected_apartment}");
    let _ = writeln!(prompt, "- Selected room: {selected_room}");

    prompt.push_str("\nAVAILABLE APARTMENTS:\n");
    let available = catalog.available();
    if available.is_empty() {
        prompt.push_str("(none)\n");
    }
    for location in &available {
        let _ = writeln!(prompt, "{}", inventory_line(location));
    }

    prompt.push_str("\nFACADES:\n");
    for facade in FacadeId::ALL {
        let _ = writeln!(prompt, "- {facade}: {}", facade.compass_label());
    }

    if !recent.is_empty() {
        prompt.push_str("\nRECENT CONVERSATION:\n");
        for message in recent {
            let speaker = match message.role {
                MessageRole::User => "visitor",
                MessageRole::Assistant => "guide",
                MessageRole::System => "system",
            };
            let _ = writeln!(prompt, "{speaker}: {}", message.content);
        }
    }

    let _ = write!(
        prompt,
        r#"
YOUR REPLY must be exactly one JSON object in this format (NEVER add text before or after the JSON):
{{
  "intent": {{
    "type": "<intent type>",
    "params": {{ ... }},
    "responseText": "<short answer for the visitor in {language}, at most 2 sentences>",
    "confidence": <0.0-1.0>
  }}
}}

ALLOWED INTENT TYPES:
- "rotate_building": params: {{ "direction": "next" | "prev" | "A" | "B" | "C" | "D" }}
  Use when the visitor says: rotate, turn, show the other side, show facade B
- "show_apartment": params: {{ "apartmentCode": "<apartment code>" }}
  Use when the visitor says: show apartment A2, which one is 14, I have a question about PH1
- "enter_apartment": params: {{}}
  Use when the visitor says: go in, enter the apartment, show the floor plan
- "show_room": params: {{ "room": "living" | "bedroom" | "kitchen" | "bathroom" }}
  Use when the visitor says: show the kitchen, go to the living room, show the bathroom
- "go_back": params: {{}}
  Use when the visitor says: back, return, leave
- "list_available": params: {{ "filter": {{ "type": "...", "minArea": N, "maxPrice": N }} }}
  Use when the visitor says: which apartments are free, what is there under 100k, two-bedroom
- "describe_element": params: {{ "element": "<description>" }}
  Use when the visitor asks: what is this, describe, details
- "general_info": params: {{ "topic": "<topic>" }}
  Use for general questions: location, parking, move-in date, prices

Be brief and concrete. Speak like a professional showroom guide."#,
        language = project.response_language
    );

    prompt
}

fn inventory_line(location: &ApartmentLocation<'_>) -> String {
    let apartment = location.apartment;
    format!(
        "{}: {}, {}m², €{}, floor {}",
        apartment.code,
        apartment.type_label,
        apartment.area_m2,
        format_eur(apartment.price_eur),
        location.floor.floor_number
    )
}
