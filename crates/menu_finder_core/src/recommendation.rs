//! crates/menu_finder_core/src/recommendation.rs
//!
//! Prompt construction, reply parsing and the fallback policy for meal
//! recommendations. The network call itself lives behind `RecommendationProvider`.

use crate::domain::{MenuRecommendation, RecommendationResponse};
use crate::ports::{PortError, PortResult, RecommendationProvider};
use serde::Deserialize;
use tracing::{info, warn};

/// Upper bound on recommendations handed back to the caller.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Used in the prompt when the caller gives no location.
pub const DEFAULT_PROMPT_LOCATION: &str = "general preferences";

const PROMPT_TEMPLATE: &str = r#"Based on the user's request: "{query}", please provide exactly 5 meal recommendations suitable for lunch, dinner, or general meals.

Focus on recommending specific dishes/meals with cooking instructions. For each meal recommendation, provide the following information in JSON format:
{
  "name": "specific dish/meal name",
  "description": "detailed description of the dish, its flavors, and what makes it special",
  "menuLink": "link to online recipe or cooking instructions",
  "imageUrl": "link to appetizing food image of the dish",
  "cuisine": "type of cuisine or cooking style"
}

Please ensure:
1. Focus on actual meals/dishes that can be prepared or enjoyed
2. Provide diverse cuisine options and meal types (lunch, dinner, snacks)
3. Include detailed descriptions of flavors, ingredients, and appeal
4. Find real recipe links or cooking instruction websites when possible
5. Include appetizing food images that showcase the dish
6. Consider the user's location context: {location} for regional preferences
7. Return exactly 5 meal recommendations
8. Make recommendations suitable for home cooking or ordering

Format the response as a JSON array of 5 objects focusing on meals with cooking instructions.
"#;

//=========================================================================================
// Prompt Builder
//=========================================================================================

/// Renders the search prompt for a user query and optional location.
pub fn build_prompt(user_query: &str, location: Option<&str>) -> String {
    let location = location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_PROMPT_LOCATION);

    // Location first so a query containing "{location}" is left untouched.
    PROMPT_TEMPLATE
        .replace("{location}", location)
        .replacen("{query}", user_query, 1)
}

//=========================================================================================
// Reply Parser
//=========================================================================================

#[derive(Deserialize)]
struct ChatEnvelope {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Returns the slice from the first `[` to the last `]`, inclusive.
pub fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    (end > start).then(|| &content[start..=end])
}

/// Parses a chat-completion reply body into at most five recommendations.
///
/// Any malformed envelope, missing array or bad entry fails the whole parse.
pub fn parse_recommendations(raw_reply: &str) -> PortResult<Vec<MenuRecommendation>> {
    let envelope: ChatEnvelope = serde_json::from_str(raw_reply)
        .map_err(|e| PortError::Parse(format!("Malformed provider envelope: {}", e)))?;

    let content = envelope
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| PortError::Parse("Provider reply contained no choices".to_string()))?;

    let array = extract_json_array(&content)
        .ok_or_else(|| PortError::Parse("No JSON array found in provider reply".to_string()))?;

    let mut recommendations: Vec<MenuRecommendation> = serde_json::from_str(array)
        .map_err(|e| PortError::Parse(format!("Invalid recommendation array: {}", e)))?;

    recommendations.truncate(MAX_RECOMMENDATIONS);
    Ok(recommendations)
}

//=========================================================================================
// Fallback Set
//=========================================================================================

/// The fixed example set served in mock mode and whenever a real call fails.
pub fn fallback_recommendations() -> Vec<MenuRecommendation> {
    vec![
        MenuRecommendation::new(
            "Classic Margherita Pizza",
            "Homemade pizza with fresh mozzarella, San Marzano tomatoes, fresh basil, and olive oil. Perfect for lunch or dinner with authentic Italian flavors that are simple yet satisfying.",
            "https://www.allrecipes.com/recipe/83454/margherita-pizza/",
            "https://images.unsplash.com/photo-1574071318508-1cdbab80d002?w=500",
            "Italian",
        ),
        MenuRecommendation::new(
            "Creamy Butter Chicken",
            "Rich and aromatic Indian curry with tender chicken in a creamy tomato-based sauce, served with basmati rice. A comforting dinner option with warm spices and velvety texture.",
            "https://cafedelites.com/butter-chicken/",
            "https://images.unsplash.com/photo-1565557623262-b51c2513a641?w=500",
            "Indian",
        ),
        MenuRecommendation::new(
            "Homemade Chicken Ramen",
            "Comforting Japanese noodle soup with rich chicken broth, soft-boiled eggs, green onions, and tender noodles. Perfect for a warming dinner or satisfying lunch.",
            "https://www.justonecookbook.com/homemade-chashu-miso-ramen/",
            "https://images.unsplash.com/photo-1569718212165-3a8278d5f624?w=500",
            "Japanese",
        ),
        MenuRecommendation::new(
            "Fish Tacos with Avocado Crema",
            "Fresh and zesty tacos with seasoned white fish, cabbage slaw, avocado crema, and lime. A light yet satisfying meal perfect for lunch or casual dinner.",
            "https://www.foodnetwork.com/recipes/ellie-krieger/fish-tacos-with-avocado-crema-recipe-1946783",
            "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=500",
            "Mexican",
        ),
        MenuRecommendation::new(
            "Classic Beef Burger",
            "Juicy homemade beef patty with lettuce, tomato, onion, and special sauce on a toasted bun. A satisfying dinner option that's perfect for casual dining and comfort food cravings.",
            "https://www.foodnetwork.com/recipes/bobby-flay/perfect-burger-recipe-1947140",
            "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?w=500",
            "American",
        ),
    ]
}

//=========================================================================================
// Recommendation Pipeline
//=========================================================================================

/// Why the fallback set was served instead of provider data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No usable API key is configured, so the provider was never called.
    MockMode,
    ProviderFailed(String),
    ParseFailed(String),
}

/// The result of a recommendation lookup, keeping track of which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Fresh(Vec<MenuRecommendation>),
    Fallback {
        reason: FallbackReason,
        recommendations: Vec<MenuRecommendation>,
    },
}

impl RecommendationOutcome {
    fn fallback(reason: FallbackReason) -> Self {
        Self::Fallback {
            reason,
            recommendations: fallback_recommendations(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn recommendations(&self) -> &[MenuRecommendation] {
        match self {
            Self::Fresh(recommendations) => recommendations,
            Self::Fallback {
                recommendations, ..
            } => recommendations,
        }
    }

    /// Builds the caller-facing response. The fresh/fallback distinction is dropped here.
    pub fn into_response(self, query: &str, location: Option<&str>) -> RecommendationResponse {
        let recommendations = match self {
            Self::Fresh(recommendations) => recommendations,
            Self::Fallback {
                recommendations, ..
            } => recommendations,
        };
        RecommendationResponse::new(query, recommendations, location.map(str::to_string))
    }
}

/// Looks up recommendations for a query. Never fails: provider and parse
/// errors are absorbed into [`RecommendationOutcome::Fallback`].
///
/// `provider` is `None` in mock mode.
pub async fn recommend(
    provider: Option<&dyn RecommendationProvider>,
    user_query: &str,
    location: Option<&str>,
) -> RecommendationOutcome {
    info!(query = %user_query, location = ?location, "Searching for recommendations");

    let Some(provider) = provider else {
        warn!("Using mock data: search provider API key not configured");
        return RecommendationOutcome::fallback(FallbackReason::MockMode);
    };

    let prompt = build_prompt(user_query, location);
    let reply = match provider.search(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "Search provider call failed, serving fallback recommendations");
            return RecommendationOutcome::fallback(FallbackReason::ProviderFailed(e.to_string()));
        }
    };
    info!("Search provider response received");

    match parse_recommendations(&reply) {
        Ok(recommendations) => RecommendationOutcome::Fresh(recommendations),
        Err(e) => {
            warn!(error = %e, "Could not parse recommendations, serving fallback recommendations");
            RecommendationOutcome::fallback(FallbackReason::ParseFailed(e.to_string()))
        }
    }
}
