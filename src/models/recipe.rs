use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::user::User;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Ingredient {
    #[serde(default)]
    pub quantity: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Dietary {
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub vegan: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "nameFR", default)]
    pub name_fr: String,
    pub author: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(rename = "ingredientsFR", default)]
    pub ingredients_fr: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(rename = "stepsFR", default)]
    pub steps_fr: Vec<String>,
    // Minutes per step, parallel to `steps`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timers: Vec<u32>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub dietary: Dietary,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author == username
    }

    pub fn is_editable_by(&self, user: &User) -> bool {
        user.is_admin() || self.is_authored_by(&user.username)
    }

    /// Unpublished recipes are only visible to their author, admins and
    /// translators.
    pub fn is_visible_to(&self, viewer: Option<&User>) -> bool {
        self.published
            || viewer.is_some_and(|u| u.is_translator() || self.is_editable_by(u))
    }

    pub fn is_translated(&self) -> bool {
        !self.name_fr.trim().is_empty()
    }

    /// Name shown for `lang`, falling back to whichever name exists.
    pub fn display_name(&self, lang: Language) -> &str {
        let (preferred, fallback) = match lang {
            Language::En => (&self.name, &self.name_fr),
            Language::Fr => (&self.name_fr, &self.name),
        };
        if preferred.trim().is_empty() {
            fallback
        } else {
            preferred
        }
    }

    /// Fields a publishable recipe should have but this one lacks.
    /// Reported to admins, never enforced.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() && self.name_fr.trim().is_empty() {
            missing.push("name");
        }
        if self.ingredients.is_empty() && self.ingredients_fr.is_empty() {
            missing.push("ingredients");
        }
        if self.steps.is_empty() && self.steps_fr.is_empty() {
            missing.push("steps");
        }
        if self.image_url.trim().is_empty() {
            missing.push("imageURL");
        }
        missing
    }

    /// True when one language side is incomplete relative to the other.
    pub fn needs_translation(&self) -> bool {
        let has_name = !self.name.trim().is_empty();
        let has_name_fr = self.is_translated();

        let needs_name = has_name != has_name_fr;
        let needs_ingredients = !self.ingredients.is_empty()
            && (self.ingredients_fr.len() != self.ingredients.len()
                || self.ingredients_fr.iter().any(|i| i.name.trim().is_empty()));
        let needs_steps = !self.steps.is_empty() && self.steps_fr.len() != self.steps.len();

        needs_name || needs_ingredients || needs_steps
    }

    /// Case-insensitive match on either name or any ingredient name.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.name_fr.to_lowercase().contains(&term)
            || self
                .ingredients
                .iter()
                .chain(self.ingredients_fr.iter())
                .any(|i| i.name.to_lowercase().contains(&term))
    }

    pub fn has_name(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        !wanted.is_empty()
            && (self.name.trim().to_lowercase() == wanted
                || self.name_fr.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soup() -> Recipe {
        Recipe {
            id: "r1".into(),
            name: "Soup".into(),
            name_fr: String::new(),
            author: "alice".into(),
            ingredients: vec![Ingredient {
                quantity: "1".into(),
                name: "onion".into(),
                kind: "veg".into(),
            }],
            ingredients_fr: Vec::new(),
            steps: vec!["Chop".into()],
            steps_fr: Vec::new(),
            timers: Vec::new(),
            image_url: String::new(),
            dietary: Dietary::default(),
            published: false,
            likes: 0,
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility() {
        use super::super::user::Role;
        use std::collections::BTreeSet;

        let mut recipe = soup();
        let author = User::new("alice".into(), "h".into(), BTreeSet::new());
        let mut stranger = User::new("bob".into(), "h".into(), BTreeSet::new());

        assert!(!recipe.is_visible_to(None));
        assert!(recipe.is_visible_to(Some(&author)));
        assert!(!recipe.is_visible_to(Some(&stranger)));

        stranger.roles.insert(Role::Traducteur);
        assert!(recipe.is_visible_to(Some(&stranger)));
        assert!(!recipe.is_editable_by(&stranger));

        recipe.published = true;
        assert!(recipe.is_visible_to(None));
    }

    #[test]
    fn test_missing_fields_reports_image() {
        let recipe = soup();
        assert_eq!(recipe.missing_fields(), vec!["imageURL"]);

        let mut empty = soup();
        empty.name.clear();
        empty.ingredients.clear();
        empty.steps.clear();
        assert_eq!(empty.missing_fields(), vec!["name", "ingredients", "steps", "imageURL"]);
    }

    #[test]
    fn test_needs_translation() {
        let mut recipe = soup();
        assert!(recipe.needs_translation());

        recipe.name_fr = "Soupe".into();
        recipe.ingredients_fr = vec![Ingredient {
            quantity: "1".into(),
            name: "oignon".into(),
            kind: "veg".into(),
        }];
        recipe.steps_fr = vec!["Couper".into()];
        assert!(!recipe.needs_translation());

        // Blank translated ingredient still counts as missing
        recipe.ingredients_fr[0].name.clear();
        assert!(recipe.needs_translation());
    }

    #[test]
    fn test_french_only_recipe_needs_english() {
        let mut recipe = soup();
        recipe.name.clear();
        recipe.name_fr = "Soupe".into();
        recipe.ingredients.clear();
        recipe.steps.clear();
        assert!(recipe.needs_translation());
        assert_eq!(recipe.display_name(Language::En), "Soupe");
    }

    #[test]
    fn test_matches_search() {
        let recipe = soup();
        assert!(recipe.matches_search("SOU"));
        assert!(recipe.matches_search("onion"));
        assert!(recipe.matches_search("  "));
        assert!(!recipe.matches_search("garlic"));
        assert!(recipe.has_name(" soup "));
        assert!(!recipe.has_name("so"));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(soup()).unwrap();
        assert!(json.get("nameFR").is_some());
        assert!(json.get("imageURL").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["ingredients"][0]["type"], "veg");
        assert_eq!(json["dietary"]["glutenFree"], false);
        assert!(json.get("timers").is_none());
    }
}
