//! Voice catalog
//!
//! Maps voice identifiers to display names and groups them into categories
//! for display. Metadata for the stock Kokoro voices is built in; any other
//! identifier reported by a model lands in [`VoiceCategory::Other`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

/// Display grouping for voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCategory {
    UsFemalePremium,
    UsFemaleGood,
    UsFemaleBasic,
    UsMaleGood,
    UsMaleBasic,
    UkFemale,
    UkMale,
    Other,
}

impl VoiceCategory {
    /// Display order
    pub const ALL: [VoiceCategory; 8] = [
        VoiceCategory::UsFemalePremium,
        VoiceCategory::UsFemaleGood,
        VoiceCategory::UsFemaleBasic,
        VoiceCategory::UsMaleGood,
        VoiceCategory::UsMaleBasic,
        VoiceCategory::UkFemale,
        VoiceCategory::UkMale,
        VoiceCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCategory::UsFemalePremium => "us_female_premium",
            VoiceCategory::UsFemaleGood => "us_female_good",
            VoiceCategory::UsFemaleBasic => "us_female_basic",
            VoiceCategory::UsMaleGood => "us_male_good",
            VoiceCategory::UsMaleBasic => "us_male_basic",
            VoiceCategory::UkFemale => "uk_female",
            VoiceCategory::UkMale => "uk_male",
            VoiceCategory::Other => "other",
        }
    }
}

/// Stock voice identifiers, used when no other source reports any
pub const BUILTIN_VOICES: [&str; 28] = [
    "af_heart", "af_bella", "af_alloy", "af_aoede", "af_nicole", "af_kore", "af_sarah",
    "af_nova", "af_sky", "af_jessica", "af_river", "am_fenrir", "am_michael", "am_puck",
    "am_echo", "am_eric", "am_liam", "am_onyx", "am_adam", "am_santa", "bf_emma",
    "bf_isabella", "bf_alice", "bf_lily", "bm_george", "bm_fable", "bm_lewis", "bm_daniel",
];

struct VoiceMetadata {
    name: &'static str,
    category: VoiceCategory,
    description: &'static str,
}

static VOICE_METADATA: Lazy<HashMap<&'static str, VoiceMetadata>> = Lazy::new(|| {
    use VoiceCategory::*;

    let table: [(&str, &str, VoiceCategory, &str); 28] = [
        ("af_heart", "Heart ❤️ (Premium)", UsFemalePremium, "Premium US English female voice with natural tone and emotional warmth"),
        ("af_bella", "Bella 🔥 (Premium)", UsFemalePremium, "Premium US English female voice with energetic and expressive delivery"),
        ("af_alloy", "Alloy", UsFemaleGood, "Clear and reliable US English female voice"),
        ("af_aoede", "Aoede", UsFemaleGood, "Smooth and pleasant US English female voice"),
        ("af_nicole", "Nicole 🎧", UsFemaleGood, "Studio-quality US English female voice"),
        ("af_kore", "Kore", UsFemaleGood, "Balanced and natural US English female voice"),
        ("af_sarah", "Sarah", UsFemaleGood, "Friendly and approachable US English female voice"),
        ("af_nova", "Nova", UsFemaleGood, "Modern and clear US English female voice"),
        ("af_sky", "Sky", UsFemaleBasic, "Basic but clear US English female voice"),
        ("af_jessica", "Jessica", UsFemaleBasic, "Standard US English female voice"),
        ("af_river", "River", UsFemaleBasic, "Natural flowing US English female voice"),
        ("am_fenrir", "Fenrir", UsMaleGood, "Strong and clear US English male voice"),
        ("am_michael", "Michael", UsMaleGood, "Professional US English male voice"),
        ("am_puck", "Puck", UsMaleGood, "Energetic and expressive US English male voice"),
        ("am_echo", "Echo", UsMaleBasic, "Standard US English male voice"),
        ("am_eric", "Eric", UsMaleBasic, "Reliable US English male voice"),
        ("am_liam", "Liam", UsMaleBasic, "Friendly US English male voice"),
        ("am_onyx", "Onyx", UsMaleBasic, "Deep US English male voice"),
        ("am_adam", "Adam", UsMaleBasic, "Basic US English male voice"),
        ("am_santa", "Santa 🎅", UsMaleBasic, "Festive US English male voice"),
        ("bf_emma", "Emma 🚺 (Good)", UkFemale, "Clear British English female voice"),
        ("bf_isabella", "Isabella (Good)", UkFemale, "Elegant British English female voice"),
        ("bf_alice", "Alice 🚺 (Basic)", UkFemale, "Standard British English female voice"),
        ("bf_lily", "Lily 🚺 (Basic)", UkFemale, "Pleasant British English female voice"),
        ("bm_george", "George (Good)", UkMale, "Classic British English male voice"),
        ("bm_fable", "Fable 🚹 (Good)", UkMale, "Expressive British English male voice"),
        ("bm_lewis", "Lewis (Basic)", UkMale, "Standard British English male voice"),
        ("bm_daniel", "Daniel 🚹 (Basic)", UkMale, "Reliable British English male voice"),
    ];

    table
        .into_iter()
        .map(|(id, name, category, description)| {
            (
                id,
                VoiceMetadata {
                    name,
                    category,
                    description,
                },
            )
        })
        .collect()
});

/// One voice as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub category: VoiceCategory,
}

impl VoiceEntry {
    /// Build an entry, using built-in metadata when the id is known
    pub fn for_id(id: &str) -> Self {
        match VOICE_METADATA.get(id) {
            Some(meta) => Self {
                id: id.to_string(),
                name: meta.name.to_string(),
                description: meta.description.to_string(),
                category: meta.category,
            },
            None => Self {
                id: id.to_string(),
                name: id.to_string(),
                description: format!("Voice: {}", id),
                category: VoiceCategory::Other,
            },
        }
    }
}

/// Read-only snapshot of the available voices
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    entries: Vec<VoiceEntry>,
    index: HashMap<String, usize>,
}

impl VoiceCatalog {
    /// Build a catalog from voice identifiers, keeping first-seen order
    ///
    /// Blank identifiers and duplicates are skipped.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() || catalog.index.contains_key(id) {
                continue;
            }
            catalog.index.insert(id.to_string(), catalog.entries.len());
            catalog.entries.push(VoiceEntry::for_id(id));
        }
        catalog
    }

    /// Catalog of the stock voices
    pub fn builtin() -> Self {
        Self::from_ids(BUILTIN_VOICES)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&VoiceEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Voice identifiers in catalog order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Voices of one category, in catalog order
    pub fn in_category(&self, category: VoiceCategory) -> impl Iterator<Item = &VoiceEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Serializable `{id: name}` view
    pub fn names(&self) -> VoiceNames<'_> {
        VoiceNames(self)
    }

    /// Serializable `{category: [entry, ...]}` view covering every category
    pub fn categories(&self) -> VoiceCategories<'_> {
        VoiceCategories(self)
    }
}

/// See [`VoiceCatalog::names`]
pub struct VoiceNames<'a>(&'a VoiceCatalog);

impl Serialize for VoiceNames<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.entries.iter().map(|e| (&e.id, &e.name)))
    }
}

/// See [`VoiceCatalog::categories`]
pub struct VoiceCategories<'a>(&'a VoiceCatalog);

impl Serialize for VoiceCategories<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(VoiceCategory::ALL.iter().map(|category| {
            let voices: Vec<&VoiceEntry> = self.0.in_category(*category).collect();
            (category.as_str(), voices)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = VoiceCatalog::builtin();
        assert_eq!(catalog.len(), 28);
        assert!(catalog.contains("af_heart"));
        assert_eq!(catalog.get("bm_george").unwrap().category, VoiceCategory::UkMale);
        assert_eq!(catalog.ids()[0], "af_heart");
    }

    #[test]
    fn test_unknown_ids_go_to_other() {
        let catalog = VoiceCatalog::from_ids(["af_heart", "zz_custom", "af_heart", "  "]);
        assert_eq!(catalog.len(), 2);
        let custom = catalog.get("zz_custom").unwrap();
        assert_eq!(custom.name, "zz_custom");
        assert_eq!(custom.description, "Voice: zz_custom");
        assert_eq!(custom.category, VoiceCategory::Other);
    }

    #[test]
    fn test_category_view_lists_every_category() {
        let catalog = VoiceCatalog::from_ids(["af_heart", "am_adam"]);
        let json = serde_json::to_value(catalog.categories()).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), VoiceCategory::ALL.len());
        assert_eq!(map["us_female_premium"][0]["id"], "af_heart");
        assert_eq!(map["us_male_basic"][0]["name"], "Adam");
        assert!(map["uk_male"].as_array().unwrap().is_empty());
        // category is implied by the key
        assert!(map["us_female_premium"][0].get("category").is_none());
    }

    #[test]
    fn test_names_view() {
        let catalog = VoiceCatalog::from_ids(["bf_emma"]);
        let json = serde_json::to_value(catalog.names()).unwrap();
        assert_eq!(json["bf_emma"], "Emma 🚺 (Good)");
    }
}
