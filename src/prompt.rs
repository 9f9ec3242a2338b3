//! Prompt construction.
//!
//! The relay sends one fixed instruction by default. The UI still collects
//! season, time of day, color scheme and fantasy level; `PromptMode::Templated`
//! folds those into the prompt, `PromptMode::Fixed` ignores them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The instruction sent upstream when the caller leaves the prompt blank.
pub const DEFAULT_PROMPT: &str = "この画像をスタジオジブリ風にして欲しい。";

pub fn default_prompt() -> &'static str {
    DEFAULT_PROMPT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Season {
    #[serde(alias = "春")]
    Spring,
    #[serde(alias = "夏")]
    Summer,
    #[serde(alias = "秋")]
    Autumn,
    #[serde(alias = "冬")]
    Winter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDay {
    #[serde(alias = "マジックアワー")]
    MagicHour,
    #[serde(alias = "朝")]
    Morning,
    #[serde(alias = "昼")]
    Daytime,
    #[serde(alias = "夜")]
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    #[serde(alias = "パールホワイト")]
    PearlWhite,
    #[serde(alias = "ワインレッド")]
    WineRed,
    #[serde(alias = "アンバーグロウ")]
    AmberGlow,
    #[serde(alias = "パステルブルー")]
    PastelBlue,
}

pub const MIN_FANTASY_LEVEL: u8 = 1;
pub const MAX_FANTASY_LEVEL: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    pub season: Season,
    pub time_of_day: TimeOfDay,
    pub color_scheme: ColorScheme,
    pub fantasy_level: u8,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            season: Season::Spring,
            time_of_day: TimeOfDay::MagicHour,
            color_scheme: ColorScheme::PearlWhite,
            fantasy_level: 3,
        }
    }
}

impl PromptOptions {
    pub fn clamped_fantasy_level(&self) -> u8 {
        self.fantasy_level
            .clamp(MIN_FANTASY_LEVEL, MAX_FANTASY_LEVEL)
    }
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub base_prompt: String,
    pub seasonal_elements: HashMap<Season, String>,
    pub time_elements: HashMap<TimeOfDay, String>,
    pub color_schemes: HashMap<ColorScheme, String>,
    pub fantasy_levels: HashMap<u8, String>,
}

impl PromptTemplate {
    pub fn ghibli_wedding() -> Self {
        let base_prompt = [
            "Studio Ghibli style wedding scene with a couple blessed by forest fairies,",
            "highly detailed hand-painted anime background art.",
            "The bride wears a white lace dress with a flowing veil, the groom an elegant morning coat;",
            "ribbons of light drift between their joined hands and petals dance in a magical wind.",
            "The venue is an old stone castle with a spiral staircase, stained glass and a glass ceiling,",
            "with ivy on the floor, rose vines around the pillars and floating candles for soft light.",
        ]
        .join(" ");

        let seasonal_elements = HashMap::from([
            (Season::Spring, "Cherry blossom petals and wisteria in bloom, soft pink and purple hues, gentle spring breeze"),
            (Season::Summer, "Lush green foliage, sunflowers and lavender, bright vibrant colors, warm golden light"),
            (Season::Autumn, "Maple leaves and chrysanthemums, warm orange and red tones, harvest atmosphere"),
            (Season::Winter, "Snow crystals and evergreen branches, white and silver tones, crystalline magic particles"),
        ]);
        let time_elements = HashMap::from([
            (TimeOfDay::MagicHour, "Golden hour light just after sunset, amber glow gradient"),
            (TimeOfDay::Morning, "Soft morning light, dew drops, gentle sunrise colors"),
            (TimeOfDay::Daytime, "Bright daylight streaming through glass, clear and cheerful colors"),
            (TimeOfDay::Night, "Moonlight and starlight, deep blue tones, fireflies"),
        ]);
        let color_schemes = HashMap::from([
            (ColorScheme::PearlWhite, "Pearl white and ecru palette, elegant and pure tones"),
            (ColorScheme::WineRed, "Wine red roses as accent colors, rich and passionate tones"),
            (ColorScheme::AmberGlow, "Amber glow gradient lighting, warm golden atmosphere"),
            (ColorScheme::PastelBlue, "Pastel blue magical effects, soft and dreamy atmosphere"),
        ]);
        let fantasy_levels = HashMap::from([
            (1, "Subtle magical elements, realistic with slight fantasy touches"),
            (2, "Light magical particles, gentle fantasy atmosphere"),
            (3, "Moderate magical effects, floating objects and glowing elements"),
            (4, "Strong magical presence, fairy creatures and magical phenomena"),
            (5, "Maximum magical particles and effects, full fantasy wonderland"),
        ]);

        Self {
            base_prompt,
            seasonal_elements: own_values(seasonal_elements),
            time_elements: own_values(time_elements),
            color_schemes: own_values(color_schemes),
            fantasy_levels: own_values(fantasy_levels),
        }
    }
}

fn own_values<K: std::hash::Hash + Eq>(map: HashMap<K, &str>) -> HashMap<K, String> {
    map.into_iter().map(|(k, v)| (k, v.to_string())).collect()
}

/// Pure composition of the template and the selected options.
pub fn compose_prompt(template: &PromptTemplate, options: &PromptOptions) -> String {
    let mut parts = vec![DEFAULT_PROMPT.to_string(), template.base_prompt.clone()];

    let modifiers = [
        template.seasonal_elements.get(&options.season),
        template.time_elements.get(&options.time_of_day),
        template.color_schemes.get(&options.color_scheme),
        template
            .fantasy_levels
            .get(&options.clamped_fantasy_level()),
    ];
    parts.extend(modifiers.into_iter().flatten().cloned());

    parts.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Always the fixed instruction; options are ignored.
    Fixed,
    Templated,
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PromptMode::Fixed),
            "templated" | "template" => Ok(PromptMode::Templated),
            other => Err(format!("unknown prompt mode '{}'", other)),
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptMode::Fixed => write!(f, "fixed"),
            PromptMode::Templated => write!(f, "templated"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    mode: PromptMode,
    template: PromptTemplate,
}

impl PromptBuilder {
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            template: PromptTemplate::ghibli_wedding(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn build(&self, options: &PromptOptions) -> String {
        match self.mode {
            PromptMode::Fixed => DEFAULT_PROMPT.to_string(),
            PromptMode::Templated => compose_prompt(&self.template, options),
        }
    }

    /// Caller text wins; blank text falls back to the default instruction.
    pub fn resolve(&self, prompt: &str) -> String {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_mode_ignores_options() {
        let builder = PromptBuilder::new(PromptMode::Fixed);
        let winter = PromptOptions {
            season: Season::Winter,
            time_of_day: TimeOfDay::Night,
            color_scheme: ColorScheme::WineRed,
            fantasy_level: 5,
        };
        assert_eq!(builder.build(&PromptOptions::default()), DEFAULT_PROMPT);
        assert_eq!(builder.build(&winter), DEFAULT_PROMPT);
    }

    #[test]
    fn templated_mode_includes_every_modifier() {
        let builder = PromptBuilder::new(PromptMode::Templated);
        let options = PromptOptions {
            season: Season::Autumn,
            time_of_day: TimeOfDay::Morning,
            color_scheme: ColorScheme::PastelBlue,
            fantasy_level: 1,
        };
        let prompt = builder.build(&options);

        assert!(prompt.starts_with(DEFAULT_PROMPT));
        assert!(prompt.contains("Maple leaves"));
        assert!(prompt.contains("Soft morning light"));
        assert!(prompt.contains("Pastel blue"));
        assert!(prompt.contains("Subtle magical elements"));
    }

    #[test]
    fn fantasy_level_is_clamped() {
        let template = PromptTemplate::ghibli_wedding();
        let options = PromptOptions {
            fantasy_level: 42,
            ..PromptOptions::default()
        };
        assert!(compose_prompt(&template, &options).contains("full fantasy wonderland"));

        let options = PromptOptions {
            fantasy_level: 0,
            ..PromptOptions::default()
        };
        assert!(compose_prompt(&template, &options).contains("Subtle magical elements"));
    }

    #[test]
    fn options_accept_ui_labels() {
        let options: PromptOptions = serde_json::from_str(
            r#"{"season":"冬","timeOfDay":"magic-hour","colorScheme":"アンバーグロウ","fantasyLevel":4}"#,
        )
        .unwrap();
        assert_eq!(options.season, Season::Winter);
        assert_eq!(options.time_of_day, TimeOfDay::MagicHour);
        assert_eq!(options.color_scheme, ColorScheme::AmberGlow);
    }

    #[test]
    fn blank_prompt_resolves_to_default() {
        let builder = PromptBuilder::new(PromptMode::Fixed);
        assert_eq!(builder.resolve("   "), DEFAULT_PROMPT);
        assert_eq!(builder.resolve(" make it dreamy "), "make it dreamy");
    }

    #[test]
    fn prompt_mode_parses() {
        assert_eq!("Templated".parse::<PromptMode>(), Ok(PromptMode::Templated));
        assert_eq!("fixed".parse::<PromptMode>(), Ok(PromptMode::Fixed));
        assert!("other".parse::<PromptMode>().is_err());
    }
}
