use crate::model::{ConfigError, UnknownCategoryError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Ordered brand keywords per category. Later keywords win when several match.
const BUILTIN_BRANDS: &[(&str, &[&str])] = &[
    ("telefonos", &["samsung", "iphone", "huawei", "xiaomi", "motorola", "nokia", "lg ", "alcatel", "kalley", "asus"]),
    ("computadores-tablets", &["acer", "hp", "lenovo", "asus", "mac", "ipad", "lg ", "huawei", "epson", "benq", "samsung", "rog", "aoc"]),
    ("televisores", &["lg ", "samsung", "sony", "panasonic", "challenger", "hyundai", "aoc", "kalley", "philips"]),
    ("electrodomesticos", &[
        "abba", "oster", "kalley", "challenger", "haceb", "mabe", "whirlpool", "electrolux", "black & decker",
        "samsung", "lg", "samurai", "remington", "universal", "imusa", "superior", "gama", "kitchenaid",
        "boccherini", "hamilton", "general electric", "karcher", "panasonic", "philips", "westinghouse",
        "babyliss", "conair", "multitech", "cuisinart", "singer", "wahl", "centrales", "honeywell", "ninja",
        "sunbeam", "t-fal", "bionaire",
    ]),
    ("audio", &[
        "bose", "jbl", "sony", "kalley", "samsung", "lg ", "yamaha", "esenses", "panasonic", "better",
        "multitech", "hp", "pioneer", "philips", "klipxtreme", "apple", "earpods", "huawei", "klipsch",
        "xiaomi", "hyundai", "braven", "xtech", "google", "ifrogz", "logitech", "thrustmaster", "hyperx", "xcb",
    ]),
    ("video-juegos", &["ps4", "xbox", "funko", "nintendo"]),
    ("accesorios", &[
        "kalley", "hp", "apple", "ipad", "iphone", "belkin", "bestcom", "samsung", "adata", "techtex", "bose",
        "case logic", "microsoft", "targus", "lenovo", "technosoportes", "huawei", "marcar", "thule", "techbag",
        "magom", "kingston", "x-kim", "forza", "klipxtreme", "multitech", "startec", "sandisk", "logitech",
        "tp-link", "esenses", "sony", "funko", "verbatim", "kanex", "jbl", "fitbit", "google", "xcb", "gopro",
        "xiaomi", "altigo", "legion", "primus", "motorola", "toshiba", "wacom", "zagg", "thrustmaster",
        "linksys", "ifrogz", "kenex", "hyoerx", "emmtec", "e4u", "lg ", "acer", "nintendo", "nexxt", "mcafee",
        "lite on", "tapo",
    ]),
    ("camaras", &["canon", "sony", "gopro", "olympus"]),
    ("netflix-otros", &["xbox", "virgin", "spotify", "microsoft", "playstation", "netflix", "imvu", "kaspersky"]),
    ("smartwatch", &["samsung", "fitbit", "apple", "huawei", "polar", "xiaomi"]),
    ("deportes", &[
        "evo", "aktive", "emove", "polar", "sportop", "proform", "healthy sports", "powerfit", "vitanas",
        "nordictrack", "atacama", "bisto", "body shaper", "cybex", "fitbit",
    ]),
    ("hogar-muebles", &["tukasa", "practimac", "inval", "maderkit", "dko design", "vanyplas", "rimax"]),
];

/// On-disk shape of a `--brands` override file.
#[derive(Debug, Deserialize)]
pub struct BrandConfig {
    pub categories: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct BrandCatalog {
    categories: HashMap<String, Vec<String>>,
}

impl BrandCatalog {
    pub fn builtin() -> Self {
        let categories = BUILTIN_BRANDS
            .iter()
            .map(|(category, keywords)| {
                let keywords = keywords.iter().map(|k| k.to_string()).collect();
                (category.to_string(), keywords)
            })
            .collect();
        Self { categories }
    }

    /// Replaces or adds categories. Keywords are folded to lower case.
    pub fn apply(&mut self, overrides: BrandConfig) -> Result<(), ConfigError> {
        for (category, keywords) in overrides.categories {
            if keywords.iter().any(|k| k.is_empty()) {
                return Err(ConfigError::EmptyKeyword(category));
            }
            let keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
            self.categories.insert(category, keywords);
        }
        Ok(())
    }

    pub fn keywords(&self, category: &str) -> Result<&[String], UnknownCategoryError> {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| UnknownCategoryError(category.to_string()))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl Default for BrandCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn load_config(path: &Path) -> Result<BrandConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BrandConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Built-in table with the overrides from `path` applied, if any.
pub fn load_brands(path: Option<&Path>) -> Result<BrandCatalog, ConfigError> {
    let mut brands = BrandCatalog::builtin();
    if let Some(path) = path {
        brands.apply(load_config(path)?)?;
    }
    Ok(brands)
}
