use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::menu::{MealAssignment, ShoppingListEntry};

/// "[quantité] [reste]" — la quantité décimale accepte la virgule française.
static INGREDIENT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9][0-9.,]*)?\s*(.*)$").ok());

/// Unités reconnues en tête d'ingrédient. Un premier mot hors de cette liste
/// fait partie du nom.
const UNITES: &[&str] = &[
    "g", "kg", "mg", "l", "dl", "cl", "ml", "cs", "cc", "sachet", "sachets", "tranche",
    "tranches", "gousse", "gousses", "pincee", "pincée", "boite", "boîte", "boites",
    "boîtes", "paquet", "paquets", "verre", "verres", "tasse", "tasses", "cuillere",
    "cuillère", "cuilleres", "cuillères", "pot", "pots", "branche", "branches",
    "feuille", "feuilles", "brin", "brins",
];

/// Catégories testées dans cet ordre; la première qui matche gagne.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("fruits", &["pomme", "banane", "orange", "fraise", "citron"]),
    ("légumes", &["carotte", "oignon", "tomate", "poivron", "courgette"]),
    ("viandes", &["poulet", "boeuf", "porc", "dinde", "agneau"]),
    ("produits_laitiers", &["lait", "fromage", "yaourt", "beurre", "crème"]),
    ("épicerie", &["farine", "sucre", "sel", "huile", "vinaigre"]),
];

const CATEGORIE_PAR_DEFAUT: &str = "autres";

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIngredient {
    pub quantity: f64,
    pub unit: String,
    /// Casse d'origine conservée; la comparaison se fait en minuscules.
    pub name: String,
}

pub struct ShoppingListService;

impl ShoppingListService {
    /// Découpe "1 kg farine" en quantité, unité, nom. Quantité absente = 1,
    /// unité absente = chaîne vide.
    pub fn parse(ingredient: &str) -> ParsedIngredient {
        let trimmed = ingredient.trim();

        let (quantity, rest) = match INGREDIENT_PATTERN.as_ref() {
            Some(re) => match re.captures(trimmed) {
                Some(caps) => {
                    let quantity = caps
                        .get(1)
                        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
                        .unwrap_or(1.0);
                    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    (quantity, rest)
                }
                None => (1.0, trimmed),
            },
            None => (1.0, trimmed),
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("").trim();
        let remainder = parts.next().unwrap_or("").trim();

        if UNITES.contains(&first.to_lowercase().as_str()) {
            ParsedIngredient {
                quantity,
                unit: first.to_string(),
                name: remainder.to_string(),
            }
        } else {
            ParsedIngredient {
                quantity,
                unit: String::new(),
                name: rest.trim().to_string(),
            }
        }
    }

    /// Première catégorie dont un mot-clef apparaît dans le nom.
    pub fn categorize(name: &str) -> String {
        let lower = name.to_lowercase();
        for (category, keywords) in CATEGORIES {
            if keywords.iter().any(|k| lower.contains(k)) {
                return (*category).to_string();
            }
        }
        CATEGORIE_PAR_DEFAUT.to_string()
    }

    /// Aggregates every ingredient of every assigned recipe. Two entries merge
    /// (quantities summed) only when the lower-cased name matches AND the unit
    /// matches exactly; same name under another unit stays a distinct entry.
    pub fn aggregate(meals: &[MealAssignment]) -> Vec<ShoppingListEntry> {
        let mut entries: Vec<ShoppingListEntry> = Vec::new();
        let mut index: BTreeMap<(String, String), usize> = BTreeMap::new();

        for assignment in meals {
            for raw in &assignment.repas.ingredients {
                let parsed = Self::parse(raw);
                if parsed.name.is_empty() {
                    tracing::warn!("Ingrédient illisible, ignoré: '{}'", raw);
                    continue;
                }

                let key = (parsed.name.to_lowercase(), parsed.unit.clone());
                match index.get(&key) {
                    Some(&i) => entries[i].quantity += parsed.quantity,
                    None => {
                        index.insert(key, entries.len());
                        entries.push(ShoppingListEntry {
                            category: Self::categorize(&parsed.name),
                            name: parsed.name,
                            quantity: parsed.quantity,
                            unit: parsed.unit,
                            checked: false,
                        });
                    }
                }
            }
        }

        entries
    }

    /// Regroupe les entrées par catégorie, dans l'ordre alphabétique des
    /// catégories, en conservant l'ordre d'apparition à l'intérieur.
    pub fn grouped(entries: &[ShoppingListEntry]) -> BTreeMap<String, Vec<ShoppingListEntry>> {
        let mut grouped: BTreeMap<String, Vec<ShoppingListEntry>> = BTreeMap::new();
        for entry in entries {
            grouped
                .entry(entry.category.clone())
                .or_default()
                .push(entry.clone());
        }
        grouped
    }
}
