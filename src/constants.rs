pub const SESSION_COOKIE: &str = "session";
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const DEFAULT_SERVINGS: i32 = 4;

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
];

pub const PREPARATION_TIME_FILTERS: &[(&str, &str)] = &[
    ("under_20", "Moins de 20 min"),
    ("20_30", "20-30 min"),
    ("30_45", "30-45 min"),
    ("45_60", "45-60 min"),
    ("60_90", "1h-1h30"),
    ("over_90", "Plus de 1h30"),
];

pub const DIFFICULTY_FILTERS: &[(&str, &str)] = &[
    ("easy", "Facile"),
    ("medium", "Intermédiaire"),
    ("hard", "Difficile"),
];

pub const CUISINE_TYPE_FILTERS: &[(&str, &str)] = &[
    // Europe
    ("french", "Française"),
    ("italian", "Italienne"),
    ("spanish", "Espagnole"),
    ("greek", "Grecque"),
    ("mediterranean", "Méditerranéenne"),
    // Asie
    ("japanese", "Japonaise"),
    ("chinese", "Chinoise"),
    ("korean", "Coréenne"),
    ("indian", "Indienne"),
    ("thai", "Thaïlandaise"),
    ("vietnamese", "Vietnamienne"),
    // Amériques
    ("american", "Américaine"),
    ("mexican", "Mexicaine"),
    ("brazilian", "Brésilienne"),
    // Afrique & Moyen-Orient
    ("moroccan", "Marocaine"),
    ("lebanese", "Libanaise"),
];

pub const CUISINE_REGIONS: &[(&str, &[&str])] = &[
    (
        "Europe",
        &["french", "italian", "spanish", "greek", "mediterranean"],
    ),
    (
        "Asie",
        &["japanese", "chinese", "korean", "indian", "thai", "vietnamese"],
    ),
    ("Amériques", &["american", "mexican", "brazilian"]),
    ("Afrique & Moyen-Orient", &["moroccan", "lebanese"]),
];

pub const DISH_TYPE_FILTERS: &[(&str, &str)] = &[
    ("starter", "Entrée"),
    ("main", "Plat principal"),
    ("dessert", "Dessert"),
    ("snack", "En-cas"),
    ("breakfast", "Petit-déjeuner"),
];

pub const DIET_FILTERS: &[(&str, &str)] = &[
    ("vegetarian", "Végétarien"),
    ("vegan", "Végan"),
    ("gluten_free", "Sans gluten"),
    ("lactose_free", "Sans lactose"),
    ("low_carb", "Pauvre en glucides"),
];

pub const COST_FILTERS: &[(&str, &str)] = &[
    ("budget", "Économique"),
    ("moderate", "Modéré"),
    ("expensive", "Coûteux"),
];

/// Filter categories in display order: (key, label, options).
pub const FILTER_CATEGORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "preparation_time",
        "Temps de préparation",
        PREPARATION_TIME_FILTERS,
    ),
    ("difficulty", "Difficulté", DIFFICULTY_FILTERS),
    ("cuisine_type", "Type de cuisine", CUISINE_TYPE_FILTERS),
    ("dish_type", "Type de plat", DISH_TYPE_FILTERS),
    ("diet", "Régime alimentaire", DIET_FILTERS),
    ("cost", "Coût", COST_FILTERS),
];

pub const UNITS: &[(&str, &str)] = &[
    ("g", "Grammes (g)"),
    ("kg", "Kilogrammes (kg)"),
    ("ml", "Millilitres (ml)"),
    ("cl", "Centilitres (cl)"),
    ("l", "Litres (L)"),
    ("cs", "Cuillères à soupe"),
    ("cc", "Cuillères à café"),
    ("pincée", "Pincée"),
    ("unité", "Unité(s)"),
];
