//! Brazilian state names and their two-letter codes.

/// Normalized state name -> code. Names are stored lowercase with
/// diacritics folded, the same form `normalize_state_key` produces.
pub const BRAZIL_STATES: &[(&str, &str)] = &[
    ("acre", "AC"),
    ("alagoas", "AL"),
    ("amapa", "AP"),
    ("amazonas", "AM"),
    ("bahia", "BA"),
    ("ceara", "CE"),
    ("distrito federal", "DF"),
    ("espirito santo", "ES"),
    ("goias", "GO"),
    ("maranhao", "MA"),
    ("mato grosso", "MT"),
    ("mato grosso do sul", "MS"),
    ("minas gerais", "MG"),
    ("para", "PA"),
    ("paraiba", "PB"),
    ("parana", "PR"),
    ("pernambuco", "PE"),
    ("piaui", "PI"),
    ("rio de janeiro", "RJ"),
    ("rio grande do norte", "RN"),
    ("rio grande do sul", "RS"),
    ("rondonia", "RO"),
    ("roraima", "RR"),
    ("santa catarina", "SC"),
    ("sao paulo", "SP"),
    ("sergipe", "SE"),
    ("tocantins", "TO"),
];

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Lowercases, trims, collapses inner whitespace and folds Portuguese
/// diacritics. Idempotent.
pub fn normalize_state_key(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .flat_map(char::to_lowercase)
                .map(fold_diacritic)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a normalized key to its state code. Unknown names fall back to
/// the uppercased key, which lets `uf`/`sigla` columns ("sp") through as-is.
pub fn state_code(key: &str) -> String {
    BRAZIL_STATES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| key.to_uppercase())
}
