//! Fuzzy matching of logical fields against spreadsheet headers.

/// Accepted header spellings for each logical field, in priority order.
pub mod aliases {
    pub const LATITUDE: &[&str] = &["latitude", "lat", "y"];
    pub const LONGITUDE: &[&str] = &["longitude", "lon", "lng", "long", "x"];
    pub const DESCRIPTION: &[&str] = &[
        "descricao",
        "descrição",
        "description",
        "nome",
        "name",
        "titulo",
        "título",
    ];
    pub const POINT_QUANTITY: &[&str] = &[
        "quantidade",
        "intensidade",
        "valor",
        "peso",
        "populacao",
        "population",
    ];

    pub const STATE: &[&str] = &["estado", "states", "uf", "sigla"];
    pub const STATE_QUANTITY: &[&str] = &[
        "quantidade",
        "intensidade",
        "valor",
        "peso",
        "populacao",
        "population",
    ];

    pub const IBGE_CODE: &[&str] = &["codigo_ibge", "ibge", "codigo", "id_municipio", "cod_ibge"];
    pub const MUNICIPALITY_VALUE: &[&str] = &[
        "valor",
        "quantidade",
        "intensidade",
        "peso",
        "populacao",
        "population",
    ];
}

/// Case-folds a header and strips whitespace and underscores, so that
/// `"Codigo IBGE"`, `"codigo_ibge"` and `"CODIGOIBGE"` compare equal.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns the first header matching any alias. Aliases are tried in order;
/// for each alias, headers are scanned in column order.
pub fn match_column<'a, S: AsRef<str>>(headers: &'a [S], aliases: &[&str]) -> Option<&'a str> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect();

    aliases.iter().find_map(|alias| {
        let alias = normalize_header(alias);
        normalized
            .iter()
            .position(|h| *h == alias)
            .map(|idx| headers[idx].as_ref())
    })
}

/// Whether any header matches any alias.
pub fn has_column<S: AsRef<str>>(headers: &[S], aliases: &[&str]) -> bool {
    match_column(headers, aliases).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Codigo_IBGE "), "codigoibge");
        assert_eq!(normalize_header("Id Municipio"), "idmunicipio");
        assert_eq!(normalize_header("Título"), "título");
    }

    #[test]
    fn test_returns_original_header_text() {
        let headers = ["Nome", "LAT", "Lng"];
        assert_eq!(match_column(&headers, aliases::LATITUDE), Some("LAT"));
        assert_eq!(match_column(&headers, aliases::LONGITUDE), Some("Lng"));
        assert_eq!(match_column(&headers, aliases::DESCRIPTION), Some("Nome"));
    }

    #[test]
    fn test_alias_priority_beats_column_order() {
        // "descricao" outranks "nome" even though "nome" comes first.
        let headers = ["nome", "descricao"];
        assert_eq!(match_column(&headers, aliases::DESCRIPTION), Some("descricao"));
    }

    #[test]
    fn test_column_order_within_alias() {
        let headers = ["Valor", "valor"];
        assert_eq!(match_column(&headers, &["valor"]), Some("Valor"));
    }

    #[test]
    fn test_missing_field() {
        let headers = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(match_column(&headers, aliases::LATITUDE), None);
        assert!(!has_column(&headers, aliases::IBGE_CODE));
    }

    #[test]
    fn test_underscore_insensitive_alias() {
        let headers = ["COD IBGE", "valor"];
        assert_eq!(match_column(&headers, aliases::IBGE_CODE), Some("COD IBGE"));
    }
}
