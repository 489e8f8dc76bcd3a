//! URL slug derivation.
//!
//! Category slugs route `/categories/{slug}` pages and filter product
//! listings. When the back-office form leaves the slug blank it is derived
//! from the name.

/// Derive a slug: accents stripped, lowercase, separators collapsed into a
/// single hyphen, other punctuation dropped.
///
/// ```
/// use vitrine_core::slugify;
///
/// assert_eq!(slugify("Vestidos"), "vestidos");
/// assert_eq!(slugify("Moda Praia Verão"), "moda-praia-verao");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for ch in input.chars() {
        let folded = fold_accent(ch);
        if folded.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(folded.to_ascii_lowercase());
        } else if folded.is_whitespace() || matches!(folded, '-' | '_' | '/' | '.') {
            pending_hyphen = true;
        }
    }

    slug
}

/// Map Latin letters with diacritics to their base letter.
const fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word() {
        assert_eq!(slugify("Vestidos"), "vestidos");
    }

    #[test]
    fn test_accents_and_spaces() {
        assert_eq!(slugify("Moda Praia Verão"), "moda-praia-verao");
        assert_eq!(slugify("Calçados & Acessórios"), "calcados-acessorios");
        assert_eq!(slugify("CAMISETAS BÁSICAS"), "camisetas-basicas");
    }

    #[test]
    fn test_collapses_and_trims_separators() {
        assert_eq!(slugify("  Saias   Longas  "), "saias-longas");
        assert_eq!(slugify("Jeans--Slim_Fit"), "jeans-slim-fit");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_canonical_slug_is_unchanged() {
        assert_eq!(slugify("moda-praia"), "moda-praia");
    }
}
