//! Keyword classification of provider event labels.
//!
//! Rules are evaluated in a fixed order so that labels carrying several
//! keywords always land in the same category. The tax-relevant categories come
//! first: "Dividendo (juros)" is jcp, not dividend.

use super::IncomeCategory;

const CATEGORY_RULES: [(&[&str], IncomeCategory); 5] = [
    (&["jcp", "juros"], IncomeCategory::Jcp),
    (&["amort"], IncomeCategory::Amortization),
    (&["rend"], IncomeCategory::Rendimento),
    (&["subscr", "preferenc"], IncomeCategory::Subscription),
    (&["divid", "provent"], IncomeCategory::Dividend),
];

/// Lowercases and strips Portuguese diacritics so "Subscrição" and
/// "Preferência" match their ASCII keywords.
pub fn fold_label(label: &str) -> String {
    label
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Classifies an event from its type label and raw type field.
pub fn classify_category(event_type: Option<&str>, raw_type: Option<&str>) -> IncomeCategory {
    let haystack = fold_label(&format!(
        "{} {}",
        event_type.unwrap_or_default(),
        raw_type.unwrap_or_default()
    ));

    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(IncomeCategory::Other)
}
