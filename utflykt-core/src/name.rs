//! Display-name synthesis for unnamed records.

use crate::place::{Place, link_host};

/// Placeholder used by sources for records without a usable name.
pub const UNNAMED: &str = "(namnlös)";

/// Ensure a record carries a non-empty display name.
///
/// Missing or sentinel names are replaced by
/// `"{first category, title-cased} – {link host}"`, falling back to the
/// host alone, falling back to the sentinel.
///
/// # Examples
/// ```
/// use utflykt_core::{ensure_name, Place, Provenance};
///
/// let mut place = Place::new(
///     "x",
///     Provenance {
///         name: "Municipal".into(),
///         url: "https://data.example.se".into(),
///         license: "CC0".into(),
///     },
/// );
/// place.categories = vec!["swimming".into()];
/// place.link = Some("https://www.example.se/x".into());
/// ensure_name(&mut place);
/// assert_eq!(place.name.as_deref(), Some("Swimming – example.se"));
/// ```
pub fn ensure_name(place: &mut Place) {
    let current = place.name.as_deref().map(str::trim).unwrap_or_default();
    if !current.is_empty() && current != UNNAMED {
        return;
    }
    let host = place.link.as_deref().and_then(link_host);
    let synthesised = match (place.categories.first(), host) {
        (Some(category), Some(host)) => format!("{} – {host}", title_case(category)),
        (Some(category), None) => title_case(category),
        (None, Some(host)) => host,
        (None, None) => UNNAMED.to_owned(),
    };
    place.name = Some(synthesised);
}

/// Title-case a category tag, turning underscores into spaces.
fn title_case(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::Provenance;
    use rstest::rstest;

    fn place(name: Option<&str>, categories: &[&str], link: Option<&str>) -> Place {
        let mut place = Place::new(
            "x",
            Provenance {
                name: "Test".into(),
                url: "https://example.se".into(),
                license: "CC0".into(),
            },
        );
        place.name = name.map(str::to_owned);
        place.categories = categories.iter().map(|c| (*c).to_owned()).collect();
        place.link = link.map(str::to_owned);
        place
    }

    #[rstest]
    fn keeps_existing_name() {
        let mut subject = place(Some("Tanto utegym"), &["gym"], None);
        ensure_name(&mut subject);
        assert_eq!(subject.name.as_deref(), Some("Tanto utegym"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(UNNAMED))]
    #[case(Some("   "))]
    fn synthesises_from_category_and_host(#[case] name: Option<&str>) {
        let mut subject = place(name, &["swimming"], Some("https://www.example.se/x"));
        ensure_name(&mut subject);
        assert_eq!(subject.name.as_deref(), Some("Swimming – example.se"));
    }

    #[rstest]
    fn title_cases_multi_word_categories() {
        let mut subject = place(None, &["nature_reserve"], None);
        ensure_name(&mut subject);
        assert_eq!(subject.name.as_deref(), Some("Nature Reserve"));
    }

    #[rstest]
    fn falls_back_to_host_alone() {
        let mut subject = place(None, &[], Some("https://badplats.se"));
        ensure_name(&mut subject);
        assert_eq!(subject.name.as_deref(), Some("badplats.se"));
    }

    #[rstest]
    fn falls_back_to_sentinel() {
        let mut subject = place(None, &[], None);
        ensure_name(&mut subject);
        assert_eq!(subject.name.as_deref(), Some(UNNAMED));
    }
}
