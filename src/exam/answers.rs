use std::collections::HashSet;

use uuid::Uuid;

/// Form keys carrying answers look like `choice_<question id>`.
pub static ANSWER_FIELD_PREFIX: &str = "choice_";

/// Collects every choice id posted under an answer field.
///
/// A key may repeat for multi-select questions. Values that are not valid ids are
/// dropped, as are duplicates. Order of first appearance is kept.
pub fn selected_choice_ids<'a, I>(fields: I) -> Vec<Uuid>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for (key, value) in fields {
        if !key.starts_with(ANSWER_FIELD_PREFIX) {
            continue;
        }

        match value.trim().parse::<Uuid>() {
            Ok(id) => {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
            Err(_) => tracing::debug!("ignoring malformed choice id under `{key}`"),
        }
    }
    ids
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collects_only_answer_fields() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fields = vec![
            ("csrfmiddlewaretoken".to_string(), Uuid::new_v4().to_string()),
            (format!("choice_{}", Uuid::new_v4()), a.to_string()),
            (format!("choice_{}", Uuid::new_v4()), b.to_string()),
        ];

        let ids = selected_choice_ids(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn repeated_key_yields_every_value() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let key = format!("choice_{}", Uuid::new_v4());
        let (sa, sb) = (a.to_string(), b.to_string());
        let fields = [(key.as_str(), sa.as_str()), (key.as_str(), sb.as_str())];

        assert_eq!(selected_choice_ids(fields), vec![a, b]);
    }

    #[test]
    fn malformed_and_duplicate_values_are_dropped() {
        let a = Uuid::new_v4();
        let sa = a.to_string();
        let fields = [
            ("choice_1", "42"),
            ("choice_1", ""),
            ("choice_2", sa.as_str()),
            ("choice_3", sa.as_str()),
        ];

        assert_eq!(selected_choice_ids(fields), vec![a]);
    }

    #[test]
    fn large_forms_keep_first_appearance_order() {
        let distinct: Vec<Uuid> = (0..20_000).map(|_| Uuid::new_v4()).collect();
        let values: Vec<String> = distinct.iter().chain(distinct.iter()).map(Uuid::to_string).collect();
        let fields = values.iter().map(|v| ("choice_1", v.as_str()));

        assert_eq!(selected_choice_ids(fields), distinct);
    }

    #[test]
    fn no_fields_no_ids() {
        assert!(selected_choice_ids(std::iter::empty::<(&str, &str)>()).is_empty());
    }
}
