use crate::types::{Item, Region};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub text: String,
    /// Region id to restrict to; `None` searches every region.
    pub region: Option<String>,
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(region) = &self.region {
            if &item.region != region {
                return false;
            }
        }

        let needle = self.text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        item.name.to_lowercase().contains(&needle)
            || item
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Items matching `query`, in snapshot order.
pub fn filter_items<'a>(items: &'a [Item], query: &ItemQuery) -> Vec<&'a Item> {
    items.iter().filter(|item| query.matches(item)).collect()
}

/// Display name for a region reference, falling back to the raw reference.
pub fn region_name<'a>(regions: &'a [Region], reference: &'a str) -> &'a str {
    regions
        .iter()
        .find(|r| r.id == reference)
        .map_or(reference, |r| r.name.as_str())
}

/// Keeps a region filter only while that region still exists.
pub fn known_region(regions: &[Region], selected: Option<String>) -> Option<String> {
    selected.filter(|id| regions.iter().any(|r| &r.id == id))
}

pub fn items_in_region<'a>(
    items: &'a [Item],
    region_id: &'a str,
) -> impl Iterator<Item = &'a Item> + 'a {
    items.iter().filter(move |item| item.region == region_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemDraft;

    fn catalog() -> Vec<Item> {
        vec![
            ItemDraft::new("Hammer", "r1").with_id("i1"),
            ItemDraft {
                description: Some("Kombizange mit Schneide".into()),
                ..ItemDraft::new("Zange", "r2")
            }
            .with_id("i2"),
            ItemDraft::new("Vorschlaghammer", "r2").with_id("i3"),
        ]
    }

    fn ids(items: Vec<&Item>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_everything() {
        let items = catalog();
        assert_eq!(ids(filter_items(&items, &ItemQuery::default())), vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn text_is_case_insensitive_and_searches_descriptions() {
        let items = catalog();
        let query = ItemQuery {
            text: "  HAMMER ".into(),
            region: None,
        };
        assert_eq!(ids(filter_items(&items, &query)), vec!["i1", "i3"]);

        let query = ItemQuery {
            text: "schneide".into(),
            region: None,
        };
        assert_eq!(ids(filter_items(&items, &query)), vec!["i2"]);
    }

    #[test]
    fn region_filter_narrows_results() {
        let items = catalog();
        let query = ItemQuery {
            text: "hammer".into(),
            region: Some("r2".into()),
        };
        assert_eq!(ids(filter_items(&items, &query)), vec!["i3"]);
    }

    #[test]
    fn unknown_region_reference_falls_back_to_raw_value() {
        let regions = vec![Region {
            id: "r1".into(),
            name: "Nord".into(),
        }];
        assert_eq!(region_name(&regions, "r1"), "Nord");
        assert_eq!(region_name(&regions, "north"), "north");
    }

    #[test]
    fn items_in_region_matches_reference_exactly() {
        let items = catalog();
        let found: Vec<_> = items_in_region(&items, "r2").map(|i| i.id.as_str()).collect();
        assert_eq!(found, vec!["i2", "i3"]);
    }

    #[test]
    fn stale_region_filter_is_ignored() {
        let regions = vec![Region {
            id: "r1".into(),
            name: "Nord".into(),
        }];

        assert_eq!(known_region(&regions, Some("r1".into())), Some("r1".into()));
        assert_eq!(known_region(&regions, Some("r9".into())), None);
        assert_eq!(known_region(&regions, None), None);

        let query = ItemQuery {
            text: String::new(),
            region: known_region(&regions, Some("r9".into())),
        };
        assert_eq!(ids(filter_items(&catalog(), &query)).len(), catalog().len());
    }
}
