use data::{Language, NameResolver};

use crate::{Rect, ocr::RecognizedWord};

/// Index of an item in an [`ItemArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(usize);

/// A recognized label, plus what later stages learn about it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InventoryItem {
    /// Text as recognized, after noise cleanup.
    pub raw: String,
    /// Label bounds in capture coordinates.
    pub rect: Rect,
    /// Canonical catalog name, when one was found.
    pub name: Option<String>,
    /// Catalog key of `name`.
    pub key: Option<String>,
    pub count: u32,
    /// The name could not be resolved with confidence.
    pub warning: bool,
}

impl InventoryItem {
    pub fn new(raw: impl Into<String>, rect: Rect) -> Self {
        Self {
            raw: raw.into(),
            rect,
            name: None,
            key: None,
            count: 1,
            warning: false,
        }
    }
}

/// Items under construction.
///
/// Word clustering creates entries, the resolver fills in names and the
/// count detector sets counts; each stage addresses items by [`ItemId`].
#[derive(Debug, Default)]
pub struct ItemArena {
    items: Vec<InventoryItem>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: InventoryItem) -> ItemId {
        self.items.push(item);
        ItemId(self.items.len() - 1)
    }

    pub fn get(&self, id: ItemId) -> &InventoryItem {
        &self.items[id.0]
    }

    pub fn get_mut(&mut self, id: ItemId) -> &mut InventoryItem {
        &mut self.items[id.0]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &InventoryItem)> {
        self.items.iter().enumerate().map(|(i, v)| (ItemId(i), v))
    }

    /// Group words into labels.
    ///
    /// Words are visited top to bottom, left to right. A word joins the most
    /// recent item when its box, grown by its height sideways and half its
    /// height vertically, touches that item; otherwise it starts a new one.
    pub fn cluster_words(&mut self, mut words: Vec<RecognizedWord>) {
        words.sort_by_key(|w| (w.rect.y, w.rect.x));
        let mut current: Option<ItemId> = None;
        for word in words {
            let text = word.text.trim();
            if text.is_empty() {
                continue;
            }
            let grown = word.rect.inflate(word.rect.h, word.rect.h / 2);
            match current {
                Some(id) if self.get(id).rect.intersects(&grown) => {
                    let item = self.get_mut(id);
                    item.raw.push(' ');
                    item.raw.push_str(text);
                    item.rect = item.rect.union(&word.rect);
                }
                _ => current = Some(self.push(InventoryItem::new(text, word.rect))),
            }
        }
    }

    /// Clean every item's text for `lang` and drop the ones left empty.
    pub fn clean_text(&mut self, lang: Language) {
        self.items.retain_mut(|item| {
            item.raw = lang.clean_ocr_text(&item.raw);
            !item.raw.is_empty()
        });
    }

    /// Resolve every item against the catalog and flag weak matches.
    pub fn resolve_names(&mut self, resolver: &NameResolver) {
        for item in &mut self.items {
            match resolver.resolve(&item.raw) {
                Some(res) => {
                    item.warning = res.low_confidence(resolver.language());
                    item.name = Some(res.name);
                    item.key = Some(res.key);
                }
                None => {
                    item.warning = true;
                    item.name = None;
                    item.key = None;
                }
            }
        }
    }

    pub fn into_items(self) -> Vec<InventoryItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use data::Catalog;

    use super::*;

    fn word(text: &str, x: u32, y: u32, w: u32) -> RecognizedWord {
        RecognizedWord {
            text: text.to_owned(),
            rect: Rect::new(x, y, w, 20),
        }
    }

    #[test]
    fn nearby_words_merge_into_labels() {
        let mut arena = ItemArena::new();
        arena.cluster_words(vec![
            word("Systems", 130, 10, 70),
            word("Nova", 10, 10, 45),
            word("Prime", 65, 10, 55),
            word("Forma", 400, 10, 50),
        ]);
        let items = arena.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].raw, "Nova Prime Systems");
        assert_eq!(items[0].rect, Rect::new(10, 10, 190, 20));
        assert_eq!(items[1].raw, "Forma");
        assert_eq!(items[1].count, 1);
    }

    #[test]
    fn second_line_joins_label() {
        let mut arena = ItemArena::new();
        arena.cluster_words(vec![word("Ash Prime", 10, 10, 90), word("Blueprint", 12, 38, 80)]);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(ItemId(0)).raw, "Ash Prime Blueprint");
    }

    #[test]
    fn resolution_sets_names_and_warnings() {
        let catalog = Catalog::from_pairs([("nova", "Nova Prime Systems"), ("bo", "Bo Prime Set")]);
        let resolver = NameResolver::new(&catalog, Language::English);
        let mut arena = ItemArena::new();
        arena.push(InventoryItem::new("Nova Prlme Systems!", Rect::new(0, 0, 10, 10)));
        arena.push(InventoryItem::new("Bo Prime Set", Rect::new(0, 20, 10, 10)));
        arena.push(InventoryItem::new("%%", Rect::new(0, 40, 10, 10)));
        arena.clean_text(Language::English);
        assert_eq!(arena.len(), 2);
        arena.resolve_names(&resolver);

        let items = arena.into_items();
        assert_eq!(items[0].name.as_deref(), Some("Nova Prime Systems"));
        assert_eq!(items[0].key.as_deref(), Some("nova"));
        assert!(!items[0].warning);
        assert_eq!(items[1].name.as_deref(), Some("Bo Prime Set"));
        assert!(items[1].warning);
    }
}
