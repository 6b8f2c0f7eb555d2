use rustc_hash::FxHashMap;

/// One committed table entry.
///
/// The shared default is tagged rather than stored, so retirement can never
/// destroy it by mistake, whatever the current default reference is.
#[derive(Debug, Clone)]
pub enum TextureSlot<T> {
    Owned(T),
    Default,
}

/// Lifecycle of a key as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStatus {
    /// Never requested.
    Unrequested,
    /// Requested, nothing committed yet.
    Pending,
    /// A realized texture is installed.
    Committed,
    /// The shared default is installed after a failed load.
    Default,
}

/// Committed state shared between the frame loop and load completions.
#[derive(Debug)]
pub struct TextureTable<T> {
    slots: FxHashMap<String, TextureSlot<T>>,
    // Latest issued request per key.
    latest_seq: FxHashMap<String, u64>,
    default_texture: T,
    destroyed: bool,
}

impl<T: Clone> TextureTable<T> {
    pub fn new(default_texture: T) -> Self {
        Self {
            slots: FxHashMap::default(),
            latest_seq: FxHashMap::default(),
            default_texture,
            destroyed: false,
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn set_default(&mut self, default_texture: T) {
        self.default_texture = default_texture;
    }

    /// Records a new request for `key` and returns its sequence number.
    pub fn issue(&mut self, key: &str) -> u64 {
        let seq = self.latest_seq.entry(key.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// `true` if no request newer than `seq` was issued for `key`.
    pub fn is_current(&self, key: &str, seq: u64) -> bool {
        self.latest_seq.get(key).is_none_or(|&latest| seq >= latest)
    }

    /// Swaps in `slot` and hands back the texture it replaced, if that one
    /// was owned. The caller must destroy it before releasing the table.
    pub fn install(&mut self, key: String, slot: TextureSlot<T>) -> Option<T> {
        match self.slots.insert(key, slot) {
            Some(TextureSlot::Owned(old)) => Some(old),
            Some(TextureSlot::Default) | None => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        match self.slots.get(key)? {
            TextureSlot::Owned(texture) => Some(texture.clone()),
            TextureSlot::Default => Some(self.default_texture.clone()),
        }
    }

    pub fn status(&self, key: &str) -> TextureStatus {
        match self.slots.get(key) {
            Some(TextureSlot::Owned(_)) => TextureStatus::Committed,
            Some(TextureSlot::Default) => TextureStatus::Default,
            None if self.latest_seq.contains_key(key) => TextureStatus::Pending,
            None => TextureStatus::Unrequested,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Empties the table, marks it destroyed and returns every owned texture.
    pub fn tear_down(&mut self) -> Vec<T> {
        self.destroyed = true;
        self.latest_seq.clear();
        self.slots
            .drain()
            .filter_map(|(_, slot)| match slot {
                TextureSlot::Owned(texture) => Some(texture),
                TextureSlot::Default => None,
            })
            .collect()
    }
}
