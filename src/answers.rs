//! Answer collection: one slot per item, never more, never fewer.

use serde::Serialize;

/// Fixed-size answer storage. Slots start at `T::default()`, which is the
/// "unanswered" sentinel; writes outside the sheet are ignored.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerSheet<T> {
    slots: Vec<T>,
}

impl<T: Default + Clone> AnswerSheet<T> {
    pub fn new(len: usize) -> Self {
        Self { slots: vec![T::default(); len] }
    }
}

impl<T> AnswerSheet<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    /// Replace one slot. Returns false (and changes nothing) when out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Spread pasted parts over consecutive slots starting at `start`.
    /// Parts that would land past the last slot are dropped. Returns how many
    /// slots were written.
    pub fn distribute<I>(&mut self, start: usize, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut written = 0;
        for (slot, value) in self.slots.iter_mut().skip(start).zip(values) {
            *slot = value;
            written += 1;
        }
        written
    }

    pub fn filled_count(&self, is_filled: impl Fn(&T) -> bool) -> usize {
        self.slots.iter().filter(|s| is_filled(*s)).count()
    }

    pub fn is_complete(&self, is_filled: impl Fn(&T) -> bool) -> bool {
        self.slots.iter().all(is_filled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(s: &String) -> bool {
        !s.is_empty()
    }

    #[test]
    fn new_sheet_has_one_empty_slot_per_item() {
        let sheet: AnswerSheet<String> = AnswerSheet::new(3);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.filled_count(filled), 0);
        assert!(!sheet.is_complete(filled));
    }

    #[test]
    fn out_of_range_write_is_a_noop() {
        let mut sheet: AnswerSheet<String> = AnswerSheet::new(2);
        assert!(!sheet.set(2, "x".into()));
        assert!(!sheet.set(usize::MAX, "x".into()));
        assert_eq!(sheet, AnswerSheet::new(2));
        assert!(sheet.get(2).is_none());
    }

    #[test]
    fn complete_once_every_slot_is_filled() {
        let mut sheet: AnswerSheet<String> = AnswerSheet::new(2);
        assert!(sheet.set(0, "a".into()));
        assert!(!sheet.is_complete(filled));
        assert!(sheet.set(1, "b".into()));
        assert!(sheet.is_complete(filled));
    }

    #[test]
    fn paste_is_distributed_and_truncated() {
        let mut sheet: AnswerSheet<String> = AnswerSheet::new(4);
        let written = sheet.distribute(2, ["x", "y", "z"].map(String::from));
        assert_eq!(written, 2);
        assert_eq!(sheet.get(2).map(String::as_str), Some("x"));
        assert_eq!(sheet.get(3).map(String::as_str), Some("y"));
        assert_eq!(sheet.len(), 4);

        assert_eq!(sheet.distribute(9, ["q".to_string()]), 0);
    }
}
