//! Header table storage.
//!
//! Entries hold [`Span`]s into the most recently parsed buffer rather than
//! borrowed slices, so the parser carries no buffer lifetime and can be
//! reused against rotating or growing buffers. The only owned bytes are the
//! values rebuilt by line folding.

use std::slice;

/// Slots added to the header table each time it fills up.
pub const HEADER_GROWTH: usize = 4;

/// A byte range within the parsed input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    /// Create a span covering `start..end`.
    #[inline]
    #[must_use]
    pub(crate) fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// Offset of the first byte.
    #[inline]
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Number of bytes covered.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the span covers no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolve the span against a buffer.
    ///
    /// A span that does not fit in `input` resolves to an empty slice.
    #[inline]
    #[must_use]
    pub fn resolve<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        input.get(self.start..self.end()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueSlot {
    /// Value aliases the input buffer.
    Span(Span),
    /// Value was rebuilt by folding continuation lines.
    Folded(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) name: Span,
    pub(crate) value: ValueSlot,
}

impl Entry {
    pub(crate) fn new(name: Span, value: Span) -> Self {
        Self {
            name,
            value: ValueSlot::Span(value),
        }
    }

    #[inline]
    pub(crate) fn name<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        self.name.resolve(input)
    }

    #[inline]
    pub(crate) fn value<'a>(&'a self, input: &'a [u8]) -> &'a [u8] {
        match &self.value {
            ValueSlot::Span(span) => span.resolve(input),
            ValueSlot::Folded(bytes) => bytes,
        }
    }

    #[inline]
    pub(crate) fn is_folded(&self) -> bool {
        matches!(self.value, ValueSlot::Folded(_))
    }
}

/// Ordered, growable table of header entries.
///
/// Growth is linear: a full table gains [`HEADER_GROWTH`] slots. Entries keep
/// document order and are only ever appended or folded in place.
#[derive(Debug, Clone)]
pub(crate) struct HeaderTable {
    entries: Vec<Entry>,
}

impl HeaderTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub(crate) fn iter(&self) -> slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        if self.entries.len() == self.entries.capacity() {
            let before = self.entries.capacity();
            self.entries.reserve_exact(HEADER_GROWTH);
            debug_table!(
                "header table full at {before} entries, grew to {}",
                self.entries.capacity()
            );
        }
        self.entries.push(entry);
    }

    /// Append `' '` followed by `continuation` to the last entry's value.
    ///
    /// The joined value is written to a fresh buffer; the previous value is
    /// never mutated in place. Returns false when the table is empty.
    pub(crate) fn fold_into_last(&mut self, input: &[u8], continuation: &[u8]) -> bool {
        let Some(last) = self.entries.last_mut() else {
            return false;
        };

        let current = last.value(input);
        let mut joined = Vec::with_capacity(current.len() + 1 + continuation.len());
        joined.extend_from_slice(current);
        joined.push(b' ');
        joined.extend_from_slice(continuation);
        last.value = ValueSlot::Folded(joined);
        true
    }

    /// Index of the first entry named `name`.
    ///
    /// Two passes: exact bytes first, then ASCII case-insensitive.
    pub(crate) fn find_index(&self, input: &[u8], name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name(input) == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|entry| entry.name(input).eq_ignore_ascii_case(name))
            })
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries, keeping the backing storage and at least `floor` slots.
    pub(crate) fn reset_to(&mut self, floor: usize) {
        self.entries.clear();
        if self.entries.capacity() < floor {
            self.entries.reserve_exact(floor);
            debug_table!("header table raised to {} slots (floor {floor})", self.entries.capacity());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &[u8] = b"Host: a.com\r\nAccept: */*\r\n";

    fn host() -> Entry {
        Entry::new(Span::new(0, 4), Span::new(6, 11))
    }

    fn accept() -> Entry {
        Entry::new(Span::new(13, 19), Span::new(21, 24))
    }

    // ========================================================================
    // Span Tests
    // ========================================================================

    #[test]
    fn span_resolves_into_buffer() {
        let span = Span::new(6, 11);
        assert_eq!(span.resolve(INPUT), b"a.com");
        assert_eq!(span.len(), 5);
        assert_eq!(span.end(), 11);
        assert!(!span.is_empty());
    }

    #[test]
    fn span_out_of_range_resolves_empty() {
        let span = Span::new(20, 200);
        assert_eq!(span.resolve(INPUT), b"");
    }

    #[test]
    fn span_inverted_range_is_empty() {
        let span = Span::new(9, 3);
        assert!(span.is_empty());
        assert_eq!(span.resolve(INPUT), b"");
    }

    // ========================================================================
    // Growth Tests
    // ========================================================================

    #[test]
    fn grows_by_fixed_increment() {
        let mut table = HeaderTable::with_capacity(2);
        assert_eq!(table.capacity(), 2);

        table.push(host());
        table.push(accept());
        assert_eq!(table.capacity(), 2);

        table.push(host());
        assert!(table.capacity() >= 2 + HEADER_GROWTH);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn growth_preserves_order() {
        let mut table = HeaderTable::with_capacity(1);
        for _ in 0..5 {
            table.push(host());
            table.push(accept());
        }
        let names: Vec<&[u8]> = table.iter().map(|e| e.name(INPUT)).collect();
        assert_eq!(names.len(), 10);
        for pair in names.chunks(2) {
            assert_eq!(pair, [&b"Host"[..], &b"Accept"[..]]);
        }
    }

    #[test]
    fn zero_capacity_hint_still_allocates() {
        let table = HeaderTable::with_capacity(0);
        assert!(table.capacity() >= 1);
    }

    // ========================================================================
    // Folding Tests
    // ========================================================================

    #[test]
    fn fold_appends_with_single_space() {
        let mut table = HeaderTable::with_capacity(4);
        table.push(host());
        assert!(table.fold_into_last(INPUT, b"b.com"));

        let entry = table.get(0).unwrap();
        assert!(entry.is_folded());
        assert_eq!(entry.value(INPUT), b"a.com b.com");
        assert_eq!(entry.name(INPUT), b"Host");
    }

    #[test]
    fn fold_twice_chains_values() {
        let mut table = HeaderTable::with_capacity(4);
        table.push(host());
        table.fold_into_last(INPUT, b"b");
        table.fold_into_last(INPUT, b"c");
        assert_eq!(table.get(0).unwrap().value(INPUT), b"a.com b c");
    }

    #[test]
    fn fold_on_empty_table_is_rejected() {
        let mut table = HeaderTable::with_capacity(4);
        assert!(!table.fold_into_last(INPUT, b"orphan"));
        assert_eq!(table.len(), 0);
    }

    // ========================================================================
    // Lookup Tests
    // ========================================================================

    #[test]
    fn find_prefers_exact_match() {
        let input = b"host: lower\r\nHost: upper\r\n";
        let mut table = HeaderTable::with_capacity(4);
        table.push(Entry::new(Span::new(0, 4), Span::new(6, 11)));
        table.push(Entry::new(Span::new(13, 17), Span::new(19, 24)));

        assert_eq!(table.find_index(input, b"Host"), Some(1));
        assert_eq!(table.find_index(input, b"host"), Some(0));
        assert_eq!(table.find_index(input, b"HOST"), Some(0));
        assert_eq!(table.find_index(input, b"Accept"), None);
    }

    // ========================================================================
    // Reset Tests
    // ========================================================================

    #[test]
    fn reset_keeps_floor_storage() {
        let mut table = HeaderTable::with_capacity(4);
        for _ in 0..3 {
            table.push(host());
        }
        table.reset_to(4);
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), 4);
    }

    #[test]
    fn reset_keeps_grown_storage() {
        let mut table = HeaderTable::with_capacity(2);
        for _ in 0..20 {
            table.push(accept());
        }
        let grown = table.capacity();
        assert!(grown >= 20);

        table.reset_to(5);
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), grown);
    }

    #[test]
    fn reset_raises_storage_to_floor() {
        let mut table = HeaderTable::with_capacity(1);
        table.reset_to(6);
        assert_eq!(table.len(), 0);
        assert!(table.capacity() >= 6);
    }
}
