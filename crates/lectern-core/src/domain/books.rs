//! Canonical book names, indexed by book number (1 = Genesis … 66 = Revelation).
//!
//! Book names are always derived from the number carried on the wire; a
//! human-readable name sent by a peer is never trusted.

/// Number of books in the canonical Protestant ordering.
pub const BOOK_COUNT: u8 = 66;

const BOOK_NAMES: [&str; BOOK_COUNT as usize] = [
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

/// Returns the name of book `number`, or `None` outside `1..=66`.
pub fn book_name(number: u8) -> Option<&'static str> {
    match number {
        1..=BOOK_COUNT => Some(BOOK_NAMES[number as usize - 1]),
        _ => None,
    }
}
