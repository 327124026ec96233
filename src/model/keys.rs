/// Home row first, then the rows above and below.
pub const PICK_LETTERS: [&str; 29] = [
    "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "u", "i", "o", "p", "n", "m", ",", ".", "q",
    "w", "e", "r", "t", "y", "b", "v", "c", "x", "z",
];

/// The label shown for the tab at `position` among injectable tabs. Positions
/// past the letter table fall back to their number.
pub fn label_for(position: usize) -> String {
    match PICK_LETTERS.get(position) {
        Some(letter) => (*letter).to_string(),
        None => position.to_string(),
    }
}

/// Resolves a pressed key back to a position among injectable tabs.
pub fn index_of(key: &str) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    if let Some(pos) = PICK_LETTERS.iter().position(|letter| *letter == key) {
        return Some(pos);
    }
    key.parse::<usize>().ok().filter(|n| *n >= PICK_LETTERS.len())
}
