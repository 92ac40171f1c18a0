//! Porter stemmer.
//!
//! Each step is an ordered table of `(suffix, replacement, condition)` rules.
//! Within a step the first rule whose suffix matches is the only one
//! considered: if its condition fails the step does nothing.
//!
//! A single Porter pass is not idempotent for every word ("agreed" → "agre"
//! → "agr"), so [`stem`] repeats the pass until the word stops changing. Every
//! pass either shortens the word or rewrites a trailing `y`/`i`, so this
//! terminates quickly.

/// Condition evaluated on the stem left after removing a rule's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Always,
    /// Measure of the stem is strictly greater than the value.
    MeasureAbove(usize),
    /// Stem contains a vowel.
    HasVowel,
    /// Measure above 1 and the stem ends in `s` or `t` (step 4 `-ion`).
    MeasureAboveOneEndsST,
    /// Step 5a: measure above 1, or measure 1 without a cvc ending.
    FinalE,
    /// Step 5b: the stem still ends in `l` and has measure above 1.
    DoubleL,
}

impl Condition {
    fn holds(self, stem: &[u8]) -> bool {
        match self {
            Condition::Always => true,
            Condition::MeasureAbove(m) => measure(stem) > m,
            Condition::HasVowel => has_vowel(stem),
            Condition::MeasureAboveOneEndsST => {
                measure(stem) > 1 && matches!(stem.last(), Some(b's') | Some(b't'))
            }
            Condition::FinalE => {
                let m = measure(stem);
                m > 1 || (m == 1 && !ends_cvc(stem))
            }
            Condition::DoubleL => stem.last() == Some(&b'l') && measure(stem) > 1,
        }
    }
}

#[derive(Debug)]
struct Rule {
    suffix: &'static str,
    replacement: &'static str,
    condition: Condition,
}

const fn rule(suffix: &'static str, replacement: &'static str, condition: Condition) -> Rule {
    Rule { suffix, replacement, condition }
}

use Condition::*;

static STEP_1A: &[Rule] = &[
    rule("sses", "ss", Always),
    rule("ies", "i", Always),
    rule("ss", "ss", Always),
    rule("s", "", Always),
];

static STEP_1B: &[Rule] = &[
    rule("eed", "ee", MeasureAbove(0)),
    rule("ed", "", HasVowel),
    rule("ing", "", HasVowel),
];

static STEP_1B_CLEANUP: &[Rule] = &[
    rule("at", "ate", Always),
    rule("bl", "ble", Always),
    rule("iz", "ize", Always),
];

static STEP_1C: &[Rule] = &[rule("y", "i", HasVowel)];

static STEP_2: &[Rule] = &[
    rule("ational", "ate", MeasureAbove(0)),
    rule("tional", "tion", MeasureAbove(0)),
    rule("enci", "ence", MeasureAbove(0)),
    rule("anci", "ance", MeasureAbove(0)),
    rule("izer", "ize", MeasureAbove(0)),
    rule("abli", "able", MeasureAbove(0)),
    rule("alli", "al", MeasureAbove(0)),
    rule("entli", "ent", MeasureAbove(0)),
    rule("eli", "e", MeasureAbove(0)),
    rule("ousli", "ous", MeasureAbove(0)),
    rule("ization", "ize", MeasureAbove(0)),
    rule("ation", "ate", MeasureAbove(0)),
    rule("ator", "ate", MeasureAbove(0)),
    rule("alism", "al", MeasureAbove(0)),
    rule("iveness", "ive", MeasureAbove(0)),
    rule("fulness", "ful", MeasureAbove(0)),
    rule("ousness", "ous", MeasureAbove(0)),
    rule("aliti", "al", MeasureAbove(0)),
    rule("iviti", "ive", MeasureAbove(0)),
    rule("biliti", "ble", MeasureAbove(0)),
];

static STEP_3: &[Rule] = &[
    rule("icate", "ic", MeasureAbove(0)),
    rule("ative", "", MeasureAbove(0)),
    rule("alize", "al", MeasureAbove(0)),
    rule("iciti", "ic", MeasureAbove(0)),
    rule("ical", "ic", MeasureAbove(0)),
    rule("ful", "", MeasureAbove(0)),
    rule("ness", "", MeasureAbove(0)),
];

static STEP_4: &[Rule] = &[
    rule("al", "", MeasureAbove(1)),
    rule("ance", "", MeasureAbove(1)),
    rule("ence", "", MeasureAbove(1)),
    rule("er", "", MeasureAbove(1)),
    rule("ic", "", MeasureAbove(1)),
    rule("able", "", MeasureAbove(1)),
    rule("ible", "", MeasureAbove(1)),
    rule("ant", "", MeasureAbove(1)),
    rule("ement", "", MeasureAbove(1)),
    rule("ment", "", MeasureAbove(1)),
    rule("ent", "", MeasureAbove(1)),
    rule("ion", "", MeasureAboveOneEndsST),
    rule("ou", "", MeasureAbove(1)),
    rule("ism", "", MeasureAbove(1)),
    rule("ate", "", MeasureAbove(1)),
    rule("iti", "", MeasureAbove(1)),
    rule("ous", "", MeasureAbove(1)),
    rule("ive", "", MeasureAbove(1)),
    rule("ize", "", MeasureAbove(1)),
];

static STEP_5A: &[Rule] = &[rule("e", "", FinalE)];

static STEP_5B: &[Rule] = &[rule("l", "", DoubleL)];

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences in `[C](VC)^m[V]`.
fn measure(word: &[u8]) -> usize {
    let n = word.len();
    let mut i = 0;
    let mut m = 0;
    while i < n && is_consonant(word, i) {
        i += 1;
    }
    loop {
        while i < n && !is_consonant(word, i) {
            i += 1;
        }
        if i >= n {
            return m;
        }
        while i < n && is_consonant(word, i) {
            i += 1;
        }
        m += 1;
    }
}

fn has_vowel(word: &[u8]) -> bool {
    (0..word.len()).any(|i| !is_consonant(word, i))
}

fn ends_double_consonant(word: &[u8]) -> bool {
    let n = word.len();
    n >= 2 && word[n - 1] == word[n - 2] && is_consonant(word, n - 1)
}

/// `*o`: consonant-vowel-consonant ending where the last letter is not w, x or y.
fn ends_cvc(word: &[u8]) -> bool {
    let n = word.len();
    n >= 3
        && is_consonant(word, n - 3)
        && !is_consonant(word, n - 2)
        && is_consonant(word, n - 1)
        && !matches!(word[n - 1], b'w' | b'x' | b'y')
}

/// Apply the first rule in `rules` whose suffix matches, returning it if its
/// condition held and the word was rewritten.
fn apply(word: &mut Vec<u8>, rules: &'static [Rule]) -> Option<&'static Rule> {
    let rule = rules.iter().find(|r| word.ends_with(r.suffix.as_bytes()))?;
    let stem_len = word.len() - rule.suffix.len();
    if !rule.condition.holds(&word[..stem_len]) {
        return None;
    }
    word.truncate(stem_len);
    word.extend_from_slice(rule.replacement.as_bytes());
    Some(rule)
}

fn step_1b(word: &mut Vec<u8>) {
    // Only the -ed/-ing removals trigger the cleanup; -eed → -ee does not.
    let Some(fired) = apply(word, STEP_1B) else { return };
    if fired.condition != HasVowel {
        return;
    }
    if apply(word, STEP_1B_CLEANUP).is_some() {
        return;
    }
    if ends_double_consonant(word) && !matches!(word.last(), Some(b'l' | b's' | b'z')) {
        word.pop();
    } else if measure(word) == 1 && ends_cvc(word) {
        word.push(b'e');
    }
}

fn porter_pass(word: &[u8]) -> Vec<u8> {
    let mut w = word.to_vec();
    if w.len() <= 2 {
        return w;
    }
    apply(&mut w, STEP_1A);
    step_1b(&mut w);
    apply(&mut w, STEP_1C);
    apply(&mut w, STEP_2);
    apply(&mut w, STEP_3);
    apply(&mut w, STEP_4);
    apply(&mut w, STEP_5A);
    apply(&mut w, STEP_5B);
    w
}

/// Reduce `term` to its Porter stem.
///
/// Only ASCII alphabetic terms are stemmed; anything else (digits,
/// apostrophes, non-Latin scripts) is returned unchanged. The result is never
/// empty and `stem(&stem(w)) == stem(w)` for every `w`.
pub fn stem(term: &str) -> String {
    if term.len() <= 2 || !term.bytes().all(|b| b.is_ascii_alphabetic()) {
        return term.to_string();
    }
    let mut current = term.to_ascii_lowercase().into_bytes();
    loop {
        let next = porter_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    if current.is_empty() {
        return term.to_string();
    }
    String::from_utf8(current).unwrap_or_else(|_| term.to_string())
}
