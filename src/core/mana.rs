//! Mana costs, mana pools and the `{2}{R}{W/P}` cost notation

use crate::{MtgError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res},
    multi::many0,
    sequence::{delimited, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Mana colors, plus colorless mana
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// The five colors in WUBRG order
    pub const COLORED: [Color; 5] = [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green];

    /// All pool slots in WUBRGC order
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Blue => 1,
            Color::Black => 2,
            Color::Red => 3,
            Color::Green => 4,
            Color::Colorless => 5,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }

    pub fn from_symbol(c: char) -> Option<Color> {
        match c {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A mana cost such as `{2}{R}{R}` or `{1}{B/P}{B/P}`
///
/// Colored and Phyrexian amounts are indexed by `Color::index()` (WUBRG).
/// Copy-eligible: the whole cost is 12 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub colored: [u8; 5],
    pub colorless: u8,
    pub phyrexian: [u8; 5],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Generic(u8),
    Colored(Color),
    Colorless,
    Phyrexian(Color),
}

fn colored_letter(input: &str) -> IResult<&str, Color> {
    map(one_of("WUBRG"), |c| {
        // one_of only yields the listed letters
        Color::from_symbol(c).unwrap_or(Color::Colorless)
    })(input)
}

fn generic_amount(input: &str) -> IResult<&str, u8> {
    map_res(digit1, u8::from_str)(input)
}

fn braced_symbol(input: &str) -> IResult<&str, Symbol> {
    delimited(
        char('{'),
        alt((
            map(generic_amount, Symbol::Generic),
            map(terminated(colored_letter, tag("/P")), Symbol::Phyrexian),
            map(colored_letter, Symbol::Colored),
            map(char('C'), |_| Symbol::Colorless),
        )),
        char('}'),
    )(input)
}

/// Braceless shorthand (`2RR`), accepted for convenience
fn bare_symbol(input: &str) -> IResult<&str, Symbol> {
    alt((
        map(generic_amount, Symbol::Generic),
        map(colored_letter, Symbol::Colored),
        map(char('C'), |_| Symbol::Colorless),
    ))(input)
}

fn symbols(input: &str) -> IResult<&str, Vec<Symbol>> {
    all_consuming(many0(alt((braced_symbol, bare_symbol))))(input)
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse mana cost notation
    ///
    /// Numbers are generic mana, `W U B R G` are colored, `C` is
    /// colorless-specific, and `{W/P}` is Phyrexian. Whitespace is ignored.
    pub fn parse(text: &str) -> Result<ManaCost> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let (_, parsed) = symbols(&compact)
            .map_err(|e| MtgError::ParseError(format!("invalid mana cost '{text}': {e}")))?;

        let overflow = || MtgError::ParseError(format!("mana cost '{text}' is larger than {}", u8::MAX));
        let mut cost = ManaCost::new();
        for symbol in parsed {
            let (slot, n) = match symbol {
                Symbol::Generic(n) => (&mut cost.generic, n),
                Symbol::Colored(c) => (&mut cost.colored[c.index()], 1),
                Symbol::Colorless => (&mut cost.colorless, 1),
                Symbol::Phyrexian(c) => (&mut cost.phyrexian[c.index()], 1),
            };
            *slot = slot.checked_add(n).ok_or_else(overflow)?;
        }
        // Every parsed cost has a mana value that fits in `cmc()`
        if cost.mana_value() > u8::MAX as u32 {
            return Err(overflow());
        }
        Ok(cost)
    }

    /// Build a cost from static card data; panics on malformed notation
    ///
    /// Only used while building the curated registry, whose notation is
    /// covered by the registry tests.
    pub(crate) fn of(text: &str) -> ManaCost {
        match ManaCost::parse(text) {
            Ok(cost) => cost,
            Err(e) => panic!("bad registry mana cost: {e}"),
        }
    }

    pub fn colored_amount(&self, color: Color) -> u8 {
        match color {
            Color::Colorless => self.colorless,
            c => self.colored[c.index()],
        }
    }

    pub fn phyrexian_amount(&self, color: Color) -> u8 {
        match color {
            Color::Colorless => 0,
            c => self.phyrexian[c.index()],
        }
    }

    pub fn phyrexian_total(&self) -> u8 {
        self.phyrexian.iter().fold(0u8, |acc, &n| acc.saturating_add(n))
    }

    pub fn has_phyrexian(&self) -> bool {
        self.phyrexian_total() > 0
    }

    /// Exact total of every symbol
    pub fn mana_value(&self) -> u32 {
        let colored: u32 = self.colored.iter().map(|&n| n as u32).sum();
        let phyrexian: u32 = self.phyrexian.iter().map(|&n| n as u32).sum();
        self.generic as u32 + colored + self.colorless as u32 + phyrexian
    }

    /// Converted mana cost, saturating at 255 for hand-built costs
    pub fn cmc(&self) -> u8 {
        u8::try_from(self.mana_value()).unwrap_or(u8::MAX)
    }

    pub fn is_zero(&self) -> bool {
        self.cmc() == 0
    }

    /// Colors that appear in the cost, in WUBRG order
    pub fn colors(&self) -> SmallVec<[Color; 2]> {
        Color::COLORED
            .iter()
            .copied()
            .filter(|c| self.colored[c.index()] > 0 || self.phyrexian[c.index()] > 0)
            .collect()
    }

    /// Reduce the generic part by `amount`, never below zero
    ///
    /// Colored, colorless and Phyrexian requirements are untouched.
    pub fn with_generic_reduction(&self, amount: u8) -> ManaCost {
        ManaCost {
            generic: self.generic.saturating_sub(amount),
            ..*self
        }
    }

    /// The part of the cost that can only be paid from the pool
    pub fn without_phyrexian(&self) -> ManaCost {
        ManaCost {
            phyrexian: [0; 5],
            ..*self
        }
    }

    /// The cost with every Phyrexian symbol paid as ordinary colored mana
    pub fn phyrexian_as_colored(&self) -> ManaCost {
        let mut cost = self.without_phyrexian();
        for i in 0..5 {
            cost.colored[i] = cost.colored[i].saturating_add(self.phyrexian[i]);
        }
        cost
    }

    /// Multiply all amounts (e.g. Dark Ritual's BBB)
    pub fn multiply(&self, factor: u8) -> ManaCost {
        let mut cost = *self;
        cost.generic = cost.generic.saturating_mul(factor);
        cost.colorless = cost.colorless.saturating_mul(factor);
        for i in 0..5 {
            cost.colored[i] = cost.colored[i].saturating_mul(factor);
            cost.phyrexian[i] = cost.phyrexian[i].saturating_mul(factor);
        }
        cost
    }
}

impl FromStr for ManaCost {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self> {
        ManaCost::parse(s)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "{{0}}");
        }
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::COLORED {
            for _ in 0..self.colored[color.index()] {
                write!(f, "{{{}}}", color.symbol())?;
            }
        }
        for _ in 0..self.colorless {
            write!(f, "{{C}}")?;
        }
        for color in Color::COLORED {
            for _ in 0..self.phyrexian[color.index()] {
                write!(f, "{{{}/P}}", color.symbol())?;
            }
        }
        Ok(())
    }
}

/// Mana pool for a player, one counter per slot in WUBRGC order
///
/// Counts are unsigned, so the pool can never go negative; every
/// deduction is checked before it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaPool {
    amounts: [u8; 6],
}

/// Exactly what a payment took out of a pool, so it can be refunded
pub type ManaPayment = ManaPool;

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(&self, color: Color) -> u8 {
        self.amounts[color.index()]
    }

    pub fn add(&mut self, color: Color, amount: u8) {
        let slot = &mut self.amounts[color.index()];
        *slot = slot.saturating_add(amount);
    }

    pub fn add_color(&mut self, color: Color) {
        self.add(color, 1);
    }

    /// Add every mana in `other` to this pool
    pub fn add_pool(&mut self, other: &ManaPool) {
        for color in Color::ALL {
            self.add(color, other.amount(color));
        }
    }

    /// Return the mana recorded in a payment
    pub fn refund(&mut self, payment: &ManaPayment) {
        self.add_pool(payment);
    }

    pub fn clear(&mut self) {
        self.amounts = [0; 6];
    }

    pub fn total(&self) -> u32 {
        self.amounts.iter().map(|&n| n as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Whether the whole cost, Phyrexian symbols included as colored
    /// mana, can be paid from this pool
    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        for color in Color::ALL {
            let owed = cost.colored_amount(color) as u32 + cost.phyrexian_amount(color) as u32;
            if (self.amount(color) as u32) < owed {
                return false;
            }
        }
        self.total() >= cost.mana_value()
    }

    /// Pay a cost from this pool
    ///
    /// Colored (and colorless-specific) requirements are deducted first.
    /// Generic mana is then taken one at a time from whichever slot holds
    /// the most remaining mana, ties going to the earlier slot in WUBRGC
    /// order. On failure the pool is unchanged.
    pub fn pay(&mut self, cost: &ManaCost) -> Result<ManaPayment> {
        if !self.can_pay(cost) {
            return Err(MtgError::InvalidAction(format!(
                "insufficient mana to pay {cost} from {self}"
            )));
        }
        let cost = cost.phyrexian_as_colored();
        let mut paid = ManaPool::new();

        for color in Color::ALL {
            let n = cost.colored_amount(color);
            self.amounts[color.index()] -= n;
            paid.add(color, n);
        }

        for _ in 0..cost.generic {
            let mut best = 0;
            for i in 1..6 {
                if self.amounts[i] > self.amounts[best] {
                    best = i;
                }
            }
            // can_pay guarantees enough total mana
            self.amounts[best] -= 1;
            paid.amounts[best] += 1;
        }

        Ok(paid)
    }

    /// Pay a cost using an explicit split for the generic part
    ///
    /// `generic_split` must sum to the cost's generic amount and be
    /// available after the colored requirements are taken.
    pub fn pay_with_split(&mut self, cost: &ManaCost, generic_split: &ManaPool) -> Result<ManaPayment> {
        let cost = cost.phyrexian_as_colored();
        if generic_split.total() != cost.generic as u32 {
            return Err(MtgError::InvalidAction(format!(
                "generic split {generic_split} does not cover {{{}}}",
                cost.generic
            )));
        }
        for color in Color::ALL {
            let needed = cost.colored_amount(color) as u32 + generic_split.amount(color) as u32;
            if (self.amount(color) as u32) < needed {
                return Err(MtgError::InvalidAction(format!(
                    "generic split {generic_split} is not available in {self}"
                )));
            }
        }

        let mut paid = ManaPool::new();
        for color in Color::ALL {
            let n = cost.colored_amount(color) + generic_split.amount(color);
            self.amounts[color.index()] -= n;
            paid.add(color, n);
        }
        Ok(paid)
    }

    /// Remove a single mana of the given color, if present
    pub fn take_one(&mut self, color: Color) -> bool {
        let slot = &mut self.amounts[color.index()];
        if *slot > 0 {
            *slot -= 1;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }
        for color in Color::ALL {
            for _ in 0..self.amount(color) {
                write!(f, "{}", color.symbol())?;
            }
        }
        Ok(())
    }
}
