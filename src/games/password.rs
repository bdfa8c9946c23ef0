//! Password-rule game.
//!
//! The player keeps submitting a password. Every submission is checked
//! against all unlocked rules in order; passing them all unlocks the next
//! rule. Some rules depend on parameters rolled once per game.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::render::{Embed, RenderedMessage};
use crate::session::{Notice, Step, UserId};

pub const RULE_COUNT: usize = 18;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];
const ROMAN: [char; 7] = ['I', 'V', 'X', 'L', 'C', 'D', 'M'];
const SPONSORS: [&str; 3] = ["pepsi", "starbucks", "shell"];
const MOON_PHASES: [&str; 8] = ["🌑", "🌒", "🌓", "🌔", "🌕", "🌖", "🌗", "🌘"];
const SECRET_WORDS: [&str; 6] = ["ferris", "cargo", "crab", "borrow", "tokio", "serde"];
const ELEMENTS: [&str; 24] = [
    "He", "Li", "Be", "Ne", "Na", "Mg", "Al", "Si", "Cl", "Ar", "Ca", "Fe", "Co", "Ni", "Cu",
    "Zn", "Ag", "Sn", "Au", "Hg", "Pb", "Rn", "Ra", "Pt",
];
const CAPTCHA_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz";

/// Values rolled when the game starts and fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordParams {
    pub digit_sum: u32,
    pub captcha: String,
    pub moon_phase: &'static str,
    pub price: u32,
    /// `#rrggbb`, letters only so it never disturbs the digit sum.
    pub color: String,
    pub secret_word: &'static str,
}

impl PasswordParams {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let captcha = (0..5)
            .map(|_| CAPTCHA_ALPHABET[rng.gen_range(0..CAPTCHA_ALPHABET.len())] as char)
            .collect();
        let color = (0..6)
            .map(|_| char::from(b'a' + rng.gen_range(0..6u8)))
            .collect::<String>();
        Self {
            digit_sum: rng.gen_range(25..=45),
            captcha,
            moon_phase: MOON_PHASES.choose(rng).copied().unwrap_or("🌕"),
            price: rng.gen_range(10..=99),
            color: format!("#{color}"),
            secret_word: SECRET_WORDS.choose(rng).copied().unwrap_or("ferris"),
        }
    }
}

struct Rule {
    describe: fn(&PasswordParams) -> String,
    check: fn(&str, &PasswordParams) -> bool,
}

fn digits(password: &str) -> impl Iterator<Item = u32> + '_ {
    password.chars().filter_map(|c| c.to_digit(10))
}

fn digit_runs(password: &str) -> impl Iterator<Item = &str> {
    password
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
}

fn is_leap(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn is_prime(n: usize) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

fn contains_element(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(2).any(|pair| {
        let symbol: String = pair.iter().collect();
        ELEMENTS.contains(&symbol.as_str())
    })
}

const RULES: [Rule; RULE_COUNT] = [
    Rule {
        describe: |_| "Your password must be at least 5 characters.".into(),
        check: |pw, _| pw.chars().count() >= 5,
    },
    Rule {
        describe: |_| "Your password must include a number.".into(),
        check: |pw, _| pw.chars().any(|c| c.is_ascii_digit()),
    },
    Rule {
        describe: |_| "Your password must include an uppercase letter.".into(),
        check: |pw, _| pw.chars().any(char::is_uppercase),
    },
    Rule {
        describe: |_| "Your password must include a special character.".into(),
        check: |pw, _| pw.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    },
    Rule {
        describe: |p| format!("The digits in your password must add up to {}.", p.digit_sum),
        check: |pw, p| digits(pw).sum::<u32>() == p.digit_sum,
    },
    Rule {
        describe: |_| "Your password must include a month of the year.".into(),
        check: |pw, _| {
            let lower = pw.to_lowercase();
            MONTHS.iter().any(|m| lower.contains(m))
        },
    },
    Rule {
        describe: |_| "Your password must include a roman numeral.".into(),
        check: |pw, _| pw.chars().any(|c| ROMAN.contains(&c)),
    },
    Rule {
        describe: |_| "Your password must include one of our sponsors: pepsi, starbucks, shell.".into(),
        check: |pw, _| {
            let lower = pw.to_lowercase();
            SPONSORS.iter().any(|s| lower.contains(s))
        },
    },
    Rule {
        describe: |p| format!("Your password must include this captcha: `{}`", p.captcha),
        check: |pw, p| pw.contains(&p.captcha),
    },
    Rule {
        describe: |_| "Your password must include the current phase of the moon as an emoji.".into(),
        check: |pw, p| pw.contains(p.moon_phase),
    },
    Rule {
        describe: |_| "Your password must include a leap year (four digits).".into(),
        check: |pw, _| {
            digit_runs(pw)
                .filter(|run| run.len() == 4)
                .filter_map(|run| run.parse().ok())
                .any(is_leap)
        },
    },
    Rule {
        describe: |p| format!("Your password must include the price of this item: ${}", p.price),
        check: |pw, p| pw.contains(&format!("${}", p.price)),
    },
    Rule {
        describe: |_| "Your password must include a two-letter symbol from the periodic table.".into(),
        check: |pw, _| contains_element(pw),
    },
    Rule {
        describe: |_| "Your password must include the length of your password.".into(),
        check: |pw, _| pw.contains(&pw.chars().count().to_string()),
    },
    Rule {
        describe: |_| "The length of your password must be a prime number.".into(),
        check: |pw, _| is_prime(pw.chars().count()),
    },
    Rule {
        describe: |p| format!("Your password must include this color in hex: `{}`", p.color),
        check: |pw, p| pw.to_lowercase().contains(&p.color),
    },
    Rule {
        describe: |p| format!("Your password must include the secret word: `{}`", p.secret_word),
        check: |pw, p| pw.to_lowercase().contains(p.secret_word),
    },
    Rule {
        describe: |_| "Your password must not contain any whitespace.".into(),
        check: |pw, _| !pw.chars().any(char::is_whitespace),
    },
];

/// Description of a 1-based rule under the given parameters.
pub fn rule_description(rule: usize, params: &PasswordParams) -> Option<String> {
    rule.checked_sub(1)
        .and_then(|i| RULES.get(i))
        .map(|r| (r.describe)(params))
}

/// First failing rule among the first `unlocked` rules, 1-based.
pub fn first_failing_rule(password: &str, params: &PasswordParams, unlocked: usize) -> Option<usize> {
    RULES
        .iter()
        .take(unlocked.min(RULE_COUNT))
        .position(|rule| !(rule.check)(password, params))
        .map(|i| i + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordState {
    Playing,
    Won,
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct PasswordGame {
    owner: UserId,
    params: PasswordParams,
    unlocked: usize,
    attempts: u32,
    state: PasswordState,
}

impl PasswordGame {
    pub fn new<R: Rng + ?Sized>(owner: UserId, rng: &mut R) -> Self {
        Self::with_params(owner, PasswordParams::roll(rng))
    }

    pub fn with_params(owner: UserId, params: PasswordParams) -> Self {
        Self {
            owner,
            params,
            unlocked: 1,
            attempts: 0,
            state: PasswordState::Playing,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn params(&self) -> &PasswordParams {
        &self.params
    }

    /// Number of rules currently unlocked, `1..=18`.
    pub fn unlocked(&self) -> usize {
        self.unlocked
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> PasswordState {
        self.state
    }

    pub fn submit(&mut self, user: UserId, password: &str) -> Step {
        if self.state != PasswordState::Playing {
            return Notice::SessionOver.into();
        }
        if user != self.owner {
            return Notice::NotSessionOwner.into();
        }
        self.attempts += 1;

        if let Some(rule) = first_failing_rule(password, &self.params, self.unlocked) {
            return Notice::RuleFailed {
                rule,
                message: rule_description(rule, &self.params).unwrap_or_default(),
            }
            .into();
        }

        if self.unlocked == RULE_COUNT {
            self.state = PasswordState::Won;
        } else {
            self.unlocked += 1;
        }
        Step::Updated
    }

    pub fn abandon(&mut self) {
        if self.state == PasswordState::Playing {
            self.state = PasswordState::Abandoned;
        }
    }

    pub fn render(&self) -> RenderedMessage {
        let embed = match self.state {
            PasswordState::Won => Embed::new("The Password Game")
                .description(format!(
                    "You satisfied all {RULE_COUNT} rules in {} attempts!",
                    self.attempts
                ))
                .color(0x57F287),
            PasswordState::Abandoned => Embed::new("The Password Game")
                .description(format!(
                    "Game over. You reached rule {} of {RULE_COUNT}.",
                    self.unlocked
                ))
                .color(0xED4245),
            PasswordState::Playing => {
                let mut embed = Embed::new("The Password Game")
                    .description("Submit a password that follows every rule below.")
                    .color(0x5865F2)
                    .footer(format!("Rule {}/{RULE_COUNT}", self.unlocked));
                for rule in (1..=self.unlocked).rev() {
                    embed = embed.field(
                        format!("Rule {rule}"),
                        rule_description(rule, &self.params).unwrap_or_default(),
                        false,
                    );
                }
                embed
            }
        };
        RenderedMessage::from_embed(embed)
    }
}
