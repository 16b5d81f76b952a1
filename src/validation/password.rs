use serde::Serialize;

use super::rules::PASSWORD_SYMBOLS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => StrengthLevel::VeryWeak,
            2 => StrengthLevel::Weak,
            3 => StrengthLevel::Fair,
            4 => StrengthLevel::Good,
            _ => StrengthLevel::Strong,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "Very Weak",
            StrengthLevel::Weak => "Weak",
            StrengthLevel::Fair => "Fair",
            StrengthLevel::Good => "Good",
            StrengthLevel::Strong => "Strong",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "#dc3545",
            StrengthLevel::Weak => "#fd7e14",
            StrengthLevel::Fair => "#ffc107",
            StrengthLevel::Good => "#20c997",
            StrengthLevel::Strong => "#28a745",
        }
    }
}

/// Password strength as shown next to the password field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    /// Number of satisfied criteria, 0..=5
    pub score: u8,
    pub level: StrengthLevel,
    pub feedback: &'static str,
    pub color: &'static str,
}

/// Score a password by counting satisfied criteria: length of at least 8,
/// a lowercase letter, an uppercase letter, a digit, and a symbol.
pub fn password_strength(password: &str) -> PasswordStrength {
    let criteria = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)),
    ];
    let score = criteria.iter().filter(|met| **met).count() as u8;
    let level = StrengthLevel::from_score(score);

    PasswordStrength {
        score,
        level,
        feedback: level.label(),
        color: level.color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one_are_very_weak() {
        let empty = password_strength("");
        assert_eq!(empty.score, 0);
        assert_eq!(empty.feedback, "Very Weak");

        let lower = password_strength("abc");
        assert_eq!(lower.score, 1);
        assert_eq!(lower.level, StrengthLevel::VeryWeak);
        assert_eq!(lower.color, "#dc3545");
    }

    #[test]
    fn each_criterion_raises_the_score() {
        assert_eq!(password_strength("abcD").level, StrengthLevel::Weak);
        assert_eq!(password_strength("abcD1").level, StrengthLevel::Fair);
        assert_eq!(password_strength("abcD1!").level, StrengthLevel::Good);

        let strong = password_strength("abcdEF12!?");
        assert_eq!(strong.score, 5);
        assert_eq!(strong.feedback, "Strong");
        assert_eq!(strong.color, "#28a745");
    }

    #[test]
    fn symbols_outside_the_accepted_set_do_not_count() {
        assert_eq!(password_strength("abcdEF12#").score, 4);
    }
}
