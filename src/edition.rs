//! Connector edition option list.

use log::warn;

/// Editions the connector can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Four,
    GreaterOrFive,
    Serenity,
    Growth,
    Seven,
}

impl Edition {
    pub const ALL: [Edition; 5] = [
        Edition::Four,
        Edition::GreaterOrFive,
        Edition::Serenity,
        Edition::Growth,
        Edition::Seven,
    ];

    /// Stored code of this edition.
    pub fn code(&self) -> &'static str {
        match self {
            Edition::Four => "four",
            Edition::GreaterOrFive => "greater_or_five",
            Edition::Serenity => "serenity",
            Edition::Growth => "growth",
            Edition::Seven => "seven",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Edition::Four => "4.0",
            Edition::GreaterOrFive => "5.0 or greater",
            Edition::Serenity => "Serenity",
            Edition::Growth => "Growth Edition",
            Edition::Seven => "7.0",
        }
    }

    pub fn from_code(code: &str) -> Option<Edition> {
        Edition::ALL.into_iter().find(|e| e.code() == code)
    }
}

/// Display name for a stored edition code. Unknown codes are shown as stored.
pub fn resolve_edition_name(code: &str) -> String {
    match Edition::from_code(code) {
        Some(edition) => edition.display_name().to_string(),
        None => {
            warn!("unknown connector edition '{}'", code);
            code.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve_to_display_names() {
        assert_eq!(resolve_edition_name("four"), "4.0");
        assert_eq!(resolve_edition_name("serenity"), "Serenity");
        assert_eq!(resolve_edition_name("greater_or_five"), "5.0 or greater");
    }

    #[test]
    fn codes_round_trip() {
        for edition in Edition::ALL {
            assert_eq!(Edition::from_code(edition.code()), Some(edition));
        }
    }

    #[test]
    fn unknown_code_is_shown_raw() {
        assert_eq!(resolve_edition_name("enterprise"), "enterprise");
        assert_eq!(resolve_edition_name(""), "");
    }
}
