//! Language and layout configurations.

use quill_protocol::payload::ComputedSubtype;

use crate::provider::ProviderId;

/// Providers assigned to a subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeNlpProviders {
    /// Provider answering spell requests.
    pub spelling: ProviderId,
    /// Provider answering suggest requests.
    pub suggestion: ProviderId,
}

impl SubtypeNlpProviders {
    /// Uses one provider for both roles.
    #[must_use]
    pub fn single(id: ProviderId) -> Self {
        Self {
            spelling: id.clone(),
            suggestion: id,
        }
    }

    /// Distinct provider ids, spelling first.
    #[must_use]
    pub fn ids(&self) -> Vec<&ProviderId> {
        if self.spelling == self.suggestion {
            vec![&self.spelling]
        } else {
            vec![&self.spelling, &self.suggestion]
        }
    }
}

/// A language/layout configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtype {
    /// Subtype id.
    pub id: i64,
    /// Primary locale tag.
    pub primary_locale: String,
    /// Additional locale tags.
    pub secondary_locales: Vec<String>,
    /// Assigned providers.
    pub nlp_providers: SubtypeNlpProviders,
}

impl Subtype {
    /// The identity sent to providers.
    #[must_use]
    pub fn compute(&self) -> ComputedSubtype {
        ComputedSubtype {
            id: self.id,
            primary_locale: self.primary_locale.clone(),
            secondary_locales: self.secondary_locales.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::shared("latin", "latin", 1)]
    #[case::split("hunspell", "latin", 2)]
    fn lists_distinct_providers(
        #[case] spelling: &str,
        #[case] suggestion: &str,
        #[case] expected: usize,
    ) {
        let providers = SubtypeNlpProviders {
            spelling: ProviderId::new(spelling),
            suggestion: ProviderId::new(suggestion),
        };
        assert_eq!(providers.ids().len(), expected);
    }

    #[rstest]
    fn computes_wire_identity() {
        let subtype = Subtype {
            id: 7,
            primary_locale: "de-CH".into(),
            secondary_locales: vec!["fr-CH".into()],
            nlp_providers: SubtypeNlpProviders::single(ProviderId::new("latin")),
        };
        let computed = subtype.compute();
        assert_eq!(computed.id, 7);
        assert_eq!(computed.primary_locale, "de-CH");
        assert_eq!(computed.secondary_locales, vec!["fr-CH".to_owned()]);
    }
}
