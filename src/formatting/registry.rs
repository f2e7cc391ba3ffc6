//! Name-to-variant table consulted when a run selects its formatter.

use std::collections::BTreeMap;

use super::variants::{self, FormatterVariant};
use crate::error::{NotifyError, Result};

/// Registry of the formatter variants a run may select by name.
///
/// Built once at startup and passed by reference to whoever needs it.
///
/// # Examples
///
/// ```
/// use nagnotify::formatting::FormatterRegistry;
///
/// let registry = FormatterRegistry::builtin().unwrap();
/// assert!(registry.lookup("email").is_ok());
/// assert!(registry.lookup("pager").is_ok());
/// assert!(registry.lookup("fax").is_err());
/// ```
#[derive(Debug, Default)]
pub struct FormatterRegistry {
    variants: BTreeMap<&'static str, FormatterVariant>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding every built-in variant.
    pub fn builtin() -> Result<Self> {
        Self::from_variants([variants::email(), variants::pager(), variants::graph_email()])
    }

    /// Registers each variant in turn; the first duplicate name aborts.
    pub fn from_variants(variants: impl IntoIterator<Item = FormatterVariant>) -> Result<Self> {
        variants
            .into_iter()
            .try_fold(Self::new(), |mut registry, variant| {
                registry.register(variant)?;
                Ok(registry)
            })
    }

    /// Adds a variant. A name can only be registered once.
    pub fn register(&mut self, variant: FormatterVariant) -> Result<()> {
        if self.variants.contains_key(variant.name) {
            return Err(NotifyError::DuplicateFormatter(variant.name.to_string()));
        }
        self.variants.insert(variant.name, variant);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&FormatterVariant> {
        self.variants
            .get(name)
            .ok_or_else(|| NotifyError::UnknownFormatter {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.variants.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatterVariant> {
        self.variants.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MessageType, NotificationType};
    use crate::formatting::{PlannedSection, Section};

    fn ack_only(_: NotificationType, _: MessageType) -> Vec<PlannedSection> {
        vec![PlannedSection::plain(Section::AckInfo)]
    }

    #[test]
    fn test_builtin_names() {
        let registry = FormatterRegistry::builtin().unwrap();
        assert_eq!(registry.names(), vec!["email", "graph_email", "pager"]);
    }

    #[test]
    fn test_lookup_is_stable() {
        let registry = FormatterRegistry::builtin().unwrap();
        for name in registry.names() {
            let first = registry.lookup(name).unwrap();
            let second = registry.lookup(name).unwrap();
            assert!(std::ptr::eq(first, second));
            assert_eq!(first.name, name);
        }
    }

    #[test]
    fn test_unknown_formatter_is_an_error() {
        let registry = FormatterRegistry::builtin().unwrap();
        let err = registry.lookup("fax").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "unknown formatter 'fax' (available: email, graph_email, pager)"
        );
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = FormatterRegistry::builtin().unwrap();
        let custom = FormatterVariant::new("email", MessageType::Email).with_plan(ack_only);
        let err = registry.register(custom).unwrap_err();
        assert!(matches!(err, NotifyError::DuplicateFormatter(name) if name == "email"));

        // The original entry is untouched.
        let email = registry.lookup("email").unwrap();
        let plan = (email.plan)(NotificationType::Problem, MessageType::Email);
        assert_eq!(plan.len(), 8);
    }

    #[test]
    fn test_register_custom_variant() {
        let mut registry = FormatterRegistry::new();
        registry
            .register(FormatterVariant::new("ack_digest", MessageType::Email).with_plan(ack_only))
            .unwrap();
        let variant = registry.lookup("ack_digest").unwrap();
        assert_eq!(
            (variant.plan)(NotificationType::Problem, MessageType::Email),
            vec![PlannedSection::plain(Section::AckInfo)]
        );
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_from_variants_rejects_duplicate_builtin() {
        let err = FormatterRegistry::from_variants([
            variants::email(),
            variants::pager(),
            variants::email(),
        ])
        .unwrap_err();
        assert!(matches!(err, NotifyError::DuplicateFormatter(name) if name == "email"));
    }
}
