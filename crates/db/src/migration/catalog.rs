//! The ordered, immutable list of known migrations.

use super::definition::MigrationDefinition;

/// All known migrations, kept sorted ascending by id.
///
/// Registration happens once at startup; afterwards the catalog is only read.
#[derive(Debug, Default)]
pub struct Catalog {
    definitions: Vec<MigrationDefinition>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration at its sorted position.
    ///
    /// # Panics
    ///
    /// Panics if a migration with the same id is already registered.
    #[must_use]
    pub fn register(mut self, definition: MigrationDefinition) -> Self {
        match self
            .definitions
            .binary_search_by(|existing| existing.id().cmp(definition.id()))
        {
            Ok(_) => panic!("duplicate migration id: {}", definition.id()),
            Err(position) => self.definitions.insert(position, definition),
        }
        self
    }

    /// Returns every migration, ascending by id.
    #[must_use]
    pub fn all(&self) -> &[MigrationDefinition] {
        &self.definitions
    }

    /// Looks up a migration by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MigrationDefinition> {
        self.definitions
            .binary_search_by(|existing| existing.id().cmp(id))
            .ok()
            .map(|index| &self.definitions[index])
    }

    /// Iterates over migration ids in history order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(MigrationDefinition::id)
    }

    /// Number of registered migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no migration is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
