// Registry services
// Services hold the persistence-shaped logic the registry delegates to:
// the snapshot codec and the one-shot legacy migration.

pub mod legacy_migration;
pub mod registry_codec;
