pub use self::importer::GltfImporter;

mod importer;
