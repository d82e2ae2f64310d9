pub use self::exporter::PlyExporter;

mod exporter;
